//! Per-user application data locations

use std::path::PathBuf;

use crate::error::PersistError;

/// Directory under the platform data dir holding all local files
pub const APP_DIR_NAME: &str = "mRemoteNG";

/// Cache copy of the last tree loaded from a SQL store
pub const CACHE_FILE_NAME: &str = "sqlcache.xml";

/// Per-user connection properties
pub const LOCAL_PROPERTIES_FILE_NAME: &str = "LocalConnectionProperties.json";

/// `<data-dir>/mRemoteNG`
///
/// # Errors
/// [`PersistError::NoDataDir`] if the platform has no data directory
pub fn app_data_dir() -> Result<PathBuf, PersistError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(PersistError::NoDataDir)
}

/// `<data-dir>/mRemoteNG/sqlcache.xml`
///
/// # Errors
/// [`PersistError::NoDataDir`] if the platform has no data directory
pub fn default_cache_path() -> Result<PathBuf, PersistError> {
    Ok(app_data_dir()?.join(CACHE_FILE_NAME))
}

/// `<data-dir>/mRemoteNG/LocalConnectionProperties.json`
///
/// # Errors
/// [`PersistError::NoDataDir`] if the platform has no data directory
pub fn default_local_properties_path() -> Result<PathBuf, PersistError> {
    Ok(app_data_dir()?.join(LOCAL_PROPERTIES_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_app_dir() {
        let Ok(dir) = app_data_dir() else {
            return;
        };
        assert!(dir.ends_with(APP_DIR_NAME));
        assert_eq!(default_cache_path().unwrap(), dir.join("sqlcache.xml"));
        assert_eq!(
            default_local_properties_path().unwrap().parent(),
            Some(dir.as_path())
        );
    }
}
