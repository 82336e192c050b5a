//! Data sources and decoders
//!
//! The loader receives its per-user overlay as a [`DataProvider`] plus a
//! [`Deserializer`], so the storage medium and the format vary independently.

use std::path::{Path, PathBuf};

use crate::error::PersistError;

/// Produces raw data from some medium
pub trait DataProvider<T>: Send + Sync {
    /// Load the data
    ///
    /// # Errors
    /// [`PersistError`] if the medium cannot be read
    fn load(&self) -> Result<T, PersistError>;
}

/// Converts one representation into another
pub trait Deserializer<In, Out>: Send + Sync {
    /// Decode `input`
    ///
    /// # Errors
    /// [`PersistError::Decode`] if `input` is not in the expected format
    fn deserialize(&self, input: In) -> Result<Out, PersistError>;
}

impl<T, F> DataProvider<T> for F
where
    F: Fn() -> Result<T, PersistError> + Send + Sync,
{
    fn load(&self) -> Result<T, PersistError> {
        self()
    }
}

/// Reads a UTF-8 text file
///
/// A missing file reads as an empty string.
#[derive(Debug, Clone)]
pub struct FileDataProvider {
    path: PathBuf,
}

impl FileDataProvider {
    /// Create provider for `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File read by this provider
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents
    ///
    /// # Errors
    /// [`PersistError::Io`] if the directory or file cannot be written
    pub fn save(&self, contents: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::io_error(parent, e))?;
        }
        std::fs::write(&self.path, contents).map_err(|e| PersistError::io_error(&self.path, e))
    }
}

impl DataProvider<String> for FileDataProvider {
    fn load(&self) -> Result<String, PersistError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no file, reading as empty");
                Ok(String::new())
            }
            Err(e) => Err(PersistError::io_error(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileDataProvider::new(dir.path().join("absent.json"));
        assert_eq!(provider.load().unwrap(), "");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileDataProvider::new(dir.path().join("nested").join("props.json"));
        provider.save("[]").unwrap();
        assert_eq!(provider.load().unwrap(), "[]");
    }

    #[test]
    fn directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileDataProvider::new(dir.path());
        assert!(matches!(provider.load(), Err(PersistError::Io { .. })));
    }

    #[test]
    fn closures_are_providers() {
        let provider = || Ok::<_, PersistError>("fixed".to_string());
        assert_eq!(DataProvider::<String>::load(&provider).unwrap(), "fixed");
    }
}
