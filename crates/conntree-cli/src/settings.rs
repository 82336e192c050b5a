//! Command line settings file
//!
//! ```toml
//! [store]
//! database = "/srv/conntree/connections.db"
//!
//! [loader]
//! cache_write_policy = "best_effort"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use conntree_loader::LoaderConfig;
use serde::Deserialize;

/// Where the shared store lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct StoreSettings {
    /// SQLite database file
    pub(crate) database: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) store: StoreSettings,
    pub(crate) loader: LoaderConfig,
}

impl Settings {
    pub(crate) fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let settings: Self = toml::from_str(text).context("invalid settings")?;
        settings.loader.validate()?;
        Ok(settings)
    }

    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}
