//! Configuration resolution.
//!
//! Platforms supply a [`ConfigurationSource`]; routers read a
//! [`LocalConfiguration`] snapshot from it once per event. When no
//! platform is registered the registry falls back to the
//! [`FixedConfiguration`] it was constructed with.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::world::ItemType;

/// Configuration load errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings consumed by the routers.
///
/// Missing fields in a configuration document fall back to the values
/// of [`LocalConfiguration::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfiguration {
    /// Item that sets selection points.
    pub wand_item: ItemType,
    /// Item that triggers jump-to and pass-through navigation.
    pub navigation_wand: ItemType,
    /// Maximum jump distance for the navigation wand. `<= 0` disables
    /// the navigation wand entirely.
    pub navigation_wand_max_distance: i32,
}

impl Default for LocalConfiguration {
    fn default() -> Self {
        Self {
            wand_item: ItemType::WOOD_AXE,
            navigation_wand: ItemType::COMPASS,
            navigation_wand_max_distance: 50,
        }
    }
}

impl LocalConfiguration {
    /// Whether the navigation wand is enabled at all.
    pub fn navigation_enabled(&self) -> bool {
        self.navigation_wand_max_distance > 0
    }
}

/// A loadable source of [`LocalConfiguration`].
pub trait ConfigurationSource: Send + Sync {
    /// (Re)load settings from the backing store.
    fn load(&self) -> Result<(), ConfigError>;

    /// Snapshot of the current settings.
    fn current(&self) -> LocalConfiguration;
}

/// Fixed settings with a no-op `load`.
///
/// `FixedConfiguration::default()` is what the registry hands out while
/// no platform is registered.
#[derive(Debug, Clone, Default)]
pub struct FixedConfiguration {
    settings: LocalConfiguration,
}

impl FixedConfiguration {
    pub fn new(settings: LocalConfiguration) -> Self {
        Self { settings }
    }
}

impl ConfigurationSource for FixedConfiguration {
    fn load(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    fn current(&self) -> LocalConfiguration {
        self.settings.clone()
    }
}

/// Settings loaded from a JSON document on disk.
///
/// Starts out with defaults. A missing file on `load` keeps the current
/// settings; an unreadable or malformed file is an error and also keeps
/// them.
#[derive(Debug)]
pub struct FileConfiguration {
    path: PathBuf,
    settings: RwLock<LocalConfiguration>,
}

impl FileConfiguration {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: RwLock::new(LocalConfiguration::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigurationSource for FileConfiguration {
    fn load(&self) -> Result<(), ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no configuration file, keeping defaults");
                return Ok(());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let parsed: LocalConfiguration =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            wand = %parsed.wand_item,
            navigation_wand = %parsed.navigation_wand,
            max_distance = parsed.navigation_wand_max_distance,
            "configuration loaded"
        );
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = parsed;
        Ok(())
    }

    fn current(&self) -> LocalConfiguration {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
