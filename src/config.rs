//! Configuration loading
//!
//! Runtime configuration is read from a JSON file so asset locations, log
//! verbosity, the JVM player classes and named presets can be changed
//! without recompiling. Missing sections fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::{AssetRoot, DEFAULT_IOS_BUNDLE_PREFIX};
use crate::presets::Preset;

/// Default config location relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "assets/haptics_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assets: AssetConfig,
    pub logging: LoggingConfig,
    pub android: AndroidConfig,
    /// Named presets triggered through `api::trigger_preset`
    pub presets: BTreeMap<String, Preset>,
}

/// Asset sandbox settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory every user-supplied relative path must stay inside
    pub root: PathBuf,
    /// Prefix the iOS player expects in front of bundle-relative paths
    pub ios_bundle_prefix: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            ios_bundle_prefix: DEFAULT_IOS_BUNDLE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// JVM classes the Android bridge loads through the activity class loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    pub player_class: String,
    pub completion_class: String,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            player_class: "io.hapticlabs.hapticlabsplayer.HapticlabsPlayer".to_string(),
            completion_class: "io.hapticlabs.hapticlabsplayer.bridge.NativeCompletion"
                .to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// the JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration on Android
    ///
    /// Packaged assets live inside the APK and are not reachable through
    /// `std::fs`, so the defaults are used.
    #[cfg(target_os = "android")]
    pub fn load() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    /// Load configuration from [`DEFAULT_CONFIG_PATH`]
    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    pub fn asset_root(&self) -> AssetRoot {
        AssetRoot::new(&self.assets.root).with_ios_bundle_prefix(&self.assets.ios_bundle_prefix)
    }
}
