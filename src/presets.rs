//! Declarative haptic presets.
//!
//! A preset names what to play on each platform so call sites only say
//! "trigger". Presets load from the `presets` table of the JSON config.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assets::AssetRoot;
use crate::effects::{AndroidBuiltInEffect, IosBuiltInEffect};
use crate::error::AssetPathError;
use crate::gateway::PlaybackGateway;
use crate::platform::Platform;
use crate::registry::{CompletionCallback, FailureCallback};

/// Pattern file pair: `.hac` under the Android assets directory and `.ahap`
/// relative to the iOS bundle prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub android_path: String,
    pub ios_path: String,
}

impl CustomPattern {
    pub fn new(android_path: impl Into<String>, ios_path: impl Into<String>) -> Self {
        Self {
            android_path: android_path.into(),
            ios_path: ios_path.into(),
        }
    }

    /// Preload the Android pattern so the first trigger starts without delay.
    /// iOS has no preload step.
    pub fn attach(&self, gateway: &PlaybackGateway) {
        if gateway.platform() == Platform::Android {
            gateway.preload(&self.android_path);
        }
    }

    pub fn trigger(&self, gateway: &PlaybackGateway, assets: &AssetRoot) {
        self.trigger_with(gateway, assets, None, None);
    }

    pub fn trigger_with(
        &self,
        gateway: &PlaybackGateway,
        assets: &AssetRoot,
        on_complete: Option<CompletionCallback>,
        on_fail: Option<FailureCallback>,
    ) {
        let ios_path = assets.ios_bundle_path(&self.ios_path);
        debug!(
            "[Presets] Triggering pattern '{}' / '{}'",
            self.android_path, ios_path
        );
        gateway.play(&self.android_path, &ios_path, on_complete, on_fail);
    }

    /// Check both pattern files exist inside `assets`.
    ///
    /// Both paths are authored relative to the same asset directory; the iOS
    /// bundle prefix is only added at trigger time.
    pub fn validate(&self, assets: &AssetRoot) -> Result<(), AssetPathError> {
        assets.check(&self.android_path)?;
        assets.check(&self.ios_path)?;
        Ok(())
    }
}

/// One built-in effect per platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltInPattern {
    pub android: AndroidBuiltInEffect,
    pub ios: IosBuiltInEffect,
}

impl BuiltInPattern {
    pub fn new(android: AndroidBuiltInEffect, ios: IosBuiltInEffect) -> Self {
        Self { android, ios }
    }

    pub fn trigger(&self, gateway: &PlaybackGateway) {
        gateway.play_built_in(self.android, self.ios);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preset {
    Custom(CustomPattern),
    BuiltIn(BuiltInPattern),
}

impl Preset {
    pub fn attach(&self, gateway: &PlaybackGateway) {
        if let Preset::Custom(pattern) = self {
            pattern.attach(gateway);
        }
    }

    pub fn trigger(&self, gateway: &PlaybackGateway, assets: &AssetRoot) {
        match self {
            Preset::Custom(pattern) => pattern.trigger(gateway, assets),
            Preset::BuiltIn(pattern) => pattern.trigger(gateway),
        }
    }

    /// Built-in presets need no files and always validate.
    pub fn validate(&self, assets: &AssetRoot) -> Result<(), AssetPathError> {
        match self {
            Preset::Custom(pattern) => pattern.validate(assets),
            Preset::BuiltIn(_) => Ok(()),
        }
    }
}
