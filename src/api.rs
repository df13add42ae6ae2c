// Public API for host integration
// Process-wide functions over a single global HapticsContext

use std::path::Path;

use once_cell::sync::Lazy;
use tracing::warn;

use crate::assets;
use crate::config::AppConfig;
use crate::context::HapticsContext;
use crate::effects::{AndroidBuiltInEffect, IosBuiltInEffect};
use crate::error::BridgeError;
use crate::registry::{CompletionCallback, FailureCallback};

// Re-export error code constants for host exposure
pub use crate::error::{AssetPathErrorCodes, BridgeErrorCodes};

/// Global HapticsContext instance
///
/// Owns the native player handle. The player itself is created on the first
/// playback call, not when this static is first touched.
static HAPTICS: Lazy<HapticsContext> = Lazy::new(|| HapticsContext::new(AppConfig::load()));

/// Get the version of the haptics library
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Play a pattern file
///
/// # Arguments
/// * `android_path` - `.hac` file relative to the Android assets directory
/// * `ios_path` - `.ahap` file relative to the app bundle
/// * `on_complete` - Run once when playback finishes
/// * `on_fail` - Run once with the native error message if playback fails
///
/// On desktop builds this is a logged no-op and neither callback runs.
pub fn play(
    android_path: &str,
    ios_path: &str,
    on_complete: Option<CompletionCallback>,
    on_fail: Option<FailureCallback>,
) {
    HAPTICS
        .gateway()
        .play(android_path, ios_path, on_complete, on_fail);
}

/// Play the platform's built-in effect
pub fn play_built_in(android_effect: AndroidBuiltInEffect, ios_effect: IosBuiltInEffect) {
    HAPTICS.gateway().play_built_in(android_effect, ios_effect);
}

/// Preload a pattern for lower-latency playback (Android)
pub fn preload(path: &str) {
    HAPTICS.gateway().preload(path);
}

/// Unload a preloaded pattern or a directory of them (Android)
pub fn unload(path_or_dir: &str) {
    HAPTICS.gateway().unload(path_or_dir);
}

/// Unload every preloaded pattern (Android)
pub fn unload_all() {
    HAPTICS.gateway().unload_all();
}

pub fn play_hac(path: &str, on_complete: Option<CompletionCallback>, on_fail: Option<FailureCallback>) {
    HAPTICS.gateway().play_hac(path, on_complete, on_fail);
}

pub fn play_hla(path: &str, on_complete: Option<CompletionCallback>, on_fail: Option<FailureCallback>) {
    HAPTICS.gateway().play_hla(path, on_complete, on_fail);
}

pub fn play_ogg(path: &str, on_complete: Option<CompletionCallback>, on_fail: Option<FailureCallback>) {
    HAPTICS.gateway().play_ogg(path, on_complete, on_fail);
}

pub fn preload_ogg(path: &str) {
    HAPTICS.gateway().preload_ogg(path);
}

pub fn unload_ogg(path: &str) {
    HAPTICS.gateway().unload_ogg(path);
}

/// Mute haptic output of AHAP playback (iOS)
pub fn set_haptics_muted(muted: bool) {
    HAPTICS.gateway().set_haptics_muted(muted);
}

pub fn is_haptics_muted() -> bool {
    HAPTICS.gateway().is_haptics_muted()
}

/// Mute audio output of AHAP playback (iOS)
pub fn set_audio_muted(muted: bool) {
    HAPTICS.gateway().set_audio_muted(muted);
}

pub fn is_audio_muted() -> bool {
    HAPTICS.gateway().is_audio_muted()
}

/// Whether `relative` names an existing file inside `root`
///
/// Rejects empty, absolute and `..`-containing paths without touching the
/// filesystem.
pub fn is_valid_asset_path(root: &Path, relative: &str) -> bool {
    assets::is_valid(root, relative)
}

/// Turn a path chosen in a file picker into a `root`-relative path
///
/// Returns `None` (and logs a warning) if the selection is outside `root`.
pub fn resolve_asset_path(root: &Path, absolute: &Path) -> Option<String> {
    let resolved = assets::resolve(root, absolute);
    if resolved.is_none() {
        warn!(
            "[Assets] Selected file {:?} is not inside {:?}",
            absolute, root
        );
    }
    resolved
}

/// Trigger a preset from the `presets` table of the loaded config
///
/// Returns `false` if no preset has that name.
pub fn trigger_preset(name: &str) -> bool {
    HAPTICS.trigger_preset(name)
}

/// Release the native player
///
/// A later playback call creates a new one.
pub fn shutdown() -> Result<(), BridgeError> {
    HAPTICS.teardown()
}
