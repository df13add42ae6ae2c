//! Playback gateway: the façade clients call.
//!
//! Picks the platform's argument (pattern path or built-in effect), wires
//! completion the way the active [`NativeBridge`] needs it, and converts every
//! native failure into either the caller's failure callback or a log line.
//! Nothing here returns an error or panics across the public surface.
//!
//! Per play request: `Dispatched -> Pending -> Resolved(Success | Failure)`.
//! There are no retries and no cancellation.

use std::sync::Arc;

use tracing::{debug, info};

use crate::bridge::{
    Completion, CompletionChannel, CompletionProxy, NativeBridge, PatternFormat,
};
use crate::effects::{AndroidBuiltInEffect, IosBuiltInEffect};
use crate::error::{log_bridge_error, BridgeError, ErrorCode};
use crate::platform::Platform;
use crate::registry::{CallbackPair, CallbackRegistry, CompletionCallback, FailureCallback};
use crate::telemetry::{Outcome, TelemetryHub};

pub struct PlaybackGateway {
    bridge: Arc<dyn NativeBridge>,
    registry: Arc<CallbackRegistry>,
    telemetry: Arc<TelemetryHub>,
}

impl PlaybackGateway {
    /// Gateway over `bridge` with its own registry and telemetry hub.
    pub fn new(bridge: Arc<dyn NativeBridge>) -> Self {
        Self::with_telemetry(bridge, Arc::new(TelemetryHub::default()))
    }

    pub fn with_telemetry(bridge: Arc<dyn NativeBridge>, telemetry: Arc<TelemetryHub>) -> Self {
        let registry = Arc::new(CallbackRegistry::new().with_telemetry(Arc::clone(&telemetry)));
        Self {
            bridge,
            registry,
            telemetry,
        }
    }

    pub fn platform(&self) -> Platform {
        self.bridge.platform()
    }

    pub fn completion_channel(&self) -> CompletionChannel {
        self.bridge.completion_channel()
    }

    /// Registry the trampolines must route into for correlated bridges.
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    pub fn telemetry(&self) -> &Arc<TelemetryHub> {
        &self.telemetry
    }

    /// Play a pattern file: `android_path` (.hac, relative to the Android
    /// assets directory) or `ios_path` (.ahap, relative to the app bundle).
    ///
    /// Exactly one of `on_complete` / `on_fail` runs, at most once, unless the
    /// native player never reports back.
    pub fn play(
        &self,
        android_path: &str,
        ios_path: &str,
        on_complete: Option<CompletionCallback>,
        on_fail: Option<FailureCallback>,
    ) {
        let platform = self.platform();
        let Some(path) = platform.select(android_path, ios_path) else {
            info!(
                "[Gateway] play called with patterns '{}' and '{}' (no-op on unsupported platform)",
                android_path, ios_path
            );
            self.telemetry.record_skipped("play", platform);
            return;
        };

        self.dispatch_play(
            PatternFormat::Auto,
            path,
            CallbackPair::from_options(on_complete, on_fail),
        );
    }

    /// Play a .hac file (Android player only).
    pub fn play_hac(
        &self,
        path: &str,
        on_complete: Option<CompletionCallback>,
        on_fail: Option<FailureCallback>,
    ) {
        self.play_format(PatternFormat::Hac, path, on_complete, on_fail);
    }

    /// Play a .hla file (Android player only).
    pub fn play_hla(
        &self,
        path: &str,
        on_complete: Option<CompletionCallback>,
        on_fail: Option<FailureCallback>,
    ) {
        self.play_format(PatternFormat::Hla, path, on_complete, on_fail);
    }

    /// Play an .ogg file (Android player only).
    pub fn play_ogg(
        &self,
        path: &str,
        on_complete: Option<CompletionCallback>,
        on_fail: Option<FailureCallback>,
    ) {
        self.play_format(PatternFormat::Ogg, path, on_complete, on_fail);
    }

    /// Play the platform's built-in effect.
    pub fn play_built_in(&self, android_effect: AndroidBuiltInEffect, ios_effect: IosBuiltInEffect) {
        let platform = self.platform();
        let Some(name) = platform.select(android_effect.native_name(), ios_effect.native_name())
        else {
            info!(
                "[Gateway] playBuiltIn called with effects '{}, {}' (no-op on unsupported platform)",
                android_effect, ios_effect
            );
            self.telemetry.record_skipped("playBuiltIn", platform);
            return;
        };

        self.fire_and_forget("playBuiltIn", || self.bridge.play_built_in(name));
    }

    /// Preload a pattern for lower-latency playback.
    pub fn preload(&self, path: &str) {
        self.fire_and_forget_path("preload", path, |bridge| {
            bridge.preload(PatternFormat::Auto, path)
        });
    }

    pub fn preload_ogg(&self, path: &str) {
        self.fire_and_forget_path("preloadOGG", path, |bridge| {
            bridge.preload(PatternFormat::Ogg, path)
        });
    }

    /// Unload a preloaded pattern file or a whole directory of them.
    pub fn unload(&self, path_or_dir: &str) {
        self.fire_and_forget_path("unload", path_or_dir, |bridge| {
            bridge.unload(PatternFormat::Auto, path_or_dir)
        });
    }

    pub fn unload_ogg(&self, path: &str) {
        self.fire_and_forget_path("unloadOGG", path, |bridge| {
            bridge.unload(PatternFormat::Ogg, path)
        });
    }

    pub fn unload_all(&self) {
        if self.skip_on_unsupported("unloadAll") {
            return;
        }
        self.fire_and_forget("unloadAll", || self.bridge.unload_all());
    }

    pub fn set_haptics_muted(&self, muted: bool) {
        if self.skip_on_unsupported("setHapticsMuted") {
            return;
        }
        self.fire_and_forget("setHapticsMuted", || self.bridge.set_haptics_muted(muted));
    }

    /// `false` when the platform cannot mute or the query fails.
    pub fn is_haptics_muted(&self) -> bool {
        if self.skip_on_unsupported("isHapticsMuted") {
            return false;
        }
        self.query("isHapticsMuted", || self.bridge.is_haptics_muted())
    }

    pub fn set_audio_muted(&self, muted: bool) {
        if self.skip_on_unsupported("setAudioMuted") {
            return;
        }
        self.fire_and_forget("setAudioMuted", || self.bridge.set_audio_muted(muted));
    }

    pub fn is_audio_muted(&self) -> bool {
        if self.skip_on_unsupported("isAudioMuted") {
            return false;
        }
        self.query("isAudioMuted", || self.bridge.is_audio_muted())
    }

    fn play_format(
        &self,
        format: PatternFormat,
        path: &str,
        on_complete: Option<CompletionCallback>,
        on_fail: Option<FailureCallback>,
    ) {
        if self.skip_on_unsupported(format.play_method()) {
            return;
        }
        self.dispatch_play(format, path, CallbackPair::from_options(on_complete, on_fail));
    }

    fn dispatch_play(&self, format: PatternFormat, path: &str, pair: CallbackPair) {
        let operation = format.play_method();

        match self.bridge.completion_channel() {
            CompletionChannel::Proxy => {
                let (on_success, on_failure) = pair.into_parts();
                let telemetry = Arc::clone(&self.telemetry);
                let proxy = CompletionProxy::new(move || {
                    telemetry.record_resolution(None, Outcome::Success);
                    on_success();
                });

                self.telemetry.record_dispatch(operation, None);
                debug!("[Gateway] {}('{}') dispatched", operation, path);

                if let Err(err) = self.bridge.play(format, path, Completion::Proxy(proxy)) {
                    self.report_failure(operation, &err);
                    self.telemetry.record_resolution(None, Outcome::Failure);
                    on_failure(err.message());
                }
            }
            CompletionChannel::Correlated => {
                let id = self.registry.register(pair);
                self.telemetry.record_dispatch(operation, Some(id.get()));
                debug!("[Gateway] {}('{}') dispatched as {}", operation, path, id);

                if let Err(err) = self.bridge.play(format, path, Completion::Correlated(id)) {
                    self.report_failure(operation, &err);
                    // The registry arbitrates against a racing native signal.
                    self.registry.resolve_failure(id, err.message());
                }
            }
        }
    }

    fn fire_and_forget_path(
        &self,
        operation: &str,
        path: &str,
        call: impl FnOnce(&dyn NativeBridge) -> Result<(), BridgeError>,
    ) {
        if self.platform() == Platform::Unsupported {
            info!(
                "[Gateway] {} called with '{}' (no-op on unsupported platform)",
                operation, path
            );
            self.telemetry.record_skipped(operation, Platform::Unsupported);
            return;
        }
        self.fire_and_forget(operation, || call(self.bridge.as_ref()));
    }

    /// Issue a call with no failure channel: failures are logged and dropped.
    fn fire_and_forget(&self, operation: &str, call: impl FnOnce() -> Result<(), BridgeError>) {
        self.telemetry.record_dispatch(operation, None);
        if let Err(err) = call() {
            self.report_failure(operation, &err);
        }
    }

    fn query(&self, operation: &str, call: impl FnOnce() -> Result<bool, BridgeError>) -> bool {
        call().unwrap_or_else(|err| {
            self.report_failure(operation, &err);
            false
        })
    }

    fn skip_on_unsupported(&self, operation: &str) -> bool {
        let platform = self.platform();
        if platform.is_supported() {
            return false;
        }
        info!("[Gateway] {} called (no-op on unsupported platform)", operation);
        self.telemetry.record_skipped(operation, platform);
        true
    }

    fn report_failure(&self, operation: &str, err: &BridgeError) {
        match err {
            BridgeError::Unsupported { .. } => {
                info!(
                    "[Gateway] {} is not available on {}",
                    operation,
                    self.platform().as_str()
                );
                self.telemetry.record_skipped(operation, self.platform());
            }
            _ => {
                log_bridge_error(err, operation);
                self.telemetry.record_failure(operation, err);
            }
        }
    }
}
