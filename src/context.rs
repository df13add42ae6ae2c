// HapticsContext: Dependency Injection Container
// Owns the lazily created native player and everything wired to it

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::assets::AssetRoot;
use crate::bridge::trampoline::{self, TrampolineRoute};
use crate::bridge::{
    platform_bridge, Completion, CompletionChannel, NativeBridge, PatternFormat,
};
use crate::config::AppConfig;
use crate::error::{log_bridge_error, BridgeError};
use crate::gateway::PlaybackGateway;
use crate::platform::Platform;
use crate::telemetry::{self, LifecyclePhase, TelemetryHub};

/// Constructs the native bridge on first use.
pub type BridgeFactory =
    Box<dyn Fn(&AppConfig) -> Result<Arc<dyn NativeBridge>, BridgeError> + Send + Sync>;

/// Live player plus the trampoline route that feeds its registry.
struct Session {
    gateway: Arc<PlaybackGateway>,
    // Dropping the session uninstalls the route.
    route: Option<TrampolineRoute>,
}

/// HapticsContext: single owner of the native player handle
///
/// The player is created on the first [`gateway`](Self::gateway) call, not
/// at load time, so the host runtime has a chance to register its context
/// first. A failed construction is logged and retried on the next call.
/// [`teardown`](Self::teardown) releases the player; a later call creates a
/// fresh one.
pub struct HapticsContext {
    config: AppConfig,
    assets: AssetRoot,
    factory: BridgeFactory,
    telemetry: Arc<TelemetryHub>,
    session: Mutex<Option<Session>>,
}

impl HapticsContext {
    /// Context over the platform's real native player.
    pub fn new(config: AppConfig) -> Self {
        Self::with_bridge_factory(config, Box::new(platform_bridge))
    }

    pub fn with_bridge_factory(config: AppConfig, factory: BridgeFactory) -> Self {
        let assets = config.asset_root();
        Self {
            config,
            assets,
            factory,
            telemetry: telemetry::hub(),
            session: Mutex::new(None),
        }
    }

    /// Context over an already constructed bridge (desktop stub, tests).
    pub fn with_bridge(config: AppConfig, bridge: Arc<dyn NativeBridge>) -> Self {
        Self::with_bridge_factory(config, Box::new(move |_| Ok(Arc::clone(&bridge))))
    }

    /// Record into `telemetry` instead of the global hub.
    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryHub>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetRoot {
        &self.assets
    }

    pub fn telemetry(&self) -> &Arc<TelemetryHub> {
        &self.telemetry
    }

    /// Safely acquire lock on the session
    ///
    /// Returns MutexGuard or BridgeError::LockPoisoned on lock failure
    fn lock_session(&self) -> Result<MutexGuard<'_, Option<Session>>, BridgeError> {
        self.session.lock().map_err(|_| BridgeError::LockPoisoned {
            component: "haptics_session".to_string(),
        })
    }

    /// Gateway over the live player, creating the player on first use.
    ///
    /// Never fails: if the player cannot be created the returned gateway
    /// reports [`BridgeError::PlayerUnavailable`] for every call and nothing
    /// is cached, so the next call tries again.
    pub fn gateway(&self) -> Arc<PlaybackGateway> {
        let mut session = match self.lock_session() {
            Ok(session) => session,
            Err(err) => {
                log_bridge_error(&err, "gateway");
                return self.unavailable_gateway();
            }
        };

        if let Some(live) = session.as_ref() {
            return Arc::clone(&live.gateway);
        }

        let bridge = match (self.factory)(&self.config) {
            Ok(bridge) => bridge,
            Err(err) => {
                log_bridge_error(&err, "player initialization");
                self.telemetry.record_failure("initialize", &err);
                return self.unavailable_gateway();
            }
        };

        let gateway = Arc::new(PlaybackGateway::with_telemetry(
            bridge,
            Arc::clone(&self.telemetry),
        ));
        self.telemetry
            .record_lifecycle(LifecyclePhase::PlayerInitialized);

        // Configured presets get their patterns preloaded on the new player.
        for preset in self.config.presets.values() {
            preset.attach(&gateway);
        }

        let route = match gateway.completion_channel() {
            CompletionChannel::Correlated => {
                let route = trampoline::install(Arc::clone(gateway.registry()));
                self.telemetry.record_lifecycle(LifecyclePhase::RouteInstalled);
                Some(route)
            }
            CompletionChannel::Proxy => None,
        };

        info!(
            "[Context] Haptics player ready on {}",
            gateway.platform().as_str()
        );
        *session = Some(Session {
            gateway: Arc::clone(&gateway),
            route,
        });
        gateway
    }

    /// Trigger the configured preset `name`.
    ///
    /// Returns `false` if no preset has that name.
    pub fn trigger_preset(&self, name: &str) -> bool {
        match self.config.presets.get(name) {
            Some(preset) => {
                preset.trigger(&self.gateway(), &self.assets);
                true
            }
            None => {
                warn!("[Presets] Unknown preset '{}'", name);
                false
            }
        }
    }

    /// Whether a live player is currently held.
    pub fn is_initialized(&self) -> bool {
        self.lock_session()
            .map(|session| session.is_some())
            .unwrap_or(false)
    }

    /// Release the player and uninstall the trampoline route.
    ///
    /// Pending correlated requests are abandoned; late signals for them are
    /// ignored. Safe to call when nothing is initialized.
    pub fn teardown(&self) -> Result<(), BridgeError> {
        let released = self
            .lock_session()
            .map_err(|err| {
                log_bridge_error(&err, "teardown");
                err
            })?
            .take();

        if let Some(Session { gateway, route }) = released {
            if let Some(route) = route {
                drop(route);
                self.telemetry.record_lifecycle(LifecyclePhase::RouteRemoved);
            }
            let abandoned = gateway.registry().pending();
            if abandoned > 0 {
                info!("[Context] Releasing player with {} pending requests", abandoned);
            }
            self.telemetry.record_lifecycle(LifecyclePhase::PlayerReleased);
        }
        Ok(())
    }

    fn unavailable_gateway(&self) -> Arc<PlaybackGateway> {
        Arc::new(PlaybackGateway::with_telemetry(
            Arc::new(UnavailableBridge),
            Arc::clone(&self.telemetry),
        ))
    }
}

impl Default for HapticsContext {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// Stand-in while the native player cannot be constructed.
struct UnavailableBridge;

impl NativeBridge for UnavailableBridge {
    fn platform(&self) -> Platform {
        Platform::current()
    }

    fn completion_channel(&self) -> CompletionChannel {
        CompletionChannel::Proxy
    }

    fn play(
        &self,
        _format: PatternFormat,
        _path: &str,
        _completion: Completion,
    ) -> Result<(), BridgeError> {
        Err(BridgeError::PlayerUnavailable)
    }

    fn play_built_in(&self, _effect_name: &str) -> Result<(), BridgeError> {
        Err(BridgeError::PlayerUnavailable)
    }

    fn preload(&self, _format: PatternFormat, _path: &str) -> Result<(), BridgeError> {
        Err(BridgeError::PlayerUnavailable)
    }

    fn unload(&self, _format: PatternFormat, _path_or_dir: &str) -> Result<(), BridgeError> {
        Err(BridgeError::PlayerUnavailable)
    }

    fn unload_all(&self) -> Result<(), BridgeError> {
        Err(BridgeError::PlayerUnavailable)
    }
}
