// Haptic Player Core - native haptics bridge
// Completion routing and asset sandboxing over the platform haptics players

// Module declarations
pub mod api;
pub mod assets;
pub mod bridge;
pub mod config;
pub mod context;
pub mod effects;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod platform;
pub mod presets;
pub mod registry;
pub mod telemetry;

// Re-exports for convenience
pub use api::*;
pub use assets::AssetRoot;
pub use context::HapticsContext;
pub use effects::{AndroidBuiltInEffect, IosBuiltInEffect};
pub use gateway::PlaybackGateway;
pub use platform::Platform;
pub use registry::{CallbackPair, CallbackRegistry, RequestId, Resolution};

/// JNI_OnLoad is called when the native library is loaded by Android
///
/// Only logging is set up here. The player needs the activity context,
/// which `NativeHaptics.nativeInit` registers later.
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(
    _vm: jni::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jni::sys::jint {
    logging::init_logging(&config::AppConfig::load().logging.level);

    tracing::info!("JNI_OnLoad called - haptics library loaded");
    telemetry::hub().record_lifecycle(telemetry::LifecyclePhase::LibraryLoaded);

    jni::sys::JNI_VERSION_1_6
}
