//! Native bridge abstractions.
//!
//! The two native players disagree on how completion comes back:
//!
//! * Android hands a live callback object (`Function0`) to a JVM method, so
//!   each call carries its own closure ([`CompletionChannel::Proxy`]).
//! * iOS only accepts bare C function pointers, so each call carries a
//!   [`RequestId`] and the two static [`trampoline`]s route the signal back
//!   through the [`CallbackRegistry`](crate::registry::CallbackRegistry)
//!   ([`CompletionChannel::Correlated`]).
//!
//! [`NativeBridge`] hides both shapes behind one trait; the gateway inspects
//! [`NativeBridge::completion_channel`] to decide how to wire callbacks.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::BridgeError;
use crate::platform::Platform;
use crate::registry::{CompletionCallback, RequestId};

pub mod trampoline;

#[cfg(target_os = "android")]
pub mod android;
#[cfg(target_os = "android")]
pub use android::JniHapticsBridge;

#[cfg(target_os = "ios")]
pub mod ios;
#[cfg(target_os = "ios")]
pub use ios::IosHapticsBridge;

mod desktop_stub;
mod noop;

pub use desktop_stub::{DesktopStubBridge, StubCall};
pub use noop::NoopBridge;

/// How a bridge reports playback completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChannel {
    /// A per-call callback object is handed to the native player.
    Proxy,
    /// Each call carries a correlation id resolved through the trampolines.
    Correlated,
}

/// Completion wiring for one play call.
#[derive(Debug)]
pub enum Completion {
    Proxy(CompletionProxy),
    Correlated(RequestId),
}

/// Long-lived completion handle the native player invokes zero or one times.
pub struct CompletionProxy {
    callback: CompletionCallback,
}

impl CompletionProxy {
    pub fn new(callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    pub fn invoke(self) {
        (self.callback)()
    }

    /// Move the proxy behind an opaque handle owned by foreign code.
    pub fn into_handle(self) -> i64 {
        Box::into_raw(Box::new(self)) as i64
    }

    /// Take back ownership of a handle; `0` yields `None`.
    ///
    /// Dropping the returned proxy without invoking it releases the callback
    /// unrun.
    ///
    /// # Safety
    /// `handle` must be `0` or come from [`into_handle`](Self::into_handle)
    /// and not have been reclaimed before.
    pub unsafe fn from_handle(handle: i64) -> Option<Self> {
        if handle == 0 {
            return None;
        }
        Some(*Box::from_raw(handle as *mut Self))
    }
}

impl fmt::Debug for CompletionProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionProxy").finish_non_exhaustive()
    }
}

/// Pattern file flavour, selecting the Android player method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFormat {
    /// Let the player pick by extension (`play`, `preload`, `unload`).
    Auto,
    Hac,
    Hla,
    Ogg,
}

impl PatternFormat {
    pub fn play_method(self) -> &'static str {
        match self {
            PatternFormat::Auto => "play",
            PatternFormat::Hac => "playHAC",
            PatternFormat::Hla => "playHLA",
            PatternFormat::Ogg => "playOGG",
        }
    }

    pub fn preload_method(self) -> Option<&'static str> {
        match self {
            PatternFormat::Auto | PatternFormat::Hac => Some("preload"),
            PatternFormat::Ogg => Some("preloadOGG"),
            PatternFormat::Hla => None,
        }
    }

    pub fn unload_method(self) -> Option<&'static str> {
        match self {
            PatternFormat::Auto | PatternFormat::Hac => Some("unload"),
            PatternFormat::Ogg => Some("unloadOGG"),
            PatternFormat::Hla => None,
        }
    }
}

/// Trait implemented by platform-specific native haptics players.
///
/// Capability methods a platform lacks keep their default and report
/// [`BridgeError::Unsupported`].
pub trait NativeBridge: Send + Sync {
    fn platform(&self) -> Platform;

    fn completion_channel(&self) -> CompletionChannel;

    fn play(
        &self,
        format: PatternFormat,
        path: &str,
        completion: Completion,
    ) -> Result<(), BridgeError>;

    fn play_built_in(&self, effect_name: &str) -> Result<(), BridgeError>;

    fn preload(&self, format: PatternFormat, _path: &str) -> Result<(), BridgeError> {
        Err(BridgeError::unsupported(
            format.preload_method().unwrap_or("preload"),
        ))
    }

    fn unload(&self, format: PatternFormat, _path_or_dir: &str) -> Result<(), BridgeError> {
        Err(BridgeError::unsupported(
            format.unload_method().unwrap_or("unload"),
        ))
    }

    fn unload_all(&self) -> Result<(), BridgeError> {
        Err(BridgeError::unsupported("unloadAll"))
    }

    fn set_haptics_muted(&self, _muted: bool) -> Result<(), BridgeError> {
        Err(BridgeError::unsupported("setHapticsMuted"))
    }

    fn is_haptics_muted(&self) -> Result<bool, BridgeError> {
        Err(BridgeError::unsupported("isHapticsMuted"))
    }

    fn set_audio_muted(&self, _muted: bool) -> Result<(), BridgeError> {
        Err(BridgeError::unsupported("setAudioMuted"))
    }

    fn is_audio_muted(&self) -> Result<bool, BridgeError> {
        Err(BridgeError::unsupported("isAudioMuted"))
    }
}

/// Construct the native bridge for the compilation target.
pub fn platform_bridge(config: &AppConfig) -> Result<Arc<dyn NativeBridge>, BridgeError> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "android")] {
            Ok(Arc::new(JniHapticsBridge::new(&config.android)?))
        } else if #[cfg(target_os = "ios")] {
            let _ = config;
            Ok(Arc::new(IosHapticsBridge::new()))
        } else {
            let _ = config;
            Ok(Arc::new(NoopBridge))
        }
    }
}
