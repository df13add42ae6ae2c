//! C-ABI bridge to the iOS haptics player library.
//!
//! Free-function shape: the library is initialized once and every AHAP play
//! carries a correlation id plus the two process-wide trampolines.

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::sync::Once;

use tracing::{info, warn};

use crate::error::BridgeError;
use crate::platform::Platform;

use super::trampoline::{self, CompleteFn, FailureFn};
use super::{Completion, CompletionChannel, NativeBridge, PatternFormat};

extern "C" {
    fn _initializeIOSHapticlabsPlayer();
    fn _playPredefinedIOSVibration(pattern_name: *const c_char);
    fn _playIOSAHAP(
        ahap_path: *const c_char,
        callback_id: c_int,
        on_completion: CompleteFn,
        on_failure: FailureFn,
    );
    fn _setIOSAHAPHapticsMuted(muted: bool);
    fn _isIOSAHAPHapticsMuted() -> bool;
    fn _setIOSAHAPAudioMuted(muted: bool);
    fn _isIOSAHAPAudioMuted() -> bool;
}

static PLAYER_INIT: Once = Once::new();

/// Handle on the process-wide iOS player.
#[derive(Debug)]
pub struct IosHapticsBridge {
    _private: (),
}

impl IosHapticsBridge {
    pub fn new() -> Self {
        PLAYER_INIT.call_once(|| {
            // SAFETY: no arguments; the library tolerates being called from any thread.
            unsafe { _initializeIOSHapticlabsPlayer() };
            info!("[Bridge] iOS haptics player initialized");
        });
        Self { _private: () }
    }
}

impl Default for IosHapticsBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBridge for IosHapticsBridge {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn completion_channel(&self) -> CompletionChannel {
        CompletionChannel::Correlated
    }

    fn play(
        &self,
        format: PatternFormat,
        path: &str,
        completion: Completion,
    ) -> Result<(), BridgeError> {
        if format != PatternFormat::Auto {
            return Err(BridgeError::unsupported(format.play_method()));
        }
        let id = match completion {
            Completion::Correlated(id) => id,
            Completion::Proxy(_) => {
                warn!("[Bridge] iOS player cannot carry completion objects");
                return Err(BridgeError::unsupported("playAHAP"));
            }
        };

        let c_path = CString::new(path)?;
        let (on_complete, on_failure) = trampoline::entry_points();
        // SAFETY: `c_path` outlives the call; the library copies the path.
        unsafe { _playIOSAHAP(c_path.as_ptr(), id.get(), on_complete, on_failure) };
        Ok(())
    }

    fn play_built_in(&self, effect_name: &str) -> Result<(), BridgeError> {
        let c_name = CString::new(effect_name)?;
        // SAFETY: `c_name` outlives the call.
        unsafe { _playPredefinedIOSVibration(c_name.as_ptr()) };
        Ok(())
    }

    fn set_haptics_muted(&self, muted: bool) -> Result<(), BridgeError> {
        // SAFETY: plain value argument.
        unsafe { _setIOSAHAPHapticsMuted(muted) };
        Ok(())
    }

    fn is_haptics_muted(&self) -> Result<bool, BridgeError> {
        // SAFETY: no arguments.
        Ok(unsafe { _isIOSAHAPHapticsMuted() })
    }

    fn set_audio_muted(&self, muted: bool) -> Result<(), BridgeError> {
        // SAFETY: plain value argument.
        unsafe { _setIOSAHAPAudioMuted(muted) };
        Ok(())
    }

    fn is_audio_muted(&self) -> Result<bool, BridgeError> {
        // SAFETY: no arguments.
        Ok(unsafe { _isIOSAHAPAudioMuted() })
    }
}
