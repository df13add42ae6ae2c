// Native bridge error types and constants

use crate::error::ErrorCode;
use std::fmt;
use tracing::error;

/// Bridge error code constants
///
/// Single source of truth for the numeric codes reported by [`BridgeError`].
///
/// Error code range: 2001-2008
pub struct BridgeErrorCodes {}

impl BridgeErrorCodes {
    /// Native player handle could not be obtained
    pub const PLAYER_UNAVAILABLE: i32 = 2001;

    /// Native call raised an exception or reported failure synchronously
    pub const NATIVE_CALL: i32 = 2002;

    /// JNI environment/attachment failure on Android
    pub const JNI_FAILURE: i32 = 2003;

    /// Argument could not be converted for the native side (e.g. interior NUL)
    pub const INVALID_STRING: i32 = 2004;

    /// Operation has no counterpart on the active platform
    pub const UNSUPPORTED: i32 = 2005;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 2006;

    /// Android context was not initialized before player construction
    pub const CONTEXT_NOT_INITIALIZED: i32 = 2007;

    /// Native player construction failed
    pub const INIT_FAILED: i32 = 2008;
}

/// Log a bridge error with structured context
///
/// Emits the error code, component and message alongside the call-site
/// context. Never panics.
pub fn log_bridge_error(err: &BridgeError, context: &str) {
    error!(
        code = err.code(),
        component = "NativeBridge",
        "Bridge error in {}: {}",
        context,
        err.message()
    );
}

/// Errors raised at the native bridge boundary
///
/// None of these cross the public surface: the gateway converts them into a
/// failure callback or a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Native player handle could not be obtained
    PlayerUnavailable,

    /// Native call failed (Java exception, native error)
    NativeCall { operation: String, reason: String },

    /// JNI environment/attachment failure
    JniFailure { reason: String },

    /// String argument not representable on the native side
    InvalidString { value: String },

    /// Operation not available on this platform
    Unsupported { operation: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Android context missing
    ContextNotInitialized,

    /// Player construction failed
    InitFailed { reason: String },
}

impl BridgeError {
    pub fn native_call(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        BridgeError::NativeCall {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        BridgeError::Unsupported {
            operation: operation.into(),
        }
    }
}

impl ErrorCode for BridgeError {
    fn code(&self) -> i32 {
        match self {
            BridgeError::PlayerUnavailable => BridgeErrorCodes::PLAYER_UNAVAILABLE,
            BridgeError::NativeCall { .. } => BridgeErrorCodes::NATIVE_CALL,
            BridgeError::JniFailure { .. } => BridgeErrorCodes::JNI_FAILURE,
            BridgeError::InvalidString { .. } => BridgeErrorCodes::INVALID_STRING,
            BridgeError::Unsupported { .. } => BridgeErrorCodes::UNSUPPORTED,
            BridgeError::LockPoisoned { .. } => BridgeErrorCodes::LOCK_POISONED,
            BridgeError::ContextNotInitialized => BridgeErrorCodes::CONTEXT_NOT_INITIALIZED,
            BridgeError::InitFailed { .. } => BridgeErrorCodes::INIT_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            BridgeError::PlayerUnavailable => "Native haptics player unavailable".to_string(),
            BridgeError::NativeCall { operation, reason } => {
                format!("Native call '{}' failed: {}", operation, reason)
            }
            BridgeError::JniFailure { reason } => format!("JNI failure: {}", reason),
            BridgeError::InvalidString { value } => {
                format!("String cannot be passed to native code: {:?}", value)
            }
            BridgeError::Unsupported { operation } => {
                format!("'{}' is not supported on this platform", operation)
            }
            BridgeError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            BridgeError::ContextNotInitialized => {
                "Android context not initialized. Load the library through System.loadLibrary first."
                    .to_string()
            }
            BridgeError::InitFailed { reason } => {
                format!("Haptics player initialization failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BridgeError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for BridgeError {}

impl From<std::ffi::NulError> for BridgeError {
    fn from(err: std::ffi::NulError) -> Self {
        let value = String::from_utf8_lossy(&err.into_vec()).into_owned();
        BridgeError::InvalidString { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_bridge_error_codes() {
        assert_eq!(
            BridgeError::PlayerUnavailable.code(),
            BridgeErrorCodes::PLAYER_UNAVAILABLE
        );
        assert_eq!(
            BridgeError::native_call("play", "boom").code(),
            BridgeErrorCodes::NATIVE_CALL
        );
        assert_eq!(
            BridgeError::JniFailure {
                reason: "detached".to_string()
            }
            .code(),
            BridgeErrorCodes::JNI_FAILURE
        );
        assert_eq!(
            BridgeError::unsupported("playOGG").code(),
            BridgeErrorCodes::UNSUPPORTED
        );
        assert_eq!(
            BridgeError::ContextNotInitialized.code(),
            BridgeErrorCodes::CONTEXT_NOT_INITIALIZED
        );
        assert_eq!(
            BridgeError::InitFailed {
                reason: "x".to_string()
            }
            .code(),
            2008
        );
    }

    #[test]
    fn test_native_call_message_includes_operation() {
        let err = BridgeError::native_call("playHAC", "FileNotFoundException");
        assert_eq!(
            err.message(),
            "Native call 'playHAC' failed: FileNotFoundException"
        );
        assert!(err.to_string().contains("2002"));
    }

    #[test]
    fn test_from_nul_error() {
        let nul = CString::new("bad\0path").unwrap_err();
        let err: BridgeError = nul.into();
        match err {
            BridgeError::InvalidString { value } => assert!(value.starts_with("bad")),
            other => panic!("Expected InvalidString, got {:?}", other),
        }
    }
}
