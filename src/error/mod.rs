// Error types for the haptics player
//
// This module defines custom error types for native bridge dispatch and asset
// path validation, providing structured error handling with error codes that
// stay stable across the FFI boundary.

mod asset;
mod bridge;

pub use asset::{AssetPathError, AssetPathErrorCodes};
pub use bridge::{log_bridge_error, BridgeError, BridgeErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
