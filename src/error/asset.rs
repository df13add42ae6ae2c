// Asset path validation errors

use crate::error::ErrorCode;
use std::fmt;

/// Asset path error code constants
///
/// Error code range: 3001-3006
pub struct AssetPathErrorCodes {}

impl AssetPathErrorCodes {
    pub const EMPTY: i32 = 3001;
    pub const ABSOLUTE: i32 = 3002;
    pub const TRAVERSAL: i32 = 3003;
    pub const OUTSIDE_ROOT: i32 = 3004;
    pub const NOT_A_FILE: i32 = 3005;
    pub const IO: i32 = 3006;
}

/// Reason a relative asset path was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPathError {
    /// Path was empty
    Empty,

    /// Path is absolute or carries a root/drive prefix
    Absolute,

    /// Path contains a parent-directory token
    Traversal,

    /// Canonical target escapes the asset root
    OutsideRoot,

    /// Target exists but is not a regular file
    NotAFile,

    /// Canonicalization failed (missing file, permissions)
    Io { path: String, reason: String },
}

impl ErrorCode for AssetPathError {
    fn code(&self) -> i32 {
        match self {
            AssetPathError::Empty => AssetPathErrorCodes::EMPTY,
            AssetPathError::Absolute => AssetPathErrorCodes::ABSOLUTE,
            AssetPathError::Traversal => AssetPathErrorCodes::TRAVERSAL,
            AssetPathError::OutsideRoot => AssetPathErrorCodes::OUTSIDE_ROOT,
            AssetPathError::NotAFile => AssetPathErrorCodes::NOT_A_FILE,
            AssetPathError::Io { .. } => AssetPathErrorCodes::IO,
        }
    }

    fn message(&self) -> String {
        match self {
            AssetPathError::Empty => "Asset path is empty".to_string(),
            AssetPathError::Absolute => "Asset path must be relative".to_string(),
            AssetPathError::Traversal => {
                "Asset path must not contain parent-directory segments".to_string()
            }
            AssetPathError::OutsideRoot => "Asset path resolves outside the asset root".to_string(),
            AssetPathError::NotAFile => "Asset path does not name a regular file".to_string(),
            AssetPathError::Io { path, reason } => format!("Cannot resolve {}: {}", path, reason),
        }
    }
}

impl fmt::Display for AssetPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message(), self.code())
    }
}

impl std::error::Error for AssetPathError {}
