//! Compile-time platform selection.

use serde::{Deserialize, Serialize};

/// Target runtime the native haptics player is available on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
    /// Desktop, editor and test builds. Every operation is a logged no-op.
    Unsupported,
}

impl Platform {
    pub fn current() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(target_os = "android")] {
                Platform::Android
            } else if #[cfg(target_os = "ios")] {
                Platform::Ios
            } else {
                Platform::Unsupported
            }
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Platform::Unsupported)
    }

    /// Pick the per-platform argument out of an `(android, ios)` pair.
    pub fn select<T>(self, android: T, ios: T) -> Option<T> {
        match self {
            Platform::Android => Some(android),
            Platform::Ios => Some(ios),
            Platform::Unsupported => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Unsupported => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_picks_platform_argument() {
        assert_eq!(Platform::Android.select("a.hac", "b.ahap"), Some("a.hac"));
        assert_eq!(Platform::Ios.select("a.hac", "b.ahap"), Some("b.ahap"));
        assert_eq!(Platform::Unsupported.select("a.hac", "b.ahap"), None);
    }

    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    #[test]
    fn test_desktop_is_unsupported() {
        assert_eq!(Platform::current(), Platform::Unsupported);
        assert!(!Platform::current().is_supported());
    }
}
