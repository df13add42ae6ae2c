//! Logging initialization.
//!
//! All runtime logging goes through `tracing`. On Android events are written
//! to logcat under the `HapticPlayer` tag; elsewhere they go to stderr via the
//! `fmt` subscriber. `log` records (from config loading) are bridged in by
//! `try_init`.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logcat tag on Android.
pub const LOG_TAG: &str = "HapticPlayer";

/// Build the filter: `RUST_LOG` when set, otherwise `level`, otherwise `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Safe to call more than once; only the first call installs anything.
#[cfg(target_os = "android")]
pub fn init_logging(level: &str) {
    let layer = match tracing_android::layer(LOG_TAG) {
        Ok(layer) => layer,
        Err(err) => {
            eprintln!("{}: failed to open logcat: {}", LOG_TAG, err);
            return;
        }
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(layer)
        .try_init();
}

/// Install the global subscriber.
///
/// Safe to call more than once; only the first call installs anything.
#[cfg(not(target_os = "android"))]
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("debug");
        init_logging("trace");
        tracing::info!("[Logging] still alive after double init");
    }

    #[test]
    fn test_invalid_level_falls_back() {
        // Must not panic on garbage directives.
        let _ = env_filter("[[not a directive");
    }
}
