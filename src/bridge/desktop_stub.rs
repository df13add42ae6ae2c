use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::BridgeError;
use crate::platform::Platform;
use crate::registry::RequestId;

use super::{Completion, CompletionChannel, CompletionProxy, NativeBridge, PatternFormat};

/// Call observed by [`DesktopStubBridge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum StubCall {
    Play {
        method: String,
        path: String,
        request_id: Option<i32>,
    },
    PlayBuiltIn {
        name: String,
    },
    Preload {
        method: String,
        path: String,
    },
    Unload {
        method: String,
        path: String,
    },
    UnloadAll,
    SetHapticsMuted {
        muted: bool,
    },
    SetAudioMuted {
        muted: bool,
    },
}

/// Desktop stand-in for a native player used by tests and CLI tooling.
///
/// Simulates either platform's capability set and completion shape without
/// any foreign calls. Completions stay pending until the caller drives them
/// with [`complete_next_proxy`](Self::complete_next_proxy) or by feeding the
/// ids from [`take_correlated`](Self::take_correlated) to the trampolines.
pub struct DesktopStubBridge {
    platform: Platform,
    calls: Mutex<Vec<StubCall>>,
    proxies: Mutex<VecDeque<CompletionProxy>>,
    correlated: Mutex<VecDeque<RequestId>>,
    failure: Mutex<Option<String>>,
    haptics_muted: AtomicBool,
    audio_muted: AtomicBool,
}

impl DesktopStubBridge {
    /// Simulated Android player (object-call shape).
    pub fn android() -> Self {
        Self::with_platform(Platform::Android)
    }

    /// Simulated iOS player (free-function shape).
    pub fn ios() -> Self {
        Self::with_platform(Platform::Ios)
    }

    fn with_platform(platform: Platform) -> Self {
        Self {
            platform,
            calls: Mutex::new(Vec::new()),
            proxies: Mutex::new(VecDeque::new()),
            correlated: Mutex::new(VecDeque::new()),
            failure: Mutex::new(None),
            haptics_muted: AtomicBool::new(false),
            audio_muted: AtomicBool::new(false),
        }
    }

    /// Make every following call fail with `reason`, as a thrown native error would.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *lock(&self.failure) = Some(reason.into());
    }

    pub fn clear_failure(&self) {
        *lock(&self.failure) = None;
    }

    pub fn calls(&self) -> Vec<StubCall> {
        lock(&self.calls).clone()
    }

    /// Fire the oldest pending completion proxy. Returns `false` if none.
    pub fn complete_next_proxy(&self) -> bool {
        // Take it out before invoking; the callback may call back into us.
        let proxy = lock(&self.proxies).pop_front();
        match proxy {
            Some(proxy) => {
                proxy.invoke();
                true
            }
            None => false,
        }
    }

    pub fn pending_proxies(&self) -> usize {
        lock(&self.proxies).len()
    }

    /// Drain the correlation ids handed to the simulated native layer.
    pub fn take_correlated(&self) -> Vec<RequestId> {
        lock(&self.correlated).drain(..).collect()
    }

    fn check_failure(&self, operation: &str) -> Result<(), BridgeError> {
        match lock(&self.failure).as_ref() {
            Some(reason) => Err(BridgeError::native_call(operation, reason.clone())),
            None => Ok(()),
        }
    }

    fn record(&self, call: StubCall) {
        lock(&self.calls).push(call);
    }

    fn require(&self, platform: Platform, operation: &str) -> Result<(), BridgeError> {
        if self.platform == platform {
            Ok(())
        } else {
            Err(BridgeError::unsupported(operation))
        }
    }
}

impl NativeBridge for DesktopStubBridge {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn completion_channel(&self) -> CompletionChannel {
        match self.platform {
            Platform::Ios => CompletionChannel::Correlated,
            _ => CompletionChannel::Proxy,
        }
    }

    fn play(
        &self,
        format: PatternFormat,
        path: &str,
        completion: Completion,
    ) -> Result<(), BridgeError> {
        let method = format.play_method();
        if self.platform == Platform::Ios && format != PatternFormat::Auto {
            return Err(BridgeError::unsupported(method));
        }
        self.check_failure(method)?;

        let request_id = match completion {
            Completion::Proxy(proxy) => {
                lock(&self.proxies).push_back(proxy);
                None
            }
            Completion::Correlated(id) => {
                lock(&self.correlated).push_back(id);
                Some(id.get())
            }
        };
        self.record(StubCall::Play {
            method: method.to_string(),
            path: path.to_string(),
            request_id,
        });
        Ok(())
    }

    fn play_built_in(&self, effect_name: &str) -> Result<(), BridgeError> {
        self.check_failure("playBuiltIn")?;
        self.record(StubCall::PlayBuiltIn {
            name: effect_name.to_string(),
        });
        Ok(())
    }

    fn preload(&self, format: PatternFormat, path: &str) -> Result<(), BridgeError> {
        let method = format.preload_method().unwrap_or("preload");
        self.require(Platform::Android, method)?;
        if format.preload_method().is_none() {
            return Err(BridgeError::unsupported(method));
        }
        self.check_failure(method)?;
        self.record(StubCall::Preload {
            method: method.to_string(),
            path: path.to_string(),
        });
        Ok(())
    }

    fn unload(&self, format: PatternFormat, path_or_dir: &str) -> Result<(), BridgeError> {
        let method = format.unload_method().unwrap_or("unload");
        self.require(Platform::Android, method)?;
        if format.unload_method().is_none() {
            return Err(BridgeError::unsupported(method));
        }
        self.check_failure(method)?;
        self.record(StubCall::Unload {
            method: method.to_string(),
            path: path_or_dir.to_string(),
        });
        Ok(())
    }

    fn unload_all(&self) -> Result<(), BridgeError> {
        self.require(Platform::Android, "unloadAll")?;
        self.check_failure("unloadAll")?;
        self.record(StubCall::UnloadAll);
        Ok(())
    }

    fn set_haptics_muted(&self, muted: bool) -> Result<(), BridgeError> {
        self.require(Platform::Ios, "setHapticsMuted")?;
        self.check_failure("setHapticsMuted")?;
        self.haptics_muted.store(muted, Ordering::SeqCst);
        self.record(StubCall::SetHapticsMuted { muted });
        Ok(())
    }

    fn is_haptics_muted(&self) -> Result<bool, BridgeError> {
        self.require(Platform::Ios, "isHapticsMuted")?;
        self.check_failure("isHapticsMuted")?;
        Ok(self.haptics_muted.load(Ordering::SeqCst))
    }

    fn set_audio_muted(&self, muted: bool) -> Result<(), BridgeError> {
        self.require(Platform::Ios, "setAudioMuted")?;
        self.check_failure("setAudioMuted")?;
        self.audio_muted.store(muted, Ordering::SeqCst);
        self.record(StubCall::SetAudioMuted { muted });
        Ok(())
    }

    fn is_audio_muted(&self) -> Result<bool, BridgeError> {
        self.require(Platform::Ios, "isAudioMuted")?;
        self.check_failure("isAudioMuted")?;
        Ok(self.audio_muted.load(Ordering::SeqCst))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_android_stub_holds_proxy_until_completed() {
        let stub = DesktopStubBridge::android();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        stub.play(
            PatternFormat::Hac,
            "AndroidSamples/Button.hac",
            Completion::Proxy(CompletionProxy::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();

        assert_eq!(stub.pending_proxies(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(stub.complete_next_proxy());
        assert!(!stub.complete_next_proxy());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(
            stub.calls(),
            vec![StubCall::Play {
                method: "playHAC".to_string(),
                path: "AndroidSamples/Button.hac".to_string(),
                request_id: None,
            }]
        );
    }

    #[test]
    fn test_ios_stub_rejects_android_only_operations() {
        let stub = DesktopStubBridge::ios();
        assert_eq!(stub.completion_channel(), CompletionChannel::Correlated);
        assert_eq!(
            stub.preload(PatternFormat::Auto, "a.hac"),
            Err(BridgeError::unsupported("preload"))
        );
        assert_eq!(
            stub.play(
                PatternFormat::Ogg,
                "a.ogg",
                Completion::Correlated(RequestId::from_raw(1))
            ),
            Err(BridgeError::unsupported("playOGG"))
        );
        assert!(stub.take_correlated().is_empty());
    }

    #[test]
    fn test_failure_mode_reports_native_call_error() {
        let stub = DesktopStubBridge::android();
        stub.fail_with("IllegalStateException");
        assert_eq!(
            stub.unload_all(),
            Err(BridgeError::native_call("unloadAll", "IllegalStateException"))
        );
        stub.clear_failure();
        assert!(stub.unload_all().is_ok());
        assert_eq!(stub.calls(), vec![StubCall::UnloadAll]);
    }

    #[test]
    fn test_ios_mute_state_round_trips() {
        let stub = DesktopStubBridge::ios();
        stub.set_haptics_muted(true).unwrap();
        assert!(stub.is_haptics_muted().unwrap());
        assert!(!stub.is_audio_muted().unwrap());
        assert!(DesktopStubBridge::android().is_audio_muted().is_err());
    }
}
