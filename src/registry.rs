//! Correlation-id registry for completion callbacks.
//!
//! The iOS player reports completion through two fixed C function pointers
//! that only carry an integer id. Each play request therefore parks its
//! callback pair here under a freshly allocated [`RequestId`]; the trampoline
//! for the native signal claims the pair back and runs exactly one side.
//!
//! Claim and removal are one `HashMap::remove` under the lock, so a success
//! and a failure signal racing on the same id produce exactly one delivery.
//! Callbacks always run after the lock is released.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::telemetry::{Outcome, TelemetryHub};

/// Callback run once when playback completes.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Callback run once with the native error message when playback fails.
pub type FailureCallback = Box<dyn FnOnce(String) + Send + 'static>;

/// Synthetic identifier correlating a native signal with its request.
///
/// Mirrors the C `int` the native layer hands back to the trampolines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(i32);

impl RequestId {
    pub const fn from_raw(raw: i32) -> Self {
        RequestId(raw)
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Success/failure callbacks for one play request.
///
/// Both sides are always present; missing callbacks become no-ops. Delivery
/// consumes the pair, so at most one side can ever run.
pub struct CallbackPair {
    on_success: CompletionCallback,
    on_failure: FailureCallback,
}

impl CallbackPair {
    pub fn new<S, F>(on_success: S, on_failure: F) -> Self
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        Self {
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
        }
    }

    pub fn from_options(
        on_success: Option<CompletionCallback>,
        on_failure: Option<FailureCallback>,
    ) -> Self {
        Self {
            on_success: on_success.unwrap_or_else(|| Box::new(|| {})),
            on_failure: on_failure.unwrap_or_else(|| Box::new(|_| {})),
        }
    }

    pub fn noop() -> Self {
        Self::from_options(None, None)
    }

    pub fn complete(self) {
        (self.on_success)()
    }

    pub fn fail(self, message: impl Into<String>) {
        (self.on_failure)(message.into())
    }

    pub fn into_parts(self) -> (CompletionCallback, FailureCallback) {
        (self.on_success, self.on_failure)
    }
}

impl fmt::Debug for CallbackPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackPair").finish_non_exhaustive()
    }
}

/// Result of routing a native signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The pending pair was claimed and its callback ran.
    Delivered,
    /// No pending pair: never issued, already resolved, or a stale id.
    Absent,
}

/// Last id handed out by any registry built with [`CallbackRegistry::new`].
///
/// One sequence for the whole process: a registry created after a teardown
/// never reissues an id a late native signal may still carry.
static LAST_REQUEST_ID: AtomicI32 = AtomicI32::new(0);

enum IdSequence {
    Process,
    Isolated(AtomicI32),
}

impl IdSequence {
    fn counter(&self) -> &AtomicI32 {
        match self {
            IdSequence::Process => &LAST_REQUEST_ID,
            IdSequence::Isolated(counter) => counter,
        }
    }
}

/// Concurrent `RequestId -> CallbackPair` store.
pub struct CallbackRegistry {
    ids: IdSequence,
    pending: Mutex<HashMap<RequestId, CallbackPair>>,
    telemetry: Option<Arc<TelemetryHub>>,
}

impl CallbackRegistry {
    /// Empty registry drawing ids from the process-wide sequence.
    ///
    /// The first id issued in a process is `1`.
    pub fn new() -> Self {
        Self::with_sequence(IdSequence::Process)
    }

    /// Empty registry with a private sequence whose first id is `first`.
    ///
    /// Mainly useful to exercise counter wraparound.
    pub fn starting_at(first: i32) -> Self {
        Self::with_sequence(IdSequence::Isolated(AtomicI32::new(first.wrapping_sub(1))))
    }

    fn with_sequence(ids: IdSequence) -> Self {
        Self {
            ids,
            pending: Mutex::new(HashMap::new()),
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryHub>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Park `pair` and return the id the native call must carry.
    ///
    /// The counter wraps at `i32::MAX`. If the wrapped id is still pending,
    /// the newer registration wins and the older pair is dropped unrun.
    pub fn register(&self, pair: CallbackPair) -> RequestId {
        // fetch_add wraps on overflow.
        let id = RequestId(
            self.ids
                .counter()
                .fetch_add(1, Ordering::SeqCst)
                .wrapping_add(1),
        );

        let displaced = self.lock_pending().insert(id, pair);

        if displaced.is_some() {
            warn!(
                "[Registry] Request id {} wrapped onto a pending request; older callbacks dropped",
                id
            );
            if let Some(telemetry) = &self.telemetry {
                telemetry.record_id_collision(id.get());
            }
        }
        // `displaced` drops here, outside the lock.
        id
    }

    /// Atomically remove and return the pair for `id`.
    pub fn claim(&self, id: RequestId) -> Option<CallbackPair> {
        self.lock_pending().remove(&id)
    }

    /// Claim `id` and run its success callback.
    pub fn resolve_success(&self, id: RequestId) -> Resolution {
        match self.claim(id) {
            Some(pair) => {
                debug!("[Registry] Request {} completed", id);
                pair.complete();
                self.record_resolution(id, Outcome::Success);
                Resolution::Delivered
            }
            None => self.absent(id),
        }
    }

    /// Claim `id` and run its failure callback with `message`.
    pub fn resolve_failure(&self, id: RequestId, message: impl Into<String>) -> Resolution {
        match self.claim(id) {
            Some(pair) => {
                let message = message.into();
                debug!("[Registry] Request {} failed: {}", id, message);
                pair.fail(message);
                self.record_resolution(id, Outcome::Failure);
                Resolution::Delivered
            }
            None => self.absent(id),
        }
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.lock_pending().contains_key(&id)
    }

    /// Number of requests still waiting for a native signal.
    pub fn pending(&self) -> usize {
        self.lock_pending().len()
    }

    /// Callbacks never run under this lock, so a poisoned map is still
    /// consistent and is recovered rather than propagated.
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<RequestId, CallbackPair>> {
        self.pending.lock().unwrap_or_else(|poisoned| {
            warn!("[Registry] Pending map lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn absent(&self, id: RequestId) -> Resolution {
        // Expected when success and failure race; not an error.
        debug!("[Registry] Ignoring signal for unknown request {}", id);
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_unknown_request(id.get());
        }
        Resolution::Absent
    }

    fn record_resolution(&self, id: RequestId, outcome: Outcome) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_resolution(Some(id.get()), outcome);
        }
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("last_id", &self.ids.counter().load(Ordering::Relaxed))
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    fn tagged_pair(tag: &'static str, tx: mpsc::Sender<String>) -> CallbackPair {
        let fail_tx = tx.clone();
        CallbackPair::new(
            move || tx.send(format!("{tag}:success")).unwrap(),
            move |msg| fail_tx.send(format!("{tag}:failure:{msg}")).unwrap(),
        )
    }

    #[test]
    fn test_first_id_is_one_and_claim_is_single_shot() {
        let registry = CallbackRegistry::starting_at(1);
        let (tx, rx) = mpsc::channel();

        let id = registry.register(tagged_pair("a", tx));
        assert_eq!(id.get(), 1);

        let pair = registry.claim(id).expect("pair registered");
        pair.complete();
        assert_eq!(rx.try_recv().unwrap(), "a:success");

        assert!(registry.claim(id).is_none());
        assert_eq!(registry.pending(), 0);
    }

    #[test]
    fn test_claim_returns_the_pair_registered_under_that_id() {
        let registry = CallbackRegistry::new();
        let (tx, rx) = mpsc::channel();

        let a = registry.register(tagged_pair("a", tx.clone()));
        let b = registry.register(tagged_pair("b", tx));
        assert_ne!(a, b);

        registry.claim(b).unwrap().fail("boom");
        assert_eq!(rx.try_recv().unwrap(), "b:failure:boom");
        assert!(registry.is_pending(a));
        assert!(!registry.is_pending(b));
    }

    #[test]
    fn test_resolve_runs_one_side_only() {
        let registry = CallbackRegistry::new();
        let (tx, rx) = mpsc::channel();
        let id = registry.register(tagged_pair("a", tx));

        assert_eq!(registry.resolve_failure(id, "decode error"), Resolution::Delivered);
        assert_eq!(registry.resolve_success(id), Resolution::Absent);

        assert_eq!(rx.try_recv().unwrap(), "a:failure:decode error");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unknown_id_is_absent_and_recorded() {
        let telemetry = Arc::new(TelemetryHub::new(8, 8));
        let registry = CallbackRegistry::new().with_telemetry(Arc::clone(&telemetry));

        assert_eq!(
            registry.resolve_success(RequestId::from_raw(42)),
            Resolution::Absent
        );
        let snapshot = telemetry.snapshot();
        assert!(snapshot.recent.iter().any(|event| matches!(
            event,
            crate::telemetry::DispatchEvent::UnknownRequest { request_id: 42 }
        )));
    }

    #[test]
    fn test_counter_wraps_past_i32_max() {
        let registry = CallbackRegistry::starting_at(i32::MAX);
        let last = registry.register(CallbackPair::noop());
        let wrapped = registry.register(CallbackPair::noop());

        assert_eq!(last.get(), i32::MAX);
        assert_eq!(wrapped.get(), i32::MIN);
        assert_eq!(registry.pending(), 2);
    }

    #[test]
    fn test_wrapped_id_collision_keeps_newest_registration() {
        let telemetry = Arc::new(TelemetryHub::new(8, 8));
        let registry = CallbackRegistry::starting_at(7).with_telemetry(Arc::clone(&telemetry));
        let older_runs = Arc::new(AtomicUsize::new(0));

        let runs = Arc::clone(&older_runs);
        let first = registry.register(CallbackPair::new(
            move || {
                runs.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
        ));

        // Force the counter back onto the pending id.
        registry.ids.counter().store(first.get() - 1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel();
        let second = registry.register(tagged_pair("new", tx));
        assert_eq!(first, second);

        assert_eq!(registry.resolve_success(second), Resolution::Delivered);
        assert_eq!(rx.try_recv().unwrap(), "new:success");
        assert_eq!(older_runs.load(Ordering::SeqCst), 0);
        assert!(telemetry.snapshot().recent.iter().any(|event| matches!(
            event,
            crate::telemetry::DispatchEvent::IdCollision { request_id: 7 }
        )));
    }

    #[test]
    fn test_registries_share_the_process_sequence() {
        let old = CallbackRegistry::new();
        let stale = old.register(CallbackPair::noop());
        drop(old);

        let fresh = CallbackRegistry::new();
        let next = fresh.register(CallbackPair::noop());
        assert!(next.get() > stale.get());
        assert_eq!(fresh.resolve_success(stale), Resolution::Absent);
        assert!(fresh.is_pending(next));
    }

    #[test]
    fn test_isolated_sequences_do_not_advance_the_process_one() {
        let process = CallbackRegistry::new();
        let before = process.register(CallbackPair::noop());
        let isolated = CallbackRegistry::starting_at(1);
        assert_eq!(isolated.register(CallbackPair::noop()).get(), 1);
        let after = process.register(CallbackPair::noop());
        assert!(after.get() > before.get());
    }

    #[test]
    fn test_missing_callbacks_default_to_noop() {
        let registry = CallbackRegistry::new();
        let id = registry.register(CallbackPair::from_options(None, None));
        assert_eq!(registry.resolve_failure(id, "ignored"), Resolution::Delivered);
    }
}
