//! Process-wide C entry points for correlated completion.
//!
//! The iOS player can only call plain function pointers, so exactly two
//! static functions exist. They forward into whichever registry is currently
//! installed and contain no other logic.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{debug, error, warn};

use crate::registry::{CallbackRegistry, RequestId, Resolution};

/// Signature of the success entry point handed to native code.
pub type CompleteFn = extern "C" fn(c_int);

/// Signature of the failure entry point handed to native code.
pub type FailureFn = extern "C" fn(c_int, *const c_char);

static ROUTE: Lazy<RwLock<Option<Arc<CallbackRegistry>>>> = Lazy::new(|| RwLock::new(None));

/// Keeps a registry installed as the trampoline target until dropped.
#[must_use = "dropping the route uninstalls the registry immediately"]
pub struct TrampolineRoute {
    registry: Arc<CallbackRegistry>,
}

impl TrampolineRoute {
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }
}

impl Drop for TrampolineRoute {
    fn drop(&mut self) {
        let mut slot = ROUTE.write().unwrap_or_else(PoisonError::into_inner);
        // A later install owns the slot now; leave it alone.
        if slot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &self.registry))
        {
            *slot = None;
            debug!("[Trampoline] Route removed");
        }
    }
}

/// Route native completion signals into `registry`.
pub fn install(registry: Arc<CallbackRegistry>) -> TrampolineRoute {
    let mut slot = ROUTE.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        warn!("[Trampoline] Replacing previously installed registry");
    }
    *slot = Some(Arc::clone(&registry));
    TrampolineRoute { registry }
}

/// Whether a registry is currently installed.
pub fn is_installed() -> bool {
    ROUTE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

fn current() -> Option<Arc<CallbackRegistry>> {
    ROUTE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(Arc::clone)
}

fn route(id: c_int, deliver: impl FnOnce(&CallbackRegistry, RequestId) -> Resolution) {
    let Some(registry) = current() else {
        debug!("[Trampoline] No registry installed; dropping signal for #{}", id);
        return;
    };

    // A panicking user callback must not unwind into native code.
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        deliver(&registry, RequestId::from_raw(id))
    }));
    if outcome.is_err() {
        error!("[Trampoline] Completion callback for #{} panicked", id);
    }
}

/// Success entry point: `onCompleteFn(id)`.
#[no_mangle]
pub extern "C" fn haptics_on_play_complete(id: c_int) {
    route(id, |registry, id| registry.resolve_success(id));
}

/// Failure entry point: `onFailureFn(id, message)`.
///
/// `message` may be null; otherwise it must be a NUL-terminated string that
/// stays valid for the duration of the call.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn haptics_on_play_failure(id: c_int, message: *const c_char) {
    let message = if message.is_null() {
        String::from("unknown native error")
    } else {
        // SAFETY: the native player passes a valid NUL-terminated string
        // that outlives this call; we copy it before returning.
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    };
    route(id, move |registry, id| registry.resolve_failure(id, message));
}

/// The pair of entry points in the order `_playIOSAHAP` expects them.
pub fn entry_points() -> (CompleteFn, FailureFn) {
    (haptics_on_play_complete, haptics_on_play_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CallbackPair;
    use std::ffi::CString;
    use std::sync::mpsc;

    // Single test: the route is process-wide state.
    #[test]
    fn test_trampolines_route_into_installed_registry() {
        let registry = Arc::new(CallbackRegistry::new());
        let (tx, rx) = mpsc::channel();

        let ok_tx = tx.clone();
        let ok = registry.register(CallbackPair::new(
            move || ok_tx.send("ok".to_string()).unwrap(),
            |_| {},
        ));
        let err_tx = tx.clone();
        let failing = registry.register(CallbackPair::new(
            || {},
            move |msg| err_tx.send(msg).unwrap(),
        ));
        let null_msg = registry.register(CallbackPair::new(|| {}, move |msg| tx.send(msg).unwrap()));
        let panicking = registry.register(CallbackPair::new(|| panic!("user bug"), |_| {}));

        let route = install(Arc::clone(&registry));
        assert!(is_installed());

        let (complete, fail) = entry_points();
        complete(ok.get());
        complete(ok.get());
        assert_eq!(rx.try_recv().unwrap(), "ok");
        assert!(rx.try_recv().is_err());

        let message = CString::new("engine stopped").unwrap();
        fail(failing.get(), message.as_ptr());
        assert_eq!(rx.try_recv().unwrap(), "engine stopped");

        fail(null_msg.get(), std::ptr::null());
        assert_eq!(rx.try_recv().unwrap(), "unknown native error");

        complete(panicking.get());
        assert!(!registry.is_pending(panicking));

        drop(route);
        assert!(!is_installed());

        // No registry: signal is dropped without panicking.
        complete(12345);
    }
}
