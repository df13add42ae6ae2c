//! Trampoline routing under concurrent native signals
//!
//! Single test: the trampoline route is process-wide state.

use std::ffi::CString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use haptic_player::bridge::trampoline;
use haptic_player::{CallbackPair, CallbackRegistry};

#[test]
fn test_racing_native_signals_deliver_exactly_once_per_request() {
    const REQUESTS: usize = 200;

    let registry = Arc::new(CallbackRegistry::new());
    let deliveries = Arc::new(AtomicUsize::new(0));

    let ids: Vec<i32> = (0..REQUESTS)
        .map(|_| {
            let on_success = Arc::clone(&deliveries);
            let on_failure = Arc::clone(&deliveries);
            registry
                .register(CallbackPair::new(
                    move || {
                        on_success.fetch_add(1, Ordering::SeqCst);
                    },
                    move |_| {
                        on_failure.fetch_add(1, Ordering::SeqCst);
                    },
                ))
                .get()
        })
        .collect();
    let ids = Arc::new(ids);

    let route = trampoline::install(Arc::clone(&registry));
    let (complete, fail) = trampoline::entry_points();
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let ids = Arc::clone(&ids);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let message = CString::new(format!("worker {worker} failure")).unwrap();
                barrier.wait();
                for id in ids.iter() {
                    if worker % 2 == 0 {
                        complete(*id);
                    } else {
                        fail(*id, message.as_ptr());
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("native signal thread panicked");
    }

    assert_eq!(deliveries.load(Ordering::SeqCst), REQUESTS);
    assert_eq!(registry.pending(), 0);

    drop(route);
    assert!(!trampoline::is_installed());
}
