//! Integration tests for PlaybackGateway and HapticsContext
//!
//! These drive the full dispatch path against the desktop stub bridge:
//! - correlated completion through the process-wide trampolines (iOS shape)
//! - proxy completion handed to the player (Android shape)
//! - dispatch failures converted into exactly one failure callback
//! - built-in effects reaching the player under their native names
//!
//! Only one test installs a trampoline route: the route is process-wide.

use std::ffi::CString;
use std::sync::mpsc;
use std::sync::Arc;

use haptic_player::bridge::trampoline;
use haptic_player::bridge::{DesktopStubBridge, StubCall};
use haptic_player::config::AppConfig;
use haptic_player::registry::{CompletionCallback, FailureCallback};
use haptic_player::telemetry::{DispatchEvent, LifecyclePhase, TelemetryHub};
use haptic_player::{
    AndroidBuiltInEffect, HapticsContext, IosBuiltInEffect, PlaybackGateway, Platform,
};

fn recorder() -> (
    mpsc::Receiver<String>,
    Option<CompletionCallback>,
    Option<FailureCallback>,
) {
    let (tx, rx) = mpsc::channel();
    let fail_tx = tx.clone();
    (
        rx,
        Some(Box::new(move || {
            let _ = tx.send("complete".to_string());
        })),
        Some(Box::new(move |msg: String| {
            let _ = fail_tx.send(format!("fail:{msg}"));
        })),
    )
}

#[test]
fn test_ios_completion_routes_through_trampolines() {
    let stub = Arc::new(DesktopStubBridge::ios());
    let telemetry = Arc::new(TelemetryHub::default());
    let context = HapticsContext::with_bridge(AppConfig::default(), stub.clone())
        .with_telemetry(Arc::clone(&telemetry));
    let gateway = context.gateway();
    assert!(trampoline::is_installed());

    let (ok_rx, ok_complete, ok_fail) = recorder();
    let (err_rx, err_complete, err_fail) = recorder();
    gateway.play("a.hac", "Data/Raw/a.ahap", ok_complete, ok_fail);
    gateway.play("b.hac", "Data/Raw/b.ahap", err_complete, err_fail);

    let ids = stub.take_correlated();
    assert_eq!(ids.len(), 2);
    assert!(ids[1].get() > ids[0].get());
    assert_eq!(gateway.registry().pending(), 2);

    // Native layer reports back out of order, from its own threads.
    let (complete, fail) = trampoline::entry_points();
    let second = ids[1].get();
    std::thread::spawn(move || {
        let message = CString::new("haptic engine reset").unwrap();
        fail(second, message.as_ptr());
        fail(second, message.as_ptr());
    })
    .join()
    .unwrap();
    let first = ids[0].get();
    std::thread::spawn(move || complete(first)).join().unwrap();

    assert_eq!(ok_rx.try_recv().unwrap(), "complete");
    assert!(ok_rx.try_recv().is_err());
    assert_eq!(err_rx.try_recv().unwrap(), "fail:haptic engine reset");
    assert!(err_rx.try_recv().is_err());
    assert_eq!(gateway.registry().pending(), 0);

    // A request still in flight when the player is released.
    let (stale_rx, stale_complete, stale_fail) = recorder();
    gateway.play("c.hac", "Data/Raw/c.ahap", stale_complete, stale_fail);
    let stale = stub.take_correlated()[0];

    drop(gateway);
    context.teardown().unwrap();
    assert!(!trampoline::is_installed());
    // Late signal with no route installed is dropped quietly.
    complete(first);

    // Re-init: the new session must not reissue the stale id.
    let gateway = context.gateway();
    assert!(trampoline::is_installed());
    let (fresh_rx, fresh_complete, fresh_fail) = recorder();
    gateway.play("d.hac", "Data/Raw/d.ahap", fresh_complete, fresh_fail);
    let fresh = stub.take_correlated()[0];
    assert_ne!(fresh, stale);
    assert!(fresh.get() > stale.get());

    complete(stale.get());
    assert!(fresh_rx.try_recv().is_err());
    assert!(stale_rx.try_recv().is_err());
    assert!(gateway.registry().is_pending(fresh));

    complete(fresh.get());
    assert_eq!(fresh_rx.try_recv().unwrap(), "complete");
    assert!(fresh_rx.try_recv().is_err());

    drop(gateway);
    context.teardown().unwrap();
    assert!(!trampoline::is_installed());

    let snapshot = telemetry.snapshot();
    assert!(snapshot.recent.iter().any(|event| matches!(
        event,
        DispatchEvent::UnknownRequest { request_id } if *request_id == second
    )));
    assert!(snapshot.recent.iter().any(|event| matches!(
        event,
        DispatchEvent::UnknownRequest { request_id } if *request_id == stale.get()
    )));
    assert!(snapshot.recent.iter().any(|event| matches!(
        event,
        DispatchEvent::Lifecycle {
            phase: LifecyclePhase::RouteRemoved,
            ..
        }
    )));
}

#[test]
fn test_android_extended_family_completes_through_proxies() {
    let stub = Arc::new(DesktopStubBridge::android());
    let context = HapticsContext::with_bridge(AppConfig::default(), stub.clone())
        .with_telemetry(Arc::new(TelemetryHub::default()));
    let gateway = context.gateway();

    let (rx, on_complete, on_fail) = recorder();
    gateway.play_hac("AndroidSamples/Button.hac", on_complete, on_fail);
    gateway.play_hla("AndroidSamples/Button.hla", None, None);
    gateway.play_ogg("AndroidSamples/Button.ogg", None, None);
    gateway.preload_ogg("AndroidSamples/Button.ogg");
    gateway.unload_ogg("AndroidSamples/Button.ogg");

    assert_eq!(stub.pending_proxies(), 3);
    assert!(stub.complete_next_proxy());
    assert_eq!(rx.try_recv().unwrap(), "complete");

    let methods: Vec<String> = stub
        .calls()
        .into_iter()
        .map(|call| match call {
            StubCall::Play { method, .. }
            | StubCall::Preload { method, .. }
            | StubCall::Unload { method, .. } => method,
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(
        methods,
        vec!["playHAC", "playHLA", "playOGG", "preloadOGG", "unloadOGG"]
    );
}

#[test]
fn test_dispatch_failure_delivers_failure_once_without_leaking() {
    let stub = Arc::new(DesktopStubBridge::ios());
    stub.fail_with("AHAP file not found");
    // Gateway built directly: no trampoline route needed for a sync failure.
    let gateway = PlaybackGateway::new(stub.clone());

    let (rx, on_complete, on_fail) = recorder();
    gateway.play("a.hac", "Data/Raw/missing.ahap", on_complete, on_fail);

    let message = rx.try_recv().unwrap();
    assert!(message.contains("AHAP file not found"), "{message}");
    assert!(rx.try_recv().is_err());
    assert_eq!(gateway.registry().pending(), 0);
    assert!(stub.take_correlated().is_empty());
}

#[test]
fn test_built_in_effects_reach_player_by_native_name() {
    let android = Arc::new(DesktopStubBridge::android());
    let gateway = PlaybackGateway::new(android.clone());
    for effect in AndroidBuiltInEffect::ALL {
        gateway.play_built_in(effect, IosBuiltInEffect::Light);
    }
    let names: Vec<StubCall> = android.calls();
    assert_eq!(
        names,
        ["Click", "Double Click", "Heavy Click", "Tick"]
            .iter()
            .map(|name| StubCall::PlayBuiltIn {
                name: name.to_string()
            })
            .collect::<Vec<_>>()
    );

    let ios = Arc::new(DesktopStubBridge::ios());
    let gateway = PlaybackGateway::new(ios.clone());
    for effect in IosBuiltInEffect::ALL {
        gateway.play_built_in(AndroidBuiltInEffect::Click, effect);
    }
    assert_eq!(
        ios.calls(),
        [
            "light",
            "medium",
            "heavy",
            "rigid",
            "soft",
            "error",
            "warning",
            "success",
            "selection",
        ]
        .iter()
        .map(|name| StubCall::PlayBuiltIn {
            name: name.to_string()
        })
        .collect::<Vec<_>>()
    );
}

#[test]
fn test_ios_only_controls_are_skipped_on_android() {
    let stub = Arc::new(DesktopStubBridge::android());
    let gateway = PlaybackGateway::new(stub.clone());
    assert_eq!(gateway.platform(), Platform::Android);

    gateway.set_audio_muted(true);
    assert!(!gateway.is_audio_muted());
    assert!(stub.calls().is_empty());

    let skipped = gateway
        .telemetry()
        .snapshot()
        .recent
        .into_iter()
        .filter(|event| matches!(event, DispatchEvent::Skipped { .. }))
        .count();
    assert_eq!(skipped, 2);
}
