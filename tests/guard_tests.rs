// Integration tests for the session guard
//
// These tests install the guard on a relay platform, dispatch browser
// signals through it and check the forwarded events and default-action
// verdicts, then verify removal leaves no listeners behind.

use interview_proctor::guard::{
    GuardEvent, GuardSink, KeyEvent, PlatformSignal, RemotePlatform, SessionGuard,
};
use std::sync::{Arc, Mutex};

fn recording_sink() -> (GuardSink, Arc<Mutex<Vec<GuardEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&events);
    let sink: GuardSink = Arc::new(move |event: GuardEvent| captured.lock().unwrap().push(event));
    (sink, events)
}

#[test]
fn test_install_and_remove_are_paired() {
    let platform = RemotePlatform::new();
    let (sink, _) = recording_sink();

    let handle = SessionGuard::install(&platform, sink);
    assert_eq!(platform.listener_count(), SessionGuard::KINDS.len());
    assert_eq!(handle.listener_ids().len(), SessionGuard::KINDS.len());

    SessionGuard::remove(&platform, handle);
    assert_eq!(platform.listener_count(), 0);
}

#[test]
fn test_hidden_page_and_blur_report_focus_loss() {
    let platform = RemotePlatform::new();
    let (sink, events) = recording_sink();
    let handle = SessionGuard::install(&platform, sink);

    let response = platform.dispatch(&PlatformSignal::VisibilityChange { hidden: true });
    assert!(!response.prevent_default);
    platform.dispatch(&PlatformSignal::WindowBlur);
    platform.dispatch(&PlatformSignal::VisibilityChange { hidden: false });
    platform.dispatch(&PlatformSignal::WindowFocus);

    let events = events.lock().unwrap().clone();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| matches!(e, GuardEvent::FocusLost { .. })));

    SessionGuard::remove(&platform, handle);
}

#[test]
fn test_restricted_shortcuts_are_prevented() {
    let platform = RemotePlatform::new();
    let (sink, events) = recording_sink();
    let handle = SessionGuard::install(&platform, sink);

    for key in [
        KeyEvent::alt("Tab"),
        KeyEvent::ctrl_shift("I"),
        KeyEvent::ctrl("r"),
        KeyEvent::plain("F12"),
        KeyEvent::plain("Escape"),
    ] {
        let response = platform.dispatch(&PlatformSignal::KeyDown(key));
        assert!(response.prevent_default);
    }

    let combos: Vec<_> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            GuardEvent::RestrictedKey { combo } => Some(combo.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(combos.len(), 5);
    assert_eq!(combos[0], "Alt+Tab");

    SessionGuard::remove(&platform, handle);
}

#[test]
fn test_ordinary_typing_passes_through() {
    let platform = RemotePlatform::new();
    let (sink, events) = recording_sink();
    let handle = SessionGuard::install(&platform, sink);

    for key in [KeyEvent::plain("a"), KeyEvent::plain("Enter"), KeyEvent::ctrl("c")] {
        let response = platform.dispatch(&PlatformSignal::KeyDown(key));
        assert!(!response.prevent_default);
    }
    assert!(events.lock().unwrap().is_empty());

    SessionGuard::remove(&platform, handle);
}

#[test]
fn test_context_menu_and_unload_are_prevented() {
    let platform = RemotePlatform::new();
    let (sink, events) = recording_sink();
    let handle = SessionGuard::install(&platform, sink);

    assert!(platform.dispatch(&PlatformSignal::ContextMenu).prevent_default);
    assert!(platform.dispatch(&PlatformSignal::BeforeUnload).prevent_default);
    assert_eq!(events.lock().unwrap().clone(), vec![GuardEvent::ContextMenu]);

    SessionGuard::remove(&platform, handle);
}

#[test]
fn test_removed_guard_stops_reporting() {
    let platform = RemotePlatform::new();
    let (sink, events) = recording_sink();
    let handle = SessionGuard::install(&platform, sink);
    SessionGuard::remove(&platform, handle);

    let response = platform.dispatch(&PlatformSignal::KeyDown(KeyEvent::alt("Tab")));
    assert!(!response.prevent_default);
    platform.dispatch(&PlatformSignal::WindowBlur);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn test_signal_json_shape() {
    let signal: PlatformSignal =
        serde_json::from_str(r#"{"type":"key_down","key":"Tab","alt":true}"#).unwrap();
    assert_eq!(signal, PlatformSignal::KeyDown(KeyEvent::alt("Tab")));

    let signal: PlatformSignal =
        serde_json::from_str(r#"{"type":"visibility_change","hidden":true}"#).unwrap();
    assert_eq!(signal, PlatformSignal::VisibilityChange { hidden: true });
}
