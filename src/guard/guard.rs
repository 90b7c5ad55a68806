use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::signals::{
    KeyEvent, ListenerId, PlatformEvents, PlatformSignal, SignalKind, SignalListener,
    SignalResponse,
};

/// Integrity-relevant event raised by the guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuardEvent {
    /// Page hidden or window blurred (tab or application switch)
    FocusLost { reason: String },
    /// A captured shortcut was pressed
    RestrictedKey { combo: String },
    /// Context menu was requested
    ContextMenu,
}

impl GuardEvent {
    pub fn describe(&self) -> String {
        match self {
            GuardEvent::FocusLost { reason } => reason.clone(),
            GuardEvent::RestrictedKey { combo } => format!("restricted shortcut {}", combo),
            GuardEvent::ContextMenu => "context menu attempt".to_string(),
        }
    }
}

/// Receiver of guard events (usually the session command queue)
pub type GuardSink = Arc<dyn Fn(GuardEvent) + Send + Sync>;

/// Proof of installation; removal consumes it
#[derive(Debug)]
#[must_use = "dropping a GuardHandle leaks the installed listeners"]
pub struct GuardHandle {
    listeners: Vec<ListenerId>,
}

impl GuardHandle {
    pub fn listener_ids(&self) -> &[ListenerId] {
        &self.listeners
    }
}

/// Installs and removes the session's platform listeners
pub struct SessionGuard;

impl SessionGuard {
    /// Signal kinds the guard listens to
    pub const KINDS: [SignalKind; 5] = [
        SignalKind::VisibilityChange,
        SignalKind::WindowBlur,
        SignalKind::KeyDown,
        SignalKind::ContextMenu,
        SignalKind::BeforeUnload,
    ];

    /// Register one listener per guarded signal kind
    pub fn install(platform: &dyn PlatformEvents, sink: GuardSink) -> GuardHandle {
        let listeners = Self::KINDS
            .iter()
            .map(|kind| {
                let sink = Arc::clone(&sink);
                let listener: SignalListener = Arc::new(move |signal: &PlatformSignal| {
                    let (event, response) = Self::classify(signal);
                    if let Some(event) = event {
                        sink(event);
                    }
                    response
                });
                platform.add_listener(*kind, listener)
            })
            .collect::<Vec<_>>();

        info!("Session guard installed ({} listeners)", listeners.len());

        GuardHandle { listeners }
    }

    /// Remove every listener registered by `install`
    pub fn remove(platform: &dyn PlatformEvents, handle: GuardHandle) {
        let mut removed = 0;
        for id in handle.listeners {
            if platform.remove_listener(id) {
                removed += 1;
            } else {
                warn!("Guard listener {:?} was already gone", id);
            }
        }
        info!("Session guard removed ({} listeners)", removed);
    }

    /// Map a platform signal to a guard event and the default-action verdict
    pub fn classify(signal: &PlatformSignal) -> (Option<GuardEvent>, SignalResponse) {
        match signal {
            PlatformSignal::VisibilityChange { hidden: true } => (
                Some(GuardEvent::FocusLost {
                    reason: "tab/window switching detected".to_string(),
                }),
                SignalResponse::allow(),
            ),
            PlatformSignal::WindowBlur => (
                Some(GuardEvent::FocusLost {
                    reason: "window lost focus".to_string(),
                }),
                SignalResponse::allow(),
            ),
            PlatformSignal::KeyDown(key) if is_restricted(key) => (
                Some(GuardEvent::RestrictedKey { combo: key.combo() }),
                SignalResponse::prevent(),
            ),
            PlatformSignal::ContextMenu => (Some(GuardEvent::ContextMenu), SignalResponse::prevent()),
            PlatformSignal::BeforeUnload => (None, SignalResponse::prevent()),
            other => {
                debug!("Ignoring platform signal {:?}", other.kind());
                (None, SignalResponse::allow())
            }
        }
    }
}

/// Shortcuts that switch context, open devtools, reload or leave fullscreen
pub fn is_restricted(key: &KeyEvent) -> bool {
    let k = key.key.as_str();
    let lower = k.to_ascii_lowercase();

    (key.alt && k == "Tab")
        || (key.ctrl && k == "Tab")
        || (key.meta && k == "Tab")
        || k == "F11"
        || k == "F12"
        || k == "F5"
        || k == "Escape"
        || (key.ctrl && key.shift && matches!(lower.as_str(), "i" | "j" | "c"))
        || (key.ctrl && lower == "r")
        || (key.meta && lower == "r")
}
