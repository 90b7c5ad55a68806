use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A keydown as reported by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyEvent {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            ..Default::default()
        }
    }

    pub fn alt(key: &str) -> Self {
        Self {
            key: key.to_string(),
            alt: true,
            ..Default::default()
        }
    }

    pub fn meta(key: &str) -> Self {
        Self {
            key: key.to_string(),
            meta: true,
            ..Default::default()
        }
    }

    pub fn ctrl_shift(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            shift: true,
            ..Default::default()
        }
    }

    /// Human-readable combination, e.g. "Ctrl+Shift+I"
    pub fn combo(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            parts.push("Meta");
        }
        parts.push(self.key.as_str());
        parts.join("+")
    }
}

/// Platform-level signal surface (page visibility, focus, keys, menus)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformSignal {
    VisibilityChange { hidden: bool },
    WindowBlur,
    WindowFocus,
    KeyDown(KeyEvent),
    ContextMenu,
    BeforeUnload,
}

impl PlatformSignal {
    pub fn kind(&self) -> SignalKind {
        match self {
            PlatformSignal::VisibilityChange { .. } => SignalKind::VisibilityChange,
            PlatformSignal::WindowBlur => SignalKind::WindowBlur,
            PlatformSignal::WindowFocus => SignalKind::WindowFocus,
            PlatformSignal::KeyDown(_) => SignalKind::KeyDown,
            PlatformSignal::ContextMenu => SignalKind::ContextMenu,
            PlatformSignal::BeforeUnload => SignalKind::BeforeUnload,
        }
    }
}

/// Signal categories a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    VisibilityChange,
    WindowBlur,
    WindowFocus,
    KeyDown,
    ContextMenu,
    BeforeUnload,
}

/// What the platform should do with the signal after listeners ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalResponse {
    /// Suppress the platform's default behavior (shortcut, menu, unload)
    pub prevent_default: bool,
}

impl SignalResponse {
    pub fn allow() -> Self {
        Self {
            prevent_default: false,
        }
    }

    pub fn prevent() -> Self {
        Self {
            prevent_default: true,
        }
    }
}

/// Registered listener id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub type SignalListener = Arc<dyn Fn(&PlatformSignal) -> SignalResponse + Send + Sync>;

/// Listener registry of the hosting platform
///
/// Implementations:
/// - `RemotePlatform`: signals relayed by a browser client over HTTP
/// - test doubles recording add/remove calls
pub trait PlatformEvents: Send + Sync {
    /// Register a listener and return its id
    fn add_listener(&self, kind: SignalKind, listener: SignalListener) -> ListenerId;

    /// Remove a listener; returns false if it was not registered
    fn remove_listener(&self, id: ListenerId) -> bool;
}
