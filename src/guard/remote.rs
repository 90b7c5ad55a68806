use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::signals::{
    ListenerId, PlatformEvents, PlatformSignal, SignalKind, SignalListener, SignalResponse,
};

/// Listener registry fed by a remote client relaying its browser signals
#[derive(Default)]
pub struct RemotePlatform {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<ListenerId, (SignalKind, SignalListener)>>,
}

impl RemotePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every listener registered for the signal's kind
    ///
    /// Default behavior is prevented if any listener asks for it.
    pub fn dispatch(&self, signal: &PlatformSignal) -> SignalResponse {
        let kind = signal.kind();
        // Snapshot so listeners run without the registry lock held.
        let matching: Vec<SignalListener> = match self.listeners.lock() {
            Ok(listeners) => listeners
                .values()
                .filter(|(k, _)| *k == kind)
                .map(|(_, l)| l.clone())
                .collect(),
            Err(_) => return SignalResponse::allow(),
        };

        let prevent_default = matching
            .iter()
            .fold(false, |prevent, listener| listener(signal).prevent_default || prevent);

        SignalResponse { prevent_default }
    }

    /// Number of listeners currently installed
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl PlatformEvents for RemotePlatform {
    fn add_listener(&self, kind: SignalKind, listener: SignalListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, (kind, listener));
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .map(|mut l| l.remove(&id).is_some())
            .unwrap_or(false)
    }
}
