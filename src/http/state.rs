use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::dialogue::ConversationTurn;
use crate::guard::RemotePlatform;
use crate::media::RemoteMedia;
use crate::nats::{NatsClient, NatsEventSink};
use crate::session::{SessionConfig, SessionEvent, SessionEventSink, SessionHandle};
use crate::speech::{RemoteSpeechInput, RemoteSpeechOutput};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Sessions by id; ended sessions stay queryable
    pub sessions: Arc<RwLock<HashMap<String, Arc<SessionEntry>>>>,

    /// Template for new sessions
    pub defaults: SessionConfig,

    /// Present when NATS is enabled
    pub nats: Option<NatsClient>,

    /// How long ended sessions stay queryable
    pub retention: SessionRetention,
}

impl AppState {
    pub fn new(defaults: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            defaults,
            nats: None,
            retention: SessionRetention::default(),
        }
    }

    pub fn with_nats(mut self, client: NatsClient) -> Self {
        self.nats = Some(client);
        self
    }

    pub fn with_retention(mut self, retention: SessionRetention) -> Self {
        self.retention = retention;
        self
    }

    pub async fn session(&self, session_id: &str) -> Option<Arc<SessionEntry>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Evict ended sessions outside the retention policy; returns how many
    pub async fn prune_ended(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.retention.prune(&mut sessions, Utc::now())
    }
}

/// Bounds on ended sessions kept for result queries
#[derive(Debug, Clone, Copy)]
pub struct SessionRetention {
    /// Ended sessions kept at most; the oldest go first
    pub max_ended: usize,
    /// Ended sessions older than this are dropped
    pub ttl: Duration,
}

impl Default for SessionRetention {
    fn default() -> Self {
        Self {
            max_ended: 100,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl SessionRetention {
    /// Remove expired ended sessions, then the oldest beyond `max_ended`.
    /// Running sessions are never touched.
    pub fn prune(
        &self,
        sessions: &mut HashMap<String, Arc<SessionEntry>>,
        now: DateTime<Utc>,
    ) -> usize {
        let mut ended: Vec<(DateTime<Utc>, String)> = sessions
            .iter()
            .filter_map(|(id, entry)| entry.handle.result().map(|r| (r.ended_at, id.clone())))
            .collect();
        ended.sort();

        let excess = ended.len().saturating_sub(self.max_ended);
        let mut evicted = 0;
        for (index, (ended_at, id)) in ended.into_iter().enumerate() {
            let expired = (now - ended_at)
                .to_std()
                .is_ok_and(|age| age >= self.ttl);
            if index < excess || expired {
                sessions.remove(&id);
                evicted += 1;
            }
        }

        if evicted > 0 {
            info!("Evicted {} ended session(s), {} remain", evicted, sessions.len());
        }
        evicted
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// A running session plus the remote collaborators the client drives
pub struct SessionEntry {
    pub handle: SessionHandle,
    pub media: Arc<RemoteMedia>,
    pub speech_output: Arc<RemoteSpeechOutput>,
    /// `None` when transcripts come from the STT service
    pub speech_input: Option<Arc<RemoteSpeechInput>>,
    pub platform: Arc<RemotePlatform>,
    pub log: Arc<EventLog>,
}

/// Records the conversation for queries and forwards events to NATS
#[derive(Default)]
pub struct EventLog {
    inner: Mutex<LogState>,
    forward: Option<NatsEventSink>,
}

#[derive(Default)]
struct LogState {
    turns: Vec<ConversationTurn>,
    interim: Option<ConversationTurn>,
    events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn new(forward: Option<NatsEventSink>) -> Self {
        Self {
            inner: Mutex::default(),
            forward,
        }
    }

    /// Permanent turns followed by the interim placeholder, if any
    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.inner
            .lock()
            .map(|log| log.turns.iter().chain(log.interim.iter()).cloned().collect())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.inner
            .lock()
            .map(|log| log.events.clone())
            .unwrap_or_default()
    }
}

impl SessionEventSink for EventLog {
    fn emit(&self, event: SessionEvent) {
        if let Ok(mut log) = self.inner.lock() {
            match &event {
                SessionEvent::TurnAdded { turn } => {
                    if log.interim.as_ref().is_some_and(|i| i.id == turn.id) {
                        log.interim = None;
                    }
                    log.turns.push(turn.clone());
                }
                SessionEvent::TurnUpdated { turn } => log.interim = Some(turn.clone()),
                SessionEvent::SessionEnded { .. } => log.interim = None,
                _ => {}
            }
            log.events.push(event.clone());
        }

        if let Some(forward) = &self.forward {
            forward.emit(event);
        }
    }
}
