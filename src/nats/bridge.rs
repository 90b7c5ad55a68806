use futures::stream::StreamExt;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::client::NatsClient;
use super::messages::TranscriptMessage;
use crate::error::{ProctorError, ProctorResult};
use crate::session::{SessionEvent, SessionEventSink};
use crate::speech::{SpeechInput, TranscriptSink};

/// Publishes session events in order from a background task
pub struct NatsEventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl NatsEventSink {
    /// Must be called inside a tokio runtime
    pub fn spawn(client: NatsClient, session_id: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = client.publish_event(&session_id, event).await {
                    error!("Failed to publish session event: {}", e);
                }
            }
            debug!("Event publisher for {} stopped", session_id);
        });

        Self { tx }
    }
}

impl SessionEventSink for NatsEventSink {
    fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

/// Speech recognition supplied by the STT service over NATS
pub struct NatsSpeechInput {
    client: NatsClient,
    session_id: String,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NatsSpeechInput {
    pub fn new(client: NatsClient, session_id: impl Into<String>) -> Self {
        Self {
            client,
            session_id: session_id.into(),
            task: Mutex::new(None),
        }
    }

    /// Translate one STT message for this session into a sink callback
    pub fn deliver(session_id: &str, message: &TranscriptMessage, sink: &TranscriptSink) -> bool {
        if message.session_id != session_id || message.text.trim().is_empty() {
            return false;
        }

        if message.partial {
            sink.interim(message.text.clone());
        } else {
            sink.finalize(message.text.clone());
        }
        true
    }
}

impl SpeechInput for NatsSpeechInput {
    fn start(&self, sink: TranscriptSink) -> ProctorResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ProctorError::SpeechUnavailable(e.to_string()))?;

        let mut task = self
            .task
            .lock()
            .map_err(|_| ProctorError::SpeechUnavailable("recognizer state poisoned".into()))?;
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let client = self.client.clone();
        let session_id = self.session_id.clone();

        *task = Some(runtime.spawn(async move {
            let mut subscriber = match client.subscribe_transcripts().await {
                Ok(subscriber) => subscriber,
                Err(e) => {
                    warn!("Transcript subscription failed: {}", e);
                    return;
                }
            };

            info!("Listening for transcripts for {}", session_id);

            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(transcript) => {
                        Self::deliver(&session_id, &transcript, &sink);
                    }
                    Err(e) => error!("Failed to parse transcript message: {}", e),
                }
            }
        }));

        Ok(())
    }

    fn stop(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                task.abort();
                debug!("Transcript listener for {} stopped", self.session_id);
            }
        }
    }
}

impl Drop for NatsSpeechInput {
    fn drop(&mut self) {
        self.stop();
    }
}
