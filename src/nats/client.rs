use anyhow::{Context, Result};
use async_nats::Client;
use tracing::{debug, info};

use super::messages::SessionEventMessage;
use crate::session::SessionEvent;

/// Subject prefix for published session events
pub const EVENT_SUBJECT_PREFIX: &str = "proctor.session";

/// Subjects the STT service publishes partial and final text on
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    pub fn event_subject(session_id: &str, event: &SessionEvent) -> String {
        format!("{}.{}.{}", EVENT_SUBJECT_PREFIX, session_id, event.name())
    }

    /// Publish one session event
    pub async fn publish_event(&self, session_id: &str, event: SessionEvent) -> Result<()> {
        let subject = Self::event_subject(session_id, &event);

        let message = SessionEventMessage {
            session_id: session_id.to_string(),
            timestamp: chrono::Utc::now(),
            event,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish session event")?;

        debug!("Published {}", subject);

        Ok(())
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // Filtering by session happens on the payload.
        info!("Subscribing to transcripts on {}", TRANSCRIPT_SUBJECT);

        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT)
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }
}
