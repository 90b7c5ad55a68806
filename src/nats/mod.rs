pub mod bridge;
pub mod client;
pub mod messages;

pub use bridge::{NatsEventSink, NatsSpeechInput};
pub use client::NatsClient;
pub use messages::{SessionEventMessage, TranscriptMessage};
