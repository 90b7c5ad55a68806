use chrono::{TimeZone, Utc};
use interview_proctor::dialogue::ConversationTurn;
use interview_proctor::nats::messages::{SessionEventMessage, TranscriptMessage};
use interview_proctor::nats::{NatsClient, NatsSpeechInput};
use interview_proctor::session::SessionEvent;
use interview_proctor::speech::TranscriptSink;
use std::sync::{Arc, Mutex};

#[test]
fn test_session_event_serialization() {
    let msg = SessionEventMessage {
        session_id: "session-42".to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap(),
        event: SessionEvent::TimerWarning { seconds_left: 60 },
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("session-42"));
    assert!(json.contains("\"event\":\"timer_warning\""));
    assert!(json.contains("\"seconds_left\":60"));

    let deserialized: SessionEventMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.session_id, "session-42");
    assert_eq!(deserialized.event, SessionEvent::TimerWarning { seconds_left: 60 });
}

#[test]
fn test_turn_event_carries_turn() {
    let turn = ConversationTurn::ai("Tell me about yourself.", Utc::now());
    let msg = SessionEventMessage {
        session_id: "session-42".to_string(),
        timestamp: Utc::now(),
        event: SessionEvent::TurnAdded { turn: turn.clone() },
    };

    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["event"], "turn_added");
    assert_eq!(value["turn"]["speaker"], "ai");
    assert_eq!(value["turn"]["text"], "Tell me about yourself.");
}

#[test]
fn test_event_subject_format() {
    assert_eq!(
        NatsClient::event_subject("session-42", &SessionEvent::Alert),
        "proctor.session.session-42.alert"
    );
}

#[test]
fn test_transcript_deserialization() {
    let json = r#"{
        "session_id": "session-42",
        "text": "Hello world",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "session-42");
    assert_eq!(msg.text, "Hello world");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
}

#[test]
fn test_transcript_no_confidence() {
    let json = r#"{
        "session_id": "session-42",
        "text": "No confidence score",
        "partial": true,
        "timestamp": "2025-10-27T14:30:05Z"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert!(msg.partial);
    assert_eq!(msg.confidence, None);
}

#[test]
fn test_transcripts_filtered_by_session() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&received);
    let sink = TranscriptSink::new(move |text, is_final| {
        captured.lock().unwrap().push((text, is_final));
    });

    let message = |session: &str, text: &str, partial: bool| TranscriptMessage {
        session_id: session.to_string(),
        text: text.to_string(),
        partial,
        timestamp: "2025-10-27T14:30:05Z".to_string(),
        confidence: None,
    };

    assert!(NatsSpeechInput::deliver("session-42", &message("session-42", "I have", true), &sink));
    assert!(!NatsSpeechInput::deliver("session-42", &message("other", "ignored", false), &sink));
    assert!(!NatsSpeechInput::deliver("session-42", &message("session-42", "  ", false), &sink));
    assert!(NatsSpeechInput::deliver(
        "session-42",
        &message("session-42", "I have ten years", false),
        &sink
    ));

    assert_eq!(
        received.lock().unwrap().clone(),
        vec![
            ("I have".to_string(), false),
            ("I have ten years".to_string(), true)
        ]
    );
}
