use super::state::{AppState, EventLog, SessionEntry};
use crate::detection::{HeuristicFaceDetector, VideoFrame};
use crate::error::ProctorError;
use crate::guard::{PlatformSignal, RemotePlatform};
use crate::media::RemoteMedia;
use crate::nats::{NatsEventSink, NatsSpeechInput};
use crate::session::{self, SessionCollaborators, SessionSnapshot};
use crate::speech::{RemoteSpeechInput, RemoteSpeechOutput, SpeechInput, SpeechOutput};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,
    pub duration_seconds: Option<u64>,
    pub questions: Option<Vec<String>>,
    pub max_violations: Option<usize>,
    pub enable_face_detection: Option<bool>,
    pub enable_screen_lock: Option<bool>,
    pub enable_audio_monitoring: Option<bool>,
    pub auto_advance: Option<bool>,

    /// Whether the client obtained camera/microphone permission (default: true)
    pub media_granted: Option<bool>,

    /// Whether the client can speak questions aloud (default: true)
    pub speech_output: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndSessionRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    /// Text the client should be speaking right now
    pub pending_speech: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FrameUpload {
    pub width: u32,
    pub height: u32,
    /// Base64-encoded RGBA pixels
    pub rgba: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioUpload {
    /// Byte frequency-domain bins
    pub bins: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn not_found(session_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Session {} not found", session_id),
    )
}

fn proctor_error(e: ProctorError) -> Response {
    let status = match e {
        ProctorError::SessionClosed(_) => StatusCode::CONFLICT,
        ProctorError::Detection(_) => StatusCode::BAD_REQUEST,
        ProctorError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ProctorError::DeviceUnavailable(_) | ProctorError::SpeechUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    error_response(status, e.to_string())
}

fn accepted(accepted: bool) -> Response {
    let status = if accepted {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(AcceptedResponse { accepted })).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions/start
/// Start a new proctored session
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Response {
    let mut config = state.defaults.clone();
    config.session_id = req
        .session_id
        .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));
    if let Some(duration) = req.duration_seconds {
        config.duration_seconds = duration;
    }
    if let Some(questions) = req.questions {
        config.questions = questions;
    }
    if let Some(max) = req.max_violations {
        config.max_violations = max;
    }
    if let Some(enabled) = req.enable_face_detection {
        config.enable_face_detection = enabled;
    }
    if let Some(enabled) = req.enable_screen_lock {
        config.enable_screen_lock = enabled;
    }
    if let Some(enabled) = req.enable_audio_monitoring {
        config.enable_audio_monitoring = enabled;
    }
    if let Some(auto) = req.auto_advance {
        config.auto_advance = auto;
    }

    let session_id = config.session_id.clone();
    info!("Starting proctored session: {}", session_id);

    let mut sessions = state.sessions.write().await;
    state.retention.prune(&mut sessions, chrono::Utc::now());
    if sessions.contains_key(&session_id) {
        return error_response(
            StatusCode::CONFLICT,
            format!("Session {} already exists", session_id),
        );
    }

    let media = Arc::new(RemoteMedia::new(req.media_granted.unwrap_or(true)));
    let remote_output = Arc::new(RemoteSpeechOutput::new());
    let platform = Arc::new(RemotePlatform::new());

    let speech_output: Option<Arc<dyn SpeechOutput>> = match req.speech_output {
        Some(false) => None,
        _ => Some(remote_output.clone()),
    };

    // With NATS the STT service supplies transcripts; otherwise the client does.
    let (speech_input, remote_input): (Arc<dyn SpeechInput>, Option<Arc<RemoteSpeechInput>>) =
        match &state.nats {
            Some(client) => (
                Arc::new(NatsSpeechInput::new(client.clone(), session_id.clone())),
                None,
            ),
            None => {
                let input = Arc::new(RemoteSpeechInput::new());
                (input.clone(), Some(input))
            }
        };

    let forward = state
        .nats
        .clone()
        .map(|client| NatsEventSink::spawn(client, session_id.clone()));
    let log = Arc::new(EventLog::new(forward));

    let analyzer = Box::new(HeuristicFaceDetector::new(config.heuristic_config()));
    let handle = session::start_session(
        config,
        SessionCollaborators {
            media: media.clone(),
            analyzer,
            speech_output,
            speech_input: Some(speech_input),
            platform: platform.clone(),
            events: log.clone(),
        },
    );

    sessions.insert(
        session_id.clone(),
        Arc::new(SessionEntry {
            handle,
            media,
            speech_output: remote_output,
            speech_input: remote_input,
            platform,
            log,
        }),
    );

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id: session_id.clone(),
            status: "active".to_string(),
            message: format!("Session {} started", session_id),
        }),
    )
        .into_response()
}

/// POST /sessions/:session_id/end
/// Force-end a session and return its result
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Option<Json<EndSessionRequest>>,
) -> Response {
    let Some(entry) = state.session(&session_id).await else {
        return not_found(&session_id);
    };

    let reason = body
        .and_then(|Json(req)| req.reason)
        .unwrap_or_else(|| "Session ended by proctor".to_string());

    info!("Ending session {}: {}", session_id, reason);

    if let Err(e) = entry.handle.force_end(reason) {
        // Already over; the stored result is still returned.
        info!("{}", e);
    }

    match entry.handle.wait().await {
        Some(result) => (StatusCode::OK, Json(result)).into_response(),
        None => {
            error!("Session {} stopped without a result", session_id);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Session {} stopped without a result", session_id),
            )
        }
    }
}

/// GET /sessions/:session_id/status
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.session(&session_id).await {
        Some(entry) => (
            StatusCode::OK,
            Json(StatusResponse {
                snapshot: entry.handle.status(),
                pending_speech: entry.speech_output.pending_text(),
            }),
        )
            .into_response(),
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/turns
/// Conversation so far, including the interim transcription
pub async fn get_session_turns(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.session(&session_id).await {
        Some(entry) => (StatusCode::OK, Json(entry.log.turns())).into_response(),
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/events
pub async fn get_session_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.session(&session_id).await {
        Some(entry) => (StatusCode::OK, Json(entry.log.events())).into_response(),
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/result
pub async fn get_session_result(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let Some(entry) = state.session(&session_id).await else {
        return not_found(&session_id);
    };

    match entry.handle.result() {
        Some(result) => (StatusCode::OK, Json(result)).into_response(),
        None => error_response(
            StatusCode::CONFLICT,
            format!("Session {} is still running", session_id),
        ),
    }
}

/// POST /sessions/:session_id/frame
/// Latest camera frame for the detection tick
pub async fn upload_frame(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(upload): Json<FrameUpload>,
) -> Response {
    let Some(entry) = state.session(&session_id).await else {
        return not_found(&session_id);
    };

    let rgba = match base64::engine::general_purpose::STANDARD.decode(upload.rgba.as_bytes()) {
        Ok(rgba) => rgba,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid frame data: {}", e))
        }
    };

    let frame = VideoFrame::new(upload.width, upload.height, rgba);
    if let Err(e) = frame.validate() {
        return proctor_error(e);
    }

    match entry.media.stream() {
        Some(stream) => accepted(stream.push_frame(frame)),
        None => error_response(StatusCode::CONFLICT, "No media stream for this session"),
    }
}

/// POST /sessions/:session_id/audio
/// Latest frequency analysis for the audio tick
pub async fn upload_audio(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(upload): Json<AudioUpload>,
) -> Response {
    let Some(entry) = state.session(&session_id).await else {
        return not_found(&session_id);
    };

    match entry.media.stream() {
        Some(stream) => accepted(stream.push_frequency_data(upload.bins)),
        None => error_response(StatusCode::CONFLICT, "No media stream for this session"),
    }
}

/// POST /sessions/:session_id/signal
/// Relay a browser signal; the response says whether to prevent its default
pub async fn relay_signal(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(signal): Json<PlatformSignal>,
) -> Response {
    match state.session(&session_id).await {
        Some(entry) => (StatusCode::OK, Json(entry.platform.dispatch(&signal))).into_response(),
        None => not_found(&session_id),
    }
}

/// POST /sessions/:session_id/answer
/// Typed answer for the current question
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> Response {
    let Some(entry) = state.session(&session_id).await else {
        return not_found(&session_id);
    };

    match entry.handle.submit_text(req.text) {
        Ok(()) => accepted(true),
        Err(e) => proctor_error(e),
    }
}

/// POST /sessions/:session_id/transcript
/// Interim or final recognition result from the client
pub async fn push_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<TranscriptRequest>,
) -> Response {
    let Some(entry) = state.session(&session_id).await else {
        return not_found(&session_id);
    };

    match &entry.speech_input {
        Some(input) => {
            let listening = input.push(&req.text, req.is_final);
            if !listening {
                warn!("Transcript for {} arrived while not listening", session_id);
            }
            accepted(listening)
        }
        None => match entry.handle.push_transcript(req.text, req.is_final) {
            Ok(()) => accepted(true),
            Err(e) => proctor_error(e),
        },
    }
}

/// POST /sessions/:session_id/speech-complete
/// The client finished speaking the pending question
pub async fn speech_complete(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.session(&session_id).await {
        Some(entry) => accepted(entry.speech_output.complete()),
        None => not_found(&session_id),
    }
}

/// POST /sessions/:session_id/next
/// Manual advance to the next question
pub async fn next_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let Some(entry) = state.session(&session_id).await else {
        return not_found(&session_id);
    };

    match entry.handle.next_question() {
        Ok(()) => accepted(true),
        Err(e) => proctor_error(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
