//! HTTP API for browser clients driving a proctored session
//!
//! The client captures camera, microphone, speech and window signals
//! locally and relays them here:
//! - POST /sessions/start - Start a session
//! - POST /sessions/:id/end - Force-end a session, returns its result
//! - GET /sessions/:id/status - Live snapshot and pending speech
//! - GET /sessions/:id/turns - Conversation so far
//! - GET /sessions/:id/events - Emitted session events
//! - GET /sessions/:id/result - Final result once ended
//! - POST /sessions/:id/frame, /audio, /signal - Capture relays
//! - POST /sessions/:id/answer, /transcript, /speech-complete, /next - Dialogue
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{
    AnswerRequest, AudioUpload, EndSessionRequest, FrameUpload, StartSessionRequest,
    StartSessionResponse, StatusResponse, TranscriptRequest,
};
pub use routes::create_router;
pub use state::{AppState, EventLog, SessionEntry, SessionRetention};
