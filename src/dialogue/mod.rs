//! Turn-taking interview dialogue
//!
//! `DialogueController` is a pure state machine: inputs (start, speech
//! completion, transcripts, typed answers, termination) go in through one
//! `advance` entry point, and the side effects the session must perform come
//! back out as `DialogueEffect`s.

mod controller;
mod turn;

pub use controller::{
    clean_transcript, DialogueConfig, DialogueController, DialogueEffect, DialogueInput,
    DialoguePhase, DialogueState, Floor, TIME_LIMIT_REASON,
};
pub use turn::{ConversationTurn, Speaker};
