use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::turn::ConversationTurn;

const FILLER_WORDS: [&str; 3] = ["um", "uh", "er"];

pub const TIME_LIMIT_REASON: &str = "Session time limit reached";

/// Static interview script and turn-taking policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    pub questions: Vec<String>,
    /// Ask the next question after the acknowledgement without waiting for
    /// an explicit `NextQuestion`
    pub auto_advance: bool,
    /// Spoken by the interviewer after the last answer
    pub closing_message: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            auto_advance: true,
            closing_message: "Thank you for completing the assessment. Your responses have been \
                recorded and will be analyzed. The results will be available shortly."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialoguePhase {
    AwaitingStart,
    Speaking,
    WaitingForResponse,
    Processing,
    Finished,
}

/// Who may currently produce output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Floor {
    Nobody,
    Interviewer,
    Candidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueState {
    pub current_question_index: usize,
    pub phase: DialoguePhase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueInput {
    Start,
    SpeechFinished { utterance: u64 },
    /// The speech engine failed or is missing; treated like completion
    SpeechFailed { utterance: u64 },
    InterimTranscript(String),
    FinalTranscript(String),
    TextSubmitted(String),
    AcknowledgementElapsed,
    /// Manual advance (when `auto_advance` is off)
    NextQuestion,
    TimeExpired,
    /// Preempts whatever phase is active
    Terminate { reason: String },
}

/// Side effects the owner of the controller must carry out, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEffect {
    Speak { utterance: u64, text: String },
    CancelSpeech,
    EnableInput,
    DisableInput,
    StartRecognition,
    StopRecognition,
    TurnAdded(ConversationTurn),
    InterimUpdated(ConversationTurn),
    ScheduleAcknowledgement,
    Finished { termination_reason: Option<String> },
}

/// Interview sequencer with single floor-holder turn taking
///
/// AwaitingStart -> Speaking(i) -> WaitingForResponse -> Processing
///   -> Speaking(i+1) | Finished
pub struct DialogueController {
    config: DialogueConfig,
    state: DialogueState,
    turns: Vec<ConversationTurn>,
    interim: Option<ConversationTurn>,
    questions_answered: usize,
    next_utterance: u64,
    pending_utterance: Option<u64>,
    awaiting_next: bool,
    recognizing: bool,
    speech_available: bool,
    recognition_available: bool,
    termination_reason: Option<String>,
}

impl DialogueController {
    pub fn new(config: DialogueConfig) -> Self {
        Self {
            config,
            state: DialogueState {
                current_question_index: 0,
                phase: DialoguePhase::AwaitingStart,
            },
            turns: Vec::new(),
            interim: None,
            questions_answered: 0,
            next_utterance: 1,
            pending_utterance: None,
            awaiting_next: false,
            recognizing: false,
            speech_available: true,
            recognition_available: true,
            termination_reason: None,
        }
    }

    /// Skip spoken questions from now on; answers are typed or transcribed
    pub fn disable_speech_output(&mut self) {
        self.speech_available = false;
    }

    /// Accept typed answers only from now on
    pub fn disable_recognition(&mut self) {
        self.recognition_available = false;
        self.recognizing = false;
    }

    /// Single entry point for every dialogue event
    pub fn advance(&mut self, input: DialogueInput, now: DateTime<Utc>) -> Vec<DialogueEffect> {
        use DialogueInput::*;
        use DialoguePhase::*;

        match (self.state.phase, input) {
            (Finished, input) => {
                debug!("Dialogue finished, discarding {:?}", input);
                Vec::new()
            }
            (_, Terminate { reason }) => self.finish(Some(reason), now),
            (_, TimeExpired) => self.finish(Some(TIME_LIMIT_REASON.to_string()), now),
            (AwaitingStart, Start) => {
                if self.config.questions.is_empty() {
                    self.finish(None, now)
                } else {
                    self.ask(0, now)
                }
            }
            (Speaking, SpeechFinished { utterance } | SpeechFailed { utterance })
                if self.pending_utterance == Some(utterance) =>
            {
                self.open_floor()
            }
            (WaitingForResponse, InterimTranscript(text)) => self.update_interim(text, now),
            (WaitingForResponse, FinalTranscript(text)) => self.accept(clean_transcript(&text), now),
            (WaitingForResponse, TextSubmitted(text)) => self.accept(text.trim().to_string(), now),
            (Processing, AcknowledgementElapsed) => {
                let next = self.state.current_question_index + 1;
                if next >= self.config.questions.len() {
                    self.finish(None, now)
                } else if self.config.auto_advance {
                    self.ask(next, now)
                } else {
                    self.awaiting_next = true;
                    Vec::new()
                }
            }
            (Processing, NextQuestion) if self.awaiting_next => {
                self.ask(self.state.current_question_index + 1, now)
            }
            (phase, input) => {
                debug!("Ignoring {:?} in phase {:?}", input, phase);
                Vec::new()
            }
        }
    }

    fn ask(&mut self, index: usize, now: DateTime<Utc>) -> Vec<DialogueEffect> {
        self.state.current_question_index = index;
        self.state.phase = DialoguePhase::Speaking;
        self.awaiting_next = false;

        let text = self.config.questions[index].clone();
        let turn = ConversationTurn::ai(text.clone(), now);
        self.turns.push(turn.clone());

        info!(
            "Asking question {}/{}",
            index + 1,
            self.config.questions.len()
        );

        let mut effects = vec![DialogueEffect::DisableInput, DialogueEffect::TurnAdded(turn)];

        if self.speech_available {
            let utterance = self.next_utterance;
            self.next_utterance += 1;
            self.pending_utterance = Some(utterance);
            effects.push(DialogueEffect::Speak { utterance, text });
        } else {
            effects.extend(self.open_floor());
        }

        effects
    }

    fn open_floor(&mut self) -> Vec<DialogueEffect> {
        self.state.phase = DialoguePhase::WaitingForResponse;
        self.pending_utterance = None;

        let mut effects = vec![DialogueEffect::EnableInput];
        if self.recognition_available && !self.recognizing {
            self.recognizing = true;
            effects.push(DialogueEffect::StartRecognition);
        }
        effects
    }

    fn update_interim(&mut self, text: String, now: DateTime<Utc>) -> Vec<DialogueEffect> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Vec::new();
        }

        let turn = match self.interim.take() {
            Some(mut turn) => {
                turn.text = text;
                turn.timestamp = now;
                turn
            }
            None => ConversationTurn {
                is_interim: true,
                ..ConversationTurn::candidate(text, now)
            },
        };

        self.interim = Some(turn.clone());
        vec![DialogueEffect::InterimUpdated(turn)]
    }

    fn accept(&mut self, text: String, now: DateTime<Utc>) -> Vec<DialogueEffect> {
        if text.is_empty() {
            return Vec::new();
        }

        // The finalized turn takes over the placeholder's id.
        let mut turn = ConversationTurn::candidate(text, now);
        if let Some(placeholder) = self.interim.take() {
            turn.id = placeholder.id;
        }
        self.turns.push(turn.clone());
        self.questions_answered += 1;
        self.state.phase = DialoguePhase::Processing;

        let mut effects = Vec::new();
        if self.recognizing {
            self.recognizing = false;
            effects.push(DialogueEffect::StopRecognition);
        }
        effects.push(DialogueEffect::DisableInput);
        effects.push(DialogueEffect::TurnAdded(turn));
        effects.push(DialogueEffect::ScheduleAcknowledgement);
        effects
    }

    fn finish(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Vec<DialogueEffect> {
        let mut effects = Vec::new();

        if self.state.phase == DialoguePhase::Speaking && self.pending_utterance.take().is_some() {
            effects.push(DialogueEffect::CancelSpeech);
        }
        if self.recognizing {
            self.recognizing = false;
            effects.push(DialogueEffect::StopRecognition);
        }
        effects.push(DialogueEffect::DisableInput);

        self.interim = None;
        self.awaiting_next = false;
        self.state.phase = DialoguePhase::Finished;

        if reason.is_none() {
            let closing = ConversationTurn::ai(self.config.closing_message.clone(), now);
            self.turns.push(closing.clone());
            effects.push(DialogueEffect::TurnAdded(closing));
        }

        info!(
            "Dialogue finished after {}/{} answers{}",
            self.questions_answered,
            self.config.questions.len(),
            reason
                .as_deref()
                .map(|r| format!(": {}", r))
                .unwrap_or_default()
        );

        self.termination_reason = reason.clone();
        effects.push(DialogueEffect::Finished {
            termination_reason: reason,
        });
        effects
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn phase(&self) -> DialoguePhase {
        self.state.phase
    }

    pub fn floor(&self) -> Floor {
        match self.state.phase {
            DialoguePhase::Speaking => Floor::Interviewer,
            DialoguePhase::WaitingForResponse => Floor::Candidate,
            _ => Floor::Nobody,
        }
    }

    pub fn input_enabled(&self) -> bool {
        self.state.phase == DialoguePhase::WaitingForResponse
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn interim(&self) -> Option<&ConversationTurn> {
        self.interim.as_ref()
    }

    pub fn questions_answered(&self) -> usize {
        self.questions_answered
    }

    pub fn total_questions(&self) -> usize {
        self.config.questions.len()
    }

    pub fn current_question(&self) -> Option<&str> {
        self.config
            .questions
            .get(self.state.current_question_index)
            .map(String::as_str)
    }

    pub fn termination_reason(&self) -> Option<&str> {
        self.termination_reason.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == DialoguePhase::Finished
    }
}

/// Drop filler words and collapse whitespace in a recognized answer
pub fn clean_transcript(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| {
            let bare = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_ascii_lowercase();
            !FILLER_WORDS.contains(&bare.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
