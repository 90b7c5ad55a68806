use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::events::{SessionEvent, SessionEventSink};
use super::stats::{SessionResult, SessionSnapshot};
use super::timer::{SessionTimer, TimerEvent};
use crate::audio::{AudioLevelMonitor, AudioNotice};
use crate::detection::{Detection, FrameAnalyzer};
use crate::dialogue::{DialogueController, DialogueEffect, DialogueInput, TIME_LIMIT_REASON};
use crate::error::{ProctorError, ProctorResult};
use crate::guard::{GuardEvent, GuardHandle, GuardSink, PlatformEvents, SessionGuard};
use crate::media::{MediaBackend, MediaConstraints, MediaStream};
use crate::speech::{SpeechCompletion, SpeechInput, SpeechOutput, TranscriptSink};
use crate::tracking::{FaceSample, TrackerEvent, ViolationTracker};

/// External engines a session drives
pub struct SessionCollaborators {
    pub media: Arc<dyn MediaBackend>,
    pub analyzer: Box<dyn FrameAnalyzer>,
    /// `None` runs the interview text-only
    pub speech_output: Option<Arc<dyn SpeechOutput>>,
    /// `None` accepts typed answers only
    pub speech_input: Option<Arc<dyn SpeechInput>>,
    pub platform: Arc<dyn PlatformEvents>,
    pub events: Arc<dyn SessionEventSink>,
}

/// Messages processed by the session task, in arrival order
#[derive(Debug)]
pub enum SessionCommand {
    Guard(GuardEvent),
    SpeechFinished(u64),
    Transcript { text: String, is_final: bool },
    SubmitText(String),
    NextQuestion,
    ForceEnd { reason: String },
    /// The owning handle went away
    Detach,
}

/// Owner-side view of a running session
///
/// Dropping the handle ends the session and releases every resource.
pub struct SessionHandle {
    session_id: String,
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
    result: watch::Receiver<Option<SessionResult>>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn send(&self, command: SessionCommand) -> ProctorResult<()> {
        self.commands
            .send(command)
            .map_err(|_| ProctorError::SessionClosed(self.session_id.clone()))
    }

    /// End the session now with `reason`
    pub fn force_end(&self, reason: impl Into<String>) -> ProctorResult<()> {
        self.send(SessionCommand::ForceEnd {
            reason: reason.into(),
        })
    }

    /// Typed answer for the current question
    pub fn submit_text(&self, text: impl Into<String>) -> ProctorResult<()> {
        self.send(SessionCommand::SubmitText(text.into()))
    }

    /// Manual advance when auto-advance is off
    pub fn next_question(&self) -> ProctorResult<()> {
        self.send(SessionCommand::NextQuestion)
    }

    /// Feed a recognized transcript without a speech input engine
    pub fn push_transcript(&self, text: impl Into<String>, is_final: bool) -> ProctorResult<()> {
        self.send(SessionCommand::Transcript {
            text: text.into(),
            is_final,
        })
    }

    /// Latest published snapshot
    pub fn status(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that changes on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Final result, once the session has ended
    pub fn result(&self) -> Option<SessionResult> {
        self.result.borrow().clone()
    }

    /// Wait until the session ends
    pub async fn wait(&self) -> Option<SessionResult> {
        let mut rx = self.result.clone();
        let _ = rx.wait_for(Option::is_some).await;
        self.result()
    }

    pub fn is_ended(&self) -> bool {
        self.result.borrow().is_some()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(SessionCommand::Detach);
    }
}

/// Start a proctored session on the current tokio runtime
pub fn start_session(config: SessionConfig, collaborators: SessionCollaborators) -> SessionHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let runtime = SessionRuntime::new(config, collaborators, tx.clone());

    let handle = SessionHandle {
        session_id: runtime.config.session_id.clone(),
        commands: tx,
        snapshot: runtime.snapshot_tx.subscribe(),
        result: runtime.result_tx.subscribe(),
    };

    tokio::spawn(runtime.run(rx));
    handle
}

/// Single owner of every per-session component
///
/// All state changes happen on the session task, so ticks, guard events,
/// speech callbacks and transcripts are serialized.
struct SessionRuntime {
    config: SessionConfig,
    tracker: ViolationTracker,
    dialogue: DialogueController,
    timer: SessionTimer,
    analyzer: Box<dyn FrameAnalyzer>,
    audio: AudioLevelMonitor,

    media: Arc<dyn MediaBackend>,
    speech_output: Option<Arc<dyn SpeechOutput>>,
    speech_input: Option<Arc<dyn SpeechInput>>,
    platform: Arc<dyn PlatformEvents>,
    events: Arc<dyn SessionEventSink>,

    stream: Option<Arc<dyn MediaStream>>,
    guard: Option<GuardHandle>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    result_tx: watch::Sender<Option<SessionResult>>,

    started_at: DateTime<Utc>,
    clock: Instant,
    last_sample: Option<FaceSample>,
    /// When the stream last produced a frame
    last_frame_at: Instant,
    feed_stalled: bool,
    remaining_seconds: u64,
    input_enabled: bool,
    speaking: bool,
    recognizing: bool,
    acknowledgement_requested: bool,
    finished: bool,
}

impl SessionRuntime {
    fn new(
        config: SessionConfig,
        collaborators: SessionCollaborators,
        commands: mpsc::UnboundedSender<SessionCommand>,
    ) -> Self {
        let started_at = Utc::now();
        let dialogue = DialogueController::new(config.dialogue_config());
        let timer = SessionTimer::new(config.duration(), started_at);
        let initial = SessionSnapshot {
            session_id: config.session_id.clone(),
            state: Default::default(),
            dialogue: dialogue.state(),
            floor: dialogue.floor(),
            input_enabled: false,
            questions_answered: 0,
            total_questions: dialogue.total_questions(),
            remaining_seconds: config.duration_seconds,
            audio_level: 0.0,
            last_sample: None,
            media_active: false,
            ended: false,
        };

        Self {
            tracker: ViolationTracker::new(config.tracker_policy()),
            audio: AudioLevelMonitor::new(config.audio_config()),
            remaining_seconds: config.duration_seconds,
            dialogue,
            timer,
            analyzer: collaborators.analyzer,
            media: collaborators.media,
            speech_output: collaborators.speech_output,
            speech_input: collaborators.speech_input,
            platform: collaborators.platform,
            events: collaborators.events,
            stream: None,
            guard: None,
            commands,
            snapshot_tx: watch::channel(initial).0,
            result_tx: watch::channel(None).0,
            started_at,
            clock: Instant::now(),
            last_sample: None,
            last_frame_at: Instant::now(),
            feed_stalled: false,
            input_enabled: false,
            speaking: false,
            recognizing: false,
            acknowledgement_requested: false,
            finished: false,
            config,
        }
    }

    /// Session clock; follows the tokio clock so paused-time tests work
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.clock.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.started_at + elapsed
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
        info!(
            "Starting proctored session {} ({} questions, {}s)",
            self.config.session_id,
            self.dialogue.total_questions(),
            self.config.duration_seconds
        );

        self.acquire_media().await;
        if self.config.enable_screen_lock {
            self.install_guard();
        }
        if self.speech_output.is_none() {
            self.notice("Speech output unavailable, questions are shown as text");
            self.dialogue.disable_speech_output();
        }
        if self.speech_input.is_none() {
            self.dialogue.disable_recognition();
        }

        let detect = self.config.enable_face_detection
            && self.stream.as_ref().is_some_and(|s| s.has_video());
        let monitor_audio = self.config.enable_audio_monitoring
            && self.stream.as_ref().is_some_and(|s| s.has_audio());

        let mut frame_tick = tokio::time::interval(self.config.detection_interval());
        let mut audio_tick = tokio::time::interval(self.config.audio_interval());
        let mut timer_tick = tokio::time::interval(self.config.timer_interval());
        for tick in [&mut frame_tick, &mut audio_tick, &mut timer_tick] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        let acknowledgement_delay = self.config.acknowledgement_delay();
        let acknowledgement = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(acknowledgement);
        let mut acknowledgement_pending = false;

        self.last_frame_at = Instant::now();
        self.step(DialogueInput::Start);
        self.publish();

        while !self.finished {
            if self.acknowledgement_requested {
                self.acknowledgement_requested = false;
                acknowledgement_pending = true;
                acknowledgement
                    .as_mut()
                    .reset(Instant::now() + acknowledgement_delay);
            }

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => self.force_end("Session closed"),
                },
                _ = frame_tick.tick(), if detect => self.on_frame_tick(),
                _ = audio_tick.tick(), if monitor_audio => self.on_audio_tick(),
                _ = timer_tick.tick() => self.on_timer_tick(),
                () = &mut acknowledgement, if acknowledgement_pending => {
                    acknowledgement_pending = false;
                    self.step(DialogueInput::AcknowledgementElapsed);
                }
            }

            self.publish();
        }

        self.finish();
    }

    async fn acquire_media(&mut self) {
        if !self.config.enable_face_detection && !self.config.enable_audio_monitoring {
            return;
        }

        let constraints = MediaConstraints {
            video: self.config.enable_face_detection,
            audio: self.config.enable_audio_monitoring,
        };

        match self.media.acquire(constraints).await {
            Ok(stream) => {
                info!(
                    "Media acquired from {} (video: {}, audio: {})",
                    self.media.name(),
                    stream.has_video(),
                    stream.has_audio()
                );
                self.stream = Some(stream);
            }
            Err(e) => {
                warn!("Continuing without media: {}", e);
                self.notice(&format!(
                    "Camera and microphone unavailable ({}), continuing without them",
                    e
                ));
            }
        }
    }

    fn install_guard(&mut self) {
        let commands = self.commands.clone();
        let sink: GuardSink = Arc::new(move |event| {
            let _ = commands.send(SessionCommand::Guard(event));
        });
        self.guard = Some(SessionGuard::install(self.platform.as_ref(), sink));
    }

    fn handle_command(&mut self, command: SessionCommand) {
        debug!("Session command: {:?}", command);
        match command {
            SessionCommand::Guard(event) => {
                let events = self.tracker.record_guard(&event, self.now());
                self.apply_tracker(events);
            }
            SessionCommand::SpeechFinished(utterance) => {
                self.speaking = false;
                self.step(DialogueInput::SpeechFinished { utterance });
            }
            SessionCommand::Transcript { text, is_final } => {
                let input = if is_final {
                    DialogueInput::FinalTranscript(text)
                } else {
                    DialogueInput::InterimTranscript(text)
                };
                self.step(input);
            }
            SessionCommand::SubmitText(text) => self.step(DialogueInput::TextSubmitted(text)),
            SessionCommand::NextQuestion => self.step(DialogueInput::NextQuestion),
            SessionCommand::ForceEnd { reason } => self.force_end(&reason),
            SessionCommand::Detach => self.force_end("Session detached"),
        }
    }

    fn force_end(&mut self, reason: &str) {
        match self.tracker.terminate(reason) {
            Some(event) => self.apply_tracker(vec![event]),
            None => self.step(DialogueInput::Terminate {
                reason: reason.to_string(),
            }),
        }
    }

    fn on_frame_tick(&mut self) {
        let Some(frame) = self.stream.as_ref().and_then(|s| s.capture_frame()) else {
            self.on_missing_frame();
            return;
        };

        self.last_frame_at = Instant::now();
        if self.feed_stalled {
            self.feed_stalled = false;
            info!("Camera feed resumed");
            self.notice("Camera feed restored");
        }

        match self.analyzer.analyze(&frame) {
            Ok(detection) => self.record_detection(detection),
            Err(e) => debug!("Skipping detection tick: {}", e),
        }
    }

    /// A feed silent for longer than the stale timeout counts as absence
    fn on_missing_frame(&mut self) {
        let silent = self.last_frame_at.elapsed();
        if silent < self.config.stale_frame_timeout() {
            return;
        }

        if !self.feed_stalled {
            self.feed_stalled = true;
            warn!("No camera frame for {:?}, counting candidate as absent", silent);
            self.notice("Camera feed interrupted, you are counted as absent until it resumes");
        }
        self.record_detection(Detection::absent(0.0));
    }

    fn record_detection(&mut self, detection: Detection) {
        let sample = FaceSample::from_detection(detection, self.now());
        self.last_sample = Some(sample);
        let events = self.tracker.record_sample(&sample);
        self.apply_tracker(events);
    }

    fn on_audio_tick(&mut self) {
        let Some(bins) = self.stream.as_ref().and_then(|s| s.frequency_data()) else {
            return;
        };

        match self.audio.observe(&bins) {
            (_, Some(AudioNotice::Low)) => {
                self.notice("Your microphone level is very low, please speak up")
            }
            (_, Some(AudioNotice::Restored)) => self.notice("Microphone level restored"),
            _ => {}
        }
    }

    fn on_timer_tick(&mut self) {
        let tick = self.timer.tick(self.now());
        self.remaining_seconds = tick.remaining_seconds;

        for event in tick.events {
            match event {
                TimerEvent::Warning { seconds_left } => {
                    info!("{}s remaining in session", seconds_left);
                    self.emit(SessionEvent::TimerWarning { seconds_left });
                }
                TimerEvent::TimeUp => {
                    info!("Session time limit reached");
                    // Status only; the dialogue ends through TimeExpired.
                    self.tracker.terminate(TIME_LIMIT_REASON);
                    self.step(DialogueInput::TimeExpired);
                }
            }
        }
    }

    fn apply_tracker(&mut self, events: Vec<TrackerEvent>) {
        for event in events {
            match event {
                TrackerEvent::AlertTone => self.emit(SessionEvent::Alert),
                TrackerEvent::ViolationRecorded(violation) => {
                    self.emit(SessionEvent::Violation { violation })
                }
                TrackerEvent::Terminated { reason } => {
                    self.step(DialogueInput::Terminate { reason })
                }
            }
        }
    }

    fn step(&mut self, input: DialogueInput) {
        let effects = self.dialogue.advance(input, self.now());
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<DialogueEffect>) {
        for effect in effects {
            match effect {
                DialogueEffect::Speak { utterance, text } => self.speak(utterance, &text),
                DialogueEffect::CancelSpeech => {
                    if let Some(output) = &self.speech_output {
                        output.cancel();
                    }
                    self.speaking = false;
                }
                DialogueEffect::EnableInput => self.input_enabled = true,
                DialogueEffect::DisableInput => self.input_enabled = false,
                DialogueEffect::StartRecognition => self.start_recognition(),
                DialogueEffect::StopRecognition => self.stop_recognition(),
                DialogueEffect::TurnAdded(turn) => self.emit(SessionEvent::TurnAdded { turn }),
                DialogueEffect::InterimUpdated(turn) => {
                    self.emit(SessionEvent::TurnUpdated { turn })
                }
                DialogueEffect::ScheduleAcknowledgement => self.acknowledgement_requested = true,
                DialogueEffect::Finished { .. } => self.finished = true,
            }
        }
    }

    fn speak(&mut self, utterance: u64, text: &str) {
        let result = match &self.speech_output {
            Some(output) => {
                let commands = self.commands.clone();
                let done = SpeechCompletion::new(utterance, move |utterance| {
                    let _ = commands.send(SessionCommand::SpeechFinished(utterance));
                });
                output.speak(text, done)
            }
            None => Err(ProctorError::SpeechUnavailable("no speech output".to_string())),
        };

        match result {
            Ok(()) => self.speaking = true,
            Err(e) => {
                warn!("Speech output failed, continuing text-only: {}", e);
                self.notice("Speech output unavailable, questions are shown as text");
                self.dialogue.disable_speech_output();
                self.step(DialogueInput::SpeechFailed { utterance });
            }
        }
    }

    fn start_recognition(&mut self) {
        let Some(input) = self.speech_input.clone() else {
            self.dialogue.disable_recognition();
            return;
        };

        let commands = self.commands.clone();
        let sink = TranscriptSink::new(move |text, is_final| {
            let _ = commands.send(SessionCommand::Transcript { text, is_final });
        });

        match input.start(sink) {
            Ok(()) => self.recognizing = true,
            Err(e) => {
                warn!("Speech recognition failed, accepting typed answers: {}", e);
                self.notice("Speech recognition unavailable, please type your answers");
                self.dialogue.disable_recognition();
            }
        }
    }

    fn stop_recognition(&mut self) {
        if !self.recognizing {
            return;
        }
        if let Some(input) = &self.speech_input {
            input.stop();
        }
        self.recognizing = false;
    }

    fn emit(&self, event: SessionEvent) {
        self.events.emit(event);
    }

    fn notice(&self, message: &str) {
        self.emit(SessionEvent::Notice {
            message: message.to_string(),
        });
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.config.session_id.clone(),
            state: self.tracker.state().clone(),
            dialogue: self.dialogue.state(),
            floor: self.dialogue.floor(),
            input_enabled: self.input_enabled,
            questions_answered: self.dialogue.questions_answered(),
            total_questions: self.dialogue.total_questions(),
            remaining_seconds: self.remaining_seconds,
            audio_level: self.audio.level(),
            last_sample: self.last_sample,
            media_active: self.stream.as_ref().is_some_and(|s| s.live_tracks() > 0),
            ended: self.finished,
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn finish(&mut self) {
        self.teardown();

        let ended_at = self.now();
        let result = SessionResult {
            session_id: self.config.session_id.clone(),
            questions_answered: self.dialogue.questions_answered(),
            total_questions: self.dialogue.total_questions(),
            duration_seconds: (ended_at - self.started_at).num_seconds().max(0) as u64,
            violations: self.tracker.violations().to_vec(),
            turns: self.dialogue.turns().to_vec(),
            termination_reason: self.dialogue.termination_reason().map(str::to_string),
            started_at: self.started_at,
            ended_at,
        };

        info!(
            "Session {} ended: {}/{} answered, {} violations{}",
            result.session_id,
            result.questions_answered,
            result.total_questions,
            result.violations.len(),
            result
                .termination_reason
                .as_deref()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default()
        );

        self.publish();
        self.emit(SessionEvent::SessionEnded {
            result: result.clone(),
        });
        self.result_tx.send_replace(Some(result));
    }

    /// Release speech, listeners and media tracks; safe to call repeatedly
    fn teardown(&mut self) {
        if self.speaking {
            if let Some(output) = &self.speech_output {
                output.cancel();
            }
            self.speaking = false;
        }
        self.stop_recognition();

        if let Some(handle) = self.guard.take() {
            SessionGuard::remove(self.platform.as_ref(), handle);
        }

        if let Some(stream) = self.stream.take() {
            stream.stop_all();
            info!("Media tracks stopped for {}", self.config.session_id);
        }
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        self.teardown();
    }
}
