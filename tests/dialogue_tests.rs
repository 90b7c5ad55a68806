// Integration tests for the interview dialogue state machine
//
// These tests walk the controller through complete interviews and
// interruptions, checking the effects it asks the session to perform.

use chrono::{DateTime, Duration, TimeZone, Utc};
use interview_proctor::dialogue::{
    clean_transcript, DialogueConfig, DialogueController, DialogueEffect, DialogueInput,
    DialoguePhase, Floor, Speaker,
};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 27, 10, 0, 0).unwrap() + Duration::seconds(secs)
}

fn questions(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Question {}?", i)).collect()
}

fn controller(n: usize) -> DialogueController {
    DialogueController::new(DialogueConfig {
        questions: questions(n),
        ..DialogueConfig::default()
    })
}

fn spoken(effects: &[DialogueEffect]) -> Option<u64> {
    effects.iter().find_map(|e| match e {
        DialogueEffect::Speak { utterance, .. } => Some(*utterance),
        _ => None,
    })
}

fn finished(effects: &[DialogueEffect]) -> Option<Option<String>> {
    effects.iter().find_map(|e| match e {
        DialogueEffect::Finished { termination_reason } => Some(termination_reason.clone()),
        _ => None,
    })
}

#[test]
fn test_ten_question_interview_completes() {
    let mut dialogue = controller(10);
    let mut clock = 0;

    let mut effects = dialogue.advance(DialogueInput::Start, at(clock));
    let mut outcome = None;

    while outcome.is_none() {
        let utterance = spoken(&effects).expect("question should be spoken");
        assert_eq!(dialogue.floor(), Floor::Interviewer);
        assert!(!dialogue.input_enabled());

        clock += 5;
        let opened = dialogue.advance(DialogueInput::SpeechFinished { utterance }, at(clock));
        assert!(opened.contains(&DialogueEffect::EnableInput));
        assert_eq!(dialogue.floor(), Floor::Candidate);

        clock += 20;
        let answered = dialogue.advance(
            DialogueInput::FinalTranscript("um my answer".to_string()),
            at(clock),
        );
        assert!(answered.contains(&DialogueEffect::ScheduleAcknowledgement));
        assert_eq!(dialogue.floor(), Floor::Nobody);

        clock += 2;
        effects = dialogue.advance(DialogueInput::AcknowledgementElapsed, at(clock));
        outcome = finished(&effects);
    }

    assert_eq!(outcome, Some(None));
    assert_eq!(dialogue.phase(), DialoguePhase::Finished);
    assert_eq!(dialogue.questions_answered(), 10);
    assert_eq!(dialogue.termination_reason(), None);

    // Ten questions, ten answers, one closing message.
    let turns = dialogue.turns();
    assert_eq!(turns.len(), 21);
    assert_eq!(turns.last().map(|t| t.speaker), Some(Speaker::Ai));
    assert!(turns
        .iter()
        .filter(|t| t.speaker == Speaker::Candidate)
        .all(|t| t.text == "my answer"));
}

#[test]
fn test_termination_while_speaking_cancels_speech() {
    let mut dialogue = controller(3);
    dialogue.advance(DialogueInput::Start, at(0));
    assert_eq!(dialogue.phase(), DialoguePhase::Speaking);

    let effects = dialogue.advance(
        DialogueInput::Terminate {
            reason: "Session terminated: window lost focus".to_string(),
        },
        at(1),
    );

    assert_eq!(effects.first(), Some(&DialogueEffect::CancelSpeech));
    assert_eq!(
        finished(&effects),
        Some(Some("Session terminated: window lost focus".to_string()))
    );
    assert_eq!(dialogue.floor(), Floor::Nobody);
    assert_eq!(dialogue.questions_answered(), 0);
}

#[test]
fn test_inputs_after_finish_are_discarded() {
    let mut dialogue = controller(2);
    dialogue.advance(DialogueInput::Start, at(0));
    dialogue.advance(
        DialogueInput::Terminate {
            reason: "forced".to_string(),
        },
        at(1),
    );

    let turns_before = dialogue.turns().len();
    assert!(dialogue
        .advance(DialogueInput::SpeechFinished { utterance: 1 }, at(2))
        .is_empty());
    assert!(dialogue
        .advance(DialogueInput::TextSubmitted("late".to_string()), at(3))
        .is_empty());
    assert!(dialogue.advance(DialogueInput::TimeExpired, at(4)).is_empty());

    assert_eq!(dialogue.turns().len(), turns_before);
    assert_eq!(dialogue.termination_reason(), Some("forced"));
}

#[test]
fn test_stale_speech_completion_is_ignored() {
    let mut dialogue = controller(2);
    let effects = dialogue.advance(DialogueInput::Start, at(0));
    let utterance = spoken(&effects).unwrap();

    let stale = dialogue.advance(
        DialogueInput::SpeechFinished {
            utterance: utterance + 100,
        },
        at(1),
    );
    assert!(stale.is_empty());
    assert_eq!(dialogue.phase(), DialoguePhase::Speaking);
}

#[test]
fn test_answers_rejected_while_interviewer_speaks() {
    let mut dialogue = controller(2);
    dialogue.advance(DialogueInput::Start, at(0));

    let effects = dialogue.advance(DialogueInput::TextSubmitted("too early".to_string()), at(1));
    assert!(effects.is_empty());
    assert_eq!(dialogue.questions_answered(), 0);
}

#[test]
fn test_interim_transcript_is_replaced_then_finalized() {
    let mut dialogue = controller(2);
    let utterance = spoken(&dialogue.advance(DialogueInput::Start, at(0))).unwrap();
    dialogue.advance(DialogueInput::SpeechFinished { utterance }, at(1));

    dialogue.advance(DialogueInput::InterimTranscript("I think".to_string()), at(2));
    let first_id = dialogue.interim().unwrap().id;
    dialogue.advance(
        DialogueInput::InterimTranscript("I think that".to_string()),
        at(3),
    );
    let interim = dialogue.interim().unwrap();
    assert_eq!(interim.id, first_id);
    assert_eq!(interim.text, "I think that");
    assert!(interim.is_interim);

    dialogue.advance(
        DialogueInput::FinalTranscript("I think that works".to_string()),
        at(4),
    );

    assert!(dialogue.interim().is_none());
    let answer = dialogue.turns().last().unwrap();
    assert_eq!(answer.id, first_id);
    assert_eq!(answer.text, "I think that works");
    assert!(!answer.is_interim);
    assert_eq!(
        dialogue
            .turns()
            .iter()
            .filter(|t| t.speaker == Speaker::Candidate)
            .count(),
        1
    );
}

#[test]
fn test_speech_unavailable_opens_floor_immediately() {
    let mut dialogue = controller(2);
    dialogue.disable_speech_output();
    dialogue.disable_recognition();

    let effects = dialogue.advance(DialogueInput::Start, at(0));
    assert!(spoken(&effects).is_none());
    assert!(effects.contains(&DialogueEffect::EnableInput));
    assert!(!effects.contains(&DialogueEffect::StartRecognition));
    assert_eq!(dialogue.floor(), Floor::Candidate);

    dialogue.advance(DialogueInput::TextSubmitted("typed answer".to_string()), at(5));
    assert_eq!(dialogue.questions_answered(), 1);
}

#[test]
fn test_speech_failure_treated_as_completion() {
    let mut dialogue = controller(1);
    let utterance = spoken(&dialogue.advance(DialogueInput::Start, at(0))).unwrap();

    dialogue.disable_speech_output();
    let effects = dialogue.advance(DialogueInput::SpeechFailed { utterance }, at(1));
    assert!(effects.contains(&DialogueEffect::EnableInput));
    assert_eq!(dialogue.phase(), DialoguePhase::WaitingForResponse);
}

#[test]
fn test_manual_advance_waits_for_next_question() {
    let mut dialogue = DialogueController::new(DialogueConfig {
        questions: questions(2),
        auto_advance: false,
        ..DialogueConfig::default()
    });
    dialogue.disable_speech_output();

    dialogue.advance(DialogueInput::Start, at(0));
    dialogue.advance(DialogueInput::TextSubmitted("first".to_string()), at(1));
    let effects = dialogue.advance(DialogueInput::AcknowledgementElapsed, at(2));
    assert!(effects.is_empty());
    assert_eq!(dialogue.phase(), DialoguePhase::Processing);

    dialogue.advance(DialogueInput::NextQuestion, at(3));
    assert_eq!(dialogue.state().current_question_index, 1);
    assert_eq!(dialogue.current_question(), Some("Question 2?"));
}

#[test]
fn test_time_expired_ends_with_reason() {
    let mut dialogue = controller(3);
    dialogue.disable_speech_output();
    dialogue.advance(DialogueInput::Start, at(0));

    let effects = dialogue.advance(DialogueInput::TimeExpired, at(600));
    assert_eq!(
        finished(&effects),
        Some(Some("Session time limit reached".to_string()))
    );
}

#[test]
fn test_empty_script_finishes_on_start() {
    let mut dialogue = controller(0);

    let effects = dialogue.advance(DialogueInput::Start, at(0));
    assert_eq!(finished(&effects), Some(None));
    assert_eq!(dialogue.total_questions(), 0);
}

#[test]
fn test_blank_answers_are_ignored() {
    let mut dialogue = controller(1);
    dialogue.disable_speech_output();
    dialogue.advance(DialogueInput::Start, at(0));

    assert!(dialogue
        .advance(DialogueInput::TextSubmitted("   ".to_string()), at(1))
        .is_empty());
    assert_eq!(dialogue.phase(), DialoguePhase::WaitingForResponse);
}

#[test]
fn test_filler_words_removed_from_transcripts() {
    assert_eq!(clean_transcript("Um, I uh think  er so"), "I think so");
    assert_eq!(clean_transcript("  under  the errand "), "under the errand");
}
