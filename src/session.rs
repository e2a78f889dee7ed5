//! Quiz-taking state machine.
//!
//! A session walks a fixed [`QuestionSequence`] one question at a time:
//!
//! ```text
//! AwaitingAnswer --answer--> AnswerLocked --advance--> AwaitingAnswer | Completed
//! Completed --retry--> fresh session (same questions)
//! Completed --regenerate--> torn down
//! ```
//!
//! Once an answer is recorded for a position it cannot change until the whole
//! session is reset, so the score stays a pure function of the answers map.

use crate::error::SessionError;
use crate::schema::{QuestionRecord, QuestionSequence};
use crate::scoring::{self, Answers};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    AwaitingAnswer,
    AnswerLocked,
    Completed,
}

/// Render-ready view of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub position: usize,
    pub score: usize,
    pub state: SessionState,
    pub total_questions: usize,
}

/// Result of locking an answer, for the correctness reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: String,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    sequence: QuestionSequence,
    position: usize,
    answers: Answers,
    score: usize,
    state: SessionState,
}

impl QuizSession {
    pub fn new(sequence: QuestionSequence) -> Self {
        debug!(total_questions = sequence.len(), "Starting quiz session");
        Self {
            sequence,
            position: 0,
            answers: Answers::new(),
            score: 0,
            state: SessionState::AwaitingAnswer,
        }
    }

    /// Lock `choice` as the answer for the current question.
    pub fn answer(&mut self, choice: &str) -> Result<AnswerFeedback, SessionError> {
        match self.state {
            SessionState::Completed => return Err(SessionError::SessionCompleted),
            SessionState::AnswerLocked => {
                return Err(SessionError::AlreadyAnswered { position: self.position })
            }
            SessionState::AwaitingAnswer => {}
        }
        if self.answers.contains_key(&self.position) {
            return Err(SessionError::AlreadyAnswered { position: self.position });
        }

        let record = &self.sequence[self.position];
        if !record.has_option(choice) {
            return Err(SessionError::InvalidChoice {
                position: self.position,
                choice: choice.to_string(),
            });
        }

        let correct = scoring::is_correct(record, choice);
        let feedback = AnswerFeedback {
            correct,
            correct_answer: record.correct_answer.clone(),
        };

        self.answers.insert(self.position, choice.to_string());
        if correct {
            self.score += 1;
        }
        self.state = SessionState::AnswerLocked;
        debug!(position = self.position, correct, score = self.score, "Answer locked");
        Ok(feedback)
    }

    /// Move past the locked question.
    pub fn advance(&mut self) -> Result<SessionState, SessionError> {
        match self.state {
            SessionState::Completed => return Err(SessionError::SessionCompleted),
            SessionState::AwaitingAnswer => {
                return Err(SessionError::NoAnswerLocked { position: self.position })
            }
            SessionState::AnswerLocked => {}
        }

        self.position += 1;
        self.state = if self.position < self.sequence.len() {
            SessionState::AwaitingAnswer
        } else {
            debug!(score = self.score, total_questions = self.sequence.len(), "Quiz session completed");
            SessionState::Completed
        };
        Ok(self.state)
    }

    /// Fresh session over the same questions. Only valid once completed.
    pub fn retry(&self) -> Result<QuizSession, SessionError> {
        if self.state != SessionState::Completed {
            return Err(SessionError::NotCompleted);
        }
        Ok(QuizSession::new(self.sequence.clone()))
    }

    /// Tear the session down so the caller can generate a new quiz.
    ///
    /// Before completion the untouched session is handed back.
    pub fn regenerate(self) -> Result<(), QuizSession> {
        if self.state != SessionState::Completed {
            return Err(self);
        }
        debug!("Discarding question sequence for regeneration");
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            position: self.position,
            score: self.score,
            state: self.state,
            total_questions: self.sequence.len(),
        }
    }

    /// The question at the current position, `None` once completed.
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.sequence.get(self.position)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn sequence(&self) -> &QuestionSequence {
        &self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_questions() -> QuestionSequence {
        QuestionSequence::new(vec![
            QuestionRecord::new("Capital of France?", vec!["Paris".into(), "Berlin".into()], "Paris").unwrap(),
            QuestionRecord::new("Meaning of life?", vec!["7".into(), "42".into()], "42").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn starts_awaiting_first_answer() {
        let session = QuizSession::new(two_questions());
        assert_eq!(
            session.snapshot(),
            SessionSnapshot { position: 0, score: 0, state: SessionState::AwaitingAnswer, total_questions: 2 }
        );
        assert_eq!(session.current_question().unwrap().question_text, "Capital of France?");
    }

    #[test]
    fn invalid_choice_does_not_lock() {
        let mut session = QuizSession::new(two_questions());
        let err = session.answer("Madrid").unwrap_err();
        assert!(matches!(err, SessionError::InvalidChoice { position: 0, .. }));
        assert_eq!(session.state(), SessionState::AwaitingAnswer);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn advance_requires_locked_answer() {
        let mut session = QuizSession::new(two_questions());
        assert_eq!(session.advance(), Err(SessionError::NoAnswerLocked { position: 0 }));
    }

    #[test]
    fn completed_session_rejects_further_moves() {
        let mut session = QuizSession::new(two_questions());
        session.answer("Paris").unwrap();
        session.advance().unwrap();
        session.answer("42").unwrap();
        assert_eq!(session.advance(), Ok(SessionState::Completed));
        assert!(session.current_question().is_none());

        assert_eq!(session.advance(), Err(SessionError::SessionCompleted));
        assert_eq!(session.answer("42"), Err(SessionError::SessionCompleted));
        assert_eq!(session.score(), 2);
    }

    #[test]
    fn regenerate_before_completion_returns_session() {
        let mut session = QuizSession::new(two_questions());
        session.answer("Berlin").unwrap();
        let session = session.regenerate().unwrap_err();
        assert_eq!(session.state(), SessionState::AnswerLocked);
        assert_eq!(session.retry().unwrap_err(), SessionError::NotCompleted);
    }

    #[test]
    fn feedback_reveals_correct_answer() {
        let mut session = QuizSession::new(two_questions());
        let feedback = session.answer("Berlin").unwrap();
        assert_eq!(feedback, AnswerFeedback { correct: false, correct_answer: "Paris".to_string() });
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let session = QuizSession::new(two_questions());
        let value = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(value["totalQuestions"], 2);
        assert_eq!(value["state"], "AwaitingAnswer");
    }
}
