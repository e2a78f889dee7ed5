pub mod clients;
pub mod config;
pub mod core;
pub mod envelope;
pub mod error;
pub mod interceptors;
pub mod json_utils;
pub mod prompts;
pub mod schema;
pub mod scoring;
pub mod session;
pub mod transport;

// Convenient re-exports
pub use crate::core::{GenerationClient, GenerationOutcome, GenerationRequest, RetryConfig};
pub use error::{FailureKind, SessionError, ValidationError};
pub use prompts::{ChatRole, ChatTurn};
pub use schema::{validate, PlagiarismReport, QuestionRecord, QuestionSequence};
pub use session::{QuizSession, SessionSnapshot, SessionState};
