use thiserror::Error;

/// Failure raised by a `Transport` implementation.
///
/// Distinguishes "nothing came back" from "the server answered with a non-2xx
/// status"; only the latter can carry a rate-limit signal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("No response: {0}")]
    NoResponse(String),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

impl TransportError {
    pub const RATE_LIMIT_STATUS: u16 = 429;

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == Self::RATE_LIMIT_STATUS)
    }
}

/// Structural rejection of a decoded provider payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{reason}", item_prefix(.index))]
pub struct ValidationError {
    pub reason: String,
    pub index: Option<usize>,
}

fn item_prefix(index: &Option<usize>) -> String {
    index.map(|i| format!("item {}: ", i)).unwrap_or_default()
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into(), index: None }
    }

    pub fn at(index: usize, reason: impl Into<String>) -> Self {
        Self { reason: reason.into(), index: Some(index) }
    }
}

/// Why the provider envelope could not yield its candidate text or payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("response body is not JSON")]
    NotJson,
    #[error("unexpected envelope shape: {0}")]
    BadShape(String),
    #[error("envelope has no candidate text")]
    NoText,
    #[error("candidate text is not valid JSON: {0}")]
    InnerNotJson(String),
}

/// A 2xx response whose content cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Classification of a terminal generation failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error("network error")]
    NetworkError,
    /// JSON decode failures and schema-validation failures alike.
    #[error("malformed response")]
    MalformedResponse,
    #[error("cancelled")]
    Cancelled,
    #[error("invalid request")]
    InvalidRequest,
}

impl FailureKind {
    /// Short label used when capturing exchanges.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::RateLimitExceeded => "rate_limit_exceeded",
            FailureKind::NetworkError => "network_error",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Cancelled => "cancelled",
            FailureKind::InvalidRequest => "invalid_request",
        }
    }
}

/// Caller error while building a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Topic must not be empty")]
    EmptyTopic,
    #[error("Question count {0} is outside the supported range 1..=10")]
    CountOutOfRange(usize),
    #[error("Text must not be empty")]
    EmptyText,
    #[error("Question must not be empty")]
    EmptyQuestion,
}

/// Quiz-session protocol misuse. Reported, never absorbed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Question {position} has already been answered")]
    AlreadyAnswered { position: usize },
    #[error("'{choice}' is not one of the options for question {position}")]
    InvalidChoice { position: usize, choice: String },
    #[error("No answer locked for question {position}")]
    NoAnswerLocked { position: usize },
    #[error("Session is already completed")]
    SessionCompleted,
    #[error("Session is not completed yet")]
    NotCompleted,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("Unanswered questions: {missing:?}")]
    Unanswered { missing: Vec<usize> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_includes_item_index() {
        assert_eq!(ValidationError::at(3, "missing field 'options'").to_string(), "item 3: missing field 'options'");
        assert_eq!(ValidationError::new("question list is empty").to_string(), "question list is empty");
    }

    #[test]
    fn response_error_is_transparent() {
        let err: ResponseError = EnvelopeError::NoText.into();
        assert_eq!(err.to_string(), "envelope has no candidate text");
        assert_eq!(FailureKind::MalformedResponse.to_string(), "malformed response");
    }
}
