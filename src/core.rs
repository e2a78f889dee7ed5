//! Generation client: turns a topic into a validated question sequence.
//!
//! The client owns a [`Transport`] and a [`RetryConfig`]. Every call produces
//! exactly one [`GenerationOutcome`]:
//! - HTTP 429 is retried with exponential backoff until `max_retries` attempts
//!   have been made, then reported as `RateLimitExceeded`;
//! - any other transport failure or non-2xx status is `NetworkError`, never
//!   retried;
//! - an unreadable envelope or a payload that fails schema validation is
//!   `MalformedResponse`, never retried;
//! - a triggered [`CancellationToken`] ends the loop with `Cancelled`.

use crate::config::env_parse;
use crate::envelope::{candidate_text, decode_inner};
use crate::error::{FailureKind, RequestError, ResponseError, TransportError, ValidationError};
use crate::interceptors::{Exchange, Interceptor};
use crate::prompts::{self, ChatTurn};
use crate::schema::{self, PlagiarismReport, QuestionSequence, ResponseSchema};
use crate::transport::{RawResponse, ResponseBody, Transport};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 10;

/// Topic and question count for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
    count: usize,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, count: usize) -> Result<Self, RequestError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(RequestError::EmptyTopic);
        }
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
            return Err(RequestError::CountOutOfRange(count));
        }
        Ok(Self { topic, count })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Terminal result of a generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome<T = QuestionSequence> {
    Success(T),
    Failure(FailureKind, String),
}

impl<T> GenerationOutcome<T> {
    fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(kind, message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(kind, _) => Some(*kind),
        }
    }

    pub fn into_result(self) -> Result<T, (FailureKind, String)> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(kind, message) => Err((kind, message)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts allowed while the provider keeps rate limiting. A
    /// value of 0 still makes one attempt.
    pub max_retries: usize,
    pub base_delay: Duration,
    /// Upper bound for a single backoff sleep.
    pub max_delay: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryConfig {
    /// Defaults overridden by `QUIZ_MAX_RETRIES`, `QUIZ_BASE_DELAY_MS` and
    /// `QUIZ_MAX_DELAY_MS` (0 disables the cap).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max_retries) = env_parse::<usize>("QUIZ_MAX_RETRIES") {
            config.max_retries = max_retries.max(1);
        }
        if let Some(ms) = env_parse::<u64>("QUIZ_BASE_DELAY_MS") {
            config.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("QUIZ_MAX_DELAY_MS") {
            config.max_delay = (ms > 0).then(|| Duration::from_millis(ms));
        }
        config
    }

    /// Total attempts; clamped to at least one.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = if max_retries == 0 { 1 } else { max_retries };
        self
    }

    fn attempts(&self) -> usize {
        self.max_retries.max(1)
    }

    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Option<Duration>) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Sleep before retry `n` (1-based): `base_delay * 2^n`, capped.
    pub fn delay_for_retry(&self, n: u32) -> Duration {
        let factor = 2u32.checked_pow(n).unwrap_or(u32::MAX);
        let delay = self.base_delay.checked_mul(factor).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

/// What a single attempt turned into.
enum Attempt<T> {
    RateLimited,
    Done(GenerationOutcome<T>),
}

#[derive(Clone)]
pub struct GenerationClient<C: Transport> {
    transport: C,
    config: RetryConfig,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl<C: Transport> std::fmt::Debug for GenerationClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}

impl<C: Transport> GenerationClient<C> {
    pub fn new(transport: C, config: RetryConfig) -> Self {
        info!(max_retries = config.max_retries, base_delay_ms = config.base_delay.as_millis() as u64, "Creating new GenerationClient");
        Self { transport, config, interceptor: None }
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Record every provider exchange through `interceptor`.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Generate a quiz. Equivalent to [`generate_with_cancel`](Self::generate_with_cancel)
    /// with a token nobody cancels.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        self.generate_with_cancel(request, &CancellationToken::new()).await
    }

    /// Convenience for callers holding raw form input.
    pub async fn generate_topic(&self, topic: &str, count: usize) -> GenerationOutcome {
        match GenerationRequest::new(topic, count) {
            Ok(request) => self.generate(&request).await,
            Err(e) => GenerationOutcome::failure(FailureKind::InvalidRequest, e.to_string()),
        }
    }

    #[instrument(target = "quiz_engine::generation", skip(self, request, cancel), fields(topic = %request.topic, count = request.count))]
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> GenerationOutcome {
        let payload = prompts::quiz_payload(&request.topic, request.count);
        let expected = request.count;
        self.run(payload, cancel, move |body| {
            Ok(schema::validate_count(&decode_inner(body)?, expected)?)
        })
        .await
    }

    /// Compare two texts and return a similarity report.
    #[instrument(target = "quiz_engine::generation", skip(self, my_text, source_text, cancel), fields(my_len = my_text.len(), source_len = source_text.len()))]
    pub async fn check_plagiarism(
        &self,
        my_text: &str,
        source_text: &str,
        cancel: &CancellationToken,
    ) -> GenerationOutcome<PlagiarismReport> {
        if my_text.trim().is_empty() || source_text.trim().is_empty() {
            return GenerationOutcome::failure(FailureKind::InvalidRequest, RequestError::EmptyText.to_string());
        }
        let payload = prompts::plagiarism_payload(my_text, source_text);
        self.run(payload, cancel, |body| Ok(PlagiarismReport::validate(&decode_inner(body)?)?))
            .await
    }

    /// Summarize `text` in free-form prose.
    #[instrument(target = "quiz_engine::generation", skip(self, text, cancel), fields(text_len = text.len()))]
    pub async fn summarize(&self, text: &str, cancel: &CancellationToken) -> GenerationOutcome<String> {
        if text.trim().is_empty() {
            return GenerationOutcome::failure(FailureKind::InvalidRequest, RequestError::EmptyText.to_string());
        }
        self.run(prompts::summary_payload(text), cancel, reply_text).await
    }

    /// Answer `question` as a tutor, with `history` as the earlier turns of
    /// the conversation.
    #[instrument(target = "quiz_engine::generation", skip(self, history, question, cancel), fields(turns = history.len()))]
    pub async fn tutor_reply(
        &self,
        history: &[ChatTurn],
        question: &str,
        cancel: &CancellationToken,
    ) -> GenerationOutcome<String> {
        if question.trim().is_empty() {
            return GenerationOutcome::failure(FailureKind::InvalidRequest, RequestError::EmptyQuestion.to_string());
        }
        self.run(prompts::tutor_payload(history, question), cancel, reply_text).await
    }

    /// Retry loop shared by every request. `parse` turns a 2xx body into the
    /// caller's value.
    async fn run<T, P>(&self, payload: Value, cancel: &CancellationToken, parse: P) -> GenerationOutcome<T>
    where
        P: Fn(&ResponseBody) -> Result<T, ResponseError>,
    {
        let max_retries = self.config.attempts();
        let mut retries: u32 = 0;

        for attempt in 1..=max_retries {
            if cancel.is_cancelled() {
                info!(attempt, "Generation cancelled before attempt");
                return GenerationOutcome::failure(FailureKind::Cancelled, "Generation was cancelled");
            }

            debug!(attempt, max_retries, "Sending generation request");
            match self.attempt(attempt, &payload, &parse).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::RateLimited if attempt == max_retries => break,
                Attempt::RateLimited => {
                    retries += 1;
                    let delay = self.config.delay_for_retry(retries);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "Rate limited, backing off");
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!(attempt, "Generation cancelled during backoff");
                            return GenerationOutcome::failure(FailureKind::Cancelled, "Generation was cancelled");
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        error!(max_retries, "Max retries exceeded");
        GenerationOutcome::failure(
            FailureKind::RateLimitExceeded,
            format!("Maximum retries exceeded ({} attempts). Please try again later.", max_retries),
        )
    }

    async fn attempt<T, P>(&self, attempt: usize, payload: &Value, parse: &P) -> Attempt<T>
    where
        P: Fn(&ResponseBody) -> Result<T, ResponseError>,
    {
        let response = match self.transport.send(payload.clone()).await {
            Ok(response) => response,
            Err(e) if e.is_rate_limited() => {
                self.record(attempt, "rate_limited", payload, &transport_error_text(&e)).await;
                return Attempt::RateLimited;
            }
            Err(e) => {
                error!(error = %e, "Transport failed");
                self.record(attempt, FailureKind::NetworkError.label(), payload, &transport_error_text(&e)).await;
                return Attempt::Done(GenerationOutcome::failure(FailureKind::NetworkError, e.to_string()));
            }
        };

        debug!(status = response.status, body_len = response.body.len(), "Received provider response");
        let body_text = response.body.to_string();
        let (label, step) = match classify(response, parse) {
            Attempt::RateLimited => ("rate_limited", Attempt::RateLimited),
            Attempt::Done(outcome) => {
                let label = outcome.failure_kind().map_or("success", |kind| kind.label());
                (label, Attempt::Done(outcome))
            }
        };
        self.record(attempt, label, payload, &body_text).await;
        step
    }

    async fn record(&self, attempt: usize, outcome: &str, payload: &Value, response: &str) {
        let Some(interceptor) = &self.interceptor else { return };
        let exchange = Exchange {
            attempt,
            outcome: outcome.to_string(),
            prompt: prompts::prompt_text(payload).unwrap_or_default().to_string(),
            response: response.to_string(),
        };
        if let Err(e) = interceptor.save(&exchange).await {
            warn!(error = %e, "Interceptor failed to save exchange");
        }
    }
}

fn transport_error_text(e: &TransportError) -> String {
    format!("<transport error: {}>", e)
}

/// Free-text replies must carry some non-whitespace text.
fn reply_text(body: &ResponseBody) -> Result<String, ResponseError> {
    let text = candidate_text(body)?;
    if text.trim().is_empty() {
        return Err(ValidationError::new("reply text is empty").into());
    }
    Ok(text)
}

/// Map a response that reached us as `Ok` onto the retry policy. Transports
/// are free to hand back non-2xx statuses instead of erroring.
fn classify<T, P>(response: RawResponse, parse: &P) -> Attempt<T>
where
    P: Fn(&ResponseBody) -> Result<T, ResponseError>,
{
    let RawResponse { status, body } = response;
    if status == TransportError::RATE_LIMIT_STATUS {
        return Attempt::RateLimited;
    }
    if !(200..300).contains(&status) {
        let e = TransportError::Status { status, body: body.to_string() };
        error!(error = %e, "Provider answered with an error status");
        return Attempt::Done(GenerationOutcome::failure(FailureKind::NetworkError, e.to_string()));
    }

    match parse(&body) {
        Ok(value) => {
            info!("Provider response validated");
            Attempt::Done(GenerationOutcome::Success(value))
        }
        Err(e) => {
            warn!(error = %e, "Provider response rejected");
            Attempt::Done(GenerationOutcome::failure(FailureKind::MalformedResponse, e.to_string()))
        }
    }
}
