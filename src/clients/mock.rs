use crate::error::TransportError;
use crate::transport::{RawResponse, ResponseBody, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// 200 with an envelope whose part text is `text`.
    Envelope(String),
    /// 200 with an arbitrary body.
    Body(ResponseBody),
    /// Delivered as `Ok` with the given status, the way a transport that
    /// does not map statuses to errors would report it.
    Raw(u16, ResponseBody),
    RateLimited,
    Status(u16, String),
    NoResponse(String),
}

impl MockResponse {
    /// 200 envelope wrapping `inner` serialized as the candidate text.
    pub fn envelope_json(inner: &Value) -> Self {
        Self::Envelope(inner.to_string())
    }

    fn into_result(self) -> Result<RawResponse, TransportError> {
        match self {
            Self::Envelope(text) => Ok(RawResponse::ok(envelope(&text))),
            Self::Body(body) => Ok(RawResponse { status: 200, body }),
            Self::Raw(status, body) => Ok(RawResponse { status, body }),
            Self::RateLimited => Err(TransportError::Status {
                status: TransportError::RATE_LIMIT_STATUS,
                body: "Resource has been exhausted".to_string(),
            }),
            Self::Status(status, body) => Err(TransportError::Status { status, body }),
            Self::NoResponse(msg) => Err(TransportError::NoResponse(msg)),
        }
    }
}

/// Provider envelope around a candidate text.
pub fn envelope(text: &str) -> Value {
    json!({ "candidates": [ { "content": { "parts": [ { "text": text } ] } } ] })
}

/// Shared control over a [`MockTransport`]: queue replies, inspect calls.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    fallback: Mutex<Option<MockResponse>>,
    payloads: Mutex<Vec<Value>>,
}

impl MockHandle {
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).extend(responses);
    }

    /// Reply used once the queue is drained.
    pub fn set_fallback(&self, response: MockResponse) {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) = Some(response);
    }

    pub fn call_count(&self) -> usize {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn next(&self, payload: Value) -> MockResponse {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner).push(payload);
        let queued = self.responses.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        queued
            .or_else(|| self.fallback.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_else(|| MockResponse::NoResponse("mock transport has no scripted response".to_string()))
    }
}

/// Transport that replays scripted responses
#[derive(Debug, Clone)]
pub struct MockTransport {
    handle: Arc<MockHandle>,
}

impl MockTransport {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (transport, handle) = Self::new();
        handle.add_responses(responses);
        (transport, handle)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, payload: Value) -> Result<RawResponse, TransportError> {
        self.handle.next(payload).into_result()
    }

    fn clone_box(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}
