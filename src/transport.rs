use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// Response body as received: decoded JSON when the bytes parse, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Json(v) => v.to_string().len(),
            Self::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(v) => write!(f, "{}", v),
            Self::Text(t) => write!(f, "{}", t),
        }
    }
}

/// A 2xx response from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl RawResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body: ResponseBody::Json(body) }
    }
}

/// Network boundary used by the generation client.
///
/// Implementations return `Ok` only for 2xx responses; every other status is
/// surfaced as [`TransportError::Status`] so callers can tell rate limiting
/// apart from a dead connection. Per-request timeouts belong here too.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, payload: Value) -> Result<RawResponse, TransportError>;

    /// Clone this transport into a boxed trait object
    fn clone_box(&self) -> Box<dyn Transport>;
}

impl Clone for Box<dyn Transport> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl Transport for Box<dyn Transport> {
    async fn send(&self, payload: Value) -> Result<RawResponse, TransportError> {
        self.as_ref().send(payload).await
    }

    fn clone_box(&self) -> Box<dyn Transport> {
        self.as_ref().clone_box()
    }
}
