use crate::clients::gemini::{GeminiConfig, GeminiTransport};
use crate::clients::mock::{MockHandle, MockTransport};
use crate::config::KeyFromEnv;
use crate::error::TransportError;
use crate::transport::{RawResponse, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Transport kind selectable at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    Gemini,
    Mock,
}

impl Default for TransportType {
    /// Gemini when an API key is available, mock otherwise
    fn default() -> Self {
        if GeminiTransport::has_key() {
            Self::Gemini
        } else {
            Self::Mock
        }
    }
}

impl std::str::FromStr for TransportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown transport type: '{}'. Supported: gemini, mock", s)),
        }
    }
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Gemini => write!(f, "gemini"),
            TransportType::Mock => write!(f, "mock"),
        }
    }
}

/// Transport chosen at runtime, wrapping any `Transport`
#[derive(Debug, Clone)]
pub struct FlexibleTransport {
    inner: Arc<dyn Transport>,
    kind: TransportType,
}

impl FlexibleTransport {
    pub fn new(inner: Box<dyn Transport>, kind: TransportType) -> Self {
        Self { inner: Arc::from(inner), kind }
    }

    pub fn gemini(config: GeminiConfig) -> Self {
        Self::new(Box::new(GeminiTransport::new(config)), TransportType::Gemini)
    }

    /// Mock transport plus the handle that scripts it
    pub fn mock() -> (Self, Arc<MockHandle>) {
        let (transport, handle) = MockTransport::new();
        (Self::new(Box::new(transport), TransportType::Mock), handle)
    }

    /// Build the transport for `kind`; mock handles are only reachable via [`FlexibleTransport::mock`].
    pub fn from_type(kind: TransportType) -> Self {
        match kind {
            TransportType::Gemini => Self::gemini(GeminiConfig::default()),
            TransportType::Mock => Self::mock().0,
        }
    }

    pub fn kind(&self) -> TransportType {
        self.kind
    }
}

#[async_trait]
impl Transport for FlexibleTransport {
    async fn send(&self, payload: Value) -> Result<RawResponse, TransportError> {
        self.inner.send(payload).await
    }

    fn clone_box(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_type_parsing() {
        assert_eq!("gemini".parse::<TransportType>(), Ok(TransportType::Gemini));
        assert_eq!("MOCK".parse::<TransportType>(), Ok(TransportType::Mock));
        assert!("claude".parse::<TransportType>().is_err());
        assert_eq!(TransportType::Gemini.to_string(), "gemini");
    }
}
