use async_trait::async_trait;
use std::fmt::Debug;

pub type InterceptorError = Box<dyn std::error::Error + Send + Sync>;

/// One provider round trip, captured after the attempt was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// 1-based attempt number within a single generation call.
    pub attempt: usize,
    /// `success`, `rate_limited`, or a [`FailureKind`](crate::FailureKind) label.
    pub outcome: String,
    pub prompt: String,
    pub response: String,
}

/// Sink for raw provider exchanges.
#[async_trait]
pub trait Interceptor: Send + Sync + Debug {
    async fn save(&self, exchange: &Exchange) -> Result<(), InterceptorError>;
}

pub mod file;
pub mod memory;
pub use file::FileInterceptor;
pub use memory::MemoryInterceptor;
