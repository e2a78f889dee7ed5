use super::{Exchange, Interceptor, InterceptorError};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

/// Keeps exchanges in memory; handy for tests and debugging sessions.
#[derive(Debug, Default)]
pub struct MemoryInterceptor {
    exchanges: Mutex<Vec<Exchange>>,
}

impl MemoryInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded exchanges in arrival order.
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.exchanges.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Interceptor for MemoryInterceptor {
    async fn save(&self, exchange: &Exchange) -> Result<(), InterceptorError> {
        self.exchanges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(exchange.clone());
        Ok(())
    }
}
