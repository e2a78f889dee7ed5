#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use quiz_engine::clients::{MockHandle, MockResponse, MockTransport};
use quiz_engine::core::{GenerationClient, RetryConfig};
use serde_json::{json, Value};

pub const BASE_DELAY: Duration = Duration::from_millis(1000);

/// Retry settings used throughout the tests: D = 1s, five attempts, no cap.
pub fn test_retry_config() -> RetryConfig {
    RetryConfig::default()
        .with_max_retries(5)
        .with_base_delay(BASE_DELAY)
        .with_max_delay(None)
}

/// A client over a scripted transport, plus the handle that scripts it.
pub fn mock_client() -> (GenerationClient<MockTransport>, Arc<MockHandle>) {
    let (transport, handle) = MockTransport::new();
    (GenerationClient::new(transport, test_retry_config()), handle)
}

/// `n` well-formed questions on `topic`; question `i` has answer `Option i%4`.
pub fn questions(topic: &str, n: usize) -> Value {
    let items: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "question": format!("{} question {}", topic, i + 1),
                "options": ["Option 0", "Option 1", "Option 2", "Option 3"],
                "correctAnswer": format!("Option {}", i % 4),
            })
        })
        .collect();
    Value::Array(items)
}

pub fn quiz_envelope(topic: &str, n: usize) -> MockResponse {
    MockResponse::envelope_json(&questions(topic, n))
}
