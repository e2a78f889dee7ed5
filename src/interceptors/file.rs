use super::{Exchange, Interceptor, InterceptorError};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Writes each exchange to
/// `<capture_dir>/exchange_<timestamp>_<seq>_<outcome>.md`.
///
/// The sequence number keeps names unique when several exchanges land in the
/// same millisecond; files are opened with `create_new` so nothing is ever
/// overwritten.
#[derive(Debug)]
pub struct FileInterceptor {
    capture_dir: PathBuf,
    seq: AtomicU64,
}

impl FileInterceptor {
    pub fn new(capture_dir: PathBuf) -> Self {
        Self { capture_dir, seq: AtomicU64::new(0) }
    }

    fn file_name(&self, exchange: &Exchange) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!(
            "exchange_{}_{:04}_{}.md",
            Utc::now().format("%Y%m%d_%H%M%S_%3f"),
            seq,
            exchange.outcome
        )
    }
}

fn render(exchange: &Exchange) -> String {
    format!(
        "Attempt: {}\nOutcome: {}\n\n## Prompt\n\n{}\n\n## Response\n\n{}\n",
        exchange.attempt, exchange.outcome, exchange.prompt, exchange.response
    )
}

#[async_trait]
impl Interceptor for FileInterceptor {
    async fn save(&self, exchange: &Exchange) -> Result<(), InterceptorError> {
        fs::create_dir_all(&self.capture_dir).await?;
        let path = self.capture_dir.join(self.file_name(exchange));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(render(exchange).as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), outcome = %exchange.outcome, "Captured provider exchange");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(attempt: usize, outcome: &str) -> Exchange {
        Exchange {
            attempt,
            outcome: outcome.to_string(),
            prompt: "make a quiz".to_string(),
            response: "[]".to_string(),
        }
    }

    fn capture_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quiz_engine_{}_{}", name, std::process::id()))
    }

    async fn captured(dir: &PathBuf) -> Vec<(String, String)> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push((name, fs::read_to_string(entry.path()).await.unwrap()));
        }
        files.sort();
        files
    }

    #[tokio::test]
    async fn writes_outcome_prompt_and_response() {
        let dir = capture_dir("capture_single");
        let interceptor = FileInterceptor::new(dir.clone());
        interceptor.save(&exchange(2, "malformed_response")).await.unwrap();

        let files = captured(&dir).await;
        assert_eq!(files.len(), 1);
        let (name, content) = &files[0];
        assert!(name.ends_with("_0000_malformed_response.md"));
        assert!(content.starts_with("Attempt: 2\nOutcome: malformed_response\n"));
        assert!(content.contains("## Prompt\n\nmake a quiz"));
        assert!(content.contains("## Response\n\n[]"));

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn back_to_back_saves_never_overwrite() {
        let dir = capture_dir("capture_burst");
        let interceptor = FileInterceptor::new(dir.clone());
        for attempt in 1..=5 {
            interceptor.save(&exchange(attempt, "rate_limited")).await.unwrap();
        }

        let files = captured(&dir).await;
        assert_eq!(files.len(), 5);
        let mut attempts: Vec<_> = files
            .iter()
            .map(|(_, content)| content.lines().next().unwrap().to_string())
            .collect();
        attempts.sort();
        assert_eq!(attempts, ["Attempt: 1", "Attempt: 2", "Attempt: 3", "Attempt: 4", "Attempt: 5"]);

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
