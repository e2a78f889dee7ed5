//! Fires concurrent quiz generations at a transport and reports how they ended.
//!
//! With the mock transport a fraction of calls is scripted as rate limited so
//! the backoff path shows up in the timings.

use anyhow::{bail, Context, Result};
use clap::Parser;
use quiz_engine::clients::{FlexibleTransport, MockHandle, MockResponse, TransportType};
use quiz_engine::core::{GenerationClient, GenerationOutcome, GenerationRequest, RetryConfig};
use quiz_engine::error::FailureKind;
use quiz_engine::interceptors::FileInterceptor;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Quiz generation benchmark", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    GEMINI_API_KEY      API key for the Gemini transport
    QUIZ_MAX_RETRIES    Attempts allowed while rate limited (default 5)
    QUIZ_BASE_DELAY_MS  Backoff base delay in milliseconds (default 1000)
    QUIZ_MAX_DELAY_MS   Cap for a single backoff sleep, 0 disables (default 30000)
    RUST_LOG            Log filter, e.g. quiz_engine=debug")]
struct Args {
    /// Transport: gemini, mock [default: gemini when GEMINI_API_KEY is set]
    #[arg(short, long)]
    transport: Option<TransportType>,

    /// Quiz topic
    #[arg(long, default_value = "Photosynthesis")]
    topic: String,

    /// Questions per quiz (1-10)
    #[arg(short, long, default_value_t = 5)]
    count: usize,

    /// Number of generations to run
    #[arg(short = 'n', long, default_value_t = 10)]
    runs: usize,

    /// Maximum generations in flight
    #[arg(short, long, default_value_t = 4)]
    parallel: usize,

    /// Every Nth mock call is rate limited once (mock transport only, 0 disables)
    #[arg(long, default_value_t = 3)]
    rate_limit_every: usize,

    /// Abort outstanding generations after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Save every provider exchange under this directory
    #[arg(long)]
    capture_dir: Option<PathBuf>,
}

#[derive(Debug)]
struct RunResult {
    elapsed: Duration,
    outcome: Result<usize, FailureKind>,
}

const MOCK_OPTIONS: [&str; 4] = ["A", "B", "C", "D"];

fn mock_questions(topic: &str, count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            let answer = MOCK_OPTIONS[i % MOCK_OPTIONS.len()];
            json!({
                "question": format!("{} question {}", topic, i + 1),
                "options": MOCK_OPTIONS,
                "correctAnswer": answer,
            })
        })
        .collect();
    Value::Array(items)
}

fn script_mock(handle: &MockHandle, args: &Args) {
    for run in 0..args.runs {
        if args.rate_limit_every > 0 && run % args.rate_limit_every == 0 {
            handle.add_response(MockResponse::RateLimited);
        }
        handle.add_response(MockResponse::envelope_json(&mock_questions(&args.topic, args.count)));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    if args.runs == 0 || args.parallel == 0 {
        bail!("--runs and --parallel must be at least 1");
    }
    let request = GenerationRequest::new(args.topic.clone(), args.count)
        .with_context(|| format!("invalid request for topic '{}'", args.topic))?;

    let kind = args.transport.unwrap_or_default();
    let transport = match kind {
        TransportType::Mock => {
            let (transport, handle) = FlexibleTransport::mock();
            script_mock(&handle, &args);
            transport
        }
        TransportType::Gemini => FlexibleTransport::from_type(kind),
    };

    let mut config = RetryConfig::from_env();
    if kind == TransportType::Mock {
        // Keep mock runs quick while still exercising the backoff path.
        config = config.with_base_delay(Duration::from_millis(5));
    }

    let mut client = GenerationClient::new(transport, config);
    if let Some(dir) = &args.capture_dir {
        client = client.with_interceptor(Arc::new(FileInterceptor::new(dir.clone())));
    }
    let client = Arc::new(client);

    let cancel = CancellationToken::new();
    if let Some(secs) = args.deadline_secs {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            cancel.cancel();
        });
    }

    println!("Running {} generations ({} in flight) against {} transport", args.runs, args.parallel, kind);
    let started = Instant::now();
    let mut results = Vec::with_capacity(args.runs);
    let mut set = JoinSet::new();
    let mut launched = 0;

    while launched < args.runs || !set.is_empty() {
        while launched < args.runs && set.len() < args.parallel {
            let client = client.clone();
            let request = request.clone();
            let cancel = cancel.clone();
            set.spawn(async move {
                let t0 = Instant::now();
                let outcome = match client.generate_with_cancel(&request, &cancel).await {
                    GenerationOutcome::Success(sequence) => Ok(sequence.len()),
                    GenerationOutcome::Failure(kind, _) => Err(kind),
                };
                RunResult { elapsed: t0.elapsed(), outcome }
            });
            launched += 1;
        }

        if let Some(joined) = set.join_next().await {
            let result = joined.context("generation task panicked")?;
            info!(elapsed_ms = result.elapsed.as_millis() as u64, outcome = ?result.outcome, "Generation finished");
            results.push(result);
        }
    }

    report(&results, started.elapsed());
    Ok(())
}

fn report(results: &[RunResult], wall: Duration) {
    let mut by_class: BTreeMap<String, Vec<Duration>> = BTreeMap::new();
    for r in results {
        let class = match r.outcome {
            Ok(_) => "success".to_string(),
            Err(kind) => kind.to_string(),
        };
        by_class.entry(class).or_default().push(r.elapsed);
    }

    println!();
    println!("{:<22} {:>6} {:>12} {:>12}", "outcome", "count", "avg ms", "max ms");
    for (class, mut times) in by_class {
        times.sort();
        let total: Duration = times.iter().sum();
        let avg = total.as_millis() / times.len() as u128;
        let max = times.last().map(|d| d.as_millis()).unwrap_or(0);
        println!("{:<22} {:>6} {:>12} {:>12}", class, times.len(), avg, max);
    }
    println!();
    println!("Wall time: {:.2}s", wall.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_questions_validate() {
        let sequence = quiz_engine::schema::validate_count(&mock_questions("Benchmarks", 6), 6).unwrap();
        assert_eq!(sequence[4].correct_answer, "A");
        assert_eq!(sequence[5].correct_answer, "B");
    }
}
