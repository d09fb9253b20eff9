// src/cli/run.rs — Default command: analyze a dataset with one or more queries

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::Cli;
use crate::agent::LlmCapabilities;
use crate::core::capabilities::Capabilities;
use crate::core::controller::Controller;
use crate::core::types::{ControllerConfig, PartialRun, RunResult};
use crate::data::Dataset;
use crate::infra::config::Config;
use crate::infra::errors::RunError;
use crate::provider::ModelProvider;
use crate::util::preview;

/// A run that ended in error, with whatever it got through.
#[derive(Debug, Clone, Serialize)]
pub struct FailedRun {
    pub query: String,
    pub error: String,
    pub partial: Option<PartialRun>,
}

/// JSON document written by `--json` and `--output`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub results: Vec<RunResult>,
    pub failures: Vec<FailedRun>,
}

impl RunReport {
    /// Pair each outcome with its query, splitting successes from failures.
    pub fn from_outcomes(queries: &[String], outcomes: Vec<Result<RunResult, RunError>>) -> Self {
        let mut report = Self::default();
        for (query, outcome) in queries.iter().zip(outcomes) {
            match outcome {
                Ok(result) => report.results.push(result),
                Err(err) => report.failures.push(FailedRun {
                    query: query.clone(),
                    error: err.to_string(),
                    partial: err.partial().cloned(),
                }),
            }
        }
        report
    }
}

/// Run every query against the dataset concurrently, one controller per query
/// so progress lines can be labelled. Results come back in query order.
pub async fn run_queries<C>(
    capabilities: Arc<C>,
    config: &ControllerConfig,
    dataset: &Dataset,
    queries: &[String],
    cancel: &CancellationToken,
    quiet: bool,
) -> Vec<Result<RunResult, RunError>>
where
    C: Capabilities<Dataset> + 'static,
{
    let runs = queries.iter().enumerate().map(|(i, query)| {
        let mut controller = Controller::new(capabilities.clone(), config.clone())
            .with_cancellation(cancel.clone());
        if !quiet {
            controller = controller.with_progress(super::progress::terminal_progress(format!(
                "q{}",
                i + 1
            )));
        }
        async move { controller.run(query, dataset).await }
    });
    join_all(runs).await
}

/// Human-readable rendering of a finished run.
pub fn render_text(result: &RunResult) -> String {
    format!(
        "Iterations: {}\nCompleteness: {:.2}\nStopped: {}\n\nFinal Analysis:\n{}",
        result.iterations, result.final_completeness, result.termination, result.response
    )
}

/// Describe a failed run on stderr, including how far it got.
fn report_failure(failure: &FailedRun) {
    eprintln!("error: {}: {}", preview(&failure.query, 60), failure.error);
    if let Some(ref partial) = failure.partial {
        let score = partial
            .last_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "n/a".into());
        eprintln!(
            "  stopped in {} after {} iteration(s), last completeness {}, {} transcript turn(s)",
            partial.phase,
            partial.iterations,
            score,
            partial.transcript.len()
        );
    }
}

/// Execute the CLI's analysis: load data, run queries, print results.
pub async fn run_task(
    cli: &Cli,
    config: &Config,
    provider: Arc<dyn ModelProvider>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let dataset = Dataset::load_csv(&cli.data)?;
    let controller_config = ControllerConfig::from(&config.analysis);
    controller_config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid analysis settings: {e}"))?;

    let capabilities = Arc::new(LlmCapabilities::from_config(provider, config));

    if !cli.quiet {
        eprintln!(
            "[data] {} | {} rows | model: {}",
            dataset.name,
            dataset.row_count(),
            capabilities.model()
        );
    }

    let outcomes = run_queries(
        capabilities,
        &controller_config,
        &dataset,
        &cli.queries,
        &cancel,
        cli.quiet,
    )
    .await;

    let report = RunReport::from_outcomes(&cli.queries, outcomes);
    for failure in &report.failures {
        report_failure(failure);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let multi = cli.queries.len() > 1;
        for result in &report.results {
            if multi {
                println!("=== {} ===", result.query);
            }
            println!("{}", render_text(result));
            if multi {
                println!();
            }
        }
    }

    if let Some(ref path) = cli.output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        tracing::info!(
            path = %path.display(),
            runs = report.results.len(),
            failures = report.failures.len(),
            "Results written"
        );
    }

    let failures = report.failures.len();
    if failures > 0 {
        anyhow::bail!("{} of {} run(s) failed", failures, cli.queries.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Phase, Termination, Transcript};
    use crate::infra::errors::ResearchError;
    use chrono::Utc;

    fn finished(query: &str) -> RunResult {
        RunResult {
            id: "r1".into(),
            query: query.into(),
            response: "Because discounts.".into(),
            iterations: 3,
            final_completeness: 0.95,
            termination: Termination::ThresholdMet,
            conversation_history: Transcript::new(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_report_keeps_failed_transcripts() {
        let mut transcript = Transcript::new();
        transcript.push_exchange("Which region?", "Plan: compare regions");
        let failed = RunError::ExecutionFailure {
            source: ResearchError::Provider {
                provider: "openai".into(),
                message: "HTTP 500".into(),
                retriable: true,
            },
            partial: PartialRun {
                transcript,
                iterations: 0,
                last_score: None,
                phase: Phase::Executing,
            },
        };
        let queries = vec!["Why?".to_string(), "Which region?".to_string()];

        let report = RunReport::from_outcomes(&queries, vec![Ok(finished("Why?")), Err(failed)]);

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.query, "Which region?");
        assert!(failure.error.contains("HTTP 500"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failures"][0]["partial"]["phase"], "EXECUTING");
        assert_eq!(
            json["failures"][0]["partial"]["transcript"][1]["content"],
            "Plan: compare regions"
        );
        assert_eq!(json["results"][0]["query"], "Why?");
    }

    #[test]
    fn test_report_failure_without_partial() {
        let queries = vec!["".to_string()];
        let report = RunReport::from_outcomes(
            &queries,
            vec![Err(RunError::InvalidInput("query must not be empty".into()))],
        );
        assert!(report.failures[0].partial.is_none());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["failures"][0]["partial"].is_null());
    }

    #[test]
    fn test_render_text() {
        let result = finished("Why?");
        assert_eq!(
            render_text(&result),
            "Iterations: 3\nCompleteness: 0.95\nStopped: threshold met\n\nFinal Analysis:\nBecause discounts."
        );
    }
}
