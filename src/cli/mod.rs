// src/cli/mod.rs — CLI definition (clap derive)

pub mod progress;
pub mod run;

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::infra::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "deep-research",
    about = "Answer analytical questions about a CSV dataset with an adaptive plan/reflect loop",
    version
)]
pub struct Cli {
    /// CSV file to analyze
    pub data: PathBuf,

    /// Question to investigate (repeat to run several questions concurrently)
    #[arg(short = 'q', long = "query", required = true)]
    pub queries: Vec<String>,

    /// Max refinement iterations
    #[arg(short = 'n', long)]
    pub iterations: Option<u8>,

    /// Completeness threshold to stop at (0.0-1.0]
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Overall deadline per query, in seconds
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Model id to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Revise the plan even on the last allowed iteration
    #[arg(long)]
    pub revise_final: bool,

    /// Print full results (including transcripts) as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write JSON results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress progress output (only emit final result)
    #[arg(long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags win over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(n) = self.iterations {
            config.analysis.max_iterations = n;
        }
        if let Some(t) = self.threshold {
            config.analysis.completeness_threshold = t;
        }
        if let Some(secs) = self.deadline {
            config.analysis.deadline_seconds = Some(secs);
        }
        if let Some(ref m) = self.model {
            config.model.model = m.clone();
        }
        if self.revise_final {
            config.analysis.revise_on_final_iteration = true;
        }
    }
}
