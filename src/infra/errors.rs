// src/infra/errors.rs — Error types for deep-research

use thiserror::Error;

use crate::core::types::PartialRun;

/// Errors raised by capabilities, providers and the surrounding infrastructure.
#[derive(Error, Debug)]
pub enum ResearchError {
    // Provider errors (retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    // User errors
    #[error("No provider configured. Set {env_var} or point [model].api_key_env at a key.")]
    NoProvider { env_var: String },

    // Capability contract violations
    #[error("Reflection output could not be scored: {0}")]
    InvalidReflection(String),

    // Infra
    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResearchError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ResearchError::Provider {
                retriable: true,
                ..
            } | ResearchError::RateLimited { .. }
        )
    }
}

/// Outcome errors of a single controller run.
///
/// Every failure after planning carries the partial run (transcript, iterations
/// completed, last observed score) so the caller can see how far it got.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Planning failed: {source}")]
    PlanningFailure {
        #[source]
        source: ResearchError,
    },

    #[error("Execution failed on iteration {}: {source}", .partial.iterations + 1)]
    ExecutionFailure {
        #[source]
        source: ResearchError,
        partial: PartialRun,
    },

    #[error("Reflection failed on iteration {}: {source}", .partial.iterations + 1)]
    ReflectionFailure {
        #[source]
        source: ResearchError,
        partial: PartialRun,
    },

    #[error("Gap analysis failed on iteration {}: {source}", .partial.iterations + 1)]
    GapAnalysisFailure {
        #[source]
        source: ResearchError,
        partial: PartialRun,
    },

    #[error("Plan revision failed on iteration {}: {source}", .partial.iterations + 1)]
    RevisionFailure {
        #[source]
        source: ResearchError,
        partial: PartialRun,
    },

    #[error("Synthesis failed after {} iteration(s): {source}", .partial.iterations)]
    SynthesisFailure {
        #[source]
        source: ResearchError,
        partial: PartialRun,
    },

    #[error("Deadline exceeded during {} before any iteration completed", .partial.phase)]
    DeadlineExceeded { partial: PartialRun },

    #[error("Run cancelled during {}", .partial.phase)]
    Cancelled { partial: PartialRun },
}

impl RunError {
    /// Diagnostics for failures that happened after planning started.
    pub fn partial(&self) -> Option<&PartialRun> {
        match self {
            RunError::InvalidInput(_) | RunError::PlanningFailure { .. } => None,
            RunError::ExecutionFailure { partial, .. }
            | RunError::ReflectionFailure { partial, .. }
            | RunError::GapAnalysisFailure { partial, .. }
            | RunError::RevisionFailure { partial, .. }
            | RunError::SynthesisFailure { partial, .. }
            | RunError::DeadlineExceeded { partial }
            | RunError::Cancelled { partial } => Some(partial),
        }
    }

    /// The capability error behind this failure, if any.
    pub fn capability_error(&self) -> Option<&ResearchError> {
        match self {
            RunError::PlanningFailure { source }
            | RunError::ExecutionFailure { source, .. }
            | RunError::ReflectionFailure { source, .. }
            | RunError::GapAnalysisFailure { source, .. }
            | RunError::RevisionFailure { source, .. }
            | RunError::SynthesisFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}
