// src/core/types.rs — Core domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provider::{Message, Role};

/// Ordered user/assistant turn history of one run.
///
/// Turns strictly alternate, starting with a user turn. Appends that would
/// break the alternation are rejected by the push methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn followed by the assistant's reply.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        debug_assert!(self.turns.len() % 2 == 0);
        self.turns.push(Message::user(user));
        self.turns.push(Message::assistant(assistant));
    }

    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// True when roles alternate user/assistant starting with user.
    pub fn is_alternating(&self) -> bool {
        self.turns.iter().enumerate().all(|(i, m)| {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            m.role == expected
        })
    }

    /// Render as plain text for prompts that embed the history inline.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|m| format!("[{}]\n{}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.turns
    }
}

/// Named per-dimension completeness signal returned by Reflect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: String,
    pub score: f32,
    pub weight: f32,
}

/// Typed output of the Reflect capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionResult {
    pub score: f32,
    pub analysis: String,
    pub dimensions: Vec<DimensionScore>,
}

impl ReflectionResult {
    pub fn new(score: f32, analysis: impl Into<String>) -> Self {
        Self {
            score,
            analysis: analysis.into(),
            dimensions: Vec::new(),
        }
    }

    /// Build a reflection whose score is the weighted mean of its dimensions.
    /// Returns `None` when there is nothing to average.
    pub fn from_dimensions(
        dimensions: Vec<DimensionScore>,
        analysis: impl Into<String>,
    ) -> Option<Self> {
        let total_weight: f32 = dimensions.iter().map(|d| d.weight).sum();
        if dimensions.is_empty() || total_weight <= 0.0 {
            return None;
        }
        let score = dimensions.iter().map(|d| d.score * d.weight).sum::<f32>() / total_weight;
        Some(Self {
            score,
            analysis: analysis.into(),
            dimensions,
        })
    }

    pub fn score_in_range(&self) -> bool {
        self.score.is_finite() && (0.0..=1.0).contains(&self.score)
    }
}

/// Controller state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Init,
    Planning,
    Executing,
    Reflecting,
    GapAnalysis,
    Revising,
    Synthesizing,
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Init => "INIT",
            Phase::Planning => "PLANNING",
            Phase::Executing => "EXECUTING",
            Phase::Reflecting => "REFLECTING",
            Phase::GapAnalysis => "GAP_ANALYSIS",
            Phase::Revising => "REVISING",
            Phase::Synthesizing => "SYNTHESIZING",
            Phase::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// Why the refinement loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    ThresholdMet,
    IterationCap,
    Deadline,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::ThresholdMet => write!(f, "threshold met"),
            Termination::IterationCap => write!(f, "iteration cap"),
            Termination::Deadline => write!(f, "deadline"),
        }
    }
}

/// Final result of a run. Built once at loop exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub id: String,
    pub query: String,
    pub response: String,
    pub iterations: u8,
    pub final_completeness: f32,
    pub termination: Termination,
    pub conversation_history: Transcript,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Diagnostics attached to a failed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialRun {
    pub transcript: Transcript,
    pub iterations: u8,
    pub last_score: Option<f32>,
    pub phase: Phase,
}

/// Events emitted at controller lifecycle transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    PlanReady,
    IterationStart {
        iteration: u8,
        max_iterations: u8,
    },
    Reflected {
        iteration: u8,
        score: f32,
        threshold: f32,
    },
    PlanRevised {
        iteration: u8,
    },
    DeadlineReached {
        iterations: u8,
    },
    Synthesizing,
    Complete {
        iterations: u8,
        final_score: f32,
        termination: Termination,
    },
}

/// Configuration for the refinement controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub max_iterations: u8,
    pub completeness_threshold: f32,
    /// Overall budget measured from the start of `run`.
    pub deadline: Option<Duration>,
    /// Run gap analysis and revision even when the pass is the last one allowed.
    pub revise_on_final_iteration: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            completeness_threshold: 0.85,
            deadline: None,
            revise_on_final_iteration: false,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations < 1 {
            return Err("max_iterations must be at least 1".into());
        }
        let t = self.completeness_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(format!("completeness_threshold must be in (0, 1], got {t}"));
        }
        Ok(())
    }
}

impl From<&crate::infra::config::AnalysisConfig> for ControllerConfig {
    fn from(cfg: &crate::infra::config::AnalysisConfig) -> Self {
        Self {
            max_iterations: cfg.max_iterations,
            completeness_threshold: cfg.completeness_threshold,
            deadline: cfg.deadline_seconds.map(Duration::from_secs),
            revise_on_final_iteration: cfg.revise_on_final_iteration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(name: &str, score: f32, weight: f32) -> DimensionScore {
        DimensionScore {
            dimension: name.into(),
            score,
            weight,
        }
    }

    // ─── Transcript ─────────────────────────────────────────────

    #[test]
    fn test_transcript_alternates() {
        let mut t = Transcript::new();
        assert!(t.is_empty());
        t.push_exchange("Why did profit decline?", "Plan: ...");
        t.push_exchange("Results: x", "Analysis: y");
        assert_eq!(t.len(), 4);
        assert!(t.is_alternating());
        assert_eq!(t.turns()[0].role, Role::User);
        assert_eq!(t.turns()[3].role, Role::Assistant);
    }

    #[test]
    fn test_transcript_render() {
        let mut t = Transcript::new();
        t.push_exchange("q", "a");
        assert_eq!(t.render(), "[user]\nq\n\n[assistant]\na");
    }

    #[test]
    fn test_transcript_serializes_as_turn_list() {
        let mut t = Transcript::new();
        t.push_exchange("q", "a");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json[0]["role"], "user");
        assert_eq!(json[1]["content"], "a");
    }

    // ─── ReflectionResult ───────────────────────────────────────

    #[test]
    fn test_reflection_weighted_mean() {
        let r = ReflectionResult::from_dimensions(
            vec![dim("descriptive", 1.0, 0.5), dim("explanatory", 0.0, 0.5)],
            "half",
        )
        .unwrap();
        assert!((r.score - 0.5).abs() < 1e-6);
        assert_eq!(r.dimensions.len(), 2);
    }

    #[test]
    fn test_reflection_no_dimensions() {
        assert!(ReflectionResult::from_dimensions(vec![], "nothing").is_none());
        assert!(ReflectionResult::from_dimensions(vec![dim("x", 0.5, 0.0)], "zero").is_none());
    }

    #[test]
    fn test_reflection_range_check() {
        assert!(ReflectionResult::new(0.0, "").score_in_range());
        assert!(ReflectionResult::new(1.0, "").score_in_range());
        assert!(!ReflectionResult::new(1.01, "").score_in_range());
        assert!(!ReflectionResult::new(f32::NAN, "").score_in_range());
    }

    // ─── Phase / Termination ────────────────────────────────────

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::GapAnalysis.to_string(), "GAP_ANALYSIS");
        assert_eq!(Phase::Done.to_string(), "DONE");
    }

    #[test]
    fn test_termination_serde() {
        let json = serde_json::to_string(&Termination::ThresholdMet).unwrap();
        assert_eq!(json, "\"threshold_met\"");
    }

    // ─── ControllerConfig ───────────────────────────────────────

    #[test]
    fn test_controller_config_defaults() {
        let cfg = ControllerConfig::default();
        assert_eq!(cfg.max_iterations, 8);
        assert!((cfg.completeness_threshold - 0.85).abs() < f32::EPSILON);
        assert!(cfg.deadline.is_none());
        assert!(!cfg.revise_on_final_iteration);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_controller_config_validation() {
        let zero_iters = ControllerConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(zero_iters.validate().is_err());

        let zero_threshold = ControllerConfig {
            completeness_threshold: 0.0,
            ..Default::default()
        };
        assert!(zero_threshold.validate().is_err());

        let full = ControllerConfig {
            completeness_threshold: 1.0,
            ..Default::default()
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn test_controller_config_from_analysis_config() {
        let analysis = crate::infra::config::AnalysisConfig {
            max_iterations: 3,
            completeness_threshold: 0.9,
            deadline_seconds: Some(120),
            revise_on_final_iteration: true,
            sample_rows: 5,
        };
        let cfg = ControllerConfig::from(&analysis);
        assert_eq!(cfg.max_iterations, 3);
        assert_eq!(cfg.deadline, Some(Duration::from_secs(120)));
        assert!(cfg.revise_on_final_iteration);
    }
}
