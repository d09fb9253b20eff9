// src/core/controller.rs — Iterative refinement controller

use std::future::Future;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::capabilities::Capabilities;
use super::types::*;
use crate::infra::errors::{ResearchError, RunError};

/// Drives the plan-execute-reflect-revise loop for one query at a time.
///
/// The controller holds no per-run state, so a single instance can serve many
/// concurrent `run` calls; each call owns its transcript and iteration counter.
pub struct Controller<C> {
    capabilities: C,
    config: ControllerConfig,
    cancellation: Option<CancellationToken>,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

/// Mutable state of a single run.
struct RunState {
    transcript: Transcript,
    iterations: u8,
    score: f32,
    last_score: Option<f32>,
    phase: Phase,
    deadline: Option<Instant>,
}

impl RunState {
    fn new(config: &ControllerConfig) -> Self {
        Self {
            transcript: Transcript::new(),
            iterations: 0,
            score: 0.0,
            last_score: None,
            phase: Phase::Init,
            deadline: config.deadline.map(|d| Instant::now() + d),
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "Controller phase transition");
        self.phase = phase;
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn partial(&self) -> PartialRun {
        PartialRun {
            transcript: self.transcript.clone(),
            iterations: self.iterations,
            last_score: self.last_score,
            phase: self.phase,
        }
    }
}

impl<C> Controller<C> {
    pub fn new(capabilities: C, config: ControllerConfig) -> Self {
        Self {
            capabilities,
            config,
            cancellation: None,
            on_progress: None,
        }
    }

    /// Abort runs when the token is cancelled. Checked at every pass and
    /// capability boundary; in-flight capability calls are dropped.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &C {
        &self.capabilities
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    fn check_cancelled(&self, state: &RunState) -> Result<(), RunError> {
        if self.cancellation.as_ref().is_some_and(|t| t.is_cancelled()) {
            tracing::warn!(phase = %state.phase, "Run cancelled");
            return Err(RunError::Cancelled {
                partial: state.partial(),
            });
        }
        Ok(())
    }

    /// Returns `Ok(true)` when the loop should stop and go straight to
    /// synthesis, or `DeadlineExceeded` when no pass has completed yet.
    fn deadline_stop(&self, state: &RunState) -> Result<bool, RunError> {
        if !state.deadline_passed() {
            return Ok(false);
        }
        if state.iterations == 0 {
            tracing::warn!(phase = %state.phase, "Deadline passed before any iteration completed");
            return Err(RunError::DeadlineExceeded {
                partial: state.partial(),
            });
        }
        tracing::warn!(
            iterations = state.iterations,
            "Deadline passed, synthesizing from current findings"
        );
        self.emit(ProgressEvent::DeadlineReached {
            iterations: state.iterations,
        });
        Ok(true)
    }

    /// Await one capability call, racing it against cancellation.
    async fn guarded<T, F>(
        &self,
        state: &RunState,
        call: F,
    ) -> Result<Result<T, ResearchError>, RunError>
    where
        F: Future<Output = Result<T, ResearchError>>,
    {
        self.check_cancelled(state)?;
        let Some(token) = self.cancellation.as_ref() else {
            return Ok(call.await);
        };
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::warn!(phase = %state.phase, "Run cancelled mid-call");
                Err(RunError::Cancelled { partial: state.partial() })
            }
            res = call => Ok(res),
        }
    }

    /// Run the full refinement loop for `query` against `dataset`.
    pub async fn run<D>(&self, query: &str, dataset: &D) -> Result<RunResult, RunError>
    where
        D: ?Sized + Sync,
        C: Capabilities<D>,
    {
        let query = query.trim();
        if query.is_empty() {
            return Err(RunError::InvalidInput("query must not be empty".into()));
        }
        self.config.validate().map_err(RunError::InvalidInput)?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let max_iterations = self.config.max_iterations;
        let threshold = self.config.completeness_threshold;
        let mut state = RunState::new(&self.config);

        tracing::info!(run_id = %run_id, max_iterations, threshold, "Starting research run");

        // 1. Initial plan
        state.enter(Phase::Planning);
        if state.deadline_passed() {
            return Err(RunError::DeadlineExceeded {
                partial: state.partial(),
            });
        }
        let mut plan = self
            .guarded(&state, self.capabilities.plan(query))
            .await?
            .map_err(|source| RunError::PlanningFailure { source })?;
        state.transcript.push_exchange(query, plan.clone());
        self.emit(ProgressEvent::PlanReady);

        // 2. Refinement loop
        let mut termination = None;
        while state.iterations < max_iterations && state.score < threshold {
            self.check_cancelled(&state)?;
            if self.deadline_stop(&state)? {
                termination = Some(Termination::Deadline);
                break;
            }

            let iteration = state.iterations + 1;
            self.emit(ProgressEvent::IterationStart {
                iteration,
                max_iterations,
            });

            state.enter(Phase::Executing);
            let findings = self
                .guarded(&state, self.capabilities.execute(&plan, dataset))
                .await?
                .map_err(|source| RunError::ExecutionFailure {
                    source,
                    partial: state.partial(),
                })?;

            if self.deadline_stop(&state)? {
                termination = Some(Termination::Deadline);
                break;
            }

            state.enter(Phase::Reflecting);
            let reflection = self
                .guarded(
                    &state,
                    self.capabilities.reflect(query, &state.transcript, &findings),
                )
                .await?
                .map_err(|source| RunError::ReflectionFailure {
                    source,
                    partial: state.partial(),
                })?;
            if !reflection.score_in_range() {
                return Err(RunError::ReflectionFailure {
                    source: ResearchError::InvalidReflection(format!(
                        "score {} is outside [0, 1]",
                        reflection.score
                    )),
                    partial: state.partial(),
                });
            }

            state.score = reflection.score;
            state.last_score = Some(reflection.score);
            state
                .transcript
                .push_exchange(format!("Results: {findings}"), reflection.analysis);

            tracing::info!(
                run_id = %run_id,
                iteration,
                score = state.score,
                threshold,
                "Reflection scored"
            );
            self.emit(ProgressEvent::Reflected {
                iteration,
                score: state.score,
                threshold,
            });

            let final_pass = iteration >= max_iterations;
            if state.score < threshold && (!final_pass || self.config.revise_on_final_iteration) {
                // Execute and reflect already happened, so a deadline here still
                // counts this pass.
                if state.deadline_passed() {
                    state.iterations = iteration;
                    self.deadline_stop(&state)?;
                    termination = Some(Termination::Deadline);
                    break;
                }

                state.enter(Phase::GapAnalysis);
                let gaps = self
                    .guarded(
                        &state,
                        self.capabilities.identify_gaps(query, &state.transcript),
                    )
                    .await?
                    .map_err(|source| RunError::GapAnalysisFailure {
                        source,
                        partial: state.partial(),
                    })?;

                // A revised plan would never execute past the deadline.
                if state.deadline_passed() {
                    state.iterations = iteration;
                    self.deadline_stop(&state)?;
                    termination = Some(Termination::Deadline);
                    break;
                }

                state.enter(Phase::Revising);
                plan = self
                    .guarded(&state, self.capabilities.revise(&plan, &gaps))
                    .await?
                    .map_err(|source| RunError::RevisionFailure {
                        source,
                        partial: state.partial(),
                    })?;
                self.emit(ProgressEvent::PlanRevised { iteration });
            }

            state.iterations = iteration;
        }

        let termination = termination.unwrap_or(if state.score >= threshold {
            Termination::ThresholdMet
        } else {
            Termination::IterationCap
        });

        // 3. Synthesis. Not deadline-guarded: a run that made progress gets one
        // attempt at an answer.
        state.enter(Phase::Synthesizing);
        self.emit(ProgressEvent::Synthesizing);
        let response = self
            .guarded(
                &state,
                self.capabilities.synthesize(query, &state.transcript),
            )
            .await?
            .map_err(|source| RunError::SynthesisFailure {
                source,
                partial: state.partial(),
            })?;
        state.enter(Phase::Done);

        tracing::info!(
            run_id = %run_id,
            iterations = state.iterations,
            final_score = state.score,
            termination = %termination,
            "Research run complete"
        );
        self.emit(ProgressEvent::Complete {
            iterations: state.iterations,
            final_score: state.score,
            termination,
        });

        Ok(RunResult {
            id: run_id,
            query: query.to_string(),
            response,
            iterations: state.iterations,
            final_completeness: state.score,
            termination,
            conversation_history: state.transcript,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
