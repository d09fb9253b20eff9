// src/core/capabilities.rs — Operations the controller sequences but does not implement

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{ReflectionResult, Transcript};
use crate::infra::errors::ResearchError;

/// The injected research operations.
///
/// `D` is the opaque dataset handle; the controller only passes it through to
/// `execute`. Implementations own their own retry and timeout policy.
#[async_trait]
pub trait Capabilities<D: ?Sized + Sync>: Send + Sync {
    /// Decompose the query into an initial plan.
    async fn plan(&self, query: &str) -> Result<String, ResearchError>;

    /// Carry out the plan against the dataset and report findings.
    async fn execute(&self, plan: &str, dataset: &D) -> Result<String, ResearchError>;

    /// Judge how completely the findings answer the query.
    async fn reflect(
        &self,
        query: &str,
        transcript: &Transcript,
        findings: &str,
    ) -> Result<ReflectionResult, ResearchError>;

    async fn identify_gaps(
        &self,
        query: &str,
        transcript: &Transcript,
    ) -> Result<String, ResearchError>;

    async fn revise(&self, plan: &str, gaps: &str) -> Result<String, ResearchError>;

    /// Produce the final answer from the whole investigation.
    async fn synthesize(&self, query: &str, transcript: &Transcript)
        -> Result<String, ResearchError>;
}

#[async_trait]
impl<D, T> Capabilities<D> for Arc<T>
where
    D: ?Sized + Sync,
    T: Capabilities<D> + ?Sized,
{
    async fn plan(&self, query: &str) -> Result<String, ResearchError> {
        (**self).plan(query).await
    }

    async fn execute(&self, plan: &str, dataset: &D) -> Result<String, ResearchError> {
        (**self).execute(plan, dataset).await
    }

    async fn reflect(
        &self,
        query: &str,
        transcript: &Transcript,
        findings: &str,
    ) -> Result<ReflectionResult, ResearchError> {
        (**self).reflect(query, transcript, findings).await
    }

    async fn identify_gaps(
        &self,
        query: &str,
        transcript: &Transcript,
    ) -> Result<String, ResearchError> {
        (**self).identify_gaps(query, transcript).await
    }

    async fn revise(&self, plan: &str, gaps: &str) -> Result<String, ResearchError> {
        (**self).revise(plan, gaps).await
    }

    async fn synthesize(
        &self,
        query: &str,
        transcript: &Transcript,
    ) -> Result<String, ResearchError> {
        (**self).synthesize(query, transcript).await
    }
}
