// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use async_trait::async_trait;
use pf_core::{CollaboratorError, StageAdapter, StageInput, StageOutput};
use tracing::Instrument;

/// Wrapper that adds tracing to any StageAdapter
#[derive(Clone)]
pub struct TracedAdapter<A> {
    inner: A,
}

impl<A> TracedAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: StageAdapter> StageAdapter for TracedAdapter<A> {
    async fn run(&self, input: &StageInput) -> Result<StageOutput, CollaboratorError> {
        let span = tracing::info_span!(
            "collaborator.run",
            pipeline = %input.pipeline_id,
            stage = %input.stage,
        );

        async {
            tracing::info!(prior_stages = input.prior_outputs.len(), "starting");

            let start = std::time::Instant::now();
            let result = self.inner.run(input).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(output) => tracing::info!(
                    fields = output.fields.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "collaborator returned"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "collaborator failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
