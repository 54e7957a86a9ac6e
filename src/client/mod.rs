use serde_json::Value;
use std::time::Instant;

use crate::errors::BrewError;
use crate::log::Transcript;
use crate::provider::DynProvider;
use crate::refine;
use crate::wire::{self, ComplementSets, GenerationRequest, Recipe};
use crate::wizard::{PendingStep, StepKind, StepOutput};

/// Shape-checked access to the generation service. Holds no wizard state.
pub struct GenerationClient {
    provider: DynProvider,
    transcript: Option<Transcript>,
}

impl GenerationClient {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider, transcript: None }
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// One outbound call, no retries.
    pub async fn generate(&self, req: &GenerationRequest) -> Result<Value, BrewError> {
        let start = Instant::now();
        tracing::debug!(kind = %req.kind, tx = %req.transaction.id, user = %req.instruction.user, "generation request");

        let result = self.provider.generate(req).await;
        let elapsed_ms = start.elapsed().as_millis();

        match &result {
            Ok(value) => {
                tracing::info!(kind = %req.kind, elapsed_ms, "generation complete");
                if let Some(t) = &self.transcript {
                    t.record(req, value);
                }
            }
            Err(e) => tracing::info!(kind = %req.kind, elapsed_ms, error = %e, "generation failed"),
        }
        result
    }

    pub async fn suggestions(&self, req: &GenerationRequest) -> Result<Vec<String>, BrewError> {
        wire::decode_suggestions(self.generate(req).await?)
    }

    pub async fn complements(&self, req: &GenerationRequest) -> Result<ComplementSets, BrewError> {
        wire::decode_complements(self.generate(req).await?)
    }

    pub async fn recipes(&self, req: &GenerationRequest) -> Result<Vec<Recipe>, BrewError> {
        wire::decode_recipes(self.generate(req).await?)
    }

    pub async fn refined_recipe(
        &self,
        req: &GenerationRequest,
        previous: &Recipe,
    ) -> Result<Recipe, BrewError> {
        refine::merge_refined(previous, self.generate(req).await?)
    }

    /// Execute the call behind a stage-advance or refinement ticket.
    pub async fn run_step(&self, step: &PendingStep) -> Result<StepOutput, BrewError> {
        match &step.kind {
            StepKind::Complements => self.complements(&step.request).await.map(StepOutput::Complements),
            StepKind::Recipes => self.recipes(&step.request).await.map(StepOutput::Recipes),
            StepKind::Refinement { previous } => self
                .refined_recipe(&step.request, previous)
                .await
                .map(StepOutput::Refined),
        }
    }
}
