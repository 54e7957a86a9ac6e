use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::client::GenerationClient;
use crate::context::{Characteristic, ConstraintContext};
use crate::errors::BrewError;
use crate::export::{self, RegionRenderer};
use crate::prompt;
use crate::refine;
use crate::suggest::{SuggestionEngine, SuggestionUpdate};
use crate::wire::{ComplementSets, GenerationRequest, Recipe, RECIPE_OPTION_COUNT};

pub mod stage;
#[cfg(test)]
mod tests;

pub use stage::Stage;

/// What an outstanding ticket will produce.
#[derive(Debug, Clone)]
pub enum StepKind {
    Complements,
    Recipes,
    Refinement { previous: Recipe },
}

impl StepKind {
    fn failure_message(&self) -> &'static str {
        match self {
            StepKind::Complements => "Could not generate suggestions. Please try again.",
            StepKind::Recipes => "Could not generate recipes. Please try again.",
            StepKind::Refinement { .. } => "Could not refine the recipe. Try rephrasing.",
        }
    }
}

#[derive(Debug)]
pub enum StepOutput {
    Complements(ComplementSets),
    Recipes(Vec<Recipe>),
    Refined(Recipe),
}

/// A generation call issued by the wizard. Its outcome is only applied while
/// `id` is the active request, the wizard is still on `from` and the context
/// is still at `revision`.
#[derive(Debug, Clone)]
pub struct PendingStep {
    pub id: u64,
    pub from: Stage,
    pub revision: u64,
    pub kind: StepKind,
    pub request: GenerationRequest,
}

#[derive(Debug)]
pub enum Advance {
    Moved(Stage),
    Pending(PendingStep),
}

/// Read-only projection handed to the renderer.
pub struct View<'a> {
    pub stage: Stage,
    pub context: &'a ConstraintContext,
    pub recipe_choice: Option<usize>,
    pub refinement_input: &'a str,
    pub suggestions_pending: bool,
    pub step_pending: bool,
}

/// One wizard session: the current stage, the context it gates on, and the
/// background suggestion engine.
pub struct Wizard {
    stage: Stage,
    context: ConstraintContext,
    client: Arc<GenerationClient>,
    suggestions: SuggestionEngine,
    recipe_choice: Option<usize>,
    refinement_input: String,
    next_request_id: u64,
    active_request: Option<u64>,
    /// Bumped by every edit to the context made through the wizard.
    revision: u64,
}

impl Wizard {
    pub fn new(client: Arc<GenerationClient>, debounce: Duration) -> Self {
        let suggestions = SuggestionEngine::new(Arc::clone(&client), debounce);
        Self {
            stage: Stage::Intake,
            context: ConstraintContext::default(),
            client,
            suggestions,
            recipe_choice: None,
            refinement_input: String::new(),
            next_request_id: 1,
            active_request: None,
            revision: 0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn context(&self) -> &ConstraintContext {
        &self.context
    }

    pub fn client(&self) -> Arc<GenerationClient> {
        Arc::clone(&self.client)
    }

    pub fn recipe_choice(&self) -> Option<usize> {
        self.recipe_choice
    }

    pub fn refinement_input(&self) -> &str {
        &self.refinement_input
    }

    pub fn is_busy(&self) -> bool {
        self.active_request.is_some()
    }

    pub fn view(&self) -> View<'_> {
        View {
            stage: self.stage,
            context: &self.context,
            recipe_choice: self.recipe_choice,
            refinement_input: &self.refinement_input,
            suggestions_pending: self.suggestions.is_pending(),
            step_pending: self.is_busy(),
        }
    }

    // ---- context edits ----------------------------------------------------

    fn touched(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }

    fn watched_changed(&mut self) {
        self.touched();
        self.suggestions.schedule(self.context.suggestion_inputs());
    }

    pub fn set_inspiration(&mut self, text: &str) {
        if self.context.set_inspiration(text) {
            self.watched_changed();
        }
    }

    pub fn add_ingredient(&mut self, ingredient: &str) -> bool {
        let changed = self.context.add_ingredient(ingredient);
        if changed {
            self.watched_changed();
        }
        changed
    }

    pub fn remove_ingredient(&mut self, ingredient: &str) -> bool {
        let changed = self.context.remove_ingredient(ingredient);
        if changed {
            self.watched_changed();
        }
        changed
    }

    /// Add the quick-add suggestion at `index` as a base ingredient.
    pub fn add_quick_suggestion(&mut self, index: usize) -> Option<String> {
        let name = self.context.quick_add_suggestions.get(index)?.clone();
        self.add_ingredient(&name).then_some(name)
    }

    pub fn set_dietary_constraint(&mut self, on: bool) {
        if self.context.set_dietary_constraint(on) {
            self.watched_changed();
        }
    }

    pub fn toggle_characteristic(&mut self, c: Characteristic) -> bool {
        self.touched();
        self.context.toggle_characteristic(c)
    }

    pub fn toggle_complement(&mut self, name: &str) -> Option<bool> {
        let selected = self.context.toggle_complement(name)?;
        self.touched();
        Some(selected)
    }

    pub fn select_recipe(&mut self, index: usize) -> Result<&Recipe, BrewError> {
        if self.stage != Stage::Selection {
            return Err(BrewError::Gating { stage: self.stage, reason: "recipes are chosen on the menu" });
        }
        let recipe = self.context.recipe_options.get(index).ok_or(BrewError::Gating {
            stage: self.stage,
            reason: "no recipe option with that number",
        })?;
        self.recipe_choice = Some(index);
        Ok(recipe)
    }

    pub fn set_refinement_input(&mut self, text: &str) {
        self.refinement_input = text.to_string();
    }

    // ---- background suggestions -----------------------------------------

    pub fn suggestions_pending(&self) -> bool {
        self.suggestions.is_pending()
    }

    /// Waits for the next suggestion update. Cancel safe.
    pub async fn recv_suggestion(&mut self) -> Option<SuggestionUpdate> {
        self.suggestions.recv().await
    }

    pub fn apply_suggestion(&mut self, update: SuggestionUpdate) -> bool {
        self.suggestions.apply(update, &mut self.context)
    }

    /// Apply everything already queued; returns how many updates landed.
    pub fn drain_suggestions(&mut self) -> usize {
        let mut applied = 0;
        while let Some(update) = self.suggestions.try_recv() {
            if self.apply_suggestion(update) {
                applied += 1;
            }
        }
        applied
    }

    // ---- transitions ------------------------------------------------------

    fn gate(&self, reason: &'static str) -> BrewError {
        BrewError::Gating { stage: self.stage, reason }
    }

    fn issue(&mut self, kind: StepKind, request: GenerationRequest) -> PendingStep {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.saturating_add(1);
        self.active_request = Some(id);
        PendingStep { id, from: self.stage, revision: self.revision, kind, request }
    }

    fn move_to(&mut self, stage: Stage) -> Stage {
        tracing::info!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
        stage
    }

    /// Check the forward precondition and either transition right away or
    /// hand back the generation call the transition depends on.
    pub fn begin_advance(&mut self) -> Result<Advance, BrewError> {
        if self.is_busy() {
            return Err(self.gate("a generation call is already in flight"));
        }
        match self.stage {
            Stage::Intake => {
                if self.context.base_ingredients.is_empty() {
                    return Err(self.gate("add at least one base ingredient"));
                }
                Ok(Advance::Moved(self.move_to(Stage::Profile)))
            }
            Stage::Profile => {
                if self.context.characteristics.is_empty() {
                    return Err(self.gate("pick at least one characteristic"));
                }
                let req = prompt::complement_prompt(&self.context);
                Ok(Advance::Pending(self.issue(StepKind::Complements, req)))
            }
            Stage::Pairing => {
                if self.context.selected_complements.is_empty() {
                    return Err(self.gate("select at least one complement"));
                }
                let req = prompt::recipe_prompt(&self.context);
                Ok(Advance::Pending(self.issue(StepKind::Recipes, req)))
            }
            Stage::Selection => {
                let recipe = self
                    .recipe_choice
                    .and_then(|i| self.context.recipe_options.get(i))
                    .cloned()
                    .ok_or_else(|| self.gate("choose one of the recipes first"))?;
                self.context.set_active_recipe(recipe);
                Ok(Advance::Moved(self.move_to(Stage::Refinement)))
            }
            Stage::Refinement => Err(self.gate("already at the last stage")),
        }
    }

    /// Apply the outcome of a ticket. `Ok(None)` means the ticket was
    /// superseded (navigation, reset or a context edit) and the outcome was
    /// dropped.
    pub fn finish_step(
        &mut self,
        step: PendingStep,
        outcome: Result<StepOutput, BrewError>,
    ) -> Result<Option<Stage>, BrewError> {
        if self.active_request != Some(step.id) || self.stage != step.from {
            tracing::debug!(id = step.id, from = %step.from, now = %self.stage, "discarding superseded step outcome");
            return Ok(None);
        }
        self.active_request = None;
        if self.revision != step.revision {
            tracing::debug!(id = step.id, issued = step.revision, now = self.revision, "context edited while step was pending");
            return Ok(None);
        }

        let output = outcome.map_err(|e| {
            tracing::warn!(id = step.id, error = %e, "step generation failed");
            BrewError::generation(step.kind.failure_message(), e)
        })?;

        match (step.kind, output) {
            (StepKind::Complements, StepOutput::Complements(sets)) => {
                self.context.replace_complements(sets);
                self.move_to(Stage::Pairing);
            }
            (StepKind::Recipes, StepOutput::Recipes(recipes)) => {
                if recipes.len() != RECIPE_OPTION_COUNT {
                    return Err(BrewError::generation(
                        StepKind::Recipes.failure_message(),
                        BrewError::schema(format!("expected {RECIPE_OPTION_COUNT} recipes, got {}", recipes.len())),
                    ));
                }
                self.context.replace_recipes(recipes);
                self.recipe_choice = None;
                self.move_to(Stage::Selection);
            }
            (StepKind::Refinement { .. }, StepOutput::Refined(recipe)) => {
                tracing::info!(name = %recipe.name, "recipe refined");
                self.context.set_active_recipe(recipe);
                self.refinement_input.clear();
            }
            (kind, _) => {
                return Err(BrewError::generation(
                    kind.failure_message(),
                    BrewError::schema("step output does not match its request"),
                ))
            }
        }
        Ok(Some(self.stage))
    }

    pub async fn advance(&mut self) -> Result<Stage, BrewError> {
        match self.begin_advance()? {
            Advance::Moved(stage) => Ok(stage),
            Advance::Pending(step) => {
                let outcome = self.client.run_step(&step).await;
                self.finish_step(step, outcome)?;
                Ok(self.stage)
            }
        }
    }

    /// Step back one stage. Collected data stays; only the active recipe is
    /// dropped when leaving refinement.
    pub fn retreat(&mut self) -> Result<Stage, BrewError> {
        let prev = self.stage.prev().ok_or_else(|| self.gate("already at the first stage"))?;
        if self.stage == Stage::Refinement {
            self.context.clear_active_recipe();
            self.refinement_input.clear();
        }
        self.active_request = None;
        Ok(self.move_to(prev))
    }

    pub fn reset(&mut self) {
        self.suggestions.cancel();
        self.context.reset();
        self.recipe_choice = None;
        self.refinement_input.clear();
        self.active_request = None;
        self.move_to(Stage::Intake);
    }

    // ---- refinement -------------------------------------------------------

    /// `Ok(None)` when there is nothing to refine or the instruction is blank.
    pub fn begin_refine(&mut self) -> Result<Option<PendingStep>, BrewError> {
        if self.stage != Stage::Refinement {
            return Ok(None);
        }
        if self.is_busy() {
            return Err(self.gate("a generation call is already in flight"));
        }
        let Some(req) = refine::refinement_request(
            self.context.active_recipe.as_ref(),
            &self.refinement_input,
            self.context.dietary_constraint,
        ) else {
            return Ok(None);
        };
        let Some(previous) = self.context.active_recipe.clone() else {
            return Ok(None);
        };
        Ok(Some(self.issue(StepKind::Refinement { previous }, req)))
    }

    /// Returns whether the active recipe was replaced.
    pub async fn refine(&mut self) -> Result<bool, BrewError> {
        let Some(step) = self.begin_refine()? else {
            return Ok(false);
        };
        let outcome = self.client.run_step(&step).await;
        Ok(self.finish_step(step, outcome)?.is_some())
    }

    // ---- export -----------------------------------------------------------

    pub fn export(&self, renderer: &dyn RegionRenderer, dir: &Path) -> Result<PathBuf, BrewError> {
        let recipe = self
            .context
            .active_recipe
            .as_ref()
            .ok_or_else(|| BrewError::Export("no recipe is being displayed".into()))?;
        export::export_recipe(renderer, recipe, dir)
    }
}
