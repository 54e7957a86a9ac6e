//! Debounced background refresh of the quick-add suggestions.
//!
//! Each watched change bumps `generation`, aborts the previous timer/fetch
//! task and starts a new one. Updates carry the generation they were started
//! for; `apply` drops anything that is not current, so the last watched
//! change always wins.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::client::GenerationClient;
use crate::context::{ConstraintContext, SuggestionInputs};
use crate::errors::BrewError;
use crate::prompt;

#[derive(Debug)]
pub enum SuggestionOutcome {
    /// Inputs were blank when the timer fired.
    Defaults,
    Fetched(Result<Vec<String>, BrewError>),
}

#[derive(Debug)]
pub struct SuggestionUpdate {
    pub generation: u64,
    pub outcome: SuggestionOutcome,
}

pub struct SuggestionEngine {
    client: Arc<GenerationClient>,
    window: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<SuggestionUpdate>,
    rx: mpsc::UnboundedReceiver<SuggestionUpdate>,
}

impl SuggestionEngine {
    pub fn new(client: Arc<GenerationClient>, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { client, window, generation: 0, task: None, tx, rx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Timer running or fetch in flight.
    pub fn is_pending(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Restart the debounce window for `inputs`. Must be called from within
    /// a tokio runtime.
    pub fn schedule(&mut self, inputs: SuggestionInputs) {
        self.supersede();
        let generation = self.generation;
        let deadline = Instant::now() + self.window;
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let outcome = if inputs.is_blank() {
                SuggestionOutcome::Defaults
            } else {
                let req = prompt::suggestion_prompt(&inputs);
                SuggestionOutcome::Fetched(client.suggestions(&req).await)
            };
            // Receiver lives as long as the engine; a failed send means it is gone.
            let _ = tx.send(SuggestionUpdate { generation, outcome });
        }));
    }

    /// Drop pending work; anything already queued becomes stale.
    pub fn cancel(&mut self) {
        self.supersede();
    }

    fn supersede(&mut self) {
        self.generation = self.generation.saturating_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub async fn recv(&mut self) -> Option<SuggestionUpdate> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SuggestionUpdate> {
        self.rx.try_recv().ok()
    }

    /// Returns true when `ctx.quick_add_suggestions` was written.
    pub fn apply(&mut self, update: SuggestionUpdate, ctx: &mut ConstraintContext) -> bool {
        if update.generation != self.generation {
            tracing::debug!(
                stale = update.generation,
                current = self.generation,
                "discarding superseded suggestion update"
            );
            return false;
        }
        match update.outcome {
            SuggestionOutcome::Defaults => {
                ctx.restore_default_suggestions();
                true
            }
            SuggestionOutcome::Fetched(Ok(list)) => {
                tracing::debug!(count = list.len(), "quick-add suggestions refreshed");
                ctx.replace_suggestions(list);
                true
            }
            SuggestionOutcome::Fetched(Err(e)) => {
                tracing::warn!(error = %e, "failed to update suggestions");
                false
            }
        }
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
