//! Natural-language edits to the active recipe.
//!
//! A refinement never patches fields in place: the service returns a whole
//! recipe and it replaces the active one wholesale.

use serde_json::Value;

use crate::errors::BrewError;
use crate::prompt;
use crate::wire::{self, GenerationRequest, Recipe};

/// `None` means there is nothing to do: no recipe, or a blank instruction.
pub fn refinement_request(
    active: Option<&Recipe>,
    instruction: &str,
    dietary_constraint: bool,
) -> Option<GenerationRequest> {
    let recipe = active?;
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return None;
    }
    Some(prompt::refinement_prompt(recipe, instruction, dietary_constraint))
}

/// Validate a refinement response. A name and an ingredient list are
/// required; description and instructions fall back to `previous`.
pub fn merge_refined(previous: &Recipe, value: Value) -> Result<Recipe, BrewError> {
    let raw = wire::decode_raw_recipe(value)?;
    if raw.ingredients.is_empty() {
        return Err(BrewError::schema("refined recipe has no ingredients"));
    }
    Ok(Recipe {
        name: raw.name.trim().to_string(),
        description: raw.description.unwrap_or_else(|| previous.description.clone()),
        ingredients: raw.ingredients,
        instructions: raw.instructions.unwrap_or_else(|| previous.instructions.clone()),
    })
}
