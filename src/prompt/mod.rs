use crate::context::{ConstraintContext, SuggestionInputs};
use crate::wire::{GenerationRequest, Instruction, Recipe, RequestKind, RECIPE_OPTION_COUNT};

pub const SUGGESTION_COUNT: usize = 15;
pub const CONVENTIONAL_COUNT: usize = 12;
pub const UNCONVENTIONAL_COUNT: usize = 4;

/// Placeholder for empty optional inputs.
pub const NONE_PLACEHOLDER: &str = "None";

/// Injected into every prompt while the dietary constraint is on.
pub const DIETARY_CLAUSE: &str =
    "Constraint: Strictly HALAL ingredients only. No alcohol, no pork products.";

fn persona() -> &'static str {
    "You are an expert mixologist and beverage developer. \
Respond with a single JSON value only: no markdown, no code fences, no commentary."
}

fn dietary_section(on: bool) -> String {
    if on {
        format!("{DIETARY_CLAUSE}\n")
    } else {
        String::new()
    }
}

fn or_none(text: &str) -> &str {
    let t = text.trim();
    if t.is_empty() {
        NONE_PLACEHOLDER
    } else {
        t
    }
}

fn join_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        NONE_PLACEHOLDER.to_string()
    } else {
        items.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", ")
    }
}

fn characteristics_line(ctx: &ConstraintContext) -> String {
    let labels: Vec<&str> = ctx.characteristics.iter().map(|c| c.label()).collect();
    join_or_none(&labels)
}

pub fn suggestion_prompt(inputs: &SuggestionInputs) -> GenerationRequest {
    let user = format!(
"Task: Suggest {count} ingredients that pair scientifically or traditionally well with the inspiration and current ingredients to build a complete beverage.
Inspiration: {inspiration}
Current Ingredients: {ingredients}
{dietary}Constraint: Keep it to single ingredients (fruit, liquid, herb, syrup, spice), not full recipes.
Output: a JSON array of strings, e.g. [\"Mint\", \"Lime\", \"Soda Water\"].",
        count = SUGGESTION_COUNT,
        inspiration = or_none(&inputs.inspiration),
        ingredients = join_or_none(&inputs.base_ingredients),
        dietary = dietary_section(inputs.dietary_constraint),
    );
    GenerationRequest::new(
        RequestKind::Suggestions,
        Instruction { system: persona().to_string(), user },
    )
}

pub fn complement_prompt(ctx: &ConstraintContext) -> GenerationRequest {
    let user = format!(
"Task:
1. Suggest {conventional} conventional complementary ingredients that pair well with the base (herbs, syrups, fruits, mixers).
2. Suggest {unconventional} unconventional ingredients that are surprising but used successfully in modern gastronomy (savory elements, spices, unexpected vegetables).

Base Ingredients: {ingredients}
Desired Characteristics: {characteristics}
Inspiration: {inspiration}
{dietary}
Output: a JSON object with two keys, \"conventional\" and \"unconventional\". Both are arrays of objects with keys:
- \"name\": string
- \"matchScore\": integer 0-100
- \"rationale\": one short sentence on the flavor dimension it adds or why it pairs with the base

Example: {{\"conventional\": [{{\"name\": \"Mint\", \"matchScore\": 95, \"rationale\": \"Adds a refreshing herbal lift.\"}}], \"unconventional\": [{{\"name\": \"Black Pepper\", \"matchScore\": 85, \"rationale\": \"A gentle heat that contrasts sweetness.\"}}]}}",
        conventional = CONVENTIONAL_COUNT,
        unconventional = UNCONVENTIONAL_COUNT,
        ingredients = join_or_none(&ctx.base_ingredients),
        characteristics = characteristics_line(ctx),
        inspiration = or_none(&ctx.inspiration),
        dietary = dietary_section(ctx.dietary_constraint),
    );
    GenerationRequest::new(
        RequestKind::Complements,
        Instruction { system: persona().to_string(), user },
    )
}

pub fn recipe_prompt(ctx: &ConstraintContext) -> GenerationRequest {
    let substitution = if ctx.dietary_constraint {
        "- If the inspiration implies alcohol, substitute a compliant non-alcoholic analogue instead of refusing.\n"
    } else {
        ""
    };
    let user = format!(
"Task: Create {count} distinct, detailed beverage recipes.
Inputs:
- Base Ingredients: {ingredients}
- Complementary Ingredients selected: {complements}
- Characteristics: {characteristics}
- Inspiration: {inspiration}

Constraints:
- Use ONLY metric units (ml, grams).
- Be creative but realistic.
{dietary}{substitution}
Output: a JSON array of exactly {count} objects with this structure:
{{
  \"name\": \"Creative Drink Name\",
  \"description\": \"Short appetizing description\",
  \"ingredients\": [\"50ml Espresso\", \"20ml Vanilla Syrup\"],
  \"instructions\": [\"Step 1...\", \"Step 2...\"]
}}",
        count = RECIPE_OPTION_COUNT,
        ingredients = join_or_none(&ctx.base_ingredients),
        complements = join_or_none(&ctx.selected_complements),
        characteristics = characteristics_line(ctx),
        inspiration = or_none(&ctx.inspiration),
        dietary = dietary_section(ctx.dietary_constraint),
        substitution = substitution,
    );
    GenerationRequest::new(
        RequestKind::Recipes,
        Instruction { system: persona().to_string(), user },
    )
}

pub fn refinement_prompt(recipe: &Recipe, instruction: &str, dietary_constraint: bool) -> GenerationRequest {
    let recipe_json = serde_json::to_string_pretty(recipe)
        .unwrap_or_else(|_| "<recipe-json-unavailable>".to_string());
    let user = format!(
"Task: Modify this specific recipe based on the user's request.
Original Recipe:
{recipe_json}

User Request: \"{request}\"

Constraints:
- Keep the same JSON structure (name, description, ingredients, instructions).
- Maintain metric units.
{dietary}
Output: a single JSON object (the updated recipe).",
        recipe_json = recipe_json,
        request = or_none(instruction),
        dietary = dietary_section(dietary_constraint),
    );
    GenerationRequest::new(
        RequestKind::Refinement,
        Instruction { system: persona().to_string(), user },
    )
}
