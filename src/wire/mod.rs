use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use crate::errors::BrewError;

/// ========================================
/// Request/Response wire protocol
/// ========================================

pub const SCHEMA_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Suggestions,
    Complements,
    Recipes,
    Refinement,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Suggestions => "suggestions",
            RequestKind::Complements => "complements",
            RequestKind::Recipes => "recipes",
            RequestKind::Refinement => "refinement",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tx {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
}

impl Instruction {
    pub fn contains(&self, needle: &str) -> bool {
        self.system.contains(needle) || self.user.contains(needle)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub schema_version: String,
    pub kind: RequestKind,
    pub transaction: Tx,
    pub instruction: Instruction,
    /// Ask the service for a structured-data (JSON) response.
    pub expect_json: bool,
}

impl GenerationRequest {
    pub fn new(kind: RequestKind, instruction: Instruction) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.into(),
            kind,
            transaction: Tx { id: Uuid::new_v4(), timestamp: Utc::now() },
            instruction,
            expect_json: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complement {
    pub name: String,
    pub match_score: u8,
    pub rationale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplementSets {
    pub conventional: Vec<Complement>,
    pub unconventional: Vec<Complement>,
}

impl ComplementSets {
    pub fn is_empty(&self) -> bool {
        self.conventional.is_empty() && self.unconventional.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.conventional.iter().chain(&self.unconventional).any(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

pub const RECIPE_OPTION_COUNT: usize = 3;

// Raw shapes as the model returns them. Validation happens after serde so
// that we can report which constraint failed.

#[derive(Deserialize)]
struct RawComplement {
    name: String,
    #[serde(rename = "matchScore", alias = "match", alias = "match_score")]
    match_score: f64,
    #[serde(alias = "reason")]
    rationale: String,
}

#[derive(Deserialize)]
struct RawComplementSets {
    #[serde(alias = "scientific")]
    conventional: Vec<RawComplement>,
    #[serde(alias = "unorthodox")]
    unconventional: Vec<RawComplement>,
}

#[derive(Deserialize)]
pub(crate) struct RawRecipe {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Option<Vec<String>>,
}

/// `{"recipes": [...]}` → `[...]` when an array is expected. JSON-object
/// response modes cannot return a bare array.
fn unwrap_single_array(v: Value) -> Value {
    if let Value::Object(map) = &v {
        if map.len() == 1 {
            if let Some(inner @ Value::Array(_)) = map.values().next() {
                return inner.clone();
            }
        }
    }
    v
}

pub fn decode_suggestions(v: Value) -> Result<Vec<String>, BrewError> {
    let v = unwrap_single_array(v);
    let items: Vec<String> = serde_json::from_value(v)
        .map_err(|e| BrewError::schema(format!("suggestions must be an array of strings: {e}")))?;
    let mut seen = HashSet::new();
    let out: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect();
    if out.is_empty() {
        return Err(BrewError::schema("suggestions list is empty"));
    }
    Ok(out)
}

fn validate_complements(list: Vec<RawComplement>, which: &str) -> Result<Vec<Complement>, BrewError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(list.len());
    for raw in list {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(BrewError::schema(format!("{which}: complement with empty name")));
        }
        if !(0.0..=100.0).contains(&raw.match_score) {
            return Err(BrewError::schema(format!(
                "{which}: match score {} for {name} outside 0..=100",
                raw.match_score
            )));
        }
        if !seen.insert(name.clone()) {
            continue;
        }
        out.push(Complement {
            name,
            match_score: raw.match_score.round() as u8,
            rationale: raw.rationale.trim().to_string(),
        });
    }
    Ok(out)
}

pub fn decode_complements(v: Value) -> Result<ComplementSets, BrewError> {
    let raw: RawComplementSets = serde_json::from_value(v)
        .map_err(|e| BrewError::schema(format!("complements: {e}")))?;
    let sets = ComplementSets {
        conventional: validate_complements(raw.conventional, "conventional")?,
        unconventional: validate_complements(raw.unconventional, "unconventional")?,
    };
    if sets.is_empty() {
        return Err(BrewError::schema("complements: both lists are empty"));
    }
    Ok(sets)
}

pub(crate) fn decode_raw_recipe(v: Value) -> Result<RawRecipe, BrewError> {
    let raw: RawRecipe =
        serde_json::from_value(v).map_err(|e| BrewError::schema(format!("recipe: {e}")))?;
    if raw.name.trim().is_empty() {
        return Err(BrewError::schema("recipe without a name"));
    }
    Ok(raw)
}

pub fn decode_recipes(v: Value) -> Result<Vec<Recipe>, BrewError> {
    let v = unwrap_single_array(v);
    let items = match v {
        Value::Array(items) => items,
        other => {
            return Err(BrewError::schema(format!(
                "recipes must be an array, got {}",
                json_type(&other)
            )))
        }
    };
    if items.len() != RECIPE_OPTION_COUNT {
        return Err(BrewError::schema(format!(
            "expected exactly {RECIPE_OPTION_COUNT} recipes, got {}",
            items.len()
        )));
    }
    items
        .into_iter()
        .map(|item| {
            let raw = decode_raw_recipe(item)?;
            let (Some(description), Some(instructions)) = (raw.description, raw.instructions) else {
                return Err(BrewError::schema(format!(
                    "recipe {} is missing description or instructions",
                    raw.name
                )));
            };
            Ok(Recipe { name: raw.name, description, ingredients: raw.ingredients, instructions })
        })
        .collect()
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
