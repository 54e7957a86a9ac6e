use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::wire::{ComplementSets, Recipe, RECIPE_OPTION_COUNT};

pub const DEFAULT_QUICK_ADD: [&str; 14] = [
    "Espresso",
    "Cold Brew",
    "Matcha",
    "Black Tea",
    "Green Tea",
    "Milk",
    "Oat Milk",
    "Soda Water",
    "Coconut Water",
    "Orange",
    "Lemon",
    "Strawberry",
    "Mango",
    "Butterfly Pea",
];

pub fn default_quick_add() -> Vec<String> {
    DEFAULT_QUICK_ADD.iter().map(|s| s.to_string()).collect()
}

/// Fixed vocabulary of drink characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Characteristic {
    Iced,
    Hot,
    FizzySquash,
    Creamy,
    Fruity,
    Spicy,
    Sweet,
    Sour,
}

impl Characteristic {
    pub const ALL: [Characteristic; 8] = [
        Characteristic::Iced,
        Characteristic::Hot,
        Characteristic::FizzySquash,
        Characteristic::Creamy,
        Characteristic::Fruity,
        Characteristic::Spicy,
        Characteristic::Sweet,
        Characteristic::Sour,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Characteristic::Iced => "Iced",
            Characteristic::Hot => "Hot",
            Characteristic::FizzySquash => "Fizzy / Squash",
            Characteristic::Creamy => "Creamy",
            Characteristic::Fruity => "Fruity",
            Characteristic::Spicy => "Spicy",
            Characteristic::Sweet => "Sweet",
            Characteristic::Sour => "Sour",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Characteristic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "iced" => Ok(Characteristic::Iced),
            "hot" => Ok(Characteristic::Hot),
            "fizzy" | "squash" | "fizzy / squash" | "fizzy/squash" => Ok(Characteristic::FizzySquash),
            "creamy" => Ok(Characteristic::Creamy),
            "fruity" => Ok(Characteristic::Fruity),
            "spicy" => Ok(Characteristic::Spicy),
            "sweet" => Ok(Characteristic::Sweet),
            "sour" => Ok(Characteristic::Sour),
            _ => Err(format!("unknown characteristic: {s}")),
        }
    }
}

/// The inputs the suggestion engine watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionInputs {
    pub inspiration: String,
    pub base_ingredients: Vec<String>,
    pub dietary_constraint: bool,
}

impl SuggestionInputs {
    pub fn is_blank(&self) -> bool {
        self.inspiration.trim().is_empty() && self.base_ingredients.is_empty()
    }
}

/// Accumulated user input and generated data shared by every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintContext {
    pub inspiration: String,
    pub base_ingredients: Vec<String>,
    pub characteristics: BTreeSet<Characteristic>,
    pub dietary_constraint: bool,
    pub quick_add_suggestions: Vec<String>,
    pub complements: ComplementSets,
    pub selected_complements: Vec<String>,
    pub recipe_options: Vec<Recipe>,
    pub active_recipe: Option<Recipe>,
}

impl Default for ConstraintContext {
    fn default() -> Self {
        Self {
            inspiration: String::new(),
            base_ingredients: Vec::new(),
            characteristics: BTreeSet::new(),
            dietary_constraint: true,
            quick_add_suggestions: default_quick_add(),
            complements: ComplementSets::default(),
            selected_complements: Vec::new(),
            recipe_options: Vec::new(),
            active_recipe: None,
        }
    }
}

impl ConstraintContext {
    pub fn suggestion_inputs(&self) -> SuggestionInputs {
        SuggestionInputs {
            inspiration: self.inspiration.clone(),
            base_ingredients: self.base_ingredients.clone(),
            dietary_constraint: self.dietary_constraint,
        }
    }

    /// Returns true when the ingredient list changed.
    pub fn add_ingredient(&mut self, ingredient: &str) -> bool {
        let ingredient = ingredient.trim();
        if ingredient.is_empty() || self.base_ingredients.iter().any(|i| i == ingredient) {
            return false;
        }
        self.base_ingredients.push(ingredient.to_string());
        true
    }

    pub fn remove_ingredient(&mut self, ingredient: &str) -> bool {
        let before = self.base_ingredients.len();
        self.base_ingredients.retain(|i| i != ingredient.trim());
        before != self.base_ingredients.len()
    }

    pub fn set_inspiration(&mut self, text: &str) -> bool {
        if self.inspiration == text {
            return false;
        }
        self.inspiration = text.to_string();
        true
    }

    pub fn set_dietary_constraint(&mut self, on: bool) -> bool {
        let changed = self.dietary_constraint != on;
        self.dietary_constraint = on;
        changed
    }

    /// Returns whether the characteristic is selected afterwards.
    pub fn toggle_characteristic(&mut self, c: Characteristic) -> bool {
        if !self.characteristics.remove(&c) {
            self.characteristics.insert(c);
            return true;
        }
        false
    }

    /// Toggle a complement by name. Names that are not currently offered are
    /// rejected with `None`; otherwise returns whether it is now selected.
    pub fn toggle_complement(&mut self, name: &str) -> Option<bool> {
        if !self.complements.contains(name) {
            return None;
        }
        if let Some(pos) = self.selected_complements.iter().position(|n| n == name) {
            self.selected_complements.remove(pos);
            Some(false)
        } else {
            self.selected_complements.push(name.to_string());
            Some(true)
        }
    }

    pub fn replace_suggestions(&mut self, suggestions: Vec<String>) {
        self.quick_add_suggestions = suggestions;
    }

    pub fn restore_default_suggestions(&mut self) {
        self.quick_add_suggestions = default_quick_add();
    }

    /// Selections no longer offered are pruned.
    pub fn replace_complements(&mut self, complements: ComplementSets) {
        self.selected_complements.retain(|n| complements.contains(n));
        self.complements = complements;
    }

    /// Recipe options are all-or-nothing; anything but a full set clears them.
    pub fn replace_recipes(&mut self, recipes: Vec<Recipe>) -> bool {
        if recipes.len() != RECIPE_OPTION_COUNT {
            self.recipe_options.clear();
            return false;
        }
        self.recipe_options = recipes;
        true
    }

    pub fn set_active_recipe(&mut self, recipe: Recipe) {
        self.active_recipe = Some(recipe);
    }

    pub fn clear_active_recipe(&mut self) {
        self.active_recipe = None;
    }

    pub fn reset(&mut self) {
        *self = ConstraintContext::default();
    }
}
