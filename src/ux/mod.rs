use colored::Colorize;

use crate::context::Characteristic;
use crate::errors::BrewError;
use crate::wire::{Complement, Recipe};
use crate::wizard::{Stage, View};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub const HELP: &str = "\
Commands:
  inspire <text>        set the inspiration (blank clears it)
  add <ingredient>      add a base ingredient
  rm <ingredient>       remove a base ingredient
  quick <n>             add quick-add suggestion n
  dietary on|off        halal / non-alcoholic constraint
  toggle <name>         toggle a characteristic
  pick <complement>     toggle a complement
  choose <n>            choose recipe option n
  refine <instruction>  ask for a change to the recipe
  next | back | reset   move through the stages
  export                save the recipe card
  show | help | quit";

/// Full screen for the current stage. Pure: everything comes from `view`.
pub fn render(view: &View<'_>) -> String {
    let mut out = header(view.stage);
    let body = match view.stage {
        Stage::Intake => intake(view),
        Stage::Profile => profile(view),
        Stage::Pairing => pairing(view),
        Stage::Selection => selection(view),
        Stage::Refinement => refinement(view),
    };
    out.push_str(&body);
    if view.step_pending {
        out.push_str(&format!("\n{}\n", "(waiting for the generator…)".dimmed()));
    }
    out
}

/// One-line banner for a failure shown under the stage view.
pub fn banner(err: &BrewError) -> String {
    match err {
        BrewError::Gating { reason, .. } => format!("{} {}", "!".yellow().bold(), reason),
        BrewError::Generation { message, .. } => format!("{} {}", "✗".red().bold(), message),
        other => format!("{} {}", "✗".red().bold(), other),
    }
}

fn header(stage: Stage) -> String {
    let steps: Vec<String> = Stage::ALL
        .iter()
        .map(|s| {
            let n = format!("{:02}", s.number());
            if *s == stage {
                n.bold().to_string()
            } else {
                n.dimmed().to_string()
            }
        })
        .collect();
    format!(
        "\n{}\n  {}   {}\n{}\n",
        RULE.bold(),
        stage.to_string().bold(),
        steps.join(" · "),
        RULE.bold()
    )
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".dimmed().to_string()
    } else {
        items.join(", ")
    }
}

fn intake(view: &View<'_>) -> String {
    let ctx = view.context;
    let mut out = String::new();
    let inspiration = if ctx.inspiration.is_empty() { "-".dimmed().to_string() } else { ctx.inspiration.clone() };
    out.push_str(&format!("  Inspiration: {inspiration}\n"));
    out.push_str(&format!("  Base ingredients: {}\n", list_or_dash(&ctx.base_ingredients)));
    let dietary = if ctx.dietary_constraint { "on".green() } else { "off".yellow() };
    out.push_str(&format!("  Halal / non-alcoholic: {dietary}\n"));

    let pending = if view.suggestions_pending { " (refreshing…)".dimmed().to_string() } else { String::new() };
    out.push_str(&format!("\n  Quick add{pending}\n"));
    for (i, s) in ctx.quick_add_suggestions.iter().enumerate() {
        let taken = ctx.base_ingredients.contains(s);
        let label = if taken { s.dimmed().to_string() } else { s.clone() };
        out.push_str(&format!("   {:>2}. {label}\n", i + 1));
    }
    out
}

fn profile(view: &View<'_>) -> String {
    let mut out = String::from("  Characteristics\n");
    for c in Characteristic::ALL {
        let on = view.context.characteristics.contains(&c);
        let mark = if on { "[x]".green().bold().to_string() } else { "[ ]".to_string() };
        out.push_str(&format!("   {mark} {c}\n"));
    }
    out
}

fn complement_line(c: &Complement, selected: bool) -> String {
    let mark = if selected { "[x]".green().bold().to_string() } else { "[ ]".to_string() };
    format!("   {mark} {} {}  {}\n", c.name.bold(), format!("{}%", c.match_score).cyan(), c.rationale.dimmed())
}

fn pairing(view: &View<'_>) -> String {
    let ctx = view.context;
    let selected = |c: &Complement| ctx.selected_complements.contains(&c.name);
    let mut out = String::from("  Conventional\n");
    for c in &ctx.complements.conventional {
        out.push_str(&complement_line(c, selected(c)));
    }
    out.push_str("\n  Unconventional\n");
    for c in &ctx.complements.unconventional {
        out.push_str(&complement_line(c, selected(c)));
    }
    out
}

fn selection(view: &View<'_>) -> String {
    let mut out = String::new();
    for (i, r) in view.context.recipe_options.iter().enumerate() {
        let chosen = view.recipe_choice == Some(i);
        let marker = if chosen { "▶".green().bold().to_string() } else { " ".to_string() };
        out.push_str(&format!(" {marker} {}. {}\n", i + 1, r.name.bold()));
        out.push_str(&format!("      {}\n", r.description.dimmed()));
    }
    out
}

fn recipe_card(r: &Recipe) -> String {
    let mut out = format!("  {}\n", r.name.to_uppercase().bold());
    if !r.description.is_empty() {
        out.push_str(&format!("  {}\n", r.description.italic()));
    }
    out.push_str(&format!("\n  {}\n", "Ingredients".bold()));
    for item in &r.ingredients {
        out.push_str(&format!("   • {item}\n"));
    }
    out.push_str(&format!("\n  {}\n", "Method".bold()));
    for (i, step) in r.instructions.iter().enumerate() {
        out.push_str(&format!("   {}. {step}\n", i + 1));
    }
    out
}

fn refinement(view: &View<'_>) -> String {
    let Some(recipe) = view.context.active_recipe.as_ref() else {
        return format!("  {}\n", "No recipe selected.".dimmed());
    };
    let mut out = recipe_card(recipe);
    if !view.refinement_input.is_empty() {
        out.push_str(&format!("\n  Refining: {}\n", view.refinement_input.italic()));
    }
    out
}
