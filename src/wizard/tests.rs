use super::*;
use crate::context::{default_quick_add, Characteristic};
use crate::export::TextCardRenderer;
use crate::prompt::DIETARY_CLAUSE;
use crate::provider::scripted::ScriptedProvider;
use crate::wire::RequestKind;
use serde_json::{json, Value};

fn test_wizard(provider: Arc<ScriptedProvider>) -> Wizard {
    let client = Arc::new(GenerationClient::new(provider));
    Wizard::new(client, Duration::from_secs(3))
}

fn complements_json(conventional: usize, unconventional: usize) -> Value {
    let item = |prefix: &str, i: usize| {
        json!({
            "name": format!("{prefix} {i}"),
            "matchScore": 90 - i,
            "rationale": format!("{prefix} pairing {i}.")
        })
    };
    json!({
        "conventional": (1..=conventional).map(|i| item("Conventional", i)).collect::<Vec<_>>(),
        "unconventional": (1..=unconventional).map(|i| item("Unconventional", i)).collect::<Vec<_>>(),
    })
}

fn recipe_json(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name}, poured over ice."),
        "ingredients": ["60ml Espresso", "180ml Milk", "20ml Vanilla Syrup", "10ml Honey"],
        "instructions": ["Fill a glass with ice.", "Add milk and syrup.", "Top with espresso."]
    })
}

fn three_recipes() -> Value {
    json!([
        recipe_json("Vanilla Cloud"),
        recipe_json("Honey Cold Brew"),
        recipe_json("Caramel Drift")
    ])
}

/// Walks a fresh wizard forward to `target` using scripted responses.
async fn drive_to(wizard: &mut Wizard, provider: &ScriptedProvider, target: Stage) {
    while wizard.stage() < target {
        match wizard.stage() {
            Stage::Intake => {
                wizard.add_ingredient("Espresso");
                wizard.add_ingredient("Milk");
            }
            Stage::Profile => {
                wizard.toggle_characteristic(Characteristic::Iced);
                provider.push_ok(RequestKind::Complements, complements_json(12, 4));
            }
            Stage::Pairing => {
                wizard.toggle_complement("Conventional 1");
                provider.push_ok(RequestKind::Recipes, three_recipes());
            }
            Stage::Selection => {
                wizard.select_recipe(0).unwrap();
            }
            Stage::Refinement => unreachable!(),
        }
        wizard.advance().await.unwrap();
    }
}

#[tokio::test]
async fn espresso_milk_flow_ends_with_the_refined_recipe() {
    let provider = ScriptedProvider::new();
    provider.push_ok(RequestKind::Complements, complements_json(12, 4));
    provider.push_ok(RequestKind::Recipes, three_recipes());
    let revised = json!({
        "name": "Honey Cold Brew (Less Sweet)",
        "description": "Honey Cold Brew, poured over ice.",
        "ingredients": ["60ml Espresso", "180ml Milk", "10ml Honey"],
        "instructions": ["Fill a glass with ice.", "Add milk.", "Top with espresso."]
    });
    provider.push_ok(RequestKind::Refinement, revised.clone());
    let mut wizard = test_wizard(provider.clone());

    wizard.add_ingredient("Espresso");
    wizard.add_ingredient("Milk");
    assert_eq!(wizard.advance().await.unwrap(), Stage::Profile);

    wizard.toggle_characteristic(Characteristic::Iced);
    wizard.toggle_characteristic(Characteristic::Sweet);
    assert_eq!(wizard.advance().await.unwrap(), Stage::Pairing);
    assert_eq!(wizard.context().complements.conventional.len(), 12);
    assert_eq!(wizard.context().complements.unconventional.len(), 4);

    assert_eq!(wizard.toggle_complement("Conventional 3"), Some(true));
    assert_eq!(wizard.toggle_complement("Unconventional 2"), Some(true));
    assert_eq!(wizard.advance().await.unwrap(), Stage::Selection);
    assert_eq!(wizard.context().recipe_options.len(), 3);
    let menu = wizard.context().recipe_options.clone();

    assert_eq!(wizard.select_recipe(1).unwrap().name, "Honey Cold Brew");
    assert_eq!(wizard.advance().await.unwrap(), Stage::Refinement);
    assert_eq!(wizard.context().active_recipe.as_ref(), Some(&menu[1]));

    wizard.set_refinement_input("make it less sweet");
    assert!(wizard.refine().await.unwrap());

    let expected: Recipe = serde_json::from_value(revised).unwrap();
    let active = wizard.context().active_recipe.clone().unwrap();
    assert_eq!(active, expected);
    assert_eq!(active.ingredients.len(), menu[1].ingredients.len() - 1);
    assert_eq!(wizard.context().recipe_options, menu);
    assert!(wizard.refinement_input().is_empty());
    assert_eq!(wizard.stage(), Stage::Refinement);

    let recipe_req = provider
        .requests()
        .into_iter()
        .find(|r| r.kind == RequestKind::Recipes)
        .unwrap();
    assert!(recipe_req.instruction.user.contains("Conventional 3, Unconventional 2"));
    assert!(recipe_req.instruction.user.contains("Iced, Sweet"));
}

#[tokio::test]
async fn every_request_carries_the_dietary_clause_by_default() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Refinement).await;
    provider.push_ok(RequestKind::Refinement, recipe_json("Lighter"));
    wizard.set_refinement_input("lighter");
    wizard.refine().await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.instruction.contains(DIETARY_CLAUSE)));
}

#[tokio::test]
async fn dietary_clause_is_dropped_when_switched_off() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    wizard.set_dietary_constraint(false);
    drive_to(&mut wizard, &provider, Stage::Selection).await;

    assert!(provider.requests().iter().all(|r| !r.instruction.contains(DIETARY_CLAUSE)));
}

#[tokio::test]
async fn intake_gates_on_base_ingredients() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());

    let err = wizard.advance().await.unwrap_err();
    assert!(err.is_gating(), "{err}");
    assert_eq!(wizard.stage(), Stage::Intake);

    wizard.add_ingredient("Matcha");
    wizard.remove_ingredient("Matcha");
    assert!(wizard.advance().await.unwrap_err().is_gating());

    wizard.add_ingredient("Matcha");
    assert_eq!(wizard.advance().await.unwrap(), Stage::Profile);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn profile_gates_on_characteristics_without_calling_out() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Profile).await;

    let err = wizard.advance().await.unwrap_err();
    assert!(err.is_gating());
    assert_eq!(wizard.stage(), Stage::Profile);
    assert_eq!(provider.calls_of(RequestKind::Complements), 0);
}

#[tokio::test]
async fn pairing_and_selection_have_their_own_gates() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Pairing).await;
    assert_eq!(wizard.toggle_complement("Conventional 1"), Some(true));
    assert_eq!(wizard.toggle_complement("Conventional 1"), Some(false));
    assert_eq!(wizard.toggle_complement("Not Offered"), None);
    assert!(wizard.context().selected_complements.is_empty());
    assert!(wizard.advance().await.unwrap_err().is_gating());

    wizard.toggle_complement("Conventional 1");
    provider.push_ok(RequestKind::Recipes, three_recipes());
    wizard.advance().await.unwrap();
    assert!(wizard.advance().await.unwrap_err().is_gating());
    assert!(wizard.select_recipe(3).unwrap_err().is_gating());
    assert!(wizard.context().active_recipe.is_none());
}

#[tokio::test]
async fn failed_generation_leaves_stage_and_context_untouched() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Profile).await;
    wizard.toggle_characteristic(Characteristic::Hot);
    let before = wizard.context().clone();

    provider.push_err(RequestKind::Complements, BrewError::Transport("connection reset".into()));
    let err = wizard.advance().await.unwrap_err();
    assert!(matches!(
        &err,
        BrewError::Generation { source, .. } if matches!(**source, BrewError::Transport(_))
    ));
    assert_eq!(err.to_string(), "Could not generate suggestions. Please try again.");
    assert_eq!(wizard.stage(), Stage::Profile);
    assert_eq!(wizard.context(), &before);
    assert!(!wizard.is_busy());

    provider.push_ok(RequestKind::Complements, json!({"conventional": "mint"}));
    let err = wizard.advance().await.unwrap_err();
    assert!(matches!(
        &err,
        BrewError::Generation { source, .. } if matches!(**source, BrewError::Schema(_))
    ));
    assert_eq!(wizard.context(), &before);

    provider.push_ok(RequestKind::Complements, complements_json(12, 4));
    assert_eq!(wizard.advance().await.unwrap(), Stage::Pairing);
}

#[tokio::test]
async fn wrong_recipe_count_does_not_reach_selection() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Pairing).await;
    wizard.toggle_complement("Conventional 2");

    provider.push_ok(RequestKind::Recipes, json!([recipe_json("Only"), recipe_json("Two")]));
    assert!(matches!(wizard.advance().await, Err(BrewError::Generation { .. })));
    assert_eq!(wizard.stage(), Stage::Pairing);
    assert!(wizard.context().recipe_options.is_empty());
}

#[tokio::test]
async fn outcome_for_a_ticket_left_behind_is_dropped() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Profile).await;
    wizard.toggle_characteristic(Characteristic::Fruity);
    provider.push_ok(RequestKind::Complements, complements_json(12, 4));

    let Advance::Pending(step) = wizard.begin_advance().unwrap() else {
        panic!("profile advance needs a generation call");
    };
    assert!(wizard.is_busy());
    assert!(wizard.begin_advance().unwrap_err().is_gating());

    assert_eq!(wizard.retreat().unwrap(), Stage::Intake);
    let outcome = wizard.client().run_step(&step).await;
    assert_eq!(wizard.finish_step(step.clone(), outcome).unwrap(), None);
    assert_eq!(wizard.stage(), Stage::Intake);
    assert!(wizard.context().complements.is_empty());

    // Back on the same stage with a newer ticket: the old one is still stale.
    wizard.advance().await.unwrap();
    let Advance::Pending(fresh) = wizard.begin_advance().unwrap() else {
        panic!("profile advance needs a generation call");
    };
    assert!(fresh.id > step.id);
    let late = Ok(StepOutput::Complements(ComplementSets::default()));
    assert_eq!(wizard.finish_step(step, late).unwrap(), None);
    assert!(wizard.is_busy());
}

#[tokio::test]
async fn editing_characteristics_during_a_complement_call_drops_its_outcome() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Profile).await;
    wizard.toggle_characteristic(Characteristic::Iced);
    provider.push_ok(RequestKind::Complements, complements_json(12, 4));

    let Advance::Pending(step) = wizard.begin_advance().unwrap() else {
        panic!("profile advance needs a generation call");
    };
    assert!(!wizard.toggle_characteristic(Characteristic::Iced));
    let outcome = wizard.client().run_step(&step).await;

    assert_eq!(wizard.finish_step(step, outcome).unwrap(), None);
    assert_eq!(wizard.stage(), Stage::Profile);
    assert!(wizard.context().characteristics.is_empty());
    assert!(wizard.context().complements.is_empty());
    assert!(!wizard.is_busy());
    assert!(wizard.advance().await.unwrap_err().is_gating());
}

#[tokio::test]
async fn deselecting_during_a_recipe_call_keeps_the_pairing_gate() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Pairing).await;
    wizard.toggle_complement("Conventional 1");
    provider.push_ok(RequestKind::Recipes, three_recipes());

    let Advance::Pending(step) = wizard.begin_advance().unwrap() else {
        panic!("pairing advance needs a generation call");
    };
    assert_eq!(wizard.toggle_complement("Conventional 1"), Some(false));
    let outcome = wizard.client().run_step(&step).await;

    assert_eq!(wizard.finish_step(step, outcome).unwrap(), None);
    assert_eq!(wizard.stage(), Stage::Pairing);
    assert!(wizard.context().recipe_options.is_empty());
    assert!(wizard.advance().await.unwrap_err().is_gating());
}

#[tokio::test]
async fn ingredient_edit_during_a_pending_step_needs_a_fresh_advance() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Profile).await;
    wizard.toggle_characteristic(Characteristic::Creamy);
    provider.push_ok(RequestKind::Complements, complements_json(12, 4));

    let Advance::Pending(step) = wizard.begin_advance().unwrap() else {
        panic!("profile advance needs a generation call");
    };
    wizard.add_ingredient("Cardamom");
    // Unknown names leave the context alone and do not invalidate anything.
    assert_eq!(wizard.toggle_complement("Nothing Offered"), None);
    let outcome = wizard.client().run_step(&step).await;
    assert_eq!(wizard.finish_step(step, outcome).unwrap(), None);
    assert_eq!(wizard.stage(), Stage::Profile);

    provider.push_ok(RequestKind::Complements, complements_json(12, 4));
    assert_eq!(wizard.advance().await.unwrap(), Stage::Pairing);
    let last = provider.requests().pop().unwrap();
    assert!(last.instruction.user.contains("Espresso, Milk, Cardamom"));
}

#[tokio::test]
async fn retreat_keeps_collected_data() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Refinement).await;
    let menu = wizard.context().recipe_options.clone();

    assert_eq!(wizard.retreat().unwrap(), Stage::Selection);
    assert!(wizard.context().active_recipe.is_none());
    assert_eq!(wizard.context().recipe_options, menu);

    assert_eq!(wizard.retreat().unwrap(), Stage::Pairing);
    assert_eq!(wizard.context().selected_complements, vec!["Conventional 1"]);
    assert_eq!(wizard.retreat().unwrap(), Stage::Profile);
    assert_eq!(wizard.retreat().unwrap(), Stage::Intake);
    assert_eq!(wizard.context().base_ingredients, vec!["Espresso", "Milk"]);
    assert!(wizard.retreat().unwrap_err().is_gating());

    // A fresh complement list that still offers the pick keeps it selected.
    wizard.advance().await.unwrap();
    provider.push_ok(RequestKind::Complements, complements_json(12, 4));
    wizard.advance().await.unwrap();
    assert_eq!(wizard.context().selected_complements, vec!["Conventional 1"]);
}

#[tokio::test]
async fn reset_from_any_stage_restores_the_default_context() {
    for target in Stage::ALL {
        let provider = ScriptedProvider::new();
        let mut wizard = test_wizard(provider.clone());
        wizard.set_inspiration("purple drink");
        drive_to(&mut wizard, &provider, target).await;
        assert_eq!(wizard.stage(), target);

        wizard.reset();
        assert_eq!(wizard.stage(), Stage::Intake);
        assert_eq!(wizard.context(), &ConstraintContext::default());
        assert_eq!(wizard.recipe_choice(), None);
        assert!(!wizard.suggestions_pending());
        assert!(!wizard.is_busy());
    }
}

#[tokio::test]
async fn blank_refinement_makes_no_call() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Refinement).await;
    let before = wizard.context().active_recipe.clone();

    wizard.set_refinement_input("   ");
    assert!(!wizard.refine().await.unwrap());
    assert_eq!(provider.calls_of(RequestKind::Refinement), 0);
    assert_eq!(wizard.context().active_recipe, before);
}

#[tokio::test]
async fn failed_refinement_keeps_recipe_and_input() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    drive_to(&mut wizard, &provider, Stage::Refinement).await;
    let before = wizard.context().active_recipe.clone();

    provider.push_ok(RequestKind::Refinement, json!({"description": "no name"}));
    wizard.set_refinement_input("add cardamom");
    let err = wizard.refine().await.unwrap_err();
    assert_eq!(err.to_string(), "Could not refine the recipe. Try rephrasing.");
    assert_eq!(wizard.context().active_recipe, before);
    assert_eq!(wizard.refinement_input(), "add cardamom");
}

#[tokio::test(start_paused = true)]
async fn watched_edits_refresh_quick_add_suggestions() {
    let provider = ScriptedProvider::new();
    provider.push_ok(RequestKind::Suggestions, json!(["Vanilla", "Cinnamon", "Ice"]));
    let mut wizard = test_wizard(provider.clone());

    wizard.add_ingredient("Espresso");
    assert!(wizard.suggestions_pending());
    let update = wizard.recv_suggestion().await.unwrap();
    assert!(wizard.apply_suggestion(update));
    assert_eq!(wizard.context().quick_add_suggestions, vec!["Vanilla", "Cinnamon", "Ice"]);

    assert_eq!(wizard.add_quick_suggestion(1).as_deref(), Some("Cinnamon"));
    assert_eq!(wizard.add_quick_suggestion(1), None);
    assert_eq!(wizard.context().base_ingredients, vec!["Espresso", "Cinnamon"]);

    // Clearing every watched input falls back to the default list.
    wizard.remove_ingredient("Espresso");
    wizard.remove_ingredient("Cinnamon");
    let update = wizard.recv_suggestion().await.unwrap();
    assert!(wizard.apply_suggestion(update));
    assert_eq!(wizard.context().quick_add_suggestions, default_quick_add());
    assert_eq!(provider.calls_of(RequestKind::Suggestions), 1);
}

#[tokio::test(start_paused = true)]
async fn unwatched_edits_do_not_schedule_a_fetch() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    wizard.toggle_characteristic(Characteristic::Sour);
    wizard.set_dietary_constraint(true);
    wizard.set_inspiration("");
    assert!(!wizard.suggestions_pending());

    wizard.set_dietary_constraint(false);
    assert!(wizard.suggestions_pending());
}

#[tokio::test(start_paused = true)]
async fn reset_discards_a_pending_suggestion_fetch() {
    let provider = ScriptedProvider::new();
    provider.push_ok(RequestKind::Suggestions, json!(["Rum"]));
    let mut wizard = test_wizard(provider.clone());

    wizard.set_inspiration("mojito");
    tokio::time::sleep(Duration::from_secs(5)).await;
    wizard.reset();
    assert_eq!(wizard.drain_suggestions(), 0);
    assert_eq!(wizard.context().quick_add_suggestions, default_quick_add());
}

#[tokio::test]
async fn export_needs_a_displayed_recipe() {
    let provider = ScriptedProvider::new();
    let mut wizard = test_wizard(provider.clone());
    let dir = tempfile::tempdir().unwrap();
    let renderer = TextCardRenderer::default();

    assert!(matches!(wizard.export(&renderer, dir.path()), Err(BrewError::Export(_))));

    drive_to(&mut wizard, &provider, Stage::Refinement).await;
    let before = wizard.context().clone();
    let path = wizard.export(&renderer, dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "vanilla-cloud.txt");
    assert_eq!(wizard.context(), &before);
}
