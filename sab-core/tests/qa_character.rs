//! QA tests for saves, advancement and character sheet edits.
//!
//! Run with: `RUST_LOG=sab_core=debug cargo test -p sab-core --test qa_character -- --nocapture`

use sab_core::rules::SaveResult;
use sab_core::testing::{assert_luck, assert_pools, TestHarness};
use sab_core::{
    create_sample_character, Actor, Attribute, Effect, GearType, Intent, NewItemKind, Outcome,
    RulesError, SessionError, SheetView,
};
use tracing_subscriber::EnvFilter;

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn save(attribute: Attribute) -> Intent {
    Intent::AttributeSave {
        attribute,
        formula: "1d20".to_string(),
    }
}

// =============================================================================
// SAVES
// =============================================================================

#[test]
fn test_luck_drifts_with_criticals() {
    setup();
    let mut harness = TestHarness::new();
    harness.expect_dice(&[20, 14, 8, 9]);

    let outcomes: Vec<Outcome> = [
        save(Attribute::Body),
        save(Attribute::Body),
        save(Attribute::Luck),
        save(Attribute::Luck),
    ]
    .into_iter()
    .map(|intent| harness.act(intent).unwrap().outcome)
    .collect();

    let results: Vec<SaveResult> = outcomes
        .iter()
        .map(|o| match o {
            Outcome::Save { result, .. } => *result,
            other => panic!("expected save, got {other:?}"),
        })
        .collect();
    // Luck drops to 7, then climbs with every exact hit.
    assert_eq!(
        results,
        vec![
            SaveResult::CriticalFailure,
            SaveResult::CriticalSuccess,
            SaveResult::CriticalSuccess,
            SaveResult::CriticalSuccess,
        ]
    );
    assert_luck(&harness, 10);
}

// =============================================================================
// ADVANCEMENT
// =============================================================================

#[test]
fn test_advancement_is_advisory() {
    setup();
    let actor = create_sample_character("Vell").with_body(18, 18);
    let mut harness = TestHarness::with_actor(actor.clone());
    harness.expect_dice(&[19, 2]);

    let resolution = harness.act(Intent::Advance).unwrap();
    let summary = match resolution.outcome {
        Outcome::Advancement(summary) => summary,
        other => panic!("expected advancement, got {other:?}"),
    };
    assert_eq!(
        summary.successes().collect::<Vec<_>>(),
        vec![Attribute::Mind]
    );
    assert_eq!(harness.dice_rolled(), 2);
    assert_eq!(harness.actor(), &actor);
}

// =============================================================================
// SHEET EDITS
// =============================================================================

#[test]
fn test_new_character_then_sheet() {
    setup();
    let mut harness = TestHarness::with_actor(Actor::new("Fresh"));
    harness.expect_dice(&[1, 1, 6, 6, 3, 3, 2]);

    harness.act(Intent::RollNewCharacter).unwrap();
    assert_luck(&harness, 5);
    assert_pools(&harness, 2, 15, 9);

    let view = SheetView::new(harness.actor(), harness.session.engine().config());
    assert_eq!(view.body.max, 15);
    assert!(view.gear.is_empty());
}

#[test]
fn test_inventory_edits() {
    setup();
    let mut harness = TestHarness::with_actor(create_sample_character("Vell").with_inv_slots(1));

    let created = harness
        .act(Intent::CreateItem {
            kind: NewItemKind::Gear(GearType::Weapon),
        })
        .unwrap();
    let item_id = match &created.effects[0] {
        Effect::ItemCreated { item } => item.id,
        other => panic!("expected item, got {other:?}"),
    };
    assert_eq!(harness.actor().items[0].name, "New Item");
    assert!(!created.notices.is_empty());

    harness
        .act(Intent::AdjustItemQuantity { item_id, delta: 2 })
        .unwrap();
    assert_eq!(harness.actor().items[0].quantity(), Some(3));

    harness.act(Intent::DeleteItem { item_id }).unwrap();
    assert!(harness.actor().items.is_empty());

    let err = harness.act(Intent::DeleteItem { item_id }).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Rules(RulesError::ItemNotFound(id)) if id == item_id
    ));
}

#[test]
fn test_field_edits_are_clamped() {
    setup();
    let mut harness = TestHarness::new();
    for intent in [
        Intent::SetArmor { value: Some(9) },
        Intent::SetGold {
            raw: "12 coins".to_string(),
        },
        Intent::AdjustInventorySlots { delta: -20 },
        Intent::ToggleDeprived,
    ] {
        harness.act(intent).unwrap();
    }

    let attributes = &harness.actor().attributes;
    assert_eq!(harness.actor().ar, 3);
    assert_eq!(attributes.gold, 12);
    assert_eq!(attributes.inv_slots, 0);
    assert!(attributes.is_deprived);
}
