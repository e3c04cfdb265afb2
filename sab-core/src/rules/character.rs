//! Character creation, sheet edits and inventory management.

use super::{Effect, Notice, Outcome, Resolution, RulesEngine, RulesError};
use crate::actor::Actor;
use crate::clamp::clamp_value;
use crate::dice::DiceSource;
use crate::items::{FeatureType, GearType, Item, ItemId, ItemKind, NewItemKind};
use regex::Regex;

lazy_static::lazy_static! {
    static ref LEADING_INTEGER: Regex =
        Regex::new(r"^\s*([+-]?\d+)").expect("leading integer pattern");
}

/// Read the integer that starts `raw`, ignoring anything after it.
///
/// Returns `None` when `raw` does not start with digits. Values past the
/// `i32` range saturate.
pub fn parse_leading_integer(raw: &str) -> Option<i32> {
    let digits = LEADING_INTEGER.captures(raw)?.get(1)?.as_str();
    Some(digits.parse::<i32>().unwrap_or(if digits.starts_with('-') {
        i32::MIN
    } else {
        i32::MAX
    }))
}

impl RulesEngine {
    /// Three attribute rolls, lowest to luck, middle to mind, highest to body.
    pub(super) fn resolve_roll_new_character<D: DiceSource + ?Sized>(
        &self,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        let mut effects = Vec::with_capacity(4);
        let mut totals = Vec::with_capacity(3);
        for _ in 0..3 {
            let (roll, rolled) = self.roll(&self.config.attribute_formula, "new character", dice)?;
            totals.push(roll.total);
            effects.push(rolled);
        }
        totals.sort();

        let (health_roll, rolled) = self.roll(&self.config.health_formula, "health", dice)?;
        effects.push(rolled);

        let (luck, mind, body, health) = (totals[0], totals[1], totals[2], health_roll.total);
        Ok(Resolution::new(Outcome::CharacterRolled {
            luck,
            mind,
            body,
            health,
        })
        .with_effects(effects)
        .with_effect(Effect::CharacterRolled {
            luck,
            mind,
            body,
            health,
        }))
    }

    /// Roll an item's derived formula. Spells start the casting flow instead.
    pub(super) fn resolve_roll_item<D: DiceSource + ?Sized>(
        &self,
        actor: &Actor,
        item_id: ItemId,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        let item = actor.item(item_id).ok_or(RulesError::ItemNotFound(item_id))?;
        if matches!(item.kind, ItemKind::Spell) {
            return self.resolve_prepare_spell(actor, Some(item_id));
        }

        let formula = item.formula().ok_or(RulesError::NotRollable(item_id))?;
        let (roll, rolled) = self.roll(&formula, item.name.clone(), dice)?;
        Ok(Resolution::new(Outcome::Rolled {
            label: item.name.clone(),
            total: roll.total,
        })
        .with_effect(rolled))
    }

    pub(super) fn resolve_set_armor(&self, value: Option<i32>) -> Resolution {
        let value = clamp_value(value.unwrap_or(0), self.config.armor_min, self.config.armor_max);
        Resolution::new(Outcome::SheetUpdated).with_effect(Effect::ArmorSet { value })
    }

    /// Keeps the leading integer of `raw`; no leading integer means zero.
    pub(super) fn resolve_set_gold(&self, raw: &str) -> Resolution {
        let value = parse_leading_integer(raw).unwrap_or(0).max(0);
        Resolution::new(Outcome::SheetUpdated).with_effect(Effect::GoldSet { value })
    }

    pub(super) fn resolve_adjust_inventory_slots(&self, actor: &Actor, delta: i32) -> Resolution {
        let value = actor.attributes.inv_slots.saturating_add(delta).max(0);
        Resolution::new(Outcome::SheetUpdated).with_effect(Effect::InventorySlotsSet { value })
    }

    pub(super) fn resolve_adjust_item_quantity(
        &self,
        actor: &Actor,
        item_id: ItemId,
        delta: i32,
    ) -> Result<Resolution, RulesError> {
        let item = actor.item(item_id).ok_or(RulesError::ItemNotFound(item_id))?;
        let current = item.quantity().ok_or(RulesError::NoQuantity(item_id))?;
        let quantity =
            u32::try_from((i64::from(current) + i64::from(delta)).max(0)).unwrap_or(u32::MAX);
        Ok(Resolution::new(Outcome::SheetUpdated)
            .with_effect(Effect::ItemQuantitySet { item_id, quantity }))
    }

    pub(super) fn resolve_create_item(&self, actor: &Actor, kind: NewItemKind) -> Resolution {
        let names = &self.config.item_names;
        let item = match kind {
            NewItemKind::Gear(GearType::Fatigue) => Item::fatigue(&names.fatigue),
            NewItemKind::Gear(item_type) => Item::gear(&names.gear, item_type),
            NewItemKind::Feature => Item::feature(&names.feature, FeatureType::default()),
            NewItemKind::Spell => Item::spell(&names.spell),
        };

        let overburdened = actor.gear_weight() + item.weight() >= actor.attributes.inv_slots;
        let resolution =
            Resolution::new(Outcome::SheetUpdated).with_effect(Effect::ItemCreated { item });
        if overburdened {
            resolution.with_notice(Notice::Overburdened)
        } else {
            resolution
        }
    }

    pub(super) fn resolve_delete_item(
        &self,
        actor: &Actor,
        item_id: ItemId,
    ) -> Result<Resolution, RulesError> {
        actor.item(item_id).ok_or(RulesError::ItemNotFound(item_id))?;
        Ok(Resolution::new(Outcome::SheetUpdated)
            .with_effect(Effect::ItemsRemoved { ids: vec![item_id] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{create_sample_character, Archetype};
    use crate::config::RulesConfig;
    use crate::items::RollSpec;
    use crate::rules::{apply_effects, Intent, PendingChoice};
    use crate::testing::ScriptedDice;

    fn resolve(actor: &Actor, intent: Intent, faces: &[u32]) -> Result<Resolution, RulesError> {
        RulesEngine::new().resolve(actor, intent, &mut ScriptedDice::new(faces))
    }

    #[test]
    fn test_new_character_sorts_rolls() {
        let mut actor = Actor::new("Vell");
        // 2d6+3 three times: 12, 7, 15; then 1d6 health: 4.
        let resolution = resolve(
            &actor,
            Intent::RollNewCharacter,
            &[5, 4, 2, 2, 6, 6, 4],
        )
        .unwrap();
        assert_eq!(
            resolution.outcome,
            Outcome::CharacterRolled {
                luck: 7,
                mind: 12,
                body: 15,
                health: 4
            }
        );
        assert_eq!(resolution.rolls().count(), 4);

        apply_effects(&mut actor, &resolution.effects);
        assert_eq!(actor.attributes.luck, 7);
        assert_eq!((actor.mind.value, actor.mind.max), (12, 12));
        assert_eq!((actor.body.value, actor.body.max), (15, 15));
        assert_eq!((actor.health.value, actor.health.max), (4, 4));
    }

    #[test]
    fn test_armor_edit_clamps() {
        let engine = RulesEngine::new();
        let effect = |value| engine.resolve_set_armor(value).effects[0].clone();
        assert_eq!(effect(Some(7)), Effect::ArmorSet { value: 3 });
        assert_eq!(effect(Some(-9)), Effect::ArmorSet { value: -3 });
        assert_eq!(effect(None), Effect::ArmorSet { value: 0 });
    }

    #[test]
    fn test_gold_edit_parses_leniently() {
        let engine = RulesEngine::new();
        assert_eq!(engine.resolve_set_gold(" 42 ").effects[0], Effect::GoldSet { value: 42 });
        assert_eq!(engine.resolve_set_gold("lots").effects[0], Effect::GoldSet { value: 0 });
        assert_eq!(engine.resolve_set_gold("-5").effects[0], Effect::GoldSet { value: 0 });
        assert_eq!(engine.resolve_set_gold("12 coins").effects[0], Effect::GoldSet { value: 12 });
        assert_eq!(engine.resolve_set_gold("3.7").effects[0], Effect::GoldSet { value: 3 });
        assert_eq!(engine.resolve_set_gold("+8gp").effects[0], Effect::GoldSet { value: 8 });
        assert_eq!(engine.resolve_set_gold("gp 12").effects[0], Effect::GoldSet { value: 0 });
        assert_eq!(engine.resolve_set_gold("").effects[0], Effect::GoldSet { value: 0 });
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(parse_leading_integer("  -12abc"), Some(-12));
        assert_eq!(parse_leading_integer("007"), Some(7));
        assert_eq!(parse_leading_integer("- 3"), None);
        assert_eq!(parse_leading_integer("99999999999"), Some(i32::MAX));
        assert_eq!(parse_leading_integer("-99999999999"), Some(i32::MIN));
    }

    #[test]
    fn test_inventory_slots_floor() {
        let actor = create_sample_character("Vell").with_inv_slots(0);
        let resolution = resolve(&actor, Intent::AdjustInventorySlots { delta: -1 }, &[]).unwrap();
        assert_eq!(resolution.effects, vec![Effect::InventorySlotsSet { value: 0 }]);
    }

    #[test]
    fn test_inventory_slots_saturate() {
        let actor = create_sample_character("Vell").with_inv_slots(i32::MAX);
        let resolution = resolve(&actor, Intent::AdjustInventorySlots { delta: 1 }, &[]).unwrap();
        assert_eq!(
            resolution.effects,
            vec![Effect::InventorySlotsSet { value: i32::MAX }]
        );

        let actor = create_sample_character("Vell").with_inv_slots(-5);
        let resolution =
            resolve(&actor, Intent::AdjustInventorySlots { delta: i32::MIN }, &[]).unwrap();
        assert_eq!(resolution.effects, vec![Effect::InventorySlotsSet { value: 0 }]);
    }

    #[test]
    fn test_item_quantity_saturates() {
        let coins = Item::gear("Coins", GearType::Misc).with_quantity(u32::MAX);
        let coins_id = coins.id;
        let actor = create_sample_character("Vell").with_item(coins);
        let resolution = resolve(
            &actor,
            Intent::AdjustItemQuantity {
                item_id: coins_id,
                delta: 1,
            },
            &[],
        )
        .unwrap();
        assert_eq!(
            resolution.effects,
            vec![Effect::ItemQuantitySet {
                item_id: coins_id,
                quantity: u32::MAX
            }]
        );
    }

    #[test]
    fn test_item_quantity_floor() {
        let rope = Item::gear("Rope", GearType::Misc).with_quantity(1);
        let rope_id = rope.id;
        let mut actor = create_sample_character("Vell").with_item(rope);

        for _ in 0..2 {
            let resolution = resolve(
                &actor,
                Intent::AdjustItemQuantity {
                    item_id: rope_id,
                    delta: -1,
                },
                &[],
            )
            .unwrap();
            apply_effects(&mut actor, &resolution.effects);
        }
        assert_eq!(actor.item(rope_id).and_then(Item::quantity), Some(0));
    }

    #[test]
    fn test_quantity_on_spell_is_rejected() {
        let spell = Item::spell("Ember");
        let spell_id = spell.id;
        let actor = create_sample_character("Vell").with_item(spell);
        let err = resolve(
            &actor,
            Intent::AdjustItemQuantity {
                item_id: spell_id,
                delta: 1,
            },
            &[],
        )
        .unwrap_err();
        assert_eq!(err, RulesError::NoQuantity(spell_id));
    }

    #[test]
    fn test_create_item_uses_configured_names() {
        let actor = create_sample_character("Vell").with_inv_slots(1);
        let engine = RulesEngine::with_config(RulesConfig::default());
        let resolution = engine.resolve_create_item(&actor, NewItemKind::Gear(GearType::Fatigue));
        match &resolution.effects[0] {
            Effect::ItemCreated { item } => {
                assert_eq!(item.name, "Fatigue");
                assert!(item.is_fatigue());
            }
            other => panic!("expected item creation, got {other:?}"),
        }
        assert_eq!(resolution.notices, vec![Notice::Overburdened]);

        let resolution = engine.resolve_create_item(&actor, NewItemKind::Spell);
        assert!(resolution.notices.is_empty());
    }

    #[test]
    fn test_delete_missing_item() {
        let actor = create_sample_character("Vell");
        let missing = ItemId::new();
        assert_eq!(
            resolve(&actor, Intent::DeleteItem { item_id: missing }, &[]).unwrap_err(),
            RulesError::ItemNotFound(missing)
        );
    }

    #[test]
    fn test_roll_item_formula() {
        let axe = Item::gear("Axe", GearType::Weapon).with_roll(RollSpec::new("d8").with_bonus("1d6"));
        let axe_id = axe.id;
        let actor = create_sample_character("Vell").with_item(axe);
        let resolution = resolve(&actor, Intent::RollItem { item_id: axe_id }, &[3, 5]).unwrap();
        assert_eq!(
            resolution.outcome,
            Outcome::Rolled {
                label: "Axe".to_string(),
                total: 5
            }
        );
    }

    #[test]
    fn test_roll_spell_item_prepares_cast() {
        let spell = Item::spell("Ember");
        let spell_id = spell.id;
        let actor = create_sample_character("Vell").with_item(spell);
        let resolution = resolve(&actor, Intent::RollItem { item_id: spell_id }, &[]).unwrap();
        assert!(matches!(
            resolution.pending_choice(),
            Some(PendingChoice::PowerLevel { spell_id: Some(id), .. }) if *id == spell_id
        ));
    }

    #[test]
    fn test_roll_item_without_formula() {
        let rope = Item::gear("Rope", GearType::Misc);
        let rope_id = rope.id;
        let actor = create_sample_character("Vell").with_item(rope);
        assert_eq!(
            resolve(&actor, Intent::RollItem { item_id: rope_id }, &[]).unwrap_err(),
            RulesError::NotRollable(rope_id)
        );
    }

    #[test]
    fn test_toggle_deprived_and_archetype() {
        let mut actor = create_sample_character("Vell");
        let archetype = Archetype {
            name: "Hedge Witch".to_string(),
            trigger: "Sees a crow".to_string(),
        };
        for intent in [
            Intent::ToggleDeprived,
            Intent::SetArchetype {
                archetype: archetype.clone(),
            },
        ] {
            let resolution = resolve(&actor, intent, &[]).unwrap();
            apply_effects(&mut actor, &resolution.effects);
        }
        assert!(actor.attributes.is_deprived);
        assert_eq!(actor.attributes.archetype, archetype);
    }
}
