//! Rules engine with an Intent/Effect pipeline.
//!
//! 1. The host describes what the character does as an [`Intent`]
//! 2. [`RulesEngine`] resolves it against an [`Actor`] snapshot
//! 3. The [`Resolution`] lists [`Effect`]s describing state changes
//! 4. The host commits them with [`apply_effects`]
//!
//! Nothing touches the actor while resolving, so an intent that fails
//! (bad formula, rejected input) leaves the character exactly as it was.

pub mod advancement;
pub mod character;
pub mod request;
pub mod rest;
pub mod save;
pub mod spellcasting;

use crate::actor::{Actor, Archetype, Attribute, Origin, PoolKind};
use crate::config::RulesConfig;
use crate::dice::{DiceError, DiceExpression, DiceSource, RollOutcome};
use crate::items::{Item, ItemId, NewItemKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use advancement::{AdvancementResult, AdvancementSummary};
pub use request::ActionRequest;
pub use save::SaveResult;

/// Errors that abort an intent before any effect is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("Formula error: {0}")]
    Formula(#[from] DiceError),

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("{0} cannot be restored by a long rest")]
    InvalidRestAttribute(Attribute),

    #[error("Power level {requested} is not available (available: {available})")]
    PowerLevelUnavailable { requested: i32, available: i32 },

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Item {0} has no roll formula")]
    NotRollable(ItemId),

    #[error("Item {0} has no quantity")]
    NoQuantity(ItemId),

    #[error("Item {0} is not a spell")]
    NotASpell(ItemId),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action {action} requires {field}")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("Answer does not match the pending choice")]
    ChoiceMismatch,
}

/// What the character attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Intent {
    /// Roll a save against body, mind or luck
    AttributeSave { attribute: Attribute, formula: String },

    /// Recover health
    ShortRest { formula: String },

    /// Recover body or mind; `attribute` is asked for when both need rest
    LongRest {
        formula: String,
        attribute: Option<Attribute>,
    },

    /// Restore everything
    FullRest,

    /// Work out which power levels can be cast
    PrepareSpell { spell_id: Option<ItemId> },

    /// Cast with a chosen power level
    CastSpell {
        spell_id: Option<ItemId>,
        power_level: i32,
    },

    /// Roll advancement contests
    Advance,

    /// Roll luck, mind, body and health from scratch
    RollNewCharacter,

    /// Free-form roll
    RollFormula { formula: String, label: String },

    /// Roll an item's derived formula
    RollItem { item_id: ItemId },

    /// Edit armor rating; `None` is an empty field
    SetArmor { value: Option<i32> },

    SetArchetype { archetype: Archetype },

    SetOrigin { origin: Origin },

    /// Edit gold from the raw text of the field
    SetGold { raw: String },

    AdjustInventorySlots { delta: i32 },

    AdjustItemQuantity { item_id: ItemId, delta: i32 },

    ToggleDeprived,

    CreateItem { kind: NewItemKind },

    DeleteItem { item_id: ItemId },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::AttributeSave { .. } => "attribute-save",
            Intent::ShortRest { .. } => "short-rest",
            Intent::LongRest { .. } => "long-rest",
            Intent::FullRest => "full-rest",
            Intent::PrepareSpell { .. } => "prepare-spell",
            Intent::CastSpell { .. } => "cast-spell",
            Intent::Advance => "advance",
            Intent::RollNewCharacter => "roll-new-character",
            Intent::RollFormula { .. } => "roll-formula",
            Intent::RollItem { .. } => "roll-item",
            Intent::SetArmor { .. } => "set-armor",
            Intent::SetArchetype { .. } => "set-archetype",
            Intent::SetOrigin { .. } => "set-origin",
            Intent::SetGold { .. } => "set-gold",
            Intent::AdjustInventorySlots { .. } => "adjust-inventory-slots",
            Intent::AdjustItemQuantity { .. } => "adjust-item-quantity",
            Intent::ToggleDeprived => "toggle-deprived",
            Intent::CreateItem { .. } => "create-item",
            Intent::DeleteItem { .. } => "delete-item",
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// A decision the host must make before the action can continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "kebab-case")]
pub enum PendingChoice {
    PowerLevel {
        spell_id: Option<ItemId>,
        options: Vec<i32>,
    },
    RestAttribute {
        formula: String,
        options: Vec<Attribute>,
    },
}

/// The host's answer to a [`PendingChoice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChoiceAnswer {
    PowerLevel(i32),
    Attribute(Attribute),
}

impl PendingChoice {
    /// Turn the answer into the intent that continues the action.
    pub fn resume(&self, answer: ChoiceAnswer) -> Result<Intent, RulesError> {
        match (self, answer) {
            (PendingChoice::PowerLevel { spell_id, options }, ChoiceAnswer::PowerLevel(level)) => {
                if !options.contains(&level) {
                    return Err(RulesError::PowerLevelUnavailable {
                        requested: level,
                        available: options.iter().copied().max().unwrap_or(0),
                    });
                }
                Ok(Intent::CastSpell {
                    spell_id: *spell_id,
                    power_level: level,
                })
            }
            (PendingChoice::RestAttribute { formula, options }, ChoiceAnswer::Attribute(attr)) => {
                if !options.contains(&attr) {
                    return Err(RulesError::InvalidRestAttribute(attr));
                }
                Ok(Intent::LongRest {
                    formula: formula.clone(),
                    attribute: Some(attr),
                })
            }
            _ => Err(RulesError::ChoiceMismatch),
        }
    }
}

/// The primary classification of a resolved intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    Save {
        attribute: Attribute,
        result: SaveResult,
        total: i32,
    },
    /// Rest blocked; no dice rolled
    Deprived,
    /// Nothing to do and nothing to report
    Unchanged,
    ShortRest { recovered: i32 },
    LongRest { attribute: Attribute, recovered: i32 },
    LongRestNoRecovery,
    FullRest,
    ChoiceRequired(PendingChoice),
    NoSlots,
    SpellCast { power_level: i32, total: i32 },
    Advancement(AdvancementSummary),
    CharacterRolled {
        luck: i32,
        mind: i32,
        body: i32,
        health: i32,
    },
    Rolled { label: String, total: i32 },
    SheetUpdated,
}

impl Outcome {
    /// Localization key for the chat message, if one is shown.
    pub fn message_key(&self) -> Option<String> {
        let key = match self {
            Outcome::Save { result, .. } => result.message_key(),
            Outcome::Deprived => "SAB.chat.deprived",
            Outcome::ShortRest { .. } => "SAB.chat.short-rest",
            Outcome::LongRest { .. } => "SAB.chat.long-rest",
            Outcome::LongRestNoRecovery => "SAB.chat.long-rest-no-attribute-recovery",
            Outcome::FullRest => "SAB.chat.full-rest",
            Outcome::NoSlots => "SAB.item.spell.no-slots",
            Outcome::ChoiceRequired(PendingChoice::PowerLevel { .. }) => {
                "SAB.item.spell.pl-dialog"
            }
            Outcome::ChoiceRequired(PendingChoice::RestAttribute { .. }) => {
                "SAB.character.sheet.long-rest-description"
            }
            Outcome::Advancement(_) => "SAB.advance.attribute-chat-summary",
            Outcome::CharacterRolled { .. } => "SAB.charRollMsg",
            Outcome::Unchanged
            | Outcome::SpellCast { .. }
            | Outcome::Rolled { .. }
            | Outcome::SheetUpdated => return None,
        };
        Some(key.to_string())
    }
}

/// A secondary chat message emitted alongside the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "kebab-case")]
pub enum Notice {
    /// Duplicate faces on a spellcasting roll
    Spellburn { entry: i32 },
    Fatigue { count: u32 },
    Overburdened,
}

impl Notice {
    pub fn message_key(&self) -> String {
        match self {
            Notice::Spellburn { entry } => format!("SAB.Spellburn.{entry}"),
            Notice::Fatigue { .. } => "SAB.item.fatigue.msg".to_string(),
            Notice::Overburdened => "SAB.encumbrance.overburdened".to_string(),
        }
    }
}

/// Concrete state changes to apply to an [`Actor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Effect {
    /// A dice roll occurred
    DiceRolled { roll: RollOutcome, purpose: String },

    /// Luck moved by `delta`; not clamped
    LuckAdjusted { delta: i32, new_value: i32 },

    /// A pool's current value was set
    PoolSet { pool: PoolKind, value: i32 },

    /// Fresh attributes for a new character; values and maxima both set
    CharacterRolled {
        luck: i32,
        mind: i32,
        body: i32,
        health: i32,
    },

    ItemCreated { item: Item },

    ItemsRemoved { ids: Vec<ItemId> },

    ItemQuantitySet { item_id: ItemId, quantity: u32 },

    ArmorSet { value: i32 },

    ArchetypeSet { archetype: Archetype },

    OriginSet { origin: Origin },

    GoldSet { value: i32 },

    InventorySlotsSet { value: i32 },

    DeprivedSet { deprived: bool },
}

/// The result of resolving an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: Outcome,
    pub notices: Vec<Notice>,
    pub effects: Vec<Effect>,
}

impl Resolution {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            notices: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    /// Every roll made while resolving.
    pub fn rolls(&self) -> impl Iterator<Item = &RollOutcome> {
        self.effects.iter().filter_map(|e| match e {
            Effect::DiceRolled { roll, .. } => Some(roll),
            _ => None,
        })
    }

    /// The pending choice, if the action is waiting on the host.
    pub fn pending_choice(&self) -> Option<&PendingChoice> {
        match &self.outcome {
            Outcome::ChoiceRequired(choice) => Some(choice),
            _ => None,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Resolves intents into effects.
#[derive(Debug, Clone, Default)]
pub struct RulesEngine {
    config: RulesConfig,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Resolve an intent and produce effects.
    pub fn resolve<D: DiceSource + ?Sized>(
        &self,
        actor: &Actor,
        intent: Intent,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        let action = intent.name();
        debug!(actor = %actor.id, action, "resolving intent");

        let result = match intent {
            Intent::AttributeSave { attribute, formula } => {
                self.resolve_attribute_save(actor, attribute, &formula, dice)
            }
            Intent::ShortRest { formula } => self.resolve_short_rest(actor, &formula, dice),
            Intent::LongRest { formula, attribute } => {
                self.resolve_long_rest(actor, &formula, attribute, dice)
            }
            Intent::FullRest => Ok(self.resolve_full_rest(actor)),
            Intent::PrepareSpell { spell_id } => self.resolve_prepare_spell(actor, spell_id),
            Intent::CastSpell {
                spell_id,
                power_level,
            } => self.resolve_cast_spell(actor, spell_id, power_level, dice),
            Intent::Advance => self.resolve_advance(actor, dice),
            Intent::RollNewCharacter => self.resolve_roll_new_character(dice),
            Intent::RollFormula { formula, label } => {
                self.resolve_roll_formula(&formula, &label, dice)
            }
            Intent::RollItem { item_id } => self.resolve_roll_item(actor, item_id, dice),
            Intent::SetArmor { value } => Ok(self.resolve_set_armor(value)),
            Intent::SetArchetype { archetype } => Ok(Resolution::new(Outcome::SheetUpdated)
                .with_effect(Effect::ArchetypeSet { archetype })),
            Intent::SetOrigin { origin } => Ok(Resolution::new(Outcome::SheetUpdated)
                .with_effect(Effect::OriginSet { origin })),
            Intent::SetGold { raw } => Ok(self.resolve_set_gold(&raw)),
            Intent::AdjustInventorySlots { delta } => {
                Ok(self.resolve_adjust_inventory_slots(actor, delta))
            }
            Intent::AdjustItemQuantity { item_id, delta } => {
                self.resolve_adjust_item_quantity(actor, item_id, delta)
            }
            Intent::ToggleDeprived => Ok(Resolution::new(Outcome::SheetUpdated).with_effect(
                Effect::DeprivedSet {
                    deprived: !actor.attributes.is_deprived,
                },
            )),
            Intent::CreateItem { kind } => Ok(self.resolve_create_item(actor, kind)),
            Intent::DeleteItem { item_id } => self.resolve_delete_item(actor, item_id),
        };

        match &result {
            Ok(resolution) => info!(
                actor = %actor.id,
                action,
                outcome = ?resolution.outcome,
                effects = resolution.effects.len(),
                "intent resolved"
            ),
            Err(err) => warn!(actor = %actor.id, action, error = %err, "intent rejected"),
        }
        result
    }

    /// Parse and roll `formula`, recording the roll as an effect.
    ///
    /// The formula is parsed before any die is drawn.
    pub(crate) fn roll<D: DiceSource + ?Sized>(
        &self,
        formula: &str,
        purpose: impl Into<String>,
        dice: &mut D,
    ) -> Result<(RollOutcome, Effect), RulesError> {
        let expr = DiceExpression::parse(formula)?;
        let roll = expr.roll_with(dice)?;
        debug!(formula, total = roll.total, dice = ?roll.dice, "rolled");
        let effect = Effect::DiceRolled {
            roll: roll.clone(),
            purpose: purpose.into(),
        };
        Ok((roll, effect))
    }

    fn resolve_roll_formula<D: DiceSource + ?Sized>(
        &self,
        formula: &str,
        label: &str,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        let (roll, rolled) = self.roll(formula, label.to_uppercase(), dice)?;
        Ok(Resolution::new(Outcome::Rolled {
            label: label.to_uppercase(),
            total: roll.total,
        })
        .with_effect(rolled))
    }
}

// ============================================================================
// Applying effects
// ============================================================================

/// Apply all effects of a resolution in order.
pub fn apply_effects(actor: &mut Actor, effects: &[Effect]) {
    for effect in effects {
        apply_effect(actor, effect);
    }
}

/// Apply a single effect to the actor.
pub fn apply_effect(actor: &mut Actor, effect: &Effect) {
    match effect {
        Effect::DiceRolled { .. } => {}
        Effect::LuckAdjusted { delta, .. } => {
            actor.attributes.luck += delta;
        }
        Effect::PoolSet { pool, value } => {
            actor.pool_mut(*pool).value = *value;
        }
        Effect::CharacterRolled {
            luck,
            mind,
            body,
            health,
        } => {
            actor.attributes.luck = *luck;
            actor.mind = crate::clamp::Pool::full(*mind);
            actor.body = crate::clamp::Pool::full(*body);
            actor.health = crate::clamp::Pool::full(*health);
        }
        Effect::ItemCreated { item } => {
            actor.items.push(item.clone());
        }
        Effect::ItemsRemoved { ids } => {
            actor.items.retain(|i| !ids.contains(&i.id));
        }
        Effect::ItemQuantitySet { item_id, quantity } => {
            let Some(item) = actor.item_mut(*item_id) else {
                warn!(item = %item_id, "quantity change for missing item");
                return;
            };
            if let crate::items::ItemKind::Gear(gear) = &mut item.kind {
                gear.quantity = *quantity;
            }
        }
        Effect::ArmorSet { value } => actor.ar = *value,
        Effect::ArchetypeSet { archetype } => actor.attributes.archetype = archetype.clone(),
        Effect::OriginSet { origin } => actor.attributes.origin = origin.clone(),
        Effect::GoldSet { value } => actor.attributes.gold = *value,
        Effect::InventorySlotsSet { value } => actor.attributes.inv_slots = *value,
        Effect::DeprivedSet { deprived } => actor.attributes.is_deprived = *deprived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::create_sample_character;
    use crate::items::GearType;
    use crate::testing::ScriptedDice;

    #[test]
    fn test_roll_formula_uppercases_label() {
        let engine = RulesEngine::new();
        let actor = create_sample_character("Vell");
        let mut dice = ScriptedDice::new(&[4]);
        let resolution = engine
            .resolve(
                &actor,
                Intent::RollFormula {
                    formula: "1d6+1".to_string(),
                    label: "torch".to_string(),
                },
                &mut dice,
            )
            .unwrap();
        assert_eq!(
            resolution.outcome,
            Outcome::Rolled {
                label: "TORCH".to_string(),
                total: 5
            }
        );
        assert_eq!(resolution.rolls().count(), 1);
    }

    #[test]
    fn test_bad_formula_aborts_without_rolling() {
        let engine = RulesEngine::new();
        let actor = create_sample_character("Vell");
        let mut dice = ScriptedDice::new(&[]);
        let err = engine
            .resolve(
                &actor,
                Intent::RollFormula {
                    formula: "2d".to_string(),
                    label: String::new(),
                },
                &mut dice,
            )
            .unwrap_err();
        assert!(matches!(err, RulesError::Formula(_)));
        assert_eq!(dice.rolled(), 0);
    }

    #[test]
    fn test_resume_power_level_choice() {
        let choice = PendingChoice::PowerLevel {
            spell_id: None,
            options: vec![1, 2, 3],
        };
        assert_eq!(
            choice.resume(ChoiceAnswer::PowerLevel(2)).unwrap(),
            Intent::CastSpell {
                spell_id: None,
                power_level: 2
            }
        );
        assert_eq!(
            choice.resume(ChoiceAnswer::PowerLevel(4)).unwrap_err(),
            RulesError::PowerLevelUnavailable {
                requested: 4,
                available: 3
            }
        );
        assert_eq!(
            choice
                .resume(ChoiceAnswer::Attribute(Attribute::Body))
                .unwrap_err(),
            RulesError::ChoiceMismatch
        );
    }

    #[test]
    fn test_apply_item_effects() {
        let mut actor = create_sample_character("Vell");
        let rope = Item::gear("Rope", GearType::Misc);
        let rope_id = rope.id;
        apply_effects(
            &mut actor,
            &[
                Effect::ItemCreated { item: rope },
                Effect::ItemQuantitySet {
                    item_id: rope_id,
                    quantity: 3,
                },
            ],
        );
        assert_eq!(actor.item(rope_id).and_then(Item::quantity), Some(3));

        apply_effect(&mut actor, &Effect::ItemsRemoved { ids: vec![rope_id] });
        assert!(actor.items.is_empty());
    }

    #[test]
    fn test_luck_effect_is_unclamped() {
        let mut actor = create_sample_character("Vell").with_luck(0);
        apply_effect(
            &mut actor,
            &Effect::LuckAdjusted {
                delta: -1,
                new_value: -1,
            },
        );
        assert_eq!(actor.attributes.luck, -1);
    }

    #[test]
    fn test_intent_json_shape() {
        let intent: Intent = serde_json::from_str(
            r#"{ "action": "attribute-save", "attribute": "mind", "formula": "1d20" }"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            Intent::AttributeSave {
                attribute: Attribute::Mind,
                formula: "1d20".to_string()
            }
        );
    }
}
