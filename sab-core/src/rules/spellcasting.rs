//! Spellcasting.
//!
//! Casting is two-phase: [`Intent::PrepareSpell`](super::Intent::PrepareSpell)
//! offers the power levels the character's free inventory slots allow, and
//! [`Intent::CastSpell`](super::Intent::CastSpell) rolls one d6 per level.
//! Duplicate faces trigger spellburn; every die above 3 leaves a fatigue item
//! behind.

use super::{Effect, Notice, Outcome, PendingChoice, Resolution, RulesEngine, RulesError};
use crate::actor::Actor;
use crate::dice::DiceSource;
use crate::items::{Item, ItemId, ItemKind};
use std::collections::HashSet;
use tracing::debug;

/// Power levels on offer: free slots, capped at `max_power_level`, never
/// below zero.
pub fn available_slots(actor: &Actor, max_power_level: i32) -> i32 {
    actor.free_slots().min(max_power_level).max(0)
}

/// Whether any face appears more than once.
pub fn has_duplicate_faces(dice: &[u32]) -> bool {
    let mut seen = HashSet::with_capacity(dice.len());
    dice.iter().any(|face| !seen.insert(*face))
}

/// Spellburn table entry for a roll total.
pub fn spellburn_entry(total: i32, cap: i32) -> i32 {
    total.min(cap)
}

/// Fatigue generated by a roll: walking the dice from highest to lowest,
/// one per die above `threshold`, stopping at the first that is not.
pub fn fatigue_from_dice(dice: &[u32], threshold: u32) -> u32 {
    let mut sorted = dice.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));
    sorted.iter().take_while(|&&face| face > threshold).count() as u32
}

impl RulesEngine {
    fn spell_label(&self, actor: &Actor, spell_id: Option<ItemId>) -> Result<String, RulesError> {
        match spell_id {
            None => Ok("spell".to_string()),
            Some(id) => match actor.item(id) {
                Some(spell) if matches!(spell.kind, ItemKind::Spell) => {
                    Ok(format!("[spell] {}", spell.name))
                }
                Some(_) => Err(RulesError::NotASpell(id)),
                None => Err(RulesError::ItemNotFound(id)),
            },
        }
    }

    pub(super) fn resolve_prepare_spell(
        &self,
        actor: &Actor,
        spell_id: Option<ItemId>,
    ) -> Result<Resolution, RulesError> {
        self.spell_label(actor, spell_id)?;

        let available = available_slots(actor, self.config.max_power_level);
        debug!(available, weight = actor.gear_weight(), "power levels available");

        let resolution = if available == 0 {
            Resolution::new(Outcome::NoSlots)
        } else {
            Resolution::new(Outcome::ChoiceRequired(PendingChoice::PowerLevel {
                spell_id,
                options: (1..=available).collect(),
            }))
        };

        if actor.is_overburdened() {
            Ok(resolution.with_notice(Notice::Overburdened))
        } else {
            Ok(resolution)
        }
    }

    pub(super) fn resolve_cast_spell<D: DiceSource + ?Sized>(
        &self,
        actor: &Actor,
        spell_id: Option<ItemId>,
        power_level: i32,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        let label = self.spell_label(actor, spell_id)?;

        if power_level <= 0 {
            return Ok(Resolution::new(Outcome::NoSlots));
        }

        let available = available_slots(actor, self.config.max_power_level);
        if power_level > available {
            return Err(RulesError::PowerLevelUnavailable {
                requested: power_level,
                available,
            });
        }

        let formula = format!("{}d{}", power_level, self.config.power_die_sides);
        let (roll, rolled) = self.roll(&formula, label, dice)?;

        let mut resolution = Resolution::new(Outcome::SpellCast {
            power_level,
            total: roll.total,
        })
        .with_effect(rolled);

        if has_duplicate_faces(&roll.dice) {
            resolution = resolution.with_notice(Notice::Spellburn {
                entry: spellburn_entry(roll.total, self.config.spellburn_cap),
            });
        }

        let fatigue = fatigue_from_dice(&roll.dice, self.config.fatigue_threshold);
        if fatigue > 0 {
            let new_items = (0..fatigue).map(|_| Effect::ItemCreated {
                item: Item::fatigue(&self.config.item_names.fatigue),
            });
            resolution = resolution
                .with_effects(new_items)
                .with_notice(Notice::Fatigue { count: fatigue });

            // Fatigue takes up slots, so re-check encumbrance.
            if actor.gear_weight() + fatigue as i32 >= actor.attributes.inv_slots {
                resolution = resolution.with_notice(Notice::Overburdened);
            }
        }

        Ok(resolution)
    }
}
