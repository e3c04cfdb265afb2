//! Short, long and full rests.

use super::{Effect, Outcome, PendingChoice, Resolution, RulesEngine, RulesError};
use crate::actor::{Actor, Attribute, PoolKind};
use crate::dice::DiceSource;
use crate::items::fatigue_ids;
use tracing::debug;

/// Removal of every fatigue item, or `None` when there is nothing to clear.
fn clear_fatigue(actor: &Actor) -> Option<Effect> {
    let ids = fatigue_ids(&actor.items);
    if ids.is_empty() {
        None
    } else {
        Some(Effect::ItemsRemoved { ids })
    }
}

/// Body and mind pools that are below their maximum, in that order.
pub fn attributes_needing_rest(actor: &Actor) -> Vec<Attribute> {
    [Attribute::Body, Attribute::Mind]
        .into_iter()
        .filter(|attr| match attr {
            Attribute::Body => !actor.body.is_full(),
            Attribute::Mind => !actor.mind.is_full(),
            Attribute::Luck => false,
        })
        .collect()
}

impl RulesEngine {
    pub(super) fn resolve_short_rest<D: DiceSource + ?Sized>(
        &self,
        actor: &Actor,
        formula: &str,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        if actor.attributes.is_deprived {
            return Ok(Resolution::new(Outcome::Deprived));
        }

        if actor.health.value == actor.health.max {
            return Ok(Resolution::new(Outcome::Unchanged));
        }

        let (roll, rolled) = self.roll(formula, "short rest", dice)?;
        let new_value = actor.health.restored_by(roll.total);
        let recovered = new_value - actor.health.value;

        Ok(Resolution::new(Outcome::ShortRest { recovered })
            .with_effect(rolled)
            .with_effect(Effect::PoolSet {
                pool: PoolKind::Health,
                value: new_value,
            }))
    }

    pub(super) fn resolve_long_rest<D: DiceSource + ?Sized>(
        &self,
        actor: &Actor,
        formula: &str,
        attribute: Option<Attribute>,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        if actor.attributes.is_deprived {
            return Ok(Resolution::new(Outcome::Deprived));
        }

        let attribute = match attribute {
            Some(Attribute::Luck) => return Err(RulesError::InvalidRestAttribute(Attribute::Luck)),
            Some(attr) => attr,
            None => {
                // Validate the formula now so the host never answers a choice
                // for an action that cannot roll.
                crate::dice::DiceExpression::parse(formula)?;
                let needing = attributes_needing_rest(actor);
                match needing.len() {
                    0 => {
                        return Ok(Resolution::new(Outcome::LongRestNoRecovery)
                            .with_effects(clear_fatigue(actor)));
                    }
                    1 => needing[0],
                    _ => {
                        return Ok(Resolution::new(Outcome::ChoiceRequired(
                            PendingChoice::RestAttribute {
                                formula: formula.to_string(),
                                options: needing,
                            },
                        )));
                    }
                }
            }
        };

        let pool_kind = match attribute {
            Attribute::Body => PoolKind::Body,
            Attribute::Mind => PoolKind::Mind,
            Attribute::Luck => return Err(RulesError::InvalidRestAttribute(Attribute::Luck)),
        };
        let pool = actor.pool(pool_kind);

        let (roll, rolled) = self.roll(formula, format!("long rest ({attribute})"), dice)?;
        let new_value = pool.restored_by(roll.total);
        let recovered = new_value - pool.value;
        debug!(%attribute, recovered, "long rest recovery");

        let mut resolution = Resolution::new(if recovered > 0 {
            Outcome::LongRest {
                attribute,
                recovered,
            }
        } else {
            Outcome::LongRestNoRecovery
        })
        .with_effect(rolled);

        if recovered > 0 {
            resolution = resolution
                .with_effect(Effect::PoolSet {
                    pool: pool_kind,
                    value: new_value,
                })
                .with_effect(Effect::PoolSet {
                    pool: PoolKind::Health,
                    value: actor.health.max,
                });
        }

        Ok(resolution.with_effects(clear_fatigue(actor)))
    }

    pub(super) fn resolve_full_rest(&self, actor: &Actor) -> Resolution {
        Resolution::new(Outcome::FullRest)
            .with_effect(Effect::PoolSet {
                pool: PoolKind::Health,
                value: actor.health.max,
            })
            .with_effect(Effect::PoolSet {
                pool: PoolKind::Body,
                value: actor.body.max,
            })
            .with_effect(Effect::PoolSet {
                pool: PoolKind::Mind,
                value: actor.mind.max,
            })
            .with_effects(clear_fatigue(actor))
    }
}
