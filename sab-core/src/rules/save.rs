//! Attribute saves.
//!
//! A save succeeds by rolling under the attribute. Exactly matching it is a
//! critical success and a fixed total of 20 is always a critical failure;
//! both move luck by one step.

use super::{Effect, Outcome, Resolution, RulesEngine, RulesError};
use crate::actor::{Actor, Attribute};
use crate::dice::DiceSource;
use serde::{Deserialize, Serialize};

/// The four save classifications, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveResult {
    CriticalFailure,
    CriticalSuccess,
    Success,
    Failure,
}

impl SaveResult {
    pub fn message_key(&self) -> &'static str {
        match self {
            SaveResult::CriticalFailure => "SAB.chat.critical-failure",
            SaveResult::CriticalSuccess => "SAB.chat.critical-success",
            SaveResult::Success => "SAB.chat.save-success",
            SaveResult::Failure => "SAB.chat.save-failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SaveResult::CriticalSuccess | SaveResult::Success)
    }
}

/// Classify a save total against the attribute's current value.
///
/// The critical failure total is checked first, so it wins even when it
/// equals the attribute.
pub fn classify_save(total: i32, current: i32, critical_failure_total: i32) -> SaveResult {
    if total == critical_failure_total {
        SaveResult::CriticalFailure
    } else if total == current {
        SaveResult::CriticalSuccess
    } else if total < current {
        SaveResult::Success
    } else {
        SaveResult::Failure
    }
}

impl RulesEngine {
    pub(super) fn resolve_attribute_save<D: DiceSource + ?Sized>(
        &self,
        actor: &Actor,
        attribute: Attribute,
        formula: &str,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        let (roll, rolled) = self.roll(formula, format!("{attribute} save"), dice)?;
        let current = actor.attribute_value(attribute);
        let result = classify_save(roll.total, current, self.config.critical_failure_total);

        let mut resolution = Resolution::new(Outcome::Save {
            attribute,
            result,
            total: roll.total,
        })
        .with_effect(rolled);

        let luck_delta = match result {
            SaveResult::CriticalFailure => -self.config.luck_step,
            SaveResult::CriticalSuccess => self.config.luck_step,
            SaveResult::Success | SaveResult::Failure => 0,
        };
        if luck_delta != 0 {
            resolution = resolution.with_effect(Effect::LuckAdjusted {
                delta: luck_delta,
                new_value: actor.attributes.luck + luck_delta,
            });
        }

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::create_sample_character;
    use crate::dice::DiceError;
    use crate::rules::Intent;
    use crate::testing::ScriptedDice;

    fn save(actor: &Actor, attribute: Attribute, face: u32) -> Resolution {
        RulesEngine::new()
            .resolve(
                actor,
                Intent::AttributeSave {
                    attribute,
                    formula: "1d20".to_string(),
                },
                &mut ScriptedDice::new(&[face]),
            )
            .unwrap()
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify_save(20, 20, 20), SaveResult::CriticalFailure);
        assert_eq!(classify_save(12, 12, 20), SaveResult::CriticalSuccess);
        assert_eq!(classify_save(5, 12, 20), SaveResult::Success);
        assert_eq!(classify_save(13, 12, 20), SaveResult::Failure);
    }

    #[test]
    fn test_success_flags() {
        assert!(SaveResult::CriticalSuccess.is_success());
        assert!(SaveResult::Success.is_success());
        assert!(!SaveResult::CriticalFailure.is_success());
        assert!(!SaveResult::Failure.is_success());
    }

    #[test]
    fn test_custom_critical_total() {
        let engine = RulesEngine::with_config(
            crate::config::RulesConfig::default().with_critical_failure_total(1),
        );
        let actor = create_sample_character("Vell");
        let resolution = engine
            .resolve(
                &actor,
                Intent::AttributeSave {
                    attribute: Attribute::Mind,
                    formula: "1d20".to_string(),
                },
                &mut ScriptedDice::new(&[1]),
            )
            .unwrap();
        assert!(matches!(
            resolution.outcome,
            Outcome::Save {
                result: SaveResult::CriticalFailure,
                ..
            }
        ));
    }

    #[test]
    fn test_critical_failure_beats_critical_success() {
        for current in [0, 12, 18, 20, 25] {
            assert_eq!(classify_save(20, current, 20), SaveResult::CriticalFailure);
        }
    }

    #[test]
    fn test_critical_failure_costs_luck() {
        let actor = create_sample_character("Vell").with_body(14, 14).with_luck(8);
        let resolution = save(&actor, Attribute::Body, 20);
        assert_eq!(
            resolution.outcome,
            Outcome::Save {
                attribute: Attribute::Body,
                result: SaveResult::CriticalFailure,
                total: 20
            }
        );
        assert!(resolution.effects.contains(&Effect::LuckAdjusted {
            delta: -1,
            new_value: 7
        }));
    }

    #[test]
    fn test_critical_success_on_luck_save() {
        let actor = create_sample_character("Vell").with_luck(9);
        let resolution = save(&actor, Attribute::Luck, 9);
        assert!(resolution.effects.contains(&Effect::LuckAdjusted {
            delta: 1,
            new_value: 10
        }));
    }

    #[test]
    fn test_luck_may_leave_display_range() {
        let actor = create_sample_character("Vell").with_luck(18).with_mind(18, 18);
        let resolution = save(&actor, Attribute::Mind, 18);
        assert!(resolution.effects.contains(&Effect::LuckAdjusted {
            delta: 1,
            new_value: 19
        }));
    }

    #[test]
    fn test_plain_results_leave_luck_alone() {
        let actor = create_sample_character("Vell").with_mind(10, 10);

        let success = save(&actor, Attribute::Mind, 4);
        assert_eq!(success.outcome.message_key().as_deref(), Some("SAB.chat.save-success"));
        assert_eq!(success.effects.len(), 1);

        let failure = save(&actor, Attribute::Mind, 15);
        assert_eq!(failure.outcome.message_key().as_deref(), Some("SAB.chat.save-failure"));
        assert_eq!(failure.effects.len(), 1);
    }

    #[test]
    fn test_total_includes_modifiers() {
        let actor = create_sample_character("Vell").with_body(14, 14);
        let resolution = RulesEngine::new()
            .resolve(
                &actor,
                Intent::AttributeSave {
                    attribute: Attribute::Body,
                    formula: "1d20+6".to_string(),
                },
                &mut ScriptedDice::new(&[14]),
            )
            .unwrap();
        // 14 + 6 hits the fixed critical failure total.
        assert!(matches!(
            resolution.outcome,
            Outcome::Save {
                result: SaveResult::CriticalFailure,
                total: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_die_is_rejected() {
        let actor = create_sample_character("Vell");
        let err = RulesEngine::new()
            .resolve(
                &actor,
                Intent::AttributeSave {
                    attribute: Attribute::Luck,
                    formula: "1d4294967295".to_string(),
                },
                &mut ScriptedDice::new(&[]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RulesError::Formula(DiceError::InvalidDieSize(4294967295))
        ));
    }

    #[test]
    fn test_overflowing_modifier_is_rejected() {
        let actor = create_sample_character("Vell");
        let err = RulesEngine::new()
            .resolve(
                &actor,
                Intent::AttributeSave {
                    attribute: Attribute::Luck,
                    formula: "1d20+2147483647".to_string(),
                },
                &mut ScriptedDice::new(&[5]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RulesError::Formula(DiceError::TotalOutOfRange(_))
        ));
    }
}
