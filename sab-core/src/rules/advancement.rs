//! Advancement contests.
//!
//! Each attribute below the cap gets one d20; beating the current cap means
//! the attribute may be raised. The engine only reports the contests, the
//! increase itself is a manual edit afterwards.

use super::{Outcome, Resolution, RulesEngine, RulesError};
use crate::actor::{Actor, Attribute};
use crate::dice::DiceSource;
use serde::{Deserialize, Serialize};

/// One attribute's contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancementResult {
    pub attribute: Attribute,
    pub rolled: i32,
    pub threshold: i32,
    pub success: bool,
}

/// All contests of an advancement session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdvancementSummary {
    pub results: Vec<AdvancementResult>,
    /// Set when no rolled attribute succeeded.
    pub no_advancement: bool,
}

impl AdvancementSummary {
    pub fn from_results(results: Vec<AdvancementResult>) -> Self {
        let no_advancement = results.iter().all(|r| !r.success);
        Self {
            results,
            no_advancement,
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.results.iter().filter(|r| r.success).map(|r| r.attribute)
    }

    /// Localization keys of the summary lines, in display order.
    pub fn message_keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["SAB.advance.attribute-chat-summary"];
        if self.no_advancement {
            keys.push("SAB.advance.no-advancement");
        }
        keys.push("SAB.advance.increase-hp");
        keys.push("SAB.advance.tip");
        keys
    }
}

/// Attributes still below `limit`, in body, mind, luck order.
pub fn eligible_attributes(actor: &Actor, limit: i32) -> Vec<Attribute> {
    Attribute::all()
        .into_iter()
        .filter(|attr| actor.advancement_threshold(*attr) < limit)
        .collect()
}

impl RulesEngine {
    pub(super) fn resolve_advance<D: DiceSource + ?Sized>(
        &self,
        actor: &Actor,
        dice: &mut D,
    ) -> Result<Resolution, RulesError> {
        let mut results = Vec::new();
        let mut rolls = Vec::new();

        for attribute in eligible_attributes(actor, self.config.attribute_limit) {
            let (roll, rolled) = self.roll(
                &self.config.advancement_formula,
                format!("advancement: {attribute}"),
                dice,
            )?;
            let threshold = actor.advancement_threshold(attribute);
            results.push(AdvancementResult {
                attribute,
                rolled: roll.total,
                threshold,
                success: roll.total > threshold,
            });
            rolls.push(rolled);
        }

        Ok(
            Resolution::new(Outcome::Advancement(AdvancementSummary::from_results(results)))
                .with_effects(rolls),
        )
    }
}
