//! Rule constants.
//!
//! Everything the resolvers compare against lives in [`RulesConfig`] so a
//! table can run house rules without touching the engine.

use crate::clamp::ATTRIBUTE_LIMIT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid formula for {field}: {source}")]
    Formula {
        field: &'static str,
        #[source]
        source: crate::dice::DiceError,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Default names given to items the engine creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemNames {
    pub gear: String,
    pub feature: String,
    pub spell: String,
    pub fatigue: String,
}

impl Default for ItemNames {
    fn default() -> Self {
        Self {
            gear: "New Item".to_string(),
            feature: "New Ability".to_string(),
            spell: "New Spell".to_string(),
            fatigue: "Fatigue".to_string(),
        }
    }
}

/// Tunable rule constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// A save total equal to this is a critical failure, whatever the die.
    pub critical_failure_total: i32,

    /// Luck gained on a critical success and lost on a critical failure.
    pub luck_step: i32,

    /// Attributes at or above this cap are not rolled for advancement.
    pub attribute_limit: i32,

    /// Most dice a spell may be cast with.
    pub max_power_level: i32,

    /// Sides of a spellcasting die.
    pub power_die_sides: u32,

    /// Dice strictly above this generate fatigue.
    pub fatigue_threshold: u32,

    /// Spellburn entries above this share the last entry.
    pub spellburn_cap: i32,

    pub advancement_formula: String,

    /// Rolled three times; the results are sorted into luck, mind and body.
    pub attribute_formula: String,

    pub health_formula: String,

    /// Armor rating range accepted by edits and shown on the sheet.
    pub armor_min: i32,
    pub armor_max: i32,

    pub item_names: ItemNames,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            critical_failure_total: 20,
            luck_step: 1,
            attribute_limit: ATTRIBUTE_LIMIT,
            max_power_level: 5,
            power_die_sides: 6,
            fatigue_threshold: 3,
            spellburn_cap: 21,
            advancement_formula: "1d20".to_string(),
            attribute_formula: "2d6+3".to_string(),
            health_formula: "1d6".to_string(),
            armor_min: -3,
            armor_max: 3,
            item_names: ItemNames::default(),
        }
    }
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that formulas parse and ranges are ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, formula) in [
            ("advancement_formula", &self.advancement_formula),
            ("attribute_formula", &self.attribute_formula),
            ("health_formula", &self.health_formula),
        ] {
            crate::dice::DiceExpression::parse(formula)
                .map_err(|source| ConfigError::Formula { field, source })?;
        }

        if self.max_power_level < 1 {
            return Err(ConfigError::InvalidValue {
                field: "max_power_level",
                reason: format!("must be at least 1, got {}", self.max_power_level),
            });
        }
        if self.power_die_sides == 0 {
            return Err(ConfigError::InvalidValue {
                field: "power_die_sides",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.armor_min > self.armor_max {
            return Err(ConfigError::InvalidValue {
                field: "armor_min",
                reason: format!("{} exceeds armor_max {}", self.armor_min, self.armor_max),
            });
        }
        Ok(())
    }

    pub fn with_critical_failure_total(mut self, total: i32) -> Self {
        self.critical_failure_total = total;
        self
    }

    pub fn with_max_power_level(mut self, level: i32) -> Self {
        self.max_power_level = level;
        self
    }

    pub fn with_fatigue_threshold(mut self, threshold: u32) -> Self {
        self.fatigue_threshold = threshold;
        self
    }

    pub fn with_attribute_limit(mut self, limit: i32) -> Self {
        self.attribute_limit = limit;
        self
    }

    pub fn with_item_names(mut self, names: ItemNames) -> Self {
        self.item_names = names;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RulesConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RulesConfig::from_json(r#"{ "max_power_level": 3 }"#).unwrap();
        assert_eq!(config.max_power_level, 3);
        assert_eq!(config.critical_failure_total, 20);
        assert_eq!(config.item_names.fatigue, "Fatigue");
    }

    #[test]
    fn test_rejects_bad_formula() {
        let err = RulesConfig::from_json(r#"{ "health_formula": "1d" }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Formula {
                field: "health_formula",
                ..
            }
        ));
    }

    #[test]
    fn test_builders() {
        let names = ItemNames {
            fatigue: "Weariness".to_string(),
            ..ItemNames::default()
        };
        let config = RulesConfig::new()
            .with_attribute_limit(20)
            .with_fatigue_threshold(4)
            .with_item_names(names);
        assert!(config.validate().is_ok());
        assert_eq!(config.attribute_limit, 20);
        assert_eq!(config.fatigue_threshold, 4);
        assert_eq!(config.item_names.fatigue, "Weariness");
    }

    #[test]
    fn test_rejects_inverted_armor_range() {
        let config = RulesConfig {
            armor_min: 3,
            armor_max: 0,
            ..RulesConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
