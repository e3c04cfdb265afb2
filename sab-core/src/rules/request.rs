//! Loosely typed action requests, as sent by a sheet front end.
//!
//! Attribute names arrive as strings and every parameter is optional on the
//! wire. Conversion into [`Intent`] is where unknown names and missing
//! parameters are rejected.

use super::{Intent, RulesError};
use crate::actor::Attribute;
use crate::items::ItemId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(
        default,
        alias = "chosenAttribute",
        skip_serializing_if = "Option::is_none"
    )]
    pub chosen_attribute: Option<String>,
    #[serde(default, alias = "powerLevel", skip_serializing_if = "Option::is_none")]
    pub power_level: Option<i32>,
    #[serde(default, alias = "spellId", skip_serializing_if = "Option::is_none")]
    pub spell_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_chosen_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.chosen_attribute = Some(attribute.into());
        self
    }

    pub fn with_power_level(mut self, level: i32) -> Self {
        self.power_level = Some(level);
        self
    }

    pub fn with_spell(mut self, spell_id: ItemId) -> Self {
        self.spell_id = Some(spell_id);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Convert into a typed intent.
    pub fn into_intent(self) -> Result<Intent, RulesError> {
        Intent::try_from(self)
    }
}

fn parse_attribute(raw: &str) -> Result<Attribute, RulesError> {
    raw.parse()
        .map_err(|_| RulesError::InvalidAttribute(raw.to_string()))
}

fn require<T>(value: Option<T>, action: &'static str, field: &'static str) -> Result<T, RulesError> {
    value.ok_or(RulesError::MissingField { action, field })
}

impl TryFrom<ActionRequest> for Intent {
    type Error = RulesError;

    fn try_from(req: ActionRequest) -> Result<Self, Self::Error> {
        let intent = match req.action.as_str() {
            "attribute-save" => {
                let raw = require(req.attribute, "attribute-save", "attribute")?;
                Intent::AttributeSave {
                    attribute: parse_attribute(&raw)?,
                    formula: require(req.formula, "attribute-save", "formula")?,
                }
            }
            "short-rest" => Intent::ShortRest {
                formula: require(req.formula, "short-rest", "formula")?,
            },
            "long-rest" => Intent::LongRest {
                formula: require(req.formula, "long-rest", "formula")?,
                attribute: req
                    .chosen_attribute
                    .as_deref()
                    .map(parse_attribute)
                    .transpose()?,
            },
            "full-rest" => Intent::FullRest,
            "prepare-spell" => Intent::PrepareSpell {
                spell_id: req.spell_id,
            },
            "cast-spell" => Intent::CastSpell {
                spell_id: req.spell_id,
                power_level: require(req.power_level, "cast-spell", "power_level")?,
            },
            "advance" => Intent::Advance,
            "roll-new-character" => Intent::RollNewCharacter,
            "roll-formula" => Intent::RollFormula {
                formula: require(req.formula, "roll-formula", "formula")?,
                label: req.label.unwrap_or_default(),
            },
            _ => return Err(RulesError::UnknownAction(req.action)),
        };
        Ok(intent)
    }
}
