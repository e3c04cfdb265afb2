//! Character state.
//!
//! The actor is a plain snapshot: the rules engine reads it and produces
//! effects, and the host commits those effects with
//! [`apply_effects`](crate::rules::apply_effects).

use crate::clamp::Pool;
use crate::items::{total_gear_weight, Item, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// The three attributes a character saves and advances with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Body,
    Mind,
    Luck,
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Body => "body",
            Attribute::Mind => "mind",
            Attribute::Luck => "luck",
        }
    }

    /// Localization key of the long attribute name.
    pub fn label_key(&self) -> String {
        format!("SAB.character.{}.long", self.name())
    }

    /// Advancement order.
    pub fn all() -> [Attribute; 3] {
        [Attribute::Body, Attribute::Mind, Attribute::Luck]
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error for attribute names outside `body`, `mind`, `luck`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown attribute: {0}")]
pub struct UnknownAttribute(pub String);

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "body" => Ok(Attribute::Body),
            "mind" => Ok(Attribute::Mind),
            "luck" => Ok(Attribute::Luck),
            _ => Err(UnknownAttribute(s.to_string())),
        }
    }
}

/// The value pools a rest can refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    Health,
    Body,
    Mind,
}

impl PoolKind {
    pub fn name(&self) -> &'static str {
        match self {
            PoolKind::Health => "health",
            PoolKind::Body => "body",
            PoolKind::Mind => "mind",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub trigger: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginAnswer {
    pub title: String,
    pub description: String,
}

/// The origin question a character answered at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub question: String,
    pub answer: OriginAnswer,
}

/// Scalar character attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    /// Soft range 0-18; only clamped for display.
    pub luck: i32,
    pub inv_slots: i32,
    pub gold: i32,
    pub is_deprived: bool,
    #[serde(default)]
    pub archetype: Archetype,
    #[serde(default)]
    pub origin: Origin,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            luck: 0,
            inv_slots: 10,
            gold: 0,
            is_deprived: false,
            archetype: Archetype::default(),
            origin: Origin::default(),
        }
    }
}

// ============================================================================
// Actor
// ============================================================================

/// A player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub attributes: Attributes,
    pub health: Pool,
    pub body: Pool,
    pub mind: Pool,
    /// Armor rating, kept in `[-3, 3]`.
    pub ar: i32,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            attributes: Attributes::default(),
            health: Pool::default(),
            body: Pool::default(),
            mind: Pool::default(),
            ar: 0,
            items: Vec::new(),
        }
    }

    pub fn with_health(mut self, value: i32, max: i32) -> Self {
        self.health = Pool::new(value, max);
        self
    }

    pub fn with_body(mut self, value: i32, max: i32) -> Self {
        self.body = Pool::new(value, max);
        self
    }

    pub fn with_mind(mut self, value: i32, max: i32) -> Self {
        self.mind = Pool::new(value, max);
        self
    }

    pub fn with_luck(mut self, luck: i32) -> Self {
        self.attributes.luck = luck;
        self
    }

    pub fn with_inv_slots(mut self, slots: i32) -> Self {
        self.attributes.inv_slots = slots;
        self
    }

    pub fn with_deprived(mut self, deprived: bool) -> Self {
        self.attributes.is_deprived = deprived;
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Current value an attribute save is rolled against.
    pub fn attribute_value(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Body => self.body.value,
            Attribute::Mind => self.mind.value,
            Attribute::Luck => self.attributes.luck,
        }
    }

    /// The cap an advancement roll must beat.
    pub fn advancement_threshold(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Body => self.body.max,
            Attribute::Mind => self.mind.max,
            Attribute::Luck => self.attributes.luck,
        }
    }

    pub fn pool(&self, kind: PoolKind) -> &Pool {
        match kind {
            PoolKind::Health => &self.health,
            PoolKind::Body => &self.body,
            PoolKind::Mind => &self.mind,
        }
    }

    pub fn pool_mut(&mut self, kind: PoolKind) -> &mut Pool {
        match kind {
            PoolKind::Health => &mut self.health,
            PoolKind::Body => &mut self.body,
            PoolKind::Mind => &mut self.mind,
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn gear_weight(&self) -> i32 {
        total_gear_weight(&self.items)
    }

    pub fn fatigue_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_fatigue()).count()
    }

    /// Inventory slots left after carried gear; negative when overloaded.
    pub fn free_slots(&self) -> i32 {
        self.attributes.inv_slots - self.gear_weight()
    }

    pub fn is_overburdened(&self) -> bool {
        self.gear_weight() >= self.attributes.inv_slots
    }

    /// Serialize to a JSON snapshot.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A rested fighter-type character for tests and demos.
pub fn create_sample_character(name: &str) -> Actor {
    Actor::new(name)
        .with_health(6, 6)
        .with_body(14, 14)
        .with_mind(10, 10)
        .with_luck(8)
        .with_inv_slots(10)
}
