//! Items owned by a character: gear, features and spells.
//!
//! Gear carries weight and occupies inventory slots; fatigue is a special
//! kind of gear created by spellcasting and cleared by resting.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Roll formulas
// ============================================================================

lazy_static::lazy_static! {
    /// Dice counts directly before a `d` (`2d6` -> `d6`).
    static ref DICE_COUNT: Regex = Regex::new(r"\d+d").expect("dice count pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern");
}

/// The three sheet fields an item's roll formula is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollSpec {
    /// Shown on the sheet; the formula is driven by `dice_size`.
    pub dice_num: u32,
    pub dice_size: String,
    pub dice_bonus: String,
}

impl RollSpec {
    pub fn new(dice_size: impl Into<String>) -> Self {
        Self {
            dice_num: 1,
            dice_size: dice_size.into(),
            dice_bonus: String::new(),
        }
    }

    pub fn with_bonus(mut self, bonus: impl Into<String>) -> Self {
        self.dice_bonus = bonus.into();
        self
    }

    /// Bonus dice as group members: `1d6 + 1d4` becomes `,d6,d4`.
    pub fn normalized_bonus(&self) -> String {
        let compact = WHITESPACE.replace_all(&self.dice_bonus, "");
        if compact.is_empty() {
            return String::new();
        }
        let counts_removed = DICE_COUNT.replace_all(&compact, "d");
        let listed = counts_removed.replace('+', ",");
        if listed.starts_with(',') {
            listed
        } else {
            format!(",{listed}")
        }
    }

    /// The derived formula: the base die alone, or a keep-highest group of
    /// the base die and every bonus die.
    pub fn formula(&self) -> String {
        let bonus = self.normalized_bonus();
        if bonus.is_empty() {
            self.dice_size.clone()
        } else {
            format!("{{{}{}}}kh", self.dice_size, bonus)
        }
    }
}

impl Default for RollSpec {
    fn default() -> Self {
        Self::new("")
    }
}

// ============================================================================
// Item kinds
// ============================================================================

/// Sub-type of gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GearType {
    Weapon,
    Armor,
    #[default]
    Misc,
    Spell,
    Relic,
    Fatigue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Ability,
    #[default]
    Attack,
}

/// Carried equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gear {
    pub item_type: GearType,
    pub quantity: u32,
    pub weight: i32,
    pub armour_value: u32,
    pub roll: RollSpec,
}

impl Gear {
    pub fn new(item_type: GearType) -> Self {
        Self {
            item_type,
            quantity: 1,
            weight: 1,
            armour_value: 0,
            roll: RollSpec::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub feature_type: FeatureType,
    pub roll: RollSpec,
}

/// The item's type with its type-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    #[serde(rename = "item")]
    Gear(Gear),
    Feature(Feature),
    Spell,
}

/// Which kind of item to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewItemKind {
    Gear(GearType),
    Feature,
    Spell,
}

/// An item owned by a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Manual ordering; `0` means unsorted and is listed last.
    #[serde(default)]
    pub sort: i32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn gear(name: impl Into<String>, item_type: GearType) -> Self {
        Self::with_kind(name, ItemKind::Gear(Gear::new(item_type)))
    }

    pub fn feature(name: impl Into<String>, feature_type: FeatureType) -> Self {
        Self::with_kind(
            name,
            ItemKind::Feature(Feature {
                feature_type,
                roll: RollSpec::default(),
            }),
        )
    }

    pub fn spell(name: impl Into<String>) -> Self {
        Self::with_kind(name, ItemKind::Spell)
    }

    /// A weight-1 fatigue marker.
    pub fn fatigue(name: impl Into<String>) -> Self {
        Self::gear(name, GearType::Fatigue)
    }

    fn with_kind(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            description: String::new(),
            sort: 0,
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        if let ItemKind::Gear(gear) = &mut self.kind {
            gear.weight = weight;
        }
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        if let ItemKind::Gear(gear) = &mut self.kind {
            gear.quantity = quantity;
        }
        self
    }

    pub fn with_roll(mut self, roll: RollSpec) -> Self {
        match &mut self.kind {
            ItemKind::Gear(gear) => gear.roll = roll,
            ItemKind::Feature(feature) => feature.roll = roll,
            ItemKind::Spell => {}
        }
        self
    }

    pub fn with_sort(mut self, sort: i32) -> Self {
        self.sort = sort;
        self
    }

    pub fn is_gear(&self) -> bool {
        matches!(self.kind, ItemKind::Gear(_))
    }

    pub fn is_fatigue(&self) -> bool {
        matches!(
            &self.kind,
            ItemKind::Gear(Gear {
                item_type: GearType::Fatigue,
                ..
            })
        )
    }

    /// Slot weight; only gear counts toward encumbrance.
    pub fn weight(&self) -> i32 {
        match &self.kind {
            ItemKind::Gear(gear) => gear.weight,
            _ => 0,
        }
    }

    pub fn quantity(&self) -> Option<u32> {
        match &self.kind {
            ItemKind::Gear(gear) => Some(gear.quantity),
            _ => None,
        }
    }

    /// The roll formula, if this item has a non-empty one.
    pub fn formula(&self) -> Option<String> {
        let roll = match &self.kind {
            ItemKind::Gear(gear) => &gear.roll,
            ItemKind::Feature(feature) => &feature.roll,
            ItemKind::Spell => return None,
        };
        Some(roll.formula()).filter(|f| !f.is_empty())
    }
}

/// Total weight of carried gear.
pub fn total_gear_weight(items: &[Item]) -> i32 {
    items.iter().map(Item::weight).sum()
}

/// Ids of every fatigue item.
pub fn fatigue_ids(items: &[Item]) -> Vec<ItemId> {
    items
        .iter()
        .filter(|i| i.is_fatigue())
        .map(|i| i.id)
        .collect()
}
