//! Display preparation for the character sheet.
//!
//! Stored values are never clamped; the view clamps pools, luck and armor to
//! their display ranges and groups the inventory by kind.

use crate::actor::Actor;
use crate::clamp::{clamp_pair, clamp_value, Pool, ATTRIBUTE_MIN};
use crate::config::RulesConfig;
use crate::items::{Item, ItemId, ItemKind};
use serde::Serialize;
use std::cmp::Ordering;

/// One inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub formula: Option<String>,
    pub quantity: Option<u32>,
    pub weight: i32,
    pub is_fatigue: bool,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            formula: item.formula(),
            quantity: item.quantity(),
            weight: item.weight(),
            is_fatigue: item.is_fatigue(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetView {
    pub name: String,
    pub health: Pool,
    pub body: Pool,
    pub mind: Pool,
    pub luck: i32,
    pub ar: i32,
    pub gold: i32,
    pub inv_slots: i32,
    pub weight: i32,
    pub is_overburdened: bool,
    pub is_deprived: bool,
    pub gear: Vec<ItemView>,
    pub features: Vec<ItemView>,
    pub spells: Vec<ItemView>,
}

/// Manual sort order; unsorted (`0`) items go last, ties keep their order.
fn display_order(a: &&Item, b: &&Item) -> Ordering {
    match (a.sort, b.sort) {
        (0, 0) => Ordering::Equal,
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        (x, y) => x.cmp(&y),
    }
}

fn rows<'a>(items: impl Iterator<Item = &'a Item>) -> Vec<ItemView> {
    let mut sorted: Vec<&Item> = items.collect();
    sorted.sort_by(display_order);
    sorted.into_iter().map(ItemView::from).collect()
}

impl SheetView {
    pub fn new(actor: &Actor, config: &RulesConfig) -> Self {
        let limit = config.attribute_limit;
        let pool = |p: &Pool| clamp_pair(p.value, p.max, ATTRIBUTE_MIN, limit);

        Self {
            name: actor.name.clone(),
            health: pool(&actor.health),
            body: pool(&actor.body),
            mind: pool(&actor.mind),
            luck: clamp_value(actor.attributes.luck, ATTRIBUTE_MIN, limit),
            ar: clamp_value(actor.ar, config.armor_min, config.armor_max),
            gold: actor.attributes.gold,
            inv_slots: actor.attributes.inv_slots,
            weight: actor.gear_weight(),
            is_overburdened: actor.is_overburdened(),
            is_deprived: actor.attributes.is_deprived,
            gear: rows(actor.items.iter().filter(|i| i.is_gear())),
            features: rows(
                actor
                    .items
                    .iter()
                    .filter(|i| matches!(i.kind, ItemKind::Feature(_))),
            ),
            spells: rows(actor.items.iter().filter(|i| matches!(i.kind, ItemKind::Spell))),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
