//! Spellburn & Battlescars character sheet rules engine.
//!
//! This crate provides:
//! - Dice formula evaluation with keep-highest groups
//! - Attribute saves, rests, spellcasting and advancement
//! - Intent/Effect rules system for deterministic character state
//! - A session host that commits effects and tracks pending choices
//!
//! # Quick Start
//!
//! ```no_run
//! use sab_core::{create_sample_character, ChoiceAnswer, Intent, SheetSession};
//!
//! fn main() -> Result<(), sab_core::SessionError> {
//!     let mut session = SheetSession::new(create_sample_character("Vell"));
//!
//!     let prepared = session.perform(Intent::PrepareSpell { spell_id: None })?;
//!     if prepared.pending_choice().is_some() {
//!         let cast = session.resume(ChoiceAnswer::PowerLevel(2))?;
//!         println!("{:?} {:?}", cast.outcome, cast.notices);
//!     }
//!
//!     println!("{}", session.snapshot()?);
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod clamp;
pub mod config;
pub mod dice;
pub mod items;
pub mod rules;
pub mod session;
pub mod sheet;
pub mod testing;

// Primary public API
pub use actor::{create_sample_character, Actor, ActorId, Attribute, PoolKind};
pub use config::{ConfigError, RulesConfig};
pub use dice::{DiceError, DiceExpression, DiceSource, RandomDice, RollOutcome};
pub use items::{GearType, Item, ItemId, NewItemKind};
pub use rules::{
    apply_effects, ActionRequest, ChoiceAnswer, Effect, Intent, Notice, Outcome, PendingChoice,
    Resolution, RulesEngine, RulesError,
};
pub use session::{SessionError, SheetSession};
pub use sheet::SheetView;
pub use testing::{ScriptedDice, TestHarness};
