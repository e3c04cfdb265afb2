//! Testing utilities for the rules engine.
//!
//! This module provides tools for integration testing:
//! - `ScriptedDice` for deterministic rolls
//! - `TestHarness` for scripted sheet scenarios
//! - Assertion helpers for verifying character state

use crate::actor::{create_sample_character, Actor};
use crate::dice::DiceSource;
use crate::rules::{ChoiceAnswer, Intent, Resolution};
use crate::session::{SessionError, SheetSession};
use std::collections::VecDeque;

/// Dice that return pre-arranged faces in order.
///
/// Running out of faces panics, so a test that rolls more dice than it
/// scripted fails loudly.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u32>,
    rolled: usize,
}

impl ScriptedDice {
    pub fn new(faces: &[u32]) -> Self {
        Self {
            faces: faces.iter().copied().collect(),
            rolled: 0,
        }
    }

    /// Queue more faces behind the remaining ones.
    pub fn push(&mut self, faces: &[u32]) {
        self.faces.extend(faces.iter().copied());
    }

    /// Number of dice drawn so far.
    pub fn rolled(&self) -> usize {
        self.rolled
    }

    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let face = self
            .faces
            .pop_front()
            .unwrap_or_else(|| panic!("scripted dice exhausted after {} rolls", self.rolled));
        assert!(
            (1..=sides).contains(&face),
            "scripted face {face} does not fit a d{sides}"
        );
        self.rolled += 1;
        face
    }
}

/// Test harness for running sheet scenarios.
pub struct TestHarness {
    pub session: SheetSession<ScriptedDice>,
}

impl TestHarness {
    /// Create a new test harness with a sample character.
    pub fn new() -> Self {
        Self::with_actor(create_sample_character("Test Hero"))
    }

    /// Create a test harness with a custom character.
    pub fn with_actor(actor: Actor) -> Self {
        Self {
            session: SheetSession::with_dice(actor, ScriptedDice::default()),
        }
    }

    /// Queue dice faces for the next actions.
    pub fn expect_dice(&mut self, faces: &[u32]) -> &mut Self {
        self.session.dice_mut().push(faces);
        self
    }

    /// Perform an intent and commit its effects.
    pub fn act(&mut self, intent: Intent) -> Result<Resolution, SessionError> {
        self.session.perform(intent)
    }

    /// Answer the pending choice.
    pub fn answer(&mut self, answer: ChoiceAnswer) -> Result<Resolution, SessionError> {
        self.session.resume(answer)
    }

    pub fn actor(&self) -> &Actor {
        self.session.actor()
    }

    /// Dice drawn since the harness was created.
    pub fn dice_rolled(&self) -> usize {
        self.session.dice().rolled()
    }

    /// Current health, body and mind values.
    pub fn pools(&self) -> (i32, i32, i32) {
        let actor = self.actor();
        (actor.health.value, actor.body.value, actor.mind.value)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert health, body and mind current values.
#[track_caller]
pub fn assert_pools(harness: &TestHarness, health: i32, body: i32, mind: i32) {
    assert_eq!(
        harness.pools(),
        (health, body, mind),
        "Expected health/body/mind {health}/{body}/{mind}"
    );
}

#[track_caller]
pub fn assert_luck(harness: &TestHarness, luck: i32) {
    let actual = harness.actor().attributes.luck;
    assert_eq!(actual, luck, "Expected luck {luck}, got {actual}");
}

#[track_caller]
pub fn assert_fatigue(harness: &TestHarness, count: usize) {
    let actual = harness.actor().fatigue_count();
    assert_eq!(actual, count, "Expected {count} fatigue items, got {actual}");
}

/// Assert that every scripted face was used.
#[track_caller]
pub fn assert_dice_spent(harness: &TestHarness) {
    let remaining = harness.session.dice().remaining();
    assert_eq!(remaining, 0, "{remaining} scripted dice were never rolled");
}
