//! SheetSession - the host side of the rules pipeline.
//!
//! A session owns one character snapshot, a dice source and the rules
//! engine. Every action is resolved against the snapshot and its effects are
//! committed in one step, so a rejected action never leaves the character
//! half-updated. When an action stops for a choice, the session remembers it
//! until [`SheetSession::resume`] answers it or another action replaces it.

use crate::actor::Actor;
use crate::config::{ConfigError, RulesConfig};
use crate::dice::{DiceSource, RandomDice};
use crate::rules::{
    apply_effects, ActionRequest, ChoiceAnswer, Intent, PendingChoice, Resolution, RulesEngine,
    RulesError,
};
use crate::sheet::SheetView;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from SheetSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No choice is pending")]
    NoPendingChoice,
}

/// A character sheet being played.
pub struct SheetSession<D = RandomDice> {
    actor: Actor,
    engine: RulesEngine,
    dice: D,
    pending: Option<PendingChoice>,
}

impl SheetSession<RandomDice> {
    /// Session with default rules and thread-local randomness.
    pub fn new(actor: Actor) -> Self {
        Self::with_dice(actor, RandomDice::new())
    }

    /// Load a character from a JSON snapshot.
    pub fn from_snapshot(json: &str) -> Result<Self, SessionError> {
        Ok(Self::new(Actor::from_json(json)?))
    }
}

impl<D: DiceSource> SheetSession<D> {
    pub fn with_dice(actor: Actor, dice: D) -> Self {
        Self {
            actor,
            engine: RulesEngine::new(),
            dice,
            pending: None,
        }
    }

    /// Replace the rules constants.
    pub fn with_config(mut self, config: RulesConfig) -> Result<Self, SessionError> {
        config.validate()?;
        self.engine = RulesEngine::with_config(config);
        Ok(self)
    }

    /// Resolve an intent and commit its effects.
    ///
    /// Starting a new action drops any unanswered choice.
    pub fn perform(&mut self, intent: Intent) -> Result<Resolution, SessionError> {
        if let Some(dropped) = self.pending.take() {
            debug!(choice = ?dropped, "pending choice superseded");
        }

        let resolution = self.engine.resolve(&self.actor, intent, &mut self.dice)?;
        apply_effects(&mut self.actor, &resolution.effects);

        if let Some(choice) = resolution.pending_choice() {
            debug!(actor = %self.actor.id, ?choice, "waiting for choice");
            self.pending = Some(choice.clone());
        }
        Ok(resolution)
    }

    /// Convert a wire request and perform it.
    pub fn request(&mut self, request: ActionRequest) -> Result<Resolution, SessionError> {
        let intent = request.into_intent()?;
        self.perform(intent)
    }

    /// Answer the pending choice and continue the action.
    ///
    /// An answer that does not fit leaves the choice pending.
    pub fn resume(&mut self, answer: ChoiceAnswer) -> Result<Resolution, SessionError> {
        let choice = self.pending.as_ref().ok_or(SessionError::NoPendingChoice)?;
        let intent = choice.resume(answer)?;
        info!(actor = %self.actor.id, ?answer, "choice answered");
        self.perform(intent)
    }

    /// Drop the pending choice without acting on it.
    pub fn cancel(&mut self) -> Option<PendingChoice> {
        self.pending.take()
    }

    pub fn pending_choice(&self) -> Option<&PendingChoice> {
        self.pending.as_ref()
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn engine(&self) -> &RulesEngine {
        &self.engine
    }

    pub fn dice(&self) -> &D {
        &self.dice
    }

    pub fn dice_mut(&mut self) -> &mut D {
        &mut self.dice
    }

    /// Display-ready view of the character.
    pub fn sheet(&self) -> SheetView {
        SheetView::new(&self.actor, self.engine.config())
    }

    pub fn snapshot(&self) -> Result<String, SessionError> {
        Ok(self.actor.to_json()?)
    }

    pub fn into_actor(self) -> Actor {
        self.actor
    }
}
