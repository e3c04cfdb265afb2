//! Bounded numeric ranges for attributes.

use serde::{Deserialize, Serialize};

/// Lowest value an attribute may display.
pub const ATTRIBUTE_MIN: i32 = 0;

/// Highest value an attribute may display or advance to.
pub const ATTRIBUTE_LIMIT: i32 = 18;

/// A `{value, max}` pair as stored for health, body and mind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub value: i32,
    pub max: i32,
}

impl Pool {
    pub fn new(value: i32, max: i32) -> Self {
        Self { value, max }
    }

    /// A pool filled to its maximum.
    pub fn full(max: i32) -> Self {
        Self { value: max, max }
    }

    pub fn is_full(&self) -> bool {
        self.value >= self.max
    }

    /// Value after adding `amount`, capped at `max`.
    pub fn restored_by(&self, amount: i32) -> i32 {
        self.value.saturating_add(amount).min(self.max)
    }

    /// Clamp both sides to the default attribute range.
    pub fn clamped(&self) -> Pool {
        clamp_pair(self.value, self.max, ATTRIBUTE_MIN, ATTRIBUTE_LIMIT)
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::full(0)
    }
}

/// Clamp `value` into `[min, limit]`.
///
/// An inverted range collapses to `min`.
pub fn clamp_value(value: i32, min: i32, limit: i32) -> i32 {
    value.min(limit).max(min)
}

/// Clamp into the default attribute range `[0, 18]`.
pub fn clamp_attribute(value: i32) -> i32 {
    clamp_value(value, ATTRIBUTE_MIN, ATTRIBUTE_LIMIT)
}

/// Clamp `value` and `max` independently.
///
/// No ordering is enforced between the two: a value above max stays above it
/// as long as both fit the range.
pub fn clamp_pair(value: i32, max: i32, min: i32, limit: i32) -> Pool {
    Pool {
        value: clamp_value(value, min, limit),
        max: clamp_value(max, min, limit),
    }
}
