//! Dice formula evaluation.
//!
//! Supports the notation used on the character sheet: `XdY+Z`, per-term
//! keep highest/lowest (`4d6kh3`), and keep-highest groups such as
//! `{d8,d6}kh` where the best component counts toward the total.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on dice drawn by a single term.
pub const MAX_DICE_PER_TERM: u32 = 100;

/// Largest die a formula may name.
pub const MAX_DIE_SIDES: u32 = 1_000_000;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Cannot keep {keep} dice when only rolling {count} (in {notation})")]
    InvalidKeepCount {
        keep: u32,
        count: u32,
        notation: String,
    },
    #[error("Too many dice in {notation}: {count} (limit {MAX_DICE_PER_TERM})")]
    TooManyDice { count: u32, notation: String },
    #[error("Unbalanced group in {0}")]
    UnbalancedGroup(String),
    #[error("Total of {0} is out of range")]
    TotalOutOfRange(String),
}

/// Anything that can produce a uniformly distributed face for a die.
pub trait DiceSource {
    /// Draw a face in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl<D: DiceSource + ?Sized> DiceSource for &mut D {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

/// Production dice backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomDice<R = ThreadRng> {
    rng: R,
}

impl RandomDice<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomDice<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomDice<StdRng> {
    /// Reproducible dice for replays and simulations.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomDice<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DiceSource for RandomDice<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides)
    }
}

/// Which dice of a term survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keep {
    Highest(u32),
    Lowest(u32),
}

/// `NdS` with an optional keep rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceComponent {
    pub count: u32,
    pub sides: u32,
    pub keep: Option<Keep>,
}

/// One additive piece of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Dice(DiceComponent),
    Flat(i32),
    /// `{a,b,...}kh`: every component is rolled, the best one counts.
    KeepHighestGroup(Vec<Term>),
}

/// A term together with the sign it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTerm {
    pub sign: i32,
    pub term: Term,
}

/// A complete dice expression (e.g., `2d6+3`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub terms: Vec<SignedTerm>,
    pub original: String,
}

impl DiceExpression {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation: String = notation
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut terms = Vec::new();
        let mut current = String::new();
        let mut sign: i32 = 1;
        let mut depth: u32 = 0;

        for ch in notation.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    current.push(ch);
                }
                '}' => {
                    if depth == 0 {
                        return Err(DiceError::UnbalancedGroup(notation.clone()));
                    }
                    depth -= 1;
                    current.push(ch);
                }
                '+' | '-' if depth == 0 => {
                    if current.is_empty() {
                        // Leading sign or doubled operator.
                        if !terms.is_empty() {
                            return Err(DiceError::InvalidNotation(notation.clone()));
                        }
                    } else {
                        terms.push(SignedTerm {
                            sign,
                            term: Self::parse_term(&current)?,
                        });
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                _ => current.push(ch),
            }
        }

        if depth != 0 {
            return Err(DiceError::UnbalancedGroup(notation));
        }
        if current.is_empty() {
            // Trailing operator.
            return Err(DiceError::InvalidNotation(notation));
        }
        terms.push(SignedTerm {
            sign,
            term: Self::parse_term(&current)?,
        });

        Ok(DiceExpression {
            terms,
            original: notation,
        })
    }

    fn parse_term(s: &str) -> Result<Term, DiceError> {
        if let Some(inner) = s.strip_prefix('{') {
            let close = inner
                .rfind('}')
                .ok_or_else(|| DiceError::UnbalancedGroup(s.to_string()))?;
            let suffix = &inner[close + 1..];
            if suffix != "kh" && suffix != "kh1" {
                return Err(DiceError::InvalidNotation(s.to_string()));
            }
            let body = &inner[..close];
            if body.contains('{') || body.contains('}') {
                return Err(DiceError::UnbalancedGroup(s.to_string()));
            }
            let components = body
                .split(',')
                .map(|part| {
                    if part.is_empty() {
                        Err(DiceError::InvalidNotation(s.to_string()))
                    } else {
                        Self::parse_simple(part)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Term::KeepHighestGroup(components));
        }

        Self::parse_simple(s)
    }

    fn parse_simple(s: &str) -> Result<Term, DiceError> {
        let Some(d_pos) = s.find('d') else {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            return Ok(Term::Flat(value));
        };

        let count_str = &s[..d_pos];
        let rest = &s[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
        };
        if count == 0 {
            return Err(DiceError::InvalidNotation(s.to_string()));
        }
        if count > MAX_DICE_PER_TERM {
            return Err(DiceError::TooManyDice {
                count,
                notation: s.to_string(),
            });
        }

        let (sides_str, keep) = if let Some(kh_pos) = rest.find("kh") {
            let keep = Self::parse_keep(&rest[kh_pos + 2..], s)?;
            (&rest[..kh_pos], Some(Keep::Highest(keep)))
        } else if let Some(kl_pos) = rest.find("kl") {
            let keep = Self::parse_keep(&rest[kl_pos + 2..], s)?;
            (&rest[..kl_pos], Some(Keep::Lowest(keep)))
        } else {
            (rest, None)
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        if sides == 0 || sides > MAX_DIE_SIDES {
            return Err(DiceError::InvalidDieSize(sides));
        }

        if let Some(Keep::Highest(keep) | Keep::Lowest(keep)) = keep {
            if keep > count {
                return Err(DiceError::InvalidKeepCount {
                    keep,
                    count,
                    notation: s.to_string(),
                });
            }
        }

        Ok(Term::Dice(DiceComponent { count, sides, keep }))
    }

    /// `kh` alone keeps one die.
    fn parse_keep(digits: &str, s: &str) -> Result<u32, DiceError> {
        if digits.is_empty() {
            return Ok(1);
        }
        digits
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))
    }

    /// Roll the expression with thread-local randomness.
    pub fn roll(&self) -> Result<RollOutcome, DiceError> {
        self.roll_with(&mut RandomDice::new())
    }

    /// Roll with a specific RNG (useful for seeded runs).
    pub fn roll_with_rng<R: Rng>(&self, rng: R) -> Result<RollOutcome, DiceError> {
        self.roll_with(&mut RandomDice::from_rng(rng))
    }

    /// Roll drawing every die from `dice`.
    ///
    /// Fails when the total does not fit an `i32`.
    pub fn roll_with<D: DiceSource + ?Sized>(
        &self,
        dice: &mut D,
    ) -> Result<RollOutcome, DiceError> {
        let mut components = Vec::new();
        let mut total: i64 = 0;

        for signed in &self.terms {
            let value = Self::roll_term(&signed.term, dice, &mut components);
            total = total
                .checked_add(i64::from(signed.sign) * value)
                .ok_or_else(|| self.out_of_range())?;
        }
        let total = i32::try_from(total).map_err(|_| self.out_of_range())?;

        let dice_results = components
            .iter()
            .flat_map(|c| c.rolls.iter().copied())
            .collect();

        Ok(RollOutcome {
            formula: self.original.clone(),
            total,
            dice: dice_results,
            components,
        })
    }

    fn out_of_range(&self) -> DiceError {
        DiceError::TotalOutOfRange(self.original.clone())
    }

    /// Dice count and sides are bounded at parse time, so a term always
    /// fits an `i64`.
    fn roll_term<D: DiceSource + ?Sized>(
        term: &Term,
        dice: &mut D,
        components: &mut Vec<ComponentResult>,
    ) -> i64 {
        match term {
            Term::Flat(value) => i64::from(*value),
            Term::Dice(component) => {
                let result = Self::roll_component(component, dice);
                let subtotal = i64::from(result.subtotal);
                components.push(result);
                subtotal
            }
            Term::KeepHighestGroup(members) => members
                .iter()
                .map(|member| Self::roll_term(member, dice, components))
                .max()
                .unwrap_or(0),
        }
    }

    fn roll_component<D: DiceSource + ?Sized>(
        component: &DiceComponent,
        dice: &mut D,
    ) -> ComponentResult {
        let rolls: Vec<u32> = (0..component.count)
            .map(|_| dice.roll_die(component.sides))
            .collect();

        let kept = match component.keep {
            Some(Keep::Highest(keep)) => {
                let mut sorted = rolls.clone();
                sorted.sort_by(|a, b| b.cmp(a));
                sorted.truncate(keep as usize);
                sorted
            }
            Some(Keep::Lowest(keep)) => {
                let mut sorted = rolls.clone();
                sorted.sort();
                sorted.truncate(keep as usize);
                sorted
            }
            None => rolls.clone(),
        };

        ComponentResult {
            sides: component.sides,
            // Bounded by MAX_DICE_PER_TERM * MAX_DIE_SIDES.
            subtotal: kept.iter().sum(),
            rolls,
            kept,
        }
    }

    /// Number of dice this expression draws when rolled.
    pub fn dice_count(&self) -> u32 {
        fn count(term: &Term) -> u32 {
            match term {
                Term::Flat(_) => 0,
                Term::Dice(c) => c.count,
                Term::KeepHighestGroup(members) => members.iter().map(count).sum(),
            }
        }
        self.terms.iter().map(|t| count(&t.term)).sum()
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Result of rolling a single `NdS` component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub sides: u32,
    pub rolls: Vec<u32>,
    pub kept: Vec<u32>,
    pub subtotal: u32,
}

/// The evaluated roll. Produced once per resolution and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub formula: String,
    pub total: i32,
    /// Every die drawn, in formula order, including dice that were not kept.
    pub dice: Vec<u32>,
    pub components: Vec<ComponentResult>,
}

impl RollOutcome {
    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        self.components
            .iter()
            .map(|c| {
                let mut kept_used = vec![false; c.kept.len()];
                let shown: Vec<String> = c
                    .rolls
                    .iter()
                    .map(|&roll| {
                        let slot = c
                            .kept
                            .iter()
                            .enumerate()
                            .position(|(i, &k)| k == roll && !kept_used[i]);
                        match slot {
                            Some(i) => {
                                kept_used[i] = true;
                                roll.to_string()
                            }
                            None => format!("({roll})"),
                        }
                    })
                    .collect();
                format!("[{}]", shown.join(", "))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} = {}", self.formula, self.dice_display(), self.total)
    }
}

/// Convenience function to roll dice from a notation string.
pub fn roll(notation: &str) -> Result<RollOutcome, DiceError> {
    DiceExpression::parse(notation)?.roll()
}

/// Parse and roll against an explicit dice source.
pub fn roll_with<D: DiceSource + ?Sized>(
    notation: &str,
    dice: &mut D,
) -> Result<RollOutcome, DiceError> {
    DiceExpression::parse(notation)?.roll_with(dice)
}
