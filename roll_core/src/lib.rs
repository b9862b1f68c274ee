//! roll_core - Dice formulas for the Arknights tabletop system
//!
//! Formulas such as `"2d6 + @att.value"` or `"@diceNumber@att.die"` are
//! resolved against a [`RollContext`], parsed into a [`Formula`] and rolled
//! with any `rand::Rng` into a [`Roll`].
//!
//! ```rust
//! use roll_core::{Roll, RollContext};
//! use serde_json::json;
//!
//! let mut context = RollContext::new();
//! context.insert("lvl", json!(2));
//! let roll = Roll::evaluate("1d6 + @lvl", &context, &mut rand::thread_rng()).unwrap();
//! assert!(roll.total >= 3.0 && roll.total <= 8.0);
//! ```

mod context;
mod formula;
mod roll;

pub use context::RollContext;
pub use formula::{replace_formula_data, Expr, Formula, Keep, Op};
pub use roll::{DiceResult, DieRoll, Roll};

use thiserror::Error;

/// Maximum number of dice a single term may roll
pub const MAX_DICE: u32 = 1000;

/// Maximum nesting of groups, signs and operator chains in a formula
pub const MAX_DEPTH: usize = 256;

/// Error resolving, parsing or rolling a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RollError {
    #[error("Empty dice formula")]
    Empty,
    #[error("Unexpected '{token}' at position {position} in '{formula}'")]
    UnexpectedToken {
        token: String,
        position: usize,
        formula: String,
    },
    #[error("Unexpected end of formula '{0}'")]
    UnexpectedEnd(String),
    #[error("Unresolved reference: @{0}")]
    UnresolvedReference(String),
    #[error("Reference @{0} is not a number or string")]
    NonScalarReference(String),
    #[error("Invalid dice count: {0}")]
    InvalidDiceCount(f64),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(f64),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Formula nests deeper than {0} levels")]
    TooDeep(usize),
}
