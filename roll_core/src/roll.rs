//! Rolling a parsed formula

use crate::context::RollContext;
use crate::formula::{Expr, Formula, Keep, Op};
use crate::{RollError, MAX_DEPTH, MAX_DICE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One die thrown as part of a dice term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieRoll {
    pub result: u32,
    /// False when dropped by a keep modifier
    pub active: bool,
}

/// Outcome of a single `NdM` term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceResult {
    pub number: u32,
    pub faces: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<Keep>,
    pub results: Vec<DieRoll>,
    /// Sum of the active dice
    pub total: u64,
}

impl DiceResult {
    fn render(&self) -> String {
        let rolls: Vec<String> = self
            .results
            .iter()
            .map(|r| {
                if r.active {
                    r.result.to_string()
                } else {
                    format!("~{}", r.result)
                }
            })
            .collect();
        let keep = self.keep.map(|k| k.to_string()).unwrap_or_default();
        format!("{}d{}{}[{}]", self.number, self.faces, keep, rolls.join(", "))
    }
}

/// An evaluated formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roll {
    /// Formula as written, references included
    pub formula: String,
    /// Formula after reference substitution
    pub resolved: String,
    /// Every dice term in evaluation order
    pub dice: Vec<DiceResult>,
    /// Expression with each dice term replaced by its results
    pub rendered: String,
    pub total: f64,
}

impl Roll {
    /// Resolve `formula` against `context` and roll it
    pub fn evaluate<R: Rng>(
        formula: &str,
        context: &RollContext,
        rng: &mut R,
    ) -> Result<Self, RollError> {
        let parsed = Formula::resolve(formula, context)?;
        let mut roll = parsed.roll(rng)?;
        roll.formula = formula.to_string();
        Ok(roll)
    }

    /// Breakdown for display, e.g. `1d6[4] + 2 = 6`
    pub fn breakdown(&self) -> String {
        format!("{} = {}", self.rendered, self.total)
    }

    /// Number of dice thrown, dropped ones included
    pub fn dice_count(&self) -> usize {
        self.dice.iter().map(|d| d.results.len()).sum()
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.breakdown())
    }
}

impl Formula {
    /// Roll every dice term and compute the total
    pub fn roll<R: Rng>(&self, rng: &mut R) -> Result<Roll, RollError> {
        let mut dice = Vec::new();
        let (total, rendered) = eval(&self.expr, rng, &mut dice, 0)?;
        tracing::debug!(formula = %self.source, total, "rolled formula");
        Ok(Roll {
            formula: self.source.clone(),
            resolved: self.source.clone(),
            dice,
            rendered,
            total,
        })
    }
}

/// Bound for trees built by hand. Parsed formulas stay well inside it.
const MAX_EVAL_DEPTH: usize = 4 * MAX_DEPTH;

fn eval<R: Rng>(
    expr: &Expr,
    rng: &mut R,
    dice: &mut Vec<DiceResult>,
    depth: usize,
) -> Result<(f64, String), RollError> {
    if depth > MAX_EVAL_DEPTH {
        return Err(RollError::TooDeep(MAX_EVAL_DEPTH));
    }
    let depth = depth + 1;
    match expr {
        Expr::Number(n) => Ok((*n, n.to_string())),
        Expr::Neg(inner) => {
            let (value, text) = eval(inner, rng, dice, depth)?;
            Ok((-value, format!("-{}", text)))
        }
        Expr::Group(inner) => {
            let (value, text) = eval(inner, rng, dice, depth)?;
            Ok((value, format!("({})", text)))
        }
        Expr::Binary { op, lhs, rhs } => {
            let (l, l_text) = eval(lhs, rng, dice, depth)?;
            let (r, r_text) = eval(rhs, rng, dice, depth)?;
            let value = match op {
                Op::Add => l + r,
                Op::Sub => l - r,
                Op::Mul => l * r,
                Op::Div => {
                    if r == 0.0 {
                        return Err(RollError::DivisionByZero);
                    }
                    l / r
                }
            };
            Ok((value, format!("{} {} {}", l_text, op.symbol(), r_text)))
        }
        Expr::Dice { count, faces, keep } => {
            let (number, _) = eval(count, rng, dice, depth)?;
            let (sides, _) = eval(faces, rng, dice, depth)?;
            let result = roll_dice(number, sides, *keep, rng)?;
            let text = result.render();
            let total = result.total as f64;
            dice.push(result);
            Ok((total, text))
        }
    }
}

fn roll_dice<R: Rng>(
    number: f64,
    faces: f64,
    keep: Option<Keep>,
    rng: &mut R,
) -> Result<DiceResult, RollError> {
    if number.fract() != 0.0 || number < 0.0 || number > MAX_DICE as f64 {
        return Err(RollError::InvalidDiceCount(number));
    }
    if faces.fract() != 0.0 || faces < 1.0 || faces > u32::MAX as f64 {
        return Err(RollError::InvalidDieSize(faces));
    }
    let number = number as u32;
    let faces = faces as u32;

    let mut results: Vec<DieRoll> = (0..number)
        .map(|_| DieRoll {
            result: rng.gen_range(1..=faces),
            active: true,
        })
        .collect();

    if let Some(keep) = keep {
        let mut order: Vec<usize> = (0..results.len()).collect();
        let kept = match keep {
            Keep::Highest(n) => {
                order.sort_by(|a, b| results[*b].result.cmp(&results[*a].result));
                n
            }
            Keep::Lowest(n) => {
                order.sort_by(|a, b| results[*a].result.cmp(&results[*b].result));
                n
            }
        };
        for &index in order.iter().skip(kept as usize) {
            results[index].active = false;
        }
    }

    let total = results
        .iter()
        .filter(|r| r.active)
        .map(|r| u64::from(r.result))
        .sum();

    Ok(DiceResult {
        number,
        faces,
        keep,
        results,
        total,
    })
}
