//! Formula text - reference substitution, tokens and the expression tree

use crate::context::RollContext;
use crate::{RollError, MAX_DEPTH};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Replace every `@path` in `formula` with the referenced context value
///
/// Numbers and strings substitute their text, booleans become 1 or 0.
/// Substitution is textual, so `@diceNumber@att.die` can become `5d8`.
pub fn replace_formula_data(formula: &str, context: &RollContext) -> Result<String, RollError> {
    let mut out = String::with_capacity(formula.len());
    let mut chars = formula.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c != '@' {
            out.push(c);
            continue;
        }

        let mut path = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' || next == '.' {
                path.push(next);
                chars.next();
            } else {
                break;
            }
        }

        let key = path.trim_end_matches('.');
        if key.is_empty() {
            return Err(RollError::UnexpectedToken {
                token: "@".to_string(),
                position,
                formula: formula.to_string(),
            });
        }

        let value = context
            .resolve(key)
            .ok_or_else(|| RollError::UnresolvedReference(key.to_string()))?;
        match value {
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::String(s) => out.push_str(s),
            Value::Bool(b) => out.push(if *b { '1' } else { '0' }),
            _ => return Err(RollError::NonScalarReference(key.to_string())),
        }
        out.push_str(&path[key.len()..]);
    }

    Ok(out)
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    pub fn symbol(&self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Div => '/',
        }
    }
}

/// Keep modifier on a dice term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keep {
    Highest(u32),
    Lowest(u32),
}

impl fmt::Display for Keep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keep::Highest(n) => write!(f, "kh{}", n),
            Keep::Lowest(n) => write!(f, "kl{}", n),
        }
    }
}

/// Parsed formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Dice {
        count: Box<Expr>,
        faces: Box<Expr>,
        keep: Option<Keep>,
    },
    Neg(Box<Expr>),
    Group(Box<Expr>),
    Binary {
        op: Op,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Dice { count, faces, keep } => {
                write!(f, "{}d{}", count, faces)?;
                if let Some(keep) = keep {
                    write!(f, "{}", keep)?;
                }
                Ok(())
            }
            Expr::Neg(inner) => write!(f, "-{}", inner),
            Expr::Group(inner) => write!(f, "({})", inner),
            Expr::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
        }
    }
}

/// A formula with all references already substituted
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub source: String,
    pub expr: Expr,
}

impl Formula {
    /// Parse a formula that contains no `@` references
    pub fn parse(source: &str) -> Result<Self, RollError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(RollError::Empty);
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            source,
        };
        let expr = parser.parse_expr()?;
        if let Some((token, position)) = parser.tokens.get(parser.pos) {
            return Err(parser.unexpected(token, *position));
        }
        Ok(Formula {
            source: source.to_string(),
            expr,
        })
    }

    /// Substitute references from `context`, then parse
    pub fn resolve(formula: &str, context: &RollContext) -> Result<Self, RollError> {
        if formula.trim().is_empty() {
            return Err(RollError::Empty);
        }
        Self::parse(&replace_formula_data(formula, context)?)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Die,
    KeepHighest,
    KeepLowest,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Die => write!(f, "d"),
            Token::KeepHighest => write!(f, "kh"),
            Token::KeepLowest => write!(f, "kl"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, RollError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let text = &source[start..i];
                let value = text.parse::<f64>().map_err(|_| RollError::UnexpectedToken {
                    token: text.to_string(),
                    position: start,
                    formula: source.to_string(),
                })?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            b'd' | b'D' => Token::Die,
            b'k' | b'K' => match bytes.get(i + 1).copied() {
                Some(b'h') | Some(b'H') => {
                    i += 1;
                    Token::KeepHighest
                }
                Some(b'l') | Some(b'L') => {
                    i += 1;
                    Token::KeepLowest
                }
                _ => return Err(unexpected_char(source, start)),
            },
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            _ => return Err(unexpected_char(source, start)),
        };
        tokens.push((token, start));
        i += 1;
    }

    Ok(tokens)
}

fn unexpected_char(source: &str, position: usize) -> RollError {
    let token = source[position..]
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_default();
    RollError::UnexpectedToken {
        token,
        position,
        formula: source.to_string(),
    }
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    /// Depth of the tree being built, bounded by MAX_DEPTH
    depth: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn next(&mut self) -> Result<(Token, usize), RollError> {
        let token = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or_else(|| RollError::UnexpectedEnd(self.source.to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    fn unexpected(&self, token: &Token, position: usize) -> RollError {
        RollError::UnexpectedToken {
            token: token.to_string(),
            position,
            formula: self.source.to_string(),
        }
    }

    fn descend(&mut self) -> Result<(), RollError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(RollError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn additive_op(&self) -> Option<Op> {
        match self.peek() {
            Some(Token::Plus) => Some(Op::Add),
            Some(Token::Minus) => Some(Op::Sub),
            _ => None,
        }
    }

    fn multiplicative_op(&self) -> Option<Op> {
        match self.peek() {
            Some(Token::Star) => Some(Op::Mul),
            Some(Token::Slash) => Some(Op::Div),
            _ => None,
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, RollError> {
        let mut lhs = self.parse_term()?;
        let mut chained = 0;
        while let Some(op) = self.additive_op() {
            self.pos += 1;
            // Each operator wraps the left side one level deeper
            self.descend()?;
            chained += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, RollError> {
        let mut lhs = self.parse_unary()?;
        let mut chained = 0;
        while let Some(op) = self.multiplicative_op() {
            self.pos += 1;
            self.descend()?;
            chained += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, RollError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.parse_unary()?;
                self.depth -= 1;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.parse_unary()?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, RollError> {
        let (token, position) = self.next()?;
        let atom = match token {
            Token::Number(n) => Expr::Number(n),
            Token::LParen => self.parse_group()?,
            // "d20" rolls a single die
            Token::Die => {
                self.pos -= 1;
                return self.parse_dice(Expr::Number(1.0));
            }
            other => return Err(self.unexpected(&other, position)),
        };

        if self.peek() == Some(Token::Die) {
            self.parse_dice(atom)
        } else {
            Ok(atom)
        }
    }

    /// Parse the rest of a parenthesized group, the '(' already consumed
    fn parse_group(&mut self) -> Result<Expr, RollError> {
        self.descend()?;
        let inner = self.parse_expr()?;
        self.depth -= 1;
        match self.next()? {
            (Token::RParen, _) => Ok(Expr::Group(Box::new(inner))),
            (other, position) => Err(self.unexpected(&other, position)),
        }
    }

    fn parse_dice(&mut self, count: Expr) -> Result<Expr, RollError> {
        match self.next()? {
            (Token::Die, _) => {}
            (other, position) => return Err(self.unexpected(&other, position)),
        }

        let faces = match self.next()? {
            (Token::Number(n), _) => Expr::Number(n),
            (Token::LParen, _) => self.parse_group()?,
            (other, position) => return Err(self.unexpected(&other, position)),
        };

        let keep = match self.peek() {
            Some(Token::KeepHighest) => {
                self.pos += 1;
                Some(Keep::Highest(self.parse_keep_count()?))
            }
            Some(Token::KeepLowest) => {
                self.pos += 1;
                Some(Keep::Lowest(self.parse_keep_count()?))
            }
            _ => None,
        };

        Ok(Expr::Dice {
            count: Box::new(count),
            faces: Box::new(faces),
            keep,
        })
    }

    /// Number after kh/kl, defaulting to 1
    fn parse_keep_count(&mut self) -> Result<u32, RollError> {
        let Some((Token::Number(n), position)) = self.tokens.get(self.pos).copied() else {
            return Ok(1);
        };
        if n.fract() != 0.0 || n > u32::MAX as f64 {
            return Err(self.unexpected(&Token::Number(n), position));
        }
        self.pos += 1;
        Ok(n as u32)
    }
}
