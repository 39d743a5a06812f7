use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::{Month, NaiveDate, NaiveTime};
use regex::Regex;
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::ast::Op;

/// Abstract Syntax Tree node for an expression.
///
/// Literals are leaves; everything with operands is a [`Branch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Numeric literal
    ///
    /// # Example
    /// ```text
    /// 1.50
    /// ```
    Number(Number),

    /// Variable, macro-substituted word or wildcard
    ///
    /// # Example
    /// ```text
    /// income
    /// i.region
    /// ```
    Ident(String),

    /// String literal with escapes already resolved
    String(String),

    /// Date/time literal
    Datetime(Datetime),

    /// Operator application, function call, subscript or group
    Branch(Branch),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn binary(op: crate::ast::BinOp, left: Expr, right: Expr) -> Self {
        Expr::Branch(Branch::new(Op::Binary(op), vec![left, right]))
    }

    pub fn unary(op: crate::ast::UnaryOp, operand: Expr) -> Self {
        Expr::Branch(Branch::new(Op::Unary(op), vec![operand]))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Branch(Branch::new(Op::Call(name.into()), args))
    }

    /// Identifier text, when this is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// Interior expression node: a tag plus ordered operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub op: Op,
    pub children: Vec<Expr>,
}

impl Branch {
    pub fn new(op: Op, children: Vec<Expr>) -> Self {
        Branch { op, children }
    }
}

/// Numeric literal.
///
/// Stata numbers are doubles, but the literal text may carry more precision
/// than a double holds, so the exact decimal value is kept instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    /// Exact decimal value, scale preserved (`1.50` stays `1.50`)
    Exact(Decimal),

    /// Literal outside the decimal range, kept as written (`1e300`)
    Wide(String),

    /// System missing `.` or extended missing `.a` to `.z`
    Missing(Option<char>),
}

impl Number {
    /// Parses literal text as produced by the lexer.
    pub fn parse(text: &str) -> Option<Number> {
        if let Some(rest) = text.strip_prefix('.') {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (None, _) => return Some(Number::Missing(None)),
                (Some(c), None) if c.is_ascii_lowercase() => {
                    return Some(Number::Missing(Some(c)));
                }
                _ => {}
            }
        }

        if text.parse::<f64>().is_err() {
            return None;
        }

        let mut normalized = text.trim_start_matches('+').to_ascii_lowercase();
        if normalized.starts_with('.') {
            normalized.insert(0, '0');
        } else if normalized.starts_with("-.") {
            normalized.insert(1, '0');
        }

        let exact = if normalized.contains('e') {
            Decimal::from_scientific(&normalized)
        } else {
            Decimal::from_str_exact(&normalized)
        };

        Some(match exact {
            Ok(value) => Number::Exact(value),
            Err(_) => Number::Wide(text.to_string()),
        })
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Number::Missing(_))
    }

    /// Value as a double; `None` for missing values.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Number::Exact(value) => value.to_f64(),
            Number::Wide(text) => text.parse().ok(),
            Number::Missing(_) => None,
        }
    }

    /// Value as an integer, when it is a whole number in range.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Number::Exact(value) if value.fract().is_zero() => value.to_i64(),
            _ => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Exact(value) => write!(f, "{}", value),
            Number::Wide(text) => write!(f, "{}", text),
            Number::Missing(None) => write!(f, "."),
            Number::Missing(Some(c)) => write!(f, ".{}", c),
        }
    }
}

static DATETIME_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(\d{1,2})\s*([A-Za-z]{3,9})\s*(\d{4}))?\s*(?:(\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?)?\s*$",
    )
    .expect("datetime pattern is valid")
});

/// Date/time literal with an optional calendar date and an optional time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datetime {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl Datetime {
    /// Parses the text inside `td(...)` / `tc(...)`, e.g. `15mar2020 13:45:00`.
    pub fn parse(text: &str) -> Option<Datetime> {
        let caps = DATETIME_SHAPE.captures(text)?;

        let date = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(day), Some(month), Some(year)) => {
                let month = Month::from_str(month.as_str()).ok()?;
                Some(NaiveDate::from_ymd_opt(
                    year.as_str().parse().ok()?,
                    month.number_from_month(),
                    day.as_str().parse().ok()?,
                )?)
            }
            _ => None,
        };

        let time = match (caps.get(4), caps.get(5)) {
            (Some(hour), Some(minute)) => {
                let second = match caps.get(6) {
                    Some(s) => s.as_str().parse().ok()?,
                    None => 0,
                };
                let nanos = match caps.get(7) {
                    Some(frac) => format!("{:0<9}", frac.as_str()).parse().ok()?,
                    None => 0,
                };
                Some(NaiveTime::from_hms_nano_opt(
                    hour.as_str().parse().ok()?,
                    minute.as_str().parse().ok()?,
                    second,
                    nanos,
                )?)
            }
            _ => None,
        };

        Some(Datetime { date, time })
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .date
            .map(|d| d.format("%d%b%Y").to_string().to_ascii_lowercase());
        let time = self.time.map(|t| t.format("%H:%M:%S%.f").to_string());

        match (date, time) {
            (Some(date), None) => write!(f, "td({})", date),
            (Some(date), Some(time)) => write!(f, "tc({} {})", date, time),
            (None, Some(time)) => write!(f, "tc({})", time),
            (None, None) => write!(f, "tc()"),
        }
    }
}
