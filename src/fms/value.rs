//! Values carried by fields, settings and marks.
//!
//! Numbers keep their literal category: an integer stays an integer and a rational stays a
//! rational until arithmetic mixes it with a wider category. Some consumers depend on the exact
//! representation, so nothing here coerces implicitly.

use std::{cmp::Ordering, fmt};

use itertools::Itertools;
use num::{
    ToPrimitive, Zero,
    rational::Ratio,
    traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub},
};

/// A numeric literal: integer, exact rational or float.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Number {
    /// `60`, `-3`.
    Int(i64),
    /// `1/4`. Written back as `numer/denom` even when the denominator is 1.
    Rational(Ratio<i64>),
    /// `1.5`, `2e-3`.
    Float(f64),
}

impl Number {
    /// Zero as an integer.
    pub const ZERO: Self = Self::Int(0);

    /// Converts into `f64`, lossy for large rationals.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Rational(r) => r.to_f64().unwrap_or(f64::NAN),
            Self::Float(f) => f,
        }
    }

    /// Returns the exact rational value, or `None` for floats.
    #[must_use]
    pub fn to_ratio(self) -> Option<Ratio<i64>> {
        match self {
            Self::Int(i) => Some(Ratio::from_integer(i)),
            Self::Rational(r) => Some(r),
            Self::Float(_) => None,
        }
    }

    /// Whether the value is zero, in any category.
    #[must_use]
    pub fn is_zero(self) -> bool {
        match self {
            Self::Int(i) => i == 0,
            Self::Rational(r) => r.is_zero(),
            Self::Float(f) => f == 0.0,
        }
    }

    fn combine(
        self,
        rhs: Self,
        int: impl FnOnce(i64, i64) -> Option<Self>,
        ratio: impl FnOnce(&Ratio<i64>, &Ratio<i64>) -> Option<Ratio<i64>>,
        float: impl FnOnce(f64, f64) -> f64,
    ) -> Option<Self> {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => int(a, b),
            (Self::Float(_), _) | (_, Self::Float(_)) => {
                let x = float(self.to_f64(), rhs.to_f64());
                x.is_finite().then_some(Self::Float(x))
            }
            (a, b) => {
                let (a, b) = (a.to_ratio()?, b.to_ratio()?);
                ratio(&a, &b).map(Self::Rational)
            }
        }
    }

    /// Adds two numbers, `None` on overflow or a non-finite float.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.combine(
            rhs,
            |a, b| a.checked_add(b).map(Self::Int),
            CheckedAdd::checked_add,
            |a, b| a + b,
        )
    }

    /// Subtracts `rhs`, `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.combine(
            rhs,
            |a, b| a.checked_sub(b).map(Self::Int),
            CheckedSub::checked_sub,
            |a, b| a - b,
        )
    }

    /// Multiplies two numbers, `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.combine(
            rhs,
            |a, b| a.checked_mul(b).map(Self::Int),
            CheckedMul::checked_mul,
            |a, b| a * b,
        )
    }

    /// Divides by `rhs`, `None` when dividing by zero or on overflow. Integer division is exact
    /// and yields a rational.
    #[must_use]
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        self.combine(
            rhs,
            |a, b| {
                // The denominator must be positive before `Ratio::new` reduces.
                let (a, b) = if b < 0 {
                    (a.checked_neg()?, b.checked_neg()?)
                } else {
                    (a, b)
                };
                Some(Self::Rational(Ratio::new(a, b)))
            },
            CheckedDiv::checked_div,
            |a, b| a / b,
        )
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.to_ratio(), other.to_ratio()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Ratio<i64>> for Number {
    fn from(value: Ratio<i64>) -> Self {
        Self::Rational(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            // Debug keeps a decimal point or exponent, so it reads back as a float.
            Self::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// A pitch: a numeric key number or a note symbol such as `c4` or `fs5`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pitch {
    /// A numeric pitch.
    Number(Number),
    /// A note symbol, kept verbatim.
    Note(String),
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Note(s) => f.write_str(&quote(s)),
        }
    }
}

/// One payload item handed to the builder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scalar {
    /// A number.
    Number(Number),
    /// A string or bare word.
    Str(String),
    /// `yes`/`no`/`true`/`false`.
    Bool(bool),
    /// A note symbol.
    Note(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Str(s) => f.write_str(&quote(s)),
            Self::Bool(b) => f.write_str(if *b { "yes" } else { "no" }),
            Self::Note(s) => f.write_str(&quote(s)),
        }
    }
}

/// The shape a setting expects its value in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueShape {
    /// An integer.
    Int,
    /// An integer or a rational.
    Rational,
    /// Any number.
    Float,
    /// A string.
    Str,
    /// A boolean.
    Bool,
    /// A note symbol or a numeric pitch.
    Note,
    /// `(1 2 3)`.
    Numbers,
    /// `(a b c)`.
    Strings,
    /// `((1 2) (3))`.
    NumberLists,
    /// `((a b) (c))`.
    StringLists,
    /// `(a 1, b 2)`.
    NumberMap,
    /// `(a x, b y)`.
    StringMap,
    /// `(a (1 2), b (3))`.
    NumberListMap,
    /// `(a (x y), b (z))`.
    StringListMap,
}

impl ValueShape {
    /// Whether values of this shape are written as a list.
    #[must_use]
    pub const fn is_list(self) -> bool {
        !matches!(
            self,
            Self::Int | Self::Rational | Self::Float | Self::Str | Self::Bool | Self::Note
        )
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "integer",
            Self::Rational => "rational",
            Self::Float => "number",
            Self::Str => "string",
            Self::Bool => "yes/no",
            Self::Note => "note",
            Self::Numbers => "list of numbers",
            Self::Strings => "list of strings",
            Self::NumberLists => "list of number lists",
            Self::StringLists => "list of string lists",
            Self::NumberMap => "map of numbers",
            Self::StringMap => "map of strings",
            Self::NumberListMap => "map of number lists",
            Self::StringListMap => "map of string lists",
        };
        f.write_str(name)
    }
}

/// The argument signature of a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkShape {
    /// `[accent]`
    #[default]
    None,
    /// `[tremolo 3]`
    Number,
    /// `[text "dolce"]`
    Str,
    /// `[tempo "Allegro" 120]`
    StrNumber,
}

/// A fully decoded setting value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SettingValue {
    /// An integer.
    Int(i64),
    /// A rational.
    Rational(Ratio<i64>),
    /// A float.
    Float(f64),
    /// A string.
    Str(String),
    /// A boolean.
    Bool(bool),
    /// A note symbol.
    Note(String),
    /// A list of numbers.
    Numbers(Vec<Number>),
    /// A list of strings.
    Strings(Vec<String>),
    /// A list of number lists.
    NumberLists(Vec<Vec<Number>>),
    /// A list of string lists.
    StringLists(Vec<Vec<String>>),
    /// An ordered symbol to number map.
    NumberMap(Vec<(String, Number)>),
    /// An ordered symbol to string map.
    StringMap(Vec<(String, String)>),
    /// An ordered symbol to number list map.
    NumberListMap(Vec<(String, Vec<Number>)>),
    /// An ordered symbol to string list map.
    StringListMap(Vec<(String, Vec<String>)>),
}

impl From<Number> for SettingValue {
    fn from(value: Number) -> Self {
        match value {
            Number::Int(i) => Self::Int(i),
            Number::Rational(r) => Self::Rational(r),
            Number::Float(f) => Self::Float(f),
        }
    }
}

impl SettingValue {
    /// Returns the number if this is a scalar numeric value.
    #[must_use]
    pub const fn as_number(&self) -> Option<Number> {
        match self {
            Self::Int(i) => Some(Number::Int(*i)),
            Self::Rational(r) => Some(Number::Rational(*r)),
            Self::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Returns the string if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn fmt_numbers(nums: &[Number]) -> String {
    format!("({})", nums.iter().join(" "))
}

fn fmt_strings(strs: &[String]) -> String {
    format!("({})", strs.iter().map(|s| quote(s)).join(" "))
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Rational(r) => write!(f, "{}", Number::Rational(*r)),
            Self::Float(x) => write!(f, "{}", Number::Float(*x)),
            Self::Str(s) => f.write_str(&quote(s)),
            Self::Bool(b) => f.write_str(if *b { "yes" } else { "no" }),
            Self::Note(s) => f.write_str(&quote(s)),
            Self::Numbers(v) => f.write_str(&fmt_numbers(v)),
            Self::Strings(v) => f.write_str(&fmt_strings(v)),
            Self::NumberLists(v) => write!(f, "({})", v.iter().map(|l| fmt_numbers(l)).join(" ")),
            Self::StringLists(v) => write!(f, "({})", v.iter().map(|l| fmt_strings(l)).join(" ")),
            Self::NumberMap(m) => write!(
                f,
                "({})",
                m.iter().map(|(k, v)| format!("{} {v}", quote(k))).join(", ")
            ),
            Self::StringMap(m) => write!(
                f,
                "({})",
                m.iter()
                    .map(|(k, v)| format!("{} {}", quote(k), quote(v)))
                    .join(", ")
            ),
            Self::NumberListMap(m) => write!(
                f,
                "({})",
                m.iter()
                    .map(|(k, v)| format!("{} {}", quote(k), fmt_numbers(v)))
                    .join(", ")
            ),
            Self::StringListMap(m) => write!(
                f,
                "({})",
                m.iter()
                    .map(|(k, v)| format!("{} {}", quote(k), fmt_strings(v)))
                    .join(", ")
            ),
        }
    }
}

/// Words that mean something in value position and so must be quoted to be read as strings.
const RESERVED_WORDS: &[&str] = &["none", "yes", "no", "true", "false"];

/// Whether `s` can be written as a bare word.
#[must_use]
pub fn is_bare_word(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(is_word_char)
        && !RESERVED_WORDS.iter().any(|w| w.eq_ignore_ascii_case(s))
}

/// Whether `c` may continue a bare word.
#[must_use]
pub const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#' | '\'' | '-')
}

/// Writes `s` as a bare word when possible, otherwise as a quoted string with escapes.
#[must_use]
pub fn quote(s: &str) -> String {
    if is_bare_word(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_keeps_exact_categories() {
        let quarter = Number::Rational(Ratio::new(1, 4));
        assert_eq!(Number::Int(1).checked_add(Number::Int(2)), Some(Number::Int(3)));
        assert_eq!(
            Number::Int(1).checked_add(quarter),
            Some(Number::Rational(Ratio::new(5, 4)))
        );
        assert_eq!(
            Number::Int(3).checked_div(Number::Int(6)),
            Some(Number::Rational(Ratio::new(1, 2)))
        );
        assert_eq!(
            Number::Float(0.5).checked_mul(Number::Int(2)),
            Some(Number::Float(1.0))
        );
        assert_eq!(Number::Int(1).checked_div(Number::ZERO), None);
        assert_eq!(Number::Int(i64::MAX).checked_add(Number::Int(1)), None);
    }

    #[test]
    fn division_overflow_is_none() {
        assert_eq!(Number::Int(i64::MIN).checked_div(Number::Int(-1)), None);
        assert_eq!(Number::Int(1).checked_div(Number::Int(i64::MIN)), None);
        assert_eq!(
            Number::Int(6).checked_div(Number::Int(-4)),
            Some(Number::Rational(Ratio::new(-3, 2)))
        );
        assert_eq!(Number::Float(1e300).checked_mul(Number::Float(1e300)), None);
    }

    #[test]
    fn display_round_trips_category() {
        assert_eq!(Number::Rational(Ratio::new(4, 2)).to_string(), "2/1");
        assert_eq!(Number::Float(2.0).to_string(), "2.0");
        assert_eq!(Number::Int(-7).to_string(), "-7");
        assert_eq!(SettingValue::Note("c 4".into()).to_string(), r#""c 4""#);
        assert_eq!(Scalar::Note("fs4".into()).to_string(), "fs4");
    }

    #[test]
    fn ordering_mixes_categories() {
        let half = Number::Rational(Ratio::new(1, 2));
        assert!(Number::Int(0) < half);
        assert!(half < Number::Float(0.75));
        assert_eq!(
            Number::Int(1).partial_cmp(&Number::Rational(Ratio::new(2, 2))),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("violin"), "violin");
        assert_eq!(quote("Solo Violin"), "\"Solo Violin\"");
        assert_eq!(quote("none"), "\"none\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn setting_value_text() {
        let v = SettingValue::NumberMap(vec![("a".into(), Number::Int(1)), ("b c".into(), Number::Int(2))]);
        assert_eq!(v.to_string(), "(a 1, \"b c\" 2)");
        let v = SettingValue::NumberLists(vec![vec![Number::Int(3), Number::Int(4)], vec![]]);
        assert_eq!(v.to_string(), "((3 4) ())");
    }
}
