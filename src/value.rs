//! Semantic cell values exchanged between records and worksheet cells.
//!
//! A [`CellValue`] is the currency of the engine: getters produce one per
//! field, the coercion table builds one from every raw cell, and setters
//! consume one. Conversions never fail; out-of-domain input degrades to a
//! zero value, matching the engine's skip-and-continue policy.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A typed value held by one cell of one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Display rendering. Integral floats drop the trailing `.0` so that a
    /// numeric cell holding `42.0` round-trips as the string `"42"`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => float_text(*f),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Numeric view; non-numeric text and empties contribute zero.
    pub fn to_f64(&self) -> f64 {
        match self {
            CellValue::Int(i) => *i as f64,
            CellValue::Float(f) => *f,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Text(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn to_i64(&self) -> i64 {
        match self {
            CellValue::Int(i) => *i,
            CellValue::Float(f) => *f as i64,
            CellValue::Bool(b) => i64::from(*b),
            CellValue::Text(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Int(i) => *i != 0,
            CellValue::Float(f) => *f != 0.0,
            CellValue::Text(s) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "y")
            }
            _ => false,
        }
    }

    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        self.to_datetime().map(|dt| dt.date())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::DateTime(value.and_hms_opt(0, 0, 0).unwrap_or_default())
    }
}

impl<V: Into<CellValue>> From<Option<V>> for CellValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

/// Rounding mode applied when a float field declares a decimal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round half away from zero.
    #[default]
    HalfUp,
    /// Round half toward zero.
    HalfDown,
    /// Round half to the even neighbour (banker's rounding).
    HalfEven,
    /// Round away from zero.
    Up,
    /// Round toward zero.
    Down,
    /// Round toward positive infinity.
    Ceiling,
    /// Round toward negative infinity.
    Floor,
}

/// Round `value` to `scale` decimal places under the given mode.
pub fn round_with(value: f64, scale: u32, mode: Rounding) -> f64 {
    let factor = 10f64.powi(scale as i32);
    let scaled = value * factor;
    let floor = scaled.floor();
    let frac = scaled - floor;
    let rounded = match mode {
        Rounding::HalfUp => scaled.round(),
        Rounding::HalfDown => {
            if (scaled - scaled.trunc()).abs() == 0.5 {
                scaled.trunc()
            } else {
                scaled.round()
            }
        }
        Rounding::HalfEven => {
            if (scaled - scaled.trunc()).abs() == 0.5 {
                if (floor as i64) % 2 == 0 {
                    floor
                } else {
                    floor + 1.0
                }
            } else {
                scaled.round()
            }
        }
        Rounding::Up => {
            if frac == 0.0 {
                scaled
            } else if scaled > 0.0 {
                scaled.ceil()
            } else {
                scaled.floor()
            }
        }
        Rounding::Down => scaled.trunc(),
        Rounding::Ceiling => scaled.ceil(),
        Rounding::Floor => scaled.floor(),
    };
    rounded / factor
}

/// Integral floats print without the `.0` tail.
pub(crate) fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
