//! Bidirectional type coercion between raw worksheet cells and semantic
//! field values.
//!
//! Import direction: [`coerce`] turns a raw `calamine` cell into the
//! field's declared [`ValueKind`], falling back to the field default on any
//! parse failure. Export direction: [`render`] applies the field's
//! formatting chain (date format, converter table, decimal scale, custom
//! handler, kind default) and produces a cell-writable [`Rendered`] value.
//!
//! Neither direction ever returns an error; data-quality problems degrade
//! to defaults and are reported through `tracing`.

use calamine::Data;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::schema::{CellKind, Field, ValueKind};
use crate::value::{float_text, parse_datetime, round_with, CellValue};

/// Closed `code=label` translation table for small enumerations.
///
/// Export maps codes to labels; import maps labels back to codes.
/// Multi-valued fields are split and re-joined with the separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Converter {
    pairs: Vec<(String, String)>,
    separator: String,
}

impl Converter {
    /// Parse an expression of the form `"0=unknown,1=male,2=female"`.
    pub fn new(expression: &str) -> Self {
        let pairs = expression
            .split(',')
            .filter_map(|item| {
                let (code, label) = item.split_once('=')?;
                Some((code.trim().to_string(), label.trim().to_string()))
            })
            .collect();
        Self {
            pairs,
            separator: ",".to_string(),
        }
    }

    /// Separator used to split and join multi-valued fields.
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Code → label. An unmatched single value passes through unchanged;
    /// unmatched members of a multi-value are dropped.
    pub fn translate(&self, value: &str) -> String {
        self.map(value, |pair| (&pair.0, &pair.1))
    }

    /// Label → code, the import-side inverse of [`Converter::translate`].
    pub fn reverse(&self, value: &str) -> String {
        self.map(value, |pair| (&pair.1, &pair.0))
    }

    fn map<'a, F>(&'a self, value: &str, select: F) -> String
    where
        F: Fn(&'a (String, String)) -> (&'a String, &'a String),
    {
        if value.contains(&self.separator) {
            let mapped: Vec<&str> = value
                .split(&self.separator)
                .filter_map(|part| {
                    self.pairs
                        .iter()
                        .map(&select)
                        .find(|(from, _)| from.as_str() == part)
                        .map(|(_, to)| to.as_str())
                })
                .collect();
            mapped.join(&self.separator)
        } else {
            self.pairs
                .iter()
                .map(&select)
                .find(|(from, _)| from.as_str() == value)
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| value.to_string())
        }
    }
}

/// A value ready to be written into one worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Rendered {
    Number(f64),
    Text(String),
    Blank,
}

impl Rendered {
    /// Textual view used by the statistics accumulator.
    pub(crate) fn text(&self) -> String {
        match self {
            Rendered::Number(n) => float_text(*n),
            Rendered::Text(s) => s.clone(),
            Rendered::Blank => String::new(),
        }
    }
}

/// Raw cell display text, independent of any target kind.
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Temporal view of a raw cell, if it carries one.
pub(crate) fn cell_datetime(cell: &Data) -> Option<chrono::NaiveDateTime> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::DateTimeIso(s) => parse_datetime(s),
        _ => None,
    }
}

/// Import-side coercion of one raw cell into the field's semantic kind.
pub(crate) fn coerce(raw: &Data, kind: ValueKind, default: &str) -> CellValue {
    match kind {
        ValueKind::Text => match raw {
            Data::Empty | Data::Error(_) => {
                if default.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(default.to_string())
                }
            }
            other => CellValue::Text(cell_to_string(other)),
        },
        ValueKind::Int => CellValue::Int(parse_int(raw, default)),
        ValueKind::Float => CellValue::Float(parse_float(raw, default)),
        ValueKind::Bool => match raw {
            Data::Bool(b) => CellValue::Bool(*b),
            other => CellValue::Bool(CellValue::Text(cell_to_string(other)).to_bool()),
        },
        ValueKind::Date => match raw {
            // Date-formatted numeric cells come back through the codec's
            // spreadsheet-epoch conversion.
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Empty),
            Data::String(s) | Data::DateTimeIso(s) => parse_datetime(s)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| {
                    debug!(cell = %s, "unparseable date cell, leaving field empty");
                    CellValue::Empty
                }),
            _ => CellValue::Empty,
        },
    }
}

/// Import-side coercion from already-textual input, used after converter
/// reversal has replaced the raw cell text.
pub(crate) fn coerce_text(text: &str, kind: ValueKind, default: &str) -> CellValue {
    coerce(&Data::String(text.to_string()), kind, default)
}

fn parse_int(raw: &Data, default: &str) -> i64 {
    match raw {
        Data::Int(i) => *i,
        Data::Float(f) => *f as i64,
        Data::Empty | Data::Error(_) => default.trim().parse().unwrap_or(0),
        other => {
            let text = cell_to_string(other);
            text.trim().parse().unwrap_or_else(|_| {
                debug!(cell = %text, "non-integer cell, using default");
                default.trim().parse().unwrap_or(0)
            })
        }
    }
}

fn parse_float(raw: &Data, default: &str) -> f64 {
    match raw {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        Data::Empty | Data::Error(_) => default.trim().parse().unwrap_or(0.0),
        other => {
            let text = cell_to_string(other);
            text.trim().parse().unwrap_or_else(|_| {
                debug!(cell = %text, "non-numeric cell, using default");
                default.trim().parse().unwrap_or(0.0)
            })
        }
    }
}

/// Export-side rendering of one field value, applied in strict priority:
/// date format, converter table, decimal scale, custom handler, then the
/// kind-based default.
pub(crate) fn render<T>(value: &CellValue, field: &Field<T>) -> Rendered {
    if let (Some(fmt), Some(dt)) = (&field.date_format, value.to_datetime()) {
        return Rendered::Text(dt.format(fmt).to_string());
    }
    if let Some(converter) = &field.converter {
        if !value.is_empty() {
            return Rendered::Text(converter.translate(&value.to_text()));
        }
    }
    if let (Some((scale, mode)), CellValue::Float(f)) = (field.scale, value) {
        let rounded = round_with(*f, scale, mode);
        return Rendered::Text(format!("{rounded:.prec$}", prec = scale as usize));
    }
    if let Some(handler) = &field.handler {
        return match handler(value, &field.handler_args) {
            Ok(text) => Rendered::Text(text),
            Err(e) => {
                warn!(title = %field.title, error = %e, "cell handler failed, using default");
                Rendered::Text(field.default_value.clone())
            }
        };
    }
    match field.cell_kind {
        CellKind::Numeric => {
            if value.is_empty() {
                Rendered::Blank
            } else {
                Rendered::Number(value.to_f64())
            }
        }
        CellKind::Text => {
            if value.is_empty() {
                Rendered::Text(field.default_value.clone())
            } else {
                Rendered::Text(format!("{}{}", value.to_text(), field.suffix))
            }
        }
    }
}
