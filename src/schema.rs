//! Field descriptor registry: the static metadata that maps one record
//! type onto spreadsheet columns.
//!
//! A [`Schema`] is built once per record type through [`SchemaBuilder`]
//! and is immutable afterwards, so callers can keep one in a
//! `std::sync::LazyLock` and share it across calls. Accessor closures
//! replace runtime field introspection: a getter reads one field (or a
//! nested attribute) out of a record, a setter writes one back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::convert::Converter;
use crate::error::{SheetError, SheetResult};
use crate::value::{CellValue, Rounding};

/// Which marshalling passes a field participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Export passes only.
    Export,
    /// Import passes (and template scaffolds) only.
    Import,
    /// Both passes.
    #[default]
    Both,
}

/// Which marshalling pass a call runs in. A call is always one or the
/// other; `Both` exists only on field declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    Export,
    Import,
}

impl Direction {
    /// Whether a field declared with this direction takes part in the
    /// given pass.
    pub(crate) fn participates(self, pass: Pass) -> bool {
        match self {
            Direction::Both => true,
            Direction::Export => pass == Pass::Export,
            Direction::Import => pass == Pass::Import,
        }
    }
}

/// Physical cell representation on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    #[default]
    Text,
    Numeric,
}

/// Semantic value kind a field coerces raw cells into on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    Text,
    Int,
    Float,
    Bool,
    Date,
}

/// Horizontal alignment of data cells in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    General,
    Left,
    Center,
    Right,
}

type Getter<T> = Box<dyn Fn(&T) -> CellValue + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, CellValue) + Send + Sync>;
type Handler = Box<
    dyn Fn(&CellValue, &[String]) -> Result<String, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Descriptor for one column of record type `T`.
///
/// Construction is builder-style; every method consumes and returns the
/// field so descriptors read as one declaration per column.
pub struct Field<T> {
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) direction: Direction,
    pub(crate) cell_kind: CellKind,
    pub(crate) kind: ValueKind,
    pub(crate) align: Align,
    pub(crate) date_format: Option<String>,
    pub(crate) converter: Option<Converter>,
    pub(crate) suffix: String,
    pub(crate) default_value: String,
    pub(crate) scale: Option<(u32, Rounding)>,
    pub(crate) combo: Vec<String>,
    pub(crate) prompt: Option<String>,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) statistics: bool,
    pub(crate) handler: Option<Handler>,
    pub(crate) handler_args: Vec<String>,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
}

impl<T> Field<T> {
    /// New descriptor with the given column header title.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            order: 0,
            direction: Direction::default(),
            cell_kind: CellKind::default(),
            kind: ValueKind::default(),
            align: Align::default(),
            date_format: None,
            converter: None,
            suffix: String::new(),
            default_value: String::new(),
            scale: None,
            combo: Vec::new(),
            prompt: None,
            width: 16.0,
            height: 14.0,
            statistics: false,
            handler: None,
            handler_args: Vec::new(),
            getter: None,
            setter: None,
        }
    }

    /// Explicit column placement key; ties keep declaration order.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Write this column as numeric cells on export.
    pub fn numeric(mut self) -> Self {
        self.cell_kind = CellKind::Numeric;
        self
    }

    /// Semantic kind raw cells are coerced into on import.
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// strftime-style format applied to temporal values on export.
    pub fn date_format(mut self, format: &str) -> Self {
        self.date_format = Some(format.to_string());
        self
    }

    /// Code/label translation table, applied forward on export and in
    /// reverse on import.
    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Literal text appended to exported string cells.
    pub fn suffix(mut self, suffix: &str) -> Self {
        self.suffix = suffix.to_string();
        self
    }

    /// Rendered when the value is absent on export; parsed as the
    /// fallback on import coercion failure.
    pub fn default_value(mut self, default: &str) -> Self {
        self.default_value = default.to_string();
        self
    }

    /// Decimal scale and rounding mode for float values.
    pub fn scale(mut self, scale: u32, mode: Rounding) -> Self {
        self.scale = Some((scale, mode));
        self
    }

    /// Closed option list rendered as a dropdown constraint in exported
    /// templates.
    pub fn combo(mut self, options: &[&str]) -> Self {
        self.combo = options.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Free-text prompt shown when the column is selected.
    pub fn prompt(mut self, prompt: &str) -> Self {
        self.prompt = Some(prompt.to_string());
        self
    }

    /// Column width in character units.
    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Data row height in points. The tallest declared height wins for
    /// the whole sheet.
    pub fn height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Sum this column into the trailing aggregate row.
    pub fn statistics(mut self) -> Self {
        self.statistics = true;
        self
    }

    /// Custom export formatter. Failures are caught, logged and rendered
    /// as the field default; they never abort a row.
    pub fn handler<F>(mut self, args: &[&str], f: F) -> Self
    where
        F: Fn(&CellValue, &[String]) -> Result<String, Box<dyn std::error::Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
    {
        self.handler_args = args.iter().map(|s| s.to_string()).collect();
        self.handler = Some(Box::new(f));
        self
    }

    /// Field accessor used on export. Nested attributes are reached by
    /// the closure itself, e.g. `|r| r.dept.name.as_str().into()`.
    pub fn get<F, V>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<CellValue>,
    {
        self.getter = Some(Box::new(move |record| f(record).into()));
        self
    }

    /// Field mutator used on import.
    pub fn set<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, CellValue) + Send + Sync + 'static,
    {
        self.setter = Some(Box::new(f));
        self
    }

    pub(crate) fn read(&self, record: &T) -> CellValue {
        self.getter
            .as_ref()
            .map_or(CellValue::Empty, |get| get(record))
    }

    pub(crate) fn write(&self, record: &mut T, value: CellValue) {
        if let Some(set) = &self.setter {
            set(record, value);
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("title", &self.title)
            .field("order", &self.order)
            .field("direction", &self.direction)
            .field("cell_kind", &self.cell_kind)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Immutable, ordered descriptor set for one record type.
pub struct Schema<T> {
    fields: Vec<Field<T>>,
}

impl<T> Schema<T> {
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder { fields: Vec::new() }
    }

    /// Descriptors participating in the given pass, in column order.
    pub(crate) fn fields_for(&self, pass: Pass) -> Vec<&Field<T>> {
        self.fields
            .iter()
            .filter(|f| f.direction.participates(pass))
            .collect()
    }

    /// Tallest declared row height across all fields, in points.
    pub(crate) fn max_row_height(&self) -> f64 {
        self.fields.iter().fold(14.0, |acc, f| acc.max(f.height))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("fields", &self.fields).finish()
    }
}

/// Accumulates field declarations, then validates and orders them.
pub struct SchemaBuilder<T> {
    fields: Vec<Field<T>>,
}

impl<T> SchemaBuilder<T> {
    pub fn field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate title uniqueness and produce the ordered schema.
    ///
    /// The sort is stable: equal `order` keys keep declaration order.
    pub fn build(mut self) -> SheetResult<Schema<T>> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.title == field.title) {
                return Err(SheetError::Schema(format!(
                    "duplicate field title '{}'",
                    field.title
                )));
            }
        }
        self.fields.sort_by_key(|f| f.order);
        Ok(Schema {
            fields: self.fields,
        })
    }
}
