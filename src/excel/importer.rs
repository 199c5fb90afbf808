//! Import pipeline: worksheet rows → typed records.
//!
//! Columns are discovered by matching header titles against the schema;
//! a descriptor whose title has no header match is skipped for the run.
//! Data rows are coerced cell by cell and never dropped for bad data —
//! only structural problems (unreadable container, missing sheet) abort
//! the call.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use tracing::{debug, warn};

use crate::convert::{cell_datetime, cell_to_string, coerce, coerce_text};
use crate::error::{SheetError, SheetResult};
use crate::schema::{Field, Pass, Schema, ValueKind};
use crate::value::CellValue;

/// One import call over a schema.
pub struct SheetImporter<'a, T> {
    schema: &'a Schema<T>,
    sheet_name: Option<String>,
    header_row: u32,
}

impl<'a, T: Default> SheetImporter<'a, T> {
    pub fn new(schema: &'a Schema<T>) -> Self {
        Self {
            schema,
            sheet_name: None,
            header_row: 0,
        }
    }

    /// Read from the named sheet instead of the first one.
    pub fn sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = Some(name.to_string());
        self
    }

    /// Zero-based row holding the column titles (default 0). Use 1 when
    /// the sheet carries a banner row above the header.
    pub fn header_row(mut self, row: u32) -> Self {
        self.header_row = row;
        self
    }

    /// Import from any seekable byte stream positioned at the start of an
    /// xlsx container.
    pub fn read<RS: Read + Seek>(&self, reader: RS) -> SheetResult<Vec<T>> {
        let mut workbook = Xlsx::new(reader)?;
        self.read_workbook(&mut workbook)
    }

    /// Import from a file on disk.
    pub fn read_path(&self, path: &Path) -> SheetResult<Vec<T>> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        self.read_workbook(&mut workbook)
    }

    fn read_workbook<RS: Read + Seek>(&self, workbook: &mut Xlsx<RS>) -> SheetResult<Vec<T>> {
        let sheet = match &self.sheet_name {
            Some(name) => {
                if !workbook.sheet_names().iter().any(|s| s == name) {
                    return Err(SheetError::MissingSheet(name.clone()));
                }
                name.clone()
            }
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| SheetError::MissingSheet("workbook has no sheets".to_string()))?,
        };
        let range = workbook.worksheet_range(&sheet)?;
        Ok(self.collect_rows(&range))
    }

    /// Header scan plus row scan over one worksheet range.
    fn collect_rows(&self, range: &Range<Data>) -> Vec<T> {
        let fields = self.schema.fields_for(Pass::Import);
        let Some((end_row, end_col)) = range.end() else {
            return Vec::new();
        };
        if end_row <= self.header_row {
            // Header only (or nothing at all): an empty result, not an error.
            return Vec::new();
        }
        let start_col = range.start().map_or(0, |(_, c)| c);

        let mut columns: HashMap<String, u32> = HashMap::new();
        for col in start_col..=end_col {
            if let Some(cell) = range.get_value((self.header_row, col)) {
                let title = cell_to_string(cell);
                if !title.is_empty() {
                    columns.insert(title, col);
                }
            }
        }

        let mut matched: Vec<(u32, &Field<T>)> = Vec::new();
        for field in &fields {
            match columns.get(&field.title) {
                Some(col) => matched.push((*col, field)),
                None => {
                    debug!(title = %field.title, "no header match, field skipped for this import");
                }
            }
        }

        let mut records = Vec::new();
        for row in (self.header_row + 1)..=end_row {
            if is_blank_row(range, row, start_col, end_col) {
                continue;
            }
            let mut record = T::default();
            for (col, field) in &matched {
                let raw = range.get_value((row, *col)).unwrap_or(&Data::Empty);
                field.write(&mut record, read_cell(raw, field));
            }
            records.push(record);
        }
        records
    }
}

/// One cell through the import chain: declared date format for text
/// targets, converter reversal, typed coercion, then the custom handler.
fn read_cell<T>(raw: &Data, field: &Field<T>) -> CellValue {
    let value = if let (Some(fmt), ValueKind::Text, Some(dt)) =
        (&field.date_format, field.kind, cell_datetime(raw))
    {
        // A date cell landing in a text field keeps the field's format
        // instead of the generic datetime rendering.
        CellValue::Text(dt.format(fmt).to_string())
    } else if let Some(conv) = &field.converter {
        // Labels map back to codes before typed coercion.
        let code = conv.reverse(&cell_to_string(raw));
        coerce_text(&code, field.kind, &field.default_value)
    } else {
        coerce(raw, field.kind, &field.default_value)
    };
    match &field.handler {
        Some(handler) => match handler(&value, &field.handler_args) {
            Ok(text) => CellValue::Text(text),
            Err(e) => {
                warn!(title = %field.title, error = %e, "cell handler failed, using default");
                CellValue::Text(field.default_value.clone())
            }
        },
        None => value,
    }
}

fn is_blank_row(range: &Range<Data>, row: u32, start_col: u32, end_col: u32) -> bool {
    (start_col..=end_col).all(|col| matches!(range.get_value((row, col)), None | Some(Data::Empty)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Converter;
    use crate::schema::ValueKind;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        name: String,
        amount: f64,
        status: String,
    }

    fn item_schema() -> Schema<Item> {
        Schema::builder()
            .field(
                Field::new("Name")
                    .order(1)
                    .get(|i: &Item| i.name.clone())
                    .set(|i, v| i.name = v.to_text()),
            )
            .field(
                Field::new("Amount")
                    .order(2)
                    .kind(ValueKind::Float)
                    .get(|i: &Item| i.amount)
                    .set(|i, v| i.amount = v.to_f64()),
            )
            .field(
                Field::new("Status")
                    .order(3)
                    .converter(Converter::new("0=closed,1=open"))
                    .get(|i: &Item| i.status.clone())
                    .set(|i, v| i.status = v.to_text()),
            )
            .build()
            .unwrap()
    }

    fn importer(schema: &Schema<Item>) -> SheetImporter<'_, Item> {
        SheetImporter::new(schema)
    }

    #[test]
    fn test_collect_rows_basic() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Name".to_string()));
        range.set_value((0, 1), Data::String("Amount".to_string()));
        range.set_value((0, 2), Data::String("Status".to_string()));
        range.set_value((1, 0), Data::String("A".to_string()));
        range.set_value((1, 1), Data::Float(10.5));
        range.set_value((1, 2), Data::String("open".to_string()));
        range.set_value((2, 0), Data::String("B".to_string()));
        range.set_value((2, 1), Data::Float(5.0));
        range.set_value((2, 2), Data::String("closed".to_string()));

        let schema = item_schema();
        let items = importer(&schema).collect_rows(&range);
        assert_eq!(
            items,
            vec![
                Item {
                    name: "A".to_string(),
                    amount: 10.5,
                    status: "1".to_string()
                },
                Item {
                    name: "B".to_string(),
                    amount: 5.0,
                    status: "0".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_blank_rows_skipped() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 1));
        range.set_value((0, 0), Data::String("Name".to_string()));
        range.set_value((0, 1), Data::String("Amount".to_string()));
        range.set_value((1, 0), Data::String("A".to_string()));
        // row 2 left entirely blank
        range.set_value((3, 0), Data::String("B".to_string()));

        let schema = item_schema();
        let items = importer(&schema).collect_rows(&range);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "A");
        assert_eq!(items[1].name, "B");
    }

    #[test]
    fn test_missing_header_leaves_default() {
        // Header omits "Amount": that field stays at its zero value.
        let mut range: Range<Data> = Range::new((0, 0), (1, 0));
        range.set_value((0, 0), Data::String("Name".to_string()));
        range.set_value((1, 0), Data::String("A".to_string()));

        let schema = item_schema();
        let items = importer(&schema).collect_rows(&range);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, 0.0);
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        let mut range: Range<Data> = Range::new((0, 0), (0, 1));
        range.set_value((0, 0), Data::String("Name".to_string()));

        let schema = item_schema();
        assert!(importer(&schema).collect_rows(&range).is_empty());
    }

    #[test]
    fn test_header_offset() {
        // Banner row occupies row 0, header sits at row 1.
        let mut range: Range<Data> = Range::new((0, 0), (2, 0));
        range.set_value((0, 0), Data::String("Quarterly report".to_string()));
        range.set_value((1, 0), Data::String("Name".to_string()));
        range.set_value((2, 0), Data::String("A".to_string()));

        let schema = item_schema();
        let items = importer(&schema).header_row(1).collect_rows(&range);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "A");
    }

    #[test]
    fn test_date_cell_with_declared_format_into_text_field() {
        let mut range: Range<Data> = Range::new((0, 0), (1, 0));
        range.set_value((0, 0), Data::String("When".to_string()));
        range.set_value((1, 0), Data::DateTimeIso("2024-03-01T00:00:00".to_string()));

        #[derive(Debug, Default, PartialEq)]
        struct Entry {
            when: String,
        }
        let schema: Schema<Entry> = Schema::builder()
            .field(
                Field::new("When")
                    .date_format("%Y/%m/%d")
                    .get(|e: &Entry| e.when.clone())
                    .set(|e, v| e.when = v.to_text()),
            )
            .build()
            .unwrap();
        let items = SheetImporter::new(&schema).collect_rows(&range);
        assert_eq!(items[0].when, "2024/03/01");
    }

    #[test]
    fn test_handler_runs_on_import() {
        let mut range: Range<Data> = Range::new((0, 0), (1, 0));
        range.set_value((0, 0), Data::String("Code".to_string()));
        range.set_value((1, 0), Data::String("abc".to_string()));

        #[derive(Debug, Default, PartialEq)]
        struct Entry {
            code: String,
        }
        let schema: Schema<Entry> = Schema::builder()
            .field(
                Field::new("Code")
                    .handler(&[], |v, _| Ok(v.to_text().to_uppercase()))
                    .set(|e: &mut Entry, v| e.code = v.to_text()),
            )
            .build()
            .unwrap();
        let items = SheetImporter::new(&schema).collect_rows(&range);
        assert_eq!(items[0].code, "ABC");

        // a failing handler degrades to the field default
        let schema: Schema<Entry> = Schema::builder()
            .field(
                Field::new("Code")
                    .default_value("?")
                    .handler(&[], |_, _| Err("boom".into()))
                    .set(|e: &mut Entry, v| e.code = v.to_text()),
            )
            .build()
            .unwrap();
        let items = SheetImporter::new(&schema).collect_rows(&range);
        assert_eq!(items[0].code, "?");
    }

    #[test]
    fn test_coercion_failure_keeps_row() {
        let mut range: Range<Data> = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("Name".to_string()));
        range.set_value((0, 1), Data::String("Amount".to_string()));
        range.set_value((1, 0), Data::String("A".to_string()));
        range.set_value((1, 1), Data::String("not a number".to_string()));

        let schema = item_schema();
        let items = importer(&schema).collect_rows(&range);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, 0.0);
    }
}
