//! Structural failures abort an import or schema build with a typed
//! error; data-quality failures never do.

use std::io::Cursor;

use pretty_assertions::assert_eq;
use sheetbind::{Field, Schema, SheetError, SheetExporter, SheetImporter};
use tempfile::TempDir;

#[derive(Debug, Default, PartialEq)]
struct Row {
    name: String,
}

fn row_schema() -> Schema<Row> {
    Schema::builder()
        .field(
            Field::new("Name")
                .get(|r: &Row| r.name.clone())
                .set(|r, v| r.name = v.to_text()),
        )
        .build()
        .unwrap()
}

#[test]
fn test_missing_sheet_is_an_error() {
    let schema = row_schema();
    let mut buffer = Vec::new();
    SheetExporter::new(&schema)
        .sheet_name("Data")
        .write(&[Row { name: "a".to_string() }], &mut buffer)
        .unwrap();

    let err = SheetImporter::new(&schema)
        .sheet_name("NoSuchSheet")
        .read(Cursor::new(buffer))
        .unwrap_err();
    match err {
        SheetError::MissingSheet(name) => assert_eq!(name, "NoSuchSheet"),
        other => panic!("expected MissingSheet, got {other:?}"),
    }
}

#[test]
fn test_invalid_container_is_an_error() {
    let schema = row_schema();
    let garbage = b"this is not an xlsx container".to_vec();
    let err = SheetImporter::new(&schema)
        .read(Cursor::new(garbage))
        .unwrap_err();
    assert!(matches!(err, SheetError::Workbook(_)), "got {err:?}");
}

#[test]
fn test_missing_file_is_an_error() {
    let schema = row_schema();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("never_written.xlsx");
    assert!(SheetImporter::new(&schema).read_path(&path).is_err());
}

#[test]
fn test_duplicate_titles_rejected_at_build() {
    let result: Result<Schema<Row>, _> = Schema::builder()
        .field(Field::new("Name"))
        .field(Field::new("Name"))
        .build();
    match result {
        Err(SheetError::Schema(msg)) => assert!(msg.contains("Name"), "message: {msg}"),
        other => panic!("expected Schema error, got {other:?}"),
    }
}

#[test]
fn test_bad_cells_do_not_abort_import() {
    use sheetbind::ValueKind;

    #[derive(Debug, Default, PartialEq)]
    struct Measure {
        label: String,
        value: f64,
    }
    let schema: Schema<Measure> = Schema::builder()
        .field(
            Field::new("Label")
                .get(|m: &Measure| m.label.clone())
                .set(|m, v| m.label = v.to_text()),
        )
        .field(
            Field::new("Value")
                .kind(ValueKind::Float)
                .get(|m: &Measure| m.value)
                .set(|m, v| m.value = v.to_f64()),
        )
        .build()
        .unwrap();

    // Hand-build a workbook whose Value column holds text garbage.
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Label").unwrap();
    sheet.write_string(0, 1, "Value").unwrap();
    sheet.write_string(1, 0, "ok").unwrap();
    sheet.write_number(1, 1, 2.5).unwrap();
    sheet.write_string(2, 0, "bad").unwrap();
    sheet.write_string(2, 1, "not a number").unwrap();
    let buffer = workbook.save_to_buffer().unwrap();

    let back: Vec<Measure> = SheetImporter::new(&schema).read(Cursor::new(buffer)).unwrap();
    assert_eq!(
        back,
        vec![
            Measure { label: "ok".to_string(), value: 2.5 },
            Measure { label: "bad".to_string(), value: 0.0 },
        ]
    );
}
