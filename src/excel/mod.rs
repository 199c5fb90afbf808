//! Worksheet marshalling pipelines.
//!
//! - Import: xlsx container → typed records, driven by header/title
//!   matching against the schema.
//! - Export: typed records → xlsx container, with pagination, statistics
//!   and bounded-memory row buffering.

mod exporter;
mod importer;
mod window;

pub use exporter::{SheetExporter, DEFAULT_MAX_ROWS_PER_SHEET, DEFAULT_WINDOW_ROWS};
pub use importer::SheetImporter;
