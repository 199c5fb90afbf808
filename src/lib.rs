//! sheetbind - declarative struct ↔ spreadsheet marshalling
//!
//! This library maps typed Rust records onto worksheet rows through a
//! per-type [`Schema`] of field descriptors: column title, placement
//! order, pass direction, cell kind, formatting and validation metadata,
//! plus accessor closures for reading and writing the underlying field.
//!
//! # Features
//!
//! - Builder-style schema declaration, validated and cached per type
//! - Bidirectional type coercion with silent default-on-failure semantics
//! - Multi-sheet pagination under a configurable row ceiling
//! - Per-column statistics summed into a trailing aggregate row
//! - Bounded-memory export through a fixed row window
//! - Template export (header and validation scaffold only)
//!
//! # Example
//!
//! ```no_run
//! use sheetbind::{Field, Schema, SheetExporter, SheetImporter, ValueKind};
//!
//! #[derive(Debug, Default)]
//! struct Sale {
//!     product: String,
//!     amount: f64,
//! }
//!
//! let schema: Schema<Sale> = Schema::builder()
//!     .field(
//!         Field::new("Product")
//!             .order(1)
//!             .get(|s: &Sale| s.product.clone())
//!             .set(|s, v| s.product = v.to_text()),
//!     )
//!     .field(
//!         Field::new("Amount")
//!             .order(2)
//!             .numeric()
//!             .kind(ValueKind::Float)
//!             .statistics()
//!             .get(|s: &Sale| s.amount)
//!             .set(|s, v| s.amount = v.to_f64()),
//!     )
//!     .build()?;
//!
//! let items = vec![Sale { product: "Widget".into(), amount: 10.5 }];
//! SheetExporter::new(&schema)
//!     .sheet_name("Sales")
//!     .write_path(&items, std::path::Path::new("sales.xlsx"))?;
//!
//! let back: Vec<Sale> = SheetImporter::new(&schema)
//!     .read_path(std::path::Path::new("sales.xlsx"))?;
//! # Ok::<(), sheetbind::SheetError>(())
//! ```

pub mod convert;
pub mod error;
pub mod excel;
pub mod schema;
mod style;
pub mod value;

// Re-export the types one schema declaration touches
pub use convert::Converter;
pub use error::{SheetError, SheetResult};
pub use excel::{SheetExporter, SheetImporter};
pub use schema::{Align, CellKind, Direction, Field, Schema, SchemaBuilder, ValueKind};
pub use value::{round_with, CellValue, Rounding};
