//! Export pipeline: typed records → worksheet rows.
//!
//! Handles multi-sheet pagination under the row ceiling, header emission
//! with per-column width/validation/prompt, windowed row emission, the
//! per-column statistics accumulator and its trailing aggregate row, and
//! the optional merged banner row above the header.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{DataValidation, Workbook, Worksheet};
use tracing::debug;

use crate::convert::{render, Rendered};
use crate::error::SheetResult;
use crate::excel::window::{RenderedCell, RenderedRow, RowWindow};
use crate::schema::{Field, Pass, Schema};
use crate::style::SheetStyles;

/// One sheet holds at most this many data rows unless overridden.
pub const DEFAULT_MAX_ROWS_PER_SHEET: usize = 65_536;

/// Rendered rows buffered in memory before a batch write.
pub const DEFAULT_WINDOW_ROWS: usize = 500;

/// Validation and prompt constraints cover this many data rows.
const VALIDATION_ROWS: u32 = 100;

/// One export call over a schema.
pub struct SheetExporter<'a, T> {
    schema: &'a Schema<T>,
    sheet_name: String,
    title: Option<String>,
    max_rows_per_sheet: usize,
    window_rows: usize,
}

impl<'a, T> SheetExporter<'a, T> {
    pub fn new(schema: &'a Schema<T>) -> Self {
        Self {
            schema,
            sheet_name: "Sheet1".to_string(),
            title: None,
            max_rows_per_sheet: DEFAULT_MAX_ROWS_PER_SHEET,
            window_rows: DEFAULT_WINDOW_ROWS,
        }
    }

    /// Base sheet name; overflow sheets append their index.
    pub fn sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = name.to_string();
        self
    }

    /// Banner text merged across the header width, above the header row.
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Data-row ceiling per sheet; exceeding items overflow onto
    /// additional sheets.
    pub fn max_rows_per_sheet(mut self, rows: usize) -> Self {
        self.max_rows_per_sheet = rows.max(1);
        self
    }

    /// Size of the in-memory row window flushed per batch.
    pub fn window_rows(mut self, rows: usize) -> Self {
        self.window_rows = rows.max(1);
        self
    }

    /// Export records to any byte sink.
    pub fn write<W: Write>(&self, items: &[T], mut writer: W) -> SheetResult<()> {
        let mut workbook = self.build_workbook(items, Pass::Export)?;
        let buffer = workbook.save_to_buffer()?;
        writer.write_all(&buffer)?;
        writer.flush()?;
        Ok(())
    }

    /// Export records to a file on disk.
    pub fn write_path(&self, items: &[T], path: &Path) -> SheetResult<()> {
        let mut workbook = self.build_workbook(items, Pass::Export)?;
        workbook.save(path)?;
        Ok(())
    }

    /// Emit the header/validation scaffold only, for template downloads.
    /// Uses the import-direction fields, since the template is what users
    /// fill in for a later import.
    pub fn write_template<W: Write>(&self, mut writer: W) -> SheetResult<()> {
        let mut workbook = self.build_workbook(&[], Pass::Import)?;
        let buffer = workbook.save_to_buffer()?;
        writer.write_all(&buffer)?;
        writer.flush()?;
        Ok(())
    }

    /// Template scaffold written to a file on disk.
    pub fn write_template_path(&self, path: &Path) -> SheetResult<()> {
        let mut workbook = self.build_workbook(&[], Pass::Import)?;
        workbook.save(path)?;
        Ok(())
    }

    fn build_workbook(&self, items: &[T], pass: Pass) -> SheetResult<Workbook> {
        let fields = self.schema.fields_for(pass);
        let styles = SheetStyles::build();
        let per_sheet = self.max_rows_per_sheet;
        let sheet_count = items.len().div_ceil(per_sheet).max(1);
        let row_height = self.schema.max_row_height();
        debug!(sheets = sheet_count, rows = items.len(), "export pagination");

        let mut workbook = Workbook::new();
        for index in 0..sheet_count {
            // Constant-memory worksheets spill each completed row to a
            // backing temp file, so peak memory is the row window rather
            // than the dataset. Rows must be written in increasing order;
            // every write below keeps that order.
            let worksheet = workbook.add_worksheet_with_constant_memory();
            let name = if index == 0 {
                self.sheet_name.clone()
            } else {
                format!("{}{}", self.sheet_name, index)
            };
            worksheet.set_name(&name)?;

            let mut cursor: u32 = 0;
            if let Some(title) = &self.title {
                if fields.len() > 1 {
                    worksheet.merge_range(0, 0, 0, (fields.len() - 1) as u16, title, &styles.title)?;
                } else {
                    worksheet.write_string_with_format(0, 0, title, &styles.title)?;
                }
                worksheet.set_row_height(0, 30)?;
                cursor = 1;
            }
            self.emit_header(worksheet, &fields, &styles, cursor)?;
            cursor += 1;

            let start = index * per_sheet;
            let end = (start + per_sheet).min(items.len());
            let stats =
                self.emit_rows(worksheet, &fields, &styles, &items[start..end], &mut cursor, row_height)?;
            emit_statistics(worksheet, &styles, &stats, cursor)?;
        }
        Ok(workbook)
    }

    /// One header cell per field; column width, dropdown constraint and
    /// prompt are applied once per column.
    fn emit_header(
        &self,
        worksheet: &mut Worksheet,
        fields: &[&Field<T>],
        styles: &SheetStyles,
        row: u32,
    ) -> SheetResult<()> {
        for (idx, field) in fields.iter().enumerate() {
            let col = idx as u16;
            worksheet.write_string_with_format(row, col, &field.title, &styles.header)?;
            worksheet.set_column_width(col, field.width)?;

            let data_first = row + 1;
            let data_last = row + VALIDATION_ROWS;
            if !field.combo.is_empty() {
                let options: Vec<&str> = field.combo.iter().map(String::as_str).collect();
                let mut validation = DataValidation::new().allow_list_strings(&options)?;
                if let Some(prompt) = &field.prompt {
                    validation = validation.set_input_message(prompt)?;
                }
                worksheet.add_data_validation(data_first, col, data_last, col, &validation)?;
            } else if let Some(prompt) = &field.prompt {
                let validation = DataValidation::new()
                    .allow_any_value()
                    .set_input_message(prompt)?;
                worksheet.add_data_validation(data_first, col, data_last, col, &validation)?;
            }
        }
        Ok(())
    }

    /// Render this sheet's slice through the row window, accumulating
    /// per-column sums for statistics-flagged fields.
    fn emit_rows(
        &self,
        worksheet: &mut Worksheet,
        fields: &[&Field<T>],
        styles: &SheetStyles,
        slice: &[T],
        cursor: &mut u32,
        row_height: f64,
    ) -> SheetResult<BTreeMap<u16, f64>> {
        let mut stats: BTreeMap<u16, f64> = BTreeMap::new();
        let mut window = RowWindow::new(self.window_rows);
        for item in slice {
            let mut cells = Vec::with_capacity(fields.len());
            for (idx, field) in fields.iter().enumerate() {
                let col = idx as u16;
                let rendered = render(&field.read(item), field);
                if field.statistics {
                    // Non-numeric renderings contribute zero, per column.
                    let contribution = rendered.text().trim().parse::<f64>().unwrap_or(0.0);
                    *stats.entry(col).or_insert(0.0) += contribution;
                }
                cells.push(RenderedCell {
                    col,
                    value: rendered,
                    align: field.align,
                });
            }
            if let Some(batch) = window.push(RenderedRow { cells }) {
                flush_batch(worksheet, styles, &batch, cursor, row_height)?;
            }
        }
        let rest = window.drain();
        if !rest.is_empty() {
            flush_batch(worksheet, styles, &rest, cursor, row_height)?;
        }
        Ok(stats)
    }
}

/// Write one window batch and advance the row cursor.
fn flush_batch(
    worksheet: &mut Worksheet,
    styles: &SheetStyles,
    batch: &[RenderedRow],
    cursor: &mut u32,
    row_height: f64,
) -> SheetResult<()> {
    for row in batch {
        worksheet.set_row_height(*cursor, row_height)?;
        for cell in &row.cells {
            let format = styles.data_for(cell.align);
            match &cell.value {
                Rendered::Number(n) => {
                    worksheet.write_number_with_format(*cursor, cell.col, *n, format)?;
                }
                Rendered::Text(s) => {
                    worksheet.write_string_with_format(*cursor, cell.col, s, format)?;
                }
                Rendered::Blank => {
                    worksheet.write_blank(*cursor, cell.col, format)?;
                }
            }
        }
        *cursor += 1;
    }
    Ok(())
}

/// Trailing aggregate row, one formatted sum per accumulating column.
/// The accumulator is per sheet; the caller starts fresh on the next one.
fn emit_statistics(
    worksheet: &mut Worksheet,
    styles: &SheetStyles,
    stats: &BTreeMap<u16, f64>,
    row: u32,
) -> SheetResult<()> {
    if stats.is_empty() {
        return Ok(());
    }
    worksheet.write_string_with_format(row, 0, "Total", &styles.total)?;
    for (col, sum) in stats {
        worksheet.write_string_with_format(row, *col, &format!("{sum:.2}"), &styles.total)?;
    }
    Ok(())
}
