//! Bounded row buffer used during export.
//!
//! Rows are rendered into the window ahead of any worksheet write; when
//! the window fills, the whole batch is handed back for writing and the
//! buffer is recycled. The exporter writes batches into constant-memory
//! worksheets, which spill completed rows to a backing temp file, so
//! peak memory is the window size, not the dataset size.

use crate::convert::Rendered;
use crate::schema::Align;

/// One cell of a fully rendered row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedCell {
    pub col: u16,
    pub value: Rendered,
    pub align: Align,
}

/// One fully rendered data row, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedRow {
    pub cells: Vec<RenderedCell>,
}

/// Fixed-capacity buffer of rendered rows.
#[derive(Debug)]
pub(crate) struct RowWindow {
    capacity: usize,
    rows: Vec<RenderedRow>,
}

impl RowWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Buffer one row. Returns the full batch when the window fills.
    pub(crate) fn push(&mut self, row: RenderedRow) -> Option<Vec<RenderedRow>> {
        self.rows.push(row);
        if self.rows.len() >= self.capacity {
            Some(std::mem::take(&mut self.rows))
        } else {
            None
        }
    }

    /// Remaining buffered rows at end of sheet.
    pub(crate) fn drain(&mut self) -> Vec<RenderedRow> {
        std::mem::take(&mut self.rows)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: usize) -> RenderedRow {
        RenderedRow {
            cells: vec![RenderedCell {
                col: 0,
                value: Rendered::Number(n as f64),
                align: Align::General,
            }],
        }
    }

    #[test]
    fn test_push_returns_batch_at_capacity() {
        let mut window = RowWindow::new(3);
        assert!(window.push(row(0)).is_none());
        assert!(window.push(row(1)).is_none());
        let batch = window.push(row(2)).expect("window full");
        assert_eq!(batch.len(), 3);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_drain_returns_partial_batch() {
        let mut window = RowWindow::new(10);
        window.push(row(0));
        window.push(row(1));
        let rest = window.drain();
        assert_eq!(rest.len(), 2);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_zero_capacity_clamps_to_one() {
        let mut window = RowWindow::new(0);
        assert!(window.push(row(0)).is_some());
    }
}
