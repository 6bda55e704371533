//! Collection of raw rows with ragged-row repair

use log::warn;

use crate::model::{RawRow, RawValue};

use super::cell::{CellClassifier, SourceCell};
use super::header::fix_blank_names;

/// Column names and the rows collected under them
#[derive(Debug, Default)]
pub struct ColumnArena {
    names: Vec<String>,
    rows: Vec<RawRow>,
}

impl ColumnArena {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            rows: Vec::new(),
        }
    }

    /// Current number of columns
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Append an unnamed column and patch every collected row with a missing value
    pub fn widen(&mut self) -> usize {
        self.names.push(String::new());
        for row in &mut self.rows {
            row.push(RawValue::Missing);
        }
        self.names.len()
    }

    fn push_row(&mut self, row: RawRow) {
        self.rows.push(row);
    }

    /// Pad every row to the current width
    fn pad(&mut self) {
        let width = self.width();
        for row in &mut self.rows {
            row.resize(width, RawValue::Missing);
        }
    }
}

/// Rectangular raw rows ready for type inference
#[derive(Debug)]
pub struct CollectedRows {
    pub header: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Reads data rows into raw rows, one slot per known column
pub struct RowCollector<'a> {
    classifier: CellClassifier<'a>,
    auto_extend_header: bool,
    arena: ColumnArena,
    dropped_cells: usize,
}

impl<'a> RowCollector<'a> {
    pub fn new(header: Vec<String>, classifier: CellClassifier<'a>, auto_extend_header: bool) -> Self {
        Self {
            classifier,
            auto_extend_header,
            arena: ColumnArena::new(header),
            dropped_cells: 0,
        }
    }

    /// Collect one source row; `None` stands for a row absent from the source
    pub fn collect_row(&mut self, cells: Option<&[SourceCell]>) {
        let mut row: RawRow = vec![RawValue::Missing; self.arena.width()];

        for (n, cell) in cells.unwrap_or_default().iter().enumerate() {
            if n >= self.arena.width() {
                if !self.auto_extend_header {
                    if !matches!(cell, SourceCell::Blank) {
                        self.dropped_cells += 1;
                    }
                    continue;
                }
                self.arena.widen();
                row.push(RawValue::Missing);
            }
            row[n] = self.classifier.classify(cell, n, self.arena.width());
        }

        self.arena.push_row(row);
    }

    /// Number of rows collected so far
    pub fn row_count(&self) -> usize {
        self.arena.rows.len()
    }

    /// Pad all rows to the final column count and name any added columns
    pub fn finish(mut self) -> CollectedRows {
        if self.dropped_cells > 0 {
            warn!(
                "Dropped {} cell(s) beyond the {} header column(s)",
                self.dropped_cells,
                self.arena.width()
            );
        }
        self.arena.pad();
        let ColumnArena { mut names, rows } = self.arena;
        fix_blank_names(&mut names);
        CollectedRows {
            header: names,
            rows,
        }
    }
}
