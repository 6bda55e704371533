//! Column name resolution

use crate::config::ColumnRange;
use crate::model::{number_to_string, DateFormat};

use super::cell::SourceCell;

/// Name given to a column that has none, from its 0-based position
pub fn placeholder_name(index: usize) -> String {
    format!("column-{}", index + 1)
}

/// Where the column names of a load come from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderSource<'r> {
    /// Custom names padded with placeholders; cells of the first row are not used
    Synthesized,
    /// Names read from the cells of the first row
    FirstRow(&'r [SourceCell]),
}

/// Builds the ordered, non-empty list of column names
#[derive(Debug, Clone, Copy)]
pub struct HeaderNormalizer<'a> {
    custom: &'a [String],
    no_header: bool,
    text_columns: &'a ColumnRange,
    dates: &'a DateFormat,
}

impl<'a> HeaderNormalizer<'a> {
    pub fn new(
        custom: &'a [String],
        no_header: bool,
        text_columns: &'a ColumnRange,
        dates: &'a DateFormat,
    ) -> Self {
        Self {
            custom,
            no_header,
            text_columns,
            dates,
        }
    }

    /// Whether the first row of the range is consumed as the header row.
    ///
    /// This holds even when custom names replace its cells.
    pub fn consumes_first_row(&self) -> bool {
        !self.no_header
    }

    /// Custom names and no-header mode win over the first row's cells
    pub fn source<'r>(&self, first_row: &'r [SourceCell]) -> HeaderSource<'r> {
        if self.no_header || !self.custom.is_empty() {
            HeaderSource::Synthesized
        } else {
            HeaderSource::FirstRow(first_row)
        }
    }

    /// Resolve names for a first row `first_row.len()` cells wide
    pub fn normalize(&self, first_row: &[SourceCell]) -> Vec<String> {
        let mut header = match self.source(first_row) {
            HeaderSource::Synthesized => self.synthesized(first_row.len()),
            HeaderSource::FirstRow(cells) => self.from_row(cells),
        };
        fix_blank_names(&mut header);
        header
    }

    fn synthesized(&self, column_hint: usize) -> Vec<String> {
        let mut header: Vec<String> = self.custom.to_vec();
        while header.len() < column_hint {
            header.push(placeholder_name(header.len()));
        }
        header
    }

    fn from_row(&self, cells: &[SourceCell]) -> Vec<String> {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                SourceCell::Blank | SourceCell::Error(_) => placeholder_name(i),
                SourceCell::Date(millis) => self.dates.format_millis(*millis),
                SourceCell::Number(n) if self.text_columns.contains(i, cells.len()) => {
                    number_to_string(*n)
                }
                SourceCell::Number(n) => format!("{:?}", n),
                SourceCell::Bool(b) => b.to_string(),
                SourceCell::Text(s) | SourceCell::Untyped(s) => s.trim().to_string(),
                SourceCell::Formula(value) => value.resolve().render(self.dates),
            })
            .collect()
    }
}

/// Replace empty names with positional placeholders
pub fn fix_blank_names(header: &mut [String]) {
    for (i, name) in header.iter_mut().enumerate() {
        if name.trim().is_empty() {
            *name = placeholder_name(i);
        }
    }
}
