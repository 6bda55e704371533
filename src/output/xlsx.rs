//! Spreadsheet (xlsx) sink

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::config::MISSING_MARKER;
use crate::error::{Result, TableError};
use crate::model::{millis_to_serial, ColumnType, TypedTable};

use super::{CellOut, TableSink};

/// Writes one worksheet: a header row of column names, then the data.
///
/// Dates are stored as serials with a number format equivalent to the
/// column's pattern, so they read back as dates. Readers drop empty cells
/// from the used range, so an entirely missing last row gets the missing
/// marker in its first cell.
pub struct XlsxSink {
    path: PathBuf,
    sheet_name: String,
    worksheet: Worksheet,
    date_formats: Vec<Option<Format>>,
    row_count: usize,
    row_written: bool,
}

impl XlsxSink {
    pub fn new(path: &Path, sheet_name: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            sheet_name: sheet_name.to_string(),
            worksheet: Worksheet::new(),
            date_formats: Vec::new(),
            row_count: 0,
            row_written: false,
        }
    }
}

fn position(row: usize, col: usize) -> Result<(u32, u16)> {
    // row 0 holds the header
    let r = u32::try_from(row + 1)
        .map_err(|_| TableError::Write(format!("row {} exceeds the sheet size", row + 1)))?;
    let c = u16::try_from(col)
        .map_err(|_| TableError::Write(format!("column {} exceeds the sheet size", col + 1)))?;
    Ok((r, c))
}

impl TableSink for XlsxSink {
    fn begin(&mut self, table: &TypedTable) -> Result<()> {
        self.worksheet.set_name(&self.sheet_name)?;
        self.row_count = table.row_count();
        self.date_formats = table
            .columns()
            .iter()
            .map(|column| match &column.column_type {
                ColumnType::Date { format } => {
                    Some(Format::new().set_num_format(format.excel_format()))
                }
                _ => None,
            })
            .collect();

        let header = Format::new().set_bold();
        for (i, column) in table.columns().iter().enumerate() {
            let (_, col) = position(0, i)?;
            self.worksheet
                .write_string_with_format(0, col, &column.name, &header)?;
        }
        Ok(())
    }

    fn write_cell(&mut self, row: usize, col: usize, cell: CellOut<'_>) -> Result<()> {
        let (r, c) = position(row, col)?;
        if !matches!(cell, CellOut::Missing(None)) {
            self.row_written = true;
        }
        match cell {
            CellOut::Missing(None) => {}
            CellOut::Missing(Some(placeholder)) => {
                self.worksheet.write_string(r, c, placeholder)?;
            }
            CellOut::Number(n) => {
                self.worksheet.write_number(r, c, n)?;
            }
            CellOut::Date { millis, text, .. } => match self.date_formats.get(col) {
                Some(Some(format)) => {
                    self.worksheet
                        .write_number_with_format(r, c, millis_to_serial(millis), format)?;
                }
                _ => {
                    self.worksheet.write_string(r, c, &text)?;
                }
            },
            CellOut::Text(text) => {
                self.worksheet.write_string(r, c, text.into_owned())?;
            }
        }
        Ok(())
    }

    fn end_row(&mut self, row: usize, _weight: f64) -> Result<()> {
        if row + 1 == self.row_count && !self.row_written && !self.date_formats.is_empty() {
            let (r, _) = position(row, 0)?;
            self.worksheet.write_string(r, 0, MISSING_MARKER)?;
        }
        self.row_written = false;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(std::mem::replace(&mut self.worksheet, Worksheet::new()));
        workbook.save(&self.path)?;
        Ok(())
    }
}
