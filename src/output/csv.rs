//! Delimited text sink

use std::fs::File;
use std::path::Path;

use crate::error::Result;
use crate::model::{number_to_string, TypedTable};

use super::{CellOut, TableSink};

/// Writes a header record of column names followed by one record per row
pub struct CsvSink {
    writer: csv::Writer<File>,
    record: Vec<String>,
}

impl CsvSink {
    pub fn create(path: &Path, delimiter: u8) -> Result<Self> {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(path)?;
        Ok(Self {
            writer,
            record: Vec::new(),
        })
    }
}

impl TableSink for CsvSink {
    fn begin(&mut self, table: &TypedTable) -> Result<()> {
        self.writer
            .write_record(table.columns().iter().map(|c| c.name.as_str()))?;
        Ok(())
    }

    fn write_cell(&mut self, _row: usize, _col: usize, cell: CellOut<'_>) -> Result<()> {
        self.record.push(match cell {
            CellOut::Missing(placeholder) => placeholder.unwrap_or_default().to_string(),
            CellOut::Number(n) => number_to_string(n),
            CellOut::Date { text, .. } => text,
            CellOut::Text(text) => text.into_owned(),
        });
        Ok(())
    }

    fn end_row(&mut self, _row: usize, _weight: f64) -> Result<()> {
        self.writer.write_record(&self.record)?;
        self.record.clear();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
