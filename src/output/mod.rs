//! Export of typed tables, plus terminal and JSON rendering for the CLI

mod arff;
mod csv;
mod json;
mod terminal;
mod xlsx;

use std::borrow::Cow;
use std::path::Path;

use log::info;

use crate::config::WriterConfig;
use crate::error::{Result, TableError};
use crate::model::{ColumnType, DateFormat, TypedTable, TypedValue};

pub use self::arff::ArffSink;
pub use self::csv::CsvSink;
pub use self::json::{schema_to_json, SchemaReport};
pub use self::terminal::{render_preview, render_schema};
pub use self::xlsx::XlsxSink;

/// One cell as handed to a sink
#[derive(Debug, Clone, PartialEq)]
pub enum CellOut<'a> {
    /// Missing value with the configured placeholder, if any
    Missing(Option<&'a str>),
    Number(f64),
    /// Date with its text under the column's pattern
    Date {
        millis: i64,
        text: String,
        format: &'a DateFormat,
    },
    Text(Cow<'a, str>),
}

/// Destination of a table export, fed structure first and then row by row
pub trait TableSink {
    /// Write the header or declarations
    fn begin(&mut self, table: &TypedTable) -> Result<()>;

    fn write_cell(&mut self, row: usize, col: usize, cell: CellOut<'_>) -> Result<()>;

    /// Close a row; `weight` is 1.0 unless the source declared one
    fn end_row(&mut self, row: usize, weight: f64) -> Result<()>;

    /// Flush and close the destination
    fn finish(&mut self) -> Result<()>;
}

/// Walks a typed table and feeds its cells to a sink
///
/// Values are written by column type; nothing is re-inferred.
#[derive(Debug, Clone, Default)]
pub struct TableWriter {
    config: WriterConfig,
}

impl TableWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn write(&self, table: &TypedTable, sink: &mut dyn TableSink) -> Result<()> {
        sink.begin(table)?;

        let placeholder = self.config.missing_placeholder.as_deref();
        for (r, row) in table.rows().iter().enumerate() {
            for (c, column) in table.columns().iter().enumerate() {
                let value = row.get(c).copied().unwrap_or(TypedValue::Missing);
                let cell = match (value, &column.column_type) {
                    (TypedValue::Missing, _) => CellOut::Missing(placeholder),
                    (TypedValue::Numeric(n), _) => CellOut::Number(n),
                    (TypedValue::Date(millis), ColumnType::Date { format }) => CellOut::Date {
                        millis,
                        text: format.format_millis(millis),
                        format,
                    },
                    _ => match table.display_value(r, c) {
                        Some(text) => CellOut::Text(text),
                        None => CellOut::Missing(placeholder),
                    },
                };
                sink.write_cell(r, c, cell)?;
            }
            sink.end_row(r, row.weight)?;
        }

        sink.finish()
    }
}

/// Destination formats chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    Xlsx,
    Csv,
    Tsv,
    Arff,
}

impl SinkFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_lowercase();
        if name.ends_with(".arff") || name.ends_with(".arff.gz") {
            return Ok(SinkFormat::Arff);
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "xlsx" => Ok(SinkFormat::Xlsx),
            "csv" => Ok(SinkFormat::Csv),
            "tsv" => Ok(SinkFormat::Tsv),
            "" => Err(TableError::UnsupportedFormat("(no extension)".to_string())),
            other => Err(TableError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Factory for sinks based on the destination's extension
pub struct WriterFactory;

impl WriterFactory {
    pub fn create(path: &Path, config: &WriterConfig) -> Result<Box<dyn TableSink>> {
        Ok(match SinkFormat::from_path(path)? {
            SinkFormat::Xlsx => Box::new(XlsxSink::new(path, &config.sheet_name)),
            SinkFormat::Csv => Box::new(CsvSink::create(path, config.delimiter)?),
            SinkFormat::Tsv => {
                let delimiter = if config.delimiter == b',' {
                    b'\t'
                } else {
                    config.delimiter
                };
                Box::new(CsvSink::create(path, delimiter)?)
            }
            SinkFormat::Arff => Box::new(ArffSink::create(path, config.relation.clone())?),
        })
    }
}

/// Write `table` to `path`, picking the format from the extension
pub fn write_table(table: &TypedTable, path: &Path, config: &WriterConfig) -> Result<()> {
    let mut sink = WriterFactory::create(path, config)?;
    TableWriter::new(config.clone()).write(table, sink.as_mut())?;
    info!(
        "Wrote '{}' to {}: {} column(s), {} row(s)",
        table.name,
        path.display(),
        table.column_count(),
        table.row_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSchema, TypedRow};

    #[derive(Default)]
    struct Recorder {
        header: Vec<String>,
        cells: Vec<String>,
        rows: usize,
        finished: bool,
    }

    impl TableSink for Recorder {
        fn begin(&mut self, table: &TypedTable) -> Result<()> {
            self.header = table.columns().iter().map(|c| c.name.clone()).collect();
            Ok(())
        }

        fn write_cell(&mut self, _row: usize, _col: usize, cell: CellOut<'_>) -> Result<()> {
            self.cells.push(match cell {
                CellOut::Missing(p) => format!("missing:{}", p.unwrap_or("")),
                CellOut::Number(n) => format!("number:{}", n),
                CellOut::Date { text, .. } => format!("date:{}", text),
                CellOut::Text(t) => format!("text:{}", t),
            });
            Ok(())
        }

        fn end_row(&mut self, _row: usize, _weight: f64) -> Result<()> {
            self.rows += 1;
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn sample() -> TypedTable {
        let mut table = TypedTable::new(
            "sample",
            vec![
                ColumnSchema::new("n", 0, ColumnType::Numeric),
                ColumnSchema::new(
                    "d",
                    1,
                    ColumnType::Date {
                        format: DateFormat::new("yyyy-MM-dd").unwrap(),
                    },
                ),
                ColumnSchema::new("c", 2, ColumnType::nominal(["a", "b"])),
                ColumnSchema::new("t", 3, ColumnType::Text),
            ],
        );
        let text = table.intern("free");
        table
            .push_row(TypedRow::new(vec![
                TypedValue::Numeric(1.5),
                TypedValue::Date(1_577_836_800_000),
                TypedValue::Nominal(1),
                TypedValue::Text(text),
            ]))
            .unwrap();
        table
            .push_row(TypedRow::new(vec![TypedValue::Missing; 4]))
            .unwrap();
        table
    }

    #[test]
    fn test_writer_maps_values_by_column_type() {
        let mut recorder = Recorder::default();
        TableWriter::default().write(&sample(), &mut recorder).unwrap();
        assert_eq!(recorder.header, vec!["n", "d", "c", "t"]);
        assert_eq!(
            &recorder.cells[..4],
            &["number:1.5", "date:2020-01-01", "text:b", "text:free"]
        );
        assert!(recorder.cells[4..].iter().all(|c| c == "missing:"));
        assert_eq!(recorder.rows, 2);
        assert!(recorder.finished);
    }

    #[test]
    fn test_missing_placeholder() {
        let mut recorder = Recorder::default();
        TableWriter::new(WriterConfig::default().with_missing_placeholder("NA"))
            .write(&sample(), &mut recorder)
            .unwrap();
        assert_eq!(recorder.cells[4], "missing:NA");
    }

    #[test]
    fn test_sink_format_from_path() {
        assert_eq!(SinkFormat::from_path(Path::new("a.xlsx")).unwrap(), SinkFormat::Xlsx);
        assert_eq!(SinkFormat::from_path(Path::new("a.TSV")).unwrap(), SinkFormat::Tsv);
        assert_eq!(SinkFormat::from_path(Path::new("a.arff.gz")).unwrap(), SinkFormat::Arff);
        assert!(matches!(
            SinkFormat::from_path(Path::new("a.parquet")),
            Err(TableError::UnsupportedFormat(ext)) if ext == "parquet"
        ));
        assert!(SinkFormat::from_path(Path::new("a.gz")).is_err());
    }
}
