//! ARFF sink, gzip-compressed when the destination ends in `.gz`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::config::MISSING_MARKER;
use crate::error::Result;
use crate::model::{number_to_string, ColumnType, TypedTable};
use crate::parser::arff::{quote_if_needed, KEYWORD_ATTRIBUTE, KEYWORD_DATA, KEYWORD_RELATION};

use super::{CellOut, TableSink};

enum Output {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Output::Plain(w) => w.write(buf),
            Output::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Output::Plain(w) => w.flush(),
            Output::Gzip(w) => w.flush(),
        }
    }
}

/// Writes declarations for every column, then dense data rows.
///
/// Missing cells are always written as `?`; a placeholder would not be a
/// valid value of most column types.
pub struct ArffSink {
    out: Option<Output>,
    relation: Option<String>,
    fields: Vec<String>,
}

impl ArffSink {
    pub fn create(path: &Path, relation: Option<String>) -> Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        let compressed = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gz"));
        let out = if compressed {
            Output::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Output::Plain(file)
        };
        Ok(Self {
            out: Some(out),
            relation,
            fields: Vec::new(),
        })
    }

    fn out(&mut self) -> Result<&mut Output> {
        self.out.as_mut().ok_or_else(|| {
            crate::error::TableError::Write("ARFF output already finished".to_string())
        })
    }
}

/// Declaration of a column's type
fn attribute_type(column_type: &ColumnType) -> String {
    match column_type {
        ColumnType::Numeric => "numeric".to_string(),
        ColumnType::Date { format } => format!("date {}", quote_if_needed(format.pattern())),
        ColumnType::Nominal { labels } => {
            let labels: Vec<String> = labels.iter().map(|l| quote_if_needed(l)).collect();
            format!("{{{}}}", labels.join(","))
        }
        ColumnType::Text => "string".to_string(),
    }
}

impl TableSink for ArffSink {
    fn begin(&mut self, table: &TypedTable) -> Result<()> {
        let relation = self.relation.clone().unwrap_or_else(|| table.name.clone());
        let out = self.out()?;
        writeln!(out, "{} {}", KEYWORD_RELATION, quote_if_needed(&relation))?;
        writeln!(out)?;
        for column in table.columns() {
            write!(
                out,
                "{} {} {}",
                KEYWORD_ATTRIBUTE,
                quote_if_needed(&column.name),
                attribute_type(&column.column_type)
            )?;
            if let Some(weight) = column.weight {
                write!(out, " {{{}}}", number_to_string(weight))?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
        writeln!(out, "{}", KEYWORD_DATA)?;
        Ok(())
    }

    fn write_cell(&mut self, _row: usize, _col: usize, cell: CellOut<'_>) -> Result<()> {
        self.fields.push(match cell {
            CellOut::Missing(_) => MISSING_MARKER.to_string(),
            CellOut::Number(n) => number_to_string(n),
            CellOut::Date { text, .. } => quote_if_needed(&text),
            CellOut::Text(text) => quote_if_needed(&text),
        });
        Ok(())
    }

    fn end_row(&mut self, _row: usize, weight: f64) -> Result<()> {
        let mut line = self.fields.join(",");
        self.fields.clear();
        if weight != 1.0 {
            line.push_str(&format!(",{{{}}}", number_to_string(weight)));
        }
        let out = self.out()?;
        writeln!(out, "{}", line)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        match self.out.take() {
            Some(Output::Plain(mut w)) => w.flush()?,
            Some(Output::Gzip(w)) => w.finish()?.flush()?,
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSchema, DateFormat, TypedRow, TypedValue};
    use crate::output::TableWriter;

    #[test]
    fn test_declarations_and_rows() {
        let mut table = TypedTable::new(
            "my data",
            vec![
                ColumnSchema::new("n", 0, ColumnType::Numeric).with_weight(2.0),
                ColumnSchema::new("c", 1, ColumnType::nominal(["a b", "c"])),
                ColumnSchema::new(
                    "d",
                    2,
                    ColumnType::Date {
                        format: DateFormat::new("yyyy-MM-dd").unwrap(),
                    },
                ),
            ],
        );
        table
            .push_row(TypedRow::weighted(
                vec![TypedValue::Numeric(3.0), TypedValue::Nominal(0), TypedValue::Date(0)],
                0.5,
            ))
            .unwrap();
        table
            .push_row(TypedRow::new(vec![TypedValue::Missing; 3]))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.arff");
        let mut sink = ArffSink::create(&path, None).unwrap();
        TableWriter::default().write(&table, &mut sink).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let expected = "\
@relation 'my data'

@attribute n numeric {2}
@attribute c {'a b',c}
@attribute d date yyyy-MM-dd

@data
3,'a b',1970-01-01,{0.5}
?,?,?
";
        assert_eq!(text, expected);
    }
}
