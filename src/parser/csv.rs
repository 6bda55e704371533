//! Delimited text loader (csv, tsv, txt)

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::LoaderConfig;
use crate::error::{Result, TableError};
use crate::model::{DateFormat, TypedTable, ISO_DATE_PATTERN};

use super::cell::SourceCell;
use super::pipeline::{LoadState, SourceGrid, StagedImport};
use super::{check_source, source_name, Loader};

/// Loader for delimited text files
///
/// Cells carry no type of their own, so every value goes through the
/// number / boolean / date / text cascade. Dates are recognized with the
/// configured pattern first and plain `yyyy-MM-dd` second.
pub struct CsvLoader {
    path: PathBuf,
    config: LoaderConfig,
    iso_dates: DateFormat,
    state: LoadState,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>, config: LoaderConfig) -> Result<Self> {
        let path = path.into();
        config.validate()?;
        check_source(&path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") && config.delimiter == b',' => {
                config.with_delimiter(b'\t')
            }
            _ => config,
        };
        Ok(Self {
            path,
            config,
            iso_dates: DateFormat::new(ISO_DATE_PATTERN)?,
            state: LoadState::Unloaded,
        })
    }

    fn stage(path: &Path, config: &LoaderConfig, iso_dates: &DateFormat) -> Result<StagedImport> {
        let grid = read_records(path, config.delimiter)?;
        StagedImport::stage(source_name(path), &grid, config, Some(iso_dates))
    }
}

impl Loader for CsvLoader {
    fn format_name(&self) -> &'static str {
        "CSV loader"
    }

    fn structure(&mut self) -> Result<TypedTable> {
        let (path, config, iso) = (&self.path, &self.config, &self.iso_dates);
        self.state.structure(|| Self::stage(path, config, iso))
    }

    fn data_set(&mut self) -> Result<TypedTable> {
        let (path, config, iso) = (&self.path, &self.config, &self.iso_dates);
        self.state.data_set(|| Self::stage(path, config, iso))
    }
}

/// Read every record as untyped cells
fn read_records(path: &Path, delimiter: u8) -> Result<SourceGrid> {
    let file = File::open(path).map_err(|e| TableError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(BufReader::new(file));

    let mut grid = SourceGrid::new();
    for result in reader.records() {
        let record = result?;
        let cells: Vec<SourceCell> = record
            .iter()
            .map(|field| SourceCell::Untyped(field.to_string()))
            .collect();
        grid.push(Some(cells));
    }
    debug!("{}: {} record(s)", path.display(), grid.len());
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnType, TypedValue};
    use std::io::Write;

    fn csv_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_infers_types() {
        let file = csv_file(".csv", "id,seen,count,ok\n1,2020-01-01,,true\n2,not-a-date,5,false\n");
        let mut loader = CsvLoader::new(file.path(), LoaderConfig::default()).unwrap();
        let table = loader.data_set().unwrap();

        assert!(table.columns()[0].is_numeric());
        assert_eq!(
            table.columns()[1].column_type,
            ColumnType::nominal(["2020-01-01", "not-a-date"])
        );
        assert!(table.columns()[2].is_numeric());
        assert_eq!(table.columns()[3].column_type, ColumnType::nominal(["false", "true"]));
        assert_eq!(table.rows()[0].values[2], TypedValue::Missing);
        assert_eq!(table.rows()[1].values[2], TypedValue::Numeric(5.0));
    }

    #[test]
    fn test_date_text_kept_as_nominal_label() {
        let file = csv_file(".csv", "id,seen,count\n1,2020-01-01,\n2,not-a-date,5\n");
        let mut loader = CsvLoader::new(file.path(), LoaderConfig::default()).unwrap();
        let table = loader.data_set().unwrap();
        assert_eq!(
            table.columns()[1].column_type,
            ColumnType::nominal(["2020-01-01", "not-a-date"])
        );
        assert_eq!(table.display_value(0, 1).as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn test_number_in_date_column_is_rejected() {
        let file = csv_file(".csv", "when\n2020-01-01\n5\n");
        let mut loader = CsvLoader::new(file.path(), LoaderConfig::default()).unwrap();
        assert!(matches!(
            loader.data_set(),
            Err(TableError::TypeMismatch { row: 2, .. })
        ));
    }

    #[test]
    fn test_configured_date_pattern() {
        let file = csv_file(".csv", "when\n2020-01-01\n2020-01-02\n");
        let config = LoaderConfig::default().with_date_format("yyyy-MM-dd".parse().unwrap());
        let mut loader = CsvLoader::new(file.path(), config).unwrap();
        let table = loader.data_set().unwrap();
        assert!(matches!(table.columns()[0].column_type, ColumnType::Date { .. }));
        assert_eq!(table.rows()[0].values[0], TypedValue::Date(1_577_836_800_000));
    }

    #[test]
    fn test_tsv_uses_tab() {
        let file = csv_file(".tsv", "a\tb\n1\tx\n");
        let mut loader = CsvLoader::new(file.path(), LoaderConfig::default()).unwrap();
        let table = loader.structure().unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_empty_file() {
        let file = csv_file(".csv", "");
        let mut loader = CsvLoader::new(file.path(), LoaderConfig::default()).unwrap();
        assert!(matches!(loader.structure(), Err(TableError::EmptySource(_))));
    }

    #[test]
    fn test_ragged_rows_are_extended() {
        let file = csv_file(".csv", "a\n1,2,3\n4\n");
        let config = LoaderConfig::default().with_auto_extend_header(true);
        let mut loader = CsvLoader::new(file.path(), config).unwrap();
        let table = loader.data_set().unwrap();
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "column-2", "column-3"]);
        assert_eq!(table.rows()[1].values[2], TypedValue::Missing);
    }
}
