//! Excel file loader (xlsx, xlsm, xlsb, xls, ods)

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};

use crate::config::LoaderConfig;
use crate::error::{Result, TableError};
use crate::model::{millis_to_serial, TypedTable};

use super::cell::{FormulaValue, SourceCell};
use super::pipeline::{LoadState, SourceGrid, StagedImport};
use super::{check_source, source_name, Loader};

/// Loader for spreadsheet workbooks
pub struct ExcelLoader {
    path: PathBuf,
    config: LoaderConfig,
    state: LoadState,
}

impl ExcelLoader {
    pub fn new(path: impl Into<PathBuf>, config: LoaderConfig) -> Result<Self> {
        let path = path.into();
        config.validate()?;
        check_source(&path)?;
        Ok(Self {
            path,
            config,
            state: LoadState::Unloaded,
        })
    }

    fn stage(path: &Path, config: &LoaderConfig) -> Result<StagedImport> {
        let grid = read_worksheet(path, config.sheet_index)?;
        StagedImport::stage(source_name(path), &grid, config, None)
    }
}

impl Loader for ExcelLoader {
    fn format_name(&self) -> &'static str {
        "Excel loader"
    }

    fn structure(&mut self) -> Result<TypedTable> {
        let (path, config) = (&self.path, &self.config);
        self.state.structure(|| Self::stage(path, config))
    }

    fn data_set(&mut self) -> Result<TypedTable> {
        let (path, config) = (&self.path, &self.config);
        self.state.data_set(|| Self::stage(path, config))
    }
}

/// Read the selected worksheet into a grid addressed by sheet row and column.
///
/// The workbook is closed when this returns, on success or failure.
fn read_worksheet(path: &Path, sheet_index: usize) -> Result<SourceGrid> {
    let mut workbook = open_workbook_auto(path).map_err(|e| TableError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let sheets = workbook.sheet_names();
    if sheets.is_empty() {
        return Err(TableError::EmptySource(format!(
            "{} (no worksheets)",
            path.display()
        )));
    }
    let index = sheet_index.min(sheets.len());
    if index != sheet_index {
        warn!(
            "Sheet index {} out of range, using last sheet ({})",
            sheet_index,
            sheets.len()
        );
    }
    let sheet_name = sheets[index - 1].clone();
    debug!("sheet: {} ({})", index, sheet_name);

    let range: Range<Data> =
        workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| TableError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: format!("failed to read sheet '{}': {}", sheet_name, e),
            })?;

    let formulas = match workbook.worksheet_formula(&sheet_name) {
        Ok(formulas) => Some(formulas),
        Err(e) => {
            debug!("No formulas for sheet '{}': {}", sheet_name, e);
            None
        }
    };

    Ok(range_to_grid(&range, formulas.as_ref()))
}

fn range_to_grid(range: &Range<Data>, formulas: Option<&Range<String>>) -> SourceGrid {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: SourceGrid = vec![None; start_row as usize];
    for (i, row) in range.rows().enumerate() {
        let abs_row = start_row + i as u32;
        let mut cells: Vec<SourceCell> = vec![SourceCell::Blank; start_col as usize];

        for (j, data) in row.iter().enumerate() {
            let abs_col = start_col + j as u32;
            let has_formula = formulas
                .and_then(|f| f.get_value((abs_row, abs_col)))
                .is_some_and(|f| !f.is_empty());
            cells.push(if has_formula {
                SourceCell::Formula(formula_value(data))
            } else {
                convert_cell(data)
            });
        }

        // a row ends at its last non-blank cell
        while matches!(cells.last(), Some(SourceCell::Blank)) {
            cells.pop();
        }
        grid.push(if cells.is_empty() { None } else { Some(cells) });
    }
    grid
}

fn convert_cell(cell: &Data) -> SourceCell {
    match cell {
        Data::Empty => SourceCell::Blank,
        Data::String(s) => SourceCell::Text(s.clone()),
        Data::Float(f) => SourceCell::Number(*f),
        Data::Int(i) => SourceCell::Number(*i as f64),
        Data::Bool(b) => SourceCell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => SourceCell::Number(dt.as_f64()),
        Data::DateTime(dt) => match datetime_millis(dt) {
            Some(millis) => SourceCell::Date(millis),
            None => SourceCell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_iso_millis(s) {
            Some(millis) => SourceCell::Date(millis),
            None => SourceCell::Text(s.clone()),
        },
        Data::DurationIso(s) => SourceCell::Text(s.clone()),
        Data::Error(e) => SourceCell::Error(e.to_string()),
    }
}

fn formula_value(cell: &Data) -> FormulaValue {
    match cell {
        Data::Empty => FormulaValue::Empty,
        Data::String(s) => FormulaValue::Text(s.clone()),
        Data::Float(f) => FormulaValue::Number(*f),
        Data::Int(i) => FormulaValue::Number(*i as f64),
        Data::Bool(b) => FormulaValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => FormulaValue::Number(dt.as_f64()),
        Data::DateTime(dt) => match datetime_millis(dt) {
            Some(millis) => FormulaValue::DateSerial(millis_to_serial(millis)),
            None => FormulaValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_iso_millis(s) {
            Some(millis) => FormulaValue::DateSerial(millis_to_serial(millis)),
            None => FormulaValue::Text(s.clone()),
        },
        Data::DurationIso(s) => FormulaValue::Text(s.clone()),
        Data::Error(e) => FormulaValue::Error(e.to_string()),
    }
}

/// Epoch millis of a date cell, honouring the workbook's 1900 or 1904 date system
fn datetime_millis(dt: &ExcelDateTime) -> Option<i64> {
    dt.as_datetime().map(|d| d.and_utc().timestamp_millis())
}

fn parse_iso_millis(s: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::ExcelDateTimeType;

    #[test]
    fn test_range_to_grid_keeps_sheet_coordinates() {
        let mut range: Range<Data> = Range::new((1, 1), (2, 3));
        range.set_value((1, 1), Data::String("a".into()));
        range.set_value((1, 2), Data::String("b".into()));
        range.set_value((2, 1), Data::Float(1.0));

        let grid = range_to_grid(&range, None);
        assert_eq!(grid.len(), 3);
        assert!(grid[0].is_none());
        assert_eq!(
            grid[1].as_deref(),
            Some(
                &[
                    SourceCell::Blank,
                    SourceCell::Text("a".into()),
                    SourceCell::Text("b".into())
                ][..]
            )
        );
        // trailing blanks are trimmed
        assert_eq!(grid[2].as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_formula_cells_use_cached_value() {
        let mut range: Range<Data> = Range::new((0, 0), (0, 1));
        range.set_value((0, 0), Data::Float(2.0));
        range.set_value((0, 1), Data::Float(3.0));
        let mut formulas: Range<String> = Range::new((0, 0), (0, 1));
        formulas.set_value((0, 1), "A1+1".to_string());

        let grid = range_to_grid(&range, Some(&formulas));
        let row = grid[0].as_ref().unwrap();
        assert_eq!(row[0], SourceCell::Number(2.0));
        assert_eq!(row[1], SourceCell::Formula(FormulaValue::Number(3.0)));
    }

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Int(4)), SourceCell::Number(4.0));
        assert_eq!(convert_cell(&Data::Empty), SourceCell::Blank);
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2020-01-01".into())),
            SourceCell::Date(1_577_836_800_000)
        );
    }

    #[test]
    fn test_1904_date_system() {
        let mut range: Range<Data> = Range::new((0, 0), (0, 1));
        range.set_value(
            (0, 0),
            Data::DateTime(ExcelDateTime::new(43831.0, ExcelDateTimeType::DateTime, false)),
        );
        range.set_value(
            (0, 1),
            Data::DateTime(ExcelDateTime::new(42369.0, ExcelDateTimeType::DateTime, true)),
        );

        let grid = range_to_grid(&range, None);
        let row = grid[0].as_ref().unwrap();
        assert_eq!(row[0], SourceCell::Date(1_577_836_800_000));
        assert_eq!(row[1], SourceCell::Date(1_577_836_800_000));

        let epoch_1904 = ExcelDateTime::new(0.0, ExcelDateTimeType::DateTime, true);
        let expected = NaiveDate::from_ymd_opt(1904, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
            .and_utc()
            .timestamp_millis();
        assert_eq!(datetime_millis(&epoch_1904), Some(expected));
        assert_eq!(
            formula_value(&Data::DateTime(epoch_1904)),
            FormulaValue::DateSerial(millis_to_serial(expected))
        );
    }

    #[test]
    fn test_missing_file() {
        let err = ExcelLoader::new("/nonexistent/file.xlsx", LoaderConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, TableError::SourceUnavailable { .. }));
    }
}
