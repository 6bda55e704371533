//! Import pipeline shared by the loaders without declared column types
//!
//! header → row collection → type inference is the structure phase; building
//! typed rows is deferred until the full data set is requested.

use log::{debug, info};

use crate::config::LoaderConfig;
use crate::error::{Result, TableError};
use crate::model::{ColumnSchema, DateFormat, RawRow, TypedTable};

use super::build::{build_schema, TypedTableBuilder};
use super::cell::{CellClassifier, SourceCell};
use super::header::HeaderNormalizer;
use super::infer::ColumnTypeInferencer;
use super::rows::RowCollector;

/// Source rows by 0-based position; `None` marks a row absent from the source
pub type SourceGrid = Vec<Option<Vec<SourceCell>>>;

/// Schema known, rows still raw
#[derive(Debug)]
pub struct StagedImport {
    name: String,
    columns: Vec<ColumnSchema>,
    rows: Vec<RawRow>,
    dates: DateFormat,
}

impl StagedImport {
    /// Run the structure phase over a grid
    pub fn stage(
        name: impl Into<String>,
        grid: &SourceGrid,
        config: &LoaderConfig,
        fallback_dates: Option<&DateFormat>,
    ) -> Result<Self> {
        let name = name.into();
        let first = config.first_row - 1;

        if grid.iter().skip(first).all(Option::is_none) {
            return Err(TableError::EmptySource(name));
        }

        let normalizer = HeaderNormalizer::new(
            &config.custom_column_headers,
            config.no_header,
            &config.text_columns,
            &config.date_format,
        );
        let first_cells = grid[first].as_deref().unwrap_or_default();
        let header = normalizer.normalize(first_cells);
        debug!("Header: {:?}", header);

        let data_start = if normalizer.consumes_first_row() {
            first + 1
        } else {
            first
        };
        let data_end = if config.num_rows == 0 {
            grid.len()
        } else {
            (data_start + config.num_rows).min(grid.len())
        };

        let mut classifier = CellClassifier::new(
            &config.text_columns,
            &config.missing_value,
            &config.date_format,
        );
        if let Some(fallback) = fallback_dates {
            classifier = classifier.with_fallback_dates(fallback);
        }

        let mut collector = RowCollector::new(header, classifier, config.auto_extend_header);
        for row_idx in data_start..data_end.max(data_start) {
            debug!("Data row: {}", row_idx + 1);
            collector.collect_row(grid[row_idx].as_deref());
        }
        let collected = collector.finish();

        let inferencer = ColumnTypeInferencer::new(config.max_labels, &config.date_format);
        let types = inferencer.infer(&collected.rows, collected.header.len());
        let columns = build_schema(collected.header, types);

        info!(
            "Staged '{}': {} column(s), {} row(s)",
            name,
            columns.len(),
            collected.rows.len()
        );

        Ok(Self {
            name,
            columns,
            rows: collected.rows,
            dates: config.date_format.clone(),
        })
    }

    /// Table with the inferred schema and no rows
    pub fn structure(&self) -> TypedTable {
        TypedTable::new(self.name.clone(), self.columns.clone())
    }

    /// Materialize the typed rows
    pub fn build(self) -> Result<TypedTable> {
        TypedTableBuilder::new(&self.dates).build(self.name, self.columns, self.rows)
    }
}

/// Progress of a batch loader
#[derive(Debug, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Staged(StagedImport),
    Loaded(TypedTable),
}

impl LoadState {
    /// Structure of the staged or loaded table, staging with `stage` if needed
    pub fn structure<F>(&mut self, stage: F) -> Result<TypedTable>
    where
        F: FnOnce() -> Result<StagedImport>,
    {
        match self {
            LoadState::Unloaded => {
                let staged = stage()?;
                let structure = staged.structure();
                *self = LoadState::Staged(staged);
                Ok(structure)
            }
            LoadState::Staged(staged) => Ok(staged.structure()),
            LoadState::Loaded(table) => Ok(table.structure()),
        }
    }

    /// Full table, running whatever phases are still outstanding
    pub fn data_set<F>(&mut self, stage: F) -> Result<TypedTable>
    where
        F: FnOnce() -> Result<StagedImport>,
    {
        let staged = match std::mem::take(self) {
            LoadState::Loaded(table) => {
                *self = LoadState::Loaded(table.clone());
                return Ok(table);
            }
            LoadState::Staged(staged) => staged,
            LoadState::Unloaded => stage()?,
        };
        let table = staged.build()?;
        *self = LoadState::Loaded(table.clone());
        Ok(table)
    }
}
