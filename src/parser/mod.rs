//! Loaders that turn spreadsheet, delimited text, and ARFF sources into typed tables

pub mod arff;
pub mod build;
pub mod cell;
mod csv;
mod excel;
pub mod header;
pub mod infer;
pub mod pipeline;
pub mod rows;

use std::path::Path;

use crate::config::LoaderConfig;
use crate::error::{Result, TableError};
use crate::model::{TypedRow, TypedTable};

pub use self::arff::ArffLoader;
pub use self::csv::CsvLoader;
pub use self::excel::ExcelLoader;

/// A source of typed tables, read as a batch
pub trait Loader {
    /// Human-readable name used in errors
    fn format_name(&self) -> &'static str;

    /// Column names and types without rows
    fn structure(&mut self) -> Result<TypedTable>;

    /// The complete table
    fn data_set(&mut self) -> Result<TypedTable>;

    /// Row-at-a-time reading is not offered by any loader
    fn next_row(&mut self) -> Result<TypedRow> {
        Err(TableError::IncrementalUnsupported(self.format_name()))
    }
}

/// Source formats the factory knows how to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Excel,
    Csv,
    Arff,
}

impl SourceFormat {
    /// Format for a path, judged by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".arff") || name.ends_with(".arff.gz") {
            return Some(SourceFormat::Arff);
        }
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Excel),
            "csv" | "tsv" | "txt" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

/// Factory for loaders based on file extension
pub struct LoaderFactory;

impl LoaderFactory {
    /// Open a loader for `path`, falling back to content sniffing for unknown extensions
    pub fn open(path: &Path, config: LoaderConfig) -> Result<Box<dyn Loader>> {
        check_source(path)?;
        let format = match SourceFormat::from_path(path) {
            Some(format) => format,
            None => detect_format(path).ok_or_else(|| {
                TableError::UnsupportedFormat(
                    path.extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or("unknown")
                        .to_string(),
                )
            })?,
        };
        log::debug!("Opening {} as {:?}", path.display(), format);

        Ok(match format {
            SourceFormat::Excel => Box::new(ExcelLoader::new(path, config)?),
            SourceFormat::Csv => Box::new(CsvLoader::new(path, config)?),
            SourceFormat::Arff => Box::new(ArffLoader::new(path, config)?),
        })
    }
}

/// Detect the format of a file from its first bytes
pub fn detect_format(path: &Path) -> Option<SourceFormat> {
    use std::fs::File;
    use std::io::Read;

    let mut file = File::open(path).ok()?;
    let mut buffer = [0u8; 8];
    let bytes_read = file.read(&mut buffer).ok()?;
    let head = &buffer[..bytes_read];

    // zip container (xlsx, ods) or OLE compound file (xls)
    if head.starts_with(b"PK\x03\x04") || head.starts_with(b"\xD0\xCF\x11\xE0") {
        return Some(SourceFormat::Excel);
    }

    // gzip is only ever compressed ARFF here
    if head.starts_with(b"\x1f\x8b") {
        return Some(SourceFormat::Arff);
    }

    let first = head.iter().find(|b| !b.is_ascii_whitespace())?;
    if matches!(first, b'%' | b'@') {
        return Some(SourceFormat::Arff);
    }

    Some(SourceFormat::Csv)
}

/// Fail unless `path` names an existing regular file
pub fn check_source(path: &Path) -> Result<()> {
    let unavailable = |reason: &str| TableError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    match path.metadata() {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(unavailable("not a regular file")),
        Err(e) => Err(unavailable(&e.to_string())),
    }
}

/// Default table name for a source: its file name
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
