//! typedtab - Typed import and export of tabular data
//!
//! Loads spreadsheets (xlsx, xls, ods, ...), delimited text and ARFF files into
//! a [`TypedTable`] whose columns are numeric, date, nominal or free text, and
//! writes such tables back out as xlsx, csv or ARFF.

pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;

pub use config::{ColumnRange, LoaderConfig, MissingValuePattern, WriterConfig};
pub use error::{Result, TableError};
pub use model::{ColumnSchema, ColumnType, DateFormat, TypedRow, TypedTable, TypedValue};
pub use output::{write_table, TableSink, TableWriter, WriterFactory};
pub use parser::{Loader, LoaderFactory};
