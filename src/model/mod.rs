//! Data model for typed tabular data

mod date;
mod raw;
mod schema;
mod table;

pub use date::{
    millis_to_serial, serial_to_millis, DateFormat, DEFAULT_TIMESTAMP_PATTERN, ISO_DATE_PATTERN,
};
pub use raw::{number_to_string, RawRow, RawValue};
pub use schema::{ColumnSchema, ColumnType};
pub use table::{TextHandle, TypedRow, TypedTable, TypedValue};
