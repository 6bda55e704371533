//! Typed table, row, and value structures

use std::borrow::Cow;

use indexmap::IndexSet;
use serde::Serialize;

use super::raw::number_to_string;
use super::schema::{ColumnSchema, ColumnType};
use crate::error::{Result, TableError};

/// Handle of a string interned in a table's text pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextHandle(usize);

/// A cell value whose interpretation is given by its column type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TypedValue {
    Missing,
    Numeric(f64),
    /// Milliseconds since the Unix epoch (UTC)
    Date(i64),
    /// Index into the column's label set
    Nominal(usize),
    Text(TextHandle),
}

impl TypedValue {
    /// Check if the value is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, TypedValue::Missing)
    }
}

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRow {
    /// Values in column order
    pub values: Vec<TypedValue>,
    /// Row weight, 1.0 unless the source declares one
    pub weight: f64,
}

impl TypedRow {
    /// Create a row with the default weight
    pub fn new(values: Vec<TypedValue>) -> Self {
        Self {
            values,
            weight: 1.0,
        }
    }

    /// Create a row with an explicit weight
    pub fn weighted(values: Vec<TypedValue>, weight: f64) -> Self {
        Self { values, weight }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&TypedValue> {
        self.values.get(index)
    }
}

/// A table with an immutable schema and rectangular rows
#[derive(Debug, Clone)]
pub struct TypedTable {
    /// Relation name (file name for sources that don't declare one)
    pub name: String,
    columns: Vec<ColumnSchema>,
    rows: Vec<TypedRow>,
    text_pool: IndexSet<String>,
}

impl TypedTable {
    /// Create an empty table with column definitions
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            text_pool: IndexSet::new(),
        }
    }

    /// A copy holding the same schema and no rows
    pub fn structure(&self) -> Self {
        Self::new(self.name.clone(), self.columns.clone())
    }

    /// Add a row, rejecting any row that does not match the column count
    pub fn push_row(&mut self, row: TypedRow) -> Result<()> {
        if row.values.len() != self.columns.len() {
            return Err(TableError::NotRectangular {
                row: self.rows.len() + 1,
                expected: self.columns.len(),
                found: row.values.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Intern a string and return its handle
    pub fn intern(&mut self, text: &str) -> TextHandle {
        if let Some(idx) = self.text_pool.get_index_of(text) {
            return TextHandle(idx);
        }
        let (idx, _) = self.text_pool.insert_full(text.to_string());
        TextHandle(idx)
    }

    /// Resolve an interned string
    pub fn text(&self, handle: TextHandle) -> &str {
        self.text_pool
            .get_index(handle.0)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn rows(&self) -> &[TypedRow] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Textual form of a cell; `None` when missing
    pub fn display_value(&self, row: usize, col: usize) -> Option<Cow<'_, str>> {
        let value = self.rows.get(row)?.get(col)?;
        let column = self.columns.get(col)?;
        match (value, &column.column_type) {
            (TypedValue::Missing, _) => None,
            (TypedValue::Numeric(n), _) => Some(Cow::Owned(number_to_string(*n))),
            (TypedValue::Date(millis), ColumnType::Date { format }) => {
                Some(Cow::Owned(format.format_millis(*millis)))
            }
            (TypedValue::Date(millis), _) => Some(Cow::Owned(millis.to_string())),
            (TypedValue::Nominal(idx), ColumnType::Nominal { labels }) => {
                labels.get_index(*idx).map(|l| Cow::Borrowed(l.as_str()))
            }
            (TypedValue::Nominal(idx), _) => Some(Cow::Owned(idx.to_string())),
            (TypedValue::Text(handle), _) => Some(Cow::Borrowed(self.text(*handle))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TypedTable {
        TypedTable::new(
            "sample",
            vec![
                ColumnSchema::new("n", 0, ColumnType::Numeric),
                ColumnSchema::new("c", 1, ColumnType::nominal(["a", "b"])),
                ColumnSchema::new("t", 2, ColumnType::Text),
            ],
        )
    }

    #[test]
    fn test_push_row_enforces_rectangularity() {
        let mut table = sample();
        let err = table
            .push_row(TypedRow::new(vec![TypedValue::Numeric(1.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::NotRectangular {
                expected: 3,
                found: 1,
                ..
            }
        ));
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_interning_reuses_handles() {
        let mut table = sample();
        let a = table.intern("hello");
        let b = table.intern("world");
        assert_eq!(table.intern("hello"), a);
        assert_ne!(a, b);
        assert_eq!(table.text(b), "world");
    }

    #[test]
    fn test_display_value() {
        let mut table = sample();
        let handle = table.intern("free");
        table
            .push_row(TypedRow::new(vec![
                TypedValue::Numeric(2.0),
                TypedValue::Nominal(1),
                TypedValue::Text(handle),
            ]))
            .unwrap();
        table
            .push_row(TypedRow::new(vec![TypedValue::Missing; 3]))
            .unwrap();
        assert_eq!(table.display_value(0, 0).as_deref(), Some("2"));
        assert_eq!(table.display_value(0, 1).as_deref(), Some("b"));
        assert_eq!(table.display_value(0, 2).as_deref(), Some("free"));
        assert_eq!(table.display_value(1, 1), None);
        assert_eq!(table.structure().row_count(), 0);
    }
}
