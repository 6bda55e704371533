//! Materialization of raw rows into a typed table

use crate::error::{Result, TableError};
use crate::model::{
    ColumnSchema, ColumnType, DateFormat, RawRow, RawValue, TypedRow, TypedTable, TypedValue,
};

/// Pair column names with their inferred types
pub fn build_schema(header: Vec<String>, types: Vec<ColumnType>) -> Vec<ColumnSchema> {
    header
        .into_iter()
        .zip(types)
        .enumerate()
        .map(|(i, (name, column_type))| ColumnSchema::new(name, i, column_type))
        .collect()
}

enum Converted {
    Value(TypedValue),
    /// Free text still to be interned in the table's pool
    Text(String),
}

/// Converts raw rows into typed rows under a fixed schema
#[derive(Debug, Clone, Copy)]
pub struct TypedTableBuilder<'a> {
    /// Must be the pattern the inferencer rendered labels with
    dates: &'a DateFormat,
}

impl<'a> TypedTableBuilder<'a> {
    pub fn new(dates: &'a DateFormat) -> Self {
        Self { dates }
    }

    /// Build a table; fails on the first value its column type cannot hold
    pub fn build(
        &self,
        name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        rows: Vec<RawRow>,
    ) -> Result<TypedTable> {
        let mut table = TypedTable::new(name, columns);

        for (row_idx, raw) in rows.into_iter().enumerate() {
            if raw.len() != table.column_count() {
                return Err(TableError::NotRectangular {
                    row: row_idx + 1,
                    expected: table.column_count(),
                    found: raw.len(),
                });
            }

            let mut values = Vec::with_capacity(raw.len());
            for (col_idx, value) in raw.iter().enumerate() {
                let typed = match self.convert(&table, col_idx, row_idx, value)? {
                    Converted::Value(typed) => typed,
                    Converted::Text(text) => TypedValue::Text(table.intern(&text)),
                };
                values.push(typed);
            }
            table.push_row(TypedRow::new(values))?;
        }

        Ok(table)
    }

    fn convert(
        &self,
        table: &TypedTable,
        col_idx: usize,
        row_idx: usize,
        value: &RawValue,
    ) -> Result<Converted> {
        if value.is_missing() {
            return Ok(Converted::Value(TypedValue::Missing));
        }

        let column = &table.columns()[col_idx];
        let mismatch = |expected: &'static str| TableError::TypeMismatch {
            column: column.name.clone(),
            row: row_idx + 1,
            expected,
            found: value.kind().to_string(),
        };

        let typed = match (&column.column_type, value) {
            (ColumnType::Numeric, RawValue::Number(n)) => TypedValue::Numeric(*n),
            (ColumnType::Numeric, _) => return Err(mismatch("numeric")),
            (ColumnType::Date { .. }, _) => value
                .date_millis()
                .map(TypedValue::Date)
                .ok_or_else(|| mismatch("date"))?,
            (ColumnType::Nominal { labels }, _) => labels
                .get_index_of(value.render(self.dates).as_str())
                .map(TypedValue::Nominal)
                .ok_or_else(|| mismatch("nominal"))?,
            (ColumnType::Text, _) => return Ok(Converted::Text(value.render(self.dates))),
        };
        Ok(Converted::Value(typed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_typed_rows() {
        let dates = DateFormat::default();
        let columns = build_schema(
            vec!["n".into(), "d".into(), "c".into(), "t".into()],
            vec![
                ColumnType::Numeric,
                ColumnType::Date {
                    format: dates.clone(),
                },
                ColumnType::sorted_nominal(["b", "a"]),
                ColumnType::Text,
            ],
        );
        let rows = vec![
            vec![
                RawValue::Number(1.5),
                RawValue::Date(1000),
                RawValue::Text("b".into()),
                RawValue::Text("free".into()),
            ],
            vec![RawValue::Missing; 4],
        ];

        let table = TypedTableBuilder::new(&dates).build("t", columns, rows).unwrap();
        assert_eq!(table.row_count(), 2);
        let first = &table.rows()[0].values;
        assert_eq!(first[0], TypedValue::Numeric(1.5));
        assert_eq!(first[1], TypedValue::Date(1000));
        assert_eq!(first[2], TypedValue::Nominal(1));
        assert_eq!(table.display_value(0, 3).as_deref(), Some("free"));
        assert!(table.rows()[1].values.iter().all(TypedValue::is_missing));
    }

    #[test]
    fn test_text_in_numeric_column_fails_loudly() {
        let dates = DateFormat::default();
        let columns = build_schema(vec!["n".into()], vec![ColumnType::Numeric]);
        let rows = vec![vec![RawValue::Number(1.0)], vec![RawValue::Text("x".into())]];
        let err = TypedTableBuilder::new(&dates)
            .build("t", columns, rows)
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::TypeMismatch { row: 2, expected: "numeric", .. }
        ));
    }

    #[test]
    fn test_number_in_date_column_fails_loudly() {
        let dates = DateFormat::default();
        let columns = build_schema(
            vec!["when".into()],
            vec![ColumnType::Date {
                format: dates.clone(),
            }],
        );
        let rows = vec![
            vec![RawValue::ParsedDate {
                millis: 1_577_836_800_000,
                source: "2020-01-01".into(),
            }],
            vec![RawValue::Number(5.0)],
        ];
        let err = TypedTableBuilder::new(&dates)
            .build("t", columns, rows)
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::TypeMismatch { row: 2, expected: "date", .. }
        ));
    }

    #[test]
    fn test_unknown_label_fails() {
        let dates = DateFormat::default();
        let columns = build_schema(vec!["c".into()], vec![ColumnType::nominal(["a"])]);
        let rows = vec![vec![RawValue::Text("z".into())]];
        assert!(TypedTableBuilder::new(&dates).build("t", columns, rows).is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let dates = DateFormat::default();
        let columns = build_schema(vec!["a".into(), "b".into()], vec![ColumnType::Numeric; 2]);
        let rows = vec![vec![RawValue::Missing]];
        assert!(matches!(
            TypedTableBuilder::new(&dates).build("t", columns, rows),
            Err(TableError::NotRectangular { .. })
        ));
    }
}
