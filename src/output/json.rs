//! JSON rendering of a table's schema

use serde::Serialize;

use crate::error::{Result, TableError};
use crate::model::{ColumnSchema, TypedTable};

/// Serializable summary of a table's structure
#[derive(Debug, Serialize)]
pub struct SchemaReport<'a> {
    pub name: &'a str,
    pub column_count: usize,
    pub columns: &'a [ColumnSchema],
}

impl<'a> SchemaReport<'a> {
    pub fn new(table: &'a TypedTable) -> Self {
        Self {
            name: &table.name,
            column_count: table.column_count(),
            columns: table.columns(),
        }
    }
}

/// Pretty-printed JSON describing the columns of `table`
pub fn schema_to_json(table: &TypedTable) -> Result<String> {
    serde_json::to_string_pretty(&SchemaReport::new(table))
        .map_err(|e| TableError::Write(format!("JSON serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnType, DateFormat};

    #[test]
    fn test_schema_json() {
        let table = TypedTable::new(
            "t",
            vec![
                ColumnSchema::new("n", 0, ColumnType::Numeric),
                ColumnSchema::new(
                    "d",
                    1,
                    ColumnType::Date {
                        format: DateFormat::default(),
                    },
                ),
                ColumnSchema::new("c", 2, ColumnType::nominal(["x", "y"])).with_weight(2.0),
            ],
        );
        let json: serde_json::Value =
            serde_json::from_str(&schema_to_json(&table).unwrap()).unwrap();

        assert_eq!(json["name"], "t");
        assert_eq!(json["column_count"], 3);
        assert_eq!(json["columns"][0]["column_type"]["type"], "numeric");
        assert_eq!(
            json["columns"][1]["column_type"]["format"],
            "yyyy-MM-dd HH:mm:ss"
        );
        assert_eq!(json["columns"][2]["column_type"]["labels"][1], "y");
        assert_eq!(json["columns"][2]["weight"], 2.0);
        assert!(json["columns"][0].get("weight").is_none());
    }
}
