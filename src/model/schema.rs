//! Column metadata and type information

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::date::DateFormat;

/// The single type carried by every value of a column
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Date {
        format: DateFormat,
    },
    /// Enumerated strings; a value is stored as its index in `labels`
    Nominal {
        labels: IndexSet<String>,
    },
    Text,
}

impl ColumnType {
    /// Nominal type with labels in the given order
    pub fn nominal<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnType::Nominal {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Nominal type with labels sorted, independent of observation order
    pub fn sorted_nominal<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sorted: Vec<String> = labels.into_iter().map(Into::into).collect();
        sorted.sort();
        sorted.dedup();
        Self::nominal(sorted)
    }

    /// Short lowercase name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Date { .. } => "date",
            ColumnType::Nominal { .. } => "nominal",
            ColumnType::Text => "text",
        }
    }

    /// Labels of a nominal column
    pub fn labels(&self) -> Option<&IndexSet<String>> {
        match self {
            ColumnType::Nominal { labels } => Some(labels),
            _ => None,
        }
    }
}

// Label order is part of the type: values are stored as label indices.
impl PartialEq for ColumnType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ColumnType::Numeric, ColumnType::Numeric) => true,
            (ColumnType::Text, ColumnType::Text) => true,
            (ColumnType::Date { format: a }, ColumnType::Date { format: b }) => a == b,
            (ColumnType::Nominal { labels: a }, ColumnType::Nominal { labels: b }) => {
                a.iter().eq(b.iter())
            }
            _ => false,
        }
    }
}

impl Eq for ColumnType {}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Date { format } => write!(f, "date '{}'", format),
            ColumnType::Nominal { labels } => {
                let joined: Vec<&str> = labels.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", joined.join(","))
            }
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name, never empty
    pub name: String,
    /// Column index (0-based position)
    pub index: usize,
    pub column_type: ColumnType,
    /// Attribute weight, only set by formats that declare one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub weight: Option<f64>,
}

impl ColumnSchema {
    /// Create a column with a name, position and type
    pub fn new(name: impl Into<String>, index: usize, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            index,
            column_type,
            weight: None,
        }
    }

    /// Attach an attribute weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.column_type, ColumnType::Numeric)
    }
}
