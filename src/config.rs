//! Configuration for loading and writing typed tables

use std::str::FromStr;

use regex::Regex;

use crate::error::{Result, TableError};
use crate::model::DateFormat;

/// Missing-value marker used by the line-oriented format and the default pattern
pub const MISSING_MARKER: &str = "?";

/// Default missing-value pattern: the empty string or a lone `?`
pub const DEFAULT_MISSING_VALUE: &str = r"^(\?|)$";

/// Default cap on nominal labels before a column becomes free text
pub const DEFAULT_MAX_LABELS: usize = 25;

/// Regular expression identifying missing values by their text
#[derive(Debug, Clone)]
pub struct MissingValuePattern(Regex);

impl MissingValuePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(MissingValuePattern)
            .map_err(|e| TableError::InvalidConfig(format!("missing-value pattern: {}", e)))
    }

    /// Whether the text of a cell denotes a missing value
    pub fn is_missing(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for MissingValuePattern {
    fn default() -> Self {
        Self(Regex::new(DEFAULT_MISSING_VALUE).expect("default missing-value pattern is valid"))
    }
}

impl FromStr for MissingValuePattern {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        MissingValuePattern::new(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    First,
    Last,
    /// 1-based position
    At(usize),
}

impl Bound {
    fn resolve(self, max: usize) -> usize {
        match self {
            Bound::First => 1,
            Bound::Last => max,
            Bound::At(n) => n,
        }
    }
}

impl FromStr for Bound {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(Bound::First),
            "last" => Ok(Bound::Last),
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Bound::At(n)),
                _ => Err(TableError::InvalidConfig(format!(
                    "invalid range index '{}'",
                    s.trim()
                ))),
            },
        }
    }
}

/// 1-based column range such as `first-3,5,7-last`
///
/// `last` is resolved against the column count at the time of the check, so
/// the range follows the header as it grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRange {
    spans: Vec<(Bound, Bound)>,
}

impl ColumnRange {
    /// A range that matches no column
    pub fn none() -> Self {
        Self::default()
    }

    /// A range that matches every column
    pub fn all() -> Self {
        Self {
            spans: vec![(Bound::First, Bound::Last)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Whether the 0-based `index` falls in the range given `max` columns
    pub fn contains(&self, index: usize, max: usize) -> bool {
        let pos = index + 1;
        self.spans.iter().any(|(from, to)| {
            let from = from.resolve(max);
            let to = to.resolve(max);
            pos >= from && pos <= to
        })
    }
}

impl FromStr for ColumnRange {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        let mut spans = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let span = match part.split_once('-') {
                Some((from, to)) => (from.parse()?, to.parse()?),
                None => {
                    let bound: Bound = part.parse()?;
                    (bound, bound)
                }
            };
            spans.push(span);
        }
        Ok(Self { spans })
    }
}

/// Options recognized by every loader
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Worksheet to read (1-based); clamped to the number of sheets
    pub sheet_index: usize,
    /// First row to read (1-based); the header row unless `no_header` is set
    pub first_row: usize,
    /// Number of data rows to read, 0 reads to the end
    pub num_rows: usize,
    /// Append placeholder columns for cells beyond the header
    pub auto_extend_header: bool,
    /// Columns whose values are always read as text
    pub text_columns: ColumnRange,
    /// The first row is data, not a header
    pub no_header: bool,
    /// Column names to use instead of the header row
    pub custom_column_headers: Vec<String>,
    pub missing_value: MissingValuePattern,
    /// Nominal columns with more distinct values become text
    pub max_labels: usize,
    /// Pattern attached to inferred date columns and used to recognize dates in text
    pub date_format: DateFormat,
    /// Field delimiter for delimited text sources
    pub delimiter: u8,
    /// Treat line-oriented sources as gzip-compressed regardless of extension
    pub force_compression: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sheet_index: 1,
            first_row: 1,
            num_rows: 0,
            auto_extend_header: false,
            text_columns: ColumnRange::none(),
            no_header: false,
            custom_column_headers: Vec::new(),
            missing_value: MissingValuePattern::default(),
            max_labels: DEFAULT_MAX_LABELS,
            date_format: DateFormat::default(),
            delimiter: b',',
            force_compression: false,
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check invariants that individual setters cannot enforce
    pub fn validate(&self) -> Result<()> {
        if self.sheet_index == 0 {
            return Err(TableError::InvalidConfig(
                "sheet-index is 1-based".to_string(),
            ));
        }
        if self.first_row == 0 {
            return Err(TableError::InvalidConfig("first-row is 1-based".to_string()));
        }
        if !self.delimiter.is_ascii() {
            return Err(TableError::InvalidConfig(
                "delimiter must be a single ASCII character".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_sheet_index(mut self, index: usize) -> Self {
        self.sheet_index = index;
        self
    }

    pub fn with_first_row(mut self, row: usize) -> Self {
        self.first_row = row;
        self
    }

    /// Set the number of rows; values below 1 read everything
    pub fn with_num_rows(mut self, rows: i64) -> Self {
        self.num_rows = rows.max(0) as usize;
        self
    }

    pub fn with_auto_extend_header(mut self, enabled: bool) -> Self {
        self.auto_extend_header = enabled;
        self
    }

    pub fn with_text_columns(mut self, range: ColumnRange) -> Self {
        self.text_columns = range;
        self
    }

    pub fn with_no_header(mut self, enabled: bool) -> Self {
        self.no_header = enabled;
        self
    }

    /// Set custom headers from a comma-separated list
    pub fn with_custom_column_headers(mut self, headers: &str) -> Self {
        self.custom_column_headers = if headers.trim().is_empty() {
            Vec::new()
        } else {
            headers.split(',').map(|h| h.trim().to_string()).collect()
        };
        self
    }

    pub fn with_missing_value(mut self, pattern: MissingValuePattern) -> Self {
        self.missing_value = pattern;
        self
    }

    pub fn with_max_labels(mut self, max: usize) -> Self {
        self.max_labels = max;
        self
    }

    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_force_compression(mut self, enabled: bool) -> Self {
        self.force_compression = enabled;
        self
    }
}

/// Options recognized by every writer
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Text written for missing cells; `None` leaves the cell blank
    pub missing_placeholder: Option<String>,
    /// Worksheet name for spreadsheet output
    pub sheet_name: String,
    /// Relation name for the line-oriented format, defaults to the table name
    pub relation: Option<String>,
    /// Field delimiter for delimited text output
    pub delimiter: u8,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            missing_placeholder: None,
            sheet_name: "Sheet1".to_string(),
            relation: None,
            delimiter: b',',
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.missing_placeholder = Some(placeholder.into());
        self
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>) -> Self {
        self.relation = Some(name.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}
