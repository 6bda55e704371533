//! Date patterns in the `yyyy-MM-dd HH:mm:ss` style used by the table formats
//!
//! Patterns are translated once into a chrono format string (for parsing and
//! rendering) and an Excel number format (for native spreadsheet dates).

use std::fmt;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Pattern used for dates when nothing else is configured
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "yyyy-MM-dd HH:mm:ss";

/// Pattern used as a second attempt when recognizing dates in plain text
pub const ISO_DATE_PATTERN: &str = "yyyy-MM-dd";

/// Days between 1899-12-30 (the spreadsheet epoch) and 1970-01-01
const SPREADSHEET_EPOCH_OFFSET_DAYS: f64 = 25569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A validated date pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DateFormat {
    pattern: String,
    strftime: String,
    excel: String,
    has_time: bool,
    has_offset: bool,
}

impl DateFormat {
    /// Parse and validate a pattern
    pub fn new(pattern: &str) -> Result<Self, TableError> {
        let invalid = |why: &str| {
            TableError::structural(format!("invalid date format '{}': {}", pattern, why))
        };

        if pattern.trim().is_empty() {
            return Err(invalid("empty pattern"));
        }

        let mut strftime = String::new();
        let mut excel = String::new();
        let mut has_time = false;
        let mut has_offset = false;

        let chars: Vec<char> = pattern.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                // quoted literal, '' is an escaped quote
                let mut literal = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(invalid("unterminated quote")),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            literal.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(&other) => {
                            literal.push(other);
                            i += 1;
                        }
                    }
                }
                if literal.is_empty() {
                    literal.push('\'');
                }
                push_literal(&mut strftime, &mut excel, &literal);
                continue;
            }

            if !c.is_ascii_alphabetic() {
                push_literal(&mut strftime, &mut excel, &c.to_string());
                i += 1;
                continue;
            }

            let mut count = 1;
            while chars.get(i + count) == Some(&c) {
                count += 1;
            }
            i += count;

            let (spec, xl) = match (c, count) {
                ('y', 2) => ("%y", "yy"),
                ('y', _) => ("%Y", "yyyy"),
                ('M', 1) => ("%-m", "m"),
                ('M', 2) => ("%m", "mm"),
                ('M', 3) => ("%b", "mmm"),
                ('M', _) => ("%B", "mmmm"),
                ('d', 1) => ("%-d", "d"),
                ('d', _) => ("%d", "dd"),
                ('E', n) if n <= 3 => ("%a", "ddd"),
                ('E', _) => ("%A", "dddd"),
                ('H', 1) => ("%-H", "h"),
                ('H', _) => ("%H", "hh"),
                ('h', 1) => ("%-I", "h"),
                ('h', _) => ("%I", "hh"),
                ('m', 1) => ("%-M", "m"),
                ('m', _) => ("%M", "mm"),
                ('s', 1) => ("%-S", "s"),
                ('s', _) => ("%S", "ss"),
                ('S', _) => ("%3f", "000"),
                ('a', _) => ("%p", "AM/PM"),
                ('Z', _) => ("%z", ""),
                ('X', _) => ("%:z", ""),
                _ => return Err(invalid(&format!("unsupported pattern letter '{}'", c))),
            };

            if matches!(c, 'H' | 'h' | 'm' | 's' | 'S' | 'a') {
                has_time = true;
            }
            if matches!(c, 'Z' | 'X') {
                has_offset = true;
            }
            strftime.push_str(spec);
            excel.push_str(xl);
        }

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(invalid("cannot be rendered"));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            strftime,
            excel: excel.trim().to_string(),
            has_time,
            has_offset,
        })
    }

    /// The pattern as it was written
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Equivalent spreadsheet number format
    pub fn excel_format(&self) -> &str {
        &self.excel
    }

    /// Parse text into milliseconds since the Unix epoch (UTC)
    pub fn parse_millis(&self, text: &str) -> Option<i64> {
        let text = text.trim();
        if self.has_offset {
            return DateTime::parse_from_str(text, &self.strftime)
                .ok()
                .map(|dt| dt.timestamp_millis());
        }
        if self.has_time {
            return NaiveDateTime::parse_from_str(text, &self.strftime)
                .ok()
                .map(|dt| dt.and_utc().timestamp_millis());
        }
        NaiveDate::parse_from_str(text, &self.strftime)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
    }

    /// Render milliseconds since the Unix epoch (UTC)
    pub fn format_millis(&self, millis: i64) -> String {
        match DateTime::from_timestamp_millis(millis) {
            Some(dt) => dt.format(&self.strftime).to_string(),
            None => millis.to_string(),
        }
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
            strftime: "%Y-%m-%d %H:%M:%S".to_string(),
            excel: "yyyy-mm-dd hh:mm:ss".to_string(),
            has_time: true,
            has_offset: false,
        }
    }
}

impl FromStr for DateFormat {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateFormat::new(s)
    }
}

impl TryFrom<String> for DateFormat {
    type Error = TableError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DateFormat::new(&s)
    }
}

impl From<DateFormat> for String {
    fn from(f: DateFormat) -> Self {
        f.pattern
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

fn push_literal(strftime: &mut String, excel: &mut String, literal: &str) {
    for ch in literal.chars() {
        match ch {
            '%' => strftime.push_str("%%"),
            other => strftime.push(other),
        }
    }
    if literal.chars().all(|c| matches!(c, '-' | '/' | ':' | ' ' | '.' | ',')) {
        excel.push_str(literal);
    } else {
        excel.push('"');
        excel.push_str(&literal.replace('"', "\"\""));
        excel.push('"');
    }
}

/// Convert a spreadsheet day serial (days since 1899-12-30) to epoch millis
pub fn serial_to_millis(serial: f64) -> i64 {
    ((serial - SPREADSHEET_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY).round() as i64
}

/// Convert epoch millis to a spreadsheet day serial
pub fn millis_to_serial(millis: i64) -> f64 {
    millis as f64 / MILLIS_PER_DAY + SPREADSHEET_EPOCH_OFFSET_DAYS
}
