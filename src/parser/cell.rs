//! Classification of source cells into raw values

use crate::config::{ColumnRange, MissingValuePattern};
use crate::model::{number_to_string, serial_to_millis, DateFormat, RawValue};

/// Cached result of a formula cell, as reported by the workbook
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Empty,
    Number(f64),
    /// Day serial of a date-formatted result
    DateSerial(f64),
    Bool(bool),
    Text(String),
    Error(String),
}

impl FormulaValue {
    fn try_number(&self) -> Option<RawValue> {
        match self {
            FormulaValue::Number(n) | FormulaValue::DateSerial(n) => Some(RawValue::Number(*n)),
            _ => None,
        }
    }

    fn try_bool(&self) -> Option<RawValue> {
        match self {
            FormulaValue::Bool(b) => Some(RawValue::Bool(*b)),
            _ => None,
        }
    }

    fn try_date(&self) -> Option<RawValue> {
        match self {
            FormulaValue::DateSerial(n) => Some(RawValue::Date(serial_to_millis(*n))),
            _ => None,
        }
    }

    fn try_text(&self) -> Option<RawValue> {
        match self {
            FormulaValue::Text(s) => Some(RawValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric, then boolean, then date, then string; `Missing` if none apply
    pub fn resolve(&self) -> RawValue {
        self.try_number()
            .or_else(|| self.try_bool())
            .or_else(|| self.try_date())
            .or_else(|| self.try_text())
            .unwrap_or(RawValue::Missing)
    }
}

/// One cell as delivered by a source format
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCell {
    Blank,
    /// Error cell with its rendered error text, e.g. `#DIV/0!`
    Error(String),
    Number(f64),
    /// Date-formatted cell, in milliseconds since the Unix epoch
    Date(i64),
    Bool(bool),
    Text(String),
    /// Text from a source without cell types; classified by content
    Untyped(String),
    Formula(FormulaValue),
}

/// Turns source cells into raw values for one load
#[derive(Debug, Clone, Copy)]
pub struct CellClassifier<'a> {
    text_columns: &'a ColumnRange,
    missing: &'a MissingValuePattern,
    dates: &'a DateFormat,
    fallback_dates: Option<&'a DateFormat>,
}

impl<'a> CellClassifier<'a> {
    pub fn new(
        text_columns: &'a ColumnRange,
        missing: &'a MissingValuePattern,
        dates: &'a DateFormat,
    ) -> Self {
        Self {
            text_columns,
            missing,
            dates,
            fallback_dates: None,
        }
    }

    /// Second pattern tried when recognizing dates in untyped text
    pub fn with_fallback_dates(mut self, dates: &'a DateFormat) -> Self {
        self.fallback_dates = Some(dates);
        self
    }

    /// Whether the column is forced to text given the current column count
    pub fn is_text_column(&self, column: usize, column_count: usize) -> bool {
        self.text_columns.contains(column, column_count)
    }

    /// Classify the cell destined for `column` of a header `column_count` wide
    pub fn classify(&self, cell: &SourceCell, column: usize, column_count: usize) -> RawValue {
        let as_text = self.is_text_column(column, column_count);

        match cell {
            SourceCell::Blank => self.text_or_missing(""),
            SourceCell::Error(text) => self.text_or_missing(text),
            SourceCell::Text(text) => self.text_or_missing(text),
            SourceCell::Number(n) if as_text => RawValue::Text(number_to_string(*n)),
            SourceCell::Number(n) => RawValue::Number(*n),
            SourceCell::Date(millis) if as_text => RawValue::Text(self.dates.format_millis(*millis)),
            SourceCell::Date(millis) => RawValue::Date(*millis),
            SourceCell::Bool(b) if as_text => RawValue::Text(b.to_string()),
            SourceCell::Bool(b) => RawValue::Bool(*b),
            SourceCell::Untyped(text) if as_text => self.text_or_missing(text),
            SourceCell::Untyped(text) => self.classify_text(text),
            SourceCell::Formula(value) => match value.resolve() {
                RawValue::Missing => RawValue::Missing,
                RawValue::Text(text) => self.text_or_missing(&text),
                resolved if as_text => RawValue::Text(resolved.render(self.dates)),
                resolved => resolved,
            },
        }
    }

    fn text_or_missing(&self, text: &str) -> RawValue {
        if self.missing.is_missing(text) {
            RawValue::Missing
        } else {
            RawValue::Text(text.to_string())
        }
    }

    /// Number, then boolean, then date, then text
    fn classify_text(&self, text: &str) -> RawValue {
        if self.missing.is_missing(text) {
            return RawValue::Missing;
        }
        let trimmed = text.trim();
        try_number(trimmed)
            .or_else(|| try_bool(trimmed))
            .or_else(|| self.try_date(trimmed, text))
            .unwrap_or_else(|| RawValue::Text(text.to_string()))
    }

    fn try_date(&self, trimmed: &str, source: &str) -> Option<RawValue> {
        self.dates
            .parse_millis(trimmed)
            .or_else(|| self.fallback_dates.and_then(|f| f.parse_millis(trimmed)))
            .map(|millis| RawValue::ParsedDate {
                millis,
                source: source.to_string(),
            })
    }
}

fn try_number(text: &str) -> Option<RawValue> {
    // rejects "inf", "NaN" and friends, which f64::from_str would accept
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>().ok().map(RawValue::Number)
}

fn try_bool(text: &str) -> Option<RawValue> {
    if text.eq_ignore_ascii_case("true") {
        Some(RawValue::Bool(true))
    } else if text.eq_ignore_ascii_case("false") {
        Some(RawValue::Bool(false))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ISO_DATE_PATTERN;

    struct Fixture {
        text_columns: ColumnRange,
        missing: MissingValuePattern,
        dates: DateFormat,
        iso: DateFormat,
    }

    impl Fixture {
        fn new(text_columns: &str) -> Self {
            Self {
                text_columns: text_columns.parse().unwrap(),
                missing: MissingValuePattern::default(),
                dates: DateFormat::default(),
                iso: DateFormat::new(ISO_DATE_PATTERN).unwrap(),
            }
        }

        fn classifier(&self) -> CellClassifier<'_> {
            CellClassifier::new(&self.text_columns, &self.missing, &self.dates)
                .with_fallback_dates(&self.iso)
        }
    }

    #[test]
    fn test_typed_cells() {
        let fx = Fixture::new("");
        let c = fx.classifier();
        assert_eq!(c.classify(&SourceCell::Number(1.5), 0, 3), RawValue::Number(1.5));
        assert_eq!(c.classify(&SourceCell::Bool(true), 0, 3), RawValue::Bool(true));
        assert_eq!(c.classify(&SourceCell::Date(0), 0, 3), RawValue::Date(0));
        assert_eq!(c.classify(&SourceCell::Blank, 0, 3), RawValue::Missing);
        assert_eq!(
            c.classify(&SourceCell::Text("abc".into()), 0, 3),
            RawValue::Text("abc".into())
        );
    }

    #[test]
    fn test_text_columns_render_numbers() {
        let fx = Fixture::new("2");
        let c = fx.classifier();
        assert_eq!(c.classify(&SourceCell::Number(7.0), 1, 3), RawValue::Text("7".into()));
        assert_eq!(
            c.classify(&SourceCell::Number(7.25), 1, 3),
            RawValue::Text("7.25".into())
        );
        assert_eq!(
            c.classify(&SourceCell::Date(0), 1, 3),
            RawValue::Text("1970-01-01 00:00:00".into())
        );
        assert_eq!(c.classify(&SourceCell::Number(7.0), 0, 3), RawValue::Number(7.0));
    }

    #[test]
    fn test_error_cells_follow_missing_policy() {
        let fx = Fixture::new("");
        let c = fx.classifier();
        assert_eq!(
            c.classify(&SourceCell::Error("#DIV/0!".into()), 0, 1),
            RawValue::Text("#DIV/0!".into())
        );

        let mut fx = Fixture::new("");
        fx.missing = MissingValuePattern::new("^(#.*|)$").unwrap();
        let c = fx.classifier();
        assert_eq!(
            c.classify(&SourceCell::Error("#DIV/0!".into()), 0, 1),
            RawValue::Missing
        );
    }

    #[test]
    fn test_blank_kept_when_pattern_does_not_match_empty() {
        let mut fx = Fixture::new("");
        fx.missing = MissingValuePattern::new("^NA$").unwrap();
        let c = fx.classifier();
        assert_eq!(c.classify(&SourceCell::Blank, 0, 1), RawValue::Text(String::new()));
        assert_eq!(c.classify(&SourceCell::Text("NA".into()), 0, 1), RawValue::Missing);
    }

    #[test]
    fn test_formula_cascade_order() {
        assert_eq!(FormulaValue::Number(2.0).resolve(), RawValue::Number(2.0));
        // a date-valued formula is numeric first
        assert_eq!(
            FormulaValue::DateSerial(25569.0).resolve(),
            RawValue::Number(25569.0)
        );
        assert_eq!(FormulaValue::Bool(false).resolve(), RawValue::Bool(false));
        assert_eq!(
            FormulaValue::Text("x".into()).resolve(),
            RawValue::Text("x".into())
        );
        assert_eq!(FormulaValue::Error("#REF!".into()).resolve(), RawValue::Missing);
        assert_eq!(FormulaValue::Empty.resolve(), RawValue::Missing);
    }

    #[test]
    fn test_untyped_cascade() {
        let fx = Fixture::new("");
        let c = fx.classifier();
        let classify = |s: &str| c.classify(&SourceCell::Untyped(s.into()), 0, 1);
        assert_eq!(classify("42"), RawValue::Number(42.0));
        assert_eq!(classify(" -1.5e3 "), RawValue::Number(-1500.0));
        assert_eq!(classify("TRUE"), RawValue::Bool(true));
        assert_eq!(
            classify("2020-01-01").date_millis(),
            Some(1_577_836_800_000)
        );
        assert_eq!(
            classify("2020-01-01 12:00:00"),
            RawValue::ParsedDate {
                millis: 1_577_880_000_000,
                source: "2020-01-01 12:00:00".into()
            }
        );
        assert_eq!(classify("NaN"), RawValue::Text("NaN".into()));
        assert_eq!(classify("not-a-date"), RawValue::Text("not-a-date".into()));
        assert_eq!(classify(""), RawValue::Missing);
        assert_eq!(classify("?"), RawValue::Missing);
    }
}
