//! Untyped cell observations collected before column types are known

use super::date::DateFormat;

/// One classified source cell
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Missing,
    Number(f64),
    /// Milliseconds since the Unix epoch (UTC)
    Date(i64),
    /// Date recognized in source text; the text is kept for labels
    ParsedDate { millis: i64, source: String },
    Bool(bool),
    Text(String),
}

impl RawValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }

    /// Short name of the observation kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Missing => "missing",
            RawValue::Number(_) => "number",
            RawValue::Date(_) | RawValue::ParsedDate { .. } => "date",
            RawValue::Bool(_) => "boolean",
            RawValue::Text(_) => "text",
        }
    }

    /// Epoch milliseconds of either date form
    pub fn date_millis(&self) -> Option<i64> {
        match self {
            RawValue::Date(millis) | RawValue::ParsedDate { millis, .. } => Some(*millis),
            _ => None,
        }
    }

    /// Textual form used for nominal labels and free text
    pub fn render(&self, dates: &DateFormat) -> String {
        match self {
            RawValue::Missing => String::new(),
            RawValue::Number(n) => number_to_string(*n),
            RawValue::Date(millis) => dates.format_millis(*millis),
            RawValue::ParsedDate { source, .. } => source.clone(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }
}

/// A row of raw values, padded to the current column count
pub type RawRow = Vec<RawValue>;

/// Integral doubles render without a decimal point, others in shortest form
pub fn number_to_string(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-3.0), "-3");
        assert_eq!(number_to_string(3.25), "3.25");
        assert_eq!(number_to_string(f64::NAN), "NaN");
    }

    #[test]
    fn test_render() {
        let dates = DateFormat::default();
        assert_eq!(RawValue::Bool(true).render(&dates), "true");
        assert_eq!(RawValue::Date(0).render(&dates), "1970-01-01 00:00:00");
        assert_eq!(RawValue::Text("x".into()).render(&dates), "x");
        let parsed = RawValue::ParsedDate {
            millis: 1_577_836_800_000,
            source: "2020-01-01".into(),
        };
        assert_eq!(parsed.render(&dates), "2020-01-01");
        assert_eq!(parsed.date_millis(), Some(1_577_836_800_000));
    }
}
