//! Loader for the line-oriented declarative table format (ARFF)
//!
//! ```text
//! % comment
//! @relation weather
//! @attribute outlook {sunny,overcast,rainy}
//! @attribute temperature numeric
//! @attribute observed date 'yyyy-MM-dd'
//! @attribute note string {2.0}
//! @data
//! sunny,85,2020-01-01,'hot and dry'
//! ?,80,?,?,{0.5}
//! {1 75, 3 windy}
//! ```
//!
//! Column types are declared, so no inference takes place. Nominal labels
//! keep their declared order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info};

use crate::config::{LoaderConfig, MISSING_MARKER};
use crate::error::{Result, TableError};
use crate::model::{ColumnSchema, ColumnType, DateFormat, TypedRow, TypedTable, TypedValue};

use super::{check_source, source_name, Loader};

pub const KEYWORD_RELATION: &str = "@relation";
pub const KEYWORD_ATTRIBUTE: &str = "@attribute";
pub const KEYWORD_DATA: &str = "@data";

/// Date pattern for `date` attributes declared without one
pub const DEFAULT_ARFF_DATE_PATTERN: &str = "yyyy-MM-dd'T'HH:mm:ss";

/// One token of a delimited line
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub text: String,
    /// Quoted tokens are never the missing marker
    pub quoted: bool,
}

/// Split on `delimiter` outside of `'…'`/`"…"` quotes, unquoting and trimming
pub fn split_fields(s: &str, delimiter: char) -> std::result::Result<Vec<Field>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut quote: Option<char> = None;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => match c {
                '\\' => match chars.next() {
                    Some('n') => current.push('\n'),
                    Some('t') => current.push('\t'),
                    Some('r') => current.push('\r'),
                    Some(other) => current.push(other),
                    None => return Err("dangling escape".to_string()),
                },
                c if c == q => quote = None,
                c => current.push(c),
            },
            None => match c {
                c if c == delimiter => fields.push(finish_field(&mut current, &mut quoted)),
                // whitespace between a closing quote and the delimiter
                c if quoted && c.is_whitespace() => {}
                '\'' | '"' if !quoted && current.trim().is_empty() => {
                    current.clear();
                    quote = Some(c);
                    quoted = true;
                }
                c => current.push(c),
            },
        }
    }

    if quote.is_some() {
        return Err(format!("unterminated quote in '{}'", s));
    }
    if !current.trim().is_empty() || quoted || !fields.is_empty() {
        fields.push(finish_field(&mut current, &mut quoted));
    }
    Ok(fields)
}

/// The single, unquoted value of `s`
fn unquote(s: &str) -> std::result::Result<String, String> {
    Ok(split_fields(s, '\u{0}')?
        .into_iter()
        .next()
        .map(|f| f.text)
        .unwrap_or_default())
}

fn finish_field(current: &mut String, quoted: &mut bool) -> Field {
    let text = if *quoted {
        std::mem::take(current)
    } else {
        let trimmed = current.trim().to_string();
        current.clear();
        trimmed
    };
    let field = Field {
        text,
        quoted: *quoted,
    };
    *quoted = false;
    field
}

/// Quote a value if the format would otherwise misread it
pub fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value == MISSING_MARKER
        || value.starts_with('{')
        || value
            .chars()
            .any(|c| matches!(c, ',' | ' ' | '\'' | '"' | '\\' | '%' | '\t' | '\n' | '\r' | '{' | '}'));
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.len() >= keyword.len()
        && line.is_char_boundary(keyword.len())
        && line[..keyword.len()].eq_ignore_ascii_case(keyword)
}

/// Split a trailing `{weight}` off the end of `rest`
fn split_weight(rest: &str) -> std::result::Result<(&str, Option<f64>), String> {
    let trimmed = rest.trim_end();
    if !trimmed.ends_with('}') {
        return Ok((trimmed, None));
    }
    let Some(open) = trimmed.rfind('{') else {
        return Ok((trimmed, None));
    };
    let inner = &trimmed[open + 1..trimmed.len() - 1];
    if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-')) {
        return Ok((trimmed, None));
    }
    let weight = inner
        .parse::<f64>()
        .map_err(|_| format!("invalid weight '{}'", inner))?;
    Ok((trimmed[..open].trim_end(), Some(weight)))
}

/// Byte index of the quote closing the one that starts `s`
fn closing_quote(s: &str) -> Option<usize> {
    let quote = s.chars().next()?;
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(i);
        }
    }
    None
}

/// Parse an `@attribute` line into a column
fn parse_attribute(line: &str, index: usize) -> std::result::Result<ColumnSchema, String> {
    let current = line[KEYWORD_ATTRIBUTE.len()..].replace('\t', " ");
    let current = current.trim();

    let (name, rest) = if current.starts_with(['\'', '"']) {
        let end = closing_quote(current)
            .ok_or_else(|| format!("unterminated attribute name: {}", current))?;
        (unquote(&current[..=end])?, current[end + 1..].trim())
    } else {
        match current.find(' ') {
            Some(space) => (current[..space].to_string(), current[space..].trim()),
            None => return Err(format!("attribute without type: {}", line)),
        }
    };

    if name.is_empty() {
        return Err(format!("attribute without name: {}", line));
    }

    let lower = rest.to_lowercase();
    let (column_type, remainder) = if ["numeric", "real", "integer"]
        .iter()
        .any(|kw| lower.starts_with(kw))
    {
        (ColumnType::Numeric, skip_word(rest))
    } else if lower.starts_with("string") {
        (ColumnType::Text, skip_word(rest))
    } else if lower.starts_with("date") {
        let spec = skip_word(rest);
        // the pattern is the first token; anything after it must be a weight
        let (pattern, remainder) = if spec.starts_with(['\'', '"']) {
            let end = closing_quote(spec)
                .ok_or_else(|| format!("unterminated date format: {}", spec))?;
            (unquote(&spec[..=end])?, &spec[end + 1..])
        } else if spec.starts_with('{') || spec.is_empty() {
            (String::new(), spec)
        } else {
            match spec.find(char::is_whitespace) {
                Some(ws) => (spec[..ws].to_string(), &spec[ws..]),
                None => (spec.to_string(), ""),
            }
        };
        let pattern = if pattern.is_empty() {
            DEFAULT_ARFF_DATE_PATTERN.to_string()
        } else {
            pattern
        };
        let format = DateFormat::new(&pattern).map_err(|e| e.to_string())?;
        (ColumnType::Date { format }, remainder)
    } else if lower.starts_with('{') {
        let close = closing_brace(rest).ok_or_else(|| format!("unterminated value list: {}", rest))?;
        let labels: Vec<String> = split_fields(&rest[1..close], ',')?
            .into_iter()
            .map(|f| f.text)
            .collect();
        if labels.iter().any(String::is_empty) {
            return Err(format!("empty nominal value in: {}", rest));
        }
        (ColumnType::nominal(labels), &rest[close + 1..])
    } else {
        return Err(format!("unsupported attribute type: {}", rest));
    };

    let mut column = ColumnSchema::new(name, index, column_type);
    let remainder = remainder.trim();
    if !remainder.is_empty() {
        match split_weight(remainder)? {
            ("", Some(weight)) => column = column.with_weight(weight),
            _ => return Err(format!("unexpected text after attribute type: {}", remainder)),
        }
    }
    Ok(column)
}

fn skip_word(s: &str) -> &str {
    match s.find(char::is_whitespace) {
        Some(idx) => s[idx..].trim_start(),
        None => "",
    }
}

/// Index of the `}` closing the `{` at the start of `s`, ignoring quoted braces
fn closing_brace(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '}') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Streaming parser over the lines of one source
struct ArffParser<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> ArffParser<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Next non-empty, non-comment line, trimmed
    fn next_line(&mut self) -> Result<Option<String>> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }
            return Ok(Some(line.to_string()));
        }
        Ok(None)
    }

    /// Read declarations up to and including the data keyword
    fn read_header(&mut self, default_name: &str) -> Result<TypedTable> {
        let mut relation = default_name.to_string();
        let mut columns = Vec::new();
        let mut seen_any = false;

        while let Some(line) = self.next_line()? {
            seen_any = true;
            if starts_with_keyword(&line, KEYWORD_RELATION) {
                let name = unquote(line[KEYWORD_RELATION.len()..].trim())
                    .map_err(|e| TableError::at_line(self.line_no, e))?;
                if !name.is_empty() {
                    relation = name;
                }
            } else if starts_with_keyword(&line, KEYWORD_ATTRIBUTE) {
                let column = parse_attribute(&line, columns.len())
                    .map_err(|e| TableError::at_line(self.line_no, e))?;
                debug!("attribute {}: {}", column.name, column.column_type);
                columns.push(column);
            } else if starts_with_keyword(&line, KEYWORD_DATA) {
                return Ok(TypedTable::new(relation, columns));
            } else {
                return Err(TableError::at_line(
                    self.line_no,
                    format!("unexpected line in header: {}", line),
                ));
            }
        }

        if seen_any {
            Err(TableError::at_line(
                self.line_no,
                format!("missing {} section", KEYWORD_DATA),
            ))
        } else {
            Err(TableError::EmptySource(default_name.to_string()))
        }
    }

    /// Read every data line into `table`
    fn read_data(&mut self, table: &mut TypedTable) -> Result<()> {
        while let Some(line) = self.next_line()? {
            let line_no = self.line_no;
            let row = if line.starts_with('{') {
                parse_sparse(table, &line)
            } else {
                parse_dense(table, &line)
            }
            .map_err(|e| TableError::at_line(line_no, e))?;
            table.push_row(row)?;
        }
        Ok(())
    }
}

fn parse_value(
    table: &mut TypedTable,
    col: usize,
    field: &Field,
) -> std::result::Result<TypedValue, String> {
    if !field.quoted && field.text == MISSING_MARKER {
        return Ok(TypedValue::Missing);
    }

    let column = &table.columns()[col];
    match &column.column_type {
        ColumnType::Numeric => field
            .text
            .parse::<f64>()
            .map(TypedValue::Numeric)
            .map_err(|_| format!("'{}' is not numeric (column '{}')", field.text, column.name)),
        ColumnType::Date { format } => format
            .parse_millis(&field.text)
            .map(TypedValue::Date)
            .ok_or_else(|| {
                format!(
                    "'{}' does not match date format '{}' (column '{}')",
                    field.text, format, column.name
                )
            }),
        ColumnType::Nominal { labels } => labels
            .get_index_of(field.text.as_str())
            .map(TypedValue::Nominal)
            .ok_or_else(|| format!("'{}' is not a declared value of '{}'", field.text, column.name)),
        ColumnType::Text => Ok(TypedValue::Text(table.intern(&field.text))),
    }
}

fn parse_dense(table: &mut TypedTable, line: &str) -> std::result::Result<TypedRow, String> {
    let (body, weight) = match line.strip_suffix('}').and_then(|_| line.rfind(",{")) {
        Some(comma) => match split_weight(&line[comma + 1..])? {
            ("", Some(w)) => (&line[..comma], w),
            _ => (line, 1.0),
        },
        None => (line, 1.0),
    };

    let fields = split_fields(body, ',')?;
    if fields.len() != table.column_count() {
        return Err(format!(
            "expected {} values, found {}",
            table.column_count(),
            fields.len()
        ));
    }

    let mut values = Vec::with_capacity(fields.len());
    for (col, field) in fields.iter().enumerate() {
        values.push(parse_value(table, col, field)?);
    }
    Ok(TypedRow::weighted(values, weight))
}

/// Split the `index value` entries of a sparse row; quoted values may hold commas
fn split_sparse_entries(body: &str) -> std::result::Result<Vec<(usize, Field)>, String> {
    let mut entries = Vec::new();
    let mut rest = body.trim_start();

    while !rest.is_empty() {
        let (idx, tail) = rest
            .split_once(char::is_whitespace)
            .ok_or_else(|| format!("invalid sparse entry '{}'", rest.trim()))?;
        let col: usize = idx
            .parse()
            .map_err(|_| format!("invalid sparse index '{}'", idx))?;

        let tail = tail.trim_start();
        let (field, after) = if tail.starts_with(['\'', '"']) {
            let end = closing_quote(tail)
                .ok_or_else(|| format!("unterminated quote in sparse entry '{}'", tail))?;
            let field = Field {
                text: unquote(&tail[..=end])?,
                quoted: true,
            };
            (field, &tail[end + 1..])
        } else {
            let end = tail.find(',').unwrap_or(tail.len());
            let field = Field {
                text: tail[..end].trim().to_string(),
                quoted: false,
            };
            (field, &tail[end..])
        };
        entries.push((col, field));

        let after = after.trim_start();
        rest = match after.strip_prefix(',') {
            Some(next) => next.trim_start(),
            None if after.is_empty() => after,
            None => return Err(format!("unexpected text in sparse row: '{}'", after)),
        };
    }
    Ok(entries)
}

/// Parse `{index value, ...}`; unlisted cells take their type's zero value
fn parse_sparse(table: &mut TypedTable, line: &str) -> std::result::Result<TypedRow, String> {
    let close = closing_brace(line).ok_or_else(|| format!("unterminated sparse row: {}", line))?;
    let weight = match split_weight(&line[close + 1..])? {
        ("", Some(w)) => w,
        ("", None) => 1.0,
        (other, _) => return Err(format!("unexpected text after sparse row: {}", other)),
    };

    let empty_text = table
        .columns()
        .iter()
        .any(|c| matches!(c.column_type, ColumnType::Text))
        .then(|| table.intern(""));

    let mut values: Vec<TypedValue> = table
        .columns()
        .iter()
        .map(|column| match &column.column_type {
            ColumnType::Numeric => TypedValue::Numeric(0.0),
            ColumnType::Date { .. } => TypedValue::Date(0),
            ColumnType::Nominal { labels } if labels.is_empty() => TypedValue::Missing,
            ColumnType::Nominal { .. } => TypedValue::Nominal(0),
            ColumnType::Text => empty_text.map_or(TypedValue::Missing, TypedValue::Text),
        })
        .collect();

    for (col, field) in split_sparse_entries(&line[1..close])? {
        if col >= table.column_count() {
            return Err(format!("sparse index {} out of range", col));
        }
        values[col] = parse_value(table, col, &field)?;
    }

    Ok(TypedRow::weighted(values, weight))
}

/// Loader for ARFF and gzip-compressed ARFF files
pub struct ArffLoader {
    path: PathBuf,
    force_compression: bool,
    structure: Option<TypedTable>,
    data: Option<TypedTable>,
}

impl ArffLoader {
    pub fn new(path: impl Into<PathBuf>, config: LoaderConfig) -> Result<Self> {
        let path = path.into();
        config.validate()?;
        check_source(&path)?;
        Ok(Self {
            path,
            force_compression: config.force_compression,
            structure: None,
            data: None,
        })
    }

    fn open(&self) -> Result<ArffParser<Box<dyn BufRead>>> {
        let file = File::open(&self.path).map_err(|e| TableError::SourceUnavailable {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        let reader: Box<dyn BufRead> = if is_compressed(&self.path) || self.force_compression {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(ArffParser::new(reader))
    }
}

fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

impl Loader for ArffLoader {
    fn format_name(&self) -> &'static str {
        "ARFF loader"
    }

    fn structure(&mut self) -> Result<TypedTable> {
        if let Some(data) = &self.data {
            return Ok(data.structure());
        }
        if let Some(structure) = &self.structure {
            return Ok(structure.clone());
        }
        let mut parser = self.open()?;
        let structure = parser.read_header(&source_name(&self.path))?;
        self.structure = Some(structure.clone());
        Ok(structure)
    }

    fn data_set(&mut self) -> Result<TypedTable> {
        if let Some(data) = &self.data {
            return Ok(data.clone());
        }
        let mut parser = self.open()?;
        let mut table = parser.read_header(&source_name(&self.path))?;
        parser.read_data(&mut table)?;
        info!(
            "Loaded '{}': {} column(s), {} row(s)",
            table.name,
            table.column_count(),
            table.row_count()
        );
        self.data = Some(table.clone());
        Ok(table)
    }
}
