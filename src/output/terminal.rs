//! Colored terminal output for schemas and row previews

use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::config::MISSING_MARKER;
use crate::error::Result;
use crate::model::{number_to_string, TypedTable};

fn write_heading(out: &mut dyn WriteColor, heading: &str) -> Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(out, "{}", heading)?;
    out.reset()?;
    Ok(())
}

/// One line per column: position, name, type, and weight
pub fn render_schema(table: &TypedTable, out: &mut dyn WriteColor) -> Result<()> {
    write_heading(
        out,
        &format!("{} ({} columns)", table.name, table.column_count()),
    )?;

    let mut builder = Builder::default();
    builder.push_record(["#", "name", "type", "weight"]);
    for column in table.columns() {
        builder.push_record([
            (column.index + 1).to_string(),
            column.name.clone(),
            column.column_type.to_string(),
            column.weight.map(number_to_string).unwrap_or_default(),
        ]);
    }
    writeln!(out, "{}", builder.build().with(Style::rounded()))?;
    Ok(())
}

/// The first `limit` rows under the column names; missing cells show as `?`
pub fn render_preview(table: &TypedTable, limit: usize, out: &mut dyn WriteColor) -> Result<()> {
    let shown = limit.min(table.row_count());
    write_heading(
        out,
        &format!("{} ({} of {} rows)", table.name, shown, table.row_count()),
    )?;

    if table.column_count() == 0 {
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(table.columns().iter().map(|c| c.name.clone()));
    for row in 0..shown {
        builder.push_record((0..table.column_count()).map(|col| {
            table
                .display_value(row, col)
                .map(|v| v.into_owned())
                .unwrap_or_else(|| MISSING_MARKER.to_string())
        }));
    }
    writeln!(out, "{}", builder.build().with(Style::rounded()))?;
    Ok(())
}
