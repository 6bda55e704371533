//! typedtab - inspect and convert typed tabular data

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use termcolor::{ColorChoice, StandardStream};

use typedtab::config::{ColumnRange, LoaderConfig, MissingValuePattern, WriterConfig};
use typedtab::model::{DateFormat, TypedTable};
use typedtab::output::{render_preview, render_schema, schema_to_json, write_table};
use typedtab::parser::LoaderFactory;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaFormat {
    Terminal,
    Json,
}

/// Typed import and export of spreadsheets, delimited text, and ARFF files
#[derive(Parser, Debug)]
#[command(name = "typedtab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show column names and inferred types without reading rows into the table
    Schema {
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: SchemaFormat,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Show the first rows of a table
    Preview {
        input: PathBuf,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value_t = 10)]
        rows: usize,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Convert a table to another format, chosen by the output extension
    Convert {
        input: PathBuf,

        output: PathBuf,

        #[command(flatten)]
        load: LoadArgs,

        /// Text written for missing values (blank by default)
        #[arg(long)]
        missing_placeholder: Option<String>,

        /// Worksheet name for xlsx output
        #[arg(long, default_value = "Sheet1")]
        sheet_name: String,

        /// Relation name for ARFF output
        #[arg(long)]
        relation: Option<String>,
    },
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Worksheet to read (1-based)
    #[arg(long, default_value_t = 1)]
    sheet_index: usize,

    /// First row to read (1-based)
    #[arg(long, default_value_t = 1)]
    first_row: usize,

    /// Number of data rows to read; 0 or less reads all
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    num_rows: i64,

    /// Add placeholder columns for cells beyond the header
    #[arg(long)]
    auto_extend_header: bool,

    /// Columns to read as text, e.g. `first-3,5,7-last`
    #[arg(long, default_value = "")]
    text_columns: ColumnRange,

    /// The first row holds data rather than column names
    #[arg(long)]
    no_header: bool,

    /// Comma-separated column names to use instead of the header row
    #[arg(long)]
    custom_column_headers: Option<String>,

    /// Regular expression matching missing values
    #[arg(long, default_value = typedtab::config::DEFAULT_MISSING_VALUE)]
    missing_value: MissingValuePattern,

    /// Nominal columns with more distinct values become text
    #[arg(long, default_value_t = typedtab::config::DEFAULT_MAX_LABELS)]
    max_labels: usize,

    /// Date pattern, e.g. `yyyy-MM-dd HH:mm:ss`
    #[arg(long, default_value = typedtab::model::DEFAULT_TIMESTAMP_PATTERN)]
    date_format: DateFormat,

    /// Field delimiter for delimited text
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Read ARFF input as gzip regardless of extension
    #[arg(long)]
    force_compression: bool,
}

impl LoadArgs {
    fn to_config(&self) -> Result<LoaderConfig> {
        let delimiter = delimiter_byte(self.delimiter)?;
        Ok(LoaderConfig::new()
            .with_sheet_index(self.sheet_index)
            .with_first_row(self.first_row)
            .with_num_rows(self.num_rows)
            .with_auto_extend_header(self.auto_extend_header)
            .with_text_columns(self.text_columns.clone())
            .with_no_header(self.no_header)
            .with_custom_column_headers(self.custom_column_headers.as_deref().unwrap_or(""))
            .with_missing_value(self.missing_value.clone())
            .with_max_labels(self.max_labels)
            .with_date_format(self.date_format.clone())
            .with_delimiter(delimiter)
            .with_force_compression(self.force_compression))
    }
}

fn delimiter_byte(c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        bail!("Delimiter must be a single ASCII character, got '{}'", c)
    }
}

fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if env::var("RUST_LOG").is_err() {
        builder.filter_module("typedtab", LevelFilter::Info);
    }
    let _ = builder.format_timestamp_millis().try_init();
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn load(input: &Path, load: &LoadArgs, full: bool) -> Result<TypedTable> {
    let config = load.to_config()?;
    let mut loader = LoaderFactory::open(input, config)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let table = if full {
        loader.data_set()
    } else {
        loader.structure()
    };
    table.with_context(|| format!("Failed to read {}", input.display()))
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Schema {
            input,
            format,
            load: args,
        } => {
            let table = load(&input, &args, false)?;
            match format {
                SchemaFormat::Terminal => {
                    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
                    render_schema(&table, &mut stdout)?;
                }
                SchemaFormat::Json => println!("{}", schema_to_json(&table)?),
            }
        }
        Command::Preview {
            input,
            rows,
            load: args,
        } => {
            let table = load(&input, &args, true)?;
            let mut stdout = StandardStream::stdout(ColorChoice::Auto);
            render_preview(&table, rows, &mut stdout)?;
        }
        Command::Convert {
            input,
            output,
            load: args,
            missing_placeholder,
            sheet_name,
            relation,
        } => {
            let table = load(&input, &args, true)?;
            let mut config = WriterConfig::new()
                .with_sheet_name(sheet_name)
                .with_delimiter(delimiter_byte(args.delimiter)?);
            if let Some(placeholder) = missing_placeholder {
                config = config.with_missing_placeholder(placeholder);
            }
            if let Some(relation) = relation {
                config = config.with_relation(relation);
            }
            write_table(&table, &output, &config)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Converted {} to {}", input.display(), output.display());
        }
    }

    Ok(())
}
