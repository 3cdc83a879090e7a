//! CLI that converts a COBOL copybook into a JSON record layout.
//!
//! # Examples
//!
//! ```bash
//! # Write customer.json next to the copybook
//! copybook-parser customer.cpy
//!
//! # Choose the output file and print a summary
//! copybook-parser customer.cpy -o layout.json -v
//!
//! # Sequence-numbered source (columns 1-6 and 73-80 ignored)
//! copybook-parser legacy.cpy --source-format fixed --no-pretty
//! ```

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use miette::{miette, IntoDiagnostic, Result, WrapErr};

use open_mainframe_copybook::{CopybookParser, ParseResult, ParserConfig, SourceFormat};

mod output;

#[derive(Parser, Debug)]
#[command(name = "copybook-parser")]
#[command(
    version,
    about = "Parse COBOL copybooks into JSON record layouts for fixed-length files",
    after_help = "Level 88 condition names are excluded from the output: they do not occupy positions in the record."
)]
struct Cli {
    /// Input copybook file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output JSON file (default: input with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Pretty-print the JSON (default)
    #[arg(short, long, overrides_with = "no_pretty")]
    pretty: bool,

    /// Write compact JSON
    #[arg(long, overrides_with = "pretty")]
    no_pretty: bool,

    /// Copybook source format
    #[arg(long, value_enum, default_value = "free")]
    source_format: FormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    /// Code anywhere on the line
    Free,
    /// Sequence area in columns 1-6, indicator in column 7
    Fixed,
}

impl From<FormatArg> for SourceFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Free => SourceFormat::Free,
            FormatArg::Fixed => SourceFormat::Fixed,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .ok()
                .filter(|_| !cli.verbose)
                .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let verbose = cli.verbose;
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        if verbose {
            eprintln!("{e:?}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let input = cli.input;
    if !input.is_file() {
        return Err(miette!(
            "Invalid or non-existent copybook file: {}",
            input.display()
        ));
    }
    let output_path = cli.output.unwrap_or_else(|| input.with_extension("json"));
    let pretty = cli.pretty || !cli.no_pretty;

    if cli.verbose {
        println!("COBOL Copybook Parser v{}", env!("CARGO_PKG_VERSION"));
        println!("Input file: {}", input.display());
        println!("Output file: {}", output_path.display());
        println!("Parsing copybook...");
    }

    let bytes = std::fs::read(&input)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read copybook: {}", input.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();

    let source_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    let config = ParserConfig::new().with_source_format(cli.source_format.into());
    let parser = CopybookParser::new(config);
    tracing::debug!("Source format: {:?}", parser.config().source_format);
    let result = parser.parse(&source_name, &lines)?;
    tracing::debug!("Parsed {} fields from {}", result.field_count(), input.display());

    let json = output::to_json(&result, pretty)
        .into_diagnostic()
        .wrap_err("Failed to serialize record layout")?;
    std::fs::write(&output_path, json)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write output file: {}", output_path.display()))?;

    if cli.verbose {
        print_summary(&result);
        println!("JSON saved to: {}", output_path.display());
    } else {
        println!(
            "Successfully parsed {} -> {}",
            input.display(),
            output_path.display()
        );
    }
    Ok(())
}

fn print_summary(result: &ParseResult) {
    println!();
    println!("Parsing completed successfully!");
    println!("File: {}", result.source_name);
    println!("Total record length: {} bytes", result.total_length);
    println!("Number of data fields: {}", result.field_count());
    if !result.layouts.is_empty() {
        println!("Record layouts found: {}", result.layouts.len());
        for layout in &result.layouts {
            let redefines = layout
                .redefines
                .as_deref()
                .map(|target| format!(" (REDEFINES {target})"))
                .unwrap_or_default();
            println!("  - {}{} - Length: {} bytes", layout.name, redefines, layout.length);
        }
    }
}
