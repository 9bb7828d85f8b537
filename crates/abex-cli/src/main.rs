//! ABEX Shop Report CLI
//!
//! Command-line tool for turning shop chat logs into spreadsheet reports
//! and translating those reports with a mapping table.

use abex_core::{
    build_report_from_file, report_rows, write_report, write_report_json, MappingTable,
    SlotCapacity,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_LOG: &str = "input.txt";
const DEFAULT_REPORT: &str = "output_processed.csv";
const DEFAULT_MAPPING: &str = "mapping.csv";
const DEFAULT_MAPPED: &str = "changed.csv";

#[derive(Parser)]
#[command(name = "abex-cli")]
#[command(about = "ABEX shop chat log reporter", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a chat log and export the merged shop report
    Process {
        /// Chat log to read
        #[arg(short, long, default_value = DEFAULT_LOG)]
        input: PathBuf,

        /// Report file to write
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Apply a find/replace mapping table to an exported report
    Map {
        /// Mapping table (find,replace per row)
        #[arg(short, long, default_value = DEFAULT_MAPPING)]
        mapping: PathBuf,

        /// Table to rewrite
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        input: PathBuf,

        /// Rewritten table to write
        #[arg(short, long, default_value = DEFAULT_MAPPED)]
        output: PathBuf,
    },

    /// Process a chat log, then apply the mapping table to the report
    Run {
        /// Chat log to read
        #[arg(short, long, default_value = DEFAULT_LOG)]
        input: PathBuf,

        /// Report file to write
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        report: PathBuf,

        /// Mapping table (find,replace per row)
        #[arg(short, long, default_value = DEFAULT_MAPPING)]
        mapping: PathBuf,

        /// Rewritten report to write
        #[arg(short, long, default_value = DEFAULT_MAPPED)]
        output: PathBuf,
    },

    /// Parse a chat log and print the report without writing files
    Show {
        /// Chat log to read
        #[arg(short, long, default_value = DEFAULT_LOG)]
        input: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only show rows from this land
        #[arg(long)]
        land: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by the flags
fn setup_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("abex_core={level},abex_cli={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    debug!("Logging initialized at level: {}", level);
}

fn run(command: Commands) -> abex_core::Result<()> {
    match command {
        Commands::Process {
            input,
            output,
            format,
        } => cmd_process(&input, &output, format),
        Commands::Map {
            mapping,
            input,
            output,
        } => cmd_map(&mapping, &input, &output),
        Commands::Run {
            input,
            report,
            mapping,
            output,
        } => {
            cmd_process(&input, &report, Format::Csv)?;
            cmd_map(&mapping, &report, &output)
        }
        Commands::Show { input, limit, land } => cmd_show(&input, limit, land.as_deref()),
    }
}

fn cmd_process(input: &Path, output: &Path, format: Format) -> abex_core::Result<()> {
    let rows = build_report_from_file(input, SlotCapacity::default())?;

    match format {
        Format::Csv => write_report(output, &rows)?,
        Format::Json => write_report_json(output, &rows)?,
    }

    println!("Processed {} into {} rows: {}", input.display(), rows.len(), output.display());

    Ok(())
}

fn cmd_map(mapping_path: &Path, input: &Path, output: &Path) -> abex_core::Result<()> {
    let mapping = MappingTable::load(mapping_path)?;
    let written = mapping.substitute_file(input, output)?;

    println!(
        "Applied {} mapping rules to {} rows: {}",
        mapping.len(),
        written,
        output.display()
    );

    Ok(())
}

fn cmd_show(input: &Path, limit: Option<usize>, land: Option<&str>) -> abex_core::Result<()> {
    let mut rows = build_report_from_file(input, SlotCapacity::default())?;

    if let Some(land) = land {
        rows.retain(|r| r.land == land);
    }

    let (header, cells) = report_rows(&rows);

    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    let row_limit = limit.unwrap_or(cells.len());
    for row in cells.iter().take(row_limit) {
        println!("{}", row.join("\t"));
    }

    if cells.len() > row_limit {
        println!("... ({} more rows)", cells.len() - row_limit);
    }

    Ok(())
}
