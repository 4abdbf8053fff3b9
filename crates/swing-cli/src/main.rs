//! Swing Merge CLI
//!
//! Command-line tool for merging a multi-sheet swing-tracker export into one sheet.

mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use swing_core::{
    eligible_sheets, header::duplicate_labels, header::raw_header_row, merge_workbook, reconcile,
    write_csv, write_json, write_xlsx, CalamineWorkbook, Error, MergeConfig, MergedTable,
    SheetProgress, WorkbookSource,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "swing-merge")]
#[command(about = "Merge swing-tracker workbook sheets into one table", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge all player sheets of a workbook and export the result
    Merge {
        /// Workbook exported by the swing tracker
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Xlsx)]
        format: OutputFormat,

        /// Config file (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of merged rows to preview
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },

    /// List the sheets of a workbook and whether each is merged
    Sheets {
        /// Workbook to inspect
        #[arg(short, long)]
        input: PathBuf,

        /// Config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the canonical header built from the first eligible sheet
    Header {
        /// Workbook to inspect
        #[arg(short, long)]
        input: PathBuf,

        /// Config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a config file populated with the defaults
    CreateConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> swing_core::Result<()> {
    match command {
        Commands::Merge {
            input,
            output,
            format,
            config,
            preview,
        } => cmd_merge(&input, &output, format, config.as_deref(), preview),
        Commands::Sheets { input, config } => cmd_sheets(&input, config.as_deref()),
        Commands::Header { input, config } => cmd_header(&input, config.as_deref()),
        Commands::CreateConfig { output } => cmd_create_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> swing_core::Result<MergeConfig> {
    match path {
        Some(p) => MergeConfig::load(p),
        None => Ok(MergeConfig::default()),
    }
}

fn cmd_merge(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    config_path: Option<&Path>,
    preview: usize,
) -> swing_core::Result<()> {
    let config = load_config(config_path)?;
    let mut workbook = CalamineWorkbook::open(input)?;

    println!("Processing {}", input.display());
    let report = merge_workbook(&mut workbook, &config, |p: &SheetProgress<'_>| {
        println!("[{}/{}] {}", p.index + 1, p.total, p.sheet);
    })?;

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    let table = match report.table {
        Some(table) => table,
        None => {
            println!("\nNo rows to export; no file written.");
            return Ok(());
        }
    };

    print_preview(&table, &config, preview);

    println!();
    println!("Summary:");
    println!("  rows:    {}", table.row_count());
    println!("  columns: {}", table.column_count());
    println!("  sheets:  {}", table.distinct_sheet_count());

    match format {
        OutputFormat::Xlsx => write_xlsx(&table, &config, output)?,
        OutputFormat::Csv => write_csv(&table, &config, BufWriter::new(File::create(output)?))?,
        OutputFormat::Json => write_json(&table, BufWriter::new(File::create(output)?))?,
    }

    info!(path = %output.display(), ?format, "export written");
    println!("\nExported {} rows to {}", table.row_count(), output.display());

    Ok(())
}

fn print_preview(table: &MergedTable, config: &MergeConfig, limit: usize) {
    if limit == 0 {
        return;
    }

    let header = table.output_labels(&config.source_sheet_column, &config.bat_order_column);
    println!("\nPreview (first {} rows):", limit.min(table.row_count()));
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    for row in table.rows.iter().take(limit) {
        let values: Vec<String> = MergedTable::output_cells(row)
            .iter()
            .map(|c| c.to_string_value())
            .collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }
}

fn cmd_sheets(input: &Path, config_path: Option<&Path>) -> swing_core::Result<()> {
    let config = load_config(config_path)?;
    let workbook = CalamineWorkbook::open(input)?;

    let names = workbook.sheet_names();
    let eligible = eligible_sheets(&names, &config);

    println!("Sheets ({}):", names.len());
    for name in &names {
        let marker = match eligible.iter().position(|e| e == name) {
            Some(0) => " [header]",
            Some(_) => "",
            None => " [excluded]",
        };
        println!("  {}{}", name, marker);
    }
    println!();
    println!("{} of {} sheets will be merged", eligible.len(), names.len());

    Ok(())
}

fn cmd_header(input: &Path, config_path: Option<&Path>) -> swing_core::Result<()> {
    let config = load_config(config_path)?;
    let mut workbook = CalamineWorkbook::open(input)?;

    let names = eligible_sheets(&workbook.sheet_names(), &config);
    let first = names.first().ok_or(Error::NoEligibleSheets)?;
    let grid = workbook
        .read_grid(first)
        .map_err(|reason| Error::first_sheet(first, reason))?;

    let raw = raw_header_row(&grid, config.header_row).map_err(|reason| Error::first_sheet(first, reason))?;
    let header = reconcile(raw.iter().map(|label| label.as_deref()));

    println!("Header from sheet '{}' ({} columns):", first, header.len());
    for (i, label) in header.labels().iter().enumerate() {
        println!("  {:>3}. {}", i + 1, label);
    }

    let duplicates = duplicate_labels(&raw);
    if !duplicates.is_empty() {
        println!();
        println!("Duplicate labels (numbered): {}", duplicates.join(", "));
    }

    Ok(())
}

fn cmd_create_config(output: &Path) -> swing_core::Result<()> {
    let config = MergeConfig::default();
    config.save(output)?;

    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to adjust the layout, then run:");
    println!(
        "  swing-merge merge --input <workbook> --output <file> --config {}",
        output.display()
    );

    Ok(())
}
