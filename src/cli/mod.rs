use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;

use crate::application::{standard_sections, CashFlowLine, CashFlowSummary, ConsolidatedReport};
use crate::domain::Currency;
use crate::io::{export_summary_csv, export_summary_json, read_statement_file, Exporter};

/// Brokerflow - cash flow of broker statements
#[derive(Parser, Debug)]
#[command(name = "brokerflow")]
#[command(about = "Merge broker statement exports and summarize cash flow by category")]
#[command(version)]
pub struct Cli {
    /// Broker report files; statements of the same client may overlap
    #[arg(default_value = "GetBrokerReport.xml")]
    pub files: Vec<PathBuf>,

    /// Verbose logging (-v for info and warnings, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// USD price in rubles. If not specified the value is taken from the reports
    #[arg(long)]
    pub usd_price: Option<Decimal>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Also write the merged operations to a CSV file
    #[arg(long)]
    pub operations: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        init_logging(self.verbose);

        let mut statements = Vec::with_capacity(self.files.len());
        for path in &self.files {
            tracing::info!("Processing the report: {} ...", path.display());
            let statement = read_statement_file(path)
                .with_context(|| format!("Failed to read report {}", path.display()))?;
            statements.push(statement);
        }

        let report = ConsolidatedReport::from_statements(statements)
            .context("Failed to consolidate reports")?;

        let usd_price = self.usd_price.unwrap_or(report.usd_price());
        let summary = CashFlowSummary::build(&report, usd_price, &standard_sections());

        if let Some(path) = &self.operations {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let count = Exporter::new(&report).export_operations_csv(file)?;
            eprintln!("Exported {} operations to {}", count, path.display());
        }

        match self.format {
            OutputFormat::Table => print_table(&summary),
            OutputFormat::Json => export_summary_json(&summary, stdout())?,
            OutputFormat::Csv => {
                export_summary_csv(&summary, stdout())?;
            }
        }

        Ok(())
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("brokerflow={}", level)));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn print_table(summary: &CashFlowSummary) {
    println!(
        "[Period] {} - {} ({} days)",
        summary.from_date, summary.to_date, summary.days
    );
    println!("[USD price] {}", summary.usd_price);
    println!(
        "[Statements] {} ({} operations)",
        summary.statements, summary.operations
    );

    let mut group = None;
    for line in &summary.lines {
        if group != Some(line.group) {
            println!("---- {} ----", line.group.title());
            group = Some(line.group);
        }
        println!("{}", format_line(line));
    }
}

/// One report line, e.g. `[Fees] -100.50₽, -1.5$ (-205.74₽)`
fn format_line(line: &CashFlowLine) -> String {
    format!(
        "[{}] {}{}, {}{} ({}{})",
        line.name,
        line.rur,
        Currency::Rur.symbol(),
        line.usd,
        Currency::Usd.symbol(),
        line.combined,
        Currency::Rur.symbol()
    )
}
