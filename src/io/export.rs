use anyhow::Result;
use std::io::Write;

use crate::application::{CashFlowSummary, ConsolidatedReport};

/// Exporter for writing consolidated cash flow to CSV or JSON
pub struct Exporter<'a> {
    report: &'a ConsolidatedReport,
}

impl<'a> Exporter<'a> {
    pub fn new(report: &'a ConsolidatedReport) -> Self {
        Self { report }
    }

    /// Export the merged ledger to CSV, oldest operation first
    pub fn export_operations_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["date", "operation_type", "value", "currency", "comment"])?;

        let mut count = 0;
        for op in self.report.cash_flow() {
            csv_writer.write_record([
                op.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                op.operation_type.as_str().to_string(),
                op.value.to_string(),
                op.currency.as_str().to_string(),
                op.comment.clone().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }
}

/// Export summary lines to CSV format
pub fn export_summary_csv<W: Write>(summary: &CashFlowSummary, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["section", "group", "rur", "usd", "combined_rur"])?;

    for line in &summary.lines {
        csv_writer.write_record([
            line.name.clone(),
            line.group.title().to_string(),
            line.rur.to_string(),
            line.usd.to_string(),
            line.combined.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(summary.lines.len())
}

/// Export the whole summary as pretty JSON
pub fn export_summary_json<W: Write>(summary: &CashFlowSummary, mut writer: W) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    writer.write_all(json.as_bytes())?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
