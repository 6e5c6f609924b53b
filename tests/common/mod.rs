// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use brokerflow::domain::{OperationType, RawOperation, StatementMetadata, StatementRecord};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Helper to parse a date string (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to parse a date string into midnight of that day
pub fn parse_datetime(date_str: &str) -> NaiveDateTime {
    parse_date(date_str).and_hms_opt(0, 0, 0).unwrap()
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// Raw operation as the extractor would produce it
pub fn raw_op(date: &str, value: &str, currency: &str, operation_type: OperationType) -> RawOperation {
    RawOperation {
        value: dec(value),
        currency: currency.to_string(),
        date: parse_datetime(date),
        operation_type: operation_type.label().unwrap_or("unknown").to_string(),
        comment: None,
    }
}

pub fn statement(
    start: &str,
    end: &str,
    rate: &str,
    client_id: &str,
    operations: Vec<RawOperation>,
) -> StatementRecord {
    StatementRecord::new(
        StatementMetadata::new(parse_date(start), parse_date(end), dec(rate), client_id),
        operations,
    )
}

/// Test fixture: broker report XML written to a temporary directory
pub struct ReportFile {
    title: String,
    rate: Option<String>,
    client_id: Option<String>,
    items: Vec<String>,
}

impl ReportFile {
    /// Report covering `start`..`end`, dates as DD.MM.YYYY
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            title: format!("Отчет Банка за период с {} по {} о сделках", start, end),
            rate: None,
            client_id: None,
            items: Vec::new(),
        }
    }

    pub fn rate(mut self, rate: &str) -> Self {
        self.rate = Some(rate.to_string());
        self
    }

    pub fn client(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    /// Add a cash flow item; `date` as YYYY-MM-DD
    pub fn item(mut self, date: &str, value: &str, currency: &str, label: &str) -> Self {
        self.items.push(format!(
            r#"<Details debt_date4="{}" decree_amount2="{}" debt_type4="{}T00:00:00" operation_type="{}" notes1="" />"#,
            value, currency, date, label
        ));
        self
    }

    pub fn to_xml(&self) -> String {
        let client = self
            .client_id
            .as_ref()
            .map(|id| format!(r#"<Client client_code="{}" />"#, id))
            .unwrap_or_default();
        let rate = self
            .rate
            .as_ref()
            .map(|rate| format!(r#"<Currency CurrEnd="{}" />"#, rate))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<Report xmlns="GetBrokerReport" Name="GetBrokerReport">
  <Tablix1><TablixTitul Textbox6="{}" /></Tablix1>
  {}
  {}
  <DDS_place>
    <DDS_Collection>
      {}
    </DDS_Collection>
  </DDS_place>
</Report>"#,
            self.title,
            client,
            rate,
            self.items.join("\n      ")
        )
    }

    pub fn write(&self, dir: &TempDir, name: &str) -> Result<PathBuf> {
        let path = dir.path().join(name);
        std::fs::write(&path, self.to_xml())?;
        Ok(path)
    }
}
