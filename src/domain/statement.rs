use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::RawOperation;

/// Header data of a single broker statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementMetadata {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// USD price in rubles at the end of the period; zero when the statement has none
    pub reference_rate: Decimal,
    /// Identifies the account the statement belongs to
    pub client_id: String,
}

impl StatementMetadata {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        reference_rate: Decimal,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            reference_rate,
            client_id: client_id.into(),
        }
    }

    /// Returns true if the statement carries a usable reference rate
    pub fn has_rate(&self) -> bool {
        !self.reference_rate.is_zero()
    }

    /// Length of the reporting period in days
    pub fn period_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// A fully extracted statement, ready to be consolidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRecord {
    pub metadata: StatementMetadata,
    pub operations: Vec<RawOperation>,
}

impl StatementRecord {
    pub fn new(metadata: StatementMetadata, operations: Vec<RawOperation>) -> Self {
        Self {
            metadata,
            operations,
        }
    }
}
