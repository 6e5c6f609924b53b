use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{
    Ledger, MergeMode, Operation, ParseCurrencyError, RawOperation, StatementMetadata,
    StatementRecord,
};

use super::ReportError;

/// Cash flow of one or more statements merged into a single view.
/// Built once from the extracted statements and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedReport {
    start_date: NaiveDate,
    end_date: NaiveDate,
    usd_price: Decimal,
    cash_flow: Ledger,
    statement_count: usize,
}

impl ConsolidatedReport {
    /// Merge statements in the given order.
    ///
    /// The first statement's client id is the baseline: statements of the
    /// same client are reconciled by date, statements of other clients are
    /// taken in full. The reported period spans all statements, and the USD
    /// price comes from the statement with the latest end date unless that
    /// statement has no price.
    pub fn from_statements(
        statements: impl IntoIterator<Item = StatementRecord>,
    ) -> Result<Self, ReportError> {
        let mut statements = statements.into_iter().enumerate().peekable();
        let baseline_client_id = match statements.peek() {
            Some((_, first)) => first.metadata.client_id.clone(),
            None => return Err(ReportError::NoStatements),
        };

        let mut start_date: Option<NaiveDate> = None;
        let mut end_date: Option<NaiveDate> = None;
        let mut usd_price = Decimal::ZERO;
        let mut cash_flow = Ledger::new();
        let mut statement_count = 0;

        for (index, statement) in statements {
            let number = index + 1;
            let StatementRecord {
                metadata,
                operations,
            } = statement;
            validate_metadata(number, &metadata)?;

            start_date = Some(match start_date {
                Some(current) => current.min(metadata.start_date),
                None => metadata.start_date,
            });

            if end_date.is_none_or(|current| metadata.end_date > current) {
                end_date = Some(metadata.end_date);
                if metadata.has_rate() {
                    usd_price = metadata.reference_rate;
                }
            }

            let ledger = build_ledger(number, operations)?;
            let mode = MergeMode::for_client(&baseline_client_id, &metadata.client_id);
            let incoming = ledger.len();
            let added = cash_flow.merge(ledger, mode);
            tracing::debug!(
                "Statement #{} ({} - {}, client '{}'): {:?} merge kept {} of {} operations",
                number,
                metadata.start_date,
                metadata.end_date,
                metadata.client_id,
                mode,
                added,
                incoming
            );
            statement_count += 1;
        }

        let (Some(start_date), Some(end_date)) = (start_date, end_date) else {
            return Err(ReportError::NoStatements);
        };

        Ok(Self {
            start_date,
            end_date,
            usd_price,
            cash_flow,
            statement_count,
        })
    }

    /// Start and end of the combined reporting period
    pub fn report_date(&self) -> (NaiveDate, NaiveDate) {
        (self.start_date, self.end_date)
    }

    /// USD price in rubles used to convert USD totals; zero if no statement had one
    pub fn usd_price(&self) -> Decimal {
        self.usd_price
    }

    pub fn cash_flow(&self) -> &Ledger {
        &self.cash_flow
    }

    pub fn statement_count(&self) -> usize {
        self.statement_count
    }

    pub fn period_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

fn validate_metadata(number: usize, metadata: &StatementMetadata) -> Result<(), ReportError> {
    if metadata.start_date > metadata.end_date {
        return Err(ReportError::InvalidPeriod {
            statement: number,
            start: metadata.start_date,
            end: metadata.end_date,
        });
    }
    if metadata.reference_rate < Decimal::ZERO {
        return Err(ReportError::NegativeRate {
            statement: number,
            rate: metadata.reference_rate,
        });
    }
    Ok(())
}

/// Convert the raw operations of one statement, rejecting unsupported currencies.
fn build_ledger(number: usize, operations: Vec<RawOperation>) -> Result<Ledger, ReportError> {
    let mut ledger = Ledger::new();
    for raw in operations {
        let date = raw.date;
        let operation = Operation::try_from(raw).map_err(|err| {
            let ParseCurrencyError::Unsupported(code) = err;
            ReportError::UnsupportedCurrency {
                statement: number,
                code,
                date: date.to_string(),
            }
        })?;
        ledger.add(operation);
    }
    Ok(ledger)
}
