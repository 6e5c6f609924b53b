use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReportError {
    #[error("No statements to consolidate")]
    NoStatements,

    #[error("Statement #{statement}: unsupported currency '{code}' in operation on {date}")]
    UnsupportedCurrency {
        statement: usize,
        code: String,
        date: String,
    },

    #[error("Statement #{statement}: period start {start} is after period end {end}")]
    InvalidPeriod {
        statement: usize,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Statement #{statement}: negative reference rate {rate}")]
    NegativeRate { statement: usize, rate: Decimal },
}
