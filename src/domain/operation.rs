use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Currency, ParseCurrencyError};

/// Cash-flow category of an operation, as classified by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationType {
    /// Broker commission
    Fees,
    /// Settlement of foreign currency trades
    ExchangeSaldo,
    /// Settlement of securities trades
    SecuritiesSaldo,
    /// Money credited to the account
    CreditPayment,
    /// Redemption of securities
    CloseOut,
    Dividend,
    Coupon,
    /// Personal income tax withheld
    Tax,
    /// Money withdrawn from the account
    WriteOff,
    /// Label the broker used that is not in the known mapping
    Unknown,
}

impl OperationType {
    pub const ALL: [OperationType; 10] = [
        OperationType::Fees,
        OperationType::ExchangeSaldo,
        OperationType::SecuritiesSaldo,
        OperationType::CreditPayment,
        OperationType::CloseOut,
        OperationType::Dividend,
        OperationType::Coupon,
        OperationType::Tax,
        OperationType::WriteOff,
        OperationType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Fees => "fees",
            OperationType::ExchangeSaldo => "exchange-saldo",
            OperationType::SecuritiesSaldo => "securities-saldo",
            OperationType::CreditPayment => "credit-payment",
            OperationType::CloseOut => "close-out",
            OperationType::Dividend => "dividend",
            OperationType::Coupon => "coupon",
            OperationType::Tax => "tax",
            OperationType::WriteOff => "write-off",
            OperationType::Unknown => "unknown",
        }
    }

    /// The label the broker writes into the statement for this category.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            OperationType::Fees => Some("Вознаграждение Брокера"),
            OperationType::ExchangeSaldo => {
                Some("Сальдо расчётов по сделкам с иностранной валютой")
            }
            OperationType::SecuritiesSaldo => Some("Сальдо расчётов по сделкам с ценными бумагами"),
            OperationType::CreditPayment => Some("Зачисление денежных средств"),
            OperationType::CloseOut => Some("Погашение ценных бумаг"),
            OperationType::Dividend => Some("Дивиденды"),
            OperationType::Coupon => Some("Купонный доход"),
            OperationType::Tax => Some("НДФЛ"),
            OperationType::WriteOff => Some("Списание денежных средств"),
            OperationType::Unknown => None,
        }
    }

    /// Map a statement label to its category.
    /// Labels outside the known mapping become `Unknown` and are logged, never rejected.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match Self::ALL.iter().find(|t| t.label() == Some(label)) {
            Some(operation_type) => *operation_type,
            None => {
                tracing::warn!("Unknown operation type: {}", label);
                OperationType::Unknown
            }
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One cash-flow event taken from a statement.
/// Operations are immutable once built; the currency is always a supported one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub value: Decimal,
    pub currency: Currency,
    pub date: NaiveDateTime,
    pub operation_type: OperationType,
    pub comment: Option<String>,
}

impl Operation {
    pub fn new(
        value: Decimal,
        currency: Currency,
        date: NaiveDateTime,
        operation_type: OperationType,
    ) -> Self {
        Self {
            value,
            currency,
            date,
            operation_type,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// An operation as the statement extractor hands it over: the currency code
/// and category label are still the raw strings from the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOperation {
    pub value: Decimal,
    pub currency: String,
    pub date: NaiveDateTime,
    pub operation_type: String,
    pub comment: Option<String>,
}

impl TryFrom<RawOperation> for Operation {
    type Error = ParseCurrencyError;

    fn try_from(raw: RawOperation) -> Result<Self, Self::Error> {
        let currency: Currency = raw.currency.parse()?;
        Ok(Operation {
            value: raw.value,
            currency,
            date: raw.date,
            operation_type: OperationType::from_label(&raw.operation_type),
            comment: raw.comment,
        })
    }
}
