use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    round_for_display, to_primary, Currency, Ledger, Operation, OperationType, OperationTypes,
};

use super::ConsolidatedReport;

/// Per-currency sums of a set of operations. Sums are exact; rounding only
/// happens when the combined figure is asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowTotals {
    pub rur: Decimal,
    pub usd: Decimal,
}

impl CashFlowTotals {
    pub fn from_operations<'a>(operations: impl IntoIterator<Item = &'a Operation>) -> Self {
        operations
            .into_iter()
            .fold(Self::default(), |mut totals, op| {
                match op.currency {
                    Currency::Rur => totals.rur += op.value,
                    Currency::Usd => totals.usd += op.value,
                }
                totals
            })
    }

    /// RUR total with USD converted at `usd_price`, unrounded
    pub fn combined_exact(&self, usd_price: Decimal) -> Decimal {
        to_primary(self.rur, self.usd, usd_price)
    }

    /// RUR total with USD converted at `usd_price`, rounded for display
    pub fn combined(&self, usd_price: Decimal) -> Decimal {
        round_for_display(self.combined_exact(usd_price))
    }
}

/// Sum a ledger, optionally restricted to some categories.
/// `None` means every operation counts.
pub fn cash_flow_totals(ledger: &Ledger, operation_types: Option<OperationTypes>) -> CashFlowTotals {
    match operation_types {
        Some(operation_types) => {
            CashFlowTotals::from_operations(ledger.filter_by_type(operation_types))
        }
        None => CashFlowTotals::from_operations(ledger),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionGroup {
    /// One line per category
    CashFlow,
    /// Lines spanning several categories
    Summary,
}

impl SectionGroup {
    pub fn title(&self) -> &'static str {
        match self {
            SectionGroup::CashFlow => "Cash Flow",
            SectionGroup::Summary => "Summary",
        }
    }
}

/// A named line of the cash-flow report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashFlowSection {
    pub name: &'static str,
    pub group: SectionGroup,
    /// `None` sums the whole ledger
    pub operation_types: Option<Vec<OperationType>>,
}

impl CashFlowSection {
    fn category(name: &'static str, operation_type: OperationType) -> Self {
        Self {
            name,
            group: SectionGroup::CashFlow,
            operation_types: Some(vec![operation_type]),
        }
    }

    fn summary(name: &'static str, operation_types: Option<Vec<OperationType>>) -> Self {
        Self {
            name,
            group: SectionGroup::Summary,
            operation_types,
        }
    }

    pub fn totals(&self, ledger: &Ledger) -> CashFlowTotals {
        cash_flow_totals(ledger, self.operation_types.clone().map(OperationTypes::from))
    }
}

/// The lines printed for every consolidated report, in display order.
pub fn standard_sections() -> Vec<CashFlowSection> {
    vec![
        CashFlowSection::category("Fees", OperationType::Fees),
        CashFlowSection::category("Taxes", OperationType::Tax),
        CashFlowSection::category("Dividends", OperationType::Dividend),
        CashFlowSection::category("Coupons", OperationType::Coupon),
        CashFlowSection::category("Credit payments", OperationType::CreditPayment),
        CashFlowSection::category("Write offs", OperationType::WriteOff),
        CashFlowSection::category("Exchange saldo", OperationType::ExchangeSaldo),
        CashFlowSection::category("Securities saldo", OperationType::SecuritiesSaldo),
        CashFlowSection::summary(
            "Credit payments with write offs",
            Some(vec![OperationType::CreditPayment, OperationType::WriteOff]),
        ),
        CashFlowSection::summary("Total", None),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowLine {
    pub name: String,
    pub group: SectionGroup,
    pub rur: Decimal,
    pub usd: Decimal,
    /// RUR equivalent of both currencies, rounded to two digits
    pub combined: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub days: i64,
    pub usd_price: Decimal,
    pub statements: usize,
    pub operations: usize,
    pub lines: Vec<CashFlowLine>,
}

impl CashFlowSummary {
    /// Evaluate `sections` against a consolidated report, converting USD at `usd_price`.
    pub fn build(
        report: &ConsolidatedReport,
        usd_price: Decimal,
        sections: &[CashFlowSection],
    ) -> Self {
        let (from_date, to_date) = report.report_date();
        let lines = sections
            .iter()
            .map(|section| {
                let totals = section.totals(report.cash_flow());
                CashFlowLine {
                    name: section.name.to_string(),
                    group: section.group,
                    rur: totals.rur,
                    usd: totals.usd,
                    combined: totals.combined(usd_price),
                }
            })
            .collect();

        Self {
            from_date,
            to_date,
            days: report.period_days(),
            usd_price,
            statements: report.statement_count(),
            operations: report.cash_flow().len(),
            lines,
        }
    }

    pub fn line(&self, name: &str) -> Option<&CashFlowLine> {
        self.lines.iter().find(|line| line.name == name)
    }
}
