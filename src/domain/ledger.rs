use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use super::{Operation, OperationType};

/// How an incoming ledger is folded into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Keep every incoming operation. Used for statements of different accounts.
    Union,
    /// Drop every incoming operation whose date already appears in the
    /// existing ledger. Used for overlapping statements of the same account.
    Reconcile,
}

impl MergeMode {
    /// Pick the mode for a statement given the client id of the first statement.
    pub fn for_client(baseline_client_id: &str, client_id: &str) -> Self {
        if client_id == baseline_client_id {
            MergeMode::Reconcile
        } else {
            MergeMode::Union
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, MergeMode::Union)
    }
}

/// A set of categories to filter on. Built from a single category or from a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationTypes(Vec<OperationType>);

impl OperationTypes {
    pub fn contains(&self, operation_type: OperationType) -> bool {
        self.0.contains(&operation_type)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[OperationType] {
        &self.0
    }
}

impl From<OperationType> for OperationTypes {
    fn from(operation_type: OperationType) -> Self {
        Self(vec![operation_type])
    }
}

impl From<Vec<OperationType>> for OperationTypes {
    fn from(operation_types: Vec<OperationType>) -> Self {
        Self(operation_types)
    }
}

impl From<&[OperationType]> for OperationTypes {
    fn from(operation_types: &[OperationType]) -> Self {
        Self(operation_types.to_vec())
    }
}

impl<const N: usize> From<[OperationType; N]> for OperationTypes {
    fn from(operation_types: [OperationType; N]) -> Self {
        Self(operation_types.to_vec())
    }
}

impl FromIterator<OperationType> for OperationTypes {
    fn from_iter<I: IntoIterator<Item = OperationType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Cash-flow operations of one or more statements.
///
/// Operations are kept ordered by date; operations sharing a date stay in
/// the order they were added. Nothing is ever de-duplicated here, that is
/// decided by [`Ledger::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    operations: Vec<Operation>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Add one operation after every operation with the same or an earlier date.
    pub fn add(&mut self, operation: Operation) {
        let position = self
            .operations
            .partition_point(|existing| existing.date <= operation.date);
        self.operations.insert(position, operation);
    }

    /// All operations in ascending date order.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Operations whose category is one of `operation_types`, in ascending date order.
    pub fn filter_by_type(&self, operation_types: impl Into<OperationTypes>) -> Vec<&Operation> {
        let operation_types = operation_types.into();
        self.iter()
            .filter(|op| operation_types.contains(op.operation_type))
            .collect()
    }

    /// Distinct operation dates present in the ledger.
    pub fn dates(&self) -> BTreeSet<NaiveDateTime> {
        self.iter().map(|op| op.date).collect()
    }

    /// Fold `incoming` into this ledger and return how many operations were added.
    ///
    /// In [`MergeMode::Reconcile`] the incoming operations are bucketed by
    /// date and a bucket is taken or dropped as a whole: if the existing
    /// ledger has any operation on that date, none of the bucket survives,
    /// even operations the existing ledger does not have.
    pub fn merge(&mut self, incoming: Ledger, mode: MergeMode) -> usize {
        match mode {
            MergeMode::Union => {
                let added = incoming.len();
                for operation in incoming.operations {
                    self.add(operation);
                }
                added
            }
            MergeMode::Reconcile => {
                let covered = self.dates();
                let mut added = 0;

                for (date, bucket) in group_by_date(incoming.operations) {
                    if covered.contains(&date) {
                        tracing::debug!(
                            "Skipping {} operation(s) on {}: date already covered",
                            bucket.len(),
                            date
                        );
                        continue;
                    }
                    added += bucket.len();
                    for operation in bucket {
                        self.add(operation);
                    }
                }
                added
            }
        }
    }
}

/// Bucket operations by their exact date, keeping their relative order inside a bucket.
fn group_by_date(operations: Vec<Operation>) -> BTreeMap<NaiveDateTime, Vec<Operation>> {
    let mut buckets: BTreeMap<NaiveDateTime, Vec<Operation>> = BTreeMap::new();
    for operation in operations {
        buckets.entry(operation.date).or_default().push(operation);
    }
    buckets
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Operation> for Ledger {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let mut ledger = Ledger::new();
        for operation in iter {
            ledger.add(operation);
        }
        ledger
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::Currency;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn make_op(date: NaiveDateTime, value: i64, operation_type: OperationType) -> Operation {
        Operation::new(Decimal::from(value), Currency::Rur, date, operation_type)
    }

    fn dates_of(ops: &[&Operation]) -> Vec<NaiveDateTime> {
        ops.iter().map(|op| op.date).collect()
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.iter().count(), 0);
        assert!(ledger.filter_by_type(OperationType::Fees).is_empty());
    }

    #[test]
    fn test_iteration_is_date_ordered() {
        let mut ledger = Ledger::new();
        ledger.add(make_op(at(2023, 3, 1), 1, OperationType::Fees));
        ledger.add(make_op(at(2023, 1, 1), 2, OperationType::Tax));
        ledger.add(make_op(at(2023, 2, 1), 3, OperationType::Fees));

        let dates: Vec<_> = ledger.iter().map(|op| op.date).collect();
        assert_eq!(dates, vec![at(2023, 1, 1), at(2023, 2, 1), at(2023, 3, 1)]);

        // Restartable
        assert_eq!(ledger.iter().count(), 3);
        assert_eq!((&ledger).into_iter().count(), 3);
    }

    #[test]
    fn test_equal_dates_keep_insertion_order() {
        let mut ledger = Ledger::new();
        ledger.add(make_op(at(2023, 1, 2), 1, OperationType::Fees));
        ledger.add(make_op(at(2023, 1, 1), 2, OperationType::Fees));
        ledger.add(make_op(at(2023, 1, 2), 3, OperationType::Fees));
        ledger.add(make_op(at(2023, 1, 2), 4, OperationType::Fees));

        let values: Vec<_> = ledger.iter().map(|op| op.value).collect();
        assert_eq!(
            values,
            vec![
                Decimal::from(2),
                Decimal::from(1),
                Decimal::from(3),
                Decimal::from(4)
            ]
        );
    }

    #[test]
    fn test_add_does_not_deduplicate() {
        let mut ledger = Ledger::new();
        let op = make_op(at(2023, 1, 15), -100, OperationType::Fees);
        ledger.add(op.clone());
        ledger.add(op);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_filter_single_type() {
        let mut ledger = Ledger::new();
        ledger.add(make_op(at(2023, 2, 1), -10, OperationType::Fees));
        ledger.add(make_op(at(2023, 1, 5), 50, OperationType::Dividend));
        ledger.add(make_op(at(2023, 1, 1), -20, OperationType::Fees));

        let fees = ledger.filter_by_type(OperationType::Fees);
        assert_eq!(dates_of(&fees), vec![at(2023, 1, 1), at(2023, 2, 1)]);
        assert!(fees.iter().all(|op| op.operation_type == OperationType::Fees));
    }

    #[test]
    fn test_filter_many_types() {
        let mut ledger = Ledger::new();
        ledger.add(make_op(at(2023, 3, 1), 100, OperationType::CreditPayment));
        ledger.add(make_op(at(2023, 1, 1), -40, OperationType::WriteOff));
        ledger.add(make_op(at(2023, 2, 1), 5, OperationType::Coupon));

        let result =
            ledger.filter_by_type([OperationType::CreditPayment, OperationType::WriteOff]);
        assert_eq!(dates_of(&result), vec![at(2023, 1, 1), at(2023, 3, 1)]);

        let from_vec = ledger.filter_by_type(vec![OperationType::Coupon]);
        assert_eq!(from_vec.len(), 1);
    }

    #[test]
    fn test_filter_empty_set() {
        let mut ledger = Ledger::new();
        ledger.add(make_op(at(2023, 1, 1), 1, OperationType::Fees));

        let none: Vec<OperationType> = Vec::new();
        assert!(ledger.filter_by_type(none).is_empty());
        assert!(ledger.filter_by_type(OperationTypes::default()).is_empty());
    }

    #[test]
    fn test_merge_union_keeps_everything() {
        let mut left: Ledger = vec![
            make_op(at(2023, 1, 15), -100, OperationType::Fees),
            make_op(at(2023, 1, 20), -5, OperationType::Tax),
        ]
        .into_iter()
        .collect();
        let right: Ledger = vec![
            make_op(at(2023, 1, 15), -100, OperationType::Fees),
            make_op(at(2023, 1, 16), 7, OperationType::Coupon),
        ]
        .into_iter()
        .collect();

        let added = left.merge(right, MergeMode::Union);

        assert_eq!(added, 2);
        assert_eq!(left.len(), 4);
        assert!(left.iter().zip(left.iter().skip(1)).all(|(a, b)| a.date <= b.date));
    }

    #[test]
    fn test_merge_reconcile_drops_covered_dates() {
        let mut left: Ledger = vec![make_op(at(2023, 1, 15), -100, OperationType::Fees)]
            .into_iter()
            .collect();
        let right: Ledger = vec![
            make_op(at(2023, 1, 15), -100, OperationType::Fees),
            make_op(at(2023, 2, 10), 50, OperationType::Dividend),
        ]
        .into_iter()
        .collect();

        let added = left.merge(right, MergeMode::Reconcile);

        assert_eq!(added, 1);
        let dates: Vec<_> = left.iter().map(|op| op.date).collect();
        assert_eq!(dates, vec![at(2023, 1, 15), at(2023, 2, 10)]);
    }

    #[test]
    fn test_merge_reconcile_is_idempotent() {
        let ledger: Ledger = vec![
            make_op(at(2023, 1, 1), 1, OperationType::Fees),
            make_op(at(2023, 1, 1), 2, OperationType::Tax),
            make_op(at(2023, 1, 3), 3, OperationType::Coupon),
        ]
        .into_iter()
        .collect();

        let mut merged = ledger.clone();
        let added = merged.merge(ledger.clone(), MergeMode::Reconcile);

        assert_eq!(added, 0);
        assert_eq!(merged, ledger);
    }

    #[test]
    fn test_merge_reconcile_drops_whole_bucket() {
        // The incoming bucket for Jan 15 has a tax record the existing
        // ledger lacks. The bucket is still dropped in full.
        let mut left: Ledger = vec![make_op(at(2023, 1, 15), -100, OperationType::Fees)]
            .into_iter()
            .collect();
        let right: Ledger = vec![
            make_op(at(2023, 1, 15), -100, OperationType::Fees),
            make_op(at(2023, 1, 15), -13, OperationType::Tax),
        ]
        .into_iter()
        .collect();

        let added = left.merge(right, MergeMode::Reconcile);

        assert_eq!(added, 0);
        assert_eq!(left.len(), 1);
        assert!(left.filter_by_type(OperationType::Tax).is_empty());
    }

    #[test]
    fn test_merge_reconcile_into_empty_keeps_duplicates_within_bucket() {
        let mut left = Ledger::new();
        let op = make_op(at(2023, 1, 15), -100, OperationType::Fees);
        let right: Ledger = vec![op.clone(), op].into_iter().collect();

        assert_eq!(left.merge(right, MergeMode::Reconcile), 2);
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn test_merge_mode_for_client() {
        assert_eq!(MergeMode::for_client("A1", "A1"), MergeMode::Reconcile);
        assert_eq!(MergeMode::for_client("A1", "A2"), MergeMode::Union);
        assert!(MergeMode::Union.is_union());
        assert!(!MergeMode::Reconcile.is_union());
    }
}
