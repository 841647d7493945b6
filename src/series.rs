//! Income/expense accumulation over a [`PeriodWindow`] with a running balance.

use crate::period::{previous_reference, BucketKey, PeriodBucketer, PeriodWindow};
use crate::schema::{Granularity, Transaction, TransactionKind};
use crate::utils::finite_or_zero;
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub key: BucketKey,
    pub income: f64,
    pub expense: f64,
    /// Balance after this bucket's activity, seeded by the series baseline.
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub granularity: Granularity,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Net of everything dated strictly before `start`.
    pub baseline: f64,
    pub buckets: Vec<Bucket>,
}

impl Series {
    pub fn total_income(&self) -> f64 {
        self.buckets.iter().map(|b| b.income).sum()
    }

    pub fn total_expense(&self) -> f64 {
        self.buckets.iter().map(|b| b.expense).sum()
    }

    pub fn closing_balance(&self) -> f64 {
        self.buckets
            .last()
            .map(|b| b.balance)
            .unwrap_or(self.baseline)
    }

    pub fn bucket(&self, key: &BucketKey) -> Option<&Bucket> {
        self.buckets.iter().find(|b| &b.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesComparison {
    pub current: Series,
    pub previous: Series,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    /// Percent of the range total for this kind.
    pub share: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesAggregator {
    bucketer: PeriodBucketer,
}

impl SeriesAggregator {
    pub fn new(bucketer: PeriodBucketer) -> Self {
        Self { bucketer }
    }

    pub fn aggregate(
        &self,
        transactions: &[Transaction],
        granularity: Granularity,
        reference: NaiveDate,
    ) -> Series {
        let window = self.bucketer.bucket(granularity, reference);
        aggregate_window(transactions, &window)
    }

    pub fn aggregate_with_previous(
        &self,
        transactions: &[Transaction],
        granularity: Granularity,
        reference: NaiveDate,
    ) -> SeriesComparison {
        SeriesComparison {
            current: self.aggregate(transactions, granularity, reference),
            previous: self.aggregate(
                transactions,
                granularity,
                previous_reference(granularity, reference),
            ),
        }
    }
}

/// Net of all transactions dated strictly before `first_day`.
pub fn baseline_balance(transactions: &[Transaction], first_day: NaiveDate) -> f64 {
    transactions
        .iter()
        .filter(|t| t.date < first_day && t.amount.is_finite())
        .map(Transaction::signed_amount)
        .sum()
}

pub fn aggregate_window(transactions: &[Transaction], window: &PeriodWindow) -> Series {
    let baseline = baseline_balance(transactions, window.first_day());

    let mut income = vec![0.0; window.len()];
    let mut expense = vec![0.0; window.len()];
    let mut bucketed = 0usize;
    let mut skipped = 0usize;

    for transaction in transactions {
        if !transaction.amount.is_finite() {
            skipped += 1;
            continue;
        }
        let Some(idx) = window.slot_index(transaction.date) else {
            continue;
        };
        match transaction.kind {
            TransactionKind::Income => income[idx] += transaction.amount,
            TransactionKind::Expense => expense[idx] += transaction.amount,
        }
        bucketed += 1;
    }

    let mut running = baseline;
    let buckets = window
        .slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            running += income[i] - expense[i];
            Bucket {
                label: slot.label.clone(),
                key: slot.key,
                income: income[i],
                expense: expense[i],
                balance: running,
            }
        })
        .collect();

    debug!(
        "Aggregated {:?} series from {} to {}: {} bucketed, {} skipped, baseline {:.2}",
        window.granularity,
        window.first_day(),
        window.last_day(),
        bucketed,
        skipped,
        baseline
    );

    Series {
        granularity: window.granularity,
        start: window.start,
        end: window.end,
        baseline: finite_or_zero(baseline),
        buckets,
    }
}

pub fn compute_series(
    transactions: &[Transaction],
    granularity: Granularity,
    reference: NaiveDate,
) -> Series {
    SeriesAggregator::default().aggregate(transactions, granularity, reference)
}

pub fn compute_series_with_previous(
    transactions: &[Transaction],
    granularity: Granularity,
    reference: NaiveDate,
) -> SeriesComparison {
    SeriesAggregator::default().aggregate_with_previous(transactions, granularity, reference)
}

/// Per-category totals of one kind over an inclusive date range, largest first.
pub fn category_breakdown(
    transactions: &[Transaction],
    kind: TransactionKind,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();

    for transaction in transactions {
        if transaction.kind != kind
            || transaction.date < start
            || transaction.date > end
            || !transaction.amount.is_finite()
        {
            continue;
        }
        let category = transaction
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED_LABEL);
        *totals.entry(category.to_string()).or_default() += transaction.amount;
    }

    let grand_total: f64 = totals.values().sum();

    let mut rows: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category,
            total,
            share: if grand_total != 0.0 {
                finite_or_zero(total / grand_total * 100.0)
            } else {
                0.0
            },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scenario_transactions() -> Vec<Transaction> {
        vec![
            Transaction::income("t1", 100.0, ymd(2024, 3, 1)),
            Transaction::expense("t2", 40.0, ymd(2024, 3, 10)),
            Transaction::expense("t3", 10.0, ymd(2024, 2, 20)),
        ]
    }

    #[test]
    fn test_month_bucketing_with_baseline() {
        let series = compute_series(&scenario_transactions(), Granularity::Month, ymd(2024, 3, 15));

        assert_eq!(series.baseline, -10.0);
        assert_eq!(series.buckets.len(), 31);
        assert_eq!(series.buckets[0].balance, 90.0);
        assert_eq!(series.buckets[8].balance, 90.0);
        assert_eq!(series.buckets[9].balance, 50.0);
        for bucket in &series.buckets[9..] {
            assert_eq!(bucket.balance, 50.0);
        }
        assert_eq!(series.total_income(), 100.0);
        assert_eq!(series.total_expense(), 40.0);
        assert_eq!(series.closing_balance(), 50.0);
    }

    #[test]
    fn test_running_balance_matches_prefix_sums() {
        let transactions = vec![
            Transaction::income("a", 500.0, ymd(2023, 12, 31)),
            Transaction::income("b", 1200.0, ymd(2024, 1, 5)),
            Transaction::expense("c", 300.0, ymd(2024, 1, 20)),
            Transaction::expense("d", 75.5, ymd(2024, 4, 2)),
            Transaction::income("e", 20.0, ymd(2024, 4, 30)),
            Transaction::expense("f", 999.0, ymd(2025, 1, 1)),
        ];
        let series = compute_series(&transactions, Granularity::Year, ymd(2024, 6, 1));

        assert_eq!(series.baseline, 500.0);
        let mut expected = series.baseline;
        for bucket in &series.buckets {
            expected += bucket.income - bucket.expense;
            assert!((bucket.balance - expected).abs() < 1e-9);
        }
        assert_eq!(series.total_income(), 1220.0);
        assert_eq!(series.total_expense(), 375.5);
        assert_eq!(series.buckets[0].income, 1200.0);
        assert_eq!(series.buckets[3].expense, 75.5);
    }

    #[test]
    fn test_empty_input_yields_zero_buckets() {
        for granularity in [
            Granularity::Day,
            Granularity::Week,
            Granularity::Month,
            Granularity::Year,
        ] {
            let series = compute_series(&[], granularity, ymd(2024, 3, 15));
            assert_eq!(series.baseline, 0.0);
            assert!(!series.buckets.is_empty());
            assert!(series
                .buckets
                .iter()
                .all(|b| b.income == 0.0 && b.expense == 0.0 && b.balance == 0.0));
        }
    }

    #[test]
    fn test_day_granularity_uses_fixed_slot() {
        let transactions = vec![
            Transaction::income("a", 10.0, ymd(2024, 3, 15)),
            Transaction::expense("b", 4.0, ymd(2024, 3, 15)),
            Transaction::income("c", 7.0, ymd(2024, 3, 14)),
        ];
        let series = compute_series(&transactions, Granularity::Day, ymd(2024, 3, 15));

        assert_eq!(series.baseline, 7.0);
        assert_eq!(series.buckets[12].income, 10.0);
        assert_eq!(series.buckets[12].expense, 4.0);
        assert_eq!(series.buckets[11].balance, 7.0);
        assert_eq!(series.buckets[12].balance, 13.0);
        assert_eq!(series.buckets[23].balance, 13.0);
    }

    #[test]
    fn test_non_finite_amounts_are_skipped() {
        let transactions = vec![
            Transaction::income("a", f64::NAN, ymd(2024, 3, 2)),
            Transaction::expense("b", f64::INFINITY, ymd(2024, 2, 2)),
            Transaction::income("c", 5.0, ymd(2024, 3, 3)),
        ];
        let series = compute_series(&transactions, Granularity::Month, ymd(2024, 3, 1));
        assert_eq!(series.baseline, 0.0);
        assert_eq!(series.total_income(), 5.0);
        assert!(series.buckets.iter().all(|b| b.balance.is_finite()));
    }

    #[test]
    fn test_previous_period_is_independent() {
        let comparison = compute_series_with_previous(
            &scenario_transactions(),
            Granularity::Month,
            ymd(2024, 3, 15),
        );
        assert_eq!(comparison.previous.buckets.len(), 29);
        assert_eq!(comparison.previous.baseline, 0.0);
        assert_eq!(comparison.previous.total_expense(), 10.0);
        assert_eq!(comparison.previous.closing_balance(), -10.0);
        assert_eq!(comparison.current.baseline, -10.0);
    }

    #[test]
    fn test_category_breakdown() {
        let transactions = vec![
            Transaction::expense("a", 60.0, ymd(2024, 3, 1)).with_category("Food"),
            Transaction::expense("b", 20.0, ymd(2024, 3, 2)).with_category("Transport"),
            Transaction::expense("c", 20.0, ymd(2024, 3, 3)),
            Transaction::expense("d", 5.0, ymd(2024, 4, 1)).with_category("Food"),
            Transaction::income("e", 1000.0, ymd(2024, 3, 1)).with_category("Salary"),
        ];
        let rows = category_breakdown(
            &transactions,
            TransactionKind::Expense,
            ymd(2024, 3, 1),
            ymd(2024, 3, 31),
        );

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].category, "Food");
        assert_eq!(rows[0].total, 60.0);
        assert_eq!(rows[0].share, 60.0);
        assert_eq!(rows[1].category, "Transport");
        assert_eq!(rows[2].category, UNCATEGORIZED_LABEL);
    }

    #[test]
    fn test_category_breakdown_empty_range() {
        let rows = category_breakdown(
            &[],
            TransactionKind::Income,
            ymd(2024, 3, 1),
            ymd(2024, 3, 31),
        );
        assert!(rows.is_empty());
    }
}
