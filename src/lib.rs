//! # Cashflow Insights
//!
//! A library for turning a flat, unordered collection of personal-finance
//! records into calendar-bucketed series, dashboard metrics and debt payoff
//! statistics.
//!
//! ## Core Concepts
//!
//! - **Period**: a day, week, month or year containing a reference date, split into buckets
//! - **Series**: per-bucket income and expense with a running balance seeded by the baseline
//! - **Baseline**: the net of everything dated strictly before the period starts
//! - **Dashboard**: month-to-date figures, month-over-month comparisons, a spend-pace
//!   forecast and upcoming recurring obligations
//! - **Debt statistics**: per-debt progress, lifetime totals and a non-compounding
//!   payoff projection
//!
//! Every computation is a pure function of its inputs. "Now" is always passed
//! in by the caller, and nothing is cached unless the caller holds a
//! [`SeriesCache`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use cashflow_insights::*;
//! use chrono::NaiveDate;
//!
//! let transactions = vec![
//!     Transaction::income("t1", 100.0, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
//!     Transaction::expense("t2", 40.0, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()),
//! ];
//!
//! let series = compute_series(
//!     &transactions,
//!     Granularity::Month,
//!     NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
//! );
//! assert_eq!(series.closing_balance(), 60.0);
//! ```

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod debt;
pub mod error;
pub mod ingestion;
pub mod period;
pub mod recurring;
pub mod schema;
pub mod series;
pub mod utils;

pub use cache::{series_fingerprint, SeriesCache};
pub use config::EngineConfig;
pub use dashboard::{
    compare, compute_dashboard_metrics, compute_dashboard_metrics_with, forecast_spend,
    main_balance, month_totals, Comparison, DashboardComparison, DashboardMetrics, Forecast,
    MonthTotals, Trend,
};
pub use debt::{
    compute_debt_stats, get_progress, simulate_payoff, simulate_totals, DebtStats,
    PayoffHorizon, PayoffProjection,
};
pub use error::{FinanceError, Result};
pub use ingestion::*;
pub use period::{
    bucket_period, period_bounds, previous_reference, BucketKey, BucketSlot, PeriodBucketer,
    PeriodWindow,
};
pub use recurring::{
    due_occurrences, materialize_due, next_due_date, upcoming_obligations, UpcomingObligation,
};
pub use schema::*;
pub use series::{
    category_breakdown, compute_series, compute_series_with_previous, Bucket, CategoryTotal,
    Series, SeriesAggregator, SeriesComparison,
};
pub use utils::normalize_calendar_date;

use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::Serialize;

/// A series computed from raw records, with the records that had to be left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesReport {
    pub series: Series,
    pub issues: Vec<DataQualityIssue>,
}

/// Entry point holding a validated [`EngineConfig`].
///
/// The engine keeps no state between calls; two engines with the same
/// configuration always produce identical results for identical inputs.
#[derive(Debug, Clone)]
pub struct InsightsEngine {
    config: EngineConfig,
    aggregator: SeriesAggregator,
}

impl Default for InsightsEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            aggregator: SeriesAggregator::new(PeriodBucketer::new(config.day_bucket_hour)),
            config,
        }
    }
}

impl InsightsEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        info!(
            "Insights engine ready (lookahead {} days, day bucket hour {})",
            config.lookahead_days, config.day_bucket_hour
        );

        Ok(Self {
            aggregator: SeriesAggregator::new(PeriodBucketer::new(config.day_bucket_hour)),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bucketer(&self) -> PeriodBucketer {
        PeriodBucketer::new(self.config.day_bucket_hour)
    }

    pub fn compute_series(
        &self,
        transactions: &[Transaction],
        granularity: Granularity,
        reference: NaiveDate,
    ) -> Series {
        self.aggregator.aggregate(transactions, granularity, reference)
    }

    pub fn compute_series_with_previous(
        &self,
        transactions: &[Transaction],
        granularity: Granularity,
        reference: NaiveDate,
    ) -> SeriesComparison {
        self.aggregator
            .aggregate_with_previous(transactions, granularity, reference)
    }

    /// Normalizes raw records first; unparseable ones are reported, not fatal.
    pub fn compute_series_from_raw(
        &self,
        raw: &[RawTransaction],
        granularity: Granularity,
        reference: NaiveDate,
    ) -> SeriesReport {
        let ingested = ingest_transactions(raw);
        SeriesReport {
            series: self.compute_series(&ingested.records, granularity, reference),
            issues: ingested.issues,
        }
    }

    pub fn compute_dashboard_metrics(
        &self,
        transactions: &[Transaction],
        obligations: &[RecurringObligation],
        now: NaiveDateTime,
    ) -> DashboardMetrics {
        compute_dashboard_metrics_with(transactions, obligations, now, self.config.lookahead_days)
    }

    pub fn compute_debt_stats(&self, debts: &[Debt]) -> DebtStats {
        compute_debt_stats(debts)
    }

    pub fn simulate_payoff(&self, active_debts: &[Debt], extra_payment: f64) -> PayoffProjection {
        simulate_payoff(active_debts, extra_payment)
    }

    pub fn new_cache(&self, capacity: usize) -> SeriesCache {
        SeriesCache::new(self.bucketer(), capacity)
    }
}

pub fn compute_series_from_raw(
    raw: &[RawTransaction],
    granularity: Granularity,
    reference: NaiveDate,
) -> SeriesReport {
    InsightsEngine::default().compute_series_from_raw(raw, granularity, reference)
}
