//! Caller-owned memoization for series computations.
//!
//! Nothing in the crate consults this cache implicitly. Callers that
//! recompute the same series repeatedly (for example on every render) can
//! hold a [`SeriesCache`] and ask it instead of calling the aggregator.

use crate::period::PeriodBucketer;
use crate::schema::{Granularity, Transaction};
use crate::series::{Series, SeriesAggregator};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Fingerprint of everything a series depends on.
///
/// Distinct inputs can share a fingerprint. [`SeriesCache`] also compares
/// the granularity, reference date and transaction count before trusting a hit.
pub fn series_fingerprint(
    transactions: &[Transaction],
    granularity: Granularity,
    reference: NaiveDate,
    day_slot: u32,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    granularity.hash(&mut hasher);
    reference.hash(&mut hasher);
    day_slot.hash(&mut hasher);
    transactions.len().hash(&mut hasher);
    for t in transactions {
        t.id.hash(&mut hasher);
        t.kind.hash(&mut hasher);
        t.amount.to_bits().hash(&mut hasher);
        t.category.hash(&mut hasher);
        t.date.hash(&mut hasher);
        t.recurring.hash(&mut hasher);
    }
    hasher.finish()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    granularity: Granularity,
    reference: NaiveDate,
    transaction_count: usize,
    series: Series,
}

impl CacheEntry {
    fn matches(&self, granularity: Granularity, reference: NaiveDate, count: usize) -> bool {
        self.granularity == granularity
            && self.reference == reference
            && self.transaction_count == count
    }
}

#[derive(Debug, Clone)]
pub struct SeriesCache {
    aggregator: SeriesAggregator,
    day_slot: u32,
    capacity: usize,
    entries: HashMap<u64, CacheEntry>,
    order: VecDeque<u64>,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(PeriodBucketer::default(), DEFAULT_CACHE_CAPACITY)
    }
}

impl SeriesCache {
    /// A capacity of zero is treated as one.
    pub fn new(bucketer: PeriodBucketer, capacity: usize) -> Self {
        Self {
            aggregator: SeriesAggregator::new(bucketer),
            day_slot: bucketer.day_slot(),
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get_or_compute(
        &mut self,
        transactions: &[Transaction],
        granularity: Granularity,
        reference: NaiveDate,
    ) -> &Series {
        let key = series_fingerprint(transactions, granularity, reference, self.day_slot);

        let count = transactions.len();
        let hit = self
            .entries
            .get(&key)
            .is_some_and(|entry| entry.matches(granularity, reference, count));

        if !hit {
            debug!("Series cache miss for {:?} at {}", granularity, reference);
            if self.entries.contains_key(&key) {
                warn!("Series fingerprint {:x} collided; replacing cached entry", key);
                self.order.retain(|k| *k != key);
            } else if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
            let series = self.aggregator.aggregate(transactions, granularity, reference);
            self.entries.insert(
                key,
                CacheEntry {
                    granularity,
                    reference,
                    transaction_count: count,
                    series,
                },
            );
            self.order.push_back(key);
        }

        &self.entries[&key].series
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::compute_series;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cache_hit_returns_same_result() {
        let transactions = vec![Transaction::income("a", 10.0, ymd(2024, 3, 1))];
        let mut cache = SeriesCache::default();

        let first = cache
            .get_or_compute(&transactions, Granularity::Month, ymd(2024, 3, 5))
            .clone();
        let second = cache
            .get_or_compute(&transactions, Granularity::Month, ymd(2024, 3, 5))
            .clone();

        assert_eq!(first, second);
        assert_eq!(first, compute_series(&transactions, Granularity::Month, ymd(2024, 3, 5)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_input_misses() {
        let mut transactions = vec![Transaction::income("a", 10.0, ymd(2024, 3, 1))];
        let mut cache = SeriesCache::default();

        cache.get_or_compute(&transactions, Granularity::Month, ymd(2024, 3, 5));
        transactions[0].amount = 12.0;
        let series = cache.get_or_compute(&transactions, Granularity::Month, ymd(2024, 3, 5));

        assert_eq!(series.total_income(), 12.0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = SeriesCache::new(PeriodBucketer::default(), 2);
        for day in 1..=3 {
            cache.get_or_compute(&[], Granularity::Day, ymd(2024, 3, day));
        }
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_colliding_fingerprint_is_recomputed() {
        let transactions = vec![Transaction::income("a", 10.0, ymd(2024, 3, 1))];
        let mut cache = SeriesCache::default();
        let key = series_fingerprint(&transactions, Granularity::Month, ymd(2024, 3, 5), 12);

        // Plant an entry for different inputs under the same key
        cache.entries.insert(
            key,
            CacheEntry {
                granularity: Granularity::Year,
                reference: ymd(2023, 1, 1),
                transaction_count: 0,
                series: compute_series(&[], Granularity::Year, ymd(2023, 1, 1)),
            },
        );
        cache.order.push_back(key);

        let series = cache.get_or_compute(&transactions, Granularity::Month, ymd(2024, 3, 5));
        assert_eq!(series.granularity, Granularity::Month);
        assert_eq!(series.total_income(), 10.0);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.order.len(), 1);
    }

    #[test]
    fn test_fingerprint_depends_on_day_slot() {
        let reference = ymd(2024, 3, 1);
        assert_ne!(
            series_fingerprint(&[], Granularity::Day, reference, 12),
            series_fingerprint(&[], Granularity::Day, reference, 8)
        );
    }
}
