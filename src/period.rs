//! Calendar bucketing for the four supported granularities.
//!
//! A [`PeriodWindow`] is the calendar unit (day, week, month or year) that
//! contains a reference date, split into contiguous, non-overlapping slots
//! that cover it exactly.

use crate::config::DEFAULT_DAY_BUCKET_HOUR;
use crate::schema::Granularity;
use crate::utils::{
    day_end, day_start, days_in_month, first_day_of_month, last_day_of_month, month_label,
    shift_days, shift_months, start_of_week, weekday_label,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BucketKey {
    Hour { hour: u32 },
    Date { date: NaiveDate },
    Month { month: u32, year: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSlot {
    pub label: String,
    pub key: BucketKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodWindow {
    pub granularity: Granularity,
    pub reference: NaiveDate,
    /// 00:00:00.000 on the first day of the period.
    pub start: NaiveDateTime,
    /// 23:59:59.999 on the last day of the period.
    pub end: NaiveDateTime,
    pub slots: Vec<BucketSlot>,
    #[serde(skip)]
    day_slot: u32,
}

impl PeriodWindow {
    pub fn first_day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Key a date maps to under this window's granularity.
    pub fn key_for(&self, date: NaiveDate) -> BucketKey {
        match self.granularity {
            Granularity::Day => BucketKey::Hour {
                hour: self.day_slot,
            },
            Granularity::Week | Granularity::Month => BucketKey::Date { date },
            Granularity::Year => BucketKey::Month {
                month: date.month(),
                year: date.year(),
            },
        }
    }

    /// Index of the slot a date falls into, or `None` when it lies outside the period.
    pub fn slot_index(&self, date: NaiveDate) -> Option<usize> {
        if !self.contains(date) {
            return None;
        }

        let guess = match self.granularity {
            Granularity::Day => self.day_slot as usize,
            Granularity::Week => (date - self.first_day()).num_days() as usize,
            Granularity::Month => date.day0() as usize,
            Granularity::Year => date.month0() as usize,
        };

        let key = self.key_for(date);
        match self.slots.get(guess) {
            Some(slot) if slot.key == key => Some(guess),
            _ => self.slots.iter().position(|slot| slot.key == key),
        }
    }
}

/// Produces [`PeriodWindow`]s. Holds only the day-granularity slot choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBucketer {
    day_slot: u32,
}

impl Default for PeriodBucketer {
    fn default() -> Self {
        Self::new(DEFAULT_DAY_BUCKET_HOUR)
    }
}

impl PeriodBucketer {
    /// `day_slot` is clamped into 0..=23.
    pub fn new(day_slot: u32) -> Self {
        Self {
            day_slot: day_slot.min(23),
        }
    }

    pub fn day_slot(&self) -> u32 {
        self.day_slot
    }

    pub fn bucket(&self, granularity: Granularity, reference: NaiveDate) -> PeriodWindow {
        let (first, last) = period_bounds(granularity, reference);

        let slots = match granularity {
            Granularity::Day => (0..24)
                .map(|hour| BucketSlot {
                    label: format!("{}:00", hour),
                    key: BucketKey::Hour { hour },
                })
                .collect(),
            Granularity::Week => (0..7)
                .map(|offset| {
                    let date = shift_days(first, offset);
                    BucketSlot {
                        label: weekday_label(date.weekday().num_days_from_sunday()).to_string(),
                        key: BucketKey::Date { date },
                    }
                })
                .collect(),
            Granularity::Month => {
                let days = days_in_month(first.year(), first.month());
                (1..=days)
                    .filter_map(|day| first.with_day(day))
                    .map(|date| BucketSlot {
                        label: date.day().to_string(),
                        key: BucketKey::Date { date },
                    })
                    .collect()
            }
            Granularity::Year => (1..=12)
                .map(|month| BucketSlot {
                    label: month_label(month).to_string(),
                    key: BucketKey::Month {
                        month,
                        year: first.year(),
                    },
                })
                .collect(),
        };

        PeriodWindow {
            granularity,
            reference,
            start: day_start(first),
            end: day_end(last),
            slots,
            day_slot: self.day_slot,
        }
    }
}

pub fn bucket_period(granularity: Granularity, reference: NaiveDate) -> PeriodWindow {
    PeriodBucketer::default().bucket(granularity, reference)
}

/// First and last calendar day of the unit containing `reference`.
pub fn period_bounds(granularity: Granularity, reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    match granularity {
        Granularity::Day => (reference, reference),
        Granularity::Week => {
            let first = start_of_week(reference);
            (first, shift_days(first, 6))
        }
        Granularity::Month => (first_day_of_month(reference), last_day_of_month(reference)),
        Granularity::Year => {
            let first = reference.with_ordinal(1).unwrap_or(reference);
            let last = reference
                .with_month(12)
                .and_then(|d| d.with_day(31))
                .unwrap_or(reference);
            (first, last)
        }
    }
}

/// The reference date moved back one unit, for previous-period overlays.
pub fn previous_reference(granularity: Granularity, reference: NaiveDate) -> NaiveDate {
    match granularity {
        Granularity::Day => shift_days(reference, -1),
        Granularity::Week => shift_days(reference, -7),
        Granularity::Month => shift_months(reference, -1),
        Granularity::Year => shift_months(reference, -12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_window() {
        let window = bucket_period(Granularity::Day, ymd(2024, 3, 15));
        assert_eq!(window.len(), 24);
        assert_eq!(window.slots[0].label, "0:00");
        assert_eq!(window.slots[23].label, "23:00");
        assert_eq!(window.first_day(), ymd(2024, 3, 15));
        assert_eq!(window.last_day(), ymd(2024, 3, 15));

        // No time of day on records, so everything lands in the fixed slot
        assert_eq!(window.slot_index(ymd(2024, 3, 15)), Some(12));
        assert_eq!(window.slot_index(ymd(2024, 3, 16)), None);
    }

    #[test]
    fn test_day_slot_is_configurable() {
        let window = PeriodBucketer::new(8).bucket(Granularity::Day, ymd(2024, 3, 15));
        assert_eq!(window.slot_index(ymd(2024, 3, 15)), Some(8));

        let clamped = PeriodBucketer::new(99);
        assert_eq!(clamped.day_slot(), 23);
    }

    #[test]
    fn test_week_window_runs_sunday_to_saturday() {
        // Friday
        let window = bucket_period(Granularity::Week, ymd(2024, 3, 15));
        assert_eq!(window.len(), 7);
        assert_eq!(window.first_day(), ymd(2024, 3, 10));
        assert_eq!(window.last_day(), ymd(2024, 3, 16));

        let labels: Vec<&str> = window.slots.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);

        assert_eq!(window.slot_index(ymd(2024, 3, 10)), Some(0));
        assert_eq!(window.slot_index(ymd(2024, 3, 16)), Some(6));
        assert_eq!(window.slot_index(ymd(2024, 3, 17)), None);
    }

    #[test]
    fn test_week_window_across_year_boundary() {
        // 2025-01-01 is a Wednesday
        let window = bucket_period(Granularity::Week, ymd(2025, 1, 1));
        assert_eq!(window.first_day(), ymd(2024, 12, 29));
        assert_eq!(window.last_day(), ymd(2025, 1, 4));
        assert_eq!(window.slot_index(ymd(2024, 12, 31)), Some(2));
    }

    #[test]
    fn test_month_window_lengths() {
        assert_eq!(bucket_period(Granularity::Month, ymd(2024, 2, 10)).len(), 29);
        assert_eq!(bucket_period(Granularity::Month, ymd(2023, 2, 10)).len(), 28);
        assert_eq!(bucket_period(Granularity::Month, ymd(2024, 4, 30)).len(), 30);

        let march = bucket_period(Granularity::Month, ymd(2024, 3, 15));
        assert_eq!(march.len(), 31);
        assert_eq!(march.slots[0].key, BucketKey::Date { date: ymd(2024, 3, 1) });
        assert_eq!(march.slots[30].label, "31");
        assert_eq!(march.slot_index(ymd(2024, 3, 10)), Some(9));
        assert_eq!(march.start.to_string(), "2024-03-01 00:00:00");
        assert_eq!(march.end.to_string(), "2024-03-31 23:59:59.999");
    }

    #[test]
    fn test_year_window() {
        let window = bucket_period(Granularity::Year, ymd(2024, 7, 4));
        assert_eq!(window.len(), 12);
        assert_eq!(window.first_day(), ymd(2024, 1, 1));
        assert_eq!(window.last_day(), ymd(2024, 12, 31));
        assert_eq!(window.slots[1].label, "Feb");
        assert_eq!(
            window.slots[11].key,
            BucketKey::Month {
                month: 12,
                year: 2024
            }
        );
        assert_eq!(window.slot_index(ymd(2024, 12, 25)), Some(11));
        assert_eq!(window.slot_index(ymd(2023, 12, 25)), None);
    }

    #[test]
    fn test_slots_partition_the_period() {
        for granularity in [Granularity::Week, Granularity::Month] {
            let window = bucket_period(granularity, ymd(2024, 2, 14));
            let mut day = window.first_day();
            let mut seen = 0;
            while day <= window.last_day() {
                assert_eq!(window.slot_index(day), Some(seen));
                day = day.succ_opt().unwrap();
                seen += 1;
            }
            assert_eq!(seen, window.len());
        }
    }

    #[test]
    fn test_previous_reference() {
        assert_eq!(
            previous_reference(Granularity::Day, ymd(2024, 3, 1)),
            ymd(2024, 2, 29)
        );
        assert_eq!(
            previous_reference(Granularity::Week, ymd(2024, 3, 15)),
            ymd(2024, 3, 8)
        );
        assert_eq!(
            previous_reference(Granularity::Month, ymd(2024, 3, 31)),
            ymd(2024, 2, 29)
        );
        assert_eq!(
            previous_reference(Granularity::Year, ymd(2024, 2, 29)),
            ymd(2023, 2, 28)
        );
    }
}
