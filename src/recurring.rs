//! Schedule arithmetic for recurring obligations.
//!
//! Occurrences are computed as `anchor + n * interval` rather than by
//! repeatedly adding one interval, so a schedule anchored on the 31st keeps
//! returning to the 31st in long months after being clamped in short ones.

use crate::schema::{Frequency, RecurringObligation, Transaction};
use crate::utils::{months_between, shift_days, shift_months};
use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

/// Upper bound on occurrences materialized for one obligation in a single call.
pub const MAX_CATCH_UP_OCCURRENCES: usize = 1000;

// Extra forward steps allowed after the closed-form estimate.
const MAX_ADJUST_STEPS: u32 = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingObligation {
    pub obligation: RecurringObligation,
    pub due_date: NaiveDate,
    pub days_until_due: i64,
}

/// The `n`th occurrence after `anchor` (the 0th is the anchor itself).
pub fn occurrence(anchor: NaiveDate, frequency: Frequency, n: u32) -> NaiveDate {
    match frequency {
        Frequency::Daily => shift_days(anchor, i64::from(n)),
        Frequency::Weekly => shift_days(anchor, i64::from(n) * 7),
        Frequency::Monthly => shift_months(anchor, n.min(i32::MAX as u32) as i32),
        Frequency::Yearly => {
            shift_months(anchor, n.saturating_mul(12).min(i32::MAX as u32) as i32)
        }
    }
}

// Earliest date a still-pending occurrence may fall on. Processing never
// moves the anchor; the schedule always steps from `start_date`.
fn pending_from(obligation: &RecurringObligation) -> NaiveDate {
    match obligation.last_processed {
        Some(last) => shift_days(last, 1).max(obligation.start_date),
        None => obligation.start_date,
    }
}

// Number of whole intervals between `anchor` and `target`, never overshooting
// by more than one step.
fn estimate_steps(anchor: NaiveDate, target: NaiveDate, frequency: Frequency) -> u32 {
    let steps = match frequency {
        Frequency::Daily => (target - anchor).num_days(),
        Frequency::Weekly => (target - anchor).num_days() / 7,
        Frequency::Monthly => i64::from(months_between(anchor, target)),
        Frequency::Yearly => i64::from(months_between(anchor, target)) / 12,
    };
    steps.clamp(0, i64::from(u32::MAX)) as u32
}

// Index of the first occurrence on or after `bound`.
fn first_index_on_or_after(
    anchor: NaiveDate,
    frequency: Frequency,
    bound: NaiveDate,
) -> Option<u32> {
    if anchor >= bound {
        return Some(0);
    }

    let start = estimate_steps(anchor, bound, frequency).saturating_sub(1);
    let mut previous = None;
    for n in start..start.saturating_add(MAX_ADJUST_STEPS) {
        let candidate = occurrence(anchor, frequency, n);
        if candidate >= bound {
            return Some(n);
        }
        if previous.is_some_and(|p| candidate <= p) {
            return None;
        }
        previous = Some(candidate);
    }
    None
}

/// First scheduled date on or after `today` that falls after `last_processed`.
///
/// Returns `None` only when the schedule cannot advance (dates beyond the
/// representable calendar range).
pub fn next_due_date(obligation: &RecurringObligation, today: NaiveDate) -> Option<NaiveDate> {
    let bound = pending_from(obligation).max(today);
    let n = first_index_on_or_after(obligation.start_date, obligation.frequency, bound)?;
    Some(occurrence(obligation.start_date, obligation.frequency, n))
}

/// Obligations due within `lookahead_days` of `today` (inclusive), soonest first.
pub fn upcoming_obligations(
    obligations: &[RecurringObligation],
    today: NaiveDate,
    lookahead_days: i64,
) -> Vec<UpcomingObligation> {
    let mut upcoming: Vec<UpcomingObligation> = obligations
        .iter()
        .filter_map(|obligation| {
            let due_date = next_due_date(obligation, today)?;
            let days_until_due = (due_date - today).num_days();
            (0..=lookahead_days)
                .contains(&days_until_due)
                .then(|| UpcomingObligation {
                    obligation: obligation.clone(),
                    due_date,
                    days_until_due,
                })
        })
        .collect();

    upcoming.sort_by(|a, b| {
        a.days_until_due
            .cmp(&b.days_until_due)
            .then_with(|| a.obligation.description.cmp(&b.obligation.description))
    });
    upcoming
}

/// Scheduled dates not yet processed, up to and including `today`.
pub fn due_occurrences(obligation: &RecurringObligation, today: NaiveDate) -> Vec<NaiveDate> {
    let anchor = obligation.start_date;
    let first = first_index_on_or_after(anchor, obligation.frequency, pending_from(obligation));
    let Some(mut n) = first else {
        return Vec::new();
    };
    let mut dates = Vec::new();

    loop {
        let candidate = occurrence(anchor, obligation.frequency, n);
        if candidate > today {
            break;
        }
        if dates.last().is_some_and(|last| candidate <= *last) {
            break;
        }
        if dates.len() == MAX_CATCH_UP_OCCURRENCES {
            warn!(
                "Recurring obligation '{}' has more than {} pending occurrences; truncating",
                obligation.description, MAX_CATCH_UP_OCCURRENCES
            );
            break;
        }
        dates.push(candidate);
        n = n.saturating_add(1);
    }

    dates
}

/// Turns every pending occurrence into a transaction for the caller to persist.
pub fn materialize_due(obligations: &[RecurringObligation], today: NaiveDate) -> Vec<Transaction> {
    obligations
        .iter()
        .flat_map(|obligation| {
            due_occurrences(obligation, today)
                .into_iter()
                .map(move |date| Transaction {
                    id: format!("{}:{}", obligation.description, date),
                    kind: obligation.kind,
                    amount: obligation.amount,
                    category: obligation.category.clone(),
                    date,
                    recurring: true,
                })
        })
        .collect()
}
