//! Debt progress, aggregate totals and a non-compounding payoff projection.

use crate::schema::Debt;
use crate::utils::{clamp_percent, finite_or_zero, round_percent};
use serde::Serialize;
use std::cmp::Ordering;

/// Time to pay off a balance. `Unbounded` stands in for a zero monthly payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "months", rename_all = "snake_case")]
pub enum PayoffHorizon {
    Months(f64),
    Unbounded,
}

impl PayoffHorizon {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, PayoffHorizon::Unbounded)
    }

    pub fn months(&self) -> Option<f64> {
        match self {
            PayoffHorizon::Months(months) => Some(*months),
            PayoffHorizon::Unbounded => None,
        }
    }

    /// Finite horizon rounded up to whole months.
    pub fn whole_months(&self) -> Option<u32> {
        self.months()
            .map(|months| months.max(0.0).ceil().min(f64::from(u32::MAX)) as u32)
    }

    fn from_ratio(balance: f64, monthly_payment: f64) -> Self {
        if balance <= 0.0 {
            return PayoffHorizon::Months(0.0);
        }
        if monthly_payment <= 0.0 {
            return PayoffHorizon::Unbounded;
        }
        let months = balance / monthly_payment;
        if months.is_finite() {
            PayoffHorizon::Months(months)
        } else {
            PayoffHorizon::Unbounded
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtStats {
    pub active_debts: Vec<Debt>,
    /// Remaining balance across active debts only.
    pub total_debt: f64,
    /// Original principal across every debt, settled ones included.
    pub total_original: f64,
    pub total_paid: f64,
    pub total_progress: f64,
}

impl DebtStats {
    pub fn progress(&self, debt: &Debt) -> f64 {
        get_progress(debt)
    }

    pub fn total_min_payment(&self) -> f64 {
        total_min_payment(&self.active_debts)
    }

    /// Active debts, high priority first, then soonest due date, then largest balance.
    pub fn by_priority(&self) -> Vec<&Debt> {
        let mut ordered: Vec<&Debt> = self.active_debts.iter().collect();
        ordered.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| match (a.due_date, b.due_date) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
                .then_with(|| b.amount.total_cmp(&a.amount))
        });
        ordered
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoffProjection {
    pub total_balance: f64,
    pub total_min_payment: f64,
    pub extra_payment: f64,
    pub months_to_payoff: PayoffHorizon,
    /// Horizon paying only the minimums.
    pub baseline_months: PayoffHorizon,
    pub months_saved: PayoffHorizon,
}

/// Percent of the original principal repaid, always within 0..=100.
pub fn get_progress(debt: &Debt) -> f64 {
    let amount = debt.amount;
    let initial = debt.original_amount();

    if amount.is_nan() || initial.is_nan() {
        return 0.0;
    }
    if initial <= 0.0 {
        return if amount <= 0.0 { 100.0 } else { 0.0 };
    }
    clamp_percent((initial - amount) / initial * 100.0)
}

pub fn compute_debt_stats(debts: &[Debt]) -> DebtStats {
    let active_debts: Vec<Debt> = debts.iter().filter(|d| d.is_active()).cloned().collect();

    let total_debt: f64 = active_debts
        .iter()
        .map(|d| finite_or_zero(d.amount))
        .sum();
    let total_original: f64 = debts
        .iter()
        .map(|d| finite_or_zero(d.original_amount()))
        .sum();
    let total_paid = total_original - total_debt;

    let total_progress = if total_original <= 0.0 {
        0.0
    } else {
        clamp_percent(round_percent(total_paid / total_original * 100.0))
    };

    DebtStats {
        active_debts,
        total_debt,
        total_original,
        total_paid,
        total_progress,
    }
}

pub fn total_min_payment(debts: &[Debt]) -> f64 {
    debts
        .iter()
        .filter(|d| d.is_active())
        .filter_map(|d| d.minimum_payment)
        .map(finite_or_zero)
        .filter(|p| *p > 0.0)
        .sum()
}

/// Bare payoff arithmetic over aggregate figures. Interest is not compounded.
pub fn simulate_totals(
    total_balance: f64,
    total_min_payment: f64,
    extra_payment: f64,
) -> PayoffProjection {
    let total_balance = finite_or_zero(total_balance);
    let total_min_payment = finite_or_zero(total_min_payment);
    let extra_payment = finite_or_zero(extra_payment).max(0.0);

    let months_to_payoff =
        PayoffHorizon::from_ratio(total_balance, total_min_payment + extra_payment);
    let baseline_months = PayoffHorizon::from_ratio(total_balance, total_min_payment);

    let months_saved = if extra_payment > 0.0 {
        match (baseline_months, months_to_payoff) {
            (PayoffHorizon::Months(baseline), PayoffHorizon::Months(accelerated)) => {
                PayoffHorizon::Months(baseline - accelerated)
            }
            (PayoffHorizon::Unbounded, PayoffHorizon::Months(_)) => PayoffHorizon::Unbounded,
            (_, PayoffHorizon::Unbounded) => PayoffHorizon::Months(0.0),
        }
    } else {
        PayoffHorizon::Months(0.0)
    };

    PayoffProjection {
        total_balance,
        total_min_payment,
        extra_payment,
        months_to_payoff,
        baseline_months,
        months_saved,
    }
}

pub fn simulate_payoff(active_debts: &[Debt], extra_payment: f64) -> PayoffProjection {
    let total_balance: f64 = active_debts
        .iter()
        .filter(|d| d.is_active())
        .map(|d| finite_or_zero(d.amount))
        .sum();
    simulate_totals(total_balance, total_min_payment(active_debts), extra_payment)
}
