use crate::config::DEFAULT_LOOKAHEAD_DAYS;
use crate::recurring::{upcoming_obligations, UpcomingObligation};
use crate::schema::{RecurringObligation, Transaction, TransactionKind};
use crate::utils::{days_in_month, finite_or_zero, round_percent, shift_months};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    /// Magnitude of the change relative to the previous value, rounded.
    pub percent: f64,
    pub trend: Trend,
    pub is_good: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MonthTotals {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    pub projected: f64,
    pub daily_average: f64,
    pub days_remaining: u32,
    pub is_over_income: bool,
    /// Share of the projected month already spent.
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DashboardComparison {
    pub income: Comparison,
    pub expenses: Comparison,
    pub net: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub previous: MonthTotals,
    pub comparison: DashboardComparison,
    pub forecast: Forecast,
    pub upcoming_obligations: Vec<UpcomingObligation>,
    pub main_balance: f64,
}

pub fn compare(current: f64, previous: f64, lower_is_better: bool) -> Comparison {
    let current = finite_or_zero(current);
    let previous = finite_or_zero(previous);
    let diff = current - previous;
    let is_good = if lower_is_better {
        diff <= 0.0
    } else {
        diff >= 0.0
    };

    if previous == 0.0 {
        return Comparison {
            percent: if current > 0.0 { 100.0 } else { 0.0 },
            trend: if current > 0.0 { Trend::Up } else { Trend::Flat },
            is_good,
        };
    }

    let trend = if diff > 0.0 {
        Trend::Up
    } else if diff < 0.0 {
        Trend::Down
    } else {
        Trend::Flat
    };

    Comparison {
        percent: round_percent(diff.abs() / previous.abs() * 100.0),
        trend,
        is_good,
    }
}

/// Income and expense totals for one calendar month.
pub fn month_totals(transactions: &[Transaction], year: i32, month: u32) -> MonthTotals {
    let mut totals = MonthTotals::default();
    for transaction in transactions {
        if transaction.date.year() != year
            || transaction.date.month() != month
            || !transaction.amount.is_finite()
        {
            continue;
        }
        match transaction.kind {
            TransactionKind::Income => totals.income += transaction.amount,
            TransactionKind::Expense => totals.expenses += transaction.amount,
        }
    }
    totals.net = totals.income - totals.expenses;
    totals
}

/// Linear projection of month-to-date spend over the whole month.
pub fn forecast_spend(expense_so_far: f64, income: f64, today: NaiveDate) -> Forecast {
    let expense_so_far = finite_or_zero(expense_so_far);
    let income = finite_or_zero(income);
    let day_of_month = today.day().max(1);
    let month_length = days_in_month(today.year(), today.month());

    let daily_average = expense_so_far / f64::from(day_of_month);
    let projected = daily_average * f64::from(month_length);
    let progress = if projected > 0.0 {
        finite_or_zero(expense_so_far / projected * 100.0)
    } else {
        0.0
    };

    Forecast {
        projected,
        daily_average,
        days_remaining: month_length.saturating_sub(day_of_month),
        is_over_income: projected > income && income > 0.0,
        progress,
    }
}

/// Net of the entire history, independent of any period.
pub fn main_balance(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|t| t.amount.is_finite())
        .map(Transaction::signed_amount)
        .sum()
}

pub fn compute_dashboard_metrics(
    transactions: &[Transaction],
    obligations: &[RecurringObligation],
    now: NaiveDateTime,
) -> DashboardMetrics {
    compute_dashboard_metrics_with(transactions, obligations, now, DEFAULT_LOOKAHEAD_DAYS)
}

pub fn compute_dashboard_metrics_with(
    transactions: &[Transaction],
    obligations: &[RecurringObligation],
    now: NaiveDateTime,
    lookahead_days: i64,
) -> DashboardMetrics {
    let today = now.date();
    let last_month = shift_months(today, -1);

    let current = month_totals(transactions, today.year(), today.month());
    let previous = month_totals(transactions, last_month.year(), last_month.month());

    let comparison = DashboardComparison {
        income: compare(current.income, previous.income, false),
        expenses: compare(current.expenses, previous.expenses, true),
        net: compare(current.net, previous.net, false),
    };

    let forecast = forecast_spend(current.expenses, current.income, today);
    let upcoming = upcoming_obligations(obligations, today, lookahead_days);

    debug!(
        "Dashboard for {}: income {:.2}, expenses {:.2}, projected {:.2}, {} upcoming obligations",
        today,
        current.income,
        current.expenses,
        forecast.projected,
        upcoming.len()
    );

    DashboardMetrics {
        income: current.income,
        expenses: current.expenses,
        net: current.net,
        previous,
        comparison,
        forecast,
        upcoming_obligations: upcoming,
        main_balance: main_balance(transactions),
    }
}
