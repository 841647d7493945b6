use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[schemars(description = "Money received (salary, refunds, gifts)")]
    Income,

    #[schemars(description = "Money spent")]
    Expense,
}

/// A single money movement, already normalized to a local calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,

    #[schemars(description = "Non-negative amount; the kind carries the direction")]
    pub amount: f64,

    #[serde(default)]
    pub category: Option<String>,

    #[schemars(description = "Calendar date (no time of day) in the owner's local calendar")]
    pub date: NaiveDate,

    #[serde(default)]
    pub recurring: bool,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        kind: TransactionKind,
        amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            amount,
            category: None,
            date,
            recurring: false,
        }
    }

    pub fn income(id: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self::new(id, TransactionKind::Income, amount, date)
    }

    pub fn expense(id: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self::new(id, TransactionKind::Expense, amount, date)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Amount with its direction applied: positive for income, negative for expense.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DebtPriority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Debt {
    pub id: String,
    pub name: String,

    #[schemars(description = "Current remaining balance. Zero or less means the debt is settled.")]
    pub amount: f64,

    #[serde(default)]
    #[schemars(description = "Original principal. When absent the current amount stands in for it.")]
    pub initial_amount: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Annual interest rate in percent. Informational only; payoff projections do not compound.")]
    pub interest_rate: Option<f64>,

    #[serde(default)]
    pub minimum_payment: Option<f64>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub priority: DebtPriority,

    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl Debt {
    pub fn new(id: impl Into<String>, name: impl Into<String>, amount: f64, initial_amount: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            amount,
            initial_amount: Some(initial_amount),
            interest_rate: None,
            minimum_payment: None,
            due_date: None,
            priority: DebtPriority::default(),
            date: None,
        }
    }

    pub fn with_minimum_payment(mut self, minimum_payment: f64) -> Self {
        self.minimum_payment = Some(minimum_payment);
        self
    }

    pub fn with_priority(mut self, priority: DebtPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn is_active(&self) -> bool {
        self.amount > 0.0
    }

    /// Original principal, falling back to the current amount.
    pub fn original_amount(&self) -> f64 {
        self.initial_amount.unwrap_or(self.amount)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A scheduled income or bill that repeats at a fixed frequency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RecurringObligation {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,

    #[serde(default)]
    pub category: Option<String>,

    pub frequency: Frequency,

    #[schemars(description = "First scheduled occurrence")]
    pub start_date: NaiveDate,

    #[serde(default)]
    #[schemars(description = "Most recent occurrence already turned into a transaction")]
    pub last_processed: Option<NaiveDate>,
}

impl RecurringObligation {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        kind: TransactionKind,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            kind,
            category: None,
            frequency,
            start_date,
            last_processed: None,
        }
    }

    pub fn with_last_processed(mut self, last_processed: NaiveDate) -> Self {
        self.last_processed = Some(last_processed);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[schemars(description = "24 hourly buckets for a single calendar day")]
    Day,

    #[schemars(description = "7 daily buckets, Sunday through Saturday")]
    Week,

    #[schemars(description = "One bucket per calendar day of the month")]
    Month,

    #[schemars(description = "12 monthly buckets")]
    Year,
}
