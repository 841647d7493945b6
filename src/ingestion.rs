//! Conversion of persisted records into normalized domain values.
//!
//! Dates arrive as strings in whatever shape the storage layer wrote them.
//! They are reduced to local calendar dates here, once, so every later
//! comparison works purely on `NaiveDate`. Records that cannot be repaired
//! are excluded and reported as [`DataQualityIssue`]s instead of failing the
//! whole batch.

use crate::error::{FinanceError, Result};
use crate::schema::{
    Debt, DebtPriority, Frequency, RecurringObligation, Transaction, TransactionKind,
};
use crate::utils::normalize_calendar_date;
use chrono::NaiveDate;
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub id: String,
    #[serde(alias = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[schemars(description = "YYYY-MM-DD or an ISO 8601 timestamp")]
    pub date: String,
    #[serde(default, alias = "recurring")]
    pub is_recurring: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawDebt {
    pub id: String,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub initial_amount: Option<f64>,
    #[serde(default)]
    pub interest_rate: Option<f64>,
    #[serde(default)]
    pub minimum_payment: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: DebtPriority,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawObligation {
    pub description: String,
    pub amount: f64,
    #[serde(alias = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: Option<String>,
    pub frequency: Frequency,
    pub start_date: String,
    #[serde(default)]
    pub last_processed: Option<String>,
}

/// Everything the persistence layer hands over in one go.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshot {
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
    #[serde(default)]
    pub debts: Vec<RawDebt>,
    #[serde(default, alias = "recurringTransactions")]
    pub recurring: Vec<RawObligation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Transaction,
    Debt,
    Obligation,
}

/// A record problem that was worked around rather than treated as fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityIssue {
    pub record: RecordKind,
    pub id: String,
    pub field: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingested<T> {
    pub records: Vec<T>,
    pub issues: Vec<DataQualityIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSnapshot {
    pub transactions: Vec<Transaction>,
    pub debts: Vec<Debt>,
    pub obligations: Vec<RecurringObligation>,
    pub issues: Vec<DataQualityIssue>,
}

fn issue(
    record: RecordKind,
    id: &str,
    field: &str,
    value: impl ToString,
    reason: impl Into<String>,
) -> DataQualityIssue {
    let issue = DataQualityIssue {
        record,
        id: id.to_string(),
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    };
    warn!(
        "Data quality: {:?} '{}' field '{}' = '{}': {}",
        issue.record, issue.id, issue.field, issue.value, issue.reason
    );
    issue
}

// Optional date fields are dropped rather than failing the record.
fn optional_date(
    raw: Option<&str>,
    record: RecordKind,
    id: &str,
    field: &str,
    issues: &mut Vec<DataQualityIssue>,
) -> Option<NaiveDate> {
    let raw = raw?;
    match normalize_calendar_date(raw) {
        Ok(date) => Some(date),
        Err(e) => {
            issues.push(issue(record, id, field, raw, format!("{}; field ignored", e)));
            None
        }
    }
}

pub fn ingest_transactions(raw: &[RawTransaction]) -> Ingested<Transaction> {
    let mut records = Vec::with_capacity(raw.len());
    let mut issues = Vec::new();

    for row in raw {
        if !row.amount.is_finite() {
            issues.push(issue(
                RecordKind::Transaction,
                &row.id,
                "amount",
                row.amount,
                "Amount is not a finite number; transaction excluded",
            ));
            continue;
        }

        let date = match normalize_calendar_date(&row.date) {
            Ok(date) => date,
            Err(e) => {
                issues.push(issue(
                    RecordKind::Transaction,
                    &row.id,
                    "date",
                    &row.date,
                    format!("{}; transaction excluded", e),
                ));
                continue;
            }
        };

        records.push(Transaction {
            id: row.id.clone(),
            kind: row.kind,
            amount: row.amount,
            category: row.category.clone(),
            date,
            recurring: row.is_recurring,
        });
    }

    debug!(
        "Ingested {} of {} transactions ({} issues)",
        records.len(),
        raw.len(),
        issues.len()
    );
    Ingested { records, issues }
}

pub fn ingest_debts(raw: &[RawDebt]) -> Ingested<Debt> {
    let mut issues = Vec::new();

    let records = raw
        .iter()
        .map(|row| Debt {
            id: row.id.clone(),
            name: row.name.clone(),
            amount: row.amount,
            initial_amount: row.initial_amount,
            interest_rate: row.interest_rate,
            minimum_payment: row.minimum_payment,
            due_date: optional_date(
                row.due_date.as_deref(),
                RecordKind::Debt,
                &row.id,
                "dueDate",
                &mut issues,
            ),
            priority: row.priority,
            date: optional_date(
                row.date.as_deref(),
                RecordKind::Debt,
                &row.id,
                "date",
                &mut issues,
            ),
        })
        .collect();

    Ingested { records, issues }
}

pub fn ingest_obligations(raw: &[RawObligation]) -> Ingested<RecurringObligation> {
    let mut records = Vec::with_capacity(raw.len());
    let mut issues = Vec::new();

    for row in raw {
        if !row.amount.is_finite() {
            issues.push(issue(
                RecordKind::Obligation,
                &row.description,
                "amount",
                row.amount,
                "Amount is not a finite number; obligation excluded",
            ));
            continue;
        }

        let start_date = match normalize_calendar_date(&row.start_date) {
            Ok(date) => date,
            Err(e) => {
                issues.push(issue(
                    RecordKind::Obligation,
                    &row.description,
                    "startDate",
                    &row.start_date,
                    format!("{}; obligation excluded", e),
                ));
                continue;
            }
        };

        let last_processed = optional_date(
            row.last_processed.as_deref(),
            RecordKind::Obligation,
            &row.description,
            "lastProcessed",
            &mut issues,
        );

        records.push(RecurringObligation {
            description: row.description.clone(),
            amount: row.amount,
            kind: row.kind,
            category: row.category.clone(),
            frequency: row.frequency,
            start_date,
            last_processed,
        });
    }

    Ingested { records, issues }
}

impl RecordSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Loads a snapshot file and rejects it if record ids collide.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading record snapshot from {}", path.display());
        let snapshot = Self::from_reader(BufReader::new(File::open(path)?))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Transaction ids and debt ids must each be unique within a snapshot.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for row in &self.transactions {
            if !seen.insert(row.id.as_str()) {
                return Err(FinanceError::ValidationError {
                    record: format!("transaction '{}'", row.id),
                    details: "duplicate transaction id".to_string(),
                });
            }
        }

        seen.clear();
        for row in &self.debts {
            if !seen.insert(row.id.as_str()) {
                return Err(FinanceError::ValidationError {
                    record: format!("debt '{}'", row.id),
                    details: "duplicate debt id".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn normalize(&self) -> NormalizedSnapshot {
        let transactions = ingest_transactions(&self.transactions);
        let debts = ingest_debts(&self.debts);
        let obligations = ingest_obligations(&self.recurring);

        let mut issues = transactions.issues;
        issues.extend(debts.issues);
        issues.extend(obligations.issues);

        NormalizedSnapshot {
            transactions: transactions.records,
            debts: debts.records,
            obligations: obligations.records,
            issues,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RecordSnapshot)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
