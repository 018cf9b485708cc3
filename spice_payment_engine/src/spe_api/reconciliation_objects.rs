use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Cents, OrderNsu};

//--------------------------------------     StatementDate     ---------------------------------------------------------
/// The posting date of a bank statement line. Bank exports often carry only the day, so both forms are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatementDate {
    Timestamp(DateTime<Utc>),
    Day(NaiveDate),
}

#[derive(Debug, Clone, Error)]
#[error("Invalid statement date '{0}'. Expected an RFC 3339 timestamp, YYYY-MM-DD or DD/MM/YYYY")]
pub struct StatementDateError(String);

impl FromStr for StatementDate {
    type Err = StatementDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Timestamp(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
            .map(Self::Day)
            .map_err(|_| StatementDateError(s.to_string()))
    }
}

impl TryFrom<String> for StatementDate {
    type Error = StatementDateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatementDate> for String {
    fn from(value: StatementDate) -> Self {
        value.to_string()
    }
}

impl Display for StatementDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timestamp(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl StatementDate {
    /// Whether the transaction could have paid for an order created at `created_at`.
    ///
    /// A day-only date is compared against the day the order was created, so a transfer booked on the same day as
    /// the order always qualifies.
    pub fn is_on_or_after(&self, created_at: DateTime<Utc>) -> bool {
        match self {
            Self::Timestamp(dt) => *dt >= created_at,
            Self::Day(day) => *day >= created_at.date_naive(),
        }
    }
}

//--------------------------------------    BankTransaction    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[serde(alias = "CREDIT", alias = "Credit", alias = "C")]
    Credit,
    #[serde(alias = "DEBIT", alias = "Debit", alias = "D")]
    Debit,
}

/// A single line of a bank statement. Amounts are in major currency units, as the bank reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub date: StatementDate,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub reference: Option<String>,
}

impl BankTransaction {
    pub fn credit<S: Into<String>>(date: StatementDate, amount: Decimal, description: S) -> Self {
        Self {
            date,
            amount,
            description: description.into(),
            transaction_type: TransactionType::Credit,
            reference: None,
        }
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Only incoming money with a positive amount can pay for an order.
    pub fn is_candidate(&self) -> bool {
        self.transaction_type == TransactionType::Credit && self.amount > Decimal::ZERO
    }
}

//--------------------------------------     MatchingRules     ---------------------------------------------------------
/// The knobs of bank statement matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingRules {
    /// Amounts match when they differ by strictly less than this, in major units.
    pub tolerance: Decimal,
    pub base_confidence: u8,
    pub pix_boost: u8,
    pub nsu_boost: u8,
    pub customer_name_boost: u8,
    /// Matches scoring below this are reported but never auto-confirmed.
    pub min_confidence: u8,
}

impl Default for MatchingRules {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(2, 2),
            base_confidence: 70,
            pix_boost: 15,
            nsu_boost: 15,
            customer_name_boost: 10,
            min_confidence: 70,
        }
    }
}

impl MatchingRules {
    pub fn with_tolerance(mut self, tolerance: Cents) -> Self {
        self.tolerance = tolerance.to_major();
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: u8) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

//--------------------------------------  ReconciliationResult ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Matched,
    NotFound,
    AmountMismatch,
    /// The order matched but could not be confirmed
    Error,
}

impl Display for ReconciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Matched => "matched",
            Self::NotFound => "not_found",
            Self::AmountMismatch => "amount_mismatch",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// The outcome of matching one pending order against a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub order_nsu: OrderNsu,
    /// The order total in major units, for comparison with the statement
    pub order_amount: Decimal,
    pub matched_transaction: Option<BankTransaction>,
    pub status: ReconciliationStatus,
    pub confidence: u8,
    /// True if this run moved the order to `paid`
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub transactions_processed: usize,
    pub orders_checked: usize,
    pub matched: usize,
    pub confirmed: usize,
    pub errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub results: Vec<ReconciliationResult>,
}
