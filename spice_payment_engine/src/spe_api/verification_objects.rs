use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::OrderNsu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Confirmed,
    StillPending,
    Error,
}

impl Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Confirmed => "confirmed",
            Self::StillPending => "still_pending",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub order_nsu: OrderNsu,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResult {
    pub fn new(order_nsu: OrderNsu, status: VerificationStatus) -> Self {
        Self { order_nsu, status, source: None, message: None }
    }

    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The report of one verification sweep. The totals are always derived from `results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub timestamp: DateTime<Utc>,
    pub verified: usize,
    pub confirmed: usize,
    pub still_pending: usize,
    pub errors: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    pub fn from_results(timestamp: DateTime<Utc>, results: Vec<VerificationResult>) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            timestamp,
            verified: results.len(),
            confirmed: count(VerificationStatus::Confirmed),
            still_pending: count(VerificationStatus::StillPending),
            errors: count(VerificationStatus::Error),
            results,
        }
    }
}
