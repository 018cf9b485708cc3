use std::fmt::Display;

use serde::{Deserialize, Serialize};
use spg_common::Cents;
use spice_payment_engine::{BankTransaction, ReconciliationSummary, VerificationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankStatementRequest {
    pub transactions: Vec<BankTransaction>,
    #[serde(rename = "autoConfirm", default)]
    pub auto_confirm: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CsvStatementParams {
    #[serde(rename = "autoConfirm", default)]
    pub auto_confirm: bool,
}

/// An operator confirming an order by hand. The amount defaults to the order total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualConfirmationRequest {
    pub amount: Option<Cents>,
    pub source: Option<String>,
    pub transaction_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: VerificationSummary,
}

impl From<VerificationSummary> for VerificationResponse {
    fn from(summary: VerificationSummary) -> Self {
        Self { success: true, summary }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: ReconciliationSummary,
}

impl From<ReconciliationSummary> for ReconciliationResponse {
    fn from(summary: ReconciliationSummary) -> Self {
        Self { success: true, summary }
    }
}
