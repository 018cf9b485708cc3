//! CSV bank statement import.
//!
//! The expected header is `date,amount,description,type,reference`. Column order does not matter, `reference` is
//! optional, and semicolon-separated exports are detected from the header line. Amounts may use either `.` or the
//! Brazilian `,` as decimal separator (`1.234,56`). When the `type` column is blank the sign of the amount decides and
//! the amount is stored unsigned. An explicit type keeps the amount as written, so a negative credit is never a
//! candidate for reconciliation.
use std::str::FromStr;

use csv::{ReaderBuilder, Trim};
use log::*;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::spe_api::reconciliation_objects::{BankTransaction, StatementDate, TransactionType};

#[derive(Debug, Clone, Error)]
pub enum StatementImportError {
    #[error("Could not read the statement CSV: {0}")]
    Csv(String),
    #[error("Line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
}

impl From<csv::Error> for StatementImportError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct StatementRow {
    date: String,
    amount: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type", default)]
    transaction_type: String,
    #[serde(default)]
    reference: Option<String>,
}

pub fn parse_statement_csv(data: &str) -> Result<Vec<BankTransaction>, StatementImportError> {
    let header = data.lines().next().unwrap_or_default();
    let delimiter = if header.contains(';') { b';' } else { b',' };
    let mut reader = ReaderBuilder::new().delimiter(delimiter).trim(Trim::All).flexible(true).from_reader(data.as_bytes());
    let mut transactions = Vec::new();
    for (i, row) in reader.deserialize::<StatementRow>().enumerate() {
        // header is line 1
        let line = i as u64 + 2;
        let row = row?;
        let tx = row_to_transaction(row).map_err(|reason| StatementImportError::InvalidRow { line, reason })?;
        transactions.push(tx);
    }
    debug!("🏦️ Imported {} transactions from CSV statement", transactions.len());
    Ok(transactions)
}

fn row_to_transaction(row: StatementRow) -> Result<BankTransaction, String> {
    let date = StatementDate::from_str(&row.date).map_err(|e| e.to_string())?;
    let amount = parse_amount(&row.amount)?;
    let (transaction_type, amount) = match row.transaction_type.to_lowercase().as_str() {
        "credit" | "c" | "credito" | "crédito" => (TransactionType::Credit, amount),
        "debit" | "d" | "debito" | "débito" => (TransactionType::Debit, amount),
        "" if amount.is_sign_negative() => (TransactionType::Debit, amount.abs()),
        "" => (TransactionType::Credit, amount),
        other => return Err(format!("Unknown transaction type '{other}'")),
    };
    if transaction_type == TransactionType::Credit && amount.is_sign_negative() {
        warn!("🏦️ Credit '{}' has a negative amount ({amount}). It will not be matched", row.description);
    }
    let reference = row.reference.filter(|r| !r.is_empty());
    Ok(BankTransaction { date, amount, description: row.description, transaction_type, reference })
}

fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let cleaned: String = raw.trim().trim_start_matches("R$").chars().filter(|c| !c.is_whitespace()).collect();
    let normalised = if cleaned.contains(',') { cleaned.replace('.', "").replace(',', ".") } else { cleaned };
    Decimal::from_str(&normalised).map_err(|e| format!("Invalid amount '{raw}': {e}"))
}
