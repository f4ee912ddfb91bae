use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder used when a ledger line carries no description.
pub const UNKNOWN_DESCRIPTION: &str = "Unknown description";

/// Posting direction of a ledger line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    /// Parse an XAF `amntTp` value (`D`/`C`, also accepts the spelled out forms)
    pub fn from_code(code: &str) -> Option<Direction> {
        match code.trim().to_ascii_uppercase().as_str() {
            "D" | "DEBIT" => Some(Direction::Debit),
            "C" | "CREDIT" => Some(Direction::Credit),
            _ => None,
        }
    }
}

/// One posting line recognised in a ledger export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    /// Ledger account identifier, may be empty
    pub account_id: String,
    pub description: String,
    /// Posting magnitude, never negative
    #[schemars(with = "f64")]
    pub amount: Decimal,
    /// Absent in export variants that do not record it
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub date: Option<NaiveDate>,
}

impl Transaction {
    pub fn new(account_id: &str, description: &str, amount: Decimal) -> Self {
        Transaction {
            account_id: account_id.to_string(),
            description: description.to_string(),
            amount: amount.abs(),
            direction: None,
            date: None,
        }
    }

    /// Account identifier as a number, ignoring leading zeros (`"0100"` is 100).
    pub fn account_number(&self) -> Option<u32> {
        let trimmed = self.account_id.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        trimmed.parse().ok()
    }
}
