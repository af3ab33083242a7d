//! Canonical expense record.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

/// One normalized line item of an export. Built from a single row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRecord {
    /// When the expense happened; the capture time if the row had no usable date.
    #[serde(rename = "date")]
    pub occurred_at: NaiveDateTime,
    pub merchant: String,
    /// Exact amount, serialized as a decimal string.
    pub amount: Decimal,
    pub currency: String,
    /// May be empty.
    pub category: String,
    pub tag: Option<String>,
    pub description: Option<String>,
    pub report_name: Option<String>,
    pub reimbursable: bool,
    pub billable: bool,
    #[serde(rename = "receipt_url")]
    pub receipt_reference: Option<String>,
}
