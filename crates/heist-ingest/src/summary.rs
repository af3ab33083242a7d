//! Aggregate view over a parsed export.

use std::collections::BTreeSet;

use heist_core::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::record::ExpenseRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSummary {
    pub total_expenses: usize,
    /// Exact sum, mixed currencies included.
    pub total_amount: Decimal,
    pub currencies: BTreeSet<String>,
    /// Non-empty categories only.
    pub categories: BTreeSet<String>,
}

impl ExpenseSummary {
    /// Fails only when the exact total leaves the decimal range.
    pub fn from_records(records: &[ExpenseRecord]) -> Result<Self> {
        let total_amount = records
            .iter()
            .try_fold(Decimal::ZERO, |total, r| total.checked_add(r.amount))
            .ok_or_else(|| {
                Error::MalformedInput(format!(
                    "total of {} amounts exceeds the representable range",
                    records.len()
                ))
            })?;

        Ok(Self {
            total_expenses: records.len(),
            total_amount,
            currencies: records.iter().map(|r| r.currency.clone()).collect(),
            categories: records
                .iter()
                .filter(|r| !r.category.is_empty())
                .map(|r| r.category.clone())
                .collect(),
        })
    }
}
