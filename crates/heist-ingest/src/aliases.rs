//! Column alias table.

/// Canonical fields of an [`crate::ExpenseRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Merchant,
    Amount,
    Currency,
    Category,
    Tag,
    Description,
    ReportName,
    Reimbursable,
    Billable,
    Receipt,
}

/// Source column names accepted for each field, in priority order.
/// An earlier alias wins when a row carries several of them.
pub static COLUMN_ALIASES: &[(Field, &[&str])] = &[
    (
        Field::Date,
        &["Timestamp", "Date", "Created", "Transaction Date", "Expense Date"],
    ),
    (Field::Merchant, &["Merchant", "Vendor", "Payee", "Description"]),
    (Field::Amount, &["Amount", "Total", "Expense Amount"]),
    (Field::Currency, &["Currency", "Original Currency"]),
    (Field::Category, &["Category", "Expense Category", "GL Code"]),
    (Field::Tag, &["Tag", "Tags", "Project", "Cost Center"]),
    (Field::Description, &["Comment", "Description", "Notes", "Memo"]),
    (Field::ReportName, &["Report Name", "Report", "Report Title"]),
    (Field::Reimbursable, &["Reimbursable", "Is Reimbursable"]),
    (Field::Billable, &["Billable", "Is Billable"]),
    (Field::Receipt, &["Receipt URL", "Receipt", "Receipt Link"]),
];

impl Field {
    pub fn aliases(self) -> &'static [&'static str] {
        COLUMN_ALIASES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}
