//! Tool response shapes — validates that the JSON a tool call returns keeps
//! the field names and types MCP clients read.
//!
//! Built from the library crates directly; no HTTP server or browser needed.

use heist_core::{Error, ErrorCategory};
use heist_ingest::{parse, ExpenseSummary};

const EXPORT: &str = "Timestamp,Merchant,Amount,Currency,Category,Tag,Comment,Report Name,Reimbursable,Billable,Receipt URL\n\
2024-03-14 08:15:00,Blue Bottle,4.50,USD,Meals,,Team coffee,March,Yes,No,https://receipts/1\n\
2024-03-16 12:00:00,Lufthansa,\"€1,020.00\",EUR,Travel,Client A,,March,no,yes,\n";

/// Every expense carries the full field set, with exact amounts as strings.
#[test]
fn test_expense_shape() {
    let expenses = parse(EXPORT).unwrap();
    let json = serde_json::to_value(&expenses).unwrap();
    let first = &json[0];

    for key in [
        "date",
        "merchant",
        "amount",
        "currency",
        "category",
        "tag",
        "description",
        "report_name",
        "reimbursable",
        "billable",
        "receipt_url",
    ] {
        assert!(first.get(key).is_some(), "missing field {}", key);
    }
    assert!(first["amount"].is_string());
    assert!(first["reimbursable"].is_boolean());
    assert!(first["tag"].is_null());
    assert_eq!(first["date"], "2024-03-14T08:15:00");
    assert_eq!(json[1]["amount"], "1020.00");
}

/// Summary: count, exact total, sorted currency and category lists.
#[test]
fn test_summary_shape() {
    let expenses = parse(EXPORT).unwrap();
    let summary = serde_json::to_value(ExpenseSummary::from_records(&expenses).unwrap()).unwrap();

    assert_eq!(summary["total_expenses"], 2);
    assert_eq!(summary["total_amount"], "1024.50");
    assert_eq!(summary["currencies"], serde_json::json!(["EUR", "USD"]));
    assert_eq!(summary["categories"], serde_json::json!(["Meals", "Travel"]));
}

/// Error categories serialize in snake_case and carry distinct labels.
#[test]
fn test_error_categories() {
    let cases = [
        (Error::NotAuthenticated, "authentication", "Not logged in"),
        (Error::ExportNotFound { timeout_secs: 60 }, "timeout", "Timeout"),
        (
            Error::Bridge("Bot detection page shown".into()),
            "bot_detection",
            "Bot detection triggered",
        ),
        (Error::MalformedInput("bad".into()), "generic", "Export failed"),
    ];

    for (error, tag, label) in cases {
        let category: ErrorCategory = error.category();
        assert_eq!(serde_json::to_value(category).unwrap(), tag);
        assert_eq!(category.label(), label);
        assert!(!error.remediation().is_empty());
    }
}
