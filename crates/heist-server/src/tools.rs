//! Tool catalogue and dispatch, shared by the HTTP surface and the CLI.
//!
//! Every call returns a JSON value; failures become structured error
//! objects instead of propagating.

use std::time::Duration;

use heist_browser::{Bridge, ExportOrchestrator, ExportRequest, LoginFlow, Outcome};
use heist_core::{Error, HeistConfig, Result};
use heist_ingest::{ExpenseRecord, ExpenseSummary};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

pub const LOGIN_TOOL: &str = "expensify_login";
pub const EXPORT_TOOL: &str = "expensify_web_export";

// ---------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoginArgs {
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportArgs {
    pub report_id: Option<String>,
    #[serde(alias = "timeout_seconds")]
    pub timeout: Option<u64>,
}

// ---------------------------------------------------------------
// Responses
// ---------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ExportPayload {
    pub report_name: String,
    pub expenses: Vec<ExpenseRecord>,
    pub summary: ExpenseSummary,
}

impl ExportPayload {
    pub fn new(report_name: impl Into<String>, expenses: Vec<ExpenseRecord>) -> Result<Self> {
        let summary = ExpenseSummary::from_records(&expenses)?;
        Ok(Self {
            report_name: report_name.into(),
            expenses,
            summary,
        })
    }
}

/// Boundary form of an error: category label, remediation hint, and the
/// raw diagnostic for debugging.
pub fn error_json(e: &Error) -> Value {
    let category = e.category();
    json!({
        "error": category.label(),
        "category": category,
        "message": e.remediation(),
        "details": e.to_string(),
    })
}

pub fn catalogue() -> Value {
    json!([
        {
            "name": LOGIN_TOOL,
            "description": "Open Safari on the Expensify sign-in page and wait for you to log in. Required before expensify_web_export.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "timeout_seconds": {
                        "type": "integer",
                        "description": "How long to wait for the login to complete. Default is 120."
                    }
                }
            }
        },
        {
            "name": EXPORT_TOOL,
            "description": "Export expenses from Expensify through the logged-in Safari session. Returns parsed expense data.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "report_id": {
                        "type": "string",
                        "description": "Optional: specific report ID to export. If not provided, exports the first listed report."
                    },
                    "timeout": {
                        "type": "integer",
                        "description": "Timeout in seconds for the download. Default is 60."
                    }
                }
            }
        }
    ])
}

// ---------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------

/// Run tool `name` with JSON `args`. Blocking; callers serialize calls.
pub fn call(name: &str, args: Value, bridge: &dyn Bridge, config: &HeistConfig) -> Value {
    let args = if args.is_null() { json!({}) } else { args };
    info!("Tool call: {}", name);

    match name {
        LOGIN_TOOL => match serde_json::from_value(args) {
            Ok(args) => login(bridge, config, &args),
            Err(e) => invalid_args(e),
        },
        EXPORT_TOOL => match serde_json::from_value(args) {
            Ok(args) => export(bridge, config, &args),
            Err(e) => invalid_args(e),
        },
        _ => json!({ "error": format!("Unknown tool: {}", name) }),
    }
}

fn invalid_args(e: serde_json::Error) -> Value {
    json!({ "error": format!("Invalid arguments: {}", e) })
}

pub fn login(bridge: &dyn Bridge, config: &HeistConfig, args: &LoginArgs) -> Value {
    let timeout = Duration::from_secs(args.timeout_seconds.unwrap_or(config.login_timeout_secs));

    match LoginFlow::new(bridge, config).login(timeout) {
        Outcome::Ok(()) | Outcome::Degraded { .. } => json!({
            "status": "success",
            "message": "Successfully logged in to Expensify",
        }),
        Outcome::Timeout => json!({
            "status": "timeout",
            "message": "Login timed out. Please try again.",
        }),
        Outcome::Fatal(e) => {
            warn!("Login failed: {}", e);
            error_json(&e)
        }
    }
}

pub fn export(bridge: &dyn Bridge, config: &HeistConfig, args: &ExportArgs) -> Value {
    let timeout = Duration::from_secs(args.timeout.unwrap_or(config.export_timeout_secs));
    let mut request = ExportRequest::new(timeout);
    if let Some(id) = args.report_id.as_deref().filter(|id| !id.is_empty()) {
        request = request.with_report(id);
    }

    let result = ExportOrchestrator::new(bridge, config)
        .export(&request)
        .and_then(|export| {
            let expenses = heist_ingest::parse(&export.content)?;
            ExportPayload::new(export.report_name, expenses)
        });

    match result.and_then(|payload| Ok(serde_json::to_value(payload)?)) {
        Ok(value) => value,
        Err(e) => error_json(&e),
    }
}
