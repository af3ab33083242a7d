//! UI steps of the export flow, each a script with a single outcome.
//!
//! The selectors encode assumptions about the Expensify reports page. When
//! the page changes, only the affected step's script needs updating.

use heist_core::{Error, Result};
use tracing::debug;

use crate::bridge::Bridge;

/// Result string a step script returns after activating its control.
pub const CLICKED: &str = "clicked";

/// Counts selection controls; a rendered report list pushes this past the
/// handful the filter bar contributes.
pub const READINESS_SCRIPT: &str = r#"document.querySelectorAll("input[type=checkbox]").length"#;

/// One click-and-verify interaction with the reports page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiStep<'a> {
    /// Tick a report row: the one linking to `report_id`, else the first.
    SelectReport { report_id: Option<&'a str> },
    OpenExportMenu,
    /// Activate the export menu entry whose visible text equals `label`.
    ChooseFormat { label: &'a str },
}

impl UiStep<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectReport { .. } => "selecting_item",
            Self::OpenExportMenu => "opening_export_menu",
            Self::ChooseFormat { .. } => "selecting_format",
        }
    }

    fn missing(&self) -> String {
        match self {
            Self::SelectReport { report_id: None } => {
                "No report checkboxes found on the page".to_string()
            }
            Self::SelectReport {
                report_id: Some(id),
            } => format!("No report row found for report {}", id),
            Self::OpenExportMenu => "Export button not found".to_string(),
            Self::ChooseFormat { label } => {
                format!("{} option not found in dropdown", label)
            }
        }
    }

    pub fn script(&self) -> String {
        match self {
            Self::SelectReport { report_id: None } => r#"(function() {
    var checkbox = document.querySelector('input.reportstable_checkbox');
    if (checkbox) {
        checkbox.click();
        return 'clicked';
    }
    return 'not found';
})()"#
                .to_string(),
            Self::SelectReport {
                report_id: Some(id),
            } => format!(
                r#"(function() {{
    var id = {};
    var boxes = document.querySelectorAll('input.reportstable_checkbox');
    for (var i = 0; i < boxes.length; i++) {{
        var row = boxes[i].closest('tr');
        if (!row) continue;
        var links = row.querySelectorAll('a');
        for (var j = 0; j < links.length; j++) {{
            if ((links[j].getAttribute('href') || '').indexOf(id) !== -1) {{
                boxes[i].click();
                return 'clicked';
            }}
        }}
    }}
    return 'not found';
}})()"#,
                js_string(id)
            ),
            Self::OpenExportMenu => r#"(function() {
    var btn = document.getElementById('button_exportButton');
    if (btn) {
        btn.click();
        return 'clicked';
    }
    return 'not found';
})()"#
                .to_string(),
            Self::ChooseFormat { label } => format!(
                r#"(function() {{
    var label = {};
    var links = document.querySelectorAll('a');
    for (var i = 0; i < links.length; i++) {{
        if (links[i].textContent.trim() === label) {{
            links[i].click();
            return 'clicked';
        }}
    }}
    return 'not found';
}})()"#,
                js_string(label)
            ),
        }
    }

    /// Execute the step. Anything other than [`CLICKED`] is `ElementNotFound`.
    pub fn run(&self, bridge: &dyn Bridge) -> Result<()> {
        let reply = bridge.execute(&self.script())?;
        debug!("{} -> {:?}", self.name(), reply);
        if reply.trim() == CLICKED {
            Ok(())
        } else {
            Err(Error::ElementNotFound {
                step: self.name(),
                diagnostic: format!("{} (script returned {:?})", self.missing(), reply),
            })
        }
    }
}

/// Quote `raw` as a JavaScript string literal.
fn js_string(raw: &str) -> String {
    serde_json::Value::String(raw.to_string()).to_string()
}

/// Interpret the readiness script's numeric reply; garbage counts as zero.
pub fn parse_count(reply: &str) -> u32 {
    reply
        .trim()
        .parse::<f64>()
        .map(|v| if v.is_finite() && v > 0.0 { v as u32 } else { 0 })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBridge;

    #[test]
    fn test_clicked_reply() {
        let bridge = ScriptedBridge::new().on_script("button_exportButton", vec![Ok("clicked".into())]);
        assert!(UiStep::OpenExportMenu.run(&bridge).is_ok());
    }

    #[test]
    fn test_not_found_reply() {
        let bridge = ScriptedBridge::new().on_script("textContent", vec![Ok("not found".into())]);
        let err = UiStep::ChooseFormat { label: "Default CSV" }
            .run(&bridge)
            .unwrap_err();
        match err {
            Error::ElementNotFound { step, diagnostic } => {
                assert_eq!(step, "selecting_format");
                assert!(diagnostic.starts_with("Default CSV option not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bridge_failure_propagates() {
        let bridge = ScriptedBridge::new()
            .on_script("reportstable_checkbox", vec![Err("JavaScript disabled".into())]);
        let err = UiStep::SelectReport { report_id: None }
            .run(&bridge)
            .unwrap_err();
        assert!(matches!(err, Error::Bridge(_)));
    }

    #[test]
    fn test_report_id_is_quoted() {
        let script = UiStep::SelectReport {
            report_id: Some(r#"R1"; alert(1); ""#),
        }
        .script();
        assert!(script.contains(r#"var id = "R1\"; alert(1); \"";"#));
    }

    #[test]
    fn test_format_label_embedded() {
        let script = UiStep::ChooseFormat { label: "Default CSV" }.script();
        assert!(script.contains(r#"var label = "Default CSV";"#));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("42"), 42);
        assert_eq!(parse_count("12.0\n"), 12);
        assert_eq!(parse_count("missing value"), 0);
        assert_eq!(parse_count("-3"), 0);
    }
}
