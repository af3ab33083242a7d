//! Automation bridge — runs scripts inside the active browser tab.

use std::path::PathBuf;
use std::process::Command;

use heist_core::{Error, Result};
use tracing::debug;

/// Commands the heist issues to the browser's active tab.
///
/// Implementations are driven by one orchestration at a time; callers
/// serialize their own operations.
pub trait Bridge: Send + Sync {
    /// Run a JavaScript snippet in the active tab and return its result as text.
    fn execute(&self, script: &str) -> Result<String>;

    /// Point the active tab at `url`.
    fn navigate(&self, url: &str) -> Result<()>;

    /// URL currently shown in the active tab.
    fn current_url(&self) -> Result<String>;

    /// Close the active tab. Callers treat failure as best-effort.
    fn close_active_tab(&self) -> Result<()>;
}

/// Safari driven through AppleScript (`osascript -e`).
pub struct SafariBridge {
    program: PathBuf,
}

impl Default for SafariBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl SafariBridge {
    pub fn new() -> Self {
        Self::with_program("osascript")
    }

    /// Use a different AppleScript runner (mainly for tests).
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run_applescript(&self, script: &str) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|e| Error::Bridge(format!("failed to run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            return Err(Error::Bridge(format!(
                "AppleScript error: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Bring Safari forward, opening a window if none exists.
    fn ensure_window(&self) -> Result<()> {
        self.run_applescript(
            r#"tell application "Safari"
    activate
    if (count of windows) = 0 then
        make new document
    end if
end tell"#,
        )
        .map(|_| ())
    }
}

impl Bridge for SafariBridge {
    fn execute(&self, script: &str) -> Result<String> {
        debug!("Safari execute ({} bytes)", script.len());
        self.run_applescript(&format!(
            "tell application \"Safari\"\n    do JavaScript \"{}\" in current tab of window 1\nend tell",
            escape_applescript(script)
        ))
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_window()?;
        debug!("Safari navigate: {}", url);
        self.run_applescript(&format!(
            "tell application \"Safari\"\n    activate\n    set URL of current tab of window 1 to \"{}\"\nend tell",
            escape_applescript(url)
        ))
        .map(|_| ())
    }

    fn current_url(&self) -> Result<String> {
        self.run_applescript("tell application \"Safari\"\n    get URL of current tab of window 1\nend tell")
    }

    fn close_active_tab(&self) -> Result<()> {
        self.run_applescript("tell application \"Safari\"\n    close current tab of window 1\nend tell")
            .map(|_| ())
    }
}

/// Escape text for embedding inside an AppleScript string literal.
pub fn escape_applescript(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
