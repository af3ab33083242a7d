//! Configuration: target URLs, UI heuristics, timing budgets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Top-level heist configuration, persisted as `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeistConfig {
    /// HTTP port for the tool surface.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Protected page that lists reports.
    #[serde(default = "default_reports_path")]
    pub reports_path: String,
    #[serde(default = "default_signin_path")]
    pub signin_path: String,
    /// Case-insensitive URL fragments that mean "redirected to sign-in".
    #[serde(default = "default_login_markers")]
    pub login_markers: Vec<String>,
    /// Visible text of the export menu entry to activate.
    #[serde(default = "default_export_format")]
    pub export_format: String,
    /// Where the browser drops downloads. `None` uses the OS default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,
    /// Selection controls on a rendered list exceed this count
    /// (the filter bar alone stays at or below it).
    #[serde(default = "default_readiness_threshold")]
    pub readiness_threshold: u32,
    #[serde(default = "default_readiness_attempts")]
    pub readiness_attempts: u32,
    /// Newest download candidates inspected per scan.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,
    #[serde(default = "default_export_timeout")]
    pub export_timeout_secs: u64,
    #[serde(default)]
    pub timings: Timings,
    /// Path to config file (not serialized).
    #[serde(skip)]
    pub config_path: PathBuf,
}

/// Sleep intervals used by the polling loops and UI pauses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timings {
    /// Pause after navigating to the protected page, for redirects to land.
    #[serde(default = "default_session_settle")]
    pub session_settle_ms: u64,
    #[serde(default = "default_login_poll")]
    pub login_poll_ms: u64,
    #[serde(default = "default_readiness_poll")]
    pub readiness_poll_ms: u64,
    /// Pause after each click so the page's own scripts can react.
    #[serde(default = "default_ui_settle")]
    pub ui_settle_ms: u64,
    #[serde(default = "default_download_poll")]
    pub download_poll_ms: u64,
    /// Added to the elapsed export time to form the freshness window.
    #[serde(default = "default_freshness_grace")]
    pub freshness_grace_ms: u64,
}

fn default_port() -> u16 {
    3004
}
fn default_base_url() -> String {
    "https://www.expensify.com".into()
}
fn default_reports_path() -> String {
    "/reports".into()
}
fn default_signin_path() -> String {
    "/signin".into()
}
fn default_login_markers() -> Vec<String> {
    vec!["sign-in".into(), "signin".into()]
}
fn default_export_format() -> String {
    "Default CSV".into()
}
fn default_readiness_threshold() -> u32 {
    10
}
fn default_readiness_attempts() -> u32 {
    20
}
fn default_max_candidates() -> usize {
    10
}
fn default_login_timeout() -> u64 {
    120
}
fn default_export_timeout() -> u64 {
    60
}
fn default_session_settle() -> u64 {
    3000
}
fn default_login_poll() -> u64 {
    3000
}
fn default_readiness_poll() -> u64 {
    1000
}
fn default_ui_settle() -> u64 {
    500
}
fn default_download_poll() -> u64 {
    500
}
fn default_freshness_grace() -> u64 {
    5000
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            session_settle_ms: default_session_settle(),
            login_poll_ms: default_login_poll(),
            readiness_poll_ms: default_readiness_poll(),
            ui_settle_ms: default_ui_settle(),
            download_poll_ms: default_download_poll(),
            freshness_grace_ms: default_freshness_grace(),
        }
    }
}

impl Timings {
    pub fn session_settle(&self) -> Duration {
        Duration::from_millis(self.session_settle_ms)
    }

    pub fn login_poll(&self) -> Duration {
        Duration::from_millis(self.login_poll_ms)
    }

    pub fn readiness_poll(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_ms)
    }

    pub fn ui_settle(&self) -> Duration {
        Duration::from_millis(self.ui_settle_ms)
    }

    pub fn download_poll(&self) -> Duration {
        Duration::from_millis(self.download_poll_ms)
    }

    pub fn freshness_grace(&self) -> Duration {
        Duration::from_millis(self.freshness_grace_ms)
    }
}

impl Default for HeistConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            base_url: default_base_url(),
            reports_path: default_reports_path(),
            signin_path: default_signin_path(),
            login_markers: default_login_markers(),
            export_format: default_export_format(),
            downloads_dir: None,
            readiness_threshold: default_readiness_threshold(),
            readiness_attempts: default_readiness_attempts(),
            max_candidates: default_max_candidates(),
            login_timeout_secs: default_login_timeout(),
            export_timeout_secs: default_export_timeout(),
            timings: Timings::default(),
            config_path: PathBuf::new(),
        }
    }
}

impl HeistConfig {
    /// Load config from `config.json` in `config_dir`, or return defaults.
    pub fn load(config_dir: &Path) -> Self {
        let config_path = config_dir.join("config.json");
        let mut config: HeistConfig = match std::fs::read_to_string(&config_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring invalid {}: {}", config_path.display(), e);
                HeistConfig::default()
            }),
            Err(_) => HeistConfig::default(),
        };
        config.config_path = config_path;
        config
    }

    /// Load from `HEIST_CONFIG_DIR` (default `~/.config/heist`) and apply
    /// `HEIST_DOWNLOADS_DIR` / `PORT` overrides.
    pub fn from_env() -> Result<Self> {
        let config_dir = std::env::var("HEIST_CONFIG_DIR")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::config_dir().map(|d| d.join("heist")))
            .ok_or_else(|| Error::Config("cannot determine a config directory".into()))?;

        let mut config = Self::load(&config_dir);
        if let Ok(dir) = std::env::var("HEIST_DOWNLOADS_DIR") {
            config.downloads_dir = Some(PathBuf::from(dir));
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::Config(format!("invalid PORT: {}", port)))?;
        }
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.config_path, json)?;
        Ok(())
    }

    /// Protected page whose reachability proves an authenticated session.
    pub fn reports_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.reports_path)
    }

    pub fn signin_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.signin_path)
    }

    /// Whether `url` carries any sign-in marker (case-insensitive).
    pub fn is_login_url(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.login_markers
            .iter()
            .any(|m| lower.contains(&m.to_lowercase()))
    }

    /// Resolved downloads directory.
    pub fn downloads_dir(&self) -> PathBuf {
        self.downloads_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("Downloads"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HeistConfig::default();
        assert_eq!(config.reports_url(), "https://www.expensify.com/reports");
        assert_eq!(config.signin_url(), "https://www.expensify.com/signin");
        assert_eq!(config.readiness_attempts, 20);
        assert_eq!(config.timings.download_poll(), Duration::from_millis(500));
    }

    #[test]
    fn test_login_markers_case_insensitive() {
        let config = HeistConfig::default();
        assert!(config.is_login_url("https://www.expensify.com/SignIn?next=/reports"));
        assert!(config.is_login_url("https://www.expensify.com/sign-in"));
        assert!(!config.is_login_url("https://www.expensify.com/reports"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"export_format": "All Data - Expense Level Export", "timings": {"ui_settle_ms": 50}}"#,
        )
        .unwrap();

        let config = HeistConfig::load(dir.path());
        assert_eq!(config.export_format, "All Data - Expense Level Export");
        assert_eq!(config.timings.ui_settle_ms, 50);
        assert_eq!(config.timings.login_poll_ms, 3000);
        assert_eq!(config.port, 3004);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HeistConfig::load(&dir.path().join("nested"));
        config.downloads_dir = Some(PathBuf::from("/tmp/dl"));
        config.save().unwrap();

        let reloaded = HeistConfig::load(&dir.path().join("nested"));
        assert_eq!(reloaded.downloads_dir(), PathBuf::from("/tmp/dl"));
    }
}
