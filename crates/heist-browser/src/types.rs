//! Export orchestration types.

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use crate::poll::deadline_after;

/// Phases of one export attempt, in strict forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Navigating,
    AwaitingPageReady,
    AuthCheck,
    SelectingItem,
    OpeningExportMenu,
    SelectingFormat,
    AwaitingDownload,
    Done,
    Failed,
}

impl Phase {
    /// The phase that follows a successful step. Terminal phases stay put.
    pub fn next(self) -> Self {
        match self {
            Self::Navigating => Self::AwaitingPageReady,
            Self::AwaitingPageReady => Self::AuthCheck,
            Self::AuthCheck => Self::SelectingItem,
            Self::SelectingItem => Self::OpeningExportMenu,
            Self::OpeningExportMenu => Self::SelectingFormat,
            Self::SelectingFormat => Self::AwaitingDownload,
            Self::AwaitingDownload => Self::Done,
            Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Ending in (or failing at) this phase closes the tab afterwards.
    pub fn closes_tab(self) -> bool {
        matches!(
            self,
            Self::OpeningExportMenu | Self::SelectingFormat | Self::AwaitingDownload | Self::Done
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Navigating => "navigating",
            Self::AwaitingPageReady => "awaiting_page_ready",
            Self::AuthCheck => "auth_check",
            Self::SelectingItem => "selecting_item",
            Self::OpeningExportMenu => "opening_export_menu",
            Self::SelectingFormat => "selecting_format",
            Self::AwaitingDownload => "awaiting_download",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Time anchor of the export: downloads must be newer than `since`, and the
/// download wait ends at `started + timeout`.
#[derive(Debug, Clone, Copy)]
pub struct ExportClock {
    pub started: Instant,
    pub since: SystemTime,
}

impl ExportClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            since: SystemTime::now(),
        }
    }

    pub fn deadline(&self, timeout: Duration) -> Instant {
        deadline_after(self.started, timeout)
    }
}

/// Ephemeral state of one export attempt. Never shared between attempts.
#[derive(Debug, Clone)]
pub struct OrchestrationState {
    pub phase: Phase,
    /// Every phase entered so far, in order.
    pub history: Vec<Phase>,
    pub clock: Option<ExportClock>,
    pub export_file: Option<PathBuf>,
    /// Phase that was active when the attempt failed.
    pub failed_at: Option<Phase>,
}

impl Default for OrchestrationState {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestrationState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Navigating,
            history: vec![Phase::Navigating],
            clock: None,
            export_file: None,
            failed_at: None,
        }
    }

    pub fn advance(&mut self) {
        self.enter(self.phase.next());
    }

    pub fn fail(&mut self) {
        self.failed_at = Some(self.phase);
        self.enter(Phase::Failed);
    }

    fn enter(&mut self, phase: Phase) {
        if phase != self.phase {
            self.phase = phase;
            self.history.push(phase);
        }
    }
}

/// What one export call asks for.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub report_id: Option<String>,
    pub timeout: Duration,
}

impl ExportRequest {
    pub fn new(timeout: Duration) -> Self {
        Self {
            report_id: None,
            timeout,
        }
    }

    pub fn with_report(mut self, report_id: impl Into<String>) -> Self {
        self.report_id = Some(report_id.into());
        self
    }
}

/// Raw export text plus the label derived from the downloaded file name.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub content: String,
    pub report_name: String,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_order() {
        let mut state = OrchestrationState::new();
        while !state.phase.is_terminal() {
            state.advance();
        }
        assert_eq!(
            state.history,
            vec![
                Phase::Navigating,
                Phase::AwaitingPageReady,
                Phase::AuthCheck,
                Phase::SelectingItem,
                Phase::OpeningExportMenu,
                Phase::SelectingFormat,
                Phase::AwaitingDownload,
                Phase::Done,
            ]
        );
    }

    #[test]
    fn test_fail_records_phase() {
        let mut state = OrchestrationState::new();
        state.advance();
        state.fail();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.failed_at, Some(Phase::AwaitingPageReady));
        state.advance();
        assert_eq!(state.phase, Phase::Failed);
    }

    #[test]
    fn test_deadline_survives_huge_timeout() {
        let clock = ExportClock::start();
        assert_eq!(
            clock.deadline(Duration::from_secs(60)),
            clock.started + Duration::from_secs(60)
        );
        assert!(clock.deadline(Duration::from_secs(u64::MAX)) > clock.started);
    }

    #[test]
    fn test_cleanup_phases() {
        assert!(!Phase::AwaitingPageReady.closes_tab());
        assert!(!Phase::SelectingItem.closes_tab());
        assert!(Phase::OpeningExportMenu.closes_tab());
        assert!(Phase::Done.closes_tab());
    }
}
