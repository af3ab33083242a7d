//! Export orchestrator — drives the reports page through the export menu
//! and waits for the resulting download.

use heist_core::{Error, HeistConfig, Result};
use tracing::{debug, info, warn};

use crate::bridge::Bridge;
use crate::downloads::DownloadWatcher;
use crate::poll::Poll;
use crate::steps::{parse_count, UiStep, READINESS_SCRIPT};
use crate::types::*;

/// Runs one export attempt at a time against the active tab.
pub struct ExportOrchestrator<'a> {
    bridge: &'a dyn Bridge,
    config: &'a HeistConfig,
    watcher: DownloadWatcher,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(bridge: &'a dyn Bridge, config: &'a HeistConfig) -> Self {
        Self {
            bridge,
            config,
            watcher: DownloadWatcher::from_config(config),
        }
    }

    pub fn with_watcher(mut self, watcher: DownloadWatcher) -> Self {
        self.watcher = watcher;
        self
    }

    /// Run a full export attempt with fresh state.
    pub fn export(&self, request: &ExportRequest) -> Result<ExportResult> {
        let mut state = OrchestrationState::new();
        self.run(request, &mut state)
    }

    /// Run an export attempt, leaving the final state in `state`.
    ///
    /// The tab is closed after `Done` or after a failure from the export
    /// menu onwards; a close failure never replaces the primary outcome.
    /// A state that is already `Done` or `Failed` is rejected untouched.
    pub fn run(&self, request: &ExportRequest, state: &mut OrchestrationState) -> Result<ExportResult> {
        if state.phase.is_terminal() {
            return Err(Error::AttemptFinished {
                phase: state.phase.name(),
            });
        }

        let result = self.drive(request, state);
        let last_phase = match &result {
            Ok(_) => state.phase,
            Err(e) => {
                warn!("Export failed in {}: {}", state.phase, e);
                let phase = state.phase;
                state.fail();
                phase
            }
        };

        if last_phase.closes_tab() {
            if let Err(e) = self.bridge.close_active_tab() {
                debug!("Ignoring tab close failure: {}", e);
            }
        }
        result
    }

    fn drive(&self, request: &ExportRequest, state: &mut OrchestrationState) -> Result<ExportResult> {
        loop {
            info!("Export phase: {}", state.phase);
            match state.phase {
                Phase::Navigating => self.bridge.navigate(&self.config.reports_url())?,
                Phase::AwaitingPageReady => self.await_page_ready()?,
                Phase::AuthCheck => {
                    let url = self.bridge.current_url()?;
                    if self.config.is_login_url(&url) {
                        return Err(Error::NotAuthenticated);
                    }
                    state.clock = Some(ExportClock::start());
                }
                Phase::SelectingItem => self.click(UiStep::SelectReport {
                    report_id: request.report_id.as_deref(),
                })?,
                Phase::OpeningExportMenu => self.click(UiStep::OpenExportMenu)?,
                Phase::SelectingFormat => self.click(UiStep::ChooseFormat {
                    label: &self.config.export_format,
                })?,
                Phase::AwaitingDownload => {
                    let clock = state.clock.unwrap_or_else(ExportClock::start);
                    let path = self
                        .watcher
                        .await_export(clock.since, clock.deadline(request.timeout))
                        .ok_or(Error::ExportNotFound {
                            timeout_secs: request.timeout.as_secs(),
                        })?;
                    state.export_file = Some(path);
                }
                Phase::Done => {
                    let path = state
                        .export_file
                        .clone()
                        .ok_or(Error::ExportNotFound {
                            timeout_secs: request.timeout.as_secs(),
                        })?;
                    let content = std::fs::read_to_string(&path)?;
                    let report_name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    info!("Export complete: {} ({} bytes)", report_name, content.len());
                    return Ok(ExportResult {
                        content,
                        report_name,
                        path,
                    });
                }
                Phase::Failed => {
                    return Err(Error::AttemptFinished {
                        phase: state.phase.name(),
                    });
                }
            }
            state.advance();
        }
    }

    /// Wait for the report list to render: the selection-control count must
    /// exceed the configured threshold within the attempt budget.
    fn await_page_ready(&self) -> Result<()> {
        let threshold = self.config.readiness_threshold;
        let attempts = self.config.readiness_attempts;

        Poll::every(self.config.timings.readiness_poll())
            .attempts(attempts)
            .settle_first()
            .run(|attempt| match self.bridge.execute(READINESS_SCRIPT) {
                Ok(reply) => {
                    let count = parse_count(&reply);
                    debug!("Readiness check {}: {} controls", attempt, count);
                    (count > threshold).then_some(())
                }
                Err(e) => {
                    debug!("Readiness check {}: ignoring bridge error: {}", attempt, e);
                    None
                }
            })
            .into_result(|| Error::PageNotReady { attempts })
    }

    fn click(&self, step: UiStep<'_>) -> Result<()> {
        step.run(self.bridge)?;
        std::thread::sleep(self.config.timings.ui_settle());
        Ok(())
    }
}
