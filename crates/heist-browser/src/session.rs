//! Session probing and the interactive login flow.

use std::time::{Duration, Instant};

use heist_core::{HeistConfig, Result};
use tracing::{debug, info, warn};

use crate::bridge::Bridge;
use crate::poll::{deadline_after, Outcome, Poll};

/// Decides whether the browser holds a valid session by visiting a
/// protected page and checking where the site left us.
pub struct SessionProber<'a> {
    bridge: &'a dyn Bridge,
    config: &'a HeistConfig,
}

impl<'a> SessionProber<'a> {
    pub fn new(bridge: &'a dyn Bridge, config: &'a HeistConfig) -> Self {
        Self { bridge, config }
    }

    /// Probe the session. Bridge failures degrade to "not logged in".
    pub fn probe(&self) -> Outcome<bool> {
        match self.try_probe() {
            Ok(logged_in) => Outcome::Ok(logged_in),
            Err(e) => {
                debug!("Session probe failed, assuming signed out: {}", e);
                Outcome::Degraded {
                    value: false,
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.probe().value().unwrap_or(false)
    }

    fn try_probe(&self) -> Result<bool> {
        self.bridge.navigate(&self.config.reports_url())?;
        std::thread::sleep(self.config.timings.session_settle());
        let url = self.bridge.current_url()?;
        Ok(is_session_url(self.config, &url))
    }
}

/// The tab still shows the protected page and was not bounced to sign-in.
pub fn is_session_url(config: &HeistConfig, url: &str) -> bool {
    url.contains(&config.reports_path) && !config.is_login_url(url)
}

/// Sends the user to the sign-in page and waits for them to finish.
pub struct LoginFlow<'a> {
    prober: SessionProber<'a>,
    bridge: &'a dyn Bridge,
    config: &'a HeistConfig,
}

impl<'a> LoginFlow<'a> {
    pub fn new(bridge: &'a dyn Bridge, config: &'a HeistConfig) -> Self {
        Self {
            prober: SessionProber::new(bridge, config),
            bridge,
            config,
        }
    }

    /// `Ok(())` once logged in, `Timeout` if `timeout` elapses first.
    /// Only a failure to open the sign-in page is `Fatal`.
    pub fn login(&self, timeout: Duration) -> Outcome<()> {
        let deadline = deadline_after(Instant::now(), timeout);

        if self.prober.is_logged_in() {
            info!("Session already valid, skipping login");
            return Outcome::Ok(());
        }

        if let Err(e) = self.bridge.navigate(&self.config.signin_url()) {
            return Outcome::Fatal(e);
        }
        info!("Please log in to Expensify in Safari ({}s budget)", timeout.as_secs());

        let outcome = Poll::every(self.config.timings.login_poll())
            .until(deadline)
            .settle_first()
            .run(|attempt| match self.bridge.current_url() {
                Ok(url) if !self.config.is_login_url(&url) => {
                    self.prober.is_logged_in().then_some(())
                }
                Ok(_) => None,
                Err(e) => {
                    debug!("Login poll {}: ignoring bridge error: {}", attempt, e);
                    None
                }
            });

        match &outcome {
            Outcome::Ok(()) => info!("Login successful"),
            Outcome::Timeout => warn!("Login timed out"),
            _ => {}
        }
        outcome
    }
}
