//! Scripted in-memory bridge for unit tests.

use std::collections::VecDeque;

use heist_core::{Error, HeistConfig, Result, Timings};
use parking_lot::Mutex;

use crate::bridge::Bridge;

type Reply = std::result::Result<String, String>;

/// Replays canned replies. The last reply of each queue repeats forever.
#[derive(Default)]
pub struct ScriptedBridge {
    urls: Mutex<VecDeque<Reply>>,
    scripts: Mutex<Vec<(&'static str, VecDeque<Reply>)>>,
    fail_navigation: bool,
    fail_close: bool,
    pub navigations: Mutex<Vec<String>>,
    pub executed: Mutex<Vec<String>>,
    pub closed: Mutex<usize>,
}

impl ScriptedBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn urls(self, urls: &[&str]) -> Self {
        *self.urls.lock() = urls.iter().map(|u| Ok(u.to_string())).collect();
        self
    }

    pub fn url_replies(self, replies: Vec<Reply>) -> Self {
        *self.urls.lock() = replies.into();
        self
    }

    /// Reply to any script containing `marker`.
    pub fn on_script(self, marker: &'static str, replies: Vec<Reply>) -> Self {
        self.scripts.lock().push((marker, replies.into()));
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn closed_count(&self) -> usize {
        *self.closed.lock()
    }

    fn next(queue: &mut VecDeque<Reply>) -> Option<Reply> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Bridge for ScriptedBridge {
    fn execute(&self, script: &str) -> Result<String> {
        self.executed.lock().push(script.to_string());
        let mut scripts = self.scripts.lock();
        let reply = scripts
            .iter_mut()
            .find(|(marker, _)| script.contains(marker))
            .and_then(|(_, queue)| Self::next(queue))
            .unwrap_or_else(|| Err("no scripted reply".to_string()));
        reply.map_err(Error::Bridge)
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.lock().push(url.to_string());
        if self.fail_navigation {
            return Err(Error::Bridge("navigation refused".into()));
        }
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        let mut urls = self.urls.lock();
        Self::next(&mut urls)
            .unwrap_or_else(|| Err("no window".to_string()))
            .map_err(Error::Bridge)
    }

    fn close_active_tab(&self) -> Result<()> {
        *self.closed.lock() += 1;
        if self.fail_close {
            return Err(Error::Bridge("tab already closed".into()));
        }
        Ok(())
    }
}

/// Config with millisecond timings.
pub fn fast_config() -> HeistConfig {
    HeistConfig {
        timings: Timings {
            session_settle_ms: 0,
            login_poll_ms: 1,
            readiness_poll_ms: 1,
            ui_settle_ms: 0,
            download_poll_ms: 1,
            freshness_grace_ms: 5000,
        },
        ..HeistConfig::default()
    }
}
