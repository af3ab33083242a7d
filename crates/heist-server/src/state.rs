//! Shared application state.

use std::sync::Arc;

use heist_browser::Bridge;
use heist_core::HeistConfig;
use tokio::sync::Mutex;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: HeistConfig,
    pub bridge: Arc<dyn Bridge>,
    /// Held for the whole of a tool call: the browser tab admits one
    /// orchestration at a time.
    pub tool_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: HeistConfig, bridge: Arc<dyn Bridge>) -> Self {
        Self {
            config,
            bridge,
            tool_lock: Mutex::new(()),
        }
    }
}
