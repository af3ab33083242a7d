//! Browser side of the heist — drives an already-authenticated Safari tab.
//!
//! Every bounded wait goes through [`poll::Poll`]; every UI interaction is a
//! named [`steps::UiStep`] with a single clicked/not-found outcome, composed
//! by the [`orchestrator::ExportOrchestrator`] state machine.

pub mod bridge;
pub mod downloads;
pub mod orchestrator;
pub mod poll;
pub mod session;
pub mod steps;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{Bridge, SafariBridge};
pub use downloads::DownloadWatcher;
pub use orchestrator::ExportOrchestrator;
pub use poll::{Outcome, Poll};
pub use session::{LoginFlow, SessionProber};
pub use types::*;
