//! Heist Core — error taxonomy, boundary classification, configuration.

pub mod config;
pub mod error;

pub use config::{HeistConfig, Timings};
pub use error::{Error, ErrorCategory, Result};
