//! Bounded polling and explicit outcomes for advisory operations.

use std::time::{Duration, Instant};

use heist_core::{Error, Result};

/// Outcome of an operation that may intentionally absorb failures.
///
/// `Degraded` marks a path where an underlying error was swallowed and a
/// fallback value substituted; callers that only want the value use
/// [`Outcome::value`].
#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    Degraded { value: T, reason: String },
    Timeout,
    Fatal(Error),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// The value, whether genuine or degraded.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Ok(v) | Self::Degraded { value: v, .. } => Some(v),
            Self::Timeout | Self::Fatal(_) => None,
        }
    }

    /// Convert to a `Result`, producing `on_timeout` for the timeout case.
    pub fn into_result(self, on_timeout: impl FnOnce() -> Error) -> Result<T> {
        match self {
            Self::Ok(v) | Self::Degraded { value: v, .. } => Ok(v),
            Self::Timeout => Err(on_timeout()),
            Self::Fatal(e) => Err(e),
        }
    }
}

/// Stand-in deadline for timeouts too large to add to an `Instant` (~100 years).
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// `start + timeout`, clamped instead of overflowing for huge timeouts.
pub fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

/// A sleep-then-check loop bounded by a wall-clock deadline and/or an
/// attempt count, both fixed when the poll is built.
#[derive(Debug, Clone)]
pub struct Poll {
    interval: Duration,
    deadline: Option<Instant>,
    max_attempts: Option<u32>,
    settle_first: bool,
}

impl Poll {
    /// Check, then sleep `interval`, until the budget runs out.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            max_attempts: None,
            settle_first: false,
        }
    }

    pub fn until(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Sleep before each check instead of after it.
    pub fn settle_first(mut self) -> Self {
        self.settle_first = true;
        self
    }

    fn exhausted(&self, attempts: u32) -> bool {
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Run `probe` (given the 1-based attempt number) until it yields a value
    /// or the budget is exhausted.
    pub fn run<T>(&self, mut probe: impl FnMut(u32) -> Option<T>) -> Outcome<T> {
        let mut attempts = 0;
        loop {
            if self.exhausted(attempts) {
                return Outcome::Timeout;
            }
            attempts += 1;
            if self.settle_first {
                std::thread::sleep(self.interval);
            }
            if let Some(value) = probe(attempts) {
                return Outcome::Ok(value);
            }
            if !self.settle_first {
                std::thread::sleep(self.interval);
            }
        }
    }
}
