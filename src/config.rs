//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the workbench runtime.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no semaphore created)
//! - `command_timeout = 0s` → commands run until completion or cancellation
//! - `keep_finished = 0` → finished task records are dropped on the next dispatch

use std::time::Duration;

/// Global configuration for the workbench runtime.
///
/// ## Field semantics
/// - `grace`: how long shutdown waits for outstanding tasks after `ClosingWorkspace`
/// - `max_concurrent`: cap on concurrently running commands (`0` = unlimited)
/// - `command_timeout`: per-command execution timeout (`0s` = no timeout)
/// - `keep_finished`: how many finished task records the dispatcher retains
///
/// All fields are public. Prefer the helper accessors over checking the `0`
/// sentinels directly.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for tasks to reach a terminal state on shutdown.
    ///
    /// If exceeded, shutdown returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Maximum number of commands executing at the same time.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = extra tasks stay `queued` until a slot frees up
    pub max_concurrent: usize,

    /// Per-command execution timeout.
    ///
    /// A command exceeding it ends `failed` with a timeout reason.
    pub command_timeout: Duration,

    /// Number of finished task records kept for status queries.
    ///
    /// Older ones are dropped, lowest id first, when a new command is dispatched.
    pub keep_finished: usize,
}

impl Config {
    /// Returns the command concurrency limit as an `Option`.
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the per-command timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.command_timeout == Duration::ZERO {
            None
        } else {
            Some(self.command_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 60s`
    /// - `max_concurrent = 0` (unlimited)
    /// - `command_timeout = 0s` (no timeout)
    /// - `keep_finished = 1024`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            max_concurrent: 0,
            command_timeout: Duration::ZERO,
            keep_finished: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels_map_to_none() {
        let cfg = Config::default();
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.default_timeout(), None);

        let cfg = Config {
            max_concurrent: 4,
            command_timeout: Duration::from_secs(3),
            ..Config::default()
        };
        assert_eq!(cfg.concurrency_limit(), Some(4));
        assert_eq!(cfg.default_timeout(), Some(Duration::from_secs(3)));
    }
}
