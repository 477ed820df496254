//! Configuration for the mock reporter.
//!
//! The defaults reproduce the behaviour tests expect from the reporter: a
//! ten-second overall deadline for blocking waits and a 10 ms re-check slice.

use std::time::Duration;

use crate::errors::{Result, TopSqlError};

/// Default overall deadline for [`wait_collect_cnt`] and the retrying query.
///
/// [`wait_collect_cnt`]: crate::MockTopSqlReporter::wait_collect_cnt
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound on a single sleep before the counter is re-checked.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables for [`MockTopSqlReporter`](crate::MockTopSqlReporter).
///
/// # Default Configuration
///
/// ```rust
/// use std::time::Duration;
/// use topsql_mock::ReporterConfig;
///
/// let config = ReporterConfig::default();
/// assert_eq!(config.wait_timeout, Duration::from_secs(10));
/// assert_eq!(config.poll_interval, Duration::from_millis(10));
/// assert_eq!(config.expected_statements, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReporterConfig {
    /// Overall deadline of every blocking operation.
    ///
    /// **Default:** 10 seconds
    ///
    /// There is no external cancellation; this deadline is the only way a
    /// wait ends without its condition becoming true.
    pub wait_timeout: Duration,

    /// Longest single sleep on the collect signal before re-checking.
    ///
    /// **Default:** 10 milliseconds
    ///
    /// Waiters are woken on every `collect`, so this only bounds how stale a
    /// waiter can be if a wakeup is missed by the platform.
    pub poll_interval: Duration,

    /// Capacity hint for the statement stats map.
    ///
    /// **Default:** `0`
    pub expected_statements: usize,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            expected_statements: 0,
        }
    }
}

impl ReporterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_expected_statements(mut self, statements: usize) -> Self {
        self.expected_statements = statements;
        self
    }

    /// Reject values the blocking waits cannot work with.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use topsql_mock::ReporterConfig;
    ///
    /// let bad = ReporterConfig::default().with_wait_timeout(Duration::ZERO);
    /// assert!(bad.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.wait_timeout.is_zero() {
            return Err(TopSqlError::invalid_config("wait_timeout must be non-zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(TopSqlError::invalid_config("poll_interval must be non-zero"));
        }
        if self.poll_interval > self.wait_timeout {
            return Err(TopSqlError::invalid_config(format!(
                "poll_interval {:?} exceeds wait_timeout {:?}",
                self.poll_interval, self.wait_timeout
            )));
        }
        Ok(())
    }
}
