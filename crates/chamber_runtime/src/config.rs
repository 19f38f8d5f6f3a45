//! Run-wide configuration.

/// Default reordering window per worker thread
pub const UNSORTED_LIMIT_PER_THREAD: usize = 100;

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Zero worker threads requested
    #[error("thread count must be at least 1")]
    NoThreads,

    /// Window too small to let every worker make progress
    #[error("unsorted limit {limit} must be at least the thread count {threads}")]
    WindowTooSmall {
        /// Configured window
        limit: usize,
        /// Configured threads
        threads: usize,
    },
}

/// Run configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Default worker count for stages without `* N`
    pub threads: usize,
    /// Reordering window size per processor
    pub unsorted_limit: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            unsorted_limit: UNSORTED_LIMIT_PER_THREAD,
        }
    }
}

impl RunConfig {
    /// Set the default thread count, rescaling the window to match
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self.unsorted_limit = threads.saturating_mul(UNSORTED_LIMIT_PER_THREAD);
        self
    }

    /// Set the window size explicitly
    #[must_use]
    pub fn with_unsorted_limit(mut self, limit: usize) -> Self {
        self.unsorted_limit = limit;
        self
    }

    /// Window used by a processor running `workers` workers
    ///
    /// Statements may ask for more workers than the run-wide default, so
    /// the window never drops below the worker count.
    #[must_use]
    pub fn window_for(&self, workers: usize) -> usize {
        self.unsorted_limit.max(workers)
    }

    /// Check the configuration
    ///
    /// # Errors
    ///
    /// Returns error if no worker could run or the window is too small
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if self.unsorted_limit < self.threads {
            return Err(ConfigError::WindowTooSmall {
                limit: self.unsorted_limit,
                threads: self.threads,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RunConfig::default();
        assert_eq!(config.threads, 1);
        assert_eq!(config.unsorted_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_with_threads_scales_window() {
        let config = RunConfig::default().with_threads(4);
        assert_eq!(config.unsorted_limit, 400);

        let config = config.with_unsorted_limit(8);
        assert_eq!(config.unsorted_limit, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(RunConfig::default().with_threads(0).validate(), Err(ConfigError::NoThreads));
        assert_eq!(
            RunConfig::default().with_threads(4).with_unsorted_limit(3).validate(),
            Err(ConfigError::WindowTooSmall { limit: 3, threads: 4 })
        );
    }

    #[test]
    fn test_window_for() {
        let config = RunConfig::default().with_unsorted_limit(4);
        assert_eq!(config.window_for(2), 4);
        assert_eq!(config.window_for(16), 16);
    }
}
