use std::time::Duration;

use mediagen_core::retry::{RetryPolicy, DEFAULT_BACKOFF_BASE, DEFAULT_RETRY_DELAY};

/// Worker pool and execution settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum number of jobs executing at once (default: `2`).
    pub concurrency: usize,
    /// Delay between provider status polls (default: `5`s).
    pub poll_interval: Duration,
    /// Wall-clock budget for one attempt's polling (default: `300`s).
    pub max_wait: Duration,
    /// Base retry delay (default: `60`s).
    pub retry_delay: Duration,
    /// Exponential backoff base (default: `2`).
    pub backoff_base: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
            retry_delay: DEFAULT_RETRY_DELAY,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `WORKER_CONCURRENCY`       | `2`     |
    /// | `POLL_INTERVAL_SECS`       | `5`     |
    /// | `MAX_WAIT_SECS`            | `300`   |
    /// | `RETRY_DELAY_SECS`         | `60`    |
    /// | `EXPONENTIAL_BACKOFF_BASE` | `2`     |
    pub fn from_env() -> Self {
        let concurrency: usize = std::env::var("WORKER_CONCURRENCY")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("WORKER_CONCURRENCY must be a valid usize");
        assert!(concurrency > 0, "WORKER_CONCURRENCY must be at least 1");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let max_wait_secs: u64 = std::env::var("MAX_WAIT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("MAX_WAIT_SECS must be a valid u64");

        let retry_delay_secs: u64 = std::env::var("RETRY_DELAY_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("RETRY_DELAY_SECS must be a valid u64");

        let backoff_base: u32 = std::env::var("EXPONENTIAL_BACKOFF_BASE")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("EXPONENTIAL_BACKOFF_BASE must be a valid u32");

        Self {
            concurrency,
            poll_interval: Duration::from_secs(poll_interval_secs),
            max_wait: Duration::from_secs(max_wait_secs),
            retry_delay: Duration::from_secs(retry_delay_secs),
            backoff_base,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_delay, self.backoff_base)
    }
}
