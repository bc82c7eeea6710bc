use std::time::Duration;

use super::QueryKey;

/// Data younger than this is served from cache without refetching.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Unobserved entries are evicted after this long without use.
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(10 * 60);

/// Initial backoff before a retry, doubled per attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for retry backoff.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Read policy. Every knob may be overridden per call site.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub cache_time: Duration,
    pub retry: u32,
    pub retry_delay: Duration,
    pub enabled: bool,
    /// Recorded policy only. Nothing in this crate reacts to focus or
    /// connectivity events, so these two flags are never read here.
    pub refetch_on_window_focus: bool,
    pub refetch_on_reconnect: bool,
    /// Refetch when a new consumer mounts even if the data is fresh.
    pub refetch_on_mount: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            cache_time: DEFAULT_CACHE_TIME,
            retry: 1,
            retry_delay: DEFAULT_RETRY_DELAY,
            enabled: true,
            refetch_on_window_focus: false,
            refetch_on_reconnect: false,
            refetch_on_mount: false,
        }
    }
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time = cache_time;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn refetch_on_mount(mut self, refetch: bool) -> Self {
        self.refetch_on_mount = refetch;
        self
    }

    /// Enable the query only if every prerequisite id is present and non-empty.
    pub fn requires<S: AsRef<str>>(mut self, ids: &[Option<S>]) -> Self {
        let satisfied = ids
            .iter()
            .all(|id| id.as_ref().map(|s| !s.as_ref().is_empty()).unwrap_or(false));
        self.enabled = self.enabled && satisfied;
        self
    }
}

/// Write policy. Writes are not retried unless asked to.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOptions {
    pub retry: u32,
    pub retry_delay: Duration,
    /// Key prefixes marked stale after the write succeeds.
    pub invalidates: Vec<QueryKey>,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            retry: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            invalidates: Vec::new(),
        }
    }
}

impl MutationOptions {
    pub fn invalidates(mut self, key: QueryKey) -> Self {
        self.invalidates.push(key);
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = QueryOptions::default();
        assert_eq!(options.stale_time, Duration::from_secs(300));
        assert_eq!(options.cache_time, Duration::from_secs(600));
        assert_eq!(options.retry, 1);
        assert!(options.enabled);
        assert!(!options.refetch_on_window_focus);
        assert!(!options.refetch_on_reconnect);
        assert!(!options.refetch_on_mount);
        assert_eq!(MutationOptions::default().retry, 0);
    }

    #[test]
    fn test_requires_gates_on_missing_ids() {
        let church: Option<String> = None;
        assert!(!QueryOptions::default().requires(&[church.as_deref()]).enabled);
        assert!(!QueryOptions::default().requires(&[Some("")]).enabled);
        assert!(QueryOptions::default().requires(&[Some("c1"), Some("t1")]).enabled);
        assert!(!QueryOptions::default().requires(&[Some("c1"), None]).enabled);
        assert!(!QueryOptions::default().enabled(false).requires(&[Some("c1")]).enabled);
    }
}
