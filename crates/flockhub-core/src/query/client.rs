use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::options::MAX_RETRY_DELAY;
use super::result::{downcast, AnyValue, QueryObserver, QueryResult, QueryStatus, Snapshot};
use super::{MutationOptions, QueryKey, QueryOptions};
use crate::api::ApiError;

#[derive(Clone)]
struct Fetched {
    value: AnyValue,
    updated_at: DateTime<Utc>,
}

type FetchOutcome = Result<Fetched, Arc<ApiError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

struct CacheEntry {
    state: watch::Sender<Snapshot>,
    /// Fetch id and the future every concurrent caller awaits.
    in_flight: Option<(u64, SharedFetch)>,
    last_used: Instant,
    cache_time: Duration,
}

impl CacheEntry {
    fn new(cache_time: Duration) -> Self {
        let (state, _) = watch::channel(Snapshot::idle());
        Self {
            state,
            in_flight: None,
            last_used: Instant::now(),
            cache_time,
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    fn is_collectable(&self, now: Instant) -> bool {
        self.in_flight.is_none()
            && self.state.receiver_count() == 0
            && now.duration_since(self.last_used) >= self.cache_time
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<QueryKey, CacheEntry>,
    next_fetch_id: u64,
}

impl CacheInner {
    fn collect_garbage(&mut self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_collectable(now));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Evicted inactive query cache entries");
        }
    }
}

/// Cache-aware query runner.
///
/// Holds the only shared mutable state of the data layer: cached results and
/// the per-key in-flight table. Clone is cheap and clones share the cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Mutex<CacheInner>>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
        }
    }

    /// Return cached data for `key`, fetching it first when it is missing,
    /// stale or invalidated.
    ///
    /// Concurrent calls for the same key share a single fetch. The fetch runs
    /// on its own task, so dropping the caller does not cancel it; the result
    /// still lands in the cache.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> QueryResult<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if !options.enabled {
            debug!(key = %key, "Query disabled, not fetching");
            return QueryResult::idle();
        }

        let (shared, previous) = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            inner.collect_garbage();

            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(options.cache_time));
            entry.last_used = Instant::now();
            entry.cache_time = entry.cache_time.max(options.cache_time);

            let snapshot = entry.snapshot();
            if !options.refetch_on_mount && snapshot.is_fresh(options.stale_time) {
                debug!(key = %key, "Serving fresh cached data");
                return QueryResult::from_snapshot(&snapshot, options.stale_time);
            }

            let shared = if let Some((_, shared)) = &entry.in_flight {
                debug!(key = %key, "Joining in-flight fetch");
                shared.clone()
            } else {
                let fetch_id = inner.next_fetch_id;
                inner.next_fetch_id += 1;
                let shared = self.spawn_fetch(key.clone(), fetch_id, options, fetcher);
                entry.in_flight = Some((fetch_id, shared.clone()));
                entry.state.send_modify(|s| s.status = QueryStatus::Loading);
                shared
            };
            (shared, snapshot.data.map(|data| (data, snapshot.updated_at)))
        };

        match shared.await {
            Ok(fetched) => match downcast::<T>(fetched.value) {
                Ok(data) => QueryResult {
                    status: QueryStatus::Success,
                    is_stale: options.stale_time.is_zero(),
                    data: Some(data),
                    error: None,
                    updated_at: Some(fetched.updated_at),
                },
                Err(e) => QueryResult::failed(Arc::new(e), None),
            },
            Err(error) => {
                let previous = previous.and_then(|(value, updated_at)| {
                    downcast::<T>(value).ok().map(|data| (data, updated_at))
                });
                QueryResult::failed(error, previous)
            }
        }
    }

    fn spawn_fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        fetch_id: u64,
        options: &QueryOptions,
        fetcher: F,
    ) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let inner = self.inner.clone();
        let retry = options.retry;
        let retry_delay = options.retry_delay;

        let handle = tokio::spawn(async move {
            debug!(key = %key, "Fetching query");
            let outcome: FetchOutcome = run_with_retry(&fetcher, retry, retry_delay)
                .await
                .map(|value| Fetched {
                    value: Arc::new(value) as AnyValue,
                    updated_at: Utc::now(),
                })
                .map_err(Arc::new);

            let mut inner = inner.lock().await;
            match inner.entries.get_mut(&key) {
                Some(entry) if matches!(entry.in_flight, Some((id, _)) if id == fetch_id) => {
                    entry.in_flight = None;
                    entry.last_used = Instant::now();
                    apply_outcome(&entry.state, &outcome);
                }
                _ => debug!(key = %key, "Query entry gone, discarding result"),
            }
            outcome
        });

        async move {
            handle.await.unwrap_or_else(|e| {
                Err(Arc::new(ApiError::Network(format!("Query task failed: {}", e))))
            })
        }
        .boxed()
        .shared()
    }

    /// Run a write. Not de-duplicated and, by default, not retried. On success
    /// the listed key prefixes are invalidated.
    pub async fn mutate<T, F, Fut>(
        &self,
        options: &MutationOptions,
        mutation: F,
    ) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let value = run_with_retry(&mutation, options.retry, options.retry_delay).await?;
        for key in &options.invalidates {
            self.invalidate(key).await;
        }
        Ok(value)
    }

    /// Mark every entry under `prefix` stale. Returns how many were marked.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let inner = self.inner.lock().await;
        let mut count = 0;
        for (key, entry) in inner.entries.iter() {
            if key.starts_with(prefix) {
                entry.state.send_modify(|s| s.invalidated = true);
                count += 1;
            }
        }
        debug!(prefix = %prefix, count, "Invalidated queries");
        count
    }

    /// Drop an entry. Observers are closed and any in-flight result for it
    /// is discarded.
    pub async fn remove(&self, key: &QueryKey) -> bool {
        self.inner.lock().await.entries.remove(key).is_some()
    }

    /// Seed or overwrite cached data, e.g. after a write returned the entity.
    pub async fn set_data<T: Send + Sync + 'static>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        data: T,
    ) {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .entries
            .entry(key)
            .or_insert_with(|| CacheEntry::new(options.cache_time));
        entry.last_used = Instant::now();
        let outcome: FetchOutcome = Ok(Fetched {
            value: Arc::new(data) as AnyValue,
            updated_at: Utc::now(),
        });
        apply_outcome(&entry.state, &outcome);
    }

    /// Cached state for `key` without fetching.
    pub async fn get_cached<T: Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
    ) -> Option<QueryResult<T>> {
        let inner = self.inner.lock().await;
        let entry = inner.entries.get(key)?;
        Some(QueryResult::from_snapshot(&entry.snapshot(), options.stale_time))
    }

    /// Subscribe to an entry, creating it idle if needed. A live observer
    /// keeps its entry from being evicted.
    pub async fn observe<T: Send + Sync + 'static>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
    ) -> QueryObserver<T> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .entries
            .entry(key)
            .or_insert_with(|| CacheEntry::new(options.cache_time));
        entry.last_used = Instant::now();
        QueryObserver::new(entry.state.subscribe(), options.stale_time)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Evict entries unused for longer than their retention window.
    pub async fn collect_garbage(&self) {
        self.inner.lock().await.collect_garbage();
    }
}

fn apply_outcome(state: &watch::Sender<Snapshot>, outcome: &FetchOutcome) {
    state.send_modify(|snapshot| match outcome {
        Ok(fetched) => {
            snapshot.status = QueryStatus::Success;
            snapshot.data = Some(fetched.value.clone());
            snapshot.error = None;
            snapshot.updated_at = Some(fetched.updated_at);
            snapshot.fetched_at = Some(Instant::now());
            snapshot.invalidated = false;
        }
        Err(error) => {
            snapshot.status = QueryStatus::Error;
            snapshot.error = Some(error.clone());
        }
    });
}

/// Call `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. Backoff doubles from `delay` up to 30s.
async fn run_with_retry<T, F, Fut>(op: &F, retries: u32, delay: Duration) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    let mut backoff = delay;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries && e.is_retryable() => {
                attempt += 1;
                warn!(
                    error = %e,
                    retry = attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Request failed, retrying"
                );
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
                backoff = (backoff * 2).min(MAX_RETRY_DELAY);
            }
            Err(e) => return Err(e),
        }
    }
}
