use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::api::ApiError;

pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Disabled, or never fetched.
    Idle,
    Loading,
    Error,
    Success,
}

/// Type-erased state of one cache entry, broadcast to observers.
#[derive(Clone)]
pub(crate) struct Snapshot {
    pub status: QueryStatus,
    pub data: Option<AnyValue>,
    pub error: Option<Arc<ApiError>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fetched_at: Option<Instant>,
    pub invalidated: bool,
}

impl Snapshot {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            fetched_at: None,
            invalidated: false,
        }
    }

    pub fn is_fresh(&self, stale_time: Duration) -> bool {
        match self.fetched_at {
            Some(at) => self.data.is_some() && !self.invalidated && at.elapsed() < stale_time,
            None => false,
        }
    }
}

/// What a consumer sees for one query.
///
/// On failure `status` is `Error` with `error` set; any previously fetched
/// `data` is kept so screens can keep rendering it.
#[derive(Debug)]
pub struct QueryResult<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<ApiError>>,
    pub is_stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_stale: self.is_stale,
            updated_at: self.updated_at,
        }
    }
}

impl<T: Send + Sync + 'static> QueryResult<T> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_stale: false,
            updated_at: None,
        }
    }

    /// Error result. `previous` carries earlier data with its fetch time.
    pub(crate) fn failed(
        error: Arc<ApiError>,
        previous: Option<(Arc<T>, Option<DateTime<Utc>>)>,
    ) -> Self {
        let (data, updated_at) = match previous {
            Some((data, updated_at)) => (Some(data), updated_at),
            None => (None, None),
        };
        Self {
            status: QueryStatus::Error,
            data,
            error: Some(error),
            is_stale: true,
            updated_at,
        }
    }

    pub(crate) fn from_snapshot(snapshot: &Snapshot, stale_time: Duration) -> Self {
        let data = match snapshot.data.clone().map(downcast::<T>) {
            Some(Ok(data)) => Some(data),
            Some(Err(e)) => return Self::failed(Arc::new(e), None),
            None => None,
        };
        Self {
            status: snapshot.status,
            is_stale: data.is_some() && !snapshot.is_fresh(stale_time),
            data,
            error: snapshot.error.clone(),
            updated_at: snapshot.updated_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn age_display(&self) -> String {
        let Some(updated_at) = self.updated_at else {
            return "never".to_string();
        };
        let minutes = (Utc::now() - updated_at).num_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

pub(crate) fn downcast<T: Send + Sync + 'static>(value: AnyValue) -> Result<Arc<T>, ApiError> {
    value.downcast::<T>().map_err(|_| {
        ApiError::Validation(format!(
            "Cached value is not a {}; the key is shared by different queries",
            std::any::type_name::<T>()
        ))
    })
}

/// Follows one cache entry.
///
/// Updates land only while the observer is alive; dropping it simply stops
/// delivery, and an in-flight fetch still completes into the cache.
pub struct QueryObserver<T> {
    rx: watch::Receiver<Snapshot>,
    stale_time: Duration,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QueryObserver<T> {
    pub(crate) fn new(rx: watch::Receiver<Snapshot>, stale_time: Duration) -> Self {
        Self {
            rx,
            stale_time,
            _entity: PhantomData,
        }
    }

    pub fn current(&self) -> QueryResult<T> {
        QueryResult::from_snapshot(&self.rx.borrow(), self.stale_time)
    }

    /// Wait for the next change. Returns `None` once the entry is removed.
    pub async fn changed(&mut self) -> Option<QueryResult<T>> {
        self.rx.changed().await.ok()?;
        Some(QueryResult::from_snapshot(&self.rx.borrow_and_update(), self.stale_time))
    }
}
