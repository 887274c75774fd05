//! Query cache with staleness, retention, retry and revalidation.
//!
//! # Design
//! Each cached query is keyed by a [`QueryKey`] and stores the last value,
//! the last error, when it was fetched and the closure that refetches it.
//! Values are type-erased (`Arc<dyn Any>`) so one cache holds every query
//! kind; the key determines the value type.
//!
//! - A value younger than `stale_time` is served without a request.
//! - An entry not read for `cache_time` is evicted.
//! - A failed fetch is retried `retry` times with capped exponential backoff.
//! - `on_focus` / `on_reconnect` refetch every stale entry.
//! - Concurrent reads of one key share a single in-flight request
//!   (a `Shared` future stored on the entry); revalidation skips entries
//!   that already have one.
//! - When a newer fetch for the same key starts, the older one's result is
//!   returned to its caller but no longer written to the cache.
//!
//! The map lock is never held across an `.await`.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::error::{ApiError, ApiResult};

/// Identity of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Posts { page: u32, limit: u32 },
    PostWithComments(u32),
    Author(u32),
    PostsByUser(u32),
    PostComments(u32),
}

type Erased = Arc<dyn Any + Send + Sync>;
type Refetch = Arc<dyn Fn() -> BoxFuture<'static, ApiResult<Erased>> + Send + Sync>;
type InFlight = Shared<BoxFuture<'static, ApiResult<Erased>>>;

struct Entry {
    data: Option<Erased>,
    error: Option<ApiError>,
    fetched_at: Option<Instant>,
    last_used: Instant,
    generation: u64,
    refetch: Refetch,
    in_flight: Option<InFlight>,
}

enum Lookup {
    Fresh(Erased),
    Pending(u64, InFlight),
}

impl Entry {
    fn is_stale(&self, now: Instant, config: &QueryConfig) -> bool {
        self.fetched_at
            .map_or(true, |at| now.duration_since(at) >= config.stale_time)
    }

    fn is_expired(&self, now: Instant, config: &QueryConfig) -> bool {
        now.duration_since(self.last_used) >= config.cache_time
    }
}

pub struct QueryClient {
    config: QueryConfig,
    entries: Mutex<HashMap<QueryKey, Entry>>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.config)
            .field("entries", &self.len())
            .finish()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl QueryClient {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached value for `key` if it is still fresh, otherwise run
    /// `fetch` (with retries) and cache its result. A caller arriving while
    /// a request for `key` is already running awaits that request instead
    /// of starting another, and `fetch` is not called.
    ///
    /// On failure the previous value, if any, stays cached and readable via
    /// [`cached`](Self::cached).
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ApiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        self.collect_garbage();
        let refetch: Refetch = Arc::new(move || {
            let fut = fetch();
            async move { fut.await.map(|value| Arc::new(value) as Erased) }.boxed()
        });

        let (generation, request) = match self.lookup(&key, refetch) {
            Lookup::Fresh(data) => {
                debug!(?key, "query cache hit");
                return downcast(&key, data);
            }
            Lookup::Pending(generation, request) => (generation, request),
        };
        let result = request.await;
        self.settle(&key, generation, &result);
        downcast(&key, result?)
    }

    /// Whether a request for `key` is currently running.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries()
            .get(key)
            .is_some_and(|e| e.in_flight.is_some())
    }

    /// The last successfully fetched value for `key`, fresh or not.
    pub fn cached<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let now = Instant::now();
        let mut entries = self.entries();
        let entry = entries.get_mut(key)?;
        entry.last_used = now;
        entry.data.clone()?.downcast::<T>().ok()
    }

    /// The error of the last failed fetch for `key`, cleared by a success.
    pub fn last_error(&self, key: &QueryKey) -> Option<ApiError> {
        self.entries().get(key).and_then(|e| e.error.clone())
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        let now = Instant::now();
        self.entries()
            .get(key)
            .map_or(true, |e| e.is_stale(now, &self.config))
    }

    /// Mark `key` stale so the next read refetches. The value stays cached.
    /// A request already running is detached: its callers still get its
    /// result, but the next read starts a new request and only that one is
    /// cached.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.entries().get_mut(key) {
            entry.fetched_at = None;
            entry.in_flight = None;
        }
    }

    pub fn invalidate_matching(&self, predicate: impl Fn(&QueryKey) -> bool) {
        for (_, entry) in self.entries().iter_mut().filter(|(k, _)| predicate(k)) {
            entry.fetched_at = None;
            entry.in_flight = None;
        }
    }

    pub fn invalidate_all(&self) {
        self.invalidate_matching(|_| true);
    }

    pub fn remove(&self, key: &QueryKey) {
        self.entries().remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict entries that have not been read for `cache_time`. Returns the
    /// number evicted.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, &self.config));
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, "evicted unused queries");
        }
        evicted
    }

    /// Refetch every stale entry concurrently, skipping entries whose request
    /// is still running. Returns how many were refetched.
    pub async fn revalidate_stale(&self) -> usize {
        self.collect_garbage();
        let now = Instant::now();
        let jobs: Vec<(QueryKey, u64, InFlight)> = self
            .entries()
            .iter_mut()
            .filter(|(_, entry)| entry.in_flight.is_none() && entry.is_stale(now, &self.config))
            .map(|(key, entry)| {
                let request = self.start(key, entry);
                (key.clone(), entry.generation, request)
            })
            .collect();

        let count = jobs.len();
        join_all(jobs.into_iter().map(|(key, generation, request)| async move {
            let result = request.await;
            self.settle(&key, generation, &result);
        }))
        .await;
        count
    }

    /// The application regained focus.
    pub async fn on_focus(&self) -> usize {
        if !self.config.refetch_on_focus {
            return 0;
        }
        debug!("focus regained, revalidating stale queries");
        self.revalidate_stale().await
    }

    /// Network connectivity came back.
    pub async fn on_reconnect(&self) -> usize {
        if !self.config.refetch_on_reconnect {
            return 0;
        }
        debug!("reconnected, revalidating stale queries");
        self.revalidate_stale().await
    }

    /// Resolve a read of `key` under one lock: a fresh value, the request
    /// already running, or a newly started request driven by `refetch`.
    fn lookup(&self, key: &QueryKey, refetch: Refetch) -> Lookup {
        let now = Instant::now();
        let mut entries = self.entries();
        let entry = entries.entry(key.clone()).or_insert_with(|| Entry {
            data: None,
            error: None,
            fetched_at: None,
            last_used: now,
            generation: 0,
            refetch: refetch.clone(),
            in_flight: None,
        });
        entry.last_used = now;

        if !entry.is_stale(now, &self.config) {
            if let Some(data) = &entry.data {
                return Lookup::Fresh(data.clone());
            }
        }
        if let Some(request) = &entry.in_flight {
            debug!(?key, "joining in-flight query");
            return Lookup::Pending(entry.generation, request.clone());
        }
        entry.refetch = refetch;
        let request = self.start(key, entry);
        Lookup::Pending(entry.generation, request)
    }

    /// Begin a new generation for `entry` and store its shared request.
    fn start(&self, key: &QueryKey, entry: &mut Entry) -> InFlight {
        entry.generation += 1;
        let request = fetch_with_retry(self.config.clone(), key.clone(), entry.refetch.clone())
            .boxed()
            .shared();
        entry.in_flight = Some(request.clone());
        request
    }

    fn settle(&self, key: &QueryKey, generation: u64, result: &ApiResult<Erased>) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.generation != generation {
            debug!(?key, generation, "discarding superseded query result");
            return;
        }
        // Every caller sharing the request settles it; only the first writes.
        if entry.in_flight.take().is_none() {
            return;
        }
        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.error = None;
                entry.fetched_at = Some(Instant::now());
            }
            Err(err) => entry.error = Some(err.clone()),
        }
    }
}

async fn fetch_with_retry(
    config: QueryConfig,
    key: QueryKey,
    refetch: Refetch,
) -> ApiResult<Erased> {
    let mut attempt = 0;
    loop {
        match refetch().await {
            Ok(data) => return Ok(data),
            Err(err) if attempt < config.retry => {
                let delay = config.retry_delay(attempt);
                attempt += 1;
                warn!(
                    ?key,
                    attempt,
                    max = config.retry,
                    ?delay,
                    error = %err,
                    "query failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                warn!(?key, attempts = attempt + 1, error = %err, "query failed");
                return Err(err);
            }
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: Erased) -> ApiResult<Arc<T>> {
    data.downcast::<T>()
        .map_err(|_| ApiError::unknown(format!("cached value for {key:?} has an unexpected type")))
}
