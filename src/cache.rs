use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, RwLock},
    time::Duration,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::table::TaxTable;

/// Pause between refresh attempts after one fails, capped at the TTL.
const REFRESH_RETRY: Duration = Duration::from_secs(300);

struct Entry {
    table: Arc<TaxTable>,
    loaded_at: DateTime<Utc>,
    /// Set after a failed refresh; the entry counts as fresh until then.
    retry_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn new(table: Arc<TaxTable>) -> Self {
        Self {
            table,
            loaded_at: Utc::now(),
            retry_at: None,
        }
    }
}

type Slot = Arc<Mutex<Option<Entry>>>;

/// Single-initialization cache of normalized tables, keyed by source URL.
///
/// Each key has its own async lock, so concurrent requests for the same source
/// wait on one load instead of fetching in parallel. Entries older than `ttl`
/// are reloaded on next access; `ttl = None` keeps them for the process
/// lifetime. A failed first load publishes nothing and returns the error. A
/// failed refresh keeps serving the previous table and holds off further
/// attempts for a while.
pub struct TableCache {
    ttl: Option<Duration>,
    slots: RwLock<HashMap<String, Slot>>,
}

impl TableCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> Slot {
        {
            let map_r = self.slots.read().unwrap_or_else(|e| e.into_inner());
            if let Some(slot) = map_r.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut map_w = self.slots.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(map_w.entry(key.to_string()).or_default())
    }

    fn is_fresh(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        if entry.retry_at.is_some_and(|at| now < at) {
            return true;
        }
        match self.ttl {
            None => true,
            Some(ttl) => match chrono::Duration::from_std(ttl) {
                Ok(ttl) => now - entry.loaded_at < ttl,
                Err(_) => true,
            },
        }
    }

    fn retry_delay(&self) -> chrono::Duration {
        let delay = self.ttl.map_or(REFRESH_RETRY, |ttl| ttl.min(REFRESH_RETRY));
        chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero())
    }

    /// Return the cached table for `key`, running `load` if it is missing or stale.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> Result<Arc<TaxTable>, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TaxTable, LoadError>>,
    {
        let slot = self.slot(key);
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if self.is_fresh(entry, Utc::now()) {
                return Ok(Arc::clone(&entry.table));
            }
            debug!(%key, loaded_at = %entry.loaded_at, "cached table is stale");
        }

        let table = match load().await {
            Ok(table) => Arc::new(table),
            Err(e) => {
                let Some(entry) = guard.as_mut() else {
                    return Err(e);
                };
                let retry_at = Utc::now() + self.retry_delay();
                warn!(%key, error = %e, loaded_at = %entry.loaded_at, %retry_at, "refresh failed, serving previous table");
                entry.retry_at = Some(retry_at);
                return Ok(Arc::clone(&entry.table));
            }
        };
        let entry = Entry::new(Arc::clone(&table));
        info!(%key, records = table.len(), loaded_at = %entry.loaded_at, "table cached");
        *guard = Some(entry);
        Ok(table)
    }

    /// Publish a table without loading, e.g. one built from a local file.
    pub async fn insert(&self, key: &str, table: TaxTable) -> Arc<TaxTable> {
        let table = Arc::new(table);
        *self.slot(key).lock().await = Some(Entry::new(Arc::clone(&table)));
        table
    }

    /// The cached table and when it was loaded, fresh or not.
    pub async fn cached(&self, key: &str) -> Option<(Arc<TaxTable>, DateTime<Utc>)> {
        self.slot(key)
            .lock()
            .await
            .as_ref()
            .map(|e| (Arc::clone(&e.table), e.loaded_at))
    }

    /// Drop the entry so the next access reloads. Returns whether one existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.slot(key).lock().await.take().is_some()
    }
}
