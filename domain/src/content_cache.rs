use crate::error::{DomainErrorKind, Error};
use crate::item::Item;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::*;
use rand::seq::SliceRandom;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Where the cache gets a fresh working set from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the complete current set of items, in upstream order.
    async fn fetch(&self) -> Result<Vec<Item>, Error>;
}

struct CacheState {
    items: Vec<Item>,
    /// Monotonic time of the last refresh attempt, successful or not. The throttle
    /// window is measured from here.
    last_attempt: Option<Instant>,
    /// Wall-clock time of the last successful refresh.
    last_refreshed_at: Option<DateTime<Utc>>,
    /// Kind of the last attempt's failure, cleared by the next success.
    last_failure: Option<DomainErrorKind>,
}

/// Process-wide working set of memes, refreshed from a `ContentSource` at most
/// once per `refresh_interval`.
///
/// The items are only ever replaced wholesale, so readers see either the previous
/// complete set or the new one. Refreshes are serialized by `refresh_gate`, held
/// across the upstream call: a caller arriving mid-refresh waits for its outcome
/// and then finds itself inside the throttle window. The item lock itself is only
/// taken for the throttle check and the swap, so `pick_random` never waits on I/O.
pub struct ContentCache {
    source: Arc<dyn ContentSource>,
    refresh_interval: Duration,
    refresh_gate: Mutex<()>,
    state: RwLock<CacheState>,
}

impl ContentCache {
    pub fn new(source: Arc<dyn ContentSource>, refresh_interval: Duration) -> Self {
        Self {
            source,
            refresh_interval,
            refresh_gate: Mutex::new(()),
            state: RwLock::new(CacheState {
                items: Vec::new(),
                last_attempt: None,
                last_refreshed_at: None,
                last_failure: None,
            }),
        }
    }

    /// Refresh the working set unless the throttle window since the last attempt
    /// has not elapsed yet. On failure the previous items keep being served.
    ///
    /// Inside the window this returns `Ok` without contacting the source, except
    /// when nothing was ever fetched and the last attempt failed: then that
    /// failure is reported again, so callers never start from an empty cache.
    pub async fn refresh(&self) -> Result<(), Error> {
        let _refreshing = self.refresh_gate.lock().await;

        if !self.claim_refresh()? {
            debug!("Meme cache refreshed recently, skipping upstream fetch");
            return Ok(());
        }

        match self.source.fetch().await {
            Ok(items) => {
                let count = items.len();
                {
                    let mut state = self.write();
                    state.items = items;
                    state.last_refreshed_at = Some(Utc::now());
                    state.last_failure = None;
                }
                info!("Refreshed meme cache with {count} memes");
                Ok(())
            }
            Err(err) => {
                self.write().last_failure = Some(err.error_kind.clone());
                warn!(
                    "Meme cache refresh failed, keeping {} cached memes: {err}",
                    self.len()
                );
                Err(err)
            }
        }
    }

    /// A uniformly random item of the current set, or `Item::unavailable()` when
    /// the cache is empty.
    pub fn pick_random(&self) -> Item {
        self.read()
            .items
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(Item::unavailable)
    }

    pub fn items(&self) -> Vec<Item> {
        self.read().items.clone()
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.read().last_refreshed_at
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Test-and-set of the throttle: returns true when the caller should fetch.
    fn claim_refresh(&self) -> Result<bool, Error> {
        let now = Instant::now();
        let mut state = self.write();

        if let Some(last_attempt) = state.last_attempt {
            if now.duration_since(last_attempt) < self.refresh_interval {
                return match (&state.last_refreshed_at, &state.last_failure) {
                    (None, Some(kind)) => Err(Error {
                        source: None,
                        error_kind: kind.clone(),
                    }),
                    _ => Ok(false),
                };
            }
        }

        state.last_attempt = Some(now);
        Ok(true)
    }

    // Nothing panics while holding the lock, so a poisoned lock still holds a
    // complete item set.
    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
