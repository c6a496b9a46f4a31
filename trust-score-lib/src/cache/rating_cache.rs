use super::LOG_TARGET;
use super::store::RatingStore;
use crate::pipeline::{Rating, ScoringError};
use crate::sources::Artifact;
use chrono::{DateTime, Utc};
use core::time::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Reuses recent ratings and keeps concurrent requests for one artifact from duplicating work.
#[derive(Debug)]
pub struct RatingCache {
    store: Arc<dyn RatingStore>,
    ttl: Duration,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Whether a stored rating may be served at `now`.
///
/// A rating without a net score is never reused. A rating from the future (clock skew) is
/// treated as fresh; otherwise its age must be below `ttl`.
#[must_use]
pub fn is_fresh(rating: &Rating, now: DateTime<Utc>, ttl: Duration) -> bool {
    if ttl.is_zero() || rating.net_score().is_none() {
        return false;
    }

    let age = now.signed_duration_since(rating.generated_at());
    if age.num_milliseconds() < 0 {
        log::debug!(target: LOG_TARGET, "Stored rating for '{}' is from the future, treating as fresh", rating.id());
        return true;
    }

    age.to_std().is_ok_and(|age| age < ttl)
}

impl RatingCache {
    #[must_use]
    pub fn new(store: Arc<dyn RatingStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key_lock<'a>(&'a self, key: &'a str) -> InflightKey<'a> {
        let mut inflight = self.inflight.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        InflightKey {
            cache: self,
            key,
            lock: Arc::clone(inflight.entry(key.to_string()).or_default()),
        }
    }

    fn load_fresh(&self, artifact: &Artifact, now: DateTime<Utc>) -> Option<Rating> {
        match self.store.load(artifact.id()) {
            Ok(Some(rating)) if is_fresh(&rating, now, self.ttl) => Some(rating),
            Ok(Some(_)) => {
                log::debug!(target: LOG_TARGET, "Stored rating for '{}' is stale or incomplete", artifact.id());
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not load the stored rating for '{}': {e:#}", artifact.id());
                None
            }
        }
    }

    /// Return a fresh stored rating for `artifact`, or compute, store, and return a new one.
    ///
    /// At most one computation per artifact runs at a time; callers that arrive while one is
    /// running wait for it and then reuse its result. Compute errors are returned as is and
    /// nothing is stored.
    pub async fn get_or_compute<F, Fut>(&self, artifact: &Artifact, now: DateTime<Utc>, compute: F) -> Result<Rating, ScoringError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Rating, ScoringError>>,
    {
        if let Some(rating) = self.load_fresh(artifact, now) {
            log::info!(target: LOG_TARGET, "Reusing the stored rating for '{}'", artifact.id());
            return Ok(rating);
        }

        let key = self.key_lock(artifact.id());
        let _guard = key.lock.lock().await;

        // Another caller may have finished while we waited.
        if let Some(rating) = self.load_fresh(artifact, now) {
            log::info!(target: LOG_TARGET, "Reusing the rating just computed for '{}'", artifact.id());
            return Ok(rating);
        }

        let computed = compute().await;
        if let Ok(rating) = &computed
            && let Err(e) = self.store.save(rating)
        {
            log::warn!(target: LOG_TARGET, "Could not store the rating for '{}': {e:#}", artifact.id());
        }

        computed
    }
}

/// A claim on one artifact's in-flight slot, given back when dropped, including when the
/// caller is cancelled mid-computation.
struct InflightKey<'a> {
    cache: &'a RatingCache,
    key: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InflightKey<'_> {
    fn drop(&mut self) {
        let mut inflight = self.cache.inflight.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        // The map holds one reference and we hold another; anything more is a waiter.
        if Arc::strong_count(&self.lock) <= 2 {
            let _ = inflight.remove(self.key);
        }
    }
}
