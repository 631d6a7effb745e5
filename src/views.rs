//! Cached listing views.
//!
//! The service order listing (`/`) and project listing (`/projects`) are
//! cached per variant (status tab, viewing user) for a short TTL. Any mutation
//! that changes a listing invalidates every variant of that view, so the next
//! read reflects the change.
//!
//! Each view carries a generation that `invalidate` bumps. A reader that
//! missed the cache holds the generation it saw, and its `put` is dropped if
//! the view was invalidated while it was reading the database.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Service order listing.
pub const SERVICE_ORDERS_VIEW: &str = "/";
/// Project listing.
pub const PROJECTS_VIEW: &str = "/projects";

struct CachedView {
    body: serde_json::Value,
    stored_at: Instant,
}

impl CachedView {
    fn is_stale(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

type ViewKey = (&'static str, String);

#[derive(Default)]
struct Views {
    entries: HashMap<ViewKey, CachedView>,
    generations: HashMap<&'static str, u64>,
}

impl Views {
    fn generation(&self, view: &'static str) -> Generation {
        Generation(self.generations.get(view).copied().unwrap_or(0))
    }
}

/// Invalidation count of a view, observed on a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Debug)]
pub enum Lookup {
    Hit(serde_json::Value),
    /// Pass the generation back to [`ViewCache::put`] once the view is built.
    Miss(Generation),
}

#[derive(Clone)]
pub struct ViewCache {
    inner: Arc<RwLock<Views>>,
    ttl: Duration,
}

impl ViewCache {
    /// A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Views::default())),
            ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Views> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Views> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, view: &'static str, variant: &str) -> Lookup {
        let views = self.read();
        if self.ttl.is_zero() {
            return Lookup::Miss(views.generation(view));
        }
        match views
            .entries
            .get(&(view, variant.to_string()))
            .filter(|cached| !cached.is_stale(self.ttl))
        {
            Some(cached) => Lookup::Hit(cached.body.clone()),
            None => Lookup::Miss(views.generation(view)),
        }
    }

    /// Store a freshly built view. Ignored if `view` was invalidated after
    /// `generation` was observed.
    pub fn put(&self, view: &'static str, variant: &str, generation: Generation, body: serde_json::Value) {
        if self.ttl.is_zero() {
            return;
        }
        let mut views = self.write();
        if views.generation(view) != generation {
            tracing::debug!(view, variant, "Discarded view built before invalidation");
            return;
        }
        views.entries.insert(
            (view, variant.to_string()),
            CachedView {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every cached variant of `view`.
    pub fn invalidate(&self, view: &'static str) {
        let mut views = self.write();
        views.entries.retain(|(v, _), _| *v != view);
        *views.generations.entry(view).or_insert(0) += 1;
        tracing::debug!(view, "Invalidated cached view");
    }
}
