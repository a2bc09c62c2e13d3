//! Shared health state for the /health endpoint.
//! Updated by the raw-event cache, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Nanosecond timestamp of the last successful upstream fetch (0 = none).
    pub last_fetch_at_ns: AtomicU64,
    /// Count of upstream Savant fetches performed.
    pub upstream_fetches: AtomicU64,
    /// Count of requests served from the raw-event cache.
    pub cache_hits: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_last_fetch_at_ns(&self, ns: u64) {
        self.last_fetch_at_ns.store(ns, Ordering::Relaxed);
    }

    pub fn inc_upstream_fetches(&self) {
        self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_fetch_at_ns(&self) -> u64 {
        self.last_fetch_at_ns.load(Ordering::Relaxed)
    }

    pub fn upstream_fetches(&self) -> u64 {
        self.upstream_fetches.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }
}
