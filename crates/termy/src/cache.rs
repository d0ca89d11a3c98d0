//! The scoped term cache.
//!
//! A generic key-value store with a write timestamp per entry. TTL semantics
//! are applied by the index builder, not the store; concurrent builds racing
//! to write the same scope follow last-write-wins, and callers needing
//! stronger guarantees serialize calls themselves.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use termy_core::Term;

/// One cached value: the terms of a scope plus when they were written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub terms: Vec<Term>,
    pub written_at: SystemTime,
}

impl CacheEntry {
    /// Whether the entry is older than `ttl` as of `now`. Entries with a
    /// write timestamp in the future are not expired.
    pub fn is_expired(&self, ttl: Duration, now: SystemTime) -> bool {
        match now.duration_since(self.written_at) {
            Ok(age) => age >= ttl,
            Err(_) => false,
        }
    }
}

/// Scoped key-value store for term indexes.
///
/// Keys are opaque scope strings supplied by the caller (typically
/// `owner/repo/branch`). The key space is small, so no eviction is required.
#[async_trait]
pub trait TermCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<CacheEntry>;
    async fn set(&self, key: &str, terms: Vec<Term>, written_at: SystemTime);
    async fn delete(&self, key: &str);
}

/// In-memory [`TermCache`] with call counters.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls so far.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }

    /// Number of `set` calls so far.
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TermCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, terms: Vec<Term>, written_at: SystemTime) {
        self.set_calls.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), CacheEntry { terms, written_at });
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}
