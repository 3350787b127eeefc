//! In-memory response cache with per-entry expiry.

use crate::core::Payload;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug)]
struct CacheEntry {
    url: Url,
    payload: Payload,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Cached GET responses keyed by resolved URL.
///
/// Expiry is checked lazily on read; there is no background reaper.
///
/// Every invalidation bumps a generation counter. A read that started before
/// an invalidation stores its result only through [`CacheStore::put_if_unchanged`],
/// which refuses once the generation has moved.
#[derive(Debug)]
pub(crate) struct CacheStore {
    map: RwLock<HashMap<String, CacheEntry>>,
    generation: AtomicU64,
    default_ttl: Duration,
}

impl CacheStore {
    pub(crate) fn new(default_ttl: Duration) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            default_ttl,
        }
    }

    pub(crate) async fn get(&self, url: &Url) -> Option<Payload> {
        let key = url.as_str();
        {
            let guard = self.map.read().await;
            match guard.get(key) {
                Some(entry) if entry.is_live(Instant::now()) => {
                    return Some(entry.payload.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it, unless a writer refreshed it in the meantime.
        let mut guard = self.map.write().await;
        if guard
            .get(key)
            .is_some_and(|entry| !entry.is_live(Instant::now()))
        {
            guard.remove(key);
        }
        None
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) async fn put(&self, url: &Url, payload: Payload, ttl_override: Option<Duration>) {
        let entry = self.entry(url, payload, ttl_override);
        let mut guard = self.map.write().await;
        guard.insert(url.as_str().to_string(), entry);
    }

    /// Store `payload` unless the cache was invalidated after `since` was read.
    pub(crate) async fn put_if_unchanged(&self, url: &Url, payload: Payload, since: u64) -> bool {
        let entry = self.entry(url, payload, None);
        let mut guard = self.map.write().await;
        if self.generation.load(Ordering::Acquire) != since {
            return false;
        }
        guard.insert(url.as_str().to_string(), entry);
        true
    }

    fn entry(&self, url: &Url, payload: Payload, ttl_override: Option<Duration>) -> CacheEntry {
        CacheEntry {
            url: url.clone(),
            payload,
            expires_at: Instant::now() + ttl_override.unwrap_or(self.default_ttl),
        }
    }

    /// Remove every entry whose URL is related to `target`, returning how many were dropped.
    pub(crate) async fn invalidate_related(&self, target: &Url) -> usize {
        let mut guard = self.map.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = guard.len();
        guard.retain(|_, entry| !is_related(&entry.url, target));
        before - guard.len()
    }

    pub(crate) async fn clear(&self) {
        let mut guard = self.map.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        guard.clear();
    }

    pub(crate) async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.map.write().await;
        let before = guard.len();
        guard.retain(|_, entry| entry.is_live(now));
        before - guard.len()
    }

    /// Number of live entries.
    pub(crate) async fn len(&self) -> usize {
        let now = Instant::now();
        self.map
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }
}

/// Two URLs are related when they share an origin and one path is a
/// segment-aligned prefix of the other. Query strings are ignored.
pub(crate) fn is_related(cached: &Url, target: &Url) -> bool {
    if cached.origin() != target.origin() {
        return false;
    }
    let a = segments(cached);
    let b = segments(target);
    a.starts_with(&b) || b.starts_with(&a)
}

fn segments(url: &Url) -> Vec<&str> {
    url.path().split('/').filter(|s| !s.is_empty()).collect()
}
