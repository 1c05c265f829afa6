//! In-memory TTL cache for source lookups.
//!
//! Keys are `<source>:<sha256(normalized subject)>`, so differently spaced
//! or cased spellings of the same subject share one entry. Only successful
//! lookups are stored; an unavailable source is asked again next time.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::models::{
    NewsHit, RegistryRecord, SanctionHit, ScanSubject, Signal, SourceOutcome, UboRecord,
};

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// Concurrent map whose entries expire `ttl` after insertion.
pub struct TtlCache<T> {
    entries: DashMap<String, Entry<T>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let hit = self.entries.get(key).and_then(|entry| {
            (entry.expires_at > Instant::now()).then(|| entry.value.clone())
        });
        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        }
        hit
    }

    pub fn insert(&self, key: String, value: T) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub fn cache_key(signal: Signal, subject: &ScanSubject) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.normalized().as_bytes());
    format!("{:?}:{}", signal, hex::encode(hasher.finalize())).to_lowercase()
}

/// One cache per source, each with the TTL configured for it.
pub struct ScanCache {
    pub news: TtlCache<Vec<NewsHit>>,
    pub sanctions: TtlCache<Vec<SanctionHit>>,
    pub registry: TtlCache<Vec<RegistryRecord>>,
    pub ubo: TtlCache<Vec<UboRecord>>,
}

impl ScanCache {
    pub fn new(news_ttl: Duration, registry_ttl: Duration) -> Self {
        Self {
            news: TtlCache::new(news_ttl),
            sanctions: TtlCache::new(registry_ttl),
            registry: TtlCache::new(registry_ttl),
            ubo: TtlCache::new(registry_ttl),
        }
    }
}

/// Store `outcome` under `key` when it is a successful lookup.
pub fn remember<T: Clone>(cache: &TtlCache<Vec<T>>, key: String, outcome: &SourceOutcome<T>) {
    if let SourceOutcome::Checked(records) = outcome {
        cache.insert(key, records.clone());
    }
}
