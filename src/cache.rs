//! Content-addressable cache for extraction results.
//!
//! Keys combine a SHA-256 of the document bytes with a BLAKE3 of the
//! JSON-serialized metadata, so byte-identical uploads with identical
//! metadata always land on the same entry. The cache is bounded: once
//! `capacity` is reached the least recently used entry is evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{DocumentMetadata, ExtractionResult};

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

/// Storage port for extraction results.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<ExtractionResult>>;
    fn set(&self, key: String, value: Arc<ExtractionResult>);
    fn clear(&self);
    fn stats(&self) -> CacheStats;
}

#[derive(Serialize)]
struct KeyMetadata<'a> {
    size: usize,
    mime_type: &'a str,
    metadata: &'a DocumentMetadata,
}

/// Derive the cache key for a document.
pub fn cache_key(content: &[u8], mime_type: &str, metadata: &DocumentMetadata) -> String {
    let content_hash = hex::encode(Sha256::digest(content));

    let blob = serde_json::to_vec(&KeyMetadata {
        size: content.len(),
        mime_type,
        metadata,
    })
    .unwrap_or_default();
    let metadata_hash = blake3::hash(&blob).to_hex();

    format!("{}:{}", content_hash, metadata_hash)
}

/// A cached value with its recency tick.
struct CacheEntry {
    value: Arc<ExtractionResult>,
    last_used: u64,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.inserted_at.elapsed() >= ttl)
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    tick: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

/// In-memory LRU cache of extraction results.
pub struct ExtractionCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExtractionCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
            ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a cache whose entries also expire after `ttl`.
    pub fn with_ttl(capacity: usize, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new(capacity)
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ResultCache for ExtractionCache {
    fn get(&self, key: &str) -> Option<Arc<ExtractionResult>> {
        let found = self.state.lock().ok().and_then(|mut guard| {
            let tick = guard.next_tick();
            let expired = guard
                .entries
                .get(key)
                .map(|entry| entry.is_expired(self.ttl))?;
            if expired {
                guard.entries.remove(key);
                return None;
            }
            guard.entries.get_mut(key).map(|entry| {
                entry.last_used = tick;
                Arc::clone(&entry.value)
            })
        });

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn set(&self, key: String, value: Arc<ExtractionResult>) {
        if let Ok(mut guard) = self.state.lock() {
            let tick = guard.next_tick();
            if !guard.entries.contains_key(&key) && guard.entries.len() >= self.capacity {
                guard.evict_lru();
            }
            guard.entries.insert(
                key,
                CacheEntry {
                    value,
                    last_used: tick,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.state.lock() {
            guard.entries.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.state.lock().map(|g| g.entries.len()).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, TextQuality};
    use std::collections::BTreeMap;

    fn result(text: &str) -> Arc<ExtractionResult> {
        Arc::new(ExtractionResult {
            text: text.to_string(),
            confidence: 90.0,
            quality: TextQuality {
                is_searchable: true,
                is_high_quality: true,
                estimated_accuracy: 90.0,
                word_count: 1,
                character_count: text.len(),
                has_meaningful_content: false,
                document_type: DocumentType::Unknown,
            },
            fields: BTreeMap::new(),
        })
    }

    #[test]
    fn test_key_is_deterministic() {
        let meta = DocumentMetadata::default().with_document_id("doc-1");
        let a = cache_key(b"bytes", "image/png", &meta);
        let b = cache_key(b"bytes", "image/png", &meta);
        assert_eq!(a, b);
        assert!(a.contains(':'));
    }

    #[test]
    fn test_key_depends_on_content_and_metadata() {
        let meta = DocumentMetadata::default().with_document_id("doc-1");
        let base = cache_key(b"bytes", "image/png", &meta);

        assert_ne!(base, cache_key(b"bytez", "image/png", &meta));
        assert_ne!(base, cache_key(b"bytes", "image/jpeg", &meta));
        assert_ne!(
            base,
            cache_key(
                b"bytes",
                "image/png",
                &meta.clone().with_user("u1", "teacher")
            )
        );
    }

    #[test]
    fn test_hits_and_misses() {
        let cache = ExtractionCache::new(4);
        assert!(cache.get("k").is_none());
        cache.set("k".to_string(), result("hello"));
        assert_eq!(cache.get("k").unwrap().text, "hello");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = ExtractionCache::new(2);
        cache.set("a".to_string(), result("a"));
        cache.set("b".to_string(), result("b"));
        // Touch "a" so "b" becomes the eviction candidate
        assert!(cache.get("a").is_some());
        cache.set("c".to_string(), result("c"));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = ExtractionCache::new(2);
        cache.set("a".to_string(), result("a"));
        cache.set("b".to_string(), result("b"));
        cache.set("a".to_string(), result("a2"));
        assert_eq!(cache.stats().size, 2);
        assert_eq!(cache.get("a").unwrap().text, "a2");
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = ExtractionCache::with_ttl(4, Duration::from_millis(0));
        cache.set("k".to_string(), result("x"));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_clear_resets() {
        let cache = ExtractionCache::new(4);
        cache.set("k".to_string(), result("x"));
        let _ = cache.get("k");
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
