use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};


pub struct EmbeddingCache {
    inner: Mutex<CacheState>,
    ttl: Duration,
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    stats: CacheStats,
}

struct CacheEntry {
    embedding: Vec<f32>,
    created_at: Instant,
}

#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}


fn cache_key(model: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl EmbeddingCache {
    /// A zero `max_size` is treated as a capacity of one.
    pub fn new(max_size: usize, ttl_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            ttl: Duration::from_secs(ttl_secs),
        }
    }


    pub fn get(&self, model: &str, text: &str) -> Option<Vec<f32>> {
        let key = cache_key(model, text);
        let mut state = self.inner.lock();

        let expired = state
            .entries
            .peek(&key)
            .map(|entry| entry.created_at.elapsed() >= self.ttl);
        if expired == Some(true) {
            state.entries.pop(&key);
        }

        let fresh = state.entries.get(&key).map(|entry| entry.embedding.clone());

        match fresh {
            Some(embedding) => {
                state.stats.hits += 1;
                Some(embedding)
            }
            None => {
                state.stats.misses += 1;
                state.stats.size = state.entries.len();
                None
            }
        }
    }


    pub fn set(&self, model: &str, text: &str, embedding: Vec<f32>) {
        let key = cache_key(model, text);
        let mut state = self.inner.lock();
        state.entries.put(
            key,
            CacheEntry {
                embedding,
                created_at: Instant::now(),
            },
        );
        state.stats.size = state.entries.len();
    }


    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }


    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.stats.size = 0;
    }
}
