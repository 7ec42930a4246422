use crate::index::types::{TermInfo, TermKey, TermRef};
use ahash::RandomState;
use lru::LruCache;
use rustc_hash::FxBuildHasher;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Term info together with the term's ordinal in the dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedTermInfo {
    pub info: TermInfo,
    pub ord: i64,
}

struct Entry {
    term: TermKey,
    value: CachedTermInfo,
}

type Shard = LruCache<u64, Entry, FxBuildHasher>;

/// Bounded LRU of recently looked-up terms, split into independently locked
/// shards so concurrent lookups rarely contend.
///
/// Entries are keyed by the term's hash and hold the term itself, so a
/// lookup never allocates. Two terms sharing a hash displace each other.
pub struct TermInfoCache {
    shards: Box<[Mutex<Shard>]>,
    hasher: RandomState,
}

impl TermInfoCache {
    pub fn new(capacity: usize, shards: usize) -> Self {
        let shards = shards.clamp(1, capacity.max(1));
        let per_shard = NonZeroUsize::new(capacity.div_ceil(shards)).unwrap_or(NonZeroUsize::MIN);
        Self {
            shards: (0..shards)
                .map(|_| Mutex::new(LruCache::with_hasher(per_shard, FxBuildHasher)))
                .collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, term: TermRef<'_>) -> (u64, MutexGuard<'_, Shard>) {
        let hash = self.hasher.hash_one((term.field, term.bytes));
        let shard = &self.shards[(hash % self.shards.len() as u64) as usize];
        // A poisoned shard still holds consistent entries
        (hash, shard.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn get(&self, term: TermRef<'_>) -> Option<CachedTermInfo> {
        let (hash, mut shard) = self.shard(term);
        shard
            .get(&hash)
            .filter(|entry| entry.term.as_ref() == term)
            .map(|entry| entry.value)
    }

    pub fn put(&self, term: TermRef<'_>, value: CachedTermInfo) {
        let (hash, mut shard) = self.shard(term);
        if let Some(entry) = shard.get_mut(&hash).filter(|e| e.term.as_ref() == term) {
            entry.value = value;
            return;
        }
        let term = term.to_owned();
        shard.put(hash, Entry { term, value });
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(|e| e.into_inner()).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }
}
