use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use types::{SolveEnvelope, SolveResult};

/// Finished results keyed by a hash of the request envelope, evicted
/// oldest-first once `capacity` entries are held.
pub struct ResultCache {
    capacity: usize,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    map: HashMap<u64, SolveResult>,
    order: VecDeque<u64>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Hash of the envelope's JSON form; field order is fixed by the types,
    /// so equal envelopes give equal keys.
    pub fn key(env: &SolveEnvelope) -> Option<u64> {
        let bytes = serde_json::to_vec(env).ok()?;
        let mut h = DefaultHasher::new();
        bytes.hash(&mut h);
        Some(h.finish())
    }

    pub fn get(&self, key: u64) -> Option<SolveResult> {
        self.inner.read().map.get(&key).cloned()
    }

    pub fn insert(&self, key: u64, result: SolveResult) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.write();
        if inner.map.insert(key, result).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(old) = inner.order.pop_front() {
                inner.map.remove(&old);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }
}
