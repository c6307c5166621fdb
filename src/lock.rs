// src/lock.rs

//! Per-key locks.
//!
//! Set mutators read the live store to decide what to stage, so two mutators
//! racing on the same key could both act on stale state. Callers serialize
//! them by holding a [`KeyGuard`] for the key; every mutator takes the guard
//! as an argument and reads the owner key from it.
//!
//! Held keys live in a sharded table of `Mutex<HashSet<key>>`, with a
//! `Condvar` per shard to wake waiters when a key is released.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Condvar, Mutex, PoisonError};

use tracing::trace;

pub const DEFAULT_SHARDS: usize = 16;

#[derive(Debug, Default)]
struct Shard {
    held: Mutex<HashSet<Vec<u8>>>,
    released: Condvar,
}

#[derive(Debug)]
pub struct KeyLocks {
    shards: Vec<Shard>,
}

impl Default for KeyLocks {
    fn default() -> Self {
        KeyLocks::new(DEFAULT_SHARDS)
    }
}

impl KeyLocks {
    pub fn new(num_shards: usize) -> Self {
        let shards = (0..num_shards.max(1)).map(|_| Shard::default()).collect();
        KeyLocks { shards }
    }

    fn shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }

    /// Block until `key` is free, then hold it until the guard is dropped.
    pub fn lock(&self, key: &[u8]) -> KeyGuard<'_> {
        let shard = self.shard(key);
        let mut held = shard.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(key) {
            trace!(key = %hex::encode(key), "waiting for key lock");
            held = shard
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(key.to_vec());
        KeyGuard { shard, key: key.to_vec() }
    }

    /// Take the lock only if nobody holds it.
    #[cfg(test)]
    pub(crate) fn try_lock(&self, key: &[u8]) -> Option<KeyGuard<'_>> {
        let shard = self.shard(key);
        let mut held = shard.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(key.to_vec()) {
            return None;
        }
        Some(KeyGuard { shard, key: key.to_vec() })
    }
}

/// Proof that the holder has exclusive mutating access to one key.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    shard: &'a Shard,
    key: Vec<u8>,
}

impl KeyGuard<'_> {
    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.shard.held.lock().unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.key);
        drop(held);
        self.shard.released.notify_all();
    }
}
