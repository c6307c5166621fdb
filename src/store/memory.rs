// src/store/memory.rs

//! In-memory backend: a `BTreeMap` shared behind an `Arc`.
//!
//! A snapshot is a clone of the `Arc`. A commit copies the map only when a
//! snapshot still references the current version (`Arc::make_mut`), so open
//! snapshots never see later writes and never hold writers up.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use super::{BatchOp, KeyIter, KvStore, ReadView, WriteBatch};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Arc<Map>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn current(&self) -> Arc<Map> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }
}

/// Frozen version of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    map: Arc<Map>,
}

/// Walks an owned map version one key at a time, so the iterator does not
/// borrow the lock.
struct MapKeys {
    map: Arc<Map>,
    lower: Bound<Vec<u8>>,
}

impl Iterator for MapKeys {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self
            .map
            .range::<Vec<u8>, _>((self.lower.as_ref(), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone())?;
        self.lower = Bound::Excluded(key.clone());
        Some(Ok(key))
    }
}

fn keys_from(map: Arc<Map>, start: &[u8]) -> KeyIter<'static> {
    Box::new(MapKeys {
        map,
        lower: Bound::Included(start.to_vec()),
    })
}

fn key_before(map: &Map, key: &[u8]) -> Option<Vec<u8>> {
    map.range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
        .next_back()
        .map(|(k, _)| k.clone())
}

impl ReadView for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    fn keys_from(&self, start: &[u8]) -> KeyIter<'_> {
        keys_from(self.current(), start)
    }

    fn key_before(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(key_before(&data, key))
    }
}

impl ReadView for MemorySnapshot {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    fn keys_from(&self, start: &[u8]) -> KeyIter<'_> {
        keys_from(self.map.clone(), start)
    }

    fn key_before(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(key_before(&self.map, key))
    }
}

impl KvStore for MemoryStore {
    type Snapshot<'a> = MemorySnapshot;

    fn snapshot(&self) -> Result<MemorySnapshot> {
        Ok(MemorySnapshot { map: self.current() })
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let map = Arc::make_mut(&mut *data);
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    map.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }
}
