// src/store/sled_store.rs

//! `sled` backend.
//!
//! Batches become a `sled::Batch` applied with `apply_batch`, which is atomic.
//! `sled` has no snapshot API, so a snapshot holds the read side of a commit
//! gate: commits issued through this `SledStore` wait until every open
//! snapshot is dropped, which keeps the snapshot's reads fixed. A thread must
//! not commit while it still holds a snapshot of the same store.

use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use sled::{Config, Db};
use tracing::debug;

use crate::error::Result;
use super::{KeyIter, KvStore, ReadView, WriteBatch};

#[derive(Debug)]
pub struct SledStore {
    db: Db,
    commit_gate: RwLock<()>,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened sled store");
        Ok(Self::from_db(db))
    }

    /// Throwaway database, removed on drop.
    pub fn temporary() -> Result<Self> {
        let db = Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    pub fn from_db(db: Db) -> Self {
        SledStore {
            db,
            commit_gate: RwLock::new(()),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// Consistent view over a [`SledStore`]; blocks commits while alive.
pub struct SledSnapshot<'a> {
    db: &'a Db,
    _gate: RwLockReadGuard<'a, ()>,
}

fn get(db: &Db, key: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(db.get(key)?.map(|v| v.to_vec()))
}

fn keys_from(db: &Db, start: &[u8]) -> KeyIter<'static> {
    Box::new(
        db.range(start.to_vec()..)
            .map(|item| item.map(|(k, _)| k.to_vec()).map_err(Into::into)),
    )
}

fn key_before(db: &Db, key: &[u8]) -> Result<Option<Vec<u8>>> {
    match db.range(..key.to_vec()).next_back() {
        Some(item) => Ok(Some(item?.0.to_vec())),
        None => Ok(None),
    }
}

impl ReadView for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        get(&self.db, key)
    }

    fn keys_from(&self, start: &[u8]) -> KeyIter<'_> {
        keys_from(&self.db, start)
    }

    fn key_before(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        key_before(&self.db, key)
    }
}

impl ReadView for SledSnapshot<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        get(self.db, key)
    }

    fn keys_from(&self, start: &[u8]) -> KeyIter<'_> {
        keys_from(self.db, start)
    }

    fn key_before(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        key_before(self.db, key)
    }
}

impl KvStore for SledStore {
    type Snapshot<'a> = SledSnapshot<'a>;

    fn snapshot(&self) -> Result<SledSnapshot<'_>> {
        let gate = self
            .commit_gate
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(SledSnapshot { db: &self.db, _gate: gate })
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let _gate = self
            .commit_gate
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let ops = batch.len();
        self.db.apply_batch(batch.into())?;
        debug!(ops, "applied batch");
        Ok(())
    }
}
