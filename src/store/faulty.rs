// src/store/faulty.rs

//! Memory store that fails exactly one read, counted across `get`,
//! `keys_from` and `key_before`. Writes always go through.

use std::io;
use std::iter;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use super::{KeyIter, KvStore, MemorySnapshot, MemoryStore, ReadView, WriteBatch};

pub(crate) struct FaultyStore {
    inner: MemoryStore,
    fail_at: usize,
    reads: AtomicUsize,
}

impl FaultyStore {
    /// Wrap `inner`; the read numbered `fail_at` (from 0) returns `StoreIo`.
    pub(crate) fn new(inner: MemoryStore, fail_at: usize) -> Self {
        FaultyStore {
            inner,
            fail_at,
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of reads issued so far.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn next_read(&self) -> Result<()> {
        if self.reads.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(Error::store_io(io::Error::other("injected read failure")));
        }
        Ok(())
    }
}

impl ReadView for FaultyStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.next_read()?;
        self.inner.get(key)
    }

    fn keys_from(&self, start: &[u8]) -> KeyIter<'_> {
        match self.next_read() {
            Ok(()) => self.inner.keys_from(start),
            Err(err) => Box::new(iter::once(Err(err))),
        }
    }

    fn key_before(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.next_read()?;
        self.inner.key_before(key)
    }
}

impl KvStore for FaultyStore {
    type Snapshot<'a> = MemorySnapshot;

    fn snapshot(&self) -> Result<MemorySnapshot> {
        self.inner.snapshot()
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.inner.commit(batch)
    }
}
