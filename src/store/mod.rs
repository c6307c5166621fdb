// src/store/mod.rs

//! # Ordered key-value store
//!
//! The set operations only need a handful of primitives from the storage
//! engine underneath them. They are collected in two traits so the same code
//! runs against `sled` on disk and against a purely in-memory map:
//!
//! - [`ReadView`]: point reads and ordered key scans.
//! - [`KvStore`]: the store itself acts as the live read view, and adds
//!   point-in-time snapshots plus atomic batch commits.
//!
//! Keys sort as plain byte strings in both backends.

pub mod batch;
pub mod memory;
pub mod sled_store;
#[cfg(test)]
pub(crate) mod faulty;

pub use batch::{BatchOp, WriteBatch};
pub use memory::{MemorySnapshot, MemoryStore};
pub use sled_store::{SledSnapshot, SledStore};

use crate::error::Result;

/// Boxed ascending key scan returned by [`ReadView::keys_from`].
pub type KeyIter<'a> = Box<dyn Iterator<Item = Result<Vec<u8>>> + 'a>;

/// Read access to the store, either live or through a snapshot.
pub trait ReadView {
    /// Value stored at `key`, `None` when absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Every key `>= start`, ascending. Equivalent to seek + next.
    fn keys_from(&self, start: &[u8]) -> KeyIter<'_>;

    /// Greatest key strictly below `key`. Equivalent to seek + prev.
    fn key_before(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn contains_key(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// A store whose default view is live and which can hand out snapshots.
pub trait KvStore: ReadView + Send + Sync {
    /// Consistent view, released when dropped.
    type Snapshot<'a>: ReadView
    where
        Self: 'a;

    fn snapshot(&self) -> Result<Self::Snapshot<'_>>;

    /// Apply every staged op atomically.
    fn commit(&self, batch: WriteBatch) -> Result<()>;
}
