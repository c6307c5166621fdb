// src/types/mod.rs

//! # Keyspace layout
//!
//! Every data type shares one ordered keyspace. The first byte of each key is
//! a [`KeyTag`] telling what kind of record it is, and the first byte of each
//! metadata value is a [`ValueTag`] telling which data type owns the key.
//!
//! ```text
//! metadata record   KeyTag::Meta      ‖ owner                  -> ValueTag ‖ payload
//! set member entry  KeyTag::SetMember ‖ BE32(len) ‖ owner ‖ m  -> (empty)
//! ```
//!
//! Only sets are implemented here; the remaining value tags are reserved so a
//! key held by another type is recognized and rejected with `WrongType`.

pub mod set;

use tracing::debug;

use crate::error::{Error, Result};
use crate::lock::KeyGuard;
use crate::store::{KvStore, ReadView, WriteBatch};

/// Discriminator for the leading byte of every stored key.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTag {
    Meta = 0x01,
    SetMember = 0x05,
}

/// Discriminator for the leading byte of every metadata value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    String = 0x01,
    Hash = 0x02,
    List = 0x03,
    SetCard = 0x04,
}

impl ValueTag {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(ValueTag::String),
            0x02 => Some(ValueTag::Hash),
            0x03 => Some(ValueTag::List),
            0x04 => Some(ValueTag::SetCard),
            _ => None,
        }
    }
}

/// Location of the metadata record for `owner`.
pub fn meta_key(owner: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + owner.len());
    key.push(KeyTag::Meta as u8);
    key.extend_from_slice(owner);
    key
}

/// Data type holding `owner`, or `None` when the key does not exist.
pub fn key_type<V: ReadView + ?Sized>(view: &V, owner: &[u8]) -> Result<Option<ValueTag>> {
    match view.get(&meta_key(owner))? {
        None => Ok(None),
        Some(raw) => match raw.first() {
            Some(&b) => ValueTag::from_byte(b).map(Some).ok_or(Error::WrongType),
            None => Err(Error::CorruptData { expected: 1, found: 0 }),
        },
    }
}

/// Stage removal of the whole footprint of the key held by `guard`.
///
/// This is the one place that deletes a set's metadata record together with
/// its member entries; [`set::delete_all`] alone leaves the metadata in place.
/// Returns `false` when the key does not exist.
pub fn delete_key<S: KvStore>(db: &S, guard: &KeyGuard<'_>, batch: &mut WriteBatch) -> Result<bool> {
    let owner = guard.key();
    match key_type(db, owner)? {
        None => Ok(false),
        Some(ValueTag::SetCard) => {
            // validates the record before anything is staged
            set::scard(db, owner)?;
            set::delete_all(db, guard, batch)?;
            batch.delete(meta_key(owner));
            debug!(key = %hex::encode(owner), "staged delete of set key");
            Ok(true)
        }
        Some(_) => Err(Error::WrongType),
    }
}
