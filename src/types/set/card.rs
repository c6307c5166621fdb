// src/types/set/card.rs

//! Set cardinality, stored in the owner's metadata record as
//! `ValueTag::SetCard ‖ BE32(cardinality)`.
//!
//! An absent record means cardinality 0. A set never keeps a record holding
//! 0: callers stage [`stage_delete`] instead once the last member goes.

use crate::error::{Error, Result};
use crate::store::{ReadView, WriteBatch};
use crate::types::{ValueTag, meta_key};

pub const CARD_RECORD_LEN: usize = 5;

pub fn encode(card: u32) -> [u8; CARD_RECORD_LEN] {
    let mut data = [0u8; CARD_RECORD_LEN];
    data[0] = ValueTag::SetCard as u8;
    data[1..].copy_from_slice(&card.to_be_bytes());
    data
}

/// The tag is checked before the length: a short record of another type is
/// reported as `WrongType`, not as corruption.
pub fn decode(raw: &[u8]) -> Result<u32> {
    if let Some(&tag) = raw.first() {
        if tag != ValueTag::SetCard as u8 {
            return Err(Error::WrongType);
        }
    }
    if raw.len() < CARD_RECORD_LEN {
        return Err(Error::CorruptData {
            expected: CARD_RECORD_LEN,
            found: raw.len(),
        });
    }
    Ok(u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]))
}

pub fn read<V: ReadView + ?Sized>(view: &V, owner: &[u8]) -> Result<u32> {
    match view.get(&meta_key(owner))? {
        Some(raw) => decode(&raw),
        None => Ok(0),
    }
}

pub fn stage_write(owner: &[u8], card: u32, batch: &mut WriteBatch) {
    debug_assert!(card > 0, "an empty set must not keep a metadata record");
    batch.put(meta_key(owner), encode(card).to_vec());
}

pub fn stage_delete(owner: &[u8], batch: &mut WriteBatch) {
    batch.delete(meta_key(owner));
}
