// src/types/set/random.rs

//! Random member selection through a key-space seek.
//!
//! The store has no "random row" primitive. Instead we seek to the owner's
//! prefix followed by one random byte and take the first member at or after
//! that point, falling back to the member just before it. The choice is
//! spread over positions in sort order, weighted by how member bytes are
//! distributed around the random byte, not uniform over members.

use crate::error::Result;
use crate::store::ReadView;
use super::codec::{iteration_prefix, parse_member, past_prefix, randomized_seek_key};

/// One member of `owner`, or `None` when the set is empty.
pub fn pick_random<V: ReadView + ?Sized>(view: &V, owner: &[u8]) -> Result<Option<Vec<u8>>> {
    pick_at(view, owner, &randomized_seek_key(owner))
}

pub(crate) fn pick_at<V: ReadView + ?Sized>(
    view: &V,
    owner: &[u8],
    seek_key: &[u8],
) -> Result<Option<Vec<u8>>> {
    let prefix = iteration_prefix(owner);

    let found = view.keys_from(seek_key).next().transpose()?;
    let key = match found {
        Some(key) if !past_prefix(&prefix, &key) => key,
        // ran off the end of the keyspace or into the next owner: step back
        _ => match view.key_before(seek_key)? {
            Some(key) if !past_prefix(&prefix, &key) => key,
            _ => return Ok(None),
        },
    };
    Ok(parse_member(&key).map(<[u8]>::to_vec))
}
