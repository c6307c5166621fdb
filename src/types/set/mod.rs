// src/types/set/mod.rs

//! # Set Type Support
//!
//! This module implements Redis-like sets on top of an ordered key-value
//! store (see [`crate::store`]). A set is spread over two kinds of records:
//!
//! - one empty-valued *member entry* per member, keyed as described in
//!   [`codec`], so all members of one owner key form a contiguous range;
//! - one *metadata record* at [`meta_key`](crate::types::meta_key) holding the
//!   cardinality (see [`card`]).
//!
//! A set with no members has neither. Mutators never commit: they stage every
//! change, member entries and metadata together, into the caller's
//! [`WriteBatch`], and the caller commits it. Each mutator takes a
//! [`KeyGuard`] for the owner key; reads made to decide what to stage go to
//! the live store, so mutators on one key must not run concurrently.
//!
//! Supported commands:
//! - `SADD`
//! - `SREM`
//! - `SPOP`
//! - `SCARD`
//! - `SISMEMBER`
//! - `SMEMBERS`

pub mod card;
pub mod codec;
pub mod random;

pub use codec::{iteration_prefix, member_key, past_prefix, randomized_seek_key};
pub use random::pick_random;

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::lock::KeyGuard;
use crate::store::{KvStore, ReadView, WriteBatch};

/// Execute the SADD command:
/// Add `members` to the set held by `guard`.
///
/// # Returns
///
/// The number of members that were not already present. A member repeated
/// within one call counts once.
///
/// # Errors
///
/// `StoreIo` if a read fails, `WrongType`/`CorruptData` if the key's
/// metadata record is not a set cardinality, `CardinalityOverflow` if the new
/// count does not fit in 32 bits. Nothing is staged on error.
pub fn sadd<S, I, M>(db: &S, guard: &KeyGuard<'_>, members: I, batch: &mut WriteBatch) -> Result<u32>
where
    S: KvStore,
    I: IntoIterator<Item = M>,
    M: AsRef<[u8]>,
{
    let owner = guard.key();
    // fail on a foreign key before staging any member
    let card = card::read(db, owner)?;

    let mut added: Vec<Vec<u8>> = Vec::new();
    let mut seen = HashSet::new();
    for member in members {
        let key = member_key(owner, member.as_ref());
        if seen.contains(&key) || db.contains_key(&key)? {
            continue;
        }
        seen.insert(key.clone());
        added.push(key);
    }

    let count = u32::try_from(added.len()).map_err(|_| Error::CardinalityOverflow)?;
    if count > 0 {
        let new_card = card.checked_add(count).ok_or(Error::CardinalityOverflow)?;
        for key in added {
            batch.put(key, Vec::new());
        }
        card::stage_write(owner, new_card, batch);
        debug!(key = %hex::encode(owner), added = count, card = new_card, "SADD staged");
    }
    Ok(count)
}

/// Execute the SREM command:
/// Remove `members` from the set held by `guard`.
///
/// # Returns
///
/// The number of members removed. Removing the last member also stages the
/// deletion of the metadata record. On an empty set nothing is staged.
pub fn srem<S, I, M>(db: &S, guard: &KeyGuard<'_>, members: I, batch: &mut WriteBatch) -> Result<u32>
where
    S: KvStore,
    I: IntoIterator<Item = M>,
    M: AsRef<[u8]>,
{
    let owner = guard.key();
    let card = card::read(db, owner)?;
    if card == 0 {
        return Ok(0);
    }

    let mut removed: Vec<Vec<u8>> = Vec::new();
    let mut seen = HashSet::new();
    for member in members {
        let key = member_key(owner, member.as_ref());
        if seen.contains(&key) || !db.contains_key(&key)? {
            continue;
        }
        seen.insert(key.clone());
        removed.push(key);
    }

    let count = removed.len() as u32;
    for key in removed {
        batch.delete(key);
    }
    if count >= card {
        card::stage_delete(owner, batch);
    } else if count > 0 {
        card::stage_write(owner, card - count, batch);
    }
    if count > 0 {
        debug!(key = %hex::encode(owner), removed = count, card = card.saturating_sub(count), "SREM staged");
    }
    Ok(count)
}

/// Execute the SPOP command:
/// Remove and return one member picked by [`pick_random`].
///
/// Returns `None` for an empty set, staging nothing.
pub fn spop<S: KvStore>(db: &S, guard: &KeyGuard<'_>, batch: &mut WriteBatch) -> Result<Option<Vec<u8>>> {
    let owner = guard.key();
    let card = card::read(db, owner)?;
    if card == 0 {
        return Ok(None);
    }
    let Some(member) = pick_random(db, owner)? else {
        return Ok(None);
    };

    batch.delete(member_key(owner, &member));
    if card == 1 {
        card::stage_delete(owner, batch);
    } else {
        card::stage_write(owner, card - 1, batch);
    }
    debug!(key = %hex::encode(owner), card = card - 1, "SPOP staged");
    Ok(Some(member))
}

/// Execute the SCARD command against `view`.
///
/// Pass the store itself for a live read, or a snapshot for a consistent one.
pub fn scard<V: ReadView + ?Sized>(view: &V, owner: &[u8]) -> Result<u32> {
    card::read(view, owner)
}

/// Execute the SISMEMBER command.
pub fn sismember<V: ReadView + ?Sized>(view: &V, owner: &[u8], member: &[u8]) -> Result<bool> {
    view.contains_key(&member_key(owner, member))
}

/// Execute the SMEMBERS command:
/// every member of `owner` in ascending byte order.
///
/// The cardinality and the scan are read through one snapshot, released
/// when this returns, so the result is consistent with a single point in time
/// even while other handles commit.
pub fn smembers<S: KvStore>(db: &S, owner: &[u8]) -> Result<Vec<Vec<u8>>> {
    let snapshot = db.snapshot()?;
    members_in(&snapshot, owner)
}

/// Members of `owner` as seen by `view`.
pub fn members_in<V: ReadView + ?Sized>(view: &V, owner: &[u8]) -> Result<Vec<Vec<u8>>> {
    let card = card::read(view, owner)?;
    if card == 0 {
        return Ok(Vec::new());
    }

    let mut members = Vec::with_capacity(card as usize);
    let prefix = iteration_prefix(owner);
    for key in view.keys_from(&prefix) {
        let key = key?;
        if past_prefix(&prefix, &key) {
            break;
        }
        members.push(key[prefix.len()..].to_vec());
    }
    Ok(members)
}

/// Stage deletion of every member entry of the set held by `guard`.
///
/// The metadata record is left alone; whole-key deletion goes through
/// [`delete_key`](crate::types::delete_key), which removes both.
pub fn delete_all<S: KvStore>(db: &S, guard: &KeyGuard<'_>, batch: &mut WriteBatch) -> Result<usize> {
    let owner = guard.key();
    let prefix = iteration_prefix(owner);

    let mut keys = Vec::new();
    for key in db.keys_from(&prefix) {
        let key = key?;
        if past_prefix(&prefix, &key) {
            break;
        }
        keys.push(key);
    }

    let count = keys.len();
    for key in keys {
        batch.delete(key);
    }
    Ok(count)
}
