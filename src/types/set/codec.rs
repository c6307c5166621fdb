// src/types/set/codec.rs

//! Member entry key layout.
//!
//! ```text
//! KeyTag::SetMember ‖ BE32(len(owner)) ‖ owner ‖ member
//! ```
//!
//! The explicit owner length keeps owners that are byte-prefixes of each
//! other (`"ab"` vs `"abc"`) in disjoint key ranges: their length fields
//! differ, and the length field sorts before the owner bytes.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::types::KeyTag;

const HEADER_LEN: usize = 1 + 4;

/// Common prefix of every member entry of `owner`.
pub fn iteration_prefix(owner: &[u8]) -> Vec<u8> {
    prefix_with_capacity(owner, 0)
}

fn prefix_with_capacity(owner: &[u8], extra: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(HEADER_LEN + owner.len() + extra);
    key.push(KeyTag::SetMember as u8);
    key.extend_from_slice(&(owner.len() as u32).to_be_bytes());
    key.extend_from_slice(owner);
    key
}

pub fn member_key(owner: &[u8], member: &[u8]) -> Vec<u8> {
    let mut key = prefix_with_capacity(owner, member.len());
    key.extend_from_slice(member);
    key
}

/// Iteration prefix followed by one byte from the OS CSPRNG.
pub fn randomized_seek_key(owner: &[u8]) -> Vec<u8> {
    let mut byte = [0u8; 1];
    OsRng.fill_bytes(&mut byte);
    seek_key_with(owner, byte[0])
}

pub(crate) fn seek_key_with(owner: &[u8], byte: u8) -> Vec<u8> {
    let mut key = prefix_with_capacity(owner, 1);
    key.push(byte);
    key
}

/// True once a scan bounded to `prefix` has left its range.
pub fn past_prefix(prefix: &[u8], key: &[u8]) -> bool {
    !key.starts_with(prefix)
}

/// Member bytes of a member entry key, `None` if the key is not one.
pub fn parse_member(key: &[u8]) -> Option<&[u8]> {
    if key.len() < HEADER_LEN || key[0] != KeyTag::SetMember as u8 {
        return None;
    }
    let owner_len = u32::from_be_bytes([key[1], key[2], key[3], key[4]]) as usize;
    key.get(HEADER_LEN + owner_len..)
}
