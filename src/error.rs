// src/error.rs

//! Error taxonomy shared by the store backends and the set operations.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// Any failure reported by the underlying ordered store.
    #[error("store I/O error: {0}")]
    StoreIo(#[source] BoxError),

    /// The metadata record at this key belongs to another data type.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// A metadata record shorter than its fixed layout.
    #[error("corrupt metadata record: expected {expected} bytes, found {found}")]
    CorruptData { expected: usize, found: usize },

    /// The cardinality record cannot count any more members.
    #[error("set cardinality overflow")]
    CardinalityOverflow,
}

impl Error {
    pub fn store_io<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::StoreIo(err.into())
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::StoreIo(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
