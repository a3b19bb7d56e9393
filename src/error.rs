//! Error taxonomy of the OKVS engine.
//!
//! Precondition violations are programmer errors and are rejected before any work is done.
//! [OkvsError::BinOverflow] and [OkvsError::Unsolvable] depend on the input data and the hash keys,
//! so a caller may retry them with fresh keys (see [OkvsError::is_retryable]).

use crate::okvs::OkvsType;
use thiserror::Error;

/// Errors raised by parameter calculation, construction, encoding and decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OkvsError {
    /// A construction parameter is out of range (e.g. `n == 0`, field too small).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The number of supplied hash keys does not match the type.
    #[error("{okvs_type} needs {expected} hash keys, got {actual}")]
    HashKeyCount {
        /// OKVS type being constructed.
        okvs_type: OkvsType,
        /// Required count.
        expected: usize,
        /// Supplied count.
        actual: usize,
    },
    /// More key-value pairs than the capacity `n`.
    #[error("{actual} pairs exceed the capacity n = {capacity}")]
    TooManyPairs {
        /// Capacity of the instance.
        capacity: usize,
        /// Number of supplied pairs.
        actual: usize,
    },
    /// A key is not exactly `byteL` bytes long.
    #[error("key length is {actual} bytes, expected {expected}")]
    KeyLength {
        /// `byteL` of the instance.
        expected: usize,
        /// Length of the offending key.
        actual: usize,
    },
    /// The same key appears twice in the input of `encode`.
    #[error("duplicate key in the input map")]
    DuplicateKey,
    /// A storage handed to `decode` does not have `m` elements.
    #[error("storage has {actual} elements, expected m = {expected}")]
    StorageLength {
        /// `m` of the instance.
        expected: usize,
        /// Length of the supplied storage.
        actual: usize,
    },
    /// A bin received more pairs than its sized capacity.
    #[error("bin {bin} holds {size} pairs but its capacity is {capacity}")]
    BinOverflow {
        /// Index of the overflowing bin.
        bin: usize,
        /// Number of pairs hashed into it.
        size: usize,
        /// Capacity computed from the balls-into-bins bound.
        capacity: usize,
    },
    /// The core left after peeling has no solution over the available columns.
    #[error("core of {rows} rows has no solution over {columns} columns")]
    Unsolvable {
        /// Rows in the core.
        rows: usize,
        /// Columns (core sparse + dense) available to the solver.
        columns: usize,
    },
}

impl OkvsError {
    /// Whether the failure depends on the hash keys, so that encoding again with fresh keys may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OkvsError::BinOverflow { .. } | OkvsError::Unsolvable { .. }
        )
    }
}
