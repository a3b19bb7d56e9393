//! # OKVS over GF(2^l)
//!
//! Oblivious key-value stores: encode up to `n` key-value pairs into `m` field elements so that
//! decoding an encoded key returns its value and decoding any other key returns garbage.
//!
//! [okvs] is the main module of this library. [params] computes storage lengths, [positions]
//! derives the distinct sparse positions of garbled cuckoo tables, and [solver] holds the
//! linear algebra behind the encoders.
#![warn(missing_docs)]

pub mod cli_utils;
pub mod error;
pub mod hash_utils;
pub mod okvs;
pub mod params;
pub mod positions;
pub mod set_utils;
pub mod solver;
pub mod storage;
