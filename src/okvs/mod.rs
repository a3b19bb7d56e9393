//! Oblivious key-value stores.
//!
//! An OKVS encodes up to `n` key-value pairs into `m` field elements (the storage) such that
//! decoding an encoded key returns its value, while decoding any other key returns garbage.
//! The storage carries no index-to-key mapping.
//!
//! # Example
//!
//! ```
//! use gf2e_okvs::okvs::{create_okvs, gen_hash_keys, EncodeOptions, Okvs, OkvsType};
//! use gf2e_okvs::set_utils::create_key_value_map;
//! use scuttlebutt::field::F128b;
//! use scuttlebutt::AesRng;
//! use anyhow::Result;
//! # fn try_main() -> Result<()> {
//!
//! let mut rng = AesRng::new();
//! let okvs_type = OkvsType::H3NaiveGct;
//! let hash_keys = gen_hash_keys(okvs_type, &mut rng);
//! let okvs = create_okvs::<F128b>(okvs_type, 100, &hash_keys)?;
//!
//! let points = create_key_value_map::<F128b, _>(100, &mut rng)?;
//! let storage = okvs.encode(&mut rng, &points, EncodeOptions::default())?;
//! assert_eq!(storage.len(), okvs.m());
//!
//! for (key, value) in points.iter() {
//!     assert_eq!(okvs.decode(&storage, key)?, *value);
//! }
//! # Ok(())
//! # }
//! # fn main() {
//! #     try_main().unwrap();
//! # }
//! ```

use crate::error::OkvsError;
use anyhow::{bail, Result};
use clap::ValueEnum;
use rand::distributions::{Distribution, Standard};
use rand::{CryptoRng, Rng};
use scuttlebutt::field::FiniteField as FF;
use std::collections::HashSet;
use std::fmt::Display;
use typenum::marker_traits::Unsigned;

mod bins;
pub mod cluster;
pub mod factory;
pub mod gct;
pub mod mega_bin;
pub mod polynomial;

pub use cluster::ClusterGctOkvs;
pub use factory::{create_okvs, gen_hash_keys, get_hash_key_num, get_m, OkvsInstance};
pub use gct::GctOkvs;
pub use mega_bin::MegaBinOkvs;
pub use polynomial::PolynomialOkvs;

/// Codec kinds.
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq, Hash)]
pub enum OkvsType {
    /// Interpolate one polynomial through all pairs. See [PolynomialOkvs].
    #[value(name = "polynomial")]
    Polynomial,
    /// Hash pairs into about n / ln n bins and interpolate each. See [MegaBinOkvs].
    #[value(name = "mega-bin")]
    MegaBin,
    /// Garbled cuckoo table, 2 positions, 2-core bound. See [GctOkvs].
    #[value(name = "h2-naive-gct")]
    H2NaiveGct,
    /// Garbled cuckoo table, 2 positions, tightened bound. See [GctOkvs].
    #[value(name = "h2-blaze-gct")]
    H2BlazeGct,
    /// Garbled cuckoo table, 3 positions. See [GctOkvs].
    #[value(name = "h3-naive-gct")]
    H3NaiveGct,
    /// Bins of about 2^14 pairs, each an [OkvsType::H2BlazeGct]. See [ClusterGctOkvs].
    #[value(name = "h2-cluster-blaze-gct")]
    H2ClusterBlazeGct,
    /// Bins of about 2^14 pairs, each an [OkvsType::H3NaiveGct]. See [ClusterGctOkvs].
    #[value(name = "h3-cluster-naive-gct")]
    H3ClusterNaiveGct,
}

impl OkvsType {
    /// Every codec kind.
    pub const ALL: [OkvsType; 7] = [
        OkvsType::Polynomial,
        OkvsType::MegaBin,
        OkvsType::H2NaiveGct,
        OkvsType::H2BlazeGct,
        OkvsType::H3NaiveGct,
        OkvsType::H2ClusterBlazeGct,
        OkvsType::H3ClusterNaiveGct,
    ];
}

impl Display for OkvsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OkvsType::Polynomial => write!(f, "polynomial"),
            OkvsType::MegaBin => write!(f, "mega-bin"),
            OkvsType::H2NaiveGct => write!(f, "h2-naive-gct"),
            OkvsType::H2BlazeGct => write!(f, "h2-blaze-gct"),
            OkvsType::H3NaiveGct => write!(f, "h3-naive-gct"),
            OkvsType::H2ClusterBlazeGct => write!(f, "h2-cluster-blaze-gct"),
            OkvsType::H3ClusterNaiveGct => write!(f, "h3-cluster-naive-gct"),
        }
    }
}

/// Per-call encoding options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Encode independent bins on a worker pool. Ignored by single-table codecs.
    pub parallel: bool,
}

/// Immutable description of an instance, computable before any encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OkvsDescriptor {
    /// Codec kind.
    pub okvs_type: OkvsType,
    /// Capacity.
    pub n: usize,
    /// Bytes per field element.
    pub byte_l: usize,
    /// Storage length.
    pub m: usize,
    /// Number of hash keys the codec consumes.
    pub hash_key_num: usize,
}

impl OkvsDescriptor {
    /// Describe `okvs_type` with capacity `n` over `F`.
    pub fn new<F: FF>(okvs_type: OkvsType, n: usize) -> Result<Self> {
        Ok(Self {
            okvs_type,
            n,
            byte_l: F::ByteReprLen::to_usize(),
            m: get_m(okvs_type, n)?,
            hash_key_num: get_hash_key_num(okvs_type),
        })
    }

    /// Bits per field element.
    pub fn l(&self) -> usize {
        self.byte_l * 8
    }

    /// n / m
    pub fn rate(&self) -> f64 {
        self.n as f64 / self.m as f64
    }
}

/// An oblivious key-value store over the field `F`.
pub trait Okvs<F>
where
    F: FF,
    Standard: Distribution<F>,
{
    /// Codec kind.
    fn okvs_type(&self) -> OkvsType;

    /// Capacity: the largest number of pairs `encode` accepts.
    fn n(&self) -> usize;

    /// Storage length.
    fn m(&self) -> usize;

    /// `-log2` of the probability that `encode` fails on honest input.
    fn neg_log_failure_probability(&self) -> u32;

    /// Bytes per key, value and storage element.
    fn byte_l(&self) -> usize {
        F::ByteReprLen::to_usize()
    }

    /// Bits per field element.
    fn l(&self) -> usize {
        self.byte_l() * 8
    }

    /// n / m
    fn rate(&self) -> f64 {
        self.n() as f64 / self.m() as f64
    }

    /// Snapshot of the accessors above.
    fn descriptor(&self) -> OkvsDescriptor {
        OkvsDescriptor {
            okvs_type: self.okvs_type(),
            n: self.n(),
            byte_l: self.byte_l(),
            m: self.m(),
            hash_key_num: get_hash_key_num(self.okvs_type()),
        }
    }

    /// Encode `points` (unique `byteL`-byte keys) into `m` field elements.
    fn encode<K, RNG>(
        &self,
        rng: &mut RNG,
        points: &[(K, F)],
        options: EncodeOptions,
    ) -> Result<Vec<F>>
    where
        K: AsRef<[u8]>,
        RNG: CryptoRng + Rng;

    /// Decode the value of `key`. Keys that were never encoded yield pseudorandom output.
    fn decode(&self, storage: &[F], key: &[u8]) -> Result<F>;

    /// [Okvs::decode] for each of `keys`.
    fn decode_many<K: AsRef<[u8]>>(&self, storage: &[F], keys: &[K]) -> Result<Vec<F>> {
        keys.iter()
            .map(|key| self.decode(storage, key.as_ref()))
            .collect()
    }
}

/// Reject keys that are not exactly `byteL` bytes.
pub(crate) fn check_key<F: FF>(key: &[u8]) -> Result<()> {
    let expected = F::ByteReprLen::to_usize();
    if key.len() != expected {
        bail!(OkvsError::KeyLength {
            expected,
            actual: key.len(),
        });
    }
    Ok(())
}

/// Preconditions shared by every `encode`: size, key lengths, uniqueness.
pub(crate) fn check_points<K: AsRef<[u8]>, F: FF>(points: &[(K, F)], n: usize) -> Result<()> {
    if points.len() > n {
        bail!(OkvsError::TooManyPairs {
            capacity: n,
            actual: points.len(),
        });
    }

    let mut seen = HashSet::with_capacity(points.len());
    for (key, _) in points.iter() {
        let key = key.as_ref();
        check_key::<F>(key)?;
        if !seen.insert(key) {
            bail!(OkvsError::DuplicateKey);
        }
    }

    Ok(())
}

pub(crate) fn check_storage<F>(storage: &[F], m: usize) -> Result<()> {
    if storage.len() != m {
        bail!(OkvsError::StorageLength {
            expected: m,
            actual: storage.len(),
        });
    }
    Ok(())
}

/// Interpolating codecs map keys to field elements directly, so the field must separate `n`
/// keys from each other except with probability 2^-λ.
pub(crate) fn check_field_bits<F: FF>(n: usize, lambda: usize) -> Result<()> {
    let l = F::ByteReprLen::to_usize() * 8;
    let required = (n as f64).log2().ceil() as usize + lambda;
    if l < required {
        bail!(OkvsError::InvalidParameter(format!(
            "l (={}) < ceil(log2 n) + λ (={})",
            l, required
        )));
    }
    Ok(())
}

/// The GCT family sums storage elements with GF(2) coefficients.
pub(crate) fn check_characteristic_two<F: FF>() -> Result<()> {
    if F::one() + F::one() != F::zero() {
        bail!(OkvsError::InvalidParameter(
            "field must have characteristic 2".into()
        ));
    }
    Ok(())
}
