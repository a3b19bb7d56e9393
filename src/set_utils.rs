//! Utility functions for creating key-value maps to encode.

use anyhow::{bail, Result};
use itertools::Itertools;
use num_traits::Zero;
use rand::distributions::{Distribution, Standard};
use rand::{CryptoRng, Rng};
use scuttlebutt::field::{FiniteField as FF, F128b};
use scuttlebutt::serialization::CanonicalSerialize;
use typenum::marker_traits::Unsigned;

/// Trait for converting u128 to a type.
pub trait FromU128 {
    /// Convert u128 to a type.
    fn from_u128(x: u128) -> Self;
}

impl FromU128 for F128b {
    fn from_u128(x: u128) -> Self {
        let b = x.to_le_bytes();
        // every 16-byte string is a valid element
        F128b::from_bytes(&b.into()).unwrap_or_else(|_| F128b::zero())
    }
}

fn check_key_space(n: usize, byte_l: usize) -> Result<()> {
    if byte_l < 8 && (n as u64) > 1 << (8 * byte_l) {
        bail!(
            "n (={}) distinct keys do not fit in {} bytes @{}:{}",
            n,
            byte_l,
            file!(),
            line!()
        );
    }
    Ok(())
}

/// Create `n` pairs with distinct random `byteL`-byte keys and random values.
///
/// Keys are the byte representations of random field elements, so they can also be read back as
/// field elements by the interpolating codecs.
pub fn create_key_value_map<F, RNG>(n: usize, rng: &mut RNG) -> Result<Vec<(Vec<u8>, F)>>
where
    F: FF,
    RNG: CryptoRng + Rng,
    Standard: Distribution<F>,
{
    check_key_space(n, F::ByteReprLen::to_usize())?;

    let keys = std::iter::repeat_with(|| rng.gen::<F>().to_bytes().to_vec())
        .unique()
        .take(n)
        .collect_vec();

    let points = keys
        .into_iter()
        .map(|key| (key, rng.gen::<F>()))
        .collect_vec();

    Ok(points)
}
