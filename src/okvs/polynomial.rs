//! An exact OKVS by polynomial interpolation.
//!
//! Keys are read as field elements $`x_i`$ and the storage holds the coefficients of the unique
//! polynomial of degree $`< m`$ through $`(x_i, y_i)`$. Decoding is a Horner evaluation, so it
//! never fails and a non-member key simply evaluates to garbage.
//!
//! The storage always has `m = max(n, 2)` coefficients. An input with fewer than `m` pairs is
//! padded with random dummy points so that the coefficients stay uniformly distributed.
//!
//! Encoding takes $`O(m^2)`$, decoding $`O(m)`$.

use super::*;
use crate::hash_utils::key_to_field;
use crate::params::{polynomial_m, STATS_BIT_LENGTH};
use crate::solver::{evaluate, interpolate};
use anyhow::{Context, Result};
use log::debug;
use std::marker::PhantomData;

/// Polynomial OKVS over `F`. Uses no hash keys.
#[derive(Clone, Debug)]
pub struct PolynomialOkvs<F: FF> {
    n: usize,
    m: usize,
    _field: PhantomData<F>,
}

impl<F: FF> PolynomialOkvs<F> {
    /// Create an instance with capacity `n`.
    pub fn new(n: usize) -> Result<Self> {
        let m = polynomial_m(n).with_context(|| format!("@{}:{}", file!(), line!()))?;
        check_field_bits::<F>(n, STATS_BIT_LENGTH)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!("polynomial okvs: n = {}, m = {}", n, m);

        Ok(Self {
            n,
            m,
            _field: PhantomData,
        })
    }
}

/// Interpolate `points` padded with random dummy points up to exactly `m` coefficients.
///
/// Shared with the bins of [super::MegaBinOkvs].
pub(crate) fn interpolate_padded<F, RNG>(
    rng: &mut RNG,
    points: &[(&[u8], F)],
    m: usize,
) -> Result<Vec<F>>
where
    F: FF,
    RNG: CryptoRng + Rng,
    Standard: Distribution<F>,
{
    let mut xy = points
        .iter()
        .map(|(key, y)| Ok((key_to_field::<F>(key)?, *y)))
        .collect::<Result<Vec<_>>>()?;

    while xy.len() < m {
        let x: F = rng.gen();
        if xy.iter().any(|(xi, _)| *xi == x) {
            continue;
        }
        xy.push((x, rng.gen()));
    }

    interpolate(&xy).with_context(|| format!("@{}:{}", file!(), line!()))
}

impl<F> Okvs<F> for PolynomialOkvs<F>
where
    F: FF,
    Standard: Distribution<F>,
{
    fn okvs_type(&self) -> OkvsType {
        OkvsType::Polynomial
    }

    fn n(&self) -> usize {
        self.n
    }

    fn m(&self) -> usize {
        self.m
    }

    fn neg_log_failure_probability(&self) -> u32 {
        u32::MAX
    }

    fn encode<K, RNG>(
        &self,
        rng: &mut RNG,
        points: &[(K, F)],
        _options: EncodeOptions,
    ) -> Result<Vec<F>>
    where
        K: AsRef<[u8]>,
        RNG: CryptoRng + Rng,
    {
        check_points(points, self.n).with_context(|| format!("@{}:{}", file!(), line!()))?;

        if points.is_empty() {
            return Ok(vec![F::zero(); self.m]);
        }

        let points = points
            .iter()
            .map(|(key, value)| (key.as_ref(), *value))
            .collect::<Vec<_>>();

        interpolate_padded(rng, &points, self.m)
    }

    fn decode(&self, storage: &[F], key: &[u8]) -> Result<F> {
        check_storage(storage, self.m)?;
        check_key::<F>(key)?;

        let x = key_to_field::<F>(key).with_context(|| format!("@{}:{}", file!(), line!()))?;

        Ok(evaluate(storage, x))
    }
}
