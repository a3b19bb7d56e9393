//! Bucketed polynomial OKVS.
//!
//! Pairs are hashed into about `n / ln n` bins, each bin interpolates its own polynomial of
//! `bin_size` coefficients, and the storage is the concatenation of all bin polynomials in bin
//! order. Decoding one key only touches the `bin_size` coefficients of its bin.

use super::bins::{encode_bins, partition};
use super::polynomial::interpolate_padded;
use super::*;
use crate::hash_utils::{key_to_field, HashKey, Prf, Sha256Prf};
use crate::params::{mega_bin, MegaBinParams, STATS_BIT_LENGTH};
use crate::solver::evaluate;
use anyhow::{Context, Result};
use log::debug;
use std::marker::PhantomData;

/// MegaBin OKVS over `F`, with bin hash `H`.
#[derive(Clone, Debug)]
pub struct MegaBinOkvs<F: FF, H: Prf = Sha256Prf> {
    n: usize,
    params: MegaBinParams,
    bin_hash: H,
    _field: PhantomData<F>,
}

impl<F: FF> MegaBinOkvs<F, Sha256Prf> {
    /// Create an instance with capacity `n`, hashing into bins with `hash_key`.
    pub fn new(n: usize, hash_key: HashKey) -> Result<Self> {
        Self::with_bin_hash(n, Sha256Prf::new(hash_key))
    }
}

impl<F: FF, H: Prf> MegaBinOkvs<F, H> {
    /// Create an instance with capacity `n` and an arbitrary bin hash.
    pub fn with_bin_hash(n: usize, bin_hash: H) -> Result<Self> {
        let params = mega_bin(n).with_context(|| format!("@{}:{}", file!(), line!()))?;
        check_field_bits::<F>(n, STATS_BIT_LENGTH)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!(
            "mega bin okvs: n = {}, bin_num = {}, bin_size = {}, m = {}",
            n,
            params.bin_num,
            params.bin_size,
            params.m()
        );

        Ok(Self {
            n,
            params,
            bin_hash,
            _field: PhantomData,
        })
    }

    /// Number of bins.
    pub fn bin_num(&self) -> usize {
        self.params.bin_num
    }

    /// Capacity of each bin, which is also its coefficient count.
    pub fn bin_size(&self) -> usize {
        self.params.bin_size
    }
}

impl<F, H> Okvs<F> for MegaBinOkvs<F, H>
where
    F: FF,
    H: Prf,
    Standard: Distribution<F>,
{
    fn okvs_type(&self) -> OkvsType {
        OkvsType::MegaBin
    }

    fn n(&self) -> usize {
        self.n
    }

    fn m(&self) -> usize {
        self.params.m()
    }

    fn neg_log_failure_probability(&self) -> u32 {
        STATS_BIT_LENGTH as u32
    }

    fn encode<K, RNG>(
        &self,
        rng: &mut RNG,
        points: &[(K, F)],
        options: EncodeOptions,
    ) -> Result<Vec<F>>
    where
        K: AsRef<[u8]>,
        RNG: CryptoRng + Rng,
    {
        check_points(points, self.n).with_context(|| format!("@{}:{}", file!(), line!()))?;

        let bin_size = self.params.bin_size;
        let bins = partition(points, &self.bin_hash, self.params.bin_num, bin_size)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!(
            "mega bin encode: {} pairs into {} bins (parallel: {})",
            points.len(),
            bins.len(),
            options.parallel
        );

        encode_bins(rng, &bins, bin_size, options.parallel, |rng, bin, out| {
            let coefficients = interpolate_padded(rng, bin, bin_size)?;
            out.copy_from_slice(&coefficients);
            Ok(())
        })
    }

    fn decode(&self, storage: &[F], key: &[u8]) -> Result<F> {
        check_storage(storage, self.m())?;
        check_key::<F>(key)?;

        let bin_size = self.params.bin_size;
        let bin = self.bin_hash.index(key, self.params.bin_num);
        let x = key_to_field::<F>(key).with_context(|| format!("@{}:{}", file!(), line!()))?;

        Ok(evaluate(&storage[bin * bin_size..(bin + 1) * bin_size], x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set_utils::{create_key_value_map, FromU128};
    use rand::SeedableRng;
    use scuttlebutt::field::{F128b, F64b};
    use scuttlebutt::{AesRng, Block};

    /// Sends every key whose first byte is below 90 to bin 0.
    struct CollidingPrf;

    impl Prf for CollidingPrf {
        fn fill_bytes(&self, input: &[u8], out: &mut [u8]) {
            let b = if input[0] < 90 { 0 } else { input[0] };
            out.iter_mut().for_each(|o| *o = b);
        }
    }

    fn test_mega_bin_base(n: usize, size: usize, parallel: bool) {
        let mut rng = AesRng::new();
        let okvs = MegaBinOkvs::<F128b>::new(n, rng.gen()).unwrap();
        let points = create_key_value_map::<F128b, _>(size, &mut rng).unwrap();

        let p = okvs
            .encode(&mut rng, &points, EncodeOptions { parallel })
            .unwrap();

        assert_eq!(p.len(), okvs.m());
        assert_eq!(okvs.m(), okvs.bin_num() * okvs.bin_size());

        for (key, value) in points.iter() {
            assert_eq!(okvs.decode(&p, key).unwrap(), *value);
        }
    }

    #[test]
    fn test_mega_bin() {
        for n in [1, 2, 8, 255, 256, 1000] {
            test_mega_bin_base(n, n, false);
        }
    }

    #[test]
    fn test_mega_bin_parallel() {
        for n in [256, 1000, 5000] {
            test_mega_bin_base(n, n, true);
        }
        test_mega_bin_base(1000, 10, true);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = AesRng::new();
        let okvs = MegaBinOkvs::<F128b>::new(2000, rng.gen()).unwrap();
        let points = create_key_value_map::<F128b, _>(2000, &mut rng).unwrap();

        let seed = rng.gen::<Block>();
        let seq = okvs
            .encode(
                &mut AesRng::from_seed(seed),
                &points,
                EncodeOptions { parallel: false },
            )
            .unwrap();
        let par = okvs
            .encode(
                &mut AesRng::from_seed(seed),
                &points,
                EncodeOptions { parallel: true },
            )
            .unwrap();

        assert_eq!(seq, par);
    }

    #[test]
    fn test_colliding_bin_hash_overflows() {
        let mut rng = AesRng::new();
        let okvs = MegaBinOkvs::<F128b, _>::with_bin_hash(100, CollidingPrf).unwrap();
        let points = (0..100u128)
            .map(|i| (i.to_le_bytes().to_vec(), F128b::from_u128(i)))
            .collect::<Vec<_>>();

        let err = okvs
            .encode(&mut rng, &points, EncodeOptions::default())
            .unwrap_err();

        let err = err.downcast_ref::<OkvsError>().unwrap();
        assert!(err.is_retryable());
        match err {
            OkvsError::BinOverflow {
                bin,
                size,
                capacity,
            } => {
                assert_eq!(*bin, 0);
                assert!(*size >= 90);
                assert_eq!(*capacity, okvs.bin_size());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_hash_keys_change_storage() {
        let mut rng = AesRng::new();
        let points = create_key_value_map::<F128b, _>(500, &mut rng).unwrap();
        let okvs0 = MegaBinOkvs::<F128b>::new(500, rng.gen()).unwrap();
        let okvs1 = MegaBinOkvs::<F128b>::new(500, rng.gen()).unwrap();

        let p0 = okvs0
            .encode(&mut rng, &points, EncodeOptions::default())
            .unwrap();
        let p1 = okvs1
            .encode(&mut rng, &points, EncodeOptions::default())
            .unwrap();

        assert_ne!(p0, p1);
        for (key, value) in points.iter() {
            assert_eq!(okvs0.decode(&p0, key).unwrap(), *value);
            assert_eq!(okvs1.decode(&p1, key).unwrap(), *value);
        }
    }

    #[test]
    fn test_neg_log_failure_probability() {
        let okvs = MegaBinOkvs::<F128b>::new(100, [0u8; 16]).unwrap();
        assert_eq!(okvs.neg_log_failure_probability(), 40);
        assert_eq!(okvs.okvs_type(), OkvsType::MegaBin);
    }

    #[test]
    fn test_short_field_rejected() {
        let err = MegaBinOkvs::<F64b>::new(1 << 25, [0u8; 16]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OkvsError>(),
            Some(OkvsError::InvalidParameter(_))
        ));
    }
}
