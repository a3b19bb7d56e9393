//! Partition-then-map over bins.
//!
//! Pairs are first partitioned into owned buckets. Each bucket is then encoded into its own
//! disjoint slice of the storage, on the calling thread or on a scoped worker pool. Per-bin RNG
//! seeds are drawn before the fan-out, so both modes produce the same storage.

use crate::error::OkvsError;
use crate::hash_utils::Prf;
use anyhow::{anyhow, bail, Result};
use log::{trace, warn};
use rand::{CryptoRng, Rng, SeedableRng};
use scuttlebutt::field::FiniteField as FF;
use scuttlebutt::{AesRng, Block};

pub(crate) type Bin<'a, F> = Vec<(&'a [u8], F)>;

/// Hash every key into one of `bin_num` bins, failing if any bin exceeds `capacity`.
pub(crate) fn partition<'a, K, F, H>(
    points: &'a [(K, F)],
    bin_hash: &H,
    bin_num: usize,
    capacity: usize,
) -> Result<Vec<Bin<'a, F>>>
where
    K: AsRef<[u8]>,
    F: FF,
    H: Prf + ?Sized,
{
    let mut bins: Vec<Bin<'a, F>> = (0..bin_num).map(|_| Vec::new()).collect();

    for (key, value) in points.iter() {
        let key = key.as_ref();
        bins[bin_hash.index(key, bin_num)].push((key, *value));
    }

    if let Some((bin, items)) = bins
        .iter()
        .enumerate()
        .find(|(_, items)| items.len() > capacity)
    {
        warn!(
            "bin {} overflows: {} pairs, capacity {}",
            bin,
            items.len(),
            capacity
        );
        bail!(OkvsError::BinOverflow {
            bin,
            size: items.len(),
            capacity,
        });
    }

    Ok(bins)
}

/// Encode every bin into its `bin_m`-element slice of the output, concatenated in bin order.
pub(crate) fn encode_bins<F, RNG, E>(
    rng: &mut RNG,
    bins: &[Bin<'_, F>],
    bin_m: usize,
    parallel: bool,
    encode_bin: E,
) -> Result<Vec<F>>
where
    F: FF,
    RNG: CryptoRng + Rng,
    E: Fn(&mut AesRng, &[(&[u8], F)], &mut [F]) -> Result<()> + Sync,
{
    let seeds = (0..bins.len()).map(|_| rng.gen::<Block>()).collect::<Vec<_>>();
    let mut storage = vec![F::zero(); bins.len() * bin_m];

    if !parallel || bins.len() <= 1 {
        for ((bin, seed), out) in bins.iter().zip(seeds).zip(storage.chunks_mut(bin_m)) {
            encode_bin(&mut AesRng::from_seed(seed), bin, out)?;
        }
        return Ok(storage);
    }

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let per_worker = bins.len().div_ceil(workers);
    trace!(
        "encoding {} bins on {} workers",
        bins.len(),
        bins.len().div_ceil(per_worker)
    );

    let encode_bin = &encode_bin;
    crossbeam::thread::scope(|s| {
        let handles = storage
            .chunks_mut(per_worker * bin_m)
            .zip(bins.chunks(per_worker))
            .zip(seeds.chunks(per_worker))
            .map(|((out, bins), seeds)| {
                s.spawn(move |_| -> Result<()> {
                    for ((bin, seed), out) in bins.iter().zip(seeds).zip(out.chunks_mut(bin_m)) {
                        encode_bin(&mut AesRng::from_seed(*seed), bin, out)?;
                    }
                    Ok(())
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow!("bin encoding worker panicked"))??;
        }

        Ok::<(), anyhow::Error>(())
    })
    .map_err(|_| anyhow!("bin encoding scope panicked"))??;

    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_utils::Sha256Prf;
    use crate::set_utils::{create_key_value_map, FromU128};
    use scuttlebutt::field::F128b;

    fn fill_with_sum(
        rng: &mut AesRng,
        bin: &[(&[u8], F128b)],
        out: &mut [F128b],
    ) -> Result<()> {
        let mut sum = rng.gen::<F128b>();
        for (_, v) in bin.iter() {
            sum += *v;
        }
        for o in out.iter_mut() {
            *o = sum;
        }
        Ok(())
    }

    #[test]
    fn test_partition() {
        let mut rng = AesRng::new();
        let points = create_key_value_map::<F128b, _>(200, &mut rng).unwrap();
        let prf = Sha256Prf::new(rng.gen());

        let bins = partition(&points, &prf, 7, 200).unwrap();

        assert_eq!(bins.len(), 7);
        assert_eq!(bins.iter().map(|b| b.len()).sum::<usize>(), 200);
        for (i, bin) in bins.iter().enumerate() {
            for (key, _) in bin.iter() {
                assert_eq!(prf.index(key, 7), i);
            }
        }
    }

    #[test]
    fn test_partition_overflow() {
        let mut rng = AesRng::new();
        let points = create_key_value_map::<F128b, _>(100, &mut rng).unwrap();
        let prf = Sha256Prf::new(rng.gen());

        let err = partition(&points, &prf, 1, 99).unwrap_err();

        assert_eq!(
            err.downcast_ref::<OkvsError>(),
            Some(&OkvsError::BinOverflow {
                bin: 0,
                size: 100,
                capacity: 99
            })
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = AesRng::new();
        let points = create_key_value_map::<F128b, _>(300, &mut rng).unwrap();
        let prf = Sha256Prf::new(rng.gen());
        let bins = partition(&points, &prf, 37, 300).unwrap();

        let seed = rng.gen::<Block>();
        let seq = encode_bins(
            &mut AesRng::from_seed(seed),
            &bins,
            3,
            false,
            fill_with_sum,
        )
        .unwrap();
        let par = encode_bins(
            &mut AesRng::from_seed(seed),
            &bins,
            3,
            true,
            fill_with_sum,
        )
        .unwrap();

        assert_eq!(seq.len(), 37 * 3);
        assert_eq!(seq, par);
    }

    #[test]
    fn test_worker_error_propagates() {
        let mut rng = AesRng::new();
        let points = vec![(vec![1u8; 16], F128b::from_u128(1))];
        let prf = Sha256Prf::new(rng.gen());
        let bins = partition(&points, &prf, 4, 1).unwrap();

        for parallel in [false, true] {
            let res = encode_bins(&mut rng, &bins, 2, parallel, |_, bin, _| {
                if bin.is_empty() {
                    Ok(())
                } else {
                    bail!(OkvsError::DuplicateKey)
                }
            });
            assert!(res.is_err());
        }
    }
}
