//! Distinct sparse positions for a key.
//!
//! Position `j` is first reduced into `[0, bound - j)`, then lifted over every already fixed
//! position that is not greater than it. This is an order-statistics insertion, so the `k`
//! outputs are pairwise distinct and all lie in `[0, bound)` without any rejection sampling.

use crate::error::OkvsError;
use crate::hash_utils::Prf;
use anyhow::{bail, Result};

/// Map `key` to `k` pairwise-distinct positions in `[0, bound)`, sorted ascending.
pub fn distinct_positions<P: Prf + ?Sized>(
    prf: &P,
    key: &[u8],
    k: usize,
    bound: usize,
) -> Result<Vec<usize>> {
    if k == 0 || bound < k {
        bail!(OkvsError::InvalidParameter(format!(
            "cannot draw k (={}) distinct positions below bound (={})",
            k, bound
        )));
    }

    let mut hashes = vec![0u32; k];
    prf.u32s(key, &mut hashes);

    Ok(positions_from_hashes(&hashes, bound))
}

/// The deterministic part of [distinct_positions]. Requires `bound >= hashes.len()`.
pub(crate) fn positions_from_hashes(hashes: &[u32], bound: usize) -> Vec<usize> {
    let mut positions: Vec<usize> = Vec::with_capacity(hashes.len());

    for (j, &h) in hashes.iter().enumerate() {
        let mut hj = (h as u64 % (bound - j) as u64) as usize;

        // positions is sorted, so a single increasing pass lifts hj past every smaller entry
        let mut rank = 0;
        for &p in positions.iter() {
            if p <= hj {
                hj += 1;
                rank += 1;
            } else {
                break;
            }
        }

        positions.insert(rank, hj);
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_utils::{HashKey, Sha256Prf};
    use proptest::prelude::*;
    use rand::Rng;
    use scuttlebutt::AesRng;

    fn assert_valid(positions: &[usize], k: usize, bound: usize) {
        assert_eq!(positions.len(), k);
        for w in positions.windows(2) {
            assert!(w[0] < w[1]);
        }
        for &p in positions.iter() {
            assert!(p < bound);
        }
    }

    #[test]
    fn test_two_positions() {
        // h1 lands on h0 and is lifted past it
        assert_eq!(positions_from_hashes(&[5, 5], 10), vec![5, 6]);
        assert_eq!(positions_from_hashes(&[5, 4], 10), vec![4, 5]);
        assert_eq!(positions_from_hashes(&[9, 8], 10), vec![8, 9]);
        assert_eq!(positions_from_hashes(&[0, 0], 2), vec![0, 1]);
    }

    #[test]
    fn test_three_positions() {
        assert_eq!(positions_from_hashes(&[3, 3, 3], 10), vec![3, 4, 5]);
        assert_eq!(positions_from_hashes(&[3, 2, 2], 10), vec![2, 3, 4]);
        assert_eq!(positions_from_hashes(&[0, 0, 0], 3), vec![0, 1, 2]);
        // reductions mod 10, 9, 8 give 7, 8 -> 9, 1
        assert_eq!(positions_from_hashes(&[17, 17, 17], 10), vec![1, 7, 9]);
    }

    #[test]
    fn test_full_bound() {
        let positions = positions_from_hashes(&[u32::MAX; 8], 8);
        assert_eq!(positions, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_bound_too_small() {
        let prf = Sha256Prf::new([0u8; 16]);

        assert!(distinct_positions(&prf, b"key", 3, 2).is_err());
        assert!(distinct_positions(&prf, b"key", 0, 2).is_err());
        assert!(distinct_positions(&prf, b"key", 2, 2).is_ok());
    }

    #[test]
    fn test_random_keys() {
        let mut rng = AesRng::new();
        let hash_key: HashKey = rng.gen();
        let prf = Sha256Prf::new(hash_key);

        for k in [2, 3, 5] {
            for bound in [k, k + 1, 16, 1000] {
                for _ in 0..200 {
                    let key: [u8; 16] = rng.gen();
                    let positions = distinct_positions(&prf, &key, k, bound).unwrap();
                    assert_valid(&positions, k, bound);
                    assert_eq!(
                        positions,
                        distinct_positions(&prf, &key, k, bound).unwrap()
                    );
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_positions_distinct(
            hashes in proptest::collection::vec(any::<u32>(), 1..10),
            extra in 0usize..64,
        ) {
            let bound = hashes.len() + extra;
            let positions = positions_from_hashes(&hashes, bound);

            prop_assert_eq!(positions.len(), hashes.len());
            for w in positions.windows(2) {
                prop_assert!(w[0] < w[1]);
            }
            for &p in positions.iter() {
                prop_assert!(p < bound);
            }
            prop_assert_eq!(positions, positions_from_hashes(&hashes, bound));
        }
    }
}
