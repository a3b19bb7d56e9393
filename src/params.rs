//! Parameter calculation: storage lengths as closed-form functions of the capacity `n`.
//!
//! # Garbled cuckoo tables
//!
//! The storage splits into a sparse region of `sparse` columns, touched by `k` hash-selected
//! positions per key, and a dense region of `dense` columns, touched by a pseudorandom subset.
//!
//! - naive, k = 2: sparse = 2.4n, dense = 1.4 log n + λ
//! - naive, k = 3: sparse = 1.3n, dense = tabulated for n <= 2048, otherwise log n + λ
//! - blaze, k = 2: sparse = 2.0n, dense = λ / α_n + 1.9 + λ where α_n = a / (log n - c) + b
//!
//! Both sub-lengths are rounded up to whole bytes.
//!
//! See "PSI from PaXoS: Fast, Malicious Private Set Intersection" @ <https://eprint.iacr.org/2020/193>
//! and "Blazing Fast PSI from Improved OKVS and Subfield VOLE" @ <https://eprint.iacr.org/2022/320>.
//!
//! # Bins
//!
//! The bucketed variants size each bin with [max_bin_size], a union-bound over binomial tails,
//! so that no bin overflows except with probability 2^-λ.

use crate::error::OkvsError;
use anyhow::{bail, Context, Result};

/// Statistical security parameter λ (bits).
pub const STATS_BIT_LENGTH: usize = 40;

/// Expected number of items per bin in the cluster variants.
pub const CLUSTER_BIN_BALLS: usize = 1 << 14;

const BLAZE_A: f64 = 7.529;
const BLAZE_B: f64 = 0.610;
const BLAZE_C: f64 = 2.556;

/// Round a bit count up to a multiple of 8.
#[inline]
pub fn byte_bits(bits: usize) -> usize {
    bits.div_ceil(8) * 8
}

fn check_n(n: usize) -> Result<()> {
    if n == 0 {
        bail!(OkvsError::InvalidParameter(format!(
            "n (={}) must be positive",
            n
        )));
    }
    Ok(())
}

/// Storage length of the polynomial codec.
pub fn polynomial_m(n: usize) -> Result<usize> {
    check_n(n)?;
    Ok(n.max(2))
}

/// Sizing of the MegaBin codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MegaBinParams {
    /// Number of bins, about n / ln n.
    pub bin_num: usize,
    /// Worst-case pairs per bin, which is also the coefficient count of each bin polynomial.
    pub bin_size: usize,
}

impl MegaBinParams {
    /// Storage length.
    pub fn m(&self) -> usize {
        self.bin_num * self.bin_size
    }
}

/// Parameters for MegaBin.
pub fn mega_bin(n: usize) -> Result<MegaBinParams> {
    check_n(n)?;

    let bin_num = if n == 1 {
        1
    } else {
        ((n as f64 / (n as f64).ln()).ceil() as usize).max(1)
    };
    let bin_size = max_bin_size(n, bin_num, STATS_BIT_LENGTH)
        .with_context(|| format!("@{}:{}", file!(), line!()))?
        .max(2);

    Ok(MegaBinParams { bin_num, bin_size })
}

/// Sizing of a garbled cuckoo table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GctParams {
    /// Number of sparse positions per key.
    pub hash_num: usize,
    /// Length of the sparse region.
    pub sparse: usize,
    /// Length of the dense region.
    pub dense: usize,
}

impl GctParams {
    /// Storage length.
    pub fn m(&self) -> usize {
        self.sparse + self.dense
    }
}

/// GCT with two hash functions and the 2-core bound.
pub fn h2_naive(n: usize, lambda: usize) -> Result<GctParams> {
    check_n(n)?;

    let logn = (n as f64).log2();
    let sparse = byte_bits((2.4 * n as f64).ceil() as usize);
    let dense = byte_bits((1.4 * logn).ceil() as usize + lambda);

    Ok(GctParams {
        hash_num: 2,
        sparse,
        dense,
    })
}

/// GCT with three hash functions.
pub fn h3_naive(n: usize, lambda: usize) -> Result<GctParams> {
    check_n(n)?;

    let sparse = byte_bits((1.3 * n as f64).ceil() as usize);
    // the asymptotic bound is too loose below 2^11, so these are measured
    let dense = match n {
        0..=256 => 186,
        257..=512 => 328,
        513..=1024 => 561,
        1025..=2048 => 907,
        _ => (n as f64).log2().ceil() as usize + lambda,
    };

    Ok(GctParams {
        hash_num: 3,
        sparse,
        dense: byte_bits(dense),
    })
}

/// GCT with two hash functions and the tightened bound.
pub fn h2_blaze(n: usize, lambda: usize) -> Result<GctParams> {
    check_n(n)?;

    let sparse = byte_bits((2.0 * n as f64).ceil() as usize);
    // α_n diverges at log n = c
    let logn = (n as f64).log2().max(BLAZE_C + 1.0);
    let alpha = BLAZE_A / (logn - BLAZE_C) + BLAZE_B;
    let g = lambda as f64 / alpha;
    let dense = byte_bits((g + 1.9).ceil() as usize + lambda);

    Ok(GctParams {
        hash_num: 2,
        sparse,
        dense,
    })
}

/// Sizing of a cluster GCT: `bin_num` independent tables of identical shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterParams {
    /// Number of bins.
    pub bin_num: usize,
    /// Worst-case pairs per bin.
    pub bin_n: usize,
    /// Shape of each bin's table, sized for `bin_n`.
    pub bin: GctParams,
}

impl ClusterParams {
    /// Storage length.
    pub fn m(&self) -> usize {
        self.bin_num * self.bin.m()
    }
}

/// Parameters for a cluster GCT whose bins follow `base`.
pub fn cluster(
    n: usize,
    lambda: usize,
    base: fn(usize, usize) -> Result<GctParams>,
) -> Result<ClusterParams> {
    check_n(n)?;

    let bin_num = n.div_ceil(CLUSTER_BIN_BALLS);
    let bin_n = max_bin_size(n, bin_num, lambda)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    let bin = base(bin_n, lambda).with_context(|| format!("@{}:{}", file!(), line!()))?;

    Ok(ClusterParams {
        bin_num,
        bin_n,
        bin,
    })
}

/// Upper bound on the fullest bin when `ball_num` balls go into `bin_num` bins uniformly.
///
/// Returns the smallest `s >= ceil(ball_num / bin_num)` with
/// $`b \cdot \Pr[\mathrm{Bin}(n, 1/b) > s] \le 2^{-\lambda}`$.
/// Past the mean the binomial terms shrink geometrically, so the tail after `s` is bounded by
/// its first term over `1 - r` for the term ratio `r`.
pub fn max_bin_size(ball_num: usize, bin_num: usize, lambda: usize) -> Result<usize> {
    if ball_num == 0 || bin_num == 0 {
        bail!(OkvsError::InvalidParameter(format!(
            "ball_num (={}) and bin_num (={}) must be positive",
            ball_num, bin_num
        )));
    }

    if bin_num == 1 {
        return Ok(ball_num);
    }

    let n = ball_num as f64;
    let b = bin_num as f64;
    let p = 1.0 / b;
    let ln_odds = p.ln() - (1.0 - p).ln();
    let target = -(lambda as f64) * std::f64::consts::LN_2 - b.ln();
    let floor = ball_num.div_ceil(bin_num);

    // ln Pr[X = 0]
    let mut ln_pmf = n * (1.0 - p).ln();
    for k in 0..ball_num {
        let kf = k as f64;
        // ln Pr[X = k + 1]
        let next = ln_pmf + (n - kf).ln() - (kf + 1.0).ln() + ln_odds;

        if k >= floor {
            let ratio = (n - kf - 1.0) / (kf + 2.0) * p / (1.0 - p);
            if ratio < 1.0 && next - (1.0 - ratio).ln() <= target {
                return Ok(k);
            }
        }

        ln_pmf = next;
    }

    Ok(ball_num)
}
