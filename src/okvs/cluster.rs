//! Cluster garbled cuckoo tables.
//!
//! Pairs are hashed into `ceil(n / 2^14)` bins, and every bin is an independent GCT sized for the
//! fullest bin. All bins share the position and dense keys. Per-key work is independent of `n`,
//! and bins can be encoded in parallel.

use super::bins::{encode_bins, partition};
use super::gct::GctCore;
use super::*;
use crate::hash_utils::{HashKey, Prf, Sha256Prf};
use crate::params::{cluster, h2_blaze, h3_naive, ClusterParams, STATS_BIT_LENGTH};
use anyhow::{Context, Result};
use log::debug;
use std::marker::PhantomData;

/// Sizing of the cluster GCT kinds.
pub fn cluster_params(okvs_type: OkvsType, n: usize) -> Result<ClusterParams> {
    match okvs_type {
        OkvsType::H2ClusterBlazeGct => cluster(n, STATS_BIT_LENGTH, h2_blaze),
        OkvsType::H3ClusterNaiveGct => cluster(n, STATS_BIT_LENGTH, h3_naive),
        _ => bail!(OkvsError::InvalidParameter(format!(
            "{} is not a cluster gct",
            okvs_type
        ))),
    }
}

/// Cluster GCT over `F`, with bin hash `H`.
#[derive(Clone, Debug)]
pub struct ClusterGctOkvs<F: FF, H: Prf = Sha256Prf> {
    okvs_type: OkvsType,
    n: usize,
    bin_num: usize,
    bin_n: usize,
    bin_hash: H,
    core: GctCore,
    _field: PhantomData<F>,
}

impl<F: FF> ClusterGctOkvs<F, Sha256Prf> {
    /// Create an instance of `okvs_type` (one of the cluster kinds) with capacity `n`.
    pub fn new(
        okvs_type: OkvsType,
        n: usize,
        bin_key: HashKey,
        position_key: HashKey,
        dense_key: HashKey,
    ) -> Result<Self> {
        Self::with_bin_hash(
            okvs_type,
            n,
            Sha256Prf::new(bin_key),
            position_key,
            dense_key,
        )
    }
}

impl<F: FF, H: Prf> ClusterGctOkvs<F, H> {
    /// Create an instance with an arbitrary bin hash.
    pub fn with_bin_hash(
        okvs_type: OkvsType,
        n: usize,
        bin_hash: H,
        position_key: HashKey,
        dense_key: HashKey,
    ) -> Result<Self> {
        let params =
            cluster_params(okvs_type, n).with_context(|| format!("@{}:{}", file!(), line!()))?;
        check_characteristic_two::<F>().with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!(
            "{} okvs: n = {}, bin_num = {}, bin_n = {}, bin sparse = {}, bin dense = {}",
            okvs_type, n, params.bin_num, params.bin_n, params.bin.sparse, params.bin.dense
        );

        Ok(Self {
            okvs_type,
            n,
            bin_num: params.bin_num,
            bin_n: params.bin_n,
            bin_hash,
            core: GctCore::new(params.bin, position_key, dense_key),
            _field: PhantomData,
        })
    }

    /// Number of bins.
    pub fn bin_num(&self) -> usize {
        self.bin_num
    }

    /// Capacity of each bin.
    pub fn bin_n(&self) -> usize {
        self.bin_n
    }

    /// Storage length of each bin.
    pub fn bin_m(&self) -> usize {
        self.core.params().m()
    }
}

impl<F, H> Okvs<F> for ClusterGctOkvs<F, H>
where
    F: FF,
    H: Prf,
    Standard: Distribution<F>,
{
    fn okvs_type(&self) -> OkvsType {
        self.okvs_type
    }

    fn n(&self) -> usize {
        self.n
    }

    fn m(&self) -> usize {
        self.bin_num * self.bin_m()
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

        let bins = partition(points, &self.bin_hash, self.bin_num, self.bin_n)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!(
            "{} encode: {} pairs into {} bins (parallel: {})",
            self.okvs_type,
            points.len(),
            bins.len(),
            options.parallel
        );

        let core = &self.core;
        encode_bins(rng, &bins, self.bin_m(), options.parallel, |rng, bin, out| {
            core.encode_into(rng, bin, out)
        })
    }

    fn decode(&self, storage: &[F], key: &[u8]) -> Result<F> {
        check_storage(storage, self.m())?;
        check_key::<F>(key)?;

        let bin_m = self.bin_m();
        let bin = self.bin_hash.index(key, self.bin_num);

        self.core
            .decode_from(&storage[bin * bin_m..(bin + 1) * bin_m], key)
    }
}
