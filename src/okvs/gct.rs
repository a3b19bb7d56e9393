//! Garbled cuckoo tables.
//!
//! # Layout
//!
//! The storage is `L || R` with `|L| = sparse` and `|R| = dense`. A key `x` selects `k` distinct
//! sparse positions $`h_1(x), \ldots, h_k(x)`$ and a pseudorandom bit vector $`r(x)`$ of length
//! `dense`, and
//!
//! ```text
//! decode(D, x) = Σ_i L[h_i(x)] + <r(x), R>
//! ```
//!
//! # Encoding
//!
//! 1. Fill `L || R` with random elements.
//! 2. Peel the cuckoo hypergraph: while some sparse column is touched by exactly one remaining
//!    row, remove that row and remember the column it owns.
//! 3. The rows that cannot be peeled form the core. Solve it by Gaussian elimination over the
//!    core's sparse columns and all of `R`.
//! 4. Assign the owned column of each peeled row, in reverse peeling order.
//!
//! See "PSI from PaXoS: Fast, Malicious Private Set Intersection" @ <https://eprint.iacr.org/2020/193>
//! and "Blazing Fast PSI from Improved OKVS and Subfield VOLE" @ <https://eprint.iacr.org/2022/320>.

use super::*;
use crate::hash_utils::{HashKey, Prf, Sha256Prf};
use crate::params::{h2_blaze, h2_naive, h3_naive, GctParams, STATS_BIT_LENGTH};
use crate::positions::distinct_positions;
use crate::solver::gaussian_eliminations::{assign_pivots, gaussian_elimination, Row};
use anyhow::{Context, Result};
use log::{debug, trace, warn};
use std::collections::VecDeque;
use std::marker::PhantomData;

const NOT_IN_CORE: usize = usize::MAX;

/// Sizing of the single-table GCT kinds.
pub fn gct_params(okvs_type: OkvsType, n: usize) -> Result<GctParams> {
    match okvs_type {
        OkvsType::H2NaiveGct => h2_naive(n, STATS_BIT_LENGTH),
        OkvsType::H2BlazeGct => h2_blaze(n, STATS_BIT_LENGTH),
        OkvsType::H3NaiveGct => h3_naive(n, STATS_BIT_LENGTH),
        _ => bail!(OkvsError::InvalidParameter(format!(
            "{} is not a single-table gct",
            okvs_type
        ))),
    }
}

/// Rows of a set of keys: `k` positions and `dense / 8` bytes each, stored flat.
struct Rows {
    hash_num: usize,
    dense_bytes: usize,
    positions: Vec<usize>,
    bits: Vec<u8>,
}

impl Rows {
    fn positions(&self, i: usize) -> &[usize] {
        &self.positions[i * self.hash_num..(i + 1) * self.hash_num]
    }

    fn bits(&self, i: usize) -> &[u8] {
        &self.bits[i * self.dense_bytes..(i + 1) * self.dense_bytes]
    }
}

#[inline]
fn dense_ones(bits: &[u8]) -> impl Iterator<Item = usize> + '_ {
    bits.iter().enumerate().flat_map(|(i, &byte)| {
        (0..8)
            .filter(move |j| (byte >> j) & 1 == 1)
            .map(move |j| i * 8 + j)
    })
}

/// The table shared by [GctOkvs] and each bin of [super::ClusterGctOkvs].
#[derive(Clone, Debug)]
pub(crate) struct GctCore {
    params: GctParams,
    position_prf: Sha256Prf,
    dense_prf: Sha256Prf,
}

impl GctCore {
    pub(crate) fn new(params: GctParams, position_key: HashKey, dense_key: HashKey) -> Self {
        Self {
            params,
            position_prf: Sha256Prf::new(position_key),
            dense_prf: Sha256Prf::new(dense_key),
        }
    }

    pub(crate) fn params(&self) -> &GctParams {
        &self.params
    }

    fn dense_bits(&self, key: &[u8], out: &mut [u8]) {
        self.dense_prf.fill_bytes(key, out);
    }

    fn rows<F: FF>(&self, points: &[(&[u8], F)]) -> Result<Rows> {
        let hash_num = self.params.hash_num;
        let dense_bytes = self.params.dense / 8;
        let mut rows = Rows {
            hash_num,
            dense_bytes,
            positions: Vec::with_capacity(points.len() * hash_num),
            bits: vec![0u8; points.len() * dense_bytes],
        };

        for (i, (key, _)) in points.iter().enumerate() {
            let positions =
                distinct_positions(&self.position_prf, key, hash_num, self.params.sparse)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
            rows.positions.extend(positions);
            self.dense_bits(key, &mut rows.bits[i * dense_bytes..(i + 1) * dense_bytes]);
        }

        Ok(rows)
    }

    /// Σ over the row of `key` in `storage`, which must be exactly `params.m()` long.
    pub(crate) fn decode_from<F: FF>(&self, storage: &[F], key: &[u8]) -> Result<F> {
        let positions =
            distinct_positions(&self.position_prf, key, self.params.hash_num, self.params.sparse)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
        let mut bits = vec![0u8; self.params.dense / 8];
        self.dense_bits(key, &mut bits);

        let mut sum = F::zero();
        for p in positions {
            sum += storage[p];
        }
        for j in dense_ones(&bits) {
            sum += storage[self.params.sparse + j];
        }

        Ok(sum)
    }

    /// Encode `points` into `out`, which must be exactly `params.m()` long.
    pub(crate) fn encode_into<F, RNG>(
        &self,
        rng: &mut RNG,
        points: &[(&[u8], F)],
        out: &mut [F],
    ) -> Result<()>
    where
        F: FF,
        RNG: CryptoRng + Rng,
        Standard: Distribution<F>,
    {
        let sparse = self.params.sparse;
        let dense = self.params.dense;

        // 1. L || R <-$ F^m
        for o in out.iter_mut() {
            *o = rng.gen();
        }

        if points.is_empty() {
            return Ok(());
        }

        let rows = self
            .rows(points)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        // 2. peeling
        let (peeled, alive) = peel(&rows, points.len(), sparse);
        trace!(
            "gct peeling: {} rows peeled, {} rows in core",
            peeled.len(),
            points.len() - peeled.len()
        );

        // 3. core
        let core = (0..points.len()).filter(|&i| alive[i]).collect::<Vec<_>>();
        if !core.is_empty() {
            solve_core(&rows, points, &core, sparse, dense, out)?;
        }

        // 4. back substitution
        for &(i, c) in peeled.iter().rev() {
            let mut sum = points[i].1;
            for &p in rows.positions(i) {
                if p != c {
                    sum += out[p];
                }
            }
            for j in dense_ones(rows.bits(i)) {
                sum += out[sparse + j];
            }
            out[c] = sum;
        }

        Ok(())
    }
}

/// Returns `(row, owned column)` in peeling order and the rows left in the core.
fn peel(rows: &Rows, row_num: usize, sparse: usize) -> (Vec<(usize, usize)>, Vec<bool>) {
    // column -> rows, as CSR
    let mut degree = vec![0usize; sparse];
    for &p in rows.positions.iter() {
        degree[p] += 1;
    }
    let mut offsets = vec![0usize; sparse + 1];
    for c in 0..sparse {
        offsets[c + 1] = offsets[c] + degree[c];
    }
    let mut cursor = offsets.clone();
    let mut col_rows = vec![0usize; rows.positions.len()];
    for i in 0..row_num {
        for &p in rows.positions(i) {
            col_rows[cursor[p]] = i;
            cursor[p] += 1;
        }
    }

    let mut alive = vec![true; row_num];
    let mut peeled = Vec::with_capacity(row_num);
    let mut queue = (0..sparse)
        .filter(|&c| degree[c] == 1)
        .collect::<VecDeque<_>>();

    while let Some(c) = queue.pop_front() {
        if degree[c] != 1 {
            continue;
        }
        let Some(&i) = col_rows[offsets[c]..offsets[c + 1]]
            .iter()
            .find(|&&i| alive[i])
        else {
            continue;
        };

        alive[i] = false;
        peeled.push((i, c));
        for &p in rows.positions(i) {
            degree[p] -= 1;
            if degree[p] == 1 {
                queue.push_back(p);
            }
        }
    }

    (peeled, alive)
}

fn solve_core<F: FF>(
    rows: &Rows,
    points: &[(&[u8], F)],
    core: &[usize],
    sparse: usize,
    dense: usize,
    out: &mut [F],
) -> Result<()> {
    // compact indices for the sparse columns the core touches
    let mut compact = vec![NOT_IN_CORE; sparse];
    let mut columns = Vec::new();
    for &i in core.iter() {
        for &p in rows.positions(i) {
            if compact[p] == NOT_IN_CORE {
                compact[p] = columns.len();
                columns.push(p);
            }
        }
    }

    let width = columns.len() + dense;
    if core.len() > width {
        warn!(
            "gct core is over-determined: {} rows, {} columns",
            core.len(),
            width
        );
        bail!(OkvsError::Unsolvable {
            rows: core.len(),
            columns: width,
        });
    }

    let matrix = core
        .iter()
        .map(|&i| {
            let mut row = Row::zero(width, points[i].1);
            for &p in rows.positions(i) {
                row.set(compact[p]);
            }
            for j in dense_ones(rows.bits(i)) {
                row.set(columns.len() + j);
            }
            row
        })
        .collect::<Vec<_>>();

    debug!("gct core: {} rows, {} columns", core.len(), width);

    let Some(pivots) =
        gaussian_elimination(matrix, width).with_context(|| format!("@{}:{}", file!(), line!()))?
    else {
        warn!(
            "gct core is singular: {} rows, {} columns",
            core.len(),
            width
        );
        bail!(OkvsError::Unsolvable {
            rows: core.len(),
            columns: width,
        });
    };

    // free variables keep their random fill
    let mut vars = columns
        .iter()
        .map(|&c| out[c])
        .chain(out[sparse..sparse + dense].iter().copied())
        .collect::<Vec<_>>();
    assign_pivots(&pivots, &mut vars);

    for (&c, v) in columns.iter().zip(vars.iter()) {
        out[c] = *v;
    }
    out[sparse..sparse + dense].copy_from_slice(&vars[columns.len()..]);

    Ok(())
}

/// Single-table garbled cuckoo table over `F`.
#[derive(Clone, Debug)]
pub struct GctOkvs<F: FF> {
    okvs_type: OkvsType,
    n: usize,
    core: GctCore,
    _field: PhantomData<F>,
}

impl<F: FF> GctOkvs<F> {
    /// Create an instance of `okvs_type` (one of the single-table GCT kinds) with capacity `n`.
    pub fn new(
        okvs_type: OkvsType,
        n: usize,
        position_key: HashKey,
        dense_key: HashKey,
    ) -> Result<Self> {
        let params = gct_params(okvs_type, n).with_context(|| format!("@{}:{}", file!(), line!()))?;
        check_characteristic_two::<F>().with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!(
            "{} okvs: n = {}, sparse = {}, dense = {}",
            okvs_type, n, params.sparse, params.dense
        );

        Ok(Self {
            okvs_type,
            n,
            core: GctCore::new(params, position_key, dense_key),
            _field: PhantomData,
        })
    }

    /// Length of the sparse region `L`.
    pub fn sparse_m(&self) -> usize {
        self.core.params().sparse
    }

    /// Length of the dense region `R`.
    pub fn dense_m(&self) -> usize {
        self.core.params().dense
    }
}

impl<F> Okvs<F> for GctOkvs<F>
where
    F: FF,
    Standard: Distribution<F>,
{
    fn okvs_type(&self) -> OkvsType {
        self.okvs_type
    }

    fn n(&self) -> usize {
        self.n
    }

    fn m(&self) -> usize {
        self.core.params().m()
    }

    fn neg_log_failure_probability(&self) -> u32 {
        STATS_BIT_LENGTH as u32
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

        let points = points
            .iter()
            .map(|(key, value)| (key.as_ref(), *value))
            .collect::<Vec<_>>();

        let mut storage = vec![F::zero(); self.m()];
        self.core
            .encode_into(rng, &points, &mut storage)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        Ok(storage)
    }

    fn decode(&self, storage: &[F], key: &[u8]) -> Result<F> {
        check_storage(storage, self.m())?;
        check_key::<F>(key)?;

        self.core.decode_from(storage, key)
    }
}
