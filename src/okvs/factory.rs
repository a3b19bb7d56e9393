//! Construction of OKVS instances from a type tag.

use super::cluster::cluster_params;
use super::gct::gct_params;
use super::*;
use crate::hash_utils::HashKey;
use crate::params::{mega_bin, polynomial_m};
use anyhow::{Context, Result};
use log::debug;

/// Any OKVS kind, chosen at runtime.
#[derive(Clone, Debug)]
pub enum OkvsInstance<F: FF> {
    /// [OkvsType::Polynomial]
    Polynomial(PolynomialOkvs<F>),
    /// [OkvsType::MegaBin]
    MegaBin(MegaBinOkvs<F>),
    /// [OkvsType::H2NaiveGct], [OkvsType::H2BlazeGct] or [OkvsType::H3NaiveGct]
    Gct(GctOkvs<F>),
    /// [OkvsType::H2ClusterBlazeGct] or [OkvsType::H3ClusterNaiveGct]
    ClusterGct(ClusterGctOkvs<F>),
}

macro_rules! dispatch {
    ($self:ident, $okvs:ident => $e:expr) => {
        match $self {
            OkvsInstance::Polynomial($okvs) => $e,
            OkvsInstance::MegaBin($okvs) => $e,
            OkvsInstance::Gct($okvs) => $e,
            OkvsInstance::ClusterGct($okvs) => $e,
        }
    };
}

impl<F> Okvs<F> for OkvsInstance<F>
where
    F: FF,
    Standard: Distribution<F>,
{
    fn okvs_type(&self) -> OkvsType {
        dispatch!(self, okvs => okvs.okvs_type())
    }

    fn n(&self) -> usize {
        dispatch!(self, okvs => okvs.n())
    }

    fn m(&self) -> usize {
        dispatch!(self, okvs => okvs.m())
    }

    fn neg_log_failure_probability(&self) -> u32 {
        dispatch!(self, okvs => okvs.neg_log_failure_probability())
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
        dispatch!(self, okvs => okvs.encode(rng, points, options))
    }

    fn decode(&self, storage: &[F], key: &[u8]) -> Result<F> {
        dispatch!(self, okvs => okvs.decode(storage, key))
    }
}

/// Number of hash keys `okvs_type` consumes.
pub fn get_hash_key_num(okvs_type: OkvsType) -> usize {
    match okvs_type {
        OkvsType::Polynomial => 0,
        OkvsType::MegaBin => 1,
        OkvsType::H2NaiveGct | OkvsType::H2BlazeGct | OkvsType::H3NaiveGct => 2,
        OkvsType::H2ClusterBlazeGct | OkvsType::H3ClusterNaiveGct => 3,
    }
}

/// Storage length of `okvs_type` with capacity `n`, without building an instance.
pub fn get_m(okvs_type: OkvsType, n: usize) -> Result<usize> {
    let m = match okvs_type {
        OkvsType::Polynomial => polynomial_m(n)?,
        OkvsType::MegaBin => mega_bin(n)?.m(),
        OkvsType::H2NaiveGct | OkvsType::H2BlazeGct | OkvsType::H3NaiveGct => {
            gct_params(okvs_type, n)?.m()
        }
        OkvsType::H2ClusterBlazeGct | OkvsType::H3ClusterNaiveGct => {
            cluster_params(okvs_type, n)?.m()
        }
    };

    Ok(m)
}

/// Draw fresh hash keys for `okvs_type`.
pub fn gen_hash_keys<RNG: CryptoRng + Rng>(okvs_type: OkvsType, rng: &mut RNG) -> Vec<HashKey> {
    (0..get_hash_key_num(okvs_type))
        .map(|_| rng.gen::<HashKey>())
        .collect()
}

/// Build an instance of `okvs_type` with capacity `n`.
///
/// `hash_keys` must hold exactly [get_hash_key_num] keys.
pub fn create_okvs<F>(
    okvs_type: OkvsType,
    n: usize,
    hash_keys: &[HashKey],
) -> Result<OkvsInstance<F>>
where
    F: FF,
    Standard: Distribution<F>,
{
    let expected = get_hash_key_num(okvs_type);
    if hash_keys.len() != expected {
        bail!(OkvsError::HashKeyCount {
            okvs_type,
            expected,
            actual: hash_keys.len(),
        });
    }

    let okvs = match okvs_type {
        OkvsType::Polynomial => OkvsInstance::Polynomial(
            PolynomialOkvs::new(n).with_context(|| format!("@{}:{}", file!(), line!()))?,
        ),
        OkvsType::MegaBin => OkvsInstance::MegaBin(
            MegaBinOkvs::new(n, hash_keys[0])
                .with_context(|| format!("@{}:{}", file!(), line!()))?,
        ),
        OkvsType::H2NaiveGct | OkvsType::H2BlazeGct | OkvsType::H3NaiveGct => OkvsInstance::Gct(
            GctOkvs::new(okvs_type, n, hash_keys[0], hash_keys[1])
                .with_context(|| format!("@{}:{}", file!(), line!()))?,
        ),
        OkvsType::H2ClusterBlazeGct | OkvsType::H3ClusterNaiveGct => OkvsInstance::ClusterGct(
            ClusterGctOkvs::new(okvs_type, n, hash_keys[0], hash_keys[1], hash_keys[2])
                .with_context(|| format!("@{}:{}", file!(), line!()))?,
        ),
    };

    debug!("created {} okvs: n = {}, m = {}", okvs_type, n, okvs.m());

    Ok(okvs)
}
