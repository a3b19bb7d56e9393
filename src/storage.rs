//! Wire format of an encoded storage: `m` elements of `byteL` bytes each, concatenated in order.

use crate::error::OkvsError;
use anyhow::{bail, Context, Result};
use scuttlebutt::field::FiniteField as FF;
use scuttlebutt::AbstractChannel;
use typenum::marker_traits::Unsigned;

/// Serialize `storage`.
pub fn storage_to_bytes<F: FF>(storage: &[F]) -> Vec<u8> {
    storage
        .iter()
        .flat_map(|x| x.to_bytes().to_vec())
        .collect::<Vec<_>>()
}

/// Deserialize a storage of exactly `m` elements.
pub fn storage_from_bytes<F: FF>(bytes: &[u8], m: usize) -> Result<Vec<F>> {
    let byte_l = F::ByteReprLen::to_usize();
    if bytes.len() != m * byte_l {
        bail!(OkvsError::StorageLength {
            expected: m,
            actual: bytes.len() / byte_l,
        });
    }

    bytes
        .chunks(byte_l)
        .map(|x| F::from_bytes(x.into()).with_context(|| format!("@{}:{}", file!(), line!())))
        .collect::<Result<Vec<_>>>()
}

/// Send `storage` over `channel`. The receiver must already know `m`.
pub fn write_storage<F, C>(channel: &mut C, storage: &[F]) -> Result<usize>
where
    F: FF,
    C: AbstractChannel,
{
    let bytes = storage_to_bytes(storage);

    channel
        .write_bytes(&bytes)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    channel
        .flush()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    Ok(bytes.len())
}

/// Receive a storage of `m` elements from `channel`.
pub fn read_storage<F, C>(channel: &mut C, m: usize) -> Result<Vec<F>>
where
    F: FF,
    C: AbstractChannel,
{
    let mut bytes = vec![0u8; m * F::ByteReprLen::to_usize()];

    channel
        .read_bytes(&mut bytes)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    storage_from_bytes(&bytes, m)
}
