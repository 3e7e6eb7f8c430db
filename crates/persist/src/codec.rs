use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};

use crate::SnapshotError;

const ZSTD_LEVEL: i32 = 3;

pub(crate) fn cbor_encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SnapshotError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| SnapshotError::CborEncode(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn cbor_decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, SnapshotError> {
    ciborium::from_reader(data).map_err(|e| SnapshotError::CborDecode(e.to_string()))
}

pub(crate) fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, SnapshotError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), ZSTD_LEVEL)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub(crate) fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, SnapshotError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// CBOR, then zstd.
pub(crate) fn pack<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SnapshotError> {
    zstd_compress(&cbor_encode(value)?)
}

pub(crate) fn unpack<T: DeserializeOwned>(data: &[u8]) -> Result<T, SnapshotError> {
    cbor_decode(&zstd_decompress(data)?)
}
