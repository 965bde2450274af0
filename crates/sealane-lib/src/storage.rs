//! Shared binary container for persisted sea-graph artifacts.
//!
//! Layout:
//!
//! ```text
//! Header (16 bytes):
//!   - Magic: 4 bytes (per artifact)
//!   - Version: u8
//!   - Flags: u8 (reserved, currently 0)
//!   - Record count: u32 little-endian
//!   - Reserved: 6 bytes
//!
//! Body:
//!   - postcard-serialized payload, zstd compressed
//!
//! Footer (32 bytes):
//!   - SHA-256 checksum of the compressed body
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const HEADER_SIZE: usize = 16;
const CHECKSUM_SIZE: usize = 32;

/// zstd compression level (balanced speed/ratio).
const COMPRESSION_LEVEL: i32 = 3;

pub(crate) fn write_container<T: Serialize>(
    path: &Path,
    magic: &[u8; 4],
    version: u8,
    record_count: u32,
    payload: &T,
) -> Result<()> {
    let serialized = postcard::to_allocvec(payload).map_err(|e| Error::GraphSerialize {
        message: format!("postcard serialization failed: {e}"),
    })?;

    let compressed =
        zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL).map_err(|e| {
            Error::GraphSerialize {
                message: format!("zstd compression failed: {e}"),
            }
        })?;

    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(magic);
    header[4] = version;
    header[5] = 0;
    header[6..10].copy_from_slice(&record_count.to_le_bytes());

    let checksum = Sha256::digest(&compressed);

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&header)?;
    writer.write_all(&compressed)?;
    writer.write_all(&checksum)?;
    writer.flush()?;

    Ok(())
}

pub(crate) fn read_container<T: DeserializeOwned>(
    path: &Path,
    magic: &[u8; 4],
    expected_version: u8,
) -> Result<(u32, T)> {
    let load_error = |message: String| Error::GraphLoad {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|e| load_error(format!("failed to open file: {e}")))?;
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(|e| load_error(format!("failed to read header: {e}")))?;

    if &header[0..4] != magic {
        return Err(load_error("invalid magic bytes".to_string()));
    }
    let version = header[4];
    if version != expected_version {
        return Err(load_error(format!(
            "unsupported version {version} (expected {expected_version})"
        )));
    }
    let record_count = u32::from_le_bytes(header[6..10].try_into().expect("header slice"));

    let mut rest = Vec::new();
    reader
        .read_to_end(&mut rest)
        .map_err(|e| load_error(format!("failed to read body: {e}")))?;

    if rest.len() < CHECKSUM_SIZE {
        return Err(load_error("file truncated before checksum".to_string()));
    }
    let (compressed, stored_checksum) = rest.split_at(rest.len() - CHECKSUM_SIZE);

    let computed = Sha256::digest(compressed);
    if computed.as_ref() as &[u8] != stored_checksum {
        return Err(load_error("checksum mismatch, file is corrupt".to_string()));
    }

    let serialized = zstd::decode_all(compressed)
        .map_err(|e| load_error(format!("zstd decompression failed: {e}")))?;

    let payload = postcard::from_bytes(&serialized)
        .map_err(|e| load_error(format!("postcard deserialization failed: {e}")))?;

    Ok((record_count, payload))
}
