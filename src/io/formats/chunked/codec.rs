// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Chunk framing for the chunked store.
//!
//! ```text
//! +--------+-----------+-------------+------------------+
//! | "VXCK" | crc32 u32 | raw len u64 | zstd payload ... |
//! +--------+-----------+-------------+------------------+
//! ```
//!
//! Integers are little-endian. The checksum covers the uncompressed bytes.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::core::{DatasetError, Result};

/// Chunk file magic.
pub const CHUNK_MAGIC: &[u8; 4] = b"VXCK";

/// Size of the fixed chunk header.
pub const HEADER_LEN: usize = 16;

/// Default zstd level when none is configured.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Compress `raw` into a framed chunk.
pub fn encode_chunk(raw: &[u8], level: i32) -> Result<Vec<u8>> {
    let payload = zstd::encode_all(raw, level)?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(CHUNK_MAGIC);
    out.write_u32::<LittleEndian>(crc32fast::hash(raw))?;
    out.write_u64::<LittleEndian>(raw.len() as u64)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Verify and decompress a framed chunk holding `expected_len` raw bytes.
///
/// `context` names the chunk in error messages. Every defect is reported as a
/// corrupt-data I/O error. Decompression never produces more than
/// `expected_len` bytes.
pub fn decode_chunk(framed: &[u8], expected_len: usize, context: &str) -> Result<Vec<u8>> {
    if framed.len() < HEADER_LEN {
        return Err(DatasetError::corrupt(
            context,
            format!("truncated chunk ({} bytes)", framed.len()),
        ));
    }
    if &framed[..4] != CHUNK_MAGIC {
        return Err(DatasetError::corrupt(context, "bad chunk magic"));
    }
    let mut header = Cursor::new(&framed[4..HEADER_LEN]);
    let crc = header.read_u32::<LittleEndian>()?;
    let raw_len = header.read_u64::<LittleEndian>()?;
    if raw_len != expected_len as u64 {
        return Err(DatasetError::corrupt(
            context,
            format!("chunk declares {raw_len} bytes, unit holds {expected_len}"),
        ));
    }

    let raw = zstd::bulk::decompress(&framed[HEADER_LEN..], expected_len)
        .map_err(|e| DatasetError::corrupt(context, format!("decompression failed: {e}")))?;
    if raw.len() != expected_len {
        return Err(DatasetError::corrupt(
            context,
            format!("expected {expected_len} bytes, decompressed {}", raw.len()),
        ));
    }
    if crc32fast::hash(&raw) != crc {
        return Err(DatasetError::corrupt(context, "checksum mismatch"));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let raw: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let framed = encode_chunk(&raw, DEFAULT_COMPRESSION_LEVEL).unwrap();
        assert_eq!(&framed[..4], CHUNK_MAGIC);
        assert!(framed.len() < raw.len());
        assert_eq!(decode_chunk(&framed, raw.len(), "0.0").unwrap(), raw);
    }

    #[test]
    fn test_truncated_chunk() {
        let err = decode_chunk(b"VXCK\x00", 16, "0.0").unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut framed = encode_chunk(&[7u8; 64], 1).unwrap();
        framed[4] ^= 0xff;
        let err = decode_chunk(&framed, 64, "1.2").unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_cut_payload() {
        let framed = encode_chunk(&[1u8; 1024], 1).unwrap();
        let cut = &framed[..framed.len() - 4];
        assert!(matches!(
            decode_chunk(cut, 1024, "0"),
            Err(DatasetError::Io { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut framed = encode_chunk(&[1u8; 8], 1).unwrap();
        framed[0] = b'Z';
        assert!(decode_chunk(&framed, 8, "0")
            .unwrap_err()
            .to_string()
            .contains("magic"));
    }

    #[test]
    fn test_length_must_match_unit() {
        let framed = encode_chunk(&[0u8; 256], 1).unwrap();
        let err = decode_chunk(&framed, 64, "0.1").unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
        assert!(err.to_string().contains("declares 256 bytes"));
    }

    #[test]
    fn test_payload_larger_than_declared() {
        // header claims 64 bytes, payload inflates to 1 MiB
        let mut framed = encode_chunk(&vec![0u8; 1 << 20], 1).unwrap();
        framed[8..16].copy_from_slice(&64u64.to_le_bytes());
        assert!(matches!(
            decode_chunk(&framed, 64, "0.2"),
            Err(DatasetError::Io { .. })
        ));
    }
}
