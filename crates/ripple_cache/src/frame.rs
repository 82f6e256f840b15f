//! Framed binary payloads with an integrity header.
//!
//! Class metadata sections and the lookup index share one on-disk framing:
//! a 4-byte little-endian header length, a bincode-encoded [`FrameHeader`]
//! (magic bytes, format version, producing tool version, payload checksum),
//! then the payload itself.

use ripple_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Header prepended to every framed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Magic bytes identifying the payload type.
    pub magic: [u8; 4],

    /// Payload format version.
    pub format_version: u32,

    /// Version of the tool that produced the payload.
    pub tool_version: String,

    /// Content hash of the payload (for integrity checks).
    pub checksum: ContentHash,
}

/// Why a frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the declared header.
    #[error("truncated header")]
    Truncated,

    /// The header could not be decoded.
    #[error("undecodable header: {0}")]
    BadHeader(String),

    /// The magic bytes do not identify the expected payload type.
    #[error("unexpected magic bytes {0:?}")]
    BadMagic([u8; 4]),

    /// The payload format differs from the one this tool reads.
    #[error("format version {actual}, expected {expected}")]
    VersionMismatch {
        /// Version this tool reads.
        expected: u32,
        /// Version found in the header.
        actual: u32,
    },

    /// The payload does not match its checksum.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum stored in the header.
        expected: ContentHash,
        /// Checksum of the bytes actually present.
        actual: ContentHash,
    },
}

/// Encodes `payload` behind a header.
pub fn encode_frame(
    magic: [u8; 4],
    format_version: u32,
    tool_version: &str,
    payload: &[u8],
) -> Result<Vec<u8>, CacheError> {
    let header = FrameHeader {
        magic,
        format_version,
        tool_version: tool_version.to_string(),
        checksum: ContentHash::from_bytes(payload),
    };

    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    // 4-byte header length (little-endian) + header + payload
    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(payload);
    Ok(output)
}

/// Decodes a frame, validating magic, format version, and checksum.
///
/// Returns the header and a slice of the payload.
pub fn decode_frame(
    raw: &[u8],
    magic: [u8; 4],
    format_version: u32,
) -> Result<(FrameHeader, &[u8]), FrameError> {
    if raw.len() < 4 {
        return Err(FrameError::Truncated);
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&raw[..4]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if raw.len() - 4 < header_len {
        return Err(FrameError::Truncated);
    }

    let (header, _): (FrameHeader, usize) =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
            .map_err(|e| FrameError::BadHeader(e.to_string()))?;

    if header.magic != magic {
        return Err(FrameError::BadMagic(header.magic));
    }

    if header.format_version != format_version {
        return Err(FrameError::VersionMismatch {
            expected: format_version,
            actual: header.format_version,
        });
    }

    let payload = &raw[4 + header_len..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(FrameError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    Ok((header, payload))
}
