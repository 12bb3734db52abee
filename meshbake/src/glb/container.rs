//! GLB binary container.
//!
//! Layout: a 12-byte header (`glTF` magic, version 2, total length), a JSON
//! chunk padded with spaces and an optional BIN chunk padded with zeros.
//! All lengths are little-endian u32 and every chunk is 4-byte aligned.

use super::{AssembleError, InvalidGlb};

pub const GLB_MAGIC: &[u8; 4] = b"glTF";
pub const GLB_VERSION: u32 = 2;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Writes a GLB container around a JSON document and binary payload.
///
/// The BIN chunk is omitted when `bin` is empty.
pub fn write_glb(json: &[u8], bin: &[u8]) -> Result<Vec<u8>, AssembleError> {
    let json_len = padded_len(json.len());
    let bin_len = padded_len(bin.len());
    let total = HEADER_LEN
        + CHUNK_HEADER_LEN
        + json_len
        + if bin.is_empty() { 0 } else { CHUNK_HEADER_LEN + bin_len };

    let total_u32 = u32::try_from(total).map_err(|_| AssembleError::TooLarge(total))?;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&total_u32.to_le_bytes());

    out.extend_from_slice(&(json_len as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json);
    out.resize(out.len() + json_len - json.len(), b' ');

    if !bin.is_empty() {
        out.extend_from_slice(&(bin_len as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out.resize(out.len() + bin_len - bin.len(), 0);
    }

    debug_assert_eq!(out.len(), total);
    Ok(out)
}

/// Borrowed view of a GLB container's chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbChunks<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

/// Validates a GLB container and returns its chunks.
pub fn parse_glb(bytes: &[u8]) -> Result<GlbChunks<'_>, InvalidGlb> {
    if bytes.len() < HEADER_LEN + CHUNK_HEADER_LEN {
        return Err(InvalidGlb("shorter than header"));
    }
    if &bytes[..4] != GLB_MAGIC {
        return Err(InvalidGlb("missing glTF magic"));
    }
    if read_u32(bytes, 4) != GLB_VERSION {
        return Err(InvalidGlb("unsupported version"));
    }
    if read_u32(bytes, 8) as usize != bytes.len() {
        return Err(InvalidGlb("declared length does not match"));
    }

    let (json_type, json) = read_chunk(bytes, HEADER_LEN)?;
    if json_type != CHUNK_JSON {
        return Err(InvalidGlb("first chunk is not JSON"));
    }

    let bin_offset = HEADER_LEN + CHUNK_HEADER_LEN + json.len();
    let bin = if bin_offset < bytes.len() {
        let (bin_type, bin) = read_chunk(bytes, bin_offset)?;
        if bin_type != CHUNK_BIN {
            return Err(InvalidGlb("second chunk is not BIN"));
        }
        Some(bin)
    } else {
        None
    };

    Ok(GlbChunks { json, bin })
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn read_chunk(bytes: &[u8], offset: usize) -> Result<(u32, &[u8]), InvalidGlb> {
    if offset + CHUNK_HEADER_LEN > bytes.len() {
        return Err(InvalidGlb("truncated chunk header"));
    }
    let len = read_u32(bytes, offset) as usize;
    let kind = read_u32(bytes, offset + 4);
    let start = offset + CHUNK_HEADER_LEN;
    if len % 4 != 0 || start + len > bytes.len() {
        return Err(InvalidGlb("chunk length out of bounds"));
    }
    Ok((kind, &bytes[start..start + len]))
}
