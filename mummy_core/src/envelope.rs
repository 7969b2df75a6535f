//! Compression envelope wrapping an encoded value (spec.md §4.4).
//!
//! Layout when compressed: byte 0 is the inner stream's tag byte with its
//! high bit set, followed by a big-endian `u32` giving the uncompressed
//! length of everything after byte 0, followed by the compressed bytes of
//! that remainder. An uncompressed stream is the plain encoding, untouched.

use crate::error::{Error, Result};
use crate::tag::{COMPRESSED_FLAG, TAG_MASK};

/// Minimum encoded length (including the tag byte) before compression is
/// even attempted. Below this, LZF's own per-block overhead can't pay for
/// itself (spec.md §4.4).
const MIN_COMPRESSIBLE_LEN: usize = 7;

/// A block compressor pluggable into the envelope. `mummy_core` ships one
/// production implementation ([`LzfCodec`]); `mummy_codecs` hosts
/// alternates used only in tests.
pub trait BlockCodec {
    /// Compress `src`, or return `None` if the codec declines (e.g. the
    /// result would not be smaller).
    fn compress(&self, src: &[u8]) -> Option<Vec<u8>>;
    /// Decompress `src`, which is known to expand to exactly
    /// `expected_len` bytes.
    fn decompress(&self, src: &[u8], expected_len: usize) -> Result<Vec<u8>>;
}

/// The production codec: a pure-Rust port of liblzf, matching the
/// compressor the original C implementation links against.
pub struct LzfCodec;

impl BlockCodec for LzfCodec {
    fn compress(&self, src: &[u8]) -> Option<Vec<u8>> {
        lzf::compress(src).ok()
    }

    fn decompress(&self, src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        lzf::decompress(src, expected_len)
            .map_err(|e| Error::DecompressionFailed(e.to_string()))
    }
}

/// Wrap `encoded` (a complete, already-tagged mummy stream) in the
/// compression envelope if `compress` is requested and doing so is
/// profitable; otherwise return it unchanged.
pub fn wrap(encoded: Vec<u8>, compress: bool, codec: &dyn BlockCodec) -> Vec<u8> {
    if !compress || encoded.len() < MIN_COMPRESSIBLE_LEN {
        return encoded;
    }
    let tag_byte = encoded[0];
    let rest = &encoded[1..];
    let Some(compressed) = codec.compress(rest) else {
        return encoded;
    };
    // Envelope overhead is 1 (tag) + 4 (length); only keep the compressed
    // form if the whole stream actually shrinks.
    if 1 + 4 + compressed.len() >= encoded.len() {
        return encoded;
    }
    let mut out = Vec::with_capacity(1 + 4 + compressed.len());
    out.push(tag_byte | COMPRESSED_FLAG);
    out.extend_from_slice(&(rest.len() as u32).to_be_bytes());
    out.extend_from_slice(&compressed);
    out
}

/// Undo [`wrap`]: if byte 0's high bit is set, decompress the remainder
/// against its declared length and splice the tag byte back on; otherwise
/// pass `encoded` through unchanged.
pub fn unwrap(encoded: &[u8], codec: &dyn BlockCodec) -> Result<Vec<u8>> {
    let Some(&first) = encoded.first() else {
        return Ok(Vec::new());
    };
    if first & COMPRESSED_FLAG == 0 {
        return Ok(encoded.to_vec());
    }
    if encoded.len() < 5 {
        return Err(Error::Truncated {
            needed: 5,
            available: encoded.len(),
        });
    }
    let tag_byte = first & TAG_MASK;
    let expected_len =
        u32::from_be_bytes(encoded[1..5].try_into().unwrap()) as usize;
    let body = codec.decompress(&encoded[5..], expected_len)?;
    if body.len() != expected_len {
        return Err(Error::DecompressionFailed(format!(
            "expected {expected_len} bytes, got {}",
            body.len()
        )));
    }
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(tag_byte);
    out.extend_from_slice(&body);
    Ok(out)
}
