use mummy_core::{BlockCodec, Result};

/// No-op codec: never compresses, so [`mummy_core::envelope::wrap`] always
/// falls back to the plain encoding through it.
///
/// Useful for exercising the envelope's "doesn't shrink, so skip it" path
/// and for tests that want a codec that never touches bytes it returns.
pub struct NoopCodec;

impl BlockCodec for NoopCodec {
    fn compress(&self, _src: &[u8]) -> Option<Vec<u8>> {
        None
    }

    fn decompress(&self, src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        debug_assert_eq!(src.len(), expected_len);
        Ok(src.to_vec())
    }
}
