use thiserror::Error;

/// Result alias used throughout the codec.
pub type Result<T> = std::result::Result<T, Error>;

/// All ways an encode or decode call can fail.
///
/// Encoding can raise [`Error::OutOfMemory`], [`Error::DepthExceeded`],
/// [`Error::UnsupportedType`], and [`Error::InvalidDigit`]. Decoding can raise
/// [`Error::Truncated`], [`Error::BadTag`], [`Error::BadUtf8`],
/// [`Error::BadDecimalDigit`], [`Error::BadSpecialNum`], and
/// [`Error::DecompressionFailed`]. Every variant is surfaced to the top-level
/// call site; no error is silently absorbed except the benign case where
/// compression fails to shrink the payload (see `envelope`).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// The buffer could not grow to hold the next write.
    #[error("out of memory while growing the encode buffer")]
    OutOfMemory,

    /// A container nested more than 256 levels deep.
    #[error("maximum recursion depth (256) exceeded")]
    DepthExceeded,

    /// The value is outside the closed model and no default handler (or a
    /// default handler that itself returned an unsupported value) could
    /// produce a substitute.
    #[error("value is outside the supported type model")]
    UnsupportedType,

    /// A `Decimal` digit was outside `0..=9` at encode time.
    #[error("decimal digit {0} is outside the range 0..=9")]
    InvalidDigit(u8),

    /// The input ended before a required byte could be read.
    #[error("input truncated: expected {needed} more byte(s), {available} available")]
    Truncated {
        /// Bytes the decoder needed to proceed.
        needed: usize,
        /// Bytes actually left in the input.
        available: usize,
    },

    /// The leading byte (tag bits cleared) did not match any defined tag.
    #[error("unknown tag byte 0x{0:02x}")]
    BadTag(u8),

    /// A `Utf8` value's body was not well-formed UTF-8.
    #[error("invalid UTF-8 in Utf8 value: {0}")]
    BadUtf8(#[source] std::str::Utf8Error),

    /// A decoded `Decimal` nibble exceeded 9.
    #[error("decoded decimal digit {0} is outside the range 0..=9")]
    BadDecimalDigit(u8),

    /// A `SpecialNum` flag byte did not identify one of the four defined cases.
    #[error("invalid SpecialNum flag byte 0x{0:02x}")]
    BadSpecialNum(u8),

    /// The compression envelope's decompression step failed: LZF did not
    /// consume exactly its input, or did not produce exactly its declared
    /// output length.
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),
}
