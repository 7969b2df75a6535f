//! `mummy_core`: a self-describing binary serialization format for a closed
//! set of scalar, container, and temporal value types, with an optional LZF
//! compression envelope.
//!
//! The two entry points are [`dumps`] and [`loads`]; everything else is
//! exposed for callers building their own tooling (codec implementations,
//! stream inspection, alternate `Value` construction).

pub mod buffer;
pub mod decode;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod tag;
pub mod value;

pub use encode::DefaultHandler;
pub use envelope::{BlockCodec, LzfCodec};
pub use error::{Error, Result};
pub use value::{Date, DateTime, Decimal, SpecialNum, Time, TimeDelta, Value};

use buffer::{Encoder, Reader};

/// Serialize `value` to its wire form.
///
/// `default`, if given, is invoked once each time an encodable subtree
/// contains [`Value::Unsupported`], to obtain an in-model substitute; a
/// substitute that is itself `Unsupported` fails with
/// [`Error::UnsupportedType`] rather than looping. When `compress` is true,
/// the result is wrapped in the LZF envelope if doing so shrinks it by at
/// least the envelope's own overhead; otherwise it is returned plain.
pub fn dumps(
    value: &Value,
    default: Option<&DefaultHandler>,
    compress: bool,
) -> Result<Vec<u8>> {
    let mut buf = Encoder::owned(4096)?;
    encode::encode(value, &mut buf, default, 1)?;
    Ok(envelope::wrap(buf.into_vec(), compress, &LzfCodec))
}

/// Deserialize a complete wire-form byte sequence, transparently undoing the
/// compression envelope if present.
pub fn loads(bytes: &[u8]) -> Result<Value> {
    let plain = envelope::unwrap(bytes, &LzfCodec)?;
    let mut reader = Reader::new(&plain);
    decode::decode(&mut reader, 1)
}
