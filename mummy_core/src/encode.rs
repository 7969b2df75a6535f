//! Encoder: packs a [`Value`] into an [`Encoder`](crate::buffer::Encoder)
//! buffer (spec.md §4.2).

use crate::buffer::Encoder as Buf;
use crate::error::{Error, Result};
use crate::tag::{self, TagTriple, Width};
use crate::value::{Date, DateTime, Decimal, SpecialNum, Time, TimeDelta, Value};

/// Maximum recursion depth a single `encode` call tree may reach.
pub const MAX_DEPTH: u32 = 256;

/// Caller-supplied fallback invoked once per [`Value::Unsupported`] to obtain
/// an in-model substitute (spec.md §4.2). The encoder re-enters itself on the
/// substitute with the handler disabled, so a handler that itself returns
/// `Value::Unsupported` fails with [`Error::UnsupportedType`] rather than
/// looping.
pub type DefaultHandler<'a> = dyn Fn() -> Value + 'a;

/// Encode `value` into `buf` at the given recursion `depth`. Top-level
/// callers start at `depth = 1` (see [`crate::dumps`]).
pub fn encode(
    value: &Value,
    buf: &mut Buf,
    default: Option<&DefaultHandler>,
    depth: u32,
) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::DepthExceeded);
    }
    match value {
        Value::Unsupported => match default {
            Some(handler) => encode(&handler(), buf, None, depth),
            None => Err(Error::UnsupportedType),
        },
        Value::Null => buf.write_u8(tag::NULL),
        Value::Bool(b) => {
            buf.write_u8(tag::BOOL)?;
            buf.write_u8(if *b { 0x01 } else { 0x00 })
        }
        Value::Int(n) => encode_int(*n, buf),
        Value::Huge(bytes) => encode_huge(bytes, buf),
        Value::Float(f) => {
            buf.write_u8(tag::FLOAT)?;
            buf.write_f64(*f)
        }
        Value::Bytes(b) => encode_sized(tag::STR_TAGS, b, buf),
        Value::Utf8(s) => encode_sized(tag::UTF8_TAGS, s.as_bytes(), buf),
        Value::List(items) => encode_container(tag::LIST_TAGS, items, buf, default, depth),
        Value::Tuple(items) => encode_container(tag::TUPLE_TAGS, items, buf, default, depth),
        Value::Set(items) => encode_container(tag::SET_TAGS, items, buf, default, depth),
        Value::Hash(pairs) => encode_hash(pairs, buf, default, depth),
        Value::Date(d) => encode_date(d, buf),
        Value::Time(t) => encode_time(t, buf),
        Value::DateTime(dt) => encode_datetime(dt, buf),
        Value::TimeDelta(td) => encode_timedelta(td, buf),
        Value::Decimal(dec) => encode_decimal(dec, buf),
        Value::SpecialNum(s) => encode_specialnum(*s, buf),
    }
}

fn write_size(buf: &mut Buf, width: Width, len: usize) -> Result<()> {
    match width {
        Width::Short => buf.write_u8(len as u8),
        Width::Medium => buf.write_u16(len as u16),
        Width::Long => buf.write_u32(len as u32),
    }
}

fn encode_sized(tags: TagTriple, bytes: &[u8], buf: &mut Buf) -> Result<()> {
    let width = Width::for_len(bytes.len());
    buf.write_u8(tags.for_width(width))?;
    write_size(buf, width, bytes.len())?;
    buf.write_bytes(bytes)
}

fn encode_container(
    tags: TagTriple,
    items: &[Value],
    buf: &mut Buf,
    default: Option<&DefaultHandler>,
    depth: u32,
) -> Result<()> {
    let width = Width::for_len(items.len());
    buf.write_u8(tags.for_width(width))?;
    write_size(buf, width, items.len())?;
    for item in items {
        encode(item, buf, default, depth + 1)?;
    }
    Ok(())
}

fn encode_hash(
    pairs: &[(Value, Value)],
    buf: &mut Buf,
    default: Option<&DefaultHandler>,
    depth: u32,
) -> Result<()> {
    let width = Width::for_len(pairs.len());
    buf.write_u8(tag::HASH_TAGS.for_width(width))?;
    write_size(buf, width, pairs.len())?;
    for (k, v) in pairs {
        encode(k, buf, default, depth + 1)?;
        encode(v, buf, default, depth + 1)?;
    }
    Ok(())
}

/// Pick the narrowest of `i8`/`i16`/`i32`/`i64` that contains `n`. `Huge` is
/// never reached from here: every `i64` fits one of these four widths.
fn encode_int(n: i64, buf: &mut Buf) -> Result<()> {
    if let Ok(v) = i8::try_from(n) {
        buf.write_u8(tag::CHAR)?;
        buf.write_u8(v as u8)
    } else if let Ok(v) = i16::try_from(n) {
        buf.write_u8(tag::SHORT)?;
        buf.write_i16(v)
    } else if let Ok(v) = i32::try_from(n) {
        buf.write_u8(tag::INT)?;
        buf.write_i32(v)
    } else {
        buf.write_u8(tag::LONG)?;
        buf.write_i64(n)
    }
}

fn encode_huge(bytes: &[u8], buf: &mut Buf) -> Result<()> {
    buf.write_u8(tag::HUGE)?;
    buf.write_u32(bytes.len() as u32)?;
    buf.write_bytes(bytes)
}

fn encode_date(d: &Date, buf: &mut Buf) -> Result<()> {
    buf.write_u8(tag::DATE)?;
    buf.write_u16(d.year as u16)?;
    buf.write_u8(d.month)?;
    buf.write_u8(d.day)
}

fn encode_time(t: &Time, buf: &mut Buf) -> Result<()> {
    buf.write_u8(tag::TIME)?;
    buf.write_u8(t.hour)?;
    buf.write_u8(t.minute)?;
    buf.write_u8(t.second)?;
    buf.write_u24(t.microsecond)
}

fn encode_datetime(dt: &DateTime, buf: &mut Buf) -> Result<()> {
    buf.write_u8(tag::DATETIME)?;
    buf.write_u16(dt.year as u16)?;
    buf.write_u8(dt.month)?;
    buf.write_u8(dt.day)?;
    buf.write_u8(dt.hour)?;
    buf.write_u8(dt.minute)?;
    buf.write_u8(dt.second)?;
    buf.write_u24(dt.microsecond)
}

fn encode_timedelta(td: &TimeDelta, buf: &mut Buf) -> Result<()> {
    buf.write_u8(tag::TIMEDELTA)?;
    buf.write_i32(td.days)?;
    buf.write_i32(td.seconds)?;
    buf.write_i32(td.microseconds)
}

/// Pack two digits per byte: low nibble of byte `k` is digit `2k`, high
/// nibble is digit `2k+1` (spec.md §3, confirmed against `original_source/`).
fn encode_decimal(dec: &Decimal, buf: &mut Buf) -> Result<()> {
    buf.write_u8(tag::DECIMAL)?;
    buf.write_u8(if dec.negative { 0x01 } else { 0x00 })?;
    buf.write_i16(dec.exponent)?;
    // Decimal digit counts beyond u16 range are a caller-construction error;
    // Value is trusted internal state by this point (spec.md §1).
    buf.write_u16(dec.digits.len() as u16)?;
    let mut i = 0;
    while i < dec.digits.len() {
        let lo = dec.digits[i];
        if lo > 9 {
            return Err(Error::InvalidDigit(lo));
        }
        let hi = match dec.digits.get(i + 1) {
            Some(&h) if h > 9 => return Err(Error::InvalidDigit(h)),
            Some(&h) => h,
            None => 0,
        };
        buf.write_u8((hi << 4) | lo)?;
        i += 2;
    }
    Ok(())
}

fn encode_specialnum(s: SpecialNum, buf: &mut Buf) -> Result<()> {
    let flag = match s {
        SpecialNum::PosInfinity => tag::SPECIAL_INFINITY,
        SpecialNum::NegInfinity => tag::SPECIAL_INFINITY | tag::SPECIAL_SIGN_BIT,
        SpecialNum::QuietNaN => tag::SPECIAL_NAN,
        SpecialNum::SignalingNaN => tag::SPECIAL_NAN | tag::SPECIAL_NAN_SIGNALING_BIT,
    };
    buf.write_u8(tag::SPECIALNUM)?;
    buf.write_u8(flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_to_vec(value: &Value) -> Vec<u8> {
        let mut buf = Buf::owned(64).unwrap();
        encode(value, &mut buf, None, 1).unwrap();
        buf.into_vec()
    }

    #[test]
    fn scenario_null() {
        assert_eq!(encode_to_vec(&Value::Null), vec![0x00]);
    }

    #[test]
    fn scenario_bool() {
        assert_eq!(encode_to_vec(&Value::Bool(true)), vec![0x01, 0x01]);
    }

    #[test]
    fn scenario_int_widths() {
        assert_eq!(encode_to_vec(&Value::Int(1)), vec![0x02, 0x01]);
        assert_eq!(encode_to_vec(&Value::Int(128)), vec![0x03, 0x00, 0x80]);
        assert_eq!(
            encode_to_vec(&Value::Int(-32769)),
            vec![0x04, 0xFF, 0xFF, 0x7F, 0xFF]
        );
    }

    #[test]
    fn scenario_bytes() {
        assert_eq!(
            encode_to_vec(&Value::Bytes(b"hi".to_vec())),
            vec![0x08, 0x02, b'h', b'i']
        );
    }

    #[test]
    fn scenario_list() {
        let v = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            encode_to_vec(&v),
            vec![0x10, 0x02, 0x02, 0x01, 0x02, 0x02]
        );
    }

    #[test]
    fn scenario_hash() {
        let v = Value::Hash(vec![(Value::bytes(*b"a"), Value::Int(1))]);
        assert_eq!(
            encode_to_vec(&v),
            vec![0x13, 0x01, 0x08, 0x01, b'a', 0x02, 0x01]
        );
    }

    #[test]
    fn scenario_date() {
        let v = Value::Date(Date {
            year: 2024,
            month: 1,
            day: 31,
        });
        assert_eq!(encode_to_vec(&v), vec![0x1A, 0x07, 0xE8, 0x01, 0x1F]);
    }

    #[test]
    fn width_boundaries_bytes() {
        assert_eq!(
            encode_to_vec(&Value::Bytes(vec![0u8; 255]))[0],
            tag::SHORTSTR
        );
        assert_eq!(
            encode_to_vec(&Value::Bytes(vec![0u8; 256]))[0],
            tag::MEDSTR
        );
        assert_eq!(
            encode_to_vec(&Value::Bytes(vec![0u8; 65535]))[0],
            tag::MEDSTR
        );
        assert_eq!(
            encode_to_vec(&Value::Bytes(vec![0u8; 65536]))[0],
            tag::LONGSTR
        );
    }

    #[test]
    fn width_boundaries_int() {
        assert_eq!(encode_to_vec(&Value::Int(-129))[0], tag::SHORT);
        assert_eq!(encode_to_vec(&Value::Int(-128))[0], tag::CHAR);
        assert_eq!(encode_to_vec(&Value::Int(127))[0], tag::CHAR);
        assert_eq!(encode_to_vec(&Value::Int(128))[0], tag::SHORT);
        assert_eq!(encode_to_vec(&Value::Int(32767))[0], tag::SHORT);
        assert_eq!(encode_to_vec(&Value::Int(32768))[0], tag::INT);
        assert_eq!(encode_to_vec(&Value::Int(-32768))[0], tag::SHORT);
        assert_eq!(encode_to_vec(&Value::Int(-32769))[0], tag::INT);
        assert_eq!(encode_to_vec(&Value::Int(i32::MAX as i64))[0], tag::INT);
        assert_eq!(
            encode_to_vec(&Value::Int(i32::MAX as i64 + 1))[0],
            tag::LONG
        );
        assert_eq!(encode_to_vec(&Value::Int(i32::MIN as i64))[0], tag::INT);
        assert_eq!(
            encode_to_vec(&Value::Int(i32::MIN as i64 - 1))[0],
            tag::LONG
        );
    }

    #[test]
    fn depth_cap_encodes_256_fails_257() {
        let mut nested = Value::Int(0);
        for _ in 0..255 {
            nested = Value::List(vec![nested]);
        }
        // `nested` is now 256 levels deep (the innermost Int counts as the
        // 256th level reached during the walk).
        let mut buf = Buf::owned(4096).unwrap();
        assert!(encode(&nested, &mut buf, None, 1).is_ok());

        let too_deep = Value::List(vec![nested]);
        let mut buf = Buf::owned(4096).unwrap();
        assert_eq!(
            encode(&too_deep, &mut buf, None, 1).unwrap_err(),
            Error::DepthExceeded
        );
    }

    #[test]
    fn unsupported_without_handler_fails() {
        let mut buf = Buf::owned(16).unwrap();
        assert_eq!(
            encode(&Value::Unsupported, &mut buf, None, 1).unwrap_err(),
            Error::UnsupportedType
        );
    }

    #[test]
    fn unsupported_with_handler_substitutes_once() {
        let handler: &DefaultHandler = &|| Value::Int(42);
        let mut buf = Buf::owned(16).unwrap();
        encode(&Value::Unsupported, &mut buf, Some(handler), 1).unwrap();
        assert_eq!(buf.into_vec(), vec![0x02, 42]);
    }

    #[test]
    fn unsupported_handler_disabled_on_reentry() {
        let handler: &DefaultHandler = &|| Value::Unsupported;
        let mut buf = Buf::owned(16).unwrap();
        assert_eq!(
            encode(&Value::Unsupported, &mut buf, Some(handler), 1).unwrap_err(),
            Error::UnsupportedType
        );
    }

    #[test]
    fn decimal_invalid_digit_rejected() {
        let dec = Decimal {
            negative: false,
            exponent: 0,
            digits: vec![1, 2, 10],
        };
        let mut buf = Buf::owned(16).unwrap();
        assert_eq!(
            encode(&Value::Decimal(dec), &mut buf, None, 1).unwrap_err(),
            Error::InvalidDigit(10)
        );
    }

    #[test]
    fn specialnum_flags() {
        assert_eq!(
            encode_to_vec(&Value::SpecialNum(SpecialNum::PosInfinity)),
            vec![0x1F, 0x10]
        );
        assert_eq!(
            encode_to_vec(&Value::SpecialNum(SpecialNum::NegInfinity)),
            vec![0x1F, 0x11]
        );
        assert_eq!(
            encode_to_vec(&Value::SpecialNum(SpecialNum::QuietNaN)),
            vec![0x1F, 0x20]
        );
        assert_eq!(
            encode_to_vec(&Value::SpecialNum(SpecialNum::SignalingNaN)),
            vec![0x1F, 0x21]
        );
    }
}
