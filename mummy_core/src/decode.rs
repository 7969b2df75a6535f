//! Decoder: the mirror image of [`crate::encode`] (spec.md §4.3). Every read
//! goes through [`Reader`], so a truncated input surfaces as
//! [`Error::Truncated`] rather than panicking.

use crate::buffer::Reader;
use crate::encode::MAX_DEPTH;
use crate::error::{Error, Result};
use crate::tag::{self, Width};
use crate::value::{Date, DateTime, Decimal, SpecialNum, Time, TimeDelta, Value};

/// Elements a single container read pre-reserves capacity for, regardless of
/// what its declared count claims. A length field read straight off the wire
/// is attacker-controlled; without this cap a single bogus 4-byte count could
/// force a multi-gigabyte allocation before a single element is read.
const PREALLOC_CAP: usize = 1024;

/// `decode` mirrors `encode`'s depth cap (see `DESIGN.md`'s open-question
/// decisions) as a recursion-depth guard against a maliciously deep input:
/// since `decode` recurses once per nested container tag with no other
/// bound on nesting, an attacker-supplied stream could otherwise drive the
/// call stack arbitrarily deep before `Reader` ever reports truncation.
pub fn decode(r: &mut Reader, depth: u32) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(Error::DepthExceeded);
    }
    let raw_tag = r.read_u8()?;
    match raw_tag {
        tag::NULL => Ok(Value::Null),
        tag::BOOL => Ok(Value::Bool(r.read_u8()? != 0)),
        tag::CHAR => Ok(Value::Int(r.read_u8()? as i8 as i64)),
        tag::SHORT => Ok(Value::Int(r.read_i16()? as i64)),
        tag::INT => Ok(Value::Int(r.read_i32()? as i64)),
        tag::LONG => Ok(Value::Int(r.read_i64()?)),
        tag::HUGE => {
            let len = r.read_u32()? as usize;
            Ok(Value::Huge(r.read_bytes(len)?.to_vec()))
        }
        tag::FLOAT => Ok(Value::Float(r.read_f64()?)),
        tag::SHORTSTR => decode_bytes(r, Width::Short),
        tag::MEDSTR => decode_bytes(r, Width::Medium),
        tag::LONGSTR => decode_bytes(r, Width::Long),
        tag::SHORTUTF8 => decode_utf8(r, Width::Short),
        tag::MEDUTF8 => decode_utf8(r, Width::Medium),
        tag::LONGUTF8 => decode_utf8(r, Width::Long),
        tag::SHORTLIST => decode_container(r, Width::Short, depth, Value::List),
        tag::MEDLIST => decode_container(r, Width::Medium, depth, Value::List),
        tag::LONGLIST => decode_container(r, Width::Long, depth, Value::List),
        tag::SHORTTUPLE => decode_container(r, Width::Short, depth, Value::Tuple),
        tag::MEDTUPLE => decode_container(r, Width::Medium, depth, Value::Tuple),
        tag::LONGTUPLE => decode_container(r, Width::Long, depth, Value::Tuple),
        tag::SHORTSET => decode_container(r, Width::Short, depth, Value::Set),
        tag::MEDSET => decode_container(r, Width::Medium, depth, Value::Set),
        tag::LONGSET => decode_container(r, Width::Long, depth, Value::Set),
        tag::SHORTHASH => decode_hash(r, Width::Short, depth),
        tag::MEDHASH => decode_hash(r, Width::Medium, depth),
        tag::LONGHASH => decode_hash(r, Width::Long, depth),
        tag::DATE => decode_date(r),
        tag::TIME => decode_time(r),
        tag::DATETIME => decode_datetime(r),
        tag::TIMEDELTA => decode_timedelta(r),
        tag::DECIMAL => decode_decimal(r),
        tag::SPECIALNUM => decode_specialnum(r),
        other => Err(Error::BadTag(other)),
    }
}

fn read_size(r: &mut Reader, width: Width) -> Result<usize> {
    Ok(match width {
        Width::Short => r.read_u8()? as usize,
        Width::Medium => r.read_u16()? as usize,
        Width::Long => r.read_u32()? as usize,
    })
}

fn decode_bytes(r: &mut Reader, width: Width) -> Result<Value> {
    let len = read_size(r, width)?;
    Ok(Value::Bytes(r.read_bytes(len)?.to_vec()))
}

fn decode_utf8(r: &mut Reader, width: Width) -> Result<Value> {
    let len = read_size(r, width)?;
    let bytes = r.read_bytes(len)?;
    let s = std::str::from_utf8(bytes).map_err(Error::BadUtf8)?;
    Ok(Value::Utf8(s.to_string()))
}

fn decode_container(
    r: &mut Reader,
    width: Width,
    depth: u32,
    ctor: fn(Vec<Value>) -> Value,
) -> Result<Value> {
    let count = read_size(r, width)?;
    let mut items = Vec::with_capacity(count.min(PREALLOC_CAP));
    for _ in 0..count {
        items.push(decode(r, depth + 1)?);
    }
    Ok(ctor(items))
}

fn decode_hash(r: &mut Reader, width: Width, depth: u32) -> Result<Value> {
    let count = read_size(r, width)?;
    let mut pairs = Vec::with_capacity(count.min(PREALLOC_CAP));
    for _ in 0..count {
        let k = decode(r, depth + 1)?;
        let v = decode(r, depth + 1)?;
        pairs.push((k, v));
    }
    Ok(Value::Hash(pairs))
}

fn decode_date(r: &mut Reader) -> Result<Value> {
    let year = r.read_u16()? as i16;
    let month = r.read_u8()?;
    let day = r.read_u8()?;
    Ok(Value::Date(Date { year, month, day }))
}

fn decode_time(r: &mut Reader) -> Result<Value> {
    let hour = r.read_u8()?;
    let minute = r.read_u8()?;
    let second = r.read_u8()?;
    let microsecond = r.read_u24()?;
    Ok(Value::Time(Time {
        hour,
        minute,
        second,
        microsecond,
    }))
}

fn decode_datetime(r: &mut Reader) -> Result<Value> {
    let year = r.read_u16()? as i16;
    let month = r.read_u8()?;
    let day = r.read_u8()?;
    let hour = r.read_u8()?;
    let minute = r.read_u8()?;
    let second = r.read_u8()?;
    let microsecond = r.read_u24()?;
    Ok(Value::DateTime(DateTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
        microsecond,
    }))
}

fn decode_timedelta(r: &mut Reader) -> Result<Value> {
    let days = r.read_i32()?;
    let seconds = r.read_i32()?;
    let microseconds = r.read_i32()?;
    Ok(Value::TimeDelta(TimeDelta {
        days,
        seconds,
        microseconds,
    }))
}

fn decode_decimal(r: &mut Reader) -> Result<Value> {
    let negative = r.read_u8()? != 0;
    let exponent = r.read_i16()?;
    let count = r.read_u16()? as usize;
    let byte_count = count.div_ceil(2);
    let bytes = r.read_bytes(byte_count)?;
    let mut digits = Vec::with_capacity(count.min(PREALLOC_CAP));
    for i in 0..count {
        let byte = bytes[i / 2];
        let nibble = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };
        if nibble > 9 {
            return Err(Error::BadDecimalDigit(nibble));
        }
        digits.push(nibble);
    }
    Ok(Value::Decimal(Decimal {
        negative,
        exponent,
        digits,
    }))
}

fn decode_specialnum(r: &mut Reader) -> Result<Value> {
    let flag = r.read_u8()?;
    if flag == tag::SPECIAL_INFINITY {
        Ok(Value::SpecialNum(SpecialNum::PosInfinity))
    } else if flag == tag::SPECIAL_INFINITY | tag::SPECIAL_SIGN_BIT {
        Ok(Value::SpecialNum(SpecialNum::NegInfinity))
    } else if flag == tag::SPECIAL_NAN {
        Ok(Value::SpecialNum(SpecialNum::QuietNaN))
    } else if flag == tag::SPECIAL_NAN | tag::SPECIAL_NAN_SIGNALING_BIT {
        Ok(Value::SpecialNum(SpecialNum::SignalingNaN))
    } else {
        Err(Error::BadSpecialNum(flag))
    }
}
