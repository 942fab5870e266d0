//! Component H — in-place bitstring matching (spec §4.H).
//!
//! A match walks the source bitstring left to right, decoding one segment at
//! a time and advancing a bit cursor. Segment order matters because later
//! segments' dynamic sizes may reference variables bound by earlier ones —
//! that binding happens one level up, in the execution engine; this module
//! only knows how to decode a single segment once its width is resolved.

use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::cast::ToPrimitive;

use crate::ast::SegmentType;
use crate::value::Value;

use super::bits::{f16_bits_to_f32, from_twos_complement_bits, undo_endianness};
use super::{BitBuffer, Bitstring};
use crate::ast::SegmentSpecs;

#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
pub enum MatchError {
    /// Fewer bits remained than the segment's resolved width required.
    InsufficientBits,
    /// A float segment's resolved width wasn't 16, 32 or 64.
    InvalidFloatSize,
    /// Decoded bytes were not valid UTF-8/UTF-16/UTF-32.
    InvalidEncoding,
    /// The segment needed a size but none was declared, defaulted, or (for
    /// the last segment of a `binary`/`bitstring`) implicit "rest".
    MissingSize,
}

impl std::error::Error for MatchError {}

pub struct MatchedSegment {
    pub value: Value,
    pub bits_consumed: u64,
}

/// Decodes one segment starting at `bit_offset` in `source`.
///
/// `resolved_size` is the already-evaluated `:size` field (unit is applied
/// here); `None` means "use the type default", except for `binary`/
/// `bitstring` where `None` means "consume every remaining bit" (spec §4.H
/// edge case: an unsized binary/bitstring segment must be the final one).
pub fn match_segment(
    source: &Bitstring,
    bit_offset: u64,
    specs: &SegmentSpecs,
    resolved_size: Option<u64>,
) -> Result<MatchedSegment, MatchError> {
    let remaining = source.bit_len().saturating_sub(bit_offset);
    let unit = u64::from(specs.effective_unit());

    match specs.ty {
        SegmentType::Integer => {
            let width = resolved_size.unwrap_or(8) * unit;
            let bits = take_bits(source, bit_offset, width, remaining)?;
            let msb = undo_endianness(&bits, specs.endianness);
            let value = from_twos_complement_bits(&msb, specs.signed);
            Ok(MatchedSegment { value: Value::Int(value), bits_consumed: width })
        }
        SegmentType::Float => {
            let width = resolved_size.unwrap_or(64) * unit;
            let bits = take_bits(source, bit_offset, width, remaining)?;
            let msb = undo_endianness(&bits, specs.endianness);
            let f = decode_float(&msb)?;
            Ok(MatchedSegment { value: Value::Float(f), bits_consumed: width })
        }
        SegmentType::Binary | SegmentType::Bitstring => {
            let width = match resolved_size {
                Some(n) => n * unit,
                None => remaining,
            };
            let bits = take_bits(source, bit_offset, width, remaining)?;
            let mut buf = BitBuffer::new();
            buf.push_bits(&bits);
            let value = if specs.ty == SegmentType::Binary {
                match Bitstring::from_buffer(buf).as_bytes() {
                    Some(bytes) => Value::Bitstring(Arc::new(Bitstring::from_bytes(bytes.to_vec()))),
                    None => return Err(MatchError::InsufficientBits),
                }
            } else {
                Value::Bitstring(Arc::new(Bitstring::from_buffer(buf)))
            };
            Ok(MatchedSegment { value, bits_consumed: width })
        }
        SegmentType::Utf8 => decode_utf8(source, bit_offset, remaining),
        SegmentType::Utf16 => decode_utf16(source, bit_offset, remaining, specs),
        SegmentType::Utf32 => decode_utf32(source, bit_offset, remaining, specs),
    }
}

fn take_bits(source: &Bitstring, offset: u64, width: u64, remaining: u64) -> Result<Vec<bool>, MatchError> {
    if width > remaining {
        return Err(MatchError::InsufficientBits);
    }
    Ok(source.buffer().read_bits(offset, width))
}

fn decode_float(msb_bits: &[bool]) -> Result<f64, MatchError> {
    match msb_bits.len() {
        16 => {
            let n = from_twos_complement_bits(msb_bits, false);
            let bits16 = n.to_u32().unwrap_or(0) as u16;
            Ok(f64::from(f16_bits_to_f32(bits16)))
        }
        32 => {
            let n = from_twos_complement_bits(msb_bits, false);
            Ok(f64::from(f32::from_bits(n.to_u32().unwrap_or(0))))
        }
        64 => {
            let n = from_twos_complement_bits(msb_bits, false);
            Ok(f64::from_bits(n.to_u64().unwrap_or(0)))
        }
        _ => Err(MatchError::InvalidFloatSize),
    }
}

fn decode_utf8(source: &Bitstring, offset: u64, remaining: u64) -> Result<MatchedSegment, MatchError> {
    for len in 1..=4u64 {
        if len * 8 > remaining {
            break;
        }
        let bits = source.buffer().read_bits(offset, len * 8);
        let mut bytes = Vec::with_capacity(len as usize);
        for chunk in bits.chunks(8) {
            let n = from_twos_complement_bits(chunk, false);
            bytes.push(n.to_u8().unwrap_or(0));
        }
        if let Ok(s) = std::str::from_utf8(&bytes) {
            if let Some(c) = s.chars().next() {
                return Ok(MatchedSegment {
                    value: Value::Int(BigInt::from(c as u32)),
                    bits_consumed: len * 8,
                });
            }
        }
    }
    Err(MatchError::InvalidEncoding)
}

fn decode_utf16(
    source: &Bitstring,
    offset: u64,
    remaining: u64,
    specs: &SegmentSpecs,
) -> Result<MatchedSegment, MatchError> {
    if remaining < 16 {
        return Err(MatchError::InsufficientBits);
    }
    let first = undo_endianness(&source.buffer().read_bits(offset, 16), specs.endianness);
    let first_unit = from_twos_complement_bits(&first, false).to_u16().unwrap_or(0);
    if (0xD800..=0xDBFF).contains(&first_unit) {
        if remaining < 32 {
            return Err(MatchError::InsufficientBits);
        }
        let second = undo_endianness(&source.buffer().read_bits(offset + 16, 16), specs.endianness);
        let second_unit = from_twos_complement_bits(&second, false).to_u16().unwrap_or(0);
        let pair = [first_unit, second_unit];
        let s = String::from_utf16(&pair).map_err(|_| MatchError::InvalidEncoding)?;
        let c = s.chars().next().ok_or(MatchError::InvalidEncoding)?;
        Ok(MatchedSegment { value: Value::Int(BigInt::from(c as u32)), bits_consumed: 32 })
    } else {
        let s = String::from_utf16(&[first_unit]).map_err(|_| MatchError::InvalidEncoding)?;
        let c = s.chars().next().ok_or(MatchError::InvalidEncoding)?;
        Ok(MatchedSegment { value: Value::Int(BigInt::from(c as u32)), bits_consumed: 16 })
    }
}

fn decode_utf32(
    source: &Bitstring,
    offset: u64,
    remaining: u64,
    specs: &SegmentSpecs,
) -> Result<MatchedSegment, MatchError> {
    if remaining < 32 {
        return Err(MatchError::InsufficientBits);
    }
    let bits = undo_endianness(&source.buffer().read_bits(offset, 32), specs.endianness);
    let n = from_twos_complement_bits(&bits, false).to_u32().ok_or(MatchError::InvalidEncoding)?;
    char::from_u32(n).ok_or(MatchError::InvalidEncoding)?;
    Ok(MatchedSegment { value: Value::Int(BigInt::from(n)), bits_consumed: 32 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Endianness, SegmentSpecs, SegmentType};

    fn specs(ty: SegmentType) -> SegmentSpecs {
        SegmentSpecs { ty, ..Default::default() }
    }

    #[test]
    fn decodes_default_8_bit_integer() {
        let bs = Bitstring::from_bytes(vec![0xFF]);
        let out = match_segment(&bs, 0, &specs(SegmentType::Integer), None).unwrap();
        assert_eq!(out.bits_consumed, 8);
        assert_eq!(out.value.type_name(), "int");
    }

    #[test]
    fn decodes_little_endian_16_bit_integer() {
        let bs = Bitstring::from_bytes(vec![0x34, 0x12]);
        let mut s = specs(SegmentType::Integer);
        s.endianness = Endianness::Little;
        let out = match_segment(&bs, 0, &s, Some(16)).unwrap();
        match out.value {
            Value::Int(n) => assert_eq!(n, BigInt::from(0x1234)),
            _ => panic!("expected int"),
        }
    }

    #[test]
    fn insufficient_bits_errors() {
        let bs = Bitstring::from_bytes(vec![0x01]);
        let err = match_segment(&bs, 0, &specs(SegmentType::Integer), Some(16)).unwrap_err();
        assert_eq!(err, MatchError::InsufficientBits);
    }

    #[test]
    fn unsized_binary_segment_consumes_rest() {
        let bs = Bitstring::from_bytes(vec![0x01, 0x02, 0x03]);
        let out = match_segment(&bs, 8, &specs(SegmentType::Binary), None).unwrap();
        assert_eq!(out.bits_consumed, 16);
    }

    #[test]
    fn utf8_decodes_multibyte_codepoint() {
        let bs = Bitstring::from_bytes("é".as_bytes().to_vec());
        let out = match_segment(&bs, 0, &specs(SegmentType::Utf8), None).unwrap();
        match out.value {
            Value::Int(n) => assert_eq!(n, BigInt::from('é' as u32)),
            _ => panic!("expected int"),
        }
    }
}
