//! Component G — the bitstring builder (spec §4.G).
//!
//! Each segment of a `<<...>>` literal is encoded independently into a bit
//! vector and then appended to the running buffer; the execution engine owns
//! evaluating each segment's value/size expressions and calls in here once
//! per segment with the resolved numbers.

use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::ast::{SegmentSpecs, SegmentType};
use crate::value::Value;

use super::bits::{apply_endianness, f32_to_f16_bits, twos_complement_bits};

#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
pub enum BuildError {
    /// The segment's value doesn't match what its declared type requires
    /// (e.g. a string value in an `integer` segment).
    TypeMismatch,
    /// A float segment's resolved width wasn't 16, 32 or 64.
    InvalidFloatSize,
    /// A `utf8`/`utf16`/`utf32` segment was given an explicit size (spec
    /// §4.G: codepoint segments are always self-sized).
    SizedUtfSegment,
    /// The segment needed a size but none was declared or defaulted.
    MissingSize,
}

impl std::error::Error for BuildError {}

/// The encoded bits of one segment, ready to be appended to the buffer.
#[derive(Debug, Clone)]
pub struct BuiltSegment {
    pub bits: Vec<bool>,
}

impl fmt::Display for BuiltSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.bits.len())
    }
}

/// Encodes one segment. `resolved_size` is the already-evaluated `:size`
/// expression (or `None` for a segment using the type's default / self-sized
/// types), already multiplied out is left to the caller's choice — here it
/// is the segment's declared *size* field only; `unit` is applied inside.
pub fn build_segment(
    value: &Value,
    specs: &SegmentSpecs,
    resolved_size: Option<u64>,
) -> Result<BuiltSegment, BuildError> {
    let unit = specs.effective_unit();
    match specs.ty {
        SegmentType::Integer => {
            let n = as_int(value).ok_or(BuildError::TypeMismatch)?;
            let width = resolved_size.unwrap_or(8) * u64::from(unit);
            let width = u32::try_from(width).map_err(|_| BuildError::MissingSize)?;
            let msb = twos_complement_bits(&n, width, specs.signed);
            Ok(BuiltSegment { bits: apply_endianness(&msb, specs.endianness) })
        }
        SegmentType::Float => {
            let f = as_float(value).ok_or(BuildError::TypeMismatch)?;
            let width = resolved_size.unwrap_or(64) * u64::from(unit);
            let msb = match width {
                16 => {
                    let bits16 = f32_to_f16_bits(f as f32);
                    twos_complement_bits(&BigInt::from(bits16), 16, false)
                }
                32 => twos_complement_bits(&BigInt::from((f as f32).to_bits()), 32, false),
                64 => twos_complement_bits(&BigInt::from(f.to_bits()), 64, false),
                _ => return Err(BuildError::InvalidFloatSize),
            };
            Ok(BuiltSegment { bits: apply_endianness(&msb, specs.endianness) })
        }
        SegmentType::Binary | SegmentType::Bitstring => {
            let bits = bitstring_value_bits(value).ok_or(BuildError::TypeMismatch)?;
            let bits = match resolved_size {
                Some(n) => {
                    let want = (n * u64::from(unit)) as usize;
                    if want > bits.len() {
                        return Err(BuildError::MissingSize);
                    }
                    bits[..want].to_vec()
                }
                None => bits,
            };
            Ok(BuiltSegment { bits })
        }
        SegmentType::Utf8 | SegmentType::Utf16 | SegmentType::Utf32 => {
            if resolved_size.is_some() {
                return Err(BuildError::SizedUtfSegment);
            }
            let codepoint = as_codepoint(value).ok_or(BuildError::TypeMismatch)?;
            Ok(BuiltSegment { bits: encode_utf(specs.ty, codepoint, specs.endianness) })
        }
    }
}

fn as_int(value: &Value) -> Option<BigInt> {
    match value {
        Value::Int(n) => Some(n.clone()),
        Value::Bool(b) => Some(BigInt::from(u8::from(*b))),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Int(n) => n.to_f64(),
        _ => None,
    }
}

fn as_codepoint(value: &Value) -> Option<u32> {
    match value {
        Value::Int(n) => n.to_u32(),
        Value::Str(s) => s.chars().next().map(|c| c as u32),
        _ => None,
    }
}

fn bitstring_value_bits(value: &Value) -> Option<Vec<bool>> {
    match value {
        Value::Bitstring(b) => Some(b.buffer().read_bits(0, b.bit_len())),
        Value::Str(s) => {
            let mut buf = super::BitBuffer::new();
            for byte in s.as_bytes() {
                buf.push_bits(&twos_complement_bits(&BigInt::from(*byte), 8, false));
            }
            Some(buf.read_bits(0, buf.bit_len()))
        }
        _ => None,
    }
}

fn encode_utf(ty: SegmentType, codepoint: u32, endianness: crate::ast::Endianness) -> Vec<bool> {
    use crate::ast::SegmentType::{Utf16, Utf8};
    match ty {
        Utf8 => {
            let mut buf = [0u8; 4];
            let s = char::from_u32(codepoint).unwrap_or('\u{fffd}').encode_utf8(&mut buf);
            let mut out = Vec::new();
            for b in s.as_bytes() {
                out.extend(twos_complement_bits(&BigInt::from(*b), 8, false));
            }
            out
        }
        Utf16 => {
            let c = char::from_u32(codepoint).unwrap_or('\u{fffd}');
            let mut buf = [0u16; 2];
            let units = c.encode_utf16(&mut buf);
            let mut out = Vec::new();
            for unit in units.iter() {
                let msb = twos_complement_bits(&BigInt::from(*unit), 16, false);
                out.extend(apply_endianness(&msb, endianness));
            }
            out
        }
        _ => {
            let msb = twos_complement_bits(&BigInt::from(codepoint), 32, false);
            apply_endianness(&msb, endianness)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Endianness, SegmentSpecs, SegmentType};

    fn specs(ty: SegmentType) -> SegmentSpecs {
        SegmentSpecs { ty, ..Default::default() }
    }

    #[test]
    fn builds_default_8_bit_unsigned_integer() {
        let out = build_segment(&Value::Int(BigInt::from(255)), &specs(SegmentType::Integer), None).unwrap();
        assert_eq!(out.bits.len(), 8);
        assert!(out.bits.iter().all(|&b| b));
    }

    #[test]
    fn builds_little_endian_16_bit_integer() {
        let mut s = specs(SegmentType::Integer);
        s.endianness = Endianness::Little;
        let out = build_segment(&Value::Int(BigInt::from(0x1234)), &s, Some(16)).unwrap();
        assert_eq!(out.bits.len(), 16);
    }

    #[test]
    fn utf8_codepoint_rejects_explicit_size() {
        let s = specs(SegmentType::Utf8);
        let err = build_segment(&Value::Int(BigInt::from(65)), &s, Some(8)).unwrap_err();
        assert_eq!(err, BuildError::SizedUtfSegment);
    }

    #[test]
    fn non_numeric_value_in_integer_segment_errors() {
        let s = specs(SegmentType::Integer);
        let err = build_segment(&Value::str("nope"), &s, None).unwrap_err();
        assert_eq!(err, BuildError::TypeMismatch);
    }
}
