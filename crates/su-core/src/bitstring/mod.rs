//! Components G/H — bitstring construction and in-place matching
//! (spec §3.3, §4.G, §4.H).
//!
//! Build and match share the same cursor type ([`bits::BitBuffer`] for
//! writing, plain bit offsets for reading) so the segment-width arithmetic
//! — size/unit/endianness/signedness resolution — lives in one place
//! ([`bits`]) instead of being duplicated between the two directions.

mod bits;
mod builder;
mod matcher;

pub use bits::BitBuffer;
pub use builder::{build_segment, BuildError, BuiltSegment};
pub use matcher::{match_segment, MatchError, MatchedSegment};

use std::fmt;

use crate::ast::{Endianness, SegmentType};

/// An immutable, arbitrary-bit-length sequence of bits (spec §3.3).
///
/// Two bitstrings of different bit length are never equal even if one is a
/// byte-aligned prefix of the other — matching `values_equal` semantics.
#[derive(Debug, Clone)]
pub struct Bitstring {
    buffer: BitBuffer,
}

impl PartialEq for Bitstring {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer
    }
}

impl Bitstring {
    #[must_use]
    pub fn empty() -> Self {
        Self { buffer: BitBuffer::new() }
    }

    #[must_use]
    pub fn from_buffer(buffer: BitBuffer) -> Self {
        Self { buffer }
    }

    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { buffer: BitBuffer::from_bytes(bytes) }
    }

    #[must_use]
    pub fn bit_len(&self) -> u64 {
        self.buffer.bit_len()
    }

    /// Byte length rounded down (spec §4.H `@bitstring`/`len`): a partial
    /// trailing byte doesn't count.
    #[must_use]
    pub fn byte_len_floor(&self) -> u64 {
        self.buffer.byte_len_floor()
    }

    #[must_use]
    pub fn buffer(&self) -> &BitBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn is_byte_aligned(&self) -> bool {
        self.buffer.is_byte_aligned()
    }

    /// Returns the underlying bytes if every bit belongs to a whole byte
    /// (spec §4.N: only byte-aligned bitstrings marshal to foreign byte
    /// arrays without loss).
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.is_byte_aligned().then(|| self.buffer.bytes())
    }

    /// A sub-bitstring view spanning `[bit_offset, bit_offset + bit_len)`.
    #[must_use]
    pub fn slice(&self, bit_offset: u64, bit_len: u64) -> Self {
        let mut out = BitBuffer::new();
        out.push_bits(&self.buffer.read_bits(bit_offset, bit_len));
        Self { buffer: out }
    }

    /// Display rendering (spec §6.3): `<<1, 2, 3>>` for byte-aligned data,
    /// otherwise the literal bit count is called out since the value cannot
    /// be shown as whole bytes.
    #[must_use]
    pub fn display(&self) -> String {
        match self.as_bytes() {
            Some(bytes) => {
                let parts: Vec<String> = bytes.iter().map(u8::to_string).collect();
                format!("<<{}>>", parts.join(", "))
            }
            None => {
                let bits: Vec<&str> =
                    (0..self.bit_len()).map(|i| if self.buffer.get_bit(i) { "1" } else { "0" }).collect();
                format!("<<{} : {} bits>>", bits.join(""), self.bit_len())
            }
        }
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Resolves the declared or defaulted bit width of a segment whose size is
/// already a concrete integer (dynamic size expressions are evaluated by the
/// execution engine before reaching this layer; spec §4.G/§4.H).
#[must_use]
pub fn resolve_width(ty: SegmentType, declared_size: Option<u64>, unit: u32) -> Option<u64> {
    let size = match (ty, declared_size) {
        (SegmentType::Integer, None) => 8,
        (SegmentType::Float, None) => 64,
        (SegmentType::Utf8 | SegmentType::Utf16 | SegmentType::Utf32, _) => return None,
        (SegmentType::Binary | SegmentType::Bitstring, None) => return None,
        (_, Some(n)) => n,
    };
    Some(size * u64::from(unit))
}

#[allow(dead_code)]
fn resolve_native(e: Endianness) -> Endianness {
    if e == Endianness::Native { Endianness::Little } else { e }
}
