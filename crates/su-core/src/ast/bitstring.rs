//! Segment specifiers shared by bitstring literals (construction) and
//! bitstring patterns (matching) — spec §3.3 and §6.1's segment grammar.

use num_bigint::BigInt;

use super::{Expr, ExprNode, Literal};

/// The segment `type` specifier. Defaults to `Integer` when unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum SegmentType {
    #[default]
    Integer,
    Float,
    Binary,
    Bitstring,
    Utf8,
    Utf16,
    Utf32,
}

/// The segment `endianness` specifier. Defaults to `Big`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum Endianness {
    #[default]
    Big,
    Little,
    Native,
}

/// The parsed specifier set of one segment (spec §3.3).
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpecs {
    pub ty: SegmentType,
    pub endianness: Endianness,
    pub signed: bool,
    /// Unit multiplier; `None` means "use the type's default" (spec §3.3).
    pub unit: Option<u32>,
    /// Explicit size expression, if the segment wrote one (`:size`).
    pub size: Option<Box<ExprNode>>,
}

impl Default for SegmentSpecs {
    fn default() -> Self {
        Self { ty: SegmentType::default(), endianness: Endianness::default(), signed: false, unit: None, size: None }
    }
}

impl SegmentSpecs {
    /// The effective unit multiplier for this segment's type, applying the
    /// defaults from spec §3.3 when the format string left it unspecified.
    #[must_use]
    pub fn effective_unit(&self) -> u32 {
        self.unit.unwrap_or(match self.ty {
            SegmentType::Binary => 8,
            _ => 1,
        })
    }
}

/// One segment of a bitstring *literal* (construction side): a value
/// expression plus its specifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSegment {
    pub value: ExprNode,
    pub specs: SegmentSpecs,
}

/// What one segment of a bitstring *pattern* binds or compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentTarget {
    /// Binds the decoded value to a new (or previously-bound, for rebinding
    /// checks) variable name.
    Bind(String),
    /// The segment's decoded value must equal this literal (spec §4.H step 5).
    Literal(Literal),
    /// `_` — decode and discard.
    Wildcard,
}

/// One segment of a bitstring *pattern* (matching side).
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSegment {
    pub target: SegmentTarget,
    pub specs: SegmentSpecs,
}

/// Convenience used by the parser: does `expr` look like a bare integer
/// literal usable as a constant segment size?
#[must_use]
pub fn as_const_size(expr: &Expr) -> Option<BigInt> {
    match expr {
        Expr::Literal(Literal::Int(n)) => Some(n.clone()),
        _ => None,
    }
}
