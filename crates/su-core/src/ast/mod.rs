//! Component C — the typed AST produced by the parser.
//!
//! Every statement and expression node is wrapped in [`Spanned`] so the
//! execution engine can attach a source position to any runtime error
//! (spec §6.4: "runtime errors the evaluating node's position").

mod bitstring;
mod expr;
mod pattern;
mod stmt;

pub use bitstring::{Endianness, SegmentSpecs, SegmentTarget, SegmentType, PatternSegment, ValueSegment};
pub use expr::{BinaryOp, Expr, Literal, ObjectKey, UnaryOp};
pub use pattern::Pattern;
pub use stmt::{AssignTarget, Stmt};

use crate::error::Position;

/// Wraps an AST node with the position of its leading token.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub pos: Position,
}

impl<T> Spanned<T> {
    #[must_use]
    pub fn new(node: T, pos: Position) -> Self {
        Self { node, pos }
    }
}

pub type ExprNode = Spanned<Expr>;
pub type StmtNode = Spanned<Stmt>;

/// A parsed program: a flat list of top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<StmtNode>,
}
