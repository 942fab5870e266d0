//! Pattern AST nodes — used only in `match` arms and in-place bitstring
//! assignment left-hand sides (spec §3.2).

use super::{ExprNode, Literal, PatternSegment};

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Literal(Literal),
    Var(String),
    Wildcard,
    Array { items: Vec<Pattern>, rest: Option<String> },
    Object(Vec<(String, Pattern)>),
    Bitstring(Vec<PatternSegment>),
    /// A pattern arm may also be a general expression evaluated as a literal
    /// comparison left over from the lexer/parser emitting a non-literal AST
    /// (e.g. a negative number via unary minus); kept distinct from `Literal`
    /// since `Literal` only covers lexically literal tokens.
    ExprLiteral(Box<ExprNode>),
}
