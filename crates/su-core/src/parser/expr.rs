//! Component F — the precedence-climbing expression layer (spec §4.F).
//!
//! Implements the 17-level table as a chain of mutually recursive descent
//! functions, tightest precedence at the bottom. `<<` is only ever treated
//! as a bitstring literal opener at a *primary* position — every other call
//! site reaches it through an infix loop, where a complete left operand
//! already exists, so it is unambiguously the shift operator. That mirrors
//! spec §4.F's rule without needing separate lexer-level disambiguation.
//!
//! Segment values inside a bitstring literal (`<<expr:size/spec>>`) are
//! parsed with division (`/`) excluded from the multiplicative level, since
//! `/` there opens the specifier list instead — the `allow_slash` flag
//! threaded through every level exists for exactly that one case.

use num_bigint::BigInt;

use crate::ast::{
    BinaryOp, Endianness, Expr, ExprNode, Literal, ObjectKey, PatternSegment, SegmentSpecs,
    SegmentTarget, SegmentType, Spanned, UnaryOp, ValueSegment,
};
use crate::ast::Pattern;
use crate::error::{Error, SuResult};
use crate::lexer::TokenKind;
use crate::token_stream::TokenStream;

/// Parses one full expression (division allowed).
pub fn parse_expression(ts: &mut TokenStream) -> SuResult<ExprNode> {
    parse_ternary(ts, true)
}

fn parse_ternary(ts: &mut TokenStream, allow_slash: bool) -> SuResult<ExprNode> {
    let cond = parse_or(ts, allow_slash)?;
    match ts.current().kind {
        TokenKind::Question => {
            let pos = ts.current().position();
            ts.consume();
            let then_branch = parse_ternary(ts, allow_slash)?;
            expect(ts, TokenKind::Colon)?;
            let else_branch = parse_ternary(ts, allow_slash)?;
            Ok(Spanned::new(
                Expr::Ternary { cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch: Box::new(else_branch) },
                pos,
            ))
        }
        TokenKind::QuestionColon => {
            let pos = ts.current().position();
            ts.consume();
            let rhs = parse_ternary(ts, allow_slash)?;
            Ok(Spanned::new(Expr::Elvis(Box::new(cond), Box::new(rhs)), pos))
        }
        _ => Ok(cond),
    }
}

macro_rules! left_assoc_level {
    ($name:ident, $next:ident, [$(($kind:pat, $op:expr)),+ $(,)?]) => {
        fn $name(ts: &mut TokenStream, allow_slash: bool) -> SuResult<ExprNode> {
            let mut left = $next(ts, allow_slash)?;
            loop {
                let op = match ts.current().kind {
                    $($kind => $op,)+
                    _ => break,
                };
                let pos = ts.current().position();
                ts.consume();
                let right = $next(ts, allow_slash)?;
                left = Spanned::new(Expr::Binary(op, Box::new(left), Box::new(right)), pos);
            }
            Ok(left)
        }
    };
}

left_assoc_level!(parse_or, parse_and, [(TokenKind::OrOr, BinaryOp::Or)]);
left_assoc_level!(parse_and, parse_eq, [(TokenKind::AndAnd, BinaryOp::And)]);
left_assoc_level!(parse_eq, parse_cmp, [(TokenKind::EqEq, BinaryOp::Eq), (TokenKind::NotEq, BinaryOp::NotEq)]);
left_assoc_level!(
    parse_cmp,
    parse_shift,
    [
        (TokenKind::Lt, BinaryOp::Lt),
        (TokenKind::Le, BinaryOp::Le),
        (TokenKind::Gt, BinaryOp::Gt),
        (TokenKind::Ge, BinaryOp::Ge),
    ]
);
left_assoc_level!(parse_shift, parse_bitxor, [(TokenKind::LtLt, BinaryOp::Shl), (TokenKind::GtGt, BinaryOp::Shr)]);
left_assoc_level!(parse_bitxor, parse_pipe_level, [(TokenKind::Caret, BinaryOp::BitXor)]);

/// Precedence 9: `a | f | g` — left-associative, builds nested `Pipe` nodes
/// rather than a `Binary` op (spec §3.2/§4.L.4 treat `|` as the pipe
/// operator, not bitwise-or; `&`/`^` remain the bitwise operators at their
/// own levels).
fn parse_pipe_level(ts: &mut TokenStream, allow_slash: bool) -> SuResult<ExprNode> {
    let mut left = parse_bitand(ts, allow_slash)?;
    while ts.current().kind == TokenKind::Pipe {
        let pos = ts.current().position();
        ts.consume();
        let right = parse_bitand(ts, allow_slash)?;
        left = Spanned::new(Expr::Pipe(Box::new(left), Box::new(right)), pos);
    }
    Ok(left)
}

left_assoc_level!(parse_bitand, parse_concat, [(TokenKind::Amp, BinaryOp::BitAnd)]);
left_assoc_level!(parse_concat, parse_additive, [(TokenKind::PlusPlus, BinaryOp::Concat)]);
left_assoc_level!(parse_additive, parse_mul, [(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)]);

fn parse_mul(ts: &mut TokenStream, allow_slash: bool) -> SuResult<ExprNode> {
    let mut left = parse_pow(ts, allow_slash)?;
    loop {
        let op = match ts.current().kind {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash if allow_slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            _ => break,
        };
        let pos = ts.current().position();
        ts.consume();
        let right = parse_pow(ts, allow_slash)?;
        left = Spanned::new(Expr::Binary(op, Box::new(left), Box::new(right)), pos);
    }
    Ok(left)
}

/// Precedence 4: `**`, right-associative.
fn parse_pow(ts: &mut TokenStream, allow_slash: bool) -> SuResult<ExprNode> {
    let base = parse_unary(ts, allow_slash)?;
    if ts.current().kind == TokenKind::StarStar {
        let pos = ts.current().position();
        ts.consume();
        let exp = parse_pow(ts, allow_slash)?; // right-assoc: recurse at the same level
        return Ok(Spanned::new(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exp)), pos));
    }
    Ok(base)
}

fn parse_unary(ts: &mut TokenStream, allow_slash: bool) -> SuResult<ExprNode> {
    let op = match ts.current().kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Bang => Some(UnaryOp::Not),
        TokenKind::Tilde => Some(UnaryOp::BitNot),
        _ => None,
    };
    if let Some(op) = op {
        let pos = ts.current().position();
        ts.consume();
        let operand = parse_unary(ts, allow_slash)?;
        return Ok(Spanned::new(Expr::Unary(op, Box::new(operand)), pos));
    }
    parse_sizeof(ts, allow_slash)
}

fn parse_sizeof(ts: &mut TokenStream, allow_slash: bool) -> SuResult<ExprNode> {
    if ts.current().kind == TokenKind::At {
        let pos = ts.current().position();
        ts.consume();
        let operand = parse_sizeof(ts, allow_slash)?;
        return Ok(Spanned::new(Expr::SizeOf(Box::new(operand)), pos));
    }
    parse_postfix(ts, allow_slash)
}

fn parse_postfix(ts: &mut TokenStream, allow_slash: bool) -> SuResult<ExprNode> {
    let mut expr = parse_primary(ts, allow_slash)?;
    loop {
        match ts.current().kind {
            TokenKind::LParen => {
                let pos = ts.current().position();
                ts.consume();
                let args = parse_arg_list(ts)?;
                expect(ts, TokenKind::RParen)?;
                expr = Spanned::new(Expr::Call { callee: Box::new(expr), args }, pos);
            }
            TokenKind::LBracket => {
                let pos = ts.current().position();
                ts.consume();
                let index = parse_expression(ts)?;
                expect(ts, TokenKind::RBracket)?;
                expr = Spanned::new(Expr::Index(Box::new(expr), Box::new(index)), pos);
            }
            _ => break,
        }
    }
    Ok(expr)
}

fn parse_arg_list(ts: &mut TokenStream) -> SuResult<Vec<ExprNode>> {
    let mut args = Vec::new();
    if ts.current().kind == TokenKind::RParen {
        return Ok(args);
    }
    loop {
        args.push(parse_expression(ts)?);
        if ts.current().kind == TokenKind::Comma {
            ts.consume();
        } else {
            break;
        }
    }
    Ok(args)
}

fn parse_primary(ts: &mut TokenStream, _allow_slash: bool) -> SuResult<ExprNode> {
    let tok = ts.current().clone();
    let pos = tok.position();
    match tok.kind {
        TokenKind::IntLiteral | TokenKind::BigIntLiteral => {
            ts.consume();
            let digits = tok.lexeme.replace('_', "");
            let n = parse_int_literal(&digits).ok_or_else(|| Error::syntax(format!("invalid integer literal '{digits}'"), pos))?;
            Ok(Spanned::new(Expr::Literal(Literal::Int(n)), pos))
        }
        TokenKind::FloatLiteral => {
            ts.consume();
            let f: f64 = tok.lexeme.replace('_', "").parse().map_err(|_| Error::syntax(format!("invalid float literal '{}'", tok.lexeme), pos))?;
            Ok(Spanned::new(Expr::Literal(Literal::Float(f)), pos))
        }
        TokenKind::StringLiteral => {
            ts.consume();
            Ok(Spanned::new(Expr::Literal(Literal::Str(tok.lexeme)), pos))
        }
        TokenKind::True => {
            ts.consume();
            Ok(Spanned::new(Expr::Literal(Literal::Bool(true)), pos))
        }
        TokenKind::False => {
            ts.consume();
            Ok(Spanned::new(Expr::Literal(Literal::Bool(false)), pos))
        }
        TokenKind::Nil => {
            ts.consume();
            Ok(Spanned::new(Expr::Literal(Literal::Nil), pos))
        }
        TokenKind::Ident => {
            ts.consume();
            if crate::scope::RESERVED_LANGUAGE_NAMES.contains(&tok.lexeme.as_str()) && ts.current().kind == TokenKind::Dot {
                ts.consume();
                let name_tok = expect(ts, TokenKind::Ident)?;
                return Ok(Spanned::new(Expr::QualifiedVar(tok.lexeme, name_tok.lexeme), pos));
            }
            Ok(Spanned::new(Expr::Var(tok.lexeme), pos))
        }
        TokenKind::LParen => {
            ts.consume();
            let inner = parse_expression(ts)?;
            expect(ts, TokenKind::RParen)?;
            Ok(Spanned::new(Expr::Group(Box::new(inner)), pos))
        }
        TokenKind::LBracket => {
            ts.consume();
            let mut items = Vec::new();
            if ts.current().kind != TokenKind::RBracket {
                loop {
                    items.push(parse_expression(ts)?);
                    if ts.current().kind == TokenKind::Comma {
                        ts.consume();
                    } else {
                        break;
                    }
                }
            }
            expect(ts, TokenKind::RBracket)?;
            Ok(Spanned::new(Expr::Array(items), pos))
        }
        TokenKind::LBrace => {
            ts.consume();
            let mut entries = Vec::new();
            if ts.current().kind != TokenKind::RBrace {
                loop {
                    let key = parse_object_key(ts)?;
                    expect(ts, TokenKind::Colon)?;
                    let value = parse_expression(ts)?;
                    entries.push((key, value));
                    if ts.current().kind == TokenKind::Comma {
                        ts.consume();
                    } else {
                        break;
                    }
                }
            }
            expect(ts, TokenKind::RBrace)?;
            Ok(Spanned::new(Expr::Object(entries), pos))
        }
        TokenKind::LtLt => parse_bitstring_literal(ts),
        _ => Err(Error::syntax(format!("expected an expression, found {}", tok), pos)),
    }
}

fn parse_object_key(ts: &mut TokenStream) -> SuResult<ObjectKey> {
    match ts.current().kind {
        TokenKind::Ident => {
            let tok = ts.consume();
            Ok(ObjectKey::Ident(tok.lexeme))
        }
        TokenKind::StringLiteral => {
            let tok = ts.consume();
            Ok(ObjectKey::Str(tok.lexeme))
        }
        TokenKind::LBracket => {
            ts.consume();
            let expr = parse_expression(ts)?;
            expect(ts, TokenKind::RBracket)?;
            Ok(ObjectKey::Computed(Box::new(expr)))
        }
        _ => Err(Error::syntax(format!("expected an object key, found {}", ts.current()), ts.current().position())),
    }
}

// --- Bitstring literal (construction side) ---------------------------------

fn parse_bitstring_literal(ts: &mut TokenStream) -> SuResult<ExprNode> {
    let pos = ts.current().position();
    expect(ts, TokenKind::LtLt)?;
    let mut segments = Vec::new();
    if ts.current().kind != TokenKind::GtGt {
        loop {
            segments.push(parse_value_segment(ts)?);
            if ts.current().kind == TokenKind::Comma {
                ts.consume();
            } else {
                break;
            }
        }
    }
    expect(ts, TokenKind::GtGt)?;
    Ok(Spanned::new(Expr::Bitstring(segments), pos))
}

fn parse_value_segment(ts: &mut TokenStream) -> SuResult<ValueSegment> {
    let value = parse_ternary(ts, false)?;
    let specs = parse_segment_specs(ts)?;
    Ok(ValueSegment { value, specs })
}

/// Parses the optional `:size` and `/spec-spec-...` trailer shared by both
/// value segments and pattern segments (spec §6.1 grammar).
fn parse_segment_specs(ts: &mut TokenStream) -> SuResult<SegmentSpecs> {
    let mut specs = SegmentSpecs::default();
    if ts.current().kind == TokenKind::Colon {
        ts.consume();
        specs.size = Some(Box::new(parse_segment_size(ts)?));
    }
    if ts.current().kind == TokenKind::Slash {
        ts.consume();
        loop {
            apply_spec_word(&mut specs, ts)?;
            match ts.current().kind {
                TokenKind::Comma | TokenKind::Minus => {
                    ts.consume();
                }
                _ => break,
            }
        }
    }
    Ok(specs)
}

/// A segment's `:size` accepts an integer literal, a variable bound by an
/// earlier segment (dynamic TLV sizing, spec §3.3), or a parenthesized
/// arithmetic expression over those — i.e. anything up to additive
/// precedence, stopping short of `:`/`/` so the specifier list still parses.
fn parse_segment_size(ts: &mut TokenStream) -> SuResult<ExprNode> {
    parse_additive(ts, true)
}

fn apply_spec_word(specs: &mut SegmentSpecs, ts: &mut TokenStream) -> SuResult<()> {
    let tok = ts.current().clone();
    if tok.kind != TokenKind::Ident {
        return Err(Error::syntax(format!("expected a segment specifier, found {tok}"), tok.position()));
    }
    ts.consume();
    match tok.lexeme.as_str() {
        "integer" => specs.ty = SegmentType::Integer,
        "float" => specs.ty = SegmentType::Float,
        "binary" => specs.ty = SegmentType::Binary,
        "bitstring" => specs.ty = SegmentType::Bitstring,
        "utf8" => specs.ty = SegmentType::Utf8,
        "utf16" => specs.ty = SegmentType::Utf16,
        "utf32" => specs.ty = SegmentType::Utf32,
        "big" => specs.endianness = Endianness::Big,
        "little" => specs.endianness = Endianness::Little,
        "native" => specs.endianness = Endianness::Native,
        "signed" => specs.signed = true,
        "unsigned" => specs.signed = false,
        "unit" => {
            expect(ts, TokenKind::Colon)?;
            let n = expect(ts, TokenKind::IntLiteral)?;
            let unit: u32 = n.lexeme.parse().map_err(|_| Error::syntax(format!("invalid unit '{}'", n.lexeme), n.position()))?;
            specs.unit = Some(unit);
        }
        other => return Err(Error::syntax(format!("unknown segment specifier '{other}'"), tok.position())),
    }
    Ok(())
}

fn parse_int_literal(digits: &str) -> Option<BigInt> {
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        return BigInt::parse_bytes(hex.as_bytes(), 16);
    }
    if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        return BigInt::parse_bytes(bin.as_bytes(), 2);
    }
    BigInt::parse_bytes(digits.as_bytes(), 10)
}

fn expect(ts: &mut TokenStream, kind: TokenKind) -> SuResult<crate::lexer::Token> {
    if ts.current().kind == kind {
        Ok(ts.consume())
    } else {
        Err(Error::syntax(format!("expected {kind}, found {}", ts.current()), ts.current().position()))
    }
}

// --- Patterns (match arms, bitstring assignment left-hand sides) -----------

/// Parses a `match`-arm or bitstring-assignment pattern (spec §3.2).
pub fn parse_pattern(ts: &mut TokenStream) -> SuResult<Pattern> {
    match ts.current().kind {
        TokenKind::Ident if ts.current().lexeme == "_" => {
            ts.consume();
            Ok(Pattern::Wildcard)
        }
        TokenKind::Ident => {
            let tok = ts.consume();
            Ok(Pattern::Var(tok.lexeme))
        }
        TokenKind::LBracket => {
            ts.consume();
            let mut items = Vec::new();
            let mut rest = None;
            if ts.current().kind != TokenKind::RBracket {
                loop {
                    if ts.current().kind == TokenKind::PlusPlus {
                        ts.consume();
                        let tok = expect(ts, TokenKind::Ident)?;
                        rest = Some(tok.lexeme);
                        break;
                    }
                    items.push(parse_pattern(ts)?);
                    if ts.current().kind == TokenKind::Comma {
                        ts.consume();
                    } else {
                        break;
                    }
                }
            }
            expect(ts, TokenKind::RBracket)?;
            Ok(Pattern::Array { items, rest })
        }
        TokenKind::LBrace => {
            ts.consume();
            let mut entries = Vec::new();
            if ts.current().kind != TokenKind::RBrace {
                loop {
                    let key = expect(ts, TokenKind::Ident)?.lexeme;
                    expect(ts, TokenKind::Colon)?;
                    let value = parse_pattern(ts)?;
                    entries.push((key, value));
                    if ts.current().kind == TokenKind::Comma {
                        ts.consume();
                    } else {
                        break;
                    }
                }
            }
            expect(ts, TokenKind::RBrace)?;
            Ok(Pattern::Object(entries))
        }
        TokenKind::LtLt => Ok(Pattern::Bitstring(parse_bitstring_pattern(ts)?)),
        TokenKind::Minus | TokenKind::IntLiteral | TokenKind::BigIntLiteral | TokenKind::FloatLiteral => {
            let expr = parse_unary(ts, true)?;
            Ok(Pattern::ExprLiteral(Box::new(expr)))
        }
        TokenKind::StringLiteral => {
            let tok = ts.consume();
            Ok(Pattern::Literal(Literal::Str(tok.lexeme)))
        }
        TokenKind::True => {
            ts.consume();
            Ok(Pattern::Literal(Literal::Bool(true)))
        }
        TokenKind::False => {
            ts.consume();
            Ok(Pattern::Literal(Literal::Bool(false)))
        }
        TokenKind::Nil => {
            ts.consume();
            Ok(Pattern::Literal(Literal::Nil))
        }
        _ => Err(Error::syntax(format!("expected a pattern, found {}", ts.current()), ts.current().position())),
    }
}

/// Parses `<<seg, seg, ...>>` as a pattern (spec §4.H), where each segment's
/// "value" position is either a bind name, `_`, or a literal to compare.
pub fn parse_bitstring_pattern(ts: &mut TokenStream) -> SuResult<Vec<PatternSegment>> {
    expect(ts, TokenKind::LtLt)?;
    let mut segments = Vec::new();
    if ts.current().kind != TokenKind::GtGt {
        loop {
            let target = parse_segment_target(ts)?;
            let specs = parse_segment_specs(ts)?;
            segments.push(PatternSegment { target, specs });
            if ts.current().kind == TokenKind::Comma {
                ts.consume();
            } else {
                break;
            }
        }
    }
    expect(ts, TokenKind::GtGt)?;
    Ok(segments)
}

fn parse_segment_target(ts: &mut TokenStream) -> SuResult<SegmentTarget> {
    let tok = ts.current().clone();
    match tok.kind {
        TokenKind::Ident if tok.lexeme == "_" => {
            ts.consume();
            Ok(SegmentTarget::Wildcard)
        }
        TokenKind::Ident => {
            ts.consume();
            Ok(SegmentTarget::Bind(tok.lexeme))
        }
        TokenKind::StringLiteral => {
            ts.consume();
            Ok(SegmentTarget::Literal(Literal::Str(tok.lexeme)))
        }
        TokenKind::IntLiteral | TokenKind::BigIntLiteral => {
            ts.consume();
            let digits = tok.lexeme.replace('_', "");
            let n = parse_int_literal(&digits).ok_or_else(|| Error::syntax(format!("invalid integer literal '{digits}'"), tok.position()))?;
            Ok(SegmentTarget::Literal(Literal::Int(n)))
        }
        _ => Err(Error::syntax(format!("expected a bind name or literal, found {tok}"), tok.position())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> ExprNode {
        let tokens = crate::lexer::lex(src).unwrap();
        let mut ts = TokenStream::new(tokens);
        parse_expression(&mut ts).unwrap()
    }

    #[test]
    fn precedence_multiplies_before_adding() {
        let expr = parse("1 + 2 * 3");
        match expr.node {
            Expr::Binary(BinaryOp::Add, _, rhs) => match rhs.node {
                Expr::Binary(BinaryOp::Mul, ..) => {}
                other => panic!("expected mul on rhs, got {other:?}"),
            },
            other => panic!("expected add at top, got {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse("2 ** 3 ** 2");
        match expr.node {
            Expr::Binary(BinaryOp::Pow, _, rhs) => match rhs.node {
                Expr::Binary(BinaryOp::Pow, ..) => {}
                other => panic!("expected nested pow on rhs, got {other:?}"),
            },
            other => panic!("expected pow at top, got {other:?}"),
        }
    }

    #[test]
    fn shift_after_complete_operand_is_not_a_bitstring() {
        let expr = parse("a << 2");
        assert!(matches!(expr.node, Expr::Binary(BinaryOp::Shl, ..)));
    }

    #[test]
    fn double_angle_at_expression_start_is_a_bitstring_literal() {
        let expr = parse("<<1, 2:8>>");
        match expr.node {
            Expr::Bitstring(segments) => assert_eq!(segments.len(), 2),
            other => panic!("expected bitstring, got {other:?}"),
        }
    }

    #[test]
    fn pipe_chains_left_associatively() {
        let expr = parse("a | f | g");
        match expr.node {
            Expr::Pipe(left, _) => assert!(matches!(left.node, Expr::Pipe(..))),
            other => panic!("expected nested pipe, got {other:?}"),
        }
    }

    #[test]
    fn qualified_call_parses_as_call_of_qualified_var() {
        let expr = parse("py.f(1, 2)");
        match expr.node {
            Expr::Call { callee, args } => {
                assert!(matches!(callee.node, Expr::QualifiedVar(ref l, ref n) if l == "py" && n == "f"));
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn bitstring_segment_with_dashed_specs() {
        let expr = parse("<<x:32/big-unsigned-integer-unit:8>>");
        match expr.node {
            Expr::Bitstring(segments) => {
                let specs = &segments[0].specs;
                assert_eq!(specs.ty, SegmentType::Integer);
                assert_eq!(specs.endianness, Endianness::Big);
                assert!(!specs.signed);
                assert_eq!(specs.unit, Some(8));
            }
            other => panic!("expected bitstring, got {other:?}"),
        }
    }
}
