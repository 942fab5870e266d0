//! Plain-variable/index assignment and in-place bitstring-pattern
//! assignment (spec §3.2, §4.H).

use crate::ast::{AssignTarget, Expr, Spanned, Stmt, StmtNode};
use crate::error::SuResult;
use crate::lexer::TokenKind;
use crate::parser::expr::{parse_bitstring_pattern, parse_expression};
use crate::parser::handlers::expect;
use crate::parser::registry::{ParseCtx, StmtHandler};
use crate::scope::RESERVED_LANGUAGE_NAMES;
use crate::token_stream::TokenStream;

pub struct AssignmentHandler;

impl StmtHandler for AssignmentHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::Ident && !RESERVED_LANGUAGE_NAMES.contains(&tokens.current().lexeme.as_str())
    }

    fn priority(&self) -> i32 {
        80
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        let target_expr = parse_expression(ctx.tokens)?;
        if ctx.tokens.current().kind != TokenKind::Eq {
            return Ok(None);
        }
        let target = match target_expr.node {
            Expr::Var(name) => AssignTarget::Var(name),
            Expr::Index(base, index) => AssignTarget::Index(base, index),
            _ => return Ok(None),
        };
        ctx.tokens.consume();
        let value = parse_expression(ctx.tokens)?;
        Ok(Some(Spanned::new(Stmt::Assign { target, value }, pos)))
    }
}

/// `<<h:8, rest/binary>> = expr` (spec §4.H step 5: literal segments compare,
/// bind segments rebind, the whole match-then-assign is atomic).
pub struct BitstringAssignHandler;

impl StmtHandler for BitstringAssignHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::LtLt
    }

    fn priority(&self) -> i32 {
        90
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        let segments = parse_bitstring_pattern(ctx.tokens)?;
        if ctx.tokens.current().kind != TokenKind::Eq {
            return Ok(None);
        }
        expect(ctx, TokenKind::Eq)?;
        let value = parse_expression(ctx.tokens)?;
        Ok(Some(Spanned::new(Stmt::Assign { target: AssignTarget::BitstringPattern(segments), value }, pos)))
    }
}
