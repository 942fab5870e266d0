//! `import` and the universal expression-statement fallback.

use crate::ast::{Spanned, Stmt, StmtNode};
use crate::error::SuResult;
use crate::lexer::TokenKind;
use crate::parser::expr::parse_expression;
use crate::parser::handlers::expect;
use crate::parser::registry::{ParseCtx, StmtHandler};
use crate::token_stream::TokenStream;

pub struct ImportHandler;

impl StmtHandler for ImportHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::Import
    }

    fn priority(&self) -> i32 {
        100
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        expect(ctx, TokenKind::Import)?;
        let name = expect(ctx, TokenKind::StringLiteral).or_else(|_| expect(ctx, TokenKind::Ident))?;
        Ok(Some(Spanned::new(Stmt::Import(name.lexeme), pos)))
    }
}

/// The fallback handler: always applicable, tried last. Parses any
/// remaining construct as a bare expression statement (spec §4.E step 5 —
/// "on total exhaustion of specific handlers, the driver falls back to
/// treating the construct as an expression").
pub struct ExprStmtHandler;

impl StmtHandler for ExprStmtHandler {
    fn can_handle(&self, _tokens: &TokenStream) -> bool {
        true
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        let expr = parse_expression(ctx.tokens)?;
        Ok(Some(Spanned::new(Stmt::ExprStmt(expr), pos)))
    }

    fn fallback(&self) -> bool {
        true
    }
}
