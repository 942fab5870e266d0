//! Concrete construct handlers (spec §4.D), one module per family of
//! related statements.

mod assignment;
mod control_flow;
mod expr_stmt;
mod language;

pub use assignment::{AssignmentHandler, BitstringAssignHandler};
pub use control_flow::{BreakHandler, ContinueHandler, ForHandler, IfHandler, MatchHandler, WhileHandler};
pub use expr_stmt::{ExprStmtHandler, ImportHandler};
pub use language::LanguageConstructHandler;

use crate::ast::StmtNode;
use crate::error::{Error, SuResult};
use crate::lexer::TokenKind;
use crate::parser::registry::ParseCtx;

/// Parses `{ stmt* }`, used by every construct with a block body.
pub fn parse_block(ctx: &mut ParseCtx, registry: &crate::parser::registry::Registry) -> SuResult<Vec<StmtNode>> {
    expect(ctx, TokenKind::LBrace)?;
    let mut body = Vec::new();
    loop {
        ctx.tokens.skip_newlines();
        if ctx.tokens.current().kind == TokenKind::RBrace {
            break;
        }
        match crate::parser::parse_statement(ctx, registry)? {
            Some(stmt) => body.push(stmt),
            None => break,
        }
    }
    expect(ctx, TokenKind::RBrace)?;
    Ok(body)
}

pub fn expect(ctx: &mut ParseCtx, kind: TokenKind) -> SuResult<crate::lexer::Token> {
    if ctx.tokens.current().kind == kind {
        Ok(ctx.tokens.consume())
    } else {
        Err(Error::syntax(format!("expected {kind}, found {}", ctx.tokens.current()), ctx.tokens.current().position()))
    }
}

pub fn at_statement_end(ctx: &mut ParseCtx) {
    while matches!(ctx.tokens.current().kind, TokenKind::Newline | TokenKind::Semicolon) {
        ctx.tokens.consume();
    }
}
