//! Handlers for `if`/`while`/`for`/`match`/`break`/`continue` (spec §3.2).

use crate::ast::{Stmt, StmtNode, Spanned};
use crate::error::{Error, SuResult};
use crate::lexer::TokenKind;
use crate::parser::expr::{parse_expression, parse_pattern};
use crate::parser::handlers::{expect, parse_block};
use crate::parser::registry::{ParseCtx, Registry, StmtHandler};
use crate::token_stream::TokenStream;

pub struct IfHandler;

impl StmtHandler for IfHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::If
    }

    fn priority(&self) -> i32 {
        100
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let registry = if_registry();
        let pos = ctx.tokens.current().position();
        expect(ctx, TokenKind::If)?;
        let mut branches = Vec::new();
        let cond = parse_expression(ctx.tokens)?;
        let body = parse_block(ctx, &registry)?;
        branches.push((cond, body));
        let mut else_branch = None;
        loop {
            ctx.tokens.skip_newlines();
            match ctx.tokens.current().kind {
                TokenKind::Elif => {
                    ctx.tokens.consume();
                    let cond = parse_expression(ctx.tokens)?;
                    let body = parse_block(ctx, &registry)?;
                    branches.push((cond, body));
                }
                TokenKind::Else => {
                    ctx.tokens.consume();
                    else_branch = Some(parse_block(ctx, &registry)?);
                    break;
                }
                _ => break,
            }
        }
        Ok(Some(Spanned::new(Stmt::If { branches, else_branch }, pos)))
    }
}

pub struct WhileHandler;

impl StmtHandler for WhileHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::While
    }

    fn priority(&self) -> i32 {
        100
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        expect(ctx, TokenKind::While)?;
        let cond = parse_expression(ctx.tokens)?;
        let body = parse_loop_block(ctx)?;
        Ok(Some(Spanned::new(Stmt::While { cond, body }, pos)))
    }
}

/// Handles all three `for` forms, disambiguated by what follows the
/// induction-variable identifier: `=` (numeric), `in` (for-in), or `(`
/// opening a C-style `(init; cond; post)` header.
pub struct ForHandler;

impl StmtHandler for ForHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::For
    }

    fn priority(&self) -> i32 {
        100
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        expect(ctx, TokenKind::For)?;

        if ctx.tokens.current().kind == TokenKind::LParen {
            ctx.tokens.consume();
            let init = if ctx.tokens.current().kind == TokenKind::Semicolon {
                None
            } else {
                Some(Box::new(parse_simple_init_stmt(ctx)?))
            };
            expect(ctx, TokenKind::Semicolon)?;
            let cond = if ctx.tokens.current().kind == TokenKind::Semicolon { None } else { Some(parse_expression(ctx.tokens)?) };
            expect(ctx, TokenKind::Semicolon)?;
            let post = if ctx.tokens.current().kind == TokenKind::RParen {
                None
            } else {
                Some(Box::new(parse_simple_init_stmt(ctx)?))
            };
            expect(ctx, TokenKind::RParen)?;
            let body = parse_loop_block(ctx)?;
            return Ok(Some(Spanned::new(Stmt::CStyleFor { init, cond, post, body }, pos)));
        }

        let var_tok = expect(ctx, TokenKind::Ident)?;
        match ctx.tokens.current().kind {
            TokenKind::Eq => {
                ctx.tokens.consume();
                let start = parse_expression(ctx.tokens)?;
                expect(ctx, TokenKind::Comma)?;
                let stop = parse_expression(ctx.tokens)?;
                let step = if ctx.tokens.current().kind == TokenKind::Comma {
                    ctx.tokens.consume();
                    Some(parse_expression(ctx.tokens)?)
                } else {
                    None
                };
                let body = parse_loop_block(ctx)?;
                Ok(Some(Spanned::new(Stmt::NumericFor { var: var_tok.lexeme, start, stop, step, body }, pos)))
            }
            TokenKind::In => {
                ctx.tokens.consume();
                let iter = parse_expression(ctx.tokens)?;
                let body = parse_loop_block(ctx)?;
                Ok(Some(Spanned::new(Stmt::ForIn { var: var_tok.lexeme, iter, body }, pos)))
            }
            _ => Err(Error::syntax(
                format!("expected '=' or 'in' after for-loop variable, found {}", ctx.tokens.current()),
                ctx.tokens.current().position(),
            )),
        }
    }
}

/// A minimal statement grammar for a C-style `for` header clause: either a
/// plain assignment (`i = 0`) or an expression statement (`i++`-style
/// mutation is written `i = i + 1` in this language, so this only ever needs
/// to cover assignment and bare expressions).
fn parse_simple_init_stmt(ctx: &mut ParseCtx) -> SuResult<StmtNode> {
    let pos = ctx.tokens.current().position();
    let ident_pos = ctx.tokens.position();
    if ctx.tokens.current().kind == TokenKind::Ident {
        let name = ctx.tokens.consume().lexeme;
        if ctx.tokens.current().kind == TokenKind::Eq {
            ctx.tokens.consume();
            let value = parse_expression(ctx.tokens)?;
            return Ok(Spanned::new(Stmt::Assign { target: crate::ast::AssignTarget::Var(name), value }, pos));
        }
        ctx.tokens.set_position(ident_pos);
    }
    let expr = parse_expression(ctx.tokens)?;
    Ok(Spanned::new(Stmt::ExprStmt(expr), pos))
}

fn parse_loop_block(ctx: &mut ParseCtx) -> SuResult<Vec<StmtNode>> {
    let registry = loop_registry();
    let mut inner = ParseCtx::new(ctx.tokens, ctx.loop_depth + 1);
    parse_block(&mut inner, &registry)
}

pub struct MatchHandler;

impl StmtHandler for MatchHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::Match
    }

    fn priority(&self) -> i32 {
        100
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        expect(ctx, TokenKind::Match)?;
        let subject = parse_expression(ctx.tokens)?;
        expect(ctx, TokenKind::LBrace)?;
        let registry = if_registry();
        let mut arms = Vec::new();
        loop {
            ctx.tokens.skip_newlines();
            if ctx.tokens.current().kind == TokenKind::RBrace {
                break;
            }
            let pattern = parse_pattern(ctx.tokens)?;
            expect(ctx, TokenKind::Arrow)?;
            // An arm body is a brace-delimited block for multiple statements,
            // or a single statement (spec §8 scenario 1: `pattern -> stmt`).
            let body = if ctx.tokens.current().kind == TokenKind::LBrace {
                parse_block(ctx, &registry)?
            } else {
                match crate::parser::parse_statement(ctx, &registry)? {
                    Some(stmt) => vec![stmt],
                    None => Vec::new(),
                }
            };
            arms.push((pattern, body));
            if ctx.tokens.current().kind == TokenKind::Comma {
                ctx.tokens.consume();
            }
            ctx.tokens.skip_newlines();
        }
        expect(ctx, TokenKind::RBrace)?;
        Ok(Some(Spanned::new(Stmt::Match { subject, arms }, pos)))
    }
}

pub struct BreakHandler;

impl StmtHandler for BreakHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::Break
    }

    fn priority(&self) -> i32 {
        100
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        if ctx.loop_depth == 0 {
            return Err(Error::syntax("'break' outside of a loop", pos));
        }
        expect(ctx, TokenKind::Break)?;
        Ok(Some(Spanned::new(Stmt::Break, pos)))
    }
}

pub struct ContinueHandler;

impl StmtHandler for ContinueHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::Continue
    }

    fn priority(&self) -> i32 {
        100
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();
        if ctx.loop_depth == 0 {
            return Err(Error::syntax("'continue' outside of a loop", pos));
        }
        expect(ctx, TokenKind::Continue)?;
        Ok(Some(Spanned::new(Stmt::Continue, pos)))
    }
}

/// Registry for bodies that are not themselves loops (`if`/`match` arms):
/// `break`/`continue` remain valid only if an *enclosing* loop already
/// raised `loop_depth`, which these bodies inherit from their parent ctx
/// rather than resetting.
fn if_registry() -> Registry {
    crate::parser::full_registry()
}

/// Registry for loop bodies — identical handler set; loops raise
/// `loop_depth` themselves via `parse_loop_block` before calling this.
fn loop_registry() -> Registry {
    crate::parser::full_registry()
}
