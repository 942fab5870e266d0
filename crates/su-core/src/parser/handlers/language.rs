//! Everything rooted at a reserved language qualifier: qualified reads/calls
//! used as a statement, qualified assignment, and embedded foreign code
//! blocks (spec §3.1, §3.2).

use crate::ast::{AssignTarget, Expr, Spanned, Stmt, StmtNode};
use crate::error::{Error, SuResult};
use crate::lexer::TokenKind;
use crate::parser::expr::parse_expression;
use crate::parser::handlers::expect;
use crate::parser::registry::{ParseCtx, StmtHandler};
use crate::scope::RESERVED_LANGUAGE_NAMES;
use crate::token_stream::TokenStream;

pub struct LanguageConstructHandler;

impl StmtHandler for LanguageConstructHandler {
    fn can_handle(&self, tokens: &TokenStream) -> bool {
        tokens.current().kind == TokenKind::Ident && RESERVED_LANGUAGE_NAMES.contains(&tokens.current().lexeme.as_str())
    }

    fn priority(&self) -> i32 {
        90
    }

    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>> {
        let pos = ctx.tokens.current().position();

        // Reserved-keyword guard (spec §4.D): a bare `lang = value` is never
        // a valid assignment target, so this is a final error, not a
        // non-match — falling through would let the expression-statement
        // fallback swallow the lone identifier and leave `= value` dangling.
        if ctx.tokens.peek(1).kind == TokenKind::Eq {
            let name = ctx.tokens.current().lexeme.clone();
            return Err(Error::new(
                crate::error::ErrorKind::Semantic,
                format!("'{name}' is a reserved language qualifier and cannot be assigned"),
            )
            .at(pos));
        }

        if ctx.tokens.peek(1).kind == TokenKind::LParen {
            return parse_code_block(ctx, pos).map(Some);
        }

        if ctx.tokens.peek(1).kind != TokenKind::Dot {
            return Ok(None);
        }

        let call = parse_expression(ctx.tokens)?;
        if ctx.tokens.current().kind == TokenKind::Eq {
            ctx.tokens.consume();
            let (language, name) = match &call.node {
                Expr::QualifiedVar(l, n) => (l.clone(), n.clone()),
                _ => return Err(Error::syntax("the left-hand side of an assignment must be a plain qualified name", pos)),
            };
            let value = parse_expression(ctx.tokens)?;
            return Ok(Some(Spanned::new(Stmt::Assign { target: AssignTarget::Qualified(language, name), value }, pos)));
        }

        let background = if ctx.tokens.current().kind == TokenKind::Amp {
            ctx.tokens.consume();
            true
        } else {
            false
        };
        Ok(Some(Spanned::new(Stmt::LanguageCall { call, background }, pos)))
    }
}

fn parse_code_block(ctx: &mut ParseCtx, pos: crate::error::Position) -> SuResult<StmtNode> {
    let language = expect(ctx, TokenKind::Ident)?.lexeme;
    expect(ctx, TokenKind::LParen)?;
    let mut exported_names = Vec::new();
    if ctx.tokens.current().kind != TokenKind::RParen {
        loop {
            exported_names.push(expect(ctx, TokenKind::Ident)?.lexeme);
            if ctx.tokens.current().kind == TokenKind::Comma {
                ctx.tokens.consume();
            } else {
                break;
            }
        }
    }
    expect(ctx, TokenKind::RParen)?;
    ctx.tokens.skip_newlines();
    expect(ctx, TokenKind::LBrace)?;

    let mut code_tokens = Vec::new();
    let mut depth = 1u32;
    loop {
        let tok = ctx.tokens.current().clone();
        match tok.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => {
                depth -= 1;
                if depth == 0 {
                    ctx.tokens.consume();
                    break;
                }
            }
            TokenKind::Eof => {
                return Err(Error::syntax("unterminated code block, missing '}'", pos));
            }
            _ => {}
        }
        ctx.tokens.consume();
        if tok.kind != TokenKind::Newline {
            code_tokens.push(tok.lexeme);
        }
    }

    Ok(Spanned::new(Stmt::CodeBlock { language, exported_names, code: code_tokens.join(" ") }, pos))
}
