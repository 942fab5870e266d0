//! Component D — the construct-handler registry (spec §4.D).
//!
//! Each handler owns one statement-level construct. The driver (in
//! `parser/mod.rs`) tries handlers in descending-priority order against a
//! cloned cursor; a handler commits by returning `Ok(Some(stmt))`, declines
//! by returning `Ok(None)` (the clone is discarded, the next handler gets a
//! turn), and aborts the whole parse by returning `Err` — which a handler
//! should only do once it has recognized its own construct's lead token and
//! found something malformed afterward, not merely because it wasn't a
//! match.
//!
//! Priority is the sole tie-breaker (spec §4.E.5): registration order never
//! affects which handler wins. A handler flagged `fallback` is only ever
//! consulted once every non-fallback handler has declined.

use crate::ast::StmtNode;
use crate::error::SuResult;
use crate::token_stream::TokenStream;

/// Per-statement parse state threaded through every handler. `loop_depth`
/// lets `break`/`continue` handlers reject themselves outside a loop body
/// (spec §3.2 edge case).
pub struct ParseCtx<'a> {
    pub tokens: &'a mut TokenStream,
    pub loop_depth: u32,
}

impl<'a> ParseCtx<'a> {
    pub fn new(tokens: &'a mut TokenStream, loop_depth: u32) -> Self {
        Self { tokens, loop_depth }
    }
}

pub trait StmtHandler {
    /// Cheap, non-consuming check of the current token(s) — lets the driver
    /// skip handlers that cannot possibly apply without attempting a clone.
    fn can_handle(&self, tokens: &TokenStream) -> bool;

    /// Attempts to parse this handler's construct from `ctx`. `Ok(None)`
    /// means "not actually my construct after all" and must leave `ctx`'s
    /// cursor position irrelevant (the driver discards the clone either way).
    fn handle(&self, ctx: &mut ParseCtx) -> SuResult<Option<StmtNode>>;

    /// Higher wins (spec §4.D). Handlers keyed on disjoint token kinds never
    /// actually compete, so most implementations leave this at the default;
    /// it matters only when two handlers can both accept the same lead
    /// token.
    fn priority(&self) -> i32 {
        0
    }

    /// Consulted only once every non-fallback handler has declined (spec
    /// §4.D "a flag `fallback`").
    fn fallback(&self) -> bool {
        false
    }
}

/// List of handlers tried for each statement, ranked by priority at
/// query time rather than by registration order (spec §4.E.5).
#[derive(Default)]
pub struct Registry {
    handlers: Vec<Box<dyn StmtHandler>>,
}

impl Registry {
    pub fn push(&mut self, handler: Box<dyn StmtHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Non-fallback handlers, descending priority.
    pub fn ranked_handlers(&self) -> Vec<&dyn StmtHandler> {
        let mut ranked: Vec<&dyn StmtHandler> =
            self.handlers.iter().filter(|h| !h.fallback()).map(|h| h.as_ref()).collect();
        ranked.sort_by_key(|h| std::cmp::Reverse(h.priority()));
        ranked
    }

    /// Fallback handlers, descending priority — tried only once every
    /// non-fallback handler above has declined.
    pub fn fallback_handlers(&self) -> Vec<&dyn StmtHandler> {
        let mut ranked: Vec<&dyn StmtHandler> =
            self.handlers.iter().filter(|h| h.fallback()).map(|h| h.as_ref()).collect();
        ranked.sort_by_key(|h| std::cmp::Reverse(h.priority()));
        ranked
    }
}
