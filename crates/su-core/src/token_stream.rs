//! Component B — a buffered, cheaply-cloneable token cursor.
//!
//! The token vector is shared (via `Rc`) between every clone of the stream;
//! only the cursor position is copied. This is what lets a construct handler
//! speculatively parse on a clone and discard the attempt for free if it
//! turns out not to match (spec §4.B, §9 "Speculative parsing with rollback").

use std::rc::Rc;

use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Rc<[Token]>,
    pos: usize,
}

impl TokenStream {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens: tokens.into(), pos: 0 }
    }

    /// The token at the cursor. Past the end of input this returns the final
    /// `Eof` token repeatedly, so callers never need to bounds-check.
    #[must_use]
    pub fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| self.tokens.last().expect("token stream always has Eof"))
    }

    /// Looks `n` tokens ahead of the cursor without consuming anything.
    #[must_use]
    pub fn peek(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or_else(|| self.tokens.last().expect("token stream always has Eof"))
    }

    /// Advances the cursor by one token and returns the token that was current.
    pub fn consume(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    /// Skips any run of `Newline` tokens at the cursor.
    pub fn skip_newlines(&mut self) {
        while self.current().kind == TokenKind::Newline {
            self.consume();
        }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len() - 1);
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    /// The token immediately before the cursor, if any — used by the
    /// `<<`-disambiguation rule in spec §4.F, which inspects what preceded it.
    #[must_use]
    pub fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn clone_shares_buffer_but_not_cursor() {
        let stream = TokenStream::new(lex("a b c").unwrap());
        let mut clone = stream.clone();
        clone.consume();
        assert_eq!(stream.position(), 0);
        assert_eq!(clone.position(), 1);
    }

    #[test]
    fn rollback_via_set_position() {
        let mut stream = TokenStream::new(lex("a b c").unwrap());
        let mark = stream.position();
        stream.consume();
        stream.consume();
        stream.set_position(mark);
        assert_eq!(stream.current().lexeme, "a");
    }

    #[test]
    fn past_end_returns_eof_forever() {
        let mut stream = TokenStream::new(lex("a").unwrap());
        stream.consume();
        stream.consume();
        stream.consume();
        assert_eq!(stream.current().kind, TokenKind::Eof);
    }
}
