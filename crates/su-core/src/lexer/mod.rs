//! Component A — byte stream to token stream (spec §4.A).
//!
//! A straightforward streaming lexer that eagerly buffers every token into a
//! `Vec<Token>`; programs passed to this interpreter are small, so there is no
//! benefit to lazy tokenization.

mod token;

pub use token::{Token, TokenKind};

use crate::error::{Error, ErrorKind, Position, SuResult};

/// Lexes `source` into a flat token vector, terminated by a single `Eof` token.
pub fn lex(source: &str) -> SuResult<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a [u8],
    chars: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
    /// Nesting depth of `(`/`[`. A `\n` inside an open paren or bracket is a
    /// continuation, not a statement terminator, so it's dropped rather than
    /// tokenized — matching how call arguments and list literals are allowed
    /// to span lines. `{`/`}` is excluded: block bodies are newline-separated
    /// statement lists, so a brace never suppresses them (object literals
    /// stay single-line as a result).
    bracket_depth: i32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            chars: source,
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            bracket_depth: 0,
        }
    }

    fn run(mut self) -> SuResult<Vec<Token>> {
        while !self.at_end() {
            self.skip_whitespace_and_comments();
            if self.at_end() {
                break;
            }
            self.next_token()?;
        }
        self.push(TokenKind::Eof, "");
        Ok(self.tokens)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        *self.source.get(self.pos + offset).unwrap_or(&0)
    }

    fn bump(&mut self) -> u8 {
        let b = self.source[self.pos];
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        b
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' => {
                    self.bump();
                }
                b'#' => {
                    while !self.at_end() && self.peek() != b'\n' {
                        self.bump();
                    }
                }
                b'/' if self.peek_at(1) == b'/' => {
                    while !self.at_end() && self.peek() != b'\n' {
                        self.bump();
                    }
                }
                b'-' if self.peek_at(1) == b'-' => {
                    while !self.at_end() && self.peek() != b'\n' {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>) {
        self.tokens.push(Token::new(kind, lexeme, 0, self.line, self.column));
    }

    fn next_token(&mut self) -> SuResult<()> {
        let start = self.pos;
        let line = self.line;
        let column = self.column;
        let b = self.bump();

        let kind = match b {
            b'\n' => TokenKind::Newline,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'@' => TokenKind::At,
            b'^' => TokenKind::Caret,
            b'~' => TokenKind::Tilde,
            b'%' => TokenKind::Percent,
            b':' => TokenKind::Colon,
            b'!' => {
                if self.peek() == b'=' {
                    self.bump();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            b'=' => {
                if self.peek() == b'=' {
                    self.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            b'+' => {
                if self.peek() == b'+' {
                    self.bump();
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            b'-' => {
                if self.peek() == b'>' {
                    self.bump();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            b'*' => {
                if self.peek() == b'*' {
                    self.bump();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            b'&' => {
                if self.peek() == b'&' {
                    self.bump();
                    TokenKind::AndAnd
                } else {
                    TokenKind::Amp
                }
            }
            b'|' => {
                if self.peek() == b'|' {
                    self.bump();
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                }
            }
            b'<' => {
                if self.peek() == b'<' {
                    self.bump();
                    TokenKind::LtLt
                } else if self.peek() == b'=' {
                    self.bump();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                if self.peek() == b'>' {
                    self.bump();
                    TokenKind::GtGt
                } else if self.peek() == b'=' {
                    self.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'?' => {
                if self.peek() == b':' {
                    self.bump();
                    TokenKind::QuestionColon
                } else {
                    TokenKind::Question
                }
            }
            b'/' => TokenKind::Slash,
            b'"' | b'\'' => {
                return self.lex_string(b, start, line, column);
            }
            b'0'..=b'9' => {
                return self.lex_number(start, line, column);
            }
            _ if is_ident_start(b) => {
                return self.lex_ident(start, line, column);
            }
            other => {
                return Err(Error::syntax(
                    format!("unexpected character {:?}", other as char),
                    Position::new(line, column, start as u32),
                ));
            }
        };

        match kind {
            TokenKind::LParen | TokenKind::LBracket => self.bracket_depth += 1,
            TokenKind::RParen | TokenKind::RBracket => self.bracket_depth = (self.bracket_depth - 1).max(0),
            TokenKind::Newline if self.bracket_depth > 0 => return Ok(()),
            _ => {}
        }

        let lexeme = self.slice(start);
        self.tokens.push(Token::new(kind, lexeme, start as u32, line, column));
        Ok(())
    }

    fn slice(&self, start: usize) -> String {
        std::str::from_utf8(&self.source[start..self.pos]).unwrap_or_default().to_owned()
    }

    fn lex_ident(&mut self, start: usize, line: u32, column: u32) -> SuResult<()> {
        while !self.at_end() && is_ident_continue(self.peek()) {
            self.bump();
        }
        let lexeme = self.slice(start);
        let kind = TokenKind::keyword_from_str(&lexeme).unwrap_or(TokenKind::Ident);
        self.tokens.push(Token::new(kind, lexeme, start as u32, line, column));
        Ok(())
    }

    fn lex_number(&mut self, start: usize, line: u32, column: u32) -> SuResult<()> {
        // look back one byte since bump() already consumed the first digit
        let first = self.source[start];
        let mut is_float = false;
        let mut is_big_hint = false;

        if first == b'0' && (self.peek() == b'x' || self.peek() == b'X') {
            self.bump();
            while !self.at_end() && (self.peek().is_ascii_hexdigit() || self.peek() == b'_') {
                self.bump();
            }
        } else if first == b'0' && (self.peek() == b'b' || self.peek() == b'B') {
            self.bump();
            while !self.at_end() && (self.peek() == b'0' || self.peek() == b'1' || self.peek() == b'_') {
                self.bump();
            }
        } else {
            while !self.at_end() && (self.peek().is_ascii_digit() || self.peek() == b'_') {
                self.bump();
            }
            if !self.at_end() && self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
                is_float = true;
                self.bump();
                while !self.at_end() && (self.peek().is_ascii_digit() || self.peek() == b'_') {
                    self.bump();
                }
            }
            if !self.at_end() && (self.peek() == b'e' || self.peek() == b'E') {
                let save = self.pos;
                self.bump();
                if self.peek() == b'+' || self.peek() == b'-' {
                    self.bump();
                }
                if self.peek().is_ascii_digit() {
                    is_float = true;
                    while !self.at_end() && self.peek().is_ascii_digit() {
                        self.bump();
                    }
                } else {
                    self.pos = save;
                }
            }
            if !is_float {
                let lexeme = self.slice(start);
                let digits = lexeme.replace('_', "");
                if digits.parse::<i64>().is_err() {
                    is_big_hint = true;
                }
            }
        }

        let lexeme = self.slice(start);
        let kind = if is_float {
            TokenKind::FloatLiteral
        } else if is_big_hint {
            TokenKind::BigIntLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.tokens.push(Token::new(kind, lexeme, start as u32, line, column));
        Ok(())
    }

    fn lex_string(&mut self, quote: u8, start: usize, line: u32, column: u32) -> SuResult<()> {
        let mut value = String::new();
        loop {
            if self.at_end() {
                return Err(Error::syntax("unterminated string literal", Position::new(line, column, start as u32)));
            }
            let b = self.peek();
            if b == quote {
                self.bump();
                break;
            }
            if b == b'\\' {
                self.bump();
                let esc = self.bump();
                match esc {
                    b'n' => value.push('\n'),
                    b't' => value.push('\t'),
                    b'r' => value.push('\r'),
                    b'\\' => value.push('\\'),
                    b'"' => value.push('"'),
                    b'\'' => value.push('\''),
                    b'x' => {
                        let hi = self.bump();
                        let lo = self.bump();
                        let byte = (hex_digit(hi) << 4) | hex_digit(lo);
                        value.push(byte as char);
                    }
                    other => {
                        return Err(Error::syntax(
                            format!("unknown escape sequence '\\{}'", other as char),
                            Position::new(self.line, self.column, self.pos as u32),
                        ));
                    }
                }
                continue;
            }
            // consume one UTF-8 scalar value, not just one byte
            let char_start = self.pos;
            self.bump();
            while !self.at_end() && (self.peek() & 0b1100_0000) == 0b1000_0000 {
                self.bump();
            }
            value.push_str(std::str::from_utf8(&self.source[char_start..self.pos]).unwrap_or(""));
        }
        self.tokens.push(Token::new(TokenKind::StringLiteral, value, start as u32, line, column));
        Ok(())
    }
}

fn hex_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_basic_punctuation_and_identifiers() {
        assert_eq!(
            kinds("x = 1 + 2"),
            vec![TokenKind::Ident, TokenKind::Eq, TokenKind::IntLiteral, TokenKind::Plus, TokenKind::IntLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_hex_and_binary_numbers() {
        let tokens = lex("0xFF 0b1010").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[0].lexeme, "0xFF");
        assert_eq!(tokens[1].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[1].lexeme, "0b1010");
    }

    #[test]
    fn big_integer_literal_is_tagged_distinctly() {
        let tokens = lex("99999999999999999999999999999").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::BigIntLiteral);
    }

    #[test]
    fn float_literal_with_exponent() {
        let tokens = lex("1.5e10").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
    }

    #[test]
    fn double_angle_tokens_are_context_free_at_lex_time() {
        // The lexer never decides bitstring-vs-shift; it always emits LtLt/GtGt.
        assert_eq!(kinds("<<1, 2>>"), vec![
            TokenKind::LtLt,
            TokenKind::IntLiteral,
            TokenKind::Comma,
            TokenKind::IntLiteral,
            TokenKind::GtGt,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn string_escapes_are_decoded() {
        let tokens = lex(r#""a\nb\"c""#).unwrap();
        assert_eq!(tokens[0].lexeme, "a\nb\"c");
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("x # comment\ny // also\nz -- also\n"), vec![
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn reserved_language_names_lex_as_plain_identifiers() {
        assert_eq!(kinds("lua.f(x)"), vec![
            TokenKind::Ident,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Ident,
            TokenKind::RParen,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn newlines_inside_parens_and_brackets_are_not_tokenized() {
        assert_eq!(kinds("f(\n  1,\n  2\n)"), vec![
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::IntLiteral,
            TokenKind::Comma,
            TokenKind::IntLiteral,
            TokenKind::RParen,
            TokenKind::Eof,
        ]);
        assert_eq!(kinds("[\n  1,\n  2\n]"), vec![
            TokenKind::LBracket,
            TokenKind::IntLiteral,
            TokenKind::Comma,
            TokenKind::IntLiteral,
            TokenKind::RBracket,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn newlines_inside_a_block_body_remain_statement_terminators() {
        assert_eq!(kinds("if x {\n  y\n}"), vec![
            TokenKind::If,
            TokenKind::Ident,
            TokenKind::LBrace,
            TokenKind::Newline,
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]);
    }
}
