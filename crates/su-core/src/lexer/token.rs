//! Token kinds and the `Token` type produced by the lexer (spec §3.1).

use std::fmt;

/// The category of a token. Carries no payload — the source text of a token
/// lives in [`Token::lexeme`], and literal values are parsed from it lazily
/// by whichever AST-building code needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum TokenKind {
    /// Identifier, including reserved language names (`lua`, `py`, ...) — those
    /// are ordinary identifiers lexically; only the parser treats them specially.
    Ident,
    IntLiteral,
    BigIntLiteral,
    FloatLiteral,
    StringLiteral,
    True,
    False,
    Nil,

    If,
    Elif,
    Else,
    While,
    For,
    In,
    Match,
    Break,
    Continue,
    Import,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// `<<` — either a bitstring literal opener or the left-shift operator;
    /// disambiguated positionally by the parser (spec §4.E).
    LtLt,
    /// `>>` — either a bitstring literal closer or the right-shift operator.
    GtGt,

    Comma,
    Colon,
    Semicolon,
    Arrow,
    Dot,
    At,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Plus,
    Minus,
    Star,
    StarStar,
    PlusPlus,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Question,
    QuestionColon,
    Eq,
    Newline,
    Eof,
}

impl TokenKind {
    /// Keywords recognized verbatim by lexeme text.
    #[must_use]
    pub fn keyword_from_str(text: &str) -> Option<Self> {
        Some(match text {
            "true" => Self::True,
            "false" => Self::False,
            "nil" => Self::Nil,
            "if" => Self::If,
            "elif" => Self::Elif,
            "else" => Self::Else,
            "while" => Self::While,
            "for" => Self::For,
            "in" => Self::In,
            "match" => Self::Match,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "import" => Self::Import,
            _ => return None,
        })
    }
}

/// A single lexed token: kind, source text, and position metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, offset: u32, line: u32, column: u32) -> Self {
        Self { kind, lexeme: lexeme.into(), offset, line, column }
    }

    #[must_use]
    pub fn position(&self) -> crate::error::Position {
        crate::error::Position::new(self.line, self.column, self.offset)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind, self.lexeme)
    }
}
