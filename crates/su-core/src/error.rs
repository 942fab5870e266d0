//! The error model: a closed set of error kinds plus position and context.
//!
//! A hand-rolled exception type (no `thiserror`): a `strum`-derived enum
//! for the kind, and a manual `Display` for the human-facing rendering
//! described in spec §6.4.

use std::{collections::BTreeMap, fmt};

/// Result type alias used throughout the crate.
pub type SuResult<T> = Result<T, Error>;

/// The closed set of error kinds from spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorKind {
    Syntax,
    Semantic,
    Unbound,
    AdapterUnavailable,
    ForeignRuntime,
    BitstringOverflow,
    InvalidSize,
    AmbiguousTail,
    Truncated,
    LiteralMismatch,
    RebindingMismatch,
    Timeout,
    System,
}

/// A source position: line and column are 1-based, offset is a 0-based byte index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self { line, column, offset }
    }
}

/// The classification table from spec §7 "Classification": a foreign error
/// message is pattern-matched into one of these stable categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ForeignErrorCategory {
    NameError,
    TypeError,
    IndexError,
    KeyError,
    AttributeError,
    ImportError,
    SyntaxError,
    ValueError,
    ZeroDivisionError,
    FileNotFoundError,
    PermissionError,
    MemoryError,
    OverflowError,
    RuntimeError,
    OsError,
    /// No entry in the table matched; the original message is preserved as-is.
    Unclassified,
}

impl ForeignErrorCategory {
    /// Classifies a raw foreign-runtime error message against the fixed table
    /// in spec §7. Matching is a simple substring scan against the category's
    /// own name plus a short list of known synonyms, which is how CPython-style
    /// tracebacks name their own exception classes.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        const TABLE: &[(ForeignErrorCategory, &[&str])] = &[
            (ForeignErrorCategory::ZeroDivisionError, &["ZeroDivisionError", "division by zero"]),
            (ForeignErrorCategory::FileNotFoundError, &["FileNotFoundError", "No such file or directory"]),
            (ForeignErrorCategory::PermissionError, &["PermissionError", "Permission denied"]),
            (ForeignErrorCategory::NameError, &["NameError"]),
            (ForeignErrorCategory::TypeError, &["TypeError"]),
            (ForeignErrorCategory::IndexError, &["IndexError"]),
            (ForeignErrorCategory::KeyError, &["KeyError"]),
            (ForeignErrorCategory::AttributeError, &["AttributeError"]),
            (ForeignErrorCategory::ImportError, &["ImportError", "ModuleNotFoundError"]),
            (ForeignErrorCategory::SyntaxError, &["SyntaxError"]),
            (ForeignErrorCategory::ValueError, &["ValueError"]),
            (ForeignErrorCategory::MemoryError, &["MemoryError", "out of memory"]),
            (ForeignErrorCategory::OverflowError, &["OverflowError"]),
            (ForeignErrorCategory::OsError, &["OSError"]),
            (ForeignErrorCategory::RuntimeError, &["RuntimeError"]),
        ];
        for (category, needles) in TABLE {
            if needles.iter().any(|needle| message.contains(needle)) {
                return *category;
            }
        }
        ForeignErrorCategory::Unclassified
    }

    /// A short human suggestion attached alongside the category, per spec §7.
    #[must_use]
    pub fn suggestion(self) -> &'static str {
        match self {
            Self::NameError => "check the variable or function is defined before use",
            Self::TypeError => "check the argument types match what the callee expects",
            Self::IndexError => "check the index is within bounds",
            Self::KeyError => "check the key exists before lookup",
            Self::AttributeError => "check the attribute or method name",
            Self::ImportError => "check the module is available to the adapter",
            Self::SyntaxError => "check the embedded foreign-language source",
            Self::ValueError => "check the value is in the expected range or format",
            Self::ZeroDivisionError => "check the divisor is non-zero",
            Self::FileNotFoundError => "check the path exists",
            Self::PermissionError => "check file or resource permissions",
            Self::MemoryError => "the adapter ran out of memory",
            Self::OverflowError => "check the value fits the target numeric range",
            Self::RuntimeError => "an unspecified runtime error occurred",
            Self::OsError => "an operating-system-level error occurred",
            Self::Unclassified => "no further detail is available",
        }
    }
}

/// An error produced anywhere in the core. Carries kind, message, source
/// position when known, and a small context bag for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<Position>,
    pub context: BTreeMap<String, String>,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            context: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Syntax, message).at(position)
    }

    #[must_use]
    pub fn unbound(name: &str) -> Self {
        Self::new(ErrorKind::Unbound, format!("name '{name}' is not bound"))
    }

    /// Builds a `ForeignRuntime` error from a raw adapter message, attaching
    /// the classification category and suggestion as context (spec §7).
    #[must_use]
    pub fn foreign_runtime(language: &str, raw_message: impl Into<String>) -> Self {
        let raw_message = raw_message.into();
        let category = ForeignErrorCategory::classify(&raw_message);
        Self::new(ErrorKind::ForeignRuntime, raw_message)
            .with_context("language", language)
            .with_context("category", category.to_string())
            .with_context("suggestion", category.suggestion())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "Error at line {}, col {}: {}", pos.line, pos.column, self.message),
            None => write!(f, "Error: {}", self.message),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position_when_known() {
        let err = Error::syntax("unexpected token", Position::new(3, 7, 42));
        assert_eq!(err.to_string(), "Error at line 3, col 7: unexpected token");
    }

    #[test]
    fn display_omits_position_when_unknown() {
        let err = Error::new(ErrorKind::System, "disk on fire");
        assert_eq!(err.to_string(), "Error: disk on fire");
    }

    #[test]
    fn classification_matches_known_categories() {
        assert_eq!(ForeignErrorCategory::classify("ZeroDivisionError: division by zero"), ForeignErrorCategory::ZeroDivisionError);
        assert_eq!(ForeignErrorCategory::classify("KeyError: 'missing'"), ForeignErrorCategory::KeyError);
        assert_eq!(ForeignErrorCategory::classify("something bespoke"), ForeignErrorCategory::Unclassified);
    }

    #[test]
    fn foreign_runtime_error_carries_category_context() {
        let err = Error::foreign_runtime("py", "NameError: name 'x' is not defined");
        assert_eq!(err.kind, ErrorKind::ForeignRuntime);
        assert_eq!(err.context.get("category").map(String::as_str), Some("NameError"));
        assert_eq!(err.context.get("language").map(String::as_str), Some("py"));
    }
}
