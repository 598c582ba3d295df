//! Error types for the path query engine.
//!
//! Three concerns, three enums: [`LexError`] for illegal input characters,
//! [`ParseError`] for grammar violations, [`EvalError`] for evaluation-time
//! failures (budget exhaustion, malformed nested sub-paths discovered at
//! first use). Lex and parse errors are never recovered into a partial
//! expression; evaluation errors abort the whole query with no partial
//! result set.

use thiserror::Error;

/// An error produced while tokenizing a path string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string literal starting at offset {position}")]
    UnterminatedLiteral { position: usize },

    #[error("unexpected character '{found}' at offset {position}")]
    IllegalCharacter { found: char, position: usize },
}

impl LexError {
    /// Byte offset in the path string where the error occurred.
    pub fn position(&self) -> usize {
        match self {
            LexError::UnterminatedLiteral { position }
            | LexError::IllegalCharacter { position, .. } => *position,
        }
    }
}

/// An error produced while parsing a token stream into a path expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("at offset {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("empty path expression")]
    Empty,

    #[error("unknown axis '{name}' at offset {position}")]
    UnknownAxis { position: usize, name: String },

    #[error("unknown function '{name}' at offset {position}")]
    UnknownFunction { position: usize, name: String },
}

/// An error produced while evaluating a parsed path expression.
///
/// `RecursionLimit` and `VisitBudget` mean the query was too expensive for
/// the configured [`crate::path::eval::EvalOptions`]; the caller may retry
/// with a narrower path or a larger budget. `NestedPath` means the path
/// string itself is wrong and must be fixed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("nested-path recursion depth limit ({limit}) exceeded")]
    RecursionLimit { limit: usize },

    #[error("node visit budget ({limit}) exceeded")]
    VisitBudget { limit: usize },

    #[error("malformed nested path predicate '{path}': {source}")]
    NestedPath {
        path: String,
        #[source]
        source: Box<ParseError>,
    },
}

/// Umbrella error for the parse-then-evaluate convenience entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_position() {
        let err = LexError::IllegalCharacter {
            found: '%',
            position: 7,
        };
        assert_eq!(err.position(), 7);
        assert_eq!(err.to_string(), "unexpected character '%' at offset 7");
    }

    #[test]
    fn parse_error_wraps_lex_error() {
        let err: ParseError = LexError::UnterminatedLiteral { position: 3 }.into();
        assert!(matches!(err, ParseError::Lex(_)));
        assert_eq!(
            err.to_string(),
            "unterminated string literal starting at offset 3"
        );
    }

    #[test]
    fn eval_error_distinguishes_budget_from_bad_path() {
        let budget = EvalError::VisitBudget { limit: 10 };
        let bad = EvalError::NestedPath {
            path: ".//".into(),
            source: Box::new(ParseError::Empty),
        };
        assert_ne!(budget, bad);
    }
}
