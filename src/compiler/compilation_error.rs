use std::{error, fmt};

use serde::{Deserialize, Serialize};

/// What went wrong while turning a formula into a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A character the tokenizer has no rule for.
    UnknownCharacter(char),
    /// Digits and dots that do not form a valid number.
    MalformedNumber(String),
    UnmatchedParen,
    /// The left side of `=` is not a bare variable name.
    InvalidAssignment,
    /// Nothing to compile where an expression was expected.
    EmptyExpression,
    /// Several tokens with no operator between them.
    MissingOperator,
    UnknownFunction(String),
    UnexpectedToken(String),
    /// Groups, calls or assignments nested past the compiler's limit.
    TooDeep,
}

/// Represents an error that occurred during the compilation process.
///
/// `from` and `to` delimit the faulty region: a character range of the
/// source for tokenizer errors, a token range for code generation errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationError {
    pub kind: ErrorKind,
    pub from: usize,
    pub to: usize,
}

impl CompilationError {
    pub fn new(kind: ErrorKind, from: usize, to: usize) -> Self {
        Self { kind, from, to }
    }

    /// True for errors raised by the tokenizer.
    pub fn is_lexical(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UnknownCharacter(_) | ErrorKind::MalformedNumber(_)
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnknownCharacter(c) => write!(f, "can't interpret '{}'", c),
            ErrorKind::MalformedNumber(text) => write!(f, "malformed number '{}'", text),
            ErrorKind::UnmatchedParen => write!(f, "unmatched parenthesis"),
            ErrorKind::InvalidAssignment => {
                write!(f, "left side of '=' must be a variable name")
            }
            ErrorKind::EmptyExpression => write!(f, "empty expression"),
            ErrorKind::MissingOperator => write!(f, "missing operator between operands"),
            ErrorKind::UnknownFunction(name) => write!(f, "unknown function '{}'", name),
            ErrorKind::UnexpectedToken(token) => write!(f, "unexpected '{}'", token),
            ErrorKind::TooDeep => write!(f, "expression nested too deeply"),
        }
    }
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl error::Error for CompilationError {}
