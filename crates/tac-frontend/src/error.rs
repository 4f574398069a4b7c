//! Front-end diagnostics. The parser and checker collect every error they
//! find rather than stopping at the first one, matching the core's
//! "validate everything, report it all" style.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrontendError {
    #[error("line {line}: syntax error at '{lexeme}'")]
    Syntax { line: u32, lexeme: String },

    #[error("line {line}: '{name}' undeclared")]
    Undeclared { line: u32, name: String },

    #[error("line {line}: redeclaration of '{name}'")]
    Redeclared { line: u32, name: String },

    #[error("line {line}: '{name}' is not an array")]
    NotAnArray { line: u32, name: String },

    #[error("line {line}: '{name}' is not a function")]
    NotAFunction { line: u32, name: String },

    #[error("line {line}: '{name}' called with {got} argument(s), expected {expected}")]
    ArityMismatch {
        line: u32,
        name: String,
        expected: usize,
        got: usize,
    },
}

impl FrontendError {
    pub fn line(&self) -> u32 {
        match self {
            FrontendError::Syntax { line, .. }
            | FrontendError::Undeclared { line, .. }
            | FrontendError::Redeclared { line, .. }
            | FrontendError::NotAnArray { line, .. }
            | FrontendError::NotAFunction { line, .. }
            | FrontendError::ArityMismatch { line, .. } => *line,
        }
    }
}
