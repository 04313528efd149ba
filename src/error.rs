// Author: Dustin Pilgrim
// License: MIT

use thiserror::Error;

use crate::ast::Pos;
use crate::diagnostics::Diagnostic;

fn hint_suffix(hint: &Option<String>, code: &Option<u32>) -> String {
    format!(
        "{}{}",
        hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h)),
        code.map_or(String::new(), |c| format!(" Code: {}", c))
    )
}

/// Fail-fast errors raised while lexing, parsing and loading configuration files.
///
/// Everything after loading reports problems through [`crate::Diagnostics`] instead,
/// so sibling errors can accumulate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Syntax Error at {file}:{line}:{column}: {message}{}", hint_suffix(.hint, .code))]
    SyntaxError {
        message: String,
        file: String,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    #[error("Invalid Token '{token}' at {file}:{line}:{column}{}", hint_suffix(.hint, .code))]
    InvalidToken {
        token: String,
        file: String,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    #[error("Unexpected EOF at {file}:{line}:{column}: {message}{}", hint_suffix(.hint, .code))]
    UnexpectedEof {
        message: String,
        file: String,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Raised when a string literal is not closed.
    #[error("Unclosed string starting with '{quote}' at {file}:{line}:{column}{}", hint_suffix(.hint, .code))]
    UnclosedString {
        quote: char,
        file: String,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Raised for unexpected characters.
    #[error("Unexpected character '{character}' at {file}:{line}:{column}{}", hint_suffix(.hint, .code))]
    UnexpectedCharacter {
        character: char,
        file: String,
        line: usize,
        column: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    #[error("File Error '{path}': {message}{}", hint_suffix(.hint, .code))]
    FileError {
        message: String,
        path: String,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Raised when the variable override file exists but cannot be used.
    #[error("Override Error '{path}': {message}{}", hint_suffix(.hint, .code))]
    OverrideError {
        message: String,
        path: String,
        hint: Option<String>,
        code: Option<u32>,
    },
}

impl ConfigError {
    pub fn code(&self) -> Option<u32> {
        match self {
            ConfigError::SyntaxError { code, .. }
            | ConfigError::InvalidToken { code, .. }
            | ConfigError::UnexpectedEof { code, .. }
            | ConfigError::UnclosedString { code, .. }
            | ConfigError::UnexpectedCharacter { code, .. }
            | ConfigError::FileError { code, .. }
            | ConfigError::OverrideError { code, .. } => *code,
        }
    }

    /// Source position of the error, when it came from a file being parsed.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            ConfigError::SyntaxError { file, line, column, .. }
            | ConfigError::InvalidToken { file, line, column, .. }
            | ConfigError::UnexpectedEof { file, line, column, .. }
            | ConfigError::UnclosedString { file, line, column, .. }
            | ConfigError::UnexpectedCharacter { file, line, column, .. } => {
                Some(Pos::new(file.clone(), *line, *column))
            }
            ConfigError::FileError { .. } | ConfigError::OverrideError { .. } => None,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            ConfigError::SyntaxError { .. }
            | ConfigError::InvalidToken { .. }
            | ConfigError::UnexpectedEof { .. }
            | ConfigError::UnclosedString { .. }
            | ConfigError::UnexpectedCharacter { .. } => "Invalid configuration syntax",
            ConfigError::FileError { .. } => "Could not load configuration",
            ConfigError::OverrideError { .. } => "Could not load variable overrides",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.summary(), self.to_string(), self.pos().as_ref())
    }
}
