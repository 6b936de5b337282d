use std::fmt;
use std::ops::Range;

use aurora_syn::{Token, TokenKind};
use smol_str::SmolStr;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq)]
pub enum CompileErrorKind {
    Unexpected(TokenKind),
    Expected { expected: TokenKind, got: TokenKind },
    /// An indexed assignment without an assignment operator
    ExpectedAssignment(TokenKind),
    /// A character sequence the lexer does not recognize
    InvalidToken(SmolStr),
    BreakOutsideLoop,
    ContinueOutsideLoop,
    ReturnOutsideFunction,
}

/// A syntax error. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub line: u32,
    /// Byte range of the offending token
    pub span: Range<usize>,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, at: &Token) -> CompileError {
        CompileError {
            kind,
            line: at.line,
            span: at.span.clone(),
        }
    }

    /// The error for finding `at` where nothing of its kind may appear.
    pub fn unexpected(at: &Token) -> CompileError {
        let kind = match at.kind {
            TokenKind::Error => CompileErrorKind::InvalidToken(at.lexeme.clone()),
            kind => CompileErrorKind::Unexpected(kind),
        };
        Self::new(kind, at)
    }

    pub fn expected(expected: TokenKind, at: &Token) -> CompileError {
        let kind = match at.kind {
            TokenKind::Error => CompileErrorKind::InvalidToken(at.lexeme.clone()),
            got => CompileErrorKind::Expected { expected, got },
        };
        Self::new(kind, at)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CompileErrorKind::*;
        let line = self.line;
        match &self.kind {
            Unexpected(got) => write!(f, "Unexpected token {} at line {}.", got, line),
            Expected { expected, got } => write!(
                f,
                "Unexpected token {} at line {}, expected {}.",
                got, line, expected
            ),
            ExpectedAssignment(got) => write!(
                f,
                "Unexpected token {} at line {}, expected assignment operator.",
                got, line
            ),
            InvalidToken(lexeme) => write!(f, "Invalid token {:?} at line {}.", lexeme, line),
            BreakOutsideLoop => write!(f, "'break' outside of a loop at line {}.", line),
            ContinueOutsideLoop => write!(f, "'continue' outside of a loop at line {}.", line),
            ReturnOutsideFunction => {
                write!(f, "'return' outside of a function at line {}.", line)
            }
        }
    }
}

impl std::error::Error for CompileError {}
