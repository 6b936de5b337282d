use std::fmt;

use aurora_bytecode::{ValueError, ValueKind};
use smol_str::SmolStr;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// An error that stops the evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// An operator, accessor or native function rejected its operands
    Value(ValueError),
    UndefinedVariable(SmolStr),
    NotCallable(ValueKind),
    FunctionArity {
        name: Option<SmolStr>,
        expected: usize,
        got: usize,
    },
    /// The configured maximum call depth was exceeded
    CallDepth(usize),
    StackUnderflow,
    /// A `return`, `break` or `continue` reached a boundary that can't take it
    StrayControl(&'static str),
    InvalidConstant(i32),
}

impl From<ValueError> for RuntimeError {
    fn from(e: ValueError) -> Self {
        RuntimeError::Value(e)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Value(e) => write!(f, "{}", e),
            RuntimeError::UndefinedVariable(name) => write!(f, "Undefined variable {}.", name),
            RuntimeError::NotCallable(kind) => write!(f, "Can only call functions, got {}.", kind),
            RuntimeError::FunctionArity {
                name,
                expected,
                got,
            } => write!(
                f,
                "Function {} expected {} arguments, got {}.",
                name.as_deref().unwrap_or("<anonymous>"),
                expected,
                got
            ),
            RuntimeError::CallDepth(limit) => {
                write!(f, "Maximum call depth of {} exceeded.", limit)
            }
            RuntimeError::StackUnderflow => f.write_str("Popping empty stack."),
            RuntimeError::StrayControl(signal) => write!(f, "Stray {} signal.", signal),
            RuntimeError::InvalidConstant(idx) => write!(f, "Invalid constant index {}.", idx),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Value(e) => Some(e),
            _ => None,
        }
    }
}
