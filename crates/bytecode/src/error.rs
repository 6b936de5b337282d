use std::fmt;

use crate::value::ValueKind;

pub type Result<T> = std::result::Result<T, ValueError>;

/// Expected number of arguments of a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgCount {
    Exact(usize),
    Between(usize, usize),
}

impl ArgCount {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            ArgCount::Exact(e) => n == e,
            ArgCount::Between(min, max) => (min..=max).contains(&n),
        }
    }
}

impl fmt::Display for ArgCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgCount::Exact(1) => write!(f, "1 argument"),
            ArgCount::Exact(n) => write!(f, "{} arguments", n),
            ArgCount::Between(min, max) => write!(f, "{} to {} arguments", min, max),
        }
    }
}

/// Errors raised by operations on values. Native functions report their
/// failures with this type too.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// A guarded accessor found another variant
    TypeMismatch { expected: ValueKind, got: ValueKind },
    /// A binary operator does not accept this combination of operands
    InvalidOperands {
        op: &'static str,
        lhs: ValueKind,
        rhs: ValueKind,
    },
    /// A unary operator does not accept this operand
    InvalidOperand { op: &'static str, operand: ValueKind },
    IndexOutOfRange { index: f64, len: usize },
    /// Wrong number of arguments passed to a native function
    Arity { expected: ArgCount, got: usize },
    /// Any other failure inside a native function
    Native(String),
}

impl ValueError {
    pub fn native(message: impl Into<String>) -> Self {
        ValueError::Native(message.into())
    }

    /// Checks the argument count of a native function call.
    pub fn check_arity(expected: ArgCount, args: &[crate::Value]) -> Result<()> {
        if expected.accepts(args.len()) {
            Ok(())
        } else {
            Err(ValueError::Arity {
                expected,
                got: args.len(),
            })
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::TypeMismatch { expected, got } => {
                write!(f, "Expected {}, got {}.", expected, got)
            }
            ValueError::InvalidOperands { op, lhs, rhs } => {
                write!(f, "Invalid operands for {}: {} and {}.", op, lhs, rhs)
            }
            ValueError::InvalidOperand { op, operand } => {
                write!(f, "Invalid operand for {}: {}.", op, operand)
            }
            ValueError::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for length {}.", index, len)
            }
            ValueError::Arity { expected, got } => {
                write!(f, "Expected {}, got {}.", expected, got)
            }
            ValueError::Native(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ValueError {}
