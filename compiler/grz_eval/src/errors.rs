//! Runtime error types for the VM.
//!
//! `EvalErrorKind` carries the structured category; the factory functions
//! below are the construction API used throughout the interpreter and the
//! std library. Errors are rendered exactly once, at the [`crate::Vm`]
//! boundary, into the `RUNTIME ERROR: ...` text with one line per frame.

use grz_ir::{BinaryOp, Span, UnaryOp};
use std::fmt;

/// Result of evaluating anything inside the VM.
pub(crate) type EvalResult<T> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EvalErrorKind {
    /// Lex/parse failure, already rendered with its position.
    Static(String),

    UndefinedVariable {
        name: String,
    },
    NoSuchField {
        name: String,
    },
    NoSelf,
    NoSuper,
    TypeMismatch {
        context: String,
        expected: &'static str,
        got: &'static str,
    },
    BinaryTypes {
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    },
    UnaryType {
        op: UnaryOp,
        got: &'static str,
    },
    IndexOutOfBounds {
        index: i64,
        len: usize,
    },
    NotInteger {
        value: f64,
    },
    NotCallable {
        got: &'static str,
    },
    TooManyArgs {
        expected: usize,
        got: usize,
    },
    MissingArgument {
        name: String,
    },
    DuplicateArgument {
        name: String,
    },
    UnknownParameter {
        name: String,
    },
    DuplicateField {
        name: String,
    },
    InfiniteRecursion,
    StackOverflow,
    DivisionByZero,
    NotFinite,
    User {
        message: String,
    },
    AssertionFailed {
        message: String,
    },
    Import {
        message: String,
    },
    Native {
        message: String,
    },
    Manifest {
        message: String,
    },
    Custom(String),
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::Static(rendered) => f.write_str(rendered),
            EvalErrorKind::UndefinedVariable { name } => write!(f, "unknown variable: {name}"),
            EvalErrorKind::NoSuchField { name } => write!(f, "field does not exist: {name}"),
            EvalErrorKind::NoSelf => f.write_str("can't use self outside of an object"),
            EvalErrorKind::NoSuper => {
                f.write_str("attempt to use super when there is no super class")
            }
            EvalErrorKind::TypeMismatch {
                context,
                expected,
                got,
            } => write!(f, "{context}: expected {expected}, got {got}"),
            EvalErrorKind::BinaryTypes { op, left, right } => write!(
                f,
                "binary operator {op} does not operate on types {left} and {right}"
            ),
            EvalErrorKind::UnaryType { op, got } => {
                write!(f, "unary operator {op} does not operate on type {got}")
            }
            EvalErrorKind::IndexOutOfBounds { index, len } => {
                write!(f, "index out of bounds: {index} not within [0, {len})")
            }
            EvalErrorKind::NotInteger { value } => {
                write!(f, "index must be an integer, got {value}")
            }
            EvalErrorKind::NotCallable { got } => {
                write!(f, "only functions can be called, got {got}")
            }
            EvalErrorKind::TooManyArgs { expected, got } => write!(
                f,
                "function expected {expected} positional argument(s), but got {got}"
            ),
            EvalErrorKind::MissingArgument { name } => write!(f, "missing argument: {name}"),
            EvalErrorKind::DuplicateArgument { name } => {
                write!(f, "argument {name} already provided")
            }
            EvalErrorKind::UnknownParameter { name } => {
                write!(f, "function has no parameter {name}")
            }
            EvalErrorKind::DuplicateField { name } => {
                write!(f, "duplicate field name: \"{name}\"")
            }
            EvalErrorKind::InfiniteRecursion => f.write_str("infinite recursion detected"),
            EvalErrorKind::StackOverflow => f.write_str("max stack frames exceeded."),
            EvalErrorKind::DivisionByZero => f.write_str("division by zero."),
            EvalErrorKind::NotFinite => f.write_str("numeric result is not finite"),
            EvalErrorKind::User { message }
            | EvalErrorKind::Import { message }
            | EvalErrorKind::Native { message }
            | EvalErrorKind::Manifest { message }
            | EvalErrorKind::Custom(message) => f.write_str(message),
            EvalErrorKind::AssertionFailed { message } if message.is_empty() => {
                f.write_str("Assertion failed.")
            }
            EvalErrorKind::AssertionFailed { message } => {
                write!(f, "Assertion failed. {message}")
            }
        }
    }
}

/// An error raised during evaluation, with the frames it unwound through.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EvalError {
    pub kind: EvalErrorKind,
    /// Innermost location first.
    pub trace: Vec<Span>,
}

impl EvalError {
    #[cold]
    pub fn from_kind(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            trace: Vec::new(),
        }
    }

    #[cold]
    pub fn new(message: impl Into<String>) -> Self {
        EvalError::from_kind(EvalErrorKind::Custom(message.into()))
    }

    /// Record a frame the error is unwinding through.
    #[must_use]
    pub fn with_frame(mut self, span: Span) -> Self {
        if !span.is_synthetic() && self.trace.last() != Some(&span) {
            self.trace.push(span);
        }
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

#[cold]
pub(crate) fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub(crate) fn no_such_field(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoSuchField {
        name: name.to_string(),
    })
}

#[cold]
pub(crate) fn type_mismatch(context: &str, expected: &'static str, got: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        context: context.to_string(),
        expected,
        got,
    })
}

#[cold]
pub(crate) fn binary_types(op: BinaryOp, left: &'static str, right: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BinaryTypes { op, left, right })
}

#[cold]
pub(crate) fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, len })
}

#[cold]
pub(crate) fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub(crate) fn user_error(message: String) -> EvalError {
    EvalError::from_kind(EvalErrorKind::User { message })
}

#[cold]
pub(crate) fn manifest_error(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Manifest {
        message: message.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grz_ir::FileId;

    #[test]
    fn test_messages() {
        assert_eq!(
            no_such_field("x").to_string(),
            "field does not exist: x"
        );
        assert_eq!(
            binary_types(BinaryOp::Sub, "string", "number").to_string(),
            "binary operator - does not operate on types string and number"
        );
        assert_eq!(
            index_out_of_bounds(3, 2).to_string(),
            "index out of bounds: 3 not within [0, 2)"
        );
    }

    #[test]
    fn test_with_frame_skips_synthetic_and_repeats() {
        let span = Span::new(FileId(0), 1, 2);
        let err = EvalError::new("boom")
            .with_frame(Span::DUMMY)
            .with_frame(span)
            .with_frame(span);
        assert_eq!(err.trace, vec![span]);
    }
}
