use std::fmt;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;
use crate::symbol::Mnemonic;

/// Everything that can go wrong while loading or running a program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax(SyntaxError),
    UnknownInstruction(String),
    ArityMismatch {
        mnemonic: Mnemonic,
        expected: usize,
        found: usize,
    },
    DuplicateLabel(String),
    InvalidOperand {
        operand: String,
        reason: OperandError,
    },
    DivideByZero,
    DivideOverflow,
    StackUnderflow,
    StackOverflow,
    UnresolvedLabel(String),
    /// Not fatal unless the run is strict.
    UninitializedMemoryRead(u32),
    /// Not fatal.
    ImmediateOverflow(i64),
}

/// Malformed line or token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    TooManyOperands,
    UnexpectedChar(char),
    UnexpectedComma,
    DetachedColon,
    InvalidLabel,
    BothOperandsMemory,
}

/// Why an operand was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandError {
    Unrecognized,
    Ambiguous,
    BadAddress,
    WidthMismatch,
    NotWritable,
    TooWide,
}

impl ErrorKind {
    pub fn invalid(operand: &str, reason: OperandError) -> Self {
        ErrorKind::InvalidOperand {
            operand: operand.to_owned(),
            reason,
        }
    }

    /// Whether the driver must stop when this is raised.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ErrorKind::UninitializedMemoryRead(_) | ErrorKind::ImmediateOverflow(_)
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "parse::syntax",
            Self::UnknownInstruction(_) => "parse::unknown_instruction",
            Self::ArityMismatch { .. } => "parse::arity",
            Self::DuplicateLabel(_) => "parse::duplicate_label",
            Self::InvalidOperand { .. } => "run::invalid_operand",
            Self::DivideByZero => "run::divide_by_zero",
            Self::DivideOverflow => "run::divide_overflow",
            Self::StackUnderflow => "run::stack_underflow",
            Self::StackOverflow => "run::stack_overflow",
            Self::UnresolvedLabel(_) => "run::unresolved_label",
            Self::UninitializedMemoryRead(_) => "run::uninitialized_memory",
            Self::ImmediateOverflow(_) => "run::immediate_overflow",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Self::Syntax(SyntaxError::TooManyOperands) => {
                "no supported instruction takes more than two operands"
            }
            Self::Syntax(SyntaxError::DetachedColon | SyntaxError::InvalidLabel) => {
                "labels are written as `name:` with no space before the colon"
            }
            Self::Syntax(SyntaxError::BothOperandsMemory) => {
                "at most one operand of XCHG may be a memory address"
            }
            Self::Syntax(_) => "lines look like `[label:] MNEMONIC [op1[, op2]] [; comment]`",
            Self::UnknownInstruction(_) => "check the list of supported instructions",
            Self::ArityMismatch { .. } => "check the number of operands for this instruction",
            Self::DuplicateLabel(_) => "labels may only be declared once per file",
            Self::InvalidOperand { reason, .. } => match reason {
                OperandError::WidthMismatch => "both registers must be of the same size",
                OperandError::NotWritable => "the destination must be a register or memory address",
                OperandError::TooWide => "the value does not fit the destination",
                OperandError::BadAddress => "memory addresses look like `[1234]`",
                _ => "operands are registers, `[offset]` addresses, or literals like `12` or `0FFH`",
            },
            Self::DivideByZero => "make sure the divisor is not zero",
            Self::DivideOverflow => "the quotient must fit in the destination register",
            Self::StackUnderflow => "every POP needs a matching PUSH",
            Self::StackOverflow => "too many values were pushed without being popped",
            Self::UnresolvedLabel(_) => "declare the label as `name:` somewhere in the file",
            Self::UninitializedMemoryRead(_) => "write to this address before reading it",
            Self::ImmediateOverflow(_) => "literals range from -32,768 to 32,767",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "malformed",
            Self::UnknownInstruction(_) => "unknown instruction",
            Self::ArityMismatch { .. } => "wrong number of operands",
            Self::DuplicateLabel(_) => "duplicate label",
            Self::InvalidOperand { .. } => "invalid operand",
            Self::UnresolvedLabel(_) => "unresolved label",
            _ => "while executing this instruction",
        }
    }
}

impl std::error::Error for ErrorKind {}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(error) => write!(f, "Syntax error: {}", error),
            Self::UnknownInstruction(name) => write!(f, "Unknown instruction `{}`", name),
            Self::ArityMismatch {
                mnemonic,
                expected,
                found,
            } => write!(
                f,
                "{} expects {} operand{}, found {}",
                mnemonic,
                expected,
                if *expected == 1 { "" } else { "s" },
                found
            ),
            Self::DuplicateLabel(label) => write!(f, "Duplicate label `{}`", label),
            Self::InvalidOperand { operand, reason } => {
                write!(f, "Invalid operand `{}`: {}", operand, reason)
            }
            Self::DivideByZero => write!(f, "Divide by zero"),
            Self::DivideOverflow => write!(f, "Divide overflow"),
            Self::StackUnderflow => write!(f, "Illegal instruction: POP before PUSH"),
            Self::StackOverflow => write!(f, "Stack overflow"),
            Self::UnresolvedLabel(label) => write!(f, "Unresolved label `{}`", label),
            Self::UninitializedMemoryRead(addr) => {
                write!(f, "Using uninitialized memory location [{}]", addr)
            }
            Self::ImmediateOverflow(value) => {
                write!(f, "Literal {} does not fit in a signed word", value)
            }
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyOperands => write!(f, "more than two operands"),
            Self::UnexpectedChar(ch) => write!(f, "unexpected character `{}`", ch),
            Self::UnexpectedComma => write!(f, "unexpected character `,`"),
            Self::DetachedColon => write!(f, "colon is separated from its label"),
            Self::InvalidLabel => write!(f, "invalid label name"),
            Self::BothOperandsMemory => write!(f, "both operands are memory addresses"),
        }
    }
}

impl fmt::Display for OperandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized => write!(f, "not a register, address, or literal"),
            Self::Ambiguous => write!(f, "matches more than one operand form"),
            Self::BadAddress => write!(f, "address must be a non-negative decimal offset"),
            Self::WidthMismatch => write!(f, "operand sizes differ"),
            Self::NotWritable => write!(f, "literals cannot be written to"),
            Self::TooWide => write!(f, "value too wide for destination"),
        }
    }
}

/// Failure while loading, before any instruction has run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadError {
    pub kind: ErrorKind,
    /// 1-based source line.
    pub line: usize,
    pub span: Span,
}

impl LoadError {
    pub fn report(&self, src: &str) -> Report {
        report(&self.kind, self.span, src)
    }
}

impl std::error::Error for LoadError {}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// Render an error that stopped loading or running against the program source.
pub fn report(kind: &ErrorKind, span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = kind.code(),
        help = kind.help(),
        labels = vec![LabeledSpan::at(span, kind.label())],
        "{}",
        kind
    )
    .with_source_code(src.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality() {
        assert!(ErrorKind::StackUnderflow.is_fatal());
        assert!(ErrorKind::Syntax(SyntaxError::UnexpectedComma).is_fatal());
        assert!(!ErrorKind::UninitializedMemoryRead(12).is_fatal());
        assert!(!ErrorKind::ImmediateOverflow(40000).is_fatal());
    }

    #[test]
    fn messages() {
        let error = ErrorKind::ArityMismatch {
            mnemonic: Mnemonic::Push,
            expected: 1,
            found: 2,
        };
        assert_eq!(error.to_string(), "PUSH expects 1 operand, found 2");
        assert_eq!(
            ErrorKind::invalid("AL", OperandError::WidthMismatch).to_string(),
            "Invalid operand `AL`: operand sizes differ"
        );
        let load = LoadError {
            kind: ErrorKind::DuplicateLabel("L1".into()),
            line: 3,
            span: Span::new(10, 2),
        };
        assert_eq!(load.to_string(), "line 3: Duplicate label `L1`");
    }
}
