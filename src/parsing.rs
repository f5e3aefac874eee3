use std::fmt;
use std::ops::Range;
use itertools::Itertools;

use crate::instruction::OperandKind;

#[derive(Clone, Debug, PartialEq)]
pub struct Error<Context> {
    pub kind: ErrorKind,
    pub context: Vec<Context>,
}

impl<C> Error<C> {
    pub fn new<T>(span: Span, ctx: T) -> Error<C> where T: Into<C> {
        Error::with_kind(ErrorKind::UnexpectedToken { span }, ctx)
    }

    pub fn eos<T>(ctx: T) -> Error<C> where T: Into<C> {
        Error::with_kind(ErrorKind::EndOfStream, ctx)
    }

    pub fn with_kind<T>(kind: ErrorKind, ctx: T) -> Error<C> where T: Into<C> {
        Error {
            kind,
            context: vec![ctx.into()],
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self.kind {
            ErrorKind::EndOfStream | ErrorKind::ProgramTooLarge { .. } => None,
            ErrorKind::UnexpectedToken { ref span }
            | ErrorKind::UnknownMnemonic { ref span, .. }
            | ErrorKind::InvalidOperand { ref span, .. }
            | ErrorKind::OperandCount { ref span, .. }
            | ErrorKind::LiteralOutOfRange { ref span }
            | ErrorKind::UnknownLabel { ref span, .. }
            | ErrorKind::DuplicateLabel { ref span, .. } => Some(span),
        }
    }

    /// Calculates the line and column of the error from the original source.
    pub fn location(&self, source: &str) -> Option<(usize, usize)> {
        let start = self.span()?.start;
        let before = source.get(..start)?;

        let line = before.matches('\n').count() + 1;
        let column = before.chars().rev().take_while(|ch| *ch != '\n').count() + 1;

        Some((line, column))
    }
}

pub trait ErrorExt<R,C> {
    fn context<T>(self, ctx: T) -> Self where T: Into<C>;
}

impl<R,C> ErrorExt<R,C> for Result<R, Error<C>> {
    fn context<T>(mut self, ctx: T) -> Self where T: Into<C> {
        if let Err(ref mut err) = self {
            err.context.push(ctx.into());
        }

        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    EndOfStream,
    UnexpectedToken {
        span: Span,
    },
    UnknownMnemonic {
        span: Span,
        mnemonic: String,
        /// The closest known mnemonic, if any is close enough.
        suggestion: Option<&'static str>,
    },
    InvalidOperand {
        span: Span,
        expected: OperandKind,
    },
    OperandCount {
        span: Span,
        expected: usize,
        found: usize,
    },
    LiteralOutOfRange {
        span: Span,
    },
    UnknownLabel {
        span: Span,
        label: String,
    },
    DuplicateLabel {
        span: Span,
        label: String,
    },
    ProgramTooLarge {
        size: usize,
    },
}

pub type Span = Range<usize>;

impl<C> fmt::Display for Error<C>
where
    C: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ctx = self.context.iter()
            .rev()
            .join(": ");

        if let Some(span) = self.span() {
            write!(f, "error at position {}-{}: {}: ", span.start, span.end, ctx)?;
        } else {
            write!(f, "{}: ", ctx)?;
        }

        match self.kind {
            ErrorKind::EndOfStream =>
                write!(f, "unexpected end of stream"),
            ErrorKind::UnexpectedToken { .. } =>
                write!(f, "unexpected token"),
            ErrorKind::UnknownMnemonic { ref mnemonic, suggestion: Some(suggestion), .. } =>
                write!(f, "unknown mnemonic '{}', did you mean '{}'?", mnemonic, suggestion),
            ErrorKind::UnknownMnemonic { ref mnemonic, suggestion: None, .. } =>
                write!(f, "unknown mnemonic '{}'", mnemonic),
            ErrorKind::InvalidOperand { expected: OperandKind::Register, .. } =>
                write!(f, "expected a register"),
            ErrorKind::InvalidOperand { expected: OperandKind::Immediate, .. } =>
                write!(f, "expected a literal or a label"),
            ErrorKind::OperandCount { expected, found, .. } =>
                write!(f, "expected {} operands, found {}", expected, found),
            ErrorKind::LiteralOutOfRange { .. } =>
                write!(f, "value does not fit into 8 bits"),
            ErrorKind::UnknownLabel { ref label, .. } =>
                write!(f, "unknown label '{}'", label),
            ErrorKind::DuplicateLabel { ref label, .. } =>
                write!(f, "label '{}' is already defined", label),
            ErrorKind::ProgramTooLarge { size } =>
                write!(f, "program of {} bytes does not fit into memory", size),
        }
    }
}

impl<C: fmt::Display + fmt::Debug> std::error::Error for Error<C> {}
