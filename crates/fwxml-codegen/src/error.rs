//! Error types for template compilation
//!
//! Build-time failures come in two kinds that are never conflated:
//! [`ParseError`] means the template source is malformed, [`BuildError`]
//! means a well-formed program could not be turned into a tape.

use thiserror::Error;

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling templates
#[derive(Error, Debug)]
pub enum Error {
    /// The template source is malformed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The program could not be assembled
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Configuration or template lookup failed
    #[error("configuration error: {0}")]
    Config(#[from] fwxml_core::Error),

    /// Two templates would be written to the same generated module
    #[error("templates '{first}' and '{second}' both generate module `{module}`")]
    ModuleCollision {
        /// Generated module name
        module: String,
        /// Template that claimed the module first
        first: String,
        /// Template that collided with it
        second: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A malformed directive in template source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at line {line}, column {column}: `{token}`")]
pub struct ParseError {
    /// Byte offset of the offending directive's opening brace
    pub position: usize,

    /// 1-based line of `position`
    pub line: usize,

    /// 1-based column of `position`, in characters
    pub column: usize,

    /// The offending source text
    pub token: String,

    /// What is wrong
    pub kind: ParseErrorKind,
}

/// Why a directive was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// `{` without a closing `}`
    #[error("unterminated directive")]
    UnterminatedDirective,

    /// `{}`
    #[error("empty directive")]
    EmptyDirective,

    /// Directive name is not `field`, `repeat` or `end`
    #[error("unknown directive")]
    UnknownDirective,

    /// `{field}` or `{repeat}` without a number
    #[error("missing numeric argument")]
    MissingArgument,

    /// Argument is not a decimal number that fits in 32 bits
    #[error("invalid numeric argument")]
    InvalidArgument,

    /// `{field:0}`
    #[error("field width must be at least 1")]
    ZeroWidth,

    /// `{end:...}`
    #[error("directive takes no argument")]
    UnexpectedArgument,

    /// `{end}` with no open `{repeat}`
    #[error("`end` without a matching `repeat`")]
    UnmatchedEnd,

    /// `{repeat}` never closed by `{end}`
    #[error("unterminated repeat group")]
    UnterminatedGroup,

    /// `{#` without a closing `#}`
    #[error("unterminated comment")]
    UnterminatedComment,
}

/// The builder failed to assemble a well-formed program.
///
/// Unlike a [`ParseError`] this points at a builder defect or a program too
/// large for the tape format, not at bad template data.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A count does not fit the tape's 32-bit operands
    #[error("program too large: {what} ({value}) exceeds the tape limit")]
    TooLarge {
        /// What overflowed
        what: &'static str,
        /// The offending size
        value: usize,
    },

    /// The assembled tape failed validation
    #[error("assembled tape is invalid: {0}")]
    InvalidTape(#[source] fwxml_core::Error),
}
