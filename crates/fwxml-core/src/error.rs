//! Error types for fwxml-core

use thiserror::Error;

/// Result type alias for fwxml-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fwxml-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    ConfigInvalid {
        /// Description of what's invalid
        message: String,
    },

    /// No template source exists for the requested name
    #[error("template '{name}' not found at {path}")]
    TemplateNotFound {
        /// Template name
        name: String,
        /// Path that was searched
        path: String,
    },

    /// An instruction tape failed validation
    #[error("invalid instruction tape at op {index}: {reason}")]
    InvalidTape {
        /// Index of the offending op
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Expansion failed
    #[error(transparent)]
    Expand(#[from] ExpandError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while running an expander against an input record.
///
/// These are data errors: they never leave the expander in an unusable state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandError {
    /// A field needs more characters than remain in the input
    #[error(
        "input exhausted at offset {offset}: field needs {needed} characters but {remaining} remain"
    )]
    InputExhausted {
        /// Input cursor when the field started
        offset: usize,
        /// Field width
        needed: usize,
        /// Characters left in the input
        remaining: usize,
    },

    /// The output buffer is too small
    #[error("output capacity of {capacity} exceeded: {required} units required")]
    OutputCapacityExceeded {
        /// Size of the caller's buffer
        capacity: usize,
        /// Output size the failing write needed
        required: usize,
    },

    /// Byte-mode only: a surrogate code unit cannot be transcoded on its own
    #[error("non-BMP character (surrogate 0x{unit:04X}) at input offset {offset}")]
    NonBmpCharacter {
        /// Input offset of the surrogate
        offset: usize,
        /// The surrogate code unit
        unit: u16,
    },

    /// Char-mode output could not be turned into a `String`
    #[error("expanded text is not valid UTF-16: a field boundary split a surrogate pair")]
    InvalidUtf16,
}
