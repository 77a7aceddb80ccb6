//! Error types for parsing signalset text and editing documents.

use thiserror::Error;

/// Errors produced by [crate::parse] when text is not a well-formed signalset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The text is not valid JSON. Carries the underlying syntax error message.
    #[error("{0}")]
    Syntax(String),
    /// The root is not an object, or its `commands` member is missing or not an array.
    #[error("Invalid signalset format: missing or invalid commands array")]
    MissingCommands,
    /// A command (or one of its signals) does not have the expected shape.
    #[error("Invalid signalset format: command {index}: {message}")]
    InvalidCommand { index: usize, message: String },
    /// A `bix` or `len` format entry is not a non-negative integer, or the bit range is too large.
    #[error("Invalid signalset format: command {command}, signal {signal}: {source}")]
    InvalidBitField {
        command: usize,
        signal: usize,
        #[source]
        source: BitFieldError,
    },
}

/// A bit-position format entry that cannot describe a physical bit range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitFieldError {
    /// `bix` or `len` is negative, fractional or not a number.
    #[error("\"{key}\" must be a non-negative integer, got {value}")]
    NotAnInteger {
        /// Format key, `bix` or `len`.
        key: String,
        /// Offending value rendered as JSON.
        value: String,
    },
    /// `bix + len` would reach past the largest supported payload.
    #[error("\"{key}\" puts the signal end at bit {end}, past the {max}-bit limit")]
    OutOfRange { key: String, end: u64, max: usize },
}

/// Errors produced by the copy-on-write operations in [crate::edit].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Command index is past the end of the document.
    #[error("command {index} out of range (document has {len} commands)")]
    CommandOutOfRange { index: usize, len: usize },
    /// Signal index is past the end of the command's signal list.
    #[error("signal {index} out of range (command {command} has {len} signals)")]
    SignalOutOfRange {
        command: usize,
        index: usize,
        len: usize,
    },
    /// The key is owned by the document structure and cannot be set as a property.
    #[error("\"{0}\" is reserved and cannot be set as a command property")]
    ReservedKey(String),
    /// The new format entry violates the bit-field invariant.
    #[error(transparent)]
    InvalidBitField(#[from] BitFieldError),
}
