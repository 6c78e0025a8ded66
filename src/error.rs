//! Error types for mapped arrays

use std::io;
use thiserror::Error;

use crate::element::{ArrayTag, Value};

/// Broad classification of an [`ArrayError`]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Malformed argument: zero step, ragged byte length, bad byteswap width...
    Value,
    /// Index outside the valid range
    Range,
    /// Incompatible element types or value kinds
    Type,
    /// Value does not fit the element type
    Overflow,
    /// Replacement length does not match an extended slice
    Length,
    /// A bounded read ended before all requested elements were available
    Incomplete,
    /// The mapping could not be acquired or resized
    Resource,
    /// Write attempted on a read-only mapping
    Permission,
    /// A bulk append stopped part way through
    PartiallyApplied,
}

/// Error type for mapped array operations
#[derive(Error, Debug)]
pub enum ArrayError {
    /// Slice step of zero
    #[error("slice step cannot be zero")]
    ZeroStep,
    /// Collection size does not fit a signed index
    #[error("size {0} is too large to index")]
    SizeTooLarge(usize),
    /// Unknown typecode
    #[error("bad typecode {0:?} (must be c, u, b, B, h, H, i, I, l, L, q, Q, f or d)")]
    BadTypecode(char),
    /// Byte length is not a whole number of elements
    #[error("byte length {len} is not a multiple of item size {itemsize}")]
    NotMultiple {
        /// Offending byte length
        len: usize,
        /// Width of one element
        itemsize: usize,
    },
    /// Byteswap requested for an element width it is not defined for
    #[error("don't know how to byteswap items of size {0}")]
    ByteswapWidth(usize),
    /// Text conversion on an array that does not hold wide characters
    #[error("text conversion requires a 'u' array, found {0:?}")]
    NotText(ArrayTag),
    /// Value searched for is not present
    #[error("value {0:?} not found in array")]
    NotFound(Value),
    /// Index outside `[-len, len)`
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange {
        /// Index as supplied by the caller
        index: isize,
        /// Length at the time of the call
        len: usize,
    },
    /// Byte range outside the live region of a buffer
    #[error("byte range {offset}..{end} outside buffer of length {len}")]
    ByteRange {
        /// Start of the range
        offset: usize,
        /// End of the range
        end: usize,
        /// Live length of the buffer
        len: usize,
    },
    /// Two arrays with different element types
    #[error("array type mismatch, expected {expected:?} but found {found:?}")]
    TagMismatch {
        /// Element type of the receiving array
        expected: ArrayTag,
        /// Element type that was supplied
        found: ArrayTag,
    },
    /// Value of the wrong kind for the element type
    #[error("cannot store {value:?} in an array of {tag:?}")]
    WrongKind {
        /// Element type of the array
        tag: ArrayTag,
        /// Rejected value
        value: Value,
    },
    /// Value out of range for the element type
    #[error("value {value:?} out of range for {tag:?}")]
    Overflow {
        /// Element type of the array
        tag: ArrayTag,
        /// Rejected value
        value: Value,
    },
    /// Replacement length differs from the extended slice length
    #[error("attempt to assign array of size {found} to extended slice of size {expected}")]
    LengthMismatch {
        /// Resolved slice length
        expected: usize,
        /// Length of the replacement
        found: usize,
    },
    /// Fewer whole elements were read than requested; the ones read were kept
    #[error("read only {read} of {requested} items before end of stream")]
    Incomplete {
        /// Number of elements requested
        requested: usize,
        /// Number of whole elements appended
        read: usize,
    },
    /// Bulk append committed a prefix of its input and then failed
    #[error("{applied} items appended before failure: {cause}")]
    PartiallyApplied {
        /// Number of elements appended before the failure
        applied: usize,
        /// The failure that stopped the append
        #[source]
        cause: Box<ArrayError>,
    },
    /// The mapping is read-only
    #[error("mapping is read-only")]
    ReadOnly,
    /// The mapping could not be resized
    #[error("failed to resize mapping to {requested} bytes")]
    Resize {
        /// Requested byte length
        requested: usize,
        /// Error from the mapping
        #[source]
        source: io::Error,
    },
    /// I/O failure acquiring a mapping or reading/writing a stream
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ArrayError {
    /// Classifies the error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        use ArrayError::*;
        match self {
            ZeroStep | SizeTooLarge(_) | BadTypecode(_) | NotMultiple { .. } | ByteswapWidth(_)
            | NotText(_) | NotFound(_) => ErrorKind::Value,
            IndexOutOfRange { .. } | ByteRange { .. } => ErrorKind::Range,
            TagMismatch { .. } | WrongKind { .. } => ErrorKind::Type,
            Overflow { .. } => ErrorKind::Overflow,
            LengthMismatch { .. } => ErrorKind::Length,
            Incomplete { .. } => ErrorKind::Incomplete,
            PartiallyApplied { .. } => ErrorKind::PartiallyApplied,
            ReadOnly => ErrorKind::Permission,
            Resize { .. } | Io(_) => ErrorKind::Resource,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ArrayError>;
