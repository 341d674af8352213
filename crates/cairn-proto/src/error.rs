//! DNS protocol error types.
//!
//! Errors are split into wire-level parse failures, name failures, header
//! failures and RDATA/EDNS failures. Parse failures inside a single resource
//! record are recoverable at the message level (the record is skipped);
//! header failures are not.

use thiserror::Error;

/// Result type alias for DNS protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// DNS protocol errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Wire Format Errors
    // =========================================================================
    /// Buffer is too short to contain the expected data.
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Expected minimum size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// A read ran past the available bits.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where EOF was encountered.
        offset: usize,
    },

    /// Invalid data encountered during parsing.
    #[error("invalid data at offset {offset}: {message}")]
    InvalidData {
        /// Byte offset of the invalid data.
        offset: usize,
        /// Description of the error.
        message: String,
    },

    /// A field value does not fit the bit width it is written with.
    #[error("value {value} does not fit in {width} bits")]
    FieldOverflow {
        /// The value that was written.
        value: u64,
        /// Width of the field in bits.
        width: u8,
    },

    // =========================================================================
    // Domain Name Errors
    // =========================================================================
    /// Label exceeds maximum length of 63 bytes.
    #[error("label too long: {length} bytes exceeds maximum of 63")]
    LabelTooLong {
        /// Actual label length.
        length: usize,
    },

    /// Domain name exceeds maximum length of 255 bytes.
    #[error("name too long: {length} bytes exceeds maximum of 255")]
    NameTooLong {
        /// Actual name length in wire format.
        length: usize,
    },

    /// Label type bits `01` or `10` (extended / reserved label types).
    #[error("unsupported label type 0x{bits:02x} at offset {offset}")]
    InvalidLabelType {
        /// The two high bits of the length byte.
        bits: u8,
        /// Offset of the length byte.
        offset: usize,
    },

    /// Presentation-format name could not be parsed.
    #[error("invalid name {input:?}: {message}")]
    InvalidName {
        /// The text that failed to parse.
        input: String,
        /// Description of the error.
        message: String,
    },

    /// Compression pointer that does not point strictly backwards.
    #[error("invalid compression pointer at offset {offset}: points to {target}")]
    InvalidCompressionPointer {
        /// Offset of the pointer.
        offset: usize,
        /// Target offset the pointer references.
        target: usize,
    },

    /// Too many compression pointer jumps.
    #[error("too many compression pointer jumps (>{max_jumps})")]
    TooManyCompressionJumps {
        /// Maximum allowed jumps.
        max_jumps: usize,
    },

    // =========================================================================
    // RDATA Errors
    // =========================================================================
    /// RDATA length does not match what the type requires.
    #[error("RDATA length mismatch for {rtype}: expected {expected}, got {actual}")]
    RDataLengthMismatch {
        /// Record type.
        rtype: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Encoded RDATA does not fit the 16-bit RDLENGTH field.
    #[error("RDATA for {rtype} is {length} bytes, exceeds 65535")]
    RDataOverflow {
        /// Record type.
        rtype: String,
        /// Encoded length.
        length: usize,
    },

    /// Invalid RDATA content.
    #[error("invalid RDATA for {rtype}: {message}")]
    InvalidRData {
        /// Record type.
        rtype: String,
        /// Error description.
        message: String,
    },

    // =========================================================================
    // EDNS Errors
    // =========================================================================
    /// Invalid EDNS option.
    #[error("invalid EDNS option {code}: {message}")]
    InvalidEdnsOption {
        /// Option code.
        code: u16,
        /// Error description.
        message: String,
    },

    // =========================================================================
    // Message Errors
    // =========================================================================
    /// Message exceeds maximum size.
    #[error("message too large: {size} bytes exceeds maximum of {max_size}")]
    MessageTooLarge {
        /// Actual message size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },
}

impl Error {
    /// Creates a new `BufferTooShort` error.
    #[inline]
    pub fn buffer_too_short(expected: usize, actual: usize) -> Self {
        Self::BufferTooShort { expected, actual }
    }

    /// Creates a new `UnexpectedEof` error.
    #[inline]
    pub fn unexpected_eof(offset: usize) -> Self {
        Self::UnexpectedEof { offset }
    }

    /// Creates a new `InvalidData` error.
    #[inline]
    pub fn invalid_data(offset: usize, message: impl Into<String>) -> Self {
        Self::InvalidData {
            offset,
            message: message.into(),
        }
    }

    /// Creates a new `LabelTooLong` error.
    #[inline]
    pub fn label_too_long(length: usize) -> Self {
        Self::LabelTooLong { length }
    }

    /// Creates a new `NameTooLong` error.
    #[inline]
    pub fn name_too_long(length: usize) -> Self {
        Self::NameTooLong { length }
    }

    /// Creates a new `InvalidName` error.
    #[inline]
    pub fn invalid_name(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidName {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRData` error.
    #[inline]
    pub fn invalid_rdata(rtype: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRData {
            rtype: rtype.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidEdnsOption` error.
    #[inline]
    pub fn invalid_edns_option(code: u16, message: impl Into<String>) -> Self {
        Self::InvalidEdnsOption {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this error means the input bytes are malformed
    /// (as opposed to a value we refuse to encode).
    #[inline]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::BufferTooShort { .. }
                | Self::UnexpectedEof { .. }
                | Self::InvalidData { .. }
                | Self::InvalidLabelType { .. }
                | Self::InvalidCompressionPointer { .. }
                | Self::TooManyCompressionJumps { .. }
                | Self::RDataLengthMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::buffer_too_short(12, 8);
        assert_eq!(
            err.to_string(),
            "buffer too short: expected at least 12 bytes, got 8"
        );

        let err = Error::label_too_long(64);
        assert_eq!(
            err.to_string(),
            "label too long: 64 bytes exceeds maximum of 63"
        );

        let err = Error::FieldOverflow { value: 16, width: 4 };
        assert_eq!(err.to_string(), "value 16 does not fit in 4 bits");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::buffer_too_short(10, 5).is_malformed());
        assert!(Error::unexpected_eof(3).is_malformed());
        assert!(Error::InvalidCompressionPointer { offset: 12, target: 40 }.is_malformed());
        assert!(!Error::invalid_rdata("CAA", "tag too long").is_malformed());
    }
}
