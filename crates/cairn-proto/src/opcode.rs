//! DNS operation codes (RFC 1035 §4.1.1, RFC 1996, RFC 2136).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The 4-bit OPCODE header field.
///
/// Unassigned values are kept as [`OpCode::Unknown`] so the message can
/// still be answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpCode {
    /// Standard query.
    #[default]
    Query,
    /// Inverse query (obsolete, RFC 3425).
    IQuery,
    /// Server status request.
    Status,
    /// Zone change notification (RFC 1996).
    Notify,
    /// Dynamic update (RFC 2136).
    Update,
    /// A value with no assigned meaning.
    Unknown(u8),
}

impl OpCode {
    /// Returns the numeric value of the opcode.
    #[inline]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Query => 0,
            Self::IQuery => 1,
            Self::Status => 2,
            Self::Notify => 4,
            Self::Update => 5,
            Self::Unknown(value) => value,
        }
    }

    /// Decodes the 4-bit header value.
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Query,
            1 => Self::IQuery,
            2 => Self::Status,
            4 => Self::Notify,
            5 => Self::Update,
            other => Self::Unknown(other),
        }
    }

    /// Returns true for values with no assigned meaning.
    #[inline]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// Returns the mnemonic used in presentation format.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::IQuery => "IQUERY",
            Self::Status => "STATUS",
            Self::Notify => "NOTIFY",
            Self::Update => "UPDATE",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for OpCode {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl From<OpCode> for u8 {
    fn from(opcode: OpCode) -> Self {
        opcode.to_u8()
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(value) => write!(f, "OPCODE{value}"),
            known => f.write_str(known.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), OpCode::Query);
        assert_eq!(OpCode::from_u8(4), OpCode::Notify);
        assert_eq!(OpCode::from_u8(3), OpCode::Unknown(3));
        assert!(OpCode::from_u8(15).is_unknown());
        assert_eq!(OpCode::from_u8(15).to_u8(), 15);
    }

    #[test]
    fn test_opcode_display() {
        assert_eq!(OpCode::Notify.to_string(), "NOTIFY");
        assert_eq!(OpCode::Unknown(6).to_string(), "OPCODE6");
        assert_eq!(u8::from(OpCode::Update), 5);
    }
}
