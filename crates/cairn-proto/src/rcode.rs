//! DNS response codes.
//!
//! The header carries the low four bits; with EDNS the OPT record carries
//! eight more (RFC 6891 §6.1.3).

use serde::{Deserialize, Serialize};
use std::fmt;

/// DNS response code.
///
/// Unassigned values are kept as [`ResponseCode::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    /// No error condition.
    #[default]
    NoError,
    /// The server was unable to interpret the query.
    FormErr,
    /// The server failed to process the query.
    ServFail,
    /// The queried name does not exist.
    NXDomain,
    /// The kind of query is not supported.
    NotImp,
    /// The server refuses the operation for policy reasons.
    Refused,
    /// A name exists when it should not (RFC 2136).
    YXDomain,
    /// An RRset exists when it should not (RFC 2136).
    YXRRSet,
    /// An RRset that should exist does not (RFC 2136).
    NXRRSet,
    /// Server not authoritative for the zone.
    NotAuth,
    /// Name not contained in the zone.
    NotZone,
    /// DSO-TYPE not implemented (RFC 8490).
    DsoTypeNI,
    /// Unsupported EDNS version. Needs the OPT extended bits.
    BadVers,
    /// A 12-bit value with no assigned meaning.
    Unknown(u16),
}

impl ResponseCode {
    /// Returns the numeric value.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::NoError => 0,
            Self::FormErr => 1,
            Self::ServFail => 2,
            Self::NXDomain => 3,
            Self::NotImp => 4,
            Self::Refused => 5,
            Self::YXDomain => 6,
            Self::YXRRSet => 7,
            Self::NXRRSet => 8,
            Self::NotAuth => 9,
            Self::NotZone => 10,
            Self::DsoTypeNI => 11,
            Self::BadVers => 16,
            Self::Unknown(value) => value & 0x0FFF,
        }
    }

    /// Decodes a full 12-bit value.
    pub const fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::FormErr,
            2 => Self::ServFail,
            3 => Self::NXDomain,
            4 => Self::NotImp,
            5 => Self::Refused,
            6 => Self::YXDomain,
            7 => Self::YXRRSet,
            8 => Self::NXRRSet,
            9 => Self::NotAuth,
            10 => Self::NotZone,
            11 => Self::DsoTypeNI,
            16 => Self::BadVers,
            other => Self::Unknown(other),
        }
    }

    /// Returns the low four bits carried in the header.
    #[inline]
    pub const fn header_rcode(self) -> u8 {
        (self.to_u16() & 0x0F) as u8
    }

    /// Returns the upper eight bits carried in the OPT TTL.
    #[inline]
    pub const fn extended_rcode(self) -> u8 {
        (self.to_u16() >> 4) as u8
    }

    /// Decodes the 4-bit header field on its own.
    pub const fn from_header(value: u8) -> Self {
        Self::from_u16((value & 0x0F) as u16)
    }

    /// Combines the header bits with the OPT extended bits.
    pub const fn from_parts(header_rcode: u8, extended_rcode: u8) -> Self {
        Self::from_u16((extended_rcode as u16) << 4 | (header_rcode & 0x0F) as u16)
    }

    /// Returns the mnemonic used in presentation format.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NXDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
            Self::YXDomain => "YXDOMAIN",
            Self::YXRRSet => "YXRRSET",
            Self::NXRRSet => "NXRRSET",
            Self::NotAuth => "NOTAUTH",
            Self::NotZone => "NOTZONE",
            Self::DsoTypeNI => "DSOTYPENI",
            Self::BadVers => "BADVERS",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<ResponseCode> for u16 {
    fn from(rcode: ResponseCode) -> Self {
        rcode.to_u16()
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(value) => write!(f, "RCODE{value}"),
            known => f.write_str(known.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_values() {
        assert_eq!(ResponseCode::from_header(3), ResponseCode::NXDomain);
        assert_eq!(ResponseCode::from_header(5), ResponseCode::Refused);
        assert_eq!(ResponseCode::from_header(12), ResponseCode::Unknown(12));
        assert_eq!(ResponseCode::Unknown(12).header_rcode(), 12);
        assert_eq!(ResponseCode::Unknown(12).to_string(), "RCODE12");
    }

    #[test]
    fn test_extended_parts() {
        assert_eq!(ResponseCode::BadVers.header_rcode(), 0);
        assert_eq!(ResponseCode::BadVers.extended_rcode(), 1);
        assert_eq!(ResponseCode::from_parts(0, 1), ResponseCode::BadVers);
        assert_eq!(ResponseCode::from_parts(3, 0), ResponseCode::NXDomain);
        assert_eq!(ResponseCode::from_parts(0, 2), ResponseCode::Unknown(32));
        assert_eq!(ResponseCode::Unknown(32).extended_rcode(), 2);
    }
}
