//! DNS record types.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record types this server knows by name.
///
/// Only some of them have a typed RDATA representation; the rest are kept
/// opaque (see [`RData::Unknown`](crate::RData::Unknown)).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum RecordType {
    /// IPv4 address - RFC 1035
    A = 1,
    /// Authoritative name server - RFC 1035
    NS = 2,
    /// Mail destination (obsolete) - RFC 1035
    MD = 3,
    /// Mail forwarder (obsolete) - RFC 1035
    MF = 4,
    /// Canonical name - RFC 1035
    CNAME = 5,
    /// Start of authority - RFC 1035
    SOA = 6,
    /// Mailbox domain name - RFC 1035
    MB = 7,
    /// Mail group member - RFC 1035
    MG = 8,
    /// Mail rename domain name - RFC 1035
    MR = 9,
    /// Null record - RFC 1035
    NULL = 10,
    /// Well-known services - RFC 1035
    WKS = 11,
    /// Domain name pointer - RFC 1035
    PTR = 12,
    /// Host information - RFC 1035
    HINFO = 13,
    /// Mailbox information - RFC 1035
    MINFO = 14,
    /// Mail exchange - RFC 1035
    MX = 15,
    /// Text strings - RFC 1035
    TXT = 16,
    /// IPv6 address - RFC 3596
    AAAA = 28,
    /// Server selection - RFC 2782
    SRV = 33,
    /// EDNS(0) pseudo-record - RFC 6891
    OPT = 41,
    /// DNSSEC signature - RFC 4034
    RRSIG = 46,
    /// DNSSEC public key - RFC 4034
    DNSKEY = 48,
    /// Sender policy framework - RFC 7208
    SPF = 99,
    /// Full zone transfer - RFC 5936
    AXFR = 252,
    /// Mailbox-related records - RFC 1035
    MAILB = 253,
    /// Mail agent records (obsolete) - RFC 1035
    MAILA = 254,
    /// Any type - RFC 1035
    ANY = 255,
    /// Certification authority authorization - RFC 8659
    CAA = 257,
}

impl RecordType {
    /// Returns the numeric value.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Looks up a type by its numeric value.
    #[inline]
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Returns true for types that only appear in questions.
    #[inline]
    pub const fn is_query_type(self) -> bool {
        matches!(self, Self::AXFR | Self::MAILB | Self::MAILA | Self::ANY)
    }

    /// Returns the mnemonic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::NS => "NS",
            Self::MD => "MD",
            Self::MF => "MF",
            Self::CNAME => "CNAME",
            Self::SOA => "SOA",
            Self::MB => "MB",
            Self::MG => "MG",
            Self::MR => "MR",
            Self::NULL => "NULL",
            Self::WKS => "WKS",
            Self::PTR => "PTR",
            Self::HINFO => "HINFO",
            Self::MINFO => "MINFO",
            Self::MX => "MX",
            Self::TXT => "TXT",
            Self::AAAA => "AAAA",
            Self::SRV => "SRV",
            Self::OPT => "OPT",
            Self::RRSIG => "RRSIG",
            Self::DNSKEY => "DNSKEY",
            Self::SPF => "SPF",
            Self::AXFR => "AXFR",
            Self::MAILB => "MAILB",
            Self::MAILA => "MAILA",
            Self::ANY => "ANY",
            Self::CAA => "CAA",
        }
    }

    const ALL: [Self; 27] = [
        Self::A,
        Self::NS,
        Self::MD,
        Self::MF,
        Self::CNAME,
        Self::SOA,
        Self::MB,
        Self::MG,
        Self::MR,
        Self::NULL,
        Self::WKS,
        Self::PTR,
        Self::HINFO,
        Self::MINFO,
        Self::MX,
        Self::TXT,
        Self::AAAA,
        Self::SRV,
        Self::OPT,
        Self::RRSIG,
        Self::DNSKEY,
        Self::SPF,
        Self::AXFR,
        Self::MAILB,
        Self::MAILA,
        Self::ANY,
        Self::CAA,
    ];
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type code that may or may not be one of the named [`RecordType`]s.
///
/// Unnamed codes are displayed as `TYPE<n>` (RFC 3597 §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// A named type.
    Known(RecordType),
    /// Any other code.
    Unknown(u16),
}

impl Type {
    /// Creates a type from a u16 value.
    #[inline]
    pub fn from_u16(value: u16) -> Self {
        RecordType::from_u16(value).map_or(Self::Unknown(value), Self::Known)
    }

    /// Returns the numeric value.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::Known(t) => t.to_u16(),
            Self::Unknown(v) => v,
        }
    }

    /// Returns the named type, if any.
    #[inline]
    pub const fn as_known(self) -> Option<RecordType> {
        match self {
            Self::Known(t) => Some(t),
            Self::Unknown(_) => None,
        }
    }

    /// Returns true if this is `t`.
    #[inline]
    pub fn is(self, t: RecordType) -> bool {
        self == Self::Known(t)
    }
}

impl From<RecordType> for Type {
    fn from(t: RecordType) -> Self {
        Self::Known(t)
    }
}

impl From<u16> for Type {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<Type> for u16 {
    fn from(value: Type) -> Self {
        value.to_u16()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(t) => write!(f, "{t}"),
            Self::Unknown(v) => write!(f, "TYPE{v}"),
        }
    }
}

impl FromStr for Type {
    type Err = String;

    /// Accepts a mnemonic (any case) or the `TYPE<n>` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        if let Some(t) = RecordType::ALL.iter().find(|t| t.name() == upper) {
            return Ok(Self::Known(*t));
        }
        upper
            .strip_prefix("TYPE")
            .and_then(|n| n.parse::<u16>().ok())
            .map(Self::from_u16)
            .ok_or_else(|| format!("unknown record type {s:?}"))
    }
}

impl Serialize for Type {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
