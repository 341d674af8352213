//! DNS record data (RDATA).
//!
//! [`RData`] is a closed set with one variant per supported type and an
//! opaque [`Unknown`] fallback. Decoding dispatches on the type code;
//! every decoder reads from a [`WireReader`] limited to exactly RDLENGTH
//! bytes, so an overrun can never spill into the next record.
//!
//! - **Address**: A, AAAA
//! - **Name**: NS, CNAME, PTR, MX
//! - **Authority**: SOA
//! - **Text**: TXT, SPF
//! - **Service**: SRV, CAA
//! - **DNSSEC** (data only): DNSKEY, RRSIG
//! - **EDNS**: OPT
//!
//! The serde form is the flat record shape tagged by `type`, e.g.
//! `{ "type": "MX", "exchange": "mail.example.com.", "priority": 10 }`.

pub mod address;
pub mod authority;
pub mod dnssec;
pub mod name;
pub mod service;
pub mod text;
pub mod unknown;

pub use address::{A, AAAA};
pub use authority::SOA;
pub use dnssec::{DNSKEY, RRSIG};
pub use name::{CNAME, MX, NS, PTR};
pub use service::{CAA, SRV};
pub use text::TXT;
pub use unknown::Unknown;

use crate::edns::Opt;
use crate::error::{Error, Result};
use crate::rtype::{RecordType, Type};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-type wire codec.
pub trait RDataType: Sized {
    /// The type code this RDATA is carried under.
    const TYPE: RecordType;

    /// Decodes from a reader limited to the RDATA window.
    fn decode(reader: &mut WireReader<'_>) -> Result<Self>;

    /// Appends the RDATA (without the RDLENGTH prefix).
    fn encode(&self, writer: &mut WireWriter) -> Result<()>;
}

/// DNS record data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RData {
    /// IPv4 address.
    A(A),
    /// IPv6 address.
    AAAA(AAAA),
    /// Name server.
    NS(NS),
    /// Canonical name.
    CNAME(CNAME),
    /// Start of authority.
    SOA(SOA),
    /// Mail exchange.
    MX(MX),
    /// Text.
    TXT(TXT),
    /// Service locator.
    SRV(SRV),
    /// Domain name pointer.
    PTR(PTR),
    /// Sender policy framework, laid out like TXT.
    SPF(TXT),
    /// Certification authority authorization.
    CAA(CAA),
    /// EDNS options of an OPT pseudo-record.
    OPT(Opt),
    /// DNSSEC public key.
    DNSKEY(DNSKEY),
    /// DNSSEC signature.
    RRSIG(RRSIG),
    /// Any other type, kept as raw bytes.
    Unknown(Unknown),
}

impl RData {
    /// Returns the type code this RDATA is carried under.
    pub fn rtype(&self) -> Type {
        let known = match self {
            Self::A(_) => RecordType::A,
            Self::AAAA(_) => RecordType::AAAA,
            Self::NS(_) => RecordType::NS,
            Self::CNAME(_) => RecordType::CNAME,
            Self::SOA(_) => RecordType::SOA,
            Self::MX(_) => RecordType::MX,
            Self::TXT(_) => RecordType::TXT,
            Self::SRV(_) => RecordType::SRV,
            Self::PTR(_) => RecordType::PTR,
            Self::SPF(_) => RecordType::SPF,
            Self::CAA(_) => RecordType::CAA,
            Self::OPT(_) => RecordType::OPT,
            Self::DNSKEY(_) => RecordType::DNSKEY,
            Self::RRSIG(_) => RecordType::RRSIG,
            Self::Unknown(u) => return Type::from_u16(u.type_code()),
        };
        Type::Known(known)
    }

    /// Decodes RDATA of type `rtype` from a reader limited to RDLENGTH.
    ///
    /// The decoder must consume the window exactly; trailing bytes are a
    /// length mismatch.
    pub fn decode(rtype: Type, reader: &mut WireReader<'_>) -> Result<Self> {
        let start = reader.position();
        let rdata = match rtype.as_known() {
            Some(RecordType::A) => Self::A(A::decode(reader)?),
            Some(RecordType::AAAA) => Self::AAAA(AAAA::decode(reader)?),
            Some(RecordType::NS) => Self::NS(NS::decode(reader)?),
            Some(RecordType::CNAME) => Self::CNAME(CNAME::decode(reader)?),
            Some(RecordType::SOA) => Self::SOA(SOA::decode(reader)?),
            Some(RecordType::MX) => Self::MX(MX::decode(reader)?),
            Some(RecordType::TXT) => Self::TXT(TXT::decode(reader)?),
            Some(RecordType::SRV) => Self::SRV(SRV::decode(reader)?),
            Some(RecordType::PTR) => Self::PTR(PTR::decode(reader)?),
            Some(RecordType::SPF) => Self::SPF(TXT::decode_strings(reader)?),
            Some(RecordType::CAA) => Self::CAA(CAA::decode(reader)?),
            Some(RecordType::OPT) => Self::OPT(Opt::decode(reader)?),
            Some(RecordType::DNSKEY) => Self::DNSKEY(DNSKEY::decode(reader)?),
            Some(RecordType::RRSIG) => Self::RRSIG(RRSIG::decode(reader)?),
            _ => Self::Unknown(Unknown::decode(rtype.to_u16(), reader)?),
        };

        if !reader.is_empty() {
            let consumed = reader.position() - start;
            return Err(Error::RDataLengthMismatch {
                rtype: rtype.to_string(),
                expected: consumed,
                actual: consumed + reader.remaining(),
            });
        }
        Ok(rdata)
    }

    /// Appends the RDATA (without the RDLENGTH prefix).
    pub fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        match self {
            Self::A(r) => r.encode(writer),
            Self::AAAA(r) => r.encode(writer),
            Self::NS(r) => r.encode(writer),
            Self::CNAME(r) => r.encode(writer),
            Self::SOA(r) => r.encode(writer),
            Self::MX(r) => r.encode(writer),
            Self::TXT(r) => r.encode(writer),
            Self::SRV(r) => r.encode(writer),
            Self::PTR(r) => r.encode(writer),
            Self::SPF(r) => {
                r.encode_strings(writer);
                Ok(())
            }
            Self::CAA(r) => r.encode(writer),
            Self::OPT(r) => r.encode(writer),
            Self::DNSKEY(r) => r.encode(writer),
            Self::RRSIG(r) => r.encode(writer),
            Self::Unknown(r) => {
                r.encode(writer);
                Ok(())
            }
        }
    }

    /// Returns the SOA data, if this is an SOA.
    pub fn as_soa(&self) -> Option<&SOA> {
        match self {
            Self::SOA(soa) => Some(soa),
            _ => None,
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(r) => write!(f, "{r}"),
            Self::AAAA(r) => write!(f, "{r}"),
            Self::NS(r) => write!(f, "{r}"),
            Self::CNAME(r) => write!(f, "{r}"),
            Self::SOA(r) => write!(f, "{r}"),
            Self::MX(r) => write!(f, "{r}"),
            Self::TXT(r) | Self::SPF(r) => write!(f, "{r}"),
            Self::SRV(r) => write!(f, "{r}"),
            Self::PTR(r) => write!(f, "{r}"),
            Self::CAA(r) => write!(f, "{r}"),
            Self::OPT(r) => write!(f, "{r}"),
            Self::DNSKEY(r) => write!(f, "{r}"),
            Self::RRSIG(r) => write!(f, "{r}"),
            Self::Unknown(r) => write!(f, "{r}"),
        }
    }
}

/// Serde adapter: bytes as standard base64 text.
pub(crate) mod base64_bytes {
    use data_encoding::BASE64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        // Zone files often wrap keys; ignore embedded whitespace.
        let compact: String = text.split_whitespace().collect();
        BASE64
            .decode(compact.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: bytes as hex text.
pub(crate) mod hex_bytes {
    use data_encoding::HEXLOWER_PERMISSIVE;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&HEXLOWER_PERMISSIVE.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        HEXLOWER_PERMISSIVE
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
