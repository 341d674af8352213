//! DNSSEC records (DNSKEY, RRSIG).
//!
//! These are carried and served as data only; nothing here signs or
//! validates.

use super::{base64_bytes, RDataType};
use crate::error::Result;
use crate::name::{read_name, Name};
use crate::rtype::{RecordType, Type};
use crate::wire::{WireReader, WireWriter};
use chrono::DateTime;
use data_encoding::BASE64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// DNSKEY record - DNS public key (RFC 4034 §2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DNSKEY {
    flags: u16,
    protocol: u8,
    algorithm: u8,
    #[serde(with = "base64_bytes")]
    key: Vec<u8>,
}

impl DNSKEY {
    /// Zone Key flag (bit 7).
    pub const FLAG_ZONE_KEY: u16 = 0x0100;
    /// Secure Entry Point flag (bit 15).
    pub const FLAG_SEP: u16 = 0x0001;

    /// Creates a new DNSKEY record.
    pub fn new(flags: u16, protocol: u8, algorithm: u8, key: impl Into<Vec<u8>>) -> Self {
        Self {
            flags,
            protocol,
            algorithm,
            key: key.into(),
        }
    }

    /// Returns the flags.
    #[inline]
    pub const fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns the protocol octet (always 3 for DNSSEC).
    #[inline]
    pub const fn protocol(&self) -> u8 {
        self.protocol
    }

    /// Returns the algorithm number.
    #[inline]
    pub const fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the public key material.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns true if the Zone Key flag is set.
    #[inline]
    pub const fn is_zone_key(&self) -> bool {
        self.flags & Self::FLAG_ZONE_KEY != 0
    }

    /// Returns true if the Secure Entry Point flag is set.
    #[inline]
    pub const fn is_secure_entry_point(&self) -> bool {
        self.flags & Self::FLAG_SEP != 0
    }

    /// Computes the key tag over the RDATA (RFC 4034 Appendix B).
    pub fn key_tag(&self) -> u16 {
        let header = [
            (self.flags >> 8) as u8,
            self.flags as u8,
            self.protocol,
            self.algorithm,
        ];
        let mut ac: u32 = 0;
        for (i, &byte) in header.iter().chain(self.key.iter()).enumerate() {
            ac += if i & 1 == 0 {
                u32::from(byte) << 8
            } else {
                u32::from(byte)
            };
        }
        ac += (ac >> 16) & 0xFFFF;
        (ac & 0xFFFF) as u16
    }
}

impl RDataType for DNSKEY {
    const TYPE: RecordType = RecordType::DNSKEY;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        let flags = reader.read_u16()?;
        let protocol = reader.read_u8()?;
        let algorithm = reader.read_u8()?;
        let key = reader.read_rest()?.to_vec();
        Ok(Self::new(flags, protocol, algorithm, key))
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u16(self.flags);
        writer.write_u8(self.protocol);
        writer.write_u8(self.algorithm);
        writer.write_bytes(&self.key);
        Ok(())
    }
}

impl fmt::Display for DNSKEY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} ; key id = {}",
            self.flags,
            self.protocol,
            self.algorithm,
            BASE64.encode(&self.key),
            self.key_tag()
        )
    }
}

/// RRSIG record - signature over an RRset (RFC 4034 §3).
///
/// Expiration and inception are seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RRSIG {
    type_covered: Type,
    algorithm: u8,
    labels: u8,
    original_ttl: u32,
    expiration: u32,
    inception: u32,
    key_tag: u16,
    signer: Name,
    #[serde(with = "base64_bytes")]
    signature: Vec<u8>,
}

impl RRSIG {
    /// Creates a new RRSIG record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        type_covered: Type,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer: Name,
        signature: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer,
            signature: signature.into(),
        }
    }

    /// Returns the type this signature covers.
    #[inline]
    pub const fn type_covered(&self) -> Type {
        self.type_covered
    }

    /// Returns the algorithm number.
    #[inline]
    pub const fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the label count of the signed owner.
    #[inline]
    pub const fn labels(&self) -> u8 {
        self.labels
    }

    /// Returns the original TTL.
    #[inline]
    pub const fn original_ttl(&self) -> u32 {
        self.original_ttl
    }

    /// Returns the expiration time.
    #[inline]
    pub const fn expiration(&self) -> u32 {
        self.expiration
    }

    /// Returns the inception time.
    #[inline]
    pub const fn inception(&self) -> u32 {
        self.inception
    }

    /// Returns the key tag of the signing key.
    #[inline]
    pub const fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Returns the signer's name.
    #[inline]
    pub fn signer(&self) -> &Name {
        &self.signer
    }

    /// Returns the signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

impl RDataType for RRSIG {
    const TYPE: RecordType = RecordType::RRSIG;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            type_covered: Type::from_u16(reader.read_u16()?),
            algorithm: reader.read_u8()?,
            labels: reader.read_u8()?,
            original_ttl: reader.read_u32()?,
            expiration: reader.read_u32()?,
            inception: reader.read_u32()?,
            key_tag: reader.read_u16()?,
            signer: read_name(reader)?,
            signature: reader.read_rest()?.to_vec(),
        })
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u16(self.type_covered.to_u16());
        writer.write_u8(self.algorithm);
        writer.write_u8(self.labels);
        writer.write_u32(self.original_ttl);
        writer.write_u32(self.expiration);
        writer.write_u32(self.inception);
        writer.write_u16(self.key_tag);
        // Signer name is never compressed (RFC 4034 §3.1.7).
        self.signer.write_to(writer);
        writer.write_bytes(&self.signature);
        Ok(())
    }
}

/// Renders a signature timestamp as `YYYYMMDDHHmmSS` in UTC.
fn signature_time(secs: u32) -> String {
    DateTime::from_timestamp(i64::from(secs), 0)
        .map_or_else(|| secs.to_string(), |t| t.format("%Y%m%d%H%M%S").to_string())
}

impl fmt::Display for RRSIG {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {}",
            self.type_covered,
            self.algorithm,
            self.labels,
            self.original_ttl,
            signature_time(self.expiration),
            signature_time(self.inception),
            self.key_tag,
            self.signer,
            BASE64.encode(&self.signature)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // Root KSK-2010 (key id 19036), algorithm 8.
    const ROOT_KSK: &str = "AwEAAagAIKlVZrpC6Ia7gEzahOR+9W29euxhJhVVLOyQbSEW0O8gcCjFFVQUTf6v58fLjwBd0YI0EzrAcQqBGCzh/RStIoO8g0NfnfL2MTJRkxoXbfDaUeVPQuYEhg37NZWAJQ9VnMVDxP/VHL496M/QZxkjf5/Efucp2gaDX6RS6CXpoY68LsvPVjR0ZSwzz1apAzvN9dlzEheX7ICJBBtuA6G3LQpzW5hOA2hzCTMjJPJ8LbqF6dsV6DoBQzgul0sGIcGOYl7OyQdXfZ57relSQageu+ipAdTTJ25AsRTAoub8ONGcLmqrAmRLKBP1dfwhYB4N7knNnulqQxA+Uk1ihz0=";

    #[test]
    fn test_key_tag() {
        let key = BASE64.decode(ROOT_KSK.as_bytes()).unwrap();
        let dnskey = DNSKEY::new(257, 3, 8, key);
        assert_eq!(dnskey.key_tag(), 19036);
        assert!(dnskey.is_zone_key());
        assert!(dnskey.is_secure_entry_point());
    }

    #[test]
    fn test_zone_signing_key_flags() {
        let zsk = DNSKEY::new(256, 3, 13, vec![1, 2, 3, 4]);
        assert!(zsk.is_zone_key());
        assert!(!zsk.is_secure_entry_point());
    }

    #[test]
    fn test_dnskey_serde_base64() {
        let dnskey = DNSKEY::new(256, 3, 13, vec![0xde, 0xad, 0xbe, 0xef]);
        let json = serde_json::to_value(&dnskey).unwrap();
        assert_eq!(json["key"], "3q2+7w==");
        let back: DNSKEY = serde_json::from_value(json).unwrap();
        assert_eq!(back, dnskey);
    }

    #[test]
    fn test_rrsig_display_timestamps() {
        let rrsig = RRSIG::new(
            Type::Known(RecordType::A),
            13,
            2,
            3600,
            1_700_000_000,
            1_699_000_000,
            12345,
            Name::from_str("example.com").unwrap(),
            vec![1, 2, 3],
        );
        let text = rrsig.to_string();
        assert!(text.starts_with("A 13 2 3600 20231114221320 20231103082640 12345 example.com."));
    }

    #[test]
    fn test_rrsig_wire() {
        let rrsig = RRSIG::new(
            Type::Known(RecordType::MX),
            8,
            2,
            300,
            10,
            5,
            7,
            Name::from_str("example.com").unwrap(),
            vec![9; 8],
        );
        let mut writer = WireWriter::new(64);
        rrsig.encode(&mut writer).unwrap();
        let bytes = writer.freeze();
        assert_eq!(bytes.len(), 18 + 13 + 8);
        let decoded = RRSIG::decode(&mut WireReader::new(&bytes)).unwrap();
        assert_eq!(decoded, rrsig);
    }
}
