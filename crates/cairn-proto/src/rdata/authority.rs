//! Start of authority (SOA).

use super::RDataType;
use crate::error::Result;
use crate::name::{read_name, Name};
use crate::rtype::RecordType;
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SOA record (RFC 1035 §3.3.13).
///
/// ```text
/// /                     MNAME                     /
/// /                     RNAME                     /
/// |                    SERIAL                     |
/// |                    REFRESH                    |
/// |                     RETRY                     |
/// |                    EXPIRE                     |
/// |                    MINIMUM                    |
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SOA {
    /// Primary name server for the zone.
    pub primary: Name,
    /// Mailbox of the responsible person, `@` written as `.`.
    pub admin: Name,
    /// Zone serial, `YYYYMMDDnn` by convention.
    pub serial: u32,
    /// Secondary refresh interval in seconds.
    pub refresh: u32,
    /// Retry interval after a failed refresh, in seconds.
    pub retry: u32,
    /// How long a secondary may serve without a refresh, in seconds.
    pub expiration: u32,
    /// Negative caching TTL in seconds.
    pub minimum: u32,
}

impl RDataType for SOA {
    const TYPE: RecordType = RecordType::SOA;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            primary: read_name(reader)?,
            admin: read_name(reader)?,
            serial: reader.read_u32()?,
            refresh: reader.read_u32()?,
            retry: reader.read_u32()?,
            expiration: reader.read_u32()?,
            minimum: reader.read_u32()?,
        })
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        self.primary.write_to(writer);
        self.admin.write_to(writer);
        writer.write_u32(self.serial);
        writer.write_u32(self.refresh);
        writer.write_u32(self.retry);
        writer.write_u32(self.expiration);
        writer.write_u32(self.minimum);
        Ok(())
    }
}

impl fmt::Display for SOA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.primary,
            self.admin,
            self.serial,
            self.refresh,
            self.retry,
            self.expiration,
            self.minimum
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample() -> SOA {
        SOA {
            primary: Name::from_str("ns.example.com").unwrap(),
            admin: Name::from_str("hostmaster.example.com").unwrap(),
            serial: 2_024_010_100,
            refresh: 3600,
            retry: 1800,
            expiration: 604_800,
            minimum: 3600,
        }
    }

    #[test]
    fn test_soa_field_order() {
        let soa = sample();
        let mut writer = WireWriter::new(64);
        soa.encode(&mut writer).unwrap();
        let bytes = writer.freeze();
        let names_len = soa.primary.wire_len() + soa.admin.wire_len();
        assert_eq!(bytes.len(), names_len + 20);
        assert_eq!(&bytes[names_len..names_len + 4], &2_024_010_100u32.to_be_bytes());
        assert_eq!(&bytes[bytes.len() - 4..], &3600u32.to_be_bytes());

        let decoded = SOA::decode(&mut WireReader::new(&bytes)).unwrap();
        assert_eq!(decoded, soa);
    }

    #[test]
    fn test_soa_display() {
        assert_eq!(
            sample().to_string(),
            "ns.example.com. hostmaster.example.com. 2024010100 3600 1800 604800 3600"
        );
    }
}
