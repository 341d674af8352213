//! Service records (SRV, CAA).

use super::RDataType;
use crate::error::{Error, Result};
use crate::name::{read_name, Name};
use crate::rtype::RecordType;
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SRV record - service locator (RFC 2782).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SRV {
    priority: u16,
    weight: u16,
    port: u16,
    target: Name,
}

impl SRV {
    /// Creates a new SRV record.
    pub fn new(priority: u16, weight: u16, port: u16, target: Name) -> Self {
        Self {
            priority,
            weight,
            port,
            target,
        }
    }

    /// Returns the priority (lower is preferred).
    #[inline]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    /// Returns the weight among equal priorities.
    #[inline]
    pub const fn weight(&self) -> u16 {
        self.weight
    }

    /// Returns the service port.
    #[inline]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the target host.
    #[inline]
    pub fn target(&self) -> &Name {
        &self.target
    }
}

impl RDataType for SRV {
    const TYPE: RecordType = RecordType::SRV;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        let priority = reader.read_u16()?;
        let weight = reader.read_u16()?;
        let port = reader.read_u16()?;
        let target = read_name(reader)?;
        Ok(Self::new(priority, weight, port, target))
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u16(self.priority);
        writer.write_u16(self.weight);
        writer.write_u16(self.port);
        self.target.write_to(writer);
        Ok(())
    }
}

impl fmt::Display for SRV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.priority, self.weight, self.port, self.target
        )
    }
}

/// CAA record - certification authority authorization (RFC 8659).
///
/// `flags`, a length-prefixed `tag`, then the `value` running to the end of
/// the RDATA.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CAA {
    flags: u8,
    tag: String,
    value: String,
}

impl CAA {
    /// The issuer-critical flag bit.
    pub const ISSUER_CRITICAL: u8 = 0x80;

    /// Creates a new CAA record.
    pub fn new(flags: u8, tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            flags,
            tag: tag.into(),
            value: value.into(),
        }
    }

    /// Returns the raw flags octet.
    #[inline]
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns true if the issuer-critical bit is set.
    #[inline]
    pub const fn is_critical(&self) -> bool {
        self.flags & Self::ISSUER_CRITICAL != 0
    }

    /// Returns the property tag, e.g. `issue`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the property value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl RDataType for CAA {
    const TYPE: RecordType = RecordType::CAA;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        let flags = reader.read_u8()?;
        let tag_len = usize::from(reader.read_u8()?);
        let tag = reader.read_bytes(tag_len)?;
        let value = reader.read_rest()?;
        Ok(Self {
            flags,
            tag: String::from_utf8_lossy(tag).into_owned(),
            value: String::from_utf8_lossy(value).into_owned(),
        })
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        let tag_len = u8::try_from(self.tag.len()).map_err(|_| {
            Error::invalid_rdata("CAA", format!("tag is {} bytes, limit 255", self.tag.len()))
        })?;
        writer.write_u8(self.flags);
        writer.write_u8(tag_len);
        writer.write_bytes(self.tag.as_bytes());
        writer.write_bytes(self.value.as_bytes());
        Ok(())
    }
}

impl fmt::Display for CAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.flags, self.tag, self.value)
    }
}
