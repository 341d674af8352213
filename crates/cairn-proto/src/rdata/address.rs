//! Address records (A, AAAA).

use super::RDataType;
use crate::error::{Error, Result};
use crate::rtype::RecordType;
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

fn read_octets<const N: usize>(reader: &mut WireReader<'_>, rtype: &str) -> Result<[u8; N]> {
    let actual = reader.remaining();
    if actual != N {
        return Err(Error::RDataLengthMismatch {
            rtype: rtype.to_string(),
            expected: N,
            actual,
        });
    }
    let mut octets = [0u8; N];
    octets.copy_from_slice(reader.read_bytes(N)?);
    Ok(octets)
}

/// IPv4 address (RFC 1035). RDATA is the four address octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct A {
    address: Ipv4Addr,
}

impl A {
    /// Creates a new A record.
    #[inline]
    pub const fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }

    /// Returns the IPv4 address.
    #[inline]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }
}

impl RDataType for A {
    const TYPE: RecordType = RecordType::A;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        read_octets::<4>(reader, "A").map(|o| Self::new(Ipv4Addr::from(o)))
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.address.octets());
        Ok(())
    }
}

impl From<Ipv4Addr> for A {
    fn from(address: Ipv4Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// IPv6 address (RFC 3596). RDATA is the sixteen address octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AAAA {
    address: Ipv6Addr,
}

impl AAAA {
    /// Creates a new AAAA record.
    #[inline]
    pub const fn new(address: Ipv6Addr) -> Self {
        Self { address }
    }

    /// Returns the IPv6 address.
    #[inline]
    pub const fn address(&self) -> Ipv6Addr {
        self.address
    }
}

impl RDataType for AAAA {
    const TYPE: RecordType = RecordType::AAAA;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        read_octets::<16>(reader, "AAAA").map(|o| Self::new(Ipv6Addr::from(o)))
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.address.octets());
        Ok(())
    }
}

impl From<Ipv6Addr> for AAAA {
    fn from(address: Ipv6Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}
