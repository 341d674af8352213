//! EDNS Client Subnet option (RFC 7871).
//!
//! ```text
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! |                            FAMILY                             |
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! |     SOURCE PREFIX-LENGTH      |     SCOPE PREFIX-LENGTH       |
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! |                           ADDRESS...                          /
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! ```
//!
//! Only `ceil(source_prefix / 8)` address octets are carried.

use crate::error::{Error, Result};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Option code of Client Subnet.
pub const CLIENT_SUBNET_CODE: u16 = 8;

/// Address family numbers used by the option.
const FAMILY_IPV4: u16 = 1;
const FAMILY_IPV6: u16 = 2;

/// Client subnet information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientSubnet {
    /// Client address. Bits past `source_prefix` are ignored on encode.
    pub address: IpAddr,
    /// Number of significant address bits supplied by the client.
    pub source_prefix: u8,
    /// Number of bits the answer is valid for (set by servers).
    pub scope_prefix: u8,
}

impl ClientSubnet {
    /// Creates a client subnet for `address/source_prefix`.
    pub fn new(address: IpAddr, source_prefix: u8) -> Self {
        Self {
            address,
            source_prefix,
            scope_prefix: 0,
        }
    }

    /// Returns the family number (1 for IPv4, 2 for IPv6).
    pub const fn family(&self) -> u16 {
        match self.address {
            IpAddr::V4(_) => FAMILY_IPV4,
            IpAddr::V6(_) => FAMILY_IPV6,
        }
    }

    const fn width(&self) -> u8 {
        match self.address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }

    fn octets(&self) -> Vec<u8> {
        match self.address {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        }
    }

    /// Writes the option payload (without code and length).
    pub fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        if self.source_prefix > self.width() {
            return Err(Error::invalid_edns_option(
                CLIENT_SUBNET_CODE,
                format!(
                    "source prefix /{} exceeds the {}-bit address",
                    self.source_prefix,
                    self.width()
                ),
            ));
        }

        let prefix = usize::from(self.source_prefix);
        let mut octets = self.octets();
        octets.truncate(prefix.div_ceil(8));
        if prefix % 8 != 0 {
            if let Some(last) = octets.last_mut() {
                *last &= 0xFFu8 << (8 - prefix % 8);
            }
        }

        writer.write_u16(self.family());
        writer.write_u8(self.source_prefix);
        writer.write_u8(self.scope_prefix);
        writer.write_bytes(&octets);
        Ok(())
    }

    /// Reads the option payload.
    ///
    /// Returns `Ok(None)` for a family other than IPv4 and IPv6 so the
    /// caller can keep the raw option instead.
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Option<Self>> {
        let family = reader.read_u16()?;
        let source_prefix = reader.read_u8()?;
        let scope_prefix = reader.read_u8()?;
        let width: usize = match family {
            FAMILY_IPV4 => 4,
            FAMILY_IPV6 => 16,
            _ => return Ok(None),
        };
        if usize::from(source_prefix) > width * 8 {
            return Err(Error::invalid_edns_option(
                CLIENT_SUBNET_CODE,
                format!("source prefix /{source_prefix} exceeds the address width"),
            ));
        }

        // Exactly the octets the source prefix covers (RFC 7871 §6).
        let carried = reader.read_rest()?;
        let expected = usize::from(source_prefix).div_ceil(8);
        if carried.len() != expected {
            return Err(Error::invalid_edns_option(
                CLIENT_SUBNET_CODE,
                format!(
                    "{} address octets for source prefix /{source_prefix}, expected {expected}",
                    carried.len()
                ),
            ));
        }

        // Zero-pad back to the full address.
        let mut full = [0u8; 16];
        full[..carried.len()].copy_from_slice(carried);
        let address = if width == 4 {
            IpAddr::V4(Ipv4Addr::new(full[0], full[1], full[2], full[3]))
        } else {
            IpAddr::V6(Ipv6Addr::from(full))
        };

        Ok(Some(Self {
            address,
            source_prefix,
            scope_prefix,
        }))
    }
}

impl fmt::Display for ClientSubnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.address, self.source_prefix, self.scope_prefix
        )
    }
}
