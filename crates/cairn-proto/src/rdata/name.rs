//! Records whose RDATA is built around a domain name (NS, CNAME, PTR, MX).

use super::RDataType;
use crate::error::Result;
use crate::name::{read_name, Name};
use crate::rtype::RecordType;
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! single_name_rdata {
    ($(#[$doc:meta])* $ty:ident, $field:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $ty {
            $field: Name,
        }

        impl $ty {
            /// Creates the record.
            #[inline]
            pub fn new($field: Name) -> Self {
                Self { $field }
            }

            /// Returns the target name.
            #[inline]
            pub fn $field(&self) -> &Name {
                &self.$field
            }
        }

        impl RDataType for $ty {
            const TYPE: RecordType = RecordType::$ty;

            fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
                read_name(reader).map(Self::new)
            }

            fn encode(&self, writer: &mut WireWriter) -> Result<()> {
                self.$field.write_to(writer);
                Ok(())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.$field)
            }
        }
    };
}

single_name_rdata!(
    /// Authoritative name server (RFC 1035).
    NS,
    ns
);

single_name_rdata!(
    /// Canonical name for an alias (RFC 1035).
    CNAME,
    domain
);

single_name_rdata!(
    /// Domain name pointer, used for reverse lookups (RFC 1035).
    PTR,
    domain
);

/// Mail exchange (RFC 1035): a 16-bit preference, then the exchange host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MX {
    exchange: Name,
    priority: u16,
}

impl MX {
    /// Creates a new MX record.
    #[inline]
    pub fn new(priority: u16, exchange: Name) -> Self {
        Self { exchange, priority }
    }

    /// Returns the preference; lower is preferred.
    #[inline]
    pub const fn priority(&self) -> u16 {
        self.priority
    }

    /// Returns the mail exchange host.
    #[inline]
    pub fn exchange(&self) -> &Name {
        &self.exchange
    }
}

impl RDataType for MX {
    const TYPE: RecordType = RecordType::MX;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        let priority = reader.read_u16()?;
        let exchange = read_name(reader)?;
        Ok(Self::new(priority, exchange))
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u16(self.priority);
        self.exchange.write_to(writer);
        Ok(())
    }
}

impl fmt::Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.priority, self.exchange)
    }
}
