//! DNS resource records.
//!
//! A resource record (RR) pairs an owner name with typed data. The record
//! type is never stored separately: it is derived from the [`RData`]
//! variant, so the two cannot disagree.

use crate::class::Class;
use crate::error::{Error, Result};
use crate::name::{read_name, Name};
use crate::rdata::RData;
use crate::rtype::{RecordType, Type};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A DNS resource record.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                      NAME                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     CLASS                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TTL                      |
/// |                                               |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                   RDLENGTH                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                     RDATA                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Owner name.
    pub name: Name,
    /// Record class. OPT uses it for the UDP payload size.
    pub class: Class,
    /// Time to live in seconds.
    pub ttl: u32,
    /// Record data; also determines the type.
    pub rdata: RData,
}

impl ResourceRecord {
    /// Creates an IN-class record.
    pub fn new(name: Name, ttl: u32, rdata: RData) -> Self {
        Self {
            name,
            class: Class::IN,
            ttl,
            rdata,
        }
    }

    /// Returns the record type derived from the RDATA.
    #[inline]
    pub fn rtype(&self) -> Type {
        self.rdata.rtype()
    }

    /// Returns true if this record is of type `t`.
    #[inline]
    pub fn is_type(&self, t: RecordType) -> bool {
        self.rtype().is(t)
    }

    /// Returns a copy with a different TTL.
    #[must_use]
    pub fn with_ttl(&self, ttl: u32) -> Self {
        Self {
            ttl,
            ..self.clone()
        }
    }

    /// Reads one record.
    ///
    /// A malformed owner name or fixed field is an error: the start of the
    /// next record is unknown. A malformed RDATA is not. The reader is moved
    /// past the RDLENGTH window and `Ok(None)` is returned so the caller can
    /// carry on with the next record.
    pub fn read(reader: &mut WireReader<'_>) -> Result<Option<Self>> {
        let name = read_name(reader)?;
        let rtype = Type::from_u16(reader.read_u16()?);
        let class = Class::from_u16(reader.read_u16()?);
        let ttl = reader.read_u32()?;
        let rdlength = usize::from(reader.read_u16()?);

        let rdata_start = reader.position();
        let mut window = reader.limited(rdlength)?;
        reader.seek(rdata_start + rdlength)?;

        match RData::decode(rtype, &mut window) {
            Ok(rdata) => Ok(Some(Self {
                name,
                class,
                ttl,
                rdata,
            })),
            Err(error) => {
                debug!(
                    owner = %name,
                    rtype = %rtype,
                    offset = rdata_start,
                    %error,
                    "skipping record with malformed rdata"
                );
                Ok(None)
            }
        }
    }

    /// Appends the record.
    ///
    /// RDLENGTH is written as a placeholder and back-filled once the RDATA
    /// has been encoded.
    pub fn write(&self, writer: &mut WireWriter) -> Result<()> {
        self.name.write_to(writer);
        writer.write_u16(self.rtype().to_u16());
        writer.write_u16(self.class.to_u16());
        writer.write_u32(self.ttl);

        let len_at = writer.len();
        writer.write_u16(0);
        self.rdata.encode(writer)?;

        let length = writer.len() - len_at - 2;
        let rdlength = u16::try_from(length).map_err(|_| Error::RDataOverflow {
            rtype: self.rtype().to_string(),
            length,
        })?;
        writer.patch_u16(len_at, rdlength)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name,
            self.ttl,
            self.class,
            self.rtype(),
            self.rdata
        )
    }
}
