//! Opaque RDATA for types without a typed representation.

use crate::error::Result;
use crate::wire::{WireReader, WireWriter};
use data_encoding::HEXUPPER;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RDATA kept as raw bytes, exactly RDLENGTH long.
///
/// Rendered in the RFC 3597 generic form: `\# <length> <hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unknown {
    type_code: u16,
    #[serde(with = "super::hex_bytes")]
    data: Vec<u8>,
}

impl Unknown {
    /// Creates opaque RDATA for `type_code`.
    pub fn new(type_code: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            type_code,
            data: data.into(),
        }
    }

    /// Returns the record type code.
    #[inline]
    pub const fn type_code(&self) -> u16 {
        self.type_code
    }

    /// Returns the raw RDATA.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn decode(type_code: u16, reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self::new(type_code, reader.read_rest()?))
    }

    pub(crate) fn encode(&self, writer: &mut WireWriter) {
        writer.write_bytes(&self.data);
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\# {}", self.data.len())?;
        if !self.data.is_empty() {
            write!(f, " {}", HEXUPPER.encode(&self.data))?;
        }
        Ok(())
    }
}
