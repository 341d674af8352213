//! EDNS(0) support (RFC 6891).
//!
//! The OPT pseudo-record repurposes the record header: CLASS carries the
//! requestor's UDP payload size and TTL carries the extended rcode, the
//! version and the DO bit. Its RDATA ([`Opt`]) is a list of
//! `(code, length, data)` options.

mod subnet;

pub use subnet::{ClientSubnet, CLIENT_SUBNET_CODE};

use crate::class::Class;
use crate::error::{Error, Result};
use crate::name::Name;
use crate::rdata::{RData, RDataType};
use crate::record::ResourceRecord;
use crate::rtype::RecordType;
use crate::wire::{WireReader, WireWriter};
use data_encoding::HEXUPPER;
use serde::{Deserialize, Serialize};
use std::fmt;

/// DO bit inside the 16-bit flags half of the OPT TTL.
const DNSSEC_OK: u32 = 0x8000;

/// A single EDNS option, keyed by option code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdnsOption {
    /// Client Subnet (code 8).
    ClientSubnet(ClientSubnet),
    /// Any option this codec does not interpret, kept verbatim.
    Unknown {
        /// Option code.
        code: u16,
        /// Option payload.
        data: Vec<u8>,
    },
}

impl EdnsOption {
    /// Returns the option code.
    pub const fn code(&self) -> u16 {
        match self {
            Self::ClientSubnet(_) => CLIENT_SUBNET_CODE,
            Self::Unknown { code, .. } => *code,
        }
    }

    fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let code = reader.read_u16()?;
        let len = usize::from(reader.read_u16()?);
        let mut payload = reader.limited(len)?;
        let raw = reader.read_bytes(len)?;
        let decoded = match code {
            CLIENT_SUBNET_CODE => ClientSubnet::decode(&mut payload)?.map(Self::ClientSubnet),
            _ => None,
        };
        Ok(decoded.unwrap_or_else(|| Self::Unknown {
            code,
            data: raw.to_vec(),
        }))
    }

    fn write(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u16(self.code());
        let len_at = writer.len();
        writer.write_u16(0);
        match self {
            Self::ClientSubnet(subnet) => subnet.encode(writer)?,
            Self::Unknown { data, .. } => writer.write_bytes(data),
        }
        let len = writer.len() - len_at - 2;
        let len = u16::try_from(len)
            .map_err(|_| Error::invalid_edns_option(self.code(), "option longer than 65535"))?;
        writer.patch_u16(len_at, len)
    }
}

impl fmt::Display for EdnsOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientSubnet(subnet) => write!(f, "CLIENT-SUBNET: {subnet}"),
            Self::Unknown { code, data } => write!(f, "OPT{code}: {}", HEXUPPER.encode(data)),
        }
    }
}

/// OPT RDATA: the option list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opt {
    /// Options in wire order.
    #[serde(default)]
    pub options: Vec<EdnsOption>,
}

impl RDataType for Opt {
    const TYPE: RecordType = RecordType::OPT;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        let mut options = Vec::new();
        while !reader.is_empty() {
            options.push(EdnsOption::read(reader)?);
        }
        Ok(Self { options })
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        for option in &self.options {
            option.write(writer)?;
        }
        Ok(())
    }
}

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{option}")?;
        }
        Ok(())
    }
}

/// Typed view of an OPT pseudo-record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edns {
    /// Requestor's UDP payload size.
    pub udp_size: u16,
    /// Upper eight bits of the response code.
    pub extended_rcode: u8,
    /// EDNS version.
    pub version: u8,
    /// DNSSEC OK.
    pub dnssec_ok: bool,
    /// Options.
    pub options: Vec<EdnsOption>,
}

impl Edns {
    /// Creates version-0 EDNS with no options.
    pub fn new(udp_size: u16) -> Self {
        Self {
            udp_size,
            extended_rcode: 0,
            version: 0,
            dnssec_ok: false,
            options: Vec::new(),
        }
    }

    /// Reads EDNS from an OPT record, or `None` for any other record.
    pub fn from_record(record: &ResourceRecord) -> Option<Self> {
        let RData::OPT(opt) = &record.rdata else {
            return None;
        };
        Some(Self {
            udp_size: record.class.to_u16(),
            extended_rcode: (record.ttl >> 24) as u8,
            version: (record.ttl >> 16) as u8,
            dnssec_ok: record.ttl & DNSSEC_OK != 0,
            options: opt.options.clone(),
        })
    }

    /// Builds the OPT pseudo-record.
    pub fn to_record(&self) -> ResourceRecord {
        let ttl = u32::from(self.extended_rcode) << 24
            | u32::from(self.version) << 16
            | if self.dnssec_ok { DNSSEC_OK } else { 0 };
        ResourceRecord {
            name: Name::root(),
            class: Class::from_u16(self.udp_size),
            ttl,
            rdata: RData::OPT(Opt {
                options: self.options.clone(),
            }),
        }
    }

    /// Returns the client subnet option, if present.
    pub fn client_subnet(&self) -> Option<&ClientSubnet> {
        self.options.iter().find_map(|o| match o {
            EdnsOption::ClientSubnet(subnet) => Some(subnet),
            EdnsOption::Unknown { .. } => None,
        })
    }
}

impl fmt::Display for Edns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "; EDNS: version: {}, flags:{}; udp: {}",
            self.version,
            if self.dnssec_ok { " do" } else { "" },
            self.udp_size
        )?;
        for option in &self.options {
            write!(f, "\n; {option}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_packing() {
        let mut edns = Edns::new(1232);
        edns.extended_rcode = 1;
        edns.dnssec_ok = true;
        let record = edns.to_record();
        assert!(record.name.is_root());
        assert_eq!(record.class.to_u16(), 1232);
        assert_eq!(record.ttl, 0x0100_8000);
        assert_eq!(Edns::from_record(&record), Some(edns));
    }

    #[test]
    fn test_options_wire() {
        let opt = Opt {
            options: vec![
                EdnsOption::ClientSubnet(ClientSubnet::new("192.0.2.0".parse().unwrap(), 24)),
                EdnsOption::Unknown {
                    code: 10,
                    data: vec![1, 2, 3, 4, 5, 6, 7, 8],
                },
            ],
        };
        let mut writer = WireWriter::new(64);
        opt.encode(&mut writer).unwrap();
        let wire = writer.freeze();
        assert_eq!(&wire[..4], &[0, 8, 0, 7]);
        assert_eq!(&wire[11..15], &[0, 10, 0, 8]);

        let decoded = Opt::decode(&mut WireReader::new(&wire)).unwrap();
        assert_eq!(decoded, opt);
    }

    #[test]
    fn test_unknown_subnet_family_kept_raw() {
        let data = [0, 8, 0, 5, 0, 7, 8, 0, 0xAA];
        let opt = Opt::decode(&mut WireReader::new(&data)).unwrap();
        assert_eq!(
            opt.options,
            vec![EdnsOption::Unknown {
                code: 8,
                data: vec![0, 7, 8, 0, 0xAA]
            }]
        );
    }

    #[test]
    fn test_option_overruns_rdata() {
        let data = [0, 10, 0, 9, 1, 2];
        assert!(Opt::decode(&mut WireReader::new(&data)).is_err());
    }
}
