//! DNS message header.
//!
//! ```text
//!                                 1  1  1  1  1  1
//!   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                      ID                       |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                    QDCOUNT                    |
//! |                    ANCOUNT                    |
//! |                    NSCOUNT                    |
//! |                    ARCOUNT                    |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! ```
//!
//! The flags word is read and written field by field through the bit
//! cursors, so every field is checked against its width on the way out.

use crate::error::{Error, Result};
use crate::opcode::OpCode;
use crate::rcode::ResponseCode;
use crate::wire::{WireReader, WireWriter};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the DNS header in bytes.
pub const HEADER_SIZE: usize = 12;

bitflags! {
    /// Single-bit header flags.
    ///
    /// The bit values match their position in the flags word.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct HeaderFlags: u16 {
        /// Message is a response.
        const QR = 0x8000;
        /// Authoritative answer.
        const AA = 0x0400;
        /// Truncated.
        const TC = 0x0200;
        /// Recursion desired.
        const RD = 0x0100;
        /// Recursion available.
        const RA = 0x0080;
    }
}

/// Section sizes as carried on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounts {
    /// Questions.
    pub questions: u16,
    /// Answer records.
    pub answers: u16,
    /// Authority records.
    pub authorities: u16,
    /// Additional records.
    pub additionals: u16,
}

/// DNS message header, minus the section counts.
///
/// Counts live with the sections themselves in [`Message`](crate::Message)
/// and are recomputed on every encode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Message identifier.
    pub id: u16,
    /// Single-bit flags.
    pub flags: HeaderFlags,
    /// Operation code.
    pub opcode: OpCode,
    /// The three reserved bits, carried through untouched.
    pub z: u8,
    /// Response code.
    pub rcode: ResponseCode,
}

impl Header {
    /// Creates a query header with the given id.
    #[inline]
    pub const fn new(id: u16) -> Self {
        Self {
            id,
            flags: HeaderFlags::empty(),
            opcode: OpCode::Query,
            z: 0,
            rcode: ResponseCode::NoError,
        }
    }

    /// Returns true if QR is set.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.flags.contains(HeaderFlags::QR)
    }

    /// Returns true if AA is set.
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.flags.contains(HeaderFlags::AA)
    }

    /// Returns true if TC is set.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.flags.contains(HeaderFlags::TC)
    }

    /// Sets or clears a flag.
    #[inline]
    pub fn set_flag(&mut self, flag: HeaderFlags, on: bool) {
        self.flags.set(flag, on);
    }

    /// Reads the 12 header bytes.
    ///
    /// Unassigned opcode and rcode values are kept as `Unknown`.
    pub fn read(reader: &mut WireReader<'_>) -> Result<(Self, SectionCounts)> {
        if reader.remaining() < HEADER_SIZE {
            return Err(Error::buffer_too_short(HEADER_SIZE, reader.remaining()));
        }

        let id = reader.read_u16()?;
        let mut flags = HeaderFlags::empty();
        flags.set(HeaderFlags::QR, reader.read_flag()?);
        let opcode = OpCode::from_u8(reader.read_bits(4)? as u8);
        flags.set(HeaderFlags::AA, reader.read_flag()?);
        flags.set(HeaderFlags::TC, reader.read_flag()?);
        flags.set(HeaderFlags::RD, reader.read_flag()?);
        flags.set(HeaderFlags::RA, reader.read_flag()?);
        let z = reader.read_bits(3)? as u8;
        let rcode = ResponseCode::from_header(reader.read_bits(4)? as u8);

        let counts = SectionCounts {
            questions: reader.read_u16()?,
            answers: reader.read_u16()?,
            authorities: reader.read_u16()?,
            additionals: reader.read_u16()?,
        };

        Ok((
            Self {
                id,
                flags,
                opcode,
                z,
                rcode,
            },
            counts,
        ))
    }

    /// Writes the header with the given counts.
    ///
    /// Only the low four bits of the rcode go here; the rest belongs in OPT.
    pub fn write(&self, writer: &mut WireWriter, counts: SectionCounts) -> Result<()> {
        writer.write_u16(self.id);
        writer.write_flag(self.flags.contains(HeaderFlags::QR));
        writer.write_bits(u64::from(self.opcode.to_u8()), 4)?;
        writer.write_flag(self.flags.contains(HeaderFlags::AA));
        writer.write_flag(self.flags.contains(HeaderFlags::TC));
        writer.write_flag(self.flags.contains(HeaderFlags::RD));
        writer.write_flag(self.flags.contains(HeaderFlags::RA));
        writer.write_bits(u64::from(self.z), 3)?;
        writer.write_bits(u64::from(self.rcode.header_rcode()), 4)?;
        writer.write_u16(counts.questions);
        writer.write_u16(counts.answers);
        writer.write_u16(counts.authorities);
        writer.write_u16(counts.additionals);
        Ok(())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "opcode: {}, status: {}, id: {}",
            self.opcode, self.rcode, self.id
        )?;
        f.write_str("\n;; flags:")?;
        for (name, flag) in [
            ("qr", HeaderFlags::QR),
            ("aa", HeaderFlags::AA),
            ("tc", HeaderFlags::TC),
            ("rd", HeaderFlags::RD),
            ("ra", HeaderFlags::RA),
        ] {
            if self.flags.contains(flag) {
                write!(f, " {name}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bit_layout() {
        let mut header = Header::new(0x1234);
        header.flags = HeaderFlags::QR | HeaderFlags::AA | HeaderFlags::RD;
        header.opcode = OpCode::Notify;
        header.rcode = ResponseCode::NXDomain;

        let mut writer = WireWriter::new(HEADER_SIZE);
        let counts = SectionCounts {
            questions: 1,
            answers: 2,
            authorities: 0,
            additionals: 1,
        };
        header.write(&mut writer, counts).unwrap();
        assert_eq!(
            writer.as_slice(),
            &[0x12, 0x34, 0xA5, 0x03, 0, 1, 0, 2, 0, 0, 0, 1]
        );

        let bytes = writer.freeze();
        let mut reader = WireReader::new(&bytes);
        let (parsed, parsed_counts) = Header::read(&mut reader).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed_counts, counts);
    }

    #[test]
    fn test_reserved_bits_carried() {
        let data = [0, 1, 0x00, 0x70, 0, 0, 0, 0, 0, 0, 0, 0];
        let (header, _) = Header::read(&mut WireReader::new(&data)).unwrap();
        assert_eq!(header.z, 0b111);
    }

    #[test]
    fn test_z_field_overflow() {
        let mut header = Header::new(1);
        header.z = 8;
        let mut writer = WireWriter::new(HEADER_SIZE);
        assert_eq!(
            header.write(&mut writer, SectionCounts::default()),
            Err(Error::FieldOverflow { value: 8, width: 3 })
        );
    }

    #[test]
    fn test_unassigned_opcode_and_rcode_kept() {
        // opcode 3, rcode 12
        let data = [0, 1, 0x98, 0x0C, 0, 1, 0, 0, 0, 0, 0, 0];
        let (header, counts) = Header::read(&mut WireReader::new(&data)).unwrap();
        assert!(header.is_response());
        assert_eq!(header.opcode, OpCode::Unknown(3));
        assert_eq!(header.rcode, ResponseCode::Unknown(12));
        assert_eq!(counts.questions, 1);

        let mut writer = WireWriter::new(HEADER_SIZE);
        header.write(&mut writer, counts).unwrap();
        assert_eq!(writer.into_bytes(), data);
    }

    #[test]
    fn test_header_too_short() {
        let result = Header::read(&mut WireReader::new(&[0; 10]));
        assert!(matches!(result, Err(Error::BufferTooShort { .. })));
    }
}
