//! Reading names from wire format, following compression pointers
//! (RFC 1035 §4.1.4).

use super::{Name, WireBuf};
use crate::error::{Error, Result};
use crate::wire::WireReader;
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};

/// Upper bound on pointer hops in a single name.
pub const MAX_COMPRESSION_JUMPS: usize = 128;

/// Reads a possibly compressed name at the reader's position.
///
/// Every pointer must target an offset strictly before the label run it
/// appears in, so loops and forward references are rejected. On success the
/// reader is left just past the name as it appears in place: after the root
/// byte, or after the first pointer.
pub fn read_name(reader: &mut WireReader<'_>) -> Result<Name> {
    let message = reader.message();
    let mut cursor = reader.clone();
    let mut segment_start = cursor.position();
    let mut resume = None;
    let mut jumps = 0;

    let mut wire = WireBuf::new();
    let mut label_count = 0u8;

    loop {
        let offset = cursor.position();
        let len_byte = cursor.read_u8()?;

        match len_byte & 0xC0 {
            0xC0 => {
                let low = cursor.read_u8()?;
                let target = usize::from(u16::from_be_bytes([len_byte & 0x3F, low]));
                if target >= segment_start {
                    return Err(Error::InvalidCompressionPointer { offset, target });
                }
                jumps += 1;
                if jumps > MAX_COMPRESSION_JUMPS {
                    return Err(Error::TooManyCompressionJumps {
                        max_jumps: MAX_COMPRESSION_JUMPS,
                    });
                }
                if resume.is_none() {
                    resume = Some(cursor.position());
                }
                segment_start = target;
                cursor = WireReader::at(message, target);
            }
            0x00 => {
                let len = usize::from(len_byte);
                if len == 0 {
                    wire.push(0);
                    break;
                }
                debug_assert!(len <= MAX_LABEL_LENGTH);
                let label = cursor.read_bytes(len)?;
                // The root byte still has to fit after this label.
                let length = wire.len() + 1 + len + 1;
                if length > MAX_NAME_LENGTH {
                    return Err(Error::name_too_long(length));
                }
                wire.push(len_byte);
                wire.extend_from_slice(label);
                label_count += 1;
            }
            bits => {
                return Err(Error::InvalidLabelType {
                    bits: bits >> 6,
                    offset,
                })
            }
        }
    }

    reader.seek(resume.unwrap_or_else(|| cursor.position()))?;
    Ok(Name::from_validated(wire, label_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_read_uncompressed() {
        let data = b"\x03www\x07example\x03com\x00\xff";
        let mut reader = WireReader::new(data);
        let name = read_name(&mut reader).unwrap();
        assert_eq!(name, Name::from_str("www.example.com").unwrap());
        assert_eq!(reader.position(), 17);
        assert_eq!(reader.read_u8().unwrap(), 0xff);
    }

    #[test]
    fn test_read_compressed() {
        // example.com at 0, then "www" + pointer to 0 at 13.
        let mut data = b"\x07example\x03com\x00".to_vec();
        data.extend_from_slice(b"\x03www\xc0\x00\xaa");
        let mut reader = WireReader::at(&data, 13);
        let name = read_name(&mut reader).unwrap();
        assert_eq!(name.to_string(), "www.example.com.");
        // Resumes right after the two pointer bytes.
        assert_eq!(reader.position(), 19);
    }

    #[test]
    fn test_chained_pointers() {
        // 0: com, 5: example -> 0, 15: www -> 5
        let mut data = b"\x03com\x00".to_vec();
        data.extend_from_slice(b"\x07example\xc0\x00");
        data.extend_from_slice(b"\x03www\xc0\x05");
        let mut reader = WireReader::at(&data, 15);
        let name = read_name(&mut reader).unwrap();
        assert_eq!(name.to_string(), "www.example.com.");
        assert_eq!(name.label_count(), 3);
    }

    #[test]
    fn test_reject_forward_pointer() {
        let data = b"\xc0\x02\x03com\x00";
        let mut reader = WireReader::new(data);
        assert_eq!(
            read_name(&mut reader).unwrap_err(),
            Error::InvalidCompressionPointer {
                offset: 0,
                target: 2
            }
        );
    }

    #[test]
    fn test_reject_self_loop() {
        let data = b"\x03abc\xc0\x00";
        let mut reader = WireReader::new(data);
        assert!(matches!(
            read_name(&mut reader),
            Err(Error::InvalidCompressionPointer { .. })
        ));
    }

    #[test]
    fn test_reject_reserved_label_type() {
        let data = b"\x41abc\x00";
        let mut reader = WireReader::new(data);
        assert_eq!(
            read_name(&mut reader).unwrap_err(),
            Error::InvalidLabelType { bits: 1, offset: 0 }
        );
    }

    #[test]
    fn test_truncated_name() {
        let data = b"\x07exam";
        let mut reader = WireReader::new(data);
        assert!(read_name(&mut reader).unwrap_err().is_malformed());
    }

    #[test]
    fn test_name_length_limit() {
        let mut data = Vec::new();
        for _ in 0..4 {
            data.push(63);
            data.extend_from_slice(&[b'a'; 63]);
        }
        data.push(0);
        let mut reader = WireReader::new(&data);
        assert!(matches!(
            read_name(&mut reader),
            Err(Error::NameTooLong { .. })
        ));
    }
}
