//! DNS question section.

use crate::class::{Class, RecordClass};
use crate::error::Result;
use crate::name::{read_name, Name};
use crate::rtype::{RecordType, Type};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A DNS question: `(name, type, class)`.
///
/// ```text
/// /                     QNAME                     /
/// |                     QTYPE                     |
/// |                     QCLASS                    |
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    /// The name being asked about.
    pub qname: Name,
    /// The requested type.
    pub qtype: Type,
    /// The requested class.
    pub qclass: Class,
}

impl Question {
    /// Creates a question for a named type and class.
    #[inline]
    pub fn new(qname: Name, qtype: RecordType, qclass: RecordClass) -> Self {
        Self {
            qname,
            qtype: Type::Known(qtype),
            qclass: Class::Known(qclass),
        }
    }

    /// Returns true if this question asks for `t`.
    #[inline]
    pub fn is_type(&self, t: RecordType) -> bool {
        self.qtype.is(t)
    }

    /// Reads a question at the reader's position.
    pub fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let qname = read_name(reader)?;
        let qtype = Type::from_u16(reader.read_u16()?);
        let qclass = Class::from_u16(reader.read_u16()?);
        Ok(Self {
            qname,
            qtype,
            qclass,
        })
    }

    /// Writes the question, uncompressed.
    pub fn write(&self, writer: &mut WireWriter) {
        self.qname.write_to(writer);
        writer.write_u16(self.qtype.to_u16());
        writer.write_u16(self.qclass.to_u16());
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ";{}\t\t{}\t{}", self.qname, self.qclass, self.qtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_question_wire() {
        let question = Question::new(
            Name::from_str("example.com").unwrap(),
            RecordType::MX,
            RecordClass::IN,
        );
        let mut writer = WireWriter::new(32);
        question.write(&mut writer);
        assert_eq!(
            writer.as_slice(),
            b"\x07example\x03com\x00\x00\x0f\x00\x01".as_slice()
        );

        let bytes = writer.freeze();
        let parsed = Question::read(&mut WireReader::new(&bytes)).unwrap();
        assert_eq!(parsed, question);
    }

    #[test]
    fn test_unknown_type_kept() {
        let data = b"\x00\x0f\xa0\x00\xfe";
        let question = Question::read(&mut WireReader::new(data)).unwrap();
        assert!(question.qname.is_root());
        assert_eq!(question.qtype, Type::Unknown(4000));
        assert_eq!(question.qclass, Class::Unknown(254));
    }

    #[test]
    fn test_truncated_question() {
        let data = b"\x00\x00\x01\x00";
        assert!(Question::read(&mut WireReader::new(data))
            .unwrap_err()
            .is_malformed());
    }
}
