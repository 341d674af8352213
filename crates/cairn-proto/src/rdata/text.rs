//! Character-string records (TXT, and SPF which shares its layout).
//!
//! On the wire the RDATA is one or more `<length><bytes>` character-strings
//! of at most 255 bytes each. Decoding joins them into a single text value;
//! encoding splits every supplied string into 255-byte pieces.

use super::RDataType;
use crate::error::Result;
use crate::rtype::RecordType;
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Longest single character-string.
pub const MAX_CHARACTER_STRING: usize = 255;

/// Text record data.
///
/// Holds the strings as supplied. Two values are equal when their
/// concatenated text is equal, so `["ab", "c"]` equals `"abc"`.
#[derive(Debug, Clone, Default)]
pub struct TXT {
    data: Vec<String>,
}

impl TXT {
    /// Creates a record from a single string.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            data: vec![text.into()],
        }
    }

    /// Creates a record from an ordered list of strings.
    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data: strings.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the strings as supplied.
    pub fn strings(&self) -> &[String] {
        &self.data
    }

    /// Returns the concatenated text.
    pub fn text(&self) -> String {
        self.data.concat()
    }

    /// Iterates over the character-strings that go on the wire.
    fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        let pieces: Vec<&[u8]> = self
            .data
            .iter()
            .flat_map(|s| s.as_bytes().chunks(MAX_CHARACTER_STRING))
            .collect();
        // An empty value still needs one (empty) character-string.
        let empty: &[u8] = &[];
        let fallback = pieces.is_empty().then_some(empty);
        pieces.into_iter().chain(fallback)
    }

    pub(crate) fn decode_strings(reader: &mut WireReader<'_>) -> Result<Self> {
        let mut text = Vec::new();
        while !reader.is_empty() {
            let len = usize::from(reader.read_u8()?);
            text.extend_from_slice(reader.read_bytes(len)?);
        }
        Ok(Self::new(String::from_utf8_lossy(&text)))
    }

    pub(crate) fn encode_strings(&self, writer: &mut WireWriter) {
        for chunk in self.chunks() {
            writer.write_u8(chunk.len() as u8);
            writer.write_bytes(chunk);
        }
    }
}

impl RDataType for TXT {
    const TYPE: RecordType = RecordType::TXT;

    fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        Self::decode_strings(reader)
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<()> {
        self.encode_strings(writer);
        Ok(())
    }
}

impl PartialEq for TXT {
    fn eq(&self, other: &Self) -> bool {
        let lhs = self.data.iter().flat_map(|s| s.bytes());
        let rhs = other.data.iter().flat_map(|s| s.bytes());
        lhs.eq(rhs)
    }
}

impl Eq for TXT {}

impl Hash for TXT {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Byte by byte, so the split between strings does not matter.
        for byte in self.data.iter().flat_map(|s| s.bytes()) {
            state.write_u8(byte);
        }
        state.write_u8(0xff);
    }
}

impl From<&str> for TXT {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for chunk in self.chunks() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str("\"")?;
            for &byte in chunk {
                match byte {
                    b'"' | b'\\' => write!(f, "\\{}", byte as char)?,
                    0x20..=0x7E => write!(f, "{}", byte as char)?,
                    _ => write!(f, "\\{byte:03}")?,
                }
            }
            f.write_str("\"")?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

#[derive(Serialize, Deserialize)]
struct TxtShape {
    data: StringOrList,
}

impl Serialize for TXT {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let data = match self.data.as_slice() {
            [one] => StringOrList::One(one.clone()),
            many => StringOrList::Many(many.to_vec()),
        };
        TxtShape { data }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TXT {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match TxtShape::deserialize(deserializer)?.data {
            StringOrList::One(one) => Self::new(one),
            StringOrList::Many(many) => Self::from_strings(many),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(txt: &TXT) -> Vec<u8> {
        let mut writer = WireWriter::new(64);
        txt.encode(&mut writer).unwrap();
        writer.as_slice().to_vec()
    }

    #[test]
    fn test_decode_concatenates() {
        let data = b"\x05hello\x06 world";
        let txt = TXT::decode(&mut WireReader::new(data)).unwrap();
        assert_eq!(txt.text(), "hello world");
        assert_eq!(txt, TXT::from_strings(["hello", " world"]));
    }

    #[test]
    fn test_long_string_is_split() {
        let long = "x".repeat(300);
        let wire = encode(&TXT::new(long.clone()));
        assert_eq!(wire.len(), 302);
        assert_eq!(wire[0], 255);
        assert_eq!(wire[256], 45);

        let back = TXT::decode(&mut WireReader::new(&wire)).unwrap();
        assert_eq!(back.text(), long);
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(encode(&TXT::new("")), vec![0]);
        assert_eq!(encode(&TXT::from_strings(Vec::<String>::new())), vec![0]);
    }

    #[test]
    fn test_list_encoding() {
        let wire = encode(&TXT::from_strings(["v=spf1", "-all"]));
        assert_eq!(wire, b"\x06v=spf1\x04-all".to_vec());
    }

    #[test]
    fn test_overrun_is_error() {
        let data = b"\x09short";
        assert!(TXT::decode(&mut WireReader::new(data)).is_err());
    }

    #[test]
    fn test_serde_string_or_list() {
        let one: TXT = serde_json::from_str(r#"{"data":"abc"}"#).unwrap();
        let many: TXT = serde_json::from_str(r#"{"data":["a","bc"]}"#).unwrap();
        assert_eq!(one, many);
        assert_eq!(
            serde_json::to_string(&one).unwrap(),
            r#"{"data":"abc"}"#
        );
    }

    #[test]
    fn test_display_quotes() {
        assert_eq!(TXT::new("say \"hi\"").to_string(), r#""say \"hi\"""#);
    }
}
