//! DNS domain names.
//!
//! A [`Name`] keeps its uncompressed wire form inline, which makes encoding a
//! plain copy and keeps the common case allocation-free. Comparison and
//! hashing are ASCII case-insensitive; ordering is the canonical DNS order.
//!
//! Presentation format follows RFC 1035 §5.1: labels separated by `.`, with
//! `\.` and `\DDD` escapes. Empty labels produced by doubled or trailing dots
//! are ignored, so `example.com`, `example.com.` and `example..com` all
//! denote the same name.

mod label;
mod parse;

pub use label::{Label, LabelIter};
pub use parse::{read_name, MAX_COMPRESSION_JUMPS};

use crate::error::{Error, Result};
use crate::wire::WireWriter;
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Inline capacity covering the vast majority of names seen in practice.
type WireBuf = SmallVec<[u8; 64]>;

/// A DNS domain name.
///
/// ```rust
/// use cairn_proto::name::Name;
/// use std::str::FromStr;
///
/// let name = Name::from_str("www.Example.com").unwrap();
/// assert_eq!(name.label_count(), 3);
/// assert_eq!(name.to_string(), "www.Example.com.");
/// assert_eq!(name, Name::from_str("WWW.EXAMPLE.COM.").unwrap());
/// ```
#[derive(Clone)]
pub struct Name {
    /// Uncompressed wire bytes, including the terminating root label.
    wire: WireBuf,
    /// Number of non-root labels.
    label_count: u8,
}

impl Name {
    /// Returns the root name (`.`).
    pub fn root() -> Self {
        let mut wire = WireBuf::new();
        wire.push(0);
        Self {
            wire,
            label_count: 0,
        }
    }

    /// Builds a name from raw labels, left to right.
    ///
    /// Empty labels are skipped.
    pub fn from_labels<I, L>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut wire = WireBuf::new();
        let mut label_count = 0u8;
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                continue;
            }
            if label.len() > MAX_LABEL_LENGTH {
                return Err(Error::label_too_long(label.len()));
            }
            // +1 for the length byte, +1 for the root that closes the name.
            let length = wire.len() + 1 + label.len() + 1;
            if length > MAX_NAME_LENGTH {
                return Err(Error::name_too_long(length));
            }
            wire.push(label.len() as u8);
            wire.extend_from_slice(label);
            label_count += 1;
        }
        wire.push(0);
        Ok(Self { wire, label_count })
    }

    /// Assembles a name from already validated wire bytes.
    pub(crate) fn from_validated(wire: WireBuf, label_count: u8) -> Self {
        Self { wire, label_count }
    }

    /// Returns the uncompressed wire representation.
    #[inline]
    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the length of the uncompressed wire representation.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    /// Returns the number of labels, not counting the root.
    #[inline]
    pub const fn label_count(&self) -> usize {
        self.label_count as usize
    }

    /// Returns true for the root name.
    #[inline]
    pub const fn is_root(&self) -> bool {
        self.label_count == 0
    }

    /// Iterates over the labels, most specific first.
    #[inline]
    pub fn labels(&self) -> LabelIter<'_> {
        LabelIter::new(&self.wire)
    }

    /// Returns the name with its leftmost label removed, or `None` for root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let skip = usize::from(self.wire[0]) + 1;
        Some(Self {
            wire: WireBuf::from_slice(&self.wire[skip..]),
            label_count: self.label_count - 1,
        })
    }

    /// Returns true if `self` equals `other` or lies below it.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        if other.label_count > self.label_count {
            return false;
        }
        let mut suffix = self.labels().skip(self.label_count() - other.label_count());
        let mut parent = other.labels();
        loop {
            match (suffix.next(), parent.next()) {
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }

    /// Returns a copy with all ASCII letters lowercased.
    pub fn to_lowercase(&self) -> Self {
        Self {
            // Length bytes are at most 63, below the ASCII uppercase range.
            wire: self.wire.iter().map(u8::to_ascii_lowercase).collect(),
            label_count: self.label_count,
        }
    }

    /// Appends the uncompressed wire form to `writer`.
    #[inline]
    pub fn write_to(&self, writer: &mut WireWriter) {
        writer.write_bytes(&self.wire);
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut labels: SmallVec<[SmallVec<[u8; 32]>; 8]> = SmallVec::new();
        let mut current: SmallVec<[u8; 32]> = SmallVec::new();
        let mut bytes = s.bytes();

        while let Some(byte) = bytes.next() {
            match byte {
                b'.' => labels.push(std::mem::take(&mut current)),
                b'\\' => {
                    let first = bytes
                        .next()
                        .ok_or_else(|| Error::invalid_name(s, "dangling escape"))?;
                    if first.is_ascii_digit() {
                        let mut value = u16::from(first - b'0');
                        for _ in 0..2 {
                            let digit = bytes
                                .next()
                                .filter(u8::is_ascii_digit)
                                .ok_or_else(|| Error::invalid_name(s, "short \\DDD escape"))?;
                            value = value * 10 + u16::from(digit - b'0');
                        }
                        let value = u8::try_from(value)
                            .map_err(|_| Error::invalid_name(s, "\\DDD escape above 255"))?;
                        current.push(value);
                    } else {
                        current.push(first);
                    }
                }
                _ => current.push(byte),
            }
        }
        labels.push(current);

        Self::from_labels(labels)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.labels() {
            write!(f, "{label}.")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

impl PartialEq for Name {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.label_count == other.label_count && self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in &self.wire {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    /// Canonical DNS name order (RFC 4034 §6.1): compare right to left,
    /// label by label.
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs: SmallVec<[Label<'_>; 8]> = self.labels().collect();
        let rhs: SmallVec<[Label<'_>; 8]> = other.labels().collect();
        for (a, b) in lhs.iter().rev().zip(rhs.iter().rev()) {
            match a.cmp_canonical(b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        lhs.len().cmp(&rhs.len())
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::root()
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Name::from_str(&text).map_err(serde::de::Error::custom)
    }
}
