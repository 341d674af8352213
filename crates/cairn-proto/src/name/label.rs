//! Borrowed views of single labels inside a [`Name`](super::Name).

use std::cmp::Ordering;
use std::fmt;

/// One label of a domain name, borrowed from the name's wire bytes.
#[derive(Clone, Copy)]
pub struct Label<'a> {
    bytes: &'a [u8],
}

impl<'a> Label<'a> {
    /// Wraps raw label bytes (no length prefix).
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the label.
    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the length of the label in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for the zero-length root label.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// ASCII case-insensitive equality.
    #[inline]
    pub fn eq_ignore_ascii_case(&self, other: &Label<'_>) -> bool {
        self.bytes.eq_ignore_ascii_case(other.bytes)
    }

    /// Canonical label order (RFC 4034 §6.1): lowercase octet strings
    /// compared left-justified, a proper prefix sorting first.
    pub fn cmp_canonical(&self, other: &Label<'_>) -> Ordering {
        let lhs = self.bytes.iter().map(u8::to_ascii_lowercase);
        let rhs = other.bytes.iter().map(u8::to_ascii_lowercase);
        lhs.cmp(rhs)
    }
}

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.bytes {
            match byte {
                b'.' | b'\\' | b'"' | b'(' | b')' | b';' | b'@' | b'$' => {
                    write!(f, "\\{}", byte as char)?;
                }
                0x21..=0x7E => write!(f, "{}", byte as char)?,
                _ => write!(f, "\\{byte:03}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({self})")
    }
}

/// Iterator over the non-root labels of a name, left to right.
#[derive(Clone)]
pub struct LabelIter<'a> {
    wire: &'a [u8],
    pos: usize,
}

impl<'a> LabelIter<'a> {
    pub(super) const fn new(wire: &'a [u8]) -> Self {
        Self { wire, pos: 0 }
    }
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = Label<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = usize::from(*self.wire.get(self.pos)?);
        if len == 0 {
            return None;
        }
        let start = self.pos + 1;
        self.pos = start + len;
        Some(Label::new(&self.wire[start..start + len]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_is_bytewise_not_length_first() {
        let a = Label::new(b"a");
        let upper_z = Label::new(b"Z");
        let aa = Label::new(b"aa");
        assert_eq!(a.cmp_canonical(&aa), Ordering::Less);
        assert_eq!(aa.cmp_canonical(&upper_z), Ordering::Less);
        assert_eq!(Label::new(b"WWW").cmp_canonical(&Label::new(b"www")), Ordering::Equal);
    }

    #[test]
    fn test_display_escapes() {
        assert_eq!(Label::new(b"a.b").to_string(), "a\\.b");
        assert_eq!(Label::new(&[0x07, b'x']).to_string(), "\\007x");
        assert_eq!(Label::new(b"_srv").to_string(), "_srv");
    }
}
