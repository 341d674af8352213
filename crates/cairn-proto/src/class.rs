//! DNS record classes (RFC 1035 §3.2.4).
//!
//! The OPT pseudo-record reuses the class field for the requestor's UDP
//! payload size, so the field itself is an open [`Class`] that keeps any
//! 16-bit value.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named record classes.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum RecordClass {
    /// Internet.
    #[default]
    IN = 1,
    /// CSNET (obsolete).
    CS = 2,
    /// CHAOS.
    CH = 3,
    /// Hesiod.
    HS = 4,
    /// Any class; questions only.
    ANY = 255,
}

impl RecordClass {
    /// Returns the numeric value of the class.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Looks up a class by its numeric value.
    #[inline]
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Returns the mnemonic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::IN => "IN",
            Self::CS => "CS",
            Self::CH => "CH",
            Self::HS => "HS",
            Self::ANY => "ANY",
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A class field value, named or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    /// A named class.
    Known(RecordClass),
    /// Any other value (or an OPT payload size).
    Unknown(u16),
}

impl Class {
    /// The Internet class.
    pub const IN: Self = Self::Known(RecordClass::IN);

    /// Creates a class from a u16 value.
    #[inline]
    pub fn from_u16(value: u16) -> Self {
        RecordClass::from_u16(value).map_or(Self::Unknown(value), Self::Known)
    }

    /// Returns the numeric value.
    #[inline]
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::Known(c) => c.to_u16(),
            Self::Unknown(v) => v,
        }
    }

    /// Returns the named class, if any.
    #[inline]
    pub const fn as_known(self) -> Option<RecordClass> {
        match self {
            Self::Known(c) => Some(c),
            Self::Unknown(_) => None,
        }
    }

    /// Returns true for class IN.
    #[inline]
    pub const fn is_internet(self) -> bool {
        matches!(self, Self::Known(RecordClass::IN))
    }
}

impl Default for Class {
    fn default() -> Self {
        Self::IN
    }
}

impl From<RecordClass> for Class {
    fn from(c: RecordClass) -> Self {
        Self::Known(c)
    }
}

impl From<u16> for Class {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<Class> for u16 {
    fn from(value: Class) -> Self {
        value.to_u16()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(c) => write!(f, "{c}"),
            Self::Unknown(v) => write!(f, "CLASS{v}"),
        }
    }
}

impl Serialize for Class {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.to_u16())
    }
}

impl<'de> Deserialize<'de> for Class {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        u16::deserialize(deserializer).map(Self::from_u16)
    }
}
