//! Zone configuration.
//!
//! Record owners may be written relative to the zone (`www`, `@` for the
//! apex) or in full. A name that ends with a dot is always taken as
//! absolute.

use super::{ConfigError, Result};
use cairn_proto::{Name, RData};
use cairn_zone::secondary::parse_transfer_prefix;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;

/// A zone served by this server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone apex.
    pub name: String,

    /// Records beyond the apex SOA and NS.
    #[serde(default)]
    pub records: Vec<RecordConfig>,

    /// Networks allowed to AXFR the zone (`addr`, `addr/len`).
    #[serde(default)]
    pub allow_transfer: Vec<String>,

    /// Secondaries that receive NOTIFY.
    #[serde(default)]
    pub notify: Vec<SocketAddr>,
}

/// One record in a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Owner name.
    pub name: String,

    /// TTL; the zone default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Type tag and type-specific fields.
    #[serde(flatten)]
    pub rdata: RData,
}

fn invalid(field: impl Into<String>, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.to_string(),
    }
}

impl ZoneConfig {
    /// Parses the zone apex.
    pub fn apex(&self) -> Result<Name> {
        Name::from_str(&self.name)
            .map(|name| name.to_lowercase())
            .map_err(|e| invalid(format!("zones[{}].name", self.name), e))
    }

    /// Resolves a record owner against the apex.
    pub fn owner(&self, record: &RecordConfig) -> Result<Name> {
        let apex = self.apex()?;
        let raw = record.name.trim();
        if raw.is_empty() || raw == "@" {
            return Ok(apex);
        }

        let field = || format!("zones[{}].records[{}].name", self.name, record.name);
        let name = Name::from_str(raw).map_err(|e| invalid(field(), e))?;
        if raw.ends_with('.') || name.is_subdomain_of(&apex) {
            return Ok(name);
        }

        let joined = format!("{raw}.{apex}");
        Name::from_str(&joined).map_err(|e| invalid(field(), e))
    }

    /// Checks names, allow-list entries and record placement.
    pub fn validate(&self) -> Result<()> {
        let apex = self.apex()?;

        for entry in &self.allow_transfer {
            parse_transfer_prefix(entry, None)
                .map_err(|e| invalid(format!("zones[{}].allow_transfer", self.name), e))?;
        }

        for record in &self.records {
            let owner = self.owner(record)?;
            if !owner.is_subdomain_of(&apex) {
                return Err(invalid(
                    format!("zones[{}].records[{}].name", self.name, record.name),
                    format!("{owner} is outside zone {apex}"),
                ));
            }
        }

        Ok(())
    }
}
