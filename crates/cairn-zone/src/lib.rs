//! # Cairn Zone Management
//!
//! The authoritative data model behind the cairn server:
//!
//! - **Zones**: apex, default TTL and records keyed by owner and type
//! - **SOA serials**: the `YYYYMMDDnn` date-counter policy
//! - **Zone store**: snapshot-based backend with per-zone serialized updates
//! - **Zone-cut walk**: [`zone_names`] and the [`RecordSource`] lookups
//! - **Secondary trust**: CIDR allow-lists for AXFR and NOTIFY targets
//!
//! ## Example
//!
//! ```rust,ignore
//! use cairn_zone::{InMemoryZoneBackend, ZoneSettings, ZoneStore};
//!
//! let store = ZoneStore::new(InMemoryZoneBackend::new(), settings);
//! let mut zone = store.create_zone(&"example.com".parse()?).await?;
//! zone.set_record(&"www.example.com".parse()?, rdata.clone(), None)?;
//! store.update_zone(&mut zone).await?;
//!
//! // Concurrent writers go through the locked read-modify-write.
//! store
//!     .update_zone_with(zone.name(), |zone| zone.set_record(&owner, rdata, None))
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod secondary;
mod store;

pub use secondary::SecondaryRegistry;
pub use store::{InMemoryZoneBackend, RecordLookup, RecordSource, ZoneBackend, ZoneStore};

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cairn_proto::rdata::{NS, SOA};
use cairn_proto::{Name, RData, RecordType, ResourceRecord, Type};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during zone operations.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// Zone not found in store.
    #[error("zone not found: {name}")]
    ZoneNotFound {
        /// The zone name that was not found.
        name: String,
    },

    /// Zone already exists.
    #[error("zone already exists: {name}")]
    ZoneExists {
        /// The zone name.
        name: String,
    },

    /// Record owner lies outside the zone.
    #[error("{owner} is not within zone {zone}")]
    OutOfZone {
        /// The record owner.
        owner: String,
        /// The zone apex.
        zone: String,
    },

    /// Invalid zone data.
    #[error("invalid zone data: {message}")]
    InvalidZone {
        /// Description of the problem.
        message: String,
    },

    /// The serial counter for today is exhausted.
    #[error("SOA serial {serial} has no room left today (counter past {MAX_SERIAL_COUNTER})")]
    SerialOverflow {
        /// The serial that could not be bumped.
        serial: u32,
    },

    /// The serial's date part is later than today.
    #[error("SOA serial {serial} is dated after {today}")]
    SerialFromFuture {
        /// The offending serial.
        serial: u32,
        /// Today's date.
        today: NaiveDate,
    },

    /// An update was based on a copy older than the stored zone.
    #[error("zone {name} changed since serial {serial} (now {stored})")]
    StaleZone {
        /// The zone name.
        name: String,
        /// Serial of the caller's copy.
        serial: u32,
        /// Serial of the stored zone.
        stored: u32,
    },

    /// A transfer allow-list entry could not be parsed.
    #[error("invalid transfer prefix {input:?}: {message}")]
    InvalidTransferPrefix {
        /// The entry as given.
        input: String,
        /// Description of the problem.
        message: String,
    },

    /// Storage backend error.
    #[error("zone backend error: {message}")]
    Backend {
        /// Description of the error.
        message: String,
    },
}

impl ZoneError {
    /// Creates a new invalid zone error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidZone {
            message: message.into(),
        }
    }

    /// Creates a new backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub(crate) fn transfer_prefix(input: &str, message: impl Into<String>) -> Self {
        Self::InvalidTransferPrefix {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for zone operations.
pub type Result<T> = std::result::Result<T, ZoneError>;

// ============================================================================
// Zone Names
// ============================================================================

/// Returns `domain` and its ancestors, most specific first.
///
/// The bare top-level label is left out unless `include_top_level` is set,
/// so `www.sub.example.com` yields `www.sub.example.com`, `sub.example.com`
/// and `example.com`. The root is never included.
pub fn zone_names(domain: &Name, include_top_level: bool) -> Vec<Name> {
    let floor = if include_top_level { 1 } else { 2 };
    let mut names = Vec::with_capacity(domain.label_count());
    let mut current = Some(domain.clone());
    while let Some(name) = current {
        if name.label_count() < floor {
            break;
        }
        current = name.parent();
        names.push(name);
    }
    names
}

// ============================================================================
// SOA Serial
// ============================================================================

/// Largest per-day counter in a `YYYYMMDDnn` serial.
pub const MAX_SERIAL_COUNTER: u32 = 99;

/// Computes the serial following `current`, dated today (UTC).
pub fn next_soa_serial(current: Option<u32>) -> Result<u32> {
    next_soa_serial_on(current, Utc::now().date_naive())
}

/// Computes the serial following `current`, dated `today`.
///
/// - no serial yet (`None` or `0`): `YYYYMMDD00`
/// - dated today: counter + 1, failing past [`MAX_SERIAL_COUNTER`]
/// - dated earlier: `YYYYMMDD00`
/// - dated later: [`ZoneError::SerialFromFuture`]
pub fn next_soa_serial_on(current: Option<u32>, today: NaiveDate) -> Result<u32> {
    let date_part = u64::try_from(today.year()).unwrap_or(0) * 10_000
        + u64::from(today.month()) * 100
        + u64::from(today.day());
    let base = u32::try_from(date_part * 100)
        .map_err(|_| ZoneError::SerialOverflow { serial: current.unwrap_or(0) })?;

    let serial = match current {
        None | Some(0) => return Ok(base),
        Some(serial) => serial,
    };

    match u64::from(serial / 100).cmp(&date_part) {
        std::cmp::Ordering::Less => Ok(base),
        std::cmp::Ordering::Equal if serial % 100 < MAX_SERIAL_COUNTER => Ok(serial + 1),
        std::cmp::Ordering::Equal => Err(ZoneError::SerialOverflow { serial }),
        std::cmp::Ordering::Greater => Err(ZoneError::SerialFromFuture { serial, today }),
    }
}

// ============================================================================
// Zone Settings
// ============================================================================

/// Timers and TTL written into the SOA of newly created zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoaDefaults {
    /// SOA refresh.
    pub refresh: u32,
    /// SOA retry.
    pub retry: u32,
    /// SOA expiration.
    pub expiration: u32,
    /// SOA minimum.
    pub minimum: u32,
    /// Zone default TTL, used by records without their own.
    pub ttl: u32,
}

impl Default for SoaDefaults {
    fn default() -> Self {
        Self {
            refresh: 3600,
            retry: 1800,
            expiration: 604_800,
            minimum: 3600,
            ttl: 3600,
        }
    }
}

/// Store-wide settings used to seed new zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSettings {
    /// Primary name server, placed in every apex SOA and NS.
    pub ns_domain: Name,
    /// Responsible mailbox in SOA form (`hostmaster.example.com`).
    pub ns_admin: Name,
    /// SOA timers and default TTL.
    #[serde(default)]
    pub soa: SoaDefaults,
}

impl ZoneSettings {
    /// Creates settings with default SOA timers.
    pub fn new(ns_domain: Name, ns_admin: Name) -> Self {
        Self {
            ns_domain,
            ns_admin,
            soa: SoaDefaults::default(),
        }
    }
}

/// Converts an email address into the SOA mailbox name.
///
/// `hostmaster@example.com` becomes `hostmaster.example.com.`, with any
/// dot in the local part kept inside the first label. Input without an
/// `@` is taken as a name already.
pub fn admin_mailbox(email: &str) -> cairn_proto::Result<Name> {
    match email.split_once('@') {
        Some((local, domain)) => {
            let domain = Name::from_str(domain)?;
            Name::from_labels(
                std::iter::once(local.as_bytes()).chain(domain.labels().map(|l| l.as_bytes())),
            )
        }
        None => Name::from_str(email),
    }
}

// ============================================================================
// Zone
// ============================================================================

/// A record as stored in a zone: data plus an optional TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Record data; determines the type.
    #[serde(flatten)]
    pub rdata: RData,
    /// TTL, or `None` for the zone default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl ZoneRecord {
    /// Creates a zone record.
    pub fn new(rdata: RData, ttl: Option<u32>) -> Self {
        Self { rdata, ttl }
    }

    /// Materializes the record at `owner`, falling back to `default_ttl`.
    pub fn to_record(&self, owner: &Name, default_ttl: u32) -> ResourceRecord {
        ResourceRecord::new(
            owner.clone(),
            self.ttl.unwrap_or(default_ttl),
            self.rdata.clone(),
        )
    }
}

/// A DNS zone: everything at or below an apex name.
///
/// Owners are kept in canonical order and, per owner, types in ascending
/// code order, which is also the AXFR emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// The zone apex.
    name: Name,
    /// TTL for records without one.
    default_ttl: u32,
    /// Records by owner, then type code.
    records: BTreeMap<Name, BTreeMap<u16, Vec<ZoneRecord>>>,
}

impl Zone {
    /// Creates an empty zone.
    pub fn new(name: Name, default_ttl: u32) -> Self {
        Self {
            name: name.to_lowercase(),
            default_ttl,
            records: BTreeMap::new(),
        }
    }

    /// Creates a zone seeded with the apex SOA and NS from `settings`.
    ///
    /// The serial starts at today's `YYYYMMDD00`.
    pub fn create(name: &Name, settings: &ZoneSettings) -> Result<Self> {
        let mut zone = Self::new(name.clone(), settings.soa.ttl);
        let apex = zone.name.clone();
        let soa = SOA {
            primary: settings.ns_domain.clone(),
            admin: settings.ns_admin.clone(),
            serial: next_soa_serial(None)?,
            refresh: settings.soa.refresh,
            retry: settings.soa.retry,
            expiration: settings.soa.expiration,
            minimum: settings.soa.minimum,
        };
        zone.set_record(&apex, RData::SOA(soa), None)?;
        zone.set_record(&apex, RData::NS(NS::new(settings.ns_domain.clone())), None)?;
        Ok(zone)
    }

    /// Returns the zone apex.
    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the default TTL.
    #[inline]
    pub const fn default_ttl(&self) -> u32 {
        self.default_ttl
    }

    /// Sets the default TTL.
    pub fn set_default_ttl(&mut self, ttl: u32) {
        self.default_ttl = ttl;
    }

    /// Returns true if `owner` is the apex or lies below it.
    pub fn contains(&self, owner: &Name) -> bool {
        owner.is_subdomain_of(&self.name)
    }

    /// Appends a record at `owner`.
    pub fn set_record(&mut self, owner: &Name, rdata: RData, ttl: Option<u32>) -> Result<()> {
        if !self.contains(owner) {
            return Err(ZoneError::OutOfZone {
                owner: owner.to_string(),
                zone: self.name.to_string(),
            });
        }
        self.records
            .entry(owner.to_lowercase())
            .or_default()
            .entry(rdata.rtype().to_u16())
            .or_default()
            .push(ZoneRecord::new(rdata, ttl));
        Ok(())
    }

    /// Removes every record at `owner` whose data equals `rdata`.
    ///
    /// Returns true if anything was removed.
    pub fn delete_record(&mut self, owner: &Name, rdata: &RData) -> bool {
        let code = rdata.rtype().to_u16();
        let Some(types) = self.records.get_mut(owner) else {
            return false;
        };
        let Some(list) = types.get_mut(&code) else {
            return false;
        };

        let before = list.len();
        list.retain(|r| &r.rdata != rdata);
        let removed = list.len() != before;

        if list.is_empty() {
            types.remove(&code);
        }
        if types.is_empty() {
            self.records.remove(owner);
        }
        removed
    }

    /// Returns true if a record with data `rdata` exists at `owner`.
    pub fn record_exists(&self, owner: &Name, rdata: &RData) -> bool {
        self.records(owner, rdata.rtype())
            .iter()
            .any(|r| &r.rdata == rdata)
    }

    /// Returns the records of type `rtype` at `owner`.
    pub fn records(&self, owner: &Name, rtype: Type) -> &[ZoneRecord] {
        self.records
            .get(owner)
            .and_then(|types| types.get(&rtype.to_u16()))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns every record at `owner`, in type order.
    pub fn records_at(&self, owner: &Name) -> impl Iterator<Item = &ZoneRecord> {
        self.records
            .get(owner)
            .into_iter()
            .flat_map(|types| types.values().flatten())
    }

    /// Returns the apex SOA, if any.
    pub fn soa(&self) -> Option<&SOA> {
        self.records(&self.name, Type::Known(RecordType::SOA))
            .iter()
            .find_map(|r| r.rdata.as_soa())
    }

    /// Returns the apex SOA materialized as a record.
    pub fn soa_record(&self) -> Option<ResourceRecord> {
        self.records(&self.name, Type::Known(RecordType::SOA))
            .first()
            .map(|r| r.to_record(&self.name, self.default_ttl))
    }

    /// Returns the apex NS records, materialized.
    pub fn ns_records(&self) -> Vec<ResourceRecord> {
        self.records(&self.name, Type::Known(RecordType::NS))
            .iter()
            .map(|r| r.to_record(&self.name, self.default_ttl))
            .collect()
    }

    /// Returns the SOA serial, if the zone has an SOA.
    pub fn serial(&self) -> Option<u32> {
        self.soa().map(|soa| soa.serial)
    }

    /// Overwrites the apex SOA serial. Returns false without an SOA.
    pub fn set_serial(&mut self, serial: u32) -> bool {
        let code = RecordType::SOA.to_u16();
        let soa = self
            .records
            .get_mut(&self.name)
            .and_then(|types| types.get_mut(&code))
            .and_then(|list| list.first_mut());
        match soa {
            Some(ZoneRecord {
                rdata: RData::SOA(soa),
                ..
            }) => {
                soa.serial = serial;
                true
            }
            _ => false,
        }
    }

    /// Checks the zone can be served: exactly one apex SOA and at least
    /// one apex NS.
    pub fn validate(&self) -> Result<()> {
        let soa_count = self
            .records(&self.name, Type::Known(RecordType::SOA))
            .len();
        if soa_count != 1 {
            return Err(ZoneError::invalid(format!(
                "{} has {soa_count} SOA records at the apex, expected 1",
                self.name
            )));
        }
        if self
            .records(&self.name, Type::Known(RecordType::NS))
            .is_empty()
        {
            return Err(ZoneError::invalid(format!(
                "{} has no NS records at the apex",
                self.name
            )));
        }
        Ok(())
    }

    /// Returns every record, SOA first, then by canonical owner order and
    /// ascending type code.
    pub fn all_records(&self) -> Vec<ResourceRecord> {
        let soa_code = RecordType::SOA.to_u16();
        let mut all: Vec<ResourceRecord> = self.soa_record().into_iter().collect();
        for (owner, types) in &self.records {
            for (code, list) in types {
                if *code == soa_code && owner == &self.name {
                    continue;
                }
                all.extend(list.iter().map(|r| r.to_record(owner, self.default_ttl)));
            }
        }
        all
    }

    /// Returns the number of stored records.
    pub fn record_count(&self) -> usize {
        self.records
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }
}

// ============================================================================
// Tests
// ============================================================================
