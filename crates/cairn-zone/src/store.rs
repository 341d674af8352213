//! Zone storage and the authoritative lookup walk.
//!
//! [`ZoneBackend`] is the storage seam: it only knows how to keep whole
//! zones. [`ZoneStore`] layers the zone lifecycle on top (creation from
//! settings, serialized serial bumps, secondary registries) and answers
//! lookups through [`RecordSource`].

use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use cairn_proto::{Name, RecordType, ResourceRecord, Type};

use crate::{next_soa_serial, zone_names, Result, SecondaryRegistry, Zone, ZoneError, ZoneSettings};

// ============================================================================
// Backend
// ============================================================================

/// A storage backend for whole zones.
///
/// Readers get immutable snapshots; writers replace a zone in one step, so
/// a concurrent reader sees either the old or the new zone, never a mix.
#[async_trait]
pub trait ZoneBackend: Send + Sync {
    /// Stores a new zone. Fails if one with the same name exists.
    async fn create_zone(&self, zone: Zone) -> Result<()>;

    /// Loads a snapshot of a zone.
    async fn get_zone(&self, name: &Name) -> Result<Option<Arc<Zone>>>;

    /// Replaces an existing zone. Fails with [`ZoneError::ZoneNotFound`]
    /// if the zone was never created or has been deleted.
    async fn set_zone(&self, zone: Zone) -> Result<()>;

    /// Deletes a zone. Returns false if it did not exist.
    async fn delete_zone(&self, name: &Name) -> Result<bool>;

    /// Checks whether a zone exists.
    async fn zone_exists(&self, name: &Name) -> Result<bool>;
}

/// An in-memory zone backend using `DashMap`.
///
/// Each zone sits behind an `ArcSwap`, so loads never block and stores
/// publish a whole zone at once.
#[derive(Debug, Default)]
pub struct InMemoryZoneBackend {
    /// Zones indexed by their apex name.
    zones: DashMap<Name, Arc<ArcSwap<Zone>>>,
}

impl InMemoryZoneBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns true if there are no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Returns the apex names of all zones.
    pub fn zone_names(&self) -> Vec<Name> {
        self.zones.iter().map(|e| e.key().clone()).collect()
    }
}

#[async_trait]
impl ZoneBackend for InMemoryZoneBackend {
    async fn create_zone(&self, zone: Zone) -> Result<()> {
        match self.zones.entry(zone.name().clone()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Err(ZoneError::ZoneExists {
                name: entry.key().to_string(),
            }),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Arc::new(ArcSwap::from_pointee(zone)));
                Ok(())
            }
        }
    }

    async fn get_zone(&self, name: &Name) -> Result<Option<Arc<Zone>>> {
        Ok(self.zones.get(name).map(|entry| entry.value().load_full()))
    }

    async fn set_zone(&self, zone: Zone) -> Result<()> {
        let Some(entry) = self.zones.get(zone.name()) else {
            return Err(ZoneError::ZoneNotFound {
                name: zone.name().to_string(),
            });
        };
        entry.value().store(Arc::new(zone));
        Ok(())
    }

    async fn delete_zone(&self, name: &Name) -> Result<bool> {
        Ok(self.zones.remove(name).is_some())
    }

    async fn zone_exists(&self, name: &Name) -> Result<bool> {
        Ok(self.zones.contains_key(name))
    }
}

// ============================================================================
// Record Source
// ============================================================================

/// Result of a record lookup, split by response section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordLookup {
    /// Records answering the question.
    pub answers: Vec<ResourceRecord>,
    /// Extra authority records (e.g. referrals).
    pub authorities: Vec<ResourceRecord>,
    /// Extra additional records.
    pub additionals: Vec<ResourceRecord>,
}

impl RecordLookup {
    /// Creates a lookup with only answers.
    pub fn answers(answers: Vec<ResourceRecord>) -> Self {
        Self {
            answers,
            ..Self::default()
        }
    }
}

/// Read-side collaborator of the request handler.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Returns the records for `(name, rtype)` from the closest zone.
    ///
    /// Not-found is an empty lookup, not an error.
    async fn get_records(&self, name: &Name, rtype: Type) -> Result<RecordLookup>;

    /// Returns the closest zone's SOA record followed by its apex NS records.
    async fn get_authority(&self, name: &Name) -> Result<Vec<ResourceRecord>>;

    /// Returns every record of the zone `zone`, SOA first, from a single
    /// snapshot. Empty if the zone does not exist.
    async fn get_all_records_for_zone(&self, zone: &Name) -> Result<Vec<ResourceRecord>>;

    /// Returns true if `peer` may transfer `zone`.
    fn is_transfer_allowed(&self, zone: &Name, peer: IpAddr) -> bool;
}

// ============================================================================
// Zone Store
// ============================================================================

/// Zone lifecycle on top of a [`ZoneBackend`].
pub struct ZoneStore<B: ZoneBackend = InMemoryZoneBackend> {
    backend: B,
    settings: ZoneSettings,
    /// One async lock per zone; held across load, change and publish.
    locks: DashMap<Name, Arc<Mutex<()>>>,
    secondaries: DashMap<Name, Arc<SecondaryRegistry>>,
}

impl<B: ZoneBackend> std::fmt::Debug for ZoneStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneStore")
            .field("settings", &self.settings)
            .field("secondaries", &self.secondaries.len())
            .finish_non_exhaustive()
    }
}

impl<B: ZoneBackend> ZoneStore<B> {
    /// Creates a store over `backend`, seeding new zones from `settings`.
    pub fn new(backend: B, settings: ZoneSettings) -> Self {
        Self {
            backend,
            settings,
            locks: DashMap::new(),
            secondaries: DashMap::new(),
        }
    }

    /// Returns the settings used for new zones.
    pub fn settings(&self) -> &ZoneSettings {
        &self.settings
    }

    /// Returns the storage backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates and stores a zone with its apex SOA and NS.
    pub async fn create_zone(&self, name: &Name) -> Result<Zone> {
        let zone = Zone::create(name, &self.settings)?;
        self.backend.create_zone(zone.clone()).await?;
        info!(zone = %zone.name(), serial = zone.serial(), "zone created");
        Ok(zone)
    }

    /// Returns an owned copy of a zone, to mutate and pass to
    /// [`update_zone`](Self::update_zone).
    pub async fn get_zone(&self, name: &Name) -> Result<Option<Zone>> {
        Ok(self
            .backend
            .get_zone(name)
            .await?
            .map(|zone| Zone::clone(&zone)))
    }

    /// Returns a read-only snapshot of a zone.
    pub async fn zone_snapshot(&self, name: &Name) -> Result<Option<Arc<Zone>>> {
        self.backend.get_zone(name).await
    }

    /// Applies `change` to the current version of a zone and publishes it
    /// with the next serial.
    ///
    /// The zone lock is held from load to publish, so concurrent changes to
    /// the same zone apply one after another and none is lost. Returns
    /// `Ok(false)` without publishing when the changed zone has no apex SOA.
    pub async fn update_zone_with<F>(&self, name: &Name, change: F) -> Result<bool>
    where
        F: FnOnce(&mut Zone) -> Result<()> + Send,
    {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let Some(stored) = self.backend.get_zone(name).await? else {
            return Err(ZoneError::ZoneNotFound {
                name: name.to_string(),
            });
        };
        let mut zone = Zone::clone(&stored);
        change(&mut zone)?;

        let Some(current) = zone.serial() else {
            debug!(zone = %name, "zone has no SOA, not persisting");
            return Ok(false);
        };
        let base = stored.serial().map_or(current, |s| s.max(current));
        let serial = next_soa_serial(Some(base))?;

        zone.set_serial(serial);
        self.backend.set_zone(zone).await?;
        info!(zone = %name, serial, "zone updated");
        Ok(true)
    }

    /// Bumps the serial and persists `zone`, a copy from
    /// [`get_zone`](Self::get_zone) or [`create_zone`](Self::create_zone).
    ///
    /// The copy must still be current: if another update has been published
    /// since it was taken, this fails with [`ZoneError::StaleZone`] and
    /// nothing is written. The new serial is written back into `zone`.
    /// Returns `Ok(false)` without persisting when the zone has no apex SOA.
    pub async fn update_zone(&self, zone: &mut Zone) -> Result<bool> {
        let Some(current) = zone.serial() else {
            debug!(zone = %zone.name(), "zone has no SOA, not persisting");
            return Ok(false);
        };

        let lock = self.lock_for(zone.name());
        let _guard = lock.lock().await;

        let Some(stored) = self.backend.get_zone(zone.name()).await? else {
            return Err(ZoneError::ZoneNotFound {
                name: zone.name().to_string(),
            });
        };
        let stored = stored.serial().unwrap_or(current);
        if stored > current {
            return Err(ZoneError::StaleZone {
                name: zone.name().to_string(),
                serial: current,
                stored,
            });
        }
        let serial = next_soa_serial(Some(current))?;

        zone.set_serial(serial);
        self.backend.set_zone(zone.clone()).await?;
        info!(zone = %zone.name(), serial, "zone updated");
        Ok(true)
    }

    /// Deletes a zone and its secondary registry.
    ///
    /// Waits for in-flight updates of the zone; updates that start later
    /// fail with [`ZoneError::ZoneNotFound`].
    pub async fn delete_zone(&self, name: &Name) -> Result<bool> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let deleted = self.backend.delete_zone(name).await?;
        self.secondaries.remove(name);
        if deleted {
            info!(zone = %name, "zone deleted");
        }
        Ok(deleted)
    }

    /// Checks whether a zone exists.
    pub async fn exists_zone(&self, name: &Name) -> Result<bool> {
        self.backend.zone_exists(name).await
    }

    /// Returns the secondary registry of `zone`, creating it on first use.
    pub fn secondaries(&self, zone: &Name) -> Arc<SecondaryRegistry> {
        self.secondaries
            .entry(zone.to_lowercase())
            .or_default()
            .value()
            .clone()
    }

    fn lock_for(&self, zone: &Name) -> Arc<Mutex<()>> {
        self.locks
            .entry(zone.clone())
            .or_default()
            .value()
            .clone()
    }

    /// Finds the closest existing zone for `name`, walking up to and
    /// including the top-level label.
    pub async fn find_zone(&self, name: &Name) -> Result<Option<Arc<Zone>>> {
        for candidate in zone_names(name, true) {
            if let Some(zone) = self.backend.get_zone(&candidate).await? {
                return Ok(Some(zone));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<B: ZoneBackend> RecordSource for ZoneStore<B> {
    async fn get_records(&self, name: &Name, rtype: Type) -> Result<RecordLookup> {
        let Some(zone) = self.find_zone(name).await? else {
            return Ok(RecordLookup::default());
        };

        let answers = if rtype.is(RecordType::ANY) {
            zone.records_at(name)
                .map(|r| r.to_record(name, zone.default_ttl()))
                .collect()
        } else {
            zone.records(name, rtype)
                .iter()
                .map(|r| r.to_record(name, zone.default_ttl()))
                .collect()
        };
        Ok(RecordLookup::answers(answers))
    }

    async fn get_authority(&self, name: &Name) -> Result<Vec<ResourceRecord>> {
        let Some(zone) = self.find_zone(name).await? else {
            return Ok(Vec::new());
        };
        let mut records: Vec<ResourceRecord> = zone.soa_record().into_iter().collect();
        records.extend(zone.ns_records());
        Ok(records)
    }

    async fn get_all_records_for_zone(&self, zone: &Name) -> Result<Vec<ResourceRecord>> {
        Ok(self
            .backend
            .get_zone(zone)
            .await?
            .map(|zone| zone.all_records())
            .unwrap_or_default())
    }

    fn is_transfer_allowed(&self, zone: &Name, peer: IpAddr) -> bool {
        self.secondaries
            .get(zone)
            .is_some_and(|registry| registry.is_transfer_allowed_addr(peer))
    }
}
