//! Wiring between `cairn-config` and the serving crates.
//!
//! The binary and the integration tests share these builders, so a config
//! file exercised in tests produces the same store and handler the server
//! runs with.

use anyhow::{Context, Result};
use cairn_config::{Config, TransferRefusal, ZoneConfig};
use cairn_proto::Name;
use cairn_server::{AxfrRefusal, HandlerConfig, ServerConfig};
use cairn_zone::{InMemoryZoneBackend, Zone, ZoneStore};
use std::collections::HashSet;
use tracing::{debug, info};

/// The store type the server runs on.
pub type Store = ZoneStore<InMemoryZoneBackend>;

/// Creates an empty store with the SOA and NS settings from `config`.
pub fn build_store(config: &Config) -> Result<Store> {
    let settings = config
        .store
        .zone_settings()
        .context("invalid store settings")?;
    Ok(ZoneStore::new(InMemoryZoneBackend::new(), settings))
}

/// Maps the handler section onto the server's handler settings.
pub fn handler_config(config: &Config) -> HandlerConfig {
    HandlerConfig {
        edns_udp_size: config.handler.edns_udp_size,
        log_errors: config.handler.log_errors,
        axfr_refusal: match config.handler.axfr_refusal {
            TransferRefusal::Refuse => AxfrRefusal::Refuse,
            TransferRefusal::Drop => AxfrRefusal::Drop,
        },
    }
}

/// Maps the listener section onto the server's listener settings.
pub fn server_config(config: &Config) -> ServerConfig {
    ServerConfig {
        udp: config.listeners.udp.clone(),
        tcp: config.listeners.tcp.clone(),
        tcp_idle_timeout: config.listeners.tcp_idle_timeout(),
    }
}

/// Writes one configured zone into the store and syncs its secondaries.
///
/// An existing zone is replaced wholesale; its serial still moves forward.
pub async fn load_zone(store: &Store, zone_cfg: &ZoneConfig) -> Result<Name> {
    let apex = zone_cfg.apex()?;

    let mut desired = Zone::create(&apex, store.settings())?;
    for record in &zone_cfg.records {
        let owner = zone_cfg.owner(record)?;
        desired
            .set_record(&owner, record.rdata.clone(), record.ttl)
            .with_context(|| format!("zone {apex}: record {}", record.name))?;
    }
    let records = desired.record_count();

    if !store.exists_zone(&apex).await? {
        store.create_zone(&apex).await?;
    }
    store
        .update_zone_with(&apex, move |zone| {
            *zone = desired;
            Ok(())
        })
        .await?;

    let registry = store.secondaries(&apex);
    for net in registry.allowed_transfer() {
        registry.remove_allowed_transfer_ip(&net.to_string(), None)?;
    }
    for entry in &zone_cfg.allow_transfer {
        registry
            .add_allowed_transfer_ip(entry, None)
            .with_context(|| format!("zone {apex}: allow_transfer {entry}"))?;
    }
    for target in registry.notify_targets() {
        registry.remove_notify_target(target);
    }
    for target in &zone_cfg.notify {
        registry.add_notify_target(*target);
    }

    debug!(
        zone = %apex,
        records,
        secondaries = zone_cfg.notify.len(),
        "zone loaded"
    );
    Ok(apex)
}

/// Brings the store in line with `zones`: loads every configured zone and
/// deletes the ones no longer configured.
///
/// Returns the loaded apexes in configuration order.
pub async fn sync_zones(store: &Store, zones: &[ZoneConfig]) -> Result<Vec<Name>> {
    let mut loaded = Vec::with_capacity(zones.len());
    for zone_cfg in zones {
        loaded.push(load_zone(store, zone_cfg).await?);
    }

    let keep: HashSet<&Name> = loaded.iter().collect();
    for name in store.backend().zone_names() {
        if !keep.contains(&name) {
            store.delete_zone(&name).await?;
        }
    }

    info!(zones = loaded.len(), "zones synchronized");
    Ok(loaded)
}
