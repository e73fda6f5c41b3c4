//! Topology service
//!
//! Owns the persisted hubs and zones and hands out immutable
//! [`HubGraph`] snapshots. Administrative changes are applied to a copy,
//! validated, persisted, then swapped in; readers holding an older
//! `Arc<HubGraph>` keep a consistent view.
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `hubs` | `hub_id` | JSON `Hub` |
//! | `zones` | `zone name` | JSON `Zone` |
//! | `topology_meta` | `"origin_district"` | district |

use std::sync::Arc;

use parking_lot::RwLock;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use shared::hub::{Hub, HubId, HubTier, Zone};

use super::error::{TopologyError, TopologyResult};
use super::graph::HubGraph;
use super::seed::TopologyDocument;
use crate::db::StorageResult;

const HUBS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("hubs");
const ZONES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("zones");
const META_TABLE: TableDefinition<&str, &str> = TableDefinition::new("topology_meta");

const ORIGIN_KEY: &str = "origin_district";

pub struct TopologyService {
    db: Arc<Database>,
    graph: RwLock<Arc<HubGraph>>,
}

impl std::fmt::Debug for TopologyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyService").finish_non_exhaustive()
    }
}

impl TopologyService {
    /// Load the topology, seeding an empty database from `seed`.
    ///
    /// Refuses to start on a topology with defects.
    pub fn open(db: Arc<Database>, seed: TopologyDocument) -> TopologyResult<Self> {
        let seeded = Self::seed_if_empty(&db, &seed)?;
        if seeded {
            tracing::info!(
                hubs = seed.hubs.len(),
                zones = seed.zones.len(),
                origin = %seed.origin_district,
                "Topology seeded"
            );
        }

        let graph = Self::load_graph(&db)?;
        let defects = graph.validate();
        if !defects.is_empty() {
            for defect in &defects {
                tracing::error!(%defect, "Topology defect");
            }
            return Err(TopologyError::Invalid(defects));
        }

        Ok(Self {
            db,
            graph: RwLock::new(Arc::new(graph)),
        })
    }

    /// Current immutable snapshot
    pub fn graph(&self) -> Arc<HubGraph> {
        self.graph.read().clone()
    }

    pub fn hub(&self, id: HubId) -> TopologyResult<Hub> {
        self.graph()
            .hub(id)
            .cloned()
            .ok_or(TopologyError::HubNotFound(id))
    }

    pub fn set_hub_tier(&self, id: HubId, tier: HubTier) -> TopologyResult<Hub> {
        self.update(|graph| {
            let hub = graph.hub_mut(id).ok_or(TopologyError::HubNotFound(id))?;
            hub.tier = tier;
            Ok(vec![hub.clone()])
        })
        .map(first_hub)
    }

    pub fn set_hub_active(&self, id: HubId, active: bool) -> TopologyResult<Hub> {
        self.update(|graph| {
            let hub = graph.hub_mut(id).ok_or(TopologyError::HubNotFound(id))?;
            hub.active = active;
            Ok(vec![hub.clone()])
        })
        .map(first_hub)
    }

    /// Provision a new hub; the result must still validate.
    pub fn add_hub(&self, hub: Hub) -> TopologyResult<Hub> {
        self.update(|graph| {
            graph.insert_hub(hub.clone());
            Ok(vec![hub])
        })
        .map(first_hub)
    }

    /// Deactivate `old` and activate `new` as one change
    pub fn replace_hub(&self, old: HubId, new: HubId) -> TopologyResult<(Hub, Hub)> {
        let mut changed = self.update(|graph| {
            let old_hub = graph.hub_mut(old).ok_or(TopologyError::HubNotFound(old))?;
            old_hub.active = false;
            let old_hub = old_hub.clone();
            let new_hub = graph.hub_mut(new).ok_or(TopologyError::HubNotFound(new))?;
            new_hub.active = true;
            Ok(vec![old_hub, new_hub.clone()])
        })?;
        let new_hub = changed.remove(1);
        let old_hub = changed.remove(0);
        Ok((old_hub, new_hub))
    }

    /// Validate retiring `old` (optionally activating `new`) without applying it
    pub fn check_retirement(&self, old: HubId, new: Option<HubId>) -> TopologyResult<()> {
        let mut next = HubGraph::clone(&self.graph());
        next.hub_mut(old).ok_or(TopologyError::HubNotFound(old))?.active = false;
        if let Some(new) = new {
            next.hub_mut(new).ok_or(TopologyError::HubNotFound(new))?.active = true;
        }
        let defects = next.validate();
        if defects.is_empty() {
            Ok(())
        } else {
            Err(TopologyError::Invalid(defects))
        }
    }

    /// Copy, mutate, validate, persist, swap
    fn update<F>(&self, mutate: F) -> TopologyResult<Vec<Hub>>
    where
        F: FnOnce(&mut HubGraph) -> TopologyResult<Vec<Hub>>,
    {
        // 写锁覆盖整个更新，避免并发修改丢失
        let mut guard = self.graph.write();
        let mut next = HubGraph::clone(&guard);
        let changed = mutate(&mut next)?;

        let defects = next.validate();
        if !defects.is_empty() {
            tracing::warn!(?defects, "Topology change rejected");
            return Err(TopologyError::Invalid(defects));
        }

        self.persist_hubs(&changed)?;
        *guard = Arc::new(next);

        for hub in &changed {
            tracing::info!(hub_id = hub.id, district = %hub.district, tier = ?hub.tier, active = hub.active, "Hub updated");
        }
        Ok(changed)
    }

    fn persist_hubs(&self, hubs: &[Hub]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(HUBS_TABLE)?;
            for hub in hubs {
                let value = serde_json::to_vec(hub)?;
                table.insert(hub.id, value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn seed_if_empty(db: &Database, seed: &TopologyDocument) -> StorageResult<bool> {
        let txn = db.begin_write()?;
        let seeded = {
            let mut hubs = txn.open_table(HUBS_TABLE)?;
            let mut zones = txn.open_table(ZONES_TABLE)?;
            let mut meta = txn.open_table(META_TABLE)?;

            if hubs.is_empty()? {
                for hub in &seed.hubs {
                    let value = serde_json::to_vec(hub)?;
                    hubs.insert(hub.id, value.as_slice())?;
                }
                for zone in &seed.zones {
                    let value = serde_json::to_vec(zone)?;
                    zones.insert(zone.name.as_str(), value.as_slice())?;
                }
                meta.insert(ORIGIN_KEY, seed.origin_district.as_str())?;
                true
            } else {
                false
            }
        };
        txn.commit()?;
        Ok(seeded)
    }

    fn load_graph(db: &Database) -> StorageResult<HubGraph> {
        let read_txn = db.begin_read()?;
        let hubs_table = read_txn.open_table(HUBS_TABLE)?;
        let zones_table = read_txn.open_table(ZONES_TABLE)?;
        let meta_table = read_txn.open_table(META_TABLE)?;

        let mut hubs = Vec::new();
        for result in hubs_table.iter()? {
            let (_key, value) = result?;
            let hub: Hub = serde_json::from_slice(value.value())?;
            hubs.push(hub);
        }

        let mut zones = Vec::new();
        for result in zones_table.iter()? {
            let (_key, value) = result?;
            let zone: Zone = serde_json::from_slice(value.value())?;
            zones.push(zone);
        }

        let origin = meta_table
            .get(ORIGIN_KEY)?
            .map(|g| g.value().to_string())
            .unwrap_or_else(|| super::seed::DEFAULT_ORIGIN_DISTRICT.to_string());

        Ok(HubGraph::new(hubs, zones, origin))
    }
}

fn first_hub(mut hubs: Vec<Hub>) -> Hub {
    hubs.remove(0)
}
