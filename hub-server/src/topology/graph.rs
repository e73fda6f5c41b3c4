//! In-memory hub graph
//!
//! Built from the persisted hubs and zones and swapped atomically whenever
//! an administrative change passes validation.

use std::collections::{BTreeMap, HashMap};

use shared::hub::{Hub, HubId, HubTier, Zone};
use shared::util::normalize_district;

use super::error::{TopologyDefect, TopologyError, TopologyResult};

#[derive(Debug, Clone)]
pub struct HubGraph {
    hubs: BTreeMap<HubId, Hub>,
    zones: Vec<Zone>,
    origin_district: String,
}

impl HubGraph {
    pub fn new(hubs: Vec<Hub>, zones: Vec<Zone>, origin_district: impl Into<String>) -> Self {
        Self {
            hubs: hubs.into_iter().map(|h| (h.id, h)).collect(),
            zones,
            origin_district: origin_district.into(),
        }
    }

    pub fn hub(&self, id: HubId) -> Option<&Hub> {
        self.hubs.get(&id)
    }

    pub fn hubs(&self) -> impl Iterator<Item = &Hub> {
        self.hubs.values()
    }

    /// Hubs ordered for display
    pub fn hubs_by_sequence(&self) -> Vec<&Hub> {
        let mut hubs: Vec<&Hub> = self.hubs.values().collect();
        hubs.sort_by_key(|h| (h.sequence, h.id));
        hubs
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn origin_district(&self) -> &str {
        &self.origin_district
    }

    /// The single active hub serving `district`
    pub fn active_hub_for_district(&self, district: &str) -> TopologyResult<&Hub> {
        let mut matches = self.hubs.values().filter(|h| h.active && h.serves(district));
        let Some(first) = matches.next() else {
            return Err(TopologyError::NoRoute {
                district: district.to_string(),
            });
        };
        let rest: Vec<&Hub> = matches.collect();
        if !rest.is_empty() {
            let mut hub_ids = vec![first.id];
            hub_ids.extend(rest.iter().map(|h| h.id));
            return Err(TopologyError::DuplicateDistrictHub {
                district: district.to_string(),
                hub_ids,
            });
        }
        Ok(first)
    }

    /// Zone containing `district`; exactly one is required
    pub fn zone_of(&self, district: &str) -> TopologyResult<&Zone> {
        let zones: Vec<&Zone> = self.zones.iter().filter(|z| z.contains(district)).collect();
        match zones.as_slice() {
            [zone] => Ok(zone),
            // 无分区与多分区同样无法定位
            none_or_many => Err(TopologyError::AmbiguousZone {
                district: district.to_string(),
                zones: none_or_many.iter().map(|z| z.name.clone()).collect(),
            }),
        }
    }

    /// Mega hub of the zone containing `district`
    pub fn mega_hub_for(&self, district: &str) -> TopologyResult<&Hub> {
        let zone = self.zone_of(district)?;
        self.active_hub_for_district(&zone.mega_hub_district)
    }

    pub fn origin_warehouse(&self) -> TopologyResult<&Hub> {
        let hub = self.active_hub_for_district(&self.origin_district)?;
        if hub.tier != HubTier::Warehouse {
            return Err(TopologyError::Invalid(vec![TopologyDefect::OriginNotWarehouse {
                hub_id: hub.id,
                tier: hub.tier,
            }]));
        }
        Ok(hub)
    }

    /// Whole-graph consistency check, every defect reported
    pub fn validate(&self) -> Vec<TopologyDefect> {
        let mut defects = Vec::new();

        // 每个区只能有一个活跃枢纽
        let mut by_district: BTreeMap<String, Vec<HubId>> = BTreeMap::new();
        for hub in self.hubs.values().filter(|h| h.active) {
            by_district
                .entry(normalize_district(&hub.district))
                .or_default()
                .push(hub.id);
        }
        for (district, hub_ids) in &by_district {
            if hub_ids.len() > 1 {
                defects.push(TopologyDefect::DuplicateDistrictHub {
                    district: district.clone(),
                    hub_ids: hub_ids.clone(),
                });
            }
        }

        // Zone membership
        let mut zones_of: HashMap<String, Vec<String>> = HashMap::new();
        for zone in &self.zones {
            for district in &zone.districts {
                let names = zones_of.entry(normalize_district(district)).or_default();
                if !names.contains(&zone.name) {
                    names.push(zone.name.clone());
                }
            }
        }
        let mut multi: Vec<(&String, &Vec<String>)> =
            zones_of.iter().filter(|(_, z)| z.len() > 1).collect();
        multi.sort_by(|a, b| a.0.cmp(b.0));
        for (district, zones) in multi {
            defects.push(TopologyDefect::MultiZonedDistrict {
                district: district.clone(),
                zones: zones.clone(),
            });
        }
        for hub in self.hubs.values().filter(|h| h.active) {
            if !zones_of.contains_key(&normalize_district(&hub.district)) {
                defects.push(TopologyDefect::UnzonedDistrict {
                    hub_id: hub.id,
                    district: hub.district.clone(),
                });
            }
        }

        // Mega hubs
        for zone in &self.zones {
            let megas: Vec<&Hub> = self
                .hubs
                .values()
                .filter(|h| h.active && h.serves(&zone.mega_hub_district))
                .collect();
            match megas.as_slice() {
                [] => defects.push(TopologyDefect::MissingMegaHub {
                    zone: zone.name.clone(),
                    district: zone.mega_hub_district.clone(),
                }),
                [hub] if hub.tier != HubTier::MegaHub => {
                    defects.push(TopologyDefect::MegaHubWrongTier {
                        zone: zone.name.clone(),
                        hub_id: hub.id,
                        tier: hub.tier,
                    })
                }
                // duplicates already reported above
                _ => {}
            }
        }

        // Origin
        let origins: Vec<&Hub> = self
            .hubs
            .values()
            .filter(|h| h.active && h.serves(&self.origin_district))
            .collect();
        match origins.as_slice() {
            [] => defects.push(TopologyDefect::MissingOriginWarehouse {
                district: self.origin_district.clone(),
            }),
            [hub] if hub.tier != HubTier::Warehouse => {
                defects.push(TopologyDefect::OriginNotWarehouse {
                    hub_id: hub.id,
                    tier: hub.tier,
                })
            }
            _ => {}
        }

        defects
    }

    pub(crate) fn insert_hub(&mut self, hub: Hub) {
        self.hubs.insert(hub.id, hub);
    }

    pub(crate) fn hub_mut(&mut self, id: HubId) -> Option<&mut Hub> {
        self.hubs.get_mut(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::seed::kerala_network;

    #[test]
    fn test_seed_network_is_valid() {
        let graph = kerala_network().into_graph();
        assert_eq!(graph.validate(), vec![]);
        assert_eq!(graph.origin_warehouse().unwrap().district, "Kottayam");
    }

    #[test]
    fn test_zone_lookup_is_case_insensitive() {
        let graph = kerala_network().into_graph();
        assert_eq!(graph.zone_of("kannur").unwrap().name, "NORTH");
        assert_eq!(graph.mega_hub_for("Thrissur").unwrap().district, "Ernakulam");
        assert!(matches!(
            graph.zone_of("Mumbai"),
            Err(TopologyError::AmbiguousZone { ref zones, .. }) if zones.is_empty()
        ));
    }

    #[test]
    fn test_duplicate_active_hub_detected() {
        let mut graph = kerala_network().into_graph();
        graph.insert_hub(Hub::new(99, "Kannur Annex", "Kannur", HubTier::LocalHub));

        assert!(matches!(
            graph.active_hub_for_district("Kannur"),
            Err(TopologyError::DuplicateDistrictHub { ref hub_ids, .. }) if hub_ids == &vec![1, 99]
        ));
        assert!(graph.validate().contains(&TopologyDefect::DuplicateDistrictHub {
            district: "kannur".into(),
            hub_ids: vec![1, 99],
        }));
    }

    #[test]
    fn test_inactive_duplicate_is_ignored() {
        let mut graph = kerala_network().into_graph();
        let mut annex = Hub::new(99, "Kannur Annex", "Kannur", HubTier::LocalHub);
        annex.active = false;
        graph.insert_hub(annex);
        assert_eq!(graph.active_hub_for_district("Kannur").unwrap().id, 1);
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn test_multi_zoned_district_detected() {
        let mut doc = kerala_network();
        doc.zones[1].districts.push("Thrissur".into());
        let graph = doc.into_graph();

        assert!(matches!(
            graph.zone_of("Thrissur"),
            Err(TopologyError::AmbiguousZone { ref zones, .. }) if zones.len() == 2
        ));
        assert!(graph
            .validate()
            .iter()
            .any(|d| matches!(d, TopologyDefect::MultiZonedDistrict { district, .. } if district == "thrissur")));
    }

    #[test]
    fn test_mega_hub_tier_checked() {
        let mut graph = kerala_network().into_graph();
        if let Some(hub) = graph.hub_mut(4) {
            hub.tier = HubTier::RegionalHub;
        }
        assert!(graph.validate().contains(&TopologyDefect::MegaHubWrongTier {
            zone: "NORTH".into(),
            hub_id: 4,
            tier: HubTier::RegionalHub,
        }));
    }
}
