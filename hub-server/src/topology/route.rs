//! Route generation
//!
//! The network is a shallow tree, so routes are composed from zones rather
//! than searched:
//!
//! ```text
//! dest tier WAREHOUSE / MEGA_HUB   [origin, dest]
//! same zone                        [origin, zone mega, dest]
//! different zones                  [origin, origin mega, dest mega, dest]
//! ```
//!
//! Consecutive duplicates collapse, so a destination equal to the origin
//! gives a one-hub route.

use shared::hub::{Hub, HubId};

use super::error::{TopologyError, TopologyResult};
use super::graph::HubGraph;

pub struct RouteGenerator<'a> {
    graph: &'a HubGraph,
}

impl<'a> RouteGenerator<'a> {
    pub fn new(graph: &'a HubGraph) -> Self {
        Self { graph }
    }

    /// Ordered hub list from `origin_id` to the hub serving `district`
    pub fn generate_route(&self, origin_id: HubId, district: &str) -> TopologyResult<Vec<Hub>> {
        let origin = self
            .graph
            .hub(origin_id)
            .ok_or(TopologyError::HubNotFound(origin_id))?;
        if !origin.active {
            return Err(TopologyError::HubInactive(origin_id));
        }
        let dest = self.graph.active_hub_for_district(district)?;

        if dest.id == origin.id {
            return Ok(vec![origin.clone()]);
        }
        if dest.tier.is_direct_destination() {
            return Ok(vec![origin.clone(), dest.clone()]);
        }

        let origin_zone = self.graph.zone_of(&origin.district)?;
        let dest_zone = self.graph.zone_of(&dest.district)?;

        let mut route = vec![origin];
        if origin_zone.name == dest_zone.name {
            route.push(self.mega_hub(&origin_zone.mega_hub_district)?);
        } else {
            route.push(self.mega_hub(&origin_zone.mega_hub_district)?);
            route.push(self.mega_hub(&dest_zone.mega_hub_district)?);
        }
        route.push(dest);
        route.dedup_by_key(|h| h.id);

        Ok(route.into_iter().cloned().collect())
    }

    /// Route as hub ids
    pub fn route_ids(&self, origin_id: HubId, district: &str) -> TopologyResult<Vec<HubId>> {
        Ok(self
            .generate_route(origin_id, district)?
            .into_iter()
            .map(|h| h.id)
            .collect())
    }

    fn mega_hub(&self, district: &str) -> TopologyResult<&'a Hub> {
        self.graph.active_hub_for_district(district)
    }
}
