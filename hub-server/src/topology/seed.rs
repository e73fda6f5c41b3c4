//! Topology seed document
//!
//! Loaded from `HUB_TOPOLOGY_PATH` when set, otherwise the built-in Kerala
//! network is used.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared::hub::{Hub, HubTier, Zone};

use super::error::TopologyResult;
use super::graph::HubGraph;

/// Default origin warehouse district
pub const DEFAULT_ORIGIN_DISTRICT: &str = "Kottayam";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyDocument {
    #[serde(default = "default_origin")]
    pub origin_district: String,
    pub zones: Vec<Zone>,
    pub hubs: Vec<Hub>,
}

fn default_origin() -> String {
    DEFAULT_ORIGIN_DISTRICT.to_string()
}

impl TopologyDocument {
    pub fn load(path: impl AsRef<Path>) -> TopologyResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn into_graph(self) -> HubGraph {
        HubGraph::new(self.hubs, self.zones, self.origin_district)
    }
}

/// Kerala hub network (14 districts, two zones)
pub fn kerala_network() -> TopologyDocument {
    use HubTier::*;

    let hubs = [
        ("Kannur", RegionalHub),
        ("Kasaragod", RegionalHub),
        ("Wayanad", RegionalHub),
        ("Kozhikode", MegaHub),
        ("Malappuram", RegionalHub),
        ("Palakkad", RegionalHub),
        ("Thrissur", RegionalHub),
        ("Ernakulam", MegaHub),
        ("Kottayam", Warehouse),
        ("Pathanamthitta", RegionalHub),
        ("Alappuzha", RegionalHub),
        ("Kollam", RegionalHub),
        ("Thiruvananthapuram", RegionalHub),
        ("Idukki", RegionalHub),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (district, tier))| {
        let seq = i as i32 + 1;
        let name = match tier {
            MegaHub => format!("{district} Mega Hub"),
            Warehouse => format!("{district} Warehouse"),
            _ => format!("{district} Hub"),
        };
        Hub::new(seq as i64, name, district, tier).with_sequence(seq)
    })
    .collect();

    let zones = vec![
        Zone::new(
            "SOUTH_CENTRAL",
            "Ernakulam",
            [
                "Thiruvananthapuram",
                "Kollam",
                "Alappuzha",
                "Pathanamthitta",
                "Kottayam",
                "Idukki",
                "Ernakulam",
                "Thrissur",
                "Palakkad",
            ],
        ),
        Zone::new(
            "NORTH",
            "Kozhikode",
            ["Malappuram", "Kozhikode", "Wayanad", "Kannur", "Kasaragod"],
        ),
    ];

    TopologyDocument {
        origin_district: DEFAULT_ORIGIN_DISTRICT.to_string(),
        zones,
        hubs,
    }
}
