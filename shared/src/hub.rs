//! Hub network types
//!
//! A [`Hub`] is a physical facility serving exactly one district. Districts
//! are statically partitioned into [`Zone`]s, each owning one mega hub.

use serde::{Deserialize, Serialize};

use crate::util::normalize_district;

pub type HubId = i64;

/// Hub tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HubTier {
    /// 源仓库，订单从这里出发
    Warehouse,
    /// 区域枢纽，跨区中转
    MegaHub,
    RegionalHub,
    LocalHub,
}

impl HubTier {
    /// Warehouse and mega hubs are reached directly from the origin.
    pub fn is_direct_destination(&self) -> bool {
        matches!(self, HubTier::Warehouse | HubTier::MegaHub)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Hub record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub name: String,
    pub district: String,
    pub tier: HubTier,
    /// 显示顺序，不参与路由
    pub sequence: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

fn default_active() -> bool {
    true
}

impl Hub {
    pub fn new(id: HubId, name: impl Into<String>, district: impl Into<String>, tier: HubTier) -> Self {
        Self {
            id,
            name: name.into(),
            district: district.into(),
            tier,
            sequence: 0,
            active: true,
            pincode: None,
            coordinates: None,
        }
    }

    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Case-insensitive district match
    pub fn serves(&self, district: &str) -> bool {
        normalize_district(&self.district) == normalize_district(district)
    }
}

/// Static partition of districts, each zone owning one mega hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub mega_hub_district: String,
    pub districts: Vec<String>,
}

impl Zone {
    pub fn new(
        name: impl Into<String>,
        mega_hub_district: impl Into<String>,
        districts: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            mega_hub_district: mega_hub_district.into(),
            districts: districts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, district: &str) -> bool {
        let wanted = normalize_district(district);
        self.districts
            .iter()
            .any(|d| normalize_district(d) == wanted)
    }
}
