use crate::db::StorageError;
use shared::error::{AppError, ErrorCode};
use shared::hub::{HubId, HubTier};
use thiserror::Error;

/// Defect found by [`HubGraph::validate`](super::HubGraph::validate)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyDefect {
    #[error("district {district} has {} active hubs: {hub_ids:?}", hub_ids.len())]
    DuplicateDistrictHub { district: String, hub_ids: Vec<HubId> },

    #[error("hub {hub_id} district {district} belongs to no zone")]
    UnzonedDistrict { hub_id: HubId, district: String },

    #[error("district {district} belongs to several zones: {zones:?}")]
    MultiZonedDistrict { district: String, zones: Vec<String> },

    #[error("zone {zone} has no active hub in mega hub district {district}")]
    MissingMegaHub { zone: String, district: String },

    #[error("zone {zone} mega hub {hub_id} is tiered {tier:?}")]
    MegaHubWrongTier {
        zone: String,
        hub_id: HubId,
        tier: HubTier,
    },

    #[error("origin warehouse district {district} has no active hub")]
    MissingOriginWarehouse { district: String },

    #[error("origin hub {hub_id} is tiered {tier:?}, expected WAREHOUSE")]
    OriginNotWarehouse { hub_id: HubId, tier: HubTier },
}

/// Topology errors
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("No route to district {district}")]
    NoRoute { district: String },

    #[error("District {district} is in {} zones: {zones:?}", zones.len())]
    AmbiguousZone { district: String, zones: Vec<String> },

    #[error("District {district} is served by several active hubs: {hub_ids:?}")]
    DuplicateDistrictHub { district: String, hub_ids: Vec<HubId> },

    #[error("Hub not found: {0}")]
    HubNotFound(HubId),

    #[error("Hub {0} is inactive")]
    HubInactive(HubId),

    #[error("Hub {hub_id} is referenced by {open_orders} open orders")]
    HubInUse { hub_id: HubId, open_orders: usize },

    #[error("Topology invalid: {}", format_defects(.0))]
    Invalid(Vec<TopologyDefect>),

    #[error("Cannot read topology file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse topology document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn format_defects(defects: &[TopologyDefect]) -> String {
    defects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type TopologyResult<T> = Result<T, TopologyError>;

impl From<TopologyError> for AppError {
    fn from(err: TopologyError) -> Self {
        let message = err.to_string();
        match err {
            TopologyError::NoRoute { district } => {
                AppError::with_message(ErrorCode::NoRoute, message).with_detail("district", district)
            }
            TopologyError::AmbiguousZone { district, zones } => {
                AppError::with_message(ErrorCode::AmbiguousZone, message)
                    .with_detail("district", district)
                    .with_detail("zones", zones)
            }
            TopologyError::DuplicateDistrictHub { district, hub_ids } => {
                AppError::with_message(ErrorCode::DuplicateDistrictHub, message)
                    .with_detail("district", district)
                    .with_detail("hub_ids", hub_ids)
            }
            TopologyError::HubNotFound(id) => {
                AppError::with_message(ErrorCode::HubNotFound, message).with_detail("hub_id", id)
            }
            TopologyError::HubInactive(id) => {
                AppError::with_message(ErrorCode::HubInactive, message).with_detail("hub_id", id)
            }
            TopologyError::HubInUse {
                hub_id,
                open_orders,
            } => AppError::with_message(ErrorCode::HubInUse, message)
                .with_detail("hub_id", hub_id)
                .with_detail("open_orders", open_orders),
            TopologyError::Invalid(_) | TopologyError::Parse(_) => {
                AppError::with_message(ErrorCode::TopologyInvalid, message)
            }
            TopologyError::Io(_) => AppError::with_message(ErrorCode::ConfigError, message),
            TopologyError::Storage(e) => AppError::with_message(e.error_code(), message),
        }
    }
}
