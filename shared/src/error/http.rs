//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::InventoryNotFound
            | Self::HubNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (拒绝的状态迁移，附带冲突事件)
            Self::OrderAlreadyCancelled
            | Self::OrderAlreadyDelivered
            | Self::InvalidStateTransition
            | Self::AlreadyDispatched
            | Self::AlreadyScanned
            | Self::OrderNotAtHub
            | Self::AlreadyRefunded
            | Self::InsufficientStock
            | Self::HubInUse => StatusCode::CONFLICT,

            // 422 Unprocessable (拓扑或库存数据本身有问题)
            Self::NoRoute
            | Self::AmbiguousZone
            | Self::DuplicateDistrictHub
            | Self::TopologyInvalid
            | Self::HubInactive
            | Self::InventoryIntegrity => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::StorageFull
            | Self::StorageCorrupted
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
