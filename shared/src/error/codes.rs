//! Unified error codes for the hub network
//!
//! This module defines all error codes used by the hub server and its clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment / refund errors
//! - 6xxx: Inventory errors
//! - 7xxx: Topology errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Counter or amount outside its numeric range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been cancelled
    OrderAlreadyCancelled = 4002,
    /// Order has already been delivered
    OrderAlreadyDelivered = 4003,
    /// Status transition not allowed from the current status
    InvalidStateTransition = 4004,
    /// Order was already dispatched from this hub
    AlreadyDispatched = 4005,
    /// Order was already scanned in at this hub
    AlreadyScanned = 4006,
    /// Hub is not part of the order's route
    HubNotOnRoute = 4007,
    /// Order is not at the given hub
    OrderNotAtHub = 4008,
    /// Collection code does not match
    InvalidCollectionCode = 4009,
    /// Order is not eligible for hub collection
    CollectionNotAvailable = 4010,
    /// Order has no items
    OrderEmpty = 4011,
    /// Operation not allowed for this order
    InvalidOperation = 4012,

    // ==================== 5xxx: Payment ====================
    /// Payment was already refunded
    AlreadyRefunded = 5003,

    // ==================== 6xxx: Inventory ====================
    /// Not enough available stock
    InsufficientStock = 6001,
    /// Stored inventory row violates its invariants
    InventoryIntegrity = 6002,
    /// Fulfillment exceeds reserved or physical stock
    InvalidFulfillment = 6003,
    /// Inventory row not found
    InventoryNotFound = 6004,
    /// Quantity must be positive
    InvalidQuantity = 6005,

    // ==================== 7xxx: Topology ====================
    /// Hub not found
    HubNotFound = 7001,
    /// No route to the destination district
    NoRoute = 7002,
    /// District belongs to zero or several zones
    AmbiguousZone = 7003,
    /// More than one active hub serves the district
    DuplicateDistrictHub = 7004,
    /// Hub is referenced by open orders
    HubInUse = 7005,
    /// Topology failed validation
    TopologyInvalid = 7006,
    /// Hub is inactive
    HubInactive = 7007,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Storage full (disk space exhausted)
    StorageFull = 9401,
    /// Storage corrupted
    StorageCorrupted = 9403,
    /// System busy (IO error, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::OrderAlreadyDelivered => "Order has already been delivered",
            ErrorCode::InvalidStateTransition => "Status transition is not allowed",
            ErrorCode::AlreadyDispatched => "Order was already dispatched from this hub",
            ErrorCode::AlreadyScanned => "Order was already scanned in at this hub",
            ErrorCode::HubNotOnRoute => "Hub is not on the order's route",
            ErrorCode::OrderNotAtHub => "Order is not at this hub",
            ErrorCode::InvalidCollectionCode => "Invalid collection code",
            ErrorCode::CollectionNotAvailable => "Order is not available for collection",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::InvalidOperation => "Invalid operation",

            // Payment
            ErrorCode::AlreadyRefunded => "Payment was already refunded",

            // Inventory
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::InventoryIntegrity => "Inventory record failed integrity check",
            ErrorCode::InvalidFulfillment => "Fulfillment exceeds reserved stock",
            ErrorCode::InventoryNotFound => "Inventory record not found",
            ErrorCode::InvalidQuantity => "Quantity must be positive",

            // Topology
            ErrorCode::HubNotFound => "Hub not found",
            ErrorCode::NoRoute => "No route to destination",
            ErrorCode::AmbiguousZone => "District zone is ambiguous",
            ErrorCode::DuplicateDistrictHub => "District is served by more than one active hub",
            ErrorCode::HubInUse => "Hub is referenced by open orders",
            ErrorCode::TopologyInvalid => "Hub topology is invalid",
            ErrorCode::HubInactive => "Hub is inactive",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageFull => "Storage is full",
            ErrorCode::StorageCorrupted => "Storage is corrupted",
            ErrorCode::SystemBusy => "System is busy, please retry",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyCancelled),
            4003 => Ok(ErrorCode::OrderAlreadyDelivered),
            4004 => Ok(ErrorCode::InvalidStateTransition),
            4005 => Ok(ErrorCode::AlreadyDispatched),
            4006 => Ok(ErrorCode::AlreadyScanned),
            4007 => Ok(ErrorCode::HubNotOnRoute),
            4008 => Ok(ErrorCode::OrderNotAtHub),
            4009 => Ok(ErrorCode::InvalidCollectionCode),
            4010 => Ok(ErrorCode::CollectionNotAvailable),
            4011 => Ok(ErrorCode::OrderEmpty),
            4012 => Ok(ErrorCode::InvalidOperation),

            // Payment
            5003 => Ok(ErrorCode::AlreadyRefunded),

            // Inventory
            6001 => Ok(ErrorCode::InsufficientStock),
            6002 => Ok(ErrorCode::InventoryIntegrity),
            6003 => Ok(ErrorCode::InvalidFulfillment),
            6004 => Ok(ErrorCode::InventoryNotFound),
            6005 => Ok(ErrorCode::InvalidQuantity),

            // Topology
            7001 => Ok(ErrorCode::HubNotFound),
            7002 => Ok(ErrorCode::NoRoute),
            7003 => Ok(ErrorCode::AmbiguousZone),
            7004 => Ok(ErrorCode::DuplicateDistrictHub),
            7005 => Ok(ErrorCode::HubInUse),
            7006 => Ok(ErrorCode::TopologyInvalid),
            7007 => Ok(ErrorCode::HubInactive),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
