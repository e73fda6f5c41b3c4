//! Tracking events - append-only facts on an order's timeline

use super::snapshot::OrderStatus;
use super::types::{DeliveryType, Destination, LineItem, Payment, RefundStatus};
use crate::hub::HubId;
use crate::inventory::StockShortfall;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tracking event - immutable timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (authoritative ordering)
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Event type (the timeline "status" column)
    pub event_type: TrackingEventType,
    /// Hub where the event happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_id: Option<HubId>,
    /// Human readable location (hub name snapshot)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub description: String,
    /// Command that triggered this event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingEventType {
    // Status-bearing
    Pending,
    Approved,
    ArrivedAtHub,
    InTransit,
    OutForDelivery,
    ReadyForCollection,
    Delivered,
    Cancelled,

    // Non-advancing
    StockShortfall,
    StatusRepaired,
    RouteReassigned,
    RefundUpdated,
}

impl TrackingEventType {
    /// Whether this event type takes part in status derivation
    pub fn is_status_bearing(&self) -> bool {
        !matches!(
            self,
            TrackingEventType::StockShortfall
                | TrackingEventType::StatusRepaired
                | TrackingEventType::RouteReassigned
                | TrackingEventType::RefundUpdated
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingEventType::Pending => "PENDING",
            TrackingEventType::Approved => "APPROVED",
            TrackingEventType::ArrivedAtHub => "ARRIVED_AT_HUB",
            TrackingEventType::InTransit => "IN_TRANSIT",
            TrackingEventType::OutForDelivery => "OUT_FOR_DELIVERY",
            TrackingEventType::ReadyForCollection => "READY_FOR_COLLECTION",
            TrackingEventType::Delivered => "DELIVERED",
            TrackingEventType::Cancelled => "CANCELLED",
            TrackingEventType::StockShortfall => "STOCK_SHORTFALL",
            TrackingEventType::StatusRepaired => "STATUS_REPAIRED",
            TrackingEventType::RouteReassigned => "ROUTE_REASSIGNED",
            TrackingEventType::RefundUpdated => "REFUND_UPDATED",
        }
    }
}

impl std::fmt::Display for TrackingEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderPlaced {
        order_number: String,
        items: Vec<LineItem>,
        total_amount: Decimal,
        delivery_type: DeliveryType,
        destination: Destination,
        route: Vec<HubId>,
        fulfilling_hub_id: HubId,
        payment: Payment,
    },
    StockReserved {
        hub_id: HubId,
    },
    StockShortfall {
        hub_id: HubId,
        shortfalls: Vec<StockShortfall>,
    },
    ArrivedAtHub {
        route_index: usize,
    },
    Dispatched {
        next_hub_id: HubId,
        stock_fulfilled: bool,
    },
    OutForDelivery {
        stock_fulfilled: bool,
    },
    ReadyForCollection {
        stock_fulfilled: bool,
    },
    Delivered {
        stock_fulfilled: bool,
        via_collection: bool,
    },
    Cancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        stock_released: bool,
        refund_pending: bool,
    },
    StatusRepaired {
        from: OrderStatus,
        to: OrderStatus,
    },
    RouteReassigned {
        from_hub_id: HubId,
        to_hub_id: HubId,
        route: Vec<HubId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_hub_id: Option<HubId>,
    },
    RefundUpdated {
        status: RefundStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        refund_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<Decimal>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl TrackingEvent {
    /// Create a new event; the server timestamp is always taken here
    pub fn new(
        sequence: u64,
        order_id: impl Into<String>,
        event_type: TrackingEventType,
        hub_id: Option<HubId>,
        description: impl Into<String>,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id: order_id.into(),
            event_type,
            hub_id,
            location: None,
            timestamp: crate::util::now_millis(),
            description: description.into(),
            command_id: None,
            payload,
        }
    }

    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_command_id(mut self, command_id: Option<String>) -> Self {
        self.command_id = command_id;
        self
    }

    /// Short reference used in rejection messages
    pub fn describe_ref(&self) -> String {
        match self.hub_id {
            Some(hub) => format!("{} at hub {} (seq {})", self.event_type, hub, self.sequence),
            None => format!("{} (seq {})", self.event_type, self.sequence),
        }
    }
}
