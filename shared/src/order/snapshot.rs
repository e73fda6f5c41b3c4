//! Order snapshot - current order state plus its full timeline

use super::event::{TrackingEvent, TrackingEventType};
use super::types::{DeliveryType, Destination, LineItem, Payment, ReservationState};
use crate::hub::HubId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fulfillment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    ArrivedAtHub,
    InTransit,
    OutForDelivery,
    ReadyForCollection,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Progress rank. Cancelled sits outside the ladder and is handled
    /// separately by derivation.
    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Approved => 1,
            OrderStatus::ArrivedAtHub => 2,
            OrderStatus::InTransit => 3,
            OrderStatus::OutForDelivery | OrderStatus::ReadyForCollection => 4,
            OrderStatus::Delivered => 5,
            OrderStatus::Cancelled => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Allowed single-step transitions
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if next == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Pending, Approved)
                | (Approved, ArrivedAtHub)
                | (Approved, InTransit)
                | (Approved, OutForDelivery)
                | (ArrivedAtHub, OutForDelivery)
                | (ArrivedAtHub, ReadyForCollection)
                | (InTransit, Approved)
                | (InTransit, ArrivedAtHub)
                | (OutForDelivery, Delivered)
                | (ReadyForCollection, Delivered)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::ArrivedAtHub => "ARRIVED_AT_HUB",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::ReadyForCollection => "READY_FOR_COLLECTION",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: String,
    /// 订单号 HN{yyyymmdd}{n}
    pub order_number: String,
    pub items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub delivery_type: DeliveryType,
    pub destination: Option<Destination>,
    pub status: OrderStatus,
    /// Hub ids, origin first
    pub route: Vec<HubId>,
    pub fulfilling_hub: Option<HubId>,
    pub current_hub: Option<HubId>,
    #[serde(default)]
    pub reservation: ReservationState,
    #[serde(default)]
    pub payment: Payment,
    #[serde(default)]
    pub timeline: Vec<TrackingEvent>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Sequence of the last applied event
    #[serde(default)]
    pub last_sequence: u64,
}

impl OrderSnapshot {
    pub fn new(order_id: String) -> Self {
        let now = crate::util::now_millis();
        Self {
            order_id,
            order_number: String::new(),
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            delivery_type: DeliveryType::HomeDelivery,
            destination: None,
            status: OrderStatus::Pending,
            route: Vec::new(),
            fulfilling_hub: None,
            current_hub: None,
            reservation: ReservationState::default(),
            payment: Payment::default(),
            timeline: Vec::new(),
            created_at: now,
            updated_at: now,
            last_sequence: 0,
        }
    }

    /// Append an event to the timeline (appliers call this first)
    pub fn record(&mut self, event: &TrackingEvent) {
        self.timeline.push(event.clone());
        self.updated_at = event.timestamp;
        self.last_sequence = event.sequence;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn final_hub(&self) -> Option<HubId> {
        self.route.last().copied()
    }

    pub fn route_index(&self, hub_id: HubId) -> Option<usize> {
        self.route.iter().position(|h| *h == hub_id)
    }

    pub fn next_hub_after(&self, hub_id: HubId) -> Option<HubId> {
        let index = self.route_index(hub_id)?;
        self.route.get(index + 1).copied()
    }

    /// Hubs not yet left behind (current hub onwards)
    pub fn remaining_route(&self) -> &[HubId] {
        match self.current_hub.and_then(|h| self.route_index(h)) {
            Some(index) => &self.route[index..],
            None => &self.route,
        }
    }

    /// Last timeline event of the given type at the given hub
    pub fn find_event(&self, event_type: TrackingEventType, hub_id: HubId) -> Option<&TrackingEvent> {
        self.timeline
            .iter()
            .rev()
            .find(|e| e.event_type == event_type && e.hub_id == Some(hub_id))
    }

    pub fn is_collection(&self) -> bool {
        self.delivery_type == DeliveryType::HubCollection
    }
}
