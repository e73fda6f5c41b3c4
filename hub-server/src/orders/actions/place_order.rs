//! PlaceOrder command handler
//!
//! Resolves the destination, computes the route from the origin warehouse
//! and reserves stock at the fulfilling hub (route[0]) in the same
//! transaction. A shortfall holds the order instead of failing it.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::hub::HubId;
use shared::inventory::ProductId;
use shared::order::{
    DeliveryType, Destination, EventPayload, LineItem, Payment, ReservationOutcome,
    ShippingAddress, TrackingEvent, TrackingEventType,
};

use super::new_event;
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, SideEffect,
};
use crate::services::HubNotice;
use crate::topology::{HubGraph, RouteGenerator, TopologyError};

/// PlaceOrder action
#[derive(Debug, Clone)]
pub struct PlaceOrderAction {
    pub order_id: String,
    /// Pre-generated outside the transaction
    pub order_number: String,
    pub items: Vec<LineItem>,
    pub delivery_type: DeliveryType,
    pub shipping_address: Option<ShippingAddress>,
    pub collection_hub_id: Option<HubId>,
    pub payment: Payment,
}

impl PlaceOrderAction {
    /// Checks every line and returns the order total
    fn validate_items(&self) -> Result<Decimal, OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let mut total = Decimal::ZERO;
        let mut demand: BTreeMap<ProductId, i64> = BTreeMap::new();
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(OrderError::Validation(format!(
                    "quantity for product {} must be positive, got {}",
                    item.product_id, item.quantity
                )));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(OrderError::Validation(format!(
                    "unit price for product {} must not be negative",
                    item.product_id
                )));
            }
            total = item
                .line_total()
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| {
                    OrderError::Validation(format!(
                        "order total out of range at product {}",
                        item.product_id
                    ))
                })?;
            // 同一商品多行合并后也不能溢出
            let requested = demand.entry(item.product_id).or_insert(0);
            *requested = requested.checked_add(item.quantity).ok_or_else(|| {
                OrderError::Validation(format!(
                    "total quantity for product {} out of range",
                    item.product_id
                ))
            })?;
        }
        Ok(total)
    }

    /// Destination plus the district the route is computed for
    fn resolve_destination(&self, graph: &HubGraph) -> Result<(Destination, String), OrderError> {
        match self.delivery_type {
            DeliveryType::HomeDelivery => {
                let address = self.shipping_address.as_ref().ok_or_else(|| {
                    OrderError::Validation("shipping address is required for home delivery".into())
                })?;
                let district = address.routing_district().trim().to_string();
                if district.is_empty() {
                    return Err(OrderError::Validation(
                        "shipping address has no district".into(),
                    ));
                }
                Ok((
                    Destination::Address {
                        address: address.clone(),
                    },
                    district,
                ))
            }
            DeliveryType::HubCollection => {
                let hub_id = self.collection_hub_id.ok_or_else(|| {
                    OrderError::Validation("collection hub is required for hub collection".into())
                })?;
                let hub = graph.hub(hub_id).ok_or(OrderError::HubNotFound(hub_id))?;
                if !hub.active {
                    return Err(TopologyError::HubInactive(hub_id).into());
                }
                Ok((Destination::CollectionHub { hub_id }, hub.district.clone()))
            }
        }
    }
}

impl CommandHandler for PlaceOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        // 1. Validate items
        let total_amount = self.validate_items()?;

        if ctx
            .storage()
            .get_snapshot_txn(ctx.txn(), &self.order_id)?
            .is_some()
        {
            return Err(OrderError::InvalidOperation(format!(
                "order {} already exists",
                self.order_id
            )));
        }

        // 2. Destination and route
        let (destination, district) = self.resolve_destination(ctx.graph())?;
        let origin = ctx.graph().origin_warehouse()?.id;
        let route = RouteGenerator::new(ctx.graph()).route_ids(origin, &district)?;
        if let Destination::CollectionHub { hub_id } = &destination
            && route.last() != Some(hub_id)
        {
            return Err(OrderError::InvalidOperation(format!(
                "collection hub {hub_id} is not the active hub for {district}"
            )));
        }
        let fulfilling_hub = *route
            .first()
            .ok_or_else(|| OrderError::InvalidOperation("route is empty".into()))?;

        // 3. PENDING
        let placed = new_event(
            ctx,
            metadata,
            &self.order_id,
            TrackingEventType::Pending,
            Some(fulfilling_hub),
            format!("Order placed, {} hops to {}", route.len() - 1, district),
            EventPayload::OrderPlaced {
                order_number: self.order_number.clone(),
                items: self.items.clone(),
                total_amount,
                delivery_type: self.delivery_type,
                destination,
                route,
                fulfilling_hub_id: fulfilling_hub,
                payment: self.payment.clone(),
            },
        );
        let mut events = vec![placed];

        // 4. Reserve at the fulfilling hub
        let outcome = ctx
            .coordinator()
            .reserve_order_txn(ctx.txn(), fulfilling_hub, &self.items)?;
        match outcome {
            ReservationOutcome::Reserved => {
                events.push(new_event(
                    ctx,
                    metadata,
                    &self.order_id,
                    TrackingEventType::Approved,
                    Some(fulfilling_hub),
                    "Stock reserved",
                    EventPayload::StockReserved {
                        hub_id: fulfilling_hub,
                    },
                ));
            }
            ReservationOutcome::PendingStock { shortfalls } => {
                let requests = ctx.coordinator().restock_requests(
                    fulfilling_hub,
                    &self.order_id,
                    &shortfalls,
                );
                ctx.push_effect(SideEffect::RaiseRestock(requests));
                ctx.push_effect(SideEffect::NotifyHub {
                    hub_id: fulfilling_hub,
                    order_id: self.order_id.clone(),
                    notice: HubNotice::StockShortfall,
                });
                events.push(new_event(
                    ctx,
                    metadata,
                    &self.order_id,
                    TrackingEventType::StockShortfall,
                    Some(fulfilling_hub),
                    format!("Awaiting restock for {} product(s)", shortfalls.len()),
                    EventPayload::StockShortfall {
                        hub_id: fulfilling_hub,
                        shortfalls,
                    },
                ));
            }
        }

        Ok(events)
    }
}
