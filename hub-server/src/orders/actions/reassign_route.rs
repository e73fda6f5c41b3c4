//! ReassignRoute command handler
//!
//! Swaps a hub that is still ahead of the order for another one. Orders
//! physically at the hub, or with stock held there, cannot be moved.

use shared::hub::HubId;
use shared::order::{
    Destination, EventPayload, ReservationStatus, TrackingEvent, TrackingEventType, route_ahead,
};

use super::{ensure_open, new_event};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

/// ReassignRoute action
#[derive(Debug, Clone)]
pub struct ReassignRouteAction {
    pub order_id: String,
    pub from_hub_id: HubId,
    pub to_hub_id: HubId,
}

impl CommandHandler for ReassignRouteAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;
        ensure_open(&order)?;

        if !route_ahead(&order).contains(&self.from_hub_id) {
            return Ok(Vec::new());
        }
        if ctx.graph().hub(self.to_hub_id).is_none() {
            return Err(OrderError::HubNotFound(self.to_hub_id));
        }
        if order.current_hub == Some(self.from_hub_id) {
            return Err(OrderError::InvalidOperation(format!(
                "order {} is at hub {}",
                self.order_id, self.from_hub_id
            )));
        }
        if order.reservation.hub_id == Some(self.from_hub_id)
            && matches!(
                order.reservation.status,
                ReservationStatus::Reserved | ReservationStatus::Held
            )
        {
            return Err(OrderError::InvalidOperation(format!(
                "order {} has stock allocated at hub {}",
                self.order_id, self.from_hub_id
            )));
        }

        // Only the part of the route still ahead changes
        let split = order
            .current_hub
            .and_then(|h| order.route_index(h))
            .map(|i| i + 1)
            .unwrap_or(0);
        let mut route: Vec<HubId> = order.route[..split].to_vec();
        route.extend(order.route[split..].iter().map(|&h| {
            if h == self.from_hub_id {
                self.to_hub_id
            } else {
                h
            }
        }));
        route.dedup();

        let mut seen = std::collections::HashSet::new();
        if !route.iter().all(|h| seen.insert(*h)) {
            return Err(OrderError::InvalidOperation(format!(
                "rerouting order {} through hub {} would revisit a hub",
                self.order_id, self.to_hub_id
            )));
        }

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            TrackingEventType::RouteReassigned,
            Some(self.from_hub_id),
            format!(
                "Route moved from hub {} to hub {}",
                self.from_hub_id, self.to_hub_id
            ),
            EventPayload::RouteReassigned {
                from_hub_id: self.from_hub_id,
                to_hub_id: self.to_hub_id,
                route,
                current_hub_id: order.current_hub,
            },
        );
        Ok(vec![event])
    }
}

/// Collection orders follow their hub
pub(crate) fn reassigned_destination(
    destination: &Option<Destination>,
    from_hub_id: HubId,
    to_hub_id: HubId,
) -> Option<Destination> {
    match destination {
        Some(Destination::CollectionHub { hub_id }) if *hub_id == from_hub_id => {
            Some(Destination::CollectionHub { hub_id: to_hub_id })
        }
        other => other.clone(),
    }
}
