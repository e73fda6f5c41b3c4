//! DispatchFromHub command handler
//!
//! Goods leave a hub: `IN_TRANSIT` towards the next route hub, or
//! `OUT_FOR_DELIVERY` from the final hub of a home delivery. Stock
//! reserved at the hub is fulfilled in the same transaction.

use shared::hub::HubId;
use shared::order::{EventPayload, OrderStatus, TrackingEvent, TrackingEventType};

use super::{ensure_open, ensure_transition, fulfill_if_reserved_at, new_event};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, SideEffect,
};
use crate::services::HubNotice;

/// DispatchFromHub action
#[derive(Debug, Clone)]
pub struct DispatchFromHubAction {
    pub order_id: String,
    pub hub_id: HubId,
}

impl CommandHandler for DispatchFromHubAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;

        // 1. Already left this hub? Checked before anything else so a
        //    double dispatch always names the earlier event.
        let prior = order
            .find_event(TrackingEventType::InTransit, self.hub_id)
            .or_else(|| order.find_event(TrackingEventType::OutForDelivery, self.hub_id));
        if let Some(prior) = prior {
            return Err(OrderError::AlreadyDispatched {
                order_id: self.order_id.clone(),
                hub_id: self.hub_id,
                event_type: prior.event_type,
                sequence: prior.sequence,
            });
        }

        ensure_open(&order)?;

        // 2. Must be on the route and physically here
        let index = order
            .route_index(self.hub_id)
            .ok_or_else(|| OrderError::HubNotOnRoute {
                order_id: self.order_id.clone(),
                hub_id: self.hub_id,
            })?;
        if order.current_hub != Some(self.hub_id) {
            return Err(OrderError::OrderNotAtHub {
                order_id: self.order_id.clone(),
                hub_id: self.hub_id,
                current_hub: order.current_hub,
            });
        }

        // 3. Next hop or last mile
        let next_hub = order.route.get(index + 1).copied();
        let target = match next_hub {
            Some(_) => OrderStatus::InTransit,
            None if order.is_collection() => {
                return Err(OrderError::InvalidOperation(format!(
                    "order {} is collected at hub {}, not dispatched",
                    self.order_id, self.hub_id
                )));
            }
            None => OrderStatus::OutForDelivery,
        };
        ensure_transition(&order, order.status, target)?;

        // 4. Stock leaves the fulfilling hub
        let stock_fulfilled = fulfill_if_reserved_at(ctx, &order, self.hub_id)?;

        let event = match next_hub {
            Some(next_hub_id) => {
                ctx.push_effect(SideEffect::NotifyHub {
                    hub_id: next_hub_id,
                    order_id: self.order_id.clone(),
                    notice: HubNotice::Incoming,
                });
                let description = match ctx.hub_name(next_hub_id) {
                    Some(name) => format!("Dispatched to {name}"),
                    None => format!("Dispatched to hub {next_hub_id}"),
                };
                new_event(
                    ctx,
                    metadata,
                    &self.order_id,
                    TrackingEventType::InTransit,
                    Some(self.hub_id),
                    description,
                    EventPayload::Dispatched {
                        next_hub_id,
                        stock_fulfilled,
                    },
                )
            }
            None => new_event(
                ctx,
                metadata,
                &self.order_id,
                TrackingEventType::OutForDelivery,
                Some(self.hub_id),
                "Out for delivery",
                EventPayload::OutForDelivery { stock_fulfilled },
            ),
        };

        Ok(vec![event])
    }
}
