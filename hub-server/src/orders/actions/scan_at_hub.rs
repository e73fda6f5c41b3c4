//! ScanAtHub command handler
//!
//! Records goods arriving at a hub on the order's route. The hub must be
//! the current hub (first hop) or the next hop after a recorded dispatch.

use shared::hub::HubId;
use shared::order::{
    EventPayload, OrderStatus, ReservationStatus, TrackingEvent, TrackingEventType,
    dispatched_from,
};

use super::{ensure_open, ensure_transition, new_event, retry_held_reservation};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

/// ScanAtHub action
#[derive(Debug, Clone)]
pub struct ScanAtHubAction {
    pub order_id: String,
    pub hub_id: HubId,
}

impl CommandHandler for ScanAtHubAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;
        ensure_open(&order)?;

        let index = order
            .route_index(self.hub_id)
            .ok_or_else(|| OrderError::HubNotOnRoute {
                order_id: self.order_id.clone(),
                hub_id: self.hub_id,
            })?;

        if let Some(prior) = order.find_event(TrackingEventType::ArrivedAtHub, self.hub_id) {
            return Err(OrderError::AlreadyScanned {
                order_id: self.order_id.clone(),
                hub_id: self.hub_id,
                sequence: prior.sequence,
            });
        }

        // 上一站必须已发出
        let arrived_from_previous = match index {
            0 => order.current_hub == Some(self.hub_id),
            _ => {
                let previous = order.route[index - 1];
                order.current_hub == Some(previous) && dispatched_from(&order, previous)
            }
        };
        if !arrived_from_previous {
            return Err(OrderError::OrderNotAtHub {
                order_id: self.order_id.clone(),
                hub_id: self.hub_id,
                current_hub: order.current_hub,
            });
        }

        let mut events = Vec::new();
        let mut status = order.status;

        // A held order scanned at its fulfilling hub gets another reservation try
        if order.reservation.status == ReservationStatus::Held
            && order.reservation.hub_id == Some(self.hub_id)
        {
            match retry_held_reservation(ctx, metadata, &order, self.hub_id)? {
                Some(approved) => {
                    events.push(approved);
                    status = OrderStatus::Approved;
                }
                None => return Ok(events),
            }
        }

        let target = if order.final_hub() == Some(self.hub_id) {
            OrderStatus::ArrivedAtHub
        } else {
            OrderStatus::Approved
        };
        ensure_transition(&order, status, target)?;

        events.push(new_event(
            ctx,
            metadata,
            &self.order_id,
            TrackingEventType::ArrivedAtHub,
            Some(self.hub_id),
            format!("Arrived at hub (stop {} of {})", index + 1, order.route.len()),
            EventPayload::ArrivedAtHub { route_index: index },
        ));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::testing::*;

    #[test]
    fn test_scan_next_hop_after_dispatch() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_home("order-1", "Kannur", 1);

        fx.dispatch("order-1", KOTTAYAM).unwrap();
        let events = fx.scan("order-1", ERNAKULAM).unwrap();

        assert_eq!(events.len(), 1);
        let order = fx.order("order-1");
        assert_eq!(order.current_hub, Some(ERNAKULAM));
        // intermediate hub: received and ready for dispatch
        assert_eq!(order.status, OrderStatus::Approved);
    }

    #[test]
    fn test_scan_before_dispatch_rejected() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_home("order-1", "Kannur", 1);

        let result = fx.scan("order-1", ERNAKULAM);
        assert!(matches!(
            result,
            Err(OrderError::OrderNotAtHub {
                current_hub: Some(KOTTAYAM),
                ..
            })
        ));
    }

    #[test]
    fn test_scan_twice_names_prior_event() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_home("order-1", "Kannur", 1);
        fx.dispatch("order-1", KOTTAYAM).unwrap();
        let first = fx.scan("order-1", ERNAKULAM).unwrap();

        match fx.scan("order-1", ERNAKULAM) {
            Err(OrderError::AlreadyScanned { sequence, .. }) => {
                assert_eq!(sequence, first[0].sequence)
            }
            other => panic!("Expected AlreadyScanned, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_off_route_hub() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_home("order-1", "Kannur", 1);
        assert!(matches!(
            fx.scan("order-1", KOLLAM),
            Err(OrderError::HubNotOnRoute { .. })
        ));
    }

    #[test]
    fn test_scan_at_final_hub_sets_arrived() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_home("order-1", "Kollam", 1);
        fx.walk_to_final("order-1");

        let order = fx.order("order-1");
        assert_eq!(order.current_hub, Some(KOLLAM));
        assert_eq!(order.status, OrderStatus::ArrivedAtHub);
    }

    #[test]
    fn test_held_order_scan_at_origin_retries() {
        let fx = Fixture::new();
        fx.place_home("order-1", "Kollam", 2);
        assert_eq!(fx.order("order-1").status, OrderStatus::Pending);

        // still short: nothing recorded
        assert!(fx.scan("order-1", KOTTAYAM).unwrap().is_empty());
        assert_eq!(fx.order("order-1").timeline.len(), 2);

        fx.stock(KOTTAYAM, 1, 5);
        let events = fx.scan("order-1", KOTTAYAM).unwrap();
        assert_eq!(events[0].event_type, TrackingEventType::Approved);
        assert_eq!(events[1].event_type, TrackingEventType::ArrivedAtHub);

        let order = fx.order("order-1");
        assert_eq!(order.status, OrderStatus::Approved);
        assert_eq!(order.reservation.status, ReservationStatus::Reserved);
    }
}
