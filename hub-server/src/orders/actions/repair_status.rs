//! RepairStatus command handler
//!
//! Records a `STATUS_REPAIRED` event when the stored status disagrees with
//! the one the timeline implies. The manager re-derives the status after
//! applying it.

use shared::order::{EventPayload, TrackingEvent, TrackingEventType, status_drift};

use super::new_event;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

/// RepairStatus action
#[derive(Debug, Clone)]
pub struct RepairStatusAction {
    pub order_id: String,
}

impl CommandHandler for RepairStatusAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;
        let Some((from, to)) = status_drift(&order) else {
            return Ok(Vec::new());
        };

        tracing::warn!(order_id = %self.order_id, %from, %to, "Repairing status drift");
        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            TrackingEventType::StatusRepaired,
            order.current_hub,
            format!("Status corrected from {from} to {to}"),
            EventPayload::StatusRepaired { from, to },
        );
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::testing::*;
    use shared::order::OrderStatus;

    #[test]
    fn test_drifted_status_repaired() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_home("order-1", "Kannur", 1);
        fx.dispatch("order-1", KOTTAYAM).unwrap();
        fx.scan("order-1", ERNAKULAM).unwrap();

        // stale status written by an older process
        let mut stale = fx.order("order-1");
        stale.status = OrderStatus::InTransit;
        let txn = fx.storage.begin_write().unwrap();
        fx.storage.store_snapshot(&txn, &stale).unwrap();
        txn.commit().unwrap();

        let (events, _) = fx
            .run(RepairStatusAction {
                order_id: "order-1".into(),
            })
            .unwrap();
        assert_eq!(
            events[0].payload,
            EventPayload::StatusRepaired {
                from: OrderStatus::InTransit,
                to: OrderStatus::Approved
            }
        );
        assert_eq!(fx.order("order-1").status, OrderStatus::Approved);
    }

    #[test]
    fn test_consistent_order_untouched() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_home("order-1", "Kannur", 1);
        let (events, _) = fx
            .run(RepairStatusAction {
                order_id: "order-1".into(),
            })
            .unwrap();
        assert!(events.is_empty());
    }
}
