//! PrepareCollection command handler
//!
//! Stores a new collection code digest. The first call for an order that
//! has arrived at its collection hub also marks it ready for collection;
//! later calls only replace the digest.

use shared::order::{EventPayload, OrderStatus, TrackingEvent, TrackingEventType};

use super::{ensure_open, ensure_transition, fulfill_if_reserved_at, new_event};
use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, SideEffect,
};
use crate::services::HubNotice;

/// PrepareCollection action
#[derive(Debug, Clone)]
pub struct PrepareCollectionAction {
    pub order_id: String,
    /// SHA-256 digest of the code (the plain code never reaches storage)
    pub code_digest: String,
}

impl CommandHandler for PrepareCollectionAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        let order = ctx.load_snapshot(&self.order_id)?;
        ensure_open(&order)?;

        if !order.is_collection() {
            return Err(OrderError::InvalidOperation(format!(
                "order {} is not a hub collection order",
                self.order_id
            )));
        }

        match order.status {
            OrderStatus::ReadyForCollection => {
                // 重新生成：旧码作废
                ctx.storage()
                    .store_collection_code(ctx.txn(), &self.order_id, &self.code_digest)?;
                Ok(Vec::new())
            }
            OrderStatus::ArrivedAtHub => {
                ensure_transition(&order, order.status, OrderStatus::ReadyForCollection)?;
                let hub_id = order.current_hub.ok_or_else(|| {
                    OrderError::InvalidOperation(format!("order {} has no current hub", self.order_id))
                })?;

                ctx.storage()
                    .store_collection_code(ctx.txn(), &self.order_id, &self.code_digest)?;
                let stock_fulfilled = fulfill_if_reserved_at(ctx, &order, hub_id)?;
                ctx.push_effect(SideEffect::NotifyHub {
                    hub_id,
                    order_id: self.order_id.clone(),
                    notice: HubNotice::ReadyForCollection,
                });

                let event = new_event(
                    ctx,
                    metadata,
                    &self.order_id,
                    TrackingEventType::ReadyForCollection,
                    Some(hub_id),
                    "Ready for collection",
                    EventPayload::ReadyForCollection { stock_fulfilled },
                );
                Ok(vec![event])
            }
            status => Err(OrderError::CollectionNotAvailable {
                order_id: self.order_id.clone(),
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::collection::hash_code;
    use crate::orders::actions::testing::*;

    fn prepare(fx: &Fixture, order_id: &str, code: &str) -> Result<Vec<TrackingEvent>, OrderError> {
        fx.run(PrepareCollectionAction {
            order_id: order_id.to_string(),
            code_digest: hash_code(order_id, code),
        })
        .map(|(events, _)| events)
    }

    #[test]
    fn test_prepare_marks_ready_once() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_collection("order-1", THRISSUR, 1);
        fx.walk_to_final("order-1");

        assert_eq!(prepare(&fx, "order-1", "111111").unwrap().len(), 1);
        assert_eq!(fx.order("order-1").status, OrderStatus::ReadyForCollection);

        // regeneration appends nothing
        assert!(prepare(&fx, "order-1", "222222").unwrap().is_empty());
        assert!(fx.storage.has_collection_code("order-1").unwrap());
    }

    #[test]
    fn test_prepare_before_arrival_rejected() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_collection("order-1", THRISSUR, 1);
        assert!(matches!(
            prepare(&fx, "order-1", "111111"),
            Err(OrderError::CollectionNotAvailable {
                status: OrderStatus::Approved,
                ..
            })
        ));
        assert!(!fx.storage.has_collection_code("order-1").unwrap());
    }

    #[test]
    fn test_prepare_home_delivery_rejected() {
        let fx = Fixture::new();
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_home("order-1", "Kollam", 1);
        fx.walk_to_final("order-1");
        assert!(matches!(
            prepare(&fx, "order-1", "111111"),
            Err(OrderError::InvalidOperation(_))
        ));
    }
}
