//! VerifyCollection command handler
//!
//! Compare-and-consume: the digest check, the code removal and the
//! `DELIVERED` event commit together, so a code verifies at most once.

use shared::order::{EventPayload, OrderStatus, TrackingEvent, TrackingEventType};

use super::{ensure_open, fulfill_if_reserved_at, new_event};
use crate::orders::collection::hash_code;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};

/// VerifyCollection action
#[derive(Debug, Clone)]
pub struct VerifyCollectionAction {
    pub order_id: String,
    pub code: String,
}

impl CommandHandler for VerifyCollectionAction {
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
        if order.status != OrderStatus::ReadyForCollection {
            return Err(OrderError::CollectionNotAvailable {
                order_id: self.order_id.clone(),
                status: order.status,
            });
        }

        let stored = ctx
            .storage()
            .get_collection_code_txn(ctx.txn(), &self.order_id)?
            .ok_or_else(|| OrderError::CollectionNotAvailable {
                order_id: self.order_id.clone(),
                status: order.status,
            })?;
        if hash_code(&self.order_id, &self.code) != stored {
            return Err(OrderError::InvalidCollectionCode(self.order_id.clone()));
        }

        ctx.storage()
            .remove_collection_code(ctx.txn(), &self.order_id)?;

        let stock_fulfilled = match order.reservation.hub_id {
            Some(hub_id) => fulfill_if_reserved_at(ctx, &order, hub_id)?,
            None => false,
        };

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            TrackingEventType::Delivered,
            order.current_hub,
            "Collected by customer",
            EventPayload::Delivered {
                stock_fulfilled,
                via_collection: true,
            },
        );
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::PrepareCollectionAction;
    use crate::orders::actions::testing::*;

    fn ready(fx: &Fixture, order_id: &str, code: &str) {
        fx.stock(KOTTAYAM, 1, 10);
        fx.place_collection(order_id, THRISSUR, 1);
        fx.walk_to_final(order_id);
        fx.run(PrepareCollectionAction {
            order_id: order_id.to_string(),
            code_digest: hash_code(order_id, code),
        })
        .unwrap();
    }

    fn verify(fx: &Fixture, order_id: &str, code: &str) -> Result<Vec<TrackingEvent>, OrderError> {
        fx.run(VerifyCollectionAction {
            order_id: order_id.to_string(),
            code: code.to_string(),
        })
        .map(|(events, _)| events)
    }

    #[test]
    fn test_correct_code_delivers_once() {
        let fx = Fixture::new();
        ready(&fx, "order-1", "482913");

        verify(&fx, "order-1", "482913").unwrap();
        let order = fx.order("order-1");
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(!fx.storage.has_collection_code("order-1").unwrap());

        assert!(matches!(
            verify(&fx, "order-1", "482913"),
            Err(OrderError::AlreadyDelivered(_))
        ));
    }

    #[test]
    fn test_wrong_code_consumes_nothing() {
        let fx = Fixture::new();
        ready(&fx, "order-1", "482913");

        assert!(matches!(
            verify(&fx, "order-1", "000000"),
            Err(OrderError::InvalidCollectionCode(_))
        ));
        assert!(fx.storage.has_collection_code("order-1").unwrap());
        verify(&fx, "order-1", "482913").unwrap();
    }

    #[test]
    fn test_regenerated_code_replaces_old() {
        let fx = Fixture::new();
        ready(&fx, "order-1", "111111");
        fx.run(PrepareCollectionAction {
            order_id: "order-1".into(),
            code_digest: hash_code("order-1", "222222"),
        })
        .unwrap();

        assert!(matches!(
            verify(&fx, "order-1", "111111"),
            Err(OrderError::InvalidCollectionCode(_))
        ));
        verify(&fx, "order-1", "222222").unwrap();
    }
}
