//! Cancelled event applier
//!
//! Releases the reservation state and opens the refund when one is due.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, RefundStatus, ReservationStatus, TrackingEvent};

/// OrderCancelled applier
pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::Cancelled {
            stock_released,
            refund_pending,
            ..
        } = &event.payload
        {
            snapshot.record(event);

            // 挂起的订单没有占用库存，同样视为释放
            if *stock_released || snapshot.reservation.status == ReservationStatus::Held {
                snapshot.reservation.status = ReservationStatus::Released;
                snapshot.reservation.shortfalls.clear();
            }

            if *refund_pending {
                snapshot.payment.refund_status = Some(RefundStatus::Pending);
                snapshot.payment.refund_amount = Some(snapshot.total_amount);
                snapshot.payment.refund_initiated_at = Some(event.timestamp);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_event;
    use rust_decimal::Decimal;
    use shared::order::TrackingEventType;

    #[test]
    fn test_cancel_opens_refund() {
        let mut snapshot = OrderSnapshot::new("order-1".into());
        snapshot.total_amount = Decimal::new(9900, 2);
        snapshot.reservation.status = ReservationStatus::Reserved;

        let event = test_event(
            4,
            TrackingEventType::Cancelled,
            Some(9),
            EventPayload::Cancelled {
                reason: Some("changed mind".into()),
                stock_released: true,
                refund_pending: true,
            },
        );
        OrderCancelledApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.reservation.status, ReservationStatus::Released);
        assert_eq!(snapshot.payment.refund_status, Some(RefundStatus::Pending));
        assert_eq!(snapshot.payment.refund_amount, Some(Decimal::new(9900, 2)));
        assert_eq!(snapshot.payment.refund_initiated_at, Some(event.timestamp));
    }

    #[test]
    fn test_cancel_after_fulfillment_keeps_state() {
        let mut snapshot = OrderSnapshot::new("order-1".into());
        snapshot.reservation.status = ReservationStatus::Fulfilled;
        let event = test_event(
            4,
            TrackingEventType::Cancelled,
            None,
            EventPayload::Cancelled {
                reason: None,
                stock_released: false,
                refund_pending: false,
            },
        );
        OrderCancelledApplier.apply(&mut snapshot, &event);
        assert_eq!(snapshot.reservation.status, ReservationStatus::Fulfilled);
        assert_eq!(snapshot.payment.refund_status, None);
    }
}
