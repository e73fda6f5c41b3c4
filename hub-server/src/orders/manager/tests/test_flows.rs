use super::*;
use crate::services::GATEWAY_NOT_CONFIGURED;

// ========================================================================
// 送货上门全流程
// ========================================================================

#[test]
fn test_home_delivery_end_to_end() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);

    let placed = manager.place_order(home_input("Kannur", 2)).unwrap();
    assert_eq!(placed.reservation, ReservationOutcome::Reserved);
    let order = placed.order;
    assert!(order.order_number.starts_with("HN"));
    assert_eq!(order.status, OrderStatus::Approved);
    assert_eq!(order.route, vec![KOTTAYAM, ERNAKULAM, KOZHIKODE, KANNUR]);
    assert_eq!(order.total_amount, Decimal::new(50000, 2));

    let order = walk_to_final(&manager, &order.order_id);
    assert_eq!(order.status, OrderStatus::ArrivedAtHub);
    assert_eq!(order.current_hub, Some(KANNUR));

    let order = manager
        .dispatch_from_hub(None, &order.order_id, KANNUR)
        .unwrap();
    assert_eq!(order.status, OrderStatus::OutForDelivery);

    let order = manager.confirm_delivery(None, &order.order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.reservation.status, ReservationStatus::Fulfilled);
    assert_eq!(
        event_types(&order),
        vec![
            TrackingEventType::Pending,
            TrackingEventType::Approved,
            TrackingEventType::InTransit,
            TrackingEventType::ArrivedAtHub,
            TrackingEventType::InTransit,
            TrackingEventType::ArrivedAtHub,
            TrackingEventType::InTransit,
            TrackingEventType::ArrivedAtHub,
            TrackingEventType::OutForDelivery,
            TrackingEventType::Delivered,
        ]
    );

    // 货物离开仓库时库存已扣减
    let record = manager.ledger().get(KOTTAYAM, 1).unwrap().unwrap();
    assert_eq!(record.quantity(), 8);
    assert_eq!(record.reserved_quantity(), 0);
}

#[test]
fn test_timeline_sequences_increase() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let first = place_home(&manager, "Kollam", 1);
    let second = place_home(&manager, "Kollam", 1);
    walk_to_final(&manager, &first.order_id);

    let first = manager.get_order(&first.order_id).unwrap();
    let sequences: Vec<u64> = first.timeline.iter().map(|e| e.sequence).collect();
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    // 全局序号：第二个订单的事件夹在中间
    assert!(second.timeline[0].sequence > first.timeline[1].sequence);
    assert!(second.timeline[0].sequence < first.timeline[2].sequence);
    assert_eq!(first.last_sequence, *sequences.last().unwrap());
}

#[test]
fn test_events_are_broadcast() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();
    stock(&manager, KOTTAYAM, 1, 10);

    let order = place_home(&manager, "Kottayam", 1);
    let pending = rx.try_recv().unwrap();
    let approved = rx.try_recv().unwrap();
    assert_eq!(pending.order_id, order.order_id);
    assert_eq!(pending.event_type, TrackingEventType::Pending);
    assert_eq!(approved.event_type, TrackingEventType::Approved);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_local_order_goes_out_from_origin() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);

    let order = place_home(&manager, "Kottayam", 1);
    assert_eq!(order.route, vec![KOTTAYAM]);

    let order = manager
        .dispatch_from_hub(None, &order.order_id, KOTTAYAM)
        .unwrap();
    assert_eq!(order.status, OrderStatus::OutForDelivery);
    assert_eq!(order.reservation.status, ReservationStatus::Fulfilled);
}

// ========================================================================
// 枢纽自提
// ========================================================================

#[test]
fn test_hub_collection_flow() {
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = create_manager_with(Collaborators {
        notifier: notifier.clone(),
        ..Collaborators::default()
    });
    stock(&manager, KOTTAYAM, 1, 10);

    let order = manager
        .place_order(collection_input(THRISSUR, 1))
        .unwrap()
        .order;
    assert_eq!(order.route, vec![KOTTAYAM, ERNAKULAM, THRISSUR]);

    let order = walk_to_final(&manager, &order.order_id);
    assert_eq!(order.status, OrderStatus::ArrivedAtHub);

    // 自提订单不能派送
    let err = manager
        .dispatch_from_hub(None, &order.order_id, THRISSUR)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Rejected(OrderError::InvalidOperation(_))
    ));

    let (code, order) = manager.generate_collection_code(&order.order_id).unwrap();
    assert_eq!(code.len(), 6);
    assert_eq!(order.status, OrderStatus::ReadyForCollection);
    assert!(
        notifier
            .notices()
            .contains(&(THRISSUR, order.order_id.clone(), HubNotice::ReadyForCollection))
    );

    let wrong = if code == "123456" { "654321" } else { "123456" };
    let err = manager
        .verify_collection(&order.order_id, wrong)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Rejected(OrderError::InvalidCollectionCode(_))
    ));
    assert_eq!(
        manager.get_order(&order.order_id).unwrap().status,
        OrderStatus::ReadyForCollection
    );

    let order = manager.verify_collection(&order.order_id, &code).unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.payment.status, PaymentStatus::Paid);
    assert!(!manager.storage.has_collection_code(&order.order_id).unwrap());

    // 码只能用一次
    assert!(manager.verify_collection(&order.order_id, &code).is_err());
}

#[test]
fn test_regenerated_code_replaces_previous() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = manager
        .place_order(collection_input(ERNAKULAM, 1))
        .unwrap()
        .order;
    walk_to_final(&manager, &order.order_id);

    let (first, _) = manager.generate_collection_code(&order.order_id).unwrap();
    let (second, order) = manager.generate_collection_code(&order.order_id).unwrap();
    assert_eq!(
        order
            .timeline
            .iter()
            .filter(|e| e.event_type == TrackingEventType::ReadyForCollection)
            .count(),
        1
    );

    if first != second {
        assert!(manager.verify_collection(&order.order_id, &first).is_err());
    }
    let order = manager.verify_collection(&order.order_id, &second).unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[test]
fn test_code_before_arrival_rejected() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = manager
        .place_order(collection_input(THRISSUR, 1))
        .unwrap()
        .order;

    let err = manager
        .generate_collection_code(&order.order_id)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Rejected(OrderError::CollectionNotAvailable {
            status: OrderStatus::Approved,
            ..
        })
    ));
}

// ========================================================================
// 缺货与补货
// ========================================================================

#[test]
fn test_shortfall_holds_order_and_raises_restock() {
    let restock = Arc::new(RecordingRestockSink::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = create_manager_with(Collaborators {
        restock: restock.clone(),
        notifier: notifier.clone(),
        ..Collaborators::default()
    });
    stock(&manager, KOTTAYAM, 1, 1);

    let placed = manager.place_order(home_input("Kannur", 3)).unwrap();
    let ReservationOutcome::PendingStock { shortfalls } = &placed.reservation else {
        panic!("expected pending stock, got {:?}", placed.reservation);
    };
    assert_eq!(shortfalls.len(), 1);
    assert_eq!(shortfalls[0].missing(), 2);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.reservation.status, ReservationStatus::Held);

    let requests = restock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].hub_id, KOTTAYAM);
    assert_eq!(requests[0].amount, 2);
    assert_eq!(requests[0].order_id.as_deref(), Some(placed.order.order_id.as_str()));
    assert!(notifier.notices().contains(&(
        KOTTAYAM,
        placed.order.order_id.clone(),
        HubNotice::StockShortfall
    )));

    // 挂起时不占用库存
    let record = manager.ledger().get(KOTTAYAM, 1).unwrap().unwrap();
    assert_eq!(record.reserved_quantity(), 0);
}

#[test]
fn test_restock_approves_held_orders_in_order() {
    let manager = create_test_manager();
    let first = place_home(&manager, "Kannur", 3);
    let second = place_home(&manager, "Kollam", 2);
    assert_eq!(first.reservation.status, ReservationStatus::Held);
    assert_eq!(second.reservation.status, ReservationStatus::Held);

    // 4 units: the older order takes 3, the newer one is still short
    let result = manager
        .restock(KOTTAYAM, 1, 4, RestockSource::MainHub, None)
        .unwrap();
    assert_eq!(result.approved_orders.len(), 1);
    assert_eq!(result.approved_orders[0].order_id, first.order_id);
    assert_eq!(result.approved_orders[0].status, OrderStatus::Approved);
    assert_eq!(result.record.reserved_quantity(), 3);

    let result = manager
        .restock(KOTTAYAM, 1, 1, RestockSource::Purchase, Some("PO-7".into()))
        .unwrap();
    assert_eq!(result.approved_orders.len(), 1);
    assert_eq!(result.approved_orders[0].order_id, second.order_id);

    let record = manager.ledger().get(KOTTAYAM, 1).unwrap().unwrap();
    assert_eq!(record.quantity(), 5);
    assert_eq!(record.reserved_quantity(), 5);
}

#[test]
fn test_held_order_cannot_leave_origin() {
    let manager = create_test_manager();
    let order = place_home(&manager, "Kannur", 3);

    let err = manager
        .dispatch_from_hub(None, &order.order_id, KOTTAYAM)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Rejected(OrderError::InvalidStateTransition {
            from: OrderStatus::Pending,
            ..
        })
    ));
}

// ========================================================================
// 取消与退款
// ========================================================================

#[test]
fn test_cancel_releases_stock_and_records_failed_refund() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kannur", 4);

    let order = manager
        .cancel_order(None, &order.order_id, Some("customer request".into()))
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.reservation.status, ReservationStatus::Released);
    assert_eq!(order.payment.refund_status, Some(RefundStatus::Failed));
    assert_eq!(
        order.payment.refund_error.as_deref(),
        Some(GATEWAY_NOT_CONFIGURED)
    );
    assert_eq!(
        order.timeline.last().map(|e| e.event_type),
        Some(TrackingEventType::RefundUpdated)
    );

    let record = manager.ledger().get(KOTTAYAM, 1).unwrap().unwrap();
    assert_eq!(record.available(), 10);
    assert_eq!(record.reserved_quantity(), 0);

    // 再次取消被拒绝
    let err = manager.cancel_order(None, &order.order_id, None).unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Rejected(OrderError::AlreadyCancelled(_))
    ));
}

#[test]
fn test_cancel_with_working_gateway_refunds() {
    let manager = create_manager_with(Collaborators {
        refunds: Arc::new(FixedRefunds(RefundOutcome::succeeded("rf_1"))),
        ..Collaborators::default()
    });
    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kannur", 1);

    let order = manager.cancel_order(None, &order.order_id, None).unwrap();
    assert_eq!(order.payment.refund_status, Some(RefundStatus::Processed));
    assert_eq!(order.payment.refund_id.as_deref(), Some("rf_1"));
    assert_eq!(order.payment.status, PaymentStatus::Refunded);

    // nothing left to retry
    assert!(matches!(
        manager.retry_refund(&order.order_id).unwrap_err(),
        ManagerError::Rejected(OrderError::AlreadyRefunded(_))
    ));
}

#[test]
fn test_cod_cancel_has_no_refund() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = manager
        .place_order(collection_input(THRISSUR, 1))
        .unwrap()
        .order;

    let order = manager.cancel_order(None, &order.order_id, None).unwrap();
    assert_eq!(order.payment.refund_status, None);
    assert_eq!(
        order.timeline.last().map(|e| e.event_type),
        Some(TrackingEventType::Cancelled)
    );
}

#[test]
fn test_cancel_held_order() {
    let manager = create_test_manager();
    let order = place_home(&manager, "Kannur", 2);
    let order = manager.cancel_order(None, &order.order_id, None).unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.reservation.status, ReservationStatus::Released);
    assert!(order.reservation.shortfalls.is_empty());

    // 补货不会再批准已取消订单
    let result = manager
        .restock(KOTTAYAM, 1, 5, RestockSource::Admin, None)
        .unwrap();
    assert!(result.approved_orders.is_empty());
}

#[test]
fn test_notification_failure_does_not_fail_command() {
    let manager = create_manager_with(Collaborators {
        notifier: Arc::new(BrokenNotifier),
        ..Collaborators::default()
    });
    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kannur", 1);

    let order = manager
        .dispatch_from_hub(None, &order.order_id, KOTTAYAM)
        .unwrap();
    assert_eq!(order.status, OrderStatus::InTransit);
}
