use super::*;
use shared::hub::HubTier;

// ========================================================================
// 状态修复
// ========================================================================

#[test]
fn test_status_drift_detected_and_repaired() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kannur", 1);
    manager
        .dispatch_from_hub(None, &order.order_id, KOTTAYAM)
        .unwrap();
    manager
        .scan_at_hub(None, &order.order_id, ERNAKULAM)
        .unwrap();

    // 旧进程写入的过期状态
    let mut stale = manager.get_order(&order.order_id).unwrap();
    stale.status = OrderStatus::InTransit;
    let txn = manager.storage.begin_write().unwrap();
    manager.storage.store_snapshot(&txn, &stale).unwrap();
    txn.commit().unwrap();

    let drift = manager.find_status_drift().unwrap();
    assert_eq!(
        drift,
        vec![StatusDrift {
            order_id: order.order_id.clone(),
            order_number: order.order_number.clone(),
            stored: OrderStatus::InTransit,
            derived: OrderStatus::Approved,
        }]
    );

    let repaired = manager.repair_all_status().unwrap();
    assert_eq!(repaired.len(), 1);
    assert_eq!(repaired[0].status, OrderStatus::Approved);
    assert_eq!(
        repaired[0].timeline.last().map(|e| e.event_type),
        Some(TrackingEventType::StatusRepaired)
    );
    assert!(manager.find_status_drift().unwrap().is_empty());

    // 修复后可以继续出库
    let order = manager
        .dispatch_from_hub(None, &order.order_id, ERNAKULAM)
        .unwrap();
    assert_eq!(order.status, OrderStatus::InTransit);
}

#[test]
fn test_repair_consistent_order_is_noop() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kannur", 1);
    let repaired = manager.repair_status(&order.order_id).unwrap();
    assert_eq!(repaired.timeline.len(), order.timeline.len());
}

// ========================================================================
// 枢纽管理
// ========================================================================

#[test]
fn test_deactivate_hub_with_open_orders_refused() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    place_home(&manager, "Kannur", 1);

    let err = manager.set_hub_active(KANNUR, false).unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Topology(TopologyError::HubInUse {
            hub_id: KANNUR,
            open_orders: 1
        })
    ));
    assert!(manager.topology().hub(KANNUR).unwrap().active);

    // Kasaragod has no open orders
    let hub = manager.set_hub_active(2, false).unwrap();
    assert!(!hub.active);
}

#[test]
fn test_open_orders_ignore_hubs_left_behind() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kollam", 1);
    walk_to_final(&manager, &order.order_id);

    // Ernakulam is behind the order
    assert!(manager.open_orders_referencing(ERNAKULAM).unwrap().is_empty());
    assert_eq!(manager.open_orders_referencing(KOLLAM).unwrap().len(), 1);
}

#[test]
fn test_reassign_hub_moves_in_transit_order() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kollam", 1);
    manager
        .dispatch_from_hub(None, &order.order_id, KOTTAYAM)
        .unwrap();
    manager
        .scan_at_hub(None, &order.order_id, ERNAKULAM)
        .unwrap();
    manager
        .dispatch_from_hub(None, &order.order_id, ERNAKULAM)
        .unwrap();

    let rerouted = manager.reassign_hub(KOLLAM, 13).unwrap();
    assert_eq!(rerouted.len(), 1);
    assert_eq!(rerouted[0].route, vec![KOTTAYAM, ERNAKULAM, 13]);
    assert_eq!(
        rerouted[0].timeline.last().map(|e| e.event_type),
        Some(TrackingEventType::RouteReassigned)
    );

    // 新枢纽视图里出现该订单
    assert_eq!(manager.active_orders_at_hub(13).unwrap().len(), 1);
    assert!(manager.active_orders_at_hub(KOLLAM).unwrap().is_empty());

    let order = manager.scan_at_hub(None, &order.order_id, 13).unwrap();
    assert_eq!(order.status, OrderStatus::ArrivedAtHub);
}

#[test]
fn test_decommission_with_same_district_replacement() {
    let manager = create_test_manager();
    let mut spare = Hub::new(77, "Kannur North Hub", "Kannur", HubTier::RegionalHub);
    spare.active = false;
    manager.topology().add_hub(spare).unwrap();

    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kannur", 1);

    let report = manager.decommission_hub(KANNUR, 77).unwrap();
    assert!(!report.retired.active);
    assert!(report.replacement.active);
    assert_eq!(report.rerouted_orders, vec![order.order_id.clone()]);

    let order = manager.get_order(&order.order_id).unwrap();
    assert_eq!(order.route, vec![KOTTAYAM, ERNAKULAM, KOZHIKODE, 77]);

    // new orders route to the replacement
    let next = place_home(&manager, "Kannur", 1);
    assert_eq!(next.route.last(), Some(&77));
}

#[test]
fn test_decommission_refused_while_goods_at_hub() {
    let manager = create_test_manager();
    let mut spare = Hub::new(77, "Kannur North Hub", "Kannur", HubTier::RegionalHub);
    spare.active = false;
    manager.topology().add_hub(spare).unwrap();

    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kannur", 1);
    walk_to_final(&manager, &order.order_id);

    let err = manager.decommission_hub(KANNUR, 77).unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Topology(TopologyError::HubInUse { .. })
    ));
    assert!(manager.topology().hub(KANNUR).unwrap().active);
    assert!(!manager.topology().hub(77).unwrap().active);
}

#[test]
fn test_decommission_invalid_topology_changes_nothing() {
    let manager = create_test_manager();
    stock(&manager, KOTTAYAM, 1, 10);
    let order = place_home(&manager, "Kannur", 1);

    // 撤掉 mega hub 会破坏拓扑
    let err = manager.decommission_hub(KOZHIKODE, 5).unwrap_err();
    assert!(matches!(err, ManagerError::Topology(TopologyError::Invalid(_))));
    assert_eq!(
        manager.get_order(&order.order_id).unwrap().route,
        vec![KOTTAYAM, ERNAKULAM, KOZHIKODE, KANNUR]
    );
}

#[test]
fn test_restock_unknown_hub() {
    let manager = create_test_manager();
    assert!(matches!(
        manager
            .restock(99, 1, 5, RestockSource::Admin, None)
            .unwrap_err(),
        ManagerError::Topology(TopologyError::HubNotFound(99))
    ));
}
