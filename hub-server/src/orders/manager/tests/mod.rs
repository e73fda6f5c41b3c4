use super::*;
use crate::db::open_in_memory;
use crate::services::{
    HubNotice, NotificationSink, RecordingRestockSink, RefundProcessor, ServiceError,
};
use crate::topology::kerala_network;
use parking_lot::Mutex;
use shared::order::{
    DeliveryType, OrderItemInput, PaymentInput, PaymentMethod, PaymentStatus, ShippingAddress,
    TrackingEventType,
};

const KOTTAYAM: HubId = 9;
const ERNAKULAM: HubId = 8;
const THRISSUR: HubId = 7;
const KOZHIKODE: HubId = 4;
const KANNUR: HubId = 1;
const KOLLAM: HubId = 12;

fn create_test_manager() -> OrdersManager {
    create_manager_with(Collaborators::default())
}

fn create_manager_with(collaborators: Collaborators) -> OrdersManager {
    let db = open_in_memory().unwrap();
    let topology = Arc::new(TopologyService::open(db.clone(), kerala_network()).unwrap());
    OrdersManager::new(db, topology, collaborators).unwrap()
}

fn stock(manager: &OrdersManager, hub_id: HubId, product_id: ProductId, amount: i64) {
    manager
        .ledger()
        .restock(hub_id, product_id, amount, RestockSource::Admin, None)
        .unwrap();
}

fn item(product_id: ProductId, quantity: i64) -> OrderItemInput {
    OrderItemInput {
        product_id,
        name: format!("product-{product_id}"),
        unit_price: Decimal::new(25000, 2),
        quantity,
    }
}

fn home_input(district: &str, quantity: i64) -> PlaceOrderInput {
    PlaceOrderInput {
        command_id: None,
        items: vec![item(1, quantity)],
        delivery_type: DeliveryType::HomeDelivery,
        shipping_address: Some(ShippingAddress {
            line1: "12 Market Road".into(),
            line2: None,
            district: district.into(),
            state: "Kerala".into(),
            pincode: "670001".into(),
            destination_district: None,
        }),
        collection_hub_id: None,
        payment: PaymentInput {
            method: PaymentMethod::Online,
            status: PaymentStatus::Paid,
            transaction_id: Some("txn-001".into()),
        },
    }
}

fn collection_input(hub_id: HubId, quantity: i64) -> PlaceOrderInput {
    PlaceOrderInput {
        command_id: None,
        items: vec![item(1, quantity)],
        delivery_type: DeliveryType::HubCollection,
        shipping_address: None,
        collection_hub_id: Some(hub_id),
        payment: PaymentInput {
            method: PaymentMethod::Cod,
            status: PaymentStatus::Pending,
            transaction_id: None,
        },
    }
}

fn place_home(manager: &OrdersManager, district: &str, quantity: i64) -> OrderSnapshot {
    manager
        .place_order(home_input(district, quantity))
        .unwrap()
        .order
}

/// Dispatch and scan hop by hop until the order reached its final hub
fn walk_to_final(manager: &OrdersManager, order_id: &str) -> OrderSnapshot {
    let route = manager.get_order(order_id).unwrap().route;
    for pair in route.windows(2) {
        manager.dispatch_from_hub(None, order_id, pair[0]).unwrap();
        manager.scan_at_hub(None, order_id, pair[1]).unwrap();
    }
    manager.get_order(order_id).unwrap()
}

fn event_types(order: &OrderSnapshot) -> Vec<TrackingEventType> {
    order.timeline.iter().map(|e| e.event_type).collect()
}

// ========================================================================
// Test collaborators
// ========================================================================

/// Refund processor answering with a fixed outcome
struct FixedRefunds(RefundOutcome);

impl RefundProcessor for FixedRefunds {
    fn refund(
        &self,
        _transaction_id: &str,
        _amount: Decimal,
        _reason: &str,
    ) -> Result<RefundOutcome, ServiceError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<(HubId, String, HubNotice)>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<(HubId, String, HubNotice)> {
        self.notices.lock().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify_hub_managers(
        &self,
        hub_id: HubId,
        order_id: &str,
        notice: HubNotice,
    ) -> Result<(), ServiceError> {
        self.notices
            .lock()
            .push((hub_id, order_id.to_string(), notice));
        Ok(())
    }
}

/// Notifier that is always down
struct BrokenNotifier;

impl NotificationSink for BrokenNotifier {
    fn notify_hub_managers(
        &self,
        _hub_id: HubId,
        _order_id: &str,
        _notice: HubNotice,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Unavailable("smtp down".into()))
    }
}

mod test_admin;
mod test_flows;
