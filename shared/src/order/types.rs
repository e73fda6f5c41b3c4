//! Order value types: items, destination, payment, reservation state, inputs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hub::HubId;
use crate::inventory::{ProductId, StockShortfall};

// ============================================================================
// Delivery
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    HomeDelivery,
    HubCollection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub district: String,
    #[serde(default)]
    pub state: String,
    pub pincode: String,
    /// 实际配送目的地区（缺省时使用 district）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_district: Option<String>,
}

impl ShippingAddress {
    pub fn routing_district(&self) -> &str {
        self.destination_district
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.district)
    }
}

/// Where the order ends up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Destination {
    Address { address: ShippingAddress },
    CollectionHub { hub_id: HubId },
}

// ============================================================================
// Items
// ============================================================================

/// Line item with the unit price captured at order time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

impl LineItem {
    /// `None` when price × quantity leaves the Decimal range
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

// ============================================================================
// Payment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cod,
    Online,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Pending,
    Processed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_status: Option<RefundStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_initiated_at: Option<i64>,
}

impl Payment {
    pub fn new(method: PaymentMethod, status: PaymentStatus) -> Self {
        Self {
            method,
            status,
            transaction_id: None,
            refund_status: None,
            refund_id: None,
            refund_amount: None,
            refund_error: None,
            refund_initiated_at: None,
        }
    }

    /// 仅在线支付且已付款才需要退款
    pub fn refund_eligible(&self) -> bool {
        self.method == PaymentMethod::Online
            && self.status == PaymentStatus::Paid
            && self.refund_status.is_none()
    }
}

impl Default for Payment {
    fn default() -> Self {
        Self::new(PaymentMethod::Cod, PaymentStatus::Pending)
    }
}

// ============================================================================
// Reservation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    #[default]
    None,
    /// 全部行已在履约枢纽预留
    Reserved,
    /// 缺货挂起，等待补货
    Held,
    /// 货物已离开履约枢纽
    Fulfilled,
    Released,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReservationState {
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_id: Option<HubId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortfalls: Vec<StockShortfall>,
}

/// Outcome of a reservation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationOutcome {
    Reserved,
    PendingStock { shortfalls: Vec<StockShortfall> },
}

impl ReservationOutcome {
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReservationOutcome::Reserved)
    }
}

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub method: PaymentMethod,
    #[serde(default = "default_payment_status")]
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Pending
}

/// Order placement request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderInput {
    /// 幂等键，重放时返回已有订单
    #[serde(default)]
    pub command_id: Option<String>,
    pub items: Vec<OrderItemInput>,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub collection_hub_id: Option<HubId>,
    pub payment: PaymentInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_district_prefers_destination_district() {
        let mut address = ShippingAddress {
            line1: "MG Road".into(),
            line2: None,
            district: "Ernakulam".into(),
            state: "Kerala".into(),
            pincode: "682001".into(),
            destination_district: None,
        };
        assert_eq!(address.routing_district(), "Ernakulam");
        address.destination_district = Some("Thrissur".into());
        assert_eq!(address.routing_district(), "Thrissur");
        address.destination_district = Some("  ".into());
        assert_eq!(address.routing_district(), "Ernakulam");
    }

    #[test]
    fn test_refund_eligibility() {
        let mut payment = Payment::new(PaymentMethod::Online, PaymentStatus::Paid);
        assert!(payment.refund_eligible());
        payment.refund_status = Some(RefundStatus::Pending);
        assert!(!payment.refund_eligible());
        assert!(!Payment::new(PaymentMethod::Cod, PaymentStatus::Paid).refund_eligible());
        assert!(!Payment::new(PaymentMethod::Online, PaymentStatus::Pending).refund_eligible());
    }

    #[test]
    fn test_line_total() {
        let item = LineItem {
            product_id: 1,
            name: "Banana chips".into(),
            unit_price: Decimal::new(12550, 2),
            quantity: 3,
        };
        assert_eq!(item.line_total(), Some(Decimal::new(37650, 2)));
    }

    #[test]
    fn test_line_total_out_of_range() {
        let item = LineItem {
            product_id: 1,
            name: "Cardamom".into(),
            unit_price: Decimal::from(1_000_000_000_000_000i64),
            quantity: 1_000_000_000_000_000,
        };
        assert_eq!(item.line_total(), None);
    }

    #[test]
    fn test_destination_serde_tag() {
        let json = serde_json::to_string(&Destination::CollectionHub { hub_id: 8 }).unwrap();
        assert_eq!(json, r#"{"type":"COLLECTION_HUB","hub_id":8}"#);
    }
}
