//! Reservation coordinator
//!
//! Order-level operations over the ledger. Reservation is all-or-nothing
//! per order: either every line is reserved at the hub or nothing is, and
//! the shortfall is reported per product.

use std::collections::BTreeMap;

use redb::WriteTransaction;
use shared::hub::HubId;
use shared::inventory::{ProductId, StockShortfall};
use shared::order::{LineItem, ReservationOutcome};

use super::error::{InventoryError, InventoryResult};
use super::ledger::{InventoryLedger, stock_error};
use crate::services::RestockRequest;

#[derive(Clone)]
pub struct ReservationCoordinator {
    ledger: InventoryLedger,
}

impl ReservationCoordinator {
    pub fn new(ledger: InventoryLedger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    /// Reserve every line at `hub_id`, or nothing.
    ///
    /// Missing rows are created empty, so a shortfall against an unknown
    /// product still leaves a row for restocking to land on.
    pub fn reserve_order_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        items: &[LineItem],
    ) -> InventoryResult<ReservationOutcome> {
        let demand = aggregate(hub_id, items)?;

        let mut records = Vec::with_capacity(demand.len());
        let mut shortfalls = Vec::new();
        for (&product_id, &requested) in &demand {
            let (record, exists) = self.ledger.load_txn(txn, hub_id, product_id)?;
            if requested > record.available() {
                shortfalls.push(StockShortfall {
                    product_id,
                    requested,
                    available: record.available(),
                });
            }
            records.push((record, exists, requested));
        }

        if !shortfalls.is_empty() {
            for (record, exists, _) in &records {
                if !exists {
                    self.ledger.store_txn(txn, record)?;
                }
            }
            tracing::warn!(hub_id, ?shortfalls, "Reservation short, order held");
            return Ok(ReservationOutcome::PendingStock { shortfalls });
        }

        for (mut record, _, requested) in records {
            record
                .reserve(requested)
                .map_err(|e| stock_error(hub_id, record.product_id, e))?;
            self.ledger.store_txn(txn, &record)?;
        }
        Ok(ReservationOutcome::Reserved)
    }

    /// Release every line (clamped); returns the total released
    pub fn release_order_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        items: &[LineItem],
    ) -> InventoryResult<i64> {
        let mut released: i64 = 0;
        for (product_id, amount) in aggregate(hub_id, items)? {
            let amount = self.ledger.release_txn(txn, hub_id, product_id, amount)?;
            released = released.saturating_add(amount);
        }
        Ok(released)
    }

    /// Goods leave the hub: decrement reserved and quantity for every line
    pub fn fulfill_order_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        items: &[LineItem],
    ) -> InventoryResult<()> {
        for (product_id, amount) in aggregate(hub_id, items)? {
            self.ledger.fulfill_txn(txn, hub_id, product_id, amount)?;
        }
        Ok(())
    }

    /// One restock request per short product
    pub fn restock_requests(
        &self,
        hub_id: HubId,
        order_id: &str,
        shortfalls: &[StockShortfall],
    ) -> Vec<RestockRequest> {
        shortfalls
            .iter()
            .filter(|s| s.missing() > 0)
            .map(|s| RestockRequest::for_shortfall(hub_id, order_id, s))
            .collect()
    }
}

/// Sum quantities per product (an order may list a product twice)
fn aggregate(hub_id: HubId, items: &[LineItem]) -> InventoryResult<BTreeMap<ProductId, i64>> {
    let mut demand = BTreeMap::new();
    for item in items {
        let current: &mut i64 = demand.entry(item.product_id).or_insert(0);
        *current = current
            .checked_add(item.quantity)
            .ok_or(InventoryError::QuantityOverflow {
                hub_id,
                product_id: item.product_id,
                current: *current,
                amount: item.quantity,
            })?;
    }
    Ok(demand)
}
