//! Inventory ledger - per-hub, per-product stock rows in redb
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `inventory` | `(hub_id, product_id)` | JSON `RawInventoryRow` |
//!
//! Every mutator is a read-modify-write inside one write transaction.
//! redb admits a single writer at a time, so mutations on the same row
//! are serialized. The `*_txn` variants run inside a caller-supplied
//! transaction so order and ledger writes commit together.
//!
//! Rows are validated on every load. A row failing validation refuses all
//! mutation until [`InventoryLedger::manual_adjust`] repairs it.

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use shared::hub::HubId;
use shared::inventory::{
    IntegrityViolation, InventoryRecord, ProductId, RawInventoryRow, RestockSource, StockError,
};

use super::error::{InventoryError, InventoryResult};
use crate::db::StorageResult;

const INVENTORY_TABLE: TableDefinition<(i64, i64), &[u8]> = TableDefinition::new("inventory");

/// Row that failed integrity validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub hub_id: HubId,
    pub product_id: ProductId,
    pub quantity: Option<i64>,
    pub reserved_quantity: Option<i64>,
    pub violation: IntegrityViolation,
}

#[derive(Clone)]
pub struct InventoryLedger {
    db: Arc<Database>,
}

impl InventoryLedger {
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(INVENTORY_TABLE)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Raw rows ==========

    fn read_raw_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        product_id: ProductId,
    ) -> StorageResult<Option<RawInventoryRow>> {
        let table = txn.open_table(INVENTORY_TABLE)?;
        match table.get((hub_id, product_id))? {
            Some(value) => Ok(Some(keyed(hub_id, product_id, value.value())?)),
            None => Ok(None),
        }
    }

    fn read_raw(&self, hub_id: HubId, product_id: ProductId) -> StorageResult<Option<RawInventoryRow>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;
        match table.get((hub_id, product_id))? {
            Some(value) => Ok(Some(keyed(hub_id, product_id, value.value())?)),
            None => Ok(None),
        }
    }

    fn save_txn(&self, txn: &WriteTransaction, record: &InventoryRecord) -> StorageResult<()> {
        let mut table = txn.open_table(INVENTORY_TABLE)?;
        let value = serde_json::to_vec(&record.to_raw())?;
        table.insert((record.hub_id, record.product_id), value.as_slice())?;
        Ok(())
    }

    /// Load and validate a row inside the transaction. A missing row is
    /// returned as a fresh empty record (not yet persisted).
    pub fn load_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        product_id: ProductId,
    ) -> InventoryResult<(InventoryRecord, bool)> {
        match self.read_raw_txn(txn, hub_id, product_id)? {
            Some(raw) => Ok((validate(hub_id, product_id, raw)?, true)),
            None => Ok((InventoryRecord::new(hub_id, product_id), false)),
        }
    }

    pub(crate) fn store_txn(&self, txn: &WriteTransaction, record: &InventoryRecord) -> InventoryResult<()> {
        self.save_txn(txn, record)?;
        Ok(())
    }

    // ========== Queries ==========

    pub fn get(&self, hub_id: HubId, product_id: ProductId) -> InventoryResult<Option<InventoryRecord>> {
        match self.read_raw(hub_id, product_id)? {
            Some(raw) => Ok(Some(validate(hub_id, product_id, raw)?)),
            None => Ok(None),
        }
    }

    /// `quantity - reserved`; a missing row has nothing available
    pub fn get_available(&self, hub_id: HubId, product_id: ProductId) -> InventoryResult<i64> {
        Ok(self
            .get(hub_id, product_id)?
            .map(|r| r.available())
            .unwrap_or(0))
    }

    /// All rows at a hub; a corrupted row fails the whole listing
    pub fn list_for_hub(&self, hub_id: HubId) -> InventoryResult<Vec<InventoryRecord>> {
        self.read_hub_rows(hub_id)?
            .into_iter()
            .map(|raw| validate(raw.hub_id, raw.product_id, raw))
            .collect()
    }

    fn read_hub_rows(&self, hub_id: HubId) -> StorageResult<Vec<RawInventoryRow>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;

        let mut rows = Vec::new();
        for result in table.range((hub_id, i64::MIN)..=(hub_id, i64::MAX))? {
            let (key, value) = result?;
            let (hub, product) = key.value();
            rows.push(keyed(hub, product, value.value())?);
        }
        Ok(rows)
    }

    /// Scan every row and report the ones failing integrity
    pub fn audit(&self) -> StorageResult<Vec<IntegrityReport>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;

        let mut reports = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let (hub_id, product_id) = key.value();
            let raw = keyed(hub_id, product_id, value.value())?;
            let (quantity, reserved_quantity) = (raw.quantity, raw.reserved_quantity);
            if let Err(violation) = InventoryRecord::from_raw(raw) {
                reports.push(IntegrityReport {
                    hub_id,
                    product_id,
                    quantity,
                    reserved_quantity,
                    violation,
                });
            }
        }

        if !reports.is_empty() {
            tracing::warn!(rows = reports.len(), "Inventory audit found corrupted rows");
        }
        Ok(reports)
    }

    // ========== Mutators ==========

    pub fn reserve(&self, hub_id: HubId, product_id: ProductId, amount: i64) -> InventoryResult<InventoryRecord> {
        self.in_txn(|txn| self.reserve_txn(txn, hub_id, product_id, amount))
    }

    pub fn reserve_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        product_id: ProductId,
        amount: i64,
    ) -> InventoryResult<InventoryRecord> {
        let (mut record, _) = self.load_txn(txn, hub_id, product_id)?;
        record
            .reserve(amount)
            .map_err(|e| stock_error(hub_id, product_id, e))?;
        self.save_txn(txn, &record)?;
        Ok(record)
    }

    /// Returns the amount actually released (clamped to the reserved quantity)
    pub fn release(&self, hub_id: HubId, product_id: ProductId, amount: i64) -> InventoryResult<i64> {
        self.in_txn(|txn| self.release_txn(txn, hub_id, product_id, amount))
    }

    pub fn release_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        product_id: ProductId,
        amount: i64,
    ) -> InventoryResult<i64> {
        let (mut record, exists) = self.load_txn(txn, hub_id, product_id)?;
        if !exists {
            return Ok(0);
        }
        let released = record
            .release(amount)
            .map_err(|e| stock_error(hub_id, product_id, e))?;
        if released > 0 {
            self.save_txn(txn, &record)?;
        }
        Ok(released)
    }

    pub fn fulfill(&self, hub_id: HubId, product_id: ProductId, amount: i64) -> InventoryResult<InventoryRecord> {
        self.in_txn(|txn| self.fulfill_txn(txn, hub_id, product_id, amount))
    }

    pub fn fulfill_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        product_id: ProductId,
        amount: i64,
    ) -> InventoryResult<InventoryRecord> {
        let (mut record, _) = self.load_txn(txn, hub_id, product_id)?;
        record
            .fulfill(amount)
            .map_err(|e| stock_error(hub_id, product_id, e))?;
        self.save_txn(txn, &record)?;
        Ok(record)
    }

    pub fn restock(
        &self,
        hub_id: HubId,
        product_id: ProductId,
        amount: i64,
        source: RestockSource,
        note: Option<String>,
    ) -> InventoryResult<InventoryRecord> {
        let record =
            self.in_txn(|txn| self.restock_txn(txn, hub_id, product_id, amount, source, note))?;
        tracing::info!(
            hub_id,
            product_id,
            amount,
            source = ?source,
            quantity = record.quantity(),
            "Inventory restocked"
        );
        Ok(record)
    }

    pub fn restock_txn(
        &self,
        txn: &WriteTransaction,
        hub_id: HubId,
        product_id: ProductId,
        amount: i64,
        source: RestockSource,
        note: Option<String>,
    ) -> InventoryResult<InventoryRecord> {
        let (mut record, _) = self.load_txn(txn, hub_id, product_id)?;
        record
            .restock(amount, source, note)
            .map_err(|e| stock_error(hub_id, product_id, e))?;
        self.save_txn(txn, &record)?;
        Ok(record)
    }

    /// Create an empty row if none exists
    pub fn provision(&self, hub_id: HubId, product_id: ProductId) -> InventoryResult<InventoryRecord> {
        self.in_txn(|txn| {
            let (record, exists) = self.load_txn(txn, hub_id, product_id)?;
            if !exists {
                self.save_txn(txn, &record)?;
            }
            Ok(record)
        })
    }

    /// Manual repair: overwrite both counters, bypassing load validation.
    /// Restock history is preserved.
    pub fn manual_adjust(
        &self,
        hub_id: HubId,
        product_id: ProductId,
        quantity: i64,
        reserved: i64,
    ) -> InventoryResult<InventoryRecord> {
        let record = self.in_txn(|txn| {
            let mut record = InventoryRecord::new(hub_id, product_id);
            if let Some(raw) = self.read_raw_txn(txn, hub_id, product_id)? {
                record.restock_history = raw.restock_history;
                record.last_restocked_at = raw.last_restocked_at;
            }
            record
                .set_counters(quantity, reserved)
                .map_err(|violation| InventoryError::Integrity {
                    hub_id,
                    product_id,
                    violation,
                })?;
            self.save_txn(txn, &record)?;
            Ok(record)
        })?;
        tracing::warn!(hub_id, product_id, quantity, reserved, "Inventory row manually adjusted");
        Ok(record)
    }

    /// Run `f` in a fresh write transaction; commits only on success
    fn in_txn<T, F>(&self, f: F) -> InventoryResult<T>
    where
        F: FnOnce(&WriteTransaction) -> InventoryResult<T>,
    {
        let txn = self.begin_write()?;
        let value = f(&txn)?;
        txn.commit().map_err(crate::db::StorageError::from)?;
        Ok(value)
    }
}

/// Decode a stored row; the table key wins over the body
fn keyed(hub_id: HubId, product_id: ProductId, bytes: &[u8]) -> StorageResult<RawInventoryRow> {
    let mut raw: RawInventoryRow = serde_json::from_slice(bytes)?;
    raw.hub_id = hub_id;
    raw.product_id = product_id;
    Ok(raw)
}

fn validate(hub_id: HubId, product_id: ProductId, raw: RawInventoryRow) -> InventoryResult<InventoryRecord> {
    InventoryRecord::from_raw(raw).map_err(|violation| {
        tracing::error!(hub_id, product_id, %violation, "Inventory row failed integrity check");
        InventoryError::Integrity {
            hub_id,
            product_id,
            violation,
        }
    })
}

pub(crate) fn stock_error(hub_id: HubId, product_id: ProductId, err: StockError) -> InventoryError {
    match err {
        StockError::Insufficient {
            requested,
            available,
        } => InventoryError::InsufficientStock {
            hub_id,
            product_id,
            requested,
            available,
        },
        StockError::InvalidFulfillment {
            requested,
            reserved,
            quantity,
        } => InventoryError::InvalidFulfillment {
            hub_id,
            product_id,
            requested,
            reserved,
            quantity,
        },
        StockError::InvalidAmount(amount) => InventoryError::InvalidAmount(amount),
        StockError::Overflow { current, amount } => InventoryError::QuantityOverflow {
            hub_id,
            product_id,
            current,
            amount,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn ledger() -> InventoryLedger {
        InventoryLedger::new(open_in_memory().unwrap()).unwrap()
    }

    /// Write a raw row directly (simulates older writers)
    fn put_raw(ledger: &InventoryLedger, raw: RawInventoryRow) {
        let txn = ledger.begin_write().unwrap();
        {
            let mut table = txn.open_table(INVENTORY_TABLE).unwrap();
            let value = serde_json::to_vec(&raw).unwrap();
            table
                .insert((raw.hub_id, raw.product_id), value.as_slice())
                .unwrap();
        }
        txn.commit().unwrap();
    }

    #[test]
    fn test_restock_overflow_keeps_row() {
        let ledger = ledger();
        ledger.restock(9, 1, 5, RestockSource::Admin, None).unwrap();

        let err = ledger
            .restock(9, 1, i64::MAX, RestockSource::MainHub, None)
            .unwrap_err();
        assert!(matches!(
            err,
            InventoryError::QuantityOverflow {
                hub_id: 9,
                product_id: 1,
                current: 5,
                ..
            }
        ));
        assert_eq!(
            shared::error::AppError::from(err).code,
            shared::error::ErrorCode::ValueOutOfRange
        );

        let record = ledger.get(9, 1).unwrap().unwrap();
        assert_eq!(record.quantity(), 5);
        assert_eq!(record.restock_history.len(), 1);
        assert!(ledger.audit().unwrap().is_empty());
    }

    #[test]
    fn test_reserve_until_exhausted() {
        let ledger = ledger();
        ledger.restock(9, 100, 14, RestockSource::Admin, None).unwrap();

        ledger.reserve(9, 100, 14).unwrap();
        assert_eq!(ledger.get_available(9, 100).unwrap(), 0);

        let err = ledger.reserve(9, 100, 1).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock {
                requested: 1,
                available: 0,
                ..
            }
        ));
        let record = ledger.get(9, 100).unwrap().unwrap();
        assert_eq!(record.reserved_quantity(), 14);
        assert_eq!(record.quantity(), 14);
    }

    #[test]
    fn test_double_release_is_clamped() {
        let ledger = ledger();
        ledger.restock(9, 100, 5, RestockSource::Admin, None).unwrap();
        ledger.reserve(9, 100, 3).unwrap();

        assert_eq!(ledger.release(9, 100, 3).unwrap(), 3);
        assert_eq!(ledger.release(9, 100, 3).unwrap(), 0);
        let record = ledger.get(9, 100).unwrap().unwrap();
        assert_eq!(record.reserved_quantity(), 0);
        assert_eq!(record.quantity(), 5);
    }

    #[test]
    fn test_release_missing_row_is_noop() {
        let ledger = ledger();
        assert_eq!(ledger.release(9, 404, 2).unwrap(), 0);
        assert!(ledger.get(9, 404).unwrap().is_none());
    }

    #[test]
    fn test_fulfill_removes_physical_stock() {
        let ledger = ledger();
        ledger.restock(9, 100, 5, RestockSource::Purchase, None).unwrap();
        ledger.reserve(9, 100, 2).unwrap();
        ledger.fulfill(9, 100, 2).unwrap();

        let record = ledger.get(9, 100).unwrap().unwrap();
        assert_eq!(record.quantity(), 3);
        assert_eq!(record.reserved_quantity(), 0);

        assert!(matches!(
            ledger.fulfill(9, 100, 1),
            Err(InventoryError::InvalidFulfillment { reserved: 0, .. })
        ));
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let ledger = ledger();
        put_raw(
            &ledger,
            RawInventoryRow {
                hub_id: 9,
                product_id: 7,
                quantity: Some(4),
                ..Default::default()
            },
        );
        assert_eq!(ledger.get_available(9, 7).unwrap(), 4);
        ledger.reserve(9, 7, 4).unwrap();
    }

    #[test]
    fn test_corrupted_row_refuses_mutation_until_adjusted() {
        let ledger = ledger();
        put_raw(
            &ledger,
            RawInventoryRow {
                hub_id: 9,
                product_id: 7,
                quantity: Some(2),
                reserved_quantity: Some(5),
                ..Default::default()
            },
        );

        assert!(matches!(
            ledger.get_available(9, 7),
            Err(InventoryError::Integrity { .. })
        ));
        assert!(matches!(
            ledger.restock(9, 7, 10, RestockSource::Admin, None),
            Err(InventoryError::Integrity { .. })
        ));
        assert!(matches!(
            ledger.release(9, 7, 1),
            Err(InventoryError::Integrity { .. })
        ));

        let reports = ledger.audit().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].violation,
            IntegrityViolation::ReservedExceedsQuantity {
                quantity: 2,
                reserved: 5
            }
        );

        // 手工修复后恢复正常
        assert!(ledger.manual_adjust(9, 7, 1, 5).is_err());
        ledger.manual_adjust(9, 7, 5, 5).unwrap();
        assert_eq!(ledger.get_available(9, 7).unwrap(), 0);
        ledger.restock(9, 7, 3, RestockSource::Admin, None).unwrap();
        assert_eq!(ledger.get_available(9, 7).unwrap(), 3);
        assert!(ledger.audit().unwrap().is_empty());
    }

    #[test]
    fn test_failed_mutation_leaves_row_untouched() {
        let ledger = ledger();
        ledger.restock(9, 100, 2, RestockSource::Admin, None).unwrap();
        assert!(ledger.reserve(9, 100, 0).is_err());
        assert!(ledger.reserve(9, 100, 3).is_err());
        assert_eq!(ledger.get_available(9, 100).unwrap(), 2);
    }

    #[test]
    fn test_list_for_hub_is_scoped() {
        let ledger = ledger();
        ledger.restock(9, 1, 1, RestockSource::Admin, None).unwrap();
        ledger.restock(9, 2, 2, RestockSource::Admin, None).unwrap();
        ledger.restock(8, 1, 3, RestockSource::Admin, None).unwrap();
        ledger.provision(9, 3).unwrap();

        let rows = ledger.list_for_hub(9).unwrap();
        let products: Vec<ProductId> = rows.iter().map(|r| r.product_id).collect();
        assert_eq!(products, vec![1, 2, 3]);
    }
}
