//! redb-based storage layer for orders
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `OrderSnapshot` | Snapshot with full timeline |
//! | `active_orders` | `order_id` | `()` | Non-terminal order index |
//! | `hub_orders` | `(hub_id, order_id)` | `()` | Hub awaiting action on the order |
//! | `collection_codes` | `order_id` | digest | One active code per order |
//! | `processed_commands` | `command_id` | `order_id` | Idempotency check |
//! | `sequence_counter` | `"seq"` / `"order_count"` | `u64` | Global sequence, order numbers |
//!
//! Indexes are maintained by [`OrderStorage::store_snapshot`] in the same
//! transaction as the snapshot itself.

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::hub::HubId;
use shared::order::{OrderSnapshot, OrderStatus, dispatched_from};

use crate::db::StorageResult;

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

const ACTIVE_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("active_orders");

/// key = (awaiting hub, order_id)
const HUB_ORDERS_TABLE: TableDefinition<(i64, &str), ()> = TableDefinition::new("hub_orders");

/// value = hex SHA-256 digest of the collection code
const COLLECTION_CODES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("collection_codes");

const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("processed_commands");

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";
const ORDER_COUNT_KEY: &str = "order_count";

/// Hub where the order is waiting for someone to act.
///
/// The current hub until the order is dispatched from it, then the next
/// hub on the route. `None` once the order is out for delivery or terminal.
pub fn awaiting_hub(order: &OrderSnapshot) -> Option<HubId> {
    if order.is_terminal() || order.status == OrderStatus::OutForDelivery {
        return None;
    }
    let current = order.current_hub?;
    if dispatched_from(order, current) {
        order.next_hub_after(current)
    } else {
        Some(current)
    }
}

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Create all tables on the shared database
    pub fn open(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(HUB_ORDERS_TABLE)?;
            let _ = write_txn.open_table(COLLECTION_CODES_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Current sequence inside the transaction
    pub fn current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Get current sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Order Counter (for order number) ==========

    /// Get and increment order count atomically
    /// Returns the NEW count after increment
    pub fn next_order_count(&self) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(ORDER_COUNT_KEY)?
            .map(|g| g.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(ORDER_COUNT_KEY, next)?;
        drop(table);
        txn.commit()?;
        Ok(next)
    }

    // ========== Command Idempotency ==========

    /// Order touched by an already processed command
    pub fn processed_command(&self, command_id: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value().to_string()))
    }

    pub fn processed_command_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value().to_string()))
    }

    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, order_id)?;
        Ok(())
    }

    // ========== Snapshot Operations ==========

    /// Store a snapshot and maintain the active and hub indexes
    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> StorageResult<()> {
        let order_id = snapshot.order_id.as_str();
        let previous = self.get_snapshot_txn(txn, order_id)?;

        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(snapshot)?;
            table.insert(order_id, value.as_slice())?;
        }

        {
            let mut active = txn.open_table(ACTIVE_ORDERS_TABLE)?;
            if snapshot.is_terminal() {
                active.remove(order_id)?;
            } else {
                active.insert(order_id, ())?;
            }
        }

        let old_hub = previous.as_ref().and_then(awaiting_hub);
        let new_hub = awaiting_hub(snapshot);
        if old_hub != new_hub {
            let mut by_hub = txn.open_table(HUB_ORDERS_TABLE)?;
            if let Some(hub) = old_hub {
                by_hub.remove((hub, order_id))?;
            }
            if let Some(hub) = new_hub {
                by_hub.insert((hub, order_id), ())?;
            }
        }
        Ok(())
    }

    /// Get a snapshot by order ID
    pub fn get_snapshot(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Get a snapshot by order ID (within transaction)
    pub fn get_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(ORDERS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Get all snapshots
    pub fn get_all_snapshots(&self) -> StorageResult<Vec<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut snapshots = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
            snapshots.push(snapshot);
        }

        Ok(snapshots)
    }

    // ========== Active Orders ==========

    /// Get all active order IDs
    pub fn get_active_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;

        let mut order_ids: Vec<String> = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            order_ids.push(key.value().to_string());
        }

        Ok(order_ids)
    }

    /// Get all active order snapshots
    pub fn get_active_orders(&self) -> StorageResult<Vec<OrderSnapshot>> {
        let active_ids = self.get_active_order_ids()?;
        let mut snapshots = Vec::new();

        for order_id in active_ids {
            if let Some(snapshot) = self.get_snapshot(&order_id)? {
                snapshots.push(snapshot);
            }
        }

        Ok(snapshots)
    }

    /// Orders awaiting action at `hub_id` (index lookup)
    pub fn get_orders_awaiting(&self, hub_id: HubId) -> StorageResult<Vec<OrderSnapshot>> {
        let order_ids: Vec<String> = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(HUB_ORDERS_TABLE)?;
            let mut ids = Vec::new();
            for result in table.range((hub_id, "")..(hub_id + 1, ""))? {
                let (key, _value) = result?;
                let (_hub, order_id) = key.value();
                ids.push(order_id.to_string());
            }
            ids
        };

        let mut snapshots = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            if let Some(snapshot) = self.get_snapshot(&order_id)? {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }

    // ========== Collection Codes ==========

    /// Replace the order's code digest (regeneration invalidates the old one)
    pub fn store_collection_code(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        digest: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(COLLECTION_CODES_TABLE)?;
        table.insert(order_id, digest)?;
        Ok(())
    }

    pub fn get_collection_code_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(COLLECTION_CODES_TABLE)?;
        Ok(table.get(order_id)?.map(|g| g.value().to_string()))
    }

    pub fn has_collection_code(&self, order_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COLLECTION_CODES_TABLE)?;
        Ok(table.get(order_id)?.is_some())
    }

    pub fn remove_collection_code(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<bool> {
        let mut table = txn.open_table(COLLECTION_CODES_TABLE)?;
        let removed = table.remove(order_id)?.is_some();
        Ok(removed)
    }
}
