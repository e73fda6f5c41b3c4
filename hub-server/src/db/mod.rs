//! redb database handle shared by the topology, inventory and order stores
//!
//! One database file holds every table, so a single write transaction can
//! cover an order's timeline and the ledger rows it touches.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once `commit()`
//! returns the data is on disk, and the copy-on-write pages keep the file
//! consistent across power loss.

use redb::Database;
use shared::error::{AppError, ErrorCode};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// 将存储错误转换为错误码
    pub fn error_code(&self) -> ErrorCode {
        if let StorageError::Serialization(_) = self {
            return ErrorCode::StorageCorrupted;
        }

        // redb 错误通过字符串匹配分类
        let err_str = self.to_string().to_lowercase();
        if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
        {
            return ErrorCode::StorageFull;
        }
        if err_str.contains("corrupt") || err_str.contains("invalid database") {
            return ErrorCode::StorageCorrupted;
        }

        // 默认：系统繁忙
        ErrorCode::SystemBusy
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let code = err.error_code();
        tracing::error!(error = %err, error_code = ?code, "Storage error occurred");
        AppError::with_message(code, err.to_string())
    }
}

/// Open or create the database file
pub fn open_database(path: impl AsRef<Path>) -> StorageResult<Arc<Database>> {
    let db = Database::create(path)?;
    Ok(Arc::new(db))
}

/// Open an in-memory database (tests and ephemeral runs)
pub fn open_in_memory() -> StorageResult<Arc<Database>> {
    let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
    Ok(Arc::new(db))
}
