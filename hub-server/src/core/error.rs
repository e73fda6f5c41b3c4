//! 启动错误 - 服务器初始化和运行期间的致命错误
//!
//! 请求级错误走 [`shared::error::AppError`]，这里只覆盖启动路径。

use thiserror::Error;

use crate::db::StorageError;
use crate::orders::ManagerError;
use crate::topology::TopologyError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("拓扑错误: {0}")]
    Topology(#[from] TopologyError),

    #[error("订单管理器错误: {0}")]
    Manager(#[from] ManagerError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
