//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 订单下单、取消、签收、自提码
//! - [`hubs`] - 枢纽扫描/出库、枢纽视图、路线、枢纽管理
//! - [`inventory`] - 库存查询、补货、审计

pub mod health;
pub mod hubs;
pub mod inventory;
pub mod orders;

pub use crate::utils::{ApiResponse, AppError, AppResult};
