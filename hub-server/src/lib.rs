//! Hub Server - 多枢纽配送网络履约引擎
//!
//! # 架构概述
//!
//! - **拓扑** (`topology`): 枢纽图、分区和路线生成
//! - **库存** (`inventory`): 按枢纽的库存台账和订单预留
//! - **订单** (`orders`): 追踪时间线驱动的订单生命周期和自提流程
//! - **协作方** (`services`): 补货、通知、退款
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! hub-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # redb 数据库
//! ├── topology/      # 枢纽图、路线
//! ├── inventory/     # 库存台账、预留协调
//! ├── orders/        # 订单命令、事件、存储
//! ├── services/      # 外部协作方
//! └── utils/         # 日志等工具
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod services;
pub mod topology;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use inventory::{InventoryLedger, ReservationCoordinator};
pub use orders::{OrderStorage, OrdersManager};
pub use topology::{HubGraph, RouteGenerator, TopologyService};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env，初始化日志
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_json = std::env::var("LOG_JSON").ok().map(|v| v == "true" || v == "1");
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty());
    init_logger_with_file(log_level.as_deref(), log_json, log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __  __      __
   / / / /_  __/ /_
  / /_/ / / / / __ \
 / __  / /_/ / /_/ /
/_/ /_/\__,_/_.___/
    _   __     __                      __
   / | / /__  / /__      ______  _____/ /__
  /  |/ / _ \/ __/ | /| / / __ \/ ___/ //_/
 / /|  /  __/ /_ | |/ |/ / /_/ / /  / ,<
/_/ |_/\___/\__/ |__/|__/\____/_/  /_/|_|
    "#
    );
}
