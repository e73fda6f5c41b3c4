use std::sync::Arc;

use redb::Database;

use crate::core::{Config, Result};
use crate::db::{open_database, open_in_memory};
use crate::orders::OrdersManager;
use crate::services::Collaborators;
use crate::topology::{TopologyDocument, TopologyService, kerala_network};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，clone 成本极低，可直接作为 axum State。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Arc<Database> | redb 数据库 |
/// | topology | Arc<TopologyService> | 枢纽拓扑 |
/// | orders | Arc<OrdersManager> | 订单命令处理 |
///
/// # 使用示例
///
/// ```ignore
/// let state = ServerState::initialize(&config)?;
/// let order = state.orders.get_order("...")?;
/// ```
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Arc<Database>,
    pub topology: Arc<TopologyService>,
    pub orders: Arc<OrdersManager>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("orders", &self.orders)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录并打开数据库
    /// 2. 加载拓扑 (空库时写入种子)
    /// 3. 创建订单管理器
    /// 4. 检查状态漂移
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let db_path = config.database_path();
        tracing::info!(path = %db_path.display(), "Opening database");
        let db = open_database(&db_path)?;
        Self::with_database(config, db, Collaborators::default())
    }

    /// 内存数据库状态 (测试用)
    pub fn in_memory(config: &Config, collaborators: Collaborators) -> Result<Self> {
        let db = open_in_memory()?;
        Self::with_database(config, db, collaborators)
    }

    fn with_database(
        config: &Config,
        db: Arc<Database>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let seed = Self::topology_seed(config)?;
        let topology = Arc::new(TopologyService::open(db.clone(), seed)?);
        let orders = Arc::new(OrdersManager::new(
            db.clone(),
            topology.clone(),
            collaborators,
        )?);

        // 上次运行遗留的状态漂移只告警，由管理员调用 repair
        let drift = orders.find_status_drift()?;
        if !drift.is_empty() {
            tracing::warn!(orders = drift.len(), "Orders with status drift found at startup");
        }

        Ok(Self {
            config: config.clone(),
            db,
            topology,
            orders,
        })
    }

    /// 拓扑种子: HUB_TOPOLOGY_PATH 指定的文件，否则内置 Kerala 网络。
    /// 源仓库地区始终取配置值。
    fn topology_seed(config: &Config) -> Result<TopologyDocument> {
        let mut seed = match &config.topology_path {
            Some(path) => {
                tracing::info!(path = %path, "Loading topology seed");
                TopologyDocument::load(path)?
            }
            None => kerala_network(),
        };
        seed.origin_district = config.origin_district.clone();
        Ok(seed)
    }

    /// 启动后台任务
    ///
    /// 目前只有追踪事件日志转发
    pub fn start_background_tasks(&self) {
        let mut rx = self.orders.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => tracing::debug!(
                        target: "tracking",
                        order_id = %event.order_id,
                        sequence = event.sequence,
                        event_type = ?event.event_type,
                        hub_id = ?event.hub_id,
                        "Tracking event"
                    ),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Tracking event subscriber lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
