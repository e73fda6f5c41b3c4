use std::path::PathBuf;

use crate::topology::seed::DEFAULT_ORIGIN_DISTRICT;

/// 服务器配置 - 枢纽服务器的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/hub-network | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
/// | DATABASE_FILE | hub-network.redb | 数据库文件 (相对 WORK_DIR) |
/// | HUB_TOPOLOGY_PATH | (无) | 拓扑 JSON，未设置时使用内置 Kerala 网络 |
/// | ORIGIN_WAREHOUSE_DISTRICT | Kottayam | 源仓库所在地区 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/hub HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub database_file: String,
    /// 拓扑种子文件，仅在数据库为空时使用
    pub topology_path: Option<String>,
    pub origin_district: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/hub-network".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            database_file: std::env::var("DATABASE_FILE")
                .unwrap_or_else(|_| "hub-network.redb".into()),
            topology_path: std::env::var("HUB_TOPOLOGY_PATH")
                .ok()
                .filter(|p| !p.is_empty()),
            origin_district: std::env::var("ORIGIN_WAREHOUSE_DISTRICT")
                .unwrap_or_else(|_| DEFAULT_ORIGIN_DISTRICT.into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库文件路径 (绝对路径原样使用)
    pub fn database_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.database_file);
        if file.is_absolute() {
            file
        } else {
            PathBuf::from(&self.work_dir).join(file)
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
