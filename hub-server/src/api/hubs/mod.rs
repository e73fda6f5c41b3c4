//! Hub API 模块
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/hubs | GET | 枢纽列表 (按序号) |
//! | /api/hubs/{hub_id}/scan | POST | 到站扫描 |
//! | /api/hubs/{hub_id}/dispatch | POST | 出库 |
//! | /api/hubs/{hub_id}/orders | GET | 待处理订单 |
//! | /api/hubs/{hub_id}/dispatched | GET | 已出库订单 |
//! | /api/hubs/{hub_id}/active | PUT | 启用/停用 |
//! | /api/hubs/{hub_id}/tier | PUT | 修改层级 |
//! | /api/hubs/{hub_id}/reassign | POST | 改派路线 |
//! | /api/hubs/{hub_id}/decommission | POST | 撤站 |
//! | /api/routes/{district} | GET | 从源仓库到地区的路线 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/hubs", routes())
        .route("/api/routes/{district}", get(handler::route_for_district))
}

fn routes() -> Router<ServerState> {
    let floor_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{hub_id}/scan", post(handler::scan))
        .route("/{hub_id}/dispatch", post(handler::dispatch))
        .route("/{hub_id}/orders", get(handler::active_orders))
        .route("/{hub_id}/dispatched", get(handler::dispatched_orders));

    let manage_routes = Router::new()
        .route("/{hub_id}/active", put(handler::set_active))
        .route("/{hub_id}/tier", put(handler::set_tier))
        .route("/{hub_id}/reassign", post(handler::reassign))
        .route("/{hub_id}/decommission", post(handler::decommission));

    floor_routes.merge(manage_routes)
}
