//! Hub API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::hub::{Hub, HubId, HubTier};
use shared::order::OrderSnapshot;

use crate::core::ServerState;
use crate::orders::DecommissionReport;
use crate::topology::RouteGenerator;
use crate::utils::{ApiResponse, AppResult};

/// 枢纽扫描/出库请求
#[derive(Debug, Deserialize)]
pub struct HubCommandRequest {
    pub order_id: String,
    #[serde(default)]
    pub command_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetTierRequest {
    pub tier: HubTier,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub to_hub_id: HubId,
}

#[derive(Debug, Deserialize)]
pub struct DecommissionRequest {
    pub replacement_id: HubId,
}

/// GET /api/hubs - 枢纽列表
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Hub>>> {
    let graph = state.topology.graph();
    let hubs = graph.hubs_by_sequence().into_iter().cloned().collect();
    Ok(ApiResponse::success(hubs))
}

/// GET /api/routes/:district - 源仓库到地区的路线
pub async fn route_for_district(
    State(state): State<ServerState>,
    Path(district): Path<String>,
) -> AppResult<ApiResponse<Vec<Hub>>> {
    let graph = state.topology.graph();
    let origin = graph.origin_warehouse()?;
    let route = RouteGenerator::new(&graph).generate_route(origin.id, &district)?;
    Ok(ApiResponse::success(route))
}

/// POST /api/hubs/:hub_id/scan - 到站扫描
pub async fn scan(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
    Json(payload): Json<HubCommandRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state
        .orders
        .scan_at_hub(payload.command_id, &payload.order_id, hub_id)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/hubs/:hub_id/dispatch - 出库
///
/// 已从该枢纽出库过的订单返回 `AlreadyDispatched`，details 中带冲突事件
pub async fn dispatch(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
    Json(payload): Json<HubCommandRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state
        .orders
        .dispatch_from_hub(payload.command_id, &payload.order_id, hub_id)?;
    Ok(ApiResponse::success(order))
}

/// GET /api/hubs/:hub_id/orders - 该枢纽待处理的订单
pub async fn active_orders(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
) -> AppResult<ApiResponse<Vec<OrderSnapshot>>> {
    state.topology.hub(hub_id)?;
    let orders = state.orders.active_orders_at_hub(hub_id)?;
    Ok(ApiResponse::success(orders))
}

/// GET /api/hubs/:hub_id/dispatched - 该枢纽已出库的订单
pub async fn dispatched_orders(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
) -> AppResult<ApiResponse<Vec<OrderSnapshot>>> {
    state.topology.hub(hub_id)?;
    let orders = state.orders.dispatched_orders_from_hub(hub_id)?;
    Ok(ApiResponse::success(orders))
}

/// PUT /api/hubs/:hub_id/active - 启用/停用枢纽
pub async fn set_active(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
    Json(payload): Json<SetActiveRequest>,
) -> AppResult<ApiResponse<Hub>> {
    let hub = state.orders.set_hub_active(hub_id, payload.active)?;
    Ok(ApiResponse::success(hub))
}

/// PUT /api/hubs/:hub_id/tier - 修改枢纽层级
pub async fn set_tier(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
    Json(payload): Json<SetTierRequest>,
) -> AppResult<ApiResponse<Hub>> {
    let hub = state.topology.set_hub_tier(hub_id, payload.tier)?;
    Ok(ApiResponse::success(hub))
}

/// POST /api/hubs/:hub_id/reassign - 把未完成订单改派到另一枢纽
pub async fn reassign(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
    Json(payload): Json<ReassignRequest>,
) -> AppResult<ApiResponse<Vec<OrderSnapshot>>> {
    let orders = state.orders.reassign_hub(hub_id, payload.to_hub_id)?;
    Ok(ApiResponse::success(orders))
}

/// POST /api/hubs/:hub_id/decommission - 撤站
pub async fn decommission(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
    Json(payload): Json<DecommissionRequest>,
) -> AppResult<ApiResponse<DecommissionReport>> {
    let report = state.orders.decommission_hub(hub_id, payload.replacement_id)?;
    Ok(ApiResponse::success(report))
}
