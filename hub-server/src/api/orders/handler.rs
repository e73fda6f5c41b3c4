//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::order::{OrderSnapshot, PlaceOrderInput};

use crate::core::ServerState;
use crate::orders::{PlacementResult, StatusDrift};
use crate::utils::{ApiResponse, AppResult};

/// 可选幂等键
#[derive(Debug, Default, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub command_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub command_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCollectionRequest {
    pub code: String,
}

/// 自提码只在生成时返回一次
#[derive(Debug, Serialize)]
pub struct CollectionCodeResponse {
    pub code: String,
    pub order: OrderSnapshot,
}

/// POST /api/orders - 下单
///
/// 缺货不是错误: 结果中 `reservation` 为 `PENDING_STOCK`
pub async fn place(
    State(state): State<ServerState>,
    Json(payload): Json<PlaceOrderInput>,
) -> AppResult<ApiResponse<PlacementResult>> {
    let result = state.orders.place_order(payload)?;
    Ok(ApiResponse::success(result))
}

/// GET /api/orders/:id - 获取订单 (含追踪时间线)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state.orders.get_order(&id)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/:id/cancel - 取消订单
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state
        .orders
        .cancel_order(payload.command_id, &id, payload.reason)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/:id/deliver - 确认送达
pub async fn deliver(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CommandRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state.orders.confirm_delivery(payload.command_id, &id)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/:id/collection-code - 生成自提码
pub async fn collection_code(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CollectionCodeResponse>> {
    let (code, order) = state.orders.generate_collection_code(&id)?;
    Ok(ApiResponse::success(CollectionCodeResponse { code, order }))
}

/// POST /api/orders/:id/verify-collection - 核验自提码
pub async fn verify_collection(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<VerifyCollectionRequest>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state.orders.verify_collection(&id, &payload.code)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/:id/repair - 按时间线修正状态
pub async fn repair(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state.orders.repair_status(&id)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/:id/refund/retry - 重试失败的退款
pub async fn retry_refund(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderSnapshot>> {
    let order = state.orders.retry_refund(&id)?;
    Ok(ApiResponse::success(order))
}

/// GET /api/orders/drift - 状态与时间线不一致的订单
pub async fn list_drift(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<StatusDrift>>> {
    let drift = state.orders.find_status_drift()?;
    Ok(ApiResponse::success(drift))
}

/// POST /api/orders/repair-all
pub async fn repair_all(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<OrderSnapshot>>> {
    let repaired = state.orders.repair_all_status()?;
    Ok(ApiResponse::success(repaired))
}
