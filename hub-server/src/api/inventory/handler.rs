//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::hub::HubId;
use shared::inventory::{InventoryRecord, ProductId, RestockSource};

use crate::core::ServerState;
use crate::inventory::IntegrityReport;
use crate::orders::RestockResult;
use crate::utils::{ApiResponse, AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub amount: i64,
    #[serde(default = "default_source")]
    pub source: RestockSource,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_source() -> RestockSource {
    RestockSource::Admin
}

/// 手动修正两个计数
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub quantity: i64,
    pub reserved: i64,
}

/// 库存行 + 可用量
#[derive(Debug, Serialize)]
pub struct StockView {
    #[serde(flatten)]
    pub record: InventoryRecord,
    pub available: i64,
}

impl From<InventoryRecord> for StockView {
    fn from(record: InventoryRecord) -> Self {
        let available = record.available();
        Self { record, available }
    }
}

/// GET /api/inventory/:hub_id/:product_id - 查询库存行
pub async fn get_record(
    State(state): State<ServerState>,
    Path((hub_id, product_id)): Path<(HubId, ProductId)>,
) -> AppResult<ApiResponse<StockView>> {
    let record = state
        .orders
        .ledger()
        .get(hub_id, product_id)?
        .ok_or_else(|| {
            AppError::not_found(format!("Inventory {hub_id}/{product_id}"))
                .with_detail("hub_id", hub_id)
                .with_detail("product_id", product_id)
        })?;
    Ok(ApiResponse::success(record.into()))
}

/// GET /api/inventory/:hub_id - 枢纽全部库存行
pub async fn list_for_hub(
    State(state): State<ServerState>,
    Path(hub_id): Path<HubId>,
) -> AppResult<ApiResponse<Vec<StockView>>> {
    state.topology.hub(hub_id)?;
    let records = state.orders.ledger().list_for_hub(hub_id)?;
    Ok(ApiResponse::success(
        records.into_iter().map(StockView::from).collect(),
    ))
}

/// POST /api/inventory/:hub_id/:product_id/restock - 补货并重试挂起订单
pub async fn restock(
    State(state): State<ServerState>,
    Path((hub_id, product_id)): Path<(HubId, ProductId)>,
    Json(payload): Json<RestockRequest>,
) -> AppResult<ApiResponse<RestockResult>> {
    let result = state.orders.restock(
        hub_id,
        product_id,
        payload.amount,
        payload.source,
        payload.note,
    )?;
    Ok(ApiResponse::success(result))
}

/// PUT /api/inventory/:hub_id/:product_id/adjust - 手动修正
pub async fn adjust(
    State(state): State<ServerState>,
    Path((hub_id, product_id)): Path<(HubId, ProductId)>,
    Json(payload): Json<AdjustRequest>,
) -> AppResult<ApiResponse<StockView>> {
    state.topology.hub(hub_id)?;
    let record = state.orders.ledger().manual_adjust(
        hub_id,
        product_id,
        payload.quantity,
        payload.reserved,
    )?;
    Ok(ApiResponse::success(record.into()))
}

/// GET /api/inventory/audit - 完整性检查失败的库存行
pub async fn audit(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<IntegrityReport>>> {
    let reports = state.orders.ledger().audit()?;
    Ok(ApiResponse::success(reports))
}
