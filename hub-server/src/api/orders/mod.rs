//! Order API 模块
//!
//! 下单、查询、取消、签收和自提码。枢纽侧的扫描/出库在 [`super::hubs`]。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::place))
        .route("/drift", get(handler::list_drift))
        .route("/repair-all", post(handler::repair_all))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/deliver", post(handler::deliver))
        .route("/{id}/collection-code", post(handler::collection_code))
        .route("/{id}/verify-collection", post(handler::verify_collection))
        .route("/{id}/repair", post(handler::repair))
        .route("/{id}/refund/retry", post(handler::retry_refund))
}
