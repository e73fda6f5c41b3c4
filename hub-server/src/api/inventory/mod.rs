//! Inventory API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/audit", get(handler::audit))
        .route("/{hub_id}", get(handler::list_for_hub))
        .route("/{hub_id}/{product_id}", get(handler::get_record))
        .route("/{hub_id}/{product_id}/restock", post(handler::restock))
        .route("/{hub_id}/{product_id}/adjust", put(handler::adjust))
}
