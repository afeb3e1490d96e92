//! HTTP API：名單送出、使用者查詢、遊玩限制與點擊追蹤。

pub mod error;
pub mod handlers;

use crate::adapters::Service;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Service>,
    /// 沒有設定任何試算表時，遊玩限制一律放行
    pub preview: bool,
}

impl AppState {
    pub fn new(service: Service, preview: bool) -> Self {
        Self {
            service: Arc::new(service),
            preview,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/submit-to-sheets", post(handlers::submit_to_sheets))
        .route("/api/check-user", post(handlers::check_user))
        .route("/api/check-duplicate", post(handlers::check_duplicate))
        .route("/api/check-play-limit", post(handlers::check_play_limit))
        .route("/api/track", post(handlers::track))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
