// Router assembly
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_selection, health_check, image, index, map_click, update_settings, view_json,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(health_check))
        .route("/api/view", get(view_json))
        .route("/map/click", post(map_click))
        .route("/selection/clear", post(clear_selection))
        .route("/settings", post(update_settings))
        .route("/images/:device_id/:image_id", get(image))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
