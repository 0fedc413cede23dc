// HTTP request handlers
use crate::application::refresh::RefreshStrategy;
use crate::application::session::validate_interval;
use crate::domain::map::MapTileStyle;
use crate::domain::selection::ClickPoint;
use crate::domain::view::DashboardView;
use crate::presentation::app_state::AppState;
use crate::presentation::page::render_page;
use axum::{
    extract::{Form, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct PageQuery {
    pub refresh: Option<String>,
}

#[derive(Deserialize)]
pub struct ClickForm {
    pub lat: f64,
    pub lng: f64,
}

/// Sidebar form. Checkboxes are only sent when ticked.
#[derive(Deserialize)]
pub struct SettingsForm {
    pub auto_refresh: Option<String>,
    pub interval: u64,
    pub show_images: Option<String>,
    pub map_style: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Render the current session, ticking the refresh counter first when the
/// request came from the page's own auto-refresh timer.
async fn render_current(state: &AppState, auto_triggered: bool) -> DashboardView {
    let snapshot = {
        let mut session = state.session.lock().await;
        let ticks = auto_triggered
            && state.refresh.strategy() == RefreshStrategy::Cooperative
            && session.options.auto_refresh;

        if ticks {
            session.last_tick = state.refresh.tick();
        }

        let pending = std::mem::take(&mut session.pending_notices);
        let mut snapshot = session.clone();
        snapshot.pending_notices = pending;
        snapshot.last_tick.cache_cleared = ticks && session.last_tick.cache_cleared;
        snapshot
    };

    state.dashboard.render(&snapshot).await
}

/// Dashboard page
pub async fn index(Query(query): Query<PageQuery>, State(state): State<Arc<AppState>>) -> Html<String> {
    let auto_triggered = query.refresh.as_deref() == Some("auto");
    let view = render_current(&state, auto_triggered).await;
    Html(render_page(&view))
}

/// Dashboard view model as JSON
pub async fn view_json(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(render_current(&state, false).await)
}

/// Marker click reported by the map
pub async fn map_click(State(state): State<Arc<AppState>>, Form(form): Form<ClickForm>) -> Redirect {
    let point = ClickPoint {
        lat: form.lat,
        lng: form.lng,
    };

    let targets = state.dashboard.click_targets(point).await;
    targets.apply(&mut *state.session.lock().await);
    Redirect::to("/")
}

pub async fn clear_selection(State(state): State<Arc<AppState>>) -> Redirect {
    state.session.lock().await.selection.clear();
    tracing::info!("Selection cleared");
    Redirect::to("/")
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SettingsForm>,
) -> Response {
    let interval = match validate_interval(form.interval) {
        Ok(secs) => secs,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let map_style = match form.map_style.parse::<MapTileStyle>() {
        Ok(style) => style,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let mut session = state.session.lock().await;
    let options = &mut session.options;
    options.auto_refresh =
        form.auto_refresh.is_some() && state.refresh.strategy() == RefreshStrategy::Cooperative;
    options.interval_secs = interval;
    options.show_images = form.show_images.is_some();
    options.map_style = map_style;
    tracing::info!("Dashboard options updated: {:?}", options);

    Redirect::to("/").into_response()
}

/// Proxy one gallery image from its backend locator
pub async fn image(
    Path((device_id, image_id)): Path<(i64, i64)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboard.image(device_id, image_id).await {
        Ok(payload) => ([(header::CONTENT_TYPE, payload.content_type)], payload.bytes).into_response(),
        Err(e) => {
            tracing::warn!("Image {} of device {} unavailable: {}", image_id, device_id, e);
            (StatusCode::BAD_GATEWAY, "Image unavailable").into_response()
        }
    }
}
