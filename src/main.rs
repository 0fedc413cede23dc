// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::refresh::{run_blocking_loop, RefreshDriver, RefreshStrategy};
use crate::application::result_cache::{CachedFleetApi, ResultCache};
use crate::application::session::SessionContext;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::http_fleet_api::HttpFleetApi;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fleet_dashboard=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let settings = load_settings()?;

    // Backend client behind the shared result cache (infrastructure layer)
    let backend = Arc::new(HttpFleetApi::new(
        &settings.api.base_url,
        Duration::from_secs(settings.api.timeout_secs),
    )?);
    let cache = Arc::new(ResultCache::new());
    let api = CachedFleetApi::new(backend, cache.clone(), settings.cache.ttls());

    // Services (application layer)
    let dashboard = DashboardService::new(api, settings.view.image_limit, settings.view.click_tolerance_deg);
    let refresh = Arc::new(RefreshDriver::new(
        settings.refresh.mode,
        settings.cache.clear_every_ticks,
        cache,
    ));
    let session = Arc::new(Mutex::new(SessionContext::new(settings.dashboard_options())));

    let shutdown = Arc::new(Notify::new());
    let poller = match settings.refresh.mode {
        RefreshStrategy::Blocking => Some(tokio::spawn(run_blocking_loop(
            refresh.clone(),
            dashboard.clone(),
            session.clone(),
            Duration::from_secs(settings.refresh.blocking_interval_secs),
            shutdown.clone(),
        ))),
        RefreshStrategy::Cooperative | RefreshStrategy::Disabled => None,
    };

    let state = Arc::new(AppState {
        dashboard,
        refresh,
        session,
    });

    let addr: SocketAddr = settings.server.bind.parse()?;
    tracing::info!(
        "Starting fleet dashboard on {} (backend {}, refresh mode {})",
        addr,
        settings.api.base_url,
        settings.refresh.mode
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            shutdown.notify_one();
        })
        .await?;

    if let Some(poller) = poller {
        poller.await?;
    }

    Ok(())
}
