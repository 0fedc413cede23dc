// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::refresh::RefreshDriver;
use crate::application::session::SessionContext;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardService,
    pub refresh: Arc<RefreshDriver>,
    pub session: Arc<Mutex<SessionContext>>,
}
