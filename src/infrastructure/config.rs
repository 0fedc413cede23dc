use crate::application::refresh::{RefreshStrategy, DEFAULT_CLEAR_EVERY};
use crate::application::result_cache::CacheTtls;
use crate::application::session::{validate_interval, DashboardOptions};
use crate::domain::map::MapTileStyle;
use crate::domain::selection::CLICK_TOLERANCE_DEG;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://backend-3q27.onrender.com";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub refresh: RefreshSettings,
    pub view: ViewSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
    pub locations_ttl_secs: u64,
    pub images_ttl_secs: u64,
    pub statistics_ttl_secs: u64,
    pub clear_every_ticks: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            locations_ttl_secs: 10,
            images_ttl_secs: 5,
            statistics_ttl_secs: 15,
            clear_every_ticks: DEFAULT_CLEAR_EVERY,
        }
    }
}

impl CacheSettings {
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            locations: Duration::from_secs(self.locations_ttl_secs),
            images: Duration::from_secs(self.images_ttl_secs),
            statistics: Duration::from_secs(self.statistics_ttl_secs),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
    pub mode: RefreshStrategy,
    pub interval_secs: u64,
    pub blocking_interval_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            mode: RefreshStrategy::Cooperative,
            interval_secs: 10,
            blocking_interval_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewSettings {
    pub show_images: bool,
    pub image_limit: u32,
    pub map_style: MapTileStyle,
    pub click_tolerance_deg: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            show_images: true,
            image_limit: 3,
            map_style: MapTileStyle::OpenStreetMap,
            click_tolerance_deg: CLICK_TOLERANCE_DEG,
        }
    }
}

impl Settings {
    /// Initial sidebar state for a new session.
    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            auto_refresh: self.refresh.mode == RefreshStrategy::Cooperative,
            interval_secs: self.refresh.interval_secs,
            background_interval_secs: (self.refresh.mode == RefreshStrategy::Blocking)
                .then_some(self.refresh.blocking_interval_secs),
            show_images: self.view.show_images,
            map_style: self.view.map_style,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        validate_interval(self.refresh.interval_secs)?;
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be positive");
        }
        if self.refresh.blocking_interval_secs == 0 {
            anyhow::bail!("refresh.blocking_interval_secs must be positive");
        }
        if self.view.image_limit == 0 {
            anyhow::bail!("view.image_limit must be positive");
        }
        if !(self.view.click_tolerance_deg > 0.0) {
            anyhow::bail!("view.click_tolerance_deg must be positive");
        }
        Ok(())
    }
}

fn build_settings(builder: config::ConfigBuilder<config::builder::DefaultState>) -> anyhow::Result<Settings> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

/// Defaults, then `config/dashboard.*` if present, then `DASHBOARD__*` env vars.
pub fn load_settings() -> anyhow::Result<Settings> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        );

    build_settings(builder)
}
