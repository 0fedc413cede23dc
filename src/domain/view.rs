// Rendered dashboard view model
use super::fleet::{DeviceId, DeviceStatus, ImageLocator};
use super::map::{MapTileStyle, MapView};
use serde::Serialize;

pub const ONLINE_COLOR: &str = "#28a745";
pub const OFFLINE_COLOR: &str = "#dc3545";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A non-blocking message shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTile {
    pub id: String,
    pub title: String,
    pub value: String,
}

impl MetricTile {
    pub fn new(id: &str, title: &str, value: String) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub active_devices: usize,
    pub total_detections: u64,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
}

/// Averages keep a trailing `.0` when reported; a missing average reads `0`.
fn format_average(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => "0".to_string(),
    }
}

impl Metrics {
    pub fn tiles(&self) -> Vec<MetricTile> {
        vec![
            MetricTile::new("active", "🍓 Active devices", self.active_devices.to_string()),
            MetricTile::new("detections", "🎯 Total detections", self.total_detections.to_string()),
            MetricTile::new("temperature", "🌡️ Average temperature", format!("{}°C", format_average(self.avg_temperature))),
            MetricTile::new("humidity", "💧 Average humidity", format!("{}%", format_average(self.avg_humidity))),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub device_id: DeviceId,
    pub location: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceDetail {
    pub id: DeviceId,
    pub name: String,
    pub location: String,
    pub status: String,
    pub total_detections: u64,
    pub last_seen: String,
    pub last_detection: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageCard {
    pub id: i64,
    pub column: usize,
    pub timestamp: String,
    pub caption: String,
    pub detection_count: u64,
    pub confidence: String,
    pub temperature: String,
    pub humidity: String,
    pub locator: ImageLocator,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "cards", rename_all = "lowercase")]
pub enum Gallery {
    Hidden,
    Empty,
    Images(Vec<ImageCard>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: u64,
    pub status: DeviceStatus,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn max_value(&self) -> u64 {
        self.bars.iter().map(|b| b.value).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshStatus {
    pub auto_refresh: bool,
    pub interval_secs: u64,
    pub background_interval_secs: Option<u64>,
    pub tick: u64,
    pub cache_cleared: bool,
    pub last_update: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarView {
    pub auto_refresh: bool,
    pub interval_secs: u64,
    pub interval_options: Vec<u64>,
    pub show_images: bool,
    pub map_style: MapTileStyle,
    pub map_styles: Vec<MapTileStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub metrics: Metrics,
    pub alerts: Vec<Alert>,
    pub map: Option<MapView>,
    pub detail: Option<DeviceDetail>,
    pub gallery: Gallery,
    pub chart: Option<BarChart>,
    pub notices: Vec<Notice>,
    pub refresh: RefreshStatus,
    pub sidebar: SidebarView,
    pub has_selection: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_tiles_format_units() {
        let metrics = Metrics {
            active_devices: 2,
            total_detections: 17,
            avg_temperature: Some(24.5),
            avg_humidity: None,
        };
        let tiles = metrics.tiles();
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[2].value, "24.5°C");
        assert_eq!(tiles[3].value, "0%");
    }

    #[test]
    fn test_whole_number_averages_keep_decimal() {
        let metrics = Metrics {
            active_devices: 0,
            total_detections: 0,
            avg_temperature: Some(24.0),
            avg_humidity: Some(70.0),
        };
        let tiles = metrics.tiles();
        assert_eq!(tiles[2].value, "24.0°C");
        assert_eq!(tiles[3].value, "70.0%");
    }

    #[test]
    fn test_bar_chart_max() {
        let chart = BarChart { title: "t".into(), bars: vec![] };
        assert_eq!(chart.max_value(), 0);
    }
}
