// Fleet domain models as served by the detection backend
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DeviceId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    /// Anything other than `online` counts as offline.
    #[serde(other)]
    Offline,
}

impl DeviceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "🟢 Active",
            DeviceStatus::Offline => "🔴 Inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "raspberry_id")]
    pub id: DeviceId,
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub last_seen: Option<String>,
    pub status: DeviceStatus,
    #[serde(default)]
    pub total_detections: u64,
    #[serde(default)]
    pub last_detection: Option<String>,
}

impl DeviceRecord {
    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }

    pub fn has_detections(&self) -> bool {
        self.total_detections > 0
    }
}

/// Where the image bytes for a capture live.
///
/// Backends disagree on the key: some send `image_url` (HTTP), others
/// `image_path` (a filesystem path on the dashboard host). Whichever one is
/// present is carried through as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ImageLocator {
    Url(String),
    Path(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawImageRecord")]
pub struct ImageRecord {
    pub id: i64,
    pub timestamp: String,
    pub detection_count: u64,
    pub confidence: f64,
    pub locator: ImageLocator,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Deserialize)]
struct RawImageRecord {
    id: i64,
    timestamp: String,
    #[serde(default)]
    detection_count: u64,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_path: Option<String>,
    #[serde(default)]
    temperature: f64,
    #[serde(default)]
    humidity: f64,
}

impl From<RawImageRecord> for ImageRecord {
    fn from(raw: RawImageRecord) -> Self {
        let locator = match (raw.image_url, raw.image_path) {
            (Some(url), _) => ImageLocator::Url(url),
            (None, Some(path)) => ImageLocator::Path(path),
            (None, None) => ImageLocator::Missing,
        };
        Self {
            id: raw.id,
            timestamp: raw.timestamp,
            detection_count: raw.detection_count,
            confidence: raw.confidence,
            locator,
            temperature: raw.temperature,
            humidity: raw.humidity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    #[serde(default)]
    pub total_detections: Option<u64>,
    #[serde(default)]
    pub active_raspberries: Option<u64>,
    #[serde(default)]
    pub avg_temperature: Option<f64>,
    #[serde(default)]
    pub avg_humidity: Option<f64>,
    #[serde(default)]
    pub detections_by_pi: Option<HashMap<String, u64>>,
}

/// Shorten an ISO-8601 timestamp to `YYYY-MM-DDTHH:MM`.
pub fn short_timestamp(ts: &str) -> String {
    ts.chars().take(16).collect()
}

/// Date part of an ISO-8601 timestamp.
pub fn short_date(ts: &str) -> String {
    ts.chars().take(10).collect()
}

pub fn short_or_na(ts: Option<&str>) -> String {
    match ts {
        Some(ts) if !ts.is_empty() => short_timestamp(ts),
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_record_from_backend_json() {
        let json = r#"{
            "raspberry_id": 7,
            "name": "Pi Norte",
            "location": "Amarilis",
            "latitude": -9.93,
            "longitude": -76.24,
            "last_seen": "2024-05-01T10:15:42.123456",
            "status": "online",
            "total_detections": 4,
            "last_detection": null
        }"#;

        let device: DeviceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(device.id, 7);
        assert!(device.is_online());
        assert!(device.has_detections());
        assert_eq!(device.last_detection, None);
    }

    #[test]
    fn test_image_locator_accepts_either_key() {
        let with_url: ImageRecord = serde_json::from_str(
            r#"{"id":1,"timestamp":"2024-05-01T10:00:00","detection_count":2,"confidence":0.91,
                "image_url":"https://cdn.example/1.jpg","temperature":24.5,"humidity":71.0}"#,
        )
        .unwrap();
        assert_eq!(with_url.locator, ImageLocator::Url("https://cdn.example/1.jpg".into()));

        let with_path: ImageRecord = serde_json::from_str(
            r#"{"id":2,"timestamp":"2024-05-01T10:00:00","detection_count":0,"confidence":0.5,
                "image_path":"captures/2.jpg","temperature":22.0,"humidity":60.0}"#,
        )
        .unwrap();
        assert_eq!(with_path.locator, ImageLocator::Path("captures/2.jpg".into()));

        let without: ImageRecord =
            serde_json::from_str(r#"{"id":3,"timestamp":"2024-05-01T10:00:00"}"#).unwrap();
        assert_eq!(without.locator, ImageLocator::Missing);
    }

    #[test]
    fn test_unknown_status_reads_as_offline() {
        let devices: Vec<DeviceRecord> = serde_json::from_str(
            r#"[{"raspberry_id":1,"name":"Pi 1","location":"Site 1","latitude":-9.9,"longitude":-76.2,"status":"online"},
                {"raspberry_id":2,"name":"Pi 2","location":"Site 2","latitude":-9.8,"longitude":-76.1,"status":"maintenance"}]"#,
        )
        .unwrap();
        assert_eq!(devices.len(), 2);
        assert!(devices[0].is_online());
        assert_eq!(devices[1].status, DeviceStatus::Offline);
        assert_eq!(devices[1].status.display(), "🔴 Inactive");
    }

    #[test]
    fn test_statistics_tolerates_missing_fields() {
        let stats: StatisticsSnapshot = serde_json::from_str(r#"{"total_detections": 12}"#).unwrap();
        assert_eq!(stats.total_detections, Some(12));
        assert_eq!(stats.avg_temperature, None);
        assert!(stats.detections_by_pi.is_none());
    }

    #[test]
    fn test_short_timestamps() {
        assert_eq!(short_timestamp("2024-05-01T10:15:42.123456"), "2024-05-01T10:15");
        assert_eq!(short_date("2024-05-01T10:15:42"), "2024-05-01");
        assert_eq!(short_or_na(None), "N/A");
        assert_eq!(short_or_na(Some("")), "N/A");
    }
}
