// Map projection of the device fleet
use super::fleet::{short_or_na, DeviceId, DeviceRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ZOOM: u8 = 13;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapTileStyle {
    #[default]
    #[serde(rename = "OpenStreetMap")]
    OpenStreetMap,
    #[serde(rename = "CartoDB positron")]
    CartoDbPositron,
    #[serde(rename = "CartoDB dark_matter")]
    CartoDbDarkMatter,
}

impl MapTileStyle {
    pub const ALL: [MapTileStyle; 3] = [
        MapTileStyle::OpenStreetMap,
        MapTileStyle::CartoDbPositron,
        MapTileStyle::CartoDbDarkMatter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MapTileStyle::OpenStreetMap => "OpenStreetMap",
            MapTileStyle::CartoDbPositron => "CartoDB positron",
            MapTileStyle::CartoDbDarkMatter => "CartoDB dark_matter",
        }
    }

    pub fn tile_url(&self) -> &'static str {
        match self {
            MapTileStyle::OpenStreetMap => "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            MapTileStyle::CartoDbPositron => {
                "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
            }
            MapTileStyle::CartoDbDarkMatter => {
                "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png"
            }
        }
    }

    pub fn attribution(&self) -> &'static str {
        match self {
            MapTileStyle::OpenStreetMap => "&copy; OpenStreetMap contributors",
            _ => "&copy; OpenStreetMap contributors &copy; CARTO",
        }
    }
}

impl fmt::Display for MapTileStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapTileStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MapTileStyle::ALL
            .into_iter()
            .find(|style| style.name() == s)
            .ok_or_else(|| format!("unknown map style '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Black,
    Green,
    Red,
}

impl MarkerColor {
    /// Detections win over connectivity.
    pub fn for_device(device: &DeviceRecord) -> Self {
        if device.has_detections() {
            MarkerColor::Black
        } else if device.is_online() {
            MarkerColor::Green
        } else {
            MarkerColor::Red
        }
    }

    pub fn css(&self) -> &'static str {
        match self {
            MarkerColor::Black => "#222222",
            MarkerColor::Green => "#28a745",
            MarkerColor::Red => "#dc3545",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub device_id: DeviceId,
    pub name: String,
    pub location: String,
    pub lat: f64,
    pub lng: f64,
    pub color: MarkerColor,
    pub fill: &'static str,
    pub tooltip: String,
    pub total_detections: u64,
    pub last_seen: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub style: MapTileStyle,
    pub markers: Vec<Marker>,
}

impl MapView {
    /// Project devices onto a map centred on their mean position.
    /// An empty fleet has no map.
    pub fn project(devices: &[DeviceRecord], style: MapTileStyle) -> Option<Self> {
        if devices.is_empty() {
            return None;
        }

        let n = devices.len() as f64;
        let center_lat = devices.iter().map(|d| d.latitude).sum::<f64>() / n;
        let center_lng = devices.iter().map(|d| d.longitude).sum::<f64>() / n;

        let markers = devices
            .iter()
            .map(|d| {
                let color = MarkerColor::for_device(d);
                Marker {
                    device_id: d.id,
                    name: d.name.clone(),
                    location: d.location.clone(),
                    lat: d.latitude,
                    lng: d.longitude,
                    color,
                    fill: color.css(),
                    tooltip: format!("Click to view {}", d.name),
                    total_detections: d.total_detections,
                    last_seen: short_or_na(d.last_seen.as_deref()),
                    status: d.status.display().to_string(),
                }
            })
            .collect();

        Some(Self {
            center: (center_lat, center_lng),
            zoom: DEFAULT_ZOOM,
            style,
            markers,
        })
    }
}
