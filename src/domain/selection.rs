// Device selection and map click resolution
use super::fleet::{DeviceId, DeviceRecord};
use serde::{Deserialize, Serialize};

/// Default matching window around a marker, in degrees (roughly 100 m).
pub const CLICK_TOLERANCE_DEG: f64 = 0.001;

/// A point reported by the map as the last clicked marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Which device's detail panel is currently expanded.
///
/// Survives refresh cycles untouched; only a resolved click or an explicit
/// clear changes it. A selected id that disappears from the latest fetch is
/// kept, lookups just come back empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    selected: Option<DeviceId>,
}

impl SelectionState {
    pub fn selected(&self) -> Option<DeviceId> {
        self.selected
    }

    pub fn select(&mut self, id: DeviceId) {
        self.selected = Some(id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// The selected device, if it is still present in `devices`.
    pub fn lookup<'a>(&self, devices: &'a [DeviceRecord]) -> Option<&'a DeviceRecord> {
        let id = self.selected?;
        devices.iter().find(|d| d.id == id)
    }

    /// Apply a map click. Returns the newly selected id, or `None` when no
    /// device matched and the selection was left as it was.
    pub fn apply_click(
        &mut self,
        point: ClickPoint,
        devices: &[DeviceRecord],
        tolerance: f64,
    ) -> Option<DeviceId> {
        let id = resolve_click(point, devices, tolerance)?;
        self.select(id);
        Some(id)
    }
}

/// First device in list order whose coordinates are within `tolerance`
/// degrees of `point` on both axes. Plain absolute difference, no geodesy.
pub fn resolve_click(point: ClickPoint, devices: &[DeviceRecord], tolerance: f64) -> Option<DeviceId> {
    devices
        .iter()
        .find(|d| {
            (d.latitude - point.lat).abs() < tolerance && (d.longitude - point.lng).abs() < tolerance
        })
        .map(|d| d.id)
}
