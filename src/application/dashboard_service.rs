// Dashboard service - Fetch through the cache, then render
use crate::application::fleet_api::{FetchError, ImagePayload};
use crate::application::result_cache::CachedFleetApi;
use crate::application::session::{SessionContext, REFRESH_INTERVAL_OPTIONS};
use crate::domain::fleet::{
    short_date, short_or_na, short_timestamp, DeviceId, DeviceRecord, DeviceStatus, ImageRecord,
    StatisticsSnapshot,
};
use crate::domain::map::{MapTileStyle, MapView};
use crate::domain::selection::ClickPoint;
use crate::domain::view::{
    Alert, Bar, BarChart, DashboardView, DeviceDetail, Gallery, ImageCard, Metrics, Notice,
    RefreshStatus, SidebarView, OFFLINE_COLOR, ONLINE_COLOR,
};
use std::sync::Arc;

pub const GALLERY_COLUMNS: usize = 3;

/// Everything one render needs. Holds no handles to the outside world.
pub struct RenderInput<'a> {
    pub devices: &'a [DeviceRecord],
    pub stats: &'a StatisticsSnapshot,
    pub images: Option<&'a [ImageRecord]>,
    pub session: &'a SessionContext,
    pub notices: Vec<Notice>,
    pub rendered_at: String,
}

#[derive(Clone)]
pub struct DashboardService {
    api: CachedFleetApi,
    image_limit: u32,
    click_tolerance: f64,
}

impl DashboardService {
    pub fn new(api: CachedFleetApi, image_limit: u32, click_tolerance: f64) -> Self {
        Self {
            api,
            image_limit,
            click_tolerance,
        }
    }

    pub async fn load_locations(&self, notices: &mut Vec<Notice>) -> Arc<Vec<DeviceRecord>> {
        match self.api.locations().await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!("Error fetching device locations: {}", e);
                notices.push(Notice::warning(format!("Error connecting to API: {}", e)));
                Arc::new(Vec::new())
            }
        }
    }

    pub async fn load_statistics(&self, notices: &mut Vec<Notice>) -> Arc<StatisticsSnapshot> {
        match self.api.statistics().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("Error fetching statistics: {}", e);
                notices.push(Notice::warning(format!("Error fetching statistics: {}", e)));
                Arc::new(StatisticsSnapshot::default())
            }
        }
    }

    pub async fn load_images(&self, device_id: DeviceId, notices: &mut Vec<Notice>) -> Arc<Vec<ImageRecord>> {
        match self.api.images(device_id, self.image_limit).await {
            Ok(images) => images,
            Err(e) => {
                tracing::warn!("Error fetching images for device {}: {}", device_id, e);
                notices.push(Notice::warning(format!("Error fetching images: {}", e)));
                Arc::new(Vec::new())
            }
        }
    }

    /// Run one fetch-and-render pass for the given session.
    pub async fn render(&self, session: &SessionContext) -> DashboardView {
        let mut location_notices = Vec::new();
        let mut stats_notices = Vec::new();
        let (devices, stats) = futures::join!(
            self.load_locations(&mut location_notices),
            self.load_statistics(&mut stats_notices),
        );

        let mut notices = session.pending_notices.clone();
        notices.extend(location_notices);
        notices.extend(stats_notices);

        let images = match session.selection.lookup(&devices) {
            Some(device) if session.options.show_images => {
                Some(self.load_images(device.id, &mut notices).await)
            }
            _ => None,
        };

        render_dashboard(RenderInput {
            devices: &devices,
            stats: &stats,
            images: images.as_deref().map(|v| v.as_slice()),
            session,
            notices,
            rendered_at: chrono::Local::now().format("%H:%M:%S").to_string(),
        })
    }

    /// Fetch the fleet a map click resolves against. Runs without the
    /// session so a slow backend delays only the click itself.
    pub async fn click_targets(&self, point: ClickPoint) -> ClickTargets {
        let mut notices = Vec::new();
        let devices = self.load_locations(&mut notices).await;
        ClickTargets {
            point,
            devices,
            notices,
            tolerance: self.click_tolerance,
        }
    }

    /// Bytes of one gallery image, located through the device's image list.
    pub async fn image(&self, device_id: DeviceId, image_id: i64) -> Result<ImagePayload, FetchError> {
        let images = self.api.images(device_id, self.image_limit).await?;
        let record = images
            .iter()
            .find(|img| img.id == image_id)
            .ok_or_else(|| FetchError::Image(format!("image {} not listed for device {}", image_id, device_id)))?;

        self.api.api().fetch_image_bytes(&record.locator).await
    }
}

/// A map click paired with the fleet snapshot it is resolved against.
pub struct ClickTargets {
    point: ClickPoint,
    devices: Arc<Vec<DeviceRecord>>,
    notices: Vec<Notice>,
    tolerance: f64,
}

impl ClickTargets {
    /// Update the selection and queue any fetch warning for the next page.
    /// Returns the selected id when a marker matched.
    pub fn apply(self, session: &mut SessionContext) -> Option<DeviceId> {
        session.pending_notices.extend(self.notices);

        let selected = session.selection.apply_click(self.point, &self.devices, self.tolerance);
        match selected {
            Some(id) => tracing::info!("Selected device {} from map click {:?}", id, self.point),
            None => tracing::debug!("Map click {:?} matched no device", self.point),
        }
        selected
    }
}

/// Pure projection of fetched data plus session state into a view.
pub fn render_dashboard(input: RenderInput<'_>) -> DashboardView {
    let RenderInput {
        devices,
        stats,
        images,
        session,
        notices,
        rendered_at,
    } = input;

    let options = &session.options;

    let metrics = Metrics {
        active_devices: devices.iter().filter(|d| d.is_online()).count(),
        total_detections: stats.total_detections.unwrap_or(0),
        avg_temperature: stats.avg_temperature,
        avg_humidity: stats.avg_humidity,
    };

    let alerts = devices
        .iter()
        .filter(|d| d.has_detections())
        .map(|d| Alert {
            device_id: d.id,
            location: d.location.clone(),
            message: format!("ALERT! Aedes detected at {}", d.location),
        })
        .collect();

    let selected = session.selection.lookup(devices);
    let detail = selected.map(device_detail);

    let gallery = match (selected, images) {
        (Some(device), Some(images)) if options.show_images => build_gallery(device.id, images),
        _ => Gallery::Hidden,
    };

    let chart = (!devices.is_empty()).then(|| bar_chart(devices));

    DashboardView {
        metrics,
        alerts,
        map: MapView::project(devices, options.map_style),
        detail,
        gallery,
        chart,
        notices,
        refresh: RefreshStatus {
            auto_refresh: options.auto_refresh,
            interval_secs: options.interval_secs,
            background_interval_secs: options.background_interval_secs,
            tick: session.last_tick.count,
            cache_cleared: session.last_tick.cache_cleared,
            last_update: rendered_at,
        },
        sidebar: SidebarView {
            auto_refresh: options.auto_refresh,
            interval_secs: options.interval_secs,
            interval_options: REFRESH_INTERVAL_OPTIONS.to_vec(),
            show_images: options.show_images,
            map_style: options.map_style,
            map_styles: MapTileStyle::ALL.to_vec(),
        },
        has_selection: session.selection.selected().is_some(),
    }
}

fn device_detail(device: &DeviceRecord) -> DeviceDetail {
    DeviceDetail {
        id: device.id,
        name: device.name.clone(),
        location: device.location.clone(),
        status: device.status.display().to_string(),
        total_detections: device.total_detections,
        last_seen: short_or_na(device.last_seen.as_deref()),
        last_detection: short_or_na(device.last_detection.as_deref()),
    }
}

fn build_gallery(device_id: DeviceId, images: &[ImageRecord]) -> Gallery {
    if images.is_empty() {
        return Gallery::Empty;
    }

    let cards = images
        .iter()
        .enumerate()
        .map(|(idx, img)| ImageCard {
            id: img.id,
            column: idx % GALLERY_COLUMNS,
            timestamp: short_timestamp(&img.timestamp),
            caption: format!("Detection {}", short_date(&img.timestamp)),
            detection_count: img.detection_count,
            confidence: format!("{:.2}", img.confidence),
            temperature: format!("{:.1}", img.temperature),
            humidity: format!("{:.1}", img.humidity),
            locator: img.locator.clone(),
            src: format!("/images/{}/{}", device_id, img.id),
        })
        .collect();

    Gallery::Images(cards)
}

fn bar_chart(devices: &[DeviceRecord]) -> BarChart {
    let bars = devices
        .iter()
        .map(|d| Bar {
            label: d.name.clone(),
            value: d.total_detections,
            status: d.status,
            color: match d.status {
                DeviceStatus::Online => ONLINE_COLOR,
                DeviceStatus::Offline => OFFLINE_COLOR,
            },
        })
        .collect();

    BarChart {
        title: "Detections per device".to_string(),
        bars,
    }
}
