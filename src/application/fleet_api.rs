// Port for the remote detection backend
use crate::domain::fleet::{DeviceId, DeviceRecord, ImageLocator, ImageRecord, StatisticsSnapshot};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("image unavailable: {0}")]
    Image(String),
}

/// Image bytes together with their sniffed content type.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub content_type: &'static str,
    pub bytes: Bytes,
}

#[async_trait]
pub trait FleetApi: Send + Sync {
    /// All known devices with their last reported state
    async fn fetch_locations(&self) -> Result<Vec<DeviceRecord>, FetchError>;

    /// Most recent captures for one device, newest first
    async fn fetch_images(&self, device_id: DeviceId, limit: u32) -> Result<Vec<ImageRecord>, FetchError>;

    /// Fleet-wide aggregates
    async fn fetch_statistics(&self) -> Result<StatisticsSnapshot, FetchError>;

    /// Download (or read) the image behind a locator
    async fn fetch_image_bytes(&self, locator: &ImageLocator) -> Result<ImagePayload, FetchError>;
}
