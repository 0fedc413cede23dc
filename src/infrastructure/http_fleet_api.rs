// HTTP client for the detection backend
use crate::application::fleet_api::{FetchError, FleetApi, ImagePayload};
use crate::domain::fleet::{DeviceId, DeviceRecord, ImageLocator, ImageRecord, StatisticsSnapshot};
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpFleetApi {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    raspberry_locations: Vec<DeviceRecord>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    images: Vec<ImageRecord>,
}

impl HttpFleetApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, url: &str) -> Result<Bytes, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.bytes().await.map_err(transport_error)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let body = self.get(&self.url(path)).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn resolve_image_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            self.url(url)
        } else {
            url.to_string()
        }
    }
}

fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Transport("request timed out".to_string())
    } else {
        FetchError::Transport(e.to_string())
    }
}

/// Content type from the leading magic bytes, if they look like an image.
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[async_trait]
impl FleetApi for HttpFleetApi {
    async fn fetch_locations(&self) -> Result<Vec<DeviceRecord>, FetchError> {
        let response: LocationsResponse = self.get_json("/api/raspberry-locations").await?;
        Ok(response.raspberry_locations)
    }

    async fn fetch_images(&self, device_id: DeviceId, limit: u32) -> Result<Vec<ImageRecord>, FetchError> {
        let path = format!("/api/raspberry-images/{}?limit={}", device_id, limit);
        let response: ImagesResponse = self.get_json(&path).await?;
        Ok(response.images)
    }

    async fn fetch_statistics(&self) -> Result<StatisticsSnapshot, FetchError> {
        self.get_json("/api/statistics").await
    }

    async fn fetch_image_bytes(&self, locator: &ImageLocator) -> Result<ImagePayload, FetchError> {
        let bytes = match locator {
            ImageLocator::Url(url) => self
                .get(&self.resolve_image_url(url))
                .await
                .map_err(|e| FetchError::Image(e.to_string()))?,
            ImageLocator::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| FetchError::Image(format!("{}: {}", path, e)))?,
            ImageLocator::Missing => {
                return Err(FetchError::Image("record has no image locator".to_string()));
            }
        };

        let content_type = sniff_image_type(&bytes)
            .ok_or_else(|| FetchError::Image("unrecognised image data".to_string()))?;

        Ok(ImagePayload { content_type, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fleet::DeviceStatus;

    const LOCATIONS: &str = r#"{"raspberry_locations": [
        {"raspberry_id": 1, "name": "Pi Norte", "location": "Amarilis", "latitude": -9.93,
         "longitude": -76.24, "last_seen": "2024-05-01T10:15:42", "status": "online",
         "total_detections": 5, "last_detection": "2024-05-01T09:00:00"},
        {"raspberry_id": 2, "name": "Pi Sur", "location": "Pillco Marca", "latitude": -9.95,
         "longitude": -76.25, "last_seen": null, "status": "offline",
         "total_detections": 0, "last_detection": null}
    ]}"#;

    fn api(server: &mockito::ServerGuard) -> HttpFleetApi {
        HttpFleetApi::new(&format!("{}/", server.url()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_locations() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/raspberry-locations")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LOCATIONS)
            .create_async()
            .await;

        let devices = api(&server).fetch_locations().await.unwrap();
        mock.assert_async().await;
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].status, DeviceStatus::Offline);
        assert_eq!(devices[1].last_seen, None);
    }

    #[tokio::test]
    async fn test_fetch_images_passes_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/raspberry-images/7")
            .match_query(mockito::Matcher::UrlEncoded("limit".into(), "3".into()))
            .with_status(200)
            .with_body(
                r#"{"images": [{"id": 9, "timestamp": "2024-05-01T10:00:00", "detection_count": 1,
                    "confidence": 0.8, "image_url": "/static/9.jpg", "temperature": 25.0, "humidity": 70.0}]}"#,
            )
            .create_async()
            .await;

        let images = api(&server).fetch_images(7, 3).await.unwrap();
        mock.assert_async().await;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].locator, ImageLocator::Url("/static/9.jpg".into()));
    }

    #[tokio::test]
    async fn test_non_200_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/statistics")
            .with_status(503)
            .create_async()
            .await;

        let err = api(&server).fetch_statistics().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
    }

    #[tokio::test]
    async fn test_missing_field_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/raspberry-locations")
            .with_status(200)
            .with_body(r#"{"devices": []}"#)
            .create_async()
            .await;

        let err = api(&server).fetch_locations().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                if let Ok((socket, _)) = listener.accept().await {
                    held.push(socket);
                }
            }
        });

        let api = HttpFleetApi::new(&format!("http://{}", addr), Duration::from_millis(200)).unwrap();
        let err = api.fetch_locations().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_image_bytes_from_relative_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/static/9.jpg")
            .with_status(200)
            .with_body(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10][..])
            .create_async()
            .await;

        let payload = api(&server)
            .fetch_image_bytes(&ImageLocator::Url("/static/9.jpg".into()))
            .await
            .unwrap();
        assert_eq!(payload.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_image_bytes_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/static/broken.jpg")
            .with_status(200)
            .with_body("<html>not an image</html>")
            .create_async()
            .await;
        let api = api(&server);

        let err = api
            .fetch_image_bytes(&ImageLocator::Url("/static/broken.jpg".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Image(_)));

        let err = api
            .fetch_image_bytes(&ImageLocator::Path("/nonexistent/capture.jpg".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Image(_)));

        assert!(api.fetch_image_bytes(&ImageLocator::Missing).await.is_err());
    }

    #[test]
    fn test_sniff_image_type() {
        assert_eq!(sniff_image_type(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_image_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_type(b"{}"), None);
    }
}
