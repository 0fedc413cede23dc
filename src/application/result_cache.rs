// Time-bounded memoisation of backend calls
use crate::application::fleet_api::{FetchError, FleetApi};
use crate::domain::fleet::{DeviceId, DeviceRecord, ImageRecord, StatisticsSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Locations,
    Images,
    Statistics,
}

/// Endpoint plus the full argument tuple of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Locations,
    Images { device_id: DeviceId, limit: u32 },
    Statistics,
}

impl CacheKey {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            CacheKey::Locations => Endpoint::Locations,
            CacheKey::Images { .. } => Endpoint::Images,
            CacheKey::Statistics => Endpoint::Statistics,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Locations(Arc<Vec<DeviceRecord>>),
    Images(Arc<Vec<ImageRecord>>),
    Statistics(Arc<StatisticsSnapshot>),
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedValue,
    stored_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheTtls {
    pub locations: Duration,
    pub images: Duration,
    pub statistics: Duration,
}

impl CacheTtls {
    pub fn for_endpoint(&self, endpoint: Endpoint) -> Duration {
        match endpoint {
            Endpoint::Locations => self.locations,
            Endpoint::Images => self.images,
            Endpoint::Statistics => self.statistics,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            locations: Duration::from_secs(10),
            images: Duration::from_secs(5),
            statistics: Duration::from_secs(15),
        }
    }
}

/// Last successful response per call, valid while younger than the
/// endpoint's TTL. Entries are only ever dropped wholesale by `clear`.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // A poisoned map only ever holds whole entries, so keep using it
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &CacheKey, ttl: Duration) -> Option<CachedValue> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: CacheKey, value: CachedValue) {
        self.lock().insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry regardless of age. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// `FleetApi` calls routed through a shared `ResultCache`.
///
/// Only successful responses are stored; a failed call leaves any previous
/// entry alone and is retried on the next call.
#[derive(Clone)]
pub struct CachedFleetApi {
    api: Arc<dyn FleetApi>,
    cache: Arc<ResultCache>,
    ttls: CacheTtls,
}

impl CachedFleetApi {
    pub fn new(api: Arc<dyn FleetApi>, cache: Arc<ResultCache>, ttls: CacheTtls) -> Self {
        Self { api, cache, ttls }
    }

    pub fn api(&self) -> &Arc<dyn FleetApi> {
        &self.api
    }

    #[cfg(test)]
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    fn cached(&self, key: &CacheKey) -> Option<CachedValue> {
        let hit = self.cache.get(key, self.ttls.for_endpoint(key.endpoint()));
        match &hit {
            Some(_) => tracing::debug!("cache hit for {:?}", key),
            None => tracing::debug!("cache miss for {:?}", key),
        }
        hit
    }

    pub async fn locations(&self) -> Result<Arc<Vec<DeviceRecord>>, FetchError> {
        let key = CacheKey::Locations;
        if let Some(CachedValue::Locations(devices)) = self.cached(&key) {
            return Ok(devices);
        }

        let devices = Arc::new(self.api.fetch_locations().await?);
        self.cache.insert(key, CachedValue::Locations(devices.clone()));
        Ok(devices)
    }

    pub async fn images(&self, device_id: DeviceId, limit: u32) -> Result<Arc<Vec<ImageRecord>>, FetchError> {
        let key = CacheKey::Images { device_id, limit };
        if let Some(CachedValue::Images(images)) = self.cached(&key) {
            return Ok(images);
        }

        let images = Arc::new(self.api.fetch_images(device_id, limit).await?);
        self.cache.insert(key, CachedValue::Images(images.clone()));
        Ok(images)
    }

    pub async fn statistics(&self) -> Result<Arc<StatisticsSnapshot>, FetchError> {
        let key = CacheKey::Statistics;
        if let Some(CachedValue::Statistics(stats)) = self.cached(&key) {
            return Ok(stats);
        }

        let stats = Arc::new(self.api.fetch_statistics().await?);
        self.cache.insert(key, CachedValue::Statistics(stats.clone()));
        Ok(stats)
    }
}
