//! Caching wrapper: in-memory results by rounded coordinate, plus a minimum
//! spacing between upstream calls (public Nominatim allows one per second).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{PlaceInfo, ReverseGeocoder};
use crate::errors::EnrichmentError;
use crate::record::Coordinates;

// 4 decimals is roughly 11 m at the equator
const KEY_SCALE: f64 = 10_000.0;

pub struct CachingGeocoder<G: ReverseGeocoder> {
    inner: G,
    min_interval: Duration,
    capacity: usize,
    cache: Mutex<HashMap<(i64, i64), PlaceInfo>>,
    next_slot: tokio::sync::Mutex<Option<Instant>>,
}

impl<G: ReverseGeocoder> CachingGeocoder<G> {
    pub fn new(inner: G, min_interval: Duration, capacity: usize) -> Self {
        Self {
            inner,
            min_interval,
            capacity: capacity.max(1),
            cache: Mutex::new(HashMap::new()),
            next_slot: tokio::sync::Mutex::new(None),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().expect("geocode cache poisoned").len()
    }

    fn lookup(&self, key: (i64, i64)) -> Option<PlaceInfo> {
        self.cache
            .lock()
            .expect("geocode cache poisoned")
            .get(&key)
            .cloned()
    }

    fn store(&self, key: (i64, i64), place: &PlaceInfo) {
        let mut g = self.cache.lock().expect("geocode cache poisoned");
        if g.len() >= self.capacity && !g.contains_key(&key) {
            g.clear();
        }
        g.insert(key, place.clone());
    }

    /// Wait for our turn to call upstream. Upstream calls are serialized: the
    /// returned guard is held until the call finishes.
    async fn acquire_slot(&self) -> tokio::sync::MutexGuard<'_, Option<Instant>> {
        let mut slot = self.next_slot.lock().await;
        let now = Instant::now();
        if let Some(at) = *slot {
            if at > now {
                tokio::time::sleep_until(at).await;
            }
        }
        *slot = Some(Instant::now() + self.min_interval);
        slot
    }
}

fn cache_key(at: Coordinates) -> (i64, i64) {
    (
        (at.lat * KEY_SCALE).round() as i64,
        (at.lon * KEY_SCALE).round() as i64,
    )
}

#[async_trait]
impl<G: ReverseGeocoder> ReverseGeocoder for CachingGeocoder<G> {
    async fn reverse(&self, at: Coordinates) -> Result<PlaceInfo, EnrichmentError> {
        let key = cache_key(at);
        if let Some(hit) = self.lookup(key) {
            tracing::trace!(target: "geocode", lat = at.lat, lon = at.lon, "cache hit");
            return Ok(hit);
        }

        let _slot = self.acquire_slot().await;
        // a concurrent miss on the same key may have filled it while we waited
        if let Some(hit) = self.lookup(key) {
            return Ok(hit);
        }
        let place = self.inner.reverse(at).await?;
        self.store(key, &place);
        Ok(place)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
