//! Address resolution with cache-first lookups and throttled batches.

use crate::cache::{normalize_key, CacheStore, GeocodeCache};
use crate::config::ViewerConfig;
use crate::session::RenderToken;
use crate::utils::pause_ms;
use futures::future::{join_all, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub formatted_address: String,
}

impl GeocodeResult {
    /// Whether the result can be placed on a map. A zero coordinate is how
    /// the backend reports an unplaceable hit.
    pub fn has_coordinates(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && self.lat != 0.0 && self.lng != 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    Transport(String),
    /// The service answered with something other than `"OK"`.
    NotFound(String),
    Decode(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::Transport(msg) => write!(f, "Geocoding request failed: {}", msg),
            GeocodeError::NotFound(status) => write!(f, "Geocoding returned status {}", status),
            GeocodeError::Decode(msg) => write!(f, "Geocoding response unreadable: {}", msg),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// One remote address lookup.
pub trait Geocoder {
    fn lookup<'a>(&'a self, address: &'a str)
        -> LocalBoxFuture<'a, Result<GeocodeResult, GeocodeError>>;
}

/// Address → result, or `None` when the address could not be resolved.
pub type Resolved = HashMap<String, Option<GeocodeResult>>;

/// Resolves addresses through the cache first and the [`Geocoder`] second.
///
/// Misses are never cached, so a failed address is retried on the next pass.
pub struct GeocodeClient<G, S> {
    geocoder: G,
    cache: GeocodeCache<S>,
    batch_size: usize,
    pause_ms: u32,
}

impl<G: Geocoder, S: CacheStore> GeocodeClient<G, S> {
    pub fn new(geocoder: G, cache: GeocodeCache<S>, batch_size: usize, pause_ms: u32) -> Self {
        Self {
            geocoder,
            cache,
            batch_size: batch_size.max(1),
            pause_ms,
        }
    }

    pub fn from_config(geocoder: G, store: S, config: &ViewerConfig) -> Self {
        let cache = GeocodeCache::new(store, config.cache_key.clone(), config.cache_expiry_ms());
        Self::new(
            geocoder,
            cache,
            config.geocode_batch_size,
            config.geocode_pause_ms,
        )
    }

    pub fn cache(&self) -> &GeocodeCache<S> {
        &self.cache
    }

    /// Resolve a single address, storing a fresh hit in the cache.
    pub async fn resolve_one(&self, address: &str) -> Option<GeocodeResult> {
        if address.trim().is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.get(address) {
            return Some(hit);
        }
        let result = self.lookup_remote(address).await?;
        self.cache.set(address, result.clone());
        Some(result)
    }

    /// Resolve many addresses at once.
    ///
    /// Cache hits are answered immediately. Misses are deduplicated by cache
    /// key and looked up `batch_size` at a time with a short pause between
    /// groups; each finished group is written to the cache before the next
    /// starts. A failed lookup only affects its own address.
    ///
    /// The token is checked after every await. Once it is cancelled no
    /// further group is dispatched and the addresses never looked up are
    /// missing from the returned map.
    pub async fn resolve_batch(&self, addresses: &[String], token: &RenderToken) -> Resolved {
        let cached = self.cache.load();
        let mut resolved = Resolved::with_capacity(addresses.len());
        // cache key → every original spelling waiting on it
        let mut pending: Vec<(String, Vec<String>)> = Vec::new();
        let mut pending_index: HashMap<String, usize> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::with_capacity(addresses.len());

        for address in addresses {
            if !seen.insert(address.as_str()) {
                continue;
            }
            if address.trim().is_empty() {
                resolved.insert(address.clone(), None);
                continue;
            }
            let key = normalize_key(address);
            if let Some(entry) = cached.get(&key) {
                resolved.insert(address.clone(), Some(entry.result.clone()));
                continue;
            }
            match pending_index.get(&key) {
                Some(&pos) => pending[pos].1.push(address.clone()),
                None => {
                    pending_index.insert(key.clone(), pending.len());
                    pending.push((key, vec![address.clone()]));
                }
            }
        }

        log::debug!(
            "Batch geocode: {} cached, {} to look up",
            resolved.len(),
            pending.len()
        );

        for (group_no, group) in pending.chunks(self.batch_size).enumerate() {
            if group_no > 0 {
                pause_ms(self.pause_ms).await;
                if token.is_cancelled() {
                    log::debug!("Batch geocode abandoned before group {}", group_no + 1);
                    break;
                }
            }

            let lookups = group
                .iter()
                .map(|(_, originals)| self.lookup_remote(&originals[0]));
            let results = join_all(lookups).await;

            let mut fresh = Vec::new();
            for ((_, originals), result) in group.iter().zip(results) {
                if let Some(hit) = &result {
                    fresh.push((originals[0].clone(), hit.clone()));
                }
                for original in originals {
                    resolved.insert(original.clone(), result.clone());
                }
            }
            if !fresh.is_empty() {
                self.cache.set_many(fresh);
            }

            if token.is_cancelled() {
                log::debug!("Batch geocode abandoned after group {}", group_no + 1);
                break;
            }
        }

        resolved
    }

    async fn lookup_remote(&self, address: &str) -> Option<GeocodeResult> {
        match self.geocoder.lookup(address).await {
            Ok(result) => Some(result),
            Err(e) => {
                log::debug!("No coordinates for '{}': {}", address, e);
                None
            }
        }
    }
}
