//! Application-level configuration constants and the runtime tunables.

use serde::Deserialize;

// Geocoding cache
pub const GEOCODING_CACHE_KEY: &str = "geocoding_cache";
pub const DEFAULT_CACHE_EXPIRY_HOURS: u32 = 48;
pub const MIN_CACHE_EXPIRY_HOURS: u32 = 1;
pub const MAX_CACHE_EXPIRY_HOURS: u32 = 168;

// Batch geocoding
pub const DEFAULT_GEOCODE_BATCH_SIZE: usize = 20;
pub const MAX_GEOCODE_BATCH_SIZE: usize = 50;
pub const DEFAULT_GEOCODE_PAUSE_MS: u32 = 25;
pub const MAX_GEOCODE_PAUSE_MS: u32 = 1_000;

// Backend
pub const DEFAULT_API_BASE: &str = "/api";

// Form units: deposits are entered as 억 + 만원, everything is compared in 만원
pub const MANWON_PER_EOK: u64 = 10_000;

// UI
pub const MAP_ELEMENT_ID: &str = "map";
pub const CONFIG_GLOBAL: &str = "LISTING_MAP_CONFIG";
pub const EMPTY_RESULTS_MESSAGE: &str = "조건에 맞는 매물이 없습니다.";
pub const MISSING_VALUE_LABEL: &str = "정보없음";

/// Tunables for one viewer instance.
///
/// Every field falls back to its default when absent, so a page can override
/// just the values it cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub cache_expiry_hours: u32,
    pub geocode_batch_size: usize,
    pub geocode_pause_ms: u32,
    pub cache_key: String,
    pub api_base: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cache_expiry_hours: DEFAULT_CACHE_EXPIRY_HOURS,
            geocode_batch_size: DEFAULT_GEOCODE_BATCH_SIZE,
            geocode_pause_ms: DEFAULT_GEOCODE_PAUSE_MS,
            cache_key: GEOCODING_CACHE_KEY.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl ViewerConfig {
    /// Clamp every tunable into its supported range.
    pub fn validated(mut self) -> Self {
        self.cache_expiry_hours = self
            .cache_expiry_hours
            .clamp(MIN_CACHE_EXPIRY_HOURS, MAX_CACHE_EXPIRY_HOURS);
        self.geocode_batch_size = self.geocode_batch_size.clamp(1, MAX_GEOCODE_BATCH_SIZE);
        self.geocode_pause_ms = self.geocode_pause_ms.min(MAX_GEOCODE_PAUSE_MS);
        if self.cache_key.trim().is_empty() {
            self.cache_key = GEOCODING_CACHE_KEY.to_string();
        }
        let base = self.api_base.trim_end_matches('/');
        self.api_base = if base.is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            base.to_string()
        };
        self
    }

    pub fn cache_expiry_ms(&self) -> u64 {
        u64::from(self.cache_expiry_hours) * 60 * 60 * 1000
    }

    /// Parse a JSON override, falling back to defaults on malformed input.
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<ViewerConfig>(text) {
            Ok(cfg) => cfg.validated(),
            Err(e) => {
                log::warn!("Ignoring malformed viewer config: {}", e);
                Self::default()
            }
        }
    }
}
