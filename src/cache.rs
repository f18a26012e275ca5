// SPDX-License-Identifier: MPL-2.0

//! Shared LRU cache of decoded wallpapers.
//!
//! Filled by the preloader so the rendering layer can show the next wallpaper
//! without waiting on the network. Entries are keyed by the URL exactly as it
//! appears in the wallpaper list, and recency is tracked in a queue that runs
//! from least to most recently used.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use backdrop_config::Config;
use image::DynamicImage;

const MIB: usize = 1024 * 1024;

/// Limits for the image cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of decoded images kept at once
    pub max_entries: usize,
    /// Maximum total pixel buffer size in bytes (0 = unlimited)
    pub max_size_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 16,
            max_size_bytes: 256 * MIB,
        }
    }
}

impl From<&Config> for CacheConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_entries: config.cache_max_entries.max(1),
            max_size_bytes: config.cache_max_size_mb.saturating_mul(MIB),
        }
    }
}

/// Counters exposed for logging and debugging
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an image
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Images dropped to stay within the limits
    pub evictions: u64,
    /// Images currently held
    pub entries: usize,
    /// Pixel bytes currently held
    pub size_bytes: usize,
}

struct Slot {
    image: Arc<DynamicImage>,
    size_bytes: usize,
}

#[derive(Default)]
struct Lru {
    slots: HashMap<String, Slot>,
    /// Least recently used first.
    recency: VecDeque<String>,
    size_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Lru {
    fn touch(&mut self, url: &str) {
        if let Some(pos) = self.recency.iter().position(|key| key == url) {
            if let Some(key) = self.recency.remove(pos) {
                self.recency.push_back(key);
            }
        }
    }

    fn take(&mut self, url: &str) -> Option<Slot> {
        let slot = self.slots.remove(url)?;
        self.recency.retain(|key| key != url);
        self.size_bytes -= slot.size_bytes;
        Some(slot)
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(url) = self.recency.pop_front() else {
            return false;
        };
        if let Some(slot) = self.slots.remove(&url) {
            self.size_bytes -= slot.size_bytes;
            self.evictions += 1;
            tracing::trace!(url = %url, "Evicted cached image");
        }
        true
    }

    fn over_limits(&self, limits: &CacheConfig, incoming: usize) -> bool {
        self.slots.len() >= limits.max_entries
            || (limits.max_size_bytes > 0 && self.size_bytes + incoming > limits.max_size_bytes)
    }
}

/// Thread-safe LRU image cache keyed by URL
pub struct ImageCache {
    lru: Mutex<Lru>,
    limits: CacheConfig,
}

impl ImageCache {
    /// Create a cache with the default limits
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with custom limits
    pub fn with_config(limits: CacheConfig) -> Self {
        tracing::debug!(
            max_entries = limits.max_entries,
            max_size_mb = limits.max_size_bytes / MIB,
            "Image cache initialized"
        );

        Self {
            lru: Mutex::new(Lru::default()),
            limits,
        }
    }

    /// Look up a decoded image and mark it as most recently used
    pub fn get(&self, url: &str) -> Option<Arc<DynamicImage>> {
        let mut lru = self.lru.lock().unwrap();

        let found = lru.slots.get(url).map(|slot| Arc::clone(&slot.image));
        if found.is_some() {
            lru.hits += 1;
            lru.touch(url);
        } else {
            lru.misses += 1;
        }
        found
    }

    /// Store a decoded image, evicting the least recently used entries until
    /// it fits. An image larger than the size limit is still kept on its own.
    pub fn insert(&self, url: impl Into<String>, image: DynamicImage) -> Arc<DynamicImage> {
        let url = url.into();
        let size_bytes = image.as_bytes().len();
        let image = Arc::new(image);

        let mut lru = self.lru.lock().unwrap();
        // a replacement frees its old slot before any eviction is considered
        lru.take(&url);
        while lru.over_limits(&self.limits, size_bytes) && lru.evict_oldest() {}

        lru.size_bytes += size_bytes;
        lru.recency.push_back(url.clone());
        lru.slots.insert(
            url.clone(),
            Slot {
                image: Arc::clone(&image),
                size_bytes,
            },
        );

        tracing::trace!(url = %url, size_kb = size_bytes / 1024, "Image cached");
        image
    }

    /// Membership test that does not count as an access
    pub fn contains(&self, url: &str) -> bool {
        self.lru.lock().unwrap().slots.contains_key(url)
    }

    /// Number of cached images
    pub fn len(&self) -> usize {
        self.lru.lock().unwrap().slots.len()
    }

    /// Whether no image is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the hit, miss and eviction counters
    pub fn stats(&self) -> CacheStats {
        let lru = self.lru.lock().unwrap();
        CacheStats {
            hits: lru.hits,
            misses: lru.misses,
            evictions: lru.evictions,
            entries: lru.slots.len(),
            size_bytes: lru.size_bytes,
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("limits", &self.limits)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn square(side: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(side, side, Rgba([0u8, 64, 128, 255])))
    }

    fn limited(max_entries: usize, max_size_bytes: usize) -> ImageCache {
        ImageCache::with_config(CacheConfig {
            max_entries,
            max_size_bytes,
        })
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = ImageCache::new();
        cache.insert("https://img/a.jpg", square(100));

        assert_eq!(cache.get("https://img/a.jpg").unwrap().width(), 100);
        assert!(cache.get("https://img/missing.jpg").is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.size_bytes, 100 * 100 * 4);
    }

    #[test]
    fn test_lookup_refreshes_recency() {
        let cache = limited(2, 0);
        cache.insert("a", square(10));
        cache.insert("b", square(10));
        // "b" is now the oldest
        assert!(cache.get("a").is_some());
        cache.insert("c", square(10));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_contains_does_not_refresh_recency() {
        let cache = limited(2, 0);
        cache.insert("a", square(10));
        cache.insert("b", square(10));
        assert!(cache.contains("a"));
        cache.insert("c", square(10));

        assert!(!cache.contains("a"));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_size_limit_evicts_oldest() {
        let cache = limited(10, 10 * 10 * 4 * 2);
        for url in ["a", "b", "c"] {
            cache.insert(url, square(10));
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert_eq!(cache.stats().size_bytes, 10 * 10 * 4 * 2);
    }

    #[test]
    fn test_oversized_image_is_kept_alone() {
        let cache = limited(10, 10 * 10 * 4);
        cache.insert("small", square(10));
        cache.insert("huge", square(20));

        assert_eq!(cache.len(), 1);
        assert!(cache.contains("huge"));
    }

    #[test]
    fn test_replacing_an_entry_does_not_evict_others() {
        let cache = limited(2, 0);
        cache.insert("a", square(10));
        cache.insert("b", square(10));
        cache.insert("a", square(20));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.stats().size_bytes, 10 * 10 * 4 + 20 * 20 * 4);
        assert_eq!(cache.get("a").unwrap().width(), 20);
    }

    #[test]
    fn test_limits_from_config() {
        let config = Config::default()
            .with_cache_max_entries(0)
            .with_cache_max_size_mb(8);
        let limits = CacheConfig::from(&config);
        assert_eq!(limits.max_entries, 1);
        assert_eq!(limits.max_size_bytes, 8 * MIB);
    }

    #[test]
    fn test_huge_size_limit_saturates() {
        let config = Config::default().with_cache_max_size_mb(usize::MAX);
        assert_eq!(CacheConfig::from(&config).max_size_bytes, usize::MAX);
    }
}
