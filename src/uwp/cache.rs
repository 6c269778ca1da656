//! Cached UWP package list
//!
//! Package enumeration is slow enough (hundreds of milliseconds on systems
//! with many Store apps) that it cannot run on every property inspector
//! appearance. The cache builds the list once on first access and serves it
//! until a forced reload.

use parking_lot::Mutex;
use tracing::{error, info};

use super::enumerator::{UwpPackage, enumerate_packages};

/// Lazily-built, reload-on-demand list of installed UWP packages.
pub struct UwpAppCache {
    packages: Mutex<Option<Vec<UwpPackage>>>,
}

impl UwpAppCache {
    /// Create an empty cache; the first [`Self::apps`] call enumerates.
    pub fn new() -> Self {
        Self {
            packages: Mutex::new(None),
        }
    }

    /// Returns the cached package list, enumerating on first access.
    ///
    /// A failed enumeration is logged and yields an empty list without
    /// populating the cache, so the next call retries.
    pub fn apps(&self) -> Vec<UwpPackage> {
        let mut guard = self.packages.lock();
        if let Some(packages) = guard.as_ref() {
            return packages.clone();
        }
        match enumerate_packages() {
            Ok(packages) => {
                info!("Enumerated {} UWP packages", packages.len());
                *guard = Some(packages.clone());
                packages
            }
            Err(e) => {
                error!("UWP package enumeration failed: {e}");
                Vec::new()
            }
        }
    }

    /// Finds a cached package by its display name, case-insensitively.
    pub fn find_by_display_name(&self, name: &str) -> Option<UwpPackage> {
        let needle = name.to_lowercase();
        self.apps()
            .into_iter()
            .find(|pkg| pkg.display_name.to_lowercase() == needle)
    }

    /// Drops the cached list and enumerates again.
    ///
    /// Backs the property inspector's "refresh apps" button.
    pub fn force_reload(&self) -> Vec<UwpPackage> {
        {
            let mut guard = self.packages.lock();
            *guard = None;
        }
        self.apps()
    }
}

impl Default for UwpAppCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UwpAppCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.packages.lock().as_ref().map(Vec::len);
        f.debug_struct("UwpAppCache").field("cached", &cached).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(windows))]
    fn cache_serves_empty_list_off_windows() {
        let cache = UwpAppCache::new();
        assert!(cache.apps().is_empty());
        assert!(cache.find_by_display_name("Calculator").is_none());
    }

    #[test]
    #[cfg(windows)]
    fn repeated_access_serves_the_same_list() {
        let cache = UwpAppCache::new();
        let first = cache.apps();
        let second = cache.apps();
        assert_eq!(first, second);
    }

    #[test]
    #[cfg(windows)]
    fn force_reload_rebuilds_the_list() {
        let cache = UwpAppCache::new();
        let before = cache.apps();
        let after = cache.force_reload();
        // Same machine, so the set of installed packages should be stable.
        assert_eq!(before.len(), after.len());
    }
}
