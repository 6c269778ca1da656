//! Process-count cache
//!
//! Several keys can ask "how many instances of X are running?" on every
//! tick; enumerating processes each time would be wasteful. The cache
//! holds one name → count snapshot and rebuilds it wholesale once it is
//! older than the TTL (2.5 seconds in production). Queries inside the TTL
//! serve the stale snapshot. A single mutex covers lookup and rebuild, so
//! overlapping queries can never trigger concurrent enumerations.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::error;

use crate::process::ProcessLister;

/// Snapshot age at which a query triggers a rebuild
pub const CACHE_TTL: Duration = Duration::from_millis(2500);

/// TTL-bounded snapshot of process name → instance count.
///
/// The enumeration source is constructor-injected so consumers share one
/// cache handle and tests substitute a counting fake.
pub struct ProcessCountCache {
    lister: Box<dyn ProcessLister>,
    ttl: Duration,
    state: Mutex<CacheState>,
}

struct CacheState {
    counts: HashMap<String, usize>,
    last_refresh: Option<Instant>,
}

impl ProcessCountCache {
    /// Create a cache with the production TTL of 2500ms.
    pub fn new(lister: Box<dyn ProcessLister>) -> Self {
        Self::with_ttl(lister, CACHE_TTL)
    }

    /// Create a cache with an explicit TTL (tests use a tiny one).
    pub fn with_ttl(lister: Box<dyn ProcessLister>, ttl: Duration) -> Self {
        Self {
            lister,
            ttl,
            state: Mutex::new(CacheState {
                counts: HashMap::new(),
                last_refresh: None,
            }),
        }
    }

    /// Number of running instances of the named process.
    ///
    /// Case-insensitive; unknown names count as zero. Rebuilds the whole
    /// snapshot first when it is older than the TTL. A failed enumeration
    /// logs and serves whatever snapshot exists.
    pub fn count(&self, process_name: &str) -> usize {
        let mut state = self.state.lock();

        let stale = state
            .last_refresh
            .is_none_or(|last| last.elapsed() >= self.ttl);
        if stale {
            match self.lister.process_counts() {
                Ok(counts) => {
                    state.counts = counts;
                    state.last_refresh = Some(Instant::now());
                }
                Err(e) => error!("Process snapshot rebuild failed: {e}"),
            }
        }

        let name = process_name.to_lowercase();
        state.counts.get(&name).copied().unwrap_or(0)
    }
}

impl std::fmt::Debug for ProcessCountCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessCountCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake lister that counts enumerations and serves a fixed snapshot.
    struct FakeLister {
        enumerations: Arc<AtomicUsize>,
        counts: HashMap<String, usize>,
    }

    impl ProcessLister for FakeLister {
        fn process_counts(&self) -> Result<HashMap<String, usize>> {
            self.enumerations.fetch_add(1, Ordering::SeqCst);
            Ok(self.counts.clone())
        }
    }

    fn fake(counts: &[(&str, usize)]) -> (Box<FakeLister>, Arc<AtomicUsize>) {
        let enumerations = Arc::new(AtomicUsize::new(0));
        let lister = Box::new(FakeLister {
            enumerations: Arc::clone(&enumerations),
            counts: counts
                .iter()
                .map(|(n, c)| ((*n).to_string(), *c))
                .collect(),
        });
        (lister, enumerations)
    }

    #[test]
    fn test_query_within_ttl_serves_stale_snapshot() {
        let (lister, enumerations) = fake(&[("notepad", 2)]);
        let cache = ProcessCountCache::with_ttl(lister, Duration::from_secs(60));

        assert_eq!(cache.count("notepad"), 2);
        assert_eq!(cache.count("notepad"), 2);
        assert_eq!(cache.count("chrome"), 0);

        // First query populated the snapshot; the rest were served stale
        assert_eq!(enumerations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_after_ttl_rebuilds() {
        let (lister, enumerations) = fake(&[("notepad", 1)]);
        let cache = ProcessCountCache::with_ttl(lister, Duration::from_millis(10));

        assert_eq!(cache.count("notepad"), 1);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.count("notepad"), 1);

        assert_eq!(enumerations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let (lister, _) = fake(&[("notepad", 3)]);
        let cache = ProcessCountCache::with_ttl(lister, Duration::from_secs(60));

        assert_eq!(cache.count("Notepad"), 3);
        assert_eq!(cache.count("NOTEPAD"), 3);
    }

    #[test]
    fn test_failed_enumeration_serves_previous_snapshot() {
        struct FlakyLister {
            calls: AtomicUsize,
        }
        impl ProcessLister for FlakyLister {
            fn process_counts(&self) -> Result<HashMap<String, usize>> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(HashMap::from([("game".to_string(), 1)]))
                } else {
                    Err(crate::LauncherError::ProcessControl(
                        crate::error::StringError::new("enumeration failed"),
                    ))
                }
            }
        }

        let cache = ProcessCountCache::with_ttl(
            Box::new(FlakyLister {
                calls: AtomicUsize::new(0),
            }),
            Duration::from_millis(0),
        );

        assert_eq!(cache.count("game"), 1);
        // TTL of zero forces a rebuild attempt, which fails; stale data survives
        assert_eq!(cache.count("game"), 1);
    }

    #[test]
    fn test_concurrent_queries_single_rebuild() {
        let (lister, enumerations) = fake(&[("game", 1)]);
        let cache = Arc::new(ProcessCountCache::with_ttl(lister, Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.count("game"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }

        assert_eq!(enumerations.load(Ordering::SeqCst), 1);
    }
}
