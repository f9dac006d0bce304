use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use async_std::sync::Mutex;
use tracing::debug;

use crate::{
    segment::{FileSegmentSource, Segment, SegmentSource},
    Result,
};

/// Source of the current time for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The monotonic system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct CachedSegment {
    segment: Arc<Segment>,
    expires_at: Instant,
}

type Slot = Arc<Mutex<Option<CachedSegment>>>;

/// Keeps loaded segments in memory for `ttl`, keyed by their path. Each key has its own lock so
/// loading one segment doesn't block lookups of others.
pub struct SegmentCache<S = FileSegmentSource, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl SegmentCache {
    /// Create a cache loading segments from disk
    pub fn new(ttl: Duration) -> Self {
        Self::with_parts(FileSegmentSource, SystemClock, ttl)
    }
}

impl<S: SegmentSource, C: Clock> SegmentCache<S, C> {
    pub fn with_parts(source: S, clock: C, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the segment stored at `path`, loading it if it isn't cached or expired.
    pub async fn get_or_load(&self, path: &Path) -> Result<Arc<Segment>> {
        let slot = self.slot(path).await;
        let mut entry = slot.lock().await;

        let now = self.clock.now();
        if let Some(cached) = entry.as_ref() {
            if now < cached.expires_at {
                return Ok(Arc::clone(&cached.segment));
            }
            debug!("Cached segment {} expired", path.display());
        }

        *entry = None;

        let segment = match self.source.load(path).await {
            Ok(segment) => Arc::new(segment),
            Err(err) => {
                // Don't keep slots for segments that couldn't be loaded
                drop(entry);
                self.forget(path, &slot).await;
                return Err(err);
            }
        };
        *entry = Some(CachedSegment {
            segment: Arc::clone(&segment),
            expires_at: now + self.ttl,
        });
        debug!("Loaded segment {} into cache", path.display());

        Ok(segment)
    }

    /// Drop all cached segments
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    /// Amount of paths the cache holds a slot for
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn slot(&self, path: &Path) -> Slot {
        let mut slots = self.slots.lock().await;
        let slot = slots
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(None)));
        Arc::clone(slot)
    }

    async fn forget(&self, path: &Path, slot: &Slot) {
        let mut slots = self.slots.lock().await;
        if slots.get(path).map_or(false, |current| Arc::ptr_eq(current, slot)) {
            slots.remove(path);
        }
    }
}
