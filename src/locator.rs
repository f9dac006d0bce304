use std::{convert::TryFrom, path::PathBuf, sync::Arc};

use crate::{
    cache::{Clock, SegmentCache, SystemClock},
    config::IndexConfig,
    error::Error,
    segment::{FileSegmentSource, Segment, SegmentSource},
    Result,
};

/// Where a line can be found in the source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Global index of the line
    pub line: u64,
    /// Byte offset of the lines first byte
    pub offset: u64,
    /// 1-based number of the segment holding the offset
    pub segment: u64,
    /// The source file the offset belongs to
    pub source: PathBuf,
}

/// Resolves line indices to byte offsets using the segment files written by
/// [`Preprocessor`](crate::preprocess::Preprocessor).
pub struct LineLocator<S = FileSegmentSource, C = SystemClock> {
    config: IndexConfig,
    cache: SegmentCache<S, C>,
}

impl LineLocator {
    /// Create a locator reading segments from disk
    pub fn new(config: IndexConfig) -> Self {
        let cache = SegmentCache::new(config.cache_ttl);
        Self { config, cache }
    }
}

impl<S: SegmentSource, C: Clock> LineLocator<S, C> {
    /// Create a locator with a custom segment source and clock
    pub fn with_parts(config: IndexConfig, source: S, clock: C) -> Self {
        let cache = SegmentCache::with_parts(source, clock, config.cache_ttl);
        Self { config, cache }
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    #[inline]
    pub fn cache(&self) -> &SegmentCache<S, C> {
        &self.cache
    }

    /// Resolve `line` to the byte offset it starts at.
    ///
    /// The source file is checked for modifications before the bounds are checked, since the
    /// recorded line count can't be trusted for a modified file.
    pub async fn resolve(&self, line: i64) -> Result<Location> {
        self.config.validate()?;

        // Negative lines don't have a segment
        let line = u64::try_from(line).map_err(|_| Error::OutOfBounds)?;

        let number = self.config.segment_number(line);
        let segment = self.segment(number).await?;
        let metadata = &segment.metadata;

        if metadata.is_stale().await? {
            return Err(Error::StaleIndex {
                path: metadata.original_file_path.clone(),
            });
        }

        if !metadata.contains(line) {
            return Err(Error::OutOfBounds);
        }

        let offset = segment.get(self.config.relative_index(line))?;

        Ok(Location {
            line,
            offset,
            segment: number,
            source: metadata.original_file_path.clone(),
        })
    }

    #[inline]
    async fn segment(&self, number: u64) -> Result<Arc<Segment>> {
        let path = self.config.segment_path(number);
        self.cache.get_or_load(&path).await
    }
}
