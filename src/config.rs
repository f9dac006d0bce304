use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{error::Error, Result};

/// Directory holding the segment files
pub const DEFAULT_DIRECTORY: &str = "files_in_bytesize";
/// Filename prefix of every segment file
pub const DEFAULT_FILE_PREFIX: &str = "file_in_bytesize";
/// Amount of line offsets stored in a single segment
pub const DEFAULT_BATCH_SIZE: usize = 100_000;
/// How long a loaded segment is trusted before it gets read from disk again
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// File extension of segment files
pub const SEGMENT_EXTENSION: &str = "idx";

/// Settings shared by the preprocessing and the retrieval side. Both have to use the same values
/// for `directory`, `file_prefix` and `batch_size` or lookups will resolve the wrong segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub batch_size: usize,
    pub cache_ttl: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl IndexConfig {
    /// Create a default configuration storing its segments in `directory`
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn with_file_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Returns an error if the configuration can't be used to build or read an index
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be at least 1".into()));
        }

        if self.file_prefix.is_empty() {
            return Err(Error::InvalidConfig("file prefix must not be empty".into()));
        }

        Ok(())
    }

    #[inline]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 1-based number of the segment holding `line`
    #[inline]
    pub fn segment_number(&self, line: u64) -> u64 {
        line / self.batch_size as u64 + 1
    }

    /// Position of `line` within its segment
    #[inline]
    pub fn relative_index(&self, line: u64) -> usize {
        (line % self.batch_size as u64) as usize
    }

    /// Path of the segment with the given 1-based number, eg. `files_in_bytesize/file_in_bytesize_01.idx`
    pub fn segment_path(&self, number: u64) -> PathBuf {
        self.directory.join(format!(
            "{}_{:02}.{}",
            self.file_prefix, number, SEGMENT_EXTENSION
        ))
    }

    /// Path of the segment holding `line`
    #[inline]
    pub fn segment_path_for_line(&self, line: u64) -> PathBuf {
        self.segment_path(self.segment_number(line))
    }

    /// Parses the segment number out of a file name, if it belongs to this configuration
    pub fn parse_segment_number(&self, file_name: &str) -> Option<u64> {
        file_name
            .strip_prefix(self.file_prefix.as_str())?
            .strip_prefix('_')?
            .strip_suffix(SEGMENT_EXTENSION)?
            .strip_suffix('.')?
            .parse()
            .ok()
    }
}
