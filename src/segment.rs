use std::{
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
    time::SystemTime,
};

use async_std::{fs, path::Path as AsyncPath};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::Error, Result};

/// Version of the segment encoding. Segments with a different version are rejected.
pub const SEGMENT_VERSION: u32 = 1;

/// Describes the file an index was built for. Every segment carries the same copy, which allows
/// checking a single segment against the source file without reading the others.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub original_file_path: PathBuf,
    /// Modification time of the source file at the time the index was built
    pub original_mtime: SystemTime,
    /// Count of lines in the whole file, across all segments
    pub original_line_count: u64,
}

impl Metadata {
    /// Read the metadata of the source file at `path`
    pub async fn for_file<P: AsRef<Path>>(path: P, line_count: u64) -> Result<Self> {
        let path = path.as_ref();
        let mtime = modified(path).await?;
        Ok(Self {
            original_file_path: path.to_path_buf(),
            original_mtime: mtime,
            original_line_count: line_count,
        })
    }

    /// Returns `true` if the source file was modified after the index got built. Any difference
    /// counts, even a touch which didn't change the content.
    pub async fn is_stale(&self) -> Result<bool> {
        Ok(modified(&self.original_file_path).await? != self.original_mtime)
    }

    /// Returns `true` if `line` is a valid line of the source file
    #[inline]
    pub fn contains(&self, line: u64) -> bool {
        line < self.original_line_count
    }
}

/// A chunk of the files line-index, stored in its own file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    version: u32,
    pub metadata: Metadata,
    /// Offsets of a contiguous range of lines
    pub offsets: Vec<u64>,
}

impl Segment {
    pub fn new(metadata: Metadata, offsets: Vec<u64>) -> Self {
        Self {
            version: SEGMENT_VERSION,
            metadata,
            offsets,
        }
    }

    /// Encodes a segment into bytes, which can be used to store it into a file.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_stdvec(self)?)
    }

    /// Decodes an encoded segment
    pub fn decode(data: &[u8]) -> Result<Self> {
        let segment: Segment = postcard::from_bytes(data)?;
        if segment.version != SEGMENT_VERSION {
            return Err(Error::MalformedIndex);
        }
        Ok(segment)
    }

    /// Get the offset at the position `pos` within this segment
    #[inline]
    pub fn get(&self, pos: usize) -> Result<u64> {
        self.offsets.get(pos).copied().ok_or(Error::MalformedIndex)
    }

    /// Write the encoded segment to `path`
    pub async fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(AsyncPath::new(path.as_ref()), self.encode()?).await?;
        Ok(())
    }

    /// Read a segment file. A missing file means the requested line lies past the indexed range.
    pub async fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = match fs::read(AsyncPath::new(path.as_ref())).await {
            Ok(data) => data,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Err(Error::OutOfBounds),
            Err(err) => return Err(err.into()),
        };
        Self::decode(&data)
    }
}

/// Somewhere segments can be loaded from
#[async_trait]
pub trait SegmentSource: Send + Sync {
    /// Load the segment stored at `path`. Should return `Error::OutOfBounds` if there is no such
    /// segment.
    async fn load(&self, path: &Path) -> Result<Segment>;
}

/// Loads segments from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSegmentSource;

#[async_trait]
impl SegmentSource for FileSegmentSource {
    #[inline]
    async fn load(&self, path: &Path) -> Result<Segment> {
        Segment::read_from(path).await
    }
}

/// Somewhere segments can be written to
#[async_trait]
pub trait SegmentSink: Send + Sync {
    /// Store `segment` at `path`, replacing whatever was stored there before.
    async fn store(&self, path: &Path, segment: &Segment) -> Result<()>;
}

/// Writes segments to the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSegmentSink;

#[async_trait]
impl SegmentSink for FileSegmentSink {
    #[inline]
    async fn store(&self, path: &Path, segment: &Segment) -> Result<()> {
        segment.write_to(path).await
    }
}

async fn modified(path: &Path) -> Result<SystemTime> {
    Ok(fs::metadata(AsyncPath::new(path)).await?.modified()?)
}
