use std::path::PathBuf;

use async_std::{fs, path::Path as AsyncPath, stream::StreamExt};
use itertools::Itertools;
use tracing::{debug, info};

use crate::{
    config::IndexConfig,
    error::Error,
    segment::{FileSegmentSink, Metadata, Segment, SegmentSink},
    Result,
};

/// Persists a files line offsets as a set of segment files
#[derive(Debug, Clone)]
pub struct IndexWriter<'a, K = FileSegmentSink> {
    config: &'a IndexConfig,
    sink: &'a K,
}

impl<'a> IndexWriter<'a> {
    #[inline]
    pub fn new(config: &'a IndexConfig) -> Self {
        Self::with_sink(config, &FileSegmentSink)
    }
}

impl<'a, K: SegmentSink> IndexWriter<'a, K> {
    /// Create a writer storing segments into `sink`
    #[inline]
    pub fn with_sink(config: &'a IndexConfig, sink: &'a K) -> Self {
        Self { config, sink }
    }

    /// Remove the index directory and everything in it, if it exists.
    pub async fn clear(&self) -> Result<()> {
        let dir = AsyncPath::new(self.config.directory());
        if dir.exists().await {
            fs::remove_dir_all(dir).await?;
            info!("Directory {} deleted", self.config.directory().display());
        }
        Ok(())
    }

    /// Split `offsets` into chunks of `batch_size` and write each chunk together with `metadata`
    /// into its own segment file. Returns the written paths in order.
    ///
    /// `metadata` has to describe exactly `offsets`, otherwise `Error::MalformedIndex` is returned
    /// and nothing gets written.
    pub async fn write(&self, metadata: &Metadata, offsets: &[u64]) -> Result<Vec<PathBuf>> {
        self.config.validate()?;
        if metadata.original_line_count != offsets.len() as u64 {
            return Err(Error::MalformedIndex);
        }
        fs::create_dir_all(AsyncPath::new(self.config.directory())).await?;

        let mut written = Vec::with_capacity(offsets.len() / self.config.batch_size + 1);

        for (pos, chunk) in offsets.chunks(self.config.batch_size).enumerate() {
            // Segment numbers start at 1
            let path = self.config.segment_path(pos as u64 + 1);

            let segment = Segment::new(metadata.clone(), chunk.to_vec());
            self.sink.store(&path, &segment).await?;
            debug!("Wrote {} offsets to {}", chunk.len(), path.display());

            written.push(path);
        }

        Ok(written)
    }

    /// List all segment files belonging to this configuration, ordered by segment number.
    pub async fn segments(&self) -> Result<Vec<PathBuf>> {
        let dir = AsyncPath::new(self.config.directory());
        if !dir.exists().await {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(dir).await?;
        let mut found = Vec::new();

        while let Some(entry) = entries.next().await {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(number) = name
                .to_str()
                .and_then(|name| self.config.parse_segment_number(name))
            {
                found.push((number, self.config.directory().join(&name)));
            }
        }

        Ok(found
            .into_iter()
            .sorted_by_key(|(number, _)| *number)
            .map(|(_, path)| path)
            .collect())
    }
}
