use std::path::Path;

use tracing::{error, info, warn};

use crate::{
    config::IndexConfig,
    error::Error,
    index::LineOffsets,
    segment::{FileSegmentSink, Metadata, SegmentSink},
    writer::IndexWriter,
    Result,
};

/// Builds the segmented line-index of a source file
#[derive(Debug, Clone)]
pub struct Preprocessor<K = FileSegmentSink> {
    config: IndexConfig,
    sink: K,
}

impl Preprocessor {
    #[inline]
    pub fn new(config: IndexConfig) -> Self {
        Self::with_sink(config, FileSegmentSink)
    }
}

impl<K: SegmentSink> Preprocessor<K> {
    /// Create a preprocessor storing the segments into `sink`
    #[inline]
    pub fn with_sink(config: IndexConfig, sink: K) -> Self {
        Self { config, sink }
    }

    /// Build the index for `path`, replacing any existing index. Either the whole index gets
    /// written or, on failure, the index directory gets removed and the error is returned.
    pub async fn run<P: AsRef<Path>>(&self, path: P) -> Result<Metadata> {
        let path = path.as_ref();
        let writer = IndexWriter::with_sink(&self.config, &self.sink);

        let res = match writer.clear().await {
            Ok(()) => self.build(&writer, path).await,
            Err(err) => Err(err),
        };

        match res {
            Ok(metadata) => {
                info!(
                    "File processed: {} with {} lines",
                    path.display(),
                    metadata.original_line_count
                );
                Ok(metadata)
            }
            Err(err) => {
                error!("Preprocessing {} failed: {}", path.display(), err);
                if let Err(clear_err) = writer.clear().await {
                    warn!(
                        "Failed to remove index directory {}: {}",
                        self.config.directory().display(),
                        clear_err
                    );
                }
                Err(Error::Preprocess {
                    path: path.to_path_buf(),
                    source: Box::new(err),
                })
            }
        }
    }

    async fn build(&self, writer: &IndexWriter<'_, K>, path: &Path) -> Result<Metadata> {
        self.config.validate()?;

        // The mtime is taken before scanning so a modification during the scan gets noticed
        let mut metadata = Metadata::for_file(path, 0).await?;
        let offsets = LineOffsets::scan(path).await?;
        metadata.original_line_count = offsets.len() as u64;

        if metadata.is_stale().await? {
            return Err(Error::StaleIndex {
                path: path.to_path_buf(),
            });
        }

        writer.write(&metadata, offsets.as_slice()).await?;

        Ok(metadata)
    }
}
