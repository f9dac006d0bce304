use tracing::info;

use crate::{
    cache::{Clock, SystemClock},
    config::IndexConfig,
    locator::LineLocator,
    reader,
    segment::{FileSegmentSource, SegmentSource},
    Result,
};

/// A line read from the source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub index: u64,
    /// Byte offset the line starts at
    pub offset: u64,
    pub text: String,
}

/// Retrieves single lines of a preprocessed file. Cheap to share between concurrent requests;
/// the only shared state is the segment cache.
pub struct LineRetriever<S = FileSegmentSource, C = SystemClock> {
    locator: LineLocator<S, C>,
}

impl LineRetriever {
    pub fn new(config: IndexConfig) -> Self {
        Self::from_locator(LineLocator::new(config))
    }
}

impl<S: SegmentSource, C: Clock> LineRetriever<S, C> {
    #[inline]
    pub fn from_locator(locator: LineLocator<S, C>) -> Self {
        Self { locator }
    }

    #[inline]
    pub fn locator(&self) -> &LineLocator<S, C> {
        &self.locator
    }

    /// Read the line with the index `line`.
    pub async fn retrieve(&self, line: i64) -> Result<Line> {
        let location = self.locator.resolve(line).await?;

        info!("Reading file line from byte {}", location.offset);
        let text = reader::read_line(&location.source, location.offset).await?;

        Ok(Line {
            index: location.line,
            offset: location.offset,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use rand::{distributions::Uniform, Rng};

    use super::*;
    use crate::{
        cache::tests::{CountingSource, ManualClock},
        error::ErrorKind,
        preprocess::Preprocessor,
    };

    const SAMPLE_LINES: usize = 182_705;

    fn sample_line(i: usize) -> String {
        format!("{}: This is a sample ASCII line for testing purposes.", i)
    }

    fn write_sample(path: &Path) {
        let mut text = String::with_capacity(SAMPLE_LINES * 60);
        for i in 0..SAMPLE_LINES {
            text.push_str(&sample_line(i));
            text.push('\n');
        }
        std::fs::write(path, text).unwrap();
    }

    async fn preprocess(dir: &Path, source: &Path, batch_size: usize) -> IndexConfig {
        let config = IndexConfig::new(dir.join("index")).with_batch_size(batch_size);
        Preprocessor::new(config.clone()).run(source).await.unwrap();
        config
    }

    #[async_std::test]
    async fn test_sample_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("test_ascii_10MB.txt");
        write_sample(&source);

        let config = preprocess(dir.path(), &source, 100_000).await;
        let retriever = LineRetriever::new(config);

        let first = retriever.retrieve(0).await.unwrap();
        assert_eq!(first.text, sample_line(0));
        assert_eq!(first.offset, 0);

        let line = retriever.retrieve(3456).await.unwrap();
        assert_eq!(
            line.text,
            "3456: This is a sample ASCII line for testing purposes."
        );
        assert_eq!(line.offset, 192_426);

        let last = retriever.retrieve(182_704).await.unwrap();
        assert_eq!(last.text, sample_line(182_704));

        let err = retriever.retrieve(182_705).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BoundsViolation);
        assert_eq!(
            err.to_string(),
            "Requested line index is outside file bounds"
        );

        let err = retriever.retrieve(-1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BoundsViolation);
    }

    #[async_std::test]
    async fn test_segment_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("test_ascii_10MB.txt");
        write_sample(&source);

        let config = preprocess(dir.path(), &source, 100_000).await;
        let retriever = LineRetriever::new(config);

        let before = retriever.locator().resolve(99_999).await.unwrap();
        let after = retriever.locator().resolve(100_000).await.unwrap();
        assert_eq!(before.segment, 1);
        assert_eq!(after.segment, 2);

        assert_eq!(
            retriever.retrieve(99_999).await.unwrap().text,
            sample_line(99_999)
        );
        assert_eq!(
            retriever.retrieve(100_000).await.unwrap().text,
            sample_line(100_000)
        );
    }

    #[async_std::test]
    async fn test_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let lines = [
            "俺はプログラミングできねええ",
            "",
            "音楽好き",
            "昨日のコーヒー飲んじゃった",
            "this is a text",
            "crlf terminated\r",
            "   ",
            "last line without new line",
        ];
        std::fs::write(&source, lines.join("\n")).unwrap();

        let config = preprocess(dir.path(), &source, 3).await;
        let retriever = LineRetriever::new(config);

        for (i, expected) in lines.iter().enumerate() {
            let line = retriever.retrieve(i as i64).await.unwrap();
            assert_eq!(line.text, expected.trim_end_matches('\r'));
        }

        let err = retriever.retrieve(lines.len() as i64).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BoundsViolation);
    }

    #[async_std::test]
    async fn test_random_lines() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let lines: Vec<String> = (0..5000)
            .map(|i| format!("{} {}", i, "x".repeat(i % 37)))
            .collect();
        std::fs::write(&source, lines.join("\n")).unwrap();

        let config = preprocess(dir.path(), &source, 128).await;
        let retriever = LineRetriever::new(config);

        let picks: Vec<usize> = rand::thread_rng()
            .sample_iter(Uniform::new(0, lines.len()))
            .take(2000)
            .collect();

        for pick in picks {
            let line = retriever.retrieve(pick as i64).await.unwrap();
            assert_eq!(line.text, lines[pick]);
        }
    }

    #[async_std::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.txt");
        std::fs::write(&source, "").unwrap();

        let config = preprocess(dir.path(), &source, 10).await;
        let retriever = LineRetriever::new(config);

        for line in &[0, 1, -1] {
            let err = retriever.retrieve(*line).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BoundsViolation);
        }
    }

    #[async_std::test]
    async fn test_stale_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, "a\nb\nc\n").unwrap();

        let config = preprocess(dir.path(), &source, 2).await;
        let retriever = LineRetriever::new(config);
        assert_eq!(retriever.retrieve(2).await.unwrap().text, "c");

        let file = std::fs::File::options().write(true).open(&source).unwrap();
        let mtime = file.metadata().unwrap().modified().unwrap();
        file.set_modified(mtime - Duration::from_secs(30)).unwrap();

        for line in &[0, 1, 2, 3] {
            let err = retriever.retrieve(*line).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::StaleIndex, "line {}", line);
        }
    }

    #[async_std::test]
    async fn test_rebuild_keeps_results() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let text: String = (0..40).map(|i| format!("entry {}\n", i)).collect();
        std::fs::write(&source, text).unwrap();

        let first = preprocess(dir.path(), &source, 7).await;
        let first_lines = collect_offsets(&first, 40).await;

        let second = preprocess(dir.path(), &source, 7).await;
        assert_eq!(first, second);
        assert_eq!(collect_offsets(&second, 40).await, first_lines);
    }

    async fn collect_offsets(config: &IndexConfig, lines: i64) -> Vec<u64> {
        let retriever = LineRetriever::new(config.clone());
        let mut offsets = Vec::new();
        for line in 0..lines {
            offsets.push(retriever.retrieve(line).await.unwrap().offset);
        }
        offsets
    }

    #[async_std::test]
    async fn test_segment_read_once_per_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let text: String = (0..30).map(|i| format!("row {}\n", i)).collect();
        std::fs::write(&source, text).unwrap();

        let config = preprocess(dir.path(), &source, 10).await;
        let segments = CountingSource::new(FileSegmentSource);
        let clock = ManualClock::new();
        let retriever = LineRetriever::from_locator(LineLocator::with_parts(
            config.clone(),
            segments.clone(),
            clock.clone(),
        ));

        assert_eq!(retriever.retrieve(21).await.unwrap().text, "row 21");
        assert_eq!(retriever.retrieve(27).await.unwrap().text, "row 27");
        assert_eq!(segments.loads(), 1);

        clock.advance(config.cache_ttl + Duration::from_secs(1));
        assert_eq!(retriever.retrieve(22).await.unwrap().text, "row 22");
        assert_eq!(segments.loads(), 2);
    }
}
