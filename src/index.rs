use std::path::Path;

use async_std::{
    fs,
    io::{prelude::*, BufReader, Read},
    path::Path as AsyncPath,
};
use tracing::debug;

use crate::Result;

/// Contains the in-memory line-index of a whole file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineOffsets {
    /// Maps line to seek position in order to seek efficiently. The index within the Vec represents
    /// the line-index in the file
    inner: Vec<u64>,
    /// Amount of bytes scanned
    len_bytes: u64,
}

impl LineOffsets {
    /// Scan the file at `path` and record the offset of each lines first byte.
    pub async fn scan<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(fs::File::open(AsyncPath::new(path)).await?);
        let offsets = Self::build(&mut reader).await?;
        debug!("File {} end of file reached", path.display());
        Ok(offsets)
    }

    /// Build the offsets for text within `reader`, starting at its current position. Offsets are
    /// counted in bytes so multi-byte encoded text doesn't shift them.
    pub async fn build<R: Read + Unpin>(reader: &mut BufReader<R>) -> Result<Self> {
        let mut line_index: Vec<u64> = Vec::new();
        let mut curr_offset: u64 = 0;

        let mut buff = Vec::with_capacity(1000);

        loop {
            let last_offset = curr_offset;

            buff.clear();
            let n = reader.read_until(b'\n', &mut buff).await?;

            // EOF
            if n == 0 {
                break;
            }

            line_index.push(last_offset);
            curr_offset += n as u64;
        }

        Ok(Self {
            inner: line_index,
            len_bytes: curr_offset,
        })
    }

    /// Get the offset of `line`
    #[inline]
    pub fn get(&self, line: usize) -> Option<u64> {
        self.inner.get(line).copied()
    }

    /// Returns the amount of lines found
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Amount of bytes consumed while scanning
    #[inline]
    pub fn len_bytes(&self) -> u64 {
        self.len_bytes
    }

    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.inner
    }
}
