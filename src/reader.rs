use std::{io::SeekFrom, path::Path};

use async_std::{
    fs,
    io::{prelude::*, BufReader},
    path::Path as AsyncPath,
};

use crate::{error::Error, Result};

/// Reads single lines of a source file starting at known byte offsets.
#[derive(Debug)]
pub struct LineReader {
    inner_file: BufReader<fs::File>,
}

impl LineReader {
    /// Open the source file at `path`
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<LineReader> {
        let file = fs::File::open(AsyncPath::new(path.as_ref())).await?;
        Ok(Self {
            inner_file: BufReader::new(file),
        })
    }

    /// Read from `offset` until the end of the line, omitting the line terminator. Returns the
    /// amount of bytes consumed including the terminator.
    ///
    /// Reading at or behind the end of the file returns `Error::MalformedIndex` since no correct
    /// index points there.
    pub async fn read_raw_at(&mut self, offset: u64, buf: &mut Vec<u8>) -> Result<usize> {
        self.inner_file.seek(SeekFrom::Start(offset)).await?;

        let start = buf.len();
        let n = self.inner_file.read_until(b'\n', buf).await?;
        if n == 0 {
            return Err(Error::MalformedIndex);
        }

        // Pop last \n and \r if existing
        if buf[start..].ends_with(b"\n") {
            buf.pop();
            if buf[start..].ends_with(b"\r") {
                buf.pop();
            }
        }

        Ok(n)
    }

    /// Read the line starting at `offset`
    pub async fn read_at(&mut self, offset: u64) -> Result<String> {
        let mut buf = Vec::new();
        self.read_raw_at(offset, &mut buf).await?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Open `path`, seek to `offset` and read the line found there.
pub async fn read_line<P: AsRef<Path>>(path: P, offset: u64) -> Result<String> {
    LineReader::open(path).await?.read_at(offset).await
}
