//!A library to read single lines of very large files using a pregenerated, segmented index of
//!line offsets.
//!
//! The index gets built once by [`Preprocessor`] and stored as a set of segment files. A
//! [`LineRetriever`] then resolves a line to its byte offset using these segments and reads the
//! line from the source file with a single seek.
//!
//! ```no_run
//! use line_index::{IndexConfig, LineRetriever, Preprocessor};
//!
//! # async fn run() -> line_index::Result<()> {
//! let config = IndexConfig::default();
//! Preprocessor::new(config.clone()).run("some_large_file.txt").await?;
//!
//! let retriever = LineRetriever::new(config);
//! let line = retriever.retrieve(3456).await?;
//! println!("{}", line.text);
//! # Ok(())
//! # }
//! ```

/// Time based cache of loaded segments
pub mod cache;
pub mod config;
/// Maps retrieval outcomes to transport replies
pub mod dispatch;
pub mod error;
/// Scanning of line offsets
pub mod index;
/// Resolves line indices to byte offsets
pub mod locator;
pub mod preprocess;
/// Reads lines at known byte offsets
pub mod reader;
pub mod retriever;
/// The on-disk segment format
pub mod segment;
/// Writes segment files
pub mod writer;

pub use config::IndexConfig;
pub use dispatch::{Reply, Status};
pub use error::{Error, ErrorKind};
pub use preprocess::Preprocessor;
pub use retriever::{Line, LineRetriever};

pub type Result<T> = std::result::Result<T, error::Error>;
