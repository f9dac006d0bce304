use std::{path::PathBuf, string::FromUtf8Error};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A segment file could not be encoded or decoded
    #[error("segment serialization error: {0}")]
    Serialization(#[from] postcard::Error),

    #[error("line is not valid utf-8")]
    Utf8(#[from] FromUtf8Error),

    /// On request for a line outside of the indexed range
    #[error("Requested line index is outside file bounds")]
    OutOfBounds,

    /// The source file was modified after the index got built
    #[error("File {} was modified since it was preprocessed", .path.display())]
    StaleIndex { path: PathBuf },

    /// Index is not built properly
    #[error("Index is malformed")]
    MalformedIndex,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Building the index of `path` failed. No index is left behind.
    #[error("preprocessing {} failed: {source}", .path.display())]
    Preprocess {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of an [`Error`], used to pick a response for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Line index is negative, past the last line or its segment doesn't exist
    BoundsViolation,
    /// Source file changed, the index has to be rebuilt
    StaleIndex,
    /// Failure while building the index
    Preprocessing,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OutOfBounds => ErrorKind::BoundsViolation,
            Error::StaleIndex { .. } => ErrorKind::StaleIndex,
            Error::Preprocess { .. } => ErrorKind::Preprocessing,
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(Error::OutOfBounds.kind(), ErrorKind::BoundsViolation);
        assert_eq!(
            Error::StaleIndex {
                path: "a.txt".into()
            }
            .kind(),
            ErrorKind::StaleIndex
        );
        assert_eq!(Error::MalformedIndex.kind(), ErrorKind::Internal);

        let preprocess = Error::Preprocess {
            path: "a.txt".into(),
            source: Box::new(Error::MalformedIndex),
        };
        assert_eq!(preprocess.kind(), ErrorKind::Preprocessing);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::OutOfBounds.to_string(),
            "Requested line index is outside file bounds"
        );
    }
}
