use std::{fmt::Display, num::IntErrorKind};

use tracing::info;

use crate::{
    error::{Error, ErrorKind},
    retriever::Line,
    Result,
};

/// Transport status of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// The request couldn't be parsed
    BadRequest,
    /// The requested line is past the end of the file
    ContentTooLarge,
    InternalServerError,
}

impl Status {
    /// The HTTP status code
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::ContentTooLarge => 413,
            Status::InternalServerError => 500,
        }
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Status::Ok
    }
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::BoundsViolation => Status::ContentTooLarge,
            ErrorKind::StaleIndex | ErrorKind::Preprocessing | ErrorKind::Internal => {
                Status::InternalServerError
            }
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A retrieval outcome translated for the transport layer. The body holds the line on success
/// and the error message otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub body: String,
}

impl Reply {
    pub fn from_outcome(outcome: Result<Line>) -> Self {
        match outcome {
            Ok(line) => Self {
                status: Status::Ok,
                body: line.text,
            },
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        Self::failure(Status::from(err.kind()), err.to_string())
    }

    /// Reply to a request which isn't a valid line index
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::failure(Status::BadRequest, message.into())
    }

    /// Parse the line index of a request. An integer too large for an `i64` is past the end of
    /// any file and gets the same reply as other out of range lines.
    pub fn parse_request(request: &str) -> std::result::Result<i64, Reply> {
        request.parse::<i64>().map_err(|err| match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                Self::from_error(&Error::OutOfBounds)
            }
            _ => Self::bad_request(format!("Invalid line index: {}", request)),
        })
    }

    fn failure(status: Status, body: String) -> Self {
        info!("[API Handled Error] {} | {}", status, body);
        Self { status, body }
    }
}
