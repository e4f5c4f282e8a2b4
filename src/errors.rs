use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error kind that represents failures reported by the [`crate::Client`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ErrorKind {
    /// Initialization of the internal [`reqwest::Client`] failed.
    HttpClientInitFailure,
    /// The tenant identifier given to the builder is empty.
    InvalidTenant,
    /// The API key given to the builder is empty, or the API rejected it (401, 403 or 404).
    InvalidApiKey = 1100,
    /// Invalid HTTP response was received (unexpected HTTP status code).
    UnexpectedHttpResponse = 1101,
    /// The HTTP request timed out.
    HttpRequestTimeout = 1102,
    /// The HTTP request failed (most likely, due to a local network issue).
    HttpRequestFailure = 1103,
    /// An invalid HTTP response was received (200 OK with an invalid content).
    InvalidHttpResponseContent = 1105,
    /// Sending the analytics bucket failed.
    AnalyticsFlushFailure = 1200,
    /// A cache read, write or removal failed and was treated as a miss.
    CacheFailure = 2200,
    /// The client is in offline mode, it cannot initiate HTTP requests.
    OfflineClient = 3200,
    /// The client did not finish its first refresh in time.
    ClientInitTimedOut = 4200,
}

impl ErrorKind {
    pub(crate) fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Error struct that holds the [`ErrorKind`] and message of the reported failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientError {
    /// Error kind that represents failures reported by the [`crate::Client`].
    pub kind: ErrorKind,
    /// The text representation of the failure.
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: ErrorKind, message: String) -> Self {
        Self { message, kind }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.as_str())
    }
}

impl Error for ClientError {}
