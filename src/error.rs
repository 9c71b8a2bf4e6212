use thiserror::Error;

/// Failures of the feed connection.
///
/// `Timeout` is the normal "nothing arrived this tick" outcome of a receive and
/// is never reported. The other variants unwind to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("timed out")]
    Timeout,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// A payload that could not be turned into something displayable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("missing field {field}")]
    FieldMissing { field: &'static str },
    #[error("unexpected payload: {0}")]
    UnexpectedShape(&'static str),
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}
