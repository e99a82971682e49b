use getset::Getters;
use std::fmt::Display;

/// Broad classification of what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ErrorKind {
    /// The request never produced a response.
    Transport,
    /// The upstream answered with a non-success status.
    Status,
    /// The response body could not be decoded.
    Decode,
    /// The caller passed a query the upstream cannot serve.
    InvalidQuery,
    /// The client was built with an unusable configuration.
    InvalidConfig,
    /// A page task panicked or was cancelled before reporting back.
    Task,
    /// The overall wait for a result ran out.
    Timeout,
    /// The in-flight request this caller was waiting on went away.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Getters, thiserror::Error)]
#[error("{kind} error: {message}")]
#[get = "pub"]
pub struct Error {
    kind: ErrorKind,
    message: String,
    /// HTTP status reported by the upstream, when there was one.
    status: Option<u16>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn transport(err: impl Display) -> Self {
        Self::new(ErrorKind::Transport, err.to_string())
    }

    pub fn bad_status(status: u16, body: &[u8]) -> Self {
        let snippet: String = String::from_utf8_lossy(body).chars().take(200).collect();
        Self {
            kind: ErrorKind::Status,
            message: format!("upstream returned {}: {}", status, snippet),
            status: Some(status),
        }
    }

    pub fn decode(err: impl Display) -> Self {
        Self::new(ErrorKind::Decode, err.to_string())
    }

    /// True when the failure came from the upstream call rather than the
    /// caller's input, i.e. it should be reported as a server-side error.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Transport
                | ErrorKind::Status
                | ErrorKind::Decode
                | ErrorKind::Task
                | ErrorKind::Timeout
                | ErrorKind::Abandoned
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
