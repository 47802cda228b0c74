use std::fmt;

use http::Version;

use crate::pipe::State;
use crate::transport::TransportError;

/// Error type for httpipe
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum Error {
    NotInitialized,
    NotReady,
    InvalidVersion(Version),
    InvalidTarget(String),
    ChunkLenNotANumber(String),
    TruncatedBody { remaining: u64 },
    BadState(State),
    Transport(TransportError),
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        Error::Transport(value)
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotInitialized => write!(f, "pipe has no transport bound"),
            Error::NotReady => write!(f, "read attempted before a request was dispatched"),
            Error::InvalidVersion(v) => write!(f, "unsupported http version: {:?}", v),
            Error::InvalidTarget(v) => write!(f, "invalid target: {}", v),
            Error::ChunkLenNotANumber(v) => {
                write!(f, "chunk length cannot be read as a number: {}", v)
            }
            Error::TruncatedBody { remaining } => {
                write!(f, "connection closed with {} body bytes outstanding", remaining)
            }
            Error::BadState(s) => write!(f, "operation not valid in state {:?}", s),
            Error::Transport(e) => write!(f, "transport: {}", e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_strings() {
        assert_eq!(Error::NotInitialized.to_string(), "pipe has no transport bound");
        assert_eq!(
            Error::TruncatedBody { remaining: 7 }.to_string(),
            "connection closed with 7 body bytes outstanding"
        );
        assert_eq!(
            Error::BadState(State::Begin).to_string(),
            "operation not valid in state Begin"
        );
    }

    #[test]
    fn from_transport_error() {
        let err: Error = TransportError::TimedOut.into();
        assert_eq!(err, Error::Transport(TransportError::TimedOut));
    }
}
