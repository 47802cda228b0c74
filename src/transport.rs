//! The transport collaborator boundary.
//!
//! This crate does not open sockets. A [`Transport`] wraps an established
//! (or establishable) connection plus whatever keepalive pool it came from,
//! and the engine drives it through the narrow capability set below. The
//! tests ship a scripted implementation; production implementations wrap a
//! TCP stream, a TLS session, a unix socket or similar.

use std::fmt;
use std::time::Duration;

use crate::Error;

/// Where a connection goes: a host with an optional port, or a unix
/// socket path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: Option<u16>,
    unix_path: Option<String>,
}

impl Target {
    /// Target a host on the default port.
    pub fn new(host: impl Into<String>) -> Target {
        Target {
            host: host.into(),
            port: None,
            unix_path: None,
        }
    }

    /// Target a host and port.
    pub fn with_port(host: impl Into<String>, port: u16) -> Target {
        Target {
            host: host.into(),
            port: Some(port),
            unix_path: None,
        }
    }

    /// Target a unix domain socket path.
    pub fn unix(path: impl Into<String>) -> Target {
        Target {
            host: String::new(),
            port: None,
            unix_path: Some(path.into()),
        }
    }

    /// The host, empty for unix socket targets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port, if one was given.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The unix socket path, if this is a unix target.
    pub fn unix_path(&self) -> Option<&str> {
        self.unix_path.as_deref()
    }

    /// Exactly one addressing mode must be populated.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        match (self.host.is_empty(), &self.unix_path) {
            (false, None) => Ok(()),
            (true, Some(_)) => Ok(()),
            (true, None) => Err(Error::InvalidTarget(
                "neither host nor unix socket path given".into(),
            )),
            (false, Some(_)) => Err(Error::InvalidTarget(
                "both host and unix socket path given".into(),
            )),
        }
    }

    /// Default `Host` header value for this target.
    pub(crate) fn host_header(&self) -> String {
        if self.unix_path.is_some() {
            return "localhost".to_string();
        }
        match self.port {
            Some(port) if port != 80 => format!("{}:{}", self.host, port),
            _ => self.host.clone(),
        }
    }
}

/// Errors surfaced by a [`Transport`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer closed the connection.
    ///
    /// Any bytes that were read before the close ride along in `partial`,
    /// so the body decoder can reconcile them against the declared length.
    Closed {
        /// Bytes read before the close, possibly empty.
        partial: Vec<u8>,
    },

    /// The configured timeout expired.
    TimedOut,

    /// Anything else the transport wants to surface.
    Other(String),
}

impl std::error::Error for TransportError {}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed { partial } => {
                write!(f, "connection closed ({} partial bytes)", partial.len())
            }
            TransportError::TimedOut => write!(f, "operation timed out"),
            TransportError::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Capability set the engine requires from the underlying connection.
///
/// Every call is a suspension point: implementations may block the calling
/// task, but the engine itself never retries or reorders them. Buffering is
/// the implementation's concern; in particular [`receive`][Transport::receive]
/// and [`receive_line`][Transport::receive_line] must share one read buffer
/// so body bytes and delimited lines interleave correctly.
pub trait Transport {
    /// Establish (or re-establish from the pool) the connection.
    ///
    /// Connecting to a target the transport is already connected to is
    /// expected to be cheap; pooled implementations hand back the kept
    /// alive connection and bump their reuse counter.
    fn connect(&mut self, target: &Target, timeout: Option<Duration>) -> Result<(), TransportError>;

    /// Send bytes, returning how many were accepted.
    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Receive exactly `max` bytes.
    ///
    /// A peer close before `max` bytes arrived is reported as
    /// [`TransportError::Closed`] carrying whatever did arrive.
    fn receive(&mut self, max: usize) -> Result<Vec<u8>, TransportError>;

    /// Receive up to the next CRLF, with the delimiter stripped.
    fn receive_line(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Apply a timeout to subsequent operations, or clear it with `None`.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Close the connection for good.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Hand the connection back to the keepalive pool.
    fn release(&mut self) -> Result<(), TransportError>;

    /// How many times the pool has handed out this connection.
    fn reused_count(&self) -> u64;
}
