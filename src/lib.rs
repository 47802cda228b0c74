//! HTTP/1.x client protocol engine.
//!
//! This crate serializes requests, drives a byte stream through a
//! status-line/header/body state machine, decodes chunked or
//! length-delimited bodies and manages keepalive reuse, all over an
//! already-established connection represented by the [`Transport`] trait.
//! It contains no sockets: opening, closing and pooling connections belong
//! to the transport implementation.
//!
//! The central type is the [`Pipe`], one request/response cycle driver
//! bound to a single transport. After a request is dispatched the response
//! is parsed incrementally: every [`Pipe::read`] call pulls exactly one
//! [`Event`] off the wire, in wire order.
//!
//! The parser states are:
//!
//! * **NotReady** - no request has been dispatched yet
//! * **Begin** - a request was sent, the status line is next
//! * **ReadingHeader** - inside the response header block
//! * **ReadingBody** - decoding the length-delimited or chunked body
//! * **Eof** - the cycle is done; the transport has been released or closed
//!
//! ```text
//! ┌──────────────────┐
//! │     NotReady     │
//! └──────────────────┘
//!           │ request()
//!           ▼
//! ┌──────────────────┐ interim 100
//! │      Begin       │──────┐
//! └──────────────────┘◀─────┘
//!           │ statusline
//!           ▼
//! ┌──────────────────┐
//! │  ReadingHeader   │
//! └──────────────────┘
//!           │ header_end
//!           ▼
//! ┌──────────────────┐
//! │   ReadingBody    │
//! └──────────────────┘
//!           │ body_end
//!           ▼
//! ┌──────────────────┐
//! │       Eof        │
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use httpipe::{Pipe, RequestOptions, Target, Transport, TransportError};
//!
//! // A canned transport standing in for a real connection. A production
//! // implementation would wrap a socket and a keepalive pool.
//! struct Canned {
//!     response: Vec<u8>,
//!     pos: usize,
//!     sent: Vec<u8>,
//! }
//!
//! impl Transport for Canned {
//!     fn connect(&mut self, _: &Target, _: Option<Duration>) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//!
//!     fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
//!         self.sent.extend_from_slice(data);
//!         Ok(data.len())
//!     }
//!
//!     fn receive(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
//!         let end = (self.pos + max).min(self.response.len());
//!         let out = self.response[self.pos..end].to_vec();
//!         self.pos = end;
//!         if out.len() < max {
//!             return Err(TransportError::Closed { partial: out });
//!         }
//!         Ok(out)
//!     }
//!
//!     fn receive_line(&mut self) -> Result<Vec<u8>, TransportError> {
//!         let rest = &self.response[self.pos..];
//!         match rest.windows(2).position(|w| w == b"\r\n") {
//!             Some(i) => {
//!                 let line = rest[..i].to_vec();
//!                 self.pos += i + 2;
//!                 Ok(line)
//!             }
//!             None => Err(TransportError::Closed { partial: rest.to_vec() }),
//!         }
//!     }
//!
//!     fn set_timeout(&mut self, _: Option<Duration>) {}
//!
//!     fn close(&mut self) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//!
//!     fn release(&mut self) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//!
//!     fn reused_count(&self) -> u64 {
//!         0
//!     }
//! }
//!
//! let transport = Canned {
//!     response: b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntest".to_vec(),
//!     pos: 0,
//!     sent: Vec::new(),
//! };
//!
//! let mut pipe = Pipe::new(Box::new(transport));
//!
//! let opts = RequestOptions::new().path("/foo").header("Host", "h.test");
//!
//! let response = pipe
//!     .request(&Target::new("h.test"), opts)
//!     .unwrap()
//!     .expect("buffered mode always yields a response");
//!
//! assert_eq!(response.status_code().map(|s| s.as_u16()), Some(200));
//! assert_eq!(response.body, b"test");
//! assert!(response.eof);
//! ```
//!
//! # In scope:
//!
//! * HTTP/1.0 and HTTP/1.1 request serialization
//! * Incremental, pull-based response parsing
//! * transfer-encoding: chunked and content-length delimited bodies
//! * Keepalive bookkeeping (release to pool vs close, with a reason)
//! * Streaming request bodies (pull-based producer) and streaming
//!   response reads (full or body-only bypass)
//!
//! # Out of scope:
//!
//! * Opening/closing sockets, DNS, TLS
//! * Connection pool policy (the transport owns its pool)
//! * Redirects, retries, cookie jars
//! * Body data transformations (charset, compression etc)
//!
//! # The http crate
//!
//! Vocabulary types ([`http::Method`], [`http::StatusCode`],
//! [`http::Version`]) come from the [http crate](https://crates.io/crates/http).
//! Header names are crate-owned strings because the canonical display
//! casing (`Content-Type`, `X-Custom-Header`) is part of this engine's
//! contract, which `http::HeaderName` (always lowercase) cannot carry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod close_reason;
mod encode;
mod error;
mod escape;
mod headers;
mod options;
mod pipe;
mod transport;

pub use close_reason::CloseReason;
pub use error::Error;
pub use escape::escape_path;
pub use headers::{canonical_name, Headers};
pub use options::{Body, Query, RequestOptions, StreamMode};
pub use pipe::{
    Event, HeaderField, Pipe, Response, ResponseHooks, State, StatusLine, DEFAULT_CHUNK_SIZE,
};
pub use transport::{Target, Transport, TransportError};

/// Re-export of the http crate.
pub use http;
