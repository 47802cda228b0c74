//! The pipe: one request/response cycle driver bound to a single transport.

use std::fmt;
use std::time::Duration;

use http::{Method, StatusCode};

use crate::close_reason::CloseReason;
use crate::headers::canonical_name;
use crate::transport::{Transport, TransportError};
use crate::Error;

mod drive;

pub use drive::{Response, ResponseHooks};

#[cfg(test)]
mod test;

/// Default number of body bytes asked from the transport per read.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Parser states, in wire order.
///
/// See the [state graph][crate] in the crate documentation. The single
/// back-edge is `Begin → Begin` via an interim `100` status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No request has been dispatched yet.
    NotReady,

    /// A request was sent; the status line is next.
    Begin,

    /// Inside the response header block.
    ReadingHeader,

    /// Decoding the response body.
    ReadingBody,

    /// The response has ended.
    Eof,
}

/// One parse event, pulled off the wire by [`Pipe::read`].
///
/// Events arrive strictly in wire order: a status line before any header,
/// all headers before [`Event::HeaderEnd`], body chunks in receive order,
/// [`Event::BodyEnd`] before [`Event::Eof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The response status line.
    StatusLine(StatusLine),

    /// One response header line.
    Header(HeaderField),

    /// The blank line ending the header block.
    HeaderEnd,

    /// A piece of the response body.
    Body(Vec<u8>),

    /// The body is complete.
    BodyEnd,

    /// The cycle is finalized; the transport was released or closed.
    Eof,
}

/// Outcome of parsing the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// A line matching `HTTP/<digit>.<digit> <code>`.
    Status(StatusCode),

    /// The line did not match; carried verbatim for diagnosis.
    ///
    /// This is data, not a failure: the parser still advances to the
    /// header block so the caller can inspect what follows.
    Malformed(String),
}

/// One response header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    /// Canonical display name. `None` when the line had no colon.
    pub name: Option<String>,

    /// The value, leading whitespace trimmed. For a colon-less line this
    /// holds the whole line.
    pub value: String,

    /// The line exactly as received.
    pub raw: String,
}

/// One stateful request/response cycle driver bound to a single transport
/// connection.
///
/// Not safe for concurrent use: exactly one logical caller drives a pipe
/// at a time. After [`Event::Eof`] the same pipe can issue another request;
/// whether that reuses the connection is between the transport and its
/// keepalive pool.
pub struct Pipe {
    transport: Option<Box<dyn Transport>>,
    chunk_size: usize,
    state: State,
    remaining_len: u64,
    chunked: bool,
    keepalive: bool,
    method: Method,
    eof: bool,
    read_timeout: Option<Duration>,
    close_reason: Option<CloseReason>,
}

impl Pipe {
    /// A pipe driving the given transport.
    pub fn new(transport: Box<dyn Transport>) -> Pipe {
        Pipe {
            transport: Some(transport),
            ..Pipe::unbound()
        }
    }

    /// A pipe with no transport bound yet.
    ///
    /// Every operation except [`Pipe::bind_transport`] fails until a
    /// transport is bound.
    pub fn unbound() -> Pipe {
        Pipe {
            transport: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            state: State::NotReady,
            remaining_len: 0,
            chunked: false,
            keepalive: true,
            method: Method::GET,
            eof: false,
            read_timeout: None,
            close_reason: None,
        }
    }

    /// Override the per-read body chunk size hint.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Pipe {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Bind the transport the pipe drives.
    pub fn bind_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
    }

    /// Read timeout reapplied to the transport before every read.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    /// Current parser state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the current cycle has been finalized.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Whether the connection is still eligible for reuse.
    pub fn is_keepalive(&self) -> bool {
        self.keepalive
    }

    /// Why reuse was lost, when it was.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    /// How many times the pool has handed out the underlying transport.
    pub fn reused_times(&self) -> Result<u64, Error> {
        match &self.transport {
            Some(t) => Ok(t.reused_count()),
            None => Err(Error::NotInitialized),
        }
    }

    // ////////////////////////////////////////////////////////////////// READ

    /// Pull the next parse event off the wire.
    ///
    /// Dispatches on the current state; every call returns exactly one
    /// [`Event`] or an error. Reading before any request was dispatched
    /// fails with [`Error::NotReady`].
    pub fn read(&mut self) -> Result<Event, Error> {
        match self.state {
            State::NotReady => Err(Error::NotReady),
            State::Begin => self.read_status_line(),
            State::ReadingHeader => self.read_header(),
            State::ReadingBody => self.read_body_data(),
            State::Eof => self.read_eof(),
        }
    }

    // ////////////////////////////////////////////////////////////////// BEGIN

    fn read_status_line(&mut self) -> Result<Event, Error> {
        let line = self.receive_line()?;
        let raw = String::from_utf8_lossy(&line).into_owned();

        let Some((minor, code)) = parse_status_line(&raw) else {
            debug!("malformed status line: {:?}", raw);
            self.state = State::ReadingHeader;
            return Ok(Event::StatusLine(StatusLine::Malformed(raw)));
        };

        trace!("status line: HTTP/1.{} {}", minor, code.as_u16());

        if code == StatusCode::CONTINUE {
            // Interim response. Discard its terminating blank line; the
            // real status line follows, so stay in Begin.
            self.receive_line()?;
            return Ok(Event::StatusLine(StatusLine::Status(code)));
        }

        if minor == 0 {
            self.keepalive = false;
            self.close_reason = Some(CloseReason::Http10);
        }

        self.state = State::ReadingHeader;
        Ok(Event::StatusLine(StatusLine::Status(code)))
    }

    // ////////////////////////////////////////////////////////////////// READING_HEADER

    fn read_header(&mut self) -> Result<Event, Error> {
        let line = self.receive_line()?;

        if line.is_empty() {
            self.state = State::ReadingBody;
            return Ok(Event::HeaderEnd);
        }

        let raw = String::from_utf8_lossy(&line).into_owned();

        let (name, value) = match raw.split_once(':') {
            Some((n, v)) => (canonical_name(n), v.trim_start().to_string()),
            None => {
                trace!("header line without colon: {:?}", raw);
                return Ok(Event::Header(HeaderField {
                    name: None,
                    value: raw.clone(),
                    raw,
                }));
            }
        };

        match name.as_str() {
            "Content-Length" => {
                self.remaining_len = value.trim().parse().unwrap_or(0);
            }
            "Transfer-Encoding" => {
                if !value.eq_ignore_ascii_case("identity") {
                    self.chunked = true;
                }
            }
            "Connection" => {
                if value.eq_ignore_ascii_case("close") {
                    self.keepalive = false;
                    self.close_reason = Some(CloseReason::ServerConnectionClose);
                } else if value.eq_ignore_ascii_case("keep-alive") {
                    self.keepalive = true;
                    self.close_reason = None;
                }
            }
            _ => {}
        }

        trace!("header: {}: {}", name, value);

        Ok(Event::Header(HeaderField {
            name: Some(name),
            value,
            raw,
        }))
    }

    // ////////////////////////////////////////////////////////////////// READING_BODY

    fn read_body_data(&mut self) -> Result<Event, Error> {
        // HEAD responses never carry a body regardless of headers.
        if self.method == Method::HEAD {
            self.state = State::Eof;
            return Ok(Event::BodyEnd);
        }

        if self.chunked && self.remaining_len == 0 {
            return self.read_chunk_header();
        }

        if self.remaining_len == 0 {
            self.state = State::Eof;
            return Ok(Event::BodyEnd);
        }

        let max = self.remaining_len.min(self.chunk_size as u64) as usize;

        match self.receive(max) {
            Ok(data) => {
                self.remaining_len -= data.len() as u64;
                trace!("body: {} bytes, {} remaining", data.len(), self.remaining_len);
                Ok(Event::Body(data))
            }
            Err(Error::Transport(TransportError::Closed { partial })) => {
                // Peer closed mid-body. A close landing exactly on the
                // declared end is legitimate; anything short is truncation.
                self.keepalive = false;
                self.close_reason = Some(CloseReason::CloseDelimitedEnd);

                if partial.is_empty() {
                    self.state = State::Eof;
                    Ok(Event::BodyEnd)
                } else if partial.len() as u64 == self.remaining_len {
                    self.remaining_len = 0;
                    Ok(Event::Body(partial))
                } else {
                    Err(Error::TruncatedBody {
                        remaining: self.remaining_len - partial.len() as u64,
                    })
                }
            }
            Err(e) => Err(e),
        }
    }

    fn read_chunk_header(&mut self) -> Result<Event, Error> {
        let mut line = self.receive_line()?;
        if line.is_empty() {
            // the CRLF that terminated the previous chunk's data
            line = self.receive_line()?;
        }

        let size = parse_chunk_size(&line)?;

        if size == 0 {
            // Final chunk: skip the trailer line and the body is done.
            self.receive_line()?;
            self.state = State::Eof;
            return Ok(Event::BodyEnd);
        }

        trace!("chunk size: {}", size);
        self.remaining_len = size;
        self.read_body_data()
    }

    // ////////////////////////////////////////////////////////////////// EOF

    fn read_eof(&mut self) -> Result<Event, Error> {
        if !self.eof {
            self.finalize()?;
        }
        Ok(Event::Eof)
    }

    // ////////////////////////////////////////////////////////////////// LIFECYCLE

    /// Mark the cycle finished and hand the transport back.
    ///
    /// Releases the connection to the keepalive pool when it is still
    /// eligible, closes it outright otherwise. A second call is a no-op,
    /// so the transport is handed back exactly once per cycle.
    pub fn finalize(&mut self) -> Result<(), Error> {
        if self.transport.is_none() {
            return Err(Error::NotInitialized);
        }
        if self.eof {
            return Ok(());
        }
        self.eof = true;
        self.state = State::Eof;

        if self.keepalive {
            debug!("eof, release to pool");
            self.transport_mut()?.release()?;
        } else {
            let why = self
                .close_reason
                .map(|r| r.explain())
                .unwrap_or("keepalive disabled");
            debug!("eof, close: {}", why);
            self.transport_mut()?.close()?;
        }
        Ok(())
    }

    /// Force the connection shut regardless of keepalive.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.transport.is_none() {
            return Err(Error::NotInitialized);
        }
        self.keepalive = false;
        self.close_reason = Some(CloseReason::ExplicitClose);
        self.eof = true;
        self.state = State::Eof;
        self.transport_mut()?.close()?;
        Ok(())
    }

    // ////////////////////////////////////////////////////////////////// TRANSPORT HELPERS

    pub(crate) fn transport_mut(&mut self) -> Result<&mut dyn Transport, Error> {
        match self.transport.as_mut() {
            Some(t) => Ok(t.as_mut()),
            None => Err(Error::NotInitialized),
        }
    }

    fn receive_line(&mut self) -> Result<Vec<u8>, Error> {
        let timeout = self.read_timeout;
        let t = self.transport_mut()?;
        t.set_timeout(timeout);
        Ok(t.receive_line()?)
    }

    fn receive(&mut self, max: usize) -> Result<Vec<u8>, Error> {
        let timeout = self.read_timeout;
        let t = self.transport_mut()?;
        t.set_timeout(timeout);
        Ok(t.receive(max)?)
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("state", &self.state)
            .field("remaining_len", &self.remaining_len)
            .field("chunked", &self.chunked)
            .field("keepalive", &self.keepalive)
            .field("method", &self.method)
            .field("eof", &self.eof)
            .finish()
    }
}

/// `HTTP/<digit>.<digit> <3-digit code>`, anything after the code.
fn parse_status_line(line: &str) -> Option<(u8, StatusCode)> {
    let b = line.as_bytes();

    if b.len() < 12 || !line.starts_with("HTTP/") {
        return None;
    }
    if !b[5].is_ascii_digit() || b[6] != b'.' || !b[7].is_ascii_digit() || b[8] != b' ' {
        return None;
    }
    if !b[9..12].iter().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if b.len() > 12 && b[12] != b' ' {
        return None;
    }

    let num = (b[9] - b'0') as u16 * 100 + (b[10] - b'0') as u16 * 10 + (b[11] - b'0') as u16;
    let code = StatusCode::from_u16(num).ok()?;

    Some((b[7] - b'0', code))
}

/// Hex chunk size, tolerating a `;extension` suffix.
fn parse_chunk_size(line: &[u8]) -> Result<u64, Error> {
    let s = std::str::from_utf8(line)
        .map_err(|_| Error::ChunkLenNotANumber(String::from_utf8_lossy(line).into_owned()))?;
    let digits = s.split(';').next().unwrap_or("").trim();
    u64::from_str_radix(digits, 16).map_err(|_| Error::ChunkLenNotANumber(s.to_string()))
}

#[cfg(test)]
mod parse_test {
    use super::*;

    #[test]
    fn status_line_accepts_reason_and_bare_code() {
        let (minor, code) = parse_status_line("HTTP/1.1 200 OK").unwrap();
        assert_eq!(minor, 1);
        assert_eq!(code, StatusCode::OK);

        let (minor, code) = parse_status_line("HTTP/1.0 404").unwrap();
        assert_eq!(minor, 0);
        assert_eq!(code, StatusCode::NOT_FOUND);
    }

    #[test]
    fn status_line_rejects_garbage() {
        assert!(parse_status_line("FTP/1.1 200 OK").is_none());
        assert!(parse_status_line("HTTP/1.1200 OK").is_none());
        assert!(parse_status_line("HTTP/1.1 20").is_none());
        assert!(parse_status_line("HTTP/1.1 2000").is_none());
        assert!(parse_status_line("HTTP/1.1 099").is_none());
        assert!(parse_status_line("").is_none());
    }

    #[test]
    fn chunk_size_hex_with_extension() {
        assert_eq!(parse_chunk_size(b"4").unwrap(), 4);
        assert_eq!(parse_chunk_size(b"1a").unwrap(), 26);
        assert_eq!(parse_chunk_size(b"1A;name=value").unwrap(), 26);
        assert!(parse_chunk_size(b"xyz").is_err());
        assert!(parse_chunk_size(b"").is_err());
    }
}
