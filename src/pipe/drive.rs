//! Driving a whole request/response cycle.

use http::{StatusCode, Version};

use crate::encode;
use crate::headers::Headers;
use crate::options::{Body, RequestOptions, StreamMode};
use crate::transport::{Target, Transport, TransportError};
use crate::Error;

use super::{Event, Pipe, State, StatusLine};

/// An assembled response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The (last) status line. An interim `100` is never the last.
    pub status: StatusLine,

    /// The response headers, multi-valued names preserved in order.
    pub headers: Headers,

    /// The accumulated body. Empty when a filter consumed the chunks or
    /// the drain stopped before the body.
    pub body: Vec<u8>,

    /// Whether the cycle was finalized. `false` when an early-exit hook or
    /// a body-bypass stream mode stopped the drain.
    pub eof: bool,
}

impl Response {
    /// The parsed status code, unless the status line was malformed.
    pub fn status_code(&self) -> Option<StatusCode> {
        match &self.status {
            StatusLine::Status(code) => Some(*code),
            StatusLine::Malformed(_) => None,
        }
    }
}

/// Early-exit hooks for [`Pipe::response_with`].
///
/// Both hooks return a stop signal: `true` ends the drain loop right
/// there, leaving the pipe mid-cycle for the caller to continue manually.
#[derive(Default)]
pub struct ResponseHooks<'a> {
    /// Invoked once when the header block ends, with the status and the
    /// headers assembled so far.
    pub header_filter: Option<&'a mut dyn FnMut(&StatusLine, &Headers) -> bool>,

    /// Invoked with each body chunk. When a body filter is present the
    /// chunks are handed to it instead of being buffered.
    pub body_filter: Option<&'a mut dyn FnMut(&[u8]) -> bool>,
}

impl Pipe {
    /// Dispatch a request and, depending on the stream mode, read the
    /// response.
    ///
    /// Connects the transport (connect timeout defaults to 5000 ms),
    /// serializes and sends the request, then:
    ///
    /// * [`StreamMode::Buffered`] drains the whole response and returns it,
    /// * [`StreamMode::BodyPassThrough`] stops after the header block
    ///   (`eof` stays `false`; continue with [`Pipe::read_body`]),
    /// * [`StreamMode::PassThrough`] returns `Ok(None)` without reading
    ///   anything (continue with [`Pipe::read`]).
    pub fn request(
        &mut self,
        target: &Target,
        mut opts: RequestOptions,
    ) -> Result<Option<Response>, Error> {
        target.validate()?;

        if opts.version != Version::HTTP_10 && opts.version != Version::HTTP_11 {
            return Err(Error::InvalidVersion(opts.version));
        }

        let (head, headers, method) = encode::encode(target, &opts)?;

        debug!("{} {:?}", method, target);

        // Reset the per-cycle parser state before any bytes move.
        self.method = method;
        self.state = State::NotReady;
        self.remaining_len = 0;
        self.chunked = false;
        self.keepalive = true;
        self.eof = false;
        self.close_reason = None;
        if opts.read_timeout.is_some() {
            self.read_timeout = opts.read_timeout;
        }

        {
            let t = self.transport_mut()?;
            t.connect(target, Some(opts.connect_timeout))?;
            if let Some(st) = opts.send_timeout {
                t.set_timeout(Some(st));
            }
            send_all(t, &head)?;
        }

        match opts.body {
            Body::None => {}
            Body::Bytes(ref b) => {
                let t = self.transport_mut()?;
                send_all(t, b)?;
            }
            Body::Producer(ref mut producer) => {
                let budget = headers
                    .get("Content-Length")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(0);
                self.send_produced(&mut **producer, budget)?;
            }
        }

        self.state = State::Begin;

        match opts.stream {
            StreamMode::PassThrough => Ok(None),
            StreamMode::BodyPassThrough => {
                let mut stop = |_: &StatusLine, _: &Headers| true;
                let hooks = ResponseHooks {
                    header_filter: Some(&mut stop),
                    body_filter: None,
                };
                self.response_with(hooks).map(Some)
            }
            StreamMode::Buffered => self.response().map(Some),
        }
    }

    /// Drain the state machine until eof, assembling the response.
    pub fn response(&mut self) -> Result<Response, Error> {
        self.response_with(ResponseHooks::default())
    }

    /// Like [`Pipe::response`], with early-exit hooks.
    pub fn response_with(&mut self, mut hooks: ResponseHooks<'_>) -> Result<Response, Error> {
        let mut status = StatusLine::Malformed(String::new());
        let mut headers = Headers::new();
        let mut body = Vec::new();

        loop {
            match self.read()? {
                Event::StatusLine(s) => status = s,
                Event::Header(h) => {
                    // Colon-less lines reach read() callers but have no
                    // name to file them under here.
                    if let Some(name) = h.name {
                        headers.append(&name, h.value);
                    }
                }
                Event::HeaderEnd => {
                    if let Some(filter) = hooks.header_filter.as_mut() {
                        if filter(&status, &headers) {
                            break;
                        }
                    }
                }
                Event::Body(chunk) => match hooks.body_filter.as_mut() {
                    Some(filter) => {
                        if filter(&chunk) {
                            break;
                        }
                    }
                    None => body.extend_from_slice(&chunk),
                },
                Event::BodyEnd => {}
                Event::Eof => break,
            }
        }

        Ok(Response {
            status,
            headers,
            body,
            eof: self.eof,
        })
    }

    /// One manual body read.
    ///
    /// Returns `Ok(Some(bytes))` for a body chunk and `Ok(None)` once the
    /// body is complete, at which point the pipe has been finalized.
    /// Fails with [`Error::BadState`] while the parser has not reached the
    /// body yet.
    pub fn read_body(&mut self) -> Result<Option<Vec<u8>>, Error> {
        match self.state {
            State::NotReady | State::Begin | State::ReadingHeader => {
                Err(Error::BadState(self.state))
            }
            State::ReadingBody | State::Eof => match self.read()? {
                Event::Body(data) => Ok(Some(data)),
                Event::BodyEnd => {
                    // Run the eof handler so the transport is handed back.
                    self.read()?;
                    Ok(None)
                }
                Event::Eof => Ok(None),
                _ => Err(Error::BadState(self.state)),
            },
        }
    }

    fn send_produced(
        &mut self,
        producer: &mut (dyn FnMut() -> Option<Vec<u8>> + Send),
        budget: u64,
    ) -> Result<(), Error> {
        let mut remaining = budget;

        while remaining > 0 {
            let Some(chunk) = producer() else {
                break;
            };
            if chunk.is_empty() {
                break;
            }

            let take = (chunk.len() as u64).min(remaining) as usize;
            let t = self.transport_mut()?;
            send_all(t, &chunk[..take])?;
            remaining -= take as u64;
        }

        if remaining > 0 {
            // The receiver was promised more than the producer delivered.
            warn!(
                "request body producer yielded {} bytes less than Content-Length",
                remaining
            );
        }

        Ok(())
    }
}

fn send_all(t: &mut dyn Transport, data: &[u8]) -> Result<(), Error> {
    let mut data = data;
    while !data.is_empty() {
        let n = t.send(data)?;
        if n == 0 {
            return Err(Error::Transport(TransportError::Other(
                "send made no progress".into(),
            )));
        }
        data = &data[n..];
    }
    Ok(())
}
