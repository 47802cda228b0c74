//! Request options.

use std::fmt;
use std::time::Duration;

use http::{Method, Version};

/// Default connect timeout applied when the caller sets none.
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Query string input for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Key/value pairs, serialized to `key=value&...` with standard
    /// form-urlencoding.
    Pairs(Vec<(String, String)>),

    /// A pre-encoded query string, appended verbatim after `?`.
    Raw(String),
}

/// Request body input.
#[derive(Default)]
pub enum Body {
    /// No request body.
    #[default]
    None,

    /// A complete body. `Content-Length` is forced to its byte length.
    Bytes(Vec<u8>),

    /// Pull-based chunk producer.
    ///
    /// Invoked repeatedly while sending; each yielded chunk goes out on the
    /// wire until the declared `Content-Length` budget is exhausted or the
    /// producer returns `None`/an empty chunk. The caller must declare the
    /// length via a `Content-Length` header and supply exactly that many
    /// bytes.
    Producer(Box<dyn FnMut() -> Option<Vec<u8>> + Send>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::None => write!(f, "None"),
            Body::Bytes(b) => write!(f, "Bytes({})", b.len()),
            Body::Producer(_) => write!(f, "Producer(..)"),
        }
    }
}

/// How much of the response the orchestrator reads on the caller's behalf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamMode {
    /// Drain the whole response into the returned [`Response`][crate::Response].
    #[default]
    Buffered,

    /// Return right after the request is sent; the caller drives
    /// [`read()`][crate::Pipe::read] manually.
    PassThrough,

    /// Stop the drain at `header_end`; the caller drives
    /// [`read_body()`][crate::Pipe::read_body] manually.
    BodyPassThrough,
}

/// Options for one request.
///
/// The fields are public; the builder-style setters are conveniences.
#[derive(Debug)]
pub struct RequestOptions {
    /// Request method. Defaults to GET.
    pub method: Method,
    /// Request path. Defaults to `/`; escaped before serialization.
    pub path: Option<String>,
    /// Optional query string.
    pub query: Option<Query>,
    /// Caller headers, normalized and collected in order. A repeated name
    /// overwrites the earlier value.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Body,
    /// HTTP version. Only `HTTP_10` and `HTTP_11` are legal.
    pub version: Version,
    /// Response streaming mode.
    pub stream: StreamMode,
    /// Connect timeout. Defaults to 5000 ms.
    pub connect_timeout: Duration,
    /// Send timeout applied to the transport for the request write, if set.
    pub send_timeout: Option<Duration>,
    /// Read timeout stashed on the pipe and reapplied before every read.
    pub read_timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            method: Method::GET,
            path: None,
            query: None,
            headers: Vec::new(),
            body: Body::None,
            version: Version::HTTP_11,
            stream: StreamMode::Buffered,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            send_timeout: None,
            read_timeout: None,
        }
    }
}

impl RequestOptions {
    /// Options for a GET of `/` over HTTP/1.1.
    pub fn new() -> RequestOptions {
        RequestOptions::default()
    }

    /// Set the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the query.
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Set the HTTP version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the streaming mode.
    pub fn stream(mut self, stream: StreamMode) -> Self {
        self.stream = stream;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the send timeout.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
}
