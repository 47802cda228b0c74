//! Request serialization.

use http::{Method, Version};

use crate::escape::escape_path;
use crate::headers::Headers;
use crate::options::{Body, Query, RequestOptions};
use crate::transport::Target;
use crate::Error;

/// Fixed engine identifier, sent when the caller supplies no `User-Agent`.
pub(crate) const USER_AGENT: &str = concat!("httpipe/", env!("CARGO_PKG_VERSION"));

/// Build the request line and header block.
///
/// Pure transformation: the returned method is what the orchestrator
/// records on the pipe (HEAD suppresses body reads later), and the
/// returned map is the normalized view of what went on the wire.
pub(crate) fn encode(
    target: &Target,
    opts: &RequestOptions,
) -> Result<(Vec<u8>, Headers, Method), Error> {
    if opts.version != Version::HTTP_10 && opts.version != Version::HTTP_11 {
        return Err(Error::InvalidVersion(opts.version));
    }

    // Standard methods are already uppercase; this forces custom ones.
    let upper = opts.method.as_str().to_ascii_uppercase();
    let method = Method::from_bytes(upper.as_bytes()).unwrap_or_else(|_| opts.method.clone());

    let mut path = escape_path(opts.path.as_deref().unwrap_or("/"));

    let query = match &opts.query {
        Some(Query::Pairs(pairs)) => serde_urlencoded::to_string(pairs).unwrap_or_default(),
        Some(Query::Raw(s)) => s.clone(),
        None => String::new(),
    };
    if !query.is_empty() {
        path.push('?');
        path.push_str(&query);
    }

    let mut headers = Headers::new();
    for (name, value) in &opts.headers {
        headers.set(name, value.clone());
    }

    // A literal body always dictates Content-Length.
    if let Body::Bytes(b) = &opts.body {
        headers.set("Content-Length", b.len().to_string());
    }

    // PUT and POST carry a numeric Content-Length even without a body.
    if method == Method::PUT || method == Method::POST {
        let len: u64 = headers
            .get("Content-Length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        headers.set("Content-Length", len.to_string());
    }

    if !headers.contains("Host") {
        headers.set("Host", target.host_header());
    }
    if !headers.contains("User-Agent") {
        headers.set("User-Agent", USER_AGENT);
    }
    if !headers.contains("Accept") {
        headers.set("Accept", "*/*");
    }

    if opts.version == Version::HTTP_10 && !headers.contains("Connection") {
        headers.set("Connection", "Keep-Alive");
    }

    let version_str = if opts.version == Version::HTTP_10 {
        "HTTP/1.0"
    } else {
        "HTTP/1.1"
    };

    let mut out = Vec::with_capacity(256);
    out.extend_from_slice(method.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(path.as_bytes());
    out.push(b' ');
    out.extend_from_slice(version_str.as_bytes());
    out.extend_from_slice(b"\r\n");

    for (name, value) in headers.iter() {
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");

    Ok((out, headers, method))
}
