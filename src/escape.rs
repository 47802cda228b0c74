//! Path escaping.

use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes a path segment cannot carry raw.
///
/// Includes `/` so that an encoded segment can never reintroduce a
/// separator; the slash structure of the path is decided by the splitting,
/// not by the data.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode a URL path, segment by segment.
///
/// The path is split on `/`, each non-empty segment is encoded
/// independently and the parts are rejoined with `/`. Leading and trailing
/// slashes survive; a path not beginning with `/` is treated as if it did.
pub fn escape_path(path: &str) -> String {
    let path: Cow<str> = if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{}", path))
    };

    path.split('/')
        .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
