//! Header name canonicalization and the ordered header map.

/// Common header names in their well-known display casing.
///
/// Checked before the title-casing fallback. Process-wide, read-only.
static COMMON_HEADERS: &[&str] = &[
    "Cache-Control",
    "Content-Length",
    "Content-Type",
    "Date",
    "ETag",
    "Expires",
    "Host",
    "Location",
    "User-Agent",
];

/// Canonical display form of a header name.
///
/// `content-type` becomes `Content-Type` and `x-custom-header` becomes
/// `X-Custom-Header`. Only the first letter and letters following a hyphen
/// have their case forced; every other position passes through untouched.
/// Idempotent.
pub fn canonical_name(name: &str) -> String {
    for known in COMMON_HEADERS {
        if known.eq_ignore_ascii_case(name) {
            return (*known).to_string();
        }
    }

    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if upper_next {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        upper_next = c == '-';
    }
    out
}

/// Insertion-ordered header map with case-insensitive keys.
///
/// Keys are stored in canonical display casing. A name can hold several
/// values; they keep their append order and serialize as one
/// `Name: Value` line per value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// An empty map.
    pub fn new() -> Headers {
        Headers::default()
    }

    /// Set a header, replacing any values already present under the name.
    ///
    /// An existing name keeps its position in the map.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = canonical_name(name);
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1 = vec![value],
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Add a value under the name, keeping any values already present.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let name = canonical_name(name);
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// First value under the name, if any. Lookup is case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|i| self.entries[i].1.first())
            .map(|v| v.as_str())
    }

    /// All values under the name, in append order.
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(i) => &self.entries[i].1,
            None => &[],
        }
    }

    /// Whether the name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, value)` pairs, one per value, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(n, vs)| vs.iter().map(move |v| (n.as_str(), v.as_str())))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}
