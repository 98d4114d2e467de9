use std::fmt;
use std::iter::FromIterator;
use std::result;
use std::str;
use std::str::FromStr;

use bytes::Bytes;

use crate::headers_place::HeadersPlace;
use crate::req_resp::RequestOrResponse;

pub(crate) mod name;
pub(crate) mod value;

pub use self::name::HeaderName;
pub use self::name::PseudoHeaderName;
pub use self::value::HeaderValue;

use self::name::PseudoHeaderNameSet;

/// Hop-by-hop headers that HTTP/1 used to steer the connection itself.
/// HTTP/2 expresses all of that in frames, so a message carrying any of
/// these is malformed (8.1.2.2).
const CONNECTION_SPECIFIC_HEADERS: &[&str] = &[
    "connection",
    "proxy-connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
];

/// HTTP/2 header, regular or pseudo-header
#[derive(PartialEq, Eq, Hash, Clone)]
pub struct Header {
    name: HeaderName,
    pub value: HeaderValue,
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("name", &self.name.name())
            .field("value", &self.value)
            .finish()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HeaderError {
    UnknownPseudoHeader,
    EmptyName,
    EmptyValue(PseudoHeaderName),
    IncorrectCharInName,
    HeaderNameNotAscii,
    UppercaseCharInName,
    SurroundingWhitespaceInValue,
    HeaderValueNotUtf8,
    UnexpectedPseudoHeader(PseudoHeaderName),
    PseudoHeadersInTrailers,
    PseudoHeadersAfterRegularHeaders,
    MoreThanOnePseudoHeader(PseudoHeaderName),
    MissingPseudoHeader(PseudoHeaderName),
    ConnectionSpecificHeader(&'static str),
    TeCanOnlyContainTrailers,
    MalformedContentLength,
}

pub type HeaderResult<T> = result::Result<T, HeaderError>;

impl Header {
    /// Creates a new `Header` with the given name and value.
    ///
    /// Header name is converted to lower case.
    /// This function panics if header name is structurally invalid.
    pub fn new<N: Into<HeaderName>, V: Into<HeaderValue>>(name: N, value: V) -> Header {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a `Header` from bytes received from the peer, performing
    /// only structural checks. Case is preserved so that validation can
    /// reject uppercase names; normalization happens separately.
    pub(crate) fn from_wire(name: Bytes, value: Bytes) -> HeaderResult<Header> {
        let name = HeaderName::from_wire(name).map_err(|(e, _)| e)?;
        Ok(Header {
            name,
            value: HeaderValue::from(value),
        })
    }

    /// The header name as a string (names are always ASCII).
    pub fn name(&self) -> &str {
        self.name.name()
    }

    /// The header value; an opaque byte sequence as far as HTTP/2 is
    /// concerned.
    pub fn value(&self) -> &[u8] {
        self.value.as_slice()
    }

    /// `name: value`, for humans.
    pub fn format(&self) -> String {
        format!(
            "{}: {}",
            self.name(),
            String::from_utf8_lossy(self.value.as_slice())
        )
    }

    pub fn is_pseudo_header(&self) -> bool {
        self.name.is_pseudo()
    }

    pub fn pseudo_header_name(&self) -> Option<PseudoHeaderName> {
        self.name.pseudo_header_name()
    }

    /// Checks the single header against the RFC 7540 rules that do not
    /// need the whole header list for context.
    pub(crate) fn validate(&self, req_or_resp: RequestOrResponse) -> HeaderResult<()> {
        if self.is_pseudo_header() {
            let h = match self.pseudo_header_name() {
                Some(h) => h,
                None => return Err(HeaderError::UnknownPseudoHeader),
            };
            if h.req_or_resp() != req_or_resp {
                return Err(HeaderError::UnexpectedPseudoHeader(h));
            }
            return Ok(());
        }

        let name = self.name().as_bytes();
        if name.iter().any(|c| c.is_ascii_uppercase()) {
            return Err(HeaderError::UppercaseCharInName);
        }

        for s in CONNECTION_SPECIFIC_HEADERS {
            if name == s.as_bytes() {
                return Err(HeaderError::ConnectionSpecificHeader(s));
            }
        }

        if req_or_resp == RequestOrResponse::Request && name == b"te" {
            // `te` is the one hop-by-hop header requests may keep, and
            // only to announce trailer support (8.1.2.2).
            if self.value.as_slice() != b"trailers" {
                return Err(HeaderError::TeCanOnlyContainTrailers);
            }
        }

        let value = self.value.as_slice();
        if !value.is_empty() {
            let first = value[0];
            let last = value[value.len() - 1];
            if first == b' ' || first == b'\t' || last == b' ' || last == b'\t' {
                return Err(HeaderError::SurroundingWhitespaceInValue);
            }
        }

        Ok(())
    }
}

impl<N: Into<HeaderName>, V: Into<HeaderValue>> From<(N, V)> for Header {
    fn from(p: (N, V)) -> Header {
        Header::new(p.0, p.1)
    }
}

/// The `content-length` header of a message, as found by
/// `Headers::content_length`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) enum ContentLength {
    Absent,
    Valid(u64),
    Malformed,
}

/// HTTP message headers (or trailers)
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Headers {
    // Pseudo-headers stored before regular headers
    headers: Vec<Header>,
    pseudo_count: usize,
}

impl Headers {
    /// An empty header list.
    pub fn new() -> Headers {
        Default::default()
    }

    /// Builds a header list, moving pseudo-headers to the front the way
    /// 8.1.2.1 wants them sent.
    pub fn from_vec(mut headers: Vec<Header>) -> Headers {
        headers.sort_by_key(|h| !h.is_pseudo_header());
        let pseudo_count = headers.iter().take_while(|h| h.is_pseudo_header()).count();
        Headers {
            headers,
            pseudo_count,
        }
    }

    /// Builds a `Headers` keeping the wire order; any pseudo-header that
    /// follows a regular one is an error.
    pub(crate) fn from_vec_pseudo_first(headers: Vec<Header>) -> HeaderResult<Headers> {
        let mut saw_regular_header = false;
        let mut pseudo_count = 0;
        for header in &headers {
            if header.is_pseudo_header() {
                if saw_regular_header {
                    return Err(HeaderError::PseudoHeadersAfterRegularHeaders);
                }
                pseudo_count += 1;
            } else {
                saw_regular_header = true;
            }
        }
        Ok(Headers {
            headers,
            pseudo_count,
        })
    }

    /// All headers, pseudo-headers first.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn pseudo_headers(&self) -> &[Header] {
        &self.headers[..self.pseudo_count]
    }

    fn regular_headers(&self) -> &[Header] {
        &self.headers[self.pseudo_count..]
    }

    /// Every header on its own line, for diagnostics.
    pub fn dump(&self) -> String {
        let mut r = String::new();
        for h in &self.headers {
            r.push_str(&h.format());
            r.push('\n');
        }
        r
    }

    /// A minimal GET request for the given path.
    pub fn new_get(path: impl Into<HeaderValue>) -> Headers {
        Headers::from_vec(vec![
            Header::new(PseudoHeaderName::Method, "GET"),
            Header::new(PseudoHeaderName::Scheme, "http"),
            Header::new(PseudoHeaderName::Path, path.into()),
        ])
    }

    /// A response carrying just `:status`.
    pub fn new_status(code: u32) -> Headers {
        Headers::from_vec(vec![Header::new(
            PseudoHeaderName::Status,
            format!("{}", code),
        )])
    }

    /// `:status 200`.
    pub fn ok_200() -> Headers {
        Headers::new_status(200)
    }

    /// Validates the whole header list for the given message direction
    /// and position in the stream.
    pub(crate) fn validate(
        &self,
        req_or_resp: RequestOrResponse,
        headers_place: HeadersPlace,
    ) -> HeaderResult<()> {
        let mut pseudo_headers_met = PseudoHeaderNameSet::new();

        for header in self.pseudo_headers() {
            debug_assert!(header.is_pseudo_header());

            if headers_place == HeadersPlace::Trailing {
                return Err(HeaderError::PseudoHeadersInTrailers);
            }

            header.validate(req_or_resp)?;

            let header_name = match header.pseudo_header_name() {
                Some(n) => n,
                None => return Err(HeaderError::UnknownPseudoHeader),
            };

            if !pseudo_headers_met.insert(header_name) {
                return Err(HeaderError::MoreThanOnePseudoHeader(header_name));
            }

            if header_name == PseudoHeaderName::Path && header.value.as_slice().is_empty() {
                return Err(HeaderError::EmptyValue(header_name));
            }
        }

        for header in self.regular_headers() {
            debug_assert!(!header.is_pseudo_header());
            header.validate(req_or_resp)?;
        }

        if headers_place == HeadersPlace::Initial {
            // The mandatory pseudo-header sets of 8.1.2.3 (requests;
            // `:authority` stays optional) and 8.1.2.4 (responses).
            let required_headers = match req_or_resp {
                RequestOrResponse::Request => &[
                    PseudoHeaderName::Method,
                    PseudoHeaderName::Scheme,
                    PseudoHeaderName::Path,
                ][..],
                RequestOrResponse::Response => &[PseudoHeaderName::Status][..],
            };

            for &required in required_headers {
                if !pseudo_headers_met.contains(required) {
                    return Err(HeaderError::MissingPseudoHeader(required));
                }
            }

            // `host` is only acceptable as a fallback spelling of the
            // authority; without `:authority` it acts as a
            // connection-specific header.
            if req_or_resp == RequestOrResponse::Request
                && self.get_opt_bytes("host").is_some()
                && !pseudo_headers_met.contains(PseudoHeaderName::Authority)
            {
                return Err(HeaderError::ConnectionSpecificHeader("host"));
            }
        }

        Ok(())
    }

    pub fn get_opt_bytes<'a>(&'a self, name: &str) -> Option<&'a [u8]> {
        let headers = if name.starts_with(':') {
            self.pseudo_headers()
        } else {
            self.regular_headers()
        };
        headers.iter().find(|h| h.name() == name).map(|h| h.value())
    }

    pub fn get_opt<'a>(&'a self, name: &str) -> Option<&'a str> {
        self.get_opt_bytes(name)
            .and_then(|v| str::from_utf8(v).ok())
    }

    pub fn get_opt_parse<I: FromStr>(&self, name: &str) -> Option<I> {
        self.get_opt(name).and_then(|h| h.parse().ok())
    }

    pub fn status(&self) -> Option<u32> {
        self.get_opt_parse(":status")
    }

    /// Whether the headers carry a 1xx informational status.
    pub(crate) fn is_informational(&self) -> bool {
        match self.get_opt(":status") {
            Some(s) => s.len() == 3 && s.starts_with('1'),
            None => false,
        }
    }

    pub(crate) fn authority(&self) -> Option<Bytes> {
        self.get_opt_bytes(":authority")
            .map(Bytes::copy_from_slice)
    }

    pub(crate) fn content_length(&self) -> ContentLength {
        let value = match self.get_opt_bytes("content-length") {
            Some(v) => v,
            None => return ContentLength::Absent,
        };
        if value.is_empty() || !value.iter().all(|b| b.is_ascii_digit()) {
            return ContentLength::Malformed;
        }
        match str::from_utf8(value).ok().and_then(|v| v.parse().ok()) {
            Some(len) => ContentLength::Valid(len),
            None => ContentLength::Malformed,
        }
    }

    /// Appends a header, slotting pseudo-headers before the regular
    /// ones.
    pub fn add(&mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) {
        self.add_header(Header::new(name, value));
    }

    pub fn add_header(&mut self, header: Header) {
        if header.is_pseudo_header() {
            let pseudo_count = self.pseudo_count;
            self.headers.insert(pseudo_count, header);
            self.pseudo_count += 1;
        } else {
            self.headers.push(header);
        }
    }

    /// Normalizes headers received from the peer: lowercases names and
    /// strips surrounding whitespace from values.
    pub(crate) fn normalize(&mut self) {
        for header in &mut self.headers {
            header.name.make_lowercase();
        }
        self.strip_value_whitespace();
    }

    /// Strips surrounding whitespace from all header values.
    pub(crate) fn strip_value_whitespace(&mut self) {
        for header in &mut self.headers {
            let value = header.value.as_slice();
            let start = value
                .iter()
                .position(|&b| b != b' ' && b != b'\t')
                .unwrap_or(value.len());
            let end = value
                .iter()
                .rposition(|&b| b != b' ' && b != b'\t')
                .map(|p| p + 1)
                .unwrap_or(start);
            if start != 0 || end != value.len() {
                header.value = HeaderValue::from(Bytes::copy_from_slice(&value[start..end]));
            }
        }
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<T: IntoIterator<Item = Header>>(iter: T) -> Headers {
        Headers::from_vec(iter.into_iter().collect())
    }
}
