use std::fmt;

use bytes::Bytes;
use bytes::BytesMut;

use crate::ascii::Ascii;
use crate::req_resp::RequestOrResponse;
use crate::solicit::header::HeaderError;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum PseudoHeaderName {
    // 8.1.2.3 Request Pseudo-Header Fields
    Method = 0,
    Scheme = 1,
    Authority = 2,
    Path = 3,

    // 8.1.2.4 Response Pseudo-Header Fields
    Status = 4,
}

impl PseudoHeaderName {
    pub fn name(&self) -> &'static str {
        match *self {
            PseudoHeaderName::Method => ":method",
            PseudoHeaderName::Scheme => ":scheme",
            PseudoHeaderName::Authority => ":authority",
            PseudoHeaderName::Path => ":path",
            PseudoHeaderName::Status => ":status",
        }
    }

    pub fn parse(value: &[u8]) -> Option<PseudoHeaderName> {
        match value {
            b":method" => Some(PseudoHeaderName::Method),
            b":scheme" => Some(PseudoHeaderName::Scheme),
            b":authority" => Some(PseudoHeaderName::Authority),
            b":path" => Some(PseudoHeaderName::Path),
            b":status" => Some(PseudoHeaderName::Status),
            _ => None,
        }
    }

    pub fn req_or_resp(&self) -> RequestOrResponse {
        match *self {
            PseudoHeaderName::Method
            | PseudoHeaderName::Scheme
            | PseudoHeaderName::Authority
            | PseudoHeaderName::Path => RequestOrResponse::Request,
            PseudoHeaderName::Status => RequestOrResponse::Response,
        }
    }
}

impl fmt::Display for PseudoHeaderName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.name(), f)
    }
}

/// A tiny set of pseudo-header names, one bit per variant. Used to
/// catch duplicates while walking a header list.
#[derive(Default)]
pub(crate) struct PseudoHeaderNameSet {
    headers_mask: u32,
}

impl PseudoHeaderNameSet {
    pub fn new() -> PseudoHeaderNameSet {
        Default::default()
    }

    pub fn insert(&mut self, value: PseudoHeaderName) -> bool {
        let contains = self.contains(value);
        self.headers_mask |= 1 << (value as u32);
        !contains
    }

    pub fn contains(&self, value: PseudoHeaderName) -> bool {
        self.headers_mask & (1 << (value as u32)) != 0
    }
}

#[derive(Eq, PartialEq, Hash, Clone)]
enum HeaderNameEnum {
    Pseudo(PseudoHeaderName),
    /// Any other name, including unknown ':'-prefixed ones, which only
    /// full validation rejects.
    Regular(Ascii),
}

impl fmt::Display for HeaderNameEnum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HeaderNameEnum::Pseudo(p) => fmt::Display::fmt(p, f),
            HeaderNameEnum::Regular(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// Representation of a header name.
///
/// The contained value is guaranteed to be non-empty ASCII without
/// control characters. Everything beyond that structural minimum
/// (lowercase requirement, the closed pseudo-header set, connection
/// headers) is checked by `Headers::validate`, so that relaxed
/// configurations can carry names the RFC forbids.
#[derive(Eq, PartialEq, Hash, Clone)]
pub struct HeaderName(HeaderNameEnum);

impl From<PseudoHeaderName> for HeaderName {
    fn from(p: PseudoHeaderName) -> Self {
        HeaderName(HeaderNameEnum::Pseudo(p))
    }
}

impl<'a> From<&'a str> for HeaderName {
    fn from(s: &'a str) -> Self {
        HeaderName::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl<'a> From<&'a [u8]> for HeaderName {
    fn from(s: &'a [u8]) -> Self {
        HeaderName::new(Bytes::copy_from_slice(s))
    }
}

impl From<String> for HeaderName {
    fn from(s: String) -> Self {
        HeaderName::new(s)
    }
}

impl From<Vec<u8>> for HeaderName {
    fn from(s: Vec<u8>) -> Self {
        HeaderName::new(s)
    }
}

impl From<Bytes> for HeaderName {
    fn from(s: Bytes) -> Self {
        HeaderName::new(s)
    }
}

impl HeaderName {
    /// Construct a pseudo header name.
    pub fn pseudo(name: PseudoHeaderName) -> HeaderName {
        HeaderName(HeaderNameEnum::Pseudo(name))
    }

    /// Construct a header name from a string.
    ///
    /// The name is converted to lower case.
    ///
    /// # Panics
    ///
    /// Panics on a structurally invalid header name.
    pub fn new(name: impl Into<Bytes>) -> HeaderName {
        let mut name = name.into();
        make_ascii_lowercase(&mut name);
        match HeaderName::from_wire(name) {
            Ok(h) => h,
            Err((e, name)) => panic!("incorrect header name: {:?}: {:?}", name, e),
        }
    }

    /// Construct a header name from bytes received from the peer.
    ///
    /// Only structural problems are errors here: an empty name, non-ASCII
    /// bytes, or control characters. An unknown ':'-prefixed name is kept
    /// as a regular name so that relaxed validation can pass it through.
    pub fn from_wire(name: Bytes) -> Result<HeaderName, (HeaderError, Bytes)> {
        if name.is_empty() {
            return Err((HeaderError::EmptyName, name));
        }
        for &b in &name {
            if !b.is_ascii() {
                return Err((HeaderError::HeaderNameNotAscii, name));
            }
            if b.is_ascii_control() {
                return Err((HeaderError::IncorrectCharInName, name));
            }
        }

        Ok(match PseudoHeaderName::parse(&name) {
            Some(pseudo) => HeaderName(HeaderNameEnum::Pseudo(pseudo)),
            // The loop above guarantees the bytes are ASCII.
            None => HeaderName(HeaderNameEnum::Regular(unsafe {
                Ascii::from_bytes_unchecked(name)
            })),
        })
    }

    /// Return a header name as a string.
    pub fn name(&self) -> &str {
        match &self.0 {
            HeaderNameEnum::Pseudo(p) => p.name(),
            HeaderNameEnum::Regular(r) => r.as_str(),
        }
    }

    /// If header name is a pseudo header name.
    ///
    /// Unknown ':'-prefixed names count as pseudo headers for ordering
    /// purposes, even though validation rejects them.
    pub fn is_pseudo(&self) -> bool {
        match &self.0 {
            HeaderNameEnum::Pseudo(_) => true,
            HeaderNameEnum::Regular(r) => r.as_bytes().first() == Some(&b':'),
        }
    }

    /// Obtain pseudo header name from this header name.
    pub fn pseudo_header_name(&self) -> Option<PseudoHeaderName> {
        match self.0 {
            HeaderNameEnum::Pseudo(p) => Some(p),
            HeaderNameEnum::Regular(_) => None,
        }
    }

    /// Lowercases a regular name in place (pseudo names are lowercase by
    /// construction).
    pub(crate) fn make_lowercase(&mut self) {
        if let HeaderNameEnum::Regular(r) = &self.0 {
            if r.as_bytes().iter().any(|c| c.is_ascii_uppercase()) {
                let mut bytes = Bytes::copy_from_slice(r.as_bytes());
                make_ascii_lowercase(&mut bytes);
                // Lowercasing ASCII keeps it ASCII.
                self.0 = HeaderNameEnum::Regular(unsafe { Ascii::from_bytes_unchecked(bytes) });
            }
        }
    }
}

impl fmt::Debug for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HeaderName({:?})", self.name())
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

pub(crate) fn make_ascii_lowercase(bytes: &mut Bytes) {
    if bytes.iter().all(|c| !c.is_ascii_uppercase()) {
        return;
    }
    let mut bytes_mut = BytesMut::from(&bytes[..]);
    bytes_mut.as_mut().make_ascii_lowercase();
    *bytes = bytes_mut.freeze();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_name_new_to_lower() {
        assert_eq!("content-type", HeaderName::new("Content-Type").name());
    }

    #[test]
    fn header_name_pseudo() {
        assert_eq!(":method", HeaderName::pseudo(PseudoHeaderName::Method).name());
        assert!(HeaderName::new(":method").is_pseudo());
        assert_eq!(
            Some(PseudoHeaderName::Method),
            HeaderName::new(":method").pseudo_header_name()
        );
    }

    #[test]
    fn header_name_unknown_pseudo_kept() {
        let name = HeaderName::from_wire(Bytes::from_static(b":protocol")).unwrap();
        assert!(name.is_pseudo());
        assert_eq!(None, name.pseudo_header_name());
    }

    #[test]
    fn header_name_structural_errors() {
        assert!(HeaderName::from_wire(Bytes::new()).is_err());
        assert!(HeaderName::from_wire(Bytes::from_static(b"a\x01b")).is_err());
        assert!(HeaderName::from_wire(Bytes::from_static("ю".as_bytes())).is_err());
        // Uppercase is structurally fine; full validation rejects it.
        assert!(HeaderName::from_wire(Bytes::from_static(b"Content-Type")).is_ok());
    }
}
