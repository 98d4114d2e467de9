#![allow(dead_code)]

use std::fmt;
use std::ops;
use std::str;

use bytes::Bytes;

#[derive(Debug)]
pub struct AsciiError(());

/// `Bytes` whose content is known to be ASCII, which makes `&str` views
/// free. Header names are stored this way so that the string accessors
/// never have to re-validate.
#[derive(Eq, PartialEq, Hash, Clone)]
pub struct Ascii(Bytes);

impl Ascii {
    pub fn new() -> Ascii {
        Ascii(Bytes::new())
    }

    pub fn from_bytes(bs: Bytes) -> Result<Ascii, (AsciiError, Bytes)> {
        match bs.iter().all(|b| b.is_ascii()) {
            true => Ok(Ascii(bs)),
            false => Err((AsciiError(()), bs)),
        }
    }

    /// The caller must guarantee that the bytes are ASCII.
    pub const unsafe fn from_bytes_unchecked(bs: Bytes) -> Ascii {
        Ascii(bs)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // ASCII is a subset of UTF-8, and the invariant is checked on
        // construction.
        unsafe { str::from_utf8_unchecked(self.0.as_ref()) }
    }
}

impl ops::Deref for Ascii {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Ascii {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Ascii {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

#[cfg(test)]
mod test {
    use super::Ascii;
    use bytes::Bytes;

    #[test]
    fn rejects_non_ascii() {
        assert!(Ascii::from_bytes(Bytes::from_static("ю".as_bytes())).is_err());
        assert!(Ascii::from_bytes(Bytes::from_static(b"plain")).is_ok());
    }
}
