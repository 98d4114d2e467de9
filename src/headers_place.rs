/// Where a header block sits within its message.
///
/// HTTP/2 gives a header block exactly two legal positions (8.1): the
/// block that opens the request or response, and an optional trailing
/// block after the body, which must end the stream. The position decides
/// which validation rules apply — trailers, for one, may not carry
/// pseudo-headers.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum HeadersPlace {
    /// The request or response headers (informational responses
    /// included).
    Initial,
    /// Trailers.
    Trailing,
}
