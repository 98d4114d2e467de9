/// An alias for the type that represents the ID of an HTTP/2 stream.
pub type StreamId = u32;

/// The largest stream id either peer can ever use: stream ids are
/// unsigned 31-bit integers.
pub const MAX_STREAM_ID: StreamId = 0x7fff_ffff;
