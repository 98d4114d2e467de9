//! The module contains the implementation of HTTP/2 frames.

use bytes::Bytes;

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::error_code::ErrorCode;
use crate::solicit::stream_id::StreamId;

/// Reads 4 network-endian octets at `$offset` of `$buf` into the given
/// integer type.
macro_rules! unpack_octets_4 {
    ($buf:expr, $offset:expr, $tip:ty) => {
        (($buf[$offset + 0] as $tip) << 24)
            | (($buf[$offset + 1] as $tip) << 16)
            | (($buf[$offset + 2] as $tip) << 8)
            | (($buf[$offset + 3] as $tip) << 0)
    };
}

/// Reads a stream id: 31 bits, network endian, with the reserved high
/// bit dropped as 4.1 requires of receivers.
#[inline]
pub(crate) fn parse_stream_id(buf: &[u8]) -> u32 {
    unpack_octets_4!(buf, 0, u32) & !0x8000_0000
}

pub mod altsvc;
pub mod continuation;
pub mod data;
pub mod flags;
pub mod goaway;
pub mod headers;
pub mod ping;
pub mod priority;
pub mod push_promise;
pub mod rst_stream;
pub mod settings;
pub mod window_update;

pub use self::altsvc::AltsvcFrame;
pub use self::continuation::ContinuationFrame;
pub use self::data::{DataFlag, DataFrame};
pub use self::goaway::GoawayFrame;
pub use self::headers::{HeadersFlag, HeadersFrame};
pub use self::ping::PingFrame;
pub use self::priority::PriorityFrame;
pub use self::priority::StreamDependency;
pub use self::push_promise::{PushPromiseFlag, PushPromiseFrame};
pub use self::rst_stream::RstStreamFrame;
pub use self::settings::{HttpSetting, HttpSettings, SettingsFlag, SettingsFrame};
pub use self::window_update::WindowUpdateFrame;

use self::altsvc::ALTSVC_FRAME_TYPE;
use self::continuation::CONTINUATION_FRAME_TYPE;
use self::data::DATA_FRAME_TYPE;
use self::flags::Flag;
use self::flags::Flags;
use self::goaway::GOAWAY_FRAME_TYPE;
use self::headers::HEADERS_FRAME_TYPE;
use self::ping::PING_FRAME_TYPE;
use self::priority::PRIORITY_FRAME_TYPE;
use self::push_promise::PUSH_PROMISE_FRAME_TYPE;
use self::rst_stream::RST_STREAM_FRAME_TYPE;
use self::settings::SETTINGS_FRAME_TYPE;
use self::window_update::WINDOW_UPDATE_FRAME_TYPE;

pub const FRAME_HEADER_LEN: usize = 9;

/// The serialized form of a frame header is always exactly 9 bytes.
pub type FrameHeaderBuffer = [u8; FRAME_HEADER_LEN];

/// A frame header (4.1), split into its four fields: 24-bit payload
/// length, type octet, flags octet, and 31-bit stream id.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct FrameHeader {
    /// payload length
    pub payload_len: u32,
    pub frame_type: u8,
    pub flags: u8,
    pub stream_id: StreamId,
}

impl FrameHeader {
    pub fn new(payload_len: u32, frame_type: u8, flags: u8, stream_id: StreamId) -> FrameHeader {
        FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        }
    }
}

#[inline]
pub fn unpack_header_from_slice(header: &[u8]) -> FrameHeader {
    assert_eq!(FRAME_HEADER_LEN, header.len());

    let payload_len: u32 =
        ((header[0] as u32) << 16) | ((header[1] as u32) << 8) | (header[2] as u32);
    let frame_type = header[3];
    let flags = header[4];
    let stream_id = parse_stream_id(&header[5..]);

    FrameHeader {
        payload_len,
        frame_type,
        flags,
        stream_id,
    }
}

/// `unpack_header_from_slice` for callers that already hold the fixed
/// size buffer.
pub fn unpack_header(header: &FrameHeaderBuffer) -> FrameHeader {
    unpack_header_from_slice(header)
}

/// The 9-byte wire form of a frame header.
pub fn pack_header(header: &FrameHeader) -> FrameHeaderBuffer {
    let &FrameHeader {
        payload_len,
        frame_type,
        flags,
        stream_id,
    } = header;

    [
        (((payload_len >> 16) & 0x000000FF) as u8),
        (((payload_len >> 8) & 0x000000FF) as u8),
        (((payload_len) & 0x000000FF) as u8),
        frame_type,
        flags,
        (((stream_id >> 24) & 0x000000FF) as u8),
        (((stream_id >> 16) & 0x000000FF) as u8),
        (((stream_id >> 8) & 0x000000FF) as u8),
        (((stream_id) & 0x000000FF) as u8),
    ]
}

/// Strips padding from a payload whose frame had the PADDED flag set:
/// the first octet is the padding length, and that many zero octets
/// trail the real content.
///
/// Returns the content and the padding length. Padding that swallows
/// the whole payload (6.1: the padding length must be strictly less
/// than the remaining payload) is an error.
pub(crate) fn parse_padded_payload(payload: Bytes, flag: bool) -> ParseFrameResult<(Bytes, u8)> {
    if !flag {
        return Ok((payload, 0));
    }
    if payload.is_empty() {
        // The frame claims to be padded but has no room for even the
        // padding length octet.
        return Err(ParseFrameError::PaddingTooLarge);
    }
    let pad_len = payload[0] as usize;
    if pad_len >= payload.len() {
        // The padding length MUST be less than the total frame size.
        return Err(ParseFrameError::PaddingTooLarge);
    }

    Ok((payload.slice(1..payload.len() - pad_len), pad_len as u8))
}

/// Anything that can be written out as a whole frame. The engine queues
/// outbound frames by serializing them straight into its write buffer.
pub trait FrameIR: std::fmt::Debug {
    /// Appends the wire form of the frame to the buffer.
    fn serialize_into(self, builder: &mut WriteBuffer);

    fn serialize_into_vec(self) -> Vec<u8>
    where
        Self: Sized,
    {
        let mut builder = WriteBuffer::new();
        self.serialize_into(&mut builder);
        builder.take_all().to_vec()
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ParseFrameError {
    InternalError,
    BufMustBeAtLeast9Bytes(usize),
    IncorrectPayloadLen,
    StreamIdMustBeNonZero,
    StreamIdMustBeZero(StreamId),
    IncorrectFrameLength(u32),
    IncorrectSettingsPushValue(u32),
    IncorrectSettingsMaxFrameSize(u32),
    FrameTooLarge(u32),
    PaddingTooLarge,
    InvalidPreface,
}

impl ParseFrameError {
    /// The RFC 7540 error code the connection error caused by this parse
    /// failure carries.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ParseFrameError::IncorrectFrameLength(..) => ErrorCode::FrameSizeError,
            ParseFrameError::FrameTooLarge(..) => ErrorCode::FrameSizeError,
            ParseFrameError::IncorrectPayloadLen => ErrorCode::FrameSizeError,
            _ => ErrorCode::ProtocolError,
        }
    }
}

pub type ParseFrameResult<T> = Result<T, ParseFrameError>;

/// The interface every typed frame implements.
pub trait Frame: Sized {
    /// The flag set this frame type understands, so that a frame can
    /// only be asked about its own flags.
    type FlagType: Flag;

    /// Interprets a raw frame as this type, validating everything that
    /// can be judged without connection state.
    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<Self>;

    /// The frame's flags.
    fn flags(&self) -> Flags<Self::FlagType>;
    /// The stream the frame belongs to; zero for connection-level
    /// frames.
    fn get_stream_id(&self) -> StreamId;
    /// The header matching the frame's current content.
    fn get_header(&self) -> FrameHeader;
}

/// One frame exactly as it crossed the wire: 9 header bytes followed
/// by the payload, uninterpreted. Typed frames are built from this via
/// [`Frame::from_raw`]; until then nothing about the payload is
/// assumed.
#[derive(PartialEq, Debug, Clone)]
pub struct RawFrame {
    /// Header and payload, contiguous.
    pub raw_content: Bytes,
}

impl RawFrame {
    /// Takes one whole frame off the front of the buffer. Fails when
    /// the buffer holds less than the header, or less payload than the
    /// header announces.
    pub fn parse<B: Into<Bytes>>(into_buf: B) -> ParseFrameResult<RawFrame> {
        let buf = into_buf.into();

        if buf.len() < FRAME_HEADER_LEN {
            return Err(ParseFrameError::BufMustBeAtLeast9Bytes(buf.len()));
        }

        let header = unpack_header_from_slice(&buf[..FRAME_HEADER_LEN]);

        let payload_len = header.payload_len as usize;
        if buf.len() - FRAME_HEADER_LEN < payload_len {
            return Err(ParseFrameError::IncorrectPayloadLen);
        }

        Ok(RawFrame {
            raw_content: buf.slice(..FRAME_HEADER_LEN + payload_len),
        })
    }

    pub fn frame_type(&self) -> u8 {
        self.raw_content[3]
    }

    /// Total size on the wire, header included.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw_content.len()
    }

    /// The parsed frame header.
    pub fn header(&self) -> FrameHeader {
        unpack_header_from_slice(&self.raw_content[..FRAME_HEADER_LEN])
    }

    pub fn get_stream_id(&self) -> StreamId {
        self.header().stream_id
    }

    /// Everything after the 9 header bytes.
    pub fn payload(&self) -> Bytes {
        self.raw_content.slice(FRAME_HEADER_LEN..)
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        self.raw_content.as_ref()
    }
}

/// Unchecked: the bytes are not required to form a valid frame.
impl From<Vec<u8>> for RawFrame {
    fn from(raw: Vec<u8>) -> RawFrame {
        RawFrame {
            raw_content: Bytes::from(raw),
        }
    }
}

impl<'a> From<&'a [u8]> for RawFrame {
    fn from(raw: &'a [u8]) -> RawFrame {
        RawFrame {
            raw_content: Bytes::copy_from_slice(raw),
        }
    }
}

impl FrameIR for RawFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.extend_from_bytes(self.raw_content);
    }
}

/// A frame of any type the engine knows, parsed; frames of unknown
/// types stay raw so the connection can ignore them as 4.1 requires.
#[derive(PartialEq, Debug, Clone)]
pub enum HttpFrame {
    Data(DataFrame),
    Headers(HeadersFrame),
    Priority(PriorityFrame),
    RstStream(RstStreamFrame),
    Settings(SettingsFrame),
    PushPromise(PushPromiseFrame),
    Ping(PingFrame),
    Goaway(GoawayFrame),
    WindowUpdate(WindowUpdateFrame),
    Continuation(ContinuationFrame),
    Altsvc(AltsvcFrame),
    Unknown(RawFrame),
}

impl HttpFrame {
    pub fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<HttpFrame> {
        let frame = match raw_frame.header().frame_type {
            DATA_FRAME_TYPE => HttpFrame::Data(HttpFrame::parse_frame(raw_frame)?),
            HEADERS_FRAME_TYPE => HttpFrame::Headers(HttpFrame::parse_frame(raw_frame)?),
            PRIORITY_FRAME_TYPE => HttpFrame::Priority(HttpFrame::parse_frame(raw_frame)?),
            RST_STREAM_FRAME_TYPE => HttpFrame::RstStream(HttpFrame::parse_frame(raw_frame)?),
            SETTINGS_FRAME_TYPE => HttpFrame::Settings(HttpFrame::parse_frame(raw_frame)?),
            PUSH_PROMISE_FRAME_TYPE => HttpFrame::PushPromise(HttpFrame::parse_frame(raw_frame)?),
            PING_FRAME_TYPE => HttpFrame::Ping(HttpFrame::parse_frame(raw_frame)?),
            GOAWAY_FRAME_TYPE => HttpFrame::Goaway(HttpFrame::parse_frame(raw_frame)?),
            WINDOW_UPDATE_FRAME_TYPE => HttpFrame::WindowUpdate(HttpFrame::parse_frame(raw_frame)?),
            CONTINUATION_FRAME_TYPE => HttpFrame::Continuation(HttpFrame::parse_frame(raw_frame)?),
            ALTSVC_FRAME_TYPE => HttpFrame::Altsvc(HttpFrame::parse_frame(raw_frame)?),
            _ => HttpFrame::Unknown(raw_frame.clone()),
        };

        Ok(frame)
    }

    #[inline]
    fn parse_frame<F: Frame>(raw_frame: &RawFrame) -> ParseFrameResult<F> {
        Frame::from_raw(raw_frame)
    }

    /// The stream the frame belongs to; zero for connection-level
    /// frames.
    pub fn get_stream_id(&self) -> StreamId {
        match self {
            HttpFrame::Data(f) => f.get_stream_id(),
            HttpFrame::Headers(f) => f.get_stream_id(),
            HttpFrame::Priority(f) => f.get_stream_id(),
            HttpFrame::RstStream(f) => f.get_stream_id(),
            HttpFrame::Settings(f) => f.get_stream_id(),
            HttpFrame::PushPromise(f) => f.get_stream_id(),
            HttpFrame::Ping(f) => f.get_stream_id(),
            HttpFrame::Goaway(f) => f.get_stream_id(),
            HttpFrame::WindowUpdate(f) => f.get_stream_id(),
            HttpFrame::Continuation(f) => f.get_stream_id(),
            HttpFrame::Altsvc(f) => f.get_stream_id(),
            HttpFrame::Unknown(f) => f.get_stream_id(),
        }
    }
}

impl FrameIR for HttpFrame {
    fn serialize_into(self, builder: &mut WriteBuffer) {
        match self {
            HttpFrame::Data(f) => f.serialize_into(builder),
            HttpFrame::Headers(f) => f.serialize_into(builder),
            HttpFrame::Priority(f) => f.serialize_into(builder),
            HttpFrame::RstStream(f) => f.serialize_into(builder),
            HttpFrame::Settings(f) => f.serialize_into(builder),
            HttpFrame::PushPromise(f) => f.serialize_into(builder),
            HttpFrame::Ping(f) => f.serialize_into(builder),
            HttpFrame::Goaway(f) => f.serialize_into(builder),
            HttpFrame::WindowUpdate(f) => f.serialize_into(builder),
            HttpFrame::Continuation(f) => f.serialize_into(builder),
            HttpFrame::Altsvc(f) => f.serialize_into(builder),
            HttpFrame::Unknown(f) => f.serialize_into(builder),
        }
    }
}

#[cfg(test)]
pub mod tests_common {
    use super::*;

    /// Glues a header and payload into a `RawFrame`, so tests can build
    /// frames the typed constructors refuse to.
    pub fn raw_frame_from_parts(header: FrameHeader, payload: Vec<u8>) -> RawFrame {
        let mut buf = Vec::new();
        buf.extend(pack_header(&header).iter());
        buf.extend(payload);
        buf.into()
    }

    /// Splits a buffer of serialized frames back into frames.
    pub fn unpack_frames(mut raw: &[u8]) -> Vec<HttpFrame> {
        let mut r = Vec::new();
        while !raw.is_empty() {
            let raw_frame = RawFrame::parse(raw.to_vec()).unwrap();
            raw = &raw[raw_frame.len()..];
            r.push(HttpFrame::from_raw(&raw_frame).unwrap());
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_header() {
        {
            let header = [0, 0, 1, 2, 3, 0, 0, 0, 4];
            assert_eq!(
                FrameHeader {
                    payload_len: 1,
                    frame_type: 2,
                    flags: 3,
                    stream_id: 4
                },
                unpack_header(&header)
            );
        }
        {
            let header = [0, 1, 0, 0, 0, 0, 0, 0, 0];
            assert_eq!(
                FrameHeader {
                    payload_len: 256,
                    frame_type: 0,
                    flags: 0,
                    stream_id: 0
                },
                unpack_header(&header)
            );
        }
        {
            let header = [0xFF, 0xFF, 0xFF, 0, 0, 1, 1, 1, 1];
            assert_eq!(
                FrameHeader {
                    payload_len: (1 << 24) - 1,
                    frame_type: 0,
                    flags: 0,
                    stream_id: 1 + (1 << 8) + (1 << 16) + (1 << 24)
                },
                unpack_header(&header)
            );
        }
        {
            // Ignores reserved bit within the stream id (the most significant bit)
            let header = [0, 0, 1, 0, 0, 0x80, 0, 0, 1];
            assert_eq!(
                FrameHeader {
                    payload_len: 1,
                    frame_type: 0,
                    flags: 0,
                    stream_id: 1
                },
                unpack_header(&header)
            );
        }
    }

    #[test]
    fn test_pack_header() {
        {
            let header = [0; 9];
            assert_eq!(pack_header(&FrameHeader::new(0, 0, 0, 0)), header);
        }
        {
            let header = [0, 0, 1, 2, 3, 0, 0, 0, 4];
            assert_eq!(pack_header(&FrameHeader::new(1, 2, 3, 4)), header);
        }
        {
            let header = [0, 1, 0, 0, 0, 0, 0, 0, 0];
            assert_eq!(pack_header(&FrameHeader::new(256, 0, 0, 0)), header);
        }
        {
            let header = [0xFF, 0xFF, 0xFF, 0, 0, 1, 1, 1, 1];
            let header_components =
                FrameHeader::new((1 << 24) - 1, 0, 0, 1 + (1 << 8) + (1 << 16) + (1 << 24));
            assert_eq!(pack_header(&header_components), header);
        }
    }

    #[test]
    fn test_parse_padded_payload_rejects_overlong_padding() {
        use bytes::Bytes;
        // Padding length equal to the remaining payload size.
        let payload = Bytes::from_static(&[4, 1, 2, 3, 4]);
        assert_eq!(
            Err(ParseFrameError::PaddingTooLarge),
            parse_padded_payload(payload, true)
        );
    }

    #[test]
    fn test_raw_frame_roundtrip() {
        let data = b"123";
        let header = FrameHeader::new(data.len() as u32, 0x1, 0, 1);
        let mut buf = Vec::new();
        buf.extend(pack_header(&header).iter());
        buf.extend(data.iter());

        let raw = RawFrame::parse(buf.clone()).unwrap();
        assert_eq!(header, raw.header());
        assert_eq!(&data[..], raw.payload());
        assert_eq!(buf, raw.serialize_into_vec());
    }
}
