//! Implements the `ALTSVC` frame from RFC 7838.

use bytes::Bytes;

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::frame::flags::*;
use crate::solicit::frame::Frame;
use crate::solicit::frame::FrameHeader;
use crate::solicit::frame::FrameIR;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::RawFrame;
use crate::solicit::stream_id::StreamId;

/// The frame type of the `ALTSVC` frame.
pub const ALTSVC_FRAME_TYPE: u8 = 0xa;

/// The struct represents the `ALTSVC` HTTP/2 frame.
///
/// The payload is an origin length, the origin itself, and the
/// "Alternative Service Field Value" (RFC 7838, section 4), which the
/// engine carries opaquely.
#[derive(Clone, Debug, PartialEq)]
pub struct AltsvcFrame {
    pub stream_id: StreamId,
    pub origin: Bytes,
    pub field_value: Bytes,
    flags: Flags<NoFlag>,
}

impl AltsvcFrame {
    pub fn new(stream_id: StreamId, origin: Bytes, field_value: Bytes) -> AltsvcFrame {
        AltsvcFrame {
            stream_id,
            origin,
            field_value,
            flags: Flags::default(),
        }
    }

    fn payload_len(&self) -> u32 {
        2 + self.origin.len() as u32 + self.field_value.len() as u32
    }
}

impl Frame for AltsvcFrame {
    type FlagType = NoFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<Self> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != ALTSVC_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if payload_len < 2 {
            return Err(ParseFrameError::IncorrectFrameLength(payload_len));
        }

        let payload = raw_frame.payload();
        let origin_len = (((payload[0] as u16) << 8) | payload[1] as u16) as usize;
        if payload.len() - 2 < origin_len {
            return Err(ParseFrameError::IncorrectFrameLength(payload_len));
        }

        Ok(AltsvcFrame {
            stream_id,
            origin: payload.slice(2..2 + origin_len),
            field_value: payload.slice(2 + origin_len..),
            flags: Flags::new(flags),
        })
    }

    fn flags(&self) -> Flags<NoFlag> {
        self.flags
    }

    fn get_stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn get_header(&self) -> FrameHeader {
        FrameHeader {
            payload_len: self.payload_len(),
            frame_type: ALTSVC_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: self.stream_id,
        }
    }
}

impl FrameIR for AltsvcFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        let origin_len = self.origin.len() as u16;
        b.extend_from_slice(&origin_len.to_be_bytes());
        b.extend_from_bytes(self.origin);
        b.extend_from_bytes(self.field_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solicit::frame::tests_common::raw_frame_from_parts;

    #[test]
    fn test_parse_with_origin() {
        let mut payload = vec![0, 11];
        payload.extend(b"example.com".iter());
        payload.extend(b"h2=\":8000\"".iter());
        let raw = raw_frame_from_parts(
            FrameHeader::new(payload.len() as u32, 0xa, 0, 0),
            payload,
        );
        let frame = AltsvcFrame::from_raw(&raw).unwrap();

        assert_eq!(&frame.origin[..], b"example.com");
        assert_eq!(&frame.field_value[..], b"h2=\":8000\"");
    }

    #[test]
    fn test_parse_origin_len_overruns_payload() {
        let payload = vec![0, 20, b'x'];
        let raw = raw_frame_from_parts(
            FrameHeader::new(payload.len() as u32, 0xa, 0, 0),
            payload,
        );
        assert!(AltsvcFrame::from_raw(&raw).is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let frame = AltsvcFrame::new(
            0,
            Bytes::from_static(b"example.com"),
            Bytes::from_static(b"h2=\":8000\""),
        );
        let raw = RawFrame::parse(frame.clone().serialize_into_vec()).unwrap();
        assert_eq!(frame, AltsvcFrame::from_raw(&raw).unwrap());
    }
}
