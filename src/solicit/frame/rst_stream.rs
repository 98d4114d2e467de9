//! The module contains the implementation of the `RST_STREAM` frame.

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::error_code::ErrorCode;
use crate::solicit::frame::flags::*;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::{Frame, FrameHeader, FrameIR, RawFrame};
use crate::solicit::stream_id::StreamId;

/// The total allowed size for the `RST_STREAM` frame payload.
pub const RST_STREAM_FRAME_LEN: u32 = 4;
/// The frame type of the `RST_STREAM` frame.
pub const RST_STREAM_FRAME_TYPE: u8 = 0x3;

/// The RST_STREAM frame (6.4): immediate termination of one stream,
/// carrying the error code that explains why.
#[derive(Clone, Debug, PartialEq)]
pub struct RstStreamFrame {
    raw_error_code: u32,
    pub stream_id: StreamId,
    flags: Flags<NoFlag>,
}

impl RstStreamFrame {
    /// A frame carrying the given error code.
    pub fn new(stream_id: StreamId, error_code: ErrorCode) -> RstStreamFrame {
        RstStreamFrame {
            raw_error_code: error_code.into(),
            stream_id,
            flags: Flags::default(),
        }
    }

    /// A frame carrying an arbitrary raw code, including ones this
    /// crate does not know.
    pub fn with_raw_error_code(stream_id: StreamId, raw_error_code: u32) -> RstStreamFrame {
        RstStreamFrame {
            raw_error_code,
            stream_id,
            flags: Flags::default(),
        }
    }

    /// The error code, with unknown wire values collapsed to
    /// INTERNAL_ERROR as section 7 allows.
    pub fn error_code(&self) -> ErrorCode {
        self.raw_error_code.into()
    }

    /// The code exactly as received, unknown values preserved.
    pub fn raw_error_code(&self) -> u32 {
        self.raw_error_code
    }
}

impl Frame for RstStreamFrame {
    type FlagType = NoFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<Self> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != RST_STREAM_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if payload_len != RST_STREAM_FRAME_LEN {
            return Err(ParseFrameError::IncorrectFrameLength(payload_len));
        }
        if stream_id == 0x0 {
            return Err(ParseFrameError::StreamIdMustBeNonZero);
        }

        let error = unpack_octets_4!(raw_frame.payload(), 0, u32);

        Ok(RstStreamFrame {
            raw_error_code: error,
            stream_id,
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
            payload_len: RST_STREAM_FRAME_LEN,
            frame_type: RST_STREAM_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: self.stream_id,
        }
    }
}

impl FrameIR for RstStreamFrame {
    fn serialize_into(self, builder: &mut WriteBuffer) {
        builder.write_header(self.get_header());
        builder.write_u32(self.raw_error_code);
    }
}

#[cfg(test)]
mod tests {
    use super::RstStreamFrame;

    use crate::solicit::error_code::ErrorCode;
    use crate::solicit::frame::tests_common::raw_frame_from_parts;
    use crate::solicit::frame::FrameIR;
    use crate::solicit::frame::{Frame, FrameHeader};

    #[test]
    fn test_parse_valid() {
        let raw = raw_frame_from_parts(FrameHeader::new(4, 0x3, 0, 1), vec![0, 0, 0, 1]);
        let rst = RstStreamFrame::from_raw(&raw).expect("Valid frame expected");
        assert_eq!(rst.error_code(), ErrorCode::ProtocolError);
        assert_eq!(rst.get_stream_id(), 1);
    }

    #[test]
    fn test_parse_unknown_error_code() {
        let raw = raw_frame_from_parts(FrameHeader::new(4, 0x3, 0, 1), vec![1, 0, 0, 1]);
        let rst = RstStreamFrame::from_raw(&raw).expect("Valid frame expected");
        // The typed accessor collapses unknown codes, the raw one keeps
        // them.
        assert_eq!(rst.error_code(), ErrorCode::InternalError);
        assert_eq!(rst.raw_error_code(), 0x01000001);
    }

    #[test]
    fn test_parse_invalid_stream_id() {
        let raw = raw_frame_from_parts(FrameHeader::new(4, 0x3, 0x80, 0), vec![0, 0, 0, 1]);
        assert!(RstStreamFrame::from_raw(&raw).is_err());
    }

    #[test]
    fn test_parse_invalid_payload_size() {
        let raw = raw_frame_from_parts(FrameHeader::new(5, 0x3, 0x00, 2), vec![0, 0, 0, 1, 0]);
        assert!(RstStreamFrame::from_raw(&raw).is_err());
    }

    #[test]
    fn test_serialize_protocol_error() {
        let frame = RstStreamFrame::new(1, ErrorCode::ProtocolError);
        let raw = frame.serialize_into_vec();
        assert_eq!(
            raw,
            raw_frame_from_parts(FrameHeader::new(4, 0x3, 0, 1), vec![0, 0, 0, 1]).as_ref()
        );
    }

    #[test]
    fn test_serialize_raw_error_code() {
        let frame = RstStreamFrame::with_raw_error_code(3, 1024);
        let raw = frame.serialize_into_vec();
        assert_eq!(
            raw,
            raw_frame_from_parts(FrameHeader::new(4, 0x3, 0, 3), vec![0, 0, 0x04, 0]).as_ref()
        );
    }
}
