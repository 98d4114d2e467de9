//! The module contains the implementation of the `GOAWAY` frame.

use bytes::Bytes;

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::error_code::ErrorCode;
use crate::solicit::frame::flags::*;
use crate::solicit::frame::parse_stream_id;
use crate::solicit::frame::Frame;
use crate::solicit::frame::FrameHeader;
use crate::solicit::frame::FrameIR;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::RawFrame;
use crate::solicit::stream_id::StreamId;

/// The frame type of the `GOAWAY` frame.
pub const GOAWAY_FRAME_TYPE: u8 = 0x7;

/// The struct represents the `GOAWAY` HTTP/2 frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GoawayFrame {
    /// The id of the last stream the sender of the frame processed (or will
    /// process).
    pub last_stream_id: StreamId,
    /// The error code of the frame.
    raw_error_code: u32,
    /// Additional debug data, opaque to the protocol.
    pub debug_data: Bytes,
    flags: Flags<NoFlag>,
}

impl GoawayFrame {
    /// Create a new `GOAWAY` frame with the given error code and no debug data.
    pub fn new(last_stream_id: StreamId, error_code: ErrorCode) -> GoawayFrame {
        GoawayFrame {
            last_stream_id,
            raw_error_code: error_code.into(),
            debug_data: Bytes::new(),
            flags: Flags::default(),
        }
    }

    /// Create a new `GOAWAY` frame with the given parts.
    pub fn with_debug_data(
        last_stream_id: StreamId,
        error_code: ErrorCode,
        debug_data: Bytes,
    ) -> GoawayFrame {
        GoawayFrame {
            last_stream_id,
            raw_error_code: error_code.into(),
            debug_data,
            flags: Flags::default(),
        }
    }

    /// Returns the interpreted error code of the frame. Any unknown error
    /// codes are mapped into the `InternalError` variant.
    pub fn error_code(&self) -> ErrorCode {
        self.raw_error_code.into()
    }

    /// Returns the original raw error code of the frame.
    pub fn raw_error_code(&self) -> u32 {
        self.raw_error_code
    }

    fn payload_len(&self) -> u32 {
        8 + self.debug_data.len() as u32
    }
}

impl Frame for GoawayFrame {
    type FlagType = NoFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<Self> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != GOAWAY_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if payload_len < 8 {
            return Err(ParseFrameError::IncorrectFrameLength(payload_len));
        }
        if stream_id != 0 {
            return Err(ParseFrameError::StreamIdMustBeZero(stream_id));
        }

        let payload = raw_frame.payload();
        let last_stream_id = parse_stream_id(&payload);
        let raw_error_code = unpack_octets_4!(payload, 4, u32);

        Ok(GoawayFrame {
            last_stream_id,
            raw_error_code,
            debug_data: payload.slice(8..),
            flags: Flags::new(flags),
        })
    }

    fn flags(&self) -> Flags<NoFlag> {
        self.flags
    }

    fn get_stream_id(&self) -> StreamId {
        0
    }

    fn get_header(&self) -> FrameHeader {
        FrameHeader {
            payload_len: self.payload_len(),
            frame_type: GOAWAY_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: 0,
        }
    }
}

impl FrameIR for GoawayFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        b.write_u32(self.last_stream_id);
        b.write_u32(self.raw_error_code);
        b.extend_from_bytes(self.debug_data);
    }
}
