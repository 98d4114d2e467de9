//! The module contains the implementation of the `PING` frame.

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::frame::flags::*;
use crate::solicit::frame::Frame;
use crate::solicit::frame::FrameHeader;
use crate::solicit::frame::FrameIR;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::RawFrame;
use crate::solicit::stream_id::StreamId;

/// The size of the `PING` frame payload.
pub const PING_FRAME_LEN: u32 = 8;
/// The frame type of the `PING` frame.
pub const PING_FRAME_TYPE: u8 = 0x6;

/// An enum representing the flags that a `PingFrame` can have.
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum PingFlag {
    Ack = 0x1,
}

impl Flag for PingFlag {
    #[inline]
    fn bitmask(&self) -> u8 {
        *self as u8
    }

    fn flags() -> &'static [Self] {
        static FLAGS: &[PingFlag] = &[PingFlag::Ack];
        FLAGS
    }
}

/// The struct represents the `PING` HTTP/2 frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PingFrame {
    opaque_data: [u8; 8],
    flags: Flags<PingFlag>,
}

impl PingFrame {
    /// Create a new PING frame with the given opaque data.
    pub fn new(opaque_data: [u8; 8]) -> PingFrame {
        PingFrame {
            opaque_data,
            flags: Flags::default(),
        }
    }

    /// Create a new PING ACK frame echoing the given opaque data.
    pub fn new_ack(opaque_data: [u8; 8]) -> PingFrame {
        PingFrame {
            opaque_data,
            flags: PingFlag::Ack.to_flags(),
        }
    }

    pub fn is_ack(&self) -> bool {
        self.flags.is_set(PingFlag::Ack)
    }

    pub fn opaque_data(&self) -> [u8; 8] {
        self.opaque_data
    }
}

impl Frame for PingFrame {
    type FlagType = PingFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<Self> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != PING_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if payload_len != PING_FRAME_LEN {
            return Err(ParseFrameError::IncorrectFrameLength(payload_len));
        }
        if stream_id != 0 {
            return Err(ParseFrameError::StreamIdMustBeZero(stream_id));
        }

        let mut opaque_data = [0; 8];
        opaque_data.copy_from_slice(&raw_frame.payload());

        Ok(PingFrame {
            opaque_data,
            flags: Flags::new(flags),
        })
    }

    fn flags(&self) -> Flags<PingFlag> {
        self.flags
    }

    fn get_stream_id(&self) -> StreamId {
        0
    }

    fn get_header(&self) -> FrameHeader {
        FrameHeader {
            payload_len: PING_FRAME_LEN,
            frame_type: PING_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: 0,
        }
    }
}

impl FrameIR for PingFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        b.extend_from_slice(&self.opaque_data);
    }
}
