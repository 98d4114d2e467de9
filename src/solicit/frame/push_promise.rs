//! The module contains the implementation of the `PUSH_PROMISE` frame.

use bytes::Bytes;

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::frame::flags::*;
use crate::solicit::frame::parse_padded_payload;
use crate::solicit::frame::parse_stream_id;
use crate::solicit::frame::Frame;
use crate::solicit::frame::FrameHeader;
use crate::solicit::frame::FrameIR;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::RawFrame;
use crate::solicit::stream_id::StreamId;

pub const PUSH_PROMISE_FRAME_TYPE: u8 = 0x5;

/// An enum representing the flags that a `PushPromiseFrame` can have.
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum PushPromiseFlag {
    EndHeaders = 0x4,
    Padded = 0x8,
}

impl Flag for PushPromiseFlag {
    #[inline]
    fn bitmask(&self) -> u8 {
        *self as u8
    }

    fn flags() -> &'static [Self] {
        static FLAGS: &[PushPromiseFlag] = &[PushPromiseFlag::EndHeaders, PushPromiseFlag::Padded];
        FLAGS
    }
}

/// The struct represents the `PUSH_PROMISE` HTTP/2 frame, defined in the
/// HTTP/2 spec, section 6.6.
#[derive(PartialEq, Debug, Clone)]
pub struct PushPromiseFrame {
    /// The ID of the stream the frame is associated with.
    pub stream_id: StreamId,
    /// The ID of the stream the sender reserves.
    pub promised_stream_id: StreamId,
    /// The header fragment bytes stored within the frame.
    pub header_fragment: Bytes,
    /// The length of the padding, if any.
    padding_len: u8,
    flags: Flags<PushPromiseFlag>,
}

impl PushPromiseFrame {
    pub fn new<B: Into<Bytes>>(
        stream_id: StreamId,
        promised_stream_id: StreamId,
        fragment: B,
    ) -> PushPromiseFrame {
        PushPromiseFrame {
            stream_id,
            promised_stream_id,
            header_fragment: fragment.into(),
            padding_len: 0,
            flags: Flags::default(),
        }
    }

    /// Returns whether this frame ends the header block.
    pub fn is_headers_end(&self) -> bool {
        self.flags.is_set(PushPromiseFlag::EndHeaders)
    }

    fn is_padded(&self) -> bool {
        self.flags.is_set(PushPromiseFlag::Padded)
    }

    fn payload_len(&self) -> u32 {
        let padding = if self.is_padded() {
            1 + self.padding_len as u32
        } else {
            0
        };
        // 4 bytes for the promised stream id.
        4 + self.header_fragment.len() as u32 + padding
    }

    pub fn set_flag(&mut self, flag: PushPromiseFlag) {
        self.flags.set(flag);
    }
}

impl Frame for PushPromiseFrame {
    type FlagType = PushPromiseFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<PushPromiseFrame> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != PUSH_PROMISE_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if (payload_len as usize) != raw_frame.payload().len() {
            return Err(ParseFrameError::InternalError);
        }
        if stream_id == 0 {
            return Err(ParseFrameError::StreamIdMustBeNonZero);
        }

        let flags = Flags::<PushPromiseFlag>::new(flags);

        let (payload, padding_len) =
            parse_padded_payload(raw_frame.payload(), flags.is_set(PushPromiseFlag::Padded))?;

        if payload.len() < 4 {
            return Err(ParseFrameError::IncorrectFrameLength(payload_len));
        }

        let promised_stream_id = parse_stream_id(&payload);

        Ok(PushPromiseFrame {
            stream_id,
            promised_stream_id,
            header_fragment: payload.slice(4..),
            padding_len,
            flags,
        })
    }

    fn flags(&self) -> Flags<PushPromiseFlag> {
        self.flags
    }

    fn get_stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn get_header(&self) -> FrameHeader {
        FrameHeader {
            payload_len: self.payload_len(),
            frame_type: PUSH_PROMISE_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: self.stream_id,
        }
    }
}

impl FrameIR for PushPromiseFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        if self.is_padded() {
            b.extend_from_slice(&[self.padding_len]);
        }
        b.write_u32(self.promised_stream_id);
        let is_padded = self.is_padded();
        let padding_len = self.padding_len;
        b.extend_from_bytes(self.header_fragment);
        if is_padded {
            b.write_padding(padding_len);
        }
    }
}
