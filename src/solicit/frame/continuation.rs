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

pub const CONTINUATION_FRAME_TYPE: u8 = 0x9;

/// The single flag CONTINUATION defines.
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum ContinuationFlag {
    EndHeaders = 0x4,
}

impl Flag for ContinuationFlag {
    #[inline]
    fn bitmask(&self) -> u8 {
        *self as u8
    }

    fn flags() -> &'static [Self] {
        static FLAGS: &[ContinuationFlag] = &[ContinuationFlag::EndHeaders];
        FLAGS
    }
}

/// The CONTINUATION frame (6.10): one more fragment of a header block
/// opened by a HEADERS or PUSH_PROMISE frame without END_HEADERS.
///
/// CONTINUATION carries no padding, no priority and no END_STREAM of
/// its own; everything but the fragment was said by the frame that
/// opened the block. The connection enforces that nothing else may
/// interleave until a fragment arrives with END_HEADERS set.
#[derive(PartialEq, Clone, Debug)]
pub struct ContinuationFrame {
    /// The set of flags for the frame, packed into a single byte.
    pub flags: Flags<ContinuationFlag>,
    /// The ID of the stream with which this frame is associated
    pub stream_id: StreamId,
    /// The header fragment bytes stored within the frame.
    pub header_fragment: Bytes,
}

impl ContinuationFrame {
    pub fn new<B: Into<Bytes>>(fragment: B, stream_id: StreamId) -> ContinuationFrame {
        ContinuationFrame {
            header_fragment: fragment.into(),
            stream_id,
            flags: Flags::default(),
        }
    }

    fn payload_len(&self) -> u32 {
        self.header_fragment.len() as u32
    }

    /// Whether this fragment completes the header block.
    pub fn is_headers_end(&self) -> bool {
        self.flags.is_set(ContinuationFlag::EndHeaders)
    }

    /// Sets the given flag for the frame.
    pub fn set_flag(&mut self, flag: ContinuationFlag) {
        self.flags.set(flag);
    }
}

impl Frame for ContinuationFrame {
    type FlagType = ContinuationFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<ContinuationFrame> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != CONTINUATION_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if (payload_len as usize) != raw_frame.payload().len() {
            return Err(ParseFrameError::InternalError);
        }
        // Header blocks always belong to a stream.
        if stream_id == 0 {
            return Err(ParseFrameError::StreamIdMustBeNonZero);
        }

        Ok(ContinuationFrame {
            header_fragment: raw_frame.payload(),
            stream_id,
            flags: Flags::new(flags),
        })
    }

    fn flags(&self) -> Flags<ContinuationFlag> {
        self.flags
    }

    fn get_stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn get_header(&self) -> FrameHeader {
        FrameHeader {
            payload_len: self.payload_len(),
            frame_type: CONTINUATION_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: self.stream_id,
        }
    }
}

impl FrameIR for ContinuationFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        b.extend_from_bytes(self.header_fragment);
    }
}
