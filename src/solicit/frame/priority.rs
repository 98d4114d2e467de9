//! Implements the `PRIORITY` HTTP/2 frame.

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::frame::flags::*;
use crate::solicit::frame::parse_stream_id;
use crate::solicit::frame::Frame;
use crate::solicit::frame::FrameHeader;
use crate::solicit::frame::FrameIR;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::RawFrame;
use crate::solicit::stream_id::StreamId;

/// The size of the `PRIORITY` frame payload.
pub const PRIORITY_FRAME_LEN: u32 = 5;
/// The frame type of the `PRIORITY` frame.
pub const PRIORITY_FRAME_TYPE: u8 = 0x2;

/// The stream dependency information carried by PRIORITY frames and by
/// HEADERS frames with the PRIORITY flag, as defined in section 5.3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamDependency {
    /// The id of the stream that the current stream depends on.
    pub stream_id: StreamId,
    /// The weight, already mapped from the wire representation to the
    /// 1..=256 range.
    pub weight: u16,
    /// Whether the dependency is exclusive.
    pub is_exclusive: bool,
}

impl StreamDependency {
    pub fn new(stream_id: StreamId, weight: u16, is_exclusive: bool) -> StreamDependency {
        StreamDependency {
            stream_id,
            weight,
            is_exclusive,
        }
    }

    /// Parses the first 5 bytes of the given buffer as a stream
    /// dependency.
    ///
    /// # Panics
    ///
    /// If the buffer is shorter than 5 bytes, the function panics.
    pub fn parse(buf: &[u8]) -> StreamDependency {
        let is_exclusive = buf[0] & 0x80 != 0;
        let stream_id = parse_stream_id(buf);
        // 5.3.2: a weight octet of 0 represents a weight of 1.
        let weight = buf[4] as u16 + 1;

        StreamDependency {
            stream_id,
            weight,
            is_exclusive,
        }
    }

    /// The 5-byte on-the-wire representation of the dependency.
    pub fn serialize(&self) -> [u8; 5] {
        let e_bit = if self.is_exclusive { 0x80 } else { 0 };
        let weight = (self.weight.clamp(1, 256) - 1) as u8;
        [
            (((self.stream_id >> 24) & 0x7F) as u8) | e_bit,
            ((self.stream_id >> 16) & 0xFF) as u8,
            ((self.stream_id >> 8) & 0xFF) as u8,
            (self.stream_id & 0xFF) as u8,
            weight,
        ]
    }
}

/// The struct represents the `PRIORITY` HTTP/2 frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PriorityFrame {
    pub stream_id: StreamId,
    pub dependency: StreamDependency,
    flags: Flags<NoFlag>,
}

impl PriorityFrame {
    pub fn new(stream_id: StreamId, dependency: StreamDependency) -> PriorityFrame {
        PriorityFrame {
            stream_id,
            dependency,
            flags: Flags::default(),
        }
    }
}

impl Frame for PriorityFrame {
    type FlagType = NoFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<Self> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != PRIORITY_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if payload_len != PRIORITY_FRAME_LEN {
            return Err(ParseFrameError::IncorrectFrameLength(payload_len));
        }
        if stream_id == 0 {
            return Err(ParseFrameError::StreamIdMustBeNonZero);
        }

        let dependency = StreamDependency::parse(&raw_frame.payload());

        Ok(PriorityFrame {
            stream_id,
            dependency,
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
            payload_len: PRIORITY_FRAME_LEN,
            frame_type: PRIORITY_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: self.stream_id,
        }
    }
}

impl FrameIR for PriorityFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        b.extend_from_slice(&self.dependency.serialize());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solicit::frame::tests_common::raw_frame_from_parts;

    #[test]
    fn test_parse_exclusive() {
        let raw = raw_frame_from_parts(
            FrameHeader::new(5, 0x2, 0, 3),
            vec![0x80, 0, 0, 1, 15],
        );
        let frame = PriorityFrame::from_raw(&raw).unwrap();
        assert_eq!(frame.stream_id, 3);
        assert_eq!(frame.dependency.stream_id, 1);
        assert!(frame.dependency.is_exclusive);
        assert_eq!(frame.dependency.weight, 16);
    }

    #[test]
    fn test_parse_wrong_length() {
        let raw = raw_frame_from_parts(FrameHeader::new(4, 0x2, 0, 3), vec![0, 0, 0, 1]);
        assert_eq!(
            Err(ParseFrameError::IncorrectFrameLength(4)),
            PriorityFrame::from_raw(&raw)
        );
    }

    #[test]
    fn test_dependency_roundtrip() {
        let dep = StreamDependency::new(5, 256, false);
        assert_eq!(dep, StreamDependency::parse(&dep.serialize()));
    }
}
