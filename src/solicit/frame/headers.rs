//! The module contains the implementation of the `HEADERS` frame and associated flags.

use bytes::Bytes;

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::frame::flags::*;
use crate::solicit::frame::parse_padded_payload;
use crate::solicit::frame::Frame;
use crate::solicit::frame::FrameHeader;
use crate::solicit::frame::FrameIR;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::RawFrame;
use crate::solicit::frame::StreamDependency;
use crate::solicit::stream_id::StreamId;

pub const HEADERS_FRAME_TYPE: u8 = 0x1;

/// An enum representing the flags that a `HeadersFrame` can have.
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum HeadersFlag {
    EndStream = 0x1,
    EndHeaders = 0x4,
    Padded = 0x8,
    Priority = 0x20,
}

impl Flag for HeadersFlag {
    #[inline]
    fn bitmask(&self) -> u8 {
        *self as u8
    }

    fn flags() -> &'static [Self] {
        static FLAGS: &[HeadersFlag] = &[
            HeadersFlag::EndStream,
            HeadersFlag::EndHeaders,
            HeadersFlag::Padded,
            HeadersFlag::Priority,
        ];
        FLAGS
    }
}

/// A struct representing the HEADERS frames of HTTP/2, as defined in the
/// HTTP/2 spec, section 6.2.
#[derive(PartialEq, Debug, Clone)]
pub struct HeadersFrame {
    /// The header fragment bytes stored within the frame.
    pub header_fragment: Bytes,
    /// The ID of the stream with which this frame is associated
    pub stream_id: StreamId,
    /// The stream dependency information, if the priority flag is set.
    pub stream_dep: Option<StreamDependency>,
    /// The length of the padding, if the padded flag is set.
    padding_len: u8,
    /// The set of flags for the frame, packed into a single byte.
    flags: Flags<HeadersFlag>,
}

impl HeadersFrame {
    /// Creates a new `HeadersFrame` with the given header fragment and stream
    /// ID. No padding, no priority, and no flags are set.
    pub fn new<B: Into<Bytes>>(fragment: B, stream_id: StreamId) -> HeadersFrame {
        HeadersFrame {
            header_fragment: fragment.into(),
            stream_id,
            stream_dep: None,
            padding_len: 0,
            flags: Flags::default(),
        }
    }

    /// Creates a new `HeadersFrame` with the given header fragment, stream ID
    /// and stream dependency information. No padding and no flags are set.
    pub fn with_dependency<B: Into<Bytes>>(
        fragment: B,
        stream_id: StreamId,
        stream_dep: StreamDependency,
    ) -> HeadersFrame {
        let mut frame = HeadersFrame::new(fragment, stream_id);
        frame.stream_dep = Some(stream_dep);
        frame.set_flag(HeadersFlag::Priority);
        frame
    }

    /// Returns whether this frame ends the stream it is associated with.
    pub fn is_end_of_stream(&self) -> bool {
        self.flags.is_set(HeadersFlag::EndStream)
    }

    /// Returns whether this frame ends the header block.
    pub fn is_headers_end(&self) -> bool {
        self.flags.is_set(HeadersFlag::EndHeaders)
    }

    fn is_padded(&self) -> bool {
        self.flags.is_set(HeadersFlag::Padded)
    }

    /// Sets the padding length for the frame, as well as the corresponding
    /// Padded flag.
    pub fn set_padding(&mut self, padding_len: u8) {
        self.set_flag(HeadersFlag::Padded);
        self.padding_len = padding_len;
    }

    /// Returns the length of the payload of the current frame, including any
    /// possible padding.
    fn payload_len(&self) -> u32 {
        let padding = if self.is_padded() {
            1 + self.padding_len as u32
        } else {
            0
        };
        let priority = if self.flags.is_set(HeadersFlag::Priority) {
            5
        } else {
            0
        };

        self.header_fragment.len() as u32 + padding + priority
    }

    /// Sets the given flag for the frame.
    pub fn set_flag(&mut self, flag: HeadersFlag) {
        self.flags.set(flag);
    }
}

impl Frame for HeadersFrame {
    type FlagType = HeadersFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<HeadersFrame> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != HEADERS_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if (payload_len as usize) != raw_frame.payload().len() {
            return Err(ParseFrameError::InternalError);
        }
        if stream_id == 0 {
            return Err(ParseFrameError::StreamIdMustBeNonZero);
        }

        let flags = Flags::<HeadersFlag>::new(flags);

        let (payload, padding_len) =
            parse_padded_payload(raw_frame.payload(), flags.is_set(HeadersFlag::Padded))?;

        let (fragment, stream_dep) = if flags.is_set(HeadersFlag::Priority) {
            if payload.len() < 5 {
                return Err(ParseFrameError::IncorrectFrameLength(payload_len));
            }
            let dep = StreamDependency::parse(&payload);
            (payload.slice(5..), Some(dep))
        } else {
            (payload, None)
        };

        Ok(HeadersFrame {
            header_fragment: fragment,
            stream_id,
            stream_dep,
            padding_len,
            flags,
        })
    }

    fn flags(&self) -> Flags<HeadersFlag> {
        self.flags
    }

    fn get_stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn get_header(&self) -> FrameHeader {
        FrameHeader {
            payload_len: self.payload_len(),
            frame_type: HEADERS_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: self.stream_id,
        }
    }
}

impl FrameIR for HeadersFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        if self.is_padded() {
            b.extend_from_slice(&[self.padding_len]);
        }
        if let Some(dep) = &self.stream_dep {
            b.extend_from_slice(&dep.serialize());
        }
        let is_padded = self.is_padded();
        let padding_len = self.padding_len;
        b.extend_from_bytes(self.header_fragment);
        if is_padded {
            b.write_padding(padding_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solicit::frame::tests_common::raw_frame_from_parts;
    use crate::solicit::frame::pack_header;

    #[test]
    fn test_parse_simple() {
        let raw = raw_frame_from_parts(FrameHeader::new(3, 0x1, 0x5, 1), vec![1, 2, 3]);
        let frame = HeadersFrame::from_raw(&raw).unwrap();

        assert_eq!(frame.get_stream_id(), 1);
        assert_eq!(&frame.header_fragment[..], &[1, 2, 3]);
        assert!(frame.is_end_of_stream());
        assert!(frame.is_headers_end());
        assert!(frame.stream_dep.is_none());
    }

    #[test]
    fn test_parse_with_priority() {
        let mut payload = vec![0x80, 0, 0, 3, 5];
        payload.extend(vec![1, 2, 3]);
        let raw = raw_frame_from_parts(
            FrameHeader::new(payload.len() as u32, 0x1, 0x20, 5),
            payload,
        );
        let frame = HeadersFrame::from_raw(&raw).unwrap();

        assert_eq!(&frame.header_fragment[..], &[1, 2, 3]);
        let dep = frame.stream_dep.unwrap();
        assert_eq!(dep.stream_id, 3);
        assert!(dep.is_exclusive);
        assert_eq!(dep.weight, 6);
    }

    #[test]
    fn test_parse_with_padding() {
        let mut payload = vec![2];
        payload.extend(vec![1, 2, 3]);
        payload.extend(vec![0, 0]);
        let raw = raw_frame_from_parts(
            FrameHeader::new(payload.len() as u32, 0x1, 0x8, 1),
            payload,
        );
        let frame = HeadersFrame::from_raw(&raw).unwrap();

        assert_eq!(&frame.header_fragment[..], &[1, 2, 3]);
    }

    #[test]
    fn test_parse_zero_stream_id() {
        let raw = raw_frame_from_parts(FrameHeader::new(3, 0x1, 0, 0), vec![1, 2, 3]);
        assert_eq!(
            Err(ParseFrameError::StreamIdMustBeNonZero),
            HeadersFrame::from_raw(&raw)
        );
    }

    #[test]
    fn test_serialize_simple() {
        let mut frame = HeadersFrame::new(vec![1, 2, 3], 1);
        frame.set_flag(HeadersFlag::EndHeaders);

        let expected = {
            let mut buf = Vec::new();
            buf.extend(pack_header(&FrameHeader::new(3, 0x1, 0x4, 1)).iter());
            buf.extend(vec![1, 2, 3]);
            buf
        };

        assert_eq!(expected, frame.serialize_into_vec());
    }

    #[test]
    fn test_serialize_with_priority_roundtrip() {
        let dep = StreamDependency::new(3, 16, false);
        let mut frame = HeadersFrame::with_dependency(vec![1, 2, 3], 5, dep);
        frame.set_flag(HeadersFlag::EndHeaders);

        let raw = RawFrame::parse(frame.serialize_into_vec()).unwrap();
        let parsed = HeadersFrame::from_raw(&raw).unwrap();

        assert_eq!(parsed.stream_dep.unwrap(), dep);
        assert_eq!(&parsed.header_fragment[..], &[1, 2, 3]);
    }
}
