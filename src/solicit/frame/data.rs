//! The module contains the implementation of the `DATA` frame.

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
use crate::solicit::stream_id::StreamId;

pub const DATA_FRAME_TYPE: u8 = 0x0;

/// An enum representing the flags that a `DataFrame` can have.
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum DataFlag {
    EndStream = 0x1,
    Padded = 0x8,
}

impl Flag for DataFlag {
    #[inline]
    fn bitmask(&self) -> u8 {
        *self as u8
    }

    fn flags() -> &'static [Self] {
        static FLAGS: &[DataFlag] = &[DataFlag::EndStream, DataFlag::Padded];
        FLAGS
    }
}

/// A struct representing the DATA frames of HTTP/2, as defined in the
/// HTTP/2 spec, section 6.1.
#[derive(PartialEq, Debug, Clone)]
pub struct DataFrame {
    /// The ID of the stream with which the frame is associated.
    pub stream_id: StreamId,
    /// The data found in the frame as an opaque byte sequence. It never
    /// includes padding bytes.
    pub data: Bytes,
    /// Represents the flags currently set on the `DataFrame`, packed into
    /// a single byte.
    flags: Flags<DataFlag>,
    /// The length of the padding applied to the data. Since the spec
    /// defines that the padding length is at most an unsigned integer
    /// value, we also keep a `u8`, instead of a `usize`.
    padding_len: u8,
}

impl DataFrame {
    /// Creates a new `DataFrame` with the given `DataChunk`.
    ///
    /// The chunk does not include the padding length octet.
    pub fn with_data<B: Into<Bytes>>(stream_id: StreamId, data: B) -> DataFrame {
        DataFrame {
            stream_id,
            data: data.into(),
            flags: Flags::default(),
            padding_len: 0,
        }
    }

    /// Returns whether this frame ends the stream it is associated with.
    pub fn is_end_of_stream(&self) -> bool {
        self.flags.is_set(DataFlag::EndStream)
    }

    /// Returns whether this frame is padded.
    pub fn is_padded(&self) -> bool {
        self.flags.is_set(DataFlag::Padded)
    }

    /// Sets the number of padding bytes appended to the data.
    pub fn set_padding(&mut self, padding_len: u8) {
        self.set_flag(DataFlag::Padded);
        self.padding_len = padding_len;
    }

    /// The number of bytes this frame counts against flow control
    /// windows: payload plus padding plus the padding length octet.
    pub fn flow_controlled_length(&self) -> u32 {
        self.payload_len()
    }

    /// Returns the total length of the payload, taking into account
    /// possible padding.
    pub fn payload_len(&self) -> u32 {
        if self.is_padded() {
            1 + self.data.len() as u32 + self.padding_len as u32
        } else {
            self.data.len() as u32
        }
    }

    /// Sets the given flag for the frame.
    pub fn set_flag(&mut self, flag: DataFlag) {
        self.flags.set(flag);
    }
}

impl Frame for DataFrame {
    type FlagType = DataFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<DataFrame> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != DATA_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if (payload_len as usize) != raw_frame.payload().len() {
            return Err(ParseFrameError::InternalError);
        }
        if stream_id == 0 {
            return Err(ParseFrameError::StreamIdMustBeNonZero);
        }

        let flags = Flags::new(flags);
        let (data, padding_len) =
            parse_padded_payload(raw_frame.payload(), flags.is_set(DataFlag::Padded))?;

        Ok(DataFrame {
            stream_id,
            data,
            flags,
            padding_len,
        })
    }

    fn flags(&self) -> Flags<DataFlag> {
        self.flags
    }

    fn get_stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn get_header(&self) -> FrameHeader {
        FrameHeader {
            payload_len: self.payload_len(),
            frame_type: DATA_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: self.stream_id,
        }
    }
}

impl FrameIR for DataFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        if self.is_padded() {
            b.extend_from_slice(&[self.padding_len]);
            b.extend_from_bytes(self.data);
            b.write_padding(self.padding_len);
        } else {
            b.extend_from_bytes(self.data);
        }
    }
}
