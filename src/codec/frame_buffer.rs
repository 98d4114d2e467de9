use bytes::BytesMut;

use crate::solicit::frame::unpack_header_from_slice;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::RawFrame;
use crate::solicit::frame::FRAME_HEADER_LEN;
use crate::solicit::CONNECTION_PREFACE;

/// Inbound byte accumulator that yields whole frames.
///
/// For the server role the buffer first consumes the client connection
/// preface; any mismatching byte is a protocol error. Frames whose
/// declared payload length exceeds the locally advertised
/// SETTINGS_MAX_FRAME_SIZE are rejected before the payload is assembled.
pub struct FrameBuffer {
    data: BytesMut,
    /// Preface bytes still expected (zero for clients).
    preface_remaining: usize,
    max_frame_size: u32,
}

impl FrameBuffer {
    pub fn new(expect_preface: bool, max_frame_size: u32) -> FrameBuffer {
        FrameBuffer {
            data: BytesMut::new(),
            preface_remaining: if expect_preface {
                CONNECTION_PREFACE.len()
            } else {
                0
            },
            max_frame_size,
        }
    }

    /// Tracks the locally advertised SETTINGS_MAX_FRAME_SIZE.
    pub fn set_max_frame_size(&mut self, max_frame_size: u32) {
        self.max_frame_size = max_frame_size;
    }

    pub fn add_data(&mut self, mut data: &[u8]) -> ParseFrameResult<()> {
        if self.preface_remaining != 0 {
            let check = usize::min(self.preface_remaining, data.len());
            let offset = CONNECTION_PREFACE.len() - self.preface_remaining;
            if CONNECTION_PREFACE[offset..offset + check] != data[..check] {
                return Err(ParseFrameError::InvalidPreface);
            }
            self.preface_remaining -= check;
            data = &data[check..];
        }
        self.data.extend_from_slice(data);
        Ok(())
    }

    /// Pulls the next complete frame out of the buffer.
    ///
    /// Returns `Ok(None)` when the buffered bytes do not yet form a whole
    /// frame; the partial data stays buffered for the next call.
    pub fn next_frame(&mut self) -> ParseFrameResult<Option<RawFrame>> {
        if self.data.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let header = unpack_header_from_slice(&self.data[..FRAME_HEADER_LEN]);

        if header.payload_len > self.max_frame_size {
            return Err(ParseFrameError::FrameTooLarge(header.payload_len));
        }

        let full = FRAME_HEADER_LEN + header.payload_len as usize;
        if self.data.len() < full {
            return Ok(None);
        }

        let raw_content = self.data.split_to(full).freeze();
        Ok(Some(RawFrame { raw_content }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frame_assembled_across_calls() {
        let mut buf = FrameBuffer::new(false, 16_384);
        buf.add_data(&[0, 0, 2, 6, 0]).unwrap();
        assert!(buf.next_frame().unwrap().is_none());
        buf.add_data(&[0, 0, 0, 0, b'h']).unwrap();
        assert!(buf.next_frame().unwrap().is_none());
        buf.add_data(&[b'i']).unwrap();
        let frame = buf.next_frame().unwrap().unwrap();
        assert_eq!(2, frame.header().payload_len);
        assert_eq!(&b"hi"[..], frame.payload());
    }

    #[test]
    fn preface_consumed_incrementally() {
        let mut buf = FrameBuffer::new(true, 16_384);
        buf.add_data(b"PRI * HTTP/2.0\r\n").unwrap();
        buf.add_data(b"\r\nSM\r\n\r\n").unwrap();
        buf.add_data(&[0, 0, 0, 4, 0, 0, 0, 0, 0]).unwrap();
        let frame = buf.next_frame().unwrap().unwrap();
        assert_eq!(4, frame.header().frame_type);
    }

    #[test]
    fn bad_preface_rejected() {
        let mut buf = FrameBuffer::new(true, 16_384);
        assert_eq!(
            Err(ParseFrameError::InvalidPreface),
            buf.add_data(b"GET / HTTP/1.1\r\n")
        );
    }

    #[test]
    fn oversized_frame_rejected_from_header() {
        let mut buf = FrameBuffer::new(false, 16_384);
        // Only the header arrived, declaring a 17k payload.
        buf.add_data(&[0, 0x42, 0x68, 0, 0, 0, 0, 0, 1]).unwrap();
        assert_eq!(
            Err(ParseFrameError::FrameTooLarge(0x4268)),
            buf.next_frame()
        );
    }
}
