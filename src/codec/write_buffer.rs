use std::cmp;

use bytes::Bytes;
use bytes::BytesMut;

use crate::solicit::frame::pack_header;
use crate::solicit::frame::FrameHeader;

/// Outbound byte queue.
///
/// Serialized frames are appended at the back; the host drains from the
/// front with `take`/`take_all`. Drained bytes are gone: the queue never
/// re-inserts. The buffer grows without bound, so a host that writes
/// must also drain.
#[derive(Default)]
pub struct WriteBuffer {
    data: BytesMut,
}

impl WriteBuffer {
    pub fn new() -> WriteBuffer {
        Default::default()
    }

    /// Size of data in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    pub fn extend_from_bytes(&mut self, data: Bytes) {
        self.data.extend_from_slice(&data);
    }

    pub fn write_header(&mut self, header: FrameHeader) {
        self.extend_from_slice(&pack_header(&header));
    }

    /// Write the given unsigned 32 bit integer in network endian style.
    pub fn write_u32(&mut self, num: u32) {
        self.extend_from_slice(&num.to_be_bytes());
    }

    /// Write the given number of zero padding octets.
    pub fn write_padding(&mut self, padding_length: u8) {
        self.data
            .extend_from_slice(&[0u8; 255][..padding_length as usize]);
    }

    /// Remove and return up to `limit` bytes from the front of the queue.
    pub fn take(&mut self, limit: usize) -> Bytes {
        let n = cmp::min(limit, self.data.len());
        self.data.split_to(n).freeze()
    }

    /// Remove and return everything currently queued.
    pub fn take_all(&mut self) -> Bytes {
        self.data.split_to(self.data.len()).freeze()
    }
}
