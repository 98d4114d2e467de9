use bytes::Bytes;
use bytes::BytesMut;

use crate::error::Error;
use crate::result::Result;
use crate::solicit::frame::ContinuationFrame;
use crate::solicit::frame::HeadersFrame;
use crate::solicit::frame::PushPromiseFrame;
use crate::solicit::frame::StreamDependency;
use crate::solicit::stream_id::StreamId;

/// The number of CONTINUATION frames a single header block may span.
///
/// Bounds the memory a peer can tie up with an unterminated header
/// block: with default frame sizes the largest encoded block is about
/// 1 MiB.
pub const CONTINUATION_BACKLOG: usize = 64;

/// What kind of frame opened the in-progress header block.
pub enum HeaderBlockKind {
    Headers {
        end_stream: bool,
        priority: Option<StreamDependency>,
    },
    PushPromise {
        promised_stream_id: StreamId,
    },
}

/// At most one header block may be in progress per connection: a
/// HEADERS or PUSH_PROMISE frame without END_HEADERS, followed by
/// CONTINUATION frames for the same stream until one carries
/// END_HEADERS. Any other frame in between is a connection error,
/// enforced by the connection dispatch.
pub struct HeaderBlockInProgress {
    pub stream_id: StreamId,
    pub kind: HeaderBlockKind,
    fragments: BytesMut,
    continuation_count: usize,
}

impl HeaderBlockInProgress {
    pub fn from_headers_frame(frame: &HeadersFrame) -> HeaderBlockInProgress {
        HeaderBlockInProgress {
            stream_id: frame.stream_id,
            kind: HeaderBlockKind::Headers {
                end_stream: frame.is_end_of_stream(),
                priority: frame.stream_dep,
            },
            fragments: BytesMut::from(&frame.header_fragment[..]),
            continuation_count: 0,
        }
    }

    pub fn from_push_promise_frame(frame: &PushPromiseFrame) -> HeaderBlockInProgress {
        HeaderBlockInProgress {
            stream_id: frame.stream_id,
            kind: HeaderBlockKind::PushPromise {
                promised_stream_id: frame.promised_stream_id,
            },
            fragments: BytesMut::from(&frame.header_fragment[..]),
            continuation_count: 0,
        }
    }

    /// Appends a CONTINUATION fragment to the block.
    pub fn push_continuation(&mut self, frame: &ContinuationFrame) -> Result<()> {
        if frame.stream_id != self.stream_id {
            return Err(Error::Protocol(
                "CONTINUATION stream id does not match the open header block",
            ));
        }
        self.continuation_count += 1;
        if self.continuation_count > CONTINUATION_BACKLOG {
            return Err(Error::DenialOfService("too many CONTINUATION frames"));
        }
        self.fragments.extend_from_slice(&frame.header_fragment);
        Ok(())
    }

    /// The complete header block fragment, ready for HPACK decoding.
    pub fn into_fragment(self) -> Bytes {
        self.fragments.freeze()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solicit::frame::ContinuationFrame;
    use crate::solicit::frame::HeadersFrame;

    #[test]
    fn fragments_concatenated() {
        let headers = HeadersFrame::new(&b"ab"[..], 1);
        let mut block = HeaderBlockInProgress::from_headers_frame(&headers);
        block
            .push_continuation(&ContinuationFrame::new(&b"cd"[..], 1))
            .unwrap();
        block
            .push_continuation(&ContinuationFrame::new(&b"ef"[..], 1))
            .unwrap();
        assert_eq!(&b"abcdef"[..], block.into_fragment());
    }

    #[test]
    fn wrong_stream_id_rejected() {
        let headers = HeadersFrame::new(&b"ab"[..], 1);
        let mut block = HeaderBlockInProgress::from_headers_frame(&headers);
        assert!(block
            .push_continuation(&ContinuationFrame::new(&b"cd"[..], 3))
            .is_err());
    }

    #[test]
    fn backlog_bounded() {
        let headers = HeadersFrame::new(&b""[..], 1);
        let mut block = HeaderBlockInProgress::from_headers_frame(&headers);
        for _ in 0..CONTINUATION_BACKLOG {
            block
                .push_continuation(&ContinuationFrame::new(&b""[..], 1))
                .unwrap();
        }
        assert_eq!(
            Err(Error::DenialOfService("too many CONTINUATION frames")),
            block.push_continuation(&ContinuationFrame::new(&b""[..], 1))
        );
    }
}
