use bytes::Bytes;

use crate::solicit::session::StreamState;
use crate::solicit::stream_id::StreamId;
use crate::solicit::window_size::WindowSize;

/// Per-stream state: the RFC 7540 lifecycle state, the two flow control
/// windows, and the bookkeeping needed to classify header blocks and to
/// check body lengths.
pub struct HttpStreamCommon {
    pub stream_id: StreamId,
    pub state: StreamState,
    pub out_window_size: WindowSize,
    pub in_window_size: WindowSize,

    /// The final (non-informational) header block arrived.
    pub initial_headers_received: bool,
    /// Trailers arrived; nothing but RST_STREAM may follow.
    pub trailers_received: bool,
    /// We sent our final (non-informational) header block.
    pub initial_headers_sent: bool,

    /// `content-length` the peer declared, if any.
    pub expected_content_length: Option<u64>,
    /// Actual DATA bytes received so far, padding excluded.
    pub received_body_len: u64,
    /// Received flow-controlled bytes the host has not acknowledged yet.
    pub unacked_recv: u32,

    /// The stream was created by a PUSH_PROMISE.
    pub promised: bool,
    /// `:authority` of the request sent on this stream, kept for ALTSVC
    /// origin inference on the client side.
    pub authority: Option<Bytes>,
}

impl HttpStreamCommon {
    pub fn new(
        stream_id: StreamId,
        state: StreamState,
        out_window_size: u32,
        in_window_size: u32,
    ) -> HttpStreamCommon {
        HttpStreamCommon {
            stream_id,
            state,
            out_window_size: WindowSize::new(out_window_size as i32),
            in_window_size: WindowSize::new(in_window_size as i32),
            initial_headers_received: false,
            trailers_received: false,
            initial_headers_sent: false,
            expected_content_length: None,
            received_body_len: 0,
            unacked_recv: 0,
            promised: false,
            authority: None,
        }
    }

    pub fn close_local(&mut self) {
        trace!("stream {}: close local", self.stream_id);
        self.state = match self.state {
            StreamState::Closed | StreamState::HalfClosedRemote => StreamState::Closed,
            _ => StreamState::HalfClosedLocal,
        };
    }

    pub fn close_remote(&mut self) {
        trace!("stream {}: close remote", self.stream_id);
        self.state = match self.state {
            StreamState::Closed | StreamState::HalfClosedLocal => StreamState::Closed,
            _ => StreamState::HalfClosedRemote,
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn stream() -> HttpStreamCommon {
        HttpStreamCommon::new(1, StreamState::Open, 65_535, 65_535)
    }

    #[test]
    fn close_both_sides() {
        let mut s = stream();
        s.close_local();
        assert_eq!(StreamState::HalfClosedLocal, s.state);
        s.close_remote();
        assert_eq!(StreamState::Closed, s.state);
    }

    #[test]
    fn close_remote_then_local() {
        let mut s = stream();
        s.close_remote();
        assert_eq!(StreamState::HalfClosedRemote, s.state);
        s.close_local();
        assert_eq!(StreamState::Closed, s.state);
    }
}
