use crate::solicit::error_code::ErrorCode;
use crate::solicit::stream_id::StreamId;

/// Shutdown bookkeeping: which GOAWAYs have passed in each direction.
#[derive(Default, Eq, PartialEq, Debug)]
pub struct GoawayState {
    /// Error code of the last GOAWAY we queued.
    pub local_sent: Option<ErrorCode>,
    /// `last_stream_id` of the GOAWAY the peer sent.
    pub remote_received: Option<StreamId>,
}

impl GoawayState {
    pub fn in_progress(&self) -> bool {
        self.local_sent.is_some() || self.remote_received.is_some()
    }
}
