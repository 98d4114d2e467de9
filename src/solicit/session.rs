//! Stream lifecycle states shared by the per-stream and connection-level
//! state machines.

/// The lifecycle state of one stream, after RFC 7540, section 5.1.
///
/// A stream comes into being when a HEADERS frame opens it (idle →
/// open), or when a PUSH_PROMISE reserves it for one side. From there
/// the two directions close independently: an END_STREAM flag closes
/// the side that sent it, leaving the stream half-closed until the
/// other side follows. RST_STREAM, sent or received, closes a stream
/// outright from any state. This engine never keeps fully closed
/// streams in this state; they drop to tombstones instead (see
/// `ClosedStreams`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StreamState {
    Idle,
    ReservedLocal,
    ReservedRemote,
    Open,
    HalfClosedRemote,
    HalfClosedLocal,
    Closed,
}

impl StreamState {
    /// Both directions are done.
    pub fn is_closed(&self) -> bool {
        *self == StreamState::Closed
    }

    /// This side has sent its END_STREAM (or the stream is fully
    /// closed): nothing more may be sent.
    pub fn is_closed_local(&self) -> bool {
        match *self {
            StreamState::HalfClosedLocal | StreamState::Closed => true,
            _ => false,
        }
    }

    /// The peer has sent its END_STREAM (or the stream is fully
    /// closed): nothing more is expected from it.
    pub fn is_closed_remote(&self) -> bool {
        match *self {
            StreamState::HalfClosedRemote | StreamState::Closed => true,
            _ => false,
        }
    }

    /// Whether the peer may still legally send DATA on the stream.
    /// Reserved streams carry no data until their HEADERS arrive.
    pub fn peer_may_send_data(&self) -> bool {
        match *self {
            StreamState::Open | StreamState::HalfClosedLocal => true,
            _ => false,
        }
    }
}
