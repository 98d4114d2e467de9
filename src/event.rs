//! Events the engine emits from `receive_data`.
//!
//! Each call to [`crate::HttpConnection::receive_data`] returns the
//! events triggered by the parsed frames, in exact arrival order. When a
//! single frame triggers several logical events (HEADERS carrying
//! END_STREAM and priority information, say), the primary event exposes
//! the siblings as owned sub-records *and* the siblings are emitted
//! individually right after the primary, in the order primary →
//! `PriorityUpdated` → `StreamEnded`. Consumers handling both forms must
//! take care not to double-handle.

use bytes::Bytes;

use crate::solicit::error_code::ErrorCode;
use crate::solicit::frame::settings::HttpSetting;
use crate::solicit::header::Headers;
use crate::solicit::stream_id::StreamId;

/// One setting the peer (or an ACK) changed: the new value plus what it
/// replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedSetting {
    /// The setting, carrying the new value.
    pub setting: HttpSetting,
    /// The value in effect before the change.
    pub original_value: u32,
}

/// All of a request's headers arrived (HEADERS plus any CONTINUATIONs).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestReceived {
    pub stream_id: StreamId,
    pub headers: Headers,
    /// If the request also ended the stream, the associated `StreamEnded`.
    pub stream_ended: Option<StreamEnded>,
    /// If the request carried priority information, the associated
    /// `PriorityUpdated`.
    pub priority_updated: Option<PriorityUpdated>,
}

/// All of a response's headers arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseReceived {
    pub stream_id: StreamId,
    pub headers: Headers,
    pub stream_ended: Option<StreamEnded>,
    pub priority_updated: Option<PriorityUpdated>,
}

/// A 1xx response arrived. Any number of these may precede the final
/// response.
#[derive(Debug, Clone, PartialEq)]
pub struct InformationalResponseReceived {
    pub stream_id: StreamId,
    pub headers: Headers,
    pub priority_updated: Option<PriorityUpdated>,
}

/// Trailers arrived. Trailers always end the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailersReceived {
    pub stream_id: StreamId,
    pub headers: Headers,
    pub stream_ended: Option<StreamEnded>,
    pub priority_updated: Option<PriorityUpdated>,
}

/// A DATA frame arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct DataReceived {
    pub stream_id: StreamId,
    /// The data itself, padding already removed.
    pub data: Bytes,
    /// The number of bytes the frame counts against flow control windows:
    /// data plus padding plus the padding length octet. Always use this,
    /// not `data.len()`, when acknowledging received data.
    pub flow_controlled_length: u32,
    pub stream_ended: Option<StreamEnded>,
}

/// The peer incremented one of our send windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUpdated {
    /// Zero for the connection window.
    pub stream_id: StreamId,
    pub delta: u32,
}

/// The peer changed its settings; they are already in effect.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSettingsChanged {
    pub changed_settings: Vec<ChangedSetting>,
}

/// The peer acknowledged a SETTINGS frame we sent; the changes listed
/// here have just been applied to our local settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsAcknowledged {
    pub changed_settings: Vec<ChangedSetting>,
}

/// A PING arrived; the ACK has already been queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingReceived {
    pub ping_data: [u8; 8],
}

/// The peer acknowledged one of our PINGs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingAcknowledged {
    pub ping_data: [u8; 8],
}

/// The peer will send no more data nor headers on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEnded {
    pub stream_id: StreamId,
}

/// A stream died early: either the peer sent RST_STREAM
/// (`remote_reset: true`), or the peer committed a stream-scoped
/// protocol error and the engine queued the RST_STREAM itself
/// (`remote_reset: false`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReset {
    pub stream_id: StreamId,
    pub error_code: ErrorCode,
    pub remote_reset: bool,
}

/// The peer reserved a pushed stream.
#[derive(Debug, Clone, PartialEq)]
pub struct PushedStreamReceived {
    pub pushed_stream_id: StreamId,
    pub parent_stream_id: StreamId,
    pub headers: Headers,
}

/// The peer sent updated priority information for a stream. Purely
/// advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityUpdated {
    pub stream_id: StreamId,
    /// 1 to 256.
    pub weight: u16,
    pub depends_on: StreamId,
    pub exclusive: bool,
}

/// A GOAWAY arrived, or the engine terminated the connection after a
/// connection-scoped protocol error by the peer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionTerminated {
    pub error_code: ErrorCode,
    /// The id of the last stream the terminating side processed.
    pub last_stream_id: StreamId,
    pub additional_data: Option<Bytes>,
}

/// The peer advertised an RFC 7838 alternative service.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeServiceAvailable {
    /// Supplied by the server directly (stream 0), or inferred from the
    /// `:authority` of the request the frame was received on.
    pub origin: Bytes,
    /// The raw Alternative Service Field Value; not parsed by the engine.
    pub field_value: Bytes,
}

/// Everything `receive_data` can report.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RequestReceived(RequestReceived),
    ResponseReceived(ResponseReceived),
    InformationalResponseReceived(InformationalResponseReceived),
    TrailersReceived(TrailersReceived),
    DataReceived(DataReceived),
    WindowUpdated(WindowUpdated),
    RemoteSettingsChanged(RemoteSettingsChanged),
    SettingsAcknowledged(SettingsAcknowledged),
    PingReceived(PingReceived),
    PingAcknowledged(PingAcknowledged),
    StreamEnded(StreamEnded),
    StreamReset(StreamReset),
    PushedStreamReceived(PushedStreamReceived),
    PriorityUpdated(PriorityUpdated),
    ConnectionTerminated(ConnectionTerminated),
    AlternativeServiceAvailable(AlternativeServiceAvailable),
}

impl Event {
    /// The stream the event belongs to; `None` for connection-level
    /// events.
    pub fn stream_id(&self) -> Option<StreamId> {
        match self {
            Event::RequestReceived(e) => Some(e.stream_id),
            Event::ResponseReceived(e) => Some(e.stream_id),
            Event::InformationalResponseReceived(e) => Some(e.stream_id),
            Event::TrailersReceived(e) => Some(e.stream_id),
            Event::DataReceived(e) => Some(e.stream_id),
            Event::WindowUpdated(e) => Some(e.stream_id),
            Event::StreamEnded(e) => Some(e.stream_id),
            Event::StreamReset(e) => Some(e.stream_id),
            Event::PushedStreamReceived(e) => Some(e.pushed_stream_id),
            Event::PriorityUpdated(e) => Some(e.stream_id),
            Event::RemoteSettingsChanged(..)
            | Event::SettingsAcknowledged(..)
            | Event::PingReceived(..)
            | Event::PingAcknowledged(..)
            | Event::ConnectionTerminated(..)
            | Event::AlternativeServiceAvailable(..) => None,
        }
    }
}
