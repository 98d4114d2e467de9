//! The connection-level state machine and the host-facing contract.
//!
//! `HttpConnection` is the engine: a single-owner, synchronous object
//! with no internal threads and no notion of time. Inbound bytes go in
//! through `receive_data` (implemented in `conn_recv`), host actions go
//! through the `send_*` operations (implemented in `conn_send`), and
//! everything to be written to the transport comes out of
//! `data_to_send`/`take_all`.

use base64::Engine;
use bytes::Bytes;

use crate::codec::frame_buffer::FrameBuffer;
use crate::codec::write_buffer::WriteBuffer;
use crate::common::client_or_server::ClientOrServer;
use crate::common::goaway_state::GoawayState;
use crate::common::header_block::HeaderBlockInProgress;
use crate::common::settings_state::validate_local_setting;
use crate::common::settings_state::SettingsState;
use crate::common::stream::HttpStreamCommon;
use crate::common::stream_map::StreamMap;
use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::result::Result;
use crate::solicit::error_code::ErrorCode;
use crate::solicit::frame::FrameIR;
use crate::solicit::frame::GoawayFrame;
use crate::solicit::frame::HttpSetting;
use crate::solicit::frame::PingFrame;
use crate::solicit::frame::SettingsFrame;
use crate::solicit::frame::WindowUpdateFrame;
use crate::solicit::session::StreamState;
use crate::solicit::stream_id::StreamId;
use crate::solicit::stream_id::MAX_STREAM_ID;
use crate::solicit::window_size::WindowSize;
use crate::solicit::window_size::MAX_WINDOW_SIZE_INC;
use crate::solicit::CONNECTION_PREFACE;
use crate::solicit::DEFAULT_LOCAL_SETTINGS;
use crate::solicit::DEFAULT_SETTINGS;

/// Priority information attached to an outbound HEADERS frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendPriority {
    /// 1 to 256.
    pub weight: u16,
    pub depends_on: StreamId,
    pub exclusive: bool,
}

/// The global state of the connection.
///
/// GOAWAY exchange details (who sent what, with which code) live in
/// `GoawayState`; the enum only tracks which phase the connection is in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConnectionState {
    /// `initiate_connection` has not been called yet.
    Idle,
    /// Server role: waiting for the client preface bytes and the first
    /// SETTINGS frame.
    PrefaceExpected,
    /// Client role: preface queued, waiting for the server's SETTINGS.
    PrefaceSent,
    Established,
    GoawaySent,
    GoawayReceived,
    /// The connection is unusable; only `data_to_send` remains
    /// meaningful.
    Closed,
}

/// The sans-I/O HTTP/2 protocol engine.
///
/// The object holds the entire connection state: per-stream state
/// machines, settings of both sides, flow control windows, the HPACK
/// contexts, and the outbound byte queue. It never touches a socket.
pub struct HttpConnection {
    pub(crate) config: ConnectionConfig,
    pub(crate) role: ClientOrServer,
    pub(crate) state: ConnectionState,

    pub(crate) settings: SettingsState,
    /// Our budget for sending flow-controlled data.
    pub(crate) out_window_size: WindowSize,
    /// The peer's budget for sending flow-controlled data to us.
    pub(crate) in_window_size: WindowSize,
    /// Received flow-controlled bytes the host has not acknowledged.
    pub(crate) conn_unacked_recv: u32,

    pub(crate) streams: StreamMap,
    /// Highest stream id this side has initiated.
    pub(crate) last_local_stream_id: StreamId,
    /// Highest peer-initiated stream id that opened a stream.
    pub(crate) last_peer_stream_id: StreamId,
    /// Highest inbound stream id observed anywhere, including header
    /// blocks that never completed; GOAWAY reports this one.
    pub(crate) highest_inbound_stream_id: StreamId,
    /// Highest stream id we have promised (server role).
    pub(crate) last_promised_local: StreamId,
    /// Highest stream id the peer has promised (client role).
    pub(crate) last_promised_remote: StreamId,

    pub(crate) header_block: Option<HeaderBlockInProgress>,
    pub(crate) goaway: GoawayState,

    pub(crate) encoder: hpack::Encoder<'static>,
    pub(crate) decoder: hpack::Decoder<'static>,

    pub(crate) frame_buffer: FrameBuffer,
    pub(crate) write_buffer: WriteBuffer,

    /// Consecutive empty, non-END_STREAM DATA frames seen.
    pub(crate) consecutive_empty_data_frames: u32,
}

impl HttpConnection {
    pub fn new(config: ConnectionConfig) -> HttpConnection {
        let role = match config.client_side {
            true => ClientOrServer::Client,
            false => ClientOrServer::Server,
        };
        HttpConnection {
            config,
            role,
            state: ConnectionState::Idle,
            settings: SettingsState::new(),
            out_window_size: WindowSize::new(DEFAULT_SETTINGS.initial_window_size as i32),
            in_window_size: WindowSize::new(DEFAULT_SETTINGS.initial_window_size as i32),
            conn_unacked_recv: 0,
            streams: StreamMap::new(),
            last_local_stream_id: 0,
            last_peer_stream_id: 0,
            highest_inbound_stream_id: 0,
            last_promised_local: 0,
            last_promised_remote: 0,
            header_block: None,
            goaway: GoawayState::default(),
            encoder: hpack::Encoder::new(),
            decoder: hpack::Decoder::new(),
            frame_buffer: FrameBuffer::new(
                role == ClientOrServer::Server,
                DEFAULT_SETTINGS.max_frame_size,
            ),
            write_buffer: WriteBuffer::new(),
            consecutive_empty_data_frames: 0,
        }
    }

    /// A client-side connection with default configuration.
    pub fn client() -> HttpConnection {
        HttpConnection::new(ConnectionConfig::client())
    }

    /// A server-side connection with default configuration.
    pub fn server() -> HttpConnection {
        HttpConnection::new(ConnectionConfig::server())
    }

    /// Begins the connection: queues the preface and initial SETTINGS
    /// for a client, or starts expecting the client preface for a
    /// server (the initial SETTINGS are queued for both roles).
    pub fn initiate_connection(&mut self) -> Result<()> {
        if self.state != ConnectionState::Idle {
            return Err(Error::Protocol("connection already initiated"));
        }

        if self.role == ClientOrServer::Client {
            self.write_buffer.extend_from_slice(CONNECTION_PREFACE);
            self.state = ConnectionState::PrefaceSent;
        } else {
            self.state = ConnectionState::PrefaceExpected;
        }

        let advertised = DEFAULT_LOCAL_SETTINGS.diff(&self.settings.acked_local);
        self.queue_frame(SettingsFrame::from_settings(advertised.clone()));
        self.settings.push_pending(advertised);

        Ok(())
    }

    /// Begins a connection established by HTTP/1.1 Upgrade (h2c).
    ///
    /// The server passes the base64url-encoded `HTTP2-Settings` header
    /// of the upgrade request; its settings are applied as if received
    /// in a SETTINGS frame, but without queueing an ACK. Stream 1 is
    /// created half-closed: the client already sent its request (and the
    /// engine replays no events for it), the server owes the response.
    pub fn initiate_upgrade_connection(&mut self, settings_header: Option<&[u8]>) -> Result<()> {
        if self.state != ConnectionState::Idle {
            return Err(Error::Protocol("connection already initiated"));
        }

        if self.role == ClientOrServer::Server {
            let settings_header =
                settings_header.ok_or(Error::Protocol("HTTP2-Settings header required"))?;
            // RFC 7540, 3.2.1: base64url with padding omitted. Tolerate
            // senders that pad anyway.
            let unpadded = match settings_header.iter().position(|&b| b == b'=') {
                Some(pos) => &settings_header[..pos],
                None => settings_header,
            };
            let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(unpadded)
                .map_err(|_| Error::Protocol("HTTP2-Settings is not valid base64"))?;
            let settings = SettingsFrame::parse_payload(&payload)?;
            for setting in settings {
                self.settings.remote.apply(setting);
            }
        }

        self.initiate_connection()?;

        let state = match self.role {
            ClientOrServer::Client => StreamState::HalfClosedLocal,
            ClientOrServer::Server => StreamState::HalfClosedRemote,
        };
        let mut stream = HttpStreamCommon::new(
            1,
            state,
            self.settings.remote.initial_window_size,
            self.settings.acked_local.initial_window_size,
        );
        match self.role {
            ClientOrServer::Client => {
                stream.initial_headers_sent = true;
                self.last_local_stream_id = 1;
            }
            ClientOrServer::Server => {
                stream.initial_headers_received = true;
                self.last_peer_stream_id = 1;
                self.highest_inbound_stream_id = 1;
            }
        }
        self.streams.insert(1, stream);

        Ok(())
    }

    /// Returns up to `limit` queued outbound bytes and removes them from
    /// the queue. Usable in every connection state, including after
    /// termination: the final GOAWAY still has to reach the wire.
    pub fn data_to_send(&mut self, limit: usize) -> Bytes {
        self.write_buffer.take(limit)
    }

    /// Returns all queued outbound bytes.
    pub fn take_all(&mut self) -> Bytes {
        self.write_buffer.take_all()
    }

    /// Number of outbound bytes currently queued.
    pub fn pending_outbound_len(&self) -> usize {
        self.write_buffer.remaining()
    }

    /// The lowest stream id this endpoint has not used yet.
    pub fn get_next_available_stream_id(&self) -> Result<StreamId> {
        let next = match self.last_local_stream_id {
            0 => self.role.first_stream_id(),
            n => n + 2,
        };
        if next > MAX_STREAM_ID {
            return Err(Error::NoAvailableStreamId);
        }
        Ok(next)
    }

    /// Queues a SETTINGS frame with the given changes. The new values
    /// take effect only when the peer acknowledges them, at which point
    /// a `SettingsAcknowledged` event reports the deltas.
    pub fn update_settings(&mut self, changes: Vec<HttpSetting>) -> Result<()> {
        self.ensure_operational()?;
        for setting in &changes {
            validate_local_setting(setting)?;
        }
        self.queue_frame(SettingsFrame::from_settings(changes.clone()));
        self.settings.push_pending(changes);
        Ok(())
    }

    /// Queues a PING carrying the given opaque payload. The peer's
    /// answer surfaces as a `PingAcknowledged` event.
    pub fn ping(&mut self, opaque_data: [u8; 8]) -> Result<()> {
        self.ensure_operational()?;
        self.queue_frame(PingFrame::new(opaque_data));
        Ok(())
    }

    /// Queues a GOAWAY with the given code, carrying the id of the last
    /// peer-initiated stream this engine processed.
    ///
    /// Sending is idempotent: repeated calls queue further GOAWAY frames
    /// and never fail. A code other than `NoError` additionally latches
    /// the connection closed, so that only `data_to_send` remains
    /// usable.
    pub fn close_connection(
        &mut self,
        error_code: ErrorCode,
        additional_data: Option<Bytes>,
    ) -> Result<()> {
        if self.state == ConnectionState::Idle {
            return Err(Error::ConnectionNotInitiated);
        }
        self.queue_goaway(error_code, additional_data.unwrap_or_else(Bytes::new));
        if error_code != ErrorCode::NoError {
            self.state = ConnectionState::Closed;
        } else if self.state != ConnectionState::Closed {
            self.state = ConnectionState::GoawaySent;
        }
        Ok(())
    }

    /// Opens the receive windows back up after the host has consumed
    /// `size` flow-controlled bytes received on `stream_id`.
    ///
    /// A WINDOW_UPDATE is queued for the connection, and for the stream
    /// as long as the peer can still send on it. Acknowledging more than
    /// was received is an error.
    pub fn acknowledge_received_data(&mut self, stream_id: StreamId, size: u32) -> Result<()> {
        self.ensure_operational()?;
        if stream_id == 0 {
            return Err(Error::Protocol(
                "acknowledge_received_data takes a stream id, not 0",
            ));
        }
        if size == 0 {
            return Ok(());
        }
        if size > self.conn_unacked_recv {
            return Err(Error::Protocol("acknowledged more data than was received"));
        }

        self.conn_unacked_recv -= size;
        // Cannot overflow: the window was decremented by at least
        // `conn_unacked_recv` since the last acknowledgement.
        let _ = self.in_window_size.try_increase(size);
        self.queue_frame(WindowUpdateFrame::for_connection(size));

        let update_stream = match self.streams.get_mut(stream_id) {
            Some(stream) => {
                if size > stream.unacked_recv {
                    return Err(Error::Protocol("acknowledged more data than was received"));
                }
                stream.unacked_recv -= size;
                if stream.state.is_closed_remote() {
                    false
                } else {
                    let _ = stream.in_window_size.try_increase(size);
                    true
                }
            }
            None => false,
        };
        if update_stream {
            self.queue_frame(WindowUpdateFrame::for_stream(stream_id, size));
        }
        Ok(())
    }

    /// Queues a WINDOW_UPDATE increasing a receive window directly,
    /// without the bookkeeping of `acknowledge_received_data`. The two
    /// must not be mixed for the same received bytes.
    pub fn increment_flow_control_window(
        &mut self,
        increment: u32,
        stream_id: Option<StreamId>,
    ) -> Result<()> {
        self.ensure_operational()?;
        if increment == 0 || increment > MAX_WINDOW_SIZE_INC {
            return Err(Error::Protocol(
                "window increment must be between 1 and 2^31-1",
            ));
        }
        match stream_id {
            None | Some(0) => {
                self.in_window_size
                    .try_increase(increment)
                    .map_err(|_| Error::FlowControl)?;
                self.queue_frame(WindowUpdateFrame::for_connection(increment));
            }
            Some(stream_id) => {
                {
                    let stream = self.stream_or_err(stream_id)?;
                    stream
                        .in_window_size
                        .try_increase(increment)
                        .map_err(|_| Error::FlowControl)?;
                }
                self.queue_frame(WindowUpdateFrame::for_stream(stream_id, increment));
            }
        }
        Ok(())
    }

    /// The current connection-level send budget.
    pub fn remote_flow_control_window(&self) -> i32 {
        self.out_window_size.size()
    }

    /// The send budget of one stream, bounded by the connection window.
    pub fn local_flow_control_window(&self, stream_id: StreamId) -> Result<i32> {
        match self.streams.get(stream_id) {
            Some(stream) => Ok(std::cmp::min(
                stream.out_window_size.size(),
                self.out_window_size.size(),
            )),
            None => Err(self.missing_stream_error(stream_id)),
        }
    }

    /// The lifecycle state of a stream, if it is still tracked.
    pub fn stream_state(&self, stream_id: StreamId) -> Option<StreamState> {
        self.streams.get(stream_id).map(|s| s.state)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    // Internal helpers shared by the receive and send halves.

    pub(crate) fn queue_frame<F: FrameIR>(&mut self, frame: F) {
        debug!("queueing frame: {:?}", frame);
        frame.serialize_into(&mut self.write_buffer);
    }

    pub(crate) fn queue_goaway(&mut self, error_code: ErrorCode, debug_data: Bytes) {
        self.goaway.local_sent = Some(error_code);
        self.queue_frame(GoawayFrame::with_debug_data(
            self.highest_inbound_stream_id,
            error_code,
            debug_data,
        ));
    }

    /// Fails unless the engine can accept regular operations.
    pub(crate) fn ensure_operational(&self) -> Result<()> {
        match self.state {
            ConnectionState::Idle => Err(Error::ConnectionNotInitiated),
            ConnectionState::Closed => Err(Error::ConnectionMustBeClosed),
            _ => Ok(()),
        }
    }

    /// Whether this side may still open (or reserve) new streams.
    pub(crate) fn may_initiate_new_streams(&self) -> bool {
        !self.goaway.in_progress()
    }

    /// Whether a stream id at or below the high-water mark of its parity
    /// has been used before.
    pub(crate) fn stream_was_used(&self, stream_id: StreamId) -> bool {
        let initiated_by = ClientOrServer::who_initiated_stream(stream_id);
        if initiated_by == self.role {
            match self.role {
                ClientOrServer::Client => stream_id <= self.last_local_stream_id,
                ClientOrServer::Server => stream_id <= self.last_promised_local,
            }
        } else {
            match self.role {
                ClientOrServer::Client => stream_id <= self.last_promised_remote,
                ClientOrServer::Server => stream_id <= self.last_peer_stream_id,
            }
        }
    }

    /// Records a peer-originated stream id the moment it is seen on the
    /// wire, so that a GOAWAY reports it even if the stream never fully
    /// opened.
    pub(crate) fn note_inbound_stream_id(&mut self, stream_id: StreamId) {
        if ClientOrServer::who_initiated_stream(stream_id) != self.role
            && stream_id > self.highest_inbound_stream_id
        {
            self.highest_inbound_stream_id = stream_id;
        }
    }

    /// The error a host call referencing a missing stream gets.
    pub(crate) fn missing_stream_error(&self, stream_id: StreamId) -> Error {
        if self.stream_was_used(stream_id) {
            Error::StreamClosed(stream_id)
        } else {
            Error::NoSuchStream(stream_id)
        }
    }

    pub(crate) fn stream_or_err(&mut self, stream_id: StreamId) -> Result<&mut HttpStreamCommon> {
        if self.streams.get(stream_id).is_none() {
            return Err(self.missing_stream_error(stream_id));
        }
        Ok(self.streams.get_mut(stream_id).unwrap())
    }

    /// Streams the peer has open (reserved streams do not count against
    /// SETTINGS_MAX_CONCURRENT_STREAMS).
    pub(crate) fn peer_initiated_open_streams(&self) -> u32 {
        self.open_streams_initiated_by(self.role.peer())
    }

    pub(crate) fn locally_initiated_open_streams(&self) -> u32 {
        self.open_streams_initiated_by(self.role)
    }

    fn open_streams_initiated_by(&self, initiator: ClientOrServer) -> u32 {
        self.streams
            .map
            .values()
            .filter(|s| ClientOrServer::who_initiated_stream(s.stream_id) == initiator)
            .filter(|s| {
                !matches!(
                    s.state,
                    StreamState::ReservedLocal | StreamState::ReservedRemote
                )
            })
            .count() as u32
    }

    /// Marks the remote side of a stream closed; a fully closed stream
    /// drops to a tombstone.
    pub(crate) fn close_stream_remote(&mut self, stream_id: StreamId) {
        use crate::common::closed_streams::CloseReason;
        if let Some(stream) = self.streams.get_mut(stream_id) {
            stream.close_remote();
            if stream.state.is_closed() {
                self.streams.remove_closed(stream_id, CloseReason::Ended);
            }
        }
    }

    /// Marks the local side of a stream closed; a fully closed stream
    /// drops to a tombstone.
    pub(crate) fn close_stream_local(&mut self, stream_id: StreamId) {
        use crate::common::closed_streams::CloseReason;
        if let Some(stream) = self.streams.get_mut(stream_id) {
            stream.close_local();
            if stream.state.is_closed() {
                self.streams.remove_closed(stream_id, CloseReason::Ended);
            }
        }
    }
}
