//! The receive half of the engine: turns inbound bytes into events.
//!
//! Peer-caused errors never surface as `Err` from `receive_data`.
//! Stream-scoped violations queue a RST_STREAM and emit
//! `StreamReset { remote_reset: false }`; connection-scoped violations
//! queue a GOAWAY, emit `ConnectionTerminated` and latch the engine
//! closed. `Err` is reserved for host mistakes (calling before
//! `initiate_connection`, or after termination).

use bytes::Bytes;

use crate::common::closed_streams::CloseReason;
use crate::common::conn::ConnectionState;
use crate::common::conn::HttpConnection;
use crate::common::header_block::HeaderBlockInProgress;
use crate::common::header_block::HeaderBlockKind;
use crate::common::stream::HttpStreamCommon;
use crate::config::HeaderEncoding;
use crate::error::Error;
use crate::event::*;
use crate::headers_place::HeadersPlace;
use crate::req_resp::RequestOrResponse;
use crate::result::Result;
use crate::common::client_or_server::ClientOrServer;
use crate::solicit::error_code::ErrorCode;
use crate::solicit::frame::AltsvcFrame;
use crate::solicit::frame::ContinuationFrame;
use crate::solicit::frame::DataFrame;
use crate::solicit::frame::Frame;
use crate::solicit::frame::GoawayFrame;
use crate::solicit::frame::HeadersFrame;
use crate::solicit::frame::HttpFrame;
use crate::solicit::frame::HttpSetting;
use crate::solicit::frame::PingFrame;
use crate::solicit::frame::PriorityFrame;
use crate::solicit::frame::PushPromiseFrame;
use crate::solicit::frame::RstStreamFrame;
use crate::solicit::frame::SettingsFrame;
use crate::solicit::frame::StreamDependency;
use crate::solicit::frame::WindowUpdateFrame;
use crate::solicit::header::ContentLength;
use crate::solicit::header::Header;
use crate::solicit::header::HeaderError;
use crate::solicit::header::Headers;
use crate::solicit::session::StreamState;
use crate::solicit::stream_id::StreamId;
use crate::solicit::window_size::MAX_WINDOW_SIZE;

/// Consecutive empty DATA frames without END_STREAM tolerated before the
/// peer is assumed to be wasting our time.
const MAX_EMPTY_DATA_FRAMES: u32 = 64;

/// What to do with a frame that addresses a stream.
enum StreamDisposition {
    /// The stream is live and in a state that accepts the frame.
    Deliver,
    /// The stream is live but the peer already closed its side.
    ResetStream,
    /// The stream is gone; the reason tells how it went.
    Tombstone(CloseReason),
    /// The stream id was used once, but the tombstone has aged out of
    /// the bounded closed set.
    Collected,
    /// The stream id has never been used.
    Idle,
}

impl HttpConnection {
    /// Feeds bytes received from the peer into the engine and returns
    /// the events they triggered, in exact arrival order.
    pub fn receive_data(&mut self, data: &[u8]) -> Result<Vec<Event>> {
        match self.state {
            ConnectionState::Idle => return Err(Error::ConnectionNotInitiated),
            ConnectionState::Closed => return Err(Error::ConnectionMustBeClosed),
            _ => {}
        }

        let mut events = Vec::new();

        if let Err(e) = self.frame_buffer.add_data(data) {
            self.terminate_with(Error::from(e), &mut events);
            return Ok(events);
        }

        loop {
            if self.state == ConnectionState::Closed {
                break;
            }
            let raw = match self.frame_buffer.next_frame() {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(e) => {
                    self.terminate_with(Error::from(e), &mut events);
                    break;
                }
            };
            if let Err(e) = self.process_raw_frame(raw, &mut events) {
                self.terminate_with(e, &mut events);
                break;
            }
        }

        Ok(events)
    }

    /// Connection error handling: queue GOAWAY, report, latch closed.
    fn terminate_with(&mut self, e: Error, events: &mut Vec<Event>) {
        let error_code = e.goaway_error_code();
        warn!("connection error: {}; sending GOAWAY {:?}", e, error_code);
        self.queue_goaway(error_code, Bytes::new());
        self.state = ConnectionState::Closed;
        events.push(Event::ConnectionTerminated(ConnectionTerminated {
            error_code,
            last_stream_id: self.highest_inbound_stream_id,
            additional_data: None,
        }));
    }

    /// Stream error handling: queue RST_STREAM, drop the stream, report.
    fn stream_error(&mut self, stream_id: StreamId, error_code: ErrorCode, events: &mut Vec<Event>) {
        warn!("resetting stream {}: {:?}", stream_id, error_code);
        self.queue_frame(RstStreamFrame::new(stream_id, error_code));
        if self.streams.get(stream_id).is_some() {
            self.streams.remove_closed(stream_id, CloseReason::LocalReset);
        } else {
            self.streams.closed.add(stream_id, CloseReason::LocalReset);
        }
        events.push(Event::StreamReset(StreamReset {
            stream_id,
            error_code,
            remote_reset: false,
        }));
    }

    fn process_raw_frame(&mut self, raw: crate::solicit::frame::RawFrame, events: &mut Vec<Event>) -> Result<()> {
        let frame = HttpFrame::from_raw(&raw)?;
        debug!("received frame: {:?}", frame);

        // A header block in progress admits nothing but CONTINUATION.
        if self.header_block.is_some() {
            return match frame {
                HttpFrame::Continuation(f) => self.process_continuation(f, events),
                _ => Err(Error::Protocol(
                    "expected CONTINUATION while a header block is in progress",
                )),
            };
        }

        // The peer's half of the connection preface must be a SETTINGS
        // frame.
        if let ConnectionState::PrefaceExpected | ConnectionState::PrefaceSent = self.state {
            match &frame {
                HttpFrame::Settings(f) if !f.is_ack() => {
                    self.state = ConnectionState::Established;
                }
                _ => return Err(Error::Protocol("expected SETTINGS as the first frame")),
            }
        }

        match frame {
            HttpFrame::Data(f) => self.process_data(f, events),
            HttpFrame::Headers(f) => self.process_headers_frame(f, events),
            HttpFrame::Priority(f) => self.process_priority(f, events),
            HttpFrame::RstStream(f) => self.process_rst_stream(f, events),
            HttpFrame::Settings(f) => self.process_settings(f, events),
            HttpFrame::PushPromise(f) => self.process_push_promise_frame(f, events),
            HttpFrame::Ping(f) => self.process_ping(f, events),
            HttpFrame::Goaway(f) => self.process_goaway(f, events),
            HttpFrame::WindowUpdate(f) => self.process_window_update(f, events),
            HttpFrame::Continuation(_) => {
                Err(Error::Protocol("CONTINUATION without a preceding HEADERS"))
            }
            HttpFrame::Altsvc(f) => self.process_altsvc(f, events),
            HttpFrame::Unknown(f) => {
                // 4.1: implementations MUST ignore and discard any frame
                // that has a type that is unknown.
                debug!("ignoring unknown frame type {}", f.frame_type());
                Ok(())
            }
        }
    }

    fn stream_disposition(&self, stream_id: StreamId, deliverable: fn(&HttpStreamCommon) -> bool) -> StreamDisposition {
        match self.streams.get(stream_id) {
            Some(stream) if deliverable(stream) => StreamDisposition::Deliver,
            Some(_) => StreamDisposition::ResetStream,
            None => match self.streams.closed.get(stream_id) {
                Some(reason) => StreamDisposition::Tombstone(reason),
                None if self.stream_was_used(stream_id) => StreamDisposition::Collected,
                None => StreamDisposition::Idle,
            },
        }
    }

    /// Re-opens the connection receive window for bytes the host will
    /// never see (DATA on reset or closed streams).
    fn auto_ack_conn_window(&mut self, flow_len: u32) {
        if flow_len == 0 {
            return;
        }
        let _ = self.in_window_size.try_increase(flow_len);
        self.queue_frame(WindowUpdateFrame::for_connection(flow_len));
    }

    /// Remote END_STREAM bookkeeping: verifies the announced
    /// content-length, closes the remote side, and hands back the event
    /// to emit.
    fn end_stream_remote(&mut self, stream_id: StreamId) -> Result<StreamEnded> {
        if let Some(stream) = self.streams.get(stream_id) {
            if let Some(expected) = stream.expected_content_length {
                if stream.received_body_len != expected {
                    return Err(Error::Protocol(
                        "content-length does not match the received body",
                    ));
                }
            }
        }
        self.close_stream_remote(stream_id);
        Ok(StreamEnded { stream_id })
    }

    fn process_data(&mut self, frame: DataFrame, events: &mut Vec<Event>) -> Result<()> {
        let stream_id = frame.get_stream_id();
        let flow_len = frame.flow_controlled_length();

        if flow_len == 0 && !frame.is_end_of_stream() {
            self.consecutive_empty_data_frames += 1;
            if self.consecutive_empty_data_frames > MAX_EMPTY_DATA_FRAMES {
                return Err(Error::DenialOfService("too many empty DATA frames"));
            }
        } else {
            self.consecutive_empty_data_frames = 0;
        }

        // The connection window pays for the frame no matter what state
        // the stream is in.
        self.in_window_size
            .try_decrease_to_non_negative(flow_len as i32)
            .map_err(|_| Error::FlowControl)?;

        match self.stream_disposition(stream_id, |s| s.state.peer_may_send_data()) {
            StreamDisposition::Deliver => {
                let end_stream = frame.is_end_of_stream();
                {
                    let stream = self.streams.get_mut(stream_id).unwrap();
                    stream
                        .in_window_size
                        .try_decrease_to_non_negative(flow_len as i32)
                        .map_err(|_| Error::FlowControl)?;
                    stream.received_body_len += frame.data.len() as u64;
                    if let Some(expected) = stream.expected_content_length {
                        if stream.received_body_len > expected {
                            return Err(Error::Protocol(
                                "received more body bytes than content-length",
                            ));
                        }
                    }
                    stream.unacked_recv = stream.unacked_recv.saturating_add(flow_len);
                }
                self.conn_unacked_recv = self.conn_unacked_recv.saturating_add(flow_len);

                let stream_ended = match end_stream {
                    true => Some(self.end_stream_remote(stream_id)?),
                    false => None,
                };
                events.push(Event::DataReceived(DataReceived {
                    stream_id,
                    data: frame.data,
                    flow_controlled_length: flow_len,
                    stream_ended,
                }));
                if let Some(se) = stream_ended {
                    events.push(Event::StreamEnded(se));
                }
                Ok(())
            }
            StreamDisposition::ResetStream => {
                self.auto_ack_conn_window(flow_len);
                self.stream_error(stream_id, ErrorCode::StreamClosed, events);
                Ok(())
            }
            StreamDisposition::Tombstone(CloseReason::LocalReset) => {
                debug!("absorbing DATA on locally reset stream {}", stream_id);
                self.auto_ack_conn_window(flow_len);
                Ok(())
            }
            StreamDisposition::Tombstone(_) => {
                self.auto_ack_conn_window(flow_len);
                self.queue_frame(RstStreamFrame::new(stream_id, ErrorCode::StreamClosed));
                Ok(())
            }
            // The stream can no longer be told apart from one that never
            // reached the closed state cleanly.
            StreamDisposition::Collected => Err(Error::StreamClosed(stream_id)),
            StreamDisposition::Idle => Err(Error::Protocol("DATA on idle stream")),
        }
    }

    fn process_headers_frame(&mut self, frame: HeadersFrame, events: &mut Vec<Event>) -> Result<()> {
        self.note_inbound_stream_id(frame.stream_id);
        if !frame.is_headers_end() {
            self.header_block = Some(HeaderBlockInProgress::from_headers_frame(&frame));
            return Ok(());
        }
        self.process_headers_complete(
            frame.stream_id,
            frame.is_end_of_stream(),
            frame.stream_dep,
            frame.header_fragment,
            events,
        )
    }

    fn process_push_promise_frame(
        &mut self,
        frame: PushPromiseFrame,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        if !frame.is_headers_end() {
            self.header_block = Some(HeaderBlockInProgress::from_push_promise_frame(&frame));
            return Ok(());
        }
        self.process_push_promise_complete(
            frame.stream_id,
            frame.promised_stream_id,
            frame.header_fragment,
            events,
        )
    }

    fn process_continuation(
        &mut self,
        frame: ContinuationFrame,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        {
            let block = self
                .header_block
                .as_mut()
                .expect("continuation dispatched without an open header block");
            block.push_continuation(&frame)?;
        }
        if !frame.is_headers_end() {
            return Ok(());
        }

        let block = self.header_block.take().unwrap();
        let stream_id = block.stream_id;
        match block.kind {
            HeaderBlockKind::Headers {
                end_stream,
                priority,
            } => {
                let fragment = block.into_fragment();
                self.process_headers_complete(stream_id, end_stream, priority, fragment, events)
            }
            HeaderBlockKind::PushPromise { promised_stream_id } => {
                let fragment = block.into_fragment();
                self.process_push_promise_complete(stream_id, promised_stream_id, fragment, events)
            }
        }
    }

    /// Runs the complete header block fragment through HPACK and builds
    /// the header list.
    ///
    /// This must happen for every completed block, even ones that end up
    /// discarded, so that the decoder's dynamic table stays in sync with
    /// the peer's encoder. Only structural checks happen here; the RFC
    /// discipline is applied by `finish_headers` once the direction is
    /// known.
    fn decode_header_block(&mut self, fragment: Bytes) -> Result<Headers> {
        let raw = self.decoder.decode(&fragment)?;

        let mut headers = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let value = Bytes::from(value);
            if self.config.header_encoding == HeaderEncoding::Utf8
                && std::str::from_utf8(&value).is_err()
            {
                return Err(Error::InvalidHeader(HeaderError::HeaderValueNotUtf8));
            }
            headers.push(Header::from_wire(Bytes::from(name), value)?);
        }

        if self.config.validate_inbound_headers {
            Ok(Headers::from_vec_pseudo_first(headers)?)
        } else {
            Ok(Headers::from_vec(headers))
        }
    }

    /// Validates decoded headers for their position in the message, then
    /// normalizes them for the host. Validation sees the names exactly
    /// as the peer sent them.
    fn finish_headers(
        &self,
        mut headers: Headers,
        direction: RequestOrResponse,
        place: HeadersPlace,
    ) -> Result<Headers> {
        if self.config.validate_inbound_headers {
            headers.validate(direction, place)?;
        }
        if self.config.normalize_inbound_headers {
            headers.normalize();
        }
        Ok(headers)
    }

    fn process_headers_complete(
        &mut self,
        stream_id: StreamId,
        end_stream: bool,
        priority: Option<StreamDependency>,
        fragment: Bytes,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        // Decode first: HPACK state must advance even if the headers are
        // then thrown away.
        let headers = self.decode_header_block(fragment)?;

        if let Some(dep) = priority {
            if dep.stream_id == stream_id {
                return Err(Error::Protocol("stream cannot depend on itself"));
            }
        }
        let priority_updated = priority.map(|dep| PriorityUpdated {
            stream_id,
            weight: dep.weight,
            depends_on: dep.stream_id,
            exclusive: dep.is_exclusive,
        });

        match self.stream_disposition(stream_id, |s| !s.state.is_closed_remote()) {
            StreamDisposition::Deliver => {
                self.process_headers_on_stream(stream_id, end_stream, priority_updated, headers, events)
            }
            StreamDisposition::ResetStream => {
                // 4.5 robustness policy: HEADERS in half-closed (remote)
                // resets the stream instead of killing the connection.
                self.stream_error(stream_id, ErrorCode::StreamClosed, events);
                Ok(())
            }
            StreamDisposition::Tombstone(CloseReason::LocalReset) => {
                debug!("absorbing HEADERS on locally reset stream {}", stream_id);
                Ok(())
            }
            StreamDisposition::Tombstone(_) => {
                self.queue_frame(RstStreamFrame::new(stream_id, ErrorCode::StreamClosed));
                Ok(())
            }
            // Re-opening a used id fails the id monotonicity checks of
            // the new-stream path.
            StreamDisposition::Collected | StreamDisposition::Idle => {
                self.process_headers_new_stream(stream_id, end_stream, priority_updated, headers, events)
            }
        }
    }

    /// HEADERS opening a stream: only servers accept these, and only on
    /// fresh client-parity ids.
    fn process_headers_new_stream(
        &mut self,
        stream_id: StreamId,
        end_stream: bool,
        priority_updated: Option<PriorityUpdated>,
        headers: Headers,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        if self.role == ClientOrServer::Client {
            return Err(Error::Protocol("server may not initiate streams"));
        }
        if ClientOrServer::who_initiated_stream(stream_id) != ClientOrServer::Client {
            return Err(Error::Protocol(
                "peer-initiated streams must use client parity",
            ));
        }
        if stream_id <= self.last_peer_stream_id {
            return Err(Error::StreamIdTooLow {
                id: stream_id,
                last_used: self.last_peer_stream_id,
            });
        }
        if self.goaway.local_sent.is_some() {
            // We told the peer to stop: streams above the GOAWAY's last
            // stream id are refused, not processed.
            debug!("refusing stream {} opened after GOAWAY", stream_id);
            self.last_peer_stream_id = stream_id;
            self.queue_frame(RstStreamFrame::new(stream_id, ErrorCode::RefusedStream));
            self.streams.closed.add(stream_id, CloseReason::LocalReset);
            return Ok(());
        }
        if self.peer_initiated_open_streams() >= self.settings.acked_local.max_concurrent_streams {
            return Err(Error::TooManyStreams);
        }
        let headers = self.finish_headers(headers, RequestOrResponse::Request, HeadersPlace::Initial)?;
        let expected_content_length = match headers.content_length() {
            ContentLength::Absent => None,
            ContentLength::Valid(len) => Some(len),
            ContentLength::Malformed => {
                return Err(Error::InvalidHeader(HeaderError::MalformedContentLength))
            }
        };

        let mut stream = HttpStreamCommon::new(
            stream_id,
            StreamState::Open,
            self.settings.remote.initial_window_size,
            self.settings.acked_local.initial_window_size,
        );
        stream.initial_headers_received = true;
        stream.expected_content_length = expected_content_length;
        self.streams.insert(stream_id, stream);
        self.last_peer_stream_id = stream_id;

        let stream_ended = match end_stream {
            true => Some(self.end_stream_remote(stream_id)?),
            false => None,
        };

        events.push(Event::RequestReceived(RequestReceived {
            stream_id,
            headers,
            stream_ended,
            priority_updated,
        }));
        if let Some(pu) = priority_updated {
            events.push(Event::PriorityUpdated(pu));
        }
        if let Some(se) = stream_ended {
            events.push(Event::StreamEnded(se));
        }
        Ok(())
    }

    /// HEADERS on a live stream: a (possibly informational) response on
    /// the client side, the response to a promised request, or
    /// trailers.
    fn process_headers_on_stream(
        &mut self,
        stream_id: StreamId,
        end_stream: bool,
        priority_updated: Option<PriorityUpdated>,
        headers: Headers,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let (state, awaiting_final_headers) = {
            let stream = self.streams.get(stream_id).unwrap();
            (stream.state, !stream.initial_headers_received)
        };

        if state == StreamState::ReservedLocal {
            return Err(Error::Protocol("HEADERS on a stream reserved by us"));
        }

        if awaiting_final_headers {
            // Only a client ever waits for headers on a live stream; the
            // server creates streams when the request headers arrive.
            if headers.is_informational() {
                if end_stream {
                    return Err(Error::Protocol(
                        "informational response carried END_STREAM",
                    ));
                }
                let headers = self.finish_headers(
                    headers,
                    RequestOrResponse::Response,
                    HeadersPlace::Initial,
                )?;
                events.push(Event::InformationalResponseReceived(
                    InformationalResponseReceived {
                        stream_id,
                        headers,
                        priority_updated,
                    },
                ));
                if let Some(pu) = priority_updated {
                    events.push(Event::PriorityUpdated(pu));
                }
                return Ok(());
            }

            let headers = self.finish_headers(
                headers,
                RequestOrResponse::Response,
                HeadersPlace::Initial,
            )?;
            let expected_content_length = match headers.content_length() {
                ContentLength::Absent => None,
                ContentLength::Valid(len) => Some(len),
                ContentLength::Malformed => {
                    return Err(Error::InvalidHeader(HeaderError::MalformedContentLength))
                }
            };
            {
                let stream = self.streams.get_mut(stream_id).unwrap();
                stream.initial_headers_received = true;
                stream.expected_content_length = expected_content_length;
                if stream.state == StreamState::ReservedRemote {
                    // Figure 2: recv HEADERS moves a reserved (remote)
                    // stream to half-closed (local).
                    stream.state = StreamState::HalfClosedLocal;
                }
            }

            let stream_ended = match end_stream {
                true => Some(self.end_stream_remote(stream_id)?),
                false => None,
            };
            events.push(Event::ResponseReceived(ResponseReceived {
                stream_id,
                headers,
                stream_ended,
                priority_updated,
            }));
            if let Some(pu) = priority_updated {
                events.push(Event::PriorityUpdated(pu));
            }
            if let Some(se) = stream_ended {
                events.push(Event::StreamEnded(se));
            }
            return Ok(());
        }

        // Trailers.
        if !end_stream {
            return Err(Error::Protocol("trailers must carry END_STREAM"));
        }
        let direction = match self.role {
            ClientOrServer::Server => RequestOrResponse::Request,
            ClientOrServer::Client => RequestOrResponse::Response,
        };
        let headers = self.finish_headers(headers, direction, HeadersPlace::Trailing)?;
        {
            let stream = self.streams.get_mut(stream_id).unwrap();
            stream.trailers_received = true;
        }
        let stream_ended = Some(self.end_stream_remote(stream_id)?);
        events.push(Event::TrailersReceived(TrailersReceived {
            stream_id,
            headers,
            stream_ended,
            priority_updated,
        }));
        if let Some(pu) = priority_updated {
            events.push(Event::PriorityUpdated(pu));
        }
        if let Some(se) = stream_ended {
            events.push(Event::StreamEnded(se));
        }
        Ok(())
    }

    fn process_push_promise_complete(
        &mut self,
        stream_id: StreamId,
        promised_stream_id: StreamId,
        fragment: Bytes,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        // Keep the decoder in sync before any policy decision.
        let headers = self.decode_header_block(fragment)?;

        if self.role == ClientOrServer::Server {
            return Err(Error::Protocol("clients may not push streams"));
        }
        if !self.settings.acked_local.enable_push {
            return Err(Error::Protocol("received PUSH_PROMISE with push disabled"));
        }
        if promised_stream_id == 0
            || ClientOrServer::who_initiated_stream(promised_stream_id) != ClientOrServer::Server
        {
            return Err(Error::Protocol("promised stream id must be even"));
        }
        if promised_stream_id <= self.last_promised_remote {
            return Err(Error::StreamIdTooLow {
                id: promised_stream_id,
                last_used: self.last_promised_remote,
            });
        }
        if ClientOrServer::who_initiated_stream(stream_id) != ClientOrServer::Client {
            return Err(Error::Protocol(
                "pushed streams must be associated with a client-initiated stream",
            ));
        }

        match self.stream_disposition(stream_id, |s| !s.state.is_closed_remote()) {
            StreamDisposition::Deliver => {}
            StreamDisposition::ResetStream => {
                // The parent can no longer carry frames from the peer:
                // reset it, and refuse the stream the peer reserved.
                self.last_promised_remote = promised_stream_id;
                self.queue_frame(RstStreamFrame::new(
                    promised_stream_id,
                    ErrorCode::RefusedStream,
                ));
                self.streams
                    .closed
                    .add(promised_stream_id, CloseReason::LocalReset);
                self.stream_error(stream_id, ErrorCode::StreamClosed, events);
                return Ok(());
            }
            StreamDisposition::Tombstone(_) => {
                self.last_promised_remote = promised_stream_id;
                self.queue_frame(RstStreamFrame::new(
                    promised_stream_id,
                    ErrorCode::RefusedStream,
                ));
                self.streams
                    .closed
                    .add(promised_stream_id, CloseReason::LocalReset);
                return Ok(());
            }
            StreamDisposition::Collected => return Err(Error::StreamClosed(stream_id)),
            StreamDisposition::Idle => {
                return Err(Error::Protocol("PUSH_PROMISE on idle stream"))
            }
        }

        let headers =
            self.finish_headers(headers, RequestOrResponse::Request, HeadersPlace::Initial)?;

        self.last_promised_remote = promised_stream_id;
        self.note_inbound_stream_id(promised_stream_id);
        let mut stream = HttpStreamCommon::new(
            promised_stream_id,
            StreamState::ReservedRemote,
            self.settings.remote.initial_window_size,
            self.settings.acked_local.initial_window_size,
        );
        stream.promised = true;
        self.streams.insert(promised_stream_id, stream);

        events.push(Event::PushedStreamReceived(PushedStreamReceived {
            pushed_stream_id: promised_stream_id,
            parent_stream_id: stream_id,
            headers,
        }));
        Ok(())
    }

    fn process_priority(&mut self, frame: PriorityFrame, events: &mut Vec<Event>) -> Result<()> {
        if frame.dependency.stream_id == frame.stream_id {
            return Err(Error::Protocol("stream cannot depend on itself"));
        }
        // PRIORITY is valid in any stream state, including idle.
        events.push(Event::PriorityUpdated(PriorityUpdated {
            stream_id: frame.stream_id,
            weight: frame.dependency.weight,
            depends_on: frame.dependency.stream_id,
            exclusive: frame.dependency.is_exclusive,
        }));
        Ok(())
    }

    fn process_rst_stream(&mut self, frame: RstStreamFrame, events: &mut Vec<Event>) -> Result<()> {
        let stream_id = frame.get_stream_id();
        match self.streams.get(stream_id) {
            Some(_) => {
                self.streams
                    .remove_closed(stream_id, CloseReason::RemoteReset);
                events.push(Event::StreamReset(StreamReset {
                    stream_id,
                    error_code: frame.error_code(),
                    remote_reset: true,
                }));
                Ok(())
            }
            None if self.stream_was_used(stream_id) => {
                debug!("ignoring RST_STREAM on closed stream {}", stream_id);
                Ok(())
            }
            None => Err(Error::Protocol("RST_STREAM on idle stream")),
        }
    }

    fn process_settings(&mut self, frame: SettingsFrame, events: &mut Vec<Event>) -> Result<()> {
        if frame.is_ack() {
            let batch = self
                .settings
                .pop_pending()
                .ok_or(Error::Protocol("SETTINGS ACK with no change outstanding"))?;

            let mut changed_settings = Vec::with_capacity(batch.len());
            for setting in batch {
                let original_value = self.settings.acked_local.get(setting).get_val();
                match setting {
                    HttpSetting::InitialWindowSize(new) => {
                        self.apply_local_initial_window_change(original_value, new)?;
                    }
                    HttpSetting::HeaderTableSize(new) => {
                        // The decoder table only shrinks/grows once the
                        // peer has confirmed it saw the new size.
                        self.decoder.set_max_table_size(new as usize);
                    }
                    HttpSetting::MaxFrameSize(new) => {
                        self.frame_buffer.set_max_frame_size(new);
                    }
                    _ => {}
                }
                self.settings.acked_local.apply(setting);
                changed_settings.push(ChangedSetting {
                    setting,
                    original_value,
                });
            }
            events.push(Event::SettingsAcknowledged(SettingsAcknowledged {
                changed_settings,
            }));
            return Ok(());
        }

        let mut changed_settings = Vec::with_capacity(frame.settings.len());
        for setting in &frame.settings {
            let original_value = self.settings.remote.get(*setting).get_val();
            if let HttpSetting::InitialWindowSize(new) = *setting {
                if new > MAX_WINDOW_SIZE {
                    // 6.5.2: values above 2^31-1 are a connection error
                    // of type FLOW_CONTROL_ERROR.
                    return Err(Error::FlowControl);
                }
                self.apply_remote_initial_window_change(original_value, new)?;
            }
            self.settings.remote.apply(*setting);
            changed_settings.push(ChangedSetting {
                setting: *setting,
                original_value,
            });
        }

        self.queue_frame(SettingsFrame::new_ack());
        events.push(Event::RemoteSettingsChanged(RemoteSettingsChanged {
            changed_settings,
        }));
        Ok(())
    }

    /// 6.9.2: a SETTINGS_INITIAL_WINDOW_SIZE change adjusts every
    /// stream window by the delta; overflowing any window kills the
    /// connection.
    fn apply_remote_initial_window_change(&mut self, old: u32, new: u32) -> Result<()> {
        let delta = new as i64 - old as i64;
        if delta == 0 {
            return Ok(());
        }
        for stream in self.streams.map.values_mut() {
            stream
                .out_window_size
                .try_apply_delta(delta as i32)
                .map_err(|_| Error::FlowControl)?;
        }
        Ok(())
    }

    fn apply_local_initial_window_change(&mut self, old: u32, new: u32) -> Result<()> {
        let delta = new as i64 - old as i64;
        if delta == 0 {
            return Ok(());
        }
        for stream in self.streams.map.values_mut() {
            stream
                .in_window_size
                .try_apply_delta(delta as i32)
                .map_err(|_| Error::FlowControl)?;
        }
        Ok(())
    }

    fn process_ping(&mut self, frame: PingFrame, events: &mut Vec<Event>) -> Result<()> {
        if frame.is_ack() {
            events.push(Event::PingAcknowledged(PingAcknowledged {
                ping_data: frame.opaque_data(),
            }));
        } else {
            self.queue_frame(PingFrame::new_ack(frame.opaque_data()));
            events.push(Event::PingReceived(PingReceived {
                ping_data: frame.opaque_data(),
            }));
        }
        Ok(())
    }

    fn process_goaway(&mut self, frame: GoawayFrame, events: &mut Vec<Event>) -> Result<()> {
        self.goaway.remote_received = Some(frame.last_stream_id);
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::GoawayReceived;
        }
        events.push(Event::ConnectionTerminated(ConnectionTerminated {
            error_code: frame.error_code(),
            last_stream_id: frame.last_stream_id,
            additional_data: match frame.debug_data.is_empty() {
                true => None,
                false => Some(frame.debug_data),
            },
        }));
        Ok(())
    }

    fn process_window_update(
        &mut self,
        frame: WindowUpdateFrame,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let stream_id = frame.get_stream_id();
        let increment = frame.increment();

        if stream_id == 0 {
            if increment == 0 {
                return Err(Error::Protocol("WINDOW_UPDATE with zero increment"));
            }
            self.out_window_size
                .try_increase(increment)
                .map_err(|_| Error::FlowControl)?;
            events.push(Event::WindowUpdated(WindowUpdated {
                stream_id: 0,
                delta: increment,
            }));
            return Ok(());
        }

        if self.streams.get(stream_id).is_some() {
            if increment == 0 {
                self.stream_error(stream_id, ErrorCode::ProtocolError, events);
                return Ok(());
            }
            let increased = self
                .streams
                .get_mut(stream_id)
                .unwrap()
                .out_window_size
                .try_increase(increment)
                .is_ok();
            if increased {
                events.push(Event::WindowUpdated(WindowUpdated {
                    stream_id,
                    delta: increment,
                }));
            } else {
                self.stream_error(stream_id, ErrorCode::FlowControlError, events);
            }
            Ok(())
        } else if self.stream_was_used(stream_id) {
            // 6.9: WINDOW_UPDATE can legally arrive on half-closed or
            // closed streams.
            debug!("ignoring WINDOW_UPDATE on closed stream {}", stream_id);
            Ok(())
        } else {
            Err(Error::Protocol("WINDOW_UPDATE on idle stream"))
        }
    }

    fn process_altsvc(&mut self, frame: AltsvcFrame, events: &mut Vec<Event>) -> Result<()> {
        if self.role == ClientOrServer::Server {
            debug!("ignoring ALTSVC received by server");
            return Ok(());
        }

        if frame.stream_id == 0 {
            if frame.origin.is_empty() {
                debug!("ignoring ALTSVC with empty origin on stream 0");
                return Ok(());
            }
            events.push(Event::AlternativeServiceAvailable(
                AlternativeServiceAvailable {
                    origin: frame.origin,
                    field_value: frame.field_value,
                },
            ));
            return Ok(());
        }

        // On a request stream the origin must be empty and is inferred
        // from the `:authority` the request carried. Without one the
        // frame is dropped.
        if !frame.origin.is_empty() {
            debug!("ignoring ALTSVC with explicit origin on stream {}", frame.stream_id);
            return Ok(());
        }
        let origin = self
            .streams
            .get(frame.stream_id)
            .and_then(|s| s.authority.clone());
        match origin {
            Some(origin) => {
                events.push(Event::AlternativeServiceAvailable(
                    AlternativeServiceAvailable {
                        origin,
                        field_value: frame.field_value,
                    },
                ));
            }
            None => {
                debug!(
                    "ignoring ALTSVC on stream {} without known authority",
                    frame.stream_id
                );
            }
        }
        Ok(())
    }
}
