//! The send half of the engine: host actions that queue outbound
//! frames.
//!
//! Every operation validates before it mutates, so a failed call leaves
//! the connection state untouched and nothing half-written in the
//! outbound queue.

use bytes::Bytes;

use crate::common::client_or_server::ClientOrServer;
use crate::common::closed_streams::CloseReason;
use crate::common::conn::HttpConnection;
use crate::common::conn::SendPriority;
use crate::common::stream::HttpStreamCommon;
use crate::error::Error;
use crate::headers_place::HeadersPlace;
use crate::req_resp::RequestOrResponse;
use crate::result::Result;
use crate::solicit::error_code::ErrorCode;
use crate::solicit::frame::continuation::ContinuationFlag;
use crate::solicit::frame::AltsvcFrame;
use crate::solicit::frame::ContinuationFrame;
use crate::solicit::frame::DataFlag;
use crate::solicit::frame::DataFrame;
use crate::solicit::frame::HeadersFlag;
use crate::solicit::frame::HeadersFrame;
use crate::solicit::frame::PushPromiseFlag;
use crate::solicit::frame::PushPromiseFrame;
use crate::solicit::frame::RstStreamFrame;
use crate::solicit::frame::StreamDependency;
use crate::solicit::header::Headers;
use crate::solicit::session::StreamState;
use crate::solicit::stream_id::StreamId;

/// What an outbound HEADERS frame means for the stream it rides on.
enum SendHeadersKind {
    /// Client opening a new stream with a request.
    NewRequest,
    /// Server answering on a stream it reserved with PUSH_PROMISE.
    PushedResponse,
    /// Server answering a request; `informational` responses may repeat.
    Response { informational: bool },
    /// Either side finishing a message with trailers.
    Trailers,
}

impl HttpConnection {
    /// Sends a header block on the given stream.
    ///
    /// On a fresh client-parity stream id this opens the stream with a
    /// request; on an existing stream it sends the response,
    /// an informational (1xx) response, or trailers. Trailers must set
    /// `end_stream`.
    pub fn send_headers(
        &mut self,
        stream_id: StreamId,
        headers: Headers,
        end_stream: bool,
    ) -> Result<()> {
        self.send_headers_with_priority(stream_id, headers, end_stream, None)
    }

    /// Like `send_headers`, with optional priority information attached
    /// to the HEADERS frame.
    pub fn send_headers_with_priority(
        &mut self,
        stream_id: StreamId,
        headers: Headers,
        end_stream: bool,
        priority: Option<SendPriority>,
    ) -> Result<()> {
        self.ensure_operational()?;
        if stream_id == 0 {
            return Err(Error::Protocol("HEADERS stream id must be non-zero"));
        }
        if let Some(p) = &priority {
            if p.depends_on == stream_id {
                return Err(Error::Protocol("stream cannot depend on itself"));
            }
        }

        let mut headers = headers;
        if self.config.normalize_outbound_headers {
            headers.strip_value_whitespace();
        }

        let kind = match self.streams.get(stream_id) {
            Some(stream) => {
                if stream.state.is_closed_local() {
                    return Err(Error::StreamClosed(stream_id));
                }
                match stream.state {
                    StreamState::ReservedRemote => {
                        return Err(Error::Protocol(
                            "cannot send HEADERS on a stream reserved by the peer",
                        ))
                    }
                    StreamState::ReservedLocal => SendHeadersKind::PushedResponse,
                    _ if !stream.initial_headers_sent => SendHeadersKind::Response {
                        informational: headers.is_informational(),
                    },
                    _ => SendHeadersKind::Trailers,
                }
            }
            None => {
                if ClientOrServer::who_initiated_stream(stream_id) == self.role
                    && stream_id <= self.last_local_stream_id
                {
                    return Err(Error::StreamIdTooLow {
                        id: stream_id,
                        last_used: self.last_local_stream_id,
                    });
                }
                if self.stream_was_used(stream_id) {
                    return Err(Error::StreamClosed(stream_id));
                }
                SendHeadersKind::NewRequest
            }
        };

        let (direction, place) = match &kind {
            SendHeadersKind::NewRequest => {
                if self.role != ClientOrServer::Client {
                    return Err(Error::Protocol(
                        "servers initiate streams only via push_stream",
                    ));
                }
                if ClientOrServer::who_initiated_stream(stream_id) != self.role {
                    return Err(Error::Protocol("stream id parity does not match role"));
                }
                if !self.may_initiate_new_streams() {
                    return Err(Error::Protocol("cannot open new streams after GOAWAY"));
                }
                if self.locally_initiated_open_streams()
                    >= self.settings.remote.max_concurrent_streams
                {
                    return Err(Error::TooManyStreams);
                }
                (RequestOrResponse::Request, HeadersPlace::Initial)
            }
            SendHeadersKind::PushedResponse => (RequestOrResponse::Response, HeadersPlace::Initial),
            SendHeadersKind::Response { informational } => {
                if *informational && end_stream {
                    return Err(Error::Protocol(
                        "informational response cannot end the stream",
                    ));
                }
                // Only servers wait with headers unsent on a live
                // stream: client streams set `initial_headers_sent`
                // when they open.
                (RequestOrResponse::Response, HeadersPlace::Initial)
            }
            SendHeadersKind::Trailers => {
                if !end_stream {
                    return Err(Error::Protocol("trailers must end the stream"));
                }
                let direction = match self.role {
                    ClientOrServer::Client => RequestOrResponse::Request,
                    ClientOrServer::Server => RequestOrResponse::Response,
                };
                (direction, HeadersPlace::Trailing)
            }
        };

        if self.config.validate_outbound_headers {
            headers.validate(direction, place)?;
        }

        let fragment = self.encode_headers(&headers);

        match kind {
            SendHeadersKind::NewRequest => {
                let mut stream = HttpStreamCommon::new(
                    stream_id,
                    StreamState::Open,
                    self.settings.remote.initial_window_size,
                    self.settings.acked_local.initial_window_size,
                );
                stream.initial_headers_sent = true;
                stream.authority = headers.authority();
                self.streams.insert(stream_id, stream);
                self.last_local_stream_id = stream_id;
            }
            SendHeadersKind::PushedResponse => {
                let stream = self.streams.get_mut(stream_id).unwrap();
                // Figure 2: send HEADERS moves reserved (local) to
                // half-closed (remote).
                stream.state = StreamState::HalfClosedRemote;
                stream.initial_headers_sent = true;
            }
            SendHeadersKind::Response { informational } => {
                if !informational {
                    let stream = self.streams.get_mut(stream_id).unwrap();
                    stream.initial_headers_sent = true;
                }
            }
            SendHeadersKind::Trailers => {}
        }

        let dependency = priority.map(|p| StreamDependency {
            stream_id: p.depends_on,
            weight: p.weight,
            is_exclusive: p.exclusive,
        });
        self.queue_headers_frames(stream_id, fragment, end_stream, dependency);

        if end_stream {
            self.close_stream_local(stream_id);
        }
        Ok(())
    }

    /// Sends a DATA frame, optionally padded.
    ///
    /// The call fails with `Error::FlowControl` if the flow-controlled
    /// length (data plus padding plus the pad length octet) does not fit
    /// in both the stream and the connection send windows; nothing is
    /// buffered in that case. The caller retries after the peer opens
    /// the window, which surfaces as a `WindowUpdated` event.
    pub fn send_data(
        &mut self,
        stream_id: StreamId,
        data: Bytes,
        end_stream: bool,
        pad_length: Option<u8>,
    ) -> Result<()> {
        self.ensure_operational()?;

        let flow_len = data.len() + pad_length.map(|p| 1 + p as usize).unwrap_or(0);

        {
            let stream = match self.streams.get(stream_id) {
                Some(stream) => stream,
                None => return Err(self.missing_stream_error(stream_id)),
            };
            if stream.state.is_closed_local() {
                return Err(Error::StreamClosed(stream_id));
            }
            if !stream.initial_headers_sent {
                return Err(Error::Protocol("cannot send DATA before HEADERS"));
            }
            if flow_len > self.settings.remote.max_frame_size as usize {
                return Err(Error::FrameTooLarge);
            }
            if (flow_len as i64) > stream.out_window_size.size() as i64
                || (flow_len as i64) > self.out_window_size.size() as i64
            {
                return Err(Error::FlowControl);
            }
        }

        self.out_window_size
            .try_decrease(flow_len as i32)
            .map_err(|_| Error::FlowControl)?;
        self.streams
            .get_mut(stream_id)
            .unwrap()
            .out_window_size
            .try_decrease(flow_len as i32)
            .map_err(|_| Error::FlowControl)?;

        let mut frame = DataFrame::with_data(stream_id, data);
        if let Some(pad_length) = pad_length {
            frame.set_padding(pad_length);
        }
        if end_stream {
            frame.set_flag(DataFlag::EndStream);
        }
        self.queue_frame(frame);

        if end_stream {
            self.close_stream_local(stream_id);
        }
        Ok(())
    }

    /// Sends trailers, ending our side of the stream.
    pub fn send_trailers(&mut self, stream_id: StreamId, trailers: Headers) -> Result<()> {
        match self.streams.get(stream_id) {
            Some(stream) if stream.initial_headers_sent => {
                self.send_headers(stream_id, trailers, true)
            }
            Some(_) => Err(Error::Protocol("cannot send trailers before headers")),
            None => Err(self.missing_stream_error(stream_id)),
        }
    }

    /// Reserves `promised_stream_id` for a server push associated with
    /// the given request stream, sending the promised request headers.
    pub fn push_stream(
        &mut self,
        stream_id: StreamId,
        promised_stream_id: StreamId,
        request_headers: Headers,
    ) -> Result<()> {
        self.ensure_operational()?;
        if self.role != ClientOrServer::Server {
            return Err(Error::Protocol("clients may not push streams"));
        }
        if !self.settings.remote.enable_push {
            return Err(Error::Protocol("peer has disabled push"));
        }
        if !self.may_initiate_new_streams() {
            return Err(Error::Protocol("cannot reserve new streams after GOAWAY"));
        }
        if ClientOrServer::who_initiated_stream(promised_stream_id) != ClientOrServer::Server {
            return Err(Error::Protocol("promised stream id must be even"));
        }
        if promised_stream_id <= self.last_promised_local {
            return Err(Error::StreamIdTooLow {
                id: promised_stream_id,
                last_used: self.last_promised_local,
            });
        }
        {
            let parent = match self.streams.get(stream_id) {
                Some(parent) => parent,
                None => return Err(self.missing_stream_error(stream_id)),
            };
            if ClientOrServer::who_initiated_stream(stream_id) != ClientOrServer::Client {
                return Err(Error::Protocol("cannot push on a pushed stream"));
            }
            if parent.state.is_closed_local() {
                return Err(Error::StreamClosed(stream_id));
            }
        }

        let mut request_headers = request_headers;
        if self.config.normalize_outbound_headers {
            request_headers.strip_value_whitespace();
        }
        if self.config.validate_outbound_headers {
            request_headers.validate(RequestOrResponse::Request, HeadersPlace::Initial)?;
        }

        let fragment = self.encode_headers(&request_headers);

        let mut promised = HttpStreamCommon::new(
            promised_stream_id,
            StreamState::ReservedLocal,
            self.settings.remote.initial_window_size,
            self.settings.acked_local.initial_window_size,
        );
        promised.promised = true;
        self.streams.insert(promised_stream_id, promised);
        self.last_promised_local = promised_stream_id;

        self.queue_push_promise_frames(stream_id, promised_stream_id, fragment);
        Ok(())
    }

    /// Abruptly terminates a single stream with RST_STREAM. Subsequent
    /// frames the peer already sent on it are absorbed silently.
    pub fn reset_stream(&mut self, stream_id: StreamId, error_code: ErrorCode) -> Result<()> {
        self.ensure_operational()?;
        if self.streams.get(stream_id).is_none() {
            return Err(self.missing_stream_error(stream_id));
        }
        self.queue_frame(RstStreamFrame::new(stream_id, error_code));
        self.streams
            .remove_closed(stream_id, CloseReason::LocalReset);
        Ok(())
    }

    /// Advertises an RFC 7838 alternative service for the given origin
    /// (server role only).
    pub fn advertise_alternative_service(
        &mut self,
        origin: Bytes,
        field_value: Bytes,
    ) -> Result<()> {
        self.ensure_operational()?;
        if self.role != ClientOrServer::Server {
            return Err(Error::Protocol(
                "only servers advertise alternative services",
            ));
        }
        if origin.is_empty() {
            return Err(Error::Protocol("origin must not be empty"));
        }
        self.queue_frame(AltsvcFrame::new(0, origin, field_value));
        Ok(())
    }

    fn encode_headers(&mut self, headers: &Headers) -> Bytes {
        let encoded = self
            .encoder
            .encode(headers.iter().map(|h| (h.name().as_bytes(), h.value())));
        Bytes::from(encoded)
    }

    /// Queues a HEADERS frame, splitting the fragment into CONTINUATION
    /// frames when it exceeds the peer's SETTINGS_MAX_FRAME_SIZE.
    fn queue_headers_frames(
        &mut self,
        stream_id: StreamId,
        fragment: Bytes,
        end_stream: bool,
        dependency: Option<StreamDependency>,
    ) {
        let max_frame_size = self.settings.remote.max_frame_size as usize;
        let first_capacity = max_frame_size - dependency.map(|_| 5).unwrap_or(0);

        let fits = fragment.len() <= first_capacity;
        let first_fragment = match fits {
            true => fragment.clone(),
            false => fragment.slice(..first_capacity),
        };

        let mut frame = match dependency {
            Some(dep) => HeadersFrame::with_dependency(first_fragment, stream_id, dep),
            None => HeadersFrame::new(first_fragment, stream_id),
        };
        if end_stream {
            frame.set_flag(HeadersFlag::EndStream);
        }
        if fits {
            frame.set_flag(HeadersFlag::EndHeaders);
            self.queue_frame(frame);
            return;
        }
        self.queue_frame(frame);
        self.queue_continuation_frames(stream_id, fragment, first_capacity, max_frame_size);
    }

    fn queue_push_promise_frames(
        &mut self,
        stream_id: StreamId,
        promised_stream_id: StreamId,
        fragment: Bytes,
    ) {
        let max_frame_size = self.settings.remote.max_frame_size as usize;
        // The promised stream id occupies 4 bytes of the first frame.
        let first_capacity = max_frame_size - 4;

        let fits = fragment.len() <= first_capacity;
        let first_fragment = match fits {
            true => fragment.clone(),
            false => fragment.slice(..first_capacity),
        };

        let mut frame = PushPromiseFrame::new(stream_id, promised_stream_id, first_fragment);
        if fits {
            frame.set_flag(PushPromiseFlag::EndHeaders);
            self.queue_frame(frame);
            return;
        }
        self.queue_frame(frame);
        self.queue_continuation_frames(stream_id, fragment, first_capacity, max_frame_size);
    }

    fn queue_continuation_frames(
        &mut self,
        stream_id: StreamId,
        fragment: Bytes,
        mut pos: usize,
        max_frame_size: usize,
    ) {
        while pos < fragment.len() {
            let end = std::cmp::min(pos + max_frame_size, fragment.len());
            let mut cont = ContinuationFrame::new(fragment.slice(pos..end), stream_id);
            if end == fragment.len() {
                cont.set_flag(ContinuationFlag::EndHeaders);
            }
            self.queue_frame(cont);
            pos = end;
        }
    }
}
