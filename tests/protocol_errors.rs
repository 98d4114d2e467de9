//! Error taxonomy: stream-scoped errors reset a stream, connection
//! scoped errors terminate via GOAWAY.

extern crate h2proto;

mod test_misc;

use bytes::Bytes;

use h2proto::solicit::frame::pack_header;
use h2proto::solicit::frame::ContinuationFrame;
use h2proto::solicit::frame::DataFlag;
use h2proto::solicit::frame::DataFrame;
use h2proto::solicit::frame::FrameHeader;
use h2proto::solicit::frame::HeadersFlag;
use h2proto::solicit::frame::HeadersFrame;
use h2proto::solicit::frame::HttpFrame;
use h2proto::solicit::frame::SettingsFrame;
use h2proto::Error;
use h2proto::ErrorCode;
use h2proto::Event;
use h2proto::HttpConnection;

use test_misc::*;

fn assert_terminated(events: &[Event], error_code: ErrorCode) {
    assert_eq!(1, events.len(), "expected only ConnectionTerminated: {:?}", events);
    match &events[0] {
        Event::ConnectionTerminated(e) => assert_eq!(error_code, e.error_code),
        other => panic!("expected ConnectionTerminated, got {:?}", other),
    }
}

fn goaway_frame(conn: &mut HttpConnection) -> h2proto::solicit::frame::GoawayFrame {
    let frames = unpack_frames(&conn.take_all());
    for frame in frames {
        if let HttpFrame::Goaway(f) = frame {
            return f;
        }
    }
    panic!("no GOAWAY queued");
}

#[test]
fn data_during_header_block_is_a_connection_error() {
    let (_client, mut server) = connected_pair();

    // HEADERS without END_HEADERS opens a header block; anything but
    // CONTINUATION must kill the connection.
    let mut bytes = serialize(HeadersFrame::new(&GET_FRAGMENT[..1], 1));
    bytes.extend(serialize(DataFrame::with_data(1, &b"x"[..])));

    let events = server.receive_data(&bytes).unwrap();
    assert_terminated(&events, ErrorCode::ProtocolError);

    let goaway = goaway_frame(&mut server);
    assert_eq!(ErrorCode::ProtocolError, goaway.error_code());
    assert_eq!(1, goaway.last_stream_id);

    // Only flushing remains legal.
    assert_eq!(
        Err(Error::ConnectionMustBeClosed),
        server.receive_data(b"").map(|_| ())
    );
}

#[test]
fn invalid_enable_push_setting_terminates() {
    let (_client, mut server) = connected_pair();

    // SETTINGS { ENABLE_PUSH: 2 } cannot be built through the typed
    // API; splice it together from raw parts.
    let mut bytes = pack_header(&FrameHeader::new(6, 0x4, 0, 0)).to_vec();
    bytes.extend_from_slice(&[0, 2, 0, 0, 0, 2]);

    let events = server.receive_data(&bytes).unwrap();
    // No RemoteSettingsChanged fires.
    assert_terminated(&events, ErrorCode::ProtocolError);
    goaway_frame(&mut server);
}

#[test]
fn data_on_half_closed_remote_resets_the_stream() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), true).unwrap();
    pump(&mut client, &mut server);

    // The client closed its side; more DATA is a stream error only.
    let mut data = DataFrame::with_data(1, &b"late"[..]);
    data.set_flag(DataFlag::EndStream);
    let events = server.receive_data(&serialize(data)).unwrap();

    assert_eq!(1, events.len());
    match &events[0] {
        Event::StreamReset(e) => {
            assert_eq!(1, e.stream_id);
            assert_eq!(ErrorCode::StreamClosed, e.error_code);
            assert!(!e.remote_reset);
        }
        other => panic!("expected StreamReset, got {:?}", other),
    }

    // The connection survives: a new request still works.
    client.send_headers(3, request_headers(), true).unwrap();
    let events = pump(&mut client, &mut server);
    assert!(matches!(events[0], Event::RequestReceived(..)));
}

#[test]
fn headers_on_lower_stream_id_terminates() {
    let (_client, mut server) = connected_pair();

    let mut first = HeadersFrame::new(GET_FRAGMENT, 5);
    first.set_flag(HeadersFlag::EndHeaders);
    let events = server.receive_data(&serialize(first)).unwrap();
    assert!(matches!(events[0], Event::RequestReceived(..)));

    let mut second = HeadersFrame::new(GET_FRAGMENT, 3);
    second.set_flag(HeadersFlag::EndHeaders);
    let events = server.receive_data(&serialize(second)).unwrap();
    assert_terminated(&events, ErrorCode::ProtocolError);
}

#[test]
fn oversized_frame_is_a_frame_size_error() {
    let (_client, mut server) = connected_pair();

    // 17000 bytes exceed the default SETTINGS_MAX_FRAME_SIZE of 16384.
    let frame = DataFrame::with_data(1, vec![0u8; 17_000]);
    let events = server.receive_data(&serialize(frame)).unwrap();
    assert_terminated(&events, ErrorCode::FrameSizeError);

    let goaway = goaway_frame(&mut server);
    assert_eq!(ErrorCode::FrameSizeError, goaway.error_code());
}

#[test]
fn invalid_preface_terminates() {
    init_logger();

    let mut server = HttpConnection::server();
    server.initiate_connection().unwrap();

    let events = server.receive_data(b"GET / HTTP/1.1\r\n\r\n").unwrap();
    assert_terminated(&events, ErrorCode::ProtocolError);
    assert_eq!(
        Err(Error::ConnectionMustBeClosed),
        server.receive_data(b"").map(|_| ())
    );
}

#[test]
fn non_settings_preface_frame_terminates() {
    init_logger();

    let mut client = HttpConnection::client();
    client.initiate_connection().unwrap();

    // The server's half of the preface must be SETTINGS, not PING.
    let ping = h2proto::solicit::frame::PingFrame::new(*b"pingpong");
    let events = client.receive_data(&serialize(ping)).unwrap();
    assert_terminated(&events, ErrorCode::ProtocolError);
}

#[test]
fn trailers_without_end_stream_terminate() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    pump(&mut client, &mut server);

    // A second header block without END_STREAM is not a legal trailer.
    let mut trailers = HeadersFrame::new(GET_FRAGMENT, 1);
    trailers.set_flag(HeadersFlag::EndHeaders);
    let events = server.receive_data(&serialize(trailers)).unwrap();
    assert_terminated(&events, ErrorCode::ProtocolError);
}

#[test]
fn content_length_mismatch_terminates() {
    let (mut client, mut server) = connected_pair();

    let mut headers = request_headers();
    headers.add("content-length", "5");
    client.send_headers(1, headers, false).unwrap();
    client
        .send_data(1, Bytes::from_static(b"abc"), true, None)
        .unwrap();

    let events = pump(&mut client, &mut server);
    assert!(matches!(events[0], Event::RequestReceived(..)));
    match events.last().unwrap() {
        Event::ConnectionTerminated(e) => {
            assert_eq!(ErrorCode::ProtocolError, e.error_code);
        }
        other => panic!("expected ConnectionTerminated, got {:?}", other),
    }
}

#[test]
fn uppercase_header_name_terminates() {
    let (_client, mut server) = connected_pair();

    // :method GET, :scheme http, :path /, then a literal "AA: x".
    let mut fragment = GET_FRAGMENT.to_vec();
    fragment.extend_from_slice(&[0x00, 0x02, b'A', b'A', 0x01, b'x']);

    let mut frame = HeadersFrame::new(fragment, 1);
    frame.set_flag(HeadersFlag::EndHeaders);
    let events = server.receive_data(&serialize(frame)).unwrap();
    assert_terminated(&events, ErrorCode::ProtocolError);
}

#[test]
fn remote_reset_emits_exactly_one_event() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    pump(&mut client, &mut server);

    server.reset_stream(1, ErrorCode::Cancel).unwrap();
    let events = pump(&mut server, &mut client);
    assert_eq!(
        vec![Event::StreamReset(h2proto::event::StreamReset {
            stream_id: 1,
            error_code: ErrorCode::Cancel,
            remote_reset: true,
        })],
        events
    );

    // The stream is gone for the host.
    assert_eq!(
        Err(Error::StreamClosed(1)),
        client.send_data(1, Bytes::from_static(b"x"), false, None)
    );
}

#[test]
fn frames_after_local_reset_are_absorbed() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    pump(&mut client, &mut server);

    server.reset_stream(1, ErrorCode::Cancel).unwrap();
    server.take_all();

    // The client has not seen the RST_STREAM yet and keeps sending.
    client
        .send_data(1, Bytes::from_static(b"straggler"), false, None)
        .unwrap();
    let events = pump(&mut client, &mut server);
    assert_eq!(0, events.len());

    // Only the connection window is topped back up; no RST_STREAM is
    // repeated.
    let frames = unpack_frames(&server.take_all());
    assert_eq!(1, frames.len());
    match &frames[0] {
        HttpFrame::WindowUpdate(f) => {
            assert_eq!(0, f.stream_id);
            assert_eq!(9, f.increment());
        }
        other => panic!("expected WINDOW_UPDATE, got {:?}", other),
    }
}

#[test]
fn continuation_flood_is_denial_of_service() {
    let (_client, mut server) = connected_pair();

    let mut bytes = serialize(HeadersFrame::new(&b""[..], 1));
    for _ in 0..65 {
        bytes.extend(serialize(ContinuationFrame::new(&b""[..], 1)));
    }
    let events = server.receive_data(&bytes).unwrap();
    assert_terminated(&events, ErrorCode::EnhanceYourCalm);
}

#[test]
fn settings_ack_without_pending_changes_terminates() {
    let (_client, mut server) = connected_pair();

    let events = server.receive_data(&serialize(SettingsFrame::new_ack())).unwrap();
    assert_terminated(&events, ErrorCode::ProtocolError);
}

#[test]
fn empty_data_flood_is_denial_of_service() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    pump(&mut client, &mut server);

    let mut bytes = Vec::new();
    for _ in 0..65 {
        bytes.extend(serialize(DataFrame::with_data(1, &b""[..])));
    }
    let events = server.receive_data(&bytes).unwrap();
    // 64 empty frames produce events; the 65th kills the connection.
    match events.last().unwrap() {
        Event::ConnectionTerminated(e) => {
            assert_eq!(ErrorCode::EnhanceYourCalm, e.error_code);
        }
        other => panic!("expected ConnectionTerminated, got {:?}", other),
    }
}

#[test]
fn host_calls_on_unknown_streams() {
    let (mut client, _server) = connected_pair();

    assert_eq!(
        Err(Error::NoSuchStream(9)),
        client.send_data(9, Bytes::from_static(b"x"), false, None)
    );
    assert_eq!(
        Err(Error::NoSuchStream(9)),
        client.reset_stream(9, ErrorCode::Cancel)
    );

    // A half-closed stream can still be reset by the host.
    client.send_headers(1, request_headers(), true).unwrap();
    client.reset_stream(1, ErrorCode::Cancel).unwrap();
    // A second reset finds the stream gone.
    assert_eq!(
        Err(Error::StreamClosed(1)),
        client.reset_stream(1, ErrorCode::Cancel)
    );
}
