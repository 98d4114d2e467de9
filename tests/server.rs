//! Server-side behaviour of the engine.

extern crate h2proto;

mod test_misc;

use bytes::Bytes;

use h2proto::solicit::frame::HeadersFlag;
use h2proto::solicit::frame::HeadersFrame;
use h2proto::Error;
use h2proto::Event;
use h2proto::Header;
use h2proto::Headers;
use h2proto::HttpConnection;
use h2proto::HttpSetting;
use h2proto::StreamState;

use test_misc::*;

#[test]
fn server_receives_get_and_pending_settings_are_acknowledged() {
    init_logger();

    let mut client = HttpConnection::client();
    let mut server = HttpConnection::server();
    client.initiate_connection().unwrap();
    server.initiate_connection().unwrap();

    client.send_headers(1, request_headers(), true).unwrap();

    let events = server.receive_data(&client.take_all()).unwrap();
    assert_eq!(3, events.len());
    match &events[0] {
        Event::RemoteSettingsChanged(e) => {
            assert!(e
                .changed_settings
                .iter()
                .any(|c| c.setting == HttpSetting::MaxConcurrentStreams(100)));
        }
        other => panic!("expected RemoteSettingsChanged, got {:?}", other),
    }
    match &events[1] {
        Event::RequestReceived(e) => {
            assert_eq!(1, e.stream_id);
            assert_eq!(Some("GET"), e.headers.get_opt(":method"));
            assert_eq!(Some("example.com"), e.headers.get_opt(":authority"));
            let ended = e.stream_ended.expect("stream_ended reference");
            assert_eq!(Event::StreamEnded(ended), events[2]);
        }
        other => panic!("expected RequestReceived, got {:?}", other),
    }

    // The client's own advertised settings are pending until the
    // server's ACK arrives.
    let events = client.receive_data(&server.take_all()).unwrap();
    assert!(matches!(events[0], Event::RemoteSettingsChanged(..)));
    match &events[1] {
        Event::SettingsAcknowledged(e) => {
            assert!(e
                .changed_settings
                .iter()
                .any(|c| c.setting == HttpSetting::MaxConcurrentStreams(100)));
        }
        other => panic!("expected SettingsAcknowledged, got {:?}", other),
    }
}

#[test]
fn request_with_body_and_trailers() {
    let (mut client, mut server) = connected_pair();

    let headers = Headers::from_vec(vec![
        Header::new(":method", "POST"),
        Header::new(":scheme", "https"),
        Header::new(":path", "/upload"),
        Header::new(":authority", "example.com"),
    ]);
    client.send_headers(1, headers, false).unwrap();
    client
        .send_data(1, Bytes::from_static(b"payload"), false, None)
        .unwrap();
    client
        .send_trailers(
            1,
            Headers::from_vec(vec![Header::new("x-checksum", "abc123")]),
        )
        .unwrap();

    let events = pump(&mut client, &mut server);
    assert_eq!(4, events.len());
    assert!(matches!(events[0], Event::RequestReceived(..)));
    match &events[1] {
        Event::DataReceived(e) => {
            assert_eq!(&b"payload"[..], &e.data[..]);
            assert_eq!(7, e.flow_controlled_length);
            assert!(e.stream_ended.is_none());
        }
        other => panic!("expected DataReceived, got {:?}", other),
    }
    match &events[2] {
        Event::TrailersReceived(e) => {
            assert_eq!(Some("abc123"), e.headers.get_opt("x-checksum"));
            assert!(e.stream_ended.is_some());
        }
        other => panic!("expected TrailersReceived, got {:?}", other),
    }
    assert!(matches!(events[3], Event::StreamEnded(..)));
}

#[test]
fn trailers_from_host_must_follow_headers() {
    let (mut client, _server) = connected_pair();
    assert!(client
        .send_trailers(1, Headers::from_vec(vec![Header::new("x", "y")]))
        .is_err());
}

#[test]
fn upgrade_connection_creates_half_closed_stream_one() {
    init_logger();

    // SETTINGS_INITIAL_WINDOW_SIZE = 100, base64url encoded.
    let settings_header = b"AAQAAABk";

    let mut server = HttpConnection::server();
    server
        .initiate_upgrade_connection(Some(settings_header))
        .unwrap();

    assert_eq!(Some(StreamState::HalfClosedRemote), server.stream_state(1));

    // The response goes out on stream 1; DATA before HEADERS is refused.
    assert!(server
        .send_data(1, Bytes::from_static(b"x"), false, None)
        .is_err());
    server.send_headers(1, response_headers(), false).unwrap();

    // The upgrade header's INITIAL_WINDOW_SIZE bounds the stream window.
    assert_eq!(
        Err(Error::FlowControl),
        server.send_data(1, Bytes::from(vec![0; 150]), false, None)
    );
    server
        .send_data(1, Bytes::from(vec![0; 100]), true, None)
        .unwrap();
}

#[test]
fn upgrade_connection_server_requires_settings_header() {
    init_logger();
    let mut server = HttpConnection::server();
    assert!(server.initiate_upgrade_connection(None).is_err());
}

#[test]
fn max_concurrent_streams_enforced_inbound() {
    let (mut client, mut server) = connected_pair();

    server
        .update_settings(vec![HttpSetting::MaxConcurrentStreams(0)])
        .unwrap();
    pump(&mut server, &mut client);
    // The client's automatic ACK applies the new limit on the server.
    let events = pump(&mut client, &mut server);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SettingsAcknowledged(..))));

    // An honest client would not open a stream now; craft one.
    let mut frame = HeadersFrame::new(GET_FRAGMENT, 1);
    frame.set_flag(HeadersFlag::EndHeaders);
    let events = server.receive_data(&serialize(frame)).unwrap();
    assert_eq!(1, events.len());
    assert!(matches!(events[0], Event::ConnectionTerminated(..)));
}

#[test]
fn max_concurrent_streams_enforced_outbound() {
    let (mut client, mut server) = connected_pair();

    server
        .update_settings(vec![HttpSetting::MaxConcurrentStreams(1)])
        .unwrap();
    pump(&mut server, &mut client);

    client.send_headers(1, request_headers(), false).unwrap();
    assert_eq!(
        Err(Error::TooManyStreams),
        client.send_headers(3, request_headers(), false)
    );
}

#[test]
fn oversized_header_block_is_split_into_continuations() {
    let (mut client, mut server) = connected_pair();

    // A header value too large for one frame forces CONTINUATION
    // frames on the wire.
    let mut headers = request_headers();
    headers.add("x-large", vec![b'a'; 40_000]);
    client.send_headers(1, headers, true).unwrap();

    let bytes = client.take_all();
    let frames = unpack_frames(&bytes);
    assert!(frames.len() >= 3);
    match &frames[0] {
        h2proto::solicit::frame::HttpFrame::Headers(f) => {
            assert!(!f.is_headers_end());
            assert!(f.is_end_of_stream());
        }
        other => panic!("expected HEADERS, got {:?}", other),
    }
    assert!(frames[1..]
        .iter()
        .all(|f| matches!(f, h2proto::solicit::frame::HttpFrame::Continuation(..))));

    // The server reassembles the block transparently.
    let events = server.receive_data(&bytes).unwrap();
    match &events[0] {
        Event::RequestReceived(e) => {
            assert_eq!(1, e.stream_id);
            assert_eq!(40_000, e.headers.get_opt_bytes("x-large").unwrap().len());
        }
        other => panic!("expected RequestReceived, got {:?}", other),
    }
    assert!(matches!(events[1], Event::StreamEnded(..)));
}

#[test]
fn processing_is_deterministic() {
    init_logger();

    let mut client = HttpConnection::client();
    client.initiate_connection().unwrap();
    client.send_headers(1, request_headers(), false).unwrap();
    client
        .send_data(1, Bytes::from_static(b"body"), true, None)
        .unwrap();
    let input = client.take_all();

    let mut server_a = HttpConnection::server();
    let mut server_b = HttpConnection::server();
    server_a.initiate_connection().unwrap();
    server_b.initiate_connection().unwrap();

    let events_a = server_a.receive_data(&input).unwrap();
    let events_b = server_b.receive_data(&input).unwrap();
    assert_eq!(events_a, events_b);
    assert_eq!(server_a.take_all(), server_b.take_all());
}

#[test]
fn push_stream_id_discipline() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    pump(&mut client, &mut server);

    // Promised ids must be even.
    assert!(server.push_stream(1, 3, request_headers()).is_err());

    server.push_stream(1, 2, request_headers()).unwrap();
    // ...and strictly increasing.
    assert_eq!(
        Err(Error::StreamIdTooLow {
            id: 2,
            last_used: 2
        }),
        server.push_stream(1, 2, request_headers())
    );

    let events = pump(&mut server, &mut client);
    assert!(matches!(events[0], Event::PushedStreamReceived(..)));
}
