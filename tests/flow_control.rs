//! Flow control accounting on both sides of a connection.

extern crate h2proto;

mod test_misc;

use bytes::Bytes;

use h2proto::solicit::frame::HttpFrame;
use h2proto::solicit::frame::WindowUpdateFrame;
use h2proto::Error;
use h2proto::ErrorCode;
use h2proto::Event;
use h2proto::HttpConnection;
use h2proto::HttpSetting;

use test_misc::*;

/// A pair where the server advertised INITIAL_WINDOW_SIZE = 10 before
/// the client opened stream 1.
fn pair_with_small_server_window() -> (HttpConnection, HttpConnection) {
    let (mut client, mut server) = connected_pair();
    server
        .update_settings(vec![HttpSetting::InitialWindowSize(10)])
        .unwrap();
    let events = pump(&mut server, &mut client);
    assert!(matches!(events[0], Event::RemoteSettingsChanged(..)));
    pump(&mut client, &mut server);

    client.send_headers(1, request_headers(), false).unwrap();
    pump(&mut client, &mut server);
    (client, server)
}

#[test]
fn send_data_fails_rather_than_overrun_the_window() {
    let (mut client, _server) = pair_with_small_server_window();

    // Fifteen bytes do not fit in the ten byte window: the call fails
    // and nothing is queued.
    assert_eq!(
        Err(Error::FlowControl),
        client.send_data(1, Bytes::from_static(b"0123456789abcde"), false, None)
    );
    assert_eq!(0, client.pending_outbound_len());

    // Ten bytes fit exactly.
    client
        .send_data(1, Bytes::from_static(b"0123456789"), false, None)
        .unwrap();
    let frames = unpack_frames(&client.take_all());
    match &frames[0] {
        HttpFrame::Data(f) => assert_eq!(10, f.data.len()),
        other => panic!("expected DATA, got {:?}", other),
    }
    // The window is exhausted now.
    assert_eq!(Ok(0), client.local_flow_control_window(1));
    assert_eq!(
        Err(Error::FlowControl),
        client.send_data(1, Bytes::from_static(b"abcde"), false, None)
    );
}

#[test]
fn window_update_reopens_the_window() {
    let (mut client, mut server) = pair_with_small_server_window();

    client
        .send_data(1, Bytes::from_static(b"0123456789"), false, None)
        .unwrap();
    pump(&mut client, &mut server);

    server.increment_flow_control_window(5, Some(1)).unwrap();
    let events = pump(&mut server, &mut client);
    assert_eq!(
        vec![Event::WindowUpdated(h2proto::event::WindowUpdated {
            stream_id: 1,
            delta: 5,
        })],
        events
    );

    client
        .send_data(1, Bytes::from_static(b"abcde"), true, None)
        .unwrap();
    let events = pump(&mut client, &mut server);
    assert!(matches!(events[0], Event::DataReceived(..)));
}

#[test]
fn acknowledge_received_data_emits_window_updates() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    client
        .send_data(1, Bytes::from(vec![7; 1000]), false, None)
        .unwrap();
    let events = pump(&mut client, &mut server);
    let flow_len = match &events[1] {
        Event::DataReceived(e) => e.flow_controlled_length,
        other => panic!("expected DataReceived, got {:?}", other),
    };
    assert_eq!(1000, flow_len);

    server.acknowledge_received_data(1, flow_len).unwrap();
    let frames = unpack_frames(&server.take_all());
    assert_eq!(2, frames.len());
    match (&frames[0], &frames[1]) {
        (HttpFrame::WindowUpdate(conn), HttpFrame::WindowUpdate(stream)) => {
            assert_eq!(0, conn.stream_id);
            assert_eq!(1000, conn.increment());
            assert_eq!(1, stream.stream_id);
            assert_eq!(1000, stream.increment());
        }
        other => panic!("expected two WINDOW_UPDATE frames, got {:?}", other),
    }

    // Acknowledging more than was received is a host error.
    assert!(server.acknowledge_received_data(1, 1).is_err());
}

#[test]
fn acknowledge_after_end_stream_updates_connection_only() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    client
        .send_data(1, Bytes::from_static(b"last"), true, None)
        .unwrap();
    pump(&mut client, &mut server);

    server.acknowledge_received_data(1, 4).unwrap();
    let frames = unpack_frames(&server.take_all());
    assert_eq!(1, frames.len());
    match &frames[0] {
        HttpFrame::WindowUpdate(f) => assert_eq!(0, f.stream_id),
        other => panic!("expected connection WINDOW_UPDATE, got {:?}", other),
    }
}

#[test]
fn window_update_with_zero_increment() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    pump(&mut client, &mut server);

    // Stream scope: the stream is reset, the connection survives.
    let events = server
        .receive_data(&serialize(WindowUpdateFrame::for_stream(1, 0)))
        .unwrap();
    assert_eq!(1, events.len());
    match &events[0] {
        Event::StreamReset(e) => {
            assert_eq!(1, e.stream_id);
            assert_eq!(ErrorCode::ProtocolError, e.error_code);
            assert!(!e.remote_reset);
        }
        other => panic!("expected StreamReset, got {:?}", other),
    }
    let frames = unpack_frames(&server.take_all());
    assert!(matches!(frames[0], HttpFrame::RstStream(..)));

    // Connection scope: the whole connection dies.
    let events = server
        .receive_data(&serialize(WindowUpdateFrame::for_connection(0)))
        .unwrap();
    assert_eq!(1, events.len());
    match &events[0] {
        Event::ConnectionTerminated(e) => {
            assert_eq!(ErrorCode::ProtocolError, e.error_code);
        }
        other => panic!("expected ConnectionTerminated, got {:?}", other),
    }
}

#[test]
fn window_increment_overflow_is_flow_control_error() {
    let (_client, mut server) = connected_pair();

    let events = server
        .receive_data(&serialize(WindowUpdateFrame::for_connection(0x7fff_ffff)))
        .unwrap();
    assert_eq!(1, events.len());
    match &events[0] {
        Event::ConnectionTerminated(e) => {
            assert_eq!(ErrorCode::FlowControlError, e.error_code);
        }
        other => panic!("expected ConnectionTerminated, got {:?}", other),
    }
}

#[test]
fn settings_initial_window_size_adjusts_existing_streams() {
    let (mut client, mut server) = connected_pair();

    client.send_headers(1, request_headers(), false).unwrap();
    pump(&mut client, &mut server);

    // Shrinking the window to zero stops the client cold.
    server
        .update_settings(vec![HttpSetting::InitialWindowSize(0)])
        .unwrap();
    pump(&mut server, &mut client);
    assert_eq!(
        Err(Error::FlowControl),
        client.send_data(1, Bytes::from_static(b"x"), false, None)
    );

    // Growing it re-opens existing streams by the delta.
    server
        .update_settings(vec![HttpSetting::InitialWindowSize(5)])
        .unwrap();
    pump(&mut server, &mut client);
    client
        .send_data(1, Bytes::from_static(b"12345"), false, None)
        .unwrap();
    assert_eq!(
        Err(Error::FlowControl),
        client.send_data(1, Bytes::from_static(b"6"), false, None)
    );
}
