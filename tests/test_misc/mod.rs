#![allow(dead_code)]

use h2proto::solicit::frame::FrameIR;
use h2proto::solicit::frame::HttpFrame;
use h2proto::solicit::frame::RawFrame;
use h2proto::Event;
use h2proto::Header;
use h2proto::Headers;
use h2proto::HttpConnection;

/// A header block fragment that decodes to `:method: GET`,
/// `:scheme: http`, `:path: /` using only static table indices, so it is
/// valid against any decoder state.
pub const GET_FRAGMENT: &[u8] = &[0x82, 0x86, 0x84];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Moves all queued bytes from one engine into the other and returns the
/// events this triggered.
pub fn pump(from: &mut HttpConnection, to: &mut HttpConnection) -> Vec<Event> {
    let bytes = from.take_all();
    if bytes.is_empty() {
        return Vec::new();
    }
    to.receive_data(&bytes).expect("receive_data")
}

/// A client/server pair that has exchanged prefaces, initial SETTINGS
/// and both ACKs, with all buffers drained.
pub fn connected_pair() -> (HttpConnection, HttpConnection) {
    init_logger();
    let mut client = HttpConnection::client();
    let mut server = HttpConnection::server();
    client.initiate_connection().expect("client initiate");
    server.initiate_connection().expect("server initiate");
    pump(&mut client, &mut server);
    pump(&mut server, &mut client);
    pump(&mut client, &mut server);
    (client, server)
}

pub fn request_headers() -> Headers {
    Headers::from_vec(vec![
        Header::new(":method", "GET"),
        Header::new(":scheme", "https"),
        Header::new(":path", "/"),
        Header::new(":authority", "example.com"),
    ])
}

pub fn response_headers() -> Headers {
    Headers::from_vec(vec![Header::new(":status", "200")])
}

/// Splits a buffer of serialized frames back into typed frames.
pub fn unpack_frames(mut raw: &[u8]) -> Vec<HttpFrame> {
    let mut frames = Vec::new();
    while !raw.is_empty() {
        let frame = RawFrame::parse(raw.to_vec()).expect("raw frame");
        let len = frame.len();
        frames.push(HttpFrame::from_raw(&frame).expect("frame"));
        raw = &raw[len..];
    }
    frames
}

pub fn serialize<F: FrameIR>(frame: F) -> Vec<u8> {
    frame.serialize_into_vec()
}
