//! Sans-I/O HTTP/2 protocol engine.
//!
//! The crate implements the connection- and stream-level logic of
//! RFC 7540 as a plain in-memory state machine. It performs no network
//! I/O: the host feeds inbound bytes to [`HttpConnection::receive_data`],
//! consumes the returned [`Event`]s, invokes send operations
//! ([`HttpConnection::send_headers`], [`HttpConnection::send_data`], ...)
//! and transmits whatever [`HttpConnection::data_to_send`] hands back.
//!
//! The engine is a single-owner synchronous object: all operations are
//! non-blocking and complete in bounded work per frame. Hosts that share
//! a connection between tasks or threads must serialize access
//! themselves.
//!
//! ```
//! use h2proto::{ConnectionConfig, Header, Headers, HttpConnection};
//!
//! let mut client = HttpConnection::client();
//! client.initiate_connection().unwrap();
//!
//! let stream_id = client.get_next_available_stream_id().unwrap();
//! let headers = Headers::from_vec(vec![
//!     Header::new(":method", "GET"),
//!     Header::new(":scheme", "https"),
//!     Header::new(":path", "/"),
//!     Header::new(":authority", "example.com"),
//! ]);
//! client.send_headers(stream_id, headers, true).unwrap();
//!
//! // Bytes to write to the transport: preface, SETTINGS, HEADERS.
//! let bytes = client.take_all();
//! assert!(bytes.starts_with(b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n"));
//! ```

#[macro_use]
extern crate log;

pub mod solicit;

pub mod error;

mod result;

mod codec;

mod common;

pub mod config;
pub mod event;

mod ascii;
mod headers_place;
mod req_resp;

pub use crate::solicit::header::Header;
pub use crate::solicit::header::HeaderName;
pub use crate::solicit::header::HeaderValue;
pub use crate::solicit::header::Headers;
pub use crate::solicit::header::PseudoHeaderName;

pub use crate::solicit::error_code::ErrorCode;
pub use crate::solicit::frame::settings::HttpSetting;
pub use crate::solicit::frame::settings::HttpSettings;
pub use crate::solicit::session::StreamState;
pub use crate::solicit::stream_id::StreamId;

pub use crate::common::conn::ConnectionState;
pub use crate::common::conn::HttpConnection;
pub use crate::common::conn::SendPriority;

pub use crate::config::ConnectionConfig;
pub use crate::config::HeaderEncoding;

pub use crate::event::Event;

pub use crate::error::Error;
pub use crate::result::Result;
