//! The module contains the protocol-level definitions of HTTP/2: frames,
//! settings, headers, window sizes and error codes.

use self::frame::settings::HttpSettings;

pub(crate) mod error_code;
pub mod frame;
pub mod header;
pub mod session;
pub(crate) mod stream_id;
pub(crate) mod window_size;

/// The client connection preface, sent before any frame.
///
/// 3.5.  HTTP/2 Connection Preface
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

// 6.5.2 Defined SETTINGS Parameters
pub const DEFAULT_SETTINGS: HttpSettings = HttpSettings {
    header_table_size: 4_096,
    enable_push: true,
    max_concurrent_streams: u32::MAX,
    initial_window_size: 65_535,
    max_frame_size: 16_384,
    max_header_list_size: u32::MAX,
};

/// The settings this side advertises when none are configured explicitly.
///
/// Identical to the RFC 7540 defaults except for the bounded number of
/// concurrent inbound streams, which the protocol leaves unlimited.
pub const DEFAULT_LOCAL_SETTINGS: HttpSettings = HttpSettings {
    header_table_size: 4_096,
    enable_push: true,
    max_concurrent_streams: 100,
    initial_window_size: 65_535,
    max_frame_size: 16_384,
    max_header_list_size: u32::MAX,
};
