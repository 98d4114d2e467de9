//! Error codes carried by RST_STREAM and GOAWAY frames.

use std::fmt;

/// The RFC 7540 (section 7) error code space.
///
/// The discriminants are the wire values. A code says *why* a stream or
/// connection died; *which* of the two died is decided by the frame that
/// carries the code, not by the code itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Graceful shutdown, not a fault.
    NoError = 0x0,
    /// Catch-all for violations with no more specific code.
    ProtocolError = 0x1,
    /// The sender failed in some way of its own.
    InternalError = 0x2,
    /// Flow control accounting was violated.
    FlowControlError = 0x3,
    /// A SETTINGS frame went unacknowledged for too long.
    SettingsTimeout = 0x4,
    /// A frame arrived on a stream that was already half-closed.
    StreamClosed = 0x5,
    /// A frame had a size its type does not permit.
    FrameSizeError = 0x6,
    /// The stream was declined before any processing happened.
    RefusedStream = 0x7,
    /// The sender lost interest in the stream.
    Cancel = 0x8,
    /// The header compression contexts fell out of sync.
    CompressionError = 0x9,
    /// The TCP connection behind a CONNECT request failed.
    ConnectError = 0xa,
    /// The peer generates more load than the sender is willing to take.
    EnhanceYourCalm = 0xb,
    /// The transport does not meet minimum security requirements.
    InadequateSecurity = 0xc,
    /// The sender insists on HTTP/1.1.
    Http11Required = 0xd,
}

/// Every defined code, in wire-value order. Conversions walk this table
/// so the enum stays the single source of truth.
const ERROR_CODES: &[ErrorCode] = &[
    ErrorCode::NoError,
    ErrorCode::ProtocolError,
    ErrorCode::InternalError,
    ErrorCode::FlowControlError,
    ErrorCode::SettingsTimeout,
    ErrorCode::StreamClosed,
    ErrorCode::FrameSizeError,
    ErrorCode::RefusedStream,
    ErrorCode::Cancel,
    ErrorCode::CompressionError,
    ErrorCode::ConnectError,
    ErrorCode::EnhanceYourCalm,
    ErrorCode::InadequateSecurity,
    ErrorCode::Http11Required,
];

impl ErrorCode {
    /// The RFC's name for the code, as it appears in section 7.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::NoError => "NO_ERROR",
            ErrorCode::ProtocolError => "PROTOCOL_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::FlowControlError => "FLOW_CONTROL_ERROR",
            ErrorCode::SettingsTimeout => "SETTINGS_TIMEOUT",
            ErrorCode::StreamClosed => "STREAM_CLOSED",
            ErrorCode::FrameSizeError => "FRAME_SIZE_ERROR",
            ErrorCode::RefusedStream => "REFUSED_STREAM",
            ErrorCode::Cancel => "CANCEL",
            ErrorCode::CompressionError => "COMPRESSION_ERROR",
            ErrorCode::ConnectError => "CONNECT_ERROR",
            ErrorCode::EnhanceYourCalm => "ENHANCE_YOUR_CALM",
            ErrorCode::InadequateSecurity => "INADEQUATE_SECURITY",
            ErrorCode::Http11Required => "HTTP_1_1_REQUIRED",
        }
    }
}

impl From<u32> for ErrorCode {
    /// Interprets a wire value. Section 7 lets receivers treat unknown
    /// codes as INTERNAL_ERROR, which is what happens here.
    fn from(code: u32) -> ErrorCode {
        ERROR_CODES
            .iter()
            .find(|&&known| known as u32 == code)
            .copied()
            .unwrap_or(ErrorCode::InternalError)
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> u32 {
        code as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_values_round_trip() {
        for &code in ERROR_CODES {
            assert_eq!(code, ErrorCode::from(code as u32));
        }
    }

    #[test]
    fn unknown_codes_collapse_to_internal_error() {
        assert_eq!(ErrorCode::InternalError, ErrorCode::from(0xe));
        assert_eq!(ErrorCode::InternalError, ErrorCode::from(0xdead_beef));
    }

    #[test]
    fn display_uses_rfc_names() {
        assert_eq!("ENHANCE_YOUR_CALM", format!("{}", ErrorCode::EnhanceYourCalm));
    }
}
