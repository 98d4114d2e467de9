use std::error::Error as StdError;
use std::fmt;

use crate::solicit::error_code::ErrorCode;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::header::HeaderError;
use crate::solicit::stream_id::StreamId;

use hpack::decoder::DecoderError;

/// An enum representing errors that can arise when driving an HTTP/2
/// connection.
///
/// Errors returned from host-facing operations describe why the call was
/// refused; the connection stays usable unless the variant is
/// connection-scoped. Errors caused by the remote peer are not returned
/// from `receive_data` at all: they surface as `StreamReset` or
/// `ConnectionTerminated` events plus queued RST_STREAM/GOAWAY bytes.
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// Generic protocol violation that has no more specific variant.
    Protocol(&'static str),
    /// A frame exceeded the advertised SETTINGS_MAX_FRAME_SIZE.
    FrameTooLarge,
    /// A send would overrun (or an increment would overflow) a flow
    /// control window.
    FlowControl,
    /// Opening the stream would exceed the peer's (or our own)
    /// SETTINGS_MAX_CONCURRENT_STREAMS.
    TooManyStreams,
    /// An attempt to use a stream id not above the ids already used by
    /// that side of the connection.
    StreamIdTooLow {
        id: StreamId,
        last_used: StreamId,
    },
    /// A setting value outside the range RFC 7540 permits for it.
    InvalidSettingsValue(&'static str),
    /// The peer exhibits behaviour that looks like a deliberate attempt
    /// to generate excessive load (CONTINUATION or empty-frame floods).
    DenialOfService(&'static str),
    /// The stream id has never been used.
    NoSuchStream(StreamId),
    /// The stream existed once but is closed (possibly already
    /// garbage-collected).
    StreamClosed(StreamId),
    /// All stream ids of this endpoint's parity are exhausted.
    NoAvailableStreamId,
    /// The connection received a frame that could not be parsed.
    InvalidFrame(ParseFrameError),
    /// The HPACK decoder was unable to decode a header block. Fatal to
    /// the connection: the compression contexts are out of sync.
    Compression(DecoderError),
    /// A header failed structural validation.
    InvalidHeader(HeaderError),
    /// The connection has terminated; only `data_to_send` remains
    /// meaningful.
    ConnectionMustBeClosed,
    /// The operation requires `initiate_connection` to have been called.
    ConnectionNotInitiated,
}

impl Error {
    /// The RFC 7540 error code a GOAWAY caused by this error carries.
    pub(crate) fn goaway_error_code(&self) -> ErrorCode {
        match self {
            Error::FrameTooLarge => ErrorCode::FrameSizeError,
            Error::FlowControl => ErrorCode::FlowControlError,
            Error::Compression(..) => ErrorCode::CompressionError,
            Error::DenialOfService(..) => ErrorCode::EnhanceYourCalm,
            Error::StreamClosed(..) => ErrorCode::StreamClosed,
            Error::InvalidFrame(e) => e.error_code(),
            _ => ErrorCode::ProtocolError,
        }
    }
}

impl From<ParseFrameError> for Error {
    fn from(e: ParseFrameError) -> Error {
        Error::InvalidFrame(e)
    }
}

impl From<DecoderError> for Error {
    fn from(e: DecoderError) -> Error {
        Error::Compression(e)
    }
}

impl From<HeaderError> for Error {
    fn from(e: HeaderError) -> Error {
        Error::InvalidHeader(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Protocol(m) => write!(f, "protocol error: {}", m),
            Error::FrameTooLarge => write!(f, "frame exceeds SETTINGS_MAX_FRAME_SIZE"),
            Error::FlowControl => write!(f, "flow control window violated"),
            Error::TooManyStreams => write!(f, "SETTINGS_MAX_CONCURRENT_STREAMS exceeded"),
            Error::StreamIdTooLow { id, last_used } => {
                write!(f, "stream id {} not above last used id {}", id, last_used)
            }
            Error::InvalidSettingsValue(m) => write!(f, "invalid setting value: {}", m),
            Error::DenialOfService(m) => write!(f, "denial of service: {}", m),
            Error::NoSuchStream(id) => write!(f, "unknown stream id {}", id),
            Error::StreamClosed(id) => write!(f, "stream {} is closed", id),
            Error::NoAvailableStreamId => write!(f, "stream ids exhausted"),
            Error::InvalidFrame(e) => write!(f, "invalid frame: {:?}", e),
            Error::Compression(e) => write!(f, "HPACK decoder error: {:?}", e),
            Error::InvalidHeader(e) => write!(f, "invalid header: {:?}", e),
            Error::ConnectionMustBeClosed => write!(f, "connection has terminated"),
            Error::ConnectionNotInitiated => write!(f, "connection not initiated"),
        }
    }
}

impl StdError for Error {}
