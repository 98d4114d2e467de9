//! The module contains the implementation of the `SETTINGS` frame and associated flags.

use crate::codec::write_buffer::WriteBuffer;
use crate::solicit::frame::flags::*;
use crate::solicit::frame::Frame;
use crate::solicit::frame::FrameHeader;
use crate::solicit::frame::FrameIR;
use crate::solicit::frame::ParseFrameError;
use crate::solicit::frame::ParseFrameResult;
use crate::solicit::frame::RawFrame;
use crate::solicit::stream_id::StreamId;

pub const SETTINGS_FRAME_TYPE: u8 = 0x4;

/// One setting, as carried in a SETTINGS frame payload.
///
/// On the wire a setting is a 16-bit identifier plus a 32-bit value
/// (6.5.1); the enum keeps the two together and gives ENABLE_PUSH its
/// boolean nature back.
#[derive(Clone, PartialEq, Eq, Debug, Copy)]
pub enum HttpSetting {
    HeaderTableSize(u32),
    EnablePush(bool),
    MaxConcurrentStreams(u32),
    InitialWindowSize(u32),
    MaxFrameSize(u32),
    MaxHeaderListSize(u32),
}

impl HttpSetting {
    /// Interprets an (id, value) pair per the table in 6.5.2.
    ///
    /// Unknown ids yield `None` and must be ignored by the receiver.
    /// Values a known setting cannot take make the whole frame
    /// unparseable; the one range the parser does not enforce is
    /// INITIAL_WINDOW_SIZE, whose violation is a FLOW_CONTROL_ERROR
    /// rather than a parse-level PROTOCOL_ERROR and is therefore left
    /// to the connection.
    pub fn from_id(id: u16, val: u32) -> ParseFrameResult<Option<HttpSetting>> {
        Ok(Some(match id {
            1 => HttpSetting::HeaderTableSize(val),
            2 => {
                let b = match val {
                    0 => false,
                    1 => true,
                    _ => return Err(ParseFrameError::IncorrectSettingsPushValue(val)),
                };
                HttpSetting::EnablePush(b)
            }
            3 => HttpSetting::MaxConcurrentStreams(val),
            4 => HttpSetting::InitialWindowSize(val),
            5 => {
                // MAX_FRAME_SIZE must stay within [2^14, 2^24-1] (6.5.2).
                if val < 0x4000 || val >= 0x100_0000 {
                    return Err(ParseFrameError::IncorrectSettingsMaxFrameSize(val));
                }
                HttpSetting::MaxFrameSize(val)
            }
            6 => HttpSetting::MaxHeaderListSize(val),
            _ => return Ok(None),
        }))
    }

    /// Parses one 6-byte settings entry.
    ///
    /// # Panics
    ///
    /// The caller must hand in at least 6 bytes.
    fn parse_setting(raw_setting: &[u8]) -> ParseFrameResult<Option<HttpSetting>> {
        let id: u16 = ((raw_setting[0] as u16) << 8) | (raw_setting[1] as u16);
        let val: u32 = unpack_octets_4!(raw_setting, 2, u32);

        HttpSetting::from_id(id, val)
    }

    /// The wire identifier of the setting (6.5.2).
    pub fn get_id(&self) -> u16 {
        match *self {
            HttpSetting::HeaderTableSize(_) => 1,
            HttpSetting::EnablePush(_) => 2,
            HttpSetting::MaxConcurrentStreams(_) => 3,
            HttpSetting::InitialWindowSize(_) => 4,
            HttpSetting::MaxFrameSize(_) => 5,
            HttpSetting::MaxHeaderListSize(_) => 6,
        }
    }

    /// The wire value of the setting.
    pub fn get_val(&self) -> u32 {
        match *self {
            HttpSetting::HeaderTableSize(val)
            | HttpSetting::MaxConcurrentStreams(val)
            | HttpSetting::InitialWindowSize(val)
            | HttpSetting::MaxFrameSize(val)
            | HttpSetting::MaxHeaderListSize(val) => val,
            HttpSetting::EnablePush(true) => 1,
            HttpSetting::EnablePush(false) => 0,
        }
    }

    /// The 6-octet wire form: identifier followed by value (6.5.1).
    pub(crate) fn serialize(&self) -> [u8; 6] {
        let (id, val) = (self.get_id(), self.get_val());
        [
            ((id >> 8) & 0x00FF) as u8,
            ((id) & 0x00FF) as u8,
            (((val >> 24) & 0x000000FF) as u8),
            (((val >> 16) & 0x000000FF) as u8),
            (((val >> 8) & 0x000000FF) as u8),
            (((val) & 0x000000FF) as u8),
        ]
    }
}

/// The complete set of setting values one side of a connection holds.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct HttpSettings {
    pub header_table_size: u32,
    pub enable_push: bool,
    pub max_concurrent_streams: u32,
    pub initial_window_size: u32,
    pub max_frame_size: u32,
    pub max_header_list_size: u32,
}

impl HttpSettings {
    /// The current value of the given setting.
    pub fn get(&self, setting: HttpSetting) -> HttpSetting {
        match setting {
            HttpSetting::HeaderTableSize(_) => {
                HttpSetting::HeaderTableSize(self.header_table_size)
            }
            HttpSetting::EnablePush(_) => HttpSetting::EnablePush(self.enable_push),
            HttpSetting::MaxConcurrentStreams(_) => {
                HttpSetting::MaxConcurrentStreams(self.max_concurrent_streams)
            }
            HttpSetting::InitialWindowSize(_) => {
                HttpSetting::InitialWindowSize(self.initial_window_size)
            }
            HttpSetting::MaxFrameSize(_) => HttpSetting::MaxFrameSize(self.max_frame_size),
            HttpSetting::MaxHeaderListSize(_) => {
                HttpSetting::MaxHeaderListSize(self.max_header_list_size)
            }
        }
    }

    pub fn apply(&mut self, setting: HttpSetting) {
        match setting {
            HttpSetting::HeaderTableSize(s) => self.header_table_size = s,
            HttpSetting::EnablePush(e) => self.enable_push = e,
            HttpSetting::MaxConcurrentStreams(m) => self.max_concurrent_streams = m,
            HttpSetting::InitialWindowSize(s) => self.initial_window_size = s,
            HttpSetting::MaxFrameSize(s) => self.max_frame_size = s,
            HttpSetting::MaxHeaderListSize(s) => self.max_header_list_size = s,
        }
    }

    /// All six settings as `HttpSetting` values, in id order.
    pub fn to_vec(&self) -> Vec<HttpSetting> {
        vec![
            HttpSetting::HeaderTableSize(self.header_table_size),
            HttpSetting::EnablePush(self.enable_push),
            HttpSetting::MaxConcurrentStreams(self.max_concurrent_streams),
            HttpSetting::InitialWindowSize(self.initial_window_size),
            HttpSetting::MaxFrameSize(self.max_frame_size),
            HttpSetting::MaxHeaderListSize(self.max_header_list_size),
        ]
    }

    /// The settings of `self` that differ from `other`, carrying the
    /// values of `self`.
    pub fn diff(&self, other: &HttpSettings) -> Vec<HttpSetting> {
        self.to_vec()
            .into_iter()
            .filter(|s| other.get(*s) != *s)
            .collect()
    }
}

/// The single flag SETTINGS defines (6.5).
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum SettingsFlag {
    Ack = 0x1,
}

impl Flag for SettingsFlag {
    #[inline]
    fn bitmask(&self) -> u8 {
        *self as u8
    }

    fn flags() -> &'static [Self] {
        static FLAGS: &[SettingsFlag] = &[SettingsFlag::Ack];
        FLAGS
    }
}

/// The SETTINGS frame (6.5).
///
/// Parsing rejects frames whose shape is impossible: a non-zero stream
/// id, a payload that is not a whole number of 6-byte entries, or an
/// ACK that carries entries anyway. The builder side does not police
/// its caller; the engine constructs only well-formed frames.
#[derive(PartialEq, Debug, Clone)]
pub struct SettingsFrame {
    /// Contains all the settings that are currently set in the frame. It is
    /// safe to access this field (to read, add, or remove settings), even
    /// though a helper method `add_setting` exists.
    pub settings: Vec<HttpSetting>,
    /// Represents the flags currently set on the `SettingsFrame`, packed into
    /// a single byte.
    flags: Flags<SettingsFlag>,
}

impl SettingsFrame {
    /// Creates a new empty `SettingsFrame`
    pub fn new() -> SettingsFrame {
        SettingsFrame {
            settings: Vec::new(),
            // By default, no flags are set
            flags: Flags::default(),
        }
    }

    /// An empty frame with the ACK flag set.
    pub fn new_ack() -> SettingsFrame {
        SettingsFrame {
            settings: Vec::new(),
            flags: SettingsFlag::Ack.to_flags(),
        }
    }

    /// Create a SETTINGS frame with the given list of settings.
    pub fn from_settings(settings: Vec<HttpSetting>) -> SettingsFrame {
        SettingsFrame {
            settings,
            flags: Flags::default(),
        }
    }

    /// Adds the given setting to the frame.
    pub fn add_setting(&mut self, setting: HttpSetting) {
        self.settings.push(setting);
    }

    /// Sets the ACK flag.
    pub fn set_ack(&mut self) {
        self.set_flag(SettingsFlag::Ack)
    }

    /// Whether the frame acknowledges a peer's SETTINGS.
    pub fn is_ack(&self) -> bool {
        self.flags.is_set(SettingsFlag::Ack)
    }

    fn payload_len(&self) -> u32 {
        // 6 bytes per entry.
        6 * self.settings.len() as u32
    }

    /// Parses a SETTINGS payload into its entries, dropping unknown
    /// identifiers as 6.5.2 requires. A payload that is not a whole
    /// number of entries is an error.
    pub(crate) fn parse_payload(payload: &[u8]) -> ParseFrameResult<Vec<HttpSetting>> {
        if payload.len() % 6 != 0 {
            return Err(ParseFrameError::IncorrectFrameLength(payload.len() as u32));
        }

        let mut settings = Vec::new();
        for chunk in payload.chunks(6) {
            if let Some(setting) = HttpSetting::parse_setting(chunk)? {
                settings.push(setting);
            }
        }
        Ok(settings)
    }

    /// Sets the given flag for the frame.
    pub fn set_flag(&mut self, flag: SettingsFlag) {
        self.flags.set(flag);
    }
}

impl Frame for SettingsFrame {
    type FlagType = SettingsFlag;

    fn from_raw(raw_frame: &RawFrame) -> ParseFrameResult<SettingsFrame> {
        let FrameHeader {
            payload_len,
            frame_type,
            flags,
            stream_id,
        } = raw_frame.header();
        if frame_type != SETTINGS_FRAME_TYPE {
            return Err(ParseFrameError::InternalError);
        }
        if (payload_len as usize) != raw_frame.payload().len() {
            return Err(ParseFrameError::InternalError);
        }
        // SETTINGS is a connection-level frame.
        if stream_id != 0 {
            return Err(ParseFrameError::StreamIdMustBeZero(stream_id));
        }
        if (flags & SettingsFlag::Ack.bitmask()) != 0 {
            // 6.5: an ACK must come empty.
            return if payload_len == 0 {
                Ok(SettingsFrame {
                    settings: Vec::new(),
                    flags: Flags::new(flags),
                })
            } else {
                Err(ParseFrameError::IncorrectFrameLength(payload_len))
            };
        }

        let settings = SettingsFrame::parse_payload(&raw_frame.payload())?;
        Ok(SettingsFrame {
            settings,
            flags: Flags::new(flags),
        })
    }

    fn flags(&self) -> Flags<SettingsFlag> {
        self.flags
    }

    fn get_stream_id(&self) -> StreamId {
        0
    }

    fn get_header(&self) -> FrameHeader {
        FrameHeader {
            payload_len: self.payload_len(),
            frame_type: SETTINGS_FRAME_TYPE,
            flags: self.flags.value(),
            stream_id: 0,
        }
    }
}

impl FrameIR for SettingsFrame {
    fn serialize_into(self, b: &mut WriteBuffer) {
        b.write_header(self.get_header());
        for setting in &self.settings {
            b.extend_from_slice(&setting.serialize());
        }
    }
}
