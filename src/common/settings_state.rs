use std::collections::VecDeque;

use crate::error::Error;
use crate::result::Result;
use crate::solicit::frame::settings::HttpSetting;
use crate::solicit::frame::settings::HttpSettings;
use crate::solicit::window_size::MAX_WINDOW_SIZE;
use crate::solicit::DEFAULT_SETTINGS;

/// Both sides' settings, plus the queue of local changes waiting for the
/// peer's ACK.
///
/// `acked_local` only moves when a SETTINGS ACK arrives: each ACK applies
/// the oldest pending batch, in the order the SETTINGS frames were sent.
/// The remote side has no such delay; peer settings take effect the
/// moment the frame is processed.
pub struct SettingsState {
    /// What we advertise, as far as the peer has confirmed.
    pub acked_local: HttpSettings,
    /// What the peer advertised.
    pub remote: HttpSettings,
    pending_local: VecDeque<Vec<HttpSetting>>,
}

impl SettingsState {
    pub fn new() -> SettingsState {
        SettingsState {
            acked_local: DEFAULT_SETTINGS,
            remote: DEFAULT_SETTINGS,
            pending_local: VecDeque::new(),
        }
    }

    pub fn push_pending(&mut self, batch: Vec<HttpSetting>) {
        self.pending_local.push_back(batch);
    }

    pub fn pop_pending(&mut self) -> Option<Vec<HttpSetting>> {
        self.pending_local.pop_front()
    }
}

/// Checks a host-supplied setting value against the ranges RFC 7540
/// permits. Values the type system already constrains (ENABLE_PUSH) need
/// no check.
pub fn validate_local_setting(setting: &HttpSetting) -> Result<()> {
    match *setting {
        HttpSetting::InitialWindowSize(size) => {
            if size > MAX_WINDOW_SIZE {
                return Err(Error::InvalidSettingsValue(
                    "INITIAL_WINDOW_SIZE above 2^31-1",
                ));
            }
        }
        HttpSetting::MaxFrameSize(size) => {
            if size < 0x4000 || size >= 0x100_0000 {
                return Err(Error::InvalidSettingsValue(
                    "MAX_FRAME_SIZE outside [2^14, 2^24-1]",
                ));
            }
        }
        _ => {}
    }
    Ok(())
}
