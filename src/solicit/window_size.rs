//! Flow control window arithmetic.

use std::fmt;

/// Upper bound on any flow control window: 2^31 - 1 octets. A
/// WINDOW_UPDATE or SETTINGS change that would push a window past this
/// is an error of type FLOW_CONTROL_ERROR (6.9.1), scoped to whichever
/// window overflowed.
pub const MAX_WINDOW_SIZE: u32 = 0x7fff_ffff;

/// Largest legal WINDOW_UPDATE increment (6.9). The frame encodes the
/// increment in 31 bits, so this doubles as the parse-level ceiling.
pub const MAX_WINDOW_SIZE_INC: u32 = 0x7fff_ffff;

/// One flow control window.
///
/// The size is signed: a SETTINGS_INITIAL_WINDOW_SIZE shrink applies its
/// delta to every stream window and may push some of them below zero
/// (6.9.2). Sending is simply forbidden until WINDOW_UPDATEs bring such
/// a window back above zero. All mutations are range-checked so that the
/// two peers cannot silently disagree about the budget.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowSize(pub i32);

/// The window bounds: `[-2^31, 2^31 - 1]` octets, i.e. the full `i32`
/// range. Checked in 64-bit space so the arithmetic itself cannot wrap.
fn checked(next: i64) -> Result<i32, ()> {
    if next < i32::MIN as i64 || next > MAX_WINDOW_SIZE as i64 {
        return Err(());
    }
    Ok(next as i32)
}

impl WindowSize {
    pub fn new(size: i32) -> WindowSize {
        WindowSize(size)
    }

    /// Current size. Callers comparing against payload lengths must
    /// remember it can be negative.
    pub fn size(&self) -> i32 {
        self.0
    }

    /// Grow the window by a WINDOW_UPDATE increment. Fails when the
    /// increment is out of range or the result would exceed
    /// [`MAX_WINDOW_SIZE`], leaving the window untouched.
    pub fn try_increase(&mut self, delta: u32) -> Result<(), ()> {
        if delta > MAX_WINDOW_SIZE_INC {
            return Err(());
        }
        self.0 = checked(self.0 as i64 + delta as i64)?;
        Ok(())
    }

    /// Apply the signed delta of a SETTINGS_INITIAL_WINDOW_SIZE change.
    /// Going negative is fine here; only leaving the representable range
    /// is an error.
    pub fn try_apply_delta(&mut self, delta: i32) -> Result<(), ()> {
        self.0 = checked(self.0 as i64 + delta as i64)?;
        Ok(())
    }

    /// Shrink the window, tolerating a negative result. Used on the
    /// sending side, where SETTINGS shrinks may already have made the
    /// window negative.
    pub fn try_decrease(&mut self, delta: i32) -> Result<(), ()> {
        self.0 = checked(self.0 as i64 - delta as i64)?;
        Ok(())
    }

    /// Shrink the window, refusing to go below zero. Used for the
    /// receive windows, where a frame larger than the remaining budget
    /// means the peer ignored our advertisements.
    pub fn try_decrease_to_non_negative(&mut self, delta: i32) -> Result<(), ()> {
        let next = self.0 as i64 - delta as i64;
        if next < 0 {
            return Err(());
        }
        self.0 = checked(next)?;
        Ok(())
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increase_within_bounds() {
        let mut w = WindowSize::new(65_535);
        assert!(w.try_increase(100).is_ok());
        assert_eq!(65_635, w.size());
    }

    #[test]
    fn test_increase_overflow() {
        let mut w = WindowSize::new(MAX_WINDOW_SIZE as i32);
        assert!(w.try_increase(1).is_err());
        // A failed mutation leaves the size alone.
        assert_eq!(MAX_WINDOW_SIZE as i32, w.size());
    }

    #[test]
    fn test_increase_recovers_negative_window() {
        let mut w = WindowSize::new(-10);
        assert!(w.try_increase(15).is_ok());
        assert_eq!(5, w.size());
    }

    #[test]
    fn test_decrease_below_zero() {
        let mut w = WindowSize::new(10);
        assert!(w.try_decrease_to_non_negative(11).is_err());
        assert_eq!(10, w.size());
        assert!(w.try_decrease(11).is_ok());
        assert_eq!(-1, w.size());
    }

    #[test]
    fn test_settings_delta_may_go_negative() {
        let mut w = WindowSize::new(10);
        assert!(w.try_apply_delta(-20).is_ok());
        assert_eq!(-10, w.size());
        assert!(w.try_apply_delta(MAX_WINDOW_SIZE as i32).is_ok());
    }

    #[test]
    fn test_delta_cannot_leave_representable_range() {
        let mut w = WindowSize::new(i32::MIN);
        assert!(w.try_apply_delta(-1).is_err());
        let mut w = WindowSize::new(2);
        assert!(w.try_apply_delta(MAX_WINDOW_SIZE as i32).is_err());
    }
}
