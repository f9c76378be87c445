//! The wire-visible status board.
//!
//! The 8-byte status record is written by the sequencer and sampler from the
//! foreground and by the zero-cross handler (the `power` field) from
//! interrupt context, and read whole by the publisher. It therefore lives
//! behind a critical-section mutex, and every snapshot is a single 8-byte
//! copy inside one critical section.
//!
//! Fault codes are a monotone latch: once `code < 0` nothing short of
//! [`StatusBoard::reset_faults`] writes the field again.

use core::cell::RefCell;
use critical_section::Mutex;
use jar_proto::records::{StatusCode, StatusRecord};

pub struct StatusBoard {
    inner: Mutex<RefCell<StatusRecord>>,
}

impl StatusBoard {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(StatusRecord {
                code: 0,
                cmdid: 0,
                cmdnum: 0,
                power: 0,
                temperature: 0,
                remain_time: 0,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut StatusRecord) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Copies the whole record in one critical section.
    pub fn snapshot(&self) -> StatusRecord {
        self.with(|s| *s)
    }

    pub fn code(&self) -> i8 {
        self.with(|s| s.code)
    }

    pub fn is_faulted(&self) -> bool {
        self.code() < 0
    }

    /// Latches a fault. A fault already present wins; later latches are
    /// ignored until an explicit reset.
    pub fn latch(&self, code: StatusCode) {
        debug_assert!(code.is_fault());
        self.with(|s| {
            if s.code >= 0 {
                s.code = code as i8;
            }
        });
    }

    /// Moves between standby and cooking. Ignored while a fault is latched.
    pub fn set_running(&self, running: bool) {
        self.with(|s| {
            if s.code >= 0 {
                s.code = if running {
                    StatusCode::Cooking as i8
                } else {
                    StatusCode::Standby as i8
                };
            }
        });
    }

    /// The explicit reset that ends a latched fault.
    pub fn reset_faults(&self) {
        self.with(|s| s.code = StatusCode::Standby as i8);
    }

    pub fn cmdid(&self) -> u8 {
        self.with(|s| s.cmdid)
    }

    pub fn set_cmdid(&self, index: u8) {
        self.with(|s| s.cmdid = index);
    }

    pub fn cmdnum(&self) -> u8 {
        self.with(|s| s.cmdnum)
    }

    pub fn set_cmdnum(&self, index: u8) {
        self.with(|s| s.cmdnum = index);
    }

    pub fn set_power(&self, percent: u8) {
        self.with(|s| s.power = percent);
    }

    /// Publishes the current temperature as Q8.8 raw bits.
    pub fn set_temperature_q8(&self, raw: i16) {
        self.with(|s| s.temperature = raw);
    }

    pub fn set_remain(&self, encoded: u16) {
        self.with(|s| s.remain_time = encoded);
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_latch_until_reset() {
        let board = StatusBoard::new();
        assert_eq!(board.code(), 0);

        board.set_running(true);
        assert_eq!(board.code(), 1);

        board.latch(StatusCode::CommandOverflow);
        assert_eq!(board.code(), -61);

        // Neither a second fault nor a run-state write gets through.
        board.latch(StatusCode::BtDeviceError);
        assert_eq!(board.code(), -61);
        board.set_running(true);
        assert_eq!(board.code(), -61);
        board.set_running(false);
        assert_eq!(board.code(), -61);

        board.reset_faults();
        assert_eq!(board.code(), 0);
        board.set_running(true);
        assert_eq!(board.code(), 1);
    }

    #[test]
    fn snapshot_carries_all_fields() {
        let board = StatusBoard::new();
        board.set_cmdid(4);
        board.set_cmdnum(9);
        board.set_power(73);
        board.set_temperature_q8(61 * 256);
        board.set_remain(1800);

        let s = board.snapshot();
        assert_eq!(s.cmdid, 4);
        assert_eq!(s.cmdnum, 9);
        assert_eq!(s.power, 73);
        assert_eq!(s.temperature, 61 * 256);
        assert_eq!(s.remain_time, 1800);
    }
}
