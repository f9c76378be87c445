//! Simulated peripherals.
//!
//! Every peripheral hands out cheap clones sharing one interior state, so
//! the kernel can own its copy while the test keeps a handle to observe or
//! script it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::digital::OutputPin;
use jar_kernel::hal::{AdcInput, Melody, NvStore, PowerSwitch, Sounder, StatusDisplay};
use jar_proto::records::StatusRecord;

use crate::clock::SimClock;

#[derive(Debug, Default)]
struct PinInner {
    level: bool,
    transitions: Vec<(u64, bool)>,
    on_accum_us: u64,
    last_change_us: u64,
}

/// A recording output pin with on-time integration, used for the triac gate
/// and the power-hold output.
#[derive(Debug, Clone)]
pub struct SimPin {
    clock: SimClock,
    inner: Rc<RefCell<PinInner>>,
}

impl SimPin {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            inner: Rc::new(RefCell::new(PinInner::default())),
        }
    }

    pub fn is_high(&self) -> bool {
        self.inner.borrow().level
    }

    /// All `(t_us, level)` transitions so far.
    pub fn transitions(&self) -> Vec<(u64, bool)> {
        self.inner.borrow().transitions.clone()
    }

    /// HIGH time accumulated since the last call, closing the current
    /// segment at `now_us`.
    pub fn take_on_time_us(&self, now_us: u64) -> u64 {
        let mut inner = self.inner.borrow_mut();
        if inner.level {
            let since = now_us.saturating_sub(inner.last_change_us);
            inner.on_accum_us += since;
            inner.last_change_us = now_us;
        }
        core::mem::take(&mut inner.on_accum_us)
    }
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let now = self.clock.now_us();
        let mut inner = self.inner.borrow_mut();
        if inner.level {
            let since = now.saturating_sub(inner.last_change_us);
            inner.on_accum_us += since;
            inner.last_change_us = now;
            inner.level = false;
            inner.transitions.push((now, false));
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let now = self.clock.now_us();
        let mut inner = self.inner.borrow_mut();
        if !inner.level {
            inner.level = true;
            inner.last_change_us = now;
            inner.transitions.push((now, true));
        }
        Ok(())
    }
}

/// A thermistor channel pinned to whatever the test (or plant) sets.
#[derive(Debug, Clone, Default)]
pub struct SimAdc {
    counts: Rc<Cell<u16>>,
}

impl SimAdc {
    pub fn new(counts: u16) -> Self {
        Self {
            counts: Rc::new(Cell::new(counts)),
        }
    }

    pub fn set_counts(&self, counts: u16) {
        self.counts.set(counts.min(1023));
    }

    pub fn counts(&self) -> u16 {
        self.counts.get()
    }
}

impl AdcInput for SimAdc {
    fn read(&mut self) -> u16 {
        self.counts.get()
    }
}

/// A 256-byte EEPROM image, factory-fresh (0xFF) by default.
#[derive(Debug, Clone)]
pub struct SimNvStore {
    bytes: Rc<RefCell<[u8; 256]>>,
}

impl SimNvStore {
    pub fn new() -> Self {
        Self {
            bytes: Rc::new(RefCell::new([0xFF; 256])),
        }
    }

    pub fn raw(&self, addr: usize, len: usize) -> Vec<u8> {
        self.bytes.borrow()[addr..addr + len].to_vec()
    }
}

impl Default for SimNvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NvStore for SimNvStore {
    fn read(&mut self, addr: usize, buf: &mut [u8]) {
        buf.copy_from_slice(&self.bytes.borrow()[addr..addr + buf.len()]);
    }

    fn write(&mut self, addr: usize, bytes: &[u8]) {
        self.bytes.borrow_mut()[addr..addr + bytes.len()].copy_from_slice(bytes);
    }
}

/// Records requested melodies instead of blocking for seconds.
#[derive(Debug, Clone, Default)]
pub struct SimSounder {
    played: Rc<RefCell<Vec<Melody>>>,
}

impl SimSounder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Melody> {
        self.played.borrow().clone()
    }
}

impl Sounder for SimSounder {
    fn play(&mut self, melody: Melody) {
        self.played.borrow_mut().push(melody);
    }
}

/// Keeps the most recent rendered status, standing in for the OLED.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    last: Rc<RefCell<Option<StatusRecord>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<StatusRecord> {
        *self.last.borrow()
    }
}

impl StatusDisplay for RecordingDisplay {
    fn render(&mut self, status: &StatusRecord) {
        *self.last.borrow_mut() = Some(*status);
    }
}

/// The power switch, pressed from the test.
#[derive(Debug, Clone, Default)]
pub struct SimPowerSwitch {
    pressed: Rc<Cell<bool>>,
}

impl SimPowerSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self) {
        self.pressed.set(true);
    }
}

impl PowerSwitch for SimPowerSwitch {
    fn is_pressed(&mut self) -> bool {
        self.pressed.get()
    }
}
