//! Phase-angle heater drive.
//!
//! Two interrupt entry points regulate the gate:
//!
//! - [`HeatDriver::on_zero_cross`], on the rising edge of the opto-isolated
//!   zero-cross signal: debounces, latches the half-cycle interval, runs the
//!   power controller and arms the gate pulse for this half-cycle.
//! - [`HeatDriver::on_tick`], from a ~10 kHz periodic timer: executes the
//!   armed HIGH and LOW transitions when their deadlines pass.
//!
//! The `(mode, deadline)` pair is one logical atom; every update happens
//! inside a single critical section. The handlers do not nest, so the
//! section also orders the pair against the timer.
//!
//! The gate pin belongs to this driver alone. The foreground changes what
//! the handlers see (targets, tuning) only through [`HeatShared`].

use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::OutputPin;
use jar_thermal::control::PowerController;
use jar_thermal::phase;

use crate::config::KernelConfig;
use crate::status::StatusBoard;

/// Where the gate pulse scheduler is within the current half-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Nothing armed.
    Idle,
    /// Waiting to drive the gate HIGH at the deadline.
    Up,
    /// Gate is HIGH; waiting to drive it LOW at the deadline.
    Down,
}

/// The ISR-visible control state.
///
/// Owned logically by the control kernel; the foreground writes the target
/// and tuning fields, the zero-cross handler writes the timing fields, the
/// sampler writes `current_c` and the integral.
#[derive(Debug, Clone, Copy)]
pub struct HeatState {
    /// Microseconds between accepted rising zero-cross edges.
    pub half_cycle_us: u32,
    pub mode: GateMode,
    /// Deadline for the next gate transition.
    pub deadline_us: u64,
    /// On-duration armed for this half-cycle.
    pub pulse_on_us: u32,
    pub last_edge_us: u64,
    /// The rate ≥ 1.0 fast path: gate held HIGH continuously.
    pub full_on: bool,
    pub target_c: f32,
    pub current_c: f32,
    pub error_integral: f32,
    pub kp: f32,
    pub ti: f32,
    pub td: f32,
    /// Firing-delay trim from SET_PHASE_DELAY, µs.
    pub phase_trim_us: u16,
}

impl HeatState {
    pub const fn new() -> Self {
        Self {
            half_cycle_us: 10_000,
            mode: GateMode::Idle,
            deadline_us: 0,
            pulse_on_us: 0,
            last_edge_us: 0,
            full_on: false,
            target_c: 0.0,
            current_c: 0.0,
            error_integral: 0.0,
            kp: 0.0,
            ti: 0.0,
            td: 0.0,
            phase_trim_us: 0,
        }
    }
}

/// [`HeatState`] behind a critical-section mutex, shareable between the
/// handlers and the foreground (as a `static` on a target).
pub struct HeatShared {
    inner: Mutex<RefCell<HeatState>>,
}

impl HeatShared {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(HeatState::new())),
        }
    }

    /// Runs `f` on the state inside one critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut HeatState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn set_target(&self, celsius: f32) {
        self.with(|s| s.target_c = celsius);
    }

    pub fn current_temperature(&self) -> f32 {
        self.with(|s| s.current_c)
    }

    /// Zeroes setpoint, measurement and integral; used on fault and FINISH.
    pub fn freeze(&self) {
        self.with(|s| {
            s.target_c = 0.0;
            s.current_c = 0.0;
            s.error_integral = 0.0;
        });
    }
}

impl Default for HeatShared {
    fn default() -> Self {
        Self::new()
    }
}

/// The interrupt half of the heater: owns the gate pin.
pub struct HeatDriver<P: OutputPin> {
    gate: P,
    min_edge_spacing_us: u64,
    max_half_cycle_us: u32,
    pinned_half_cycle_us: Option<u32>,
    cold_start_below_c: f32,
    cold_start_cap: f32,
}

impl<P: OutputPin> HeatDriver<P> {
    pub fn new(gate: P, cfg: &KernelConfig) -> Self {
        Self {
            gate,
            min_edge_spacing_us: cfg.min_edge_spacing_us,
            max_half_cycle_us: cfg.max_half_cycle_us,
            pinned_half_cycle_us: cfg.pinned_half_cycle_us,
            cold_start_below_c: cfg.cold_start_below_c,
            cold_start_cap: cfg.cold_start_cap,
        }
    }

    /// Rising-edge zero-cross handler.
    pub fn on_zero_cross(&mut self, now_us: u64, shared: &HeatShared, status: &StatusBoard) {
        let mut power_percent = None;
        shared.with(|s| {
            let spacing = now_us.saturating_sub(s.last_edge_us);
            if spacing < self.min_edge_spacing_us {
                // Contact bounce or a noise pulse; not a mains edge.
                return;
            }
            s.last_edge_us = now_us;
            s.half_cycle_us = match self.pinned_half_cycle_us {
                Some(pinned) => pinned,
                None if spacing <= self.max_half_cycle_us as u64 => spacing as u32,
                None => s.half_cycle_us,
            };

            let controller = PowerController {
                kp: s.kp,
                cold_start_below: self.cold_start_below_c,
                cold_start_cap: self.cold_start_cap,
            };
            let rate = controller.power_rate(s.target_c, s.current_c, s.error_integral);
            power_percent = Some(((rate * 100.0 + 0.5) as u8).min(100));

            if rate >= 1.0 {
                // Full power: hold the gate, bypass the pulse scheduler.
                let _ = self.gate.set_high();
                s.full_on = true;
                s.mode = GateMode::Idle;
                return;
            }
            if s.full_on {
                let _ = self.gate.set_low();
                s.full_on = false;
            }
            if s.mode == GateMode::Down {
                // A pulse from the previous half-cycle is still HIGH; never
                // leave the pin latched when the scheduler is re-armed.
                let _ = self.gate.set_low();
            }
            if rate <= 0.0 {
                s.mode = GateMode::Idle;
                return;
            }

            let half = s.half_cycle_us as f32;
            let on = phase::conduction_time(half, rate);
            let delay = (half - on) + s.phase_trim_us as f32;
            s.mode = GateMode::Up;
            s.deadline_us = now_us + (delay + 0.5) as u64;
            s.pulse_on_us = (on + 0.5) as u32;
        });
        if let Some(percent) = power_percent {
            status.set_power(percent);
        }
    }

    /// Periodic (~100 µs) gate-timer handler.
    ///
    /// The LOW transition is unconditional on every tick once armed; a missed
    /// HIGH merely skips a half-cycle without latching the triac on.
    pub fn on_tick(&mut self, now_us: u64, shared: &HeatShared) {
        shared.with(|s| match s.mode {
            GateMode::Idle => {}
            GateMode::Up => {
                if now_us >= s.deadline_us {
                    let _ = self.gate.set_high();
                    s.mode = GateMode::Down;
                    s.deadline_us = now_us + s.pulse_on_us as u64;
                }
            }
            GateMode::Down => {
                if now_us >= s.deadline_us {
                    let _ = self.gate.set_low();
                    s.mode = GateMode::Idle;
                }
            }
        });
    }

    /// Drops the gate and disarms the scheduler; the shutdown path.
    pub fn disarm(&mut self, shared: &HeatShared) {
        shared.with(|s| {
            s.mode = GateMode::Idle;
            s.full_on = false;
        });
        let _ = self.gate.set_low();
    }
}
