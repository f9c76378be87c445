//! The deterministic step harness.
//!
//! Owns a full appliance — kernel, interrupt driver, shared state and
//! simulated peripherals — and advances simulated time event by event:
//! zero-cross edges on the mains grid, gate-timer ticks while a pulse is
//! armed, and foreground polls on the loop cadence. Between events nothing
//! happens, which is what makes long scenarios (hours of cooking) cheap and
//! exact.

use jar_kernel::hal::{PowerSwitch as _, Shell};
use jar_kernel::heater::{GateMode, HeatDriver, HeatShared};
use jar_kernel::{Kernel, KernelConfig, Lifecycle, StatusBoard};
use jar_proto::frame;
use jar_proto::records::{CommandRecord, StatusRecord};
use rand::Rng;

use crate::clock::SimClock;
use crate::link::{PeerMode, SimLink};
use crate::peripherals::{
    RecordingDisplay, SimAdc, SimNvStore, SimPin, SimPowerSwitch, SimSounder,
};
use crate::plant::{counts_for_temperature, JarPlant};

/// Shape of a harness run.
#[derive(Debug, Clone, Copy)]
pub struct HarnessOptions {
    pub config: KernelConfig,
    /// `Some(period)` fires the zero-cross edge on that grid; `None` leaves
    /// the mains dark (scenarios that do not assert on heating).
    pub zero_cross_period_us: Option<u64>,
    /// Gate timer resolution while a pulse is armed.
    pub gate_tick_us: u64,
    /// Foreground loop cadence.
    pub poll_period_us: u64,
    pub peer: PeerMode,
    /// Couple the vessel model to the gate duty cycle.
    pub plant: Option<JarPlant>,
    /// Add a little ADC noise (the virtual appliance uses this).
    pub adc_jitter: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            config: KernelConfig::default(),
            zero_cross_period_us: None,
            gate_tick_us: 100,
            poll_period_us: 1_000,
            peer: PeerMode::default(),
            plant: None,
            adc_jitter: false,
        }
    }
}

pub struct JarHarness {
    pub clock: SimClock,
    pub shared: HeatShared,
    pub status: StatusBoard,
    pub kernel: Kernel,
    pub driver: HeatDriver<SimPin>,
    pub shell: Shell<SimAdc, SimLink, SimNvStore, SimSounder, RecordingDisplay>,
    pub gate: SimPin,
    pub power_hold: SimPin,
    pub link: SimLink,
    pub adc: SimAdc,
    pub nv: SimNvStore,
    pub sounder: SimSounder,
    pub display: RecordingDisplay,
    pub power_switch: SimPowerSwitch,
    pub plant: Option<JarPlant>,
    zero_cross_period_us: Option<u64>,
    gate_tick_us: u64,
    poll_period_us: u64,
    next_zero_cross_us: u64,
    next_poll_us: u64,
    last_plant_us: u64,
    adc_jitter: bool,
}

impl JarHarness {
    pub fn new(opts: HarnessOptions) -> Self {
        let clock = SimClock::new();
        let shared = HeatShared::new();
        let status = StatusBoard::new();
        let gate = SimPin::new(clock.clone());
        let mut power_hold = SimPin::new(clock.clone());
        let link = SimLink::new(clock.clone(), opts.peer);
        let adc = SimAdc::new(counts_for_temperature(&opts.config.thermistor, 25.0));
        let nv = SimNvStore::new();
        let sounder = SimSounder::new();
        let display = RecordingDisplay::new();
        let power_switch = SimPowerSwitch::new();

        let driver = HeatDriver::new(gate.clone(), &opts.config);
        let mut kernel = Kernel::new(opts.config);
        let shell = Shell {
            adc: adc.clone(),
            link: link.clone(),
            nv: nv.clone(),
            sounder: sounder.clone(),
            display: display.clone(),
        };

        // BOOT: the power pin was released, the hold output keeps us alive.
        {
            use embedded_hal::digital::OutputPin as _;
            let _ = power_hold.set_high();
        }
        let mut boot_nv = nv.clone();
        kernel.boot(0, &mut boot_nv, &shared, &status);

        Self {
            clock,
            shared,
            status,
            kernel,
            driver,
            shell,
            gate,
            power_hold,
            link,
            adc,
            nv,
            sounder,
            display,
            power_switch,
            plant: opts.plant,
            zero_cross_period_us: opts.zero_cross_period_us,
            gate_tick_us: opts.gate_tick_us,
            poll_period_us: opts.poll_period_us,
            next_zero_cross_us: opts.zero_cross_period_us.unwrap_or(0),
            next_poll_us: 0,
            last_plant_us: 0,
            adc_jitter: opts.adc_jitter,
        }
    }

    /// Advances simulated time, dispatching events in order.
    pub fn run_for(&mut self, duration_us: u64) {
        let end = self.clock.now_us() + duration_us;
        loop {
            let mut next = self.next_poll_us;
            if self.zero_cross_period_us.is_some() {
                next = next.min(self.next_zero_cross_us);
            }
            let armed = self.shared.with(|s| s.mode != GateMode::Idle);
            let next_tick = if armed {
                (self.clock.now_us() / self.gate_tick_us + 1) * self.gate_tick_us
            } else {
                u64::MAX
            };
            next = next.min(next_tick);
            if next > end {
                break;
            }
            self.clock.set(next);

            if let Some(period) = self.zero_cross_period_us {
                if next == self.next_zero_cross_us {
                    self.driver.on_zero_cross(next, &self.shared, &self.status);
                    self.next_zero_cross_us += period;
                }
            }
            if next == next_tick {
                self.driver.on_tick(next, &self.shared);
            }
            if next == self.next_poll_us {
                self.before_poll(next);
                self.kernel
                    .poll(next, &mut self.shell, &self.shared, &self.status);
                self.next_poll_us += self.poll_period_us;
            }
        }
        self.clock.set(end);
    }

    fn before_poll(&mut self, now_us: u64) {
        if let Some(plant) = &mut self.plant {
            let dt_us = now_us.saturating_sub(self.last_plant_us);
            if dt_us > 0 {
                let on_us = self.gate.take_on_time_us(now_us);
                let power = (on_us as f64 / dt_us as f64).min(1.0);
                plant.step(dt_us as f64 * 1e-6, power);
                let mut counts = counts_for_temperature(
                    &self.kernel.config().thermistor,
                    plant.temperature_c as f32,
                );
                if self.adc_jitter {
                    let wobble: i16 = rand::thread_rng().gen_range(-2..=2);
                    counts = counts.saturating_add_signed(wobble);
                }
                self.adc.set_counts(counts);
                self.last_plant_us = now_us;
            }
        }
        if self.kernel.lifecycle() == Lifecycle::Active && {
            let mut switch = self.power_switch.clone();
            switch.is_pressed()
        } {
            // SHUTDOWN: interrupts off, gate down, hold released, last beep.
            self.kernel.shutdown(
                &mut self.driver,
                &self.shared,
                &mut self.power_hold,
                &mut self.shell.sounder,
            );
        }
    }

    /// Queues a command frame as the peer would send it.
    pub fn send_command(&self, record: &CommandRecord) {
        self.link.push_to_device(&frame::command_line(record));
    }

    /// Queues a raw protocol line (terminator appended).
    pub fn send_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.link.push_to_device(&bytes);
    }

    pub fn snapshot(&self) -> StatusRecord {
        self.status.snapshot()
    }

    /// Pins the measured vessel temperature by setting the ADC accordingly.
    pub fn set_vessel_temperature(&self, celsius: f32) {
        self.adc
            .set_counts(counts_for_temperature(&self.kernel.config().thermistor, celsius));
    }
}
