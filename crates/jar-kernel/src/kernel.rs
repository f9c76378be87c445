//! The foreground loop and device lifecycle.
//!
//! One [`Kernel::poll`] is one pass of the Arduino-shaped main loop:
//! sampler → command ingest → sequencer → status publisher, followed by the
//! caller's idle delay. The interrupt pair ([`crate::heater::HeatDriver`])
//! runs independently of these passes and keeps regulating heat even while
//! the foreground blocks in the melody player.
//!
//! A latched fault freezes control: setpoint, measurement and integral are
//! zeroed on entry to every pass so the heater cannot be driven, while
//! ingest and publication keep running for diagnostics.

use embedded_hal::digital::OutputPin;

use crate::config::KernelConfig;
use crate::hal::{AdcInput, Melody, NvStore, SerialLink, Shell, Sounder, StatusDisplay};
use crate::heater::{HeatDriver, HeatShared};
use crate::ingest::CommandIngest;
use crate::nv;
use crate::program::Program;
use crate::publisher::StatusPublisher;
use crate::sampler::TemperatureSampler;
use crate::sequencer::Sequencer;
use crate::status::StatusBoard;

/// BOOT → ACTIVE → SHUTDOWN, driven by the power switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Boot,
    Active,
    Shutdown,
}

pub struct Kernel {
    cfg: KernelConfig,
    program: Program,
    sampler: TemperatureSampler,
    sequencer: Sequencer,
    ingest: CommandIngest,
    publisher: StatusPublisher,
    lifecycle: Lifecycle,
}

impl Kernel {
    pub fn new(cfg: KernelConfig) -> Self {
        Self {
            cfg,
            program: Program::new(),
            sampler: TemperatureSampler::new(),
            sequencer: Sequencer::new(),
            ingest: CommandIngest::new(),
            publisher: StatusPublisher::new(),
            lifecycle: Lifecycle::Boot,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.cfg
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Power-up: loads the stored tuning (writing defaults back if the store
    /// is fresh or corrupt), arms the sequencer time base, and goes ACTIVE.
    /// The caller enables interrupts afterwards.
    pub fn boot<N: NvStore>(
        &mut self,
        now_us: u64,
        nv: &mut N,
        shared: &HeatShared,
        status: &StatusBoard,
    ) {
        let tuning = nv::load_or_default(nv, &self.cfg);
        shared.with(|s| {
            s.kp = tuning.kp;
            s.ti = tuning.ti;
            s.td = tuning.td;
            if let Some(pinned) = self.cfg.pinned_half_cycle_us {
                s.half_cycle_us = pinned;
            }
        });
        status.reset_faults();
        self.sequencer.start(now_us);
        self.lifecycle = Lifecycle::Active;
    }

    /// One foreground pass.
    pub fn poll<A, L, N, S, D>(
        &mut self,
        now_us: u64,
        shell: &mut Shell<A, L, N, S, D>,
        shared: &HeatShared,
        status: &StatusBoard,
    ) where
        A: AdcInput,
        L: SerialLink,
        N: NvStore,
        S: Sounder,
        D: StatusDisplay,
    {
        if self.lifecycle != Lifecycle::Active {
            return;
        }

        let faulted = status.is_faulted();
        if faulted {
            // Sticky fault: control inputs stay zeroed so the zero-cross
            // handler computes rate 0 and the gate stays cold.
            shared.freeze();
            self.sampler.reset();
        } else {
            self.sampler
                .poll(now_us, &mut shell.adc, &self.cfg, shared, status);
        }

        let events = self.ingest.poll(&mut shell.link, &mut self.program, status);

        if !faulted {
            self.sequencer.poll(
                now_us,
                &mut self.program,
                &self.cfg,
                shared,
                status,
                &mut shell.nv,
                &mut shell.sounder,
            );
        }

        self.publisher
            .poll(now_us, &mut shell.link, &mut shell.display, &self.cfg, status, &events);
    }

    /// Power-down: the caller has already disabled interrupts. Drops the
    /// gate, releases the power-hold output and beeps goodbye.
    pub fn shutdown<G, H, S>(
        &mut self,
        driver: &mut HeatDriver<G>,
        shared: &HeatShared,
        power_hold: &mut H,
        sounder: &mut S,
    ) where
        G: OutputPin,
        H: OutputPin,
        S: Sounder,
    {
        driver.disarm(shared);
        shared.freeze();
        let _ = power_hold.set_low();
        sounder.play(Melody::Shutdown);
        self.lifecycle = Lifecycle::Shutdown;
    }
}
