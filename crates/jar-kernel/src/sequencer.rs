//! The cooking program sequencer.
//!
//! Re-entered on every main-loop pass. Reads the slot under the execute
//! cursor, performs its entry action the first pass it sees a new slot, then
//! accumulates dwell/hold time until the advance condition fires.
//!
//! TARGET requires the measurement to dwell inside the band rather than
//! first-touch it, to ride out overshoot. HOLD durations are minutes on the
//! wire but are reported in seconds at the boundary for fine UI feedback.

use jar_proto::records::{
    encode_remaining_seconds, Opcode, StatusCode, PROGRAM_CAPACITY,
};

use crate::config::KernelConfig;
use crate::hal::{Melody, NvStore, Sounder};
use crate::heater::HeatShared;
use crate::nv;
use crate::program::Program;
use crate::status::StatusBoard;

pub struct Sequencer {
    previous_slot: u8,
    previous_op: u8,
    operation_time_us: u64,
    previous_time_us: u64,
    hold_duration_us: u64,
    started: bool,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            previous_slot: 0,
            previous_op: Opcode::Nop as u8,
            operation_time_us: 0,
            previous_time_us: 0,
            hold_duration_us: 0,
            started: false,
        }
    }

    /// Arms the time base; called once at boot.
    pub fn start(&mut self, now_us: u64) {
        self.previous_time_us = now_us;
        self.started = true;
    }

    pub fn poll<N: NvStore, S: Sounder>(
        &mut self,
        now_us: u64,
        program: &mut Program,
        cfg: &KernelConfig,
        shared: &HeatShared,
        status: &StatusBoard,
        nv: &mut N,
        sounder: &mut S,
    ) {
        if !self.started {
            self.start(now_us);
        }
        let cursor = status.cmdid();
        let slot = program.slot(cursor);
        let dt_us = now_us.saturating_sub(self.previous_time_us);
        let changed = self.previous_slot != cursor || self.previous_op != slot.op;
        if changed {
            self.operation_time_us = 0;
        }

        match slot.opcode() {
            None => {
                // An unassigned opcode reached execution; halt right here.
                status.latch(StatusCode::InvalidCommand);
            }
            Some(Opcode::Nop) => {}
            Some(Opcode::Finish) => {
                program.reset(status);
                shared.with(|s| {
                    s.target_c = 0.0;
                    s.error_integral = 0.0;
                });
                status.set_running(false);
                status.set_remain(0);
                sounder.play(Melody::Finish);
            }
            Some(Opcode::TargetTemperature) => {
                if changed {
                    shared.set_target(slot.params[0] as f32);
                    status.set_running(true);
                }
                let (target, current) = shared.with(|s| (s.target_c, s.current_c));
                if (current - target).abs() <= cfg.target_band_c {
                    self.operation_time_us += dt_us;
                } else {
                    self.operation_time_us = 0;
                }
                if self.operation_time_us >= (cfg.target_dwell_s * 1e6) as u64 {
                    self.advance(program, status);
                }
            }
            Some(Opcode::Hold) => {
                if changed {
                    self.hold_duration_us = slot.param_u16(0) as u64 * 60_000_000;
                    status.set_running(true);
                }
                self.operation_time_us += dt_us;
                if self.operation_time_us >= self.hold_duration_us {
                    status.set_remain(0);
                    sounder.play(Melody::Notify);
                    self.advance(program, status);
                } else {
                    let remaining_s =
                        (self.hold_duration_us - self.operation_time_us).div_ceil(1_000_000);
                    status.set_remain(encode_remaining_seconds(remaining_s as u32));
                }
            }
            Some(Opcode::SetKp) => {
                let value = slot.param_f32(0);
                if nv::kp_in_range(value) {
                    nv.write_f32(nv::KP_ADDR, value);
                    shared.with(|s| s.kp = value);
                } else {
                    status.latch(StatusCode::InvalidArgument);
                }
                self.advance(program, status);
            }
            Some(Opcode::SetTi) => {
                let value = slot.param_f32(0);
                if nv::ti_td_in_range(value) {
                    nv.write_f32(nv::TI_ADDR, value);
                    shared.with(|s| s.ti = value);
                } else {
                    status.latch(StatusCode::InvalidArgument);
                }
                self.advance(program, status);
            }
            Some(Opcode::SetTd) => {
                let value = slot.param_f32(0);
                if nv::ti_td_in_range(value) {
                    nv.write_f32(nv::TD_ADDR, value);
                    shared.with(|s| s.td = value);
                } else {
                    status.latch(StatusCode::InvalidArgument);
                }
                self.advance(program, status);
            }
            Some(Opcode::SetPhaseDelay) => {
                let micros = slot.param_u16(0);
                shared.with(|s| s.phase_trim_us = micros);
                self.advance(program, status);
            }
        }

        self.previous_time_us = now_us;
        self.previous_slot = cursor;
        self.previous_op = slot.op;
    }

    fn advance(&mut self, program: &mut Program, status: &StatusBoard) {
        let next = status.cmdid() + 1;
        if (next as usize) < PROGRAM_CAPACITY {
            status.set_cmdid(next);
        } else {
            // The cursor never executes a slot past the array.
            program.reset(status);
            status.set_running(false);
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}
