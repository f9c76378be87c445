//! The non-volatile tuning triple.
//!
//! Four bytes each at fixed addresses: `Kp` at 0, `Ti` at 4, `Td` at 8, in
//! native float encoding. Read once at boot into the RAM-shadowed tuning;
//! written only here (boot-time defaults) and by the sequencer's SET_* ops.

use crate::config::KernelConfig;
use crate::hal::NvStore;

pub const KP_ADDR: usize = 0;
pub const TI_ADDR: usize = 4;
pub const TD_ADDR: usize = 8;

/// The RAM shadow of the stored gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub kp: f32,
    pub ti: f32,
    pub td: f32,
}

/// A fresh store reads as NaN (0xFF bytes); the proportional gain also has
/// to be meaningfully positive and bounded.
pub fn kp_in_range(value: f32) -> bool {
    value.is_finite() && value > 1e-6 && value < 1e4
}

/// The integral leak and derivative gains may be zero (disabled) but not
/// negative or absurd.
pub fn ti_td_in_range(value: f32) -> bool {
    value.is_finite() && (0.0..9e4).contains(&value)
}

/// Boot-time load. Invalid values are replaced by the configured defaults
/// and written back so the next boot reads clean.
pub fn load_or_default<N: NvStore>(nv: &mut N, cfg: &KernelConfig) -> Tuning {
    let mut kp = nv.read_f32(KP_ADDR);
    if !kp_in_range(kp) {
        kp = cfg.default_kp;
        nv.write_f32(KP_ADDR, kp);
    }
    let mut ti = nv.read_f32(TI_ADDR);
    if !ti_td_in_range(ti) {
        ti = cfg.default_ti;
        nv.write_f32(TI_ADDR, ti);
    }
    let mut td = nv.read_f32(TD_ADDR);
    if !ti_td_in_range(td) {
        td = cfg.default_td;
        nv.write_f32(TD_ADDR, td);
    }
    Tuning { kp, ti, td }
}
