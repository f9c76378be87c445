//! Phase-angle timing for a zero-cross-synchronized triac gate.
//!
//! For a symmetric AC half-cycle of span `T`, firing the gate at phase angle
//! `α` delivers the RMS power fraction `P(α) = 1 − α/π + sin(2α)/(2π)`.
//! Rather than inverting that transcendental exactly, the conduction time for
//! a requested rate `r` uses the algebraic shortcut
//!
//! `Δon(r) = T·arccos(1 − 2r)/π`
//!
//! which covers the range monotonically: `Δon(0) = 0` (gate never opens) and
//! `Δon(1) = T` (gate fires at the zero cross).

use num_traits::Float;

/// On-time within a half-cycle of span `half_cycle` for power rate `rate`.
///
/// `rate` is clamped to `[0, 1]` before the mapping.
pub fn conduction_time<F: Float>(half_cycle: F, rate: F) -> F {
    let r = rate.max(F::zero()).min(F::one());
    let two = F::from(2.0).unwrap();
    half_cycle * (F::one() - two * r).acos() / F::from(core::f64::consts::PI).unwrap()
}

/// Delay from the zero cross to the gate firing for power rate `rate`.
///
/// The complement of [`conduction_time`]: the later the gate fires, the less
/// of the half-cycle conducts.
pub fn firing_delay<F: Float>(half_cycle: F, rate: F) -> F {
    half_cycle - conduction_time(half_cycle, rate)
}
