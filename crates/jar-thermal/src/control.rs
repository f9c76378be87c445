//! Closed-loop power control.
//!
//! The heater regulator is a proportional controller over the temperature
//! error plus a first-order error integral. The integral is advanced by the
//! sampling path, not the controller, so both stay pure functions and are
//! safe to evaluate from an interrupt handler.

use num_traits::Float;

/// Maps a temperature error to a power rate in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct PowerController<F: Float> {
    /// Proportional gain.
    pub kp: F,
    /// Below this measured temperature the output is capped.
    pub cold_start_below: F,
    /// The output cap applied while below `cold_start_below`.
    pub cold_start_cap: F,
}

impl<F: Float> PowerController<F> {
    /// Creates a controller with the given gain and the stock cold-start
    /// ramp cap (half power below 40 °C).
    pub fn new(kp: F) -> Self {
        Self {
            kp,
            cold_start_below: F::from(40.0).unwrap(),
            cold_start_cap: F::from(0.5).unwrap(),
        }
    }

    /// Computes the power rate for the current control inputs.
    ///
    /// `error_integral` is the externally accumulated (leaky) integral of the
    /// temperature error. The result is clamped to `[0, 1]` and additionally
    /// capped while the vessel is cold to avoid inrush and thermistor
    /// self-heating artifacts.
    pub fn power_rate(&self, target: F, current: F, error_integral: F) -> F {
        let error = target - current;
        let mut rate = self.kp * (error + error_integral);
        rate = rate.max(F::zero()).min(F::one());
        if current < self.cold_start_below {
            rate = rate.min(self.cold_start_cap);
        }
        rate
    }
}

/// One step of a first-order leaky integrator: `x ← x + (u − x)·α`.
///
/// `α` is the leak rate; zero (or negative) leaves the value untouched,
/// which disables accumulation entirely.
pub fn leaky_step<F: Float>(value: F, input: F, alpha: F) -> F {
    if alpha > F::zero() {
        value + (input - value) * alpha
    } else {
        value
    }
}
