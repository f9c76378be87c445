//! Thermistor models for converting ADC values to temperature.

use num_traits::Float;

/// A trait for thermistor models.
pub trait Thermistor<F> {
    /// Converts a (filtered) ADC reading to a temperature in °C.
    fn counts_to_celsius(&self, counts: F) -> F;
}

/// The resistor divider feeding the ADC input.
///
/// The thermistor sits on the low side against a series resistor `r_series`
/// supplied from `v_supply`, while the ADC converts against its own internal
/// reference `v_ref`. Recovering the thermistor resistance from a raw count
/// therefore needs all three constants plus the converter's full scale:
///
/// `R = (Rv·Vs·FS/Vref − Rv·counts) / counts`
#[derive(Debug, Clone, Copy)]
pub struct VoltageDivider<F: Float> {
    /// Series resistance, in the same unit as the model's `r0` (kΩ here).
    pub r_series: F,
    /// Divider supply voltage in volts.
    pub v_supply: F,
    /// ADC reference voltage in volts.
    pub v_ref: F,
    /// ADC full-scale count (e.g. 1024 for a 10-bit converter).
    pub full_scale: F,
}

impl<F: Float> VoltageDivider<F> {
    /// Recovers the thermistor resistance from an ADC reading.
    ///
    /// A reading at or below zero means an open divider; the resistance is
    /// reported as infinite rather than dividing by zero.
    pub fn counts_to_resistance(&self, counts: F) -> F {
        if counts <= F::zero() {
            return F::infinity();
        }
        let pinned = self.r_series * self.v_supply * self.full_scale / self.v_ref;
        let r = (pinned - self.r_series * counts) / counts;
        // A reading above the divider's ceiling maps to a negative
        // resistance; clamp to a short.
        if r < F::zero() {
            F::zero()
        } else {
            r
        }
    }
}

/// An NTC thermistor described by the B-parameter equation.
///
/// `1/T = 1/T0 + (1/B)·ln(R/R0)` with device constants `(B, R0, T0)`;
/// rearranged for °C this is
/// `T = B·(T0+273)/(ln(R/R0)·(T0+273) + B) − 273`.
#[derive(Debug, Clone, Copy)]
pub struct BParameter<F: Float> {
    /// B coefficient in Kelvin (typically 3000–4100 for NTC parts).
    pub b: F,
    /// Reference resistance at `t0`, same unit as the divider's `r_series`.
    pub r0: F,
    /// Reference temperature in °C.
    pub t0: F,
    /// The divider circuit in front of the ADC.
    pub divider: VoltageDivider<F>,
}

impl<F: Float> BParameter<F> {
    fn kelvin_offset() -> F {
        F::from(273.0).unwrap()
    }

    /// Converts a resistance to a temperature in °C.
    pub fn resistance_to_celsius(&self, resistance: F) -> F {
        let t0_k = self.t0 + Self::kelvin_offset();
        let denom = (resistance / self.r0).ln() * t0_k + self.b;
        if denom <= F::zero() {
            // ln(R/R0) → −∞ as R → 0: a shorted sensor reads absurdly hot.
            return F::infinity();
        }
        self.b * t0_k / denom - Self::kelvin_offset()
    }
}

impl<F: Float> Thermistor<F> for BParameter<F> {
    fn counts_to_celsius(&self, counts: F) -> F {
        let resistance = self.divider.counts_to_resistance(counts);
        if resistance == F::infinity() {
            // Open circuit: coldest representable reading.
            return F::neg_infinity();
        }
        self.resistance_to_celsius(resistance)
    }
}
