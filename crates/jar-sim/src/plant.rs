//! A first-order thermal model of the vessel.

use jar_thermal::thermistor::BParameter;

/// `dT = (k_heat·p − k_loss·(T − T_amb))·dt`
///
/// Crude but sufficient: full power heats at `heat_rate_c_per_s`, and the
/// vessel bleeds toward ambient proportionally to the excess.
#[derive(Debug, Clone, Copy)]
pub struct JarPlant {
    pub temperature_c: f64,
    pub ambient_c: f64,
    pub heat_rate_c_per_s: f64,
    pub loss_per_s: f64,
}

impl JarPlant {
    pub fn new(ambient_c: f64) -> Self {
        Self {
            temperature_c: ambient_c,
            ambient_c,
            heat_rate_c_per_s: 0.5,
            loss_per_s: 0.01,
        }
    }

    /// Advances the model by `dt_s` at `power_fraction` of full heater power.
    pub fn step(&mut self, dt_s: f64, power_fraction: f64) {
        let heating = self.heat_rate_c_per_s * power_fraction.clamp(0.0, 1.0);
        let cooling = self.loss_per_s * (self.temperature_c - self.ambient_c);
        self.temperature_c += (heating - cooling) * dt_s;
    }
}

/// The inverse of the sampler's conversion chain: ADC counts that read as
/// `celsius` through the given thermistor model.
pub fn counts_for_temperature(model: &BParameter<f32>, celsius: f32) -> u16 {
    let t0_k = model.t0 + 273.0;
    let t_k = celsius + 273.0;
    let resistance = model.r0 * (model.b * (1.0 / t_k - 1.0 / t0_k)).exp();
    let d = model.divider;
    let pinned = d.r_series * d.v_supply * d.full_scale / d.v_ref;
    let counts = pinned / (resistance + d.r_series);
    (counts + 0.5).clamp(0.0, 1023.0) as u16
}
