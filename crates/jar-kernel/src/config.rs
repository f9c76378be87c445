//! Deployment constants for the control kernel.

use jar_thermal::thermistor::{BParameter, VoltageDivider};

/// Everything a deployment tunes without touching code.
///
/// The defaults describe the stock 50 Hz jar: a 58.3 kΩ @ 25 °C NTC behind a
/// 1.5 kΩ divider fed from 4.7 V, converted against the 1.1 V internal
/// reference of a 10-bit ADC.
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    /// Thermistor model and divider circuit.
    pub thermistor: BParameter<f32>,
    /// Sampler cadence; 5 samples per second by default.
    pub sample_period_us: u64,
    /// Status notification cadence (the peer expects 1000–5000 ms).
    pub publish_period_us: u64,
    /// Ceiling on every wireless round-trip.
    pub reply_timeout_us: u64,
    /// Notification attempts before rebooting the module.
    pub publish_retries: u8,
    /// Module reboot attempts before latching a device fault.
    pub reboot_retries: u8,
    /// Pin the half-cycle instead of measuring it (e.g. `Some(10_000)` for
    /// 50 Hz mains, `Some(8_333)` for 60 Hz). `None` measures.
    pub pinned_half_cycle_us: Option<u32>,
    /// Zero-cross edges closer than this are contact bounce.
    pub min_edge_spacing_us: u64,
    /// Measured intervals above this are noise, not mains.
    pub max_half_cycle_us: u32,
    /// Seconds the measured temperature must dwell inside the band before a
    /// TARGET_TEMPERATURE slot completes.
    pub target_dwell_s: f32,
    /// Half-width of the dwell band in °C.
    pub target_band_c: f32,
    /// Cold-start cap threshold and cap value.
    pub cold_start_below_c: f32,
    pub cold_start_cap: f32,
    /// Above this the over-limit fault latches.
    pub max_temp_c: f32,
    /// Filtered ADC counts outside this window mean a broken divider.
    pub min_plausible_counts: f32,
    pub max_plausible_counts: f32,
    /// Tuning defaults written back when the stored values are invalid.
    pub default_kp: f32,
    pub default_ti: f32,
    pub default_td: f32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            thermistor: BParameter {
                b: 3950.0,
                r0: 58.3,
                t0: 25.0,
                divider: VoltageDivider {
                    r_series: 1.5,
                    v_supply: 4.7,
                    v_ref: 1.1,
                    full_scale: 1024.0,
                },
            },
            sample_period_us: 200_000,
            publish_period_us: 3_000_000,
            reply_timeout_us: 1_000_000,
            publish_retries: 3,
            reboot_retries: 3,
            pinned_half_cycle_us: None,
            min_edge_spacing_us: 5_000,
            max_half_cycle_us: 20_000,
            target_dwell_s: 120.0,
            target_band_c: 0.5,
            cold_start_below_c: 40.0,
            cold_start_cap: 0.5,
            // The stock divider saturates a little above this, so anything
            // hotter is either this fault or a feedback failure.
            max_temp_c: 90.0,
            min_plausible_counts: 8.0,
            max_plausible_counts: 1016.0,
            default_kp: 0.3,
            default_ti: 0.01,
            default_td: 0.0,
        }
    }
}
