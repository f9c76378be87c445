//! Temperature acquisition.
//!
//! Runs from the main loop at the sample cadence. Five raw ADC readings
//! collapse into one median, ten medians into one moving average, so at least
//! fifty raw samples back every controller-visible update. The median kills
//! single-sample spikes; the average kills ADC noise.

use fixed::types::I8F8;
use jar_proto::records::StatusCode;
use jar_thermal::control::leaky_step;
use jar_thermal::filter::{MedianFilter, MovingAverageFilter};
use jar_thermal::thermistor::Thermistor;

use crate::config::KernelConfig;
use crate::hal::AdcInput;
use crate::heater::HeatShared;
use crate::status::StatusBoard;

const MEDIAN_WINDOW: usize = 5;
const HISTORY_DEPTH: usize = 10;

pub struct TemperatureSampler {
    median: MedianFilter<u16, MEDIAN_WINDOW>,
    history: MovingAverageFilter<f32, HISTORY_DEPTH>,
    next_sample_at_us: u64,
}

impl TemperatureSampler {
    pub fn new() -> Self {
        Self {
            median: MedianFilter::new(),
            history: MovingAverageFilter::new(),
            next_sample_at_us: 0,
        }
    }

    /// One foreground pass: at most one ADC conversion, and a controller
    /// update only when both filter stages produce output.
    pub fn poll<A: AdcInput>(
        &mut self,
        now_us: u64,
        adc: &mut A,
        cfg: &KernelConfig,
        shared: &HeatShared,
        status: &StatusBoard,
    ) {
        if now_us < self.next_sample_at_us {
            return;
        }
        self.next_sample_at_us = now_us + cfg.sample_period_us;

        let raw = adc.read().min(1023);
        let Some(median) = self.median.push(raw) else {
            return;
        };
        let Some(mean_counts) = self.history.push(median as f32) else {
            return;
        };

        if mean_counts < cfg.min_plausible_counts || mean_counts > cfg.max_plausible_counts {
            // Divider at a rail: open or shorted sensor, not a temperature.
            status.latch(StatusCode::TemperatureFeedbackFailed);
            return;
        }

        let celsius = cfg.thermistor.counts_to_celsius(mean_counts);
        if celsius > cfg.max_temp_c {
            status.latch(StatusCode::TemperatureOverLimit);
        }

        shared.with(|s| {
            s.current_c = celsius;
            let error = s.target_c - celsius;
            s.error_integral = leaky_step(s.error_integral, error, s.ti);
        });
        status.set_temperature_q8(I8F8::saturating_from_num(celsius).to_bits());
    }

    /// Drops any partial filter state; used when control is frozen.
    pub fn reset(&mut self) {
        self.median.reset();
        self.history.reset();
    }
}

impl Default for TemperatureSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    struct FixedAdc(u16);
    impl AdcInput for FixedAdc {
        fn read(&mut self) -> u16 {
            self.0
        }
    }

    /// Counts that read as the thermistor's reference temperature (25 °C).
    fn counts_at_t0(cfg: &KernelConfig) -> u16 {
        let d = cfg.thermistor.divider;
        let pinned = d.r_series * d.v_supply * d.full_scale / d.v_ref;
        (pinned / (cfg.thermistor.r0 + d.r_series)) as u16
    }

    fn run_until_update(
        sampler: &mut TemperatureSampler,
        adc: &mut FixedAdc,
        cfg: &KernelConfig,
        shared: &HeatShared,
        status: &StatusBoard,
    ) {
        let mut now = 0;
        // 50 raw samples: 10 medians into the history ring.
        for _ in 0..(MEDIAN_WINDOW * HISTORY_DEPTH) {
            sampler.poll(now, adc, cfg, shared, status);
            now += cfg.sample_period_us;
        }
    }

    #[test]
    fn fifty_samples_produce_one_update() {
        let cfg = KernelConfig::default();
        let shared = HeatShared::new();
        let status = StatusBoard::new();
        let mut sampler = TemperatureSampler::new();
        let mut adc = FixedAdc(counts_at_t0(&cfg));

        let mut now = 0;
        for _ in 0..(MEDIAN_WINDOW * HISTORY_DEPTH - 1) {
            sampler.poll(now, &mut adc, &cfg, &shared, &status);
            now += cfg.sample_period_us;
        }
        // 49 samples: still no controller-visible temperature.
        assert_eq!(shared.with(|s| s.current_c), 0.0);

        sampler.poll(now, &mut adc, &cfg, &shared, &status);
        let current = shared.with(|s| s.current_c);
        assert!(approx_eq!(f32, current, 25.0, epsilon = 0.2), "read {current}");
        // Q8.8 publication.
        let q8 = status.snapshot().temperature;
        assert!((q8 - 25 * 256).abs() < 64, "q8 was {q8}");
    }

    #[test]
    fn sample_cadence_is_respected() {
        let cfg = KernelConfig::default();
        let shared = HeatShared::new();
        let status = StatusBoard::new();
        let mut sampler = TemperatureSampler::new();
        let mut adc = FixedAdc(500);

        // Polling faster than the cadence consumes only one sample.
        sampler.poll(0, &mut adc, &cfg, &shared, &status);
        sampler.poll(1_000, &mut adc, &cfg, &shared, &status);
        sampler.poll(2_000, &mut adc, &cfg, &shared, &status);
        // Four samples total: the first median batch never completes.
        sampler.poll(cfg.sample_period_us, &mut adc, &cfg, &shared, &status);
        sampler.poll(2 * cfg.sample_period_us, &mut adc, &cfg, &shared, &status);
        sampler.poll(3 * cfg.sample_period_us, &mut adc, &cfg, &shared, &status);
        assert_eq!(shared.with(|s| s.current_c), 0.0);
    }

    #[test]
    fn rail_readings_latch_feedback_failure() {
        let cfg = KernelConfig::default();
        let shared = HeatShared::new();
        let status = StatusBoard::new();
        let mut sampler = TemperatureSampler::new();
        let mut adc = FixedAdc(1023);

        run_until_update(&mut sampler, &mut adc, &cfg, &shared, &status);
        assert_eq!(status.code(), StatusCode::TemperatureFeedbackFailed as i8);
        // The implausible reading never became a temperature.
        assert_eq!(shared.with(|s| s.current_c), 0.0);
    }

    #[test]
    fn plausible_but_hot_readings_latch_over_limit() {
        let cfg = KernelConfig::default();
        let shared = HeatShared::new();
        let status = StatusBoard::new();
        let mut sampler = TemperatureSampler::new();
        // ~92 °C: inside the plausibility window, above the 90 °C limit.
        let mut adc = FixedAdc(990);

        run_until_update(&mut sampler, &mut adc, &cfg, &shared, &status);
        assert_eq!(status.code(), StatusCode::TemperatureOverLimit as i8);
        // The measurement itself still published.
        assert!(shared.with(|s| s.current_c) > 90.0);
    }

    #[test]
    fn integral_accumulates_with_ti() {
        let cfg = KernelConfig::default();
        let shared = HeatShared::new();
        let status = StatusBoard::new();
        let mut sampler = TemperatureSampler::new();
        let mut adc = FixedAdc(counts_at_t0(&cfg));

        shared.with(|s| {
            s.target_c = 35.0;
            s.ti = 0.5;
        });
        run_until_update(&mut sampler, &mut adc, &cfg, &shared, &status);
        let integral = shared.with(|s| s.error_integral);
        // error ≈ 10 °C, one leaky step at α = 0.5.
        assert!(approx_eq!(f32, integral, 5.0, epsilon = 0.2), "integral {integral}");
    }
}
