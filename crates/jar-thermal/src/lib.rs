#![cfg_attr(not(feature = "std"), no_std)]

//! # Thermal Building Blocks
//!
//! `jar-thermal` provides the leaf algorithms for a resistive-heater
//! controller: sample filtering, thermistor conversion, closed-loop power
//! control and phase-angle timing. Everything here is a pure function of its
//! inputs so the same code runs on a bare-metal target and on a host for
//! simulation and testing.
//!
//! ## Features
//!
//! - **Filters**: batch median and sliding moving-average over ADC readings.
//! - **Thermistor model**: voltage-divider resistance recovery plus the
//!   B-parameter NTC equation.
//! - **Power controller**: proportional control with an external error
//!   integral and a cold-start output cap.
//! - **Phase timing**: conduction-time/firing-delay mapping for a
//!   zero-cross-synchronized triac gate.
//! - **`no_std` support**: usable in bare-metal environments.

pub mod control;
pub mod filter;
pub mod phase;
pub mod thermistor;

// Re-export key types
pub use control::{leaky_step, PowerController};
pub use filter::{MedianFilter, MovingAverageFilter};
pub use thermistor::{BParameter, Thermistor, VoltageDivider};
