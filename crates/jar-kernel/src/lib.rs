#![cfg_attr(not(feature = "std"), no_std)]

//! # Heat-Jar Control Kernel
//!
//! The real-time core of a networked cooking appliance: closed-loop
//! temperature regulation of a resistive AC heater by phase-angle control,
//! driven by a scripted cooking program received over a wireless serial link.
//!
//! ## Structure
//!
//! - **[`heater`]**: the zero-cross / gate-timer interrupt pair and the
//!   ISR-visible shared state they regulate from.
//! - **[`sampler`]**: ADC → median → moving average → thermistor conversion →
//!   error accumulation, run from the foreground.
//! - **[`sequencer`]**: walks the indexed cooking program and advances on
//!   completion.
//! - **[`ingest`]** / **[`publisher`]**: the two halves of the framed serial
//!   protocol — command loading and status notification with retry and
//!   module reboot.
//! - **[`status`]** / **[`program`]** / **[`nv`]**: the wire-visible status
//!   board with its fault latch, the 32-slot program array, and the
//!   non-volatile tuning triple.
//! - **[`kernel`]**: boots, sequences the foreground passes, and shuts down.
//!
//! ## Concurrency
//!
//! The kernel is bare-metal shaped: a cooperative foreground loop plus two
//! interrupt handlers (zero-cross edge and a ~10 kHz gate timer). Everything
//! the handlers touch lives behind `critical_section::Mutex<RefCell<..>>`
//! cells, so the same types serve as `static`s on a target and as plain
//! locals under the `std` critical-section implementation in tests and the
//! simulator. The gate pin is driven exclusively by the interrupt side; the
//! foreground never writes it.

pub mod config;
pub mod hal;
pub mod heater;
pub mod ingest;
pub mod kernel;
pub mod nv;
pub mod program;
pub mod publisher;
pub mod sampler;
pub mod sequencer;
pub mod status;

pub use config::KernelConfig;
pub use heater::{GateMode, HeatDriver, HeatShared};
pub use kernel::{Kernel, Lifecycle};
pub use status::StatusBoard;
