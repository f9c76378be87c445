//! # In-Process Simulation Harness
//!
//! A deterministic environment for running the heat-jar control kernel
//! without hardware. The simulated clock only moves when the harness steps
//! it, the wireless peer answers from a script, and every peripheral records
//! what the kernel did to it, which makes the end-to-end scenarios exact and
//! CI-friendly.
//!
//! The `virtual-jar` binary reuses the same pieces to expose a live appliance
//! on a TCP socket, so host tooling (`jarctl`) can talk to a jar that only
//! exists in memory.

pub mod clock;
pub mod harness;
pub mod link;
pub mod peripherals;
pub mod plant;

pub use clock::SimClock;
pub use harness::{HarnessOptions, JarHarness};
pub use link::{PeerMode, ScriptedPeer, SimLink, TraceDirection, TraceEntry};
pub use peripherals::{RecordingDisplay, SimAdc, SimNvStore, SimPin, SimPowerSwitch, SimSounder};
pub use plant::{counts_for_temperature, JarPlant};
