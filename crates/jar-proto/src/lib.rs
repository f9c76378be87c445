#![cfg_attr(not(feature = "std"), no_std)]

//! # Heat-Jar Wireless Protocol
//!
//! A `no_std` implementation of the appliance's framed serial protocol: both
//! directions carry printable-ASCII lines terminated by `\n` over a 2400-baud
//! wireless module.
//!
//! ## Key Components
//!
//! - **[`records`]**: the 8-byte wire-visible status and command records and
//!   their fixed little-endian encodings.
//! - **[`frame`]**: the line grammar — inbound `WV,001B,<16 hex>` command
//!   frames, outbound `SHW,001D,<16 hex>` status notifications, the module
//!   bring-up exchange, and the three recognized response prefixes.
//! - **[`line`]**: a bounded line reader that tolerates noise on the link.
//! - **[`codec`]** (std): a `tokio-util` codec for the peer side of the link,
//!   used by host tooling and the simulator.
//!
//! ## Design
//!
//! The parser operates on byte slices, never allocates, and rejects rather
//! than panics on malformed input; a rejected frame leaves the receiver's
//! state untouched.

pub mod frame;
pub mod hex;
pub mod line;
pub mod records;

#[cfg(feature = "std")]
pub mod codec;

/// Common error type for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The frame named a service this device does not provide.
    UnknownService,
    /// The hex payload contained a non-hex digit or the wrong digit count.
    BadHex,
    /// The line did not match the frame grammar.
    Malformed,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::UnknownService => write!(f, "unknown service id"),
            FrameError::BadHex => write!(f, "payload is not 16 hex digits"),
            FrameError::Malformed => write!(f, "line does not match the frame grammar"),
        }
    }
}
