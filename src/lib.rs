#![no_std]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

#[cfg(test)]
extern crate std;

// This must go first so the logging macros are visible to the other modules.
mod fmt;

mod calibrate;
mod delay;
mod frame;
mod line;
#[cfg(feature = "embedded-hal")]
mod pins;
#[cfg(test)]
mod sim;
mod transmit;

pub use calibrate::{
    CalibratedDelay, CostModel, DelayModel, LoopOverhead, Timing, calibrate, calibrate_dual,
    calibrate_single, target_cycles, timing,
};
pub use delay::{CHEAP_CYCLES, COSTLY_CYCLES, CycleCounter, Delay, SpinDelay};
pub use frame::{FrameGeometry, MAX_FRAME_BITS};
pub use line::{LineConfiguration, LineDriver, LineSet};
#[cfg(feature = "embedded-hal")]
pub use pins::PinBank;
pub use transmit::{Config, Transmitter, WriteError};

/// Maximum number of simultaneously driven lines.
pub const MAX_LINES: usize = 6;
