//! Conversion of a baud rate into delay primitive repeat counts.
//!
//! One iteration of the transmit loop costs a fixed overhead, which grows
//! with the number of lines it has to test, plus whatever delay it issues.
//! Calibration picks the delay so that the iteration lasts at least one
//! bit period and overshoots it as little as the primitives allow.
//!
//! Two cost models are supported:
//!
//! - [`DelayModel::Single`] issues only the 4-cycle primitive. The bit
//!   period is hit to within 4 cycles.
//! - [`DelayModel::Dual`] issues both the 3-cycle and the 4-cycle
//!   primitive. Any remainder of 6 cycles or more is hit exactly, which
//!   matters at high baud rates where a few cycles are a large share of
//!   the bit period.

use crate::MAX_LINES;
use crate::delay::{CHEAP_CYCLES, COSTLY_CYCLES, Delay};

/// Cycles reserved by the dual model for the mandatory single repeat of
/// each primitive.
const DUAL_BASE_CYCLES: u32 = CHEAP_CYCLES + COSTLY_CYCLES;

/// Remainders at or above this are reduced in blocks of
/// [`DUAL_BLOCK_CYCLES`] before the table lookup.
const DUAL_REDUCE_FROM: u32 = 6;

/// Three costly repeats.
const DUAL_BLOCK_CYCLES: u32 = 3 * COSTLY_CYCLES;

/// Extra `(cheap, costly)` repeats covering a residual of `index` cycles.
///
/// Every entry costs at least `index` cycles. Residuals from 6 up are
/// matched exactly, which is why the reduction above keeps the lookup in
/// the `6..18` window.
const RESIDUAL_TABLE: [(u8, u8); 20] = [
    (0, 0), // 0
    (1, 0), // 1, +2
    (1, 0), // 2, +1
    (1, 0), // 3
    (0, 1), // 4
    (2, 0), // 5, +1
    (2, 0), // 6
    (1, 1), // 7
    (0, 2), // 8
    (3, 0), // 9
    (2, 1), // 10
    (1, 2), // 11
    (0, 3), // 12
    (3, 1), // 13
    (2, 2), // 14
    (5, 0), // 15
    (0, 4), // 16
    (3, 2), // 17
    (6, 0), // 18
    (5, 1), // 19
];

/// Which delay primitives the transmit loop issues between bit-slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DelayModel {
    /// Only the 4-cycle primitive.
    Single,
    /// The 3-cycle primitive followed by the 4-cycle primitive.
    Dual,
}

/// Fixed cycle cost of one transmit loop iteration, indexed by the number
/// of active lines.
///
/// These numbers depend on the core, the compiler and the
/// [`LineDriver`](crate::LineDriver) in use. The provided tables were
/// measured on a 16 MHz AVR writing a whole port; measure again for any
/// other setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopOverhead(pub [u32; MAX_LINES]);

impl LoopOverhead {
    /// AVR loop issuing one delay primitive per bit-slot.
    pub const SINGLE_AVR: Self = Self([36, 42, 48, 55, 62, 67]);

    /// AVR loop issuing both delay primitives per bit-slot.
    pub const DUAL_AVR: Self = Self([32, 37, 44, 48, 54, 58]);

    /// Overhead for `pins` active lines, clamped to `1..=6`.
    #[inline]
    pub const fn for_lines(&self, pins: u8) -> u32 {
        let index = if pins == 0 {
            0
        } else if pins as usize > MAX_LINES {
            MAX_LINES - 1
        } else {
            pins as usize - 1
        };
        self.0[index]
    }
}

/// A delay model together with the loop overhead it was measured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CostModel {
    /// Primitives issued between bit-slots.
    pub model: DelayModel,
    /// Fixed loop cost per active line count.
    pub overhead: LoopOverhead,
}

impl CostModel {
    /// Single-primitive loop on AVR.
    pub const AVR_SINGLE: Self = Self {
        model: DelayModel::Single,
        overhead: LoopOverhead::SINGLE_AVR,
    };

    /// Two-primitive loop on AVR.
    pub const AVR_DUAL: Self = Self {
        model: DelayModel::Dual,
        overhead: LoopOverhead::DUAL_AVR,
    };
}

impl Default for CostModel {
    fn default() -> Self {
        Self::AVR_DUAL
    }
}

/// Delay issued between two consecutive bit-slots.
///
/// Every count is at least 1, so some delay is always issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibratedDelay {
    /// Repeats of the 4-cycle primitive.
    Single {
        /// Number of repeats.
        repeats: u32,
    },
    /// Repeats of the 3-cycle primitive, then of the 4-cycle primitive.
    ///
    /// Only the total cost in cycles grows with the bit period. Either
    /// count on its own may drop when the next residual is better covered
    /// by the other primitive, e.g. a remainder of 17 cycles above the
    /// mandatory repeats gives 4 cheap repeats and 18 gives 3.
    Dual {
        /// Repeats of the 3-cycle primitive.
        cheap: u32,
        /// Repeats of the 4-cycle primitive.
        costly: u32,
    },
}

impl CalibratedDelay {
    /// Cycles spent in the delay primitives.
    pub const fn cycles(&self) -> u32 {
        match *self {
            Self::Single { repeats } => repeats * COSTLY_CYCLES,
            Self::Dual { cheap, costly } => cheap * CHEAP_CYCLES + costly * COSTLY_CYCLES,
        }
    }

    /// Burn the calibrated delay.
    #[inline(always)]
    pub fn issue<D: Delay>(&self, delay: &mut D) {
        match *self {
            Self::Single { repeats } => delay.spin_costly(repeats),
            Self::Dual { cheap, costly } => {
                delay.spin_cheap(cheap);
                delay.spin_costly(costly);
            }
        }
    }
}

/// Cycle budget of one bit-slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Requested bit period, `clock_hz / baud`.
    pub target_cycles: u32,
    /// Fixed loop cost for the configured line count.
    pub overhead_cycles: u32,
    /// Cycles spent in the delay primitives.
    pub delay_cycles: u32,
}

impl Timing {
    /// Computed bit period.
    #[inline]
    pub const fn loop_cycles(&self) -> u32 {
        self.overhead_cycles + self.delay_cycles
    }

    /// How far the computed bit period overshoots the requested one.
    #[inline]
    pub const fn slack(&self) -> u32 {
        self.loop_cycles().saturating_sub(self.target_cycles)
    }
}

/// Requested bit period in clock cycles, rounded down.
///
/// A `baud` of 0 is a caller error; it is treated as 1.
#[inline]
pub const fn target_cycles(clock_hz: u32, baud: u32) -> u32 {
    debug_assert!(baud > 0, "baud rate must be positive");
    clock_hz / if baud == 0 { 1 } else { baud }
}

/// Compute the delay for `pins` lines at `baud` on a core clocked at
/// `clock_hz`.
pub fn calibrate(clock_hz: u32, baud: u32, pins: u8, cost: &CostModel) -> CalibratedDelay {
    let target = target_cycles(clock_hz, baud);
    let overhead = cost.overhead.for_lines(pins);

    match cost.model {
        DelayModel::Single => calibrate_single(target, overhead),
        DelayModel::Dual => calibrate_dual(target, overhead),
    }
}

/// Timing report for a calibration result.
pub fn timing(
    clock_hz: u32,
    baud: u32,
    pins: u8,
    cost: &CostModel,
    delay: &CalibratedDelay,
) -> Timing {
    Timing {
        target_cycles: target_cycles(clock_hz, baud),
        overhead_cycles: cost.overhead.for_lines(pins),
        delay_cycles: delay.cycles(),
    }
}

/// Single-primitive calibration.
///
/// One repeat is always issued on top of the rounded-up remainder.
pub const fn calibrate_single(target: u32, overhead: u32) -> CalibratedDelay {
    let remainder = target.saturating_sub(overhead);

    CalibratedDelay::Single {
        repeats: 1 + remainder.div_ceil(COSTLY_CYCLES),
    }
}

/// Two-primitive calibration.
///
/// One repeat of each primitive is always issued. The rest of the
/// remainder is split into blocks of three costly repeats, leaving a
/// residual in `6..18` that the residual table covers exactly.
pub const fn calibrate_dual(target: u32, overhead: u32) -> CalibratedDelay {
    let remainder = target.saturating_sub(overhead);
    let mut rest = if remainder >= DUAL_BASE_CYCLES {
        remainder - DUAL_BASE_CYCLES
    } else {
        0
    };

    let mut cheap = 1;
    let mut costly = 1;

    if rest >= DUAL_REDUCE_FROM {
        let reducible = rest - DUAL_REDUCE_FROM;
        costly += (reducible / DUAL_BLOCK_CYCLES) * 3;
        rest = reducible % DUAL_BLOCK_CYCLES + DUAL_REDUCE_FROM;
    }

    let (extra_cheap, extra_costly) = RESIDUAL_TABLE[rest as usize];
    cheap += extra_cheap as u32;
    costly += extra_costly as u32;

    CalibratedDelay::Dual { cheap, costly }
}
