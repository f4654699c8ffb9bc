#![no_std]

pub mod gpio;

use cortex_m_semihosting::debug::{self, EXIT_FAILURE, EXIT_SUCCESS};
use defmt_semihosting as _;
use panic_semihosting as _;
use para_serial::{Config, Delay};

pub use cortex_m_rt::entry;

/// Nominal core clock of the emulated board.
///
/// QEMU does not model instruction timing, so the examples check bit
/// levels and ordering, not bit periods.
pub const CLOCK_HZ: u32 = 12_000_000;

/// Transmitter configuration used by all examples.
pub const CONFIG: Config = Config::new(CLOCK_HZ);

pub fn exit_success() -> ! {
    debug::exit(EXIT_SUCCESS);
    #[allow(clippy::empty_loop)]
    loop {}
}

pub fn exit_failure() -> ! {
    debug::exit(EXIT_FAILURE);
    #[allow(clippy::empty_loop)]
    loop {}
}

/// Log `what` and exit with failure unless `ok`.
pub fn check(ok: bool, what: &str) {
    if ok {
        defmt::info!("ok: {=str}", what);
    } else {
        defmt::error!("FAILED: {=str}", what);
        exit_failure();
    }
}

/// Busy-wait primitives built on `cortex_m::asm::delay`.
pub struct AsmDelay;

impl Delay for AsmDelay {
    #[inline(always)]
    fn spin_cheap(&mut self, repeats: u32) {
        cortex_m::asm::delay(repeats.saturating_mul(para_serial::CHEAP_CYCLES));
    }

    #[inline(always)]
    fn spin_costly(&mut self, repeats: u32) {
        cortex_m::asm::delay(repeats.saturating_mul(para_serial::COSTLY_CYCLES));
    }
}

/// An 8N1 frame: start bit, eight data bits LSB first, stop bit.
pub const fn frame_8n1(byte: u8) -> u16 {
    ((byte as u16) << 1) | (1 << 9)
}

/// Recover the byte carried by line `line` from the levels of a 10-slot
/// 8N1 frame. Returns `None` on a framing error.
pub fn decode_8n1(levels: &[u8], line: u8) -> Option<u8> {
    let bit = |slot: usize| (levels[slot] >> line) & 1;
    if levels.len() < 10 || bit(0) != 0 || bit(9) != 1 {
        return None;
    }
    let mut byte = 0;
    for i in 0..8 {
        byte |= bit(i + 1) << i;
    }
    Some(byte)
}
