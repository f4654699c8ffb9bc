//! One line, one byte, no framing: the line follows the bits of the
//! value from bit 0 upward and returns high afterwards.

#![no_std]
#![no_main]

use para_serial::Transmitter;
use testsuite::gpio::{PortB, Recorder};
use testsuite::{AsmDelay, CONFIG, check, entry, exit_success};

#[entry]
fn main() -> ! {
    let mut tx = Transmitter::new(Recorder::new(PortB::new()), AsmDelay, 1, CONFIG);
    tx.begin(9600, 8);

    let timing = tx.timing().unwrap();
    defmt::info!("{}", timing);
    check(timing.loop_cycles() >= timing.target_cycles, "no undershoot");

    tx.write(&[0b1011_0010]).unwrap();

    let (recorder, _) = tx.release();
    let levels = recorder.levels();
    defmt::info!("levels: {=[u8]:#x}", levels);

    // begin() idles once, then eight slots and the return to idle.
    check(levels.len() == 10, "ten port writes");
    check(levels[0] & 1 == 1, "idle before frame");
    let bits: [u8; 8] = core::array::from_fn(|i| levels[i + 1] & 1);
    check(bits == [0, 1, 0, 0, 1, 1, 0, 1], "slot levels");
    check(levels[9] & 1 == 1, "idle after frame");

    exit_success();
}
