//! Six lines, each carrying its own 8N1 byte, next to two foreign
//! outputs on the same port that must not be disturbed.

#![no_std]
#![no_main]

use para_serial::Transmitter;
use testsuite::gpio::{PortB, Recorder};
use testsuite::{AsmDelay, CONFIG, check, decode_8n1, entry, exit_success, frame_8n1};

const FOREIGN: u8 = 0b1100_0000;
const FOREIGN_LEVEL: u8 = 0b1000_0000;

#[entry]
fn main() -> ! {
    let mut port = PortB::new();
    port.preset(FOREIGN, FOREIGN_LEVEL);

    let mut tx = Transmitter::new(Recorder::new(port), AsmDelay, 6, CONFIG);
    check(tx.lines().idle_mask() == FOREIGN_LEVEL, "foreign level captured");

    tx.begin(115_200, 10);
    defmt::info!("{}", tx.calibration().unwrap());

    let message = *b"PARSER";
    tx.write(&message.map(frame_8n1)).unwrap();

    let (recorder, _) = tx.release();
    let levels = recorder.levels();
    defmt::info!("levels: {=[u8]:#x}", levels);

    check(levels.len() == 12, "idle, ten slots, idle");
    check(levels[0] == 0b1011_1111, "idle before frame");
    check(levels[11] == 0b1011_1111, "idle after frame");
    check(
        levels.iter().all(|l| l & FOREIGN == FOREIGN_LEVEL),
        "foreign bits untouched",
    );

    let slots = &levels[1..11];
    for (line, expected) in message.iter().enumerate() {
        let got = decode_8n1(slots, line as u8);
        defmt::info!("line {=usize}: {=?}", line, got);
        check(got == Some(*expected), "byte recovered");
    }

    exit_success();
}
