//! Calibration across the supported range, and the errors returned for
//! writes that break the call contract.

#![no_std]
#![no_main]

use para_serial::{CostModel, Transmitter, WriteError, calibrate, timing};
use testsuite::gpio::{PortB, Recorder};
use testsuite::{AsmDelay, CLOCK_HZ, CONFIG, check, entry, exit_success};

const BAUDS: [u32; 8] = [1200, 2400, 9600, 19_200, 38_400, 57_600, 115_200, 230_400];

#[entry]
fn main() -> ! {
    for cost in [CostModel::AVR_SINGLE, CostModel::AVR_DUAL] {
        let mut undershoots = 0;
        for pins in 1..=6 {
            for baud in BAUDS {
                let delay = calibrate(CLOCK_HZ, baud, pins, &cost);
                let t = timing(CLOCK_HZ, baud, pins, &cost, &delay);
                if t.loop_cycles() < t.target_cycles {
                    defmt::error!("{=u8} lines at {=u32}: {}", pins, baud, t);
                    undershoots += 1;
                }
            }
        }
        defmt::info!("{}: {=u32} undershoots", cost.model, undershoots);
        check(undershoots == 0, "no undershoot");
    }

    let mut tx = Transmitter::new(Recorder::new(PortB::new()), AsmDelay, 2, CONFIG);
    check(
        tx.write(&[1, 2]) == Err(WriteError::NotCalibrated),
        "write before begin",
    );

    tx.begin(9600, 8);
    let first = tx.calibration();
    tx.begin(9600, 8);
    check(tx.calibration() == first, "calibration is repeatable");

    let result = tx.write(&[1]);
    defmt::info!("{}", result);
    check(
        result
            == Err(WriteError::ValueCount {
                expected: 2,
                got: 1,
            }),
        "short value list",
    );

    let (recorder, _) = tx.release();
    // Only the two begin() calls touched the port.
    check(recorder.levels().len() == 2, "rejected writes drive nothing");

    exit_success();
}
