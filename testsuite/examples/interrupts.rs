//! Frames go out with interrupts masked, and the previous interrupt
//! state is restored afterwards.

#![no_std]
#![no_main]

use cortex_m::register::primask;
use para_serial::{LineDriver, Transmitter};
use testsuite::gpio::PortB;
use testsuite::{AsmDelay, CONFIG, check, entry, exit_success};

/// Counts port writes made while interrupts were enabled.
struct MaskCheck {
    port: PortB,
    unmasked_writes: u32,
}

impl LineDriver for MaskCheck {
    fn set_direction(&mut self, outputs: u8) {
        self.port.set_direction(outputs);
    }

    fn read_current(&mut self) -> u8 {
        self.port.read_current()
    }

    fn write_atomic(&mut self, value: u8) {
        if primask::read().is_inactive() {
            self.unmasked_writes += 1;
        }
        self.port.write_atomic(value);
    }
}

#[entry]
fn main() -> ! {
    let check_port = MaskCheck {
        port: PortB::new(),
        unmasked_writes: 0,
    };
    let mut tx = Transmitter::new(check_port, AsmDelay, 3, CONFIG);

    // begin() idles the lines outside of any critical section.
    unsafe { cortex_m::interrupt::enable() };
    tx.begin(19_200, 10);

    tx.write(&[0x155, 0x2aa, 0x3ff]).unwrap();
    check(primask::read().is_inactive(), "interrupts enabled again");

    cortex_m::interrupt::disable();
    tx.write(&[0x155, 0x2aa, 0x3ff]).unwrap();
    check(primask::read().is_active(), "interrupts still disabled");

    let (port, _) = tx.release();
    defmt::info!("unmasked writes: {=u32}", port.unmasked_writes);
    check(port.unmasked_writes == 1, "only the begin() write was unmasked");

    exit_success();
}
