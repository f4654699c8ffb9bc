//! [`LineDriver`] over individual `embedded-hal` output pins.

use core::convert::Infallible;
use embedded_hal::digital::OutputPin;

use crate::MAX_LINES;
use crate::line::LineDriver;

/// Up to six output pins acting as the low bits of an output group.
///
/// The pins are already outputs by type, so [`LineDriver::set_direction`]
/// does nothing. Levels are tracked in a shadow byte; bits above `N` are
/// kept in the shadow only, and a transmitter built on the bank never
/// takes more than `N` lines. A write updates only the pins whose level
/// changes, one pin after another.
pub struct PinBank<P, const N: usize> {
    pins: [P; N],
    shadow: u8,
}

impl<P, const N: usize> PinBank<P, N>
where
    P: OutputPin<Error = Infallible>,
{
    /// Take over `pins`, pin `n` being line `n`. All pins are set high.
    pub fn new(pins: [P; N]) -> Self {
        const { assert!(N >= 1 && N <= MAX_LINES, "a pin bank holds 1 to 6 pins") };

        let mut bank = Self { pins, shadow: 0 };
        for pin in bank.pins.iter_mut() {
            let Ok(()) = pin.set_high();
        }
        bank.shadow = ((1u16 << N) - 1) as u8;
        bank
    }

    /// Give the pins back.
    pub fn release(self) -> [P; N] {
        self.pins
    }
}

impl<P, const N: usize> LineDriver for PinBank<P, N>
where
    P: OutputPin<Error = Infallible>,
{
    fn set_direction(&mut self, _outputs: u8) {}

    fn read_current(&mut self) -> u8 {
        self.shadow
    }

    fn lines(&self) -> u8 {
        N as u8
    }

    #[inline(always)]
    fn write_atomic(&mut self, value: u8) {
        let changed = self.shadow ^ value;
        for (line, pin) in self.pins.iter_mut().enumerate() {
            let bit = 1 << line;
            if changed & bit == 0 {
                continue;
            }
            let Ok(()) = if value & bit != 0 {
                pin.set_high()
            } else {
                pin.set_low()
            };
        }
        self.shadow = value;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use core::cell::Cell;
    use embedded_hal::digital::ErrorType;

    struct FakePin<'a> {
        level: &'a Cell<bool>,
        toggles: &'a Cell<u32>,
    }

    impl ErrorType for FakePin<'_> {
        type Error = Infallible;
    }

    impl OutputPin for FakePin<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.level.set(false);
            self.toggles.set(self.toggles.get() + 1);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.level.set(true);
            self.toggles.set(self.toggles.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn drives_pins_from_bits() {
        let levels = [const { Cell::new(false) }; 3];
        let toggles = Cell::new(0);
        let pins = [0, 1, 2].map(|i| FakePin {
            level: &levels[i],
            toggles: &toggles,
        });

        let mut bank = PinBank::new(pins);
        assert_eq!(bank.read_current(), 0b111);
        assert!(levels.iter().all(Cell::get));

        bank.write_atomic(0b101);
        assert_eq!(levels.each_ref().map(Cell::get), [true, false, true]);
        assert_eq!(bank.read_current(), 0b101);
    }

    #[test]
    fn skips_unchanged_pins() {
        let levels = [const { Cell::new(false) }; 2];
        let toggles = Cell::new(0);
        let pins = [0, 1].map(|i| FakePin {
            level: &levels[i],
            toggles: &toggles,
        });

        let mut bank = PinBank::new(pins);
        toggles.set(0);
        bank.write_atomic(0b11);
        assert_eq!(toggles.get(), 0);
        bank.write_atomic(0b10);
        assert_eq!(toggles.get(), 1);
    }

    #[test]
    fn works_as_transmitter_output() {
        use crate::sim::{SimDelay, Trace};
        use crate::{Config, Transmitter};

        let levels = [const { Cell::new(false) }; 2];
        let toggles = Cell::new(0);
        let pins = [0, 1].map(|i| FakePin {
            level: &levels[i],
            toggles: &toggles,
        });

        let trace = Trace::new();
        let mut tx = Transmitter::new(
            PinBank::new(pins),
            SimDelay::new(&trace),
            2,
            Config::new(8_000_000),
        );
        tx.begin(9600, 2);
        toggles.set(0);

        tx.write(&[0b00, 0b01]).unwrap();
        // 0b10, 0b00, then idle 0b11.
        assert_eq!(toggles.get(), 1 + 1 + 2);
        assert!(levels.iter().all(Cell::get));
    }

    #[test]
    fn transmitter_limited_to_bank_width() {
        use crate::sim::{SimDelay, Trace};
        use crate::{Config, Transmitter, WriteError};

        let levels = [const { Cell::new(false) }; 2];
        let toggles = Cell::new(0);
        let pins = [0, 1].map(|i| FakePin {
            level: &levels[i],
            toggles: &toggles,
        });

        let trace = Trace::new();
        let mut tx = Transmitter::new(
            PinBank::new(pins),
            SimDelay::new(&trace),
            3,
            Config::new(8_000_000),
        );
        assert_eq!(tx.lines().pins(), 2);

        tx.begin(9600, 2);
        toggles.set(0);
        assert_eq!(
            tx.write(&[0, 0, 0]),
            Err(WriteError::ValueCount {
                expected: 2,
                got: 3
            })
        );
        assert_eq!(toggles.get(), 0);

        tx.write(&[0, 0]).unwrap();
        assert!(levels.iter().all(Cell::get));
    }
}
