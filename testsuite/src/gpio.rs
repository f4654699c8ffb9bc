//! GPIO port B of the LM3S6965 (QEMU testing only).
//!
//! QEMU models the port as a PL061 with the Luminary extensions. Data
//! register accesses are masked by address bits 9:2, so the all-ones
//! offset `0x3FC` reads and writes the whole port in one access. Writes
//! only change pins configured as outputs.

use core::ptr::{with_exposed_provenance, with_exposed_provenance_mut};
use para_serial::LineDriver;

const SYSCTL_RCGC2: usize = 0x400F_E108;
const RCGC2_GPIOB: u32 = 1 << 1;

const GPIO_PORTB_BASE: usize = 0x4000_5000;

const GPIO_DATA_ALL_OFFSET: usize = 0x3FC; // Data, all bits unmasked
const GPIO_DIR_OFFSET: usize = 0x400; // Direction, 1 = output
const GPIO_DEN_OFFSET: usize = 0x51C; // Digital enable

fn read(offset: usize) -> u32 {
    let reg = with_exposed_provenance::<u32>(GPIO_PORTB_BASE + offset);
    unsafe { reg.read_volatile() }
}

fn write(offset: usize, value: u32) {
    let reg = with_exposed_provenance_mut::<u32>(GPIO_PORTB_BASE + offset);
    unsafe { reg.write_volatile(value) }
}

/// The whole of GPIO port B as one output group.
pub struct PortB {
    _private: (),
}

impl PortB {
    /// Clock the port. Only one `PortB` must exist at a time.
    pub fn new() -> Self {
        let rcgc2 = with_exposed_provenance_mut::<u32>(SYSCTL_RCGC2);
        unsafe { rcgc2.write_volatile(rcgc2.read_volatile() | RCGC2_GPIOB) };
        Self { _private: () }
    }

    /// Make `mask` outputs and drive them to `level`, for bits that do not
    /// belong to the transmitter.
    pub fn preset(&mut self, mask: u8, level: u8) {
        self.set_direction(mask);
        let current = self.read_current();
        self.write_atomic((current & !mask) | (level & mask));
    }
}

impl LineDriver for PortB {
    fn set_direction(&mut self, outputs: u8) {
        write(GPIO_DIR_OFFSET, read(GPIO_DIR_OFFSET) | u32::from(outputs));
        write(GPIO_DEN_OFFSET, read(GPIO_DEN_OFFSET) | u32::from(outputs));
    }

    fn read_current(&mut self) -> u8 {
        read(GPIO_DATA_ALL_OFFSET) as u8
    }

    #[inline(always)]
    fn write_atomic(&mut self, value: u8) {
        write(GPIO_DATA_ALL_OFFSET, u32::from(value));
    }
}

/// Records the port level after every write, as read back from the data
/// register.
pub struct Recorder<D> {
    inner: D,
    levels: [u8; 64],
    len: usize,
}

impl<D: LineDriver> Recorder<D> {
    /// Wrap `inner` with an empty record.
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            levels: [0; 64],
            len: 0,
        }
    }

    /// Levels recorded so far. Writes past the 64th are dropped.
    pub fn levels(&self) -> &[u8] {
        &self.levels[..self.len]
    }

    /// Forget the record.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<D: LineDriver> LineDriver for Recorder<D> {
    fn set_direction(&mut self, outputs: u8) {
        self.inner.set_direction(outputs);
    }

    fn read_current(&mut self) -> u8 {
        self.inner.read_current()
    }

    fn lines(&self) -> u8 {
        self.inner.lines()
    }

    fn write_atomic(&mut self, value: u8) {
        self.inner.write_atomic(value);
        if self.len < self.levels.len() {
            self.levels[self.len] = self.inner.read_current();
            self.len += 1;
        }
    }
}
