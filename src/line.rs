//! Ownership of the output lines inside a shared 8-bit output group.

use crate::MAX_LINES;

/// Access to the output group that carries the serial lines.
///
/// The six serial lines occupy bits 0 to 5 of the group. The remaining
/// bits may belong to other code and must survive every write.
pub trait LineDriver {
    /// Switch the lines selected by `outputs` to output mode. Other lines
    /// keep their current direction.
    fn set_direction(&mut self, outputs: u8);

    /// Read the current output levels of the whole group.
    fn read_current(&mut self) -> u8;

    /// Write the whole group in one store.
    fn write_atomic(&mut self, value: u8);

    /// Number of low bits of the group backed by a physical line.
    ///
    /// [`LineSet::configure`] never takes more lines than this.
    fn lines(&self) -> u8 {
        MAX_LINES as u8
    }
}

impl<T: LineDriver + ?Sized> LineDriver for &mut T {
    #[inline(always)]
    fn set_direction(&mut self, outputs: u8) {
        T::set_direction(self, outputs)
    }

    #[inline(always)]
    fn read_current(&mut self) -> u8 {
        T::read_current(self)
    }

    #[inline(always)]
    fn write_atomic(&mut self, value: u8) {
        T::write_atomic(self, value)
    }

    #[inline(always)]
    fn lines(&self) -> u8 {
        T::lines(self)
    }
}

/// Which lines of the output group are owned, and the level of the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineConfiguration {
    pins: u8,
    line_mask: u8,
    idle_mask: u8,
}

impl LineConfiguration {
    /// Build the configuration for `requested` lines, given the `current`
    /// level of the output group.
    ///
    /// `requested` is clamped to `1..=6`.
    pub const fn new(requested: u8, current: u8) -> Self {
        let pins = if requested == 0 {
            1
        } else if requested as usize > MAX_LINES {
            MAX_LINES as u8
        } else {
            requested
        };
        let line_mask = (1u8 << pins) - 1;

        Self {
            pins,
            line_mask,
            idle_mask: current & !line_mask,
        }
    }

    /// Number of owned lines.
    #[inline]
    pub const fn pins(&self) -> u8 {
        self.pins
    }

    /// Owned lines, always the low `pins` bits.
    #[inline]
    pub const fn line_mask(&self) -> u8 {
        self.line_mask
    }

    /// Levels of the foreign bits captured at construction.
    #[inline]
    pub const fn idle_mask(&self) -> u8 {
        self.idle_mask
    }
}

/// The owned output lines, bound to their driver.
///
/// Bit-slots are driven with the foreign bits captured at construction,
/// while [`LineSet::restore_idle`] keeps the foreign bits read back from
/// the port. A foreign bit changed by other code after construction is
/// reverted for the length of each frame.
pub struct LineSet<D> {
    driver: D,
    config: LineConfiguration,
}

impl<D: LineDriver> LineSet<D> {
    /// Take the first `requested` lines of `driver` and make them outputs.
    ///
    /// Out of range counts are clamped to `1..=6`, and further to the
    /// number of lines the driver has, without further notice.
    pub fn configure(mut driver: D, requested: u8) -> Self {
        let available = driver.lines().max(1);
        let config = LineConfiguration::new(requested.min(available), driver.read_current());
        if config.pins() != requested {
            debug!("line count {=u8} clamped to {=u8}", requested, config.pins());
        }

        driver.set_direction(config.line_mask());

        Self { driver, config }
    }

    /// The configuration chosen by [`LineSet::configure`].
    #[inline]
    pub fn config(&self) -> &LineConfiguration {
        &self.config
    }

    /// Drive the owned lines from the low bits of `value`, keeping the
    /// captured foreign bits.
    #[inline(always)]
    pub fn drive_composite(&mut self, value: u8) {
        self.driver
            .write_atomic(self.config.idle_mask | (value & self.config.line_mask));
    }

    /// Set every owned line high.
    ///
    /// Foreign bits are read back rather than taken from the snapshot, so
    /// calling this twice leaves the group unchanged.
    #[inline(always)]
    pub fn restore_idle(&mut self) {
        let current = self.driver.read_current();
        self.driver.write_atomic(current | self.config.line_mask);
    }

    /// Give the driver back.
    pub fn release(self) -> D {
        self.driver
    }
}
