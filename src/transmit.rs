//! The timed transmit loop.

use crate::calibrate::{self, CalibratedDelay, CostModel, Timing};
use crate::delay::Delay;
use crate::frame::FrameGeometry;
use crate::line::{LineConfiguration, LineDriver, LineSet};

/// Timing parameters fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Core clock driving the delay primitives, in Hz.
    pub clock_hz: u32,
    /// Delay model and loop overhead of the target.
    pub cost: CostModel,
}

impl Config {
    /// Configuration for a core clocked at `clock_hz` using the default
    /// cost model.
    pub const fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            cost: CostModel::AVR_DUAL,
        }
    }

    /// Use `cost` instead of the default cost model.
    pub const fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }
}

/// Error returned by [`Transmitter::write`]. Nothing is driven when a write
/// is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// [`Transmitter::begin`] has not been called yet.
    NotCalibrated,
    /// The number of values differs from the configured line count.
    ValueCount {
        /// Configured line count.
        expected: u8,
        /// Number of values supplied.
        got: usize,
    },
}

#[derive(Clone, Copy)]
enum State {
    Uncalibrated,
    Ready {
        baud: u32,
        geometry: FrameGeometry,
        delay: CalibratedDelay,
    },
}

/// Sends one serial stream per line, all lines sharing the bit clock.
pub struct Transmitter<D, W> {
    lines: LineSet<D>,
    delay: W,
    config: Config,
    state: State,
}

impl<D: LineDriver, W: Delay> Transmitter<D, W> {
    /// Take the first `pins` lines of `driver`, clamped to `1..=6`.
    ///
    /// The transmitter must be calibrated with [`Transmitter::begin`]
    /// before it can send.
    pub fn new(driver: D, delay: W, pins: u8, config: Config) -> Self {
        Self {
            lines: LineSet::configure(driver, pins),
            delay,
            config,
            state: State::Uncalibrated,
        }
    }

    /// Calibrate for `baud` and frames of `frame_size` bit-slots, then set
    /// all lines to idle.
    ///
    /// Any previous calibration is discarded. `frame_size` must be in
    /// `1..=16`.
    pub fn begin(&mut self, baud: u32, frame_size: u8) {
        let pins = self.lines.config().pins();
        let geometry = FrameGeometry::new(frame_size);
        let delay = calibrate::calibrate(self.config.clock_hz, baud, pins, &self.config.cost);

        debug!(
            "{=u8} lines at {=u32} baud, {=u8} bits per frame: {}",
            pins,
            baud,
            geometry.frame_size(),
            delay
        );

        self.state = State::Ready {
            baud,
            geometry,
            delay,
        };
        self.lines.restore_idle();
    }

    /// Whether [`Transmitter::begin`] has been called.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready { .. })
    }

    /// Line configuration chosen at construction.
    pub fn lines(&self) -> &LineConfiguration {
        self.lines.config()
    }

    /// Current calibration, if any.
    pub fn calibration(&self) -> Option<CalibratedDelay> {
        match self.state {
            State::Ready { delay, .. } => Some(delay),
            State::Uncalibrated => None,
        }
    }

    /// Current frame layout, if any.
    pub fn geometry(&self) -> Option<&FrameGeometry> {
        match &self.state {
            State::Ready { geometry, .. } => Some(geometry),
            State::Uncalibrated => None,
        }
    }

    /// Cycle budget of one bit-slot under the current calibration.
    pub fn timing(&self) -> Option<Timing> {
        match self.state {
            State::Ready { baud, delay, .. } => Some(calibrate::timing(
                self.config.clock_hz,
                baud,
                self.lines.config().pins(),
                &self.config.cost,
                &delay,
            )),
            State::Uncalibrated => None,
        }
    }

    /// Send one frame on every line, `values[n]` on line `n`, bit 0 first.
    ///
    /// A line is driven high for a 1 bit and low for a 0 bit. The calibrated
    /// delay separates consecutive bit-slots, and the lines return to idle
    /// right after the last one. The whole frame runs inside a critical
    /// section and blocks for `frame_size` bit periods.
    ///
    /// # Errors
    ///
    /// - [`WriteError::NotCalibrated`]: [`Transmitter::begin`] was never called.
    /// - [`WriteError::ValueCount`]: `values` does not hold exactly one
    ///   value per configured line.
    pub fn write(&mut self, values: &[u16]) -> Result<(), WriteError> {
        let State::Ready {
            geometry, delay, ..
        } = self.state
        else {
            warn!("write before begin");
            return Err(WriteError::NotCalibrated);
        };

        let pins = self.lines.config().pins();
        if values.len() != pins as usize {
            warn!("{=usize} values for {=u8} lines", values.len(), pins);
            return Err(WriteError::ValueCount {
                expected: pins,
                got: values.len(),
            });
        }

        let lines = &mut self.lines;
        let wait = &mut self.delay;
        let last = geometry.frame_size() as usize - 1;

        critical_section::with(|_| {
            for slot in 0..=last {
                lines.drive_composite(geometry.composite(slot, values));
                if slot != last {
                    delay.issue(wait);
                }
            }
            lines.restore_idle();
        });

        Ok(())
    }

    /// Give the driver and the delay back.
    pub fn release(self) -> (D, W) {
        (self.lines.release(), self.delay)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{Event, SimDelay, SimPort, Trace};

    const CLOCK: u32 = 16_000_000;

    fn transmitter(trace: &Trace, pins: u8, port: u8) -> Transmitter<SimPort, SimDelay> {
        Transmitter::new(
            SimPort::new(trace, port),
            SimDelay::new(trace),
            pins,
            Config::new(CLOCK),
        )
    }

    /// Events between two drives are delays; returns the drives and the
    /// number of delay groups.
    fn slots(events: &[Event]) -> (std::vec::Vec<u8>, usize) {
        let mut writes = std::vec::Vec::new();
        let mut gaps = 0;
        let mut in_gap = false;
        for e in events {
            match e {
                Event::Write(v) => {
                    writes.push(*v);
                    in_gap = false;
                }
                Event::Cheap(_) | Event::Costly(_) => {
                    if !in_gap {
                        gaps += 1;
                        in_gap = true;
                    }
                }
                Event::Direction(_) => {}
            }
        }
        (writes, gaps)
    }

    #[test]
    fn write_before_begin_is_rejected() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 1, 0);
        trace.clear();

        assert!(!tx.is_ready());
        assert_eq!(tx.write(&[0x55]), Err(WriteError::NotCalibrated));
        assert!(trace.events().is_empty());
    }

    #[test]
    fn value_count_must_match() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 3, 0);
        tx.begin(9600, 8);
        trace.clear();

        assert_eq!(
            tx.write(&[1, 2]),
            Err(WriteError::ValueCount {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            tx.write(&[1, 2, 3, 4]),
            Err(WriteError::ValueCount {
                expected: 3,
                got: 4
            })
        );
        assert!(trace.events().is_empty());
    }

    #[test]
    fn begin_sets_idle() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 2, 0b1000_0000);
        tx.begin(9600, 10);

        assert!(tx.is_ready());
        assert_eq!(trace.last_level(), Some(0b1000_0011));
    }

    #[test]
    fn single_line_byte() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 1, 0);
        tx.begin(9600, 8);
        trace.clear();

        let v = 0b1011_0010;
        tx.write(&[v]).unwrap();

        let events = trace.events();
        let (writes, gaps) = slots(&events);
        // Eight slots, then idle.
        assert_eq!(writes, [0, 1, 0, 0, 1, 1, 0, 1, 1]);
        assert_eq!(gaps, 7);
        assert_eq!(*events.last().unwrap(), Event::Write(1));

        let delay = tx.calibration().unwrap();
        assert_eq!(trace.cycles(), 7 * u64::from(delay.cycles()));

        let t = tx.timing().unwrap();
        assert_eq!(t.target_cycles, 1666);
        assert!(t.loop_cycles() >= 1666);
        assert!(t.slack() < 4);
    }

    #[test]
    fn delays_only_between_slots() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 2, 0);
        tx.begin(115_200, 4);
        trace.clear();

        tx.write(&[0b1010, 0b0101]).unwrap();

        let events = trace.events();
        assert!(matches!(events.first(), Some(Event::Write(_))));
        assert!(matches!(events.last(), Some(Event::Write(0b11))));
        // Drive, cheap, costly, drive, ... drive, idle.
        assert_eq!(events.len(), 4 + 3 * 2 + 1);
        let (writes, gaps) = slots(&events);
        assert_eq!(writes, [0b10, 0b01, 0b10, 0b01, 0b11]);
        assert_eq!(gaps, 3);
    }

    #[test]
    fn one_slot_frame_has_no_delay() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 3, 0);
        tx.begin(9600, 1);
        trace.clear();

        tx.write(&[1, 0, 1]).unwrap();

        assert_eq!(trace.events(), [Event::Write(0b101), Event::Write(0b111)]);
        assert_eq!(trace.cycles(), 0);
    }

    #[test]
    fn six_lines_keep_foreign_bits() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 6, 0b1100_0000);
        tx.begin(57_600, 3);
        trace.clear();

        tx.write(&[0b001, 0b010, 0b100, 0b011, 0b110, 0b111]).unwrap();

        let (writes, gaps) = slots(&trace.events());
        assert_eq!(
            writes,
            [0b1110_1001, 0b1111_1010, 0b1111_0100, 0b1111_1111]
        );
        assert_eq!(gaps, 2);
    }

    #[test]
    fn each_slot_encodes_its_bit() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 4, 0);
        tx.begin(38_400, 16);

        let values = [0xa5c3, 0x0ff0, 0x1234, 0xffff];
        trace.clear();
        tx.write(&values).unwrap();

        let (writes, _) = slots(&trace.events());
        assert_eq!(writes.len(), 17);
        for (slot, level) in writes[..16].iter().enumerate() {
            for (line, value) in values.iter().enumerate() {
                let bit = (value >> slot) & 1;
                assert_eq!(u16::from((level >> line) & 1), bit, "slot {slot} line {line}");
            }
        }
    }

    #[test]
    fn begin_replaces_calibration() {
        let trace = Trace::new();
        let mut tx = transmitter(&trace, 1, 0);

        tx.begin(9600, 8);
        let slow = tx.calibration().unwrap();
        tx.begin(115_200, 10);
        let fast = tx.calibration().unwrap();
        assert!(fast.cycles() < slow.cycles());
        assert_eq!(tx.geometry().unwrap().frame_size(), 10);

        tx.begin(9600, 8);
        assert_eq!(tx.calibration(), Some(slow));
        assert_eq!(tx.geometry().unwrap().frame_size(), 8);
    }

    #[test]
    fn single_model_issues_costly_only() {
        let trace = Trace::new();
        let mut tx = Transmitter::new(
            SimPort::new(&trace, 0),
            SimDelay::new(&trace),
            1,
            Config::new(CLOCK).with_cost(CostModel::AVR_SINGLE),
        );
        tx.begin(9600, 3);
        trace.clear();
        tx.write(&[0b010]).unwrap();

        assert_eq!(
            trace.events(),
            [
                Event::Write(0),
                Event::Costly(409),
                Event::Write(1),
                Event::Costly(409),
                Event::Write(0),
                Event::Write(1),
            ]
        );
    }

    #[test]
    fn clamped_pins_behave_as_six() {
        let trace = Trace::new();
        let tx = transmitter(&trace, 9, 0);
        assert_eq!(tx.lines().pins(), 6);

        let (port, _) = tx.release();
        assert_eq!(port.direction(), 0b0011_1111);
    }
}
