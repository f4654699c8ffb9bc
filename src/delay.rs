//! Busy-wait primitives used to pace the bit-slots.

/// Cycles consumed per repeat of [`Delay::spin_cheap`].
pub const CHEAP_CYCLES: u32 = 3;

/// Cycles consumed per repeat of [`Delay::spin_costly`].
pub const COSTLY_CYCLES: u32 = 4;

/// Two busy-wait loops with a fixed cost per repeat.
///
/// Implementations must burn exactly (or, failing that, at least)
/// `repeats` times the documented cycle cost, without yielding. The
/// calibration assumes these costs; a primitive that returns early makes
/// every bit-slot short.
pub trait Delay {
    /// Spin for `repeats` × [`CHEAP_CYCLES`] cycles.
    fn spin_cheap(&mut self, repeats: u32);

    /// Spin for `repeats` × [`COSTLY_CYCLES`] cycles.
    fn spin_costly(&mut self, repeats: u32);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    #[inline(always)]
    fn spin_cheap(&mut self, repeats: u32) {
        T::spin_cheap(self, repeats)
    }

    #[inline(always)]
    fn spin_costly(&mut self, repeats: u32) {
        T::spin_costly(self, repeats)
    }
}

/// A free-running, wrapping cycle counter.
pub trait CycleCounter {
    /// Current counter value.
    fn now(&mut self) -> u32;
}

impl<F: FnMut() -> u32> CycleCounter for F {
    #[inline(always)]
    fn now(&mut self) -> u32 {
        self()
    }
}

/// [`Delay`] built on a cycle counter, for cores without a cycle-exact
/// loop instruction sequence.
///
/// Each call waits until at least the requested number of cycles has
/// elapsed on the counter, so it may run long but never short. Waits are
/// measured with wrapping arithmetic and must stay below `u32::MAX`
/// cycles.
pub struct SpinDelay<C> {
    counter: C,
}

impl<C: CycleCounter> SpinDelay<C> {
    /// Wrap a cycle counter.
    pub const fn new(counter: C) -> Self {
        Self { counter }
    }

    /// Give the counter back.
    pub fn release(self) -> C {
        self.counter
    }

    #[inline(always)]
    fn wait(&mut self, cycles: u32) {
        let start = self.counter.now();
        while self.counter.now().wrapping_sub(start) < cycles {
            core::hint::spin_loop();
        }
    }
}

impl<C: CycleCounter> Delay for SpinDelay<C> {
    #[inline(always)]
    fn spin_cheap(&mut self, repeats: u32) {
        self.wait(repeats.saturating_mul(CHEAP_CYCLES));
    }

    #[inline(always)]
    fn spin_costly(&mut self, repeats: u32) {
        self.wait(repeats.saturating_mul(COSTLY_CYCLES));
    }
}
