//! Simulated output group and delay for host tests.
//!
//! Both halves append to one shared [`Trace`], so tests can check the
//! exact interleaving of drives and delays.

use crate::delay::{CHEAP_CYCLES, COSTLY_CYCLES, Delay};
use crate::line::LineDriver;
use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Direction(u8),
    Write(u8),
    Cheap(u32),
    Costly(u32),
}

#[derive(Default)]
struct TraceInner {
    events: Vec<Event>,
    cycles: u64,
}

#[derive(Clone, Default)]
pub(crate) struct Trace(Rc<RefCell<TraceInner>>);

impl Trace {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.0.borrow_mut().events.push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    /// Values written to the port, in order.
    pub(crate) fn writes(&self) -> Vec<u8> {
        self.0
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Write(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_level(&self) -> Option<u8> {
        self.writes().last().copied()
    }

    /// Cycles burnt in delay primitives.
    pub(crate) fn cycles(&self) -> u64 {
        self.0.borrow().cycles
    }

    pub(crate) fn clear(&self) {
        let mut inner = self.0.borrow_mut();
        inner.events.clear();
        inner.cycles = 0;
    }
}

pub(crate) struct SimPort {
    trace: Trace,
    level: u8,
    direction: u8,
}

impl SimPort {
    pub(crate) fn new(trace: &Trace, level: u8) -> Self {
        Self {
            trace: trace.clone(),
            level,
            direction: 0,
        }
    }

    pub(crate) fn direction(&self) -> u8 {
        self.direction
    }
}

impl LineDriver for SimPort {
    fn set_direction(&mut self, outputs: u8) {
        self.direction |= outputs;
        self.trace.push(Event::Direction(outputs));
    }

    fn read_current(&mut self) -> u8 {
        self.level
    }

    fn write_atomic(&mut self, value: u8) {
        self.level = value;
        self.trace.push(Event::Write(value));
    }
}

pub(crate) struct SimDelay {
    trace: Trace,
}

impl SimDelay {
    pub(crate) fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
        }
    }
}

impl Delay for SimDelay {
    fn spin_cheap(&mut self, repeats: u32) {
        self.trace.0.borrow_mut().cycles += u64::from(repeats * CHEAP_CYCLES);
        self.trace.push(Event::Cheap(repeats));
    }

    fn spin_costly(&mut self, repeats: u32) {
        self.trace.0.borrow_mut().cycles += u64::from(repeats * COSTLY_CYCLES);
        self.trace.push(Event::Costly(repeats));
    }
}
