//! Instrumented element type for lifetime and rollback tests.

use std::cell::Cell;
use std::fmt::{self, Debug};
use std::rc::Rc;

#[derive(Default)]
pub struct ProbeCounter {
    live: Cell<isize>,
    clones_left: Cell<Option<usize>>,
    drop_panics: Cell<Option<u32>>,
}

impl ProbeCounter {
    pub fn new() -> Rc<Self> {
        Rc::new(ProbeCounter::default())
    }

    pub fn probe(self: &Rc<Self>, value: u32) -> Probe {
        self.live.set(self.live.get() + 1);
        Probe { value, counter: Rc::clone(self) }
    }

    /// Probes alive right now, across every container holding them.
    pub fn live(&self) -> isize {
        self.live.get()
    }

    /// Let `clones` more clones succeed, then panic on the next.
    pub fn panic_after_clones(&self, clones: usize) {
        self.clones_left.set(Some(clones));
    }

    /// Panic once, when the probe holding `value` is dropped.
    pub fn panic_on_drop_of(&self, value: u32) {
        self.drop_panics.set(Some(value));
    }
}

pub struct Probe {
    pub value: u32,
    counter: Rc<ProbeCounter>,
}

impl Clone for Probe {
    fn clone(&self) -> Self {
        match self.counter.clones_left.get() {
            Some(0) => panic!("probe clone budget exhausted"),
            Some(n) => self.counter.clones_left.set(Some(n - 1)),
            None => {}
        }
        self.counter.probe(self.value)
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.counter.live.set(self.counter.live.get() - 1);

        if self.counter.drop_panics.get() == Some(self.value) {
            self.counter.drop_panics.set(None);
            panic!("probe {} refused to drop", self.value);
        }
    }
}

impl PartialEq for Probe {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Probe({})", self.value)
    }
}

pub fn values(probes: &[Probe]) -> Vec<u32> {
    probes.iter().map(|p| p.value).collect()
}
