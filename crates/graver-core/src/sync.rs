use crate::thermal::ThermalState;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Single-slot, latest-value channel for one normalized setpoint.
///
/// A send overwrites whatever is pending; a receive drains at most one
/// value. Values overwritten before the consumer polls are lost.
#[derive(Debug)]
pub struct SetpointChannel {
    bits: AtomicU64,
    pending: AtomicBool,
}

impl SetpointChannel {
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(0f64.to_bits()),
            pending: AtomicBool::new(false),
        }
    }

    /// Called by the producer thread (never blocks, never fails).
    pub fn try_send(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
        self.pending.store(true, Ordering::Release);
    }

    /// Called by the controller once per iteration.
    pub fn try_receive(&self) -> Option<f64> {
        if self.pending.swap(false, Ordering::AcqRel) {
            Some(f64::from_bits(self.bits.load(Ordering::Acquire)))
        } else {
            None
        }
    }
}

impl Default for SetpointChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerSnapshot {
    pub timestamp_us: u64,
    pub iteration: u64,
    pub speed: f64,
    pub power: f64,
    pub off_time_ms: u64,
    pub current_spm: f64,
    pub duty: u16,
    pub cumulative_on_time_ms: u64,
    pub thermal_state: ThermalState,
    pub strokes: u64,
    pub cooldowns: u64,
}

struct TripleBuffer<T: Copy + Default> {
    slots: [UnsafeCell<T>; 3],
    index: AtomicUsize,
}

unsafe impl<T: Copy + Default + Send> Send for TripleBuffer<T> {}
unsafe impl<T: Copy + Default + Send> Sync for TripleBuffer<T> {}

impl<T: Copy + Default> TripleBuffer<T> {
    fn new() -> Self {
        let slots = std::array::from_fn(|_| UnsafeCell::new(T::default()));
        Self {
            slots,
            index: AtomicUsize::new(0),
        }
    }

    fn write(&self, value: T) {
        let current = self.index.load(Ordering::Relaxed);
        let next = (current + 1) % 3;
        unsafe {
            *self.slots[next].get() = value;
        }
        self.index.store(next, Ordering::Release);
    }

    fn read(&self) -> T {
        let idx = self.index.load(Ordering::Acquire);
        unsafe { *self.slots[idx].get() }
    }
}

/// Latest controller state, published by the controller thread and read by
/// observers. There is exactly one writer.
pub struct SnapshotExchange {
    snapshot: TripleBuffer<ControllerSnapshot>,
}

impl SnapshotExchange {
    pub fn new() -> Self {
        Self {
            snapshot: TripleBuffer::new(),
        }
    }

    /// Called by the controller every iteration (non-blocking)
    pub fn publish(&self, snapshot: ControllerSnapshot) {
        self.snapshot.write(snapshot);
    }

    pub fn read(&self) -> ControllerSnapshot {
        self.snapshot.read()
    }
}

impl Default for SnapshotExchange {
    fn default() -> Self {
        Self::new()
    }
}
