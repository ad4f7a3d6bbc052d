//! Lock-free primitives shared between the real-time callback and background tasks.

use atomic_float::{AtomicF32, AtomicF64};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Cache-line aligned atomic f64.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicDouble {
    value: AtomicF64,
}

impl AtomicDouble {
    pub fn new(value: f64) -> Self {
        Self {
            value: AtomicF64::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.value.load(Ordering::Acquire)
    }

    /// Stale by at most one store; callers that tolerate that use this.
    #[inline]
    pub fn get_relaxed(&self) -> f64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicDouble {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    /// Returns the previous value.
    #[inline]
    pub fn swap(&self, value: bool) -> bool {
        self.value.swap(value, Ordering::AcqRel)
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Monotonic event counter with a separate "not yet reported" tally.
///
/// The real-time side only calls [`AtomicCounter::bump`]. A background task
/// calls [`AtomicCounter::take_unreported`] to find out how many events
/// happened since it last looked.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    total: AtomicU64,
    unreported: AtomicU64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bump(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.unreported.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Atomically reads and resets the unreported tally.
    pub fn take_unreported(&self) -> u64 {
        self.unreported.swap(0, Ordering::Relaxed)
    }
}

/// Fixed-size slab of `f32` samples with relaxed atomic access.
///
/// Relaxed loads and stores compile to plain moves on the targets we care
/// about, so the real-time path pays nothing for them. Two contexts touching
/// the same cell at once read a stale or fresh value, never a torn one.
#[derive(Debug)]
pub struct SampleSlab {
    cells: Box<[AtomicF32]>,
}

impl SampleSlab {
    /// Allocates `len` zeroed samples. Never resized afterwards.
    pub fn new(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| AtomicF32::new(0.0)).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Out-of-range reads return silence.
    #[inline]
    pub fn load(&self, index: usize) -> f32 {
        self.cells
            .get(index)
            .map_or(0.0, |cell| cell.load(Ordering::Relaxed))
    }

    /// Out-of-range writes are dropped.
    #[inline]
    pub fn store(&self, index: usize, value: f32) {
        if let Some(cell) = self.cells.get(index) {
            cell.store(value, Ordering::Relaxed);
        }
    }

    /// Copies `src` starting at `offset`. Returns the number of samples copied.
    pub fn write_from(&self, offset: usize, src: &[f32]) -> usize {
        let Some(cells) = self.cells.get(offset..) else {
            return 0;
        };
        let count = cells.len().min(src.len());
        for (cell, &sample) in cells[..count].iter().zip(src) {
            cell.store(sample, Ordering::Relaxed);
        }
        count
    }

    /// Copies into `dst` starting at `offset`. Returns the number of samples copied.
    pub fn read_into(&self, offset: usize, dst: &mut [f32]) -> usize {
        let Some(cells) = self.cells.get(offset..) else {
            return 0;
        };
        let count = cells.len().min(dst.len());
        for (slot, cell) in dst[..count].iter_mut().zip(cells.iter()) {
            *slot = cell.load(Ordering::Relaxed);
        }
        count
    }

    pub fn fill(&self, value: f32) {
        for cell in self.cells.iter() {
            cell.store(value, Ordering::Relaxed);
        }
    }
}
