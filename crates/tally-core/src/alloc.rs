//! Allocator statistics
//!
//! [`CountingAllocator`] wraps another global allocator and keeps
//! process-wide counters; [`AllocationSource`] turns those counters into
//! snapshots. Install the allocator in the test binary:
//!
//! ```no_run
//! use tally_core::alloc::CountingAllocator;
//!
//! #[global_allocator]
//! static GLOBAL: CountingAllocator = CountingAllocator::system();
//! ```
//!
//! Without it the counters stay at zero, but every metric is still reported.

use crate::error::TallyResult;
use crate::snapshot::{Snapshot, SnapshotSource};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

pub const ALLOC_COUNT: &str = "alloc.count";
pub const ALLOC_BYTES: &str = "alloc.bytes";
pub const DEALLOC_COUNT: &str = "dealloc.count";
pub const DEALLOC_BYTES: &str = "dealloc.bytes";
pub const LIVE_BYTES: &str = "live.bytes";

static ALLOCS: AtomicU64 = AtomicU64::new(0);
static ALLOC_BYTES_TOTAL: AtomicU64 = AtomicU64::new(0);
static DEALLOCS: AtomicU64 = AtomicU64::new(0);
static DEALLOC_BYTES_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Global allocator wrapper that counts allocations
pub struct CountingAllocator<A = System> {
    inner: A,
}

impl CountingAllocator<System> {
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

impl<A> CountingAllocator<A> {
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

fn record_alloc(size: usize) {
    ALLOCS.fetch_add(1, Ordering::Relaxed);
    ALLOC_BYTES_TOTAL.fetch_add(size as u64, Ordering::Relaxed);
}

fn record_dealloc(size: usize) {
    DEALLOCS.fetch_add(1, Ordering::Relaxed);
    DEALLOC_BYTES_TOTAL.fetch_add(size as u64, Ordering::Relaxed);
}

// SAFETY: every call is forwarded unchanged to the wrapped allocator; the
// counters are lock-free atomics and never allocate.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.inner.dealloc(ptr, layout);
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            record_dealloc(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

/// Point-in-time copy of the allocator counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationStats {
    pub allocations: u64,
    pub allocated_bytes: u64,
    pub deallocations: u64,
    pub deallocated_bytes: u64,
}

impl AllocationStats {
    pub fn current() -> Self {
        Self {
            allocations: ALLOCS.load(Ordering::Relaxed),
            allocated_bytes: ALLOC_BYTES_TOTAL.load(Ordering::Relaxed),
            deallocations: DEALLOCS.load(Ordering::Relaxed),
            deallocated_bytes: DEALLOC_BYTES_TOTAL.load(Ordering::Relaxed),
        }
    }

    /// Bytes allocated and not yet freed
    pub fn live_bytes(&self) -> f64 {
        self.allocated_bytes as f64 - self.deallocated_bytes as f64
    }

    pub fn to_snapshot(self) -> Snapshot {
        Snapshot::new()
            .with(ALLOC_COUNT, self.allocations as f64)
            .with(ALLOC_BYTES, self.allocated_bytes as f64)
            .with(DEALLOC_COUNT, self.deallocations as f64)
            .with(DEALLOC_BYTES, self.deallocated_bytes as f64)
            .with(LIVE_BYTES, self.live_bytes())
    }
}

/// Snapshot source reading the [`CountingAllocator`] counters
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationSource;

impl SnapshotSource for AllocationSource {
    fn snapshot(&self) -> TallyResult<Snapshot> {
        Ok(AllocationStats::current().to_snapshot())
    }
}
