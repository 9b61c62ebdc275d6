//! Global allocator with byte accounting.
//!
//! jemalloc serves the allocations wherever it builds; the wrapper adds
//! the cumulative counter jemalloc does not keep.

use std::alloc::{GlobalAlloc, Layout};
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(target_env = "msvc")]
use std::alloc::System as Backend;
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc as Backend;

#[global_allocator]
static GLOBAL: CountingAlloc<Backend> = CountingAlloc::new(Backend);

pub struct CountingAlloc<A> {
    inner: A,
    live: AtomicU64,
    total: AtomicU64,
}

impl<A> CountingAlloc<A> {
    pub const fn new(inner: A) -> Self {
        CountingAlloc {
            inner,
            live: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    pub fn live_bytes(&self) -> u64 {
        self.live.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    fn grow(&self, bytes: usize) {
        self.live.fetch_add(bytes as u64, Ordering::Relaxed);
        self.total.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn shrink(&self, bytes: usize) {
        self.live.fetch_sub(bytes as u64, Ordering::Relaxed);
    }
}

// SAFETY: every call is forwarded unchanged to `inner`; the counters are
// only touched after the inner allocator reports success.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAlloc<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.inner.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            let old_size = layout.size();
            if new_size >= old_size {
                self.grow(new_size - old_size);
            } else {
                self.shrink(old_size - new_size);
            }
        }
        new_ptr
    }
}

/// Raw heap figures in bytes.
///
/// `live` and `cumulative` are requested sizes counted by the wrapper; the
/// rest come from the backing allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapCounters {
    pub live: u64,
    pub cumulative: u64,
    pub active: u64,
    pub mapped: u64,
    pub retained: u64,
    pub metadata: u64,
}

#[cfg(not(target_env = "msvc"))]
pub fn heap_counters() -> HeapCounters {
    use tikv_jemalloc_ctl::stats;

    advance_epoch();

    let read = |value: tikv_jemalloc_ctl::Result<usize>| value.map_or(0, |v| v as u64);
    HeapCounters {
        live: GLOBAL.live_bytes(),
        cumulative: GLOBAL.total_bytes(),
        active: read(stats::active::read()),
        mapped: read(stats::mapped::read()),
        retained: read(stats::retained::read()),
        metadata: read(stats::metadata::read()),
    }
}

/// jemalloc caches its statistics until the epoch advances. Returns false
/// when the figures that follow may be stale.
#[cfg(not(target_env = "msvc"))]
fn advance_epoch() -> bool {
    match tikv_jemalloc_ctl::epoch::advance() {
        Ok(_) => true,
        Err(_err) => {
            #[cfg(feature = "perf-tracing")]
            tracing::warn!(
                error = %_err,
                "jemalloc epoch advance failed; heap figures may be stale"
            );
            false
        }
    }
}

#[cfg(target_env = "msvc")]
pub fn heap_counters() -> HeapCounters {
    let live = GLOBAL.live_bytes();
    HeapCounters {
        live,
        cumulative: GLOBAL.total_bytes(),
        active: live,
        mapped: live,
        ..HeapCounters::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_counter_only_grows() {
        let before = heap_counters().cumulative;
        let buf = std::hint::black_box(vec![0u8; 64 * 1024]);
        drop(buf);
        let after = heap_counters().cumulative;
        assert!(after >= before + 64 * 1024);
    }

    #[test]
    fn counting_wrapper_tracks_live_bytes() {
        let alloc = CountingAlloc::new(std::alloc::System);
        let layout = Layout::from_size_align(256, 8).unwrap();
        unsafe {
            let ptr = alloc.alloc(layout);
            assert!(!ptr.is_null());
            assert_eq!(alloc.live_bytes(), 256);

            let ptr = alloc.realloc(ptr, layout, 512);
            assert!(!ptr.is_null());
            assert_eq!(alloc.live_bytes(), 512);
            assert_eq!(alloc.total_bytes(), 512);

            alloc.dealloc(ptr, Layout::from_size_align(512, 8).unwrap());
        }
        assert_eq!(alloc.live_bytes(), 0);
        assert_eq!(alloc.total_bytes(), 512);
    }

    #[test]
    fn cumulative_covers_live_and_freed_bytes() {
        let buf = std::hint::black_box(vec![1u8; 256 * 1024]);
        drop(buf);
        let heap = heap_counters();
        assert!(heap.cumulative >= heap.live + 256 * 1024);
    }

    #[test]
    fn mapped_pages_cover_active_pages() {
        let heap = heap_counters();
        assert!(heap.mapped >= heap.active);
    }

    #[cfg(not(target_env = "msvc"))]
    #[test]
    fn epoch_advances() {
        assert!(advance_epoch());
    }
}
