use alloc::sync::Arc;
use core::alloc::Layout;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use allocator_api2::alloc::{AllocError, Allocator, Global};

use super::NodeAllocator;

#[derive(Default)]
struct Counters {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    live_bytes: AtomicUsize,
    /// number of further allocations to grant before failing, `usize::MAX`
    /// means never fail
    remaining: AtomicUsize,
    max_size: AtomicUsize,
}

/// a [`Global`]-backed allocator that counts what passes through it and can
/// be told to start failing. clones share one pool: they count into the same
/// counters and are compatible with each other, independently created
/// trackers are not
#[derive(Clone)]
pub struct TrackingAllocator {
    pool: Arc<Counters>,
}

impl TrackingAllocator {
    pub fn new() -> Self {
        let counters = Counters::default();
        counters.remaining.store(usize::MAX, Ordering::Relaxed);
        counters.max_size.store(isize::MAX as usize, Ordering::Relaxed);
        Self {
            pool: Arc::new(counters),
        }
    }

    /// grant `n` more allocations, then fail every request after that
    pub fn fail_after(&self, n: usize) {
        self.pool.remaining.store(n, Ordering::Relaxed);
    }

    /// stop injecting failures
    pub fn never_fail(&self) {
        self.pool.remaining.store(usize::MAX, Ordering::Relaxed);
    }

    /// cap the size reported by [`NodeAllocator::max_size`]
    pub fn limit_max_size(&self, bytes: usize) {
        self.pool.max_size.store(bytes, Ordering::Relaxed);
    }

    pub fn allocations(&self) -> usize {
        self.pool.allocations.load(Ordering::Relaxed)
    }

    pub fn deallocations(&self) -> usize {
        self.pool.deallocations.load(Ordering::Relaxed)
    }

    /// allocations that have not been returned yet
    pub fn live(&self) -> usize {
        self.allocations() - self.deallocations()
    }

    pub fn live_bytes(&self) -> usize {
        self.pool.live_bytes.load(Ordering::Relaxed)
    }

    fn take_grant(&self) -> bool {
        self.pool
            .remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |r| match r {
                usize::MAX => Some(usize::MAX),
                0 => None,
                r => Some(r - 1),
            })
            .is_ok()
    }
}

impl Default for TrackingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Allocator for TrackingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if !self.take_grant() {
            return Err(AllocError);
        }
        let ptr = Global.allocate(layout)?;
        self.pool.allocations.fetch_add(1, Ordering::Relaxed);
        self.pool
            .live_bytes
            .fetch_add(layout.size(), Ordering::Relaxed);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.pool.deallocations.fetch_add(1, Ordering::Relaxed);
        self.pool
            .live_bytes
            .fetch_sub(layout.size(), Ordering::Relaxed);
        Global.deallocate(ptr, layout);
    }
}

impl NodeAllocator for TrackingAllocator {
    fn is_compatible(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pool, &other.pool)
    }

    fn max_size(&self) -> usize {
        self.pool.max_size.load(Ordering::Relaxed)
    }
}

impl core::fmt::Debug for TrackingAllocator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackingAllocator")
            .field("pool", &Arc::as_ptr(&self.pool))
            .field("allocations", &self.allocations())
            .field("deallocations", &self.deallocations())
            .field("live_bytes", &self.live_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_allocations_and_frees() {
        let a = TrackingAllocator::new();
        let layout = Layout::new::<u64>();
        let p = a.allocate(layout).expect("allocation should succeed");
        assert_eq!(a.allocations(), 1);
        assert_eq!(a.live(), 1);
        assert_eq!(a.live_bytes(), 8);
        unsafe { a.deallocate(p.cast(), layout) };
        assert_eq!(a.deallocations(), 1);
        assert_eq!(a.live(), 0);
        assert_eq!(a.live_bytes(), 0);
    }

    #[test]
    fn fails_once_grants_run_out() {
        let a = TrackingAllocator::new();
        let layout = Layout::new::<u32>();
        a.fail_after(1);
        let p = a.allocate(layout).expect("first allocation is granted");
        assert!(a.allocate(layout).is_err());
        assert!(a.allocate(layout).is_err());
        a.never_fail();
        let q = a.allocate(layout).expect("failures were switched off");
        unsafe {
            a.deallocate(p.cast(), layout);
            a.deallocate(q.cast(), layout);
        }
        assert_eq!(a.live(), 0);
    }

    #[test]
    fn clones_share_a_pool() {
        let a = TrackingAllocator::new();
        let b = a.clone();
        let layout = Layout::new::<u8>();
        let p = b.allocate(layout).expect("allocation should succeed");
        assert_eq!(a.live(), 1);
        unsafe { a.deallocate(p.cast(), layout) };
        assert_eq!(b.live(), 0);
        assert!(a.is_compatible(&b));
        assert!(!a.is_compatible(&TrackingAllocator::new()));
    }
}
