//! node storage: allocating, constructing and destroying list nodes
//!
//! nothing in here links a node into a list. single nodes come back unlinked
//! (both links null) and bulk construction produces a [`DetachedChain`] that
//! owns its nodes until it is committed into a list. a chain dropped before
//! it is committed destroys everything it built, which is how a failed batch
//! is rolled back without a live list ever seeing it.

use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::Allocator;

use crate::error::{BuildError, ListError, ListResult};

/// a list node: links to both neighbours and storage for one value. the
/// circular topology's sentinel is a node whose value is never initialized
pub struct Node<T> {
    prev: *mut Node<T>,
    next: *mut Node<T>,
    value: MaybeUninit<T>,
}

impl<T> Node<T> {
    pub(crate) unsafe fn prev(node: *mut Node<T>) -> *mut Node<T> {
        (*node).prev
    }

    pub(crate) unsafe fn next(node: *mut Node<T>) -> *mut Node<T> {
        (*node).next
    }

    pub(crate) unsafe fn set_prev(node: *mut Node<T>, prev: *mut Node<T>) {
        (*node).prev = prev;
    }

    pub(crate) unsafe fn set_next(node: *mut Node<T>, next: *mut Node<T>) {
        (*node).next = next;
    }

    /// # Safety
    /// `node` must be a live data node (not a sentinel)
    pub(crate) unsafe fn value<'a>(node: *mut Node<T>) -> &'a T {
        (*node).value.assume_init_ref()
    }

    /// # Safety
    /// `node` must be a live data node (not a sentinel)
    pub(crate) unsafe fn value_mut<'a>(node: *mut Node<T>) -> &'a mut T {
        (*node).value.assume_init_mut()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Node")
            .field("prev", &self.prev)
            .field("self", &ptr::addr_of!(*self))
            .field("next", &self.next)
            .finish()
    }
}

pub(crate) fn node_layout<T>() -> Layout {
    Layout::new::<Node<T>>()
}

/// the most nodes an allocator reporting `max_bytes` could ever hand out
pub(crate) fn max_nodes<T>(max_bytes: usize) -> usize {
    let per_node = node_layout::<T>().size().max(1);
    (max_bytes / per_node).min(isize::MAX as usize)
}

fn allocate_slot<T, A: Allocator>(alloc: &A) -> ListResult<NonNull<Node<T>>> {
    alloc
        .allocate(node_layout::<T>())
        .map(|p| p.cast())
        .map_err(|_| ListError::AllocFailed)
}

/// frees a slot on drop unless it was committed. covers both an `Err` from
/// a value constructor and a panic out of it
struct SlotGuard<'a, T, A: Allocator> {
    alloc: &'a A,
    slot: Option<NonNull<Node<T>>>,
}

impl<T, A: Allocator> SlotGuard<'_, T, A> {
    fn commit(mut self) -> NonNull<Node<T>> {
        match self.slot.take() {
            Some(slot) => slot,
            None => unreachable!("slot guards are committed once"),
        }
    }
}

impl<T, A: Allocator> Drop for SlotGuard<'_, T, A> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            // SAFETY: the slot came from this allocator with this layout and
            // never received a value
            unsafe { self.alloc.deallocate(slot.cast(), node_layout::<T>()) };
        }
    }
}

unsafe fn write_node<T>(slot: NonNull<Node<T>>, value: T) -> *mut Node<T> {
    slot.as_ptr().write(Node {
        prev: ptr::null_mut(),
        next: ptr::null_mut(),
        value: MaybeUninit::new(value),
    });
    slot.as_ptr()
}

/// allocate an unlinked node holding `value`
pub(crate) fn create_node<T, A: Allocator>(alloc: &A, value: T) -> ListResult<*mut Node<T>> {
    let slot = allocate_slot::<T, A>(alloc)?;
    // SAFETY: fresh, correctly sized and aligned slot
    Ok(unsafe { write_node(slot, value) })
}

/// allocate storage first, then build the value in it. storage is released
/// if the constructor fails or panics
pub(crate) fn create_node_with<T, A, E, F>(alloc: &A, f: F) -> Result<*mut Node<T>, BuildError<E>>
where
    A: Allocator,
    F: FnOnce() -> Result<T, E>,
{
    let guard = SlotGuard {
        alloc,
        slot: Some(allocate_slot::<T, A>(alloc)?),
    };
    let value = f().map_err(BuildError::Value)?;
    let slot = guard.commit();
    // SAFETY: fresh, correctly sized and aligned slot
    Ok(unsafe { write_node(slot, value) })
}

/// allocate the circular topology's sentinel: a node that links to itself
/// and holds no value
pub(crate) fn create_sentinel<T, A: Allocator>(alloc: &A) -> ListResult<*mut Node<T>> {
    let slot = allocate_slot::<T, A>(alloc)?.as_ptr();
    // SAFETY: fresh slot, the value stays uninitialized
    unsafe {
        ptr::addr_of_mut!((*slot).prev).write(slot);
        ptr::addr_of_mut!((*slot).next).write(slot);
    }
    Ok(slot)
}

/// # Safety
/// `sentinel` came from `create_sentinel` with the same allocator
pub(crate) unsafe fn destroy_sentinel<T, A: Allocator>(alloc: &A, sentinel: *mut Node<T>) {
    alloc.deallocate(NonNull::new_unchecked(sentinel).cast(), node_layout::<T>());
}

/// move the value out of an unlinked node and free the node
///
/// # Safety
/// `node` is an unlinked data node allocated by `alloc`
pub(crate) unsafe fn take_node<T, A: Allocator>(alloc: &A, node: *mut Node<T>) -> T {
    let value = (*node).value.assume_init_read();
    alloc.deallocate(NonNull::new_unchecked(node).cast(), node_layout::<T>());
    value
}

/// an owned chain of nodes that is not part of any list
///
/// outer links (`first.prev`, `last.next`) are null while detached. the
/// chain destroys its nodes on drop; [`DetachedChain::commit`] hands them
/// over instead
pub(crate) struct DetachedChain<'a, T, A: Allocator> {
    first: *mut Node<T>,
    last: *mut Node<T>,
    len: usize,
    alloc: &'a A,
    _marker: PhantomData<T>,
}

impl<'a, T, A: Allocator> DetachedChain<'a, T, A> {
    pub(crate) fn new(alloc: &'a A) -> Self {
        Self {
            first: ptr::null_mut(),
            last: ptr::null_mut(),
            len: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// take ownership of nodes that were already unlinked from a list
    ///
    /// # Safety
    /// `first..=last` is a detached chain of exactly `len` data nodes
    /// allocated by `alloc`
    pub(crate) unsafe fn adopt(
        alloc: &'a A,
        first: *mut Node<T>,
        last: *mut Node<T>,
        len: usize,
    ) -> Self {
        Self {
            first,
            last,
            len,
            alloc,
            _marker: PhantomData,
        }
    }

    /// `n` clones of `value`
    pub(crate) fn from_elem(alloc: &'a A, n: usize, value: &T) -> ListResult<Self>
    where
        T: Clone,
    {
        let mut chain = Self::new(alloc);
        for _ in 0..n {
            chain.push_back(value.clone())?;
        }
        Ok(chain)
    }

    /// one node per item, for a list that already holds `held` elements
    /// and may hold at most `max`. fails with `CapacityExceeded` as soon as
    /// the list would grow past `max`, reporting the list's totals
    pub(crate) fn from_iter<I>(alloc: &'a A, iter: I, held: usize, max: usize) -> ListResult<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut chain = Self::new(alloc);
        for value in iter {
            chain.check_room(held, max)?;
            chain.push_back(value)?;
        }
        Ok(chain)
    }

    /// like `from_iter`, but stops at the first `Err` the producer yields
    pub(crate) fn from_fallible_iter<I, E>(
        alloc: &'a A,
        iter: I,
        held: usize,
        max: usize,
    ) -> Result<Self, BuildError<E>>
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        let mut chain = Self::new(alloc);
        for value in iter {
            chain.check_room(held, max)?;
            let value = value.map_err(BuildError::Value)?;
            chain.push_back(value)?;
        }
        Ok(chain)
    }

    fn check_room(&self, held: usize, max: usize) -> ListResult<()> {
        let total = held.saturating_add(self.len);
        if total >= max {
            return Err(ListError::CapacityExceeded {
                requested: total.saturating_add(1),
                max,
            });
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn push_back(&mut self, value: T) -> ListResult<()> {
        let node = create_node(self.alloc, value)?;
        // SAFETY: `node` is fresh and unlinked, `self.last` is ours
        unsafe {
            if self.last.is_null() {
                self.first = node;
            } else {
                Node::set_next(self.last, node);
                Node::set_prev(node, self.last);
            }
        }
        self.last = node;
        self.len += 1;
        Ok(())
    }

    /// # Safety
    /// `node` is an unlinked data node allocated by this chain's allocator
    pub(crate) unsafe fn append_node(&mut self, node: *mut Node<T>) {
        Node::set_next(node, ptr::null_mut());
        Node::set_prev(node, self.last);
        if self.last.is_null() {
            self.first = node;
        } else {
            Node::set_next(self.last, node);
        }
        self.last = node;
        self.len += 1;
    }

    pub(crate) fn pop_front(&mut self) -> Option<T> {
        if self.first.is_null() {
            return None;
        }
        let node = self.first;
        // SAFETY: `node` is the first node of a chain we own. its successor
        // is read before it is freed
        unsafe {
            self.first = Node::next(node);
            if self.first.is_null() {
                self.last = ptr::null_mut();
            } else {
                Node::set_prev(self.first, ptr::null_mut());
            }
            self.len -= 1;
            Some(take_node(self.alloc, node))
        }
    }

    /// hand the nodes over to the caller: `(first, last, len)`, or `None`
    /// for an empty chain
    pub(crate) fn commit(self) -> Option<(*mut Node<T>, *mut Node<T>, usize)> {
        let parts = (self.first, self.last, self.len);
        core::mem::forget(self);
        if parts.2 == 0 {
            None
        } else {
            Some(parts)
        }
    }
}

impl<T, A: Allocator> Drop for DetachedChain<'_, T, A> {
    fn drop(&mut self) {
        // keeps destroying the remaining nodes if a value's destructor panics
        struct Continue<'c, 'a, T, A: Allocator>(&'c mut DetachedChain<'a, T, A>);

        impl<T, A: Allocator> Drop for Continue<'_, '_, T, A> {
            fn drop(&mut self) {
                while self.0.pop_front().is_some() {}
            }
        }

        while let Some(value) = self.pop_front() {
            let guard = Continue(self);
            drop(value);
            core::mem::forget(guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::TrackingAllocator;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    struct Noisy {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Noisy {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[derive(Debug)]
    struct PanicOnClone {
        clones_left: Rc<Cell<usize>>,
    }

    impl Clone for PanicOnClone {
        fn clone(&self) -> Self {
            let left = self.clones_left.get();
            if left == 0 {
                panic!("clone budget exhausted");
            }
            self.clones_left.set(left - 1);
            Self {
                clones_left: self.clones_left.clone(),
            }
        }
    }

    #[test]
    fn create_and_take_node_round_trips_value() {
        let alloc = TrackingAllocator::new();
        let node = create_node(&alloc, 42u32).expect("allocation should succeed");
        assert_eq!(alloc.live(), 1);
        unsafe {
            assert!(Node::prev(node).is_null());
            assert!(Node::next(node).is_null());
            assert_eq!(*Node::value(node), 42);
            assert_eq!(take_node(&alloc, node), 42);
        }
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn create_node_reports_alloc_failure() {
        let alloc = TrackingAllocator::new();
        alloc.fail_after(0);
        assert_eq!(create_node(&alloc, 1u8).err(), Some(ListError::AllocFailed));
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn emplacement_releases_storage_when_constructor_fails() {
        let alloc = TrackingAllocator::new();
        let result = create_node_with::<u32, _, _, _>(&alloc, || Err("no"));
        assert!(matches!(result, Err(BuildError::Value("no"))));
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn emplacement_releases_storage_when_constructor_panics() {
        let alloc = TrackingAllocator::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = create_node_with::<u32, _, (), _>(&alloc, || panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn sentinel_links_to_itself() {
        let alloc = TrackingAllocator::new();
        let s = create_sentinel::<String, _>(&alloc).expect("allocation should succeed");
        unsafe {
            assert_eq!(Node::next(s), s);
            assert_eq!(Node::prev(s), s);
            destroy_sentinel(&alloc, s);
        }
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn from_elem_builds_linked_chain() {
        let alloc = TrackingAllocator::new();
        let chain = DetachedChain::from_elem(&alloc, 3, &7u8).expect("allocation should succeed");
        assert_eq!(chain.len(), 3);
        let (first, last, len) = chain.commit().expect("chain is not empty");
        assert_eq!(len, 3);
        unsafe {
            assert!(Node::prev(first).is_null());
            assert!(Node::next(last).is_null());
            let mid = Node::next(first);
            assert_eq!(Node::next(mid), last);
            assert_eq!(Node::prev(last), mid);
            drop(DetachedChain::adopt(&alloc, first, last, len));
        }
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn failed_allocation_mid_batch_frees_built_nodes() {
        let alloc = TrackingAllocator::new();
        alloc.fail_after(2);
        let result = DetachedChain::from_iter(&alloc, 0..5u32, 0, usize::MAX);
        assert_eq!(result.err(), Some(ListError::AllocFailed));
        assert_eq!(alloc.allocations(), 2);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn panicking_clone_mid_batch_frees_built_nodes() {
        let alloc = TrackingAllocator::new();
        let proto = PanicOnClone {
            clones_left: Rc::new(Cell::new(2)),
        };
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = DetachedChain::from_elem(&alloc, 4, &proto);
        }));
        assert!(result.is_err());
        assert_eq!(alloc.allocations(), 2);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn fallible_iter_hands_back_producer_error() {
        let alloc = TrackingAllocator::new();
        let items = vec![Ok(1u8), Ok(2), Err("third"), Ok(4)];
        let result = DetachedChain::from_fallible_iter(&alloc, items, 0, usize::MAX);
        assert!(matches!(result, Err(BuildError::Value("third"))));
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn chain_respects_limit() {
        let alloc = TrackingAllocator::new();
        let result = DetachedChain::from_iter(&alloc, 0..10u32, 0, 4);
        assert_eq!(
            result.err(),
            Some(ListError::CapacityExceeded {
                requested: 5,
                max: 4
            })
        );
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn chain_limit_counts_elements_already_held() {
        let alloc = TrackingAllocator::new();
        let result = DetachedChain::from_iter(&alloc, (0..10u32).filter(|_| true), 3, 4);
        assert_eq!(
            result.err(),
            Some(ListError::CapacityExceeded {
                requested: 5,
                max: 4
            })
        );
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn dropping_chain_drops_every_value() {
        let alloc = TrackingAllocator::new();
        let drops = Rc::new(Cell::new(0));
        let values = (0..4).map(|_| Noisy {
            drops: drops.clone(),
        });
        let chain = DetachedChain::from_iter(&alloc, values, 0, usize::MAX)
            .expect("allocation should succeed");
        drop(chain);
        assert_eq!(drops.get(), 4);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn empty_chain_commits_to_none() {
        let alloc = TrackingAllocator::new();
        assert!(DetachedChain::<u8, _>::new(&alloc).commit().is_none());
    }
}
