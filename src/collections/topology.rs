//! the link algebra shared by both list shapes
//!
//! every algorithm in the crate rewires nodes exclusively through
//! [`Topology::make_link`] and [`Topology::break_link`], and finds the
//! boundaries of a list through [`Topology::nil`], [`Topology::head`] and
//! [`Topology::tail`]. the two strategies differ only in how the one-past-end
//! position and the tail are represented:
//!
//! - [`Terminated`]: the end is the null pointer, and `head`/`tail` are
//!   tracked in fields next to the chain
//! - [`Circular`]: the end is a heap-allocated sentinel node woven into the
//!   ring; the head is `sentinel.next` and the tail is `sentinel.prev`

use core::ptr;

use allocator_api2::alloc::Allocator;

use super::node::{create_sentinel, destroy_sentinel, Node};
use crate::error::ListResult;

/// link bookkeeping for one list shape
///
/// # Safety
/// implementors must keep every node reachable from `head()` by `next`
/// links, ending at `nil()`, and mirror that path through `prev` links
pub unsafe trait Topology<T>: Sized {
    /// set up an empty list
    fn init<A: Allocator>(alloc: &A) -> ListResult<Self>;

    /// give back anything `init` allocated. the list must be empty
    ///
    /// # Safety
    /// `alloc` is the allocator passed to `init`; `self` is not used again
    unsafe fn release<A: Allocator>(&mut self, alloc: &A);

    /// forget every node and return to the empty state without touching
    /// the nodes themselves
    fn reset(&mut self);

    /// the one-past-end position
    fn nil(&self) -> *mut Node<T>;

    /// the first node, or `nil()` when empty
    fn head(&self) -> *mut Node<T>;

    /// the last node, or `nil()` when empty
    fn tail(&self) -> *mut Node<T>;

    /// the successor of `node`. the successor of `nil()` is `head()`
    ///
    /// # Safety
    /// `node` is `nil()` or a node linked into this topology
    unsafe fn next(&self, node: *mut Node<T>) -> *mut Node<T>;

    /// the predecessor of `node`. the predecessor of `nil()` is `tail()`, the
    /// predecessor of `head()` is `nil()`
    ///
    /// # Safety
    /// same as [`Topology::next`]
    unsafe fn prev(&self, node: *mut Node<T>) -> *mut Node<T>;

    /// link the detached chain `first..=last` immediately before `pos`
    ///
    /// # Safety
    /// `pos` is `nil()` or linked into this topology; `first..=last` is a
    /// detached chain linked through `next`/`prev`
    unsafe fn make_link(&mut self, pos: *mut Node<T>, first: *mut Node<T>, last: *mut Node<T>);

    /// unlink `first..last` (exclusive of `last`), join its former
    /// neighbours, and return the node that preceded `first` (`nil()` if
    /// `first` was the head). the detached chain gets null outer links
    ///
    /// # Safety
    /// `first` is a linked node, `last` is `nil()` or a linked node reachable
    /// from `first`, and `first != last`
    unsafe fn break_link(&mut self, first: *mut Node<T>, last: *mut Node<T>) -> *mut Node<T>;

    fn is_empty(&self) -> bool {
        self.head() == self.nil()
    }
}

/// a list whose ends are null links; the tail is tracked out of line
pub struct Terminated<T> {
    head: *mut Node<T>,
    tail: *mut Node<T>,
}

unsafe impl<T> Topology<T> for Terminated<T> {
    fn init<A: Allocator>(_alloc: &A) -> ListResult<Self> {
        Ok(Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
        })
    }

    unsafe fn release<A: Allocator>(&mut self, _alloc: &A) {
        debug_assert!(self.head.is_null());
    }

    fn reset(&mut self) {
        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
    }

    fn nil(&self) -> *mut Node<T> {
        ptr::null_mut()
    }

    fn head(&self) -> *mut Node<T> {
        self.head
    }

    fn tail(&self) -> *mut Node<T> {
        self.tail
    }

    unsafe fn next(&self, node: *mut Node<T>) -> *mut Node<T> {
        if node.is_null() {
            self.head
        } else {
            Node::next(node)
        }
    }

    unsafe fn prev(&self, node: *mut Node<T>) -> *mut Node<T> {
        if node.is_null() {
            self.tail
        } else {
            Node::prev(node)
        }
    }

    // Before: (before) <-> (pos)
    // After: (before) <-> (first) ... (last) <-> (pos)
    unsafe fn make_link(&mut self, pos: *mut Node<T>, first: *mut Node<T>, last: *mut Node<T>) {
        let before = if pos.is_null() {
            self.tail
        } else {
            Node::prev(pos)
        };

        Node::set_prev(first, before);
        Node::set_next(last, pos);

        if before.is_null() {
            self.head = first;
        } else {
            Node::set_next(before, first);
        }

        if pos.is_null() {
            self.tail = last;
        } else {
            Node::set_prev(pos, last);
        }
    }

    // Before: (before) <-> (first) ... (last_in) <-> (last)
    // After: (before) <-> (last)
    unsafe fn break_link(&mut self, first: *mut Node<T>, last: *mut Node<T>) -> *mut Node<T> {
        let before = Node::prev(first);
        let last_in = if last.is_null() {
            self.tail
        } else {
            Node::prev(last)
        };

        if before.is_null() {
            self.head = last;
        } else {
            Node::set_next(before, last);
        }

        if last.is_null() {
            self.tail = before;
        } else {
            Node::set_prev(last, before);
        }

        Node::set_prev(first, ptr::null_mut());
        Node::set_next(last_in, ptr::null_mut());
        before
    }
}

impl<T> core::fmt::Debug for Terminated<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Terminated")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .finish()
    }
}

/// a ring closed by a sentinel node that always exists, even in empty lists
pub struct Circular<T> {
    sentinel: *mut Node<T>,
}

unsafe impl<T> Topology<T> for Circular<T> {
    fn init<A: Allocator>(alloc: &A) -> ListResult<Self> {
        Ok(Self {
            sentinel: create_sentinel(alloc)?,
        })
    }

    unsafe fn release<A: Allocator>(&mut self, alloc: &A) {
        debug_assert!(self.is_empty());
        destroy_sentinel(alloc, self.sentinel);
        self.sentinel = ptr::null_mut();
    }

    fn reset(&mut self) {
        // SAFETY: the sentinel lives as long as `self`
        unsafe {
            Node::set_next(self.sentinel, self.sentinel);
            Node::set_prev(self.sentinel, self.sentinel);
        }
    }

    fn nil(&self) -> *mut Node<T> {
        self.sentinel
    }

    fn head(&self) -> *mut Node<T> {
        // SAFETY: the sentinel lives as long as `self`
        unsafe { Node::next(self.sentinel) }
    }

    fn tail(&self) -> *mut Node<T> {
        // SAFETY: the sentinel lives as long as `self`
        unsafe { Node::prev(self.sentinel) }
    }

    unsafe fn next(&self, node: *mut Node<T>) -> *mut Node<T> {
        Node::next(node)
    }

    unsafe fn prev(&self, node: *mut Node<T>) -> *mut Node<T> {
        Node::prev(node)
    }

    unsafe fn make_link(&mut self, pos: *mut Node<T>, first: *mut Node<T>, last: *mut Node<T>) {
        let before = Node::prev(pos);
        Node::set_prev(first, before);
        Node::set_next(last, pos);
        Node::set_next(before, first);
        Node::set_prev(pos, last);
    }

    unsafe fn break_link(&mut self, first: *mut Node<T>, last: *mut Node<T>) -> *mut Node<T> {
        let before = Node::prev(first);
        let last_in = Node::prev(last);
        Node::set_next(before, last);
        Node::set_prev(last, before);
        Node::set_prev(first, ptr::null_mut());
        Node::set_next(last_in, ptr::null_mut());
        before
    }
}

impl<T> core::fmt::Debug for Circular<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Circular")
            .field("sentinel", &self.sentinel)
            .field("head", &self.head())
            .field("tail", &self.tail())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::node::{create_node, take_node};
    use crate::memory::TrackingAllocator;

    fn collect<T: Copy, P: Topology<T>>(topo: &P) -> Vec<T> {
        let mut out = Vec::new();
        let mut curr = topo.head();
        while curr != topo.nil() {
            unsafe {
                out.push(*Node::value(curr));
                curr = topo.next(curr);
            }
        }
        out
    }

    fn collect_rev<T: Copy, P: Topology<T>>(topo: &P) -> Vec<T> {
        let mut out = Vec::new();
        let mut curr = topo.tail();
        while curr != topo.nil() {
            unsafe {
                out.push(*Node::value(curr));
                curr = topo.prev(curr);
            }
        }
        out
    }

    fn push_all<P: Topology<u32>>(topo: &mut P, alloc: &TrackingAllocator, values: &[u32]) {
        for v in values {
            let n = create_node(alloc, *v).expect("allocation should succeed");
            unsafe { topo.make_link(topo.nil(), n, n) };
        }
    }

    fn drain<P: Topology<u32>>(topo: &mut P, alloc: &TrackingAllocator) {
        while !topo.is_empty() {
            let head = topo.head();
            unsafe {
                let next = topo.next(head);
                topo.break_link(head, next);
                drop(take_node(alloc, head));
            }
        }
    }

    fn link_and_break<P: Topology<u32>>() {
        let alloc = TrackingAllocator::new();
        let mut topo = P::init(&alloc).expect("init should succeed");
        assert!(topo.is_empty());
        assert_eq!(topo.head(), topo.nil());
        assert_eq!(topo.tail(), topo.nil());

        push_all(&mut topo, &alloc, &[1, 2, 3, 4]);
        assert_eq!(collect(&topo), [1, 2, 3, 4]);
        assert_eq!(collect_rev(&topo), [4, 3, 2, 1]);

        unsafe {
            // detach [2, 3] and re-link it at the front
            let two = topo.next(topo.head());
            let four = topo.tail();
            let three = topo.prev(four);
            let before = topo.break_link(two, four);
            assert_eq!(*Node::value(before), 1);
            assert!(Node::prev(two).is_null());
            assert!(Node::next(three).is_null());
            assert_eq!(collect(&topo), [1, 4]);

            topo.make_link(topo.head(), two, three);
            assert_eq!(collect(&topo), [2, 3, 1, 4]);
            assert_eq!(collect_rev(&topo), [4, 1, 3, 2]);

            // breaking from the head reports nil as the predecessor
            let head = topo.head();
            let next = topo.next(head);
            assert_eq!(topo.break_link(head, next), topo.nil());
            topo.make_link(topo.nil(), head, head);
            assert_eq!(collect(&topo), [3, 1, 4, 2]);

            // nil wraps to both ends
            assert_eq!(topo.next(topo.nil()), topo.head());
            assert_eq!(topo.prev(topo.nil()), topo.tail());
            assert_eq!(topo.prev(topo.head()), topo.nil());
        }

        drain(&mut topo, &alloc);
        assert!(topo.is_empty());
        unsafe { topo.release(&alloc) };
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn terminated_link_algebra() {
        link_and_break::<Terminated<u32>>();
    }

    #[test]
    fn circular_link_algebra() {
        link_and_break::<Circular<u32>>();
    }

    #[test]
    fn circular_allocates_its_sentinel() {
        let alloc = TrackingAllocator::new();
        let mut topo = Circular::<u32>::init(&alloc).expect("init should succeed");
        assert_eq!(alloc.live(), 1);
        unsafe { topo.release(&alloc) };
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn terminated_allocates_nothing() {
        let alloc = TrackingAllocator::new();
        alloc.fail_after(0);
        let topo = Terminated::<u32>::init(&alloc);
        assert!(topo.is_ok());
        assert_eq!(alloc.allocations(), 0);
    }
}
