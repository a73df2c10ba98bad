//! algorithm bodies shared by both list shapes
//!
//! every function takes the topology it works on as an explicit argument
//! and touches links only through `make_link`/`break_link`, so the same
//! code serves terminated and circular lists. element counts live with the
//! container and are threaded through as `&mut usize` so they stay exact
//! even if a comparator panics halfway through.

use core::cmp::Ordering;

use allocator_api2::alloc::Allocator;

use super::node::{DetachedChain, Node};
use super::topology::Topology;

/// the node `n` positions after `node`
///
/// # Safety
/// at least `n` nodes follow `node` before the end of `topo`
pub(crate) unsafe fn advance<T, P: Topology<T>>(
    topo: &P,
    mut node: *mut Node<T>,
    n: usize,
) -> *mut Node<T> {
    for _ in 0..n {
        node = topo.next(node);
    }
    node
}

/// the last node of the run starting at `first` whose elements all compare
/// less than `pivot`, the node after that run, and the run's length
unsafe fn run_before<T, P, F>(
    topo: &P,
    first: *mut Node<T>,
    stop: *mut Node<T>,
    pivot: *mut Node<T>,
    cmp: &mut F,
) -> (*mut Node<T>, *mut Node<T>, usize)
where
    P: Topology<T>,
    F: FnMut(&T, &T) -> Ordering,
{
    let mut last = first;
    let mut next = topo.next(first);
    let mut count = 1;
    while next != stop && cmp(Node::value(next), Node::value(pivot)) == Ordering::Less {
        last = next;
        next = topo.next(next);
        count += 1;
    }
    (last, next, count)
}

/// merge the sorted, adjacent ranges `first1..first2` and `first2..last` in
/// place and return the node that now starts the merged range
///
/// a run is taken from the right range only while it compares strictly less
/// than the current left element, so equal elements keep their order
///
/// # Safety
/// both ranges are linked into `topo` and `first1..last` is contiguous
pub(crate) unsafe fn merge_adjacent<T, P, F>(
    topo: &mut P,
    first1: *mut Node<T>,
    first2: *mut Node<T>,
    last: *mut Node<T>,
    cmp: &mut F,
) -> *mut Node<T>
where
    P: Topology<T>,
    F: FnMut(&T, &T) -> Ordering,
{
    let mut new_first = first1;
    let mut left = first1;
    let mut right = first2;
    while left != right && right != last {
        if cmp(Node::value(right), Node::value(left)) == Ordering::Less {
            let (run_last, after, _) = run_before(topo, right, last, left, cmp);
            topo.break_link(right, after);
            topo.make_link(left, right, run_last);
            if left == new_first {
                new_first = right;
            }
            right = after;
        } else {
            left = topo.next(left);
        }
    }
    new_first
}

/// stable merge sort of the `n` nodes starting at `first` and ending before
/// `last`. returns the node that now starts the range
///
/// # Safety
/// exactly `n` linked nodes lie between `first` and `last`
pub(crate) unsafe fn sort_range<T, P, F>(
    topo: &mut P,
    first: *mut Node<T>,
    last: *mut Node<T>,
    n: usize,
    cmp: &mut F,
) -> *mut Node<T>
where
    P: Topology<T>,
    F: FnMut(&T, &T) -> Ordering,
{
    if n < 2 {
        return first;
    }
    let half = n / 2;
    let mid = advance(topo, first, half);
    let first = sort_range(topo, first, mid, half, cmp);
    let mid = sort_range(topo, mid, last, n - half, cmp);
    merge_adjacent(topo, first, mid, last, cmp)
}

/// move every node of the sorted `src` into the sorted `dst`, one splice per
/// maximal run
///
/// # Safety
/// `dst_len`/`src_len` are the exact lengths of `dst`/`src`, and nodes of
/// `src` may be freed by `dst`'s allocator
pub(crate) unsafe fn merge_into<T, P, F>(
    dst: &mut P,
    dst_len: &mut usize,
    src: &mut P,
    src_len: &mut usize,
    cmp: &mut F,
) where
    P: Topology<T>,
    F: FnMut(&T, &T) -> Ordering,
{
    let mut left = dst.head();
    while left != dst.nil() && !src.is_empty() {
        let first = src.head();
        if cmp(Node::value(first), Node::value(left)) == Ordering::Less {
            let (last, after, count) = run_before(src, first, src.nil(), left, cmp);
            src.break_link(first, after);
            *src_len -= count;
            dst.make_link(left, first, last);
            *dst_len += count;
        } else {
            left = dst.next(left);
        }
    }
    if !src.is_empty() {
        let nil = dst.nil();
        transfer_all(dst, nil, dst_len, src, src_len);
    }
}

/// move the whole of `src` in front of `pos` in `dst`
///
/// # Safety
/// `pos` is linked into `dst` or is `dst.nil()`; see [`merge_into`]
pub(crate) unsafe fn transfer_all<T, P: Topology<T>>(
    dst: &mut P,
    pos: *mut Node<T>,
    dst_len: &mut usize,
    src: &mut P,
    src_len: &mut usize,
) {
    if src.is_empty() {
        return;
    }
    let first = src.head();
    let last = src.tail();
    src.break_link(first, src.nil());
    dst.make_link(pos, first, last);
    *dst_len += *src_len;
    *src_len = 0;
}

/// unlink every node `doomed` approves of and return them as one chain
///
/// `doomed` sees the last node that was kept (`None` before the first kept
/// node) and the candidate
///
/// # Safety
/// `len` is the exact length of `topo`, whose nodes come from `alloc`
pub(crate) unsafe fn extract_if<'a, T, P, A, F>(
    topo: &mut P,
    len: &mut usize,
    alloc: &'a A,
    mut doomed: F,
) -> DetachedChain<'a, T, A>
where
    P: Topology<T>,
    A: Allocator,
    F: FnMut(Option<&T>, &T) -> bool,
{
    let mut removed = DetachedChain::new(alloc);
    let mut kept: Option<*mut Node<T>> = None;
    let mut curr = topo.head();
    while curr != topo.nil() {
        let next = topo.next(curr);
        let prev_kept = kept.map(|k| Node::value(k));
        if doomed(prev_kept, Node::value(curr)) {
            topo.break_link(curr, next);
            *len -= 1;
            removed.append_node(curr);
        } else {
            kept = Some(curr);
        }
        curr = next;
    }
    removed
}

/// reverse the order of all nodes by moving each one to the front
///
/// # Safety
/// `topo` is a valid topology
pub(crate) unsafe fn reverse<T, P: Topology<T>>(topo: &mut P) {
    let head = topo.head();
    if head == topo.nil() {
        return;
    }
    let mut curr = topo.next(head);
    while curr != topo.nil() {
        let next = topo.next(curr);
        topo.break_link(curr, next);
        topo.make_link(topo.head(), curr, curr);
        curr = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::node::create_node;
    use crate::collections::topology::{Circular, Terminated};
    use crate::memory::TrackingAllocator;

    struct Fixture<P: Topology<(u32, u32)>> {
        alloc: TrackingAllocator,
        topo: P,
        len: usize,
    }

    impl<P: Topology<(u32, u32)>> Fixture<P> {
        fn new(values: &[(u32, u32)]) -> Self {
            let alloc = TrackingAllocator::new();
            let mut topo = P::init(&alloc).expect("init should succeed");
            for v in values {
                let n = create_node(&alloc, *v).expect("allocation should succeed");
                unsafe { topo.make_link(topo.nil(), n, n) };
            }
            Self {
                alloc,
                topo,
                len: values.len(),
            }
        }

        fn values(&self) -> Vec<(u32, u32)> {
            let mut out = Vec::new();
            let mut curr = self.topo.head();
            while curr != self.topo.nil() {
                unsafe {
                    out.push(*Node::value(curr));
                    curr = self.topo.next(curr);
                }
            }
            out
        }

        fn keys(&self) -> Vec<u32> {
            self.values().into_iter().map(|(k, _)| k).collect()
        }
    }

    impl<P: Topology<(u32, u32)>> Drop for Fixture<P> {
        fn drop(&mut self) {
            let alloc = &self.alloc;
            let chain = unsafe { extract_if(&mut self.topo, &mut self.len, alloc, |_, _| true) };
            drop(chain);
            unsafe { self.topo.release(alloc) };
            assert_eq!(self.alloc.live(), 0);
        }
    }

    fn by_key(a: &(u32, u32), b: &(u32, u32)) -> Ordering {
        a.0.cmp(&b.0)
    }

    fn sort_is_stable<P: Topology<(u32, u32)>>() {
        let input = [(3, 0), (1, 1), (3, 2), (2, 3), (1, 4), (3, 5), (0, 6)];
        let mut f = Fixture::<P>::new(&input);
        unsafe {
            let (head, nil, n) = (f.topo.head(), f.topo.nil(), f.len);
            sort_range(&mut f.topo, head, nil, n, &mut by_key);
        }
        assert_eq!(
            f.values(),
            [(0, 6), (1, 1), (1, 4), (2, 3), (3, 0), (3, 2), (3, 5)]
        );
    }

    #[test]
    fn terminated_sort_is_stable() {
        sort_is_stable::<Terminated<(u32, u32)>>();
    }

    #[test]
    fn circular_sort_is_stable() {
        sort_is_stable::<Circular<(u32, u32)>>();
    }

    #[test]
    fn sort_handles_tiny_ranges() {
        for n in 0..3u32 {
            let input: Vec<_> = (0..n).rev().map(|k| (k, 0)).collect();
            let mut f = Fixture::<Terminated<(u32, u32)>>::new(&input);
            unsafe {
                let (head, nil, len) = (f.topo.head(), f.topo.nil(), f.len);
                sort_range(&mut f.topo, head, nil, len, &mut by_key);
            }
            assert_eq!(f.keys(), (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn sorting_a_subrange_leaves_the_rest_alone() {
        let input = [(9, 0), (5, 0), (4, 0), (3, 0), (0, 0)];
        let mut f = Fixture::<Circular<(u32, u32)>>::new(&input);
        unsafe {
            let first = f.topo.next(f.topo.head());
            let last = f.topo.tail();
            sort_range(&mut f.topo, first, last, 3, &mut by_key);
        }
        assert_eq!(f.keys(), [9, 3, 4, 5, 0]);
    }

    #[test]
    fn merge_moves_runs_and_empties_source() {
        let mut dst = Fixture::<Terminated<(u32, u32)>>::new(&[(1, 0), (5, 0), (9, 0)]);
        let mut src = Fixture::<Terminated<(u32, u32)>>::new(&[(0, 1), (2, 1), (3, 1), (9, 1), (12, 1)]);
        unsafe {
            merge_into(
                &mut dst.topo,
                &mut dst.len,
                &mut src.topo,
                &mut src.len,
                &mut by_key,
            );
        }
        assert_eq!(
            dst.values(),
            [(0, 1), (1, 0), (2, 1), (3, 1), (5, 0), (9, 0), (9, 1), (12, 1)]
        );
        assert_eq!(dst.len, 8);
        assert_eq!(src.len, 0);
        assert!(src.topo.is_empty());
        // hand the nodes that came from `src` back to its allocator
        let moved = unsafe {
            extract_if(&mut dst.topo, &mut dst.len, &src.alloc, |_, (_, from)| {
                *from == 1
            })
        };
        drop(moved);
        assert_eq!(dst.keys(), [1, 5, 9]);
    }

    #[test]
    fn extract_if_sees_last_kept_node() {
        let input = [(1, 0), (1, 0), (2, 0), (2, 0), (2, 0), (3, 0), (1, 0)];
        let mut f = Fixture::<Circular<(u32, u32)>>::new(&input);
        let removed = unsafe {
            let alloc = &f.alloc;
            extract_if(&mut f.topo, &mut f.len, alloc, |kept, curr| {
                kept.is_some_and(|k| k.0 == curr.0)
            })
        };
        assert_eq!(removed.len(), 3);
        drop(removed);
        assert_eq!(f.keys(), [1, 2, 3, 1]);
        assert_eq!(f.len, 4);
    }

    #[test]
    fn reverse_reverses() {
        let mut f = Fixture::<Terminated<(u32, u32)>>::new(&[(1, 0), (2, 0), (3, 0)]);
        unsafe { reverse(&mut f.topo) };
        assert_eq!(f.keys(), [3, 2, 1]);
        unsafe { reverse(&mut f.topo) };
        assert_eq!(f.keys(), [1, 2, 3]);
    }
}
