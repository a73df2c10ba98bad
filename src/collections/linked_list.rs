use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;

use alloc::alloc::handle_alloc_error;
use alloc::vec::Vec;

use super::algorithms;
use super::node::{self, create_node, create_node_with, take_node, DetachedChain, Node};
use super::topology::{Circular, Terminated, Topology};
use crate::error::{precondition, BuildError, ListError, ListResult};
use crate::iter::{guard, Bidirectional, ContainerId, Cursor, Position, ReverseCursor, Traversable};
use crate::memory::{compatible, Global, NodeAllocator};

/// a detached position in a list, see [`LinkedList::cursor_at`]
pub type ListPosition<T> = Position<*mut Node<T>>;

/// a doubly-linked list that owns its nodes and allocates them through `A`
///
/// `P` picks the shape of the list: [`Terminated`] (the default) ends in null
/// links and tracks its tail in a field, [`Circular`] closes the ring with a
/// sentinel node. both shapes share every algorithm below
pub struct LinkedList<T, P: Topology<T> = Terminated<T>, A: NodeAllocator = Global> {
    topo: P,
    /// the number of data nodes, never counting a sentinel
    len: usize,
    id: ContainerId,
    alloc: A,
    _marker: PhantomData<T>,
}

/// a [`LinkedList`] closed into a ring by a sentinel node
pub type CircularList<T, A = Global> = LinkedList<T, Circular<T>, A>;

/// turn a failure of an infallible entry point (trait impls, `new`) into the
/// conventional panic
fn expect_room<R, T>(result: ListResult<R>) -> R {
    match result {
        Ok(r) => r,
        Err(ListError::AllocFailed) => handle_alloc_error(node::node_layout::<T>()),
        Err(e) => panic!("{}", e),
    }
}

impl<T, P: Topology<T>, A: NodeAllocator + Default> LinkedList<T, P, A> {
    /// create an empty list with a default allocator
    pub fn new() -> Self {
        Self::new_in(A::default())
    }

    /// `n` default values
    pub fn with_len(n: usize) -> Self
    where
        T: Default,
    {
        expect_room::<_, T>(Self::try_with_len_in(n, A::default()))
    }

    /// `n` clones of `value`
    pub fn from_elem(n: usize, value: &T) -> Self
    where
        T: Clone,
    {
        expect_room::<_, T>(Self::try_from_elem_in(n, value, A::default()))
    }
}

impl<T, P: Topology<T>, A: NodeAllocator> LinkedList<T, P, A> {
    /// create an empty list allocating from `alloc`
    pub fn new_in(alloc: A) -> Self {
        expect_room::<_, T>(Self::try_new_in(alloc))
    }

    /// create an empty list allocating from `alloc`. fails only for shapes
    /// that allocate a sentinel up front
    pub fn try_new_in(alloc: A) -> ListResult<Self> {
        Ok(Self {
            topo: P::init(&alloc)?,
            len: 0,
            id: ContainerId::fresh(),
            alloc,
            _marker: PhantomData,
        })
    }

    pub fn try_with_len_in(n: usize, alloc: A) -> ListResult<Self>
    where
        T: Default,
    {
        let mut list = Self::try_new_in(alloc)?;
        list.check_growth(n)?;
        list.resize_with(n, T::default)?;
        Ok(list)
    }

    pub fn try_from_elem_in(n: usize, value: &T, alloc: A) -> ListResult<Self>
    where
        T: Clone,
    {
        let mut list = Self::try_new_in(alloc)?;
        list.check_growth(n)?;
        let chain = DetachedChain::from_elem(&list.alloc, n, value)?;
        if let Some((first, last, count)) = chain.commit() {
            // SAFETY: fresh chain from our allocator, appended at the end
            unsafe { list.link_chain(list.topo.nil(), first, last, count) };
        }
        Ok(list)
    }

    /// one node per item, in iteration order
    pub fn try_from_iter_in<I>(iter: I, alloc: A) -> ListResult<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = Self::try_new_in(alloc)?;
        list.try_extend(iter)?;
        Ok(list)
    }

    /// one node per `Ok` item. the first `Err` is returned as
    /// [`BuildError::Value`] and nothing built so far survives
    pub fn try_from_fallible_iter_in<I, E>(iter: I, alloc: A) -> Result<Self, BuildError<E>>
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        let mut list = Self::try_new_in(alloc)?;
        let max = list.max_len();
        let chain = DetachedChain::from_fallible_iter(&list.alloc, iter, 0, max)?;
        if let Some((first, last, count)) = chain.commit() {
            // SAFETY: fresh chain from our allocator, appended at the end
            unsafe { list.link_chain(list.topo.nil(), first, last, count) };
        }
        Ok(list)
    }

    /// move every element of `source` into a new list allocating from
    /// `alloc`. when the allocators are compatible the nodes themselves move
    /// and positions into `source` stay valid on the result; otherwise each
    /// element is moved into a node from `alloc`. an allocation failure then
    /// drops the elements moved so far and leaves the rest in `source`
    pub fn take_in(source: &mut Self, alloc: A) -> ListResult<Self> {
        let mut list = Self::try_new_in(alloc)?;
        if compatible(&list.alloc, &source.alloc) {
            let nil = list.topo.nil();
            // SAFETY: both topologies are valid and their nodes interchangeable
            unsafe {
                algorithms::transfer_all(
                    &mut list.topo,
                    nil,
                    &mut list.len,
                    &mut source.topo,
                    &mut source.len,
                );
            }
            mem::swap(&mut list.id, &mut source.id);
            return Ok(list);
        }
        list.check_growth(source.len)?;
        while !source.is_empty() {
            let node = create_node_with(&list.alloc, || source.pop_front().ok_or(()))
                .map_err(|e| match e {
                    BuildError::List(e) => e,
                    BuildError::Value(()) => unreachable!("source was not empty"),
                })?;
            // SAFETY: fresh node from our allocator
            unsafe { list.link_chain(list.topo.nil(), node, node, 1) };
        }
        Ok(list)
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// the most elements this list can ever hold with its allocator
    pub fn max_len(&self) -> usize {
        node::max_nodes::<T>(self.alloc.max_size())
    }

    fn check_growth(&self, extra: usize) -> ListResult<()> {
        let max = self.max_len();
        match self.len.checked_add(extra) {
            Some(requested) if requested <= max => Ok(()),
            Some(requested) => Err(ListError::CapacityExceeded { requested, max }),
            None => Err(ListError::CapacityExceeded {
                requested: usize::MAX,
                max,
            }),
        }
    }

    pub fn front(&self) -> Option<&T> {
        // SAFETY: a non-empty list's head is a data node
        (!self.is_empty()).then(|| unsafe { Node::value(self.topo.head()) })
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        // SAFETY: a non-empty list's head is a data node
        (!self.is_empty()).then(|| unsafe { Node::value_mut(self.topo.head()) })
    }

    pub fn back(&self) -> Option<&T> {
        // SAFETY: a non-empty list's tail is a data node
        (!self.is_empty()).then(|| unsafe { Node::value(self.topo.tail()) })
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        // SAFETY: a non-empty list's tail is a data node
        (!self.is_empty()).then(|| unsafe { Node::value_mut(self.topo.tail()) })
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|v| v == value)
    }

    /// link a committed chain of `count` nodes before `pos`
    ///
    /// # Safety
    /// `pos` is linked into this list or is `nil()`; the chain is detached
    /// and was allocated by `self.alloc`
    unsafe fn link_chain(
        &mut self,
        pos: *mut Node<T>,
        first: *mut Node<T>,
        last: *mut Node<T>,
        count: usize,
    ) {
        self.topo.make_link(pos, first, last);
        self.len += count;
    }

    fn insert_value(&mut self, pos: *mut Node<T>, value: T) -> ListResult<*mut Node<T>> {
        self.check_growth(1)?;
        let node = create_node(&self.alloc, value)?;
        // SAFETY: callers hand us positions of this list
        unsafe { self.link_chain(pos, node, node, 1) };
        Ok(node)
    }

    fn insert_with<E, F>(&mut self, pos: *mut Node<T>, f: F) -> Result<*mut Node<T>, BuildError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.check_growth(1)?;
        let node = create_node_with(&self.alloc, f)?;
        // SAFETY: callers hand us positions of this list
        unsafe { self.link_chain(pos, node, node, 1) };
        Ok(node)
    }

    fn insert_iter<I>(&mut self, pos: *mut Node<T>, iter: I) -> ListResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();
        self.check_growth(iter.size_hint().0)?;
        let max = self.max_len();
        let chain = DetachedChain::from_iter(&self.alloc, iter, self.len, max)?;
        Ok(match chain.commit() {
            Some((first, last, count)) => {
                // SAFETY: callers hand us positions of this list
                unsafe { self.link_chain(pos, first, last, count) };
                count
            }
            None => 0,
        })
    }

    /// unlink a data node and hand back its value
    ///
    /// # Safety
    /// `node` is a data node linked into this list
    unsafe fn unlink_node(&mut self, node: *mut Node<T>) -> T {
        let next = self.topo.next(node);
        self.topo.break_link(node, next);
        self.len -= 1;
        take_node(&self.alloc, node)
    }

    /// unlink `first..last` and destroy it, returning how many nodes went
    ///
    /// # Safety
    /// `first..last` is a range of this list (`last` may be `nil()`)
    unsafe fn erase_between(&mut self, first: *mut Node<T>, last: *mut Node<T>) -> usize {
        if first == last {
            return 0;
        }
        let last_in = self.topo.prev(last);
        let mut count = 1;
        let mut curr = first;
        while curr != last_in {
            curr = self.topo.next(curr);
            count += 1;
        }
        self.topo.break_link(first, last);
        self.len -= count;
        drop(DetachedChain::adopt(&self.alloc, first, last_in, count));
        count
    }

    /// the node at `index`, walking from whichever end is closer. `len()`
    /// maps to `nil()`
    fn node_at(&self, index: usize) -> *mut Node<T> {
        debug_assert!(index <= self.len);
        // SAFETY: both walks stay inside the list
        unsafe {
            if index <= self.len / 2 {
                algorithms::advance(&self.topo, self.topo.head(), index)
            } else {
                let mut node = self.topo.nil();
                for _ in index..self.len {
                    node = self.topo.prev(node);
                }
                node
            }
        }
    }

    pub fn push_front(&mut self, value: T) -> ListResult<()> {
        self.insert_value(self.topo.head(), value).map(|_| ())
    }

    pub fn push_back(&mut self, value: T) -> ListResult<()> {
        self.insert_value(self.topo.nil(), value).map(|_| ())
    }

    /// emplace at the front: storage is allocated before `f` runs and
    /// released again if `f` fails
    pub fn try_push_front_with<E, F>(&mut self, f: F) -> Result<(), BuildError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.insert_with(self.topo.head(), f).map(|_| ())
    }

    /// emplace at the back, see [`LinkedList::try_push_front_with`]
    pub fn try_push_back_with<E, F>(&mut self, f: F) -> Result<(), BuildError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.insert_with(self.topo.nil(), f).map(|_| ())
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the head of a non-empty list is a data node
        Some(unsafe { self.unlink_node(self.topo.head()) })
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the tail of a non-empty list is a data node
        Some(unsafe { self.unlink_node(self.topo.tail()) })
    }

    /// append every item of `iter`. either all of them are appended or, on
    /// error, none are
    pub fn try_extend<I>(&mut self, iter: I) -> ListResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_iter(self.topo.nil(), iter)
    }

    /// destroy every element
    pub fn clear(&mut self) {
        // SAFETY: head..nil is the whole list
        unsafe { self.erase_between(self.topo.head(), self.topo.nil()) };
    }

    /// keep the first `n` elements and destroy the rest
    pub fn truncate(&mut self, n: usize) {
        if n >= self.len {
            return;
        }
        let first = self.node_at(n);
        // SAFETY: first..nil is the tail of this list
        unsafe { self.erase_between(first, self.topo.nil()) };
    }

    /// grow with clones of `value` or shrink to `n` elements. existing
    /// elements are left as they are
    pub fn resize(&mut self, n: usize, value: T) -> ListResult<()>
    where
        T: Clone,
    {
        if n <= self.len {
            self.truncate(n);
            return Ok(());
        }
        self.check_growth(n - self.len)?;
        let chain = DetachedChain::from_elem(&self.alloc, n - self.len, &value)?;
        if let Some((first, last, count)) = chain.commit() {
            // SAFETY: fresh chain appended at the end
            unsafe { self.link_chain(self.topo.nil(), first, last, count) };
        }
        Ok(())
    }

    /// grow with values produced by `f` or shrink to `n` elements
    pub fn resize_with<F>(&mut self, n: usize, mut f: F) -> ListResult<()>
    where
        F: FnMut() -> T,
    {
        if n <= self.len {
            self.truncate(n);
            return Ok(());
        }
        let extra = n - self.len;
        self.check_growth(extra)?;
        self.insert_iter(self.topo.nil(), (0..extra).map(|_| f()))
            .map(|_| ())
    }

    /// grow with default values or shrink to `n` elements
    pub fn resize_default(&mut self, n: usize) -> ListResult<()>
    where
        T: Default,
    {
        self.resize_with(n, T::default)
    }

    /// replace the contents with the items of `iter`
    ///
    /// existing nodes are reused by assigning the new values into them; any
    /// surplus nodes are destroyed, any missing ones are built as one batch
    /// and appended. a capacity error leaves the list untouched. when the
    /// iterator does not report an exact length, the values destined for
    /// reused nodes are held back until the batch is built, so an allocation
    /// failure leaves the list untouched as well; with an exact length they
    /// are assigned straight away and an allocation failure while building
    /// the batch keeps them assigned at the old length
    pub fn assign_iter<I>(&mut self, iter: I) -> ListResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        let mut iter = iter.into_iter();
        let max = self.max_len();
        match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                if lower > max {
                    return Err(ListError::CapacityExceeded {
                        requested: lower,
                        max,
                    });
                }
                let curr = self.overwrite_front(iter.by_ref().take(self.len));
                if curr != self.topo.nil() {
                    // SAFETY: curr..nil is the tail of this list
                    unsafe { self.erase_between(curr, self.topo.nil()) };
                    return Ok(());
                }
                self.insert_iter(curr, iter).map(|_| ())
            }
            _ => {
                let reused: Vec<T> = iter.by_ref().take(self.len).collect();
                let extra = if reused.len() == self.len {
                    DetachedChain::from_iter(&self.alloc, iter, reused.len(), max)?.commit()
                } else {
                    None
                };
                let curr = self.overwrite_front(reused.into_iter());
                match extra {
                    // SAFETY: the whole list was overwritten, the fresh chain
                    // is appended at the end
                    Some((first, last, count)) => unsafe {
                        self.link_chain(curr, first, last, count)
                    },
                    // SAFETY: curr..nil is the tail of this list
                    None => unsafe {
                        self.erase_between(curr, self.topo.nil());
                    },
                }
                Ok(())
            }
        }
    }

    /// assign `values` into the leading nodes and return the first node that
    /// received nothing
    fn overwrite_front<V>(&mut self, mut values: V) -> *mut Node<T>
    where
        V: Iterator<Item = T>,
    {
        let nil = self.topo.nil();
        let mut curr = self.topo.head();
        while curr != nil {
            let Some(value) = values.next() else {
                break;
            };
            // SAFETY: `curr` walks the data nodes of this list
            unsafe {
                *Node::value_mut(curr) = value;
                curr = self.topo.next(curr);
            }
        }
        curr
    }

    /// replace the contents with `n` clones of `value`
    pub fn assign_n(&mut self, n: usize, value: T) -> ListResult<()>
    where
        T: Clone,
    {
        if n > self.max_len() {
            return Err(ListError::CapacityExceeded {
                requested: n,
                max: self.max_len(),
            });
        }
        self.assign_iter(core::iter::repeat(value).take(n))
    }

    /// destroy every element `pred` approves of and return how many went
    pub fn remove_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        // SAFETY: topology, length and allocator all belong to this list
        let removed = unsafe {
            algorithms::extract_if(&mut self.topo, &mut self.len, &self.alloc, |_, v| pred(v))
        };
        removed.len()
    }

    /// keep only the elements `keep` approves of
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.remove_if(|v| !keep(v));
    }

    /// collapse every run of adjacent equal elements to its first element
    /// and return how many elements were removed
    pub fn unique(&mut self) -> usize
    where
        T: PartialEq,
    {
        self.unique_by(|a, b| a == b)
    }

    /// like [`LinkedList::unique`], `same` is called with the first element
    /// of the current run and the candidate
    pub fn unique_by<F>(&mut self, mut same: F) -> usize
    where
        F: FnMut(&T, &T) -> bool,
    {
        // SAFETY: topology, length and allocator all belong to this list
        let removed = unsafe {
            algorithms::extract_if(&mut self.topo, &mut self.len, &self.alloc, |kept, v| {
                kept.is_some_and(|k| same(k, v))
            })
        };
        removed.len()
    }

    /// stable sort in ascending order
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(T::cmp);
    }

    /// stable merge sort driven by `cmp`, relinking nodes without moving any
    /// value
    pub fn sort_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let (head, nil, len) = (self.topo.head(), self.topo.nil(), self.len);
        // SAFETY: head..nil holds exactly `len` nodes
        unsafe { algorithms::sort_range(&mut self.topo, head, nil, len, &mut cmp) };
    }

    pub fn sort_by_key<K, F>(&mut self, mut key: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.sort_by(|a, b| key(a).cmp(&key(b)));
    }

    fn check_transfer(&self, other: &Self) {
        precondition!(
            compatible(&self.alloc, &other.alloc),
            "nodes moved between lists with incompatible allocators"
        );
        precondition!(
            self.check_growth(other.len).is_ok(),
            "moving {} elements would overflow a list of {}",
            other.len,
            self.len
        );
    }

    /// merge the sorted `other` into this sorted list; `other` is left empty
    pub fn merge(&mut self, other: &mut Self)
    where
        T: Ord,
    {
        self.merge_by(other, T::cmp);
    }

    /// merge the `cmp`-sorted `other` into this `cmp`-sorted list. runs of
    /// `other` are spliced in whole, and equal elements from `self` stay in
    /// front of those from `other`
    pub fn merge_by<F>(&mut self, other: &mut Self, mut cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.check_transfer(other);
        // SAFETY: both lists are valid and their allocators compatible
        unsafe {
            algorithms::merge_into(
                &mut self.topo,
                &mut self.len,
                &mut other.topo,
                &mut other.len,
                &mut cmp,
            );
        }
    }

    /// move every element of `other` to the back of this list in O(1)
    pub fn append(&mut self, other: &mut Self) {
        self.check_transfer(other);
        let nil = self.topo.nil();
        // SAFETY: both lists are valid and their allocators compatible
        unsafe {
            algorithms::transfer_all(
                &mut self.topo,
                nil,
                &mut self.len,
                &mut other.topo,
                &mut other.len,
            );
        }
    }

    /// move every element of `other` to the front of this list in O(1)
    pub fn prepend(&mut self, other: &mut Self) {
        self.check_transfer(other);
        let head = self.topo.head();
        // SAFETY: both lists are valid and their allocators compatible
        unsafe {
            algorithms::transfer_all(
                &mut self.topo,
                head,
                &mut self.len,
                &mut other.topo,
                &mut other.len,
            );
        }
    }

    pub fn reverse(&mut self) {
        // SAFETY: the topology is valid
        unsafe { algorithms::reverse(&mut self.topo) };
    }

    /// exchange contents with `other` in O(1). allocators travel along when
    /// `A::PROPAGATE_ON_SWAP`; otherwise they stay and must be compatible
    pub fn swap(&mut self, other: &mut Self) {
        if A::PROPAGATE_ON_SWAP {
            mem::swap(self, other);
            return;
        }
        precondition!(
            compatible(&self.alloc, &other.alloc),
            "swapped lists whose allocators neither propagate nor match"
        );
        mem::swap(&mut self.topo, &mut other.topo);
        mem::swap(&mut self.len, &mut other.len);
        mem::swap(&mut self.id, &mut other.id);
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            head: self.topo.head(),
            tail: self.topo.tail(),
            len: self.len,
            _marker: PhantomData,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            head: self.topo.head(),
            tail: self.topo.tail(),
            len: self.len,
            _marker: PhantomData,
        }
    }

    /// a read-only cursor on the first element
    pub fn cursor_front(&self) -> Cursor<'_, Self> {
        Cursor::new(self)
    }

    /// a read-only cursor on the last element (the end position if empty)
    pub fn cursor_back(&self) -> Cursor<'_, Self> {
        let mut cursor = Cursor::at_end(self);
        if !self.is_empty() {
            cursor.move_prev();
        }
        cursor
    }

    /// a read-only cursor on the end position
    pub fn cursor_end(&self) -> Cursor<'_, Self> {
        Cursor::at_end(self)
    }

    /// a reverse cursor starting at the last element
    pub fn rcursor(&self) -> ReverseCursor<'_, Self> {
        ReverseCursor::from_end(self)
    }

    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, P, A> {
        let at = self.topo.head();
        CursorMut { list: self, at }
    }

    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T, P, A> {
        let at = self.topo.tail();
        CursorMut { list: self, at }
    }

    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T, P, A> {
        let at = self.topo.nil();
        CursorMut { list: self, at }
    }

    /// returns true if `node` is the end position or a data node of this
    /// list. compares addresses only
    fn holds(&self, node: *mut Node<T>) -> bool {
        let nil = self.topo.nil();
        let mut curr = self.topo.head();
        loop {
            if curr == node {
                return true;
            }
            if curr == nil {
                return false;
            }
            // SAFETY: walks the live nodes of this list
            curr = unsafe { self.topo.next(curr) };
        }
    }

    /// bind `pos` to this list. positions issued by another list are
    /// accepted if their node now lives here (it was spliced or the list
    /// was moved)
    fn rebind(&self, pos: ListPosition<T>) -> ListPosition<T> {
        if pos.is_bound_to(self.id) {
            return pos;
        }
        precondition!(
            self.holds(pos.raw()),
            "position does not belong to this list"
        );
        Position::bind(pos.raw(), self.id)
    }

    /// re-attach a detached position
    ///
    /// # Safety
    /// `pos` must be this list's end position or the position of an element
    /// this list currently holds. positions stay valid across moves of the
    /// list and across splices of their element, and are invalidated when
    /// their element is destroyed
    pub unsafe fn cursor_at(&self, pos: ListPosition<T>) -> Cursor<'_, Self> {
        Cursor::attach(self, self.rebind(pos))
    }

    /// # Safety
    /// same as [`LinkedList::cursor_at`]
    pub unsafe fn cursor_mut_at(&mut self, pos: ListPosition<T>) -> CursorMut<'_, T, P, A> {
        let at = self.rebind(pos).raw();
        CursorMut { list: self, at }
    }

    /// bind `pos` to this list after checking, in O(n), that it refers to
    /// this list. positions taken from another list before their element was
    /// spliced here compare equal to this list's positions only once re-bound
    pub fn try_rebind(&self, pos: ListPosition<T>) -> Option<ListPosition<T>> {
        self.holds(pos.raw())
            .then(|| Position::bind(pos.raw(), self.id))
    }

    /// re-attach a detached position after checking, in O(n), that it
    /// still refers to this list
    pub fn try_cursor_at(&self, pos: ListPosition<T>) -> Option<Cursor<'_, Self>> {
        let pos = self.try_rebind(pos)?;
        // SAFETY: membership was just checked
        Some(unsafe { Cursor::attach(self, pos) })
    }

    /// destroy `first..last` and return the position that followed it
    ///
    /// # Safety
    /// `first` and `last` satisfy [`LinkedList::cursor_at`] and `first` does
    /// not come after `last`
    pub unsafe fn erase_range(
        &mut self,
        first: ListPosition<T>,
        last: ListPosition<T>,
    ) -> ListPosition<T> {
        let first = self.rebind(first).raw();
        let last = self.rebind(last);
        self.erase_between(first, last.raw());
        last
    }

    /// move `first..last` of this list in front of `pos` without touching
    /// any value. does nothing when `pos` lies inside the range or right
    /// next to it, since the order would not change
    ///
    /// # Safety
    /// all three positions satisfy [`LinkedList::cursor_at`] and `first`
    /// does not come after `last`
    pub unsafe fn splice_within(
        &mut self,
        pos: ListPosition<T>,
        first: ListPosition<T>,
        last: ListPosition<T>,
    ) {
        let pos = self.rebind(pos).raw();
        let first = self.rebind(first).raw();
        let last = self.rebind(last).raw();
        if first == last || pos == last {
            return;
        }
        let mut curr = first;
        while curr != last {
            if curr == pos {
                return;
            }
            curr = self.topo.next(curr);
        }
        let last_in = self.topo.prev(last);
        self.topo.break_link(first, last);
        self.topo.make_link(pos, first, last_in);
    }
}

impl<T, P: Topology<T>, A: NodeAllocator> Drop for LinkedList<T, P, A> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the list is empty and never used again
        unsafe { self.topo.release(&self.alloc) };
    }
}

// SAFETY: the list owns its nodes exclusively, raw pointers are never shared
// outside of borrows of the list
unsafe impl<T: Send, P: Topology<T>, A: NodeAllocator + Send> Send for LinkedList<T, P, A> {}
unsafe impl<T: Sync, P: Topology<T>, A: NodeAllocator + Sync> Sync for LinkedList<T, P, A> {}

impl<T, P: Topology<T>, A: NodeAllocator> Traversable for LinkedList<T, P, A> {
    type Item = T;
    type Raw = *mut Node<T>;

    fn identity(&self) -> ContainerId {
        self.id
    }

    fn first_raw(&self) -> Self::Raw {
        self.topo.head()
    }

    fn end_raw(&self) -> Self::Raw {
        self.topo.nil()
    }

    unsafe fn item_at(&self, at: Self::Raw) -> Option<&T> {
        if at == self.topo.nil() {
            None
        } else {
            Some(Node::value(at))
        }
    }

    unsafe fn next_raw(&self, at: Self::Raw) -> Self::Raw {
        self.topo.next(at)
    }
}

impl<T, P: Topology<T>, A: NodeAllocator> Bidirectional for LinkedList<T, P, A> {
    unsafe fn prev_raw(&self, at: Self::Raw) -> Self::Raw {
        self.topo.prev(at)
    }
}

impl<T, P: Topology<T>, A: NodeAllocator + Default> Default for LinkedList<T, P, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, P: Topology<T>, A: NodeAllocator + Clone> Clone for LinkedList<T, P, A> {
    fn clone(&self) -> Self {
        expect_room::<_, T>(Self::try_from_iter_in(
            self.iter().cloned(),
            self.alloc.select_on_clone(),
        ))
    }

    fn clone_from(&mut self, source: &Self) {
        if A::PROPAGATE_ON_CLONE_ASSIGN && !compatible(&self.alloc, &source.alloc) {
            *self = expect_room::<_, T>(Self::try_from_iter_in(
                source.iter().cloned(),
                source.alloc.clone(),
            ));
            return;
        }
        if A::PROPAGATE_ON_CLONE_ASSIGN {
            self.alloc = source.alloc.clone();
        }
        expect_room::<_, T>(self.assign_iter(source.iter().cloned()));
    }
}

impl<T, P: Topology<T>, A: NodeAllocator> Extend<T> for LinkedList<T, P, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        expect_room::<_, T>(self.try_extend(iter));
    }
}

impl<'a, T: Copy + 'a, P: Topology<T>, A: NodeAllocator> Extend<&'a T> for LinkedList<T, P, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, P: Topology<T>, A: NodeAllocator + Default> FromIterator<T> for LinkedList<T, P, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        expect_room::<_, T>(Self::try_from_iter_in(iter, A::default()))
    }
}

impl<T, P: Topology<T>, A: NodeAllocator + Default, const N: usize> From<[T; N]>
    for LinkedList<T, P, A>
{
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T: PartialEq, P: Topology<T>, A: NodeAllocator> PartialEq for LinkedList<T, P, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, P: Topology<T>, A: NodeAllocator> Eq for LinkedList<T, P, A> {}

impl<T: PartialOrd, P: Topology<T>, A: NodeAllocator> PartialOrd for LinkedList<T, P, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, P: Topology<T>, A: NodeAllocator> Ord for LinkedList<T, P, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash, P: Topology<T>, A: NodeAllocator> Hash for LinkedList<T, P, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for v in self {
            v.hash(state);
        }
    }
}

impl<T: fmt::Debug, P: Topology<T>, A: NodeAllocator> fmt::Debug for LinkedList<T, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

impl<'a, T, P: Topology<T>, A: NodeAllocator> IntoIterator for &'a LinkedList<T, P, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, P: Topology<T>, A: NodeAllocator> IntoIterator for &'a mut LinkedList<T, P, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, P: Topology<T>, A: NodeAllocator> IntoIterator for LinkedList<T, P, A> {
    type Item = T;
    type IntoIter = IntoIter<T, P, A>;

    fn into_iter(self) -> IntoIter<T, P, A> {
        IntoIter { list: self }
    }
}

/// an immutable iterator over the elements of a list, front to back
pub struct Iter<'a, T> {
    head: *mut Node<T>,
    tail: *mut Node<T>,
    len: usize,
    _marker: PhantomData<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        // # Safety
        // `len` counts the data nodes left between `head` and `tail`
        unsafe {
            let node = self.head;
            self.head = Node::next(node);
            self.len -= 1;
            Some(Node::value(node))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        // # Safety
        // `len` counts the data nodes left between `head` and `tail`
        unsafe {
            let node = self.tail;
            self.tail = Node::prev(node);
            self.len -= 1;
            Some(Node::value(node))
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

/// a mutable iterator over the elements of a list, front to back
pub struct IterMut<'a, T> {
    head: *mut Node<T>,
    tail: *mut Node<T>,
    len: usize,
    _marker: PhantomData<&'a mut Node<T>>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        // # Safety
        // every data node is yielded at most once
        unsafe {
            let node = self.head;
            self.head = Node::next(node);
            self.len -= 1;
            Some(Node::value_mut(node))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        // # Safety
        // every data node is yielded at most once
        unsafe {
            let node = self.tail;
            self.tail = Node::prev(node);
            self.len -= 1;
            Some(Node::value_mut(node))
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

unsafe impl<T: Send> Send for IterMut<'_, T> {}
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

/// an owning iterator over the elements of a list
pub struct IntoIter<T, P: Topology<T> = Terminated<T>, A: NodeAllocator = Global> {
    list: LinkedList<T, P, A>,
}

impl<T, P: Topology<T>, A: NodeAllocator> Iterator for IntoIter<T, P, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len, Some(self.list.len))
    }
}

impl<T, P: Topology<T>, A: NodeAllocator> DoubleEndedIterator for IntoIter<T, P, A> {
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, P: Topology<T>, A: NodeAllocator> ExactSizeIterator for IntoIter<T, P, A> {}

impl<T, P: Topology<T>, A: NodeAllocator> FusedIterator for IntoIter<T, P, A> {}

/// a cursor that can edit the list it points into
///
/// the cursor sits either on an element or on the end position, which lies
/// between the last and the first element. insertions happen around the
/// cursor without moving it; removals move it to the following position
pub struct CursorMut<'a, T, P: Topology<T> = Terminated<T>, A: NodeAllocator = Global> {
    list: &'a mut LinkedList<T, P, A>,
    at: *mut Node<T>,
}

impl<'a, T, P: Topology<T>, A: NodeAllocator> CursorMut<'a, T, P, A> {
    pub fn is_end(&self) -> bool {
        self.at == self.list.topo.nil()
    }

    /// the element under the cursor, `None` on the end position
    pub fn current(&self) -> Option<&T> {
        // SAFETY: the cursor only ever sits on this list's positions
        unsafe { self.list.item_at(self.at) }
    }

    pub fn current_mut(&mut self) -> Option<&mut T> {
        if self.is_end() {
            None
        } else {
            // SAFETY: a data node of the list we borrow mutably
            Some(unsafe { Node::value_mut(self.at) })
        }
    }

    /// the element after the cursor, `None` on the last element or the end
    /// position
    pub fn peek_next(&self) -> Option<&T> {
        self.as_cursor().peek_next()
    }

    /// the element before the cursor, `None` on the first position
    pub fn peek_prev(&self) -> Option<&T> {
        self.as_cursor().peek_prev()
    }

    pub fn move_next(&mut self) {
        guard(!self.is_end(), "cursor advanced past the end");
        // SAFETY: the cursor only ever sits on this list's positions
        self.at = unsafe { self.list.topo.next(self.at) };
    }

    pub fn move_prev(&mut self) {
        guard(
            self.at != self.list.topo.head(),
            "cursor retreated before the first element",
        );
        // SAFETY: the cursor only ever sits on this list's positions
        self.at = unsafe { self.list.topo.prev(self.at) };
    }

    pub fn position(&self) -> ListPosition<T> {
        Position::bind(self.at, self.list.id)
    }

    /// a read-only view of the list at the cursor's position
    pub fn as_cursor(&self) -> Cursor<'_, LinkedList<T, P, A>> {
        // SAFETY: the cursor only ever sits on this list's positions
        unsafe { Cursor::attach(&*self.list, self.position()) }
    }

    pub fn list(&self) -> &LinkedList<T, P, A> {
        &*self.list
    }

    pub fn insert_before(&mut self, value: T) -> ListResult<()> {
        self.list.insert_value(self.at, value).map(|_| ())
    }

    /// insert after the cursor. from the end position that is the front
    pub fn insert_after(&mut self, value: T) -> ListResult<()> {
        // SAFETY: the cursor only ever sits on this list's positions
        let pos = unsafe { self.list.topo.next(self.at) };
        self.list.insert_value(pos, value).map(|_| ())
    }

    /// emplace before the cursor, see [`LinkedList::try_push_front_with`]
    pub fn try_insert_with_before<E, F>(&mut self, f: F) -> Result<(), BuildError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.list.insert_with(self.at, f).map(|_| ())
    }

    /// insert `n` clones of `value` before the cursor, all or nothing
    pub fn insert_n_before(&mut self, n: usize, value: &T) -> ListResult<()>
    where
        T: Clone,
    {
        self.list.check_growth(n)?;
        let chain = DetachedChain::from_elem(&self.list.alloc, n, value)?;
        if let Some((first, last, count)) = chain.commit() {
            // SAFETY: fresh chain, the cursor's position belongs to the list
            unsafe { self.list.link_chain(self.at, first, last, count) };
        }
        Ok(())
    }

    /// insert every item of `iter` before the cursor, all or nothing.
    /// returns how many were inserted
    pub fn insert_iter_before<I>(&mut self, iter: I) -> ListResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        self.list.insert_iter(self.at, iter)
    }

    /// insert every `Ok` item of `iter` before the cursor. the first `Err`
    /// undoes the whole batch and is handed back
    pub fn try_insert_iter_before<I, E>(&mut self, iter: I) -> Result<usize, BuildError<E>>
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        let max = self.list.max_len();
        let chain = DetachedChain::from_fallible_iter(&self.list.alloc, iter, self.list.len, max)?;
        Ok(match chain.commit() {
            Some((first, last, count)) => {
                // SAFETY: fresh chain, the cursor's position belongs to the list
                unsafe { self.list.link_chain(self.at, first, last, count) };
                count
            }
            None => 0,
        })
    }

    /// remove the element under the cursor and move to the following
    /// position. does nothing on the end position
    pub fn remove_current(&mut self) -> Option<T> {
        if self.is_end() {
            return None;
        }
        let node = self.at;
        // SAFETY: `node` is a data node of this list
        unsafe {
            self.at = self.list.topo.next(node);
            Some(self.list.unlink_node(node))
        }
    }

    /// remove up to `count` elements starting at the cursor, stopping at
    /// the end position. the cursor moves to the position after the removed
    /// range. returns how many elements were removed
    pub fn remove_n(&mut self, count: usize) -> usize {
        let nil = self.list.topo.nil();
        let mut last = self.at;
        let mut n = 0;
        // SAFETY: the walk stops at the end position
        unsafe {
            while n < count && last != nil {
                last = self.list.topo.next(last);
                n += 1;
            }
            self.list.erase_between(self.at, last);
        }
        self.at = last;
        n
    }

    /// move all of `other` in front of the cursor in O(1)
    pub fn splice_before(&mut self, other: &mut LinkedList<T, P, A>) {
        self.list.check_transfer(other);
        // SAFETY: the cursor's position belongs to the list, allocators match
        unsafe {
            algorithms::transfer_all(
                &mut self.list.topo,
                self.at,
                &mut self.list.len,
                &mut other.topo,
                &mut other.len,
            );
        }
    }

    /// move all of `other` behind the cursor in O(1). from the end position
    /// that is the front of the list
    pub fn splice_after(&mut self, other: &mut LinkedList<T, P, A>) {
        self.list.check_transfer(other);
        // SAFETY: the cursor's position belongs to the list, allocators match
        unsafe {
            let pos = self.list.topo.next(self.at);
            algorithms::transfer_all(
                &mut self.list.topo,
                pos,
                &mut self.list.len,
                &mut other.topo,
                &mut other.len,
            );
        }
    }

    /// move the element under `from` in front of this cursor in O(1);
    /// `from` moves on to the following position. returns false if `from`
    /// was on its end position
    pub fn splice_one_before(&mut self, from: &mut CursorMut<'_, T, P, A>) -> bool {
        self.splice_n_before(from, 1) == 1
    }

    /// move up to `count` elements, starting at `from`, in front of this
    /// cursor without touching any value. `from` moves on to the position
    /// after the moved range. locating the range walks `count` links;
    /// the relinking itself is O(1)
    pub fn splice_n_before(&mut self, from: &mut CursorMut<'_, T, P, A>, count: usize) -> usize {
        precondition!(
            compatible(&self.list.alloc, &from.list.alloc),
            "nodes moved between lists with incompatible allocators"
        );
        let src = &mut *from.list;
        let nil = src.topo.nil();
        let first = from.at;
        let mut after = first;
        let mut n = 0;
        // SAFETY: the walk stops at the end position of `src`
        unsafe {
            while n < count && after != nil {
                after = src.topo.next(after);
                n += 1;
            }
        }
        if n == 0 {
            return 0;
        }
        precondition!(
            self.list.check_growth(n).is_ok(),
            "moving {} elements would overflow a list of {}",
            n,
            self.list.len
        );
        // SAFETY: first..after is a range of `src`; the cursor's position
        // belongs to the destination and the allocators match
        unsafe {
            let last_in = src.topo.prev(after);
            src.topo.break_link(first, after);
            src.len -= n;
            self.list.link_chain(self.at, first, last_in, n);
        }
        from.at = after;
        n
    }
}

impl<T: fmt::Debug, P: Topology<T>, A: NodeAllocator> fmt::Debug for CursorMut<'_, T, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("at", &self.at)
            .field("current", &self.current())
            .field("list", &self.list)
            .finish()
    }
}



#[cfg(all(not(miri), test))]
mod proptests {
    use std::collections::LinkedList as StdLinkedList;

    use proptest::prelude::*;
    use proptest::test_runner::Config;
    use proptest_derive::Arbitrary;
    use proptest_state_machine::{ReferenceStateMachine, StateMachineTest};

    use super::*;

    proptest_state_machine::prop_state_machine! {
        #![proptest_config(Config {
            failure_persistence: None,
            .. Config::default()
        })]

        #[test]
        fn terminated_list_state_machine_test(sequential 100..500 => LinkedList<u32>);
    }

    proptest_state_machine::prop_state_machine! {
        #![proptest_config(Config {
            failure_persistence: None,
            .. Config::default()
        })]

        #[test]
        fn circular_list_state_machine_test(sequential 100..500 => CircularList<u32>);
    }

    /// The possible transitions of the state machine. Values are kept small
    /// so that sorting and deduplication see plenty of ties.
    #[derive(Clone, Debug, Arbitrary)]
    pub enum Transition {
        #[proptest(weight = 3)]
        PushFront(#[proptest(strategy = "0..8u32")] u32),
        #[proptest(weight = 3)]
        PushBack(#[proptest(strategy = "0..8u32")] u32),
        PopFront,
        PopBack,
        InsertAt(usize, #[proptest(strategy = "0..8u32")] u32),
        RemoveAt(usize),
        Truncate(#[proptest(strategy = "0..24usize")] usize),
        RemoveMultiplesOf(#[proptest(strategy = "2..5u32")] u32),
        Unique,
        Sort,
        Reverse,
        RotateFrontToBack,
    }

    pub struct ListStateMachine;

    impl ReferenceStateMachine for ListStateMachine {
        type State = StdLinkedList<u32>;
        type Transition = Transition;

        fn init_state() -> BoxedStrategy<Self::State> {
            Just(StdLinkedList::new()).boxed()
        }

        fn transitions(_state: &Self::State) -> BoxedStrategy<Self::Transition> {
            any::<Transition>().boxed()
        }

        fn apply(mut state: Self::State, transition: &Self::Transition) -> Self::State {
            match *transition {
                Transition::PushFront(value) => state.push_front(value),
                Transition::PushBack(value) => state.push_back(value),
                Transition::PopFront => {
                    state.pop_front();
                }
                Transition::PopBack => {
                    state.pop_back();
                }
                Transition::InsertAt(at, value) => {
                    let mut tail = state.split_off(at % (state.len() + 1));
                    state.push_back(value);
                    state.append(&mut tail);
                }
                Transition::RemoveAt(at) => {
                    if !state.is_empty() {
                        let mut tail = state.split_off(at % state.len());
                        tail.pop_front();
                        state.append(&mut tail);
                    }
                }
                Transition::Truncate(n) => {
                    if n < state.len() {
                        state.split_off(n);
                    }
                }
                Transition::RemoveMultiplesOf(k) => {
                    state = state.into_iter().filter(|v| v % k != 0).collect();
                }
                Transition::Unique => {
                    let mut values: Vec<u32> = state.into_iter().collect();
                    values.dedup();
                    state = values.into_iter().collect();
                }
                Transition::Sort => {
                    let mut values: Vec<u32> = state.into_iter().collect();
                    values.sort();
                    state = values.into_iter().collect();
                }
                Transition::Reverse => {
                    state = state.into_iter().rev().collect();
                }
                Transition::RotateFrontToBack => {
                    if let Some(front) = state.pop_front() {
                        state.push_back(front);
                    }
                }
            }
            state
        }
    }

    fn apply_to_list<P: Topology<u32>>(list: &mut LinkedList<u32, P>, transition: Transition) {
        match transition {
            Transition::PushFront(value) => list.push_front(value).unwrap(),
            Transition::PushBack(value) => list.push_back(value).unwrap(),
            Transition::PopFront => {
                list.pop_front();
            }
            Transition::PopBack => {
                list.pop_back();
            }
            Transition::InsertAt(at, value) => {
                let at = at % (list.len() + 1);
                let mut cursor = list.cursor_front_mut();
                for _ in 0..at {
                    cursor.move_next();
                }
                cursor.insert_before(value).unwrap();
            }
            Transition::RemoveAt(at) => {
                if !list.is_empty() {
                    let at = at % list.len();
                    let mut cursor = list.cursor_front_mut();
                    for _ in 0..at {
                        cursor.move_next();
                    }
                    cursor.remove_current();
                }
            }
            Transition::Truncate(n) => list.truncate(n),
            Transition::RemoveMultiplesOf(k) => {
                list.remove_if(|v| v % k == 0);
            }
            Transition::Unique => {
                list.unique();
            }
            Transition::Sort => list.sort(),
            Transition::Reverse => list.reverse(),
            Transition::RotateFrontToBack => {
                if list.len() > 1 {
                    let first = list.cursor_front().position();
                    let end = list.cursor_end().position();
                    let mut second = list.cursor_front();
                    second.move_next();
                    let second = second.position();
                    unsafe { list.splice_within(end, first, second) };
                }
            }
        }
    }

    fn check_list<P: Topology<u32>>(list: &LinkedList<u32, P>, reference: &StdLinkedList<u32>) {
        assert_eq!(list.len(), reference.len());
        assert!(list.iter().eq(reference.iter()));
        assert!(list.iter().rev().eq(reference.iter().rev()));
        assert!(list.rcursor().eq(reference.iter().rev()));
        assert_eq!(list.front(), reference.front());
        assert_eq!(list.back(), reference.back());
        assert_eq!(list.cursor_front().steps_to(&list.cursor_end()), list.len() as isize);
    }

    impl StateMachineTest for LinkedList<u32> {
        type SystemUnderTest = Self;
        type Reference = ListStateMachine;

        fn init_test(
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) -> Self::SystemUnderTest {
            Self::new()
        }

        fn apply(
            mut state: Self::SystemUnderTest,
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
            transition: Transition,
        ) -> Self::SystemUnderTest {
            apply_to_list(&mut state, transition);
            state
        }

        fn check_invariants(
            state: &Self::SystemUnderTest,
            ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) {
            check_list(state, ref_state);
        }
    }

    impl StateMachineTest for CircularList<u32> {
        type SystemUnderTest = Self;
        type Reference = ListStateMachine;

        fn init_test(
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) -> Self::SystemUnderTest {
            Self::new()
        }

        fn apply(
            mut state: Self::SystemUnderTest,
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
            transition: Transition,
        ) -> Self::SystemUnderTest {
            apply_to_list(&mut state, transition);
            state
        }

        fn check_invariants(
            state: &Self::SystemUnderTest,
            ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) {
            check_list(state, ref_state);
        }
    }
}
