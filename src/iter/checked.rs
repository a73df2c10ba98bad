use super::{Bidirectional, ContainerId, RandomAccess, Traversable};
use crate::error::precondition;

/// report a navigation step that leaves the valid range
#[inline]
pub(crate) fn guard(in_range: bool, what: &str) {
    precondition!(in_range, "{}", what);
}

/// a position detached from any borrow of its container, tagged with the
/// identity of the container that issued it
pub struct Position<R> {
    raw: R,
    owner: ContainerId,
}

impl<R: Copy> Position<R> {
    pub(crate) fn bind(raw: R, owner: ContainerId) -> Self {
        Self { raw, owner }
    }

    pub(crate) fn raw(&self) -> R {
        self.raw
    }

    /// returns true if this position was issued by (or re-bound to) the
    /// container identified by `id`
    pub fn is_bound_to(&self, id: ContainerId) -> bool {
        self.owner == id
    }
}

impl<R: Copy> Clone for Position<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Copy> Copy for Position<R> {}

/// positions of two different containers never compare: that is a
/// precondition violation. a position whose element was moved into another
/// container keeps its old owner until it is re-bound (for lists, through
/// `LinkedList::try_rebind` or `LinkedList::cursor_at`)
impl<R: PartialEq> PartialEq for Position<R> {
    fn eq(&self, other: &Self) -> bool {
        precondition!(
            self.owner == other.owner,
            "compared positions of two different containers"
        );
        self.raw == other.raw
    }
}

impl<R: core::fmt::Debug> core::fmt::Debug for Position<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Position")
            .field("raw", &self.raw)
            .field("owner", &self.owner.get())
            .finish()
    }
}

/// a read-only cursor bound to the container it was issued by
pub struct Cursor<'a, C: Traversable + ?Sized> {
    container: &'a C,
    at: C::Raw,
    owner: ContainerId,
}

impl<'a, C: Traversable + ?Sized> Cursor<'a, C> {
    /// a cursor on the first element of `container`
    pub fn new(container: &'a C) -> Self {
        Self {
            container,
            at: container.first_raw(),
            owner: container.identity(),
        }
    }

    /// a cursor on the end position of `container`
    pub fn at_end(container: &'a C) -> Self {
        Self {
            container,
            at: container.end_raw(),
            owner: container.identity(),
        }
    }

    /// re-attach a detached position to its container
    ///
    /// # Safety
    /// `pos` must be the end position of `container` or the position of an
    /// element `container` currently holds
    pub unsafe fn attach(container: &'a C, pos: Position<C::Raw>) -> Self {
        precondition!(
            pos.is_bound_to(container.identity()),
            "position attached to a container that did not issue it"
        );
        Self {
            container,
            at: pos.raw(),
            owner: pos.owner,
        }
    }

    fn check_bound(&self) {
        precondition!(
            self.owner == self.container.identity(),
            "cursor is not bound to the container it reads"
        );
    }

    pub fn container(&self) -> &'a C {
        self.container
    }

    pub fn position(&self) -> Position<C::Raw> {
        Position::bind(self.at, self.owner)
    }

    pub fn is_end(&self) -> bool {
        self.at == self.container.end_raw()
    }

    /// the element under the cursor, `None` at the end position
    pub fn current(&self) -> Option<&'a C::Item> {
        self.check_bound();
        // SAFETY: positions only come from the container we borrow or from
        // `attach`, whose caller vouched for them
        unsafe { self.container.item_at(self.at) }
    }

    /// the element under the cursor; dereferencing the end position is a
    /// precondition violation
    pub fn get(&self) -> &'a C::Item {
        match self.current() {
            Some(item) => item,
            None => panic!("precondition violated: dereferenced the end position"),
        }
    }

    /// the element after the cursor without moving, `None` if the cursor is
    /// on the last element or the end position
    pub fn peek_next(&self) -> Option<&'a C::Item> {
        self.check_bound();
        if !self.container.can_advance(self.at) {
            return None;
        }
        // SAFETY: see `current`
        unsafe { self.container.item_at(self.container.next_raw(self.at)) }
    }

    pub fn move_next(&mut self) {
        self.check_bound();
        guard(
            self.container.can_advance(self.at),
            "cursor advanced past the end",
        );
        // SAFETY: see `current`
        self.at = unsafe { self.container.next_raw(self.at) };
    }
}

impl<'a, C: Bidirectional + ?Sized> Cursor<'a, C> {
    /// the element before the cursor without moving, `None` if the cursor
    /// is on the first position
    pub fn peek_prev(&self) -> Option<&'a C::Item> {
        self.check_bound();
        if !self.container.can_retreat(self.at) {
            return None;
        }
        // SAFETY: see `current`
        unsafe { self.container.item_at(self.container.prev_raw(self.at)) }
    }

    pub fn move_prev(&mut self) {
        self.check_bound();
        guard(
            self.container.can_retreat(self.at),
            "cursor retreated before the first element",
        );
        // SAFETY: see `current`
        self.at = unsafe { self.container.prev_raw(self.at) };
    }

    /// the number of forward steps from `self` to `other`, negative when
    /// `other` comes first. O(n) for containers without random access
    pub fn steps_to(&self, other: &Self) -> isize {
        self.check_bound();
        precondition!(
            self.owner == other.owner,
            "measured between cursors of two different containers"
        );
        let mut forward = self.at;
        let mut backward = self.at;
        let mut steps = 0isize;
        loop {
            if forward == other.at {
                return steps;
            }
            if backward == other.at {
                return -steps;
            }
            let can_forward = self.container.can_advance(forward);
            let can_backward = self.container.can_retreat(backward);
            precondition!(
                can_forward || can_backward,
                "position is not part of the container"
            );
            // SAFETY: both walks stay between the first and end positions
            unsafe {
                if can_forward {
                    forward = self.container.next_raw(forward);
                }
                if can_backward {
                    backward = self.container.prev_raw(backward);
                }
            }
            steps += 1;
        }
    }
}

impl<'a, C: RandomAccess + ?Sized> Cursor<'a, C> {
    pub fn index(&self) -> usize {
        self.check_bound();
        self.container.index_of(self.at)
    }

    /// move `by` positions, forward when positive
    pub fn offset(&mut self, by: isize) {
        self.check_bound();
        guard(
            self.container.offset_in_range(self.at, by),
            "cursor offset out of range",
        );
        let index = self.container.index_of(self.at).wrapping_add_signed(by);
        self.at = self.container.raw_at(index);
    }

    /// O(1) signed distance from `self` to `other`
    pub fn distance_to(&self, other: &Self) -> isize {
        self.check_bound();
        precondition!(
            self.owner == other.owner,
            "measured between cursors of two different containers"
        );
        other.container.index_of(other.at) as isize - self.container.index_of(self.at) as isize
    }
}

impl<C: Traversable + ?Sized> Clone for Cursor<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Traversable + ?Sized> Copy for Cursor<'_, C> {}

impl<C: Traversable + ?Sized> PartialEq for Cursor<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        precondition!(
            self.owner == other.owner,
            "compared cursors of two different containers"
        );
        self.at == other.at
    }
}

impl<C: Traversable + ?Sized> core::fmt::Debug for Cursor<'_, C>
where
    C::Item: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("at", &self.at)
            .field("owner", &self.owner.get())
            .field("current", &self.current())
            .finish()
    }
}
