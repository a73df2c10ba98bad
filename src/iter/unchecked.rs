use super::{Bidirectional, ContainerId, RandomAccess, Traversable};

/// navigation bounds are not validated in this build
#[inline(always)]
pub(crate) fn guard(_in_range: bool, _what: &str) {}

/// a position detached from any borrow of its container
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Position<R> {
    raw: R,
}

impl<R: Copy> Position<R> {
    pub(crate) fn bind(raw: R, _owner: ContainerId) -> Self {
        Self { raw }
    }

    pub(crate) fn raw(&self) -> R {
        self.raw
    }

    /// unchecked positions carry no owner and match every container
    pub fn is_bound_to(&self, _id: ContainerId) -> bool {
        true
    }
}

/// a read-only cursor over a container
pub struct Cursor<'a, C: Traversable + ?Sized> {
    container: &'a C,
    at: C::Raw,
}

impl<'a, C: Traversable + ?Sized> Cursor<'a, C> {
    pub fn new(container: &'a C) -> Self {
        Self {
            container,
            at: container.first_raw(),
        }
    }

    pub fn at_end(container: &'a C) -> Self {
        Self {
            container,
            at: container.end_raw(),
        }
    }

    /// # Safety
    /// `pos` must be the end position of `container` or the position of an
    /// element `container` currently holds
    pub unsafe fn attach(container: &'a C, pos: Position<C::Raw>) -> Self {
        Self {
            container,
            at: pos.raw(),
        }
    }

    pub fn container(&self) -> &'a C {
        self.container
    }

    pub fn position(&self) -> Position<C::Raw> {
        Position { raw: self.at }
    }

    pub fn is_end(&self) -> bool {
        self.at == self.container.end_raw()
    }

    pub fn current(&self) -> Option<&'a C::Item> {
        // SAFETY: positions only come from the container we borrow or from
        // `attach`, whose caller vouched for them
        unsafe { self.container.item_at(self.at) }
    }

    pub fn get(&self) -> &'a C::Item {
        match self.current() {
            Some(item) => item,
            None => panic!("dereferenced the end position"),
        }
    }

    pub fn peek_next(&self) -> Option<&'a C::Item> {
        if !self.container.can_advance(self.at) {
            return None;
        }
        // SAFETY: see `current`
        unsafe { self.container.item_at(self.container.next_raw(self.at)) }
    }

    pub fn move_next(&mut self) {
        // SAFETY: see `current`
        self.at = unsafe { self.container.next_raw(self.at) };
    }
}

impl<'a, C: Bidirectional + ?Sized> Cursor<'a, C> {
    pub fn peek_prev(&self) -> Option<&'a C::Item> {
        if !self.container.can_retreat(self.at) {
            return None;
        }
        // SAFETY: see `current`
        unsafe { self.container.item_at(self.container.prev_raw(self.at)) }
    }

    pub fn move_prev(&mut self) {
        // SAFETY: see `current`
        self.at = unsafe { self.container.prev_raw(self.at) };
    }

    /// the number of forward steps from `self` to `other`, negative when
    /// `other` comes first. returns 0 if `other` is not reachable
    pub fn steps_to(&self, other: &Self) -> isize {
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
            if !can_forward && !can_backward {
                return 0;
            }
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
        self.container.index_of(self.at)
    }

    /// move `by` positions. offsets past either end wrap around the
    /// container's `len() + 1` positions
    pub fn offset(&mut self, by: isize) {
        let positions = self.container.len() as isize + 1;
        let index = (self.container.index_of(self.at) as isize + by).rem_euclid(positions);
        self.at = self.container.raw_at(index as usize);
    }

    pub fn distance_to(&self, other: &Self) -> isize {
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
            .field("current", &self.current())
            .finish()
    }
}
