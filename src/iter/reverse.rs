use super::{Bidirectional, Cursor};

/// walks a bidirectional container back to front by driving a forward
/// cursor the other way
///
/// the wrapped cursor sits one past the element this adapter reports, so a
/// reverse walk over the whole container starts from the container's end
/// position. cloning the adapter restarts nothing and owns nothing: every
/// clone walks independently over the same borrowed container
pub struct ReverseCursor<'a, C: Bidirectional + ?Sized> {
    base: Cursor<'a, C>,
}

impl<'a, C: Bidirectional + ?Sized> ReverseCursor<'a, C> {
    pub fn new(base: Cursor<'a, C>) -> Self {
        Self { base }
    }

    /// a reverse cursor on the last element of `container`
    pub fn from_end(container: &'a C) -> Self {
        Self::new(Cursor::at_end(container))
    }

    /// the forward cursor this adapter drives
    pub fn base(&self) -> Cursor<'a, C> {
        self.base
    }

    /// the element immediately before the wrapped position, `None` once the
    /// reverse walk has passed the first element
    pub fn current(&self) -> Option<&'a C::Item> {
        self.base.peek_prev()
    }

    pub fn move_next(&mut self) {
        self.base.move_prev();
    }

    pub fn move_prev(&mut self) {
        self.base.move_next();
    }
}

impl<C: Bidirectional + ?Sized> Clone for ReverseCursor<'_, C> {
    fn clone(&self) -> Self {
        Self { base: self.base }
    }
}

impl<C: Bidirectional + ?Sized> PartialEq for ReverseCursor<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl<'a, C: Bidirectional + ?Sized> Iterator for ReverseCursor<'a, C> {
    type Item = &'a C::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.current()?;
        self.base.move_prev();
        Some(item)
    }
}

impl<C: Bidirectional + ?Sized> core::fmt::Debug for ReverseCursor<'_, C>
where
    C::Item: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReverseCursor")
            .field("base", &self.base)
            .field("current", &self.current())
            .finish()
    }
}
