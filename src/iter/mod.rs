//! cursors shared by every container in the crate
//!
//! a container describes its shape through [`Traversable`],
//! [`Bidirectional`] and [`RandomAccess`]; the [`Cursor`] built on top of
//! those traits is the only thing that walks it. two cursor implementations
//! exist and the `checked` feature picks one at build time:
//!
//! - `checked` cursors remember the identity of the container they were
//!   issued by and validate every dereference, step and offset against it.
//!   misuse panics with a `precondition violated:` message
//! - unchecked cursors carry nothing but the raw position, and stepping is a
//!   bare follow of the container's links. stepping off either end wraps
//!   through the container's end position instead of panicking
//!
//! both implementations export the same names so code written against one
//! compiles against the other.

use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicUsize, Ordering};

mod reverse;

cfg_if::cfg_if! {
    if #[cfg(feature = "checked")] {
        mod checked;
        pub use checked::{Cursor, Position};
        pub(crate) use checked::guard;
    } else {
        mod unchecked;
        pub use unchecked::{Cursor, Position};
        pub(crate) use unchecked::guard;
    }
}

pub use reverse::ReverseCursor;

/// process-unique identity of one container instance. identities travel with
/// a container's contents when it is moved and are never reused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(NonZeroUsize);

impl ContainerId {
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        // wrapping would need usize::MAX containers to be created first
        Self(NonZeroUsize::new(id).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

/// a container a cursor can walk forward through
///
/// positions are plain copyable values. every container has one end position
/// that sits one past its last element and holds no item
pub trait Traversable {
    type Item;
    type Raw: Copy + PartialEq + core::fmt::Debug;

    fn identity(&self) -> ContainerId;

    /// the position of the first element, or the end position when empty
    fn first_raw(&self) -> Self::Raw;

    fn end_raw(&self) -> Self::Raw;

    /// the item stored at `at`, or `None` at the end position
    ///
    /// # Safety
    /// `at` must be the end position or the position of an element currently
    /// held by `self`
    unsafe fn item_at(&self, at: Self::Raw) -> Option<&Self::Item>;

    /// the position after `at`. the position after the end is the first
    ///
    /// # Safety
    /// same contract as [`Traversable::item_at`]
    unsafe fn next_raw(&self, at: Self::Raw) -> Self::Raw;

    /// whether a forward step from `at` stays inside the container
    fn can_advance(&self, at: Self::Raw) -> bool {
        at != self.end_raw()
    }
}

/// a container a cursor can also walk backward through
pub trait Bidirectional: Traversable {
    /// the position before `at`. the position before the first is the end
    ///
    /// # Safety
    /// same contract as [`Traversable::item_at`]
    unsafe fn prev_raw(&self, at: Self::Raw) -> Self::Raw;

    /// whether a backward step from `at` stays inside the container
    fn can_retreat(&self, at: Self::Raw) -> bool {
        at != self.first_raw()
    }
}

/// a container whose positions can be addressed by index in O(1)
pub trait RandomAccess: Bidirectional {
    fn len(&self) -> usize;

    fn index_of(&self, at: Self::Raw) -> usize;

    /// the position of `index`; `len()` maps to the end position
    fn raw_at(&self, index: usize) -> Self::Raw;

    /// whether moving `by` elements from `at` lands on a position of the
    /// container, `0..=len()`
    fn offset_in_range(&self, at: Self::Raw, by: isize) -> bool {
        self.index_of(at)
            .checked_add_signed(by)
            .is_some_and(|i| i <= self.len())
    }
}
