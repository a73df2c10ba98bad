//! the allocator capability consumed by the list family
//!
//! lists allocate every node through an [`Allocator`] from `allocator-api2`.
//! [`NodeAllocator`] layers on the policy a container needs beyond raw
//! allocation: whether two allocators can free each other's nodes (which
//! gates splicing and merging between lists), how the allocator follows the
//! list through swap and clone assignment, and how many bytes it can hand out.

pub mod tracking;

pub use allocator_api2::alloc::{AllocError, Allocator, Global};
pub use tracking::TrackingAllocator;

/// allocator policy used by the list containers
pub trait NodeAllocator: Allocator {
    /// every instance can free memory allocated by every other instance
    const IS_ALWAYS_EQUAL: bool = false;

    /// `LinkedList::swap` exchanges the allocators along with the nodes. when
    /// false the allocators stay put and must be compatible
    const PROPAGATE_ON_SWAP: bool = true;

    /// `Clone::clone_from` adopts the source list's allocator
    const PROPAGATE_ON_CLONE_ASSIGN: bool = false;

    /// returns true if nodes allocated by `self` may be freed by `other` and
    /// vice versa
    fn is_compatible(&self, other: &Self) -> bool;

    /// the allocator a cloned list should use
    fn select_on_clone(&self) -> Self
    where
        Self: Clone,
    {
        self.clone()
    }

    /// the largest single allocation this allocator can satisfy, in bytes
    fn max_size(&self) -> usize {
        isize::MAX as usize
    }
}

/// returns true if nodes may move between lists backed by `a` and `b`
pub fn compatible<A: NodeAllocator>(a: &A, b: &A) -> bool {
    A::IS_ALWAYS_EQUAL || a.is_compatible(b)
}

impl NodeAllocator for Global {
    const IS_ALWAYS_EQUAL: bool = true;

    fn is_compatible(&self, _other: &Self) -> bool {
        true
    }
}

impl<A: NodeAllocator + ?Sized> NodeAllocator for &A {
    const IS_ALWAYS_EQUAL: bool = A::IS_ALWAYS_EQUAL;
    const PROPAGATE_ON_SWAP: bool = A::PROPAGATE_ON_SWAP;
    const PROPAGATE_ON_CLONE_ASSIGN: bool = A::PROPAGATE_ON_CLONE_ASSIGN;

    fn is_compatible(&self, other: &Self) -> bool {
        (**self).is_compatible(*other)
    }

    fn max_size(&self) -> usize {
        (**self).max_size()
    }
}
