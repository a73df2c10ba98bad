use core::mem::MaybeUninit;

use crate::iter::{Bidirectional, ContainerId, Cursor, RandomAccess, ReverseCursor, Traversable};

pub type RingBufferResult<T> = Result<T, RingBufferError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RingBufferError {
    #[error("ring buffer is full")]
    NoCapacity,
}

/// a fixed-capacity FIFO queue stored inline
///
/// cursors address elements by their logical index from the oldest element,
/// so a position is a plain index in `0..=len()` with `len()` as the end
pub struct RingBuffer<T, const N: usize> {
    slots: [MaybeUninit<T>; N],
    /// physical slot of the oldest element
    reader: usize,
    in_use: usize,
    id: ContainerId,
}

impl<T, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        Self {
            // SAFETY: an array of `MaybeUninit` needs no initialization
            slots: unsafe { MaybeUninit::uninit().assume_init() },
            reader: 0,
            in_use: 0,
            id: ContainerId::fresh(),
        }
    }

    pub fn len(&self) -> usize {
        self.in_use
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn free_space(&self) -> usize {
        N - self.in_use
    }

    pub fn is_empty(&self) -> bool {
        self.in_use == 0
    }

    fn slot_of(&self, index: usize) -> usize {
        (self.reader + index) % N
    }

    pub fn push(&mut self, value: T) -> RingBufferResult<()> {
        if self.in_use >= N {
            return Err(RingBufferError::NoCapacity);
        }
        let slot = self.slot_of(self.in_use);
        self.slots[slot].write(value);
        self.in_use += 1;
        Ok(())
    }

    /// the oldest element
    pub fn peek(&self) -> Option<&T> {
        self.get(0)
    }

    /// the element `index` places after the oldest one
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.in_use {
            return None;
        }
        // SAFETY: the first `in_use` logical slots are initialized
        Some(unsafe { self.slots[self.slot_of(index)].assume_init_ref() })
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.in_use == 0 {
            return None;
        }
        let slot = core::mem::replace(&mut self.slots[self.reader], MaybeUninit::uninit());
        self.reader = (self.reader + 1) % N;
        self.in_use -= 1;
        // SAFETY: the oldest slot was initialized and is now forgotten
        Some(unsafe { slot.assume_init() })
    }

    /// a cursor on the oldest element
    pub fn cursor(&self) -> Cursor<'_, Self> {
        Cursor::new(self)
    }

    /// a cursor walking from the newest element to the oldest
    pub fn rcursor(&self) -> ReverseCursor<'_, Self> {
        ReverseCursor::from_end(self)
    }
}

impl<T, const N: usize> Drop for RingBuffer<T, N> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: core::fmt::Debug, const N: usize> core::fmt::Debug for RingBuffer<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries((0..self.in_use).filter_map(|i| self.get(i)))
            .finish()
    }
}

impl<T, const N: usize> Traversable for RingBuffer<T, N> {
    type Item = T;
    type Raw = usize;

    fn identity(&self) -> ContainerId {
        self.id
    }

    fn first_raw(&self) -> usize {
        0
    }

    fn end_raw(&self) -> usize {
        self.in_use
    }

    unsafe fn item_at(&self, at: usize) -> Option<&T> {
        self.get(at)
    }

    unsafe fn next_raw(&self, at: usize) -> usize {
        (at + 1) % (self.in_use + 1)
    }
}

impl<T, const N: usize> Bidirectional for RingBuffer<T, N> {
    unsafe fn prev_raw(&self, at: usize) -> usize {
        if at == 0 {
            self.in_use
        } else {
            at - 1
        }
    }
}

impl<T, const N: usize> RandomAccess for RingBuffer<T, N> {
    fn len(&self) -> usize {
        self.in_use
    }

    fn index_of(&self, at: usize) -> usize {
        at
    }

    fn raw_at(&self, index: usize) -> usize {
        index
    }
}
