//! the list family and its building blocks
//!
//! [`LinkedList`] is generic over its [`Topology`]: [`Terminated`] lists end
//! in null links, [`Circular`] lists close the ring through a sentinel node.
//! [`RingBuffer`] is a fixed-capacity queue that shares the cursor framework
//! from [`crate::iter`].

pub(crate) mod algorithms;
pub mod linked_list;
pub mod node;
pub mod ring_buffer;
pub mod topology;

pub use linked_list::{CircularList, CursorMut, IntoIter, Iter, IterMut, LinkedList, ListPosition};
pub use node::Node;
pub use ring_buffer::{RingBuffer, RingBufferError, RingBufferResult};
pub use topology::{Circular, Terminated, Topology};
