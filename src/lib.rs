//! allocator-aware doubly-linked lists with checked cursors
//!
//! ```
//! use oasis_list::collections::{CircularList, LinkedList};
//!
//! let mut list = LinkedList::<u32>::from([3, 1, 2]);
//! list.sort();
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
//!
//! let mut ring = CircularList::<u32>::new();
//! ring.push_back(1)?;
//! ring.append(&mut CircularList::from([2, 3]));
//! assert_eq!(ring.rcursor().next(), Some(&3));
//! # Ok::<(), oasis_list::error::ListError>(())
//! ```
#![cfg_attr(all(feature = "no-std", not(test)), no_std)]

extern crate alloc;

pub mod collections;
pub mod error;
pub mod iter;
pub mod memory;

pub use collections::{CircularList, LinkedList};
pub use error::{BuildError, ListError, ListResult};
