//! # tagalloc - A Boundary-Tag Memory Allocator
//!
//! This crate provides a general purpose `malloc`/`free`/`realloc` style
//! allocator built on an **implicit free list with boundary tags**. It
//! manages one contiguous region that only grows at its high end, the way
//! a process heap grows with `sbrk`.
//!
//! ## Overview
//!
//! Every block carries its size and allocation bit twice, once before the
//! payload (header) and once at its end (footer):
//!
//! ```text
//!   Heap Layout:
//!
//!   ┌─────┬───────────┬──────────────────────┬──────────────┬─────┬──────┐
//!   │ pad │ prologue  │  allocated block     │  free block  │ ... │ epi- │
//!   │     │ hdr │ ftr │ hdr │ payload  │ ftr │ hdr │   │ftr │     │logue │
//!   └─────┴─────┴─────┴─────┴──────────┴─────┴─────┴───┴────┴─────┴──────┘
//!                           ▲                                         ▲
//!                           │                                         │
//!                    returned to caller                         heap break
//! ```
//!
//! - **First fit**: allocation walks the blocks from the prologue and takes
//!   the first free block that is large enough.
//! - **Splitting**: when the chosen block leaves room for another block, the
//!   tail is split off as a new free block.
//! - **Eager coalescing**: a freed block is merged immediately with free
//!   neighbours. The footer of the previous block and the header of the
//!   next one make both checks constant time:
//!
//! ```text
//!   Coalescing on free:
//!
//!   before   ┌──────────┬──────────┬──────────┐
//!            │   free   │  freed   │   free   │
//!            └──────────┴──────────┴──────────┘
//!   after    ┌────────────────────────────────┐
//!            │              free              │
//!            └────────────────────────────────┘
//! ```
//!
//! - **Growth**: when nothing fits, the region is extended by at least one
//!   chunk (4 KiB by default) and the new space is merged with a free block
//!   that ended at the old break.
//!
//! ## Crate Structure
//!
//! ```text
//!   tagalloc
//!   ├── align      - Alignment macro and word sizes
//!   ├── block      - Boundary tag encoding
//!   ├── region     - MemoryRegion trait and ArenaRegion
//!   ├── sbrk       - SbrkRegion, backed by the program break
//!   ├── config     - HeapConfig
//!   ├── error      - Error types
//!   ├── heap       - Heap: allocate, deallocate, resize
//!   ├── check      - Heap consistency checker
//!   └── locked     - LockedHeap, a GlobalAlloc (feature "locked")
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tagalloc::{ArenaRegion, Heap};
//!
//! let region = ArenaRegion::new(1 << 20).unwrap();
//! let mut heap = Heap::new(region).unwrap();
//!
//! let p = heap.allocate(12).unwrap();
//! heap.payload_mut(p)[..5].copy_from_slice(b"hello");
//!
//! let p = heap.resize(Some(p), 400).unwrap().unwrap();
//! assert_eq!(b"hello", &heap.payload(p)[..5]);
//!
//! heap.deallocate(p);
//! assert!(heap.check().is_ok());
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded core**: [`Heap`] takes `&mut self`; wrap it in
//!   `LockedHeap` (feature `locked`) to share it.
//! - **Linear search**: allocation is O(number of blocks).
//! - **Never shrinks**: memory is not returned to the region.
//! - **8-byte alignment**: larger alignments are not supported.

pub mod align;
mod block;
mod check;
mod config;
mod error;
mod heap;
#[cfg(feature = "locked")]
mod locked;
mod region;
#[cfg(unix)]
mod sbrk;

pub use block::{BlockInfo, MAX_BLOCK_SIZE, Tag};
pub use check::HeapCheckError;
pub use config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_HEAP, HeapConfig};
pub use error::{AllocError, ConfigError, RegionError, UsageError};
pub use heap::{Blocks, Heap, MIN_BLOCK_SIZE, OVERHEAD, Payload};
#[cfg(feature = "locked")]
pub use locked::LockedHeap;
pub use region::{ArenaRegion, MemoryRegion};
#[cfg(unix)]
pub use sbrk::SbrkRegion;
