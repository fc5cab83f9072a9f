//! Heap consistency checking.
use crate::align::{DSIZE, WSIZE};
use crate::block::Tag;
use crate::heap::{Heap, MIN_BLOCK_SIZE};
use crate::region::MemoryRegion;

/// The first broken invariant found by [`Heap::check`]. Offsets are
/// payload offsets from the heap base.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapCheckError {
  #[error("bad prologue: header {header:?}, footer {footer:?}")]
  BadPrologue { header: Tag, footer: Tag },
  #[error("block at {offset:#x} has unaligned payload")]
  MisalignedPayload { offset: usize },
  #[error("block at {offset:#x} has invalid size {size}")]
  BadSize { offset: usize, size: usize },
  #[error("block at {offset:#x} runs past the heap end")]
  OutOfBounds { offset: usize },
  #[error("block at {offset:#x}: header {header:?} and footer {footer:?} disagree")]
  TagMismatch { offset: usize, header: Tag, footer: Tag },
  #[error("free blocks at {first:#x} and {second:#x} were not coalesced")]
  UncoalescedFree { first: usize, second: usize },
  #[error("epilogue at {offset:#x} is not the last word of the heap (heap is {len} bytes)")]
  BadEpilogue { offset: usize, len: usize },
}

impl<R: MemoryRegion> Heap<R> {
  /// Walks the whole heap and verifies the block layout.
  pub fn check(&self) -> Result<(), HeapCheckError> {
    let heap = self.region.as_slice();
    let len = heap.len();

    let header = Tag::read(heap, self.prologue - WSIZE);
    let footer = Tag::read(heap, self.prologue);
    if header != Tag::allocated(DSIZE) || footer != header {
      return Err(HeapCheckError::BadPrologue { header, footer });
    }

    let mut bp = self.prologue + DSIZE;
    let mut previous_free: Option<usize> = None;

    loop {
      if bp > len {
        return Err(HeapCheckError::OutOfBounds { offset: bp });
      }

      let header = Tag::read(heap, bp - WSIZE);
      if header.size() == 0 {
        if !header.is_allocated() || bp != len {
          return Err(HeapCheckError::BadEpilogue {
            offset: bp - WSIZE,
            len,
          });
        }
        return Ok(());
      }

      if bp % DSIZE != 0 {
        return Err(HeapCheckError::MisalignedPayload { offset: bp });
      }
      if header.size() % DSIZE != 0 || header.size() < MIN_BLOCK_SIZE {
        return Err(HeapCheckError::BadSize {
          offset: bp,
          size: header.size(),
        });
      }
      if bp + header.size() > len {
        return Err(HeapCheckError::OutOfBounds { offset: bp });
      }

      let footer = Tag::read(heap, bp + header.size() - DSIZE);
      if header != footer {
        return Err(HeapCheckError::TagMismatch {
          offset: bp,
          header,
          footer,
        });
      }

      if header.is_free() {
        if let Some(first) = previous_free {
          return Err(HeapCheckError::UncoalescedFree { first, second: bp });
        }
        previous_free = Some(bp);
      } else {
        previous_free = None;
      }

      bp += header.size();
    }
  }
}
