//! The raw memory the heap lives in.
//!
//! A [`MemoryRegion`] only knows how to move its upper boundary up and
//! report where it currently is. Everything about blocks lives in
//! [`Heap`](crate::Heap).
use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::slice;

use crate::config::HeapConfig;
use crate::error::RegionError;

/// Alignment of the arena base. Payload offsets are aligned relative to the
/// base, so the base itself must be at least as aligned.
const ARENA_ALIGN: usize = 4096;

/// A contiguous byte region that grows at its high end, `sbrk` style.
pub trait MemoryRegion {
  /// Moves the break up by `increment` bytes and returns the previous
  /// break as an offset from the region start. On failure nothing moves.
  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<usize, RegionError>;

  /// Start and end addresses of the bytes handed out so far.
  fn current_boundaries(&self) -> (usize, usize);

  /// The bytes between the region start and the current break.
  fn as_slice(&self) -> &[u8];

  fn as_mut_slice(&mut self) -> &mut [u8];

  /// Address of the region start.
  fn base(&self) -> *mut u8;

  /// Bytes handed out so far.
  fn len(&self) -> usize {
    let (start, end) = self.current_boundaries();
    end - start
  }

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// A fixed-capacity arena reserved up front. The break starts at zero and
/// can move up until the capacity is reached, after which `extend` fails.
///
/// The backing allocation never moves, so addresses derived from it stay
/// valid for the arena's lifetime.
pub struct ArenaRegion {
  base: NonNull<u8>,
  layout: Layout,
  brk: usize,
}

// The arena exclusively owns its allocation.
unsafe impl Send for ArenaRegion {}

impl ArenaRegion {
  pub fn new(capacity: usize) -> Result<Self, RegionError> {
    let layout = Layout::from_size_align(capacity.max(1), ARENA_ALIGN)
      .map_err(|_| RegionError::Overflow { requested: capacity })?;

    let base = unsafe { alloc::alloc_zeroed(layout) };
    let Some(base) = NonNull::new(base) else {
      alloc::handle_alloc_error(layout);
    };

    Ok(Self {
      base,
      layout,
      brk: 0,
    })
  }

  pub fn from_config(config: &HeapConfig) -> Result<Self, RegionError> {
    Self::new(config.max_heap)
  }

  pub fn capacity(&self) -> usize {
    self.layout.size()
  }
}

impl MemoryRegion for ArenaRegion {
  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<usize, RegionError> {
    let available = self.capacity() - self.brk;
    if increment > available {
      return Err(RegionError::Exhausted {
        requested: increment,
        available,
      });
    }

    let old = self.brk;
    self.brk += increment;
    Ok(old)
  }

  fn current_boundaries(&self) -> (usize, usize) {
    let start = self.base.as_ptr() as usize;
    (start, start + self.brk)
  }

  fn as_slice(&self) -> &[u8] {
    unsafe { slice::from_raw_parts(self.base.as_ptr(), self.brk) }
  }

  fn as_mut_slice(&mut self) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr(), self.brk) }
  }

  fn base(&self) -> *mut u8 {
    self.base.as_ptr()
  }
}

impl Drop for ArenaRegion {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
  }
}
