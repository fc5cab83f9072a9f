//! A heap behind a spinlock, usable from several threads and as the
//! process allocator.
//!
//! ```rust,ignore
//! use tagalloc::{HeapConfig, LockedHeap, SbrkRegion};
//!
//! #[global_allocator]
//! static ALLOCATOR: LockedHeap<SbrkRegion> =
//!   LockedHeap::new(SbrkRegion::new(), HeapConfig::DEFAULT);
//! ```
//!
//! The heap logs through the `log` facade. Do not install a logger that
//! allocates while this is the global allocator: the lock is not
//! reentrant.
use core::alloc::{GlobalAlloc, Layout};
use core::mem;
use core::ptr;

use spin::Mutex;

use crate::align::ALIGNMENT;
use crate::config::HeapConfig;
use crate::error::{AllocError, UsageError};
use crate::heap::{Heap, Payload};
use crate::region::MemoryRegion;

enum State<R> {
  Pending(R, HeapConfig),
  Ready(Heap<R>),
  Failed(AllocError),
  Poisoned,
}

/// A [`Heap`] guarded by a single lock. The heap is initialized on first
/// use; if that fails, every later call fails with the same error.
pub struct LockedHeap<R> {
  state: Mutex<State<R>>,
}

impl<R: MemoryRegion> LockedHeap<R> {
  pub const fn new(
    region: R,
    config: HeapConfig,
  ) -> Self {
    Self {
      state: Mutex::new(State::Pending(region, config)),
    }
  }

  /// Runs `f` on the heap, initializing it first if needed.
  pub fn with_heap<T>(
    &self,
    f: impl FnOnce(&mut Heap<R>) -> Result<T, AllocError>,
  ) -> Result<T, AllocError> {
    let mut state = self.state.lock();

    if let State::Pending(..) = *state {
      // Left poisoned only if initialization panics.
      if let State::Pending(region, config) = mem::replace(&mut *state, State::Poisoned) {
        *state = match Heap::initialize(region, config) {
          Ok(heap) => State::Ready(heap),
          Err(err) => State::Failed(err),
        };
      }
    }

    match &mut *state {
      State::Ready(heap) => f(heap),
      State::Failed(err) => Err(*err),
      State::Pending(..) | State::Poisoned => panic!("heap initialization panicked"),
    }
  }

  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<Payload, AllocError> {
    self.with_heap(|heap| heap.allocate(size))
  }

  pub fn deallocate(
    &self,
    payload: Payload,
  ) {
    let _ = self.with_heap(|heap| {
      heap.deallocate(payload);
      Ok(())
    });
  }

  pub fn resize(
    &self,
    payload: Option<Payload>,
    size: usize,
  ) -> Result<Option<Payload>, AllocError> {
    self.with_heap(|heap| heap.resize(payload, size))
  }

  fn payload_at(
    heap: &Heap<R>,
    ptr: *mut u8,
  ) -> Result<Payload, AllocError> {
    heap
      .payload_at(ptr)
      .ok_or(UsageError::ForeignPointer(ptr as usize).into())
  }
}

fn check_layout(layout: &Layout) -> Result<(), AllocError> {
  if layout.align() > ALIGNMENT {
    return Err(UsageError::BadAlignment(layout.align()).into());
  }
  Ok(())
}

unsafe impl<R: MemoryRegion + Send> GlobalAlloc for LockedHeap<R> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    self
      .with_heap(|heap| {
        check_layout(&layout)?;
        let payload = heap.allocate(layout.size())?;
        Ok(heap.as_mut_ptr(payload))
      })
      .unwrap_or(ptr::null_mut())
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    _layout: Layout,
  ) {
    let _ = self.with_heap(|heap| {
      let payload = Self::payload_at(heap, ptr)?;
      heap.deallocate(payload);
      Ok(())
    });
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    self
      .with_heap(|heap| {
        check_layout(&layout)?;
        let payload = Self::payload_at(heap, ptr)?;
        Ok(match heap.resize(Some(payload), new_size)? {
          Some(payload) => heap.as_mut_ptr(payload),
          None => ptr::null_mut(),
        })
      })
      .unwrap_or(ptr::null_mut())
  }
}
