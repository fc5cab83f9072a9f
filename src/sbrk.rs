use std::{io, slice};

use libc::{c_void, intptr_t, sbrk};
use log::debug;

use crate::align::ALIGNMENT;
use crate::error::RegionError;
use crate::region::MemoryRegion;

/// A region carved out of the process data segment with `sbrk(2)`.
///
/// The region starts at the program break observed on the first `extend`
/// (padded to the heap alignment). Memory is never handed back to the OS.
/// If something else moves the break between two extensions the region
/// can no longer grow contiguously and `extend` reports
/// [`RegionError::NonContiguous`].
pub struct SbrkRegion {
  start: usize,
  brk: usize,
}

impl Default for SbrkRegion {
  fn default() -> Self {
    Self::new()
  }
}

impl SbrkRegion {
  pub const fn new() -> Self {
    Self { start: 0, brk: 0 }
  }

  /// The current program break, as reported by `sbrk(0)`.
  pub fn program_break() -> *mut c_void {
    unsafe { sbrk(0) }
  }

  fn claim(increment: usize) -> Result<usize, RegionError> {
    let delta =
      intptr_t::try_from(increment).map_err(|_| RegionError::Overflow { requested: increment })?;

    let address = unsafe { sbrk(delta) };

    if address == usize::MAX as *mut c_void {
      let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
      return Err(RegionError::Os(errno));
    }

    Ok(address as usize)
  }

  fn start(&mut self) -> Result<(), RegionError> {
    let current = Self::program_break() as usize;
    let padding = (ALIGNMENT - current % ALIGNMENT) % ALIGNMENT;
    let old = Self::claim(padding)?;
    self.start = old + padding;
    self.brk = self.start;
    debug!("sbrk region starts at {:#x}", self.start);
    Ok(())
  }
}

impl MemoryRegion for SbrkRegion {
  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<usize, RegionError> {
    if self.start == 0 {
      self.start()?;
    }

    let old = Self::claim(increment)?;

    if old != self.brk {
      // Hand back what we just took; it sits on top of someone else's data.
      unsafe { sbrk(-(increment as intptr_t)) };
      return Err(RegionError::NonContiguous {
        expected: self.brk,
        found: old,
      });
    }

    self.brk += increment;
    Ok(old - self.start)
  }

  fn current_boundaries(&self) -> (usize, usize) {
    (self.start, self.brk)
  }

  fn as_slice(&self) -> &[u8] {
    if self.brk == self.start {
      return &[];
    }
    unsafe { slice::from_raw_parts(self.start as *const u8, self.brk - self.start) }
  }

  fn as_mut_slice(&mut self) -> &mut [u8] {
    if self.brk == self.start {
      return &mut [];
    }
    unsafe { slice::from_raw_parts_mut(self.start as *mut u8, self.brk - self.start) }
  }

  fn base(&self) -> *mut u8 {
    self.start as *mut u8
  }
}
