use crate::align::{ALIGNMENT, WSIZE};

/// Largest block size a boundary tag can encode. The low three bits of a
/// tag word are reserved for flags.
pub const MAX_BLOCK_SIZE: usize = (u32::MAX as usize) & !(ALIGNMENT - 1);

const ALLOC_BIT: u32 = 0x1;
const FLAG_MASK: u32 = (ALIGNMENT - 1) as u32;

/// A boundary tag: the size and allocation state of one block, stored in
/// the block's header word and mirrored in its footer word.
///
/// ```text
///   31                                   3   2   1   0
///   ┌─────────────────────────────────────┬───┬───┬───┐
///   │         size (multiple of 8)        │ 0 │ 0 │ a │
///   └─────────────────────────────────────┴───┴───┴───┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag {
  size: usize,
  allocated: bool,
}

impl Tag {
  /// Builds a tag. `size` must be a multiple of the alignment and fit in
  /// a tag word.
  pub fn new(
    size: usize,
    allocated: bool,
  ) -> Self {
    debug_assert!(size % ALIGNMENT == 0, "block size {size} is not aligned");
    debug_assert!(size <= MAX_BLOCK_SIZE, "block size {size} does not fit a tag");
    Self { size, allocated }
  }

  pub fn allocated(size: usize) -> Self {
    Self::new(size, true)
  }

  pub fn free(size: usize) -> Self {
    Self::new(size, false)
  }

  /// The zero-size allocated tag that terminates the heap.
  pub fn epilogue() -> Self {
    Self::new(0, true)
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn is_allocated(&self) -> bool {
    self.allocated
  }

  pub fn is_free(&self) -> bool {
    !self.allocated
  }

  /// Decodes a tag word. Reserved bits other than the alloc bit are ignored.
  pub fn decode(word: u32) -> Self {
    Self {
      size: (word & !FLAG_MASK) as usize,
      allocated: word & ALLOC_BIT != 0,
    }
  }

  pub fn encode(&self) -> u32 {
    self.size as u32 | if self.allocated { ALLOC_BIT } else { 0 }
  }

  /// Reads the tag stored at byte offset `at`.
  pub fn read(
    heap: &[u8],
    at: usize,
  ) -> Self {
    let mut word = [0u8; WSIZE];
    word.copy_from_slice(&heap[at..at + WSIZE]);
    Self::decode(u32::from_ne_bytes(word))
  }

  /// Writes this tag at byte offset `at`.
  pub fn write(
    &self,
    heap: &mut [u8],
    at: usize,
  ) {
    heap[at..at + WSIZE].copy_from_slice(&self.encode().to_ne_bytes());
  }
}

/// A snapshot of one block, as seen by a heap walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  /// Offset of the block's payload from the heap base.
  pub offset: usize,
  /// Total span including header and footer.
  pub size: usize,
  pub allocated: bool,
}
