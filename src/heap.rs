//! An implicit free list allocator with boundary tags.
//!
//! The heap is one contiguous run of blocks bracketed by two sentinels:
//!
//! ```text
//!   ┌─────┬──────┬──────┬──────┬─────────┬──────┬─ ─ ─ ─┬──────┐
//!   │ pad │ 8/1  │ 8/1  │ hdr  │ payload │ ftr  │  ...  │ 0/1  │
//!   └─────┴──────┴──────┴──────┴─────────┴──────┴─ ─ ─ ─┴──────┘
//!          prologue       regular block                 epilogue
//! ```
//!
//! Every block carries a header and a footer word holding its size and
//! allocation bit, so both neighbours of a block can be inspected in
//! constant time. Free blocks are found by walking the headers forward
//! from the prologue (first fit), and are merged with free neighbours as
//! soon as they are released.
use std::cmp::{max, min};

use log::{debug, trace};

use crate::align::{DSIZE, WSIZE, checked_align, even_words};
use crate::block::{BlockInfo, MAX_BLOCK_SIZE, Tag};
use crate::config::HeapConfig;
use crate::error::{AllocError, RegionError, UsageError};
use crate::region::MemoryRegion;

/// Header plus footer.
pub const OVERHEAD: usize = DSIZE;

/// Smallest block worth splitting off: header, footer and one doubleword.
pub const MIN_BLOCK_SIZE: usize = 2 * DSIZE;

/// A live allocation: the offset of its payload from the heap base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Payload(usize);

impl Payload {
  pub fn offset(&self) -> usize {
    self.0
  }
}

/// A boundary-tag heap on top of a [`MemoryRegion`].
pub struct Heap<R> {
  pub(crate) region: R,
  pub(crate) config: HeapConfig,
  /// Payload offset of the prologue block.
  pub(crate) prologue: usize,
}

fn header(bp: usize) -> usize {
  bp - WSIZE
}

fn footer(
  bp: usize,
  size: usize,
) -> usize {
  bp + size - DSIZE
}

/// Size of the block that can hold `size` payload bytes.
fn block_size(size: usize) -> Result<usize, AllocError> {
  size
    .checked_add(OVERHEAD)
    .and_then(checked_align)
    .filter(|asize| *asize <= MAX_BLOCK_SIZE)
    .ok_or(AllocError::OutOfMemory(RegionError::Overflow { requested: size }))
}

impl<R: MemoryRegion> Heap<R> {
  /// Sets up a heap with the default configuration.
  pub fn new(region: R) -> Result<Self, AllocError> {
    Self::initialize(region, HeapConfig::default())
  }

  /// Lays down the sentinels and the first free chunk.
  ///
  /// If the region cannot supply the initial bytes the error is returned
  /// and no heap exists.
  pub fn initialize(
    mut region: R,
    config: HeapConfig,
  ) -> Result<Self, AllocError> {
    config.validate().map_err(UsageError::from)?;

    let base = region.extend(2 * DSIZE)?;
    debug_assert!(base % DSIZE == 0, "region break {base} is not aligned");

    let heap = region.as_mut_slice();
    heap[base..base + WSIZE].fill(0);
    Tag::allocated(DSIZE).write(heap, base + WSIZE);
    Tag::allocated(DSIZE).write(heap, base + DSIZE);
    Tag::epilogue().write(heap, base + 3 * WSIZE);

    let mut this = Self {
      region,
      config,
      prologue: base + DSIZE,
    };

    this.extend_heap(this.config.chunk_bytes())?;

    let (start, end) = this.bounds();
    debug!(
      "heap initialized at {:#x}..{:#x}, chunk size {}",
      start,
      end,
      this.config.chunk_bytes()
    );

    Ok(this)
  }

  /// Returns a payload of at least `size` bytes.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Payload, AllocError> {
    if size == 0 {
      return Err(UsageError::ZeroSize.into());
    }

    let asize = block_size(size)?;

    let bp = match self.find_fit(asize) {
      Some(bp) => bp,
      None => self.extend_heap(max(asize, self.config.chunk_size))?,
    };

    self.place(bp, asize);
    trace!("allocate({}) -> {:#x} ({} byte block)", size, bp, asize);

    Ok(Payload(bp))
  }

  /// Releases `payload` and merges it with any free neighbour.
  ///
  /// `payload` must be a live allocation from this heap.
  pub fn deallocate(
    &mut self,
    payload: Payload,
  ) {
    let bp = payload.0;
    let heap = self.region.as_mut_slice();
    let tag = Tag::read(heap, header(bp));

    debug_assert!(tag.is_allocated(), "double free of {bp:#x}");
    debug_assert_eq!(tag, Tag::read(heap, footer(bp, tag.size())));

    Tag::free(tag.size()).write(heap, header(bp));
    Tag::free(tag.size()).write(heap, footer(bp, tag.size()));
    trace!("deallocate({:#x}), {} byte block", bp, tag.size());

    self.coalesce(bp);
  }

  /// Resizes an allocation, keeping the first `min(old, size)` payload
  /// bytes.
  ///
  /// `None` behaves like [`allocate`](Self::allocate). A zero `size` frees
  /// the payload and returns `Ok(None)`. On error the original payload is
  /// untouched and still owned by the caller.
  pub fn resize(
    &mut self,
    payload: Option<Payload>,
    size: usize,
  ) -> Result<Option<Payload>, AllocError> {
    let Some(payload) = payload else {
      return self.allocate(size).map(Some);
    };

    if size == 0 {
      self.deallocate(payload);
      return Ok(None);
    }

    let asize = block_size(size)?;
    if self.resize_in_place(payload.0, asize) {
      trace!("resize({:#x}, {}) in place", payload.0, size);
      return Ok(Some(payload));
    }

    let new = self.allocate(size)?;
    let count = min(self.payload_size(payload), size);
    self
      .region
      .as_mut_slice()
      .copy_within(payload.0..payload.0 + count, new.0);
    self.deallocate(payload);
    trace!("resize({:#x}, {}) moved to {:#x}", payload.0, size, new.0);

    Ok(Some(new))
  }

  /// Usable bytes in `payload`. May exceed what was requested.
  pub fn payload_size(
    &self,
    payload: Payload,
  ) -> usize {
    self.tag(header(payload.0)).size() - OVERHEAD
  }

  pub fn payload(
    &self,
    payload: Payload,
  ) -> &[u8] {
    let size = self.payload_size(payload);
    &self.region.as_slice()[payload.0..payload.0 + size]
  }

  pub fn payload_mut(
    &mut self,
    payload: Payload,
  ) -> &mut [u8] {
    let size = self.payload_size(payload);
    &mut self.region.as_mut_slice()[payload.0..payload.0 + size]
  }

  /// Address of `payload` in memory.
  pub fn as_mut_ptr(
    &self,
    payload: Payload,
  ) -> *mut u8 {
    self.region.base().wrapping_add(payload.0)
  }

  /// Maps an address produced by [`as_mut_ptr`](Self::as_mut_ptr) back to
  /// its payload. Returns `None` for addresses outside the heap or off the
  /// payload alignment.
  pub fn payload_at(
    &self,
    ptr: *const u8,
  ) -> Option<Payload> {
    let (start, end) = self.bounds();
    let address = ptr as usize;

    if address < start + self.prologue + DSIZE || address >= end || (address - start) % DSIZE != 0 {
      return None;
    }

    Some(Payload(address - start))
  }

  /// Start and end addresses of the heap, as reported by the region.
  pub fn bounds(&self) -> (usize, usize) {
    self.region.current_boundaries()
  }

  /// Walks every block between the prologue and the epilogue.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      heap: self.region.as_slice(),
      bp: self.prologue + DSIZE,
    }
  }

  pub fn free_bytes(&self) -> usize {
    self.blocks().filter(|b| !b.allocated).map(|b| b.size).sum()
  }

  pub fn allocated_bytes(&self) -> usize {
    self.blocks().filter(|b| b.allocated).map(|b| b.size).sum()
  }

  pub fn config(&self) -> &HeapConfig {
    &self.config
  }

  pub fn region(&self) -> &R {
    &self.region
  }

  fn tag(
    &self,
    at: usize,
  ) -> Tag {
    Tag::read(self.region.as_slice(), at)
  }

  /// Grows the heap by at least `bytes` and returns the resulting free
  /// block, already merged with a free block that ended at the old break.
  fn extend_heap(
    &mut self,
    bytes: usize,
  ) -> Result<usize, AllocError> {
    let overflow = RegionError::Overflow { requested: bytes };
    let size = even_words(bytes).ok_or(overflow)?;
    if size > MAX_BLOCK_SIZE - self.region.len() {
      return Err(overflow.into());
    }

    let bp = self.region.extend(size)?;

    // The old epilogue header becomes the new block's header.
    let heap = self.region.as_mut_slice();
    Tag::free(size).write(heap, header(bp));
    Tag::free(size).write(heap, footer(bp, size));
    Tag::epilogue().write(heap, header(bp + size));
    debug!("heap grew by {} bytes, break now at offset {:#x}", size, bp + size);

    Ok(self.coalesce(bp))
  }

  fn find_fit(
    &self,
    asize: usize,
  ) -> Option<usize> {
    self
      .blocks()
      .find(|b| !b.allocated && asize <= b.size)
      .map(|b| b.offset)
  }

  /// Marks the free block at `bp` allocated, splitting off the tail when
  /// it can stand as a block of its own.
  fn place(
    &mut self,
    bp: usize,
    asize: usize,
  ) {
    let csize = self.tag(header(bp)).size();
    let heap = self.region.as_mut_slice();
    Tag::allocated(csize).write(heap, header(bp));
    Tag::allocated(csize).write(heap, footer(bp, csize));

    self.split(bp, asize);
  }

  /// Trims the allocated block at `bp` to `asize` bytes if the remainder
  /// is at least [`MIN_BLOCK_SIZE`]. The remainder is freed and merged
  /// forward.
  fn split(
    &mut self,
    bp: usize,
    asize: usize,
  ) {
    let csize = self.tag(header(bp)).size();
    if csize - asize < MIN_BLOCK_SIZE {
      return;
    }

    let rest = bp + asize;
    let heap = self.region.as_mut_slice();
    Tag::allocated(asize).write(heap, header(bp));
    Tag::allocated(asize).write(heap, footer(bp, asize));
    Tag::free(csize - asize).write(heap, header(rest));
    Tag::free(csize - asize).write(heap, footer(rest, csize - asize));
    trace!("split {:#x}: {} + {}", bp, asize, csize - asize);

    self.coalesce(rest);
  }

  /// Tries to fit `asize` bytes into the allocation at `bp` without
  /// moving it, borrowing from a free successor when growing.
  fn resize_in_place(
    &mut self,
    bp: usize,
    asize: usize,
  ) -> bool {
    let csize = self.tag(header(bp)).size();
    if asize <= csize {
      self.split(bp, asize);
      return true;
    }

    let next = self.tag(header(bp + csize));
    if next.is_allocated() || csize + next.size() < asize {
      return false;
    }

    let total = csize + next.size();
    let heap = self.region.as_mut_slice();
    Tag::allocated(total).write(heap, header(bp));
    Tag::allocated(total).write(heap, footer(bp, total));
    self.split(bp, asize);
    true
  }

  /// Merges the free block at `bp` with its free neighbours and returns
  /// the payload offset of the merged block.
  fn coalesce(
    &mut self,
    bp: usize,
  ) -> usize {
    let heap = self.region.as_mut_slice();
    let size = Tag::read(heap, header(bp)).size();
    let prev = Tag::read(heap, bp - DSIZE);
    let next = Tag::read(heap, header(bp + size));

    match (prev.is_allocated(), next.is_allocated()) {
      (true, true) => bp,
      (true, false) => {
        let merged = size + next.size();
        Tag::free(merged).write(heap, header(bp));
        Tag::free(merged).write(heap, footer(bp, merged));
        trace!("coalesce {:#x} with next -> {} bytes", bp, merged);
        bp
      }
      (false, true) => {
        let merged = prev.size() + size;
        let start = bp - prev.size();
        Tag::free(merged).write(heap, header(start));
        Tag::free(merged).write(heap, footer(start, merged));
        trace!("coalesce {:#x} with prev -> {} bytes", bp, merged);
        start
      }
      (false, false) => {
        let merged = prev.size() + size + next.size();
        let start = bp - prev.size();
        Tag::free(merged).write(heap, header(start));
        Tag::free(merged).write(heap, footer(start, merged));
        trace!("coalesce {:#x} with both -> {} bytes", bp, merged);
        start
      }
    }
  }
}

/// Iterator over the blocks of a heap, see [`Heap::blocks`].
pub struct Blocks<'a> {
  heap: &'a [u8],
  bp: usize,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    let tag = Tag::read(self.heap, header(self.bp));
    if tag.size() == 0 {
      return None;
    }

    let info = BlockInfo {
      offset: self.bp,
      size: tag.size(),
      allocated: tag.is_allocated(),
    };
    self.bp += tag.size();
    Some(info)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::region::ArenaRegion;

  const CHUNK: usize = 4096;

  fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
  }

  fn arena_heap(capacity: usize) -> Heap<ArenaRegion> {
    init_logger();
    Heap::new(ArenaRegion::new(capacity).unwrap()).unwrap()
  }

  fn assert_no_adjacent_free(heap: &Heap<ArenaRegion>) {
    let blocks: Vec<_> = heap.blocks().collect();
    for pair in blocks.windows(2) {
      assert!(
        pair[0].allocated || pair[1].allocated,
        "adjacent free blocks {:?} and {:?}",
        pair[0],
        pair[1]
      );
    }
  }

  fn free_blocks(heap: &Heap<ArenaRegion>) -> Vec<BlockInfo> {
    heap.blocks().filter(|b| !b.allocated).collect()
  }

  #[test]
  fn test_initialize() {
    let heap = arena_heap(1 << 16);

    let blocks: Vec<_> = heap.blocks().collect();
    assert_eq!(
      vec![BlockInfo {
        offset: 16,
        size: CHUNK,
        allocated: false
      }],
      blocks
    );

    let (start, end) = heap.bounds();
    assert_eq!(2 * DSIZE + CHUNK, end - start);
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_custom_chunk_size() {
    init_logger();
    let config = HeapConfig::default().with_chunk_size(100).with_max_heap(1 << 12);
    let mut heap = Heap::initialize(ArenaRegion::from_config(&config).unwrap(), config).unwrap();

    assert_eq!(vec![104], heap.blocks().map(|b| b.size).collect::<Vec<_>>());

    // Each miss grows by one rounded chunk and merges with the free tail.
    let _a = heap.allocate(80).unwrap();
    let _b = heap.allocate(80).unwrap();
    let (start, end) = heap.bounds();
    assert_eq!(2 * DSIZE + 2 * 104, end - start);
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_invalid_config_rejected() {
    let config = HeapConfig::default().with_chunk_size(0);
    let result = Heap::initialize(ArenaRegion::new(1 << 12).unwrap(), config);
    assert!(matches!(
      result,
      Err(AllocError::InvalidUsage(UsageError::InvalidConfig(_)))
    ));
  }

  #[test]
  fn test_initialize_fails_without_room() {
    init_logger();

    let result = Heap::new(ArenaRegion::new(8).unwrap());
    assert!(matches!(result, Err(AllocError::OutOfMemory(_))));

    // Room for the sentinels but not for the first chunk.
    let result = Heap::new(ArenaRegion::new(64).unwrap());
    assert!(matches!(
      result,
      Err(AllocError::OutOfMemory(RegionError::Exhausted { .. }))
    ));
  }

  #[test]
  fn test_allocate_alignment_and_size() {
    let mut heap = arena_heap(1 << 16);

    for size in 1..100 {
      let p = heap.allocate(size).unwrap();
      assert_eq!(0, p.offset() % DSIZE);
      assert!(heap.payload_size(p) >= size);
      assert_eq!(0, heap.as_mut_ptr(p) as usize % DSIZE);
    }
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_allocate_zero() {
    let mut heap = arena_heap(1 << 16);
    let before: Vec<_> = heap.blocks().collect();
    let bounds = heap.bounds();

    assert_eq!(
      Err(AllocError::InvalidUsage(UsageError::ZeroSize)),
      heap.allocate(0)
    );

    assert_eq!(before, heap.blocks().collect::<Vec<_>>());
    assert_eq!(bounds, heap.bounds());
  }

  #[test]
  fn test_no_overlap() {
    let mut heap = arena_heap(1 << 20);

    let mut live: Vec<(Payload, usize)> = Vec::new();
    for i in 0..200 {
      let size = (i * 37) % 300 + 1;
      let p = heap.allocate(size).unwrap();
      heap.payload_mut(p)[..size].fill(i as u8);
      live.push((p, size));

      if i % 3 == 0 {
        let (victim, _) = live.remove(live.len() / 2);
        heap.deallocate(victim);
        assert_no_adjacent_free(&heap);
      }
    }

    let mut ranges: Vec<(usize, usize)> = live
      .iter()
      .map(|(p, size)| (p.offset(), p.offset() + size))
      .collect();
    ranges.sort();
    for pair in ranges.windows(2) {
      assert!(pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_first_fit_reuses_freed_block() {
    let mut heap = arena_heap(1 << 16);

    let a = heap.allocate(100).unwrap();
    let _b = heap.allocate(200).unwrap();
    let bounds = heap.bounds();

    heap.deallocate(a);
    let c = heap.allocate(50).unwrap();

    assert_eq!(a, c);
    assert_eq!(bounds, heap.bounds());
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_three_way_coalesce() {
    let mut heap = arena_heap(1 << 16);

    let a = heap.allocate(24).unwrap();
    let b = heap.allocate(40).unwrap();
    let c = heap.allocate(56).unwrap();
    let _guard = heap.allocate(8).unwrap();

    let span = (c.offset() + heap.payload_size(c) + OVERHEAD) - a.offset();

    heap.deallocate(a);
    assert_no_adjacent_free(&heap);
    heap.deallocate(c);
    assert_no_adjacent_free(&heap);
    heap.deallocate(b);
    assert_no_adjacent_free(&heap);

    let free = free_blocks(&heap);
    assert_eq!(2, free.len());
    assert_eq!(a.offset(), free[0].offset);
    assert_eq!(span, free[0].size);
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_coalesce_every_free_order() {
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    for order in orders {
      let mut heap = arena_heap(1 << 16);
      let payloads = [
        heap.allocate(16).unwrap(),
        heap.allocate(16).unwrap(),
        heap.allocate(16).unwrap(),
      ];

      for i in order {
        heap.deallocate(payloads[i]);
        assert_no_adjacent_free(&heap);
      }

      // Everything merges back into the single initial chunk.
      assert_eq!(
        vec![BlockInfo {
          offset: 16,
          size: CHUNK,
          allocated: false
        }],
        heap.blocks().collect::<Vec<_>>()
      );
    }
  }

  #[test]
  fn test_split_leaves_no_runt() {
    let mut heap = arena_heap(1 << 16);

    // Leaves exactly 8 bytes of the initial chunk: too small to split.
    let big = heap.allocate(CHUNK - 2 * OVERHEAD).unwrap();
    assert_eq!(CHUNK - OVERHEAD, heap.payload_size(big));
    assert!(free_blocks(&heap).is_empty());
  }

  #[test]
  fn test_grow_beyond_chunk() {
    let mut heap = arena_heap(1 << 20);
    let (start, end) = heap.bounds();

    let p = heap.allocate(3 * CHUNK).unwrap();
    assert!(heap.payload_size(p) >= 3 * CHUNK);

    let (_, grown) = heap.bounds();
    assert!(grown - end >= 3 * CHUNK);
    // The new chunk merged with the initial free block, so the allocation
    // starts at the first block.
    assert_eq!(16, p.offset());
    assert_eq!(2 * DSIZE + CHUNK + block_size(3 * CHUNK).unwrap(), grown - start);
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_out_of_memory_leaves_heap_unchanged() {
    let mut heap = arena_heap(2 * DSIZE + CHUNK + 64);
    let p = heap.allocate(1000).unwrap();

    let before: Vec<_> = heap.blocks().collect();
    let bounds = heap.bounds();

    let err = heap.allocate(CHUNK * 2).unwrap_err();
    assert!(err.is_out_of_memory());
    assert_eq!(before, heap.blocks().collect::<Vec<_>>());
    assert_eq!(bounds, heap.bounds());

    assert!(heap.allocate(usize::MAX).unwrap_err().is_out_of_memory());
    assert!(heap.allocate(usize::MAX - 4).unwrap_err().is_out_of_memory());

    heap.deallocate(p);
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_resize_preserves_prefix() {
    let mut heap = arena_heap(1 << 16);

    let p = heap.allocate(40).unwrap();
    for (i, byte) in heap.payload_mut(p)[..40].iter_mut().enumerate() {
      *byte = i as u8;
    }
    // Pins the successor so growth has to move.
    let _pin = heap.allocate(8).unwrap();

    let q = heap.resize(Some(p), 500).unwrap().unwrap();
    assert_ne!(p, q);
    assert!(heap.payload_size(q) >= 500);
    for (i, byte) in heap.payload(q)[..40].iter().enumerate() {
      assert_eq!(i as u8, *byte);
    }
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_resize_grows_into_free_successor() {
    let mut heap = arena_heap(1 << 16);

    let p = heap.allocate(40).unwrap();
    heap.payload_mut(p)[..4].copy_from_slice(b"abcd");
    let bounds = heap.bounds();

    let q = heap.resize(Some(p), 400).unwrap().unwrap();
    assert_eq!(p, q);
    assert_eq!(b"abcd", &heap.payload(q)[..4]);
    assert_eq!(bounds, heap.bounds());
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_resize_shrinks_in_place() {
    let mut heap = arena_heap(1 << 16);

    let p = heap.allocate(400).unwrap();
    let _pin = heap.allocate(8).unwrap();
    heap.payload_mut(p)[..8].copy_from_slice(b"12345678");

    let q = heap.resize(Some(p), 20).unwrap().unwrap();
    assert_eq!(p, q);
    assert_eq!(24, heap.payload_size(q));
    assert_eq!(b"12345678", &heap.payload(q)[..8]);

    // The trimmed tail is a free block of its own.
    let free = free_blocks(&heap);
    assert_eq!(q.offset() + 32, free[0].offset);
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_resize_null_allocates() {
    let mut heap = arena_heap(1 << 16);
    let mut twin = arena_heap(1 << 16);

    let p = heap.resize(None, 72).unwrap().unwrap();
    let q = twin.allocate(72).unwrap();
    assert_eq!(q, p);
    assert_eq!(
      twin.blocks().collect::<Vec<_>>(),
      heap.blocks().collect::<Vec<_>>()
    );

    assert_eq!(
      Err(AllocError::InvalidUsage(UsageError::ZeroSize)),
      heap.resize(None, 0)
    );
  }

  #[test]
  fn test_resize_zero_frees() {
    let mut heap = arena_heap(1 << 16);

    let p = heap.allocate(64).unwrap();
    assert_eq!(Ok(None), heap.resize(Some(p), 0));
    assert_eq!(0, heap.allocated_bytes());
    assert_eq!(CHUNK, heap.free_bytes());
  }

  #[test]
  fn test_resize_zero_frees_when_exhausted() {
    let mut heap = arena_heap(2 * DSIZE + CHUNK);

    let p = heap.allocate(CHUNK - OVERHEAD).unwrap();
    assert!(heap.allocate(8).unwrap_err().is_out_of_memory());

    assert_eq!(Ok(None), heap.resize(Some(p), 0));
    assert_eq!(CHUNK, heap.free_bytes());
  }

  #[test]
  fn test_resize_failure_keeps_original() {
    let mut heap = arena_heap(2 * DSIZE + CHUNK);

    let p = heap.allocate(100).unwrap();
    let _pin = heap.allocate(100).unwrap();
    heap.payload_mut(p)[..3].copy_from_slice(b"xyz");

    let err = heap.resize(Some(p), 2 * CHUNK).unwrap_err();
    assert!(err.is_out_of_memory());
    assert_eq!(b"xyz", &heap.payload(p)[..3]);
    assert!(heap.blocks().any(|b| b.offset == p.offset() && b.allocated));
    assert_eq!(Ok(()), heap.check());
  }

  #[test]
  fn test_payload_at() {
    let mut heap = arena_heap(1 << 16);
    let p = heap.allocate(10).unwrap();
    let ptr = heap.as_mut_ptr(p);

    assert_eq!(Some(p), heap.payload_at(ptr));
    assert_eq!(None, heap.payload_at(ptr.wrapping_add(1)));
    assert_eq!(None, heap.payload_at(std::ptr::null()));
  }

  #[test]
  fn test_accounting() {
    let mut heap = arena_heap(1 << 16);

    let a = heap.allocate(100).unwrap();
    let b = heap.allocate(1).unwrap();
    assert_eq!(112 + 16, heap.allocated_bytes());
    assert_eq!(CHUNK - 128, heap.free_bytes());

    heap.deallocate(a);
    heap.deallocate(b);
    assert_eq!(0, heap.allocated_bytes());
    assert_eq!(CHUNK, heap.free_bytes());
  }
}
