use crate::align::even_words;
use crate::block::MAX_BLOCK_SIZE;
use crate::error::ConfigError;

/// Default heap extension, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 12;

/// Default capacity of an [`ArenaRegion`](crate::ArenaRegion).
pub const DEFAULT_MAX_HEAP: usize = 20 * (1 << 20);

/// Tunables for a [`Heap`](crate::Heap).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
  /// Minimum number of bytes requested from the region whenever the heap
  /// grows. Rounded up to an even word count.
  pub chunk_size: usize,
  /// Capacity reserved by regions that need one up front.
  pub max_heap: usize,
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

impl HeapConfig {
  pub const DEFAULT: Self = Self {
    chunk_size: DEFAULT_CHUNK_SIZE,
    max_heap: DEFAULT_MAX_HEAP,
  };

  pub fn with_chunk_size(
    mut self,
    chunk_size: usize,
  ) -> Self {
    self.chunk_size = chunk_size;
    self
  }

  pub fn with_max_heap(
    mut self,
    max_heap: usize,
  ) -> Self {
    self.max_heap = max_heap;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.chunk_size == 0 {
      return Err(ConfigError::ZeroChunkSize);
    }
    if self.chunk_size > MAX_BLOCK_SIZE {
      return Err(ConfigError::ChunkTooLarge(self.chunk_size));
    }
    if self.max_heap > MAX_BLOCK_SIZE {
      return Err(ConfigError::HeapTooLarge(self.max_heap));
    }
    Ok(())
  }

  /// The chunk size rounded up to an even number of words.
  pub(crate) fn chunk_bytes(&self) -> usize {
    even_words(self.chunk_size).unwrap_or(MAX_BLOCK_SIZE)
  }
}
