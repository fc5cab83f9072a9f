/// Why the memory region refused to grow.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionError {
  #[error("region exhausted: requested {requested} bytes, {available} available")]
  Exhausted { requested: usize, available: usize },
  #[error("size computation for a {requested} byte request overflowed")]
  Overflow { requested: usize },
  #[error("program break moved by a foreign caller (expected {expected:#x}, found {found:#x})")]
  NonContiguous { expected: usize, found: usize },
  #[error("sbrk failed with errno {0}")]
  Os(i32),
}

/// Calls the caller should not have made.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsageError {
  #[error("zero-size allocation")]
  ZeroSize,
  #[error("alignment {0} exceeds the heap alignment")]
  BadAlignment(usize),
  #[error("pointer {0:#x} does not belong to this heap")]
  ForeignPointer(usize),
  #[error("invalid configuration: {0}")]
  InvalidConfig(#[from] ConfigError),
}

/// Errors returned by the heap operations.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
  #[error("out of memory: {0}")]
  OutOfMemory(#[from] RegionError),
  #[error("invalid usage: {0}")]
  InvalidUsage(#[from] UsageError),
}

impl AllocError {
  pub fn is_out_of_memory(&self) -> bool {
    matches!(self, AllocError::OutOfMemory(_))
  }
}

#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
  #[error("chunk size must be non-zero")]
  ZeroChunkSize,
  #[error("chunk size {0} does not fit in a boundary tag")]
  ChunkTooLarge(usize),
  #[error("maximum heap size {0} does not fit in a boundary tag")]
  HeapTooLarge(usize),
}
