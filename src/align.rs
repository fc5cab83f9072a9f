/// Word size in bytes. Boundary tags are one word each.
pub const WSIZE: usize = 4;

/// Doubleword size in bytes, the heap's alignment unit.
pub const DSIZE: usize = 8;

/// Every payload handed out is aligned to this many bytes.
pub const ALIGNMENT: usize = DSIZE;

/// Rounds the given size up to the heap alignment (8 bytes).
///
/// # Examples
///
/// ```rust
/// use tagalloc::align;
///
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(1), 8);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Same as [`align!`] but returns `None` instead of wrapping on overflow.
pub const fn checked_align(value: usize) -> Option<usize> {
  match value.checked_add(ALIGNMENT - 1) {
    Some(v) => Some(v & !(ALIGNMENT - 1)),
    None => None,
  }
}

/// Rounds `bytes` up to an even number of words so the heap break stays
/// doubleword aligned.
pub const fn even_words(bytes: usize) -> Option<usize> {
  let words = bytes.div_ceil(WSIZE);
  let words = if words % 2 == 1 { words + 1 } else { words };
  words.checked_mul(WSIZE)
}
