use std::ptr::NonNull;

use crate::AllocError;

/// The four-operation contract every allocation strategy provides.
///
/// [`PageAllocator`](crate::PageAllocator) maps fresh pages for every call.
/// A pooled strategy would implement the same trait, so code written against
/// `RawAllocator` does not change when the strategy does.
///
/// A zero-byte request yields `Ok(None)`, and [`RawAllocator::free`] accepts
/// that `None` back as a no-op.
pub trait RawAllocator {
  /// Returns a pointer to at least `size` writable bytes, or `Ok(None)` when
  /// `size` is zero.
  fn allocate(
    &self,
    size: usize,
  ) -> Result<Option<NonNull<u8>>, AllocError>;

  /// Like [`RawAllocator::allocate`] for `count * element_size` bytes, all of
  /// which read as zero.
  fn allocate_zeroed(
    &self,
    count: usize,
    element_size: usize,
  ) -> Result<Option<NonNull<u8>>, AllocError>;

  /// Grows the allocation behind `ptr` for a request of `new_size` bytes,
  /// keeping the existing contents.
  ///
  /// Implementations may keep `ptr` when it already has room by their own
  /// measure; [`PageAllocator`](crate::PageAllocator) compares against the
  /// mapped capacity, header included, so callers needing `new_size` usable
  /// bytes use [`PageAllocator::reallocate`](crate::PageAllocator::reallocate).
  ///
  /// On error `ptr` is left untouched and still owned by the caller.
  ///
  /// # Safety
  ///
  /// `ptr` must come from this allocator and not have been freed. When a
  /// different pointer is returned, `ptr` is freed and must not be used again.
  unsafe fn resize(
    &self,
    ptr: NonNull<u8>,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError>;

  /// Gives the allocation back. `None` does nothing.
  ///
  /// # Safety
  ///
  /// `ptr` must come from this allocator and not have been freed already.
  unsafe fn free(
    &self,
    ptr: Option<NonNull<u8>>,
  );
}
