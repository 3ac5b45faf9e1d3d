use std::ptr::{self, NonNull};

use log::{error, trace};

use crate::{
  AllocError, Config, Mmap, PageSource, RawAllocator,
  header::{AllocationHeader, HEADER_SIZE},
};

/// Allocator that gives every request its own mapping.
///
/// Nothing is pooled: `allocate` asks the [`PageSource`] for new pages and
/// `free` hands them straight back. The page count and page size are kept in
/// a header in front of the payload, so freeing needs nothing but the
/// pointer.
///
/// The allocator holds no mutable state of its own. Calls on unrelated
/// allocations never touch the same memory; calls on the same allocation
/// must be serialized by the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageAllocator<S = Mmap> {
  source: S,
  config: Config,
}

impl PageAllocator<Mmap> {
  pub const fn new() -> Self {
    Self {
      source: Mmap,
      config: Config::new(),
    }
  }
}

impl<S: PageSource> PageAllocator<S> {
  pub const fn with_config(
    source: S,
    config: Config,
  ) -> Self {
    Self { source, config }
  }

  pub fn config(&self) -> Config {
    self.config
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Bytes mapped for the allocation behind `ptr`, header included.
  ///
  /// # Safety
  ///
  /// `ptr` must be a live allocation of this allocator.
  pub unsafe fn capacity(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { AllocationHeader::read(ptr).1.mapped_len() }
  }

  /// Pages mapped for the allocation behind `ptr`.
  ///
  /// # Safety
  ///
  /// `ptr` must be a live allocation of this allocator.
  pub unsafe fn page_count(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { AllocationHeader::read(ptr).1.page_count }
  }

  /// Bytes the caller may use behind `ptr`: the capacity minus the header.
  ///
  /// # Safety
  ///
  /// `ptr` must be a live allocation of this allocator.
  pub unsafe fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { AllocationHeader::read(ptr).1.payload_capacity() }
  }

  /// Like [`RawAllocator::resize`], but the returned pointer always has at
  /// least `new_size` usable bytes.
  ///
  /// `resize` keeps the pointer whenever `new_size` is below the mapped
  /// capacity, which counts the header; this moves instead when `new_size`
  /// lands in the last `HEADER_SIZE` bytes of that capacity.
  ///
  /// # Safety
  ///
  /// Same as [`RawAllocator::resize`].
  pub unsafe fn reallocate(
    &self,
    ptr: NonNull<u8>,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let header = unsafe { AllocationHeader::read(ptr).1 };

    if new_size <= header.payload_capacity() {
      return Ok(ptr);
    }

    unsafe { self.resize(ptr, new_size.max(header.mapped_len())) }
  }
}

impl<S: PageSource> RawAllocator for PageAllocator<S> {
  fn allocate(
    &self,
    size: usize,
  ) -> Result<Option<NonNull<u8>>, AllocError> {
    if size == 0 {
      return Ok(None);
    }

    let page_size = self.source.page_size();

    let size_with_header = size
      .checked_add(HEADER_SIZE)
      .ok_or(AllocError::SizeOverflow { size })?;

    let page_count = self.config.rounding.page_count(size_with_header, page_size);

    let len = page_count
      .checked_mul(page_size)
      .ok_or(AllocError::SizeOverflow { size })?;

    let region = self
      .source
      .map(len)
      .map_err(|source| AllocError::MapFailed { len, source })?;

    trace!("mapped {page_count} page(s) at {region:?} for {size} bytes");

    let payload = unsafe { AllocationHeader::new(page_count, page_size).write(region) };

    Ok(Some(payload))
  }

  fn allocate_zeroed(
    &self,
    count: usize,
    element_size: usize,
  ) -> Result<Option<NonNull<u8>>, AllocError> {
    let size = count.checked_mul(element_size).ok_or(AllocError::Overflow {
      count,
      element_size,
    })?;

    let payload = self.allocate(size)?;

    if let Some(payload) = payload {
      // The header is already written; only the caller's bytes are cleared.
      unsafe { ptr::write_bytes(payload.as_ptr(), 0, size) };
    }

    Ok(payload)
  }

  /// Keeps `ptr` whenever `new_size` is below the mapped capacity
  /// (`page_count * page_size`, header included). Only
  /// `capacity - HEADER_SIZE` bytes are usable behind the pointer, so a
  /// `new_size` in the last `HEADER_SIZE` bytes of the capacity is not fully
  /// backed; [`PageAllocator::reallocate`] covers that case.
  unsafe fn resize(
    &self,
    ptr: NonNull<u8>,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let (_, header) = unsafe { AllocationHeader::read(ptr) };
    let capacity = header.mapped_len();

    if new_size < capacity {
      trace!("{ptr:?} already maps {capacity} bytes, keeping it for {new_size}");
      return Ok(ptr);
    }

    // new_size >= capacity > 0, so a mapping is always requested.
    let Some(new_ptr) = self.allocate(new_size)? else {
      return Ok(ptr);
    };

    unsafe {
      ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), header.payload_capacity());
      self.free(Some(ptr));
    }

    trace!("moved {ptr:?} to {new_ptr:?} for {new_size} bytes");

    Ok(new_ptr)
  }

  unsafe fn free(
    &self,
    ptr: Option<NonNull<u8>>,
  ) {
    let Some(ptr) = ptr else {
      return;
    };

    let (region, header) = unsafe { AllocationHeader::read(ptr) };
    let len = header.mapped_len();

    match unsafe { self.source.unmap(region, len) } {
      Ok(()) => trace!("unmapped {} page(s) at {region:?}", header.page_count),
      Err(err) => error!("failed to unmap {len} bytes at {region:?}: {err}"),
    }
  }
}
