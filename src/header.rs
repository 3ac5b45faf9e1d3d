use std::{mem, ptr::NonNull};

/// Metadata stored at the start of every mapping, directly in front of the
/// payload handed to the caller.
///
/// ```text
///   ┌──────────────┬──────────────┬──────────────────────────────┐
///   │  page_count  │  page_size   │  payload ...                 │
///   └──────────────┴──────────────┴──────────────────────────────┘
///   ▲                             ▲
///   └── mapping start             └── pointer returned to caller
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AllocationHeader {
  pub page_count: usize,
  /// Page size at allocation time; the free path never queries it again.
  pub page_size: usize,
}

/// Bytes taken by the header in front of every payload.
pub const HEADER_SIZE: usize = mem::size_of::<AllocationHeader>();

/// Alignment of every payload pointer.
///
/// Mappings start on a page boundary and the header is a power of two, so
/// the payload inherits the header size as its alignment.
pub const PAYLOAD_ALIGN: usize = HEADER_SIZE;

const _: () = assert!(HEADER_SIZE.is_power_of_two());

impl AllocationHeader {
  pub fn new(
    page_count: usize,
    page_size: usize,
  ) -> Self {
    Self {
      page_count,
      page_size,
    }
  }

  /// Bytes reserved from the OS for this allocation, header included.
  pub fn mapped_len(&self) -> usize {
    self.page_count * self.page_size
  }

  /// Bytes the caller may use behind the payload pointer.
  pub fn payload_capacity(&self) -> usize {
    self.mapped_len() - HEADER_SIZE
  }

  /// Writes `self` at `region` and returns the payload pointer.
  ///
  /// # Safety
  ///
  /// `region` must be valid for writes of `self.mapped_len()` bytes and
  /// aligned for `AllocationHeader`.
  pub unsafe fn write(
    self,
    region: NonNull<u8>,
  ) -> NonNull<u8> {
    unsafe {
      region.cast::<AllocationHeader>().write(self);
      region.add(HEADER_SIZE)
    }
  }

  /// Recovers the mapping start and its header from a payload pointer.
  ///
  /// This is the only place a payload pointer is turned back into allocator
  /// metadata. Nothing is validated: the header is trusted as written.
  ///
  /// # Safety
  ///
  /// `payload` must have been returned by [`AllocationHeader::write`], its
  /// mapping must still be live, and the header bytes in front of it must not
  /// have been overwritten.
  pub unsafe fn read(payload: NonNull<u8>) -> (NonNull<u8>, AllocationHeader) {
    unsafe {
      let region = payload.sub(HEADER_SIZE);
      (region, region.cast::<AllocationHeader>().read())
    }
  }
}
