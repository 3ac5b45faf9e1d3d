//! Behavioral contract of `PageAllocator`, driven through `RawAllocator`.
//!
//! Custom page sources stand in for conditions the OS rarely produces on
//! demand: dirty pages and refused mappings.

use std::{cell::Cell, io, ptr::NonNull};

use pagealloc::{AllocError, Config, HEADER_SIZE, Mmap, PageAllocator, PageSource, RawAllocator};
use test_log::test;

/// Fill a buffer with a pattern derived from its index.
fn fill_pattern(
  ptr: NonNull<u8>,
  size: usize,
) {
  for i in 0..size {
    unsafe { *ptr.as_ptr().add(i) = (i.wrapping_mul(0x9E37_79B9) >> 7) as u8 };
  }
}

fn check_pattern(
  ptr: NonNull<u8>,
  size: usize,
) -> bool {
  (0..size).all(|i| unsafe { *ptr.as_ptr().add(i) } == (i.wrapping_mul(0x9E37_79B9) >> 7) as u8)
}

/// Hands out mmap'd pages pre-filled with garbage.
struct DirtyPages;

unsafe impl PageSource for DirtyPages {
  fn page_size(&self) -> usize {
    Mmap.page_size()
  }

  fn map(
    &self,
    len: usize,
  ) -> io::Result<NonNull<u8>> {
    let region = Mmap.map(len)?;
    unsafe { region.as_ptr().write_bytes(0xAA, len) };
    Ok(region)
  }

  unsafe fn unmap(
    &self,
    ptr: NonNull<u8>,
    len: usize,
  ) -> io::Result<()> {
    unsafe { Mmap.unmap(ptr, len) }
  }
}

/// Allows a fixed number of mappings, then refuses with ENOMEM.
struct Budget {
  remaining: Cell<usize>,
  live: Cell<usize>,
}

impl Budget {
  fn new(maps: usize) -> Self {
    Self {
      remaining: Cell::new(maps),
      live: Cell::new(0),
    }
  }
}

unsafe impl PageSource for Budget {
  fn page_size(&self) -> usize {
    Mmap.page_size()
  }

  fn map(
    &self,
    len: usize,
  ) -> io::Result<NonNull<u8>> {
    if self.remaining.get() == 0 {
      return Err(io::Error::from_raw_os_error(libc::ENOMEM));
    }

    self.remaining.set(self.remaining.get() - 1);
    self.live.set(self.live.get() + 1);
    Mmap.map(len)
  }

  unsafe fn unmap(
    &self,
    ptr: NonNull<u8>,
    len: usize,
  ) -> io::Result<()> {
    self.live.set(self.live.get() - 1);
    unsafe { Mmap.unmap(ptr, len) }
  }
}

#[test]
fn single_byte_allocation_keeps_header_intact() {
  let allocator = PageAllocator::new();
  let ptr = allocator.allocate(1).unwrap().expect("one byte is a real allocation");

  unsafe {
    *ptr.as_ptr() = 0xFF;
    assert_eq!(*ptr.as_ptr(), 0xFF);

    assert_eq!(allocator.page_count(ptr), 1);
    assert_eq!(allocator.capacity(ptr), pagealloc::page_size());

    allocator.free(Some(ptr));
  }
}

#[test]
fn large_array_is_fully_usable() {
  const LEN: usize = 10_000_000;

  let allocator = PageAllocator::new();
  let ptr = allocator
    .allocate(LEN * size_of::<u32>())
    .unwrap()
    .unwrap()
    .cast::<u32>();

  unsafe {
    for i in 0..LEN {
      ptr.add(i).write(i as u32);
    }

    for i in 0..LEN {
      assert_eq!(ptr.add(i).read(), i as u32);
    }

    allocator.free(Some(ptr.cast()));
  }
}

#[test]
#[ignore = "touches 400 MB of memory"]
fn hundred_million_ints_are_fully_usable() {
  const LEN: usize = 100_000_000;

  let allocator = PageAllocator::new();
  let ptr = allocator
    .allocate(LEN * size_of::<i32>())
    .unwrap()
    .unwrap()
    .cast::<i32>();

  unsafe {
    for i in 0..LEN {
      ptr.add(i).write(i as i32);
    }

    for i in 0..LEN {
      assert_eq!(ptr.add(i).read(), i as i32);
    }

    allocator.free(Some(ptr.cast()));
  }
}

#[test]
fn zeroed_allocation_clears_dirty_pages() {
  let allocator = PageAllocator::with_config(DirtyPages, Config::new());

  for (count, element_size) in [(1, 1), (100, 8), (3, 4096), (4096, 3)] {
    let ptr = allocator.allocate_zeroed(count, element_size).unwrap().unwrap();
    let size = count * element_size;

    unsafe {
      assert!((0..size).all(|i| *ptr.as_ptr().add(i) == 0));

      // Past the request the dirty fill is left alone.
      if size < allocator.capacity(ptr) - HEADER_SIZE {
        assert_eq!(*ptr.as_ptr().add(size), 0xAA);
      }

      allocator.free(Some(ptr));
    }
  }
}

#[test]
fn zeroed_allocation_rejects_overflow() {
  let allocator = PageAllocator::with_config(Budget::new(usize::MAX), Config::new());

  let err = allocator.allocate_zeroed(usize::MAX / 2 + 1, 2).unwrap_err();

  assert!(matches!(err, AllocError::Overflow { element_size: 2, .. }));
  assert_eq!(err.errno(), libc::EINVAL);
  assert_eq!(allocator.source().live.get(), 0);
}

#[test]
fn resize_below_capacity_keeps_pointer_and_content() {
  let allocator = PageAllocator::new();
  let ptr = allocator.allocate(5000).unwrap().unwrap();

  fill_pattern(ptr, 5000);

  unsafe {
    let capacity = allocator.capacity(ptr);

    assert_eq!(allocator.resize(ptr, 10).unwrap(), ptr);
    assert_eq!(allocator.resize(ptr, capacity - 1).unwrap(), ptr);
    assert!(check_pattern(ptr, 5000));
    assert_eq!(allocator.capacity(ptr), capacity);

    allocator.free(Some(ptr));
  }
}

#[test]
fn resize_growth_preserves_prefix() {
  let allocator = PageAllocator::new();
  let mut ptr = allocator.allocate(64).unwrap().unwrap();

  unsafe {
    for _ in 0..6 {
      let capacity = allocator.capacity(ptr);
      let usable = capacity - HEADER_SIZE;

      fill_pattern(ptr, usable);

      let grown = allocator.resize(ptr, capacity * 2).unwrap();

      assert!(check_pattern(grown, usable));
      assert!(allocator.capacity(grown) >= capacity * 2 + HEADER_SIZE);

      ptr = grown;
    }

    allocator.free(Some(ptr));
  }
}

#[test]
fn failed_resize_leaves_original_allocation_alive() {
  let allocator = PageAllocator::with_config(Budget::new(1), Config::new());
  let ptr = allocator.allocate(128).unwrap().unwrap();

  fill_pattern(ptr, 128);

  unsafe {
    let capacity = allocator.capacity(ptr);
    let err = allocator.resize(ptr, capacity * 4).unwrap_err();

    assert!(matches!(err, AllocError::MapFailed { .. }));
    assert_eq!(err.errno(), libc::ENOMEM);
    assert_eq!(allocator.source().live.get(), 1);
    assert!(check_pattern(ptr, 128));

    allocator.free(Some(ptr));
  }

  assert_eq!(allocator.source().live.get(), 0);
}

#[test]
fn failed_allocation_maps_nothing() {
  let allocator = PageAllocator::with_config(Budget::new(0), Config::new());

  assert!(matches!(
    allocator.allocate(10),
    Err(AllocError::MapFailed { len, .. }) if len == pagealloc::page_size()
  ));
  assert_eq!(allocator.source().live.get(), 0);
}

#[test]
fn every_allocation_is_its_own_mapping() {
  let allocator = PageAllocator::with_config(Budget::new(usize::MAX), Config::new());

  let ptrs: Vec<_> = (1..=16).map(|i| allocator.allocate(i * 100).unwrap().unwrap()).collect();

  assert_eq!(allocator.source().live.get(), 16);

  for &ptr in &ptrs {
    unsafe { allocator.free(Some(ptr)) };
  }

  assert_eq!(allocator.source().live.get(), 0);
}

#[test]
fn strategy_is_usable_through_the_trait() {
  fn round_trip(allocator: &dyn RawAllocator) {
    let ptr = allocator.allocate(32).unwrap().unwrap();
    fill_pattern(ptr, 32);

    unsafe {
      let ptr = allocator.resize(ptr, 1 << 20).unwrap();
      assert!(check_pattern(ptr, 32));
      allocator.free(Some(ptr));
    }
  }

  round_trip(&PageAllocator::new());
}
