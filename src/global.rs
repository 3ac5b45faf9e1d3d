use std::{
  alloc::{GlobalAlloc, Layout},
  ptr::{self, NonNull},
};

use crate::{AllocError, PageAllocator, PageSource, RawAllocator, header::PAYLOAD_ALIGN};

fn into_raw(result: Result<Option<NonNull<u8>>, AllocError>) -> *mut u8 {
  match result {
    Ok(Some(ptr)) => ptr.as_ptr(),
    _ => ptr::null_mut(),
  }
}

/// Layouts aligned beyond [`PAYLOAD_ALIGN`](crate::PAYLOAD_ALIGN) are refused
/// with a null pointer; payloads only get the alignment the header leaves
/// them.
unsafe impl<S: PageSource> GlobalAlloc for PageAllocator<S> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > PAYLOAD_ALIGN {
      return ptr::null_mut();
    }

    into_raw(self.allocate(layout.size()))
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > PAYLOAD_ALIGN {
      return ptr::null_mut();
    }

    into_raw(self.allocate_zeroed(1, layout.size()))
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    _layout: Layout,
  ) {
    unsafe { self.free(NonNull::new(ptr)) }
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    match NonNull::new(ptr) {
      Some(ptr) => match unsafe { self.reallocate(ptr, new_size) } {
        Ok(ptr) => ptr.as_ptr(),
        Err(_) => ptr::null_mut(),
      },
      None => unsafe { self.alloc(Layout::from_size_align_unchecked(new_size, layout.align())) },
    }
  }
}
