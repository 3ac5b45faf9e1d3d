//! C ABI over a process-wide [`PageAllocator`].
//!
//! Gated behind `features = ["ffi"]`. Every function returns null on failure
//! and reports the cause through `errno`, but only when `errno` is still zero
//! so an earlier error set by the caller is not clobbered.

use std::ptr::{self, NonNull};

use libc::{c_int, c_void};

use crate::{AllocError, PageAllocator, RawAllocator};

static ALLOCATOR: PageAllocator = PageAllocator::new();

#[cfg(any(target_os = "linux", target_os = "emscripten"))]
unsafe fn errno_location() -> *mut c_int {
  unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
unsafe fn errno_location() -> *mut c_int {
  unsafe { libc::__errno() }
}

#[cfg(any(target_vendor = "apple", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut c_int {
  unsafe { libc::__error() }
}

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
unsafe fn errno_location() -> *mut c_int {
  unsafe { libc::___errno() }
}

#[cfg(not(any(
  target_os = "linux",
  target_os = "emscripten",
  target_os = "android",
  target_os = "netbsd",
  target_os = "openbsd",
  target_vendor = "apple",
  target_os = "freebsd",
  target_os = "solaris",
  target_os = "illumos",
)))]
compile_error!("the `ffi` feature does not know how to reach errno on this target");

fn report(err: &AllocError) {
  unsafe {
    let errno = errno_location();

    if *errno == 0 {
      *errno = err.errno();
    }
  }
}

fn into_raw(result: Result<Option<NonNull<u8>>, AllocError>) -> *mut c_void {
  match result {
    Ok(Some(ptr)) => ptr.as_ptr() as *mut c_void,
    Ok(None) => ptr::null_mut(),
    Err(err) => {
      report(&err);
      ptr::null_mut()
    }
  }
}

/// `malloc(3)`: null for a zero-byte request.
#[unsafe(no_mangle)]
pub extern "C" fn pagealloc_malloc(size: usize) -> *mut c_void {
  into_raw(ALLOCATOR.allocate(size))
}

/// `calloc(3)`: an overflowing `count * size` fails with `EINVAL`.
#[unsafe(no_mangle)]
pub extern "C" fn pagealloc_calloc(
  count: usize,
  size: usize,
) -> *mut c_void {
  into_raw(ALLOCATOR.allocate_zeroed(count, size))
}

/// `realloc(3)`: a null `ptr` allocates. On failure `ptr` stays valid.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagealloc_realloc(
  ptr: *mut c_void,
  size: usize,
) -> *mut c_void {
  let Some(ptr) = NonNull::new(ptr as *mut u8) else {
    return pagealloc_malloc(size);
  };

  match unsafe { ALLOCATOR.reallocate(ptr, size) } {
    Ok(ptr) => ptr.as_ptr() as *mut c_void,
    Err(err) => {
      report(&err);
      ptr::null_mut()
    }
  }
}

/// `free(3)`: null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pagealloc_free(ptr: *mut c_void) {
  unsafe { ALLOCATOR.free(NonNull::new(ptr as *mut u8)) }
}
