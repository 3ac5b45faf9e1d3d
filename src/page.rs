use std::{
  io,
  ptr::{self, NonNull},
  sync::OnceLock,
};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void};

/// Page size assumed when the OS refuses to report one.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// Returns the system page size.
///
/// Queried with `sysconf(_SC_PAGESIZE)` the first time it is needed and
/// cached for the rest of the process. Falls back to [`DEFAULT_PAGE_SIZE`]
/// if the query fails.
pub fn page_size() -> usize {
  *PAGE_SIZE.get_or_init(|| {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if size <= 0 {
      DEFAULT_PAGE_SIZE
    } else {
      size as usize
    }
  })
}

/// Where an allocator gets its pages from.
///
/// [`Mmap`] is the only production source. Other implementations exist to
/// put the allocator under conditions the OS rarely produces on demand, such
/// as a failing or dirty mapping.
///
/// # Safety
///
/// The allocator trusts an implementation without checking it:
///
/// - [`PageSource::page_size`] must return a non-zero power of two, and the
///   same value on every call.
/// - A pointer returned by [`PageSource::map`] must be valid for reads and
///   writes of `len` bytes until it is passed to [`PageSource::unmap`], and
///   aligned to at least [`PAYLOAD_ALIGN`](crate::PAYLOAD_ALIGN).
///
/// Implementing it without `unsafe` is rejected:
///
/// ```compile_fail,E0200
/// use std::{io, ptr::NonNull};
/// use pagealloc::PageSource;
///
/// struct Dangling;
///
/// impl PageSource for Dangling {
///     fn page_size(&self) -> usize {
///         0
///     }
///
///     fn map(&self, _len: usize) -> io::Result<NonNull<u8>> {
///         Ok(NonNull::dangling())
///     }
///
///     unsafe fn unmap(&self, _ptr: NonNull<u8>, _len: usize) -> io::Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub unsafe trait PageSource {
  /// Size in bytes of one page handed out by [`PageSource::map`].
  fn page_size(&self) -> usize;

  /// Reserves `len` bytes of readable and writable memory.
  ///
  /// `len` is always a non-zero multiple of [`PageSource::page_size`]. The
  /// returned pointer is page aligned.
  fn map(
    &self,
    len: usize,
  ) -> io::Result<NonNull<u8>>;

  /// Releases a range previously returned by [`PageSource::map`].
  ///
  /// # Safety
  ///
  /// `ptr` and `len` must describe exactly one earlier mapping, and nothing
  /// may access that range afterwards.
  unsafe fn unmap(
    &self,
    ptr: NonNull<u8>,
    len: usize,
  ) -> io::Result<()>;
}

/// Anonymous private mappings straight from `mmap(2)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mmap;

unsafe impl PageSource for Mmap {
  fn page_size(&self) -> usize {
    page_size()
  }

  fn map(
    &self,
    len: usize,
  ) -> io::Result<NonNull<u8>> {
    let addr = unsafe {
      libc::mmap(
        ptr::null_mut(),
        len,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if addr == MAP_FAILED {
      return Err(io::Error::last_os_error());
    }

    NonNull::new(addr as *mut u8).ok_or_else(|| io::Error::from(io::ErrorKind::OutOfMemory))
  }

  unsafe fn unmap(
    &self,
    ptr: NonNull<u8>,
    len: usize,
  ) -> io::Result<()> {
    if unsafe { libc::munmap(ptr.as_ptr() as *mut c_void, len) } == -1 {
      return Err(io::Error::last_os_error());
    }

    Ok(())
  }
}
