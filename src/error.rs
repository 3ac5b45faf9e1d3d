use std::{error, fmt, io};

/// Why an allocation request could not be served.
///
/// Failing to give memory back is not represented here: `free` logs it and
/// carries on.
#[derive(Debug)]
pub enum AllocError {
  /// `count * element_size` does not fit in `usize`.
  Overflow { count: usize, element_size: usize },
  /// The request plus header, rounded to whole pages, does not fit in `usize`.
  SizeOverflow { size: usize },
  /// The OS refused to map `len` bytes.
  MapFailed { len: usize, source: io::Error },
}

impl AllocError {
  /// The `errno` value a C caller would expect for this failure.
  pub fn errno(&self) -> i32 {
    match self {
      AllocError::Overflow { .. } => libc::EINVAL,
      AllocError::SizeOverflow { .. } => libc::ENOMEM,
      AllocError::MapFailed { source, .. } => source.raw_os_error().unwrap_or(libc::ENOMEM),
    }
  }
}

impl fmt::Display for AllocError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      AllocError::Overflow {
        count,
        element_size,
      } => write!(f, "{count} elements of {element_size} bytes overflow usize"),
      AllocError::SizeOverflow { size } => {
        write!(f, "request of {size} bytes is too large to map")
      }
      AllocError::MapFailed { len, source } => {
        write!(f, "failed to map {len} bytes: {source}")
      }
    }
  }
}

impl error::Error for AllocError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      AllocError::MapFailed { source, .. } => Some(source),
      _ => None,
    }
  }
}
