/// How a request plus its header is turned into a whole number of pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rounding {
  /// The smallest page count that fits the header and the payload.
  #[default]
  Exact,
  /// `size_with_header / page_size + 1`.
  ///
  /// Maps one page more than needed whenever the request plus header is an
  /// exact multiple of the page size. Kept for callers that depend on the
  /// historical page counts.
  ExtraPage,
}

impl Rounding {
  /// Number of `page_size` pages needed for `size_with_header` bytes.
  pub fn page_count(
    self,
    size_with_header: usize,
    page_size: usize,
  ) -> usize {
    match self {
      Rounding::Exact => size_with_header.div_ceil(page_size),
      Rounding::ExtraPage => size_with_header / page_size + 1,
    }
  }
}

/// Tunables of a [`PageAllocator`](crate::PageAllocator).
///
/// ```rust
/// use pagealloc::{Config, Rounding};
///
/// let config = Config::new().rounding(Rounding::ExtraPage);
/// assert_eq!(config.rounding, Rounding::ExtraPage);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
  pub rounding: Rounding,
}

impl Config {
  pub const fn new() -> Self {
    Self {
      rounding: Rounding::Exact,
    }
  }

  pub const fn rounding(
    mut self,
    rounding: Rounding,
  ) -> Self {
    self.rounding = rounding;
    self
  }
}
