//! # pagealloc - A Page-Mapping Memory Allocator
//!
//! This crate provides the simplest allocator that gives memory back to the
//! OS: every request gets its own anonymous `mmap(2)` mapping and every free
//! `munmap(2)`s it again. There is no free list, no arena and no size class.
//!
//! ## Overview
//!
//! ```text
//!   Page Allocator Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                     PROCESS ADDRESS SPACE                            │
//!   │                                                                      │
//!   │   ┌──────────┐        ┌────────────────────┐        ┌──────────┐     │
//!   │   │   A1     │        │        A2          │        │   A3     │     │
//!   │   │ 1 page   │  ...   │     3 pages        │  ...   │ 1 page   │     │
//!   │   └──────────┘        └────────────────────┘        └──────────┘     │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Each allocation is an independent mapping.
//!   Freeing A2 returns its 3 pages to the OS immediately.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   pagealloc
//!   ├── config  - Page rounding policy (Config, Rounding)
//!   ├── error   - AllocError
//!   ├── header  - In-band allocation header (internal)
//!   ├── page    - Page size cache and page sources (PageSource, Mmap)
//!   ├── raw     - The four-operation contract (RawAllocator)
//!   ├── pages   - PageAllocator implementation
//!   ├── global  - GlobalAlloc for PageAllocator
//!   └── ffi     - C ABI (feature "ffi")
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use pagealloc::{PageAllocator, RawAllocator};
//!
//! let allocator = PageAllocator::new();
//!
//! let ptr = allocator.allocate(100).unwrap().unwrap();
//!
//! unsafe {
//!     ptr.as_ptr().write_bytes(7, 100);
//!     assert_eq!(*ptr.as_ptr().add(99), 7);
//!
//!     allocator.free(Some(ptr));
//! }
//! ```
//!
//! ## How It Works
//!
//! The request plus a small header is rounded up to whole pages and mapped.
//! The header records how many pages were mapped and how large a page was,
//! so `free` can unmap the exact range from nothing but the pointer:
//!
//! ```text
//!   Single Allocation (allocate(100), 4 KiB pages):
//!   ┌───────────────────────┬──────────────────────────────────────────┐
//!   │   AllocationHeader    │              Payload                     │
//!   │  ┌─────────────────┐  │                                          │
//!   │  │ page_count: 1   │  │  100 bytes requested,                    │
//!   │  │ page_size: 4096 │  │  4096 - 16 bytes usable                  │
//!   │  └─────────────────┘  │                                          │
//!   │      16 bytes         │                                          │
//!   └───────────────────────┴──────────────────────────────────────────┘
//!   ▲                       ▲
//!   └── page boundary       └── Pointer returned to user
//! ```
//!
//! Resizing below the mapped capacity returns the same pointer. Growing maps
//! a new region, copies the payload and only then unmaps the old one, so a
//! failed grow leaves the original allocation intact.
//!
//! ## Limitations
//!
//! - **One mapping per allocation**: small requests still cost a full page
//! - **No reuse**: freed address ranges go back to the OS, never to a cache
//! - **Alignment**: payloads are aligned to [`PAYLOAD_ALIGN`] and no further
//! - **Unix-only**: requires `libc` and `mmap`
//!
//! ## Safety
//!
//! `free`, `resize` and the inspection methods trust the header in front of
//! the pointer they are given. Passing a pointer that did not come from the
//! same allocator, or whose header the caller overwrote, is undefined
//! behavior and is not detected.

mod config;
mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
mod global;
mod header;
mod page;
mod pages;
mod raw;

pub use config::{Config, Rounding};
pub use error::AllocError;
pub use header::{HEADER_SIZE, PAYLOAD_ALIGN};
pub use page::{DEFAULT_PAGE_SIZE, Mmap, PageSource, page_size};
pub use pages::PageAllocator;
pub use raw::RawAllocator;
