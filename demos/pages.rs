use std::{fs, io::Read};

use pagealloc::{HEADER_SIZE, PageAllocator, RawAllocator, page_size};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect the mappings with `pmap`, `htop` or
/// `/proc/<pid>/maps` between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the program size and resident set reported by `/proc/self/statm`.
fn print_memory(label: &str) {
  let statm = fs::read_to_string("/proc/self/statm").unwrap_or_default();
  let mut fields = statm.split_ascii_whitespace();

  println!(
    "[{}] PID = {}, size = {} pages, resident = {} pages",
    label,
    std::process::id(),
    fields.next().unwrap_or("?"),
    fields.next().unwrap_or("?"),
  );
}

fn main() {
  env_logger::init();

  let allocator = PageAllocator::new();

  println!("page size = {} bytes, header = {} bytes", page_size(), HEADER_SIZE);
  print_memory("start");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) A single byte still costs a whole page.
  // --------------------------------------------------------------------
  let byte = allocator.allocate(1).unwrap().unwrap();
  unsafe {
    byte.as_ptr().write(0x42);
    println!(
      "\n[1] allocate(1) -> {:?}, {} page(s), value = 0x{:X}",
      byte,
      allocator.page_count(byte),
      byte.as_ptr().read()
    );
  }
  print_memory("after 1 byte");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) A request that exactly fills one page together with its header.
  // --------------------------------------------------------------------
  let exact = allocator.allocate(page_size() - HEADER_SIZE).unwrap().unwrap();
  println!(
    "\n[2] allocate(page_size - header) -> {:?}, {} page(s)",
    exact,
    unsafe { allocator.page_count(exact) }
  );
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Zeroed array of 1 Mi u32.
  // --------------------------------------------------------------------
  let zeroed = allocator
    .allocate_zeroed(1 << 20, size_of::<u32>())
    .unwrap()
    .unwrap();
  println!(
    "\n[3] allocate_zeroed(1 Mi, 4) -> {:?}, {} page(s)",
    zeroed,
    unsafe { allocator.page_count(zeroed) }
  );
  print_memory("after zeroed array");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Resizing within the mapped capacity keeps the pointer; beyond it the
  //    payload moves to a fresh mapping.
  // --------------------------------------------------------------------
  unsafe {
    let same = allocator.resize(byte, 100).unwrap();
    println!("\n[4] resize(byte, 100) -> {:?} (same = {})", same, same == byte);

    let moved = allocator.resize(same, 4 * page_size()).unwrap();
    println!(
      "[4] resize(byte, 4 pages) -> {:?}, {} page(s), value = 0x{:X}",
      moved,
      allocator.page_count(moved),
      moved.as_ptr().read()
    );

    block_until_enter_pressed();

    // ------------------------------------------------------------------
    // 5) Every free unmaps immediately.
    // ------------------------------------------------------------------
    allocator.free(Some(moved));
    allocator.free(Some(exact));
    allocator.free(Some(zeroed));
  }

  print_memory("after free");
  println!("\n[5] End of example. All mappings have been returned to the OS.");
}
