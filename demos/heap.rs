use std::io::Read;

use tagalloc::{Heap, MemoryRegion, Payload, SbrkRegion};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `gdb`,
/// or just to follow how the program break moves as the heap grows.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    SbrkRegion::program_break(),
  );
}

/// Prints every block between the prologue and the epilogue.
fn print_blocks(heap: &Heap<SbrkRegion>) {
  let (start, end) = heap.bounds();
  println!("    heap {:#x}..{:#x} ({} bytes)", start, end, end - start);
  for block in heap.blocks() {
    println!(
      "    {:>6} {:>6} bytes  {}",
      block.offset,
      block.size,
      if block.allocated { "allocated" } else { "free" }
    );
  }
}

fn print_alloc(
  heap: &Heap<SbrkRegion>,
  label: &str,
  payload: Payload,
) {
  println!(
    "{} -> offset {}, address = {:?}, usable = {} bytes",
    label,
    payload.offset(),
    heap.as_mut_ptr(payload),
    heap.payload_size(payload),
  );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  env_logger::init();

  print_program_break("start");

  let mut heap = Heap::new(SbrkRegion::new())?;
  println!("\n[0] Heap initialized with {} bytes", heap.region().len());
  print_blocks(&heap);
  print_program_break("after init");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Two allocations carve the initial free block from the front.
  // --------------------------------------------------------------------
  let a = heap.allocate(100)?;
  let b = heap.allocate(200)?;
  println!("\n[1] Allocate 100 and 200 bytes");
  print_alloc(&heap, "    a", a);
  print_alloc(&heap, "    b", b);
  heap.payload_mut(a)[..4].copy_from_slice(&0xDEADBEEFu32.to_ne_bytes());
  print_blocks(&heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Free `a`, then ask for less: first fit reuses a's block.
  // --------------------------------------------------------------------
  heap.deallocate(a);
  let c = heap.allocate(50)?;
  println!("\n[2] Free a, allocate 50 bytes");
  print_alloc(&heap, "    c", c);
  println!(
    "    c == a? {}",
    if c == a {
      "Yes, it reused the freed block"
    } else {
      "No, it allocated somewhere else"
    }
  );
  print_blocks(&heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Grow `c` past its block. The successor is free, so it grows in place.
  // --------------------------------------------------------------------
  let c = heap.resize(Some(c), 72)?.ok_or("resize returned no block")?;
  println!("\n[3] Resize c to 72 bytes");
  print_alloc(&heap, "    c", c);
  print_blocks(&heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) A request larger than the default chunk forces the heap to grow.
  // --------------------------------------------------------------------
  print_program_break("before large alloc");
  let big = heap.allocate(64 * 1024)?;
  println!("\n[4] Allocate 64 KiB");
  print_alloc(&heap, "    big", big);
  print_program_break("after large alloc");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Free everything; all blocks coalesce back into one.
  // --------------------------------------------------------------------
  heap.deallocate(big);
  heap.deallocate(c);
  heap.deallocate(b);
  println!("\n[5] Free everything");
  print_blocks(&heap);
  heap.check()?;

  println!("\n[6] End of example. The program break never moves back down.");
  Ok(())
}
