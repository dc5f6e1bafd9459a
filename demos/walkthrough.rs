use std::{io::Read, ptr::NonNull};

use fitalloc::{Config, FitAllocator};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect the process with tools like `pmap` or
/// `gdb` between steps. Set `FITALLOC_NO_PAUSE` to run straight through.
fn block_until_enter_pressed() {
  if std::env::var_os("FITALLOC_NO_PAUSE").is_some() {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_alloc(
  allocator: &FitAllocator,
  requested: usize,
  ptr: NonNull<u8>,
) {
  println!(
    "Allocated {} bytes (granted {}), address = {:?}, offset = {:#x}",
    requested,
    allocator.usable_size(ptr).unwrap_or_default(),
    ptr,
    ptr.as_ptr() as usize - allocator.region_base(),
  );
}

fn main() {
  env_logger::init();

  let config = match Config::from_env() {
    Ok(config) => config,
    Err(err) => {
      eprintln!("invalid configuration: {err}");
      std::process::exit(2);
    }
  };

  let mut allocator = match FitAllocator::with_config(&config) {
    Ok(allocator) => allocator,
    Err(err) => {
      eprintln!("could not initialize allocator: {err}");
      std::process::exit(1);
    }
  };

  println!(
    "[start] PID = {}, {} allocator over {} bytes at {:#x}",
    std::process::id(),
    allocator.strategy(),
    allocator.region_len(),
    allocator.region_base(),
  );
  println!("{}", allocator.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Three allocations of different sizes carve the single free block.
  // --------------------------------------------------------------------
  let mut live = Vec::new();
  for (step, size) in [200, 300, 400].into_iter().enumerate() {
    match allocator.allocate(size) {
      Ok(ptr) => {
        println!("\n[1.{}] Allocate {size} bytes", step + 1);
        print_alloc(&allocator, size, ptr);
        unsafe { ptr.as_ptr().write_bytes(0xAB, size) };
        live.push(ptr);
      }
      Err(err) => println!("\n[1.{}] Allocate {size} bytes failed: {err}", step + 1),
    }
  }
  println!("{}", allocator.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Free the middle block to open a hole in the region.
  // --------------------------------------------------------------------
  if live.len() == 3 {
    let middle = live.remove(1);
    unsafe {
      if let Err(err) = allocator.free(middle.as_ptr()) {
        println!("\n[2] Free failed: {err}");
      }
    }
    println!("\n[2] Freed block at {middle:?}");
    println!("{}", allocator.dump());
  }
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) A smaller request: where it lands depends on the strategy.
  // --------------------------------------------------------------------
  match allocator.allocate(250) {
    Ok(ptr) => {
      println!("\n[3] Allocate 250 bytes");
      print_alloc(&allocator, 250, ptr);
      live.push(ptr);
    }
    Err(err) => println!("\n[3] Allocate 250 bytes failed: {err}"),
  }
  if let Some(cursor) = allocator.cursor() {
    println!("[3] next-fit cursor = {cursor:#x}");
  }
  println!("{}", allocator.dump());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Free everything; neighbouring blocks merge back into one.
  // --------------------------------------------------------------------
  for ptr in live.drain(..) {
    unsafe {
      if let Err(err) = allocator.free(ptr.as_ptr()) {
        println!("\n[4] Free failed: {err}");
      }
    }
  }
  println!("\n[4] Freed all blocks");
  println!("{}", allocator.dump());

  println!("\n[5] End of example. The region is unmapped when the allocator is dropped.");
}
