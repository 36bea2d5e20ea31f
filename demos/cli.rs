use microfs::{Engine, Layout, RamMedium};

fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().read_line(&mut String::new());
}

fn print_dump(fs: &Engine<RamMedium>, label: &str) {
  let report = fs.dump();
  println!(
    "[{}] files_in_use={} blocks_in_use={} blocks_free={} partition_violation={}",
    label, report.files_in_use, report.blocks_in_use, report.blocks_free, report.partition_violation
  );
}

fn main() {
  env_logger::init();
  microfs::set_debug(3);

  // A fresh medium has no valid metadata header, so `init` formats it.
  let layout = Layout::small();
  let medium = RamMedium::new(layout.fs_size as usize);
  let mut fs = Engine::init(medium, layout);
  println!("[0] formatted a fresh medium ({} blocks)", layout.num_blocks());
  print_dump(&fs, "0");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Write a small file.
  // --------------------------------------------------------------------
  let mut handle = fs.open_write(6);
  let report = fs.write(&mut handle, b"Hello World!\n\0").unwrap();
  fs.close(handle).unwrap();
  println!("\n[1] wrote file 6: {} bytes, truncated={}", report.bytes_written, report.truncated);
  print_dump(&fs, "1");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Read it back.
  // --------------------------------------------------------------------
  let read_handle = fs.open_read(6);
  let mut buf = vec![0u8; read_handle.size as usize];
  fs.read(&read_handle, &mut buf).unwrap();
  println!("\n[2] read file 6: {:?}", String::from_utf8_lossy(&buf));
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Append to a different file across several calls.
  // --------------------------------------------------------------------
  let mut handle = fs.open_write(7);
  fs.write(&mut handle, b"Lorem ipsum ").unwrap();
  fs.close(handle).unwrap();

  let mut handle = fs.open_append(7);
  fs.write(&mut handle, b"dolor sit amet.").unwrap();
  fs.close(handle).unwrap();

  let read_handle = fs.open_read(7);
  let mut buf = vec![0u8; read_handle.size as usize];
  fs.read(&read_handle, &mut buf).unwrap();
  println!("\n[3] file 7 after two appends: {:?}", String::from_utf8_lossy(&buf));
  print_dump(&fs, "3");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Delete file 6 and confirm it is gone.
  // --------------------------------------------------------------------
  fs.delete(6).unwrap();
  let read_handle = fs.open_read(6);
  let err = fs.read(&read_handle, &mut [0u8; 1]);
  println!("\n[4] read after delete: {:?}", err);
  print_dump(&fs, "4");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) An identifier past MAX_FILES wraps, rather than erroring.
  // --------------------------------------------------------------------
  let mut handle = fs.open_append(1337);
  println!("\n[5] open_append(1337) resolved to file id {}", handle.id);
  fs.write(&mut handle, b"cake! ").unwrap();
  fs.close(handle).unwrap();
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 6) End of demo: wipe the medium and show the engine now needs init.
  // --------------------------------------------------------------------
  fs.wipe();
  println!("\n[6] wiped the medium. Engine state is stale until the next init.");
}
