//! Property tests for the universal invariants every scenario in the
//! engine's own unit tests only checks one instance of: partitioning of
//! blocks between files and the free list, chain termination, and
//! round-tripping of written data.

use microfs::{Engine, Layout, RamMedium};
use proptest::prelude::*;

fn fresh_engine() -> Engine<RamMedium> {
  let layout = Layout::small();
  let medium = RamMedium::new(layout.fs_size as usize);
  Engine::init(medium, layout)
}

proptest! {
  /// Round-trip: whatever bytes survive truncation on `write` come back
  /// unchanged and in order on `read`.
  #[test]
  fn round_trip_write_then_read(id in 0u32..40, data in proptest::collection::vec(any::<u8>(), 0..200)) {
    let mut fs = fresh_engine();
    let mut handle = fs.open_write(id);
    let report = fs.write(&mut handle, &data).unwrap();
    fs.close(handle).unwrap();

    let read_handle = fs.open_read(id);
    prop_assert_eq!(read_handle.size, report.bytes_written);
    let mut buf = vec![0u8; read_handle.size as usize];
    fs.read(&read_handle, &mut buf).unwrap();
    prop_assert_eq!(&buf[..], &data[..report.bytes_written as usize]);
  }

  /// Chain termination + partition: after an arbitrary sequence of
  /// writes, appends, and deletes, `dump` never reports a block that is
  /// unreferenced or referenced twice, and every chain still terminates.
  #[test]
  fn partition_holds_after_random_operations(
    ops in proptest::collection::vec((0u32..6, 0u8..3, proptest::collection::vec(any::<u8>(), 0..40)), 0..25)
  ) {
    let mut fs = fresh_engine();
    for (id, kind, data) in ops {
      match kind {
        0 => {
          let mut handle = fs.open_write(id);
          let _ = fs.write(&mut handle, &data);
          fs.close(handle).unwrap();
        }
        1 => {
          let mut handle = fs.open_append(id);
          let _ = fs.write(&mut handle, &data);
          fs.close(handle).unwrap();
        }
        _ => {
          fs.delete(id).unwrap();
        }
      }
    }
    let report = fs.dump();
    prop_assert!(!report.partition_violation);
  }

  /// Append associativity: writing `a` then appending `b` then appending
  /// `c` reads back as `a ++ b ++ c`, regardless of how `a`'s length
  /// interacts with block boundaries.
  #[test]
  fn append_is_associative(
    a in proptest::collection::vec(any::<u8>(), 1..40),
    b in proptest::collection::vec(any::<u8>(), 1..40),
    c in proptest::collection::vec(any::<u8>(), 1..40),
  ) {
    let mut fs = fresh_engine();
    let mut handle = fs.open_write(3);
    fs.write(&mut handle, &a).unwrap();
    fs.close(handle).unwrap();

    let mut handle = fs.open_append(3);
    fs.write(&mut handle, &b).unwrap();
    fs.close(handle).unwrap();

    let mut handle = fs.open_append(3);
    fs.write(&mut handle, &c).unwrap();
    fs.close(handle).unwrap();

    let read_handle = fs.open_read(3);
    let expected_len = (a.len() + b.len() + c.len()).min(read_handle.size as usize);
    let mut buf = vec![0u8; read_handle.size as usize];
    fs.read(&read_handle, &mut buf).unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&a);
    expected.extend_from_slice(&b);
    expected.extend_from_slice(&c);
    expected.truncate(expected_len);
    prop_assert_eq!(&buf[..expected_len], &expected[..]);
  }

  /// Delete is idempotent: deleting an already-empty slot twice in a row
  /// never errors and never changes the free list.
  #[test]
  fn delete_is_idempotent(id in 0u32..40) {
    let mut fs = fresh_engine();
    fs.delete(id).unwrap();
    let before = fs.dump();
    fs.delete(id).unwrap();
    let after = fs.dump();
    prop_assert_eq!(before, after);
  }

  /// Identifiers beyond MAX_FILES wrap modulo MAX_FILES rather than
  /// erroring or indexing out of bounds.
  #[test]
  fn identifier_wraps_into_range(f in 0u32..10_000) {
    let fs = fresh_engine();
    let handle = fs.open_append(f);
    prop_assert!((handle.id as u32) < fs.layout().max_files as u32);
    prop_assert_eq!(handle.id as u32, f % fs.layout().max_files as u32);
  }
}
