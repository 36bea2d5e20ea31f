//! An in-RAM cache of a fixed-size array mapping file identifier to
//! `(size, head LBA)`, mirrored to the medium.
//!
//! This is the one structure in the engine that is never rebuilt from the
//! free list or from chain traversal — it is the root of trust for which
//! blocks belong to which file.

use crate::layout::{Lba, Layout};
use crate::medium::Medium;

/// One allocation-table entry: a file's length and the head of its chain.
///
/// `head = Lba::NONE` iff the slot is empty, in which case `size` is always
/// `0`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct FileAlloc {
  pub size: u16,
  pub head: Lba,
}

impl FileAlloc {
  pub const ENCODED_SIZE: usize = 2 + 2;

  pub const EMPTY: FileAlloc = FileAlloc {
    size: 0,
    head: Lba::NONE,
  };

  pub fn to_bytes(self) -> [u8; Self::ENCODED_SIZE] {
    let mut out = [0u8; Self::ENCODED_SIZE];
    out[0..2].copy_from_slice(&self.size.to_le_bytes());
    out[2..4].copy_from_slice(&self.head.to_raw().to_le_bytes());
    out
  }

  pub fn from_bytes(bytes: &[u8]) -> Self {
    FileAlloc {
      size: u16::from_le_bytes(bytes[0..2].try_into().unwrap()),
      head: Lba::from_raw(i16::from_le_bytes(bytes[2..4].try_into().unwrap())),
    }
  }
}

/// The cached table plus the medium-side mirroring operations.
///
/// Entry `layout.max_files` (the last slot) is distinguished: its `head`
/// field doubles as the free-list head LBA, and its `size` field is unused.
pub struct AllocTable {
  entries: Vec<FileAlloc>,
}

impl AllocTable {
  /// Builds a table of `max_files + 1` empty entries, all in RAM only —
  /// callers that want it mirrored call [`Self::bulk_write`].
  pub fn new_empty(layout: Layout) -> Self {
    AllocTable {
      entries: vec![FileAlloc::EMPTY; layout.max_files as usize + 1],
    }
  }

  /// Bulk-reads the table from the medium into RAM.
  pub fn load(medium: &dyn Medium, layout: Layout) -> Self {
    let mut entries = Vec::with_capacity(layout.max_files as usize + 1);
    let base = layout.fs_start + layout.alloc_table_offset() as u32;
    for i in 0..=layout.max_files as u32 {
      let addr = base + i * FileAlloc::ENCODED_SIZE as u32;
      let bytes = medium.read_bytes(addr, FileAlloc::ENCODED_SIZE);
      entries.push(FileAlloc::from_bytes(&bytes));
    }
    AllocTable { entries }
  }

  /// Bulk-writes the whole table to the medium, used only by `format`.
  pub fn bulk_write(&self, medium: &mut dyn Medium, layout: Layout) {
    let base = layout.fs_start + layout.alloc_table_offset() as u32;
    for (i, entry) in self.entries.iter().enumerate() {
      let addr = base + i as u32 * FileAlloc::ENCODED_SIZE as u32;
      medium.write_bytes(addr, &entry.to_bytes());
    }
  }

  fn slot_addr(layout: Layout, index: u16) -> u32 {
    layout.fs_start
      + layout.alloc_table_offset() as u32
      + index as u32 * FileAlloc::ENCODED_SIZE as u32
  }

  /// Updates only the bytes of slot `f` on the medium.
  pub fn mirror_slot(&self, medium: &mut dyn Medium, layout: Layout, f: u16) {
    let addr = Self::slot_addr(layout, f);
    medium.update_bytes(addr, &self.entries[f as usize].to_bytes());
  }

  /// Updates only the bytes of the trailing free-head slot.
  pub fn mirror_free_head(&self, medium: &mut dyn Medium, layout: Layout) {
    self.mirror_slot(medium, layout, layout.max_files);
  }

  pub fn get(&self, f: u16) -> FileAlloc {
    self.entries[f as usize]
  }

  pub fn set(&mut self, f: u16, entry: FileAlloc) {
    self.entries[f as usize] = entry;
  }

  pub fn free_head(&self, layout: Layout) -> Lba {
    self.entries[layout.max_files as usize].head
  }

  pub fn set_free_head(&mut self, layout: Layout, head: Lba) {
    self.entries[layout.max_files as usize].head = head;
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }
}
