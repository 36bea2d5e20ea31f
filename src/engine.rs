//! The engine's public surface: `format`, `open_*`, `write`, `read`,
//! `close`, `delete`, `dump`, `wipe`, `set_debug`.
//!
//! `Engine` owns the allocation table and the medium itself as plain struct
//! fields rather than process-wide state: one value, constructed once by
//! [`Engine::init`], threaded through every call.

use crate::alloc_table::{AllocTable, FileAlloc};
use crate::chain;
use crate::error::FsError;
use crate::freelist;
use crate::handle::{FileHandle, Mode};
use crate::layout::{Lba, Layout};
use crate::medium::Medium;

fn ceil_div(n: usize, d: usize) -> usize {
  (n + d - 1) / d
}

/// Formatting strategy.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FormatMode {
  /// Relinks the free chain only; does not touch block payloads.
  Quick,
  /// Rewrites every block in its entirety (zeroed payload). Full wear
  /// cost; used when a fresh, guaranteed-clean medium is required.
  Full,
  /// Zeros every dword in the filesystem region first (destructive, slow,
  /// full wear cost), then proceeds exactly like `Quick`.
  Wipe,
}

/// Outcome of a single [`Engine::write`] call.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct WriteReport {
  /// Bytes actually accepted from the caller's buffer (may be less than
  /// requested if the medium filled up or `MAX_BLOCKS_PER_FILE` was hit).
  pub bytes_written: u16,
  /// Set if the write was truncated for either of the reasons above.
  pub truncated: bool,
}

/// Outcome of a [`Engine::dump`] walk.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct DumpReport {
  pub files_in_use: u16,
  pub blocks_in_use: u32,
  pub blocks_free: u32,
  /// Set if the walk found a block referenced twice, or a block referenced
  /// by neither a file chain nor the free chain.
  pub partition_violation: bool,
}

/// Maps a `0..4` verbosity level onto the `log` crate's level filter and
/// installs it process-wide, for whatever `log::Log` implementation the
/// host installed.
pub fn set_debug(level: u8) {
  let filter = match level {
    0 => log::LevelFilter::Off,
    1 => log::LevelFilter::Error,
    2 => log::LevelFilter::Warn,
    3 => log::LevelFilter::Info,
    _ => log::LevelFilter::Debug,
  };
  log::set_max_level(filter);
}

/// The storage engine: a medium, its layout, and the cached allocation
/// table, all owned by one value.
pub struct Engine<M: Medium> {
  medium: M,
  layout: Layout,
  table: AllocTable,
}

impl<M: Medium> Engine<M> {
  /// Reads the stored metadata header; if it doesn't match `layout`, runs
  /// `format(Quick)` before loading the allocation table.
  pub fn init(medium: M, layout: Layout) -> Self {
    let stored = crate::layout::MetadataHeader::from_bytes(
      &medium.read_bytes(layout.fs_start, crate::layout::MetadataHeader::ENCODED_SIZE),
    );
    let mut engine = Engine {
      medium,
      layout,
      table: AllocTable::new_empty(layout),
    };
    if stored != layout.header() {
      log::info!("stored metadata does not match configuration, reformatting");
      engine.format(FormatMode::Quick);
    } else {
      engine.table = AllocTable::load(&engine.medium, layout);
    }
    engine
  }

  pub fn layout(&self) -> Layout {
    self.layout
  }

  pub fn medium(&self) -> &M {
    &self.medium
  }

  /// Builds the initial free chain (block `i` points to
  /// block `i - 1`, block `0` terminates, block `NUM_BLOCKS - 1` becomes
  /// the free-list head), resets every file slot to empty, and writes the
  /// metadata header last so a format interrupted partway is detected as
  /// a mismatch on the next `init` rather than misread as valid.
  pub fn format(&mut self, mode: FormatMode) {
    if mode == FormatMode::Wipe {
      self.zero_region();
    }

    let n = self.layout.num_blocks();
    for i in 0..n {
      let lba = Lba::new(i);
      let target = if i == 0 { Lba::NONE } else { Lba::new(i - 1) };
      if mode == FormatMode::Full {
        let mut block = vec![0u8; self.layout.block_size as usize];
        block[0..crate::layout::LBA_SIZE].copy_from_slice(&target.to_raw().to_le_bytes());
        self.medium.write_bytes(self.layout.block_ptr(i), &block);
      } else {
        let _ = chain::relink(&mut self.medium, self.layout, lba, target);
      }
    }

    self.table = AllocTable::new_empty(self.layout);
    let free_head = if n > 0 { Lba::new(n - 1) } else { Lba::NONE };
    self.table.set_free_head(self.layout, free_head);
    self.table.bulk_write(&mut self.medium, self.layout);

    let header = self.layout.header();
    self.medium.write_bytes(self.layout.fs_start, &header.to_bytes());
  }

  /// Zeros the region but, unlike `format`, does not rebuild the free
  /// chain or rewrite the header — the engine's RAM table is deliberately
  /// left stale until the next `init`.
  pub fn wipe(&mut self) {
    log::warn!("wipe: engine state is now stale until the next init");
    let start = self.layout.fs_start;
    let end = start + self.layout.fs_size;
    let mut addr = start;
    while addr + 4 <= end {
      self.medium.write_dword_zero(addr);
      addr += 4;
    }
  }

  fn zero_region(&mut self) {
    let start = self.layout.fs_start;
    let end = start + self.layout.fs_size;
    let mut addr = start;
    while addr + 4 <= end {
      self.medium.write_dword_zero(addr);
      addr += 4;
    }
  }

  fn wrap_id(&self, f: u32) -> u16 {
    let max = self.layout.max_files as u32;
    let effective = f % max;
    if effective != f {
      log::warn!("identifier {f} wrapped to {effective} (MAX_FILES={max})");
    }
    effective as u16
  }

  pub fn open_read(&self, f: u32) -> FileHandle {
    let id = self.wrap_id(f);
    let entry = self.table.get(id);
    if entry.head.is_none() {
      log::warn!("open_read: file {id} not found");
    }
    FileHandle::for_read(id, entry.size, entry.head)
  }

  pub fn open_write(&self, f: u32) -> FileHandle {
    FileHandle::for_write(self.wrap_id(f))
  }

  pub fn open_append(&self, f: u32) -> FileHandle {
    let id = self.wrap_id(f);
    let entry = self.table.get(id);
    FileHandle::for_append(id, entry.size)
  }

  /// For `Append` handles with a non-block-aligned existing size, absorbs
  /// the existing tail's meaningful bytes as a prefix before the caller's
  /// data, so no block but the last ever ends up partially filled.
  /// `handle.size` is left holding only the bytes this call itself
  /// accepted from `data` (not the absorbed prefix) — `close` adds the
  /// pre-existing size back in, so the two never double-count.
  ///
  /// Calling `write` more than once on the same handle before `close` is
  /// not supported (see DESIGN.md).
  pub fn write(&mut self, handle: &mut FileHandle, data: &[u8]) -> Result<WriteReport, FsError> {
    if handle.mode == Mode::Read {
      log::warn!("write: handle for file {} is read-only", handle.id);
      return Err(FsError::WrongMode);
    }

    let data_size = self.layout.data_size();

    let (existing_size, existing_tail) = if handle.mode == Mode::Append {
      let entry = self.table.get(handle.id);
      match entry.head.index() {
        Some(_) => {
          let tail = chain::tail_of(&self.medium, self.layout, entry.head)?;
          (entry.size, Some(tail))
        }
        None => (0u16, None),
      }
    } else {
      (0u16, None)
    };

    let overflow = existing_size as usize % data_size;
    let mut buffer = Vec::with_capacity(overflow + data.len());
    if overflow > 0 {
      let tail_lba = existing_tail.expect("overflow > 0 implies an existing tail block");
      let prefix = chain::read_payload(&self.medium, self.layout, tail_lba, overflow)?;
      buffer.extend_from_slice(&prefix);
    }
    buffer.extend_from_slice(data);

    let blocks_in_use = ceil_div(existing_size as usize, data_size);
    let mut needed = ceil_div(buffer.len(), data_size);
    let mut truncated = false;
    if blocks_in_use + needed > self.layout.max_blocks_per_file as usize {
      needed = (self.layout.max_blocks_per_file as usize).saturating_sub(blocks_in_use);
      // A clamp that cuts into the absorbed tail prefix would drop
      // bytes already committed to the medium before this call, not
      // just refuse some of the caller's new bytes. Refused outright,
      // before any block is taken, rather than silently truncated.
      if needed * data_size < overflow {
        log::warn!(
          "write: file {} append would truncate already-committed data, refusing",
          handle.id
        );
        return Err(FsError::AppendExceedsCapacity);
      }
      truncated = true;
      log::warn!(
        "write: file {} exceeds MAX_BLOCKS_PER_FILE, truncating",
        handle.id
      );
    }
    let effective_len = (needed * data_size).min(buffer.len());
    buffer.truncate(effective_len);

    let mut first = handle.first;
    let mut last = handle.last;
    let mut written = 0usize;
    for chunk in buffer.chunks(data_size) {
      let lba = match freelist::take_head(&mut self.table, &self.medium, self.layout) {
        Ok(lba) => lba,
        Err(FsError::MediumFull) => {
          log::warn!("write: medium full, file {} truncated", handle.id);
          truncated = true;
          break;
        }
        Err(e) => return Err(e),
      };
      chain::write_payload(&mut self.medium, self.layout, lba, chunk)?;
      if first.is_none() {
        first = lba;
      }
      last = lba;
      written += chunk.len();
    }

    handle.first = first;
    handle.last = last;
    let user_bytes = written.saturating_sub(overflow);
    handle.size = user_bytes as u16;

    Ok(WriteReport {
      bytes_written: user_bytes as u16,
      truncated,
    })
  }

  /// Writes `size`/`head` into slot `id`, mirrors both the slot and the
  /// free-list head (which may have advanced during `write`'s
  /// `take_head` calls).
  fn commit(&mut self, id: u16, size: u16, head: Lba) {
    self.table.set(id, FileAlloc { size, head });
    self.table.mirror_slot(&mut self.medium, self.layout, id);
    self.table.mirror_free_head(&mut self.medium, self.layout);
  }

  /// The commit point. Consumes the handle: there is no way to use it
  /// again afterwards.
  pub fn close(&mut self, handle: FileHandle) -> Result<(), FsError> {
    if handle.mode == Mode::Read {
      return Ok(());
    }

    if handle.first.is_none() {
      // write() was never called (or wrote nothing). For Write mode
      // this commits an empty file, dropping whatever was there
      // before; for Append mode it's a pure no-op.
      if handle.mode == Mode::Write {
        let existing = self.table.get(handle.id);
        if existing.head.is_some() {
          freelist::unlink(&mut self.table, &mut self.medium, self.layout, existing.head)?;
        }
        self.commit(handle.id, 0, Lba::NONE);
      }
      return Ok(());
    }

    let data_size = self.layout.data_size();

    match handle.mode {
      Mode::Append => {
        let existing = self.table.get(handle.id);
        if existing.head.is_some() {
          // `write` only absorbs the existing tail's bytes as a
          // prefix of the new chain when it's partially filled
          // (overflow > 0). When the existing size is an exact
          // multiple of a block's payload, nothing was absorbed,
          // so the old chain must stay intact and simply gain the
          // new chain as its successor — regardless of how many
          // blocks it has.
          let overflow = existing.size as usize % data_size;
          let new_head = if overflow == 0 {
            let tail = chain::tail_of(&self.medium, self.layout, existing.head)?;
            chain::relink(&mut self.medium, self.layout, tail, handle.first)?;
            existing.head
          } else {
            let (predecessor, tail) =
              chain::tail_with_predecessor(&self.medium, self.layout, existing.head)?;
            freelist::unlink(&mut self.table, &mut self.medium, self.layout, tail)?;
            match predecessor {
              Some(pred) => {
                chain::relink(&mut self.medium, self.layout, pred, handle.first)?;
                existing.head
              }
              None => handle.first,
            }
          };
          let size = existing.size + handle.size;
          self.commit(handle.id, size, new_head);
        } else {
          self.commit(handle.id, handle.size, handle.first);
        }
      }
      Mode::Write => {
        // open_write does not implicitly delete a prior file at
        // open time; the old chain is returned to the free list
        // here, at the commit point, same as every other mutation.
        let existing = self.table.get(handle.id);
        if existing.head.is_some() {
          freelist::unlink(&mut self.table, &mut self.medium, self.layout, existing.head)?;
        }
        self.commit(handle.id, handle.size, handle.first);
      }
      Mode::Read => unreachable!(),
    }

    // Terminates the new chain. Must run after the table update above
    // so a crash in between leaves the file reachable through the
    // table with the new chain's tail simply rejoining the free list
    // beyond the file's real end, never unreferenced.
    chain::relink(&mut self.medium, self.layout, handle.last, Lba::NONE)?;
    Ok(())
  }

  /// Idempotent: a second `delete` on an already-empty slot finds
  /// `head == Lba::NONE` and is a no-op.
  pub fn delete(&mut self, f: u32) -> Result<(), FsError> {
    let id = self.wrap_id(f);
    let entry = self.table.get(id);
    if entry.head.is_some() {
      freelist::unlink(&mut self.table, &mut self.medium, self.layout, entry.head)?;
      self.table.set(id, FileAlloc::EMPTY);
      self.table.mirror_slot(&mut self.medium, self.layout, id);
      self.table.mirror_free_head(&mut self.medium, self.layout);
    }
    Ok(())
  }

  /// `buf` must be at least `handle.size` bytes; this is a precondition
  /// on the caller, not a recoverable error.
  pub fn read(&self, handle: &FileHandle, buf: &mut [u8]) -> Result<usize, FsError> {
    let first = handle.first;
    if first.is_none() || !self.layout.in_range(first) {
      log::warn!("read: null handle for file {}", handle.id);
      return Err(FsError::NotFound);
    }
    assert!(
      buf.len() >= handle.size as usize,
      "caller buffer must be at least handle.size bytes"
    );

    let data_size = self.layout.data_size();
    let mut current = first;
    let mut copied = 0usize;
    loop {
      let remaining = handle.size as usize - copied;
      let this_block = remaining.min(data_size);
      if this_block > 0 {
        let payload = chain::read_payload(&self.medium, self.layout, current, this_block)?;
        buf[copied..copied + this_block].copy_from_slice(&payload);
        copied += this_block;
      }
      let next = chain::read_next(&self.medium, self.layout, current)?;
      if next.is_none() {
        break;
      }
      current = next;
    }
    Ok(copied)
  }

  /// Diagnostic-only: walks the allocation table and every chain
  /// (file chains plus the free chain), logging a line per live file and
  /// returning a [`DumpReport`] a test can assert on directly.
  pub fn dump(&self) -> DumpReport {
    let mut report = DumpReport::default();
    let mut seen = vec![false; self.layout.num_blocks() as usize];

    for f in 0..self.layout.max_files {
      let entry = self.table.get(f);
      if entry.head.is_some() {
        report.files_in_use += 1;
        log::info!("file {f}: size={} head={}", entry.size, entry.head);
        if let Ok(len) = chain::chain_len(&self.medium, self.layout, entry.head) {
          report.blocks_in_use += len as u32;
        }
        self.mark_chain(entry.head, &mut seen, &mut report);
      }
    }

    let free_head = self.table.free_head(self.layout);
    if free_head.is_some() {
      if let Ok(len) = chain::chain_len(&self.medium, self.layout, free_head) {
        report.blocks_free += len as u32;
      }
      self.mark_chain(free_head, &mut seen, &mut report);
    }

    if seen.iter().any(|&marked| !marked) {
      report.partition_violation = true;
    }

    log::info!(
      "dump: {} files, {} blocks in use, {} free",
      report.files_in_use,
      report.blocks_in_use,
      report.blocks_free
    );
    report
  }

  fn mark_chain(&self, head: Lba, seen: &mut [bool], report: &mut DumpReport) {
    let mut current = head;
    while let Some(idx) = current.index() {
      let idx = idx as usize;
      if idx >= seen.len() || seen[idx] {
        report.partition_violation = true;
        return;
      }
      seen[idx] = true;
      match chain::read_next(&self.medium, self.layout, current) {
        Ok(next) => current = next,
        Err(_) => {
          report.partition_violation = true;
          return;
        }
      }
    }
  }
}
