//! Traversal and the three primitives that are the *only* mutators ever
//! applied to a data block on the hot path.
//!
//! A data block's payload and its `next` field are always rewritten
//! independently of each other, never as one combined write, so that a
//! crash between the two never corrupts data that wasn't touched by the
//! operation in flight.

use crate::error::FsError;
use crate::layout::{Lba, Layout};
use crate::medium::Medium;

/// Reads a block's `next` field.
pub fn read_next(medium: &dyn Medium, layout: Layout, lba: Lba) -> Result<Lba, FsError> {
  let index = lba.index().ok_or(FsError::OutOfRangeLba(lba))?;
  if index >= layout.num_blocks() {
    return Err(FsError::OutOfRangeLba(lba));
  }
  let bytes = medium.read_bytes(layout.block_ptr(index), crate::layout::LBA_SIZE);
  Ok(Lba::from_raw(i16::from_le_bytes(bytes.try_into().unwrap())))
}

/// Overwrites only the `next` field of block `lba` with `target`. Never
/// touches the block's payload bytes.
pub fn relink(medium: &mut dyn Medium, layout: Layout, lba: Lba, target: Lba) -> Result<(), FsError> {
  let index = lba.index().ok_or(FsError::OutOfRangeLba(lba))?;
  if index >= layout.num_blocks() {
    return Err(FsError::OutOfRangeLba(lba));
  }
  medium.update_bytes(layout.block_ptr(index), &target.to_raw().to_le_bytes());
  Ok(())
}

/// Overwrites only the payload bytes of block `lba`, leaving `next` intact.
/// `data` may be shorter than `DATA_SIZE`; only those bytes are written.
pub fn write_payload(medium: &mut dyn Medium, layout: Layout, lba: Lba, data: &[u8]) -> Result<(), FsError> {
  let index = lba.index().ok_or(FsError::OutOfRangeLba(lba))?;
  if index >= layout.num_blocks() {
    return Err(FsError::OutOfRangeLba(lba));
  }
  debug_assert!(data.len() <= layout.data_size());
  medium.update_bytes(layout.payload_ptr(index), data);
  Ok(())
}

/// Reads `len` bytes (at most `DATA_SIZE`) of a block's payload.
pub fn read_payload(medium: &dyn Medium, layout: Layout, lba: Lba, len: usize) -> Result<Vec<u8>, FsError> {
  let index = lba.index().ok_or(FsError::OutOfRangeLba(lba))?;
  if index >= layout.num_blocks() {
    return Err(FsError::OutOfRangeLba(lba));
  }
  Ok(medium.read_bytes(layout.payload_ptr(index), len))
}

/// Follows `next` pointers starting at `head` until a block whose `next`
/// is `Lba::NONE` is found, and returns that block's LBA.
///
/// Fails with [`FsError::OutOfRangeLba`] if `head` itself is out of range.
/// The walk is capped at `num_blocks` steps as a defensive measure against
/// a corrupted medium looping forever; under the engine's own invariants
/// this cap is never reached.
pub fn tail_of(medium: &dyn Medium, layout: Layout, head: Lba) -> Result<Lba, FsError> {
  if head.is_none() {
    return Err(FsError::OutOfRangeLba(head));
  }
  let mut current = head;
  for _ in 0..=layout.num_blocks() {
    let next = read_next(medium, layout, current)?;
    if next.is_none() {
      return Ok(current);
    }
    current = next;
  }
  Err(FsError::OutOfRangeLba(current))
}

/// Like [`tail_of`], but also returns the tail's predecessor (`None` if the
/// chain is a single block). Used by the close-path fix-up that keeps a
/// stale partially-filled tail block from leaking into the middle of a
/// spliced chain (see DESIGN.md).
pub fn tail_with_predecessor(
  medium: &dyn Medium,
  layout: Layout,
  head: Lba,
) -> Result<(Option<Lba>, Lba), FsError> {
  if head.is_none() {
    return Err(FsError::OutOfRangeLba(head));
  }
  let mut prev = None;
  let mut current = head;
  for _ in 0..=layout.num_blocks() {
    let next = read_next(medium, layout, current)?;
    if next.is_none() {
      return Ok((prev, current));
    }
    prev = Some(current);
    current = next;
  }
  Err(FsError::OutOfRangeLba(current))
}

/// Length, in blocks, of the chain starting at `head`. Used by tests and by
/// `dump` to report `ceil(size / DATA_SIZE)` against the real chain length.
pub fn chain_len(medium: &dyn Medium, layout: Layout, head: Lba) -> Result<usize, FsError> {
  if head.is_none() {
    return Ok(0);
  }
  let mut current = head;
  let mut len = 1;
  for _ in 0..=layout.num_blocks() {
    let next = read_next(medium, layout, current)?;
    if next.is_none() {
      return Ok(len);
    }
    current = next;
    len += 1;
  }
  Err(FsError::OutOfRangeLba(current))
}
