//! A singly-linked chain of unused blocks, threaded through each block's own
//! `next` field, whose head lives in the allocation table's trailing slot.
//! This free list is the *only* source of new blocks: there is no backing
//! store to grow, so a freed block is always reused rather than reclaimed.

use crate::alloc_table::AllocTable;
use crate::chain::{relink, tail_of};
use crate::error::FsError;
use crate::layout::{Lba, Layout};
use crate::medium::Medium;

/// Pops the head of the free chain and advances the head to its successor.
/// The popped block's `next` field still holds its old free-chain successor
/// until the caller overwrites it — a multi-block write relies on this to
/// inherit its chain topology from the free list's prior ordering, and must
/// not "fix" it by eagerly clearing `next` here.
pub fn take_head(
  table: &mut AllocTable,
  medium: &dyn Medium,
  layout: Layout,
) -> Result<Lba, FsError> {
  let head = table.free_head(layout);
  if head.is_none() {
    return Err(FsError::MediumFull);
  }
  let next = crate::chain::read_next(medium, layout, head)?;
  table.set_free_head(layout, next);
  Ok(head)
}

/// Appends a single already-terminated block to the tail of the free chain
/// by walking to the current tail and relinking it. The caller must ensure
/// `block[lba].next == Lba::NONE` before calling, or that the subchain
/// starting at `lba` already terminates at `Lba::NONE` on its own.
pub fn append_to_tail(
  table: &mut AllocTable,
  medium: &mut dyn Medium,
  layout: Layout,
  lba: Lba,
) -> Result<(), FsError> {
  let head = table.free_head(layout);
  if head.is_none() {
    table.set_free_head(layout, lba);
    return Ok(());
  }
  let tail = tail_of(medium, layout, head)?;
  relink(medium, layout, tail, lba)
}

/// Returns an entire chain (and everything still linked after it) to the
/// free list in one cheap append, without walking the returned chain — it
/// already terminates at `Lba::NONE` by construction.
pub fn unlink(
  table: &mut AllocTable,
  medium: &mut dyn Medium,
  layout: Layout,
  lba: Lba,
) -> Result<(), FsError> {
  append_to_tail(table, medium, layout, lba)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::medium::RamMedium;

  fn fresh_free_chain(layout: Layout) -> (RamMedium, AllocTable) {
    let mut medium = RamMedium::new(layout.fs_size as usize);
    let mut table = AllocTable::new_empty(layout);
    let n = layout.num_blocks();
    for i in 0..n {
      let target = if i == 0 { Lba::NONE } else { Lba::new(i - 1) };
      relink(&mut medium, layout, Lba::new(i), target).unwrap();
    }
    table.set_free_head(layout, Lba::new(n - 1));
    (medium, table)
  }

  #[test]
  fn take_head_advances_and_returns_former_head() {
    let layout = Layout::small();
    let (medium, mut table) = fresh_free_chain(layout);
    let n = layout.num_blocks();

    let taken = take_head(&mut table, &medium, layout).unwrap();
    assert_eq!(taken, Lba::new(n - 1));
    assert_eq!(table.free_head(layout), Lba::new(n - 2));
  }

  #[test]
  fn take_head_on_full_medium_errors() {
    let layout = Layout::small();
    let medium = RamMedium::new(layout.fs_size as usize);
    let mut table = AllocTable::new_empty(layout);
    table.set_free_head(layout, Lba::NONE);

    assert_eq!(take_head(&mut table, &medium, layout), Err(FsError::MediumFull));
  }

  #[test]
  fn unlink_reappears_at_free_tail() {
    let layout = Layout::small();
    let (mut medium, mut table) = fresh_free_chain(layout);

    // Take the head block out to hand to a file, detach it from the list.
    let owned = take_head(&mut table, &medium, layout).unwrap();
    relink(&mut medium, layout, owned, Lba::NONE).unwrap();

    unlink(&mut table, &mut medium, layout, owned).unwrap();

    let tail = tail_of(&medium, layout, table.free_head(layout)).unwrap();
    assert_eq!(tail, owned);
  }

  #[test]
  fn append_to_tail_on_empty_free_list_becomes_head() {
    let layout = Layout::small();
    let mut medium = RamMedium::new(layout.fs_size as usize);
    let mut table = AllocTable::new_empty(layout);
    table.set_free_head(layout, Lba::NONE);
    relink(&mut medium, layout, Lba::new(4), Lba::NONE).unwrap();

    append_to_tail(&mut table, &mut medium, layout, Lba::new(4)).unwrap();
    assert_eq!(table.free_head(layout), Lba::new(4));
  }
}
