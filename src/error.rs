//! Error kinds for the engine's public surface.
//!
//! Identifier wrapping and oversize-write truncation are deliberately not
//! `Err` variants here — both are successful returns carrying a diagnostic,
//! since neither represents a failure the caller needs to recover from.

use crate::layout::Lba;
use thiserror::Error;

/// Every public operation that returns `Err` leaves the engine's on-medium
/// invariants exactly as they were before the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsError {
  /// A chain operation was asked to follow an LBA outside `[0, NUM_BLOCKS)`.
  #[error("lba {0} is out of range")]
  OutOfRangeLba(Lba),

  /// `open_read` was called against an empty allocation-table slot, or a
  /// read was attempted on a handle whose `first` LBA is still `None`.
  #[error("file not found")]
  NotFound,

  /// `take_head` was invoked while the free-list head was `Lba::NONE`:
  /// every block on the medium is already in use.
  #[error("medium is full")]
  MediumFull,

  /// `write` was called on a handle opened with `Mode::Read`.
  #[error("operation not permitted in this handle's mode")]
  WrongMode,

  /// An `Append` would need to truncate below the existing file's own
  /// absorbed tail prefix to fit `MAX_BLOCKS_PER_FILE` — i.e. satisfying
  /// it would drop bytes the caller already had committed to the medium,
  /// not just refuse new bytes. Refused outright rather than silently
  /// truncated.
  #[error("append would truncate data already committed to the medium")]
  AppendExceedsCapacity,
}
