//! # microfs - A Minimal Block-Chain Filesystem over Byte-Addressable NVM
//!
//! This crate provides a small persistent filesystem engine for devices that
//! expose a single linear, byte-addressable region of non-volatile memory
//! (UART-driven EEPROM, memory-mapped flash) and nothing else: no block
//! device driver, no DMA, no wear-leveling hardware.
//!
//! ## Overview
//!
//! Every file is a singly-linked chain of fixed-size blocks. A free list,
//! threaded through the same `next` field the file chains use, tracks unused
//! blocks. An allocation table maps each of a fixed number of file slots to
//! its size and chain head:
//!
//! ```text
//!   Filesystem Region:
//!
//!   ┌──────────┬───────────────────────┬─────────────────────────────────┐
//!   │ Metadata │    Allocation Table   │           Data Blocks           │
//!   │  header  │ (MAX_FILES+1 entries) │  [next|payload][next|payload]…  │
//!   └──────────┴───────────────────────┴─────────────────────────────────┘
//! ```
//!
//! Each block carries a two-byte `next` field (an LBA, or the sentinel
//! "none") followed by its payload. A file's chain is exactly long enough to
//! hold its bytes; nothing is ever pre-allocated.
//!
//! ## Crate Structure
//!
//! ```text
//!   microfs
//!   ├── medium       - the byte-addressable storage trait + a RAM stand-in
//!   ├── layout       - LBA encoding, block addressing, on-medium header
//!   ├── alloc_table  - the file-id -> (size, head) table
//!   ├── chain        - traversal and the block-mutation primitives
//!   ├── freelist     - the free-block chain
//!   ├── handle       - FileHandle / Mode
//!   ├── error        - FsError
//!   └── engine       - Engine<M>: init, format, open_*, write, read, close,
//!                      delete, dump, wipe
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use microfs::{Engine, Layout, RamMedium};
//!
//! let layout = Layout::small();
//! let medium = RamMedium::new(layout.fs_size as usize);
//! let mut fs = Engine::init(medium, layout);
//!
//! let mut handle = fs.open_write(6);
//! fs.write(&mut handle, b"hello").unwrap();
//! fs.close(handle).unwrap();
//!
//! let read_handle = fs.open_read(6);
//! let mut buf = vec![0u8; read_handle.size as usize];
//! fs.read(&read_handle, &mut buf).unwrap();
//! assert_eq!(&buf, b"hello");
//! ```
//!
//! ## Wear Discipline
//!
//! The engine never rewrites a full block once it holds data. A write
//! touches a block's `next` field and its payload as two independent
//! operations, and `format`'s `Quick` mode only ever relinks `next` fields —
//! the one exception is `FormatMode::Full`, which deliberately accepts full
//! wear cost in exchange for a guaranteed-clean medium.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives.
//! - **One `write` call per handle**: a handle is meant to be opened,
//!   written once, and closed; see `Engine::write`'s documentation.
//! - **No directories**: file identifiers are a flat `0..MAX_FILES` space.

pub mod alloc_table;
pub mod chain;
pub mod engine;
pub mod error;
pub mod freelist;
pub mod handle;
pub mod layout;
pub mod medium;

pub use engine::{DumpReport, Engine, FormatMode, WriteReport, set_debug};
pub use error::FsError;
pub use handle::{FileHandle, Mode};
pub use layout::{Lba, Layout, MetadataHeader};
pub use medium::{Medium, RamMedium};
