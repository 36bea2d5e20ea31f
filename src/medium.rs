//! The narrow waist between the storage engine and whatever byte-addressable
//! non-volatile memory a host actually has: UART-driven EEPROM, memory-mapped
//! flash, or, for tests and the demo binary, plain RAM. The engine core talks
//! to storage only through `Medium`.

/// Byte-level primitives over a linear address space of known size.
///
/// Implementations are synchronous and are assumed to either fully complete
/// a given call or leave at most the current word partially written if power
/// is lost mid-call.
pub trait Medium {
  /// Total addressable size of the medium, in bytes.
  fn size(&self) -> usize;

  /// Reads `len` bytes starting at `addr`.
  fn read_bytes(&self, addr: u32, len: usize) -> Vec<u8>;

  /// Writes `bytes` at `addr`, unconditionally.
  fn write_bytes(&mut self, addr: u32, bytes: &[u8]);

  /// Writes only the bytes that actually differ, to preserve write
  /// endurance on media with a limited per-byte rewrite budget. A medium
  /// with no such mechanism may implement this as `write_bytes`.
  fn update_bytes(&mut self, addr: u32, bytes: &[u8]) {
    let current = self.read_bytes(addr, bytes.len());
    if current != bytes {
      self.write_bytes(addr, bytes);
    }
  }

  /// Zeros a 32-bit dword at `addr`. Used only by `wipe`, which is
  /// deliberately the slow, full-wear-cost destructive path.
  fn write_dword_zero(&mut self, addr: u32) {
    self.write_bytes(addr, &[0u8; 4]);
  }
}

/// An in-process stand-in for a real NVM device, backed by a boxed byte
/// slice. Used by the crate's own tests and by the demo binary; a real
/// deployment provides its own `Medium` over UART/flash/EEPROM.
pub struct RamMedium {
  bytes: Box<[u8]>,
}

impl RamMedium {
  pub fn new(size: usize) -> Self {
    RamMedium {
      bytes: vec![0u8; size].into_boxed_slice(),
    }
  }

  /// Direct access for assertions in tests: byte-for-byte equality checks
  /// (format idempotence, wear discipline) need to compare raw state.
  pub fn as_slice(&self) -> &[u8] {
    &self.bytes
  }
}

impl Medium for RamMedium {
  fn size(&self) -> usize {
    self.bytes.len()
  }

  fn read_bytes(&self, addr: u32, len: usize) -> Vec<u8> {
    let start = addr as usize;
    self.bytes[start..start + len].to_vec()
  }

  fn write_bytes(&mut self, addr: u32, bytes: &[u8]) {
    let start = addr as usize;
    self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
  }
}
