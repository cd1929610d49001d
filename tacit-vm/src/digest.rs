//! The length-prefixed string interning arena living in the STRING segment.
//!
//! Uses the same bump-allocator-over-a-bounds-checked-buffer shape as
//! [`crate::memory::Memory`] itself: one monotonically advancing cursor,
//! one record format, no reclamation except an explicit `reset`.

use crate::error::{VmError, VmResult};
use crate::memory::Memory;
use tacit_types::Segment;

/// Maximum length, in bytes, of a single interned string record.
const MAX_STRING_LEN: usize = 255;

/// Bump-allocated interning table over the STRING segment. Records are
/// `[len: u8][bytes: len]`; `sbp` is the next free byte offset.
pub struct Digest {
    sbp: usize,
}

impl Default for Digest {
    fn default() -> Self {
        Self::new()
    }
}

impl Digest {
    /// A fresh digest with the write cursor at the start of STRING.
    pub fn new() -> Self {
        Digest {
            sbp: Segment::String.base(),
        }
    }

    /// The current bump cursor, as an absolute linear address.
    pub fn cursor(&self) -> usize {
        self.sbp
    }

    /// Intern `s` unconditionally, returning the record's start address.
    ///
    /// Fails with [`VmError::StringTooLong`] for `s.len() > 255`, or
    /// [`VmError::StringDigestOverflow`] if fewer than `1 + s.len()` bytes
    /// remain before the segment's end.
    pub fn add(&mut self, mem: &mut Memory, s: &str) -> VmResult<usize> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_STRING_LEN {
            return Err(VmError::StringTooLong);
        }
        let record_len = 1 + bytes.len();
        if self.sbp + record_len > Segment::String.end() {
            return Err(VmError::StringDigestOverflow);
        }
        let addr = self.sbp;
        mem.write8(addr, bytes.len() as u8)?;
        for (i, b) in bytes.iter().enumerate() {
            mem.write8(addr + 1 + i, *b)?;
        }
        self.sbp = addr + record_len;
        Ok(addr)
    }

    /// Read back the string stored at `addr`.
    pub fn get(&self, mem: &Memory, addr: usize) -> VmResult<String> {
        if addr < Segment::String.base() || addr > Segment::String.end() {
            return Err(VmError::Range(format!(
                "digest address {addr} outside STRING segment"
            )));
        }
        let len = mem.read8(addr)? as usize;
        let mut bytes = Vec::with_capacity(len);
        for i in 0..len {
            bytes.push(mem.read8(addr + 1 + i)?);
        }
        String::from_utf8(bytes)
            .map_err(|e| VmError::Range(format!("digest record at {addr} is not UTF-8: {e}")))
    }

    /// Linearly scan records from the segment base up to the write cursor,
    /// returning the address of the first record equal to `s`.
    pub fn find(&self, mem: &Memory, s: &str) -> Option<usize> {
        let mut addr = Segment::String.base();
        while addr < self.sbp {
            let len = mem.read8(addr).ok()? as usize;
            if let Ok(candidate) = self.get(mem, addr) {
                if len == s.len() && candidate == s {
                    return Some(addr);
                }
            }
            addr += 1 + len;
        }
        None
    }

    /// `find` then `add` on miss.
    pub fn intern(&mut self, mem: &mut Memory, s: &str) -> VmResult<usize> {
        if let Some(addr) = self.find(mem, s) {
            return Ok(addr);
        }
        self.add(mem, s)
    }

    /// Truncate the write cursor back to `addr`, discarding everything
    /// interned after it. `addr` must fall within the segment's bounds.
    pub fn reset(&mut self, addr: usize) -> VmResult<()> {
        if addr < Segment::String.base() || addr > Segment::String.end() {
            return Err(VmError::Range(format!(
                "digest reset address {addr} outside STRING segment"
            )));
        }
        self.sbp = addr;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_round_trips() {
        let mut mem = Memory::new();
        let mut digest = Digest::new();
        let addr = digest.add(&mut mem, "hello").unwrap();
        assert_eq!(digest.get(&mem, addr).unwrap(), "hello");
    }

    #[test]
    fn intern_is_idempotent() {
        let mut mem = Memory::new();
        let mut digest = Digest::new();
        let a = digest.intern(&mut mem, "same").unwrap();
        let b = digest.intern(&mut mem, "same").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn find_returns_none_for_absent_string() {
        let mem = Memory::new();
        let digest = Digest::new();
        assert_eq!(digest.find(&mem, "nope"), None);
    }

    #[test]
    fn add_rejects_oversized_strings() {
        let mut mem = Memory::new();
        let mut digest = Digest::new();
        let huge = "x".repeat(256);
        assert_eq!(digest.add(&mut mem, &huge), Err(VmError::StringTooLong));
    }

    #[test]
    fn add_rejects_overflow_of_segment() {
        let mut mem = Memory::new();
        let mut digest = Digest::new();
        let chunk = "a".repeat(250);
        loop {
            match digest.add(&mut mem, &chunk) {
                Ok(_) => continue,
                Err(VmError::StringDigestOverflow) => break,
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
    }

    #[test]
    fn reset_truncates_cursor() {
        let mut mem = Memory::new();
        let mut digest = Digest::new();
        let addr = digest.add(&mut mem, "one").unwrap();
        digest.add(&mut mem, "two").unwrap();
        digest.reset(addr).unwrap();
        assert_eq!(digest.cursor(), addr);
        assert_eq!(digest.find(&mem, "two"), None);
    }

    #[test]
    fn reset_rejects_address_outside_segment() {
        let mut digest = Digest::new();
        assert!(digest.reset(Segment::String.end() + 1).is_err());
    }
}
