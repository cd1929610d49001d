//! The VM's single fixed-size linear memory buffer and its segment table.
//!
//! Every access computes and bounds-checks a byte range before touching the
//! buffer, so no partial read or write is ever observable.

use crate::error::{VmError, VmResult};
use itertools::Itertools;
use tacit_types::{Cell, Segment, MEM_SIZE};

/// The VM's single contiguous byte buffer, plus the fixed segment table
/// that carves it into STACK / RSTACK / STRING / CODE.
#[derive(Clone)]
pub struct Memory {
    buf: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Allocate a fresh, zeroed memory buffer of `MEM_SIZE` bytes.
    pub fn new() -> Self {
        Memory {
            buf: vec![0u8; MEM_SIZE].into_boxed_slice(),
        }
    }

    /// Resolve a segment-relative offset to a linear address. Does not by
    /// itself bounds-check the access; callers go on to use the address
    /// with one of the `read*`/`write*` methods, which do.
    pub fn resolve(&self, segment: Segment, offset: usize) -> usize {
        segment.base().saturating_add(offset)
    }

    fn check_range(&self, addr: usize, len: usize) -> VmResult<()> {
        let end = addr
            .checked_add(len)
            .ok_or_else(|| VmError::Range(format!("address {addr} + {len} overflows")))?;
        if end > self.buf.len() {
            return Err(VmError::Range(format!(
                "access [{addr}, {end}) is outside memory of size {}",
                self.buf.len()
            )));
        }
        Ok(())
    }

    /// Read one byte at `addr`.
    pub fn read8(&self, addr: usize) -> VmResult<u8> {
        self.check_range(addr, 1)?;
        Ok(self.buf[addr])
    }

    /// Write one byte at `addr`.
    pub fn write8(&mut self, addr: usize, value: u8) -> VmResult<()> {
        self.check_range(addr, 1)?;
        self.buf[addr] = value;
        Ok(())
    }

    /// Read a little-endian 16-bit unsigned value at `addr`.
    pub fn read16(&self, addr: usize) -> VmResult<u16> {
        self.check_range(addr, 2)?;
        let bytes = [self.buf[addr], self.buf[addr + 1]];
        Ok(u16::from_le_bytes(bytes))
    }

    /// Write a little-endian 16-bit unsigned value at `addr`.
    pub fn write16(&mut self, addr: usize, value: u16) -> VmResult<()> {
        self.check_range(addr, 2)?;
        let bytes = value.to_le_bytes();
        self.buf[addr] = bytes[0];
        self.buf[addr + 1] = bytes[1];
        Ok(())
    }

    /// Read a little-endian signed 16-bit branch offset at `addr`.
    pub fn read_i16(&self, addr: usize) -> VmResult<i16> {
        Ok(self.read16(addr)? as i16)
    }

    /// Write a little-endian signed 16-bit branch offset at `addr`.
    pub fn write_i16(&mut self, addr: usize, value: i16) -> VmResult<()> {
        self.write16(addr, value as u16)
    }

    /// Read a little-endian IEEE-754 `f32` at `addr`.
    pub fn read_f32(&self, addr: usize) -> VmResult<f32> {
        self.check_range(addr, 4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.buf[addr..addr + 4]);
        Ok(f32::from_le_bytes(bytes))
    }

    /// Write a little-endian IEEE-754 `f32` at `addr`.
    pub fn write_f32(&mut self, addr: usize, value: f32) -> VmResult<()> {
        self.check_range(addr, 4)?;
        self.buf[addr..addr + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Read one [`Cell`] (4 raw bytes, bitwise) at `addr`. Used for stack
    /// and return-stack cells, where payload bits must survive untouched.
    pub fn read_cell(&self, addr: usize) -> VmResult<Cell> {
        self.check_range(addr, 4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.buf[addr..addr + 4]);
        Ok(Cell::from_bits(u32::from_le_bytes(bytes)))
    }

    /// Write one [`Cell`] (4 raw bytes, bitwise) at `addr`.
    pub fn write_cell(&mut self, addr: usize, cell: Cell) -> VmResult<()> {
        self.check_range(addr, 4)?;
        self.buf[addr..addr + 4].copy_from_slice(&cell.to_bits().to_le_bytes());
        Ok(())
    }

    /// Render `[start, end)` as a hex dump, one byte per `"XX "` group.
    pub fn dump(&self, start: usize, end: usize) -> VmResult<String> {
        if start > end {
            return Err(VmError::Range(format!(
                "dump range [{start}, {end}) has start after end"
            )));
        }
        self.check_range(start, end - start)?;
        Ok(self.buf[start..end].iter().map(|b| format!("{b:02x}")).join(" "))
    }

    /// Raw immutable access, for tests and the REPL's `.dump` helper.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
