use log::debug;

use crate::error::{Result, VmError};
use crate::registers::{IndexRegister, ProgramCounter};

pub type TypeAddr = u16; // in reality u12

pub const MEMORY_SIZE: usize = 4096;
pub const FONT_START: usize = 0x50;
pub const FONT_STRIDE: usize = 5;
pub const PROGRAM_START: usize = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START;
pub const STACK_DEPTH: usize = 16;

type FontBytes = [u8; FONT_STRIDE * 16];

pub const DEFAULT_FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub struct Memory {
    // 4k bytes
    // font data stored from 050 -> 09F (000 -> 04F is empty by convention)
    bytes: [u8; MEMORY_SIZE],
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    pub stack: Stack,
}

impl Memory {
    pub fn new() -> Self {
        let mut mem = Self {
            bytes: [0; MEMORY_SIZE],
            pc: ProgramCounter(PROGRAM_START as TypeAddr),
            index: IndexRegister(0x0),
            stack: Stack::new(),
        };
        mem.load_font();
        mem
    }

    /// Zeroes everything, then puts the font back at 0x050.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn load_font(&mut self) {
        self.bytes[FONT_START..FONT_START + DEFAULT_FONT.len()].copy_from_slice(&DEFAULT_FONT);
    }

    pub fn get(&self, addr: usize) -> Result<u8> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(VmError::MemoryAccessOutOfBounds { address: addr })
    }

    /// `len` bytes starting at `start`, or the first address that falls outside memory.
    pub fn slice(&self, start: usize, len: usize) -> Result<&[u8]> {
        check_range(start, len)?;
        Ok(&self.bytes[start..start + len])
    }

    pub fn slice_mut(&mut self, start: usize, len: usize) -> Result<&mut [u8]> {
        check_range(start, len)?;
        Ok(&mut self.bytes[start..start + len])
    }

    /// Reads the big-endian word at pc. Does not move pc.
    pub fn next_instruction(&self) -> Result<u16> {
        let pc = self.pc.0 as usize;
        let (l, r) = (self.get(pc)?, self.get(pc + 1)?);
        Ok(((l as u16) << 8) | r as u16)
    }

    // loads program instructions starting at address 0x200
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_PROGRAM_SIZE {
            return Err(VmError::OutOfMemory {
                size: bytes.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        self.bytes[PROGRAM_START..].fill(0);
        self.bytes[PROGRAM_START..PROGRAM_START + bytes.len()].copy_from_slice(bytes);
        debug!("loaded {} byte program at {:#05x}", bytes.len(), PROGRAM_START);
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range(start: usize, len: usize) -> Result<()> {
    match start.checked_add(len) {
        Some(end) if end <= MEMORY_SIZE => Ok(()),
        _ => Err(VmError::MemoryAccessOutOfBounds {
            address: start.max(MEMORY_SIZE),
        }),
    }
}

/// Return addresses of active subroutine calls, at most `STACK_DEPTH` deep.
pub struct Stack {
    addresses: Vec<TypeAddr>,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: Vec::with_capacity(STACK_DEPTH),
        }
    }

    pub fn push(&mut self, addr: TypeAddr) -> Result<()> {
        if self.addresses.len() == STACK_DEPTH {
            return Err(VmError::StackOverflow { address: addr });
        }
        self.addresses.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<TypeAddr> {
        self.addresses.pop()
    }

    pub fn depth(&self) -> usize {
        self.addresses.len()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_is_loaded_at_0x50() {
        let mem = Memory::new();
        assert_eq!(mem.slice(FONT_START, 80).unwrap(), &DEFAULT_FONT[..]);
        assert_eq!(mem.get(0x4F).unwrap(), 0);
        assert_eq!(mem.get(0xA0).unwrap(), 0);
        assert_eq!(mem.pc.0, 0x200);
    }

    #[test]
    fn rejects_oversized_rom() {
        let mut mem = Memory::new();
        let err = mem.load_rom(&[0xAA; MAX_PROGRAM_SIZE + 1]).unwrap_err();
        assert_eq!(
            err,
            VmError::OutOfMemory {
                size: 3585,
                max: 3584
            }
        );
        assert_eq!(mem.get(PROGRAM_START).unwrap(), 0);
    }

    #[test]
    fn full_size_rom_fills_to_the_end() {
        let mut mem = Memory::new();
        mem.load_rom(&[0xAA; MAX_PROGRAM_SIZE]).unwrap();
        assert_eq!(mem.get(0x200).unwrap(), 0xAA);
        assert_eq!(mem.get(0xFFF).unwrap(), 0xAA);
        assert_eq!(mem.get(0x1FF).unwrap(), 0);
    }

    #[test]
    fn out_of_range_access_is_reported() {
        let mut mem = Memory::new();
        assert_eq!(
            mem.get(0x1000),
            Err(VmError::MemoryAccessOutOfBounds { address: 0x1000 })
        );
        assert!(mem.slice_mut(0x1000, 1).is_err());
        assert!(mem.slice(0xFFE, 3).is_err());
        assert_eq!(mem.slice(0xFFE, 2).unwrap().len(), 2);
    }

    #[test]
    fn fetch_needs_both_bytes_in_memory() {
        let mut mem = Memory::new();
        mem.pc.set_addr(0xFFF);
        assert_eq!(
            mem.next_instruction(),
            Err(VmError::MemoryAccessOutOfBounds { address: 0x1000 })
        );
    }

    #[test]
    fn stack_is_bounded() {
        let mut stack = Stack::new();
        for i in 0..STACK_DEPTH {
            stack.push(0x200 + 2 * i as TypeAddr).unwrap();
        }
        assert_eq!(
            stack.push(0x300),
            Err(VmError::StackOverflow { address: 0x300 })
        );
        assert_eq!(stack.depth(), STACK_DEPTH);
        assert_eq!(stack.pop(), Some(0x21E));
    }
}
