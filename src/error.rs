use thiserror::Error;

use crate::memory::TypeAddr;

pub type Result<T> = std::result::Result<T, VmError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("program is {size} bytes, only {max} bytes fit above 0x200")]
    OutOfMemory { size: usize, max: usize },

    #[error("invalid opcode {opcode:#06X} at {address:#05X}")]
    InvalidOpcode { opcode: u16, address: TypeAddr },

    #[error("call stack overflow at {address:#05X}")]
    StackOverflow { address: TypeAddr },

    #[error("return with empty call stack at {address:#05X}")]
    StackUnderflow { address: TypeAddr },

    #[error("memory access out of bounds at {address:#06X}")]
    MemoryAccessOutOfBounds { address: usize },
}
