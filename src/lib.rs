// 16 8-bit data registers named V0 to VF
// I -> index register, 16 bits but used as a 12-bit address
//
// Stack of up to 16 return addresses
//
// Delay timer & Sound timer: count down once per tick until 0
// Beep while the sound timer is non-zero
//
// Display res: 64 width, 32 height
//
// 35 opcodes, each are 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier

pub mod config;
pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod timer;

pub use config::{Config, InvalidOpcodePolicy, DEFAULT_STEPS_PER_TICK};
pub use decode::OpCode;
pub use display::{FrameBuffer, HEIGHT, WIDTH};
pub use emulator::{Emulator, MemoryDump, RegisterSnapshot, Status};
pub use error::{Result, VmError};
