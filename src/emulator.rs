use std::fmt;

use log::{debug, trace, warn};
use rand::rngs::ThreadRng;
use rand::RngCore;

use crate::{
    config::{Config, InvalidOpcodePolicy},
    decode::OpCode,
    display::FrameBuffer,
    error::{Result, VmError},
    keyboard::Keyboard,
    memory::{Memory, TypeAddr, FONT_START, FONT_STRIDE},
    registers::Registers,
    timer::Timer,
};

/// Whether the next step fetches an instruction or keeps polling the keys for FX0A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    AwaitingKey(u8),
}

/// How pc moves once an instruction has run.
enum Flow {
    Next,
    Skip,
    Goto(TypeAddr),
    Wait,
}

impl Flow {
    fn skip_if(cond: bool) -> Self {
        if cond {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub v: [u8; 16],
    pub i: TypeAddr,
}

impl fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== Register Contents =====")?;
        for (n, value) in self.v.iter().enumerate() {
            writeln!(f, "\tV[{n:x}] = {value:#04x}")?;
        }
        writeln!(f, "\tI = {:#06x}", self.i)?;
        write!(f, "===== End of Dump =====")
    }
}

/// A run of memory starting at `start`, printed one byte per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryDump<'a> {
    pub start: usize,
    pub bytes: &'a [u8],
}

impl fmt::Display for MemoryDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.start + self.bytes.len();
        writeln!(f, "===== Memory Contents from {:#05x} to {end:#05x} =====", self.start)?;
        for (offset, value) in self.bytes.iter().enumerate() {
            writeln!(f, "\tmem[{:#05x}] = {value:#04x}", self.start + offset)?;
        }
        write!(f, "===== End of Dump =====")
    }
}

pub struct Emulator<R = ThreadRng> {
    fb: FrameBuffer,
    pub(crate) regs: Registers,
    pub(crate) mem: Memory,
    keyboard: Keyboard,
    delay_timer: Timer,
    sound_timer: Timer,
    opcode: u16,
    status: Status,
    rejected_load: Option<VmError>,
    config: Config,
    rng: R,
}

impl Emulator<ThreadRng> {
    pub fn init() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_rng(config, rand::thread_rng())
    }
}

impl Default for Emulator<ThreadRng> {
    fn default() -> Self {
        Self::init()
    }
}

impl<R: RngCore> Emulator<R> {
    pub fn with_rng(config: Config, rng: R) -> Self {
        Self {
            fb: FrameBuffer::new(),
            regs: Registers::new(),
            mem: Memory::new(),
            keyboard: Keyboard::new(),
            delay_timer: Timer::new(0),
            sound_timer: Timer::new(0),
            opcode: 0,
            status: Status::Running,
            rejected_load: None,
            config,
            rng,
        }
    }

    /// Back to power-on state: everything zeroed, font in place, pc at 0x200.
    pub fn reset(&mut self) {
        self.fb.clear_buffer();
        self.regs = Registers::new();
        self.mem.reset();
        self.keyboard.reset();
        self.delay_timer = Timer::new(0);
        self.sound_timer = Timer::new(0);
        self.opcode = 0;
        self.status = Status::Running;
        self.rejected_load = None;
        debug!("emulator reset");
    }

    /// Copies `rom` to 0x200. An oversized rom is rejected and the
    /// emulator refuses to tick until a rom fits.
    pub fn load_program(&mut self, rom: &[u8]) -> Result<()> {
        let res = self.mem.load_rom(rom);
        self.rejected_load = res.as_ref().err().cloned();
        res
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn display(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn pc(&self) -> TypeAddr {
        self.mem.pc.0
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn stack_depth(&self) -> usize {
        self.mem.stack.depth()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.count
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.count
    }

    /// The host should be beeping.
    pub fn sound_active(&self) -> bool {
        self.sound_timer.is_active()
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.keyboard.set(key, pressed);
    }

    pub fn keys_mut(&mut self) -> &mut [bool; 16] {
        self.keyboard.keys_mut()
    }

    pub fn register_snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            v: self.regs.all(),
            i: self.mem.index.0,
        }
    }

    pub fn memory_snapshot(&self, start: usize, length: usize) -> Result<&[u8]> {
        self.mem.slice(start, length)
    }

    pub fn memory_dump(&self, start: usize, length: usize) -> Result<MemoryDump<'_>> {
        Ok(MemoryDump {
            start,
            bytes: self.memory_snapshot(start, length)?,
        })
    }

    pub fn fetch_decode(&mut self) -> Result<OpCode> {
        self.opcode = self.mem.next_instruction()?;
        Ok(OpCode::decode_raw(self.opcode))
    }

    /// One fetch-decode-execute step. While waiting on FX0A this only polls the keys.
    pub fn step(&mut self) -> Result<()> {
        if let Status::AwaitingKey(vx) = self.status {
            if let Some(key) = self.keyboard.first_pressed() {
                self.regs.set_register(vx, key);
                self.status = Status::Running;
                self.mem.pc.increment();
            }
            return Ok(());
        }

        let address = self.pc();
        let operation = self.fetch_decode()?;
        trace!("{address:#05x}: {:04x} {operation:?}", self.opcode);

        match self.execute_ins(operation)? {
            Flow::Next => self.mem.pc.increment(),
            Flow::Skip => self.mem.pc.skip(),
            Flow::Goto(addr) => self.mem.pc.set_addr(addr),
            Flow::Wait => {}
        }

        match operation {
            OpCode::Unknown(opcode) => match self.config.invalid_opcode {
                InvalidOpcodePolicy::Ignore => {
                    warn!("skipping invalid opcode {opcode:#06x} at {address:#05x}");
                    Ok(())
                }
                InvalidOpcodePolicy::Report => Err(VmError::InvalidOpcode { opcode, address }),
            },
            _ => Ok(()),
        }
    }

    /// Runs `steps_per_tick` steps, then counts both timers down once.
    /// An error aborts the tick before the timers move.
    pub fn step_tick(&mut self) -> Result<()> {
        if let Some(err) = &self.rejected_load {
            return Err(err.clone());
        }
        for _ in 0..self.config.steps_per_tick {
            self.step()?;
        }
        self.sync_timers();
        Ok(())
    }

    pub fn sync_timers(&mut self) {
        self.delay_timer.sync();
        self.sound_timer.sync();
    }

    fn execute_ins(&mut self, ins: OpCode) -> Result<Flow> {
        let flow = match ins {
            OpCode::ClearScreen => {
                self.fb.clear_buffer();
                Flow::Next
            }
            OpCode::PopSubroutine => {
                let addr = self.mem.stack.pop().ok_or(VmError::StackUnderflow {
                    address: self.pc(),
                })?;
                // addr is the call itself
                self.mem.pc.set_addr(addr);
                Flow::Next
            }
            OpCode::Jump(addr) => Flow::Goto(addr),
            OpCode::PushSubroutine(addr) => {
                let ret = self.pc();
                self.mem.stack.push(ret)?;
                Flow::Goto(addr)
            }
            OpCode::SkipEqualConstant(vx, nn) => Flow::skip_if(self.regs.get(vx) == nn),
            OpCode::SkipNotEqualConstant(vx, nn) => Flow::skip_if(self.regs.get(vx) != nn),
            OpCode::SkipEqualRegister(vx, vy) => {
                Flow::skip_if(self.regs.get(vx) == self.regs.get(vy))
            }
            OpCode::SkipNotEqualRegister(vx, vy) => {
                Flow::skip_if(self.regs.get(vx) != self.regs.get(vy))
            }
            OpCode::SetRegister(vx, nn) => {
                self.regs.set_register(vx, nn);
                Flow::Next
            }
            OpCode::AddToRegister(vx, nn) => {
                self.regs.add_to_register(vx, nn);
                Flow::Next
            }
            OpCode::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy));
                Flow::Next
            }
            OpCode::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) | self.regs.get(vy));
                Flow::Next
            }
            OpCode::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) & self.regs.get(vy));
                Flow::Next
            }
            OpCode::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) ^ self.regs.get(vy));
                Flow::Next
            }
            // VF is written before Vx here, so the result wins when x is F
            OpCode::Add(vx, vy) => {
                let (z, carry) = self.regs.get(vx).overflowing_add(self.regs.get(vy));
                self.regs.set_flag(carry);
                self.regs.set_register(vx, z);
                Flow::Next
            }
            OpCode::SubtractForward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_flag(x > y);
                self.regs.set_register(vx, x.wrapping_sub(y));
                Flow::Next
            }
            OpCode::SubtractBackward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_flag(y > x);
                self.regs.set_register(vx, y.wrapping_sub(x));
                Flow::Next
            }
            OpCode::RightShift(vx, _) => {
                let vx_value = self.regs.get(vx);
                self.regs.set_flag(vx_value & 1 == 1);
                self.regs.set_register(vx, vx_value >> 1);
                Flow::Next
            }
            OpCode::LeftShift(vx, _) => {
                let vx_value = self.regs.get(vx);
                self.regs.set_flag(vx_value & 0x80 != 0);
                self.regs.set_register(vx, vx_value << 1);
                Flow::Next
            }
            OpCode::SetIndexRegister(addr) => {
                self.mem.index.set_addr(addr);
                Flow::Next
            }
            OpCode::JumpWithOffset(addr) => Flow::Goto(addr + self.regs.get(0) as TypeAddr),
            OpCode::Random(vx, nn) => {
                let ransuu = (self.rng.next_u32() & 0xFF) as u8;
                self.regs.set_register(vx, nn & ransuu);
                Flow::Next
            }
            OpCode::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x), self.regs.get(reg_y));
                let sprite = self.mem.slice(self.mem.index.0 as usize, height as usize)?;
                let vf = self.fb.paint(x, y, sprite);
                self.regs.set_flag(vf);
                Flow::Next
            }
            OpCode::SkipIfPressed(vx) => {
                Flow::skip_if(self.keyboard.get_key_status_from_num(self.regs.get(vx)))
            }
            OpCode::SkipIfNotPressed(vx) => {
                Flow::skip_if(!self.keyboard.get_key_status_from_num(self.regs.get(vx)))
            }
            OpCode::CopyDelayToRegister(vx) => {
                self.regs.set_register(vx, self.delay_timer.count);
                Flow::Next
            }
            OpCode::GetKey(vx) => match self.keyboard.first_pressed() {
                Some(key) => {
                    self.regs.set_register(vx, key);
                    Flow::Next
                }
                None => {
                    self.status = Status::AwaitingKey(vx);
                    Flow::Wait
                }
            },
            OpCode::CopyRegisterToDelay(vx) => {
                self.delay_timer.set(self.regs.get(vx));
                Flow::Next
            }
            OpCode::CopyRegisterToSound(vx) => {
                self.sound_timer.set(self.regs.get(vx));
                Flow::Next
            }
            OpCode::AddToIndex(vx) => {
                self.mem.index.offset(self.regs.get(vx));
                Flow::Next
            }
            OpCode::PointChar(vx) => {
                // only the decimal digit glyphs are reachable
                let glyph = (self.regs.get(vx) % 10) as usize;
                self.mem
                    .index
                    .set_addr((FONT_START + glyph * FONT_STRIDE) as TypeAddr);
                Flow::Next
            }
            OpCode::ToDecimal(vx) => {
                let value = self.regs.get(vx);
                let digits = self.mem.slice_mut(self.mem.index.0 as usize, 3)?;
                digits.copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
                Flow::Next
            }
            OpCode::StoreRegisterToMemory(vx) => {
                let len = vx as usize + 1;
                let dest = self.mem.slice_mut(self.mem.index.0 as usize, len)?;
                dest.copy_from_slice(self.regs.up_to(vx));
                Flow::Next
            }
            OpCode::LoadRegisterFromMemory(vx) => {
                let len = vx as usize + 1;
                let src = self.mem.slice(self.mem.index.0 as usize, len)?;
                self.regs.up_to_mut(vx).copy_from_slice(src);
                Flow::Next
            }
            OpCode::Unknown(_) => Flow::Next,
        };
        Ok(flow)
    }
}
