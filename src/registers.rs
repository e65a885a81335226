use crate::memory::TypeAddr;

pub const FLAG_REGISTER: u8 = 0xF;

pub struct Registers {
    registers: [u8; 16],
}

impl Registers {
    pub fn new() -> Self {
        Self { registers: [0; 16] }
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[reg_num as usize] = value;
    }

    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let reg = &mut self.registers[reg_num as usize];
        *reg = reg.wrapping_add(value);
    }

    pub fn set_flag(&mut self, on: bool) {
        self.set_register(FLAG_REGISTER, on as u8);
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[reg_num as usize]
    }

    pub fn all(&self) -> [u8; 16] {
        self.registers
    }

    // V0..=Vx, as used by the register save/restore instructions
    pub fn up_to(&self, reg_num: u8) -> &[u8] {
        &self.registers[..=reg_num as usize]
    }

    pub fn up_to_mut(&mut self, reg_num: u8) -> &mut [u8] {
        &mut self.registers[..=reg_num as usize]
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl ProgramCounter {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(2);
    }

    pub fn skip(&mut self) {
        self.0 = self.0.wrapping_add(4);
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}

// Not masked to 12 bits; range checks happen on memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }

    pub fn offset(&mut self, by: u8) {
        self.0 = self.0.wrapping_add(by as TypeAddr);
    }
}
