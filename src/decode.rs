use crate::memory::TypeAddr;

/// A raw instruction word split into its nibbles and operand fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInstruction {
    pub n1: u8,
    pub n2: u8,
    pub n3: u8,
    pub n4: u8,
    pub kk: u8,
    pub nnn: TypeAddr,
}

impl RawInstruction {
    pub fn new(code: u16) -> Self {
        RawInstruction {
            n1: (code >> 12) as u8,
            n2: ((code >> 8) & 0xF) as u8,
            n3: ((code >> 4) & 0xF) as u8,
            n4: (code & 0xF) as u8,
            kk: (code & 0xFF) as u8,
            nnn: code & 0xFFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    // 00E0
    // turn all pixels to 0
    ClearScreen,
    // 1NNN
    // set PC to address NNN, "jump" to memory location
    Jump(TypeAddr),
    // 6XNN
    // set register VX to value NN
    SetRegister(u8, u8),
    // 7XNN
    // add value NN to VX, no carry
    AddToRegister(u8, u8),
    // ANNN
    // set index register I to address NNN
    SetIndexRegister(TypeAddr),
    // DXYN
    // draw an N pixel tall sprite from I at (VX, VY), wrapping at the edges
    // VF set to 1 if any lit pixel was switched off
    Display(u8, u8, u8),

    // 2NNN
    PushSubroutine(TypeAddr),
    // 00EE
    PopSubroutine,

    // 3XNN
    SkipEqualConstant(u8, u8),
    // 4XNN
    SkipNotEqualConstant(u8, u8),
    // 5XY0
    SkipEqualRegister(u8, u8),
    // 9XY0
    SkipNotEqualRegister(u8, u8),

    // 8XY0
    CopyRegister(u8, u8),
    // 8XY1
    Or(u8, u8),
    // 8XY2
    And(u8, u8),
    // 8XY3
    XOr(u8, u8),
    // 8XY4
    Add(u8, u8),
    // 8XY5
    SubtractForward(u8, u8),
    // 8XY7
    SubtractBackward(u8, u8),
    // 8XYE, Y unused
    LeftShift(u8, u8),
    // 8XY6, Y unused
    RightShift(u8, u8),

    // BNNN
    JumpWithOffset(TypeAddr),
    // CXNN
    Random(u8, u8),

    // EX9E
    SkipIfPressed(u8),
    // EXA1
    SkipIfNotPressed(u8),

    // FX07
    CopyDelayToRegister(u8),
    // FX0A
    GetKey(u8),
    // FX15
    CopyRegisterToDelay(u8),
    // FX18
    CopyRegisterToSound(u8),
    // FX1E
    AddToIndex(u8),
    // FX29
    PointChar(u8),
    // FX33
    ToDecimal(u8),
    // FX55
    StoreRegisterToMemory(u8),
    // FX65
    LoadRegisterFromMemory(u8),

    // anything else, with the word it came from
    Unknown(u16),
}

impl OpCode {
    pub fn decode_raw(ins: u16) -> Self {
        let raw = RawInstruction::new(ins);
        let (x, y) = (raw.n2, raw.n3);

        match raw.n1 {
            0x0 => match raw.nnn {
                0x0E0 => Self::ClearScreen,
                0x0EE => Self::PopSubroutine,
                _ => Self::Unknown(ins),
            },
            0x1 => Self::Jump(raw.nnn),
            0x2 => Self::PushSubroutine(raw.nnn),
            0x3 => Self::SkipEqualConstant(x, raw.kk),
            0x4 => Self::SkipNotEqualConstant(x, raw.kk),
            // the low nibble of 5XY_ and 9XY_ is not checked
            0x5 => Self::SkipEqualRegister(x, y),
            0x6 => Self::SetRegister(x, raw.kk),
            0x7 => Self::AddToRegister(x, raw.kk),
            0x8 => match raw.n4 {
                0x0 => Self::CopyRegister(x, y),
                0x1 => Self::Or(x, y),
                0x2 => Self::And(x, y),
                0x3 => Self::XOr(x, y),
                0x4 => Self::Add(x, y),
                0x5 => Self::SubtractForward(x, y),
                0x6 => Self::RightShift(x, y),
                0x7 => Self::SubtractBackward(x, y),
                0xE => Self::LeftShift(x, y),
                _ => Self::Unknown(ins),
            },
            0x9 => Self::SkipNotEqualRegister(x, y),
            0xA => Self::SetIndexRegister(raw.nnn),
            0xB => Self::JumpWithOffset(raw.nnn),
            0xC => Self::Random(x, raw.kk),
            0xD => Self::Display(x, y, raw.n4),
            0xE => match raw.kk {
                0x9E => Self::SkipIfPressed(x),
                0xA1 => Self::SkipIfNotPressed(x),
                _ => Self::Unknown(ins),
            },
            0xF => match raw.kk {
                0x07 => Self::CopyDelayToRegister(x),
                0x0A => Self::GetKey(x),
                0x15 => Self::CopyRegisterToDelay(x),
                0x18 => Self::CopyRegisterToSound(x),
                0x1E => Self::AddToIndex(x),
                0x29 => Self::PointChar(x),
                0x33 => Self::ToDecimal(x),
                0x55 => Self::StoreRegisterToMemory(x),
                0x65 => Self::LoadRegisterFromMemory(x),
                _ => Self::Unknown(ins),
            },
            _ => Self::Unknown(ins),
        }
    }
}
