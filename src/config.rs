/// Fetch-decode-execute steps per timer tick. Tuned for a 60 Hz host.
pub const DEFAULT_STEPS_PER_TICK: usize = 15;

/// What to do with a word that decodes to no known instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidOpcodePolicy {
    /// Log it and move on to the next instruction.
    #[default]
    Ignore,
    /// Step past it, then abort the tick with `VmError::InvalidOpcode`.
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub steps_per_tick: usize,
    pub invalid_opcode: InvalidOpcodePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steps_per_tick: DEFAULT_STEPS_PER_TICK,
            invalid_opcode: InvalidOpcodePolicy::default(),
        }
    }
}
