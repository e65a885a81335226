pub const KEY_COUNT: usize = 16;

/// Pressed state of the sixteen hex keys, indexed by key value 0x0..=0xF.
/// Written by the host, read by the skip and wait instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keyboard {
    keys: [bool; KEY_COUNT],
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            keys: [false; KEY_COUNT],
        }
    }

    pub fn reset(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    pub fn set(&mut self, n: u8, pressed: bool) {
        if let Some(key) = self.keys.get_mut(n as usize) {
            *key = pressed;
        }
    }

    // register values above 0xF name no key
    pub fn get_key_status_from_num(&self, n: u8) -> bool {
        self.keys.get(n as usize).copied().unwrap_or(false)
    }

    /// Lowest pressed key, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|n| n as u8)
    }

    pub fn keys_mut(&mut self) -> &mut [bool; KEY_COUNT] {
        &mut self.keys
    }
}
