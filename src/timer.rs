/// 8-bit countdown, decremented once per tick until it reaches 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timer {
    pub count: u8,
}

impl Timer {
    pub fn new(init_count: u8) -> Self {
        Self { count: init_count }
    }

    pub fn set(&mut self, value: u8) {
        self.count = value;
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }

    pub fn sync(&mut self) {
        self.count = self.count.saturating_sub(1);
    }
}
