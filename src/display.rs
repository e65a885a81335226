pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// Monochrome 64x32 screen. Sprites are XORed in and wrap at both edges.
pub struct FrameBuffer {
    bit_buffer: [bool; WIDTH * HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bit_buffer: [false; WIDTH * HEIGHT],
        }
    }

    pub fn clear_buffer(&mut self) {
        self.bit_buffer = [false; WIDTH * HEIGHT];
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bit_buffer[(y % HEIGHT) * WIDTH + (x % WIDTH)]
    }

    /// Row-major pixels, `WIDTH` per row.
    pub fn pixels(&self) -> &[bool] {
        &self.bit_buffer
    }

    /// XORs `sprite` in with its top-left corner at (x, y).
    /// Returns true if any pixel that was on got switched off.
    pub fn paint(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (i, row) in sprite.iter().enumerate() {
            let ny = (y as usize + i) % HEIGHT;
            for j in 0..8 {
                let bit = (row >> (7 - j)) & 1 == 1;
                if !bit {
                    continue;
                }
                let nx = (x as usize + j) % WIDTH;
                let index = ny * WIDTH + nx;
                if self.bit_buffer[index] {
                    collision = true;
                }
                self.bit_buffer[index] ^= true;
            }
        }
        collision
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
