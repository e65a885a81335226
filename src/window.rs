use anyhow::Context;
use chipvm::{FrameBuffer, HEIGHT, WIDTH};
use clap::ValueEnum;
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

const ON: u32 = from_u16_rgb(255, 255, 255);
const OFF: u32 = from_u16_rgb(0, 0, 0);

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WindowScale {
    X4,
    X8,
    X16,
    X32,
}

impl From<WindowScale> for Scale {
    fn from(scale: WindowScale) -> Self {
        match scale {
            WindowScale::X4 => Scale::X4,
            WindowScale::X8 => Scale::X8,
            WindowScale::X16 => Scale::X16,
            WindowScale::X32 => Scale::X32,
        }
    }
}

/// The host side of the screen and keypad.
pub struct Screen {
    pixel_buffer: Vec<u32>,
    window: Window,
}

impl Screen {
    pub fn new(scale: WindowScale) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "chipvm - P to pause, ESC to exit",
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale: scale.into(),
                ..WindowOptions::default()
            },
        )
        .context("opening window")?;
        // Limit to max ~60 fps update rate, which also paces the ticks
        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));
        Ok(Self {
            pixel_buffer: vec![OFF; WIDTH * HEIGHT],
            window,
        })
    }

    pub fn is_running(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    pub fn pause_pressed(&self) -> bool {
        self.window.is_key_pressed(Key::P, KeyRepeat::No)
    }

    /// Overwrites `keys` with what is held down right now.
    pub fn read_keys(&self, keys: &mut [bool; 16]) {
        keys.fill(false);
        for key in self.window.get_keys() {
            if let Some(n) = key_to_num(key) {
                keys[n as usize] = true;
            }
        }
    }

    pub fn draw(&mut self, fb: &FrameBuffer) -> anyhow::Result<()> {
        for (pixel, &bit) in self.pixel_buffer.iter_mut().zip(fb.pixels()) {
            *pixel = if bit { ON } else { OFF };
        }
        self.window
            .update_with_buffer(&self.pixel_buffer, WIDTH, HEIGHT)
            .context("presenting frame")
    }
}

const fn from_u16_rgb(r: u16, g: u16, b: u16) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}

// 1 2 3 C    1 2 3 4
// 4 5 6 D    Q W E R
// 7 8 9 E    A S D F
// A 0 B F    Z X C V
fn key_to_num(key: Key) -> Option<u8> {
    match key {
        Key::Key1 => Some(0x1),
        Key::Key2 => Some(0x2),
        Key::Key3 => Some(0x3),
        Key::Key4 => Some(0xC),
        Key::Q => Some(0x4),
        Key::W => Some(0x5),
        Key::E => Some(0x6),
        Key::R => Some(0xD),
        Key::A => Some(0x7),
        Key::S => Some(0x8),
        Key::D => Some(0x9),
        Key::F => Some(0xE),
        Key::Z => Some(0xA),
        Key::X => Some(0x0),
        Key::C => Some(0xB),
        Key::V => Some(0xF),
        _ => None,
    }
}
