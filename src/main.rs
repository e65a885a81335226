use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use chipvm::memory::MEMORY_SIZE;
use chipvm::{Config, Emulator, InvalidOpcodePolicy, DEFAULT_STEPS_PER_TICK};
use clap::Parser;
use log::{error, info};

use window::{Screen, WindowScale};

mod window;

const MEMORY_DUMP_LEN: usize = 16;

// Separately:
// CPU: steps_per_tick instructions per frame
// Display: 60 times per second
// Timer: 60 times per second

#[derive(Parser, Debug)]
#[command(version, about = "Runs a CHIP-8 rom in a window")]
struct Args {
    /// Path to the rom file
    rom: PathBuf,

    /// Instructions executed per 60 Hz tick
    #[arg(long, default_value_t = DEFAULT_STEPS_PER_TICK)]
    steps_per_tick: usize,

    /// Stop on invalid opcodes instead of skipping them
    #[arg(long)]
    strict: bool,

    #[arg(long, value_enum, default_value_t = WindowScale::X16)]
    scale: WindowScale,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rom = fs::read(&args.rom).with_context(|| format!("reading {}", args.rom.display()))?;
    let config = Config {
        steps_per_tick: args.steps_per_tick,
        invalid_opcode: if args.strict {
            InvalidOpcodePolicy::Report
        } else {
            InvalidOpcodePolicy::Ignore
        },
    };
    let mut emu = Emulator::with_config(config);
    emu.load_program(&rom).context("loading rom")?;
    info!("loaded {} ({} bytes)", args.rom.display(), rom.len());

    let mut screen = Screen::new(args.scale)?;
    let mut paused = false;
    let mut halted = false;
    let (mut ticks, mut frames) = (0u32, 0u32);
    let mut last_report = Instant::now();

    while screen.is_running() {
        if screen.pause_pressed() {
            paused = !paused;
            if paused {
                info!("paused at {:#05x}\n{}", emu.pc(), emu.register_snapshot());
                log_memory_around_pc(&emu);
            } else {
                info!("resumed");
            }
        }

        screen.read_keys(emu.keys_mut());
        if !paused && !halted {
            match emu.step_tick() {
                Ok(()) => ticks += 1,
                Err(err) => {
                    error!("halted at {:#05x}: {err}", emu.pc());
                    info!("\n{}", emu.register_snapshot());
                    log_memory_around_pc(&emu);
                    halted = true;
                }
            }
        }

        screen.draw(emu.display())?;
        frames += 1;

        if last_report.elapsed() >= Duration::from_secs(1) {
            info!("{ticks} ticks, {frames} fps");
            ticks = 0;
            frames = 0;
            last_report = Instant::now();
        }
    }

    Ok(())
}

// the next few instructions, clipped to the end of memory
fn log_memory_around_pc(emu: &Emulator) {
    let start = emu.pc() as usize;
    let length = MEMORY_DUMP_LEN.min(MEMORY_SIZE.saturating_sub(start));
    match emu.memory_dump(start, length) {
        Ok(dump) => info!("\n{dump}"),
        Err(err) => error!("no memory dump: {err}"),
    }
}
