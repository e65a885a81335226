use chipvm::{Config, Emulator, Status, VmError};
use rand::rngs::mock::StepRng;

fn rom(program: &[u16]) -> Vec<u8> {
    program.iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn emulator(steps_per_tick: usize, program: &[u16]) -> Emulator<StepRng> {
    let config = Config {
        steps_per_tick,
        ..Config::default()
    };
    let mut emu = Emulator::with_rng(config, StepRng::new(0, 1));
    emu.load_program(&rom(program)).unwrap();
    emu
}

fn run_steps(emu: &mut Emulator<StepRng>, steps: usize) {
    for _ in 0..steps {
        emu.step().unwrap();
    }
}

#[test]
fn load_register_sets_value_and_advances_two() {
    for x in 0..16u16 {
        for k in [0x00, 0x01, 0x7F, 0xFF] {
            let mut emu = emulator(1, &[0x6000 | x << 8 | k]);
            emu.step().unwrap();
            assert_eq!(emu.register_snapshot().v[x as usize], k as u8);
            assert_eq!(emu.pc(), 0x202);
        }
    }
}

#[test]
fn add_registers_sets_carry() {
    let mut emu = emulator(1, &[0x61FA, 0x620A, 0x8124]);
    run_steps(&mut emu, 3);
    let regs = emu.register_snapshot();
    assert_eq!((regs.v[1], regs.v[0xF]), (4, 1));

    let mut emu = emulator(1, &[0x6101, 0x6201, 0x8124]);
    run_steps(&mut emu, 3);
    let regs = emu.register_snapshot();
    assert_eq!((regs.v[1], regs.v[0xF]), (2, 0));
}

#[test]
fn clear_screen_clears_everything() {
    // two 8x15 blocks of 0xFF rows taken from 0x300, then clear
    let program = [0xA300, 0xD01F, 0x7008, 0xD01F, 0x00E0];
    let mut image = rom(&program);
    image.resize(0x100, 0);
    image.extend([0xFF; 15]);
    let mut emu = emulator(1, &[]);
    emu.load_program(&image).unwrap();

    run_steps(&mut emu, 4);
    assert_eq!(emu.display().pixels().iter().filter(|p| **p).count(), 240);
    emu.step().unwrap();
    assert_eq!(emu.pc(), 0x20A);
    assert!(emu.display().pixels().iter().all(|p| !p));
}

#[test]
fn drawing_twice_restores_the_screen() {
    let mut emu = emulator(1, &[0x603E, 0x611E, 0xA05A, 0xD015, 0xD015]);
    run_steps(&mut emu, 4);
    let drawn: Vec<bool> = emu.display().pixels().to_vec();
    assert!(drawn.iter().any(|p| *p));
    // wrapped past the right and bottom edges
    assert!(emu.display().get(0, 30));
    assert_eq!(emu.register_snapshot().v[0xF], 0);

    emu.step().unwrap();
    assert!(emu.display().pixels().iter().all(|p| !p));
    assert_eq!(emu.register_snapshot().v[0xF], 1);
}

#[test]
fn bcd_of_157() {
    let mut emu = emulator(1, &[0x659D, 0xA400, 0xF533]);
    run_steps(&mut emu, 3);
    assert_eq!(emu.memory_snapshot(0x400, 3).unwrap(), &[1, 5, 7]);
}

#[test]
fn shift_right_moves_low_bit_into_flag() {
    let mut emu = emulator(1, &[0x6303, 0x8306]);
    run_steps(&mut emu, 2);
    let regs = emu.register_snapshot();
    assert_eq!((regs.v[3], regs.v[0xF]), (0b01, 1));
}

#[test]
fn tick_decrements_timers_once() {
    // 200: V0 = 2, delay = V0, sound = V0, then spin
    let mut emu = emulator(4, &[0x6002, 0xF015, 0xF018, 0x1206]);
    emu.step_tick().unwrap();
    assert_eq!(emu.delay_timer(), 1);
    assert_eq!(emu.sound_timer(), 1);
    assert!(emu.sound_active());
    emu.step_tick().unwrap();
    assert_eq!(emu.delay_timer(), 0);
    emu.step_tick().unwrap();
    assert_eq!(emu.delay_timer(), 0);
    assert!(!emu.sound_active());
}

#[test]
fn wait_for_key_holds_pc_until_pressed() {
    let mut emu = emulator(15, &[0xF70A, 0x1202]);
    for _ in 0..3 {
        emu.step_tick().unwrap();
        assert_eq!(emu.pc(), 0x200);
        assert_eq!(emu.status(), Status::AwaitingKey(7));
    }

    emu.set_key(0xB, true);
    emu.set_key(0x5, true);
    emu.step().unwrap();
    assert_eq!(emu.pc(), 0x202);
    assert_eq!(emu.status(), Status::Running);
    assert_eq!(emu.register_snapshot().v[7], 0x5);
}

#[test]
fn wait_for_key_with_key_already_down() {
    let mut emu = emulator(1, &[0xF30A]);
    emu.keys_mut()[0xE] = true;
    emu.step_tick().unwrap();
    assert_eq!(emu.pc(), 0x202);
    assert_eq!(emu.register_snapshot().v[3], 0xE);
}

#[test]
fn program_size_limit() {
    let mut emu = Emulator::init();
    assert_eq!(
        emu.load_program(&[0x12; 3585]),
        Err(VmError::OutOfMemory {
            size: 3585,
            max: 3584
        })
    );

    let mut emu = Emulator::init();
    emu.load_program(&[0x12; 3584]).unwrap();
    let loaded = emu.memory_snapshot(0x200, 3584).unwrap();
    assert!(loaded.iter().all(|b| *b == 0x12));
    assert_eq!(emu.memory_snapshot(0xFFF, 1).unwrap(), &[0x12]);
}

#[test]
fn call_then_return_resumes_after_call() {
    // 200: jump 300, 300: call 400, 302: V1 = 1, 400: V0 = 9, 402: ret
    let mut image = rom(&[0x1300]);
    image.resize(0x100, 0);
    image.extend(rom(&[0x2400, 0x6101]));
    image.resize(0x200, 0);
    image.extend(rom(&[0x6009, 0x00EE]));

    let mut emu = emulator(1, &[]);
    emu.load_program(&image).unwrap();
    run_steps(&mut emu, 4);
    assert_eq!(emu.pc(), 0x302);
    assert_eq!(emu.stack_depth(), 0);
    emu.step().unwrap();
    let regs = emu.register_snapshot();
    assert_eq!((regs.v[0], regs.v[1]), (9, 1));
}

#[test]
fn errors_abort_the_tick_before_timers() {
    let mut emu = emulator(15, &[0x6005, 0xF015, 0x00EE]);
    assert_eq!(
        emu.step_tick(),
        Err(VmError::StackUnderflow { address: 0x204 })
    );
    assert_eq!(emu.delay_timer(), 5);
    assert_eq!(emu.pc(), 0x204);
}

#[test]
fn font_is_in_place_after_init() {
    let emu = Emulator::init();
    assert_eq!(
        emu.memory_snapshot(0x50, 5).unwrap(),
        &[0xF0, 0x90, 0x90, 0x90, 0xF0]
    );
    assert_eq!(
        emu.memory_snapshot(0x9B, 5).unwrap(),
        &[0xF0, 0x80, 0xF0, 0x80, 0x80]
    );
    assert!(emu.memory_snapshot(0xFFF, 2).is_err());
}
