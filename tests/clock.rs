//! Scheduler behavior through the machine facade.

use dmg_core::clock::{ClockState, FRAME_CYCLES, PauseReason};
use dmg_core::diagnostics::{Breakpoint, DebugConfig};
use dmg_core::errors::CoreError;
use dmg_core::gameboy::GameBoy;
use dmg_core::interrupts::INT_VBLANK;
use dmg_core::ppu::{DisplaySink, NullSink, SCREEN_HEIGHT, SCREEN_WIDTH};

fn machine(program: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new();
    for (i, &byte) in program.iter().enumerate() {
        gb.mmu.write_byte(0xC000 + i as u16, byte);
    }
    gb.cpu.regs.pc = 0xC000;
    gb
}

#[test]
fn one_frame_reaches_vblank_and_refreshes_once() {
    struct Counter {
        pixels: usize,
        refreshes: usize,
    }
    impl DisplaySink for Counter {
        fn set_pixel(&mut self, _x: u8, _y: u8, _color: u32) {
            self.pixels += 1;
        }
        fn request_refresh(&mut self) {
            self.refreshes += 1;
        }
    }

    let mut gb = machine(&[0x18, 0xFE]); // JR -2
    let mut sink = Counter { pixels: 0, refreshes: 0 };
    let total = gb.run_frame(&mut sink);
    assert!(total >= FRAME_CYCLES);
    assert_eq!(sink.refreshes, 1);
    assert_eq!(sink.pixels, SCREEN_WIDTH * SCREEN_HEIGHT);
    assert_ne!(gb.mmu.if_reg & INT_VBLANK, 0);
}

#[test]
fn illegal_opcode_pauses_with_fault() {
    let mut gb = machine(&[0x00, 0x00, 0xED]); // two NOPs, then illegal
    let total = gb.run_frame(&mut NullSink);
    assert_eq!(total, 8); // both NOPs ran before the fault
    match gb.state() {
        ClockState::Paused(PauseReason::Fault(CoreError::IllegalOpcode { opcode, pc })) => {
            assert_eq!(*opcode, 0xED);
            assert_eq!(*pc, 0xC002);
        }
        other => panic!("expected fault pause, got {other:?}"),
    }
    // Machine state is frozen at the fault.
    assert_eq!(gb.cpu.regs.pc, 0xC002);
    assert_eq!(gb.step(&mut NullSink), 0);
}

#[test]
fn breakpoint_roundtrip_through_facade() {
    let debug = DebugConfig::default().with_breakpoint(Breakpoint::Address(0xC002));
    let mut gb = GameBoy::with_debug(debug);
    for (i, &byte) in [0x04u8, 0x04, 0x04, 0x18, 0xFB].iter().enumerate() {
        gb.mmu.write_byte(0xC000 + i as u16, byte);
    }
    gb.cpu.regs.pc = 0xC000;

    gb.run_frame(&mut NullSink);
    assert_eq!(gb.cpu.regs.b, 2); // paused before the third INC B
    assert_eq!(
        gb.state(),
        &ClockState::Paused(PauseReason::Breakpoint { pc: 0xC002, opcode: 0x04 })
    );

    gb.resume();
    assert_eq!(gb.step(&mut NullSink), 4);
    assert_eq!(gb.cpu.regs.b, 3);
}

#[test]
fn debug_state_snapshot_reads_cleanly() {
    let mut gb = machine(&[0x3E, 0x42]); // LD A,0x42
    let state = gb.debug_state();
    assert!(state.contains("LD A,d8"));
    assert!(state.contains("PC:C000"));
}

#[test]
fn reset_returns_to_post_boot_but_keeps_cartridge() {
    let mut gb = GameBoy::new();
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100] = 0x3C; // INC A at the entry point
    gb.load_rom(rom);

    gb.step(&mut NullSink);
    assert_eq!(gb.cpu.regs.a, 0x02); // post-boot A=0x01 incremented
    gb.mmu.write_byte(0xC000, 0x55);

    gb.reset();
    assert_eq!(gb.cpu.regs.pc, 0x0100);
    assert_eq!(gb.cpu.regs.a, 0x01);
    assert_eq!(gb.mmu.read_byte(0xC000), 0); // WRAM cleared
    assert_eq!(gb.mmu.read_byte(0x0100), 0x3C); // ROM still mapped
}

#[test]
fn frames_keep_pace_across_calls() {
    let mut gb = machine(&[0x18, 0xFE]);
    let mut total = 0u64;
    for _ in 0..3 {
        total += gb.run_frame(&mut NullSink) as u64;
    }
    assert!(total >= 3 * FRAME_CYCLES as u64);
    assert_eq!(gb.cpu.cycles, total);
}
