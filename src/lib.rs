//! SM83 execution core.
//!
//! Platform-agnostic emulation of the Game Boy's CPU, memory map, timer,
//! display scanline timing and interrupt machinery, driven in lockstep by a
//! cooperative clock. Frontends supply a [`ppu::DisplaySink`] for pixels and
//! a [`cartridge::Cartridge`] for banked ROM/RAM; everything else lives in
//! this crate and is reached through the [`gameboy`] facade.

/// Arithmetic/logic primitives with bit-exact flag results.
pub mod alu;

/// Sound register block.
pub mod apu;

/// Cartridge interface and ROM header parsing.
pub mod cartridge;

/// Cooperative round-robin scheduler and frame pacing.
pub mod clock;

/// Instruction executor.
pub mod cpu;

/// Debug configuration, breakpoints and state snapshots.
pub mod diagnostics;

/// Fatal error taxonomy.
pub mod errors;

/// High-level facade that wires the CPU, bus and clock into one machine.
pub mod gameboy;

/// Interrupt sources, priorities and eligibility.
pub mod interrupts;

/// Memory map and hardware plumbing.
pub mod mmu;

/// Static instruction-set description.
pub mod opcodes;

/// Display scanline engine.
pub mod ppu;

/// The SM83 register bank.
pub mod registers;

/// Divider/timer unit.
pub mod timer;
