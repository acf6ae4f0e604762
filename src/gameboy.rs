//! High-level facade wiring the CPU, bus and clock into one machine.

use crate::cartridge::{Cartridge, FlatCart};
use crate::clock::{Clock, ClockState};
use crate::cpu::Cpu;
use crate::diagnostics::{self, DebugConfig};
use crate::mmu::Mmu;
use crate::ppu::DisplaySink;

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
    pub clock: Clock,
}

impl GameBoy {
    pub fn new() -> Self {
        Self::with_debug(DebugConfig::default())
    }

    pub fn with_debug(debug: DebugConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            mmu: Mmu::new(),
            clock: Clock::new(debug),
        }
    }

    /// Load a ROM image as a flat, unbanked cartridge.
    pub fn load_rom(&mut self, rom: Vec<u8>) {
        self.mmu.load_cartridge(Box::new(FlatCart::new(rom)));
    }

    /// Load a cartridge with its own mapper behavior.
    pub fn load_cartridge(&mut self, cart: Box<dyn Cartridge>) {
        self.mmu.load_cartridge(cart);
    }

    /// Return the machine to its post-boot state, keeping the loaded
    /// cartridge and debug configuration.
    pub fn reset(&mut self) {
        let cart = self.mmu.cartridge.take();
        self.cpu = Cpu::new();
        self.mmu = Mmu::new();
        self.mmu.cartridge = cart;
    }

    /// One clock tick; see [`Clock::tick`].
    pub fn step(&mut self, sink: &mut dyn DisplaySink) -> u32 {
        self.clock.tick(&mut self.cpu, &mut self.mmu, sink)
    }

    /// Run one frame's worth of cycles; see [`Clock::run_frame`].
    pub fn run_frame(&mut self, sink: &mut dyn DisplaySink) -> u32 {
        self.clock.run_frame(&mut self.cpu, &mut self.mmu, sink)
    }

    pub fn state(&self) -> &ClockState {
        self.clock.state()
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// Register/flag dump plus the disassembly at PC.
    pub fn debug_state(&mut self) -> String {
        diagnostics::debug_state(&self.cpu, &mut self.mmu)
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}
