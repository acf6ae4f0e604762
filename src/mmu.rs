//! Memory map and hardware plumbing.
//!
//! One flat 16-bit address space, dispatched by range to the component that
//! owns each region. Reads take `&mut self` because cartridge mappers may
//! have read side effects. Word access composes two byte accesses, low byte
//! at the lower address.

use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::interrupts::INT_MASK;
use crate::ppu::Ppu;
use crate::timer::Timer;

const WRAM_SIZE: usize = 0x2000;
const HRAM_SIZE: usize = 0x7F;
const IO_SIZE: usize = 0x80;

/// Length of one OAM DMA transfer.
const DMA_LEN: u16 = 0xA0;

pub struct Mmu {
    pub cartridge: Option<Box<dyn Cartridge>>,
    pub ppu: Ppu,
    pub apu: Apu,
    pub timer: Timer,
    wram: [u8; WRAM_SIZE],
    hram: [u8; HRAM_SIZE],
    /// Backing store for I/O addresses no component claims. Writes land
    /// here unchanged so software reads back what it wrote.
    io: [u8; IO_SIZE],
    pub if_reg: u8,
    pub ie_reg: u8,
}

impl Mmu {
    pub fn new() -> Self {
        Self {
            cartridge: None,
            ppu: Ppu::new(),
            apu: Apu::new(),
            timer: Timer::new(),
            wram: [0; WRAM_SIZE],
            hram: [0; HRAM_SIZE],
            io: [0; IO_SIZE],
            if_reg: 0,
            ie_reg: 0,
        }
    }

    pub fn load_cartridge(&mut self, cart: Box<dyn Cartridge>) {
        self.cartridge = Some(cart);
    }

    pub fn read_byte(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => match self.cartridge.as_mut() {
                Some(cart) => cart.read(addr),
                None => 0xFF,
            },
            0x8000..=0x9FFF => self.ppu.read(addr),
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            // Echo RAM mirrors 0xC000-0xDDFF.
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize],
            0xFE00..=0xFE9F => self.ppu.read(addr),
            // Unusable region.
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00 => 0xC0 | (self.io[0] & 0x30) | 0x0F,
            0xFF04..=0xFF07 => self.timer.read(addr),
            0xFF0F => self.if_reg | !INT_MASK,
            0xFF10..=0xFF3F => self.apu.read(addr),
            0xFF40..=0xFF4B => self.ppu.read(addr),
            0xFF00..=0xFF7F => self.io[(addr - 0xFF00) as usize],
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            0xFFFF => self.ie_reg,
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => {
                if let Some(cart) = self.cartridge.as_mut() {
                    cart.write(addr, val);
                }
            }
            0x8000..=0x9FFF => self.ppu.write(addr, val, &mut self.if_reg),
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = val,
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize] = val,
            0xFE00..=0xFE9F => self.ppu.write(addr, val, &mut self.if_reg),
            0xFEA0..=0xFEFF => {}
            0xFF00 => self.io[0] = val & 0x30,
            0xFF04..=0xFF07 => self.timer.write(addr, val),
            0xFF0F => self.if_reg = val & INT_MASK,
            0xFF10..=0xFF3F => self.apu.write(addr, val),
            // The DMA register both stores its value and kicks off the
            // transfer; only the bus sees enough of the address space to
            // perform the copy.
            0xFF46 => {
                self.ppu.write(addr, val, &mut self.if_reg);
                self.oam_dma(val);
            }
            0xFF40..=0xFF4B => self.ppu.write(addr, val, &mut self.if_reg),
            0xFF00..=0xFF7F => self.io[(addr - 0xFF00) as usize] = val,
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,
            0xFFFF => self.ie_reg = val,
        }
    }

    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read_byte(addr) as u16;
        let hi = self.read_byte(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub fn write_word(&mut self, addr: u16, val: u16) {
        self.write_byte(addr, val as u8);
        self.write_byte(addr.wrapping_add(1), (val >> 8) as u8);
    }

    /// Copy 0xA0 bytes from `source << 8` into OAM.
    fn oam_dma(&mut self, source: u8) {
        let base = (source as u16) << 8;
        for offset in 0..DMA_LEN {
            let byte = self.read_byte(base + offset);
            self.ppu.oam[offset as usize] = byte;
        }
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
