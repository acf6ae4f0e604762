//! Display scanline engine.
//!
//! The core models LCD *timing*: the mode 2 → 3 → 0 cadence across 144
//! visible lines, ten lines of VBlank, LY/LYC comparison, and the STAT and
//! VBlank interrupts those transitions raise. Pixel output goes through the
//! [`DisplaySink`] trait one completed scanline at a time; what the sink
//! does with the pixels is a frontend concern.

use crate::interrupts::{self, Interrupt};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Timing per LCD mode in T-cycles
const MODE0_CYCLES: u32 = 204; // HBlank
const MODE1_CYCLES: u32 = 456; // One line during VBlank
const MODE2_CYCLES: u32 = 80; // OAM scan
const MODE3_CYCLES: u32 = 172; // Pixel transfer

const VBLANK_LINES: u8 = 10;

const VRAM_SIZE: usize = 0x2000;
const OAM_SIZE: usize = 0xA0;

// VRAM layout
const BG_MAP_0_BASE: usize = 0x1800;
const BG_MAP_1_BASE: usize = 0x1C00;

const MODE_HBLANK: u8 = 0;
const MODE_VBLANK: u8 = 1;
const MODE_OAM: u8 = 2;
const MODE_TRANSFER: u8 = 3;

/// The four DMG shades as 32-bit ARGB, lightest first.
pub const SHADES: [u32; 4] = [0xFFFF_FFFF, 0xFFAA_AAAA, 0xFF55_5555, 0xFF00_0000];

/// Receiver for rendered output. The engine pushes one scanline of pixels
/// when pixel transfer for that line completes, and asks for a refresh once
/// per frame on VBlank entry.
pub trait DisplaySink {
    fn set_pixel(&mut self, x: u8, y: u8, color: u32);
    fn request_refresh(&mut self);
}

/// Sink that discards everything; useful for headless runs and tests.
pub struct NullSink;

impl DisplaySink for NullSink {
    fn set_pixel(&mut self, _x: u8, _y: u8, _color: u32) {}
    fn request_refresh(&mut self) {}
}

pub struct Ppu {
    pub vram: [u8; VRAM_SIZE],
    pub oam: [u8; OAM_SIZE],

    lcdc: u8,
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    /// Last value written to the OAM DMA register (0xFF46). The transfer
    /// itself is performed by the bus, which sees the whole address space.
    pub dma: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    mode_clock: u32,
    pub mode: u8,
    /// Level of the combined STAT interrupt condition; the interrupt fires
    /// on the rising edge only.
    stat_irq_line: bool,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            vram: [0; VRAM_SIZE],
            oam: [0; OAM_SIZE],
            lcdc: 0x91,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0,
            bgp: 0xFC,
            obp0: 0xFF,
            obp1: 0xFF,
            wy: 0,
            wx: 0,
            mode_clock: 0,
            mode: MODE_OAM,
            stat_irq_line: false,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x8000..=0x9FFF => self.vram[(addr - 0x8000) as usize],
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize],
            0xFF40 => self.lcdc,
            0xFF41 => {
                let lyc_eq = if self.ly == self.lyc { 0x04 } else { 0 };
                0x80 | (self.stat & 0x78) | lyc_eq | (self.mode & 0x03)
            }
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF46 => self.dma,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8, if_reg: &mut u8) {
        match addr {
            0x8000..=0x9FFF => self.vram[(addr - 0x8000) as usize] = val,
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize] = val,
            0xFF40 => {
                let was_on = self.lcdc & 0x80 != 0;
                self.lcdc = val;
                if was_on && self.lcdc & 0x80 == 0 {
                    // Turning the LCD off resets the line counter and mode.
                    self.ly = 0;
                    self.mode = MODE_HBLANK;
                    self.mode_clock = 0;
                }
            }
            // Only the interrupt-select bits of STAT are writable.
            0xFF41 => {
                self.stat = val & 0x78;
                self.update_stat_line(if_reg);
            }
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            0xFF44 => {} // LY is read-only
            0xFF45 => {
                self.lyc = val;
                self.update_stat_line(if_reg);
            }
            0xFF46 => self.dma = val,
            0xFF47 => self.bgp = val,
            0xFF48 => self.obp0 = val,
            0xFF49 => self.obp1 = val,
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            _ => {}
        }
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    /// Advance the engine by `cycles` CPU cycles, pushing completed lines to
    /// `sink` and raising VBlank/STAT interrupts in IF.
    pub fn step(&mut self, cycles: u32, if_reg: &mut u8, sink: &mut dyn DisplaySink) {
        if self.lcdc & 0x80 == 0 {
            return;
        }
        self.mode_clock += cycles;
        loop {
            let budget = match self.mode {
                MODE_OAM => MODE2_CYCLES,
                MODE_TRANSFER => MODE3_CYCLES,
                MODE_HBLANK => MODE0_CYCLES,
                _ => MODE1_CYCLES,
            };
            if self.mode_clock < budget {
                break;
            }
            self.mode_clock -= budget;
            match self.mode {
                MODE_OAM => self.mode = MODE_TRANSFER,
                MODE_TRANSFER => {
                    self.render_line(sink);
                    self.mode = MODE_HBLANK;
                }
                MODE_HBLANK => {
                    self.ly += 1;
                    if self.ly as usize == SCREEN_HEIGHT {
                        self.mode = MODE_VBLANK;
                        interrupts::request(if_reg, Interrupt::VBlank);
                        sink.request_refresh();
                    } else {
                        self.mode = MODE_OAM;
                    }
                }
                _ => {
                    self.ly += 1;
                    if self.ly == SCREEN_HEIGHT as u8 + VBLANK_LINES {
                        self.ly = 0;
                        self.mode = MODE_OAM;
                    }
                }
            }
            self.update_stat_line(if_reg);
        }
    }

    /// Recompute the combined STAT condition and raise the interrupt on a
    /// rising edge.
    fn update_stat_line(&mut self, if_reg: &mut u8) {
        let line = (self.stat & 0x08 != 0 && self.mode == MODE_HBLANK)
            || (self.stat & 0x10 != 0 && self.mode == MODE_VBLANK)
            || (self.stat & 0x20 != 0 && self.mode == MODE_OAM)
            || (self.stat & 0x40 != 0 && self.ly == self.lyc);
        if line && !self.stat_irq_line {
            interrupts::request(if_reg, Interrupt::Stat);
        }
        self.stat_irq_line = line;
    }

    /// Render the background for the current line and hand it to the sink.
    fn render_line(&mut self, sink: &mut dyn DisplaySink) {
        for x in 0..SCREEN_WIDTH as u8 {
            let color = if self.lcdc & 0x01 != 0 {
                let id = self.bg_color_id(x.wrapping_add(self.scx), self.ly.wrapping_add(self.scy));
                SHADES[((self.bgp >> (id * 2)) & 0x03) as usize]
            } else {
                SHADES[0]
            };
            sink.set_pixel(x, self.ly, color);
        }
    }

    fn bg_color_id(&self, map_x: u8, map_y: u8) -> u8 {
        let map_base = if self.lcdc & 0x08 != 0 { BG_MAP_1_BASE } else { BG_MAP_0_BASE };
        let tile_idx = self.vram[map_base + (map_y as usize / 8) * 32 + map_x as usize / 8];
        // LCDC bit 4 selects unsigned tile indexing from 0x8000 or signed
        // from 0x9000.
        let tile_addr = if self.lcdc & 0x10 != 0 {
            tile_idx as usize * 16
        } else {
            (0x1000i32 + tile_idx as i8 as i32 * 16) as usize
        };
        let row = (map_y % 8) as usize * 2;
        let lo = self.vram[tile_addr + row];
        let hi = self.vram[tile_addr + row + 1];
        let bit = 7 - (map_x % 8);
        ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1)
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupts::{INT_STAT, INT_VBLANK};

    struct CountingSink {
        pixels: usize,
        refreshes: usize,
        last_line: Option<u8>,
    }

    impl CountingSink {
        fn new() -> Self {
            Self { pixels: 0, refreshes: 0, last_line: None }
        }
    }

    impl DisplaySink for CountingSink {
        fn set_pixel(&mut self, _x: u8, y: u8, _color: u32) {
            self.pixels += 1;
            self.last_line = Some(y);
        }
        fn request_refresh(&mut self) {
            self.refreshes += 1;
        }
    }

    #[test]
    fn mode_sequence_over_one_line() {
        let mut ppu = Ppu::new();
        let mut if_reg = 0;
        let mut sink = CountingSink::new();
        assert_eq!(ppu.mode, MODE_OAM);
        ppu.step(80, &mut if_reg, &mut sink);
        assert_eq!(ppu.mode, MODE_TRANSFER);
        ppu.step(172, &mut if_reg, &mut sink);
        assert_eq!(ppu.mode, MODE_HBLANK);
        assert_eq!(sink.pixels, SCREEN_WIDTH);
        assert_eq!(sink.last_line, Some(0));
        ppu.step(204, &mut if_reg, &mut sink);
        assert_eq!(ppu.mode, MODE_OAM);
        assert_eq!(ppu.ly(), 1);
    }

    #[test]
    fn vblank_raised_at_line_144() {
        let mut ppu = Ppu::new();
        let mut if_reg = 0;
        let mut sink = CountingSink::new();
        ppu.step(456 * 144, &mut if_reg, &mut sink);
        assert_eq!(ppu.mode, MODE_VBLANK);
        assert_eq!(if_reg & INT_VBLANK, INT_VBLANK);
        assert_eq!(sink.refreshes, 1);
        assert_eq!(sink.pixels, SCREEN_WIDTH * SCREEN_HEIGHT);
    }

    #[test]
    fn frame_wraps_back_to_line_zero() {
        let mut ppu = Ppu::new();
        let mut if_reg = 0;
        let mut sink = CountingSink::new();
        ppu.step(456 * 154, &mut if_reg, &mut sink);
        assert_eq!(ppu.ly(), 0);
        assert_eq!(ppu.mode, MODE_OAM);
    }

    #[test]
    fn lyc_match_raises_stat_when_selected() {
        let mut ppu = Ppu::new();
        let mut if_reg = 0;
        let mut sink = CountingSink::new();
        ppu.write(0xFF45, 2, &mut if_reg);
        ppu.write(0xFF41, 0x40, &mut if_reg);
        if_reg = 0;
        ppu.step(456 * 2, &mut if_reg, &mut sink);
        assert_eq!(ppu.ly(), 2);
        assert_eq!(if_reg & INT_STAT, INT_STAT);
        assert_eq!(ppu.read(0xFF41) & 0x04, 0x04);
    }

    #[test]
    fn stat_edge_does_not_retrigger_within_level() {
        let mut ppu = Ppu::new();
        let mut if_reg = 0;
        let mut sink = CountingSink::new();
        ppu.write(0xFF45, 1, &mut if_reg);
        ppu.write(0xFF41, 0x40, &mut if_reg);
        ppu.step(456, &mut if_reg, &mut sink);
        assert_eq!(if_reg & INT_STAT, INT_STAT);
        if_reg = 0;
        // Still on the same matching line: no new edge.
        ppu.step(80, &mut if_reg, &mut sink);
        assert_eq!(if_reg & INT_STAT, 0);
    }

    #[test]
    fn lcd_off_freezes_line_counter() {
        let mut ppu = Ppu::new();
        let mut if_reg = 0;
        let mut sink = CountingSink::new();
        ppu.write(0xFF40, 0x11, &mut if_reg);
        assert_eq!(ppu.ly(), 0);
        ppu.step(456 * 10, &mut if_reg, &mut sink);
        assert_eq!(ppu.ly(), 0);
        assert_eq!(sink.pixels, 0);
    }

    #[test]
    fn background_palette_maps_color_ids_to_shades() {
        let mut ppu = Ppu::new();
        let mut if_reg = 0;
        // Tile 0 row 0: all pixels color id 3.
        ppu.vram[0] = 0xFF;
        ppu.vram[1] = 0xFF;
        // Identity palette: id 3 -> shade 3 (black).
        ppu.write(0xFF47, 0b1110_0100, &mut if_reg);

        struct Capture(u32);
        impl DisplaySink for Capture {
            fn set_pixel(&mut self, x: u8, _y: u8, color: u32) {
                if x == 0 {
                    self.0 = color;
                }
            }
            fn request_refresh(&mut self) {}
        }
        let mut sink = Capture(0);
        ppu.step(80 + 172, &mut if_reg, &mut sink);
        assert_eq!(sink.0, SHADES[3]);
    }
}
