//! Interrupt sources, priority order and eligibility rules.
//!
//! The five sources live as bits 0-4 of the memory-mapped IF (pending) and
//! IE (enable) registers. A source is *eligible* when both its bits are set;
//! eligibility alone wakes a halted CPU, while actual dispatch additionally
//! requires the master enable. Dispatch mechanics (pushing PC, jumping to the
//! vector) belong to the executor; this module only answers "which source,
//! if any, goes first".

/// IF/IE bit masks, one per source.
pub const INT_VBLANK: u8 = 0x01;
pub const INT_STAT: u8 = 0x02;
pub const INT_TIMER: u8 = 0x04;
pub const INT_SERIAL: u8 = 0x08;
pub const INT_JOYPAD: u8 = 0x10;

/// Only bits 0-4 of IF/IE are wired.
pub const INT_MASK: u8 = 0x1F;

/// One interrupt source, in hardware priority order (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank,
    Stat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    /// All sources, highest priority first. Dispatch scans this in order and
    /// takes the first eligible source.
    pub const PRIORITY: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::Stat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    pub fn mask(self) -> u8 {
        match self {
            Interrupt::VBlank => INT_VBLANK,
            Interrupt::Stat => INT_STAT,
            Interrupt::Timer => INT_TIMER,
            Interrupt::Serial => INT_SERIAL,
            Interrupt::Joypad => INT_JOYPAD,
        }
    }

    /// Fixed handler address for this source.
    pub fn vector(self) -> u16 {
        match self {
            Interrupt::VBlank => 0x0040,
            Interrupt::Stat => 0x0048,
            Interrupt::Timer => 0x0050,
            Interrupt::Serial => 0x0058,
            Interrupt::Joypad => 0x0060,
        }
    }
}

/// Highest-priority source that is both enabled and pending, if any.
pub fn pending(ie_reg: u8, if_reg: u8) -> Option<Interrupt> {
    let eligible = ie_reg & if_reg & INT_MASK;
    if eligible == 0 {
        return None;
    }
    Interrupt::PRIORITY.into_iter().find(|int| eligible & int.mask() != 0)
}

/// Raise a source's pending bit in IF.
pub fn request(if_reg: &mut u8, int: Interrupt) {
    *if_reg |= int.mask();
}
