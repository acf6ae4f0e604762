//! Sound register block.
//!
//! Sample synthesis is out of scope; what the core models is the register
//! file the CPU talks to: per-register read-back masks (unwired bits read
//! as 1), the NR52 power switch that clears and write-protects the block,
//! and wave RAM. The sound task consumes clock cycles so channel timing can
//! be layered on later without touching the scheduler.

/// One of the four synthesis channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Square wave with frequency sweep (NR10-NR14).
    SweepSquare,
    /// Plain square wave (NR21-NR24).
    Square,
    /// Sampled wave playback (NR30-NR34).
    Wave,
    /// LFSR noise (NR41-NR44).
    Noise,
}

impl Channel {
    /// Channel whose register block contains `addr`, if any.
    pub fn from_addr(addr: u16) -> Option<Channel> {
        match addr {
            0xFF10..=0xFF14 => Some(Channel::SweepSquare),
            0xFF16..=0xFF19 => Some(Channel::Square),
            0xFF1A..=0xFF1E => Some(Channel::Wave),
            0xFF20..=0xFF23 => Some(Channel::Noise),
            _ => None,
        }
    }

    /// Address of this channel's trigger/length register (NRx4).
    pub fn trigger_addr(self) -> u16 {
        match self {
            Channel::SweepSquare => 0xFF14,
            Channel::Square => 0xFF19,
            Channel::Wave => 0xFF1E,
            Channel::Noise => 0xFF23,
        }
    }
}

/// Bits that read back as 1 for each register 0xFF10..=0xFF2F, in order.
/// Holes between channels and the unused 0xFF27-0xFF2F range read as 0xFF.
const READ_OR_MASKS: [u8; 32] = [
    0x80, 0x3F, 0x00, 0xFF, 0xBF, // NR10-NR14
    0xFF, 0x3F, 0x00, 0xFF, 0xBF, // FF15, NR21-NR24
    0x7F, 0xFF, 0x9F, 0xFF, 0xBF, // NR30-NR34
    0xFF, 0xFF, 0x00, 0x00, 0xBF, // FF1F, NR41-NR44
    0x00, 0x00, 0x70, // NR50-NR52
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // FF27-FF2F
];

pub struct Apu {
    regs: [u8; 32],
    wave_ram: [u8; 16],
    powered: bool,
    cycles: u64,
}

impl Apu {
    pub fn new() -> Self {
        Self {
            regs: [0; 32],
            wave_ram: [0; 16],
            powered: true,
            cycles: 0,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF10..=0xFF2F => {
                let idx = (addr - 0xFF10) as usize;
                let mut val = self.regs[idx] | READ_OR_MASKS[idx];
                if addr == 0xFF26 {
                    val = (val & !0x80) | if self.powered { 0x80 } else { 0 };
                }
                val
            }
            0xFF30..=0xFF3F => self.wave_ram[(addr - 0xFF30) as usize],
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF26 => {
                let powered = val & 0x80 != 0;
                if self.powered && !powered {
                    // Powering off zeroes every register; wave RAM survives.
                    self.regs = [0; 32];
                }
                self.powered = powered;
            }
            // All other registers are write-protected while powered off.
            0xFF10..=0xFF25 if self.powered => {
                self.regs[(addr - 0xFF10) as usize] = val;
                if let Some(channel) = Channel::from_addr(addr) {
                    if addr == channel.trigger_addr() && val & 0x80 != 0 {
                        log::trace!("{channel:?} channel triggered");
                    }
                }
            }
            0xFF30..=0xFF3F => self.wave_ram[(addr - 0xFF30) as usize] = val,
            _ => {}
        }
    }

    /// Advance channel timing by `cycles` CPU cycles.
    pub fn step(&mut self, cycles: u32) {
        self.cycles += cycles as u64;
    }

    pub fn powered(&self) -> bool {
        self.powered
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}
