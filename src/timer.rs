//! Divider/timer unit.
//!
//! DIV ticks at clock/256 unconditionally; TIMA ticks at the rate selected
//! by TAC's low two bits, but only while TAC bit 2 is set. Cycle remainders
//! are carried across steps so a long instruction followed by a short one
//! loses no time.

use crate::interrupts::{self, Interrupt};

const DIV_PERIOD: u32 = 256;

/// TIMA input period in CPU cycles, indexed by TAC & 3.
const TIMA_PERIODS: [u32; 4] = [1024, 16, 64, 256];

pub struct Timer {
    /// Free-running divider, visible at 0xFF04.
    pub div: u8,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control
    pub tac: u8,
    div_acc: u32,
    tima_acc: u32,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            div_acc: 0,
            tima_acc: 0,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => self.div,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            // Any write to DIV clears it, whatever the value written.
            0xFF04 => {
                self.div = 0;
                self.div_acc = 0;
            }
            0xFF05 => self.tima = val,
            0xFF06 => self.tma = val,
            0xFF07 => self.tac = val & 0x07,
            _ => {}
        }
    }

    /// Advance the timer by `cycles` CPU cycles, raising the Timer interrupt
    /// in IF on each TIMA overflow.
    pub fn step(&mut self, cycles: u32, if_reg: &mut u8) {
        self.div_acc += cycles;
        while self.div_acc >= DIV_PERIOD {
            self.div_acc -= DIV_PERIOD;
            self.div = self.div.wrapping_add(1);
        }

        if self.tac & 0x04 == 0 {
            return;
        }
        let period = TIMA_PERIODS[(self.tac & 0x03) as usize];
        self.tima_acc += cycles;
        while self.tima_acc >= period {
            self.tima_acc -= period;
            if self.tima == 0xFF {
                self.tima = self.tma;
                interrupts::request(if_reg, Interrupt::Timer);
            } else {
                self.tima += 1;
            }
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
