//! Debug configuration and state snapshots.
//!
//! Debugging is plain data threaded through the constructors that need it,
//! not ambient global state: the clock owns a [`DebugConfig`] and consults
//! it before each CPU step.

use crate::cpu::Cpu;
use crate::mmu::Mmu;
use crate::opcodes;
use crate::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

/// Condition that pauses the clock before an instruction runs. Hitting one
/// is not an error; execution resumes from the exact same state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    /// Pause when PC reaches this address.
    Address(u16),
    /// Pause when this opcode byte is about to be fetched.
    Opcode(u8),
}

impl Breakpoint {
    pub fn matches(&self, pc: u16, opcode: u8) -> bool {
        match *self {
            Breakpoint::Address(addr) => pc == addr,
            Breakpoint::Opcode(byte) => opcode == byte,
        }
    }
}

/// Debug switches for one machine instance.
#[derive(Debug, Clone, Default)]
pub struct DebugConfig {
    pub breakpoints: Vec<Breakpoint>,
}

impl DebugConfig {
    pub fn with_breakpoint(mut self, bp: Breakpoint) -> Self {
        self.breakpoints.push(bp);
        self
    }

    pub fn hit(&self, pc: u16, opcode: u8) -> Option<Breakpoint> {
        self.breakpoints.iter().copied().find(|bp| bp.matches(pc, opcode))
    }
}

/// One-line register/flag dump plus the disassembly of the instruction at
/// PC, for logs and debugger front ends.
pub fn debug_state(cpu: &Cpu, mmu: &mut Mmu) -> String {
    let pc = cpu.regs.pc;
    let bytes = [
        mmu.read_byte(pc),
        mmu.read_byte(pc.wrapping_add(1)),
        mmu.read_byte(pc.wrapping_add(2)),
    ];
    let (text, _) = opcodes::disassemble(&bytes);
    let flag = |mask, ch| if cpu.regs.flag(mask) { ch } else { '-' };
    format!(
        "A:{:02X} F:{}{}{}{} BC:{:02X}{:02X} DE:{:02X}{:02X} HL:{:02X}{:02X} SP:{:04X} PC:{:04X}  {}",
        cpu.regs.a,
        flag(FLAG_Z, 'Z'),
        flag(FLAG_N, 'N'),
        flag(FLAG_H, 'H'),
        flag(FLAG_C, 'C'),
        cpu.regs.b,
        cpu.regs.c,
        cpu.regs.d,
        cpu.regs.e,
        cpu.regs.h,
        cpu.regs.l,
        cpu.regs.sp,
        pc,
        text,
    )
}
