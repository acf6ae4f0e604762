//! Static description of the SM83 instruction set.
//!
//! Two 256-slot tables (unprefixed and CB-prefixed) indexed by the raw
//! opcode byte. Each populated slot carries everything the executor needs:
//! operation kind, symbolic operands, byte length, primary and
//! branch-not-taken cycle costs, and a per-flag effect policy. The eleven
//! undefined unprefixed slots are `None`; fetching one is a fatal error.
//!
//! Tables are built once on first use and never mutated.

use std::sync::OnceLock;

use crate::registers::{Reg8, Reg16};

/// How an instruction affects one flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagEffect {
    /// Flag is left alone.
    Unchanged,
    /// Flag is forced to 0.
    Clear,
    /// Flag is forced to 1.
    Set,
    /// Flag takes the value the ALU computed for this operation.
    Computed,
}

/// Effect policy for all four flags (Z, N, H, C order).
#[derive(Debug, Clone, Copy)]
pub struct FlagPolicy {
    pub z: FlagEffect,
    pub n: FlagEffect,
    pub h: FlagEffect,
    pub c: FlagEffect,
}

const fn fp(z: FlagEffect, n: FlagEffect, h: FlagEffect, c: FlagEffect) -> FlagPolicy {
    FlagPolicy { z, n, h, c }
}

use FlagEffect::{Clear, Computed, Set, Unchanged};

pub const FL_NONE: FlagPolicy = fp(Unchanged, Unchanged, Unchanged, Unchanged);
pub const FL_ADD: FlagPolicy = fp(Computed, Clear, Computed, Computed);
pub const FL_SUB: FlagPolicy = fp(Computed, Set, Computed, Computed);
pub const FL_INC: FlagPolicy = fp(Computed, Clear, Computed, Unchanged);
pub const FL_DEC: FlagPolicy = fp(Computed, Set, Computed, Unchanged);
pub const FL_AND: FlagPolicy = fp(Computed, Clear, Set, Clear);
pub const FL_LOGIC: FlagPolicy = fp(Computed, Clear, Clear, Clear);
pub const FL_ADD_HL: FlagPolicy = fp(Unchanged, Clear, Computed, Computed);
pub const FL_ADD_SP: FlagPolicy = fp(Clear, Clear, Computed, Computed);
pub const FL_ROT_A: FlagPolicy = fp(Clear, Clear, Clear, Computed);
pub const FL_ROT: FlagPolicy = fp(Computed, Clear, Clear, Computed);
pub const FL_SWAP: FlagPolicy = fp(Computed, Clear, Clear, Clear);
pub const FL_BIT: FlagPolicy = fp(Computed, Clear, Set, Unchanged);
pub const FL_DAA: FlagPolicy = fp(Computed, Unchanged, Clear, Computed);
pub const FL_CPL: FlagPolicy = fp(Unchanged, Set, Set, Unchanged);
pub const FL_SCF: FlagPolicy = fp(Unchanged, Clear, Clear, Set);
pub const FL_CCF: FlagPolicy = fp(Unchanged, Clear, Clear, Computed);

/// Branch condition for conditional jumps, calls and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Always,
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

/// Symbolic operand, resolved by the executor against the register bank and
/// the memory bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// An 8-bit register.
    Reg(Reg8),
    /// A 16-bit register or pair.
    Wide(Reg16),
    /// Byte at the address held in a pair: (BC), (DE), (HL).
    Ind(Reg16),
    /// Byte at (HL), incrementing HL as a side effect of the access.
    IndInc,
    /// Byte at (HL), decrementing HL as a side effect of the access.
    IndDec,
    /// Byte at 0xFF00 | C (zero-page indirection through C).
    HighC,
    /// Immediate byte following the opcode.
    Imm8,
    /// Immediate byte interpreted as a signed offset.
    Imm8Signed,
    /// Immediate little-endian word following the opcode.
    Imm16,
    /// Byte at 0xFF00 | a8 (zero-page indirection through an immediate).
    HighImm8,
    /// Byte at an immediate 16-bit address.
    IndImm16,
}

/// Operation families the executor knows how to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Nop,
    Stop,
    Halt,
    DisableInterrupts,
    EnableInterrupts,
    /// CB-prefix sentinel; the executor fetches a second byte and looks it
    /// up in the CB table.
    Prefix,
    Load,
    Load16,
    /// LD HL,SP+e8
    LoadHlSpOffset,
    /// LD (a16),SP
    StoreSp,
    Inc8,
    Dec8,
    Inc16,
    Dec16,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Compare,
    AddHl,
    AddSp,
    Rlca,
    Rla,
    Rrca,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Jump,
    JumpHl,
    JumpRel,
    Call,
    Ret,
    Reti,
    Rst(u16),
    Push,
    Pop,
    // CB-prefixed families.
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Srl,
    Swap,
    Bit(u8),
    Res(u8),
    SetBit(u8),
}

/// One immutable instruction descriptor.
#[derive(Debug, Clone)]
pub struct Opcode {
    /// Operation mnemonic, including the branch condition where one exists
    /// (e.g. "JR NZ"). Operands are rendered from the operand fields.
    pub mnemonic: &'static str,
    pub kind: OpKind,
    pub dst: Option<Operand>,
    pub src: Option<Operand>,
    /// Total instruction length in bytes. CB-prefixed entries count the
    /// prefix byte.
    pub length: u8,
    /// Cycle cost when executed (branch taken, for conditionals). For CB
    /// entries this is the cost on top of the prefix's own base cost.
    pub cycles: u8,
    /// Cycle cost when a conditional branch is not taken.
    pub cycles_not_taken: u8,
    pub cond: Cond,
    pub flags: FlagPolicy,
}

impl Opcode {
    fn new(mnemonic: &'static str, kind: OpKind, length: u8, cycles: u8) -> Self {
        Self {
            mnemonic,
            kind,
            dst: None,
            src: None,
            length,
            cycles,
            cycles_not_taken: cycles,
            cond: Cond::Always,
            flags: FL_NONE,
        }
    }

    fn dst(mut self, op: Operand) -> Self {
        self.dst = Some(op);
        self
    }

    fn src(mut self, op: Operand) -> Self {
        self.src = Some(op);
        self
    }

    fn cond(mut self, cond: Cond, cycles_not_taken: u8) -> Self {
        self.cond = cond;
        self.cycles_not_taken = cycles_not_taken;
        self
    }

    fn flags(mut self, flags: FlagPolicy) -> Self {
        self.flags = flags;
        self
    }

    /// True when this entry is conditional and carries an alternate cost.
    pub fn is_conditional(&self) -> bool {
        self.cond != Cond::Always
    }
}

/// The unprefixed opcode table, built on first access.
pub fn unprefixed() -> &'static [Option<Opcode>; 256] {
    static TABLE: OnceLock<[Option<Opcode>; 256]> = OnceLock::new();
    TABLE.get_or_init(|| std::array::from_fn(|i| build_unprefixed(i as u8)))
}

/// The CB-prefixed opcode table. Fully populated; the CB page has no holes.
pub fn cb_prefixed() -> &'static [Opcode; 256] {
    static TABLE: OnceLock<[Opcode; 256]> = OnceLock::new();
    TABLE.get_or_init(|| std::array::from_fn(|i| build_cb(i as u8)))
}

/// Register operand encoded in the low three bits of most opcodes; index 6
/// is the (HL) indirection.
fn reg_operand(index: u8) -> Operand {
    match index & 0x07 {
        0 => Operand::Reg(Reg8::B),
        1 => Operand::Reg(Reg8::C),
        2 => Operand::Reg(Reg8::D),
        3 => Operand::Reg(Reg8::E),
        4 => Operand::Reg(Reg8::H),
        5 => Operand::Reg(Reg8::L),
        6 => Operand::Ind(Reg16::HL),
        _ => Operand::Reg(Reg8::A),
    }
}

fn is_ind(op: Operand) -> bool {
    matches!(op, Operand::Ind(_))
}

fn build_unprefixed(byte: u8) -> Option<Opcode> {
    use Cond::*;
    use OpKind::*;
    use Operand::*;

    let op = match byte {
        0x00 => Opcode::new("NOP", Nop, 1, 4),
        0x01 => Opcode::new("LD", Load16, 3, 12).dst(Wide(Reg16::BC)).src(Imm16),
        0x02 => Opcode::new("LD", Load, 1, 8).dst(Ind(Reg16::BC)).src(Reg(Reg8::A)),
        0x03 => Opcode::new("INC", Inc16, 1, 8).dst(Wide(Reg16::BC)),
        0x04 => Opcode::new("INC", Inc8, 1, 4).dst(Reg(Reg8::B)).flags(FL_INC),
        0x05 => Opcode::new("DEC", Dec8, 1, 4).dst(Reg(Reg8::B)).flags(FL_DEC),
        0x06 => Opcode::new("LD", Load, 2, 8).dst(Reg(Reg8::B)).src(Imm8),
        0x07 => Opcode::new("RLCA", Rlca, 1, 4).flags(FL_ROT_A),
        0x08 => Opcode::new("LD", StoreSp, 3, 20).dst(IndImm16).src(Wide(Reg16::SP)),
        0x09 => Opcode::new("ADD HL", AddHl, 1, 8).src(Wide(Reg16::BC)).flags(FL_ADD_HL),
        0x0A => Opcode::new("LD", Load, 1, 8).dst(Reg(Reg8::A)).src(Ind(Reg16::BC)),
        0x0B => Opcode::new("DEC", Dec16, 1, 8).dst(Wide(Reg16::BC)),
        0x0C => Opcode::new("INC", Inc8, 1, 4).dst(Reg(Reg8::C)).flags(FL_INC),
        0x0D => Opcode::new("DEC", Dec8, 1, 4).dst(Reg(Reg8::C)).flags(FL_DEC),
        0x0E => Opcode::new("LD", Load, 2, 8).dst(Reg(Reg8::C)).src(Imm8),
        0x0F => Opcode::new("RRCA", Rrca, 1, 4).flags(FL_ROT_A),

        0x10 => Opcode::new("STOP", Stop, 2, 4),
        0x11 => Opcode::new("LD", Load16, 3, 12).dst(Wide(Reg16::DE)).src(Imm16),
        0x12 => Opcode::new("LD", Load, 1, 8).dst(Ind(Reg16::DE)).src(Reg(Reg8::A)),
        0x13 => Opcode::new("INC", Inc16, 1, 8).dst(Wide(Reg16::DE)),
        0x14 => Opcode::new("INC", Inc8, 1, 4).dst(Reg(Reg8::D)).flags(FL_INC),
        0x15 => Opcode::new("DEC", Dec8, 1, 4).dst(Reg(Reg8::D)).flags(FL_DEC),
        0x16 => Opcode::new("LD", Load, 2, 8).dst(Reg(Reg8::D)).src(Imm8),
        0x17 => Opcode::new("RLA", Rla, 1, 4).flags(FL_ROT_A),
        0x18 => Opcode::new("JR", JumpRel, 2, 12).src(Imm8Signed),
        0x19 => Opcode::new("ADD HL", AddHl, 1, 8).src(Wide(Reg16::DE)).flags(FL_ADD_HL),
        0x1A => Opcode::new("LD", Load, 1, 8).dst(Reg(Reg8::A)).src(Ind(Reg16::DE)),
        0x1B => Opcode::new("DEC", Dec16, 1, 8).dst(Wide(Reg16::DE)),
        0x1C => Opcode::new("INC", Inc8, 1, 4).dst(Reg(Reg8::E)).flags(FL_INC),
        0x1D => Opcode::new("DEC", Dec8, 1, 4).dst(Reg(Reg8::E)).flags(FL_DEC),
        0x1E => Opcode::new("LD", Load, 2, 8).dst(Reg(Reg8::E)).src(Imm8),
        0x1F => Opcode::new("RRA", Rra, 1, 4).flags(FL_ROT_A),

        0x20 => Opcode::new("JR NZ", JumpRel, 2, 12).src(Imm8Signed).cond(NotZero, 8),
        0x21 => Opcode::new("LD", Load16, 3, 12).dst(Wide(Reg16::HL)).src(Imm16),
        0x22 => Opcode::new("LD", Load, 1, 8).dst(IndInc).src(Reg(Reg8::A)),
        0x23 => Opcode::new("INC", Inc16, 1, 8).dst(Wide(Reg16::HL)),
        0x24 => Opcode::new("INC", Inc8, 1, 4).dst(Reg(Reg8::H)).flags(FL_INC),
        0x25 => Opcode::new("DEC", Dec8, 1, 4).dst(Reg(Reg8::H)).flags(FL_DEC),
        0x26 => Opcode::new("LD", Load, 2, 8).dst(Reg(Reg8::H)).src(Imm8),
        0x27 => Opcode::new("DAA", Daa, 1, 4).flags(FL_DAA),
        0x28 => Opcode::new("JR Z", JumpRel, 2, 12).src(Imm8Signed).cond(Zero, 8),
        0x29 => Opcode::new("ADD HL", AddHl, 1, 8).src(Wide(Reg16::HL)).flags(FL_ADD_HL),
        0x2A => Opcode::new("LD", Load, 1, 8).dst(Reg(Reg8::A)).src(IndInc),
        0x2B => Opcode::new("DEC", Dec16, 1, 8).dst(Wide(Reg16::HL)),
        0x2C => Opcode::new("INC", Inc8, 1, 4).dst(Reg(Reg8::L)).flags(FL_INC),
        0x2D => Opcode::new("DEC", Dec8, 1, 4).dst(Reg(Reg8::L)).flags(FL_DEC),
        0x2E => Opcode::new("LD", Load, 2, 8).dst(Reg(Reg8::L)).src(Imm8),
        0x2F => Opcode::new("CPL", Cpl, 1, 4).flags(FL_CPL),

        0x30 => Opcode::new("JR NC", JumpRel, 2, 12).src(Imm8Signed).cond(NotCarry, 8),
        0x31 => Opcode::new("LD", Load16, 3, 12).dst(Wide(Reg16::SP)).src(Imm16),
        0x32 => Opcode::new("LD", Load, 1, 8).dst(IndDec).src(Reg(Reg8::A)),
        0x33 => Opcode::new("INC", Inc16, 1, 8).dst(Wide(Reg16::SP)),
        0x34 => Opcode::new("INC", Inc8, 1, 12).dst(Ind(Reg16::HL)).flags(FL_INC),
        0x35 => Opcode::new("DEC", Dec8, 1, 12).dst(Ind(Reg16::HL)).flags(FL_DEC),
        0x36 => Opcode::new("LD", Load, 2, 12).dst(Ind(Reg16::HL)).src(Imm8),
        0x37 => Opcode::new("SCF", Scf, 1, 4).flags(FL_SCF),
        0x38 => Opcode::new("JR C", JumpRel, 2, 12).src(Imm8Signed).cond(Carry, 8),
        0x39 => Opcode::new("ADD HL", AddHl, 1, 8).src(Wide(Reg16::SP)).flags(FL_ADD_HL),
        0x3A => Opcode::new("LD", Load, 1, 8).dst(Reg(Reg8::A)).src(IndDec),
        0x3B => Opcode::new("DEC", Dec16, 1, 8).dst(Wide(Reg16::SP)),
        0x3C => Opcode::new("INC", Inc8, 1, 4).dst(Reg(Reg8::A)).flags(FL_INC),
        0x3D => Opcode::new("DEC", Dec8, 1, 4).dst(Reg(Reg8::A)).flags(FL_DEC),
        0x3E => Opcode::new("LD", Load, 2, 8).dst(Reg(Reg8::A)).src(Imm8),
        0x3F => Opcode::new("CCF", Ccf, 1, 4).flags(FL_CCF),

        0x76 => Opcode::new("HALT", Halt, 1, 4),
        // LD r,r' block, including the (HL) forms.
        0x40..=0x7F => {
            let dst = reg_operand(byte >> 3);
            let src = reg_operand(byte);
            let cycles = if is_ind(dst) || is_ind(src) { 8 } else { 4 };
            Opcode::new("LD", Load, 1, cycles).dst(dst).src(src)
        }

        // Accumulator arithmetic/logic block.
        0x80..=0xBF => {
            let src = reg_operand(byte);
            let cycles = if is_ind(src) { 8 } else { 4 };
            let (mnemonic, kind, flags) = alu_family(byte >> 3);
            Opcode::new(mnemonic, kind, 1, cycles).src(src).flags(flags)
        }

        0xC0 => Opcode::new("RET NZ", Ret, 1, 20).cond(NotZero, 8),
        0xC1 => Opcode::new("POP", Pop, 1, 12).dst(Wide(Reg16::BC)),
        0xC2 => Opcode::new("JP NZ", Jump, 3, 16).src(Imm16).cond(NotZero, 12),
        0xC3 => Opcode::new("JP", Jump, 3, 16).src(Imm16),
        0xC4 => Opcode::new("CALL NZ", Call, 3, 24).src(Imm16).cond(NotZero, 12),
        0xC5 => Opcode::new("PUSH", Push, 1, 16).src(Wide(Reg16::BC)),
        0xC6 => Opcode::new("ADD", Add, 2, 8).src(Imm8).flags(FL_ADD),
        0xC7 => Opcode::new("RST 00", Rst(0x00), 1, 16),
        0xC8 => Opcode::new("RET Z", Ret, 1, 20).cond(Zero, 8),
        0xC9 => Opcode::new("RET", Ret, 1, 16),
        0xCA => Opcode::new("JP Z", Jump, 3, 16).src(Imm16).cond(Zero, 12),
        0xCB => Opcode::new("PREFIX CB", Prefix, 1, 4),
        0xCC => Opcode::new("CALL Z", Call, 3, 24).src(Imm16).cond(Zero, 12),
        0xCD => Opcode::new("CALL", Call, 3, 24).src(Imm16),
        0xCE => Opcode::new("ADC", Adc, 2, 8).src(Imm8).flags(FL_ADD),
        0xCF => Opcode::new("RST 08", Rst(0x08), 1, 16),

        0xD0 => Opcode::new("RET NC", Ret, 1, 20).cond(NotCarry, 8),
        0xD1 => Opcode::new("POP", Pop, 1, 12).dst(Wide(Reg16::DE)),
        0xD2 => Opcode::new("JP NC", Jump, 3, 16).src(Imm16).cond(NotCarry, 12),
        0xD4 => Opcode::new("CALL NC", Call, 3, 24).src(Imm16).cond(NotCarry, 12),
        0xD5 => Opcode::new("PUSH", Push, 1, 16).src(Wide(Reg16::DE)),
        0xD6 => Opcode::new("SUB", Sub, 2, 8).src(Imm8).flags(FL_SUB),
        0xD7 => Opcode::new("RST 10", Rst(0x10), 1, 16),
        0xD8 => Opcode::new("RET C", Ret, 1, 20).cond(Carry, 8),
        0xD9 => Opcode::new("RETI", Reti, 1, 16),
        0xDA => Opcode::new("JP C", Jump, 3, 16).src(Imm16).cond(Carry, 12),
        0xDC => Opcode::new("CALL C", Call, 3, 24).src(Imm16).cond(Carry, 12),
        0xDE => Opcode::new("SBC", Sbc, 2, 8).src(Imm8).flags(FL_SUB),
        0xDF => Opcode::new("RST 18", Rst(0x18), 1, 16),

        0xE0 => Opcode::new("LDH", Load, 2, 12).dst(HighImm8).src(Reg(Reg8::A)),
        0xE1 => Opcode::new("POP", Pop, 1, 12).dst(Wide(Reg16::HL)),
        0xE2 => Opcode::new("LD", Load, 1, 8).dst(HighC).src(Reg(Reg8::A)),
        0xE5 => Opcode::new("PUSH", Push, 1, 16).src(Wide(Reg16::HL)),
        0xE6 => Opcode::new("AND", And, 2, 8).src(Imm8).flags(FL_AND),
        0xE7 => Opcode::new("RST 20", Rst(0x20), 1, 16),
        0xE8 => Opcode::new("ADD SP", AddSp, 2, 16).src(Imm8Signed).flags(FL_ADD_SP),
        0xE9 => Opcode::new("JP HL", JumpHl, 1, 4),
        0xEA => Opcode::new("LD", Load, 3, 16).dst(IndImm16).src(Reg(Reg8::A)),
        0xEE => Opcode::new("XOR", Xor, 2, 8).src(Imm8).flags(FL_LOGIC),
        0xEF => Opcode::new("RST 28", Rst(0x28), 1, 16),

        0xF0 => Opcode::new("LDH", Load, 2, 12).dst(Reg(Reg8::A)).src(HighImm8),
        0xF1 => Opcode::new("POP", Pop, 1, 12).dst(Wide(Reg16::AF)),
        0xF2 => Opcode::new("LD", Load, 1, 8).dst(Reg(Reg8::A)).src(HighC),
        0xF3 => Opcode::new("DI", DisableInterrupts, 1, 4),
        0xF5 => Opcode::new("PUSH", Push, 1, 16).src(Wide(Reg16::AF)),
        0xF6 => Opcode::new("OR", Or, 2, 8).src(Imm8).flags(FL_LOGIC),
        0xF7 => Opcode::new("RST 30", Rst(0x30), 1, 16),
        0xF8 => Opcode::new("LD HL,SP+", LoadHlSpOffset, 2, 12).src(Imm8Signed).flags(FL_ADD_SP),
        0xF9 => Opcode::new("LD", Load16, 1, 8).dst(Wide(Reg16::SP)).src(Wide(Reg16::HL)),
        0xFA => Opcode::new("LD", Load, 3, 16).dst(Reg(Reg8::A)).src(IndImm16),
        0xFB => Opcode::new("EI", EnableInterrupts, 1, 4),
        0xFE => Opcode::new("CP", Compare, 2, 8).src(Imm8).flags(FL_SUB),
        0xFF => Opcode::new("RST 38", Rst(0x38), 1, 16),

        // The eleven undefined slots.
        0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
            return None;
        }
    };
    Some(op)
}

fn alu_family(index: u8) -> (&'static str, OpKind, FlagPolicy) {
    match index & 0x07 {
        0 => ("ADD", OpKind::Add, FL_ADD),
        1 => ("ADC", OpKind::Adc, FL_ADD),
        2 => ("SUB", OpKind::Sub, FL_SUB),
        3 => ("SBC", OpKind::Sbc, FL_SUB),
        4 => ("AND", OpKind::And, FL_AND),
        5 => ("XOR", OpKind::Xor, FL_LOGIC),
        6 => ("OR", OpKind::Or, FL_LOGIC),
        _ => ("CP", OpKind::Compare, FL_SUB),
    }
}

/// The CB page is fully regular: bits 7-6 select the family, bits 5-3 the
/// sub-operation or bit index, bits 2-0 the target.
fn build_cb(byte: u8) -> Opcode {
    let target = reg_operand(byte);
    let ind = is_ind(target);
    let bit = (byte >> 3) & 0x07;
    match byte >> 6 {
        0 => {
            let (mnemonic, kind, flags) = match bit {
                0 => ("RLC", OpKind::Rlc, FL_ROT),
                1 => ("RRC", OpKind::Rrc, FL_ROT),
                2 => ("RL", OpKind::Rl, FL_ROT),
                3 => ("RR", OpKind::Rr, FL_ROT),
                4 => ("SLA", OpKind::Sla, FL_ROT),
                5 => ("SRA", OpKind::Sra, FL_ROT),
                6 => ("SWAP", OpKind::Swap, FL_SWAP),
                _ => ("SRL", OpKind::Srl, FL_ROT),
            };
            let cycles = if ind { 12 } else { 4 };
            Opcode::new(mnemonic, kind, 2, cycles).dst(target).flags(flags)
        }
        1 => {
            // BIT only reads its target, so the (HL) form is cheaper than
            // the read-modify-write families.
            let cycles = if ind { 8 } else { 4 };
            Opcode::new("BIT", OpKind::Bit(bit), 2, cycles).dst(target).flags(FL_BIT)
        }
        2 => {
            let cycles = if ind { 12 } else { 4 };
            Opcode::new("RES", OpKind::Res(bit), 2, cycles).dst(target)
        }
        _ => {
            let cycles = if ind { 12 } else { 4 };
            Opcode::new("SET", OpKind::SetBit(bit), 2, cycles).dst(target)
        }
    }
}

fn operand_name(op: Operand) -> &'static str {
    match op {
        Operand::Reg(Reg8::A) => "A",
        Operand::Reg(Reg8::F) => "F",
        Operand::Reg(Reg8::B) => "B",
        Operand::Reg(Reg8::C) => "C",
        Operand::Reg(Reg8::D) => "D",
        Operand::Reg(Reg8::E) => "E",
        Operand::Reg(Reg8::H) => "H",
        Operand::Reg(Reg8::L) => "L",
        Operand::Wide(Reg16::AF) => "AF",
        Operand::Wide(Reg16::BC) => "BC",
        Operand::Wide(Reg16::DE) => "DE",
        Operand::Wide(Reg16::HL) => "HL",
        Operand::Wide(Reg16::SP) => "SP",
        Operand::Wide(Reg16::PC) => "PC",
        Operand::Ind(Reg16::BC) => "(BC)",
        Operand::Ind(Reg16::DE) => "(DE)",
        Operand::Ind(_) => "(HL)",
        Operand::IndInc => "(HL+)",
        Operand::IndDec => "(HL-)",
        Operand::HighC => "(C)",
        Operand::Imm8 => "d8",
        Operand::Imm8Signed => "e8",
        Operand::Imm16 => "d16",
        Operand::HighImm8 => "(a8)",
        Operand::IndImm16 => "(a16)",
    }
}

/// Render an instruction starting at `bytes[0]` as assembly text. Returns
/// the text and the number of bytes consumed; undefined opcodes render as
/// a `DB` directive of length 1.
pub fn disassemble(bytes: &[u8]) -> (String, usize) {
    let Some(&first) = bytes.first() else {
        return (String::new(), 0);
    };
    let op = if first == 0xCB {
        match bytes.get(1) {
            Some(&second) => &cb_prefixed()[second as usize],
            None => return (format!("DB ${first:02X}"), 1),
        }
    } else {
        match &unprefixed()[first as usize] {
            Some(op) => op,
            None => return (format!("DB ${first:02X}"), 1),
        }
    };

    let mut text = op.mnemonic.to_string();
    let operands: Vec<&'static str> = [op.dst, op.src].iter().flatten().map(|&o| operand_name(o)).collect();
    if !operands.is_empty() {
        text.push(' ');
        text.push_str(&operands.join(","));
    }
    (text, op.length as usize)
}
