//! Instruction executor.
//!
//! Each step runs the interrupt check, then fetch/decode/execute for one
//! instruction: the opcode byte selects a table entry, PC advances past the
//! whole instruction before the operation runs, the operation computes a
//! result plus raw flag values, and the entry's flag policy decides which of
//! those land in F. The returned cycle count is the entry's primary cost, or
//! its alternate cost when a conditional branch was not taken.

use crate::alu;
use crate::errors::CoreError;
use crate::interrupts;
use crate::mmu::Mmu;
use crate::opcodes::{self, Cond, FlagEffect, FlagPolicy, OpKind, Opcode, Operand};
use crate::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Reg16, Registers};

/// Cycle cost of an interrupt dispatch.
const DISPATCH_CYCLES: u32 = 16;

/// Idle cost consumed per step while halted.
const HALT_IDLE_CYCLES: u32 = 4;

/// Raw flag values an operation produced, before the table's flag policy
/// filters them, plus whether a conditional branch was taken.
struct Outcome {
    zero: bool,
    half_carry: bool,
    carry: bool,
    taken: bool,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            zero: false,
            half_carry: false,
            carry: false,
            taken: true,
        }
    }
}

pub struct Cpu {
    pub regs: Registers,
    /// Interrupt master enable.
    pub ime: bool,
    /// Countdown for EI's one-instruction enable delay.
    ime_enable_delay: u8,
    pub halted: bool,
    /// Total cycles consumed since power-on.
    pub cycles: u64,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            ime: false,
            ime_enable_delay: 0,
            halted: false,
            cycles: 0,
        }
    }

    /// Run the interrupt check and at most one instruction; returns the
    /// cycles consumed.
    pub fn step(&mut self, mmu: &mut Mmu) -> Result<u32, CoreError> {
        if let Some(cost) = self.service_interrupts(mmu) {
            self.cycles += cost as u64;
            return Ok(cost);
        }

        if self.halted {
            self.cycles += HALT_IDLE_CYCLES as u64;
            return Ok(HALT_IDLE_CYCLES);
        }

        // EI takes effect after the instruction that follows it, so latch
        // whether this is that instruction before executing it.
        let enable_after = self.ime_enable_delay == 1;

        let base = self.regs.pc;
        let first = mmu.read_byte(base);
        let (entry, cb_base_cost): (&'static Opcode, u32) = if first == 0xCB {
            let second = mmu.read_byte(base.wrapping_add(1));
            (&opcodes::cb_prefixed()[second as usize], 4)
        } else {
            let entry = opcodes::unprefixed()[first as usize]
                .as_ref()
                .ok_or(CoreError::IllegalOpcode { opcode: first, pc: base })?;
            (entry, 0)
        };

        #[cfg(feature = "cpu-trace")]
        {
            let bytes = [
                first,
                mmu.read_byte(base.wrapping_add(1)),
                mmu.read_byte(base.wrapping_add(2)),
            ];
            let (text, _) = opcodes::disassemble(&bytes);
            log::trace!("{base:04X}: {text}");
        }

        // PC moves past the whole instruction before it runs, so relative
        // jumps and pushed return addresses see the next instruction.
        self.regs.pc = base.wrapping_add(entry.length as u16);

        let outcome = self.execute(mmu, entry, base)?;
        self.apply_flags(entry.flags, &outcome);

        if enable_after && self.ime_enable_delay > 0 {
            self.ime = true;
        }
        if self.ime_enable_delay > 0 {
            self.ime_enable_delay -= 1;
        }

        let cost = if entry.is_conditional() && !outcome.taken {
            entry.cycles_not_taken as u32
        } else {
            entry.cycles as u32
        } + cb_base_cost;
        self.cycles += cost as u64;
        Ok(cost)
    }

    /// Wake from halt on any eligible interrupt; dispatch the highest
    /// priority one when the master enable allows it.
    fn service_interrupts(&mut self, mmu: &mut Mmu) -> Option<u32> {
        let int = interrupts::pending(mmu.ie_reg, mmu.if_reg)?;
        // Eligibility wakes the CPU even with IME off; IME only gates the
        // jump to the handler.
        self.halted = false;
        if !self.ime {
            return None;
        }
        self.ime = false;
        self.ime_enable_delay = 0;
        mmu.if_reg &= !int.mask();
        self.push_word(mmu, self.regs.pc);
        self.regs.pc = int.vector();
        Some(DISPATCH_CYCLES)
    }

    fn execute(&mut self, mmu: &mut Mmu, op: &Opcode, base: u16) -> Result<Outcome, CoreError> {
        let mut out = Outcome::default();
        match op.kind {
            OpKind::Nop => {}
            // STOP's low-power mode is not modeled beyond suspending fetch;
            // it resets the divider and parks the CPU the way HALT does.
            OpKind::Stop => {
                mmu.write_byte(0xFF04, 0);
                self.halted = true;
            }
            OpKind::Halt => self.halted = true,
            OpKind::DisableInterrupts => {
                self.ime = false;
                self.ime_enable_delay = 0;
            }
            OpKind::EnableInterrupts => self.ime_enable_delay = 2,
            OpKind::Prefix => {
                return Err(CoreError::MalformedOpcode {
                    mnemonic: op.mnemonic,
                    reason: "prefix sentinel reached the executor",
                });
            }

            OpKind::Load => {
                let val = self.read_operand8(mmu, self.src_of(op)?, base)?;
                self.write_operand8(mmu, self.dst_of(op)?, base, val)?;
            }
            OpKind::Load16 => {
                let val = self.read_operand16(mmu, self.src_of(op)?, base)?;
                self.write_operand16(op, self.dst_of(op)?, val)?;
            }
            OpKind::LoadHlSpOffset => {
                let off = self.read_operand8(mmu, self.src_of(op)?, base)? as i8;
                let r = alu::add16_signed(self.regs.sp, off);
                self.regs.set16(Reg16::HL, r.value);
                out.half_carry = r.half_carry;
                out.carry = r.carry;
            }
            OpKind::StoreSp => {
                let addr = mmu.read_word(base.wrapping_add(1));
                mmu.write_word(addr, self.regs.sp);
            }

            OpKind::Inc8 | OpKind::Dec8 => {
                let dst = self.dst_of(op)?;
                let val = self.read_operand8(mmu, dst, base)?;
                let r = if op.kind == OpKind::Inc8 { alu::inc8(val) } else { alu::dec8(val) };
                self.write_operand8(mmu, dst, base, r.value)?;
                out.zero = r.zero;
                out.half_carry = r.half_carry;
            }
            OpKind::Inc16 | OpKind::Dec16 => {
                let dst = self.dst_of(op)?;
                let val = self.read_operand16(mmu, dst, base)?;
                let val = if op.kind == OpKind::Inc16 {
                    val.wrapping_add(1)
                } else {
                    val.wrapping_sub(1)
                };
                self.write_operand16(op, dst, val)?;
            }

            OpKind::Add | OpKind::Adc | OpKind::Sub | OpKind::Sbc | OpKind::Compare => {
                let b = self.read_operand8(mmu, self.src_of(op)?, base)?;
                let carry_in = matches!(op.kind, OpKind::Adc | OpKind::Sbc) && self.regs.flag(FLAG_C);
                let r = match op.kind {
                    OpKind::Add | OpKind::Adc => alu::add8(self.regs.a, b, carry_in),
                    _ => alu::sub8(self.regs.a, b, carry_in),
                };
                if op.kind != OpKind::Compare {
                    self.regs.a = r.value;
                }
                out.zero = r.zero;
                out.half_carry = r.half_carry;
                out.carry = r.carry;
            }
            OpKind::And | OpKind::Xor | OpKind::Or => {
                let b = self.read_operand8(mmu, self.src_of(op)?, base)?;
                let r = match op.kind {
                    OpKind::And => alu::and8(self.regs.a, b),
                    OpKind::Xor => alu::xor8(self.regs.a, b),
                    _ => alu::or8(self.regs.a, b),
                };
                self.regs.a = r.value;
                out.zero = r.zero;
            }
            OpKind::AddHl => {
                let b = self.read_operand16(mmu, self.src_of(op)?, base)?;
                let r = alu::add16(self.regs.get16(Reg16::HL), b);
                self.regs.set16(Reg16::HL, r.value);
                out.half_carry = r.half_carry;
                out.carry = r.carry;
            }
            OpKind::AddSp => {
                let off = self.read_operand8(mmu, self.src_of(op)?, base)? as i8;
                let r = alu::add16_signed(self.regs.sp, off);
                self.regs.sp = r.value;
                out.half_carry = r.half_carry;
                out.carry = r.carry;
            }

            OpKind::Rlca => {
                let r = alu::rlc(self.regs.a);
                self.regs.a = r.value;
                out.carry = r.carry;
            }
            OpKind::Rla => {
                let r = alu::rl(self.regs.a, self.regs.flag(FLAG_C));
                self.regs.a = r.value;
                out.carry = r.carry;
            }
            OpKind::Rrca => {
                let r = alu::rrc(self.regs.a);
                self.regs.a = r.value;
                out.carry = r.carry;
            }
            OpKind::Rra => {
                let r = alu::rr(self.regs.a, self.regs.flag(FLAG_C));
                self.regs.a = r.value;
                out.carry = r.carry;
            }

            OpKind::Daa => {
                let mut a = self.regs.a;
                let mut carry = self.regs.flag(FLAG_C);
                if !self.regs.flag(FLAG_N) {
                    if carry || a > 0x99 {
                        a = a.wrapping_add(0x60);
                        carry = true;
                    }
                    if self.regs.flag(FLAG_H) || a & 0x0F > 0x09 {
                        a = a.wrapping_add(0x06);
                    }
                } else {
                    if carry {
                        a = a.wrapping_sub(0x60);
                    }
                    if self.regs.flag(FLAG_H) {
                        a = a.wrapping_sub(0x06);
                    }
                }
                self.regs.a = a;
                out.zero = a == 0;
                out.carry = carry;
            }
            OpKind::Cpl => self.regs.a = !self.regs.a,
            OpKind::Scf => {}
            OpKind::Ccf => out.carry = !self.regs.flag(FLAG_C),

            OpKind::Jump => {
                let target = mmu.read_word(base.wrapping_add(1));
                out.taken = self.cond_met(op.cond);
                if out.taken {
                    self.regs.pc = target;
                }
            }
            OpKind::JumpHl => self.regs.pc = self.regs.get16(Reg16::HL),
            OpKind::JumpRel => {
                let off = self.read_operand8(mmu, self.src_of(op)?, base)? as i8;
                out.taken = self.cond_met(op.cond);
                if out.taken {
                    self.regs.pc = self.regs.pc.wrapping_add(off as i16 as u16);
                }
            }
            OpKind::Call => {
                let target = mmu.read_word(base.wrapping_add(1));
                out.taken = self.cond_met(op.cond);
                if out.taken {
                    self.push_word(mmu, self.regs.pc);
                    self.regs.pc = target;
                }
            }
            OpKind::Ret => {
                out.taken = self.cond_met(op.cond);
                if out.taken {
                    self.regs.pc = self.pop_word(mmu);
                }
            }
            // RETI re-enables interrupts in the same step, with no EI-style
            // delay.
            OpKind::Reti => {
                self.regs.pc = self.pop_word(mmu);
                self.ime = true;
            }
            OpKind::Rst(vector) => {
                self.push_word(mmu, self.regs.pc);
                self.regs.pc = vector;
            }
            OpKind::Push => {
                let val = self.read_operand16(mmu, self.src_of(op)?, base)?;
                self.push_word(mmu, val);
            }
            OpKind::Pop => {
                let val = self.pop_word(mmu);
                self.write_operand16(op, self.dst_of(op)?, val)?;
            }

            OpKind::Rlc
            | OpKind::Rrc
            | OpKind::Rl
            | OpKind::Rr
            | OpKind::Sla
            | OpKind::Sra
            | OpKind::Srl
            | OpKind::Swap => {
                let dst = self.dst_of(op)?;
                let val = self.read_operand8(mmu, dst, base)?;
                let carry_in = self.regs.flag(FLAG_C);
                let r = match op.kind {
                    OpKind::Rlc => alu::rlc(val),
                    OpKind::Rrc => alu::rrc(val),
                    OpKind::Rl => alu::rl(val, carry_in),
                    OpKind::Rr => alu::rr(val, carry_in),
                    OpKind::Sla => alu::sla(val),
                    OpKind::Sra => alu::sra(val),
                    OpKind::Srl => alu::srl(val),
                    _ => alu::swap(val),
                };
                self.write_operand8(mmu, dst, base, r.value)?;
                out.zero = r.zero;
                out.carry = r.carry;
            }
            OpKind::Bit(bit) => {
                let val = self.read_operand8(mmu, self.dst_of(op)?, base)?;
                out.zero = val & (1 << bit) == 0;
            }
            OpKind::Res(bit) => {
                let dst = self.dst_of(op)?;
                let val = self.read_operand8(mmu, dst, base)?;
                self.write_operand8(mmu, dst, base, val & !(1 << bit))?;
            }
            OpKind::SetBit(bit) => {
                let dst = self.dst_of(op)?;
                let val = self.read_operand8(mmu, dst, base)?;
                self.write_operand8(mmu, dst, base, val | 1 << bit)?;
            }
        }
        Ok(out)
    }

    /// Land the operation's raw flag values in F per the table's policy.
    fn apply_flags(&mut self, policy: FlagPolicy, out: &Outcome) {
        let resolve = |effect: FlagEffect, computed: bool, current: bool| match effect {
            FlagEffect::Unchanged => current,
            FlagEffect::Clear => false,
            FlagEffect::Set => true,
            FlagEffect::Computed => computed,
        };
        let z = resolve(policy.z, out.zero, self.regs.flag(FLAG_Z));
        // N is only ever forced or preserved; no operation computes it.
        let n = resolve(policy.n, false, self.regs.flag(FLAG_N));
        let h = resolve(policy.h, out.half_carry, self.regs.flag(FLAG_H));
        let c = resolve(policy.c, out.carry, self.regs.flag(FLAG_C));
        self.regs.set_flag(FLAG_Z, z);
        self.regs.set_flag(FLAG_N, n);
        self.regs.set_flag(FLAG_H, h);
        self.regs.set_flag(FLAG_C, c);
    }

    fn cond_met(&self, cond: Cond) -> bool {
        match cond {
            Cond::Always => true,
            Cond::NotZero => !self.regs.flag(FLAG_Z),
            Cond::Zero => self.regs.flag(FLAG_Z),
            Cond::NotCarry => !self.regs.flag(FLAG_C),
            Cond::Carry => self.regs.flag(FLAG_C),
        }
    }

    fn dst_of(&self, op: &Opcode) -> Result<Operand, CoreError> {
        op.dst.ok_or(CoreError::MalformedOpcode {
            mnemonic: op.mnemonic,
            reason: "missing destination operand",
        })
    }

    fn src_of(&self, op: &Opcode) -> Result<Operand, CoreError> {
        op.src.ok_or(CoreError::MalformedOpcode {
            mnemonic: op.mnemonic,
            reason: "missing source operand",
        })
    }

    /// Resolve and read an 8-bit operand. `base` is the address of the
    /// instruction's opcode byte; immediates follow it.
    fn read_operand8(&mut self, mmu: &mut Mmu, op: Operand, base: u16) -> Result<u8, CoreError> {
        Ok(match op {
            Operand::Reg(r) => self.regs.get8(r),
            Operand::Ind(pair) => mmu.read_byte(self.regs.get16(pair)),
            Operand::IndInc => {
                let hl = self.regs.get16(Reg16::HL);
                self.regs.set16(Reg16::HL, hl.wrapping_add(1));
                mmu.read_byte(hl)
            }
            Operand::IndDec => {
                let hl = self.regs.get16(Reg16::HL);
                self.regs.set16(Reg16::HL, hl.wrapping_sub(1));
                mmu.read_byte(hl)
            }
            Operand::HighC => mmu.read_byte(0xFF00 | self.regs.c as u16),
            Operand::Imm8 | Operand::Imm8Signed => mmu.read_byte(base.wrapping_add(1)),
            Operand::HighImm8 => {
                let off = mmu.read_byte(base.wrapping_add(1));
                mmu.read_byte(0xFF00 | off as u16)
            }
            Operand::IndImm16 => {
                let addr = mmu.read_word(base.wrapping_add(1));
                mmu.read_byte(addr)
            }
            Operand::Wide(_) | Operand::Imm16 => {
                return Err(CoreError::MalformedOpcode {
                    mnemonic: "",
                    reason: "16-bit operand in an 8-bit slot",
                });
            }
        })
    }

    fn write_operand8(
        &mut self,
        mmu: &mut Mmu,
        op: Operand,
        base: u16,
        val: u8,
    ) -> Result<(), CoreError> {
        match op {
            Operand::Reg(r) => self.regs.set8(r, val),
            Operand::Ind(pair) => mmu.write_byte(self.regs.get16(pair), val),
            Operand::IndInc => {
                let hl = self.regs.get16(Reg16::HL);
                self.regs.set16(Reg16::HL, hl.wrapping_add(1));
                mmu.write_byte(hl, val);
            }
            Operand::IndDec => {
                let hl = self.regs.get16(Reg16::HL);
                self.regs.set16(Reg16::HL, hl.wrapping_sub(1));
                mmu.write_byte(hl, val);
            }
            Operand::HighC => mmu.write_byte(0xFF00 | self.regs.c as u16, val),
            Operand::HighImm8 => {
                let off = mmu.read_byte(base.wrapping_add(1));
                mmu.write_byte(0xFF00 | off as u16, val);
            }
            Operand::IndImm16 => {
                let addr = mmu.read_word(base.wrapping_add(1));
                mmu.write_byte(addr, val);
            }
            Operand::Wide(_) | Operand::Imm8 | Operand::Imm8Signed | Operand::Imm16 => {
                return Err(CoreError::MalformedOpcode {
                    mnemonic: "",
                    reason: "unwritable 8-bit operand",
                });
            }
        }
        Ok(())
    }

    fn read_operand16(&mut self, mmu: &mut Mmu, op: Operand, base: u16) -> Result<u16, CoreError> {
        match op {
            Operand::Wide(r) => Ok(self.regs.get16(r)),
            Operand::Imm16 => Ok(mmu.read_word(base.wrapping_add(1))),
            _ => Err(CoreError::MalformedOpcode {
                mnemonic: "",
                reason: "8-bit operand in a 16-bit slot",
            }),
        }
    }

    fn write_operand16(&mut self, op: &Opcode, dst: Operand, val: u16) -> Result<(), CoreError> {
        match dst {
            Operand::Wide(r) => {
                self.regs.set16(r, val);
                Ok(())
            }
            _ => Err(CoreError::MalformedOpcode {
                mnemonic: op.mnemonic,
                reason: "unwritable 16-bit operand",
            }),
        }
    }

    /// Push high byte first, so the word sits little-endian in memory.
    fn push_word(&mut self, mmu: &mut Mmu, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write_byte(self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write_byte(self.regs.sp, val as u8);
    }

    fn pop_word(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = mmu.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = mmu.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (hi << 8) | lo
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupts::{INT_TIMER, INT_VBLANK};

    /// Write a program into WRAM and aim PC at it.
    fn setup(program: &[u8]) -> (Cpu, Mmu) {
        let mut cpu = Cpu::new();
        let mut mmu = Mmu::new();
        for (i, &byte) in program.iter().enumerate() {
            mmu.write_byte(0xC000 + i as u16, byte);
        }
        cpu.regs.pc = 0xC000;
        (cpu, mmu)
    }

    #[test]
    fn ld_immediate_and_register_moves() {
        let (mut cpu, mut mmu) = setup(&[0x3E, 0x42, 0x47]); // LD A,0x42; LD B,A
        assert_eq!(cpu.step(&mut mmu).unwrap(), 8);
        assert_eq!(cpu.regs.a, 0x42);
        assert_eq!(cpu.step(&mut mmu).unwrap(), 4);
        assert_eq!(cpu.regs.b, 0x42);
        assert_eq!(cpu.regs.pc, 0xC003);
    }

    #[test]
    fn hl_autoincrement_stores() {
        // LD HL,0xC100; LD (HL+),A; LD (HL-),A
        let (mut cpu, mut mmu) = setup(&[0x21, 0x00, 0xC1, 0x22, 0x32]);
        cpu.regs.a = 0x99;
        cpu.step(&mut mmu).unwrap();
        cpu.step(&mut mmu).unwrap();
        assert_eq!(mmu.read_byte(0xC100), 0x99);
        assert_eq!(cpu.regs.get16(Reg16::HL), 0xC101);
        cpu.step(&mut mmu).unwrap();
        assert_eq!(mmu.read_byte(0xC101), 0x99);
        assert_eq!(cpu.regs.get16(Reg16::HL), 0xC100);
    }

    #[test]
    fn add_sets_zero_and_carry() {
        let (mut cpu, mut mmu) = setup(&[0x80]); // ADD A,B
        cpu.regs.a = 0xFF;
        cpu.regs.b = 0x01;
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.a, 0);
        assert!(cpu.regs.flag(FLAG_Z));
        assert!(cpu.regs.flag(FLAG_H));
        assert!(cpu.regs.flag(FLAG_C));
        assert!(!cpu.regs.flag(FLAG_N));
    }

    #[test]
    fn compare_leaves_accumulator() {
        let (mut cpu, mut mmu) = setup(&[0xFE, 0x10]); // CP 0x10
        cpu.regs.a = 0x0F;
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.a, 0x0F);
        assert!(cpu.regs.flag(FLAG_N));
        assert!(cpu.regs.flag(FLAG_C));
    }

    #[test]
    fn jr_backward_offset() {
        // NOP; JR -3 (back to the NOP)
        let (mut cpu, mut mmu) = setup(&[0x00, 0x18, 0xFD]);
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.step(&mut mmu).unwrap(), 12);
        assert_eq!(cpu.regs.pc, 0xC000);
    }

    #[test]
    fn conditional_jump_not_taken_costs_less() {
        let (mut cpu, mut mmu) = setup(&[0x28, 0x05]); // JR Z,+5
        cpu.regs.set_flag(FLAG_Z, false);
        assert_eq!(cpu.step(&mut mmu).unwrap(), 8);
        assert_eq!(cpu.regs.pc, 0xC002);
    }

    #[test]
    fn call_and_ret_round_trip() {
        // CALL 0xC010; ... at 0xC010: RET
        let (mut cpu, mut mmu) = setup(&[0xCD, 0x10, 0xC0]);
        mmu.write_byte(0xC010, 0xC9);
        let sp = cpu.regs.sp;
        assert_eq!(cpu.step(&mut mmu).unwrap(), 24);
        assert_eq!(cpu.regs.pc, 0xC010);
        assert_eq!(cpu.regs.sp, sp.wrapping_sub(2));
        assert_eq!(mmu.read_word(cpu.regs.sp), 0xC003);
        assert_eq!(cpu.step(&mut mmu).unwrap(), 16);
        assert_eq!(cpu.regs.pc, 0xC003);
        assert_eq!(cpu.regs.sp, sp);
    }

    #[test]
    fn rst_jumps_to_fixed_vector() {
        let (mut cpu, mut mmu) = setup(&[0xEF]); // RST 28
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.pc, 0x0028);
        assert_eq!(mmu.read_word(cpu.regs.sp), 0xC001);
    }

    #[test]
    fn pop_af_masks_flag_low_nibble() {
        // LD BC,0x12FF; PUSH BC; POP AF
        let (mut cpu, mut mmu) = setup(&[0x01, 0xFF, 0x12, 0xC5, 0xF1]);
        cpu.step(&mut mmu).unwrap();
        cpu.step(&mut mmu).unwrap();
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.get16(Reg16::AF), 0x12F0);
    }

    #[test]
    fn cb_bit_test_and_set() {
        // BIT 7,A; SET 7,A; BIT 7,A
        let (mut cpu, mut mmu) = setup(&[0xCB, 0x7F, 0xCB, 0xFF, 0xCB, 0x7F]);
        cpu.regs.a = 0x00;
        assert_eq!(cpu.step(&mut mmu).unwrap(), 8);
        assert!(cpu.regs.flag(FLAG_Z));
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.a, 0x80);
        cpu.step(&mut mmu).unwrap();
        assert!(!cpu.regs.flag(FLAG_Z));
    }

    #[test]
    fn cb_rmw_on_hl_costs_sixteen() {
        // LD HL,0xC100; SET 0,(HL)
        let (mut cpu, mut mmu) = setup(&[0x21, 0x00, 0xC1, 0xCB, 0xC6]);
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.step(&mut mmu).unwrap(), 16);
        assert_eq!(mmu.read_byte(0xC100), 0x01);
    }

    #[test]
    fn illegal_opcode_is_fatal() {
        let (mut cpu, mut mmu) = setup(&[0xD3]);
        let err = cpu.step(&mut mmu).unwrap_err();
        assert_eq!(err, CoreError::IllegalOpcode { opcode: 0xD3, pc: 0xC000 });
        // PC stays on the bad byte.
        assert_eq!(cpu.regs.pc, 0xC000);
    }

    #[test]
    fn daa_after_bcd_addition() {
        // 0x45 + 0x55 = 0x9A; DAA corrects to 0x00 with carry.
        let (mut cpu, mut mmu) = setup(&[0x80, 0x27]); // ADD A,B; DAA
        cpu.regs.a = 0x45;
        cpu.regs.b = 0x55;
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.a, 0x9A);
        assert!(cpu.regs.flag(FLAG_H));
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.flag(FLAG_Z));
        assert!(cpu.regs.flag(FLAG_C));
    }

    #[test]
    fn add_sp_signed_offset() {
        let (mut cpu, mut mmu) = setup(&[0xE8, 0xF8]); // ADD SP,-8
        cpu.regs.sp = 0xFFF8;
        assert_eq!(cpu.step(&mut mmu).unwrap(), 16);
        assert_eq!(cpu.regs.sp, 0xFFF0);
        assert!(!cpu.regs.flag(FLAG_Z));
        assert!(!cpu.regs.flag(FLAG_N));
    }

    #[test]
    fn halt_idles_until_interrupt() {
        let (mut cpu, mut mmu) = setup(&[0x76, 0x00]); // HALT; NOP
        cpu.step(&mut mmu).unwrap();
        assert!(cpu.halted);
        assert_eq!(cpu.step(&mut mmu).unwrap(), 4);
        assert_eq!(cpu.regs.pc, 0xC001);
        assert!(cpu.halted);

        // Eligible interrupt with IME off wakes without dispatching.
        mmu.ie_reg = INT_TIMER;
        mmu.if_reg = INT_TIMER;
        cpu.step(&mut mmu).unwrap();
        assert!(!cpu.halted);
        assert_eq!(cpu.regs.pc, 0xC002); // executed the NOP, no vector jump
        assert_eq!(mmu.if_reg, INT_TIMER); // flag not consumed
    }

    #[test]
    fn stop_resets_divider_and_parks_the_cpu() {
        let (mut cpu, mut mmu) = setup(&[0x10, 0x00]); // STOP
        mmu.timer.step(300, &mut mmu.if_reg);
        assert_eq!(mmu.read_byte(0xFF04), 1);
        cpu.step(&mut mmu).unwrap();
        assert!(cpu.halted);
        assert_eq!(cpu.regs.pc, 0xC002); // operand byte consumed
        assert_eq!(mmu.read_byte(0xFF04), 0);
    }

    #[test]
    fn interrupt_dispatch_pushes_pc_and_jumps() {
        let (mut cpu, mut mmu) = setup(&[0x00]);
        cpu.ime = true;
        mmu.ie_reg = INT_VBLANK;
        mmu.if_reg = INT_VBLANK;
        assert_eq!(cpu.step(&mut mmu).unwrap(), 16);
        assert_eq!(cpu.regs.pc, 0x0040);
        assert!(!cpu.ime);
        assert_eq!(mmu.if_reg, 0);
        assert_eq!(mmu.read_word(cpu.regs.sp), 0xC000);
    }

    #[test]
    fn ei_enable_is_delayed_one_instruction() {
        let (mut cpu, mut mmu) = setup(&[0xFB, 0x00, 0x00]); // EI; NOP; NOP
        mmu.ie_reg = INT_VBLANK;
        mmu.if_reg = INT_VBLANK;
        cpu.step(&mut mmu).unwrap(); // EI
        assert!(!cpu.ime);
        cpu.step(&mut mmu).unwrap(); // first NOP still runs
        assert!(cpu.ime);
        assert_eq!(cpu.regs.pc, 0xC002);
        // Now the pending interrupt dispatches instead of the second NOP.
        assert_eq!(cpu.step(&mut mmu).unwrap(), 16);
        assert_eq!(cpu.regs.pc, 0x0040);
    }

    #[test]
    fn di_cancels_pending_ei() {
        let (mut cpu, mut mmu) = setup(&[0xFB, 0xF3, 0x00]); // EI; DI; NOP
        cpu.step(&mut mmu).unwrap();
        cpu.step(&mut mmu).unwrap();
        cpu.step(&mut mmu).unwrap();
        assert!(!cpu.ime);
    }

    #[test]
    fn reti_reenables_immediately() {
        let (mut cpu, mut mmu) = setup(&[0xD9]); // RETI
        cpu.regs.sp = 0xC100;
        mmu.write_word(0xC100, 0xC050);
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.pc, 0xC050);
        assert!(cpu.ime);
        assert_eq!(cpu.regs.sp, 0xC102);
    }

    #[test]
    fn scf_and_ccf() {
        let (mut cpu, mut mmu) = setup(&[0x37, 0x3F]); // SCF; CCF
        cpu.regs.set_flag(FLAG_N, true);
        cpu.regs.set_flag(FLAG_H, true);
        cpu.step(&mut mmu).unwrap();
        assert!(cpu.regs.flag(FLAG_C));
        assert!(!cpu.regs.flag(FLAG_N));
        assert!(!cpu.regs.flag(FLAG_H));
        cpu.step(&mut mmu).unwrap();
        assert!(!cpu.regs.flag(FLAG_C));
    }

    #[test]
    fn ldh_uses_high_page() {
        let (mut cpu, mut mmu) = setup(&[0xE0, 0x80, 0xF0, 0x80]); // LDH (0x80),A; LDH A,(0x80)
        cpu.regs.a = 0x5A;
        cpu.step(&mut mmu).unwrap();
        assert_eq!(mmu.read_byte(0xFF80), 0x5A);
        cpu.regs.a = 0;
        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.regs.a, 0x5A);
    }

    #[test]
    fn ld_through_c_uses_high_page() {
        // LD (C),A; LD A,(C) with C=0x80 addressing 0xFF80.
        let (mut cpu, mut mmu) = setup(&[0xE2, 0xF2]);
        cpu.regs.c = 0x80;
        cpu.regs.a = 0x3C;
        assert_eq!(cpu.step(&mut mmu).unwrap(), 8);
        assert_eq!(mmu.read_byte(0xFF80), 0x3C);
        assert_eq!(cpu.regs.pc, 0xC001); // one byte, no immediate

        cpu.regs.a = 0;
        assert_eq!(cpu.step(&mut mmu).unwrap(), 8);
        assert_eq!(cpu.regs.a, 0x3C);
    }

    #[test]
    fn store_sp_writes_word_little_endian() {
        let (mut cpu, mut mmu) = setup(&[0x08, 0x00, 0xC1]); // LD (0xC100),SP
        cpu.regs.sp = 0xFFFE;
        assert_eq!(cpu.step(&mut mmu).unwrap(), 20);
        assert_eq!(mmu.read_byte(0xC100), 0xFE);
        assert_eq!(mmu.read_byte(0xC101), 0xFF);
    }
}
