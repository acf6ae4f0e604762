//! Pure arithmetic/logic primitives.
//!
//! Each function computes a result plus the flag values the operation would
//! produce; nothing here touches the register bank. The executor decides
//! which of the returned flags actually land in F, according to the opcode
//! table's per-flag policy.

/// Result of an 8-bit ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub zero: bool,
    pub half_carry: bool,
    pub carry: bool,
}

/// Result of a 16-bit ALU operation. Zero is never computed at this width
/// on the SM83 (ADD HL,rr leaves Z untouched; ADD SP,e8 clears it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult16 {
    pub value: u16,
    pub half_carry: bool,
    pub carry: bool,
}

/// 8-bit addition with optional carry-in. Half-carry is the carry out of
/// bit 3.
pub fn add8(a: u8, b: u8, carry_in: bool) -> AluResult {
    let carry = carry_in as u8;
    let raw = a as u16 + b as u16 + carry as u16;
    let value = raw as u8;
    AluResult {
        value,
        zero: value == 0,
        half_carry: (a & 0x0F) + (b & 0x0F) + carry > 0x0F,
        carry: raw > 0xFF,
    }
}

/// 8-bit subtraction with optional borrow-in. Carry means borrow.
pub fn sub8(a: u8, b: u8, borrow_in: bool) -> AluResult {
    let borrow = borrow_in as u8;
    let value = a.wrapping_sub(b).wrapping_sub(borrow);
    AluResult {
        value,
        zero: value == 0,
        half_carry: (a & 0x0F) < (b & 0x0F) + borrow,
        carry: (a as u16) < b as u16 + borrow as u16,
    }
}

pub fn inc8(v: u8) -> AluResult {
    let value = v.wrapping_add(1);
    AluResult {
        value,
        zero: value == 0,
        half_carry: (v & 0x0F) + 1 > 0x0F,
        carry: false,
    }
}

pub fn dec8(v: u8) -> AluResult {
    let value = v.wrapping_sub(1);
    AluResult {
        value,
        zero: value == 0,
        half_carry: v & 0x0F == 0,
        carry: false,
    }
}

pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: false,
    }
}

pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: false,
    }
}

pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: false,
    }
}

/// 16-bit addition for ADD HL,rr. Half-carry is the carry out of bit 11.
pub fn add16(a: u16, b: u16) -> AluResult16 {
    AluResult16 {
        value: a.wrapping_add(b),
        half_carry: ((a & 0x0FFF) + (b & 0x0FFF)) & 0x1000 != 0,
        carry: a as u32 + b as u32 > 0xFFFF,
    }
}

/// SP + signed offset, used by ADD SP,e8 and LD HL,SP+e8. Flags come from
/// the unsigned addition of the low byte.
pub fn add16_signed(sp: u16, offset: i8) -> AluResult16 {
    let off = offset as i16 as u16;
    AluResult16 {
        value: sp.wrapping_add(off),
        half_carry: (sp & 0x0F) + (off & 0x0F) > 0x0F,
        carry: (sp & 0xFF) + (off & 0xFF) > 0xFF,
    }
}

/// Rotate left; bit 7 wraps to bit 0 and into carry.
pub fn rlc(v: u8) -> AluResult {
    let value = v.rotate_left(1);
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: v & 0x80 != 0,
    }
}

/// Rotate left through carry; carry-in fills bit 0, bit 7 becomes carry.
pub fn rl(v: u8, carry_in: bool) -> AluResult {
    let value = (v << 1) | carry_in as u8;
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: v & 0x80 != 0,
    }
}

/// Rotate right; bit 0 wraps to bit 7 and into carry.
pub fn rrc(v: u8) -> AluResult {
    let value = v.rotate_right(1);
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: v & 0x01 != 0,
    }
}

/// Rotate right through carry.
pub fn rr(v: u8, carry_in: bool) -> AluResult {
    let value = (v >> 1) | ((carry_in as u8) << 7);
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: v & 0x01 != 0,
    }
}

/// Arithmetic shift left; vacated bit 0 is zero.
pub fn sla(v: u8) -> AluResult {
    let value = v << 1;
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: v & 0x80 != 0,
    }
}

/// Logical shift right; vacated bit 7 is zero.
pub fn srl(v: u8) -> AluResult {
    let value = v >> 1;
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: v & 0x01 != 0,
    }
}

/// Arithmetic shift right. Unlike [`srl`] the top bit keeps its value, so
/// this is its own primitive rather than a parameterized right shift.
pub fn sra(v: u8) -> AluResult {
    let value = (v >> 1) | (v & 0x80);
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: v & 0x01 != 0,
    }
}

/// Exchange the high and low nibbles.
pub fn swap(v: u8) -> AluResult {
    let value = v.rotate_left(4);
    AluResult {
        value,
        zero: value == 0,
        half_carry: false,
        carry: false,
    }
}
