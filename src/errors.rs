use thiserror::Error;

/// Fatal conditions raised by the execution core.
///
/// These are not recoverable at the instruction level: they propagate out of
/// [`crate::cpu::Cpu::step`] to the clock, which logs them and pauses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// An undefined opcode slot was fetched. The SM83 leaves eleven holes in
    /// the unprefixed table; real hardware locks up on them.
    #[error("illegal opcode {opcode:#04X} fetched at {pc:#06X}")]
    IllegalOpcode { opcode: u8, pc: u16 },

    /// A table entry asked the executor for an operand access its operand
    /// kind cannot provide (e.g. writing to an immediate). Indicates a
    /// malformed opcode table, not bad guest code.
    #[error("malformed descriptor for {mnemonic}: {reason}")]
    MalformedOpcode {
        mnemonic: &'static str,
        reason: &'static str,
    },
}
