//! Instruction decoding, reduced to what the struct walker looks at.
//!
//! The walker only cares whether an instruction is a `LEA`, a `CALL`, or
//! something else, and where its operands point. [`Decoder`] is the seam:
//! [`X86Decoder`] backs it with iced-x86, tests back it with scripted
//! instruction streams.

mod x86;

#[cfg(test)]
pub mod mock;

pub use x86::X86Decoder;

#[cfg(test)]
pub use mock::ScriptedDecoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Lea,
    Call,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Register,
    /// Immediate value; `relative` values are signed offsets from the next instruction
    Immediate { value: u64, relative: bool },
    /// Memory reference; `displacement` is relative to the next instruction when `ip_relative`
    Memory {
        displacement: i64,
        ip_relative: bool,
        register_based: bool,
    },
    /// Implicit or segment-addressed operands the walker never resolves
    Other,
}

impl Operand {
    pub fn is_immediate(&self) -> bool {
        matches!(self, Operand::Immediate { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub address: u64,
    pub length: usize,
    pub mnemonic: Mnemonic,
    pub operands: Vec<Operand>,
}

impl DecodedInstruction {
    pub fn next_address(&self) -> u64 {
        self.address.wrapping_add(self.length as u64)
    }

    /// Absolute address an operand refers to, if it can be known statically.
    ///
    /// Relative immediates and IP-relative memory resolve against the next
    /// instruction; absolute memory resolves to its displacement. Registers
    /// and register-based memory have no static address.
    pub fn absolute_address(&self, index: usize) -> Option<u64> {
        let next = self.next_address();
        match *self.operands.get(index)? {
            Operand::Immediate {
                value,
                relative: true,
            } => Some(next.wrapping_add(value)),
            Operand::Immediate {
                value,
                relative: false,
            } => Some(value),
            Operand::Memory {
                displacement,
                ip_relative: true,
                ..
            } => Some(next.wrapping_add_signed(displacement)),
            Operand::Memory {
                displacement,
                register_based: false,
                ..
            } => Some(displacement as u64),
            Operand::Memory { .. } | Operand::Register | Operand::Other => None,
        }
    }
}

/// Decodes a single instruction.
pub trait Decoder {
    /// Decode the instruction at `address`, whose bytes start at `bytes[0]`.
    ///
    /// `bytes` runs to the end of the image. Returns `None` for anything that
    /// is not a valid instruction; a returned instruction has `length >= 1`.
    fn decode(&mut self, address: u64, bytes: &[u8]) -> Option<DecodedInstruction>;
}

impl<D: Decoder + ?Sized> Decoder for &mut D {
    fn decode(&mut self, address: u64, bytes: &[u8]) -> Option<DecodedInstruction> {
        (**self).decode(address, bytes)
    }
}
