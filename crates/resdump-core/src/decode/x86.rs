//! x86/x64 decoding with iced-x86.

use iced_x86::{
    Decoder as IcedDecoder, DecoderOptions, Instruction, Mnemonic as IcedMnemonic, OpKind,
    Register,
};

use super::{DecodedInstruction, Decoder, Mnemonic, Operand};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct X86Decoder {
    bitness: u32,
}

impl X86Decoder {
    /// Decoder for 16, 32 or 64-bit code
    pub fn new(bitness: u32) -> Result<Self> {
        if !matches!(bitness, 16 | 32 | 64) {
            return Err(Error::UnsupportedBitness(bitness));
        }
        Ok(Self { bitness })
    }

    pub fn x64() -> Self {
        Self { bitness: 64 }
    }

    pub fn bitness(&self) -> u32 {
        self.bitness
    }
}

impl Default for X86Decoder {
    fn default() -> Self {
        Self::x64()
    }
}

impl Decoder for X86Decoder {
    fn decode(&mut self, address: u64, bytes: &[u8]) -> Option<DecodedInstruction> {
        let mut decoder =
            IcedDecoder::try_with_ip(self.bitness, bytes, address, DecoderOptions::NONE).ok()?;
        if !decoder.can_decode() {
            return None;
        }

        let instr = decoder.decode();
        if instr.is_invalid() || instr.len() == 0 {
            return None;
        }

        let mnemonic = match instr.mnemonic() {
            IcedMnemonic::Lea => Mnemonic::Lea,
            IcedMnemonic::Call => Mnemonic::Call,
            _ => Mnemonic::Other,
        };

        Some(DecodedInstruction {
            address,
            length: instr.len(),
            mnemonic,
            operands: (0..instr.op_count()).map(|i| operand(&instr, i)).collect(),
        })
    }
}

fn operand(instr: &Instruction, index: u32) -> Operand {
    match instr.op_kind(index) {
        OpKind::Register => Operand::Register,
        OpKind::NearBranch16 | OpKind::NearBranch32 | OpKind::NearBranch64 => {
            Operand::Immediate {
                value: instr.near_branch_target().wrapping_sub(instr.next_ip()),
                relative: true,
            }
        }
        OpKind::Immediate8
        | OpKind::Immediate8_2nd
        | OpKind::Immediate16
        | OpKind::Immediate32
        | OpKind::Immediate64
        | OpKind::Immediate8to16
        | OpKind::Immediate8to32
        | OpKind::Immediate8to64
        | OpKind::Immediate32to64 => Operand::Immediate {
            value: instr.immediate(index),
            relative: false,
        },
        // iced reports RIP-relative displacements already resolved to the target
        OpKind::Memory if instr.is_ip_rel_memory_operand() => Operand::Memory {
            displacement: instr.ip_rel_memory_address().wrapping_sub(instr.next_ip()) as i64,
            ip_relative: true,
            register_based: false,
        },
        OpKind::Memory => Operand::Memory {
            displacement: instr.memory_displacement64() as i64,
            ip_relative: false,
            register_based: instr.memory_base() != Register::None
                || instr.memory_index() != Register::None,
        },
        _ => Operand::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(address: u64, bytes: &[u8]) -> Option<DecodedInstruction> {
        X86Decoder::x64().decode(address, bytes)
    }

    #[test]
    fn test_lea_rip_relative() {
        // lea rcx, [rip+0x10]
        let instr = decode(0x140001000, &[0x48, 0x8D, 0x0D, 0x10, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::Lea);
        assert_eq!(instr.length, 7);
        assert_eq!(instr.operands.len(), 2);
        assert_eq!(instr.operands[0], Operand::Register);
        assert_eq!(instr.absolute_address(1), Some(0x140001017));
    }

    #[test]
    fn test_lea_register_based_has_no_address() {
        // lea rax, [rbx+8]
        let instr = decode(0x1000, &[0x48, 0x8D, 0x43, 0x08]).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::Lea);
        assert_eq!(instr.absolute_address(1), None);
    }

    #[test]
    fn test_call_rel32() {
        // call +0xFB
        let instr = decode(0x2000, &[0xE8, 0xFB, 0x00, 0x00, 0x00, 0xCC]).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::Call);
        assert_eq!(instr.length, 5);
        assert!(instr.operands[0].is_immediate());
        assert_eq!(instr.absolute_address(0), Some(0x2100));
    }

    #[test]
    fn test_call_backwards() {
        // call -0x1005 from 0x3000 lands on 0x2000
        let rel = (-0x1005i32).to_le_bytes();
        let instr = decode(0x3000, &[0xE8, rel[0], rel[1], rel[2], rel[3]]).unwrap();
        assert_eq!(instr.absolute_address(0), Some(0x2000));
    }

    #[test]
    fn test_indirect_calls_are_not_immediate() {
        // call rax
        let instr = decode(0x1000, &[0xFF, 0xD0]).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::Call);
        assert!(!instr.operands[0].is_immediate());

        // call qword ptr [rip+0x100]
        let instr = decode(0x1000, &[0xFF, 0x15, 0x00, 0x01, 0x00, 0x00]).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::Call);
        assert!(!instr.operands[0].is_immediate());
    }

    #[test]
    fn test_other_instruction() {
        let instr = decode(0x1000, &[0x90]).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::Other);
        assert_eq!(instr.length, 1);
        assert_eq!(instr.next_address(), 0x1001);
    }

    #[test]
    fn test_invalid_and_truncated_bytes() {
        // push es does not exist in 64-bit mode
        assert_eq!(decode(0x1000, &[0x06]), None);
        // call rel32 cut short
        assert_eq!(decode(0x1000, &[0xE8, 0x00]), None);
        assert_eq!(decode(0x1000, &[]), None);
    }

    #[test]
    fn test_bitness() {
        assert!(X86Decoder::new(32).is_ok());
        assert!(X86Decoder::new(8).is_err());
        assert_eq!(X86Decoder::default().bitness(), 64);

        // push es is valid in 32-bit mode
        let mut decoder = X86Decoder::new(32).unwrap();
        assert!(decoder.decode(0x1000, &[0x06]).is_some());
    }
}
