//! Scripted decoder for walker tests.

use std::collections::HashMap;

use super::{DecodedInstruction, Decoder, Mnemonic, Operand};

/// Returns pre-built instructions at fixed addresses and fails everywhere else.
#[derive(Debug, Default)]
pub struct ScriptedDecoder {
    instructions: HashMap<u64, DecodedInstruction>,
    /// Number of `decode` calls made so far
    pub attempts: usize,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, instr: DecodedInstruction) -> Self {
        self.instructions.insert(instr.address, instr);
        self
    }
}

impl Decoder for ScriptedDecoder {
    fn decode(&mut self, address: u64, _bytes: &[u8]) -> Option<DecodedInstruction> {
        self.attempts += 1;
        self.instructions.get(&address).cloned()
    }
}

/// `lea reg, [rip+disp]` pointing at `target`
pub fn lea(address: u64, target: u64) -> DecodedInstruction {
    let length = 7;
    DecodedInstruction {
        address,
        length,
        mnemonic: Mnemonic::Lea,
        operands: vec![
            Operand::Register,
            Operand::Memory {
                displacement: target.wrapping_sub(address + length as u64) as i64,
                ip_relative: true,
                register_based: false,
            },
        ],
    }
}

/// `call rel32` to `target`
pub fn call(address: u64, target: u64) -> DecodedInstruction {
    let length = 5;
    DecodedInstruction {
        address,
        length,
        mnemonic: Mnemonic::Call,
        operands: vec![Operand::Immediate {
            value: target.wrapping_sub(address + length as u64),
            relative: true,
        }],
    }
}

/// `call reg`
pub fn call_register(address: u64) -> DecodedInstruction {
    DecodedInstruction {
        address,
        length: 2,
        mnemonic: Mnemonic::Call,
        operands: vec![Operand::Register],
    }
}

pub fn other(address: u64, length: usize) -> DecodedInstruction {
    DecodedInstruction {
        address,
        length,
        mnemonic: Mnemonic::Other,
        operands: Vec::new(),
    }
}
