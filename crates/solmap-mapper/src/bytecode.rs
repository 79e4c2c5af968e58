// SPDX-License-Identifier: AGPL-3.0

//! Runtime bytecode disassembly: program counter to instruction index.

use solmap_exceptions::{MapperError, SolmapResult};
use solmap_utils::{decode_hex, instruction_width, opcode_to_string, push_operand_len};

/// Decoded runtime bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytecode {
    bytes: Vec<u8>,
    padded_len: usize,
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub pc: usize,
    pub index: usize,
    pub opcode: u8,
    /// Operand bytes present in the bytecode. Shorter than the declared
    /// operand length only for a truncated trailing PUSH.
    pub operand: &'a [u8],
}

impl Instruction<'_> {
    pub fn mnemonic(&self) -> &'static str {
        opcode_to_string(self.opcode)
    }
}

impl Bytecode {
    /// Parse a hex string with optional `0x` prefix.
    pub fn parse(hexstring: &str) -> SolmapResult<Self> {
        if solmap_utils::stripped(hexstring.trim()).is_empty() {
            return Err(MapperError::BytecodeDecode("bytecode is empty".to_string()));
        }

        let bytes = decode_hex(hexstring).map_err(|err| {
            MapperError::BytecodeDecode(format!(
                "expected hex string of even length ({})",
                err
            ))
        })?;

        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> SolmapResult<Self> {
        if bytes.is_empty() {
            return Err(MapperError::BytecodeDecode("bytecode is empty".to_string()));
        }

        let padded_len = padded_length(&bytes);
        Ok(Self { bytes, padded_len })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes actually present.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length including the implied zero operand bytes of a truncated trailing PUSH.
    pub fn padded_len(&self) -> usize {
        self.padded_len
    }

    pub fn opcode_at(&self, pc: usize) -> Option<u8> {
        self.bytes.get(pc).copied()
    }

    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            bytes: &self.bytes,
            pc: 0,
            index: 0,
        }
    }

    /// Same as [`Bytecode::instruction_index`] for a signed program counter.
    pub fn instruction_index_for_pc(&self, pc: i64) -> SolmapResult<usize> {
        let pc = usize::try_from(pc).map_err(|_| MapperError::NegativeProgramCounter(pc))?;
        self.instruction_index(pc)
    }

    /// Zero-based index of the instruction that owns byte `pc`.
    ///
    /// Operand bytes of a PUSH belong to the PUSH, so every byte of
    /// `PUSHn <data>` yields the same index. A `pc` inside the implied padding
    /// of a truncated trailing PUSH yields that PUSH's index. Anything at or
    /// past the padded length is out of range.
    pub fn instruction_index(&self, pc: usize) -> SolmapResult<usize> {
        if pc >= self.padded_len {
            return Err(MapperError::AddressOutOfRange {
                pc,
                padded_len: self.padded_len,
            });
        }

        if pc == 0 {
            return Ok(0);
        }

        // pre-increment: the first opcode byte moves the counter to 0
        let mut index: i64 = -1;
        let mut operand_left = 0usize;

        for (current_pc, &opcode) in self.bytes.iter().enumerate() {
            if operand_left > 0 {
                operand_left -= 1;
            } else {
                index += 1;
                if let Some(len) = push_operand_len(opcode) {
                    operand_left = len;
                }
            }

            if current_pc == pc {
                break;
            }
        }

        // pc past the real bytes lands in the last PUSH's padding
        Ok(index.max(0) as usize)
    }
}

fn padded_length(bytes: &[u8]) -> usize {
    let mut pc = 0;
    while pc < bytes.len() {
        pc += instruction_width(bytes[pc]);
    }
    pc
}

/// Iterator over the instructions of a [`Bytecode`].
pub struct Instructions<'a> {
    bytes: &'a [u8],
    pc: usize,
    index: usize,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Instruction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let opcode = *self.bytes.get(self.pc)?;
        let start = self.pc + 1;
        let next = self.pc + instruction_width(opcode);
        let end = next.min(self.bytes.len());

        let instruction = Instruction {
            pc: self.pc,
            index: self.index,
            opcode,
            operand: &self.bytes[start..end],
        };

        self.pc = next;
        self.index += 1;
        Some(instruction)
    }
}
