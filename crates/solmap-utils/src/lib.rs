// SPDX-License-Identifier: AGPL-3.0

//! Shared helpers: EVM opcode classification, hex handling and terminal text

/// PUSH opcode bounds used to size instructions
pub struct EVM;

impl EVM {
    pub const PUSH0: u8 = 0x5f;
    pub const PUSH1: u8 = 0x60;
    pub const PUSH32: u8 = 0x7f;
}

/// Number of immediate operand bytes that follow `opcode`.
///
/// Only PUSH1..PUSH32 carry an operand. PUSH0 and every other byte value,
/// including unassigned ones, are single-byte instructions.
#[inline]
pub const fn push_operand_len(opcode: u8) -> Option<usize> {
    if opcode >= EVM::PUSH1 && opcode <= EVM::PUSH32 {
        Some((opcode - EVM::PUSH0) as usize)
    } else {
        None
    }
}

/// Total width in bytes of the instruction starting with `opcode`.
#[inline]
pub const fn instruction_width(opcode: u8) -> usize {
    match push_operand_len(opcode) {
        Some(len) => 1 + len,
        None => 1,
    }
}

const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
    "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
    "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
    "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
    "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
    "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];

const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

/// Single-byte opcodes outside the PUSH/DUP/SWAP/LOG families.
const NAMED_OPCODES: &[(u8, &str)] = &[
    (0x00, "STOP"),
    (0x01, "ADD"),
    (0x02, "MUL"),
    (0x03, "SUB"),
    (0x04, "DIV"),
    (0x05, "SDIV"),
    (0x06, "MOD"),
    (0x07, "SMOD"),
    (0x08, "ADDMOD"),
    (0x09, "MULMOD"),
    (0x0a, "EXP"),
    (0x0b, "SIGNEXTEND"),
    (0x10, "LT"),
    (0x11, "GT"),
    (0x12, "SLT"),
    (0x13, "SGT"),
    (0x14, "EQ"),
    (0x15, "ISZERO"),
    (0x16, "AND"),
    (0x17, "OR"),
    (0x18, "XOR"),
    (0x19, "NOT"),
    (0x1a, "BYTE"),
    (0x1b, "SHL"),
    (0x1c, "SHR"),
    (0x1d, "SAR"),
    (0x20, "SHA3"),
    (0x30, "ADDRESS"),
    (0x31, "BALANCE"),
    (0x32, "ORIGIN"),
    (0x33, "CALLER"),
    (0x34, "CALLVALUE"),
    (0x35, "CALLDATALOAD"),
    (0x36, "CALLDATASIZE"),
    (0x37, "CALLDATACOPY"),
    (0x38, "CODESIZE"),
    (0x39, "CODECOPY"),
    (0x3a, "GASPRICE"),
    (0x3b, "EXTCODESIZE"),
    (0x3c, "EXTCODECOPY"),
    (0x3d, "RETURNDATASIZE"),
    (0x3e, "RETURNDATACOPY"),
    (0x3f, "EXTCODEHASH"),
    (0x40, "BLOCKHASH"),
    (0x41, "COINBASE"),
    (0x42, "TIMESTAMP"),
    (0x43, "NUMBER"),
    (0x44, "PREVRANDAO"),
    (0x45, "GASLIMIT"),
    (0x46, "CHAINID"),
    (0x47, "SELFBALANCE"),
    (0x48, "BASEFEE"),
    (0x49, "BLOBHASH"),
    (0x4a, "BLOBBASEFEE"),
    (0x50, "POP"),
    (0x51, "MLOAD"),
    (0x52, "MSTORE"),
    (0x53, "MSTORE8"),
    (0x54, "SLOAD"),
    (0x55, "SSTORE"),
    (0x56, "JUMP"),
    (0x57, "JUMPI"),
    (0x58, "PC"),
    (0x59, "MSIZE"),
    (0x5a, "GAS"),
    (0x5b, "JUMPDEST"),
    (0x5c, "TLOAD"),
    (0x5d, "TSTORE"),
    (0x5e, "MCOPY"),
    (0x5f, "PUSH0"),
    (0xf0, "CREATE"),
    (0xf1, "CALL"),
    (0xf2, "CALLCODE"),
    (0xf3, "RETURN"),
    (0xf4, "DELEGATECALL"),
    (0xf5, "CREATE2"),
    (0xfa, "STATICCALL"),
    (0xfd, "REVERT"),
    (0xfe, "INVALID"),
    (0xff, "SELFDESTRUCT"),
];

/// Human-readable mnemonic for an opcode byte. Diagnostic only.
pub fn opcode_to_string(opcode: u8) -> &'static str {
    match opcode {
        0x60..=0x7f => PUSH_NAMES[(opcode - 0x60) as usize],
        0x80..=0x8f => DUP_NAMES[(opcode - 0x80) as usize],
        0x90..=0x9f => SWAP_NAMES[(opcode - 0x90) as usize],
        0xa0..=0xa4 => LOG_NAMES[(opcode - 0xa0) as usize],
        _ => NAMED_OPCODES
            .iter()
            .find(|(byte, _)| *byte == opcode)
            .map(|(_, name)| *name)
            .unwrap_or("UNKNOWN"),
    }
}

/// Strip hex prefix (0x or 0X)
pub fn stripped(hexstring: &str) -> &str {
    hexstring
        .strip_prefix("0x")
        .or_else(|| hexstring.strip_prefix("0X"))
        .unwrap_or(hexstring)
}

/// Decode hex string to bytes
pub fn decode_hex(hexstring: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(stripped(hexstring.trim()))
}

/// Parse a hex number with or without `0x` prefix.
pub fn parse_hex_usize(text: &str) -> Option<usize> {
    let digits = stripped(text.trim());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    usize::from_str_radix(digits, 16).ok()
}

/// Indent text by n spaces
pub fn indent_text(text: &str, n: usize) -> String {
    let indent = " ".repeat(n);
    text.lines()
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
