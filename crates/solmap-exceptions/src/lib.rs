// SPDX-License-Identifier: AGPL-3.0

//! Mapping errors
//!
//! Every way a PC-to-source lookup can fail. Each variant carries the
//! addresses and indices involved so a failure can be diagnosed without
//! re-running the lookup. [`LoadError`] covers picking the contract out of
//! compiler output.

use thiserror::Error;

/// Errors raised while translating a program counter into a source location.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapperError {
    /// The hex address given by the caller could not be parsed.
    #[error("Invalid address {address:?}: expected a hex number with optional 0x prefix")]
    InvalidAddress { address: String },

    #[error("Program counter must not be negative (got {0})")]
    NegativeProgramCounter(i64),

    /// The runtime bytecode is empty, has odd length, or is not hex.
    #[error("Invalid bytecode: {0}")]
    BytecodeDecode(String),

    /// The PC is at or beyond the zero-padded end of the bytecode.
    #[error("PC {pc:#x} is out of range: padded bytecode length is {padded_len} bytes")]
    AddressOutOfRange { pc: usize, padded_len: usize },

    /// The PC names a byte the bytecode does not contain (implied PUSH padding).
    #[error("Could not find address {pc:#x} in runtime bytecode of {len} bytes")]
    AddressNotFound { pc: usize, len: usize },

    #[error("Invalid instruction index {index}: source map contains {entries} entries")]
    SourceMapIndexOutOfRange { index: usize, entries: usize },

    /// A mandatory field (offset, length or file id) was never defined.
    #[error("Incomplete source map entry for instruction {index}: missing {field}")]
    IncompleteSourceMapEntry { index: usize, field: &'static str },

    #[error("Invalid source map entry {index}: field {field} has value {value:?}")]
    InvalidSourceMapEntry {
        index: usize,
        field: &'static str,
        value: String,
    },

    /// An AST node carries a `src` attribute that is not `offset:length:file_id`.
    #[error("Invalid source range {src:?}: expected offset:length:file_id")]
    InvalidSourceRange { src: String },

    /// The instruction belongs to compiler-generated code.
    #[error("Instruction {index} has no associated source file (compiler-generated code)")]
    NoAssociatedSource { index: usize },

    #[error("No AST node contains source location {offset}:{length}:{file_id}")]
    NoContainingAstNode {
        offset: usize,
        length: usize,
        file_id: i64,
    },

    /// Literal source text is unavailable and reconstruction produced nothing.
    #[error("No source text available for file {file_id} and the AST node could not be reconstructed")]
    MissingLiteralSource { file_id: i64 },
}

impl MapperError {
    /// Stable kebab-case name of the error kind, for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            MapperError::InvalidAddress { .. } => "invalid-address",
            MapperError::NegativeProgramCounter(_) => "negative-program-counter",
            MapperError::BytecodeDecode(_) => "bytecode-decode-error",
            MapperError::AddressOutOfRange { .. } => "address-out-of-range",
            MapperError::AddressNotFound { .. } => "address-not-found",
            MapperError::SourceMapIndexOutOfRange { .. } => "source-map-index-out-of-range",
            MapperError::IncompleteSourceMapEntry { .. } => "incomplete-source-map-entry",
            MapperError::InvalidSourceMapEntry { .. } => "invalid-source-map-entry",
            MapperError::InvalidSourceRange { .. } => "invalid-source-range",
            MapperError::NoAssociatedSource { .. } => "no-associated-source",
            MapperError::NoContainingAstNode { .. } => "no-containing-ast-node",
            MapperError::MissingLiteralSource { .. } => "missing-literal-source",
        }
    }
}

/// Result type for mapping operations
pub type SolmapResult<T> = Result<T, MapperError>;

/// Errors raised while picking a contract out of compiler output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("No contract found for name {name} (available: {})", .available.join(", "))]
    ContractNotFound { name: String, available: Vec<String> },

    #[error("Multiple possible contracts found for name {name}: {}", .candidates.join(", "))]
    AmbiguousContract {
        name: String,
        candidates: Vec<String>,
    },

    /// A contract entry lacks the runtime bytecode or its source map.
    #[error("Contract {key} has no {field} in the compiler output")]
    MissingArtifactField { key: String, field: &'static str },

    #[error("Unrecognised compiler output: {0}")]
    UnknownFormat(String),
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::ContractNotFound { .. } => "contract-not-found",
            LoadError::AmbiguousContract { .. } => "ambiguous-contract",
            LoadError::MissingArtifactField { .. } => "missing-artifact-field",
            LoadError::UnknownFormat(_) => "unknown-format",
        }
    }
}
