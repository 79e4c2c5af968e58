// SPDX-License-Identifier: AGPL-3.0

//! Program counter to Solidity source mapping
//!
//! `hex address -> instruction index -> source map entry -> AST node -> code`.
//! Every step is a pure function over already-loaded compiler output; see
//! [`Mapper`] for the end-to-end lookup.

pub mod ast;
pub mod bytecode;
pub mod mapper;
pub mod reconstruct;
pub mod source;
pub mod source_map;

pub use ast::{find_smallest_containing, Node, NodeType, SourceRange};
pub use bytecode::{Bytecode, Instruction};
pub use mapper::{map_address, Mapper, MapperResult};
pub use reconstruct::{unparse, unparse_value};
pub use solmap_exceptions::{MapperError, SolmapResult};
pub use source::{LineIndex, SourceFile, SourceSet};
pub use source_map::{JumpType, SourceMap, SourceMapEntry};

use solmap_utils::indent_text;
use std::fmt;

/// Steps of one mapping. Any step may end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    Start,
    BytecodeResolved,
    SourceMapResolved,
    AstNodeResolved,
    LiteralExtracted,
    Reconstructed,
    Done,
    Failed,
}

impl fmt::Display for MappingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Trace of a mapping for `--explain` output.
///
/// State transitions are always tracked; the text lines only when enabled.
/// An enabled explanation prints itself to stderr when dropped.
#[derive(Debug)]
pub struct Explanation {
    enabled: bool,
    content: String,
    states: Vec<MappingState>,
}

impl Explanation {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            content: String::new(),
            states: Vec::new(),
        }
    }

    pub fn add(&mut self, text: &str) {
        if self.enabled {
            self.content.push_str(text);
            self.content.push('\n');
        }
    }

    pub fn transition(&mut self, state: MappingState, detail: &str) {
        self.states.push(state);
        self.add(&format!("{:<18} {}", state.to_string(), detail));
    }

    /// Current state, `Start` before anything happened.
    pub fn state(&self) -> MappingState {
        self.states.last().copied().unwrap_or(MappingState::Start)
    }

    pub fn states(&self) -> &[MappingState] {
        &self.states
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn print(&self) {
        if self.enabled && !self.content.is_empty() {
            eprintln!("{}", indent_text(self.content.trim_end(), 2));
        }
    }
}

impl Drop for Explanation {
    fn drop(&mut self) {
        self.print();
    }
}
