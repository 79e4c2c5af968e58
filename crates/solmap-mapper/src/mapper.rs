// SPDX-License-Identifier: AGPL-3.0

use serde::Serialize;
use serde_json::Value;
use solmap_exceptions::{MapperError, SolmapResult};
use solmap_utils::{opcode_to_string, parse_hex_usize, truncate};
use std::fmt;
use tracing::{debug, warn};

use crate::ast::{find_smallest_containing, source_unit_path, Node};
use crate::bytecode::Bytecode;
use crate::reconstruct::unparse;
use crate::source::{snippet, SourceSet};
use crate::source_map::{SourceMap, SourceMapEntry};
use crate::{Explanation, MappingState};

/// Where a program counter came from in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapperResult {
    pub file: String,
    pub code: String,
    /// 1-based line, `0` when the code was reconstructed from the AST.
    pub line: usize,
    pub pc: usize,
    pub instruction_index: usize,
    pub entry: SourceMapEntry,
    pub reconstructed: bool,
}

impl fmt::Display for MapperResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.code)
    }
}

/// Maps program counters of one contract back to its source.
///
/// Holds borrowed, already-loaded compiler output. Mapping never mutates it,
/// so one `Mapper` can serve many lookups, from several threads if needed.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'a> {
    bytecode: &'a Bytecode,
    source_map: &'a SourceMap,
    ast: &'a Value,
    sources: Option<&'a SourceSet>,
    source_text: Option<&'a str>,
    literal: bool,
}

impl<'a> Mapper<'a> {
    /// `ast` is one source-unit AST or an array of them.
    pub fn new(bytecode: &'a Bytecode, source_map: &'a SourceMap, ast: &'a Value) -> Self {
        Self {
            bytecode,
            source_map,
            ast,
            sources: None,
            source_text: None,
            literal: true,
        }
    }

    pub fn with_sources(mut self, sources: &'a SourceSet) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Literal text used for any file the source set has no content for.
    pub fn with_source_text(mut self, text: &'a str) -> Self {
        self.source_text = Some(text);
        self
    }

    /// Disable literal extraction and always reconstruct from the AST.
    pub fn with_literal(mut self, enabled: bool) -> Self {
        self.literal = enabled;
        self
    }

    pub fn map_hex_address(&self, address: &str) -> SolmapResult<MapperResult> {
        let mut expl = Explanation::new(false);
        self.map_hex_address_explained(address, &mut expl)
    }

    /// Like [`Mapper::map_hex_address`], recording each step in `expl`.
    pub fn map_hex_address_explained(
        &self,
        address: &str,
        expl: &mut Explanation,
    ) -> SolmapResult<MapperResult> {
        expl.transition(MappingState::Start, &format!("address {}", address));

        let result = parse_hex_usize(address)
            .ok_or_else(|| MapperError::InvalidAddress {
                address: address.to_string(),
            })
            .and_then(|pc| self.map_pc_inner(pc, expl));

        if let Err(err) = &result {
            expl.transition(MappingState::Failed, &format!("{} [{}]", err, err.kind()));
        }
        result
    }

    pub fn map_pc(&self, pc: usize) -> SolmapResult<MapperResult> {
        let mut expl = Explanation::new(false);
        self.map_pc_inner(pc, &mut expl)
    }

    fn map_pc_inner(&self, pc: usize, expl: &mut Explanation) -> SolmapResult<MapperResult> {
        let instruction_index = self.bytecode.instruction_index(pc)?;
        if pc >= self.bytecode.len() {
            // inside the implied padding of a truncated trailing PUSH
            return Err(MapperError::AddressNotFound {
                pc,
                len: self.bytecode.len(),
            });
        }
        let opcode = self.bytecode.opcode_at(pc).map(opcode_to_string).unwrap_or("?");
        expl.transition(
            MappingState::BytecodeResolved,
            &format!("pc {:#x} ({}) is instruction {}", pc, opcode, instruction_index),
        );

        let entry = self.source_map.resolve(instruction_index)?;
        expl.transition(
            MappingState::SourceMapResolved,
            &format!("source map entry {}", entry),
        );

        let range = entry
            .source_range(instruction_index)?
            .ok_or(MapperError::NoAssociatedSource {
                index: instruction_index,
            })?;

        let node = find_smallest_containing(self.ast, &range)?;
        expl.transition(
            MappingState::AstNodeResolved,
            &format!(
                "{} at {}",
                node.tag().unwrap_or("<untagged>"),
                node.src().and_then(Result::ok).unwrap_or(range)
            ),
        );

        let file = self.file_name(range.file_id);
        let literal = if self.literal {
            self.literal_snippet(range.file_id, range.offset, range.length)
        } else {
            None
        };

        let (code, line, reconstructed) = match literal {
            Some((code, line)) => {
                expl.transition(
                    MappingState::LiteralExtracted,
                    &format!("line {}: {:?}", line, truncate(&code, 60)),
                );
                (code, line, false)
            }
            None => {
                let code = reconstruct_relevant(node);
                if code.is_empty() {
                    return Err(MapperError::MissingLiteralSource {
                        file_id: range.file_id,
                    });
                }
                expl.transition(
                    MappingState::Reconstructed,
                    &format!("{:?}", truncate(&code, 60)),
                );
                (code, 0, true)
            }
        };

        expl.transition(MappingState::Done, &format!("{}:{}", file, line));

        Ok(MapperResult {
            file,
            code,
            line,
            pc,
            instruction_index,
            entry,
            reconstructed,
        })
    }

    fn literal_snippet(&self, file_id: i64, offset: usize, length: usize) -> Option<(String, usize)> {
        let from_sources = self
            .sources
            .and_then(|sources| sources.get(file_id))
            .filter(|file| file.content.is_some());

        let found = match (from_sources, self.source_text) {
            (Some(file), _) => file.snippet(offset, length),
            (None, Some(text)) => snippet(text, offset, length),
            (None, None) => {
                debug!("no literal source for file {}", file_id);
                return None;
            }
        };

        if found.is_none() {
            warn!(
                "source range {}:{} lies outside the text of file {}, reconstructing instead",
                offset, length, file_id
            );
        }
        found
    }

    /// Path of `file_id`: the source set first, then the AST's `absolutePath`.
    fn file_name(&self, file_id: i64) -> String {
        self.sources
            .and_then(|sources| sources.path(file_id))
            .filter(|path| !path.is_empty())
            .or_else(|| source_unit_path(self.ast, file_id))
            .map(str::to_string)
            .unwrap_or_else(|| file_id.to_string())
    }
}

/// Reconstruct the node's `expression` child when it has one, else the node.
fn reconstruct_relevant(node: Node<'_>) -> String {
    match node.child("expression") {
        Some(expression) => unparse(expression),
        None => unparse(node),
    }
}

/// One-shot mapping of `address` in a single-file contract.
///
/// `source_text`, when given, is the literal text of the file the address
/// resolves to; otherwise the code is reconstructed from `ast`.
pub fn map_address(
    bytecode: &str,
    source_map: &str,
    ast: &Value,
    source_text: Option<&str>,
    address: &str,
) -> SolmapResult<MapperResult> {
    let bytecode = Bytecode::parse(bytecode)?;
    let source_map = SourceMap::parse(source_map);

    let mapper = Mapper::new(&bytecode, &source_map, ast);
    match source_text {
        Some(text) => mapper.with_source_text(text).map_hex_address(address),
        None => mapper.map_hex_address(address),
    }
}
