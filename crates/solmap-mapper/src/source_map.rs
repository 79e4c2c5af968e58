// SPDX-License-Identifier: AGPL-3.0

//! Compressed solc source maps
//!
//! A source map is a `;`-separated list with one entry per instruction. Each
//! entry is `offset:length:file_id:jump:modifiers`, where any field may be
//! left empty (or dropped from the end) to inherit the value of the closest
//! earlier entry that defined it.

use serde::Serialize;
use solmap_exceptions::{MapperError, SolmapResult};
use std::fmt;
use tracing::{debug, info};

use crate::ast::SourceRange;

/// How an instruction relates to function calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JumpType {
    /// Jump into a function (`i`)
    #[serde(rename = "i")]
    Into,
    /// Return out of a function (`o`)
    #[serde(rename = "o")]
    Out,
    /// Ordinary jump or no jump (`-`)
    #[serde(rename = "-")]
    Regular,
}

impl JumpType {
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "i" => Some(JumpType::Into),
            "o" => Some(JumpType::Out),
            "-" => Some(JumpType::Regular),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JumpType::Into => "i",
            JumpType::Out => "o",
            JumpType::Regular => "-",
        }
    }
}

impl fmt::Display for JumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved source map entry.
///
/// `offset`, `length` and `file_id` are always present. solc writes `-1`
/// for code without a source file, so they stay signed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceMapEntry {
    pub offset: i64,
    pub length: i64,
    pub file_id: i64,
    pub jump: Option<JumpType>,
    pub modifiers: Option<usize>,
}

impl SourceMapEntry {
    /// True for compiler-generated code without an associated source file.
    pub fn is_generated(&self) -> bool {
        self.file_id < 0
    }

    /// The source range of instruction `index`, or `None` for generated code.
    ///
    /// A real file with a negative offset or length is an invalid entry.
    pub fn source_range(&self, index: usize) -> SolmapResult<Option<SourceRange>> {
        if self.is_generated() {
            return Ok(None);
        }
        let field = |field: &'static str, value: i64| {
            usize::try_from(value).map_err(|_| invalid(index, field, &value.to_string()))
        };
        Ok(Some(SourceRange {
            offset: field("offset", self.offset)?,
            length: field("length", self.length)?,
            file_id: self.file_id,
        }))
    }
}

impl fmt::Display for SourceMapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.length, self.file_id)?;
        match self.jump {
            Some(jump) => write!(f, ":{}", jump)?,
            None => f.write_str(":?")?,
        }
        match self.modifiers {
            Some(depth) => write!(f, ":{}", depth),
            None => f.write_str(":?"),
        }
    }
}

/// Field accumulator for the backward scan.
#[derive(Debug, Default)]
struct PartialEntry {
    offset: Option<i64>,
    length: Option<i64>,
    file_id: Option<i64>,
    jump: Option<JumpType>,
    modifiers: Option<usize>,
}

impl PartialEntry {
    fn is_complete(&self) -> bool {
        self.offset.is_some()
            && self.length.is_some()
            && self.file_id.is_some()
            && self.jump.is_some()
            && self.modifiers.is_some()
    }

    /// Fill every still-missing field that `entry` defines.
    fn absorb(&mut self, index: usize, entry: &str) -> SolmapResult<()> {
        let mut fields = entry.split(':');

        let offset = fields.next();
        let length = fields.next();
        let file_id = fields.next();
        let jump = fields.next();
        let modifiers = fields.next();

        fill(&mut self.offset, offset, |v| parse_signed(index, "offset", v))?;
        fill(&mut self.length, length, |v| parse_signed(index, "length", v))?;
        fill(&mut self.file_id, file_id, |v| parse_signed(index, "file_id", v))?;
        fill(&mut self.jump, jump, |v| {
            JumpType::parse(v).ok_or_else(|| invalid(index, "jump", v))
        })?;
        fill(&mut self.modifiers, modifiers, |v| {
            v.parse::<usize>().map_err(|_| invalid(index, "modifiers", v))
        })?;

        Ok(())
    }

    fn finish(self, index: usize) -> SolmapResult<SourceMapEntry> {
        let missing = |field| MapperError::IncompleteSourceMapEntry { index, field };

        let entry = SourceMapEntry {
            offset: self.offset.ok_or_else(|| missing("offset"))?,
            length: self.length.ok_or_else(|| missing("length"))?,
            file_id: self.file_id.ok_or_else(|| missing("file_id"))?,
            jump: self.jump,
            modifiers: self.modifiers,
        };

        if entry.jump.is_none() {
            info!("Could not find jump for instruction index {}", index);
        }
        if entry.modifiers.is_none() {
            info!("Could not find modifiers for instruction index {}", index);
        }

        Ok(entry)
    }
}

fn fill<T>(
    slot: &mut Option<T>,
    field: Option<&str>,
    parse: impl FnOnce(&str) -> SolmapResult<T>,
) -> SolmapResult<()> {
    if slot.is_some() {
        return Ok(());
    }
    match field {
        Some(value) if !value.is_empty() => {
            *slot = Some(parse(value)?);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn parse_signed(index: usize, field: &'static str, value: &str) -> SolmapResult<i64> {
    value.parse::<i64>().map_err(|_| invalid(index, field, value))
}

fn invalid(index: usize, field: &'static str, value: &str) -> MapperError {
    MapperError::InvalidSourceMapEntry {
        index,
        field,
        value: value.to_string(),
    }
}

/// A source map split into its per-instruction entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceMap {
    entries: Vec<String>,
}

impl SourceMap {
    pub fn parse(source_map: &str) -> Self {
        Self {
            entries: source_map.trim().split(';').map(str::to_string).collect(),
        }
    }

    /// Number of entries, i.e. instructions covered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw, still compressed entry at `index`.
    pub fn raw_entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Resolve the entry for `instruction_index`.
    ///
    /// Scans backward to entry 0, taking each field from the closest entry
    /// that defines it. Fields inherit independently of each other.
    pub fn resolve(&self, instruction_index: usize) -> SolmapResult<SourceMapEntry> {
        if instruction_index >= self.entries.len() {
            return Err(MapperError::SourceMapIndexOutOfRange {
                index: instruction_index,
                entries: self.entries.len(),
            });
        }

        let mut partial = PartialEntry::default();
        for index in (0..=instruction_index).rev() {
            let entry = &self.entries[index];
            if entry.is_empty() {
                continue;
            }

            partial.absorb(index, entry)?;
            if partial.is_complete() {
                debug!(
                    "source map entry {} resolved at entry {}",
                    instruction_index, index
                );
                break;
            }
        }

        partial.finish(instruction_index)
    }
}
