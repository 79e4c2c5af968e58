// SPDX-License-Identifier: AGPL-3.0

//! Source files by compiler file id, with line lookup.

use once_cell::sync::OnceCell;
use std::collections::BTreeMap;

/// Start offsets of every line in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_offsets: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_offsets = vec![0];
        line_offsets.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(offset, _)| offset + 1),
        );
        Self { line_offsets }
    }

    /// 1-based line of byte `offset`: one plus the newlines before it.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_offsets.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }
}

/// One source file known to the compiler.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    pub path: String,
    pub content: Option<String>,
    lines: OnceCell<LineIndex>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: Option<String>) -> Self {
        Self {
            path: path.into(),
            content,
            lines: OnceCell::new(),
        }
    }

    /// Line index of the content, built on first use.
    pub fn lines(&self) -> Option<&LineIndex> {
        let content = self.content.as_deref()?;
        Some(self.lines.get_or_init(|| LineIndex::new(content)))
    }

    /// Byte slice `[offset, offset + length)` of the content with its line.
    ///
    /// `None` if there is no content or the range runs past its end. A range
    /// that splits a UTF-8 sequence is decoded lossily.
    pub fn snippet(&self, offset: usize, length: usize) -> Option<(String, usize)> {
        let content = self.content.as_deref()?;
        let bytes = content.as_bytes().get(offset..offset.checked_add(length)?)?;
        let line = self.lines()?.line_of(offset);
        Some((String::from_utf8_lossy(bytes).into_owned(), line))
    }
}

/// Byte slice `[offset, offset + length)` of `text` and the 1-based line it starts on.
pub fn snippet(text: &str, offset: usize, length: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes().get(offset..offset.checked_add(length)?)?;
    let line = 1 + text.as_bytes()[..offset]
        .iter()
        .filter(|byte| **byte == b'\n')
        .count();
    Some((String::from_utf8_lossy(bytes).into_owned(), line))
}

/// Source files keyed by compiler file id.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    files: BTreeMap<i64, SourceFile>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_id: i64, file: SourceFile) -> Option<SourceFile> {
        self.files.insert(file_id, file)
    }

    pub fn with_file(mut self, file_id: i64, file: SourceFile) -> Self {
        self.insert(file_id, file);
        self
    }

    pub fn get(&self, file_id: i64) -> Option<&SourceFile> {
        self.files.get(&file_id)
    }

    pub fn path(&self, file_id: i64) -> Option<&str> {
        self.get(file_id).map(|file| file.path.as_str())
    }

    pub fn content(&self, file_id: i64) -> Option<&str> {
        self.get(file_id).and_then(|file| file.content.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &SourceFile)> {
        self.files.iter().map(|(id, file)| (*id, file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
