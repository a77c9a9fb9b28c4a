//! Source location tracking for diagnostics.
//!
//! # Design
//!
//! - `Span` - a byte range inside one source file
//! - `SourceMap` - owns all source files for a bind and resolves spans to
//!   line/column positions and snippets
//! - `SourceFile` - a single file with a precomputed line index
//!
//! Spans are deliberately small and `Copy`: every syntax node, expression,
//! and diagnostic carries one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A byte range inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index into [`SourceMap`] files.
    pub file_id: u32,
    /// Byte offset of the first byte covered.
    pub start: u32,
    /// Byte offset one past the last byte covered.
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(file_id: u32, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    /// A zero-length span at the start of a file.
    pub fn zero(file_id: u32) -> Self {
        Self::new(file_id, 0, 0)
    }

    /// Length of the covered range in bytes.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The smallest span covering both `self` and `other`.
    ///
    /// Used for diagnostics that point at several adjacent syntax elements,
    /// e.g. the label list of a block.
    ///
    /// # Panics
    /// Panics if the spans belong to different files.
    pub fn merge(&self, other: &Span) -> Span {
        assert_eq!(
            self.file_id, other.file_id,
            "cannot merge spans from different files"
        );
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// All source files participating in one bind.
///
/// The binder does not require source text to operate; the map exists so
/// diagnostic renderers can show line/column positions and snippets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// A single source file with a line index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path the file was read from.
    pub path: PathBuf,
    /// Full source text.
    pub source: String,
    /// Byte offset of each line start, with an EOF sentinel at the end.
    line_starts: Vec<u32>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and return its id.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u32 {
        let file_id = self.files.len() as u32;
        self.files.push(SourceFile::new(path, source));
        file_id
    }

    /// The file a span points into, if the id is known to this map.
    pub fn file(&self, span: &Span) -> Option<&SourceFile> {
        self.files.get(span.file_id as usize)
    }

    /// The path of the file a span points into.
    pub fn file_path(&self, span: &Span) -> Option<&Path> {
        self.file(span).map(|f| f.path.as_path())
    }

    /// The source text covered by a span.
    pub fn snippet(&self, span: &Span) -> Option<&str> {
        let file = self.file(span)?;
        file.source.get(span.start as usize..span.end as usize)
    }

    /// 1-based (line, column) of a span's start.
    pub fn line_col(&self, span: &Span) -> Option<(u32, u32)> {
        self.file(span).map(|f| f.line_col(span.start))
    }

    /// Number of files in the map.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

impl SourceFile {
    /// Create a file, computing its line index.
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// 1-based (line, column) of a byte offset.
    ///
    /// Offsets past EOF clamp to the final line.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx.min(self.line_count().saturating_sub(1)),
            Err(idx) => idx.max(1) - 1,
        };
        let line = (line_idx + 1) as u32;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Text of a 1-based line, without requiring a trailing newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[(line - 1) as usize] as usize;
        let end = self.line_starts[line as usize] as usize;
        Some(self.source[start..end].trim_end_matches('\n'))
    }

    /// Number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }
}

/// Byte offsets of line starts, terminated by an EOF sentinel.
fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];
    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }
    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }
    line_starts
}
