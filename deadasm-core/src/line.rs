//! Line source - file slurping and logical-line iteration.
//!
//! Assembly input is consumed as a sequence of *logical* lines: leading
//! whitespace stripped, blank lines and whole-line `;` comments consumed
//! silently, content capped at [`MAX_LINE_LEN`] bytes. All line numbers in
//! the label model count logical lines, and the rewriter emits logical
//! lines, so parser and rewriter must iterate input identically. This
//! module is the single implementation both go through.

use std::fs;
use std::path::Path;

use crate::error::{DeadasmResult, IoResultExt};

/// Maximum significant bytes per logical line, fixed by the assembler's
/// line-length limit. Longer lines are truncated, never split.
pub const MAX_LINE_LEN: usize = 128;

/// Read a whole assembly file into memory.
///
/// The rewriter depends on this happening before any output file is
/// opened, so a write failure can never truncate a source that was
/// still being read.
pub fn read_source(path: impl AsRef<Path>) -> DeadasmResult<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_path(path)
}

/// Cursor over the logical lines of a source buffer.
///
/// Yields `(line_no, text)` pairs with `line_no` starting at 1. The
/// cursor is `Clone`, so a caller can fork it to scan ahead (the parser
/// does this to find a label's terminating line) without disturbing the
/// main iteration.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    src: &'a [u8],
    full: &'a str,
    pos: usize,
    line_no: usize,
}

impl<'a> LineCursor<'a> {
    /// Create a cursor positioned before the first logical line.
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            full: src,
            pos: 0,
            line_no: 0,
        }
    }

    /// Number of the most recently yielded line (0 before the first).
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn skip_comment(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.skip_whitespace();

            if self.pos >= self.src.len() {
                return None;
            }

            if self.src[self.pos] == b';' {
                self.skip_comment();
                continue;
            }

            let start = self.pos;
            while self.pos < self.src.len()
                && self.src[self.pos] != b'\n'
                && self.src[self.pos] != b'\r'
            {
                self.pos += 1;
            }

            let mut end = self.pos;
            if end - start > MAX_LINE_LEN {
                end = start + MAX_LINE_LEN;
                // Do not cut a multi-byte sequence in half.
                while end > start && !self.full.is_char_boundary(end) {
                    end -= 1;
                }
            }

            self.line_no += 1;
            return Some((self.line_no, &self.full[start..end]));
        }
    }
}
