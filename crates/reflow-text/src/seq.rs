#![forbid(unsafe_code)]

//! Per-line provenance records produced by a wrap.
//!
//! Every output line gets one [`WrappedString`]. Offsets are positions in the
//! *source* text, so a record can be used to slice the original back out:
//!
//! ```
//! use reflow_text::wrap;
//!
//! let source = "hello world";
//! let (_, seq) = wrap(source, 5, 4, true).unwrap();
//! assert_eq!(&source[seq.lines[0].orig_byte_offset.as_range()], "hello");
//! // The space dropped at the start of the second line still belongs to it.
//! assert_eq!(&source[seq.lines[1].orig_byte_offset.as_range()], " world");
//! ```

use std::ops::Range;

/// Half-open `[start, end)` interval into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineOffset {
    pub start: usize,
    pub end: usize,
}

impl LineOffset {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Metadata for one wrapped output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedString {
    /// Output line number, 1-based.
    pub cur_line_num: usize,
    /// Line of the source (delimited by `\n`) this segment came from, 1-based.
    pub orig_line_num: usize,
    /// Source byte range covered by this segment.
    pub orig_byte_offset: LineOffset,
    /// Source code point range covered by this segment.
    pub orig_rune_offset: LineOffset,
    /// Position of this segment within its source line, 1-based.
    pub segment_in_orig: usize,
    /// This segment ends its source line (hard break or end of input).
    pub last_segment_in_orig: bool,
    /// The realized width is larger than the limit.
    pub not_within_limit: bool,
    /// The line ended at a `\n` in the source.
    pub is_hard_break: bool,
    /// Display width of the line after trimming.
    pub width: usize,
    /// A word was cut at the end of this line and continues on the next.
    pub ends_with_split_word: bool,
}

/// Ordered records of a wrap, plus the settings that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrappedStringSeq {
    /// One record per output line, in output order.
    pub lines: Vec<WrappedString>,
    pub word_split_allowed: bool,
    pub tab_size: usize,
    pub limit: usize,
    pub trim_whitespace: bool,
}

impl WrappedStringSeq {
    pub(crate) fn new(limit: usize, tab_size: usize, trim: bool, split: bool) -> Self {
        Self {
            lines: Vec::new(),
            word_split_allowed: split,
            tab_size,
            limit,
            trim_whitespace: trim,
        }
    }

    pub(crate) fn push(&mut self, line: WrappedString) {
        self.lines.push(line);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut WrappedString> {
        self.lines.last_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&WrappedString> {
        self.lines.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WrappedString> {
        self.lines.iter()
    }

    /// All segments that came from source line `orig_line_num` (1-based).
    pub fn segments_of(&self, orig_line_num: usize) -> impl Iterator<Item = &WrappedString> {
        self.lines
            .iter()
            .filter(move |line| line.orig_line_num == orig_line_num)
    }

    /// Number of source lines the records cover.
    #[must_use]
    pub fn orig_line_count(&self) -> usize {
        self.last().map_or(0, |line| line.orig_line_num)
    }
}

impl<'a> IntoIterator for &'a WrappedStringSeq {
    type Item = &'a WrappedString;
    type IntoIter = std::slice::Iter<'a, WrappedString>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
