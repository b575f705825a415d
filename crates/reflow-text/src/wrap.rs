#![forbid(unsafe_code)]

//! Single-pass wrapping with per-line provenance.
//!
//! The wrapper walks the token stream once. Non-white-space tokens build up a
//! word; white space and the end of input flush that word onto the current
//! line, breaking the line (or splitting the word) whenever the visual width
//! would exceed the limit. Every finished line appends a [`WrappedString`]
//! record describing where it came from in the source.
//!
//! # Example
//! ```
//! use reflow_text::{wrap, wrap_split};
//!
//! let (text, seq) = wrap("The quick brown fox jumps over the lazy dog", 10, 4, true).unwrap();
//! assert_eq!(text, "The quick\nbrown fox\njumps over\nthe lazy\ndog");
//! assert_eq!(seq.len(), 5);
//!
//! let (text, seq) = wrap_split("Supercalifragilisticexpialidocious", 10, 4, true).unwrap();
//! assert_eq!(text, "Supercali-\nfragilist-\nicexpiali-\ndocious");
//! assert!(seq.lines[0].ends_with_split_word);
//! ```

use crate::scan::{Scanner, Spanned, Whitespace};
use crate::seq::{WrappedString, WrappedStringSeq};
use crate::state::{
    Action, LineBuffer, Position, State, Step, TokenClass, WordBuffer, transition,
};

/// Smallest accepted limit: one column of content plus a hyphen.
pub const MIN_LIMIT: usize = 2;

/// Default tab size in columns.
pub const DEFAULT_TAB_SIZE: usize = 4;

/// Errors returned by the wrapping entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapError {
    /// The limit is below [`MIN_LIMIT`].
    InvalidLimit { limit: usize },
}

impl std::fmt::Display for WrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLimit { limit } => write!(
                f,
                "invalid limit {}: must be at least {}",
                limit, MIN_LIMIT
            ),
        }
    }
}

impl std::error::Error for WrapError {}

/// Options for a wrap call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapOptions {
    /// Maximum line width in columns.
    pub limit: usize,
    /// Tab stop interval in columns.
    pub tab_size: usize,
    /// Trim trailing white space and drop white space at the start of lines.
    pub trim_whitespace: bool,
    /// Split words longer than the remaining space, hyphenating when both
    /// sides of the cut are letters, digits or marks.
    pub split_words: bool,
}

impl WrapOptions {
    /// Create new wrap options with the given limit.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            tab_size: DEFAULT_TAB_SIZE,
            trim_whitespace: true,
            split_words: false,
        }
    }

    /// Set the tab size. Zero behaves like one.
    #[must_use]
    pub fn tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size;
        self
    }

    /// Set whether to trim white space around breaks.
    #[must_use]
    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }

    /// Set whether long words may be split.
    #[must_use]
    pub fn split_words(mut self, split: bool) -> Self {
        self.split_words = split;
        self
    }
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self::new(80)
    }
}

/// Wrap `text` to `limit` columns without splitting words.
///
/// Words wider than the limit get a line of their own and are flagged
/// `not_within_limit`.
pub fn wrap(
    text: &str,
    limit: usize,
    tab_size: usize,
    trim_whitespace: bool,
) -> Result<(String, WrappedStringSeq), WrapError> {
    wrap_with_options(
        text,
        &WrapOptions::new(limit)
            .tab_size(tab_size)
            .trim_whitespace(trim_whitespace),
    )
}

/// Wrap `text` to `limit` columns, splitting words that do not fit.
///
/// Words containing a non-breaking space are never split.
pub fn wrap_split(
    text: &str,
    limit: usize,
    tab_size: usize,
    trim_whitespace: bool,
) -> Result<(String, WrappedStringSeq), WrapError> {
    wrap_with_options(
        text,
        &WrapOptions::new(limit)
            .tab_size(tab_size)
            .trim_whitespace(trim_whitespace)
            .split_words(true),
    )
}

/// Wrap with full options.
///
/// Returns the wrapped text and one record per output line. The text has no
/// trailing newline unless the source ends with one.
pub fn wrap_with_options(
    text: &str,
    options: &WrapOptions,
) -> Result<(String, WrappedStringSeq), WrapError> {
    if options.limit < MIN_LIMIT {
        #[cfg(feature = "tracing")]
        tracing::debug!(limit = options.limit, "rejecting wrap limit");
        return Err(WrapError::InvalidLimit {
            limit: options.limit,
        });
    }

    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "wrap",
        limit = options.limit,
        tab_size = options.tab_size,
        trim = options.trim_whitespace,
        split = options.split_words,
        bytes = text.len()
    )
    .entered();

    let mut wrapper = Wrapper::new(text, options);
    for spanned in Scanner::new(text) {
        wrapper.feed(&spanned);
    }
    Ok(wrapper.finish())
}

/// Owns all state of one wrap call.
struct Wrapper<'a> {
    source: &'a str,
    options: &'a WrapOptions,
    pos: Position,
    word: WordBuffer,
    line: LineBuffer,
    out: String,
    seq: WrappedStringSeq,
}

impl<'a> Wrapper<'a> {
    fn new(source: &'a str, options: &'a WrapOptions) -> Self {
        Self {
            source,
            options,
            pos: Position::new(),
            word: WordBuffer::default(),
            line: LineBuffer::default(),
            out: String::with_capacity(source.len() + source.len() / 8),
            seq: WrappedStringSeq::new(
                options.limit,
                options.tab_size,
                options.trim_whitespace,
                options.split_words,
            ),
        }
    }

    fn state(&self, class: TokenClass) -> State {
        if !self.word.is_empty() {
            return State::InWord;
        }
        let width = self.pos.line_width;
        let limit = self.options.limit;
        let full = match class {
            TokenClass::Word | TokenClass::Blank(Whitespace::Newline) => false,
            TokenClass::Blank(Whitespace::Space) => width > 0 && width + 1 > limit,
            TokenClass::Blank(Whitespace::Tab) => {
                width > 0 && width + self.pos.tab_stop(self.options.tab_size, limit) > limit
            }
            TokenClass::Blank(Whitespace::Other(_)) => width > limit,
        };
        if full { State::LineFull } else { State::Scanning }
    }

    fn feed(&mut self, spanned: &Spanned<'a>) {
        let class = TokenClass::of(&spanned.token);
        loop {
            match transition(self.state(class), class) {
                Step::Then(action) => self.apply(action, spanned),
                Step::Done(action) => {
                    self.apply(action, spanned);
                    return;
                }
            }
        }
    }

    fn apply(&mut self, action: Action, spanned: &Spanned<'a>) {
        let source = self.source;
        match action {
            Action::PushWord => {
                self.word.push(&spanned.token, spanned.range.clone());
                self.pos.word_width += spanned.token.width();
            }
            Action::FlushWord => self.flush_word(),
            Action::SoftBreak => self.finish_line(false, false),
            Action::IsolateTab => {
                self.finish_line(false, false);
                let stop = self.pos.tab_stop(self.options.tab_size, self.options.limit);
                self.line.push_spaces(stop);
                self.pos.line_width += stop;
                self.pos.attribute(&source[spanned.range.clone()]);
                self.finish_line(false, false);
            }
            Action::HardBreak => {
                self.pos.attribute(&source[spanned.range.clone()]);
                self.finish_line(true, false);
                self.pos.orig_line += 1;
                self.pos.segment = 0;
            }
            Action::Place(ws) => self.place(ws, &source[spanned.range.clone()]),
        }
    }

    /// Write a space or tab to the line, or drop it.
    fn place(&mut self, ws: Whitespace, source: &str) {
        let empty = self.pos.line_width == 0;
        let trim = self.options.trim_whitespace;
        match ws {
            Whitespace::Space if empty && trim => {}
            Whitespace::Space => {
                self.line.push(' ');
                self.pos.line_width += 1;
            }
            Whitespace::Tab => {
                if !(empty && trim) {
                    let stop = self.pos.tab_stop(self.options.tab_size, self.options.limit);
                    self.line.push_spaces(stop);
                    self.pos.line_width += stop;
                }
            }
            Whitespace::Newline | Whitespace::Other(_) => {}
        }
        self.pos.attribute(source);
    }

    /// Move the pending word onto the line.
    ///
    /// Runs as a loop: each split writes a prefix, finishes the line, and
    /// re-evaluates what is left of the word on the fresh line.
    fn flush_word(&mut self) {
        let limit = self.options.limit;
        loop {
            let word_width = self.pos.word_width;
            if self.pos.line_width + word_width <= limit {
                self.commit_word();
                return;
            }
            if word_width == 0 {
                self.finish_line(false, false);
                self.commit_word();
                return;
            }
            if !self.options.split_words || self.word.has_nbsp() {
                if self.pos.line_width > 0 {
                    self.finish_line(false, false);
                }
                self.commit_word();
                return;
            }

            let cut = self.word.cut(self.source, self.pos.line_width, limit);
            if cut.pieces == 0 {
                // Nothing fits next to what is already on the line.
                self.finish_line(false, false);
                continue;
            }

            let prefix = &self.source[self.word.range().start..cut.end];
            self.line.push_str(prefix);
            self.pos.attribute(prefix);
            self.pos.line_width += cut.width;
            if cut.hyphen {
                self.line.push('-');
                self.pos.line_width += 1;
            }
            self.finish_line(false, cut.hyphen);

            self.word.drain_front(cut.pieces);
            self.pos.word_width = self.word.width();
        }
    }

    fn commit_word(&mut self) {
        let text = &self.source[self.word.range()];
        self.line.push_str(text);
        self.pos.attribute(text);
        self.pos.line_width += self.pos.word_width;
        self.pos.word_width = 0;
        self.word.clear();
    }

    /// Finalize the pending line and append its record.
    fn finish_line(&mut self, hard: bool, split: bool) {
        if self.options.trim_whitespace {
            let removed = self.line.trim_trailing_spaces();
            self.pos.line_width -= removed;
        }

        self.out.push_str(self.line.as_str());
        self.out.push('\n');
        self.pos.segment += 1;

        let (bytes, runes) = self.pos.close_segment();
        let width = self.pos.line_width;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            line = self.pos.cur_line,
            orig_line = self.pos.orig_line,
            width,
            hard,
            split,
            "line finished"
        );

        self.seq.push(WrappedString {
            cur_line_num: self.pos.cur_line,
            orig_line_num: self.pos.orig_line,
            orig_byte_offset: bytes,
            orig_rune_offset: runes,
            segment_in_orig: self.pos.segment,
            last_segment_in_orig: hard,
            not_within_limit: width > self.options.limit,
            is_hard_break: hard,
            width,
            ends_with_split_word: split,
        });

        self.pos.cur_line += 1;
        self.pos.line_width = 0;
        self.line.clear();
    }

    /// Drain the buffers and fix up the shape of the output.
    fn finish(mut self) -> (String, WrappedStringSeq) {
        if !self.word.is_empty() {
            self.flush_word();
        }

        let ends_open = self.seq.last().is_none_or(|line| line.is_hard_break);
        if !self.line.is_empty() || ends_open {
            self.finish_line(false, false);
        } else if self.pos.has_unclaimed_source() {
            // White space dropped after the final break still belongs to the
            // final line.
            let (bytes, runes) = self.pos.close_segment();
            if let Some(last) = self.seq.last_mut() {
                last.orig_byte_offset.end = bytes.end;
                last.orig_rune_offset.end = runes.end;
            }
        }

        // The final record is always a soft break here.
        self.out.pop();
        if let Some(last) = self.seq.last_mut() {
            last.last_segment_in_orig = true;
        }
        (self.out, self.seq)
    }
}



#[cfg(test)]
mod proptests {
    use super::*;
    use crate::width::display_width;
    use proptest::prelude::*;

    fn check_invariants(text: &str, out: &str, seq: &WrappedStringSeq) -> Result<(), TestCaseError> {
        prop_assert_eq!(out.split('\n').count(), seq.len());
        prop_assert_eq!(seq.lines[0].orig_byte_offset.start, 0);
        prop_assert_eq!(seq.lines[0].orig_rune_offset.start, 0);
        for pair in seq.lines.windows(2) {
            prop_assert_eq!(pair[0].orig_byte_offset.end, pair[1].orig_byte_offset.start);
            prop_assert_eq!(pair[0].orig_rune_offset.end, pair[1].orig_rune_offset.start);
            prop_assert_eq!(pair[0].cur_line_num + 1, pair[1].cur_line_num);
            if pair[0].is_hard_break {
                prop_assert_eq!(pair[1].segment_in_orig, 1);
            }
        }
        let last = &seq.lines[seq.len() - 1];
        prop_assert_eq!(last.orig_byte_offset.end, text.len());
        prop_assert_eq!(last.orig_rune_offset.end, text.chars().count());
        for record in &seq.lines {
            prop_assert!(record.orig_byte_offset.start <= record.orig_byte_offset.end);
            if !record.not_within_limit {
                prop_assert!(record.width <= seq.limit);
            }
            prop_assert_eq!(
                record.last_segment_in_orig,
                record.is_hard_break || record.cur_line_num == seq.len()
            );
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn invariants_hold_for_words(s in "[a-z \n]{0,120}", limit in 2usize..30, split in any::<bool>()) {
            let opts = WrapOptions::new(limit).split_words(split);
            let (out, seq) = wrap_with_options(&s, &opts).unwrap();
            check_invariants(&s, &out, &seq)?;
            for (line, record) in out.split('\n').zip(seq.iter()) {
                prop_assert_eq!(line.len(), record.width);
            }
        }

        #[test]
        fn invariants_hold_for_mixed_text(
            s in "[a-z\u{4E2D}\u{00E9}\u{00A0}\t .\n]{0,80}",
            limit in 2usize..20,
            tab_size in 1usize..9,
            trim in any::<bool>(),
            split in any::<bool>(),
        ) {
            let opts = WrapOptions::new(limit)
                .tab_size(tab_size)
                .trim_whitespace(trim)
                .split_words(split);
            let (out, seq) = wrap_with_options(&s, &opts).unwrap();
            check_invariants(&s, &out, &seq)?;
            for (line, record) in out.split('\n').zip(seq.iter()) {
                prop_assert_eq!(display_width(line), record.width);
            }
        }

        #[test]
        fn split_mode_respects_limit(s in "[a-zA-Z ]{1,100}", limit in 2usize..30) {
            let (out, seq) = wrap_split(&s, limit, 4, true).unwrap();
            for line in out.split('\n') {
                prop_assert!(line.len() <= limit, "line {:?} exceeds {}", line, limit);
            }
            prop_assert!(seq.iter().all(|l| !l.not_within_limit));
        }

        #[test]
        fn rewrapping_output_is_stable(s in "[a-z \n]{0,100}", limit in 2usize..25, split in any::<bool>()) {
            let opts = WrapOptions::new(limit).split_words(split);
            let (once, _) = wrap_with_options(&s, &opts).unwrap();
            let (twice, seq) = wrap_with_options(&once, &opts).unwrap();
            prop_assert_eq!(&once, &twice);
            let (last, rest) = seq.lines.split_last().unwrap();
            prop_assert!(rest.iter().all(|l| l.is_hard_break));
            prop_assert!(!last.is_hard_break);
        }

        #[test]
        fn small_limits_always_fail(s in ".{0,20}", limit in 0usize..2, split in any::<bool>()) {
            let opts = WrapOptions::new(limit).split_words(split);
            prop_assert_eq!(wrap_with_options(&s, &opts), Err(WrapError::InvalidLimit { limit }));
        }
    }
}
