#![forbid(unsafe_code)]

//! Mutable state of a single wrap call.
//!
//! Everything here is created fresh by [`crate::wrap_with_options`] and
//! dropped when it returns. The pieces are:
//!
//! - [`Position`]: running counters and source offsets,
//! - [`WordBuffer`]: the pending word, kept as slices of the source,
//! - [`LineBuffer`]: the pending output line,
//! - [`transition`]: the table deciding what a token does in a given [`State`].

use std::ops::Range;

use smallvec::SmallVec;

use crate::scan::{Token, Whitespace, csi_len};
use crate::seq::LineOffset;
use crate::width::is_wordy;

// =============================================================================
// Transition table
// =============================================================================

/// Where the scan currently stands with respect to the incoming token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// No pending word and the current line has room for the token.
    Scanning,
    /// A word is being accumulated.
    InWord,
    /// No pending word, but the line already holds visible content and the
    /// incoming white space would push it past the limit.
    LineFull,
}

/// Token classes the table distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenClass {
    /// Clusters, non-breaking spaces and escape sequences.
    Word,
    Blank(Whitespace),
}

impl TokenClass {
    pub(crate) fn of(token: &Token<'_>) -> Self {
        match token {
            Token::Whitespace(ws) => Self::Blank(*ws),
            Token::Ansi(_) | Token::Nbsp | Token::Cluster { .. } => Self::Word,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Append the token to the pending word.
    PushWord,
    /// Move the pending word onto the line, breaking or splitting as needed.
    FlushWord,
    /// Finalize the current line without consuming the token.
    SoftBreak,
    /// Finalize the current line, then give the tab a line of its own.
    IsolateTab,
    /// Finalize the current line at a newline.
    HardBreak,
    /// Write (or drop) a white space token on the current line.
    Place(Whitespace),
}

/// `Then` leaves the token pending and asks for another lookup; `Done`
/// consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Then(Action),
    Done(Action),
}

pub(crate) const fn transition(state: State, class: TokenClass) -> Step {
    match (state, class) {
        (_, TokenClass::Word) => Step::Done(Action::PushWord),
        (State::InWord, TokenClass::Blank(_)) => Step::Then(Action::FlushWord),
        (_, TokenClass::Blank(Whitespace::Newline)) => Step::Done(Action::HardBreak),
        (State::LineFull, TokenClass::Blank(Whitespace::Tab)) => Step::Done(Action::IsolateTab),
        (State::LineFull, TokenClass::Blank(_)) => Step::Then(Action::SoftBreak),
        (State::Scanning, TokenClass::Blank(ws)) => Step::Done(Action::Place(ws)),
    }
}

// =============================================================================
// Position
// =============================================================================

/// Running counters carried across the scan.
#[derive(Debug, Clone)]
pub(crate) struct Position {
    pub line_width: usize,
    pub word_width: usize,
    pub cur_line: usize,
    pub orig_line: usize,
    pub segment: usize,
    /// Source offsets where the pending line starts.
    pub start_byte: usize,
    pub start_rune: usize,
    /// Source text already attributed to the pending line.
    pub line_bytes: usize,
    pub line_runes: usize,
}

impl Position {
    pub(crate) fn new() -> Self {
        Self {
            line_width: 0,
            word_width: 0,
            cur_line: 1,
            orig_line: 1,
            segment: 0,
            start_byte: 0,
            start_rune: 0,
            line_bytes: 0,
            line_runes: 0,
        }
    }

    /// Charge a slice of the source to the pending line.
    pub(crate) fn attribute(&mut self, source: &str) {
        self.line_bytes += source.len();
        self.line_runes += source.chars().count();
    }

    pub(crate) fn has_unclaimed_source(&self) -> bool {
        self.line_bytes > 0
    }

    /// Close the pending segment: returns its byte and rune offsets and moves
    /// the start of the next segment to their end.
    pub(crate) fn close_segment(&mut self) -> (LineOffset, LineOffset) {
        let bytes = LineOffset::new(self.start_byte, self.start_byte + self.line_bytes);
        let runes = LineOffset::new(self.start_rune, self.start_rune + self.line_runes);
        self.start_byte = bytes.end;
        self.start_rune = runes.end;
        self.line_bytes = 0;
        self.line_runes = 0;
        (bytes, runes)
    }

    /// Columns a tab occupies at the current line width, never more than
    /// a whole line.
    pub(crate) fn tab_stop(&self, tab_size: usize, limit: usize) -> usize {
        let size = tab_size.max(1);
        (size - (self.line_width % size)).min(limit)
    }
}

// =============================================================================
// Word buffer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PieceKind {
    Cluster,
    Nbsp,
    Ansi,
}

/// One token of a pending word, as a byte range of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Piece {
    pub kind: PieceKind,
    pub start: usize,
    pub end: usize,
    pub width: usize,
}

/// Where to cut a word that does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cut {
    /// Number of leading pieces that go onto the current line.
    pub pieces: usize,
    /// Source byte offset just past the kept prefix.
    pub end: usize,
    pub width: usize,
    pub hyphen: bool,
}

/// The pending word. Words are contiguous in the source, so the buffer is a
/// byte range plus the pieces it is made of.
#[derive(Debug, Clone, Default)]
pub(crate) struct WordBuffer {
    start: usize,
    end: usize,
    pieces: SmallVec<[Piece; 16]>,
    has_nbsp: bool,
}

impl WordBuffer {
    pub(crate) fn push(&mut self, token: &Token<'_>, range: Range<usize>) {
        let kind = match token {
            Token::Ansi(_) => PieceKind::Ansi,
            Token::Nbsp => PieceKind::Nbsp,
            Token::Cluster { .. } | Token::Whitespace(_) => PieceKind::Cluster,
        };
        if self.pieces.is_empty() {
            self.start = range.start;
        }
        self.end = range.end;
        self.has_nbsp |= kind == PieceKind::Nbsp;
        self.pieces.push(Piece {
            kind,
            start: range.start,
            end: range.end,
            width: token.width(),
        });
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub(crate) fn has_nbsp(&self) -> bool {
        self.has_nbsp
    }

    pub(crate) fn width(&self) -> usize {
        self.pieces.iter().map(|p| p.width).sum()
    }

    pub(crate) fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub(crate) fn clear(&mut self) {
        self.pieces.clear();
        self.has_nbsp = false;
        self.start = self.end;
    }

    /// Find the longest prefix that still leaves a column for a hyphen on a
    /// line already `line_width` wide.
    ///
    /// Escape sequences only travel with the prefix when a cluster after them
    /// is kept. On an empty line where not even one cluster fits, the first
    /// cluster is taken alone so the caller always makes progress.
    pub(crate) fn cut(&self, source: &str, line_width: usize, limit: usize) -> Cut {
        let mut width = 0;
        let mut kept: Option<&Piece> = None;
        let mut next: Option<&Piece> = None;
        let mut pieces = 0;

        for (idx, piece) in self.pieces.iter().enumerate() {
            if piece.kind == PieceKind::Ansi {
                continue;
            }
            if line_width + width + piece.width >= limit {
                next = Some(piece);
                break;
            }
            width += piece.width;
            kept = Some(piece);
            pieces = idx + 1;
        }

        if pieces == 0 && line_width == 0 {
            if let Some((idx, first)) = self
                .pieces
                .iter()
                .enumerate()
                .find(|(_, p)| p.kind != PieceKind::Ansi)
            {
                return Cut {
                    pieces: idx + 1,
                    end: first.end,
                    width: first.width,
                    hyphen: false,
                };
            }
        }

        let wordy = |piece: Option<&Piece>| {
            piece.is_some_and(|p| p.kind == PieceKind::Cluster && is_wordy(&source[p.start..p.end]))
        };
        Cut {
            pieces,
            end: kept.map_or(self.start, |p| p.end),
            width,
            hyphen: wordy(kept) && wordy(next),
        }
    }

    /// Drop the first `count` pieces after they were written to a line.
    pub(crate) fn drain_front(&mut self, count: usize) {
        self.pieces.drain(..count.min(self.pieces.len()));
        match self.pieces.first() {
            Some(first) => self.start = first.start,
            None => self.clear(),
        }
        self.has_nbsp = self.pieces.iter().any(|p| p.kind == PieceKind::Nbsp);
    }
}

// =============================================================================
// Line buffer
// =============================================================================

/// Output text of the pending line.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineBuffer {
    text: String,
}

impl LineBuffer {
    pub(crate) fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub(crate) fn push_spaces(&mut self, count: usize) {
        self.text.extend(std::iter::repeat_n(' ', count));
    }

    pub(crate) fn push(&mut self, c: char) {
        self.text.push(c);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.text
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
    }

    /// Remove trailing spaces, keeping any escape sequences that follow them.
    /// Returns the number of spaces removed.
    pub(crate) fn trim_trailing_spaces(&mut self) -> usize {
        let mut idx = self.text.len();
        let mut removed = 0;
        let mut escapes: SmallVec<[Range<usize>; 4]> = SmallVec::new();

        loop {
            let head = &self.text[..idx];
            if head.ends_with(' ') {
                idx -= 1;
                removed += 1;
                continue;
            }
            match head.rfind('\x1b') {
                Some(esc) if csi_len(&head[esc..]) == Some(idx - esc) => {
                    escapes.push(esc..idx);
                    idx = esc;
                }
                _ => break,
            }
        }

        if removed > 0 {
            let mut trimmed = String::with_capacity(self.text.len() - removed);
            trimmed.push_str(&self.text[..idx]);
            for range in escapes.into_iter().rev() {
                trimmed.push_str(&self.text[range]);
            }
            self.text = trimmed;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Scanner;

    fn word_of(source: &str) -> WordBuffer {
        let mut word = WordBuffer::default();
        for spanned in Scanner::new(source) {
            word.push(&spanned.token, spanned.range);
        }
        word
    }

    // ==========================================================================
    // Transition table
    // ==========================================================================

    #[test]
    fn word_tokens_always_accumulate() {
        for state in [State::Scanning, State::InWord, State::LineFull] {
            assert_eq!(
                transition(state, TokenClass::Word),
                Step::Done(Action::PushWord)
            );
        }
    }

    #[test]
    fn whitespace_flushes_pending_word_first() {
        for ws in [
            Whitespace::Space,
            Whitespace::Tab,
            Whitespace::Newline,
            Whitespace::Other('\r'),
        ] {
            assert_eq!(
                transition(State::InWord, TokenClass::Blank(ws)),
                Step::Then(Action::FlushWord)
            );
        }
    }

    #[test]
    fn newline_is_hard_break_regardless_of_fullness() {
        let newline = TokenClass::Blank(Whitespace::Newline);
        assert_eq!(
            transition(State::Scanning, newline),
            Step::Done(Action::HardBreak)
        );
        assert_eq!(
            transition(State::LineFull, newline),
            Step::Done(Action::HardBreak)
        );
    }

    #[test]
    fn full_line_breaks_before_whitespace() {
        assert_eq!(
            transition(State::LineFull, TokenClass::Blank(Whitespace::Space)),
            Step::Then(Action::SoftBreak)
        );
        assert_eq!(
            transition(State::LineFull, TokenClass::Blank(Whitespace::Other('\r'))),
            Step::Then(Action::SoftBreak)
        );
        assert_eq!(
            transition(State::LineFull, TokenClass::Blank(Whitespace::Tab)),
            Step::Done(Action::IsolateTab)
        );
        assert_eq!(
            transition(State::Scanning, TokenClass::Blank(Whitespace::Tab)),
            Step::Done(Action::Place(Whitespace::Tab))
        );
    }

    #[test]
    fn token_class_mapping() {
        assert_eq!(TokenClass::of(&Token::Nbsp), TokenClass::Word);
        assert_eq!(TokenClass::of(&Token::Ansi("\x1b[0m")), TokenClass::Word);
        assert_eq!(
            TokenClass::of(&Token::Whitespace(Whitespace::Space)),
            TokenClass::Blank(Whitespace::Space)
        );
    }

    // ==========================================================================
    // Position
    // ==========================================================================

    #[test]
    fn tab_stops() {
        let mut pos = Position::new();
        assert_eq!(pos.tab_stop(4, 80), 4);
        pos.line_width = 5;
        assert_eq!(pos.tab_stop(4, 80), 3);
        pos.line_width = 8;
        assert_eq!(pos.tab_stop(4, 80), 4);
        assert_eq!(pos.tab_stop(0, 80), 1);
    }

    #[test]
    fn tab_stop_is_clamped_to_limit() {
        let pos = Position::new();
        assert_eq!(pos.tab_stop(8, 4), 4);
        assert_eq!(pos.tab_stop(8, 8), 8);
    }

    #[test]
    fn close_segment_advances_start() {
        let mut pos = Position::new();
        pos.attribute("h\u{00E9}llo");
        let (bytes, runes) = pos.close_segment();
        assert_eq!(bytes, LineOffset::new(0, 6));
        assert_eq!(runes, LineOffset::new(0, 5));
        pos.attribute("x");
        let (bytes, runes) = pos.close_segment();
        assert_eq!(bytes, LineOffset::new(6, 7));
        assert_eq!(runes, LineOffset::new(5, 6));
        assert!(!pos.has_unclaimed_source());
    }

    // ==========================================================================
    // Word buffer
    // ==========================================================================

    #[test]
    fn word_tracks_range_width_and_nbsp() {
        let word = word_of("ab\u{00A0}\u{4E2D}");
        assert_eq!(word.range(), 0..7);
        assert_eq!(word.width(), 5);
        assert!(word.has_nbsp());
    }

    #[test]
    fn cut_leaves_room_for_hyphen() {
        let source = "Supercalifragilistic";
        let word = word_of(source);
        let cut = word.cut(source, 0, 10);
        assert_eq!(cut.pieces, 9);
        assert_eq!(&source[word.range().start..cut.end], "Supercali");
        assert_eq!(cut.width, 9);
        assert!(cut.hyphen);
    }

    #[test]
    fn cut_accounts_for_existing_line_width() {
        let source = "word";
        let word = word_of(source);
        let cut = word.cut(source, 7, 10);
        assert_eq!(cut.pieces, 2);
        assert!(cut.hyphen);
    }

    #[test]
    fn cut_without_hyphen_next_to_punctuation() {
        let source = "abcd.efgh";
        let word = word_of(source);
        let cut = word.cut(source, 0, 5);
        assert_eq!(cut.pieces, 4);
        assert!(!cut.hyphen);
        let cut = word.cut(source, 0, 6);
        assert_eq!(cut.pieces, 5);
        assert!(!cut.hyphen);
    }

    #[test]
    fn cut_is_empty_when_line_has_no_room() {
        let source = "word";
        let word = word_of(source);
        let cut = word.cut(source, 9, 10);
        assert_eq!(cut.pieces, 0);
        assert!(!cut.hyphen);
    }

    #[test]
    fn cut_forces_one_wide_cluster_on_empty_line() {
        let source = "\u{4E2D}\u{6587}";
        let word = word_of(source);
        let cut = word.cut(source, 0, 2);
        assert_eq!(cut.pieces, 1);
        assert_eq!(cut.width, 2);
        assert!(!cut.hyphen);
    }

    #[test]
    fn cut_keeps_leading_escape_with_prefix() {
        let source = "\x1b[1mabcdef";
        let word = word_of(source);
        let cut = word.cut(source, 0, 3);
        assert_eq!(cut.pieces, 3);
        assert_eq!(&source[..cut.end], "\x1b[1mab");
    }

    #[test]
    fn cut_leaves_escape_before_cut_cluster_with_remainder() {
        let source = "ab\x1b[0mcdef";
        let word = word_of(source);
        let cut = word.cut(source, 0, 3);
        assert_eq!(cut.pieces, 2);
        assert_eq!(cut.end, 2);
    }

    #[test]
    fn drain_front_moves_start() {
        let source = "abcdef";
        let mut word = word_of(source);
        word.drain_front(4);
        assert_eq!(word.range(), 4..6);
        assert_eq!(word.width(), 2);
        word.drain_front(2);
        assert!(word.is_empty());
    }

    // ==========================================================================
    // Line buffer
    // ==========================================================================

    #[test]
    fn trims_trailing_spaces() {
        let mut line = LineBuffer::default();
        line.push_str("text");
        line.push_spaces(3);
        assert_eq!(line.trim_trailing_spaces(), 3);
        assert_eq!(line.as_str(), "text");
    }

    #[test]
    fn trim_preserves_trailing_escapes() {
        let mut line = LineBuffer::default();
        line.push_str("text \x1b[0m \x1b[1m");
        assert_eq!(line.trim_trailing_spaces(), 2);
        assert_eq!(line.as_str(), "text\x1b[0m\x1b[1m");
    }

    #[test]
    fn trim_without_trailing_spaces_is_noop() {
        let mut line = LineBuffer::default();
        line.push_str("a b\x1b[0m");
        assert_eq!(line.trim_trailing_spaces(), 0);
        assert_eq!(line.as_str(), "a b\x1b[0m");
    }

    #[test]
    fn trim_all_space_line() {
        let mut line = LineBuffer::default();
        line.push_spaces(4);
        assert_eq!(line.trim_trailing_spaces(), 4);
        assert!(line.is_empty());
    }
}
